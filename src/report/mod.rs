//! Report rendering module
//!
//! Pure formatting of a run's final state into the human-readable triage
//! report. Sections with no data print a placeholder line instead of being
//! dropped, so the report shape is predictable. CSV export lives in
//! [`export`].

pub mod export;

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::models::Category;
use crate::state::{RunState, SourceError};
use crate::taxonomy::Taxonomy;

const RULE: &str = "----------------------------------------------------------------------";
const BANNER: &str = "======================================================================";

/// Column the dotted filler runs up to in per-identifier count lines.
const DOT_FIELD_WIDTH: usize = 32;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render the complete report.
pub fn render(state: &RunState, taxonomy: &Taxonomy) -> String {
    let mut out = String::new();
    system_information(&mut out, state);
    source_summaries(&mut out, state, taxonomy);
    category_summary(&mut out, state, taxonomy);
    device_overview(&mut out, state);
    process_indicators(&mut out, state);
    timeline(&mut out, state);
    out
}

fn banner(out: &mut String, title: &str) {
    let _ = writeln!(out, "{BANNER}");
    let _ = writeln!(out, "  {title}");
    let _ = writeln!(out, "{BANNER}");
    out.push('\n');
}

fn system_information(out: &mut String, state: &RunState) {
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, " System Information");
    let _ = writeln!(out, "{RULE}");
    out.push('\n');

    let _ = writeln!(out, "  [ Computers Identified ({}) ]", state.hosts.len());
    if state.hosts.is_empty() {
        let _ = writeln!(out, "   - None identified");
    } else {
        for host in state.hosts.iter() {
            let _ = writeln!(out, "   - {host}");
        }
    }
    out.push('\n');

    let _ = writeln!(
        out,
        "  [ User Accounts Observed (via Logon Events) ({}) ]",
        state.users.len()
    );
    if state.users.is_empty() {
        let _ = writeln!(out, "   - None identified (or no 4624 events found)");
    } else {
        for user in state.users.iter() {
            let _ = writeln!(out, "   - {user}");
        }
    }
    out.push('\n');
    out.push('\n');
}

fn source_summaries(out: &mut String, state: &RunState, taxonomy: &Taxonomy) {
    banner(out, "INDIVIDUAL LOG FILE SUMMARY");

    for summary in &state.sources {
        if summary.error == Some(SourceError::NotFound) {
            let _ = writeln!(out, "[!] File not found: {}", summary.path);
            out.push('\n');
            continue;
        }

        let _ = writeln!(out, "{RULE}");
        let _ = writeln!(out, " File: {}", summary.label);
        let _ = writeln!(out, "{RULE}");

        if let Some(SourceError::Read(reason)) = &summary.error {
            let _ = writeln!(out, "[ ERROR ] {}: {reason}", summary.path);
            out.push('\n');
            continue;
        }

        let _ = writeln!(out, "[ File Summary ]");
        let _ = writeln!(out, "  Total processed events: {}", summary.processed);
        let _ = writeln!(out, "  Skipped (noise): {}", summary.skipped);
        out.push('\n');

        if !summary.interest.is_empty() {
            let _ = writeln!(out, "[ Events of Forensic Interest ]");
            for (event_id, count) in by_count_desc(&summary.interest) {
                event_line(out, event_id, count, taxonomy.description(event_id));
            }
        }
        out.push('\n');
    }
}

fn category_summary(out: &mut String, state: &RunState, taxonomy: &Taxonomy) {
    banner(out, "CATEGORY SUMMARY");

    for category in Category::ALL {
        let _ = writeln!(out, "{RULE}");
        let _ = writeln!(out, "[ {} ]", category.title());

        let counts = state.counts(category);
        if counts.is_empty() {
            let _ = writeln!(out, "  No matching events found in loaded logs.");
        } else {
            for (event_id, count) in by_count_desc(&counts) {
                event_line(out, event_id, count, taxonomy.description(event_id));
                if let Some(examples) = state.device_examples.get(&event_id) {
                    for example in examples {
                        let _ = writeln!(out, "    e.g., {example}");
                    }
                }
            }
        }
        let _ = writeln!(out, "{RULE}");
        out.push('\n');
    }
}

fn device_overview(out: &mut String, state: &RunState) {
    let _ = writeln!(out, "[ USB Device Overview (Removable Storage Only) ]");
    if state.device_count() == 0 {
        let _ = writeln!(out, "  No external removable storage devices identified.");
    } else {
        for device in state.devices_by_activity() {
            let _ = writeln!(out, "  Device: {}", device.key);
            let _ = writeln!(out, "    Events: {}", device.count);
            if let (Some(first), Some(last)) = (device.first_seen, device.last_seen) {
                let _ = writeln!(
                    out,
                    "    First Seen: {}  |  Last Seen: {}",
                    first.format(TIME_FORMAT),
                    last.format(TIME_FORMAT)
                );
            }
            out.push('\n');
        }
    }
    out.push('\n');
}

fn process_indicators(out: &mut String, state: &RunState) {
    if state.cloud_counts.is_empty() && state.email_counts.is_empty() && state.encoded_commands == 0
    {
        return;
    }

    let _ = writeln!(out, "[ Process-Based Exfiltration Indicators (4688 / 4104) ]");
    for (name, count) in by_count_desc(&state.cloud_counts) {
        let _ = writeln!(out, "    {name:<25} {count} process creation events");
    }
    for (name, count) in by_count_desc(&state.email_counts) {
        let _ = writeln!(out, "    {name:<25} {count} process creation events");
    }
    if state.encoded_commands > 0 {
        out.push('\n');
        let _ = writeln!(
            out,
            "  PowerShell -EncodedCommand usage: {} events.",
            state.encoded_commands
        );
    }
    out.push('\n');
}

fn timeline(out: &mut String, state: &RunState) {
    banner(out, "TIMELINE");

    if state.timeline.is_empty() {
        let _ = writeln!(out, "  No timeline-relevant events found in loaded logs.");
        out.push('\n');
        return;
    }

    // Descending by time; stable, so equal timestamps keep encounter order.
    let mut entries: Vec<_> = state.timeline.iter().collect();
    entries.sort_by(|a, b| b.time.cmp(&a.time));

    for entry in entries {
        let mut line = format!(
            "  {}  -  ID {}",
            entry.time.format(TIME_FORMAT),
            entry.event_id
        );
        if !entry.description.trim().is_empty() {
            let _ = write!(line, " ({})", entry.description);
        }
        let _ = writeln!(out, "{line}");
    }
    out.push('\n');
}

/// One aligned per-identifier count line, e.g.
/// `  ID 4663 ...................... 42 events   (File/folder access attempt)`.
/// Identifiers without a known description get no parenthetical.
fn event_line(out: &mut String, event_id: u32, count: u64, description: Option<&str>) {
    let mut line = format!("  ID {event_id} ");
    let dots = DOT_FIELD_WIDTH.saturating_sub(line.len()).max(3);
    line.push_str(&".".repeat(dots));
    let _ = write!(line, " {count} events");
    if let Some(desc) = description.filter(|d| !d.trim().is_empty()) {
        let _ = write!(line, "   ({desc})");
    }
    let _ = writeln!(out, "{line}");
}

/// Entries ordered by count descending; the `BTreeMap` source plus a stable
/// sort gives key-ascending order on ties.
fn by_count_desc<K: Ord + Clone>(map: &BTreeMap<K, u64>) -> Vec<(K, u64)> {
    let mut entries: Vec<(K, u64)> = map.iter().map(|(k, v)| (k.clone(), *v)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TimelineEntry;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_event_line_alignment() {
        let mut out = String::new();
        event_line(&mut out, 4663, 42, Some("File/folder access attempt"));
        assert_eq!(
            out,
            "  ID 4663 ...................... 42 events   (File/folder access attempt)\n"
        );
    }

    #[test]
    fn test_event_line_keeps_minimum_dots_for_long_ids() {
        let mut out = String::new();
        event_line(&mut out, 4294967295, 1, None);
        assert!(out.contains("ID 4294967295 ..."));
        assert!(!out.contains("("));
    }

    #[test]
    fn test_empty_state_renders_placeholders() {
        let state = RunState::new();
        let taxonomy = Taxonomy::new();
        let report = render(&state, &taxonomy);

        assert!(report.contains("   - None identified"));
        assert!(report.contains("No matching events found in loaded logs."));
        assert!(report.contains("No external removable storage devices identified."));
        assert!(report.contains("No timeline-relevant events found in loaded logs."));
        // The indicator section is omitted entirely when empty.
        assert!(!report.contains("Exfiltration Indicators"));
    }

    #[test]
    fn test_timeline_rendered_newest_first() {
        let mut state = RunState::new();
        let earlier = Utc.with_ymd_and_hms(2025, 11, 20, 1, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2025, 11, 20, 2, 0, 0).unwrap();
        state.timeline.push(TimelineEntry {
            time: earlier,
            event_id: 4624,
            description: "Successful logon".to_string(),
            provider: "p".to_string(),
        });
        state.timeline.push(TimelineEntry {
            time: later,
            event_id: 1102,
            description: "Security audit log cleared".to_string(),
            provider: "p".to_string(),
        });

        let report = render(&state, &Taxonomy::new());
        let first = report.find("ID 1102").unwrap();
        let second = report.find("ID 4624").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_by_count_desc_breaks_ties_by_key() {
        let map = BTreeMap::from([(4625u32, 3u64), (4624, 3), (1102, 7)]);
        let ordered = by_count_desc(&map);
        assert_eq!(ordered, vec![(1102, 7), (4624, 3), (4625, 3)]);
    }

    #[test]
    fn test_indicator_section_formatting() {
        let mut state = RunState::new();
        state.cloud_counts.insert("OneDrive.exe".to_string(), 3);
        state.email_counts.insert("OUTLOOK.EXE".to_string(), 1);
        state.encoded_commands = 2;

        let report = render(&state, &Taxonomy::new());
        assert!(report.contains("    OneDrive.exe              3 process creation events"));
        assert!(report.contains("  PowerShell -EncodedCommand usage: 2 events."));
    }
}
