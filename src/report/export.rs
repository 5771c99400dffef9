//! CSV export module
//!
//! Writes the two export record sets: the filtered/focused timeline and the
//! full event log. File names carry a run timestamp; an existing file with
//! the same name is overwritten. Quoting is RFC 4180 (fields containing a
//! comma, quote, or newline are quote-wrapped with doubled quotes).

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;

use crate::config::ExportConfig;
use crate::models::AnalysisResult;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Write both CSV reports into `dir`. Returns the first error encountered;
/// the caller decides whether export failures matter.
pub fn write_csv_reports(dir: &Path, export: &ExportConfig, result: &AnalysisResult) -> Result<()> {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    write_timeline(
        &dir.join(format!("{}_{stamp}.csv", export.timeline_prefix)),
        result,
    )?;
    write_full_log(
        &dir.join(format!("{}_{stamp}.csv", export.full_prefix)),
        result,
    )?;
    Ok(())
}

fn write_timeline(path: &Path, result: &AnalysisResult) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("cannot create {}", path.display()))?;
    writer.write_record(["Time", "EventID", "Description", "Provider"])?;

    let mut entries: Vec<_> = result.timeline.iter().collect();
    entries.sort_by(|a, b| b.time.cmp(&a.time));
    for entry in entries {
        writer.write_record([
            entry.time.format(TIME_FORMAT).to_string(),
            entry.event_id.to_string(),
            entry.description.clone(),
            entry.provider.clone(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_full_log(path: &Path, result: &AnalysisResult) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("cannot create {}", path.display()))?;
    writer.write_record(["Time", "EventID", "Source / Task Category"])?;

    let mut entries: Vec<_> = result.full_log.iter().collect();
    entries.sort_by(|a, b| b.time.cmp(&a.time));
    for entry in entries {
        writer.write_record([
            entry.time.format(TIME_FORMAT).to_string(),
            entry.event_id.to_string(),
            entry.source_or_category.clone(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FullLogEntry, TimelineEntry};
    use chrono::{TimeZone, Utc};

    fn sample_result() -> AnalysisResult {
        let earlier = Utc.with_ymd_and_hms(2025, 11, 20, 1, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2025, 11, 20, 2, 0, 0).unwrap();
        AnalysisResult {
            report: String::new(),
            timeline: vec![
                TimelineEntry {
                    time: earlier,
                    event_id: 4663,
                    description: "File, folder access".to_string(),
                    provider: "Microsoft-Windows-Security-Auditing".to_string(),
                },
                TimelineEntry {
                    time: later,
                    event_id: 1102,
                    description: "Security audit log cleared".to_string(),
                    provider: "Microsoft-Windows-Security-Auditing".to_string(),
                },
            ],
            full_log: vec![FullLogEntry {
                time: earlier,
                event_id: 4663,
                source_or_category: "Removable Storage".to_string(),
            }],
        }
    }

    fn read_export(dir: &Path, prefix: &str) -> String {
        let entry = std::fs::read_dir(dir)
            .unwrap()
            .flatten()
            .find(|e| e.file_name().to_string_lossy().starts_with(prefix))
            .expect("export file written");
        std::fs::read_to_string(entry.path()).unwrap()
    }

    #[test]
    fn test_timeline_export_sorted_and_quoted() {
        let dir = tempfile::tempdir().unwrap();
        write_csv_reports(dir.path(), &ExportConfig::default(), &sample_result()).unwrap();

        let content = read_export(dir.path(), "Filtered_Timeline_");
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "Time,EventID,Description,Provider");
        // Newest first.
        assert!(lines[1].starts_with("2025-11-20 02:00:00,1102"));
        // Comma-bearing description is quote-wrapped.
        assert!(lines[2].contains("\"File, folder access\""));
    }

    #[test]
    fn test_full_log_export_schema() {
        let dir = tempfile::tempdir().unwrap();
        write_csv_reports(dir.path(), &ExportConfig::default(), &sample_result()).unwrap();

        let content = read_export(dir.path(), "All_Events_");
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "Time,EventID,Source / Task Category");
        assert_eq!(lines[1], "2025-11-20 01:00:00,4663,Removable Storage");
    }

    #[test]
    fn test_existing_files_are_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        write_csv_reports(dir.path(), &ExportConfig::default(), &sample_result()).unwrap();
        // Same second, same names; must not fail.
        write_csv_reports(dir.path(), &ExportConfig::default(), &sample_result()).unwrap();
    }
}
