//! Record source module
//!
//! The seam between the engine and whatever decoded the logs. A source
//! yields records lazily, in log order; producing zero records for an empty
//! source is not an error at this layer.

use crate::models::EventRecord;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

/// Optional inclusive time bounds applied before any other processing.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeWindow {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeWindow {
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    /// True when `time` falls inside the window. Bounds are inclusive;
    /// an absent bound is unbounded on that side.
    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        if self.start.is_some_and(|start| time < start) {
            return false;
        }
        if self.end.is_some_and(|end| time > end) {
            return false;
        }
        true
    }
}

/// An ordered, lazily-produced sequence of decoded records.
pub trait RecordSource {
    /// Display label for the per-source summary section.
    fn label(&self) -> &str;

    /// Next record, a read/decode error, or `None` when exhausted.
    fn next_record(&mut self) -> Option<Result<EventRecord>>;
}

/// Reads one JSON-encoded record per line.
pub struct JsonlSource {
    label: String,
    lines: Lines<BufReader<File>>,
}

impl JsonlSource {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
        let label = path
            .file_name()
            .map(|name| name.to_string_lossy().to_uppercase())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            label,
            lines: BufReader::new(file).lines(),
        })
    }
}

impl RecordSource for JsonlSource {
    fn label(&self) -> &str {
        &self.label
    }

    fn next_record(&mut self) -> Option<Result<EventRecord>> {
        // Blank lines are tolerated; anything else must parse.
        loop {
            match self.lines.next()? {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => {
                    return Some(
                        serde_json::from_str(&line).context("malformed record"),
                    );
                }
                Err(err) => return Some(Err(err).context("read failure")),
            }
        }
    }
}

/// Serves records from memory, in insertion order. Used by tests and by
/// callers that already hold decoded records.
pub struct MemorySource {
    label: String,
    records: std::vec::IntoIter<EventRecord>,
}

impl MemorySource {
    pub fn new(label: impl Into<String>, records: Vec<EventRecord>) -> Self {
        Self {
            label: label.into(),
            records: records.into_iter(),
        }
    }
}

impl RecordSource for MemorySource {
    fn label(&self) -> &str {
        &self.label
    }

    fn next_record(&mut self) -> Option<Result<EventRecord>> {
        self.records.next().map(Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;

    #[test]
    fn test_window_bounds_are_inclusive() {
        let start = Utc.with_ymd_and_hms(2025, 11, 19, 23, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 11, 20, 3, 0, 0).unwrap();
        let window = TimeWindow::new(Some(start), Some(end));

        assert!(window.contains(start));
        assert!(window.contains(end));
        assert!(!window.contains(start - chrono::Duration::microseconds(1)));
        assert!(!window.contains(end + chrono::Duration::microseconds(1)));
    }

    #[test]
    fn test_absent_bounds_are_unbounded() {
        let window = TimeWindow::default();
        let t = Utc.with_ymd_and_hms(1999, 1, 1, 0, 0, 0).unwrap();
        assert!(window.contains(t));
    }

    #[test]
    fn test_jsonl_source_parses_records_and_skips_blank_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"time":"2025-11-20T01:00:00Z","event_id":4624}}"#).unwrap();
        writeln!(file).unwrap();
        writeln!(file, r#"{{"time":"2025-11-20T01:01:00Z","event_id":4625}}"#).unwrap();

        let mut source = JsonlSource::open(file.path()).unwrap();
        assert_eq!(source.next_record().unwrap().unwrap().event_id, 4624);
        assert_eq!(source.next_record().unwrap().unwrap().event_id, 4625);
        assert!(source.next_record().is_none());
    }

    #[test]
    fn test_jsonl_source_surfaces_malformed_lines_as_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not json").unwrap();

        let mut source = JsonlSource::open(file.path()).unwrap();
        assert!(source.next_record().unwrap().is_err());
    }

    #[test]
    fn test_jsonl_label_is_uppercased_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("security.jsonl");
        std::fs::write(&path, "").unwrap();

        let source = JsonlSource::open(&path).unwrap();
        assert_eq!(source.label(), "SECURITY.JSONL");
    }
}
