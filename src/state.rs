//! Run state module
//!
//! All mutable aggregation state for one analysis run lives here: category
//! counts, the device map, process-indicator counters, observed host/user
//! sets, the timeline buffer, the full export list, and per-source
//! summaries. The state is monotonic: entries are only ever added or
//! widened, never removed. Classification and correlation stay pure; this
//! module is the single place their decisions are applied.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};

use crate::classifier::Classification;
use crate::devices;
use crate::models::{Category, DeviceRecord, EventRecord, FullLogEntry, TimelineEntry};
use crate::taxonomy::{Taxonomy, CLOUD_PROCESS_NAMES, EMAIL_PROCESS_NAMES};
use crate::util::{contains_ignore_case, truncate_sample};

/// Hard cap on stored example descriptions, per device and per identifier.
pub const SAMPLE_CAP: usize = 3;

/// Hard cap on the length of one stored description snippet.
pub const SAMPLE_MAX_CHARS: usize = 200;

/// Script-logging marker for encoded command lines.
const ENCODED_COMMAND_MARKER: &str = "-EncodedCommand";

/// Case-insensitive name set that preserves first-seen casing and iterates
/// in a stable sorted order.
#[derive(Debug, Clone, Default)]
pub struct NameSet {
    inner: BTreeMap<String, String>,
}

impl NameSet {
    pub fn insert(&mut self, name: &str) {
        self.inner
            .entry(name.to_uppercase())
            .or_insert_with(|| name.to_string());
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.inner.values().map(String::as_str)
    }
}

/// Why a source contributed no records (or stopped early).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    NotFound,
    Read(String),
}

/// Per-source bookkeeping rendered in the log-file summary section.
#[derive(Debug, Clone, Default)]
pub struct SourceSummary {
    pub path: String,
    /// Display label, normally the upper-cased file name.
    pub label: String,
    /// Records that survived every filter.
    pub processed: u64,
    /// Records dropped by noise suppression.
    pub skipped: u64,
    /// Focused-category events by identifier ("forensic interest" tally).
    pub interest: BTreeMap<u32, u64>,
    pub error: Option<SourceError>,
}

impl SourceSummary {
    pub fn new(path: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            label: label.into(),
            ..Self::default()
        }
    }
}

/// Aggregated state of one run.
#[derive(Debug, Clone, Default)]
pub struct RunState {
    pub category_counts: BTreeMap<Category, BTreeMap<u32, u64>>,
    /// Example descriptions per device-info identifier.
    pub device_examples: BTreeMap<u32, Vec<String>>,
    /// Correlated devices, keyed case-insensitively by correlation key.
    devices: HashMap<String, DeviceRecord>,
    pub cloud_counts: BTreeMap<String, u64>,
    pub email_counts: BTreeMap<String, u64>,
    pub encoded_commands: u64,
    pub hosts: NameSet,
    pub users: NameSet,
    pub timeline: Vec<TimelineEntry>,
    pub full_log: Vec<FullLogEntry>,
    pub sources: Vec<SourceSummary>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one classified record. Called exactly once per non-noise,
    /// in-window record.
    pub fn apply(
        &mut self,
        record: &EventRecord,
        time: DateTime<Utc>,
        classification: &Classification,
        message: &str,
        taxonomy: &Taxonomy,
        summary: &mut SourceSummary,
    ) {
        for category in &classification.categories {
            *self
                .category_counts
                .entry(*category)
                .or_default()
                .entry(record.event_id)
                .or_insert(0) += 1;
        }

        if classification.focused() {
            *summary.interest.entry(record.event_id).or_insert(0) += 1;
            self.timeline.push(TimelineEntry {
                time,
                event_id: record.event_id,
                description: taxonomy
                    .description(record.event_id)
                    .unwrap_or_default()
                    .to_string(),
                provider: record.provider_name().to_string(),
            });
        }

        let external = !message.is_empty()
            && devices::is_external_storage(message, record.provider_name());

        if classification.device_info && external {
            push_sample(
                self.device_examples.entry(record.event_id).or_default(),
                message,
            );
        }

        if classification.usb_raw && external {
            let fragments = devices::extract_fragments(message);
            let key =
                devices::correlation_key(&fragments, record.provider_name(), record.event_id);
            let device = self
                .devices
                .entry(key.to_uppercase())
                .or_insert_with(|| DeviceRecord::new(key));
            device.observe(time);
            device.vid_pids.extend(fragments.vid_pids);
            device.volumes.extend(fragments.volumes);
            device.containers.extend(fragments.containers);
            push_sample(&mut device.samples, message);
        }

        if classification.process_scan && !message.is_empty() {
            for name in CLOUD_PROCESS_NAMES {
                if contains_ignore_case(message, name) {
                    *self.cloud_counts.entry(name.to_string()).or_insert(0) += 1;
                }
            }
            for name in EMAIL_PROCESS_NAMES {
                if contains_ignore_case(message, name) {
                    *self.email_counts.entry(name.to_string()).or_insert(0) += 1;
                }
            }
            if contains_ignore_case(message, ENCODED_COMMAND_MARKER) {
                self.encoded_commands += 1;
            }
        }
    }

    /// Counts for one category (empty map when nothing matched).
    pub fn counts(&self, category: Category) -> BTreeMap<u32, u64> {
        self.category_counts
            .get(&category)
            .cloned()
            .unwrap_or_default()
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    pub fn device(&self, key: &str) -> Option<&DeviceRecord> {
        self.devices.get(&key.to_uppercase())
    }

    /// Devices ordered by event count descending, key ascending on ties.
    pub fn devices_by_activity(&self) -> Vec<&DeviceRecord> {
        let mut devices: Vec<&DeviceRecord> = self.devices.values().collect();
        devices.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
        devices
    }
}

fn push_sample(samples: &mut Vec<String>, message: &str) {
    if samples.len() < SAMPLE_CAP {
        let sample = truncate_sample(message, SAMPLE_MAX_CHARS);
        if !samples.contains(&sample) {
            samples.push(sample);
        }
    }
}
