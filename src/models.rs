//! Data models module
//!
//! Defines the decoded input record and the result structures produced by an
//! analysis run.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};

/// One decoded event-log record, as supplied by a record source.
///
/// Records are immutable for the duration of a run. The two fallible render
/// operations of the underlying log API (description formatting and task
/// category resolution) arrive as explicit value/failed pairs instead of
/// being re-attempted here.
#[derive(Debug, Clone, Deserialize)]
pub struct EventRecord {
    /// Creation timestamp. Records without one are skipped entirely.
    #[serde(default, alias = "timestamp")]
    pub time: Option<DateTime<Utc>>,

    /// Numeric event identifier.
    pub event_id: u32,

    /// Provider (logging subsystem) name.
    #[serde(default)]
    pub provider: Option<String>,

    /// Machine name the event was logged on. May be empty.
    #[serde(default)]
    pub host: String,

    /// Log/channel name, e.g. "Security" or "System".
    #[serde(default)]
    pub channel: Option<String>,

    /// Resolved task-category display name, when the source resolved one.
    #[serde(default)]
    pub task: Option<String>,

    /// True when task-category resolution was attempted and failed.
    #[serde(default)]
    pub task_failed: bool,

    /// Rendered description text, when the source could format it.
    #[serde(default)]
    pub message: Option<String>,

    /// True when description formatting was attempted and failed.
    #[serde(default)]
    pub message_failed: bool,

    /// Flattened structured-data view (EventData name/value pairs).
    #[serde(default)]
    pub fields: HashMap<String, String>,
}

/// Outcome of the source's description-formatting attempt for one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageState<'a> {
    /// Formatting succeeded (the text may still be empty).
    Rendered(&'a str),
    /// Formatting was attempted and failed; the provider's templates are
    /// likely unresolvable for the rest of the run.
    Failed,
    /// No description is available for this record.
    Absent,
}

impl EventRecord {
    /// Provider name with the absent case collapsed to a placeholder.
    pub fn provider_name(&self) -> &str {
        self.provider.as_deref().unwrap_or("Unknown")
    }

    /// Case-insensitive structured-field lookup.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn message_state(&self) -> MessageState<'_> {
        match &self.message {
            Some(text) => MessageState::Rendered(text),
            None if self.message_failed => MessageState::Failed,
            None => MessageState::Absent,
        }
    }

    /// True when the record came from the Security log.
    pub fn is_security_channel(&self) -> bool {
        self.channel
            .as_deref()
            .is_some_and(|c| c.eq_ignore_ascii_case("Security"))
    }
}

/// The eight forensic categories.
///
/// Variant order is report order; `Ord` keeps count maps and rendering
/// deterministic across runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    FileAccess,
    Usb,
    Network,
    RemoteAccess,
    PrivilegeEscalation,
    AntiForensics,
    PowerShell,
    EmailTrust,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::FileAccess,
        Category::Usb,
        Category::Network,
        Category::RemoteAccess,
        Category::PrivilegeEscalation,
        Category::AntiForensics,
        Category::PowerShell,
        Category::EmailTrust,
    ];

    /// Section title used in the rendered report.
    pub fn title(&self) -> &'static str {
        match self {
            Category::FileAccess => "File Access / Deletion / Network Shares",
            Category::Usb => "USB / Removable Media Activity",
            Category::Network => "Network Activity (Firewall)",
            Category::RemoteAccess => "Remote Access / Logon / RDP",
            Category::PrivilegeEscalation => "Privilege Escalation / Account Changes",
            Category::AntiForensics => "Anti-Forensics / Log Tampering",
            Category::PowerShell => "PowerShell / Scripted Activity",
            Category::EmailTrust => "Email Trust / Certificate Issues",
        }
    }
}

/// One entry of the focused-event timeline.
#[derive(Debug, Clone)]
pub struct TimelineEntry {
    pub time: DateTime<Utc>,
    pub event_id: u32,
    pub description: String,
    pub provider: String,
}

/// One entry of the full, category-independent event list.
#[derive(Debug, Clone)]
pub struct FullLogEntry {
    pub time: DateTime<Utc>,
    pub event_id: u32,
    /// Provider name, or the Security task category when resolvable.
    pub source_or_category: String,
}

/// One correlated removable-storage device identity.
#[derive(Debug, Clone, Default)]
pub struct DeviceRecord {
    /// Display form of the correlation key (first-seen casing).
    pub key: String,
    pub count: u64,
    pub first_seen: Option<DateTime<Utc>>,
    pub last_seen: Option<DateTime<Utc>>,
    pub vid_pids: BTreeSet<String>,
    pub volumes: BTreeSet<String>,
    pub containers: BTreeSet<String>,
    /// Up to three example descriptions, each capped at 200 characters.
    pub samples: Vec<String>,
}

impl DeviceRecord {
    pub fn new(key: String) -> Self {
        Self {
            key,
            ..Self::default()
        }
    }

    /// Widen the first-seen/last-seen bounds to include `time`.
    pub fn observe(&mut self, time: DateTime<Utc>) {
        self.count += 1;
        if self.first_seen.is_none_or(|t| time < t) {
            self.first_seen = Some(time);
        }
        if self.last_seen.is_none_or(|t| time > t) {
            self.last_seen = Some(time);
        }
    }
}

/// Terminal state of one analysis run.
#[derive(Debug, Clone, Default)]
pub struct AnalysisResult {
    /// Rendered human-readable report.
    pub report: String,
    /// Focused-category timeline entries (unsorted; sorted at render/export).
    pub timeline: Vec<TimelineEntry>,
    /// Every processed, non-noise record regardless of category.
    pub full_log: Vec<FullLogEntry>,
}
