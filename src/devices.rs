//! Device correlation module
//!
//! Extracts hardware/volume identity fragments from free-text descriptions
//! of plug-and-play events and reduces them to a stable correlation key, so
//! that the many raw events one removable device generates collapse into a
//! single identity. A keyword filter first rejects the PnP chatter that is
//! not external storage at all (audio endpoints, hubs, HID, bluetooth, ...).

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::util::contains_ignore_case;

/// Vendor/product id pair, e.g. `VID_0781&PID_5583` inside a device path.
static VID_PID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)VID_([0-9A-F]{4}).*?PID_([0-9A-F]{4})")
        .expect("VID_PID_REGEX pattern is valid")
});

/// GUID-shaped volume token, e.g. `Volume{8a3f...}`.
static VOLUME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Volume\{[0-9A-F\-]+\}").expect("VOLUME_REGEX pattern is valid")
});

/// Hexadecimal payload of a `Container ID: {...}` label.
static CONTAINER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Container ID:\s*\{([0-9A-F\-]+)\}")
        .expect("CONTAINER_REGEX pattern is valid")
});

/// Markers of device classes that are never removable storage.
const DENY_MARKERS: &[&str] = &[
    "ACPI",
    "ROOT",
    "UEFI",
    "Display",
    "MMDEVAPI",
    "HID",
    "input.inf",
    "BTH",
    "bthusb",
    "NET",
    "wbfusbdriver",
    "print",
];

/// Markers that positively identify a storage-class device.
const STORAGE_MARKERS: &[&str] = &[
    "USBSTOR",
    "usbstor.inf",
    "UASPSTOR",
    "Disk",
    "Volume",
    "Mass Storage",
    // USB mass-storage device-class GUID.
    "{36fc9e60-c465-11cf-8056-444553540000}",
];

/// Providers that only ever log for storage volumes.
const STORAGE_PROVIDER_MARKERS: &[&str] = &["Partition", "Storage-ClassPnP"];

/// Identity fragments pulled out of one description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceFragments {
    pub vid_pids: Vec<String>,
    pub volumes: Vec<String>,
    pub containers: Vec<String>,
}

impl DeviceFragments {
    pub fn is_empty(&self) -> bool {
        self.vid_pids.is_empty() && self.volumes.is_empty() && self.containers.is_empty()
    }
}

/// True when the description (or provider) identifies actual external
/// storage. The deny list wins over everything; a record can pass it and
/// still fail for want of a storage keyword.
pub fn is_external_storage(message: &str, provider: &str) -> bool {
    if message.trim().is_empty() {
        return false;
    }
    if DENY_MARKERS
        .iter()
        .any(|marker| contains_ignore_case(message, marker))
    {
        return false;
    }
    STORAGE_MARKERS
        .iter()
        .any(|marker| contains_ignore_case(message, marker))
        || STORAGE_PROVIDER_MARKERS
            .iter()
            .any(|marker| contains_ignore_case(provider, marker))
}

/// Run the three independent pattern scans over one description.
pub fn extract_fragments(message: &str) -> DeviceFragments {
    let mut fragments = DeviceFragments::default();

    for captures in VID_PID_REGEX.captures_iter(message) {
        let vid = captures[1].to_uppercase();
        let pid = captures[2].to_uppercase();
        fragments.vid_pids.push(format!("VID_{vid}&PID_{pid}"));
    }
    for m in VOLUME_REGEX.find_iter(message) {
        fragments.volumes.push(m.as_str().to_string());
    }
    for captures in CONTAINER_REGEX.captures_iter(message) {
        fragments.containers.push(captures[1].to_uppercase());
    }

    fragments
}

/// Pick the correlation key for a set of fragments. Priority reflects
/// fragment durability: a hardware identity outlives a volume, which
/// outlives a bare container id. With no fragments at all the record can
/// only be keyed by where it was logged.
pub fn correlation_key(fragments: &DeviceFragments, provider: &str, event_id: u32) -> String {
    if !fragments.vid_pids.is_empty() {
        join_unique(&fragments.vid_pids)
    } else if !fragments.volumes.is_empty() {
        join_unique(&fragments.volumes)
    } else if !fragments.containers.is_empty() {
        format!("Container {}", join_unique(&fragments.containers))
    } else {
        format!("{provider} / ID {event_id}")
    }
}

/// Comma-join with first-occurrence de-duplication.
fn join_unique(values: &[String]) -> String {
    let mut seen = HashSet::new();
    values
        .iter()
        .filter(|value| seen.insert(value.as_str()))
        .cloned()
        .collect::<Vec<_>>()
        .join(", ")
}
