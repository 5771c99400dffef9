//! Event taxonomy module
//!
//! The static knowledge base behind classification: which identifiers belong
//! to which forensic category, what each identifier means, and which process
//! names indicate cloud-storage or email clients. Built once per run and
//! passed by reference; read-only afterwards.

use crate::models::Category;
use std::collections::{HashMap, HashSet};

/// Process names associated with cloud-storage clients and sync tools.
pub const CLOUD_PROCESS_NAMES: &[&str] = &[
    "OneDrive.exe",
    "Dropbox.exe",
    "GoogleDriveFS.exe",
    "Box.exe",
    "rclone.exe",
    "winscp.exe",
    "filezilla.exe",
];

/// Process names associated with email clients.
pub const EMAIL_PROCESS_NAMES: &[&str] = &["OUTLOOK.EXE", "thunderbird.exe"];

/// Immutable identifier taxonomy for one analysis run.
pub struct Taxonomy {
    file_access: HashSet<u32>,
    usb: HashSet<u32>,
    device_info: HashSet<u32>,
    network: HashSet<u32>,
    remote_access: HashSet<u32>,
    priv_esc: HashSet<u32>,
    anti_forensics: HashSet<u32>,
    powershell: HashSet<u32>,
    email_trust: HashSet<u32>,
    /// Union of every category set, the device-info set, and 4688. Only
    /// these identifiers are worth the cost of description rendering.
    all_interesting: HashSet<u32>,
    descriptions: HashMap<u32, &'static str>,
}

impl Taxonomy {
    pub fn new() -> Self {
        let file_access: HashSet<u32> =
            [4663, 4656, 4658, 4660, 4670, 5140, 5142, 5144, 5145].into();
        let usb: HashSet<u32> = [
            20001, 2100, 2102, 2003, 400, 410, 1006, 1010, 3003, 3100, 3102, 6416, 6421, 6422,
            6424,
        ]
        .into();
        let device_info: HashSet<u32> = [
            1006, 1010, 20001, 2100, 2102, 2003, 6416, 6421, 6422, 6424, 400, 410,
        ]
        .into();
        let network: HashSet<u32> = [5156, 5158, 5152, 5154].into();
        let remote_access: HashSet<u32> = [
            624, 4624, 4625, 4634, 4647, 4776, 4648, 4800, 4801, 4778, 4779, 1149,
        ]
        .into();
        let priv_esc: HashSet<u32> = [4672, 4697, 4720, 4732, 4728, 4616, 4726].into();
        let anti_forensics: HashSet<u32> = [1102, 104].into();
        let powershell: HashSet<u32> = [4104, 4103].into();
        let email_trust: HashSet<u32> = [4107, 4110].into();

        let mut all_interesting = HashSet::new();
        for set in [
            &file_access,
            &usb,
            &device_info,
            &network,
            &remote_access,
            &priv_esc,
            &anti_forensics,
            &powershell,
            &email_trust,
        ] {
            all_interesting.extend(set.iter().copied());
        }
        all_interesting.insert(4688);

        Self {
            file_access,
            usb,
            device_info,
            network,
            remote_access,
            priv_esc,
            anti_forensics,
            powershell,
            email_trust,
            all_interesting,
            descriptions: Self::descriptions(),
        }
    }

    /// Identifier set owned by `category`.
    pub fn ids(&self, category: Category) -> &HashSet<u32> {
        match category {
            Category::FileAccess => &self.file_access,
            Category::Usb => &self.usb,
            Category::Network => &self.network,
            Category::RemoteAccess => &self.remote_access,
            Category::PrivilegeEscalation => &self.priv_esc,
            Category::AntiForensics => &self.anti_forensics,
            Category::PowerShell => &self.powershell,
            Category::EmailTrust => &self.email_trust,
        }
    }

    /// The broader set of identifiers eligible for device-info examples.
    pub fn is_device_info(&self, event_id: u32) -> bool {
        self.device_info.contains(&event_id)
    }

    /// Whether rendering a description for this identifier can pay off.
    pub fn is_interesting(&self, event_id: u32) -> bool {
        self.all_interesting.contains(&event_id)
    }

    /// Canonical human-readable description for an identifier.
    pub fn description(&self, event_id: u32) -> Option<&'static str> {
        self.descriptions.get(&event_id).copied()
    }

    fn descriptions() -> HashMap<u32, &'static str> {
        HashMap::from([
            (4663, "File/folder access attempt"),
            (4656, "Handle to object requested"),
            (4658, "Handle to object closed"),
            (4660, "Object deleted"),
            (4670, "Permissions on object changed"),
            (5140, "Access to a network share"),
            (5142, "Network share added"),
            (5144, "Network share deleted"),
            (5145, "Network share checked for access"),
            (20001, "USB device connected (DriverFrameworks-UserMode)"),
            (2100, "USB device removed"),
            (2102, "USB device removal requested"),
            (2003, "USB device configured/removed"),
            (400, "Device install (Kernel-PnP)"),
            (410, "Device install (Kernel-PnP)"),
            (1006, "Storage/volume interaction"),
            (1010, "Storage/volume interaction"),
            (3003, "Device configured"),
            (3100, "Device started"),
            (3102, "Device removed"),
            (6416, "New external device recognized"),
            (6421, "PNP: Device enable requested"),
            (6422, "PNP: Device disable requested"),
            (6424, "PNP: Device property change"),
            (5156, "Allowed outbound network connection"),
            (5158, "TCP connection bind"),
            (5152, "Blocked connection"),
            (5154, "Allowed connection"),
            (624, "Legacy logon/account event"),
            (4624, "Successful logon"),
            (4625, "Failed logon"),
            (4634, "Logoff"),
            (4647, "User-initiated logoff"),
            (4776, "Credential validation"),
            (4648, "Logon using explicit credentials"),
            (4800, "Workstation locked"),
            (4801, "Workstation unlocked"),
            (4778, "RDP session reconnected"),
            (4779, "RDP session disconnected"),
            (1149, "Successful RDP authentication"),
            (4672, "Special privileges assigned to new logon"),
            (4697, "Service installed"),
            (4720, "User account created"),
            (4732, "User added to local group"),
            (4728, "User added to privileged/AD group"),
            (4616, "System time changed"),
            (4726, "User account deleted"),
            (1102, "Security audit log cleared"),
            (104, "System event log cleared"),
            (4104, "PowerShell script block logged"),
            (4103, "PowerShell command logged"),
            (4107, "Certificate / trust error (Outlook/WinTrust)"),
            (4110, "Certificate / trust chain issue"),
        ])
    }
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_membership() {
        let taxonomy = Taxonomy::new();
        assert!(taxonomy.ids(Category::RemoteAccess).contains(&4624));
        assert!(taxonomy.ids(Category::PowerShell).contains(&4104));
        assert!(!taxonomy.ids(Category::Network).contains(&4624));
    }

    #[test]
    fn test_device_info_is_subset_of_usb() {
        let taxonomy = Taxonomy::new();
        assert!(taxonomy.is_device_info(20001));
        // 3100 qualifies for raw-USB correlation but not for the example list.
        assert!(taxonomy.ids(Category::Usb).contains(&3100));
        assert!(!taxonomy.is_device_info(3100));
    }

    #[test]
    fn test_interesting_covers_process_creation() {
        let taxonomy = Taxonomy::new();
        assert!(taxonomy.is_interesting(4688));
        assert!(taxonomy.is_interesting(1102));
        assert!(!taxonomy.is_interesting(7045));
    }

    #[test]
    fn test_description_lookup() {
        let taxonomy = Taxonomy::new();
        assert_eq!(taxonomy.description(4624), Some("Successful logon"));
        assert_eq!(taxonomy.description(9999), None);
    }
}
