//! Record classification module
//!
//! Decides, for one record, which forensic categories it belongs to and
//! whether it is eligible for device correlation or process-indicator
//! scanning. Identifier membership alone is not enough: the same numeric
//! identifier is reused by unrelated logging subsystems, so every category
//! match is qualified by a provider rule. Pure; the aggregator applies the
//! returned decision.

use crate::models::Category;
use crate::taxonomy::Taxonomy;
use crate::util::contains_ignore_case;

pub const SECURITY_AUDITING_PROVIDER: &str = "Microsoft-Windows-Security-Auditing";
pub const EVENT_LOG_PROVIDER: &str = "Microsoft-Windows-Eventlog";

pub const PROCESS_CREATION: u32 = 4688;
pub const SCRIPT_BLOCK: u32 = 4104;
const RDP_AUTHENTICATION: u32 = 1149;
const SECURITY_LOG_CLEARED: u32 = 1102;
const SYSTEM_LOG_CLEARED: u32 = 104;

/// Provider substrings that mark plug-and-play / storage-stack subsystems.
const PNP_PROVIDER_MARKERS: &[&str] = &[
    "Kernel-PnP",
    "DriverFrameworks-UserMode",
    "UserPnp",
    "StorPort",
    "USB",
    "Volume",
    "Partition",
    "Disk",
];

/// Provider substrings that mark certificate/trust subsystems.
const TRUST_PROVIDER_MARKERS: &[&str] = &["CAPI", "Certificate", "Crypto", "WinTrust"];

/// Provider substrings that mark the RDP connection broker.
const RDP_PROVIDER_MARKERS: &[&str] = &["TerminalServices", "RemoteConnectionManager"];

/// Classification decision for one record.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    /// Matched categories. At most one in practice; the taxonomy keeps the
    /// identifier sets disjoint per subsystem.
    pub categories: Vec<Category>,
    /// Eligible for the per-identifier device-info example list.
    pub device_info: bool,
    /// Eligible for device correlation.
    pub usb_raw: bool,
    /// Process-creation or script-block record, eligible for the
    /// exfiltration-indicator scan.
    pub process_scan: bool,
}

impl Classification {
    /// Focused records feed the timeline and the forensic-interest tally.
    pub fn focused(&self) -> bool {
        !self.categories.is_empty()
    }
}

pub struct Classifier<'a> {
    taxonomy: &'a Taxonomy,
}

impl<'a> Classifier<'a> {
    pub fn new(taxonomy: &'a Taxonomy) -> Self {
        Self { taxonomy }
    }

    pub fn classify(&self, event_id: u32, provider: &str) -> Classification {
        let security = provider.eq_ignore_ascii_case(SECURITY_AUDITING_PROVIDER);
        let pnp = is_pnp_provider(provider);

        let mut categories = Vec::new();
        let mut push = |category: Category, qualified: bool| {
            if qualified && self.taxonomy.ids(category).contains(&event_id) {
                categories.push(category);
            }
        };

        push(Category::FileAccess, security);
        push(Category::Usb, pnp);
        push(Category::Network, security);
        push(
            Category::RemoteAccess,
            if event_id == RDP_AUTHENTICATION {
                matches_any(provider, RDP_PROVIDER_MARKERS)
            } else {
                security
            },
        );
        push(Category::PrivilegeEscalation, security);
        push(
            Category::AntiForensics,
            match event_id {
                SECURITY_LOG_CLEARED => security,
                SYSTEM_LOG_CLEARED => provider.eq_ignore_ascii_case(EVENT_LOG_PROVIDER),
                _ => false,
            },
        );
        push(Category::PowerShell, contains_ignore_case(provider, "PowerShell"));
        push(Category::EmailTrust, matches_any(provider, TRUST_PROVIDER_MARKERS));

        Classification {
            usb_raw: categories.contains(&Category::Usb),
            device_info: self.taxonomy.is_device_info(event_id) && pnp,
            process_scan: event_id == PROCESS_CREATION || event_id == SCRIPT_BLOCK,
            categories,
        }
    }
}

fn is_pnp_provider(provider: &str) -> bool {
    matches_any(provider, PNP_PROVIDER_MARKERS)
}

fn matches_any(provider: &str, markers: &[&str]) -> bool {
    markers
        .iter()
        .any(|marker| contains_ignore_case(provider, marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(event_id: u32, provider: &str) -> Classification {
        let taxonomy = Taxonomy::new();
        Classifier::new(&taxonomy).classify(event_id, provider)
    }

    #[test]
    fn test_logon_requires_security_auditing_provider() {
        let cls = classify(4624, SECURITY_AUDITING_PROVIDER);
        assert_eq!(cls.categories, vec![Category::RemoteAccess]);
        assert!(cls.focused());

        let cls = classify(4624, "Some-Other-Provider");
        assert!(cls.categories.is_empty());
        assert!(!cls.focused());
    }

    #[test]
    fn test_rdp_authentication_uses_terminal_services_rule() {
        let provider = "Microsoft-Windows-TerminalServices-RemoteConnectionManager";
        assert_eq!(classify(1149, provider).categories, vec![Category::RemoteAccess]);
        assert!(classify(1149, SECURITY_AUDITING_PROVIDER).categories.is_empty());
    }

    #[test]
    fn test_usb_matches_any_pnp_provider_marker() {
        for provider in [
            "Microsoft-Windows-Kernel-PnP",
            "Microsoft-Windows-DriverFrameworks-UserMode",
            "Microsoft-Windows-UserPnp",
            "Microsoft-Windows-StorPort",
            "Microsoft-Windows-Partition",
            "disk",
        ] {
            let cls = classify(2102, provider);
            assert_eq!(cls.categories, vec![Category::Usb], "provider {provider}");
            assert!(cls.usb_raw);
        }
        assert!(classify(2102, SECURITY_AUDITING_PROVIDER).categories.is_empty());
    }

    #[test]
    fn test_log_clear_rules_are_provider_specific() {
        assert_eq!(
            classify(1102, SECURITY_AUDITING_PROVIDER).categories,
            vec![Category::AntiForensics]
        );
        assert_eq!(
            classify(104, EVENT_LOG_PROVIDER).categories,
            vec![Category::AntiForensics]
        );
        // Crossed providers do not qualify.
        assert!(classify(1102, EVENT_LOG_PROVIDER).categories.is_empty());
        assert!(classify(104, SECURITY_AUDITING_PROVIDER).categories.is_empty());
    }

    #[test]
    fn test_powershell_provider_contains_match() {
        let cls = classify(4104, "Microsoft-Windows-PowerShell");
        assert_eq!(cls.categories, vec![Category::PowerShell]);
        assert!(cls.process_scan);
        assert!(classify(4104, "PowerShellCore").focused());
        assert!(!classify(4104, "Microsoft-Windows-Sysmon").focused());
    }

    #[test]
    fn test_email_trust_markers() {
        for provider in ["Microsoft-Windows-CAPI2", "CertificateServicesClient", "WinTrust"] {
            assert_eq!(
                classify(4107, provider).categories,
                vec![Category::EmailTrust],
                "provider {provider}"
            );
        }
    }

    #[test]
    fn test_process_scan_eligibility_ignores_provider() {
        assert!(classify(PROCESS_CREATION, SECURITY_AUDITING_PROVIDER).process_scan);
        assert!(classify(PROCESS_CREATION, "anything").process_scan);
        assert!(classify(SCRIPT_BLOCK, "Microsoft-Windows-PowerShell").process_scan);
        assert!(!classify(4624, SECURITY_AUDITING_PROVIDER).process_scan);
    }

    #[test]
    fn test_device_info_is_narrower_than_usb_raw() {
        let cls = classify(3100, "Microsoft-Windows-Kernel-PnP");
        assert!(cls.usb_raw);
        assert!(!cls.device_info);

        let cls = classify(20001, "Microsoft-Windows-DriverFrameworks-UserMode");
        assert!(cls.usb_raw);
        assert!(cls.device_info);
    }

    #[test]
    fn test_unlisted_identifier_matches_nothing() {
        let cls = classify(7045, SECURITY_AUDITING_PROVIDER);
        assert!(cls.categories.is_empty());
        assert!(!cls.device_info && !cls.usb_raw && !cls.process_scan);
    }
}
