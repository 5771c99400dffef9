//! Noise suppression module
//!
//! Drops specific high-volume benign variants of two event types before they
//! reach classification, and pulls the logon target account out of the same
//! structured-field lookup. Malformed or absent fields always resolve to
//! "not noise" rather than failing the run.

use crate::models::EventRecord;

pub const SUCCESSFUL_LOGON: u32 = 4624;
pub const SPECIAL_PRIVILEGES: u32 = 4672;

/// LogonType value of service logons (the dominant benign 4624 variant).
const SERVICE_LOGON_TYPE: &str = "5";

/// Well-known SID of the local system account.
const LOCAL_SYSTEM_SID: &str = "S-1-5-18";

/// Outcome of the noise inspection for one record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoiseVerdict {
    /// True when the record must be dropped entirely.
    pub noise: bool,
    /// Logon target account worth recording, if any. Extracted even when
    /// the record itself is judged noise; the logon type alone owns the
    /// drop decision.
    pub user: Option<String>,
}

/// Inspect one record. Only successful-logon and special-privilege events
/// are ever subject to suppression.
pub fn inspect(record: &EventRecord) -> NoiseVerdict {
    match record.event_id {
        SUCCESSFUL_LOGON => NoiseVerdict {
            noise: record
                .field("LogonType")
                .is_some_and(|v| v.trim() == SERVICE_LOGON_TYPE),
            user: extract_target_user(record),
        },
        SPECIAL_PRIVILEGES => NoiseVerdict {
            noise: record
                .field("SubjectUserSid")
                .is_some_and(|v| v.trim().eq_ignore_ascii_case(LOCAL_SYSTEM_SID)),
            user: None,
        },
        _ => NoiseVerdict::default(),
    }
}

/// Logon target account, filtered down to human users: machine accounts,
/// the system account, window-manager/font-driver service sessions, and the
/// built-in service identities are all skipped.
fn extract_target_user(record: &EventRecord) -> Option<String> {
    let user = record.field("TargetUserName")?.trim();
    if user.is_empty() || user.ends_with('$') {
        return None;
    }
    let upper = user.to_ascii_uppercase();
    if upper == "SYSTEM"
        || upper.starts_with("DWM-")
        || upper.starts_with("UMFD-")
        || upper == "LOCAL SERVICE"
        || upper == "NETWORK SERVICE"
        || upper == "ANONYMOUS LOGON"
    {
        return None;
    }
    Some(user.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logon_record(fields: &[(&str, &str)]) -> EventRecord {
        record(SUCCESSFUL_LOGON, fields)
    }

    fn record(event_id: u32, fields: &[(&str, &str)]) -> EventRecord {
        EventRecord {
            time: None,
            event_id,
            provider: Some("Microsoft-Windows-Security-Auditing".to_string()),
            host: String::new(),
            channel: None,
            task: None,
            task_failed: false,
            message: None,
            message_failed: false,
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_service_logon_is_noise() {
        let verdict = inspect(&logon_record(&[("LogonType", "5")]));
        assert!(verdict.noise);
    }

    #[test]
    fn test_interactive_logon_is_not_noise() {
        let verdict = inspect(&logon_record(&[("LogonType", "2")]));
        assert!(!verdict.noise);
    }

    #[test]
    fn test_user_extracted_even_from_noise_record() {
        let verdict = inspect(&logon_record(&[("LogonType", "5"), ("TargetUserName", "alice")]));
        assert!(verdict.noise);
        assert_eq!(verdict.user.as_deref(), Some("alice"));
    }

    #[test]
    fn test_service_and_machine_accounts_are_filtered() {
        for name in [
            "WORKSTATION$",
            "SYSTEM",
            "system",
            "DWM-1",
            "dwm-2",
            "UMFD-0",
            "LOCAL SERVICE",
            "NETWORK SERVICE",
            "ANONYMOUS LOGON",
            "",
            "   ",
        ] {
            let verdict = inspect(&logon_record(&[("TargetUserName", name)]));
            assert_eq!(verdict.user, None, "{name:?} should be filtered");
        }
    }

    #[test]
    fn test_user_casing_is_preserved() {
        let verdict = inspect(&logon_record(&[("TargetUserName", " Alice ")]));
        assert_eq!(verdict.user.as_deref(), Some("Alice"));
    }

    #[test]
    fn test_privilege_event_from_local_system_is_noise() {
        let verdict = inspect(&record(SPECIAL_PRIVILEGES, &[("SubjectUserSid", "S-1-5-18")]));
        assert!(verdict.noise);

        let verdict = inspect(&record(SPECIAL_PRIVILEGES, &[("SubjectUserSid", "s-1-5-18 ")]));
        assert!(verdict.noise);
    }

    #[test]
    fn test_privilege_event_from_real_user_is_kept() {
        let verdict = inspect(&record(
            SPECIAL_PRIVILEGES,
            &[("SubjectUserSid", "S-1-5-21-1004336348-1177238915-682003330-512")],
        ));
        assert!(!verdict.noise);
    }

    #[test]
    fn test_missing_fields_resolve_to_not_noise() {
        assert!(!inspect(&logon_record(&[])).noise);
        assert!(!inspect(&record(SPECIAL_PRIVILEGES, &[])).noise);
    }

    #[test]
    fn test_other_events_are_never_noise() {
        let verdict = inspect(&record(4625, &[("LogonType", "5")]));
        assert!(!verdict.noise);
        assert_eq!(verdict.user, None);
    }
}
