//! Small shared helpers.

/// Case-insensitive substring test (ASCII case folding, which covers
/// provider names and the driver/process markers we scan for).
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    if needle.len() > haystack.len() {
        return false;
    }
    haystack
        .to_ascii_lowercase()
        .contains(&needle.to_ascii_lowercase())
}

/// Cap `text` at `max` characters, marking truncation with an ellipsis.
pub fn truncate_sample(text: &str, max: usize) -> String {
    let mut chars = text.char_indices();
    match chars.nth(max) {
        Some((byte_index, _)) => format!("{}...", &text[..byte_index]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_ignore_case() {
        assert!(contains_ignore_case("Microsoft-Windows-Kernel-PnP", "kernel-pnp"));
        assert!(contains_ignore_case("cmd /c OneDrive.exe", "ONEDRIVE.EXE"));
        assert!(!contains_ignore_case("short", "much longer needle"));
    }

    #[test]
    fn test_truncate_sample_caps_and_marks() {
        let long = "x".repeat(250);
        let truncated = truncate_sample(&long, 200);
        assert_eq!(truncated.len(), 203);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn test_truncate_sample_leaves_short_text_alone() {
        assert_eq!(truncate_sample("short", 200), "short");
        let exact = "y".repeat(200);
        assert_eq!(truncate_sample(&exact, 200), exact);
    }
}
