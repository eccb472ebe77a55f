//! Shared utility functions used across multiple modules.

/// Trim text, mapping blank input to `None`.
///
/// Group names and member emails go through this before any remote call.
pub fn normalize_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Check for an explicit http(s) scheme.
pub fn is_http_url(value: &str) -> bool {
    ["http://", "https://"]
        .iter()
        .any(|scheme| value.starts_with(scheme))
}

/// Cap text for inclusion in error messages, so a remote error page does not
/// flood the log.
pub fn compact_text(value: &str) -> String {
    const MAX_CHARS: usize = 180;
    let trimmed = value.trim();
    trimmed.char_indices().nth(MAX_CHARS).map_or_else(
        || trimmed.to_string(),
        |(cut, _)| trimmed[..cut].to_string(),
    )
}

/// Current Unix timestamp in milliseconds.
///
/// Posts are keyed by millisecond timestamps to match the remote store's
/// file creation times.
pub fn unix_timestamp_now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_rejects_blank_input() {
        assert_eq!(normalize_text(""), None);
        assert_eq!(normalize_text("   "), None);
    }

    #[test]
    fn normalize_text_trims_value() {
        assert_eq!(normalize_text(" Summer Trip "), Some("Summer Trip".to_string()));
    }

    #[test]
    fn is_http_url_accepts_valid_schemes() {
        assert!(is_http_url("http://localhost"));
        assert!(is_http_url("https://example.com"));
        assert!(!is_http_url("ftp://example.com"));
        assert!(!is_http_url("example.com"));
    }

    #[test]
    fn compact_text_caps_length() {
        let long = "x".repeat(500);
        assert_eq!(compact_text(&long).len(), 180);
        assert_eq!(compact_text("  short  "), "short");
    }
}
