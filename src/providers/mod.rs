//! Model gateway subsystem.
//!
//! [`GeminiClient`] is the single production backend, reached through the
//! [`TextGenerator`] trait so the analysis service stays testable without
//! network access.

pub mod gemini;
pub mod traits;

pub use gemini::GeminiClient;
pub use traits::TextGenerator;

const MAX_API_ERROR_CHARS: usize = 200;

/// Redact `key=`-style credential query values.
fn scrub_secret_patterns(input: &str) -> String {
    let mut scrubbed = input.to_string();
    let mut search_from = 0;

    while let Some(found) = scrubbed[search_from..].find("key=") {
        let start = search_from + found + "key=".len();
        let end = scrubbed[start..]
            .find(|c: char| c == '&' || c == '"' || c.is_whitespace())
            .map_or(scrubbed.len(), |idx| start + idx);
        if end > start {
            scrubbed.replace_range(start..end, "[REDACTED]");
        }
        search_from = start + "[REDACTED]".len().min(scrubbed.len() - start);
    }

    scrubbed
}

/// Sanitize upstream error text before it reaches logs: scrub secrets and
/// cap the length on a char boundary.
pub fn sanitize_api_error(input: &str) -> String {
    let scrubbed = scrub_secret_patterns(input);

    if scrubbed.chars().count() <= MAX_API_ERROR_CHARS {
        return scrubbed;
    }

    let mut end = MAX_API_ERROR_CHARS;
    while end > 0 && !scrubbed.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &scrubbed[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_error_passes_through() {
        assert_eq!(sanitize_api_error("400 Bad Request"), "400 Bad Request");
    }

    #[test]
    fn long_error_is_truncated_with_ellipsis() {
        let long = "x".repeat(500);
        let out = sanitize_api_error(&long);
        assert!(out.ends_with("..."));
        assert!(out.chars().count() <= MAX_API_ERROR_CHARS + 3);
    }

    #[test]
    fn key_query_values_are_redacted() {
        let out = sanitize_api_error("POST /v1beta/models?key=AIzaSySECRET failed");
        assert!(!out.contains("AIzaSySECRET"));
        assert!(out.contains("[REDACTED]"));
    }

    #[test]
    fn redaction_stops_at_delimiters() {
        let out = sanitize_api_error("url?key=SECRET&alt=json");
        assert!(out.contains("&alt=json"));
        assert!(!out.contains("SECRET"));
    }

    #[test]
    fn truncation_respects_multibyte_boundaries() {
        let long = "é".repeat(300);
        let out = sanitize_api_error(&long);
        assert!(out.ends_with("..."));
    }
}
