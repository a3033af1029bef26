//! Reusable helper functions used across the codebase.

/// Truncate a string to at most `max_chars` characters, appending `marker`
/// when something was cut.
///
/// Safe on multi-byte UTF-8 (emoji, CJK, accented characters): the cut
/// happens on character boundaries, never byte indices.
pub fn truncate_chars_with_marker(s: &str, max_chars: usize, marker: &str) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => {
            let truncated = &s[..idx];
            format!("{}{marker}", truncated.trim_end())
        }
        None => s.to_string(),
    }
}

/// Truncate an outbound chat message, appending an ellipsis when cut.
/// The limit leaves headroom under Telegram's hard 4096-character cap.
pub fn truncate_for_chat(text: &str, max_chars: usize) -> String {
    truncate_chars_with_marker(text, max_chars, "\n…")
}

/// Escape text for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_short_string_is_unchanged() {
        assert_eq!(truncate_chars_with_marker("hello", 10, "..."), "hello");
        assert_eq!(truncate_chars_with_marker("hello", 5, "..."), "hello");
    }

    #[test]
    fn truncate_appends_marker() {
        assert_eq!(
            truncate_chars_with_marker("hello world", 5, "\n...[text truncated]"),
            "hello\n...[text truncated]"
        );
    }

    #[test]
    fn truncate_trims_trailing_whitespace_before_marker() {
        assert_eq!(truncate_chars_with_marker("hello   world", 7, "…"), "hello…");
    }

    #[test]
    fn truncate_respects_multibyte_boundaries() {
        assert_eq!(truncate_chars_with_marker("😀😀😀😀", 2, "…"), "😀😀…");
        assert_eq!(truncate_chars_with_marker("café résumé", 4, "…"), "café…");
    }

    #[test]
    fn truncate_empty_string() {
        assert_eq!(truncate_chars_with_marker("", 10, "…"), "");
    }

    #[test]
    fn chat_truncation_appends_ellipsis() {
        let long = "a".repeat(50);
        let out = truncate_for_chat(&long, 10);
        assert!(out.ends_with('…'));
        assert!(out.chars().count() <= 12);
    }

    #[test]
    fn escape_html_replaces_special_characters() {
        assert_eq!(escape_html("<b>&</b>"), "&lt;b&gt;&amp;&lt;/b&gt;");
        assert_eq!(escape_html("plain text"), "plain text");
    }
}
