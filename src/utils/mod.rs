//! Common utilities and helper functions
//!
//! This module provides shared utilities used across the application.

pub mod error;
pub mod retry;

use chrono::{DateTime, Local};

/// First `max_chars` characters of `text`
///
/// Counts characters, not bytes, so multi-byte Japanese text is never split
/// inside a code point.
pub fn char_prefix(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Truncate text to a maximum number of characters, appending an ellipsis
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        format!("{}...", char_prefix(text, max_chars.saturating_sub(3)))
    }
}

/// Build `{prefix}_{YYYYmmdd_HHMMSS}.{ext}`
pub fn timestamped_file_name(prefix: &str, ext: &str, now: DateTime<Local>) -> String {
    format!("{prefix}_{}.{ext}", now.format("%Y%m%d_%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_char_prefix_is_char_based() {
        assert_eq!(char_prefix("充電できました", 2), "充電");
        assert_eq!(char_prefix("abc", 10), "abc");
        assert_eq!(char_prefix("", 3), "");
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("very long text here", 10), "very lo...");
        assert_eq!(truncate_text("東京都江東区有明二丁目", 6), "東京都...");
    }

    #[test]
    fn test_timestamped_file_name() {
        let now = Local.with_ymd_and_hms(2026, 2, 8, 11, 40, 46).unwrap();
        assert_eq!(
            timestamped_file_name("gogoev_reviews", "csv", now),
            "gogoev_reviews_20260208_114046.csv"
        );
    }
}
