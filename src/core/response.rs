//! Response text utilities: Discord length limits and time display
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: Local time formatting and content previews for memo replies
//! - 1.0.0: Message chunking and truncation

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Discord message content limit
pub const MESSAGE_LIMIT: usize = 2000;

/// How memo times are shown to users
pub const DISPLAY_TIME_FORMAT: &str = "%A, %B %-d, %Y at %H:%M %Z";

/// Chunk text into pieces that fit Discord limits (UTF-8 safe, line-aware)
///
/// Prefers splitting at newlines and falls back to character boundaries for
/// lines longer than `max_size`.
pub fn chunk_text(text: &str, max_size: usize) -> Vec<String> {
    if text.len() <= max_size {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        let line_with_newline = format!("{line}\n");
        if current.len() + line_with_newline.len() > max_size {
            if !current.is_empty() {
                chunks.push(current.trim_end().to_string());
                current = String::new();
            }
            if line_with_newline.len() > max_size {
                chunks.extend(chunk_long_line(line, max_size));
            } else {
                current = line_with_newline;
            }
        } else {
            current.push_str(&line_with_newline);
        }
    }
    if !current.is_empty() {
        chunks.push(current.trim_end().to_string());
    }
    chunks
}

fn chunk_long_line(line: &str, max_size: usize) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = String::new();

    for ch in line.chars() {
        if current.len() + ch.len_utf8() > max_size && !current.is_empty() {
            result.push(current);
            current = String::new();
        }
        current.push(ch);
    }

    if !current.is_empty() {
        result.push(current);
    }

    result
}

/// Chunk text for message content (2000 byte limit)
pub fn chunk_for_message(text: &str) -> Vec<String> {
    chunk_text(text, MESSAGE_LIMIT)
}

/// Truncate to at most `limit` bytes, ending with "..." when cut
pub fn truncate_bytes(text: &str, limit: usize) -> String {
    if text.len() <= limit {
        return text.to_string();
    }
    let mut end = limit.saturating_sub(3);
    while !text.is_char_boundary(end) && end > 0 {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

/// Truncate text to fit message limit, adding ellipsis if needed
pub fn truncate_for_message(text: &str) -> String {
    truncate_bytes(text, MESSAGE_LIMIT)
}

/// Short single-line preview of memo content (character based)
pub fn preview(content: &str, max_chars: usize) -> String {
    let flat = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let cut: String = flat.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", cut.trim_end())
}

/// Render an instant in the configured timezone, e.g. "Thursday, March 7, 2024 at 15:30 EST"
pub fn format_local_time(instant: DateTime<Utc>, tz: Tz) -> String {
    instant.with_timezone(&tz).format(DISPLAY_TIME_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_no_chunk() {
        let result = chunk_text("hello", 100);
        assert_eq!(result, vec!["hello"]);
    }

    #[test]
    fn test_chunk_respects_lines() {
        let text = "line1\nline2\nline3";
        let result = chunk_text(text, 12);
        assert!(result.len() >= 2);
        for chunk in &result {
            assert!(!chunk.ends_with('\n'));
        }
    }

    #[test]
    fn test_chunk_handles_long_lines() {
        let result = chunk_text(&"a".repeat(100), 30);
        assert!(result.len() >= 3);
        for chunk in &result {
            assert!(chunk.len() <= 30);
        }
    }

    #[test]
    fn test_message_limit() {
        let result = chunk_for_message(&"a".repeat(3000));
        assert!(result.len() >= 2);
        assert!(result[0].len() <= MESSAGE_LIMIT);
    }

    #[test]
    fn test_truncate_for_message() {
        assert_eq!(truncate_for_message("short"), "short");

        let result = truncate_for_message(&"日本".repeat(1000));
        assert!(result.len() <= MESSAGE_LIMIT);
        assert!(result.ends_with("..."));
    }

    #[test]
    fn test_preview() {
        assert_eq!(preview("buy milk", 50), "buy milk");
        assert_eq!(preview("line one\nline two", 50), "line one line two");

        let long = "x".repeat(80);
        let result = preview(&long, 50);
        assert_eq!(result.chars().count(), 50);
        assert!(result.ends_with("..."));
    }

    #[test]
    fn test_format_local_time() {
        let instant = DateTime::parse_from_rfc3339("2024-03-07T20:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(
            format_local_time(instant, chrono_tz::America::New_York),
            "Thursday, March 7, 2024 at 15:30 EST"
        );
        assert_eq!(
            format_local_time(instant, chrono_tz::UTC),
            "Thursday, March 7, 2024 at 20:30 UTC"
        );
    }
}
