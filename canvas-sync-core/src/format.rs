//! Text helpers shared by page payloads and notification messages.
//!
//! The public helpers never fail: on a [`FormatError`] they log and hand back
//! the raw input. The `try_` variants expose the error for callers and tests.

use std::borrow::Cow;
use std::sync::OnceLock;

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::{Captures, Regex};
use tracing::debug;

use crate::errors::FormatError;

/// Timestamp layout the LMS uses for due/unlock/lock/posted dates.
const SOURCE_TIMESTAMP: &str = "%Y-%m-%dT%H:%M:%SZ";
/// Human-facing layout, e.g. `May 01, 2024, 12:00 AM`.
const DISPLAY_TIMESTAMP: &str = "%b %d, %Y, %I:%M %p";

/// Characters Telegram's MarkdownV2 mode requires to be escaped.
const MARKDOWN_V2_SPECIAL: &[char] = &[
    '\\', '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

fn comment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<!--.*?-->").expect("comment pattern"))
}

fn hidden_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)\s*>").expect("hidden block pattern")
    })
}

fn block_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)</?(p|div|br|li|ul|ol|h[1-6]|tr|td|th|table|blockquote|pre|hr|section|article)\b[^>]*>")
            .expect("block tag pattern")
    })
}

fn any_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag pattern"))
}

fn entity_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").expect("entity pattern"))
}

/// Extracts readable text from an HTML fragment, one block per line.
///
/// Malformed markup (a tag opened but never closed) yields the input unchanged.
pub fn clean_html(html: &str) -> String {
    match try_clean_html(html) {
        Ok(text) => text,
        Err(e) => {
            debug!(error = %e, "Falling back to raw HTML");
            html.to_string()
        }
    }
}

pub fn try_clean_html(html: &str) -> Result<String, FormatError> {
    let without_comments = comment_re().replace_all(html, "");
    check_tags(&without_comments)?;

    let visible = hidden_block_re().replace_all(&without_comments, "");
    let broken = block_tag_re().replace_all(&visible, "\n");
    let stripped = any_tag_re().replace_all(&broken, "");
    let decoded = decode_entities(&stripped);

    let text = decoded
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    Ok(text)
}

/// Rejects a `<` that starts markup but is never closed by `>`.
fn check_tags(html: &str) -> Result<(), FormatError> {
    let bytes = html.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'<' {
            let starts_markup = bytes
                .get(i + 1)
                .is_some_and(|c| c.is_ascii_alphabetic() || *c == b'/' || *c == b'!');
            if starts_markup {
                match html[i + 1..].find(['>', '<']) {
                    Some(offset) if bytes[i + 1 + offset] == b'>' => {
                        i += offset + 2;
                        continue;
                    }
                    _ => return Err(FormatError::UnterminatedTag { position: i }),
                }
            }
        }
        i += 1;
    }
    Ok(())
}

fn decode_entities(text: &str) -> Cow<'_, str> {
    entity_re().replace_all(text, |caps: &Captures| {
        let name = &caps[1];
        let decoded = match name {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some(' '),
            _ if name.starts_with("#x") || name.starts_with("#X") => {
                u32::from_str_radix(&name[2..], 16).ok().and_then(char::from_u32)
            }
            _ if name.starts_with('#') => name[1..].parse::<u32>().ok().and_then(char::from_u32),
            _ => None,
        };
        match decoded {
            Some(c) => c.to_string(),
            None => caps[0].to_string(),
        }
    })
}

/// Reformats an LMS timestamp for display, or returns it unchanged if it does not parse.
pub fn format_datetime(timestamp: &str) -> String {
    match try_format_datetime(timestamp) {
        Ok(formatted) => formatted,
        Err(e) => {
            debug!(error = %e, "Keeping raw timestamp");
            timestamp.to_string()
        }
    }
}

pub fn try_format_datetime(timestamp: &str) -> Result<String, FormatError> {
    NaiveDateTime::parse_from_str(timestamp, SOURCE_TIMESTAMP)
        .or_else(|_| {
            DateTime::parse_from_rfc3339(timestamp).map(|dt| dt.with_timezone(&Utc).naive_utc())
        })
        .map(|dt| dt.format(DISPLAY_TIMESTAMP).to_string())
        .map_err(|_| FormatError::Timestamp {
            value: timestamp.to_string(),
        })
}

/// Escapes text for Telegram's MarkdownV2 parse mode.
pub fn escape_markdown_v2(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if MARKDOWN_V2_SPECIAL.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Limits `text` to `max` characters, marking a cut with a trailing ellipsis.
pub fn clamp_chars(text: &str, max: usize) -> Cow<'_, str> {
    if text.chars().count() <= max {
        return Cow::Borrowed(text);
    }
    let mut clamped: String = text.chars().take(max.saturating_sub(1)).collect();
    clamped.push('…');
    Cow::Owned(clamped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_block_text_and_entities() {
        let html = "<p>Exam moved to <b>Friday</b> &amp; room 204.</p><p>Bring&nbsp;ID</p><br/><ul><li>pen</li><li>calculator</li></ul>";
        assert_eq!(
            clean_html(html),
            "Exam moved to Friday & room 204.\nBring ID\npen\ncalculator"
        );
    }

    #[test]
    fn drops_scripts_styles_and_comments() {
        let html = "<style>p{color:red}</style><!-- hidden --><p>Visible</p><script>alert(1)</script>";
        assert_eq!(clean_html(html), "Visible");
    }

    #[test]
    fn keeps_bare_less_than_in_text() {
        assert_eq!(clean_html("<p>a < b &#60; c</p>"), "a < b < c");
    }

    #[test]
    fn malformed_html_is_returned_unchanged() {
        let html = "<p>Read chapter 3 <a href=\"x\"";
        assert!(try_clean_html(html).is_err());
        assert_eq!(clean_html(html), html);
    }

    #[test]
    fn formats_lms_timestamp() {
        assert_eq!(format_datetime("2024-05-01T00:00:00Z"), "May 01, 2024, 12:00 AM");
        assert_eq!(format_datetime("2024-05-01T13:45:00Z"), "May 01, 2024, 01:45 PM");
    }

    #[test]
    fn formats_offset_timestamp_in_utc() {
        assert_eq!(
            format_datetime("2024-05-01T09:30:00+07:00"),
            "May 01, 2024, 02:30 AM"
        );
    }

    #[test]
    fn unparseable_timestamp_is_kept() {
        assert_eq!(format_datetime("next tuesday"), "next tuesday");
    }

    #[test]
    fn escapes_markdown_v2_specials() {
        assert_eq!(escape_markdown_v2("HW-1 (v2).pdf!"), "HW\\-1 \\(v2\\)\\.pdf\\!");
    }

    #[test]
    fn clamps_long_text() {
        assert_eq!(clamp_chars("short", 10), "short");
        assert_eq!(clamp_chars("abcdefgh", 5), "abcd…");
        assert_eq!(clamp_chars("ééééé", 5), "ééééé");
    }
}
