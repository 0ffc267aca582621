//! Rendering of a `LogEntry` as a human-readable HTML alert.

use tw_log_tools::LogEntry;

/// Telegram rejects messages longer than this (in characters).
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Room kept for the header lines around the message body.
const HEADER_BUDGET: usize = 512;

/// Emoji shown in front of the severity label.
pub fn emoji_for_level(level: &str) -> &'static str {
    match level.to_lowercase().as_str() {
        "critical" => "🚨",
        "error" => "❌",
        "warning" => "⚠️",
        "alert" => "🔔",
        "emergency" => "🆘",
        _ => "📌",
    }
}

/// Escape the characters Telegram's HTML parse mode treats as markup.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape `text`, keeping the escaped result within `max` characters.
///
/// When the text does not fit it is cut on a character boundary (never
/// inside an entity) and ends with `…`.
pub fn escape_html_truncated(text: &str, max: usize) -> String {
    let escaped = escape_html(text);
    if escaped.chars().count() <= max {
        return escaped;
    }

    let limit = max.saturating_sub(1);
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let piece = escape_html(c.encode_utf8(&mut [0; 4]));
        let len = piece.chars().count();
        if used + len > limit {
            break;
        }
        out.push_str(&piece);
        used += len;
    }
    out.push('…');
    out
}

/// Render the alert text for `entry`.
pub fn render_message(entry: &LogEntry) -> String {
    let level = entry.level.to_uppercase();
    let emoji = emoji_for_level(&entry.level);
    let environment = escape_html_truncated(&entry.environment, 128);
    let body = escape_html_truncated(&entry.message, MAX_MESSAGE_CHARS - HEADER_BUDGET);

    format!(
        "{emoji} <b>{level}</b> detected in <b>{environment}</b>\n\n\
         ⏰ <b>Time:</b> {}\n\
         📝 <b>Message:</b>\n<code>{body}</code>",
        entry.timestamp
    )
}
