//! Entry parser for `[YYYY-MM-DD HH:MM:SS] env.LEVEL: message` lines.
//!
//! Lines that do not fit the grammar (stack-trace continuations, blank
//! lines, other formats) are not errors: they simply produce `None` and the
//! caller skips them.

use regex::Regex;
use std::sync::LazyLock;

use crate::types::LogEntry;

static RE_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\[([0-9]{4}-[0-9]{2}-[0-9]{2} [0-9]{2}:[0-9]{2}:[0-9]{2})\]\s+([A-Za-z0-9_]+)\.([A-Za-z0-9_]+):(?:\s+(.*))?$",
    )
    .unwrap()
});

/// Parse a single line into a `LogEntry`.
///
/// Surrounding whitespace is ignored. The level is lower-cased, every other
/// captured field is kept verbatim and `raw` holds the untrimmed input.
pub fn parse(line: &str) -> Option<LogEntry> {
    let caps = RE_ENTRY.captures(line.trim())?;

    Some(LogEntry {
        timestamp: caps[1].to_string(),
        environment: caps[2].to_string(),
        level: caps[3].to_lowercase(),
        message: caps.get(4).map_or_else(String::new, |m| m.as_str().to_string()),
        raw: line.to_string(),
    })
}

/// Parse every matching line, silently dropping the rest.
pub fn parse_lines<S: AsRef<str>>(lines: &[S]) -> Vec<LogEntry> {
    lines.iter().filter_map(|l| parse(l.as_ref())).collect()
}

/// Case-insensitive membership test of `level` in `configured`.
pub fn matches_level<I, S>(level: &str, configured: I) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let level = level.to_lowercase();
    configured
        .into_iter()
        .any(|c| c.as_ref().to_lowercase() == level)
}
