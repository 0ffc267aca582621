//! Core log types: the parsed entry and its throttle fingerprint.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Format of the bracketed timestamp at the start of every entry.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ── Log Entry ─────────────────────────────────────────────────

/// A single parsed log entry.
///
/// Created once per matching line and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Timestamp text exactly as written (`YYYY-MM-DD HH:MM:SS`).
    pub timestamp: String,
    /// Environment tag, e.g. "production".
    pub environment: String,
    /// Lower-cased severity token.
    pub level: String,
    /// Message body, passed through verbatim.
    pub message: String,
    /// Original line before trimming.
    pub raw: String,
}

impl LogEntry {
    /// Interpret the timestamp text, if it is a real calendar date-time.
    pub fn parsed_timestamp(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.timestamp, TIMESTAMP_FORMAT).ok()
    }

    /// Identity used for duplicate suppression.
    ///
    /// Only `level` and `message` take part, so a recurring failure maps to
    /// the same key no matter when it is logged.
    pub fn fingerprint(&self) -> ThrottleKey {
        let mut hasher = Sha256::new();
        hasher.update(self.level.as_bytes());
        hasher.update(b"|");
        hasher.update(self.message.as_bytes());
        ThrottleKey(format!("{:x}", hasher.finalize()))
    }
}

// ── Throttle Key ──────────────────────────────────────────────

/// Hex SHA-256 digest of an entry's `level|message`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThrottleKey(String);

impl ThrottleKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ThrottleKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(level: &str, message: &str, timestamp: &str) -> LogEntry {
        LogEntry {
            timestamp: timestamp.into(),
            environment: "production".into(),
            level: level.into(),
            message: message.into(),
            raw: String::new(),
        }
    }

    #[test]
    fn fingerprint_ignores_timestamp_and_environment() {
        let a = entry("error", "Database connection failed", "2025-12-09 16:06:14");
        let mut b = entry("error", "Database connection failed", "2025-12-10 08:00:00");
        b.environment = "staging".into();
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn fingerprint_differs_by_level_and_message() {
        let base = entry("error", "Payment API down", "2025-12-09 16:06:55");
        let other_level = entry("critical", "Payment API down", "2025-12-09 16:06:55");
        let other_message = entry("error", "Payment API up", "2025-12-09 16:06:55");
        assert_ne!(base.fingerprint(), other_level.fingerprint());
        assert_ne!(base.fingerprint(), other_message.fingerprint());
    }

    #[test]
    fn fingerprint_is_sha256_hex() {
        let key = entry("error", "x", "2025-12-09 16:06:55").fingerprint();
        assert_eq!(key.as_str().len(), 64);
        assert!(key.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn parsed_timestamp_roundtrips_text() {
        let e = entry("warning", "x", "2025-12-09 16:05:50");
        let ts = e.parsed_timestamp().unwrap();
        assert_eq!(ts.format(TIMESTAMP_FORMAT).to_string(), "2025-12-09 16:05:50");
    }

    #[test]
    fn parsed_timestamp_rejects_impossible_date() {
        let e = entry("warning", "x", "2025-13-45 16:05:50");
        assert!(e.parsed_timestamp().is_none());
    }
}
