//! Log domain for tailwatch.
//!
//! Provides the `[date time] env.LEVEL: message` line grammar, the
//! `LogEntry` value it produces (with its throttle fingerprint), and the
//! `<prefix>-<YYYY-MM-DD>.log` daily rotation naming used to pick the file
//! that is currently being written.

pub mod error;
pub mod parser;
pub mod rotation;
pub mod types;

// Re-export key types for convenience
pub use error::{LogError, LogResult};
pub use parser::{matches_level, parse, parse_lines};
pub use rotation::DailyLogNaming;
pub use types::{LogEntry, ThrottleKey};
