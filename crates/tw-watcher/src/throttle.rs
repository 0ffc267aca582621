//! Time-windowed duplicate suppression.
//!
//! Entries are keyed by their `level|message` fingerprint. A key that was
//! let through stays "hot" for the window; repeats inside it are throttled
//! and do not extend it.

use std::collections::HashMap;
use std::sync::Arc;

use tw_log_tools::{LogEntry, ThrottleKey};

use crate::clock::Clock;
use crate::config::ThrottleConfig;

/// Membership cache of recently alerted fingerprints.
pub struct DedupCache {
    enabled: bool,
    window_secs: i64,
    last_seen: HashMap<ThrottleKey, i64>,
    clock: Arc<dyn Clock>,
}

impl DedupCache {
    pub fn new(enabled: bool, window_secs: i64, clock: Arc<dyn Clock>) -> Self {
        Self {
            enabled,
            window_secs,
            last_seen: HashMap::new(),
            clock,
        }
    }

    pub fn from_config(config: &ThrottleConfig, clock: Arc<dyn Clock>) -> Self {
        Self::new(config.enabled, minutes_to_secs(config.minutes), clock)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn window_secs(&self) -> i64 {
        self.window_secs
    }

    /// Decide whether `entry` is a duplicate that must not alert.
    ///
    /// Every call first drops all keys older than the window. A key still
    /// present afterwards throttles; otherwise the key is (re)inserted with
    /// the current time and the entry is allowed.
    pub fn should_throttle(&mut self, entry: &LogEntry) -> bool {
        if !self.enabled {
            return false;
        }

        let key = entry.fingerprint();
        let now = self.clock.unix_seconds();

        self.evict_expired(now);

        if self.last_seen.contains_key(&key) {
            tracing::debug!(key = %key, level = %entry.level, "duplicate entry throttled");
            return true;
        }

        self.last_seen.insert(key, now);
        false
    }

    /// Forget every key.
    pub fn clear(&mut self) {
        self.last_seen.clear();
    }

    pub fn len(&self) -> usize {
        self.last_seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_seen.is_empty()
    }

    fn evict_expired(&mut self, now: i64) {
        let window = self.window_secs;
        self.last_seen.retain(|_, seen| now - *seen <= window);
    }
}

fn minutes_to_secs(minutes: u64) -> i64 {
    i64::try_from(minutes.saturating_mul(60)).unwrap_or(i64::MAX)
}
