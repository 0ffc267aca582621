//! Mock notification channel for testing without a network.
//!
//! Records every entry it is asked to deliver, and can be switched into a
//! failing mode to exercise error isolation.

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use tw_log_tools::LogEntry;

use crate::channel::NotificationChannel;
use crate::error::{NotifyError, NotifyResult};

/// Mock implementation of the `NotificationChannel` trait.
///
/// Thread-safe via `Mutex` (fine for test contexts).
pub struct MockChannel {
    name: String,
    sent: Mutex<Vec<LogEntry>>,
    attempts: Mutex<usize>,
    failing: AtomicBool,
}

impl MockChannel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sent: Mutex::new(Vec::new()),
            attempts: Mutex::new(0),
            failing: AtomicBool::new(false),
        }
    }

    /// A mock whose every delivery fails.
    pub fn failing(name: impl Into<String>) -> Self {
        let m = Self::new(name);
        m.set_failing(true);
        m
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Entries successfully "delivered".
    pub fn sent(&self) -> Vec<LogEntry> {
        self.sent.lock().unwrap().clone()
    }

    /// Number of successful deliveries.
    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// Number of `send` calls, successful or not.
    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }

    /// Clear all recorded state.
    pub fn reset(&self) {
        self.sent.lock().unwrap().clear();
        *self.attempts.lock().unwrap() = 0;
    }
}

#[async_trait]
impl NotificationChannel for MockChannel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, entry: &LogEntry) -> NotifyResult<()> {
        *self.attempts.lock().unwrap() += 1;
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifyError::Other(format!("{} is failing", self.name)));
        }
        self.sent.lock().unwrap().push(entry.clone());
        Ok(())
    }
}
