//! The boundary between the tailer and outbound alerting.

use async_trait::async_trait;
use tw_log_tools::LogEntry;

use crate::error::NotifyResult;

/// A destination that alerts can be sent to.
///
/// `send` reports failure as a value: implementations never panic on
/// transport problems, and the caller decides whether to log and move on.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Channel name as referenced by the level routing table (e.g. "telegram").
    fn name(&self) -> &str;

    /// Attempt one best-effort delivery of `entry`.
    async fn send(&self, entry: &LogEntry) -> NotifyResult<()>;
}
