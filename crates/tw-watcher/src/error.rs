//! Watcher error types.

use thiserror::Error;
use tw_log_tools::LogError;
use tw_notify_channel::NotifyError;

/// Errors surfaced by the tailing loop.
///
/// A missing log file is not among them: that just keeps the tailer idle.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error(transparent)]
    Log(#[from] LogError),

    #[error(transparent)]
    Notify(#[from] NotifyError),
}

/// Convenience alias for watcher results.
pub type WatchResult<T> = Result<T, WatchError>;
