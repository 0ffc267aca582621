//! Notification error types.

use thiserror::Error;

/// Reasons a delivery attempt did not succeed.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("{channel} credentials not configured")]
    MissingCredentials { channel: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("client setup error: {0}")]
    Client(String),

    #[error("{0}")]
    Other(String),
}

/// Convenience alias for notification results.
pub type NotifyResult<T> = Result<T, NotifyError>;
