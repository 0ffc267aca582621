//! Log domain error types.

use thiserror::Error;

/// Errors that can occur while locating or reading log files.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("source not found: {0}")]
    NotFound(String),
}

impl LogError {
    /// Map an `io::Error` for `path`, keeping "not found" distinguishable.
    pub fn from_io(path: &std::path::Path, e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound(path.display().to_string())
        } else {
            Self::Io(format!("{}: {e}", path.display()))
        }
    }
}

/// Convenience alias for log domain results.
pub type LogResult<T> = Result<T, LogError>;
