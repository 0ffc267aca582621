//! Notification channels for tailwatch.
//!
//! - `NotificationChannel` trait: deliver one `LogEntry`, report the outcome
//! - `TelegramChannel` posting to the Bot API over HTTPS
//! - `MockChannel` for testing without a network
//! - `format` helpers that render an entry as an HTML alert

pub mod channel;
pub mod config;
pub mod error;
pub mod format;
pub mod mock;
pub mod telegram;

// Re-exports for convenience.
pub use channel::NotificationChannel;
pub use config::TelegramConfig;
pub use error::{NotifyError, NotifyResult};
pub use mock::MockChannel;
pub use telegram::TelegramChannel;
