//! tailwatch: library crate for the log watchdog.
//!
//! Re-exports all modules so the `tailwatch` binary and external crates
//! (e.g. `tw-e2e-tests`) can drive the tailer one tick at a time.

pub mod clock;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod shutdown;
pub mod tailer;
pub mod throttle;

pub use clock::{Clock, MockClock, SystemClock};
pub use config::{ConfigWarning, ThrottleConfig, WatcherConfig};
pub use dispatch::{DispatchOutcome, Dispatcher, LevelRoutes};
pub use error::{WatchError, WatchResult};
pub use tailer::{StopHandle, Tailer, TailerState, TickReport};
pub use throttle::DedupCache;
