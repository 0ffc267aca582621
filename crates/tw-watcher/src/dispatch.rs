//! Level routing and per-channel alert delivery.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tw_log_tools::{LogEntry, matches_level};
use tw_notify_channel::{NotificationChannel, TelegramChannel};

use crate::config::WatcherConfig;
use crate::error::WatchResult;

// ── Level routes ──────────────────────────────────────────────

/// Severity name → ordered channel names.
///
/// A level listed with no channels still passes the severity filter (and
/// the throttle), it just notifies nobody.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelRoutes {
    routes: BTreeMap<String, Vec<String>>,
}

impl LevelRoutes {
    pub fn new(routes: BTreeMap<String, Vec<String>>) -> Self {
        let mut normalized: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (level, channels) in routes {
            let slot = normalized.entry(level.to_lowercase()).or_default();
            for channel in channels {
                if !slot.contains(&channel) {
                    slot.push(channel);
                }
            }
        }
        Self { routes: normalized }
    }

    pub fn contains_level(&self, level: &str) -> bool {
        matches_level(level, self.routes.keys())
    }

    pub fn channels_for(&self, level: &str) -> &[String] {
        self.routes
            .get(&level.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Levels that notify at least one channel.
    pub fn active_levels(&self) -> Vec<&str> {
        self.routes
            .iter()
            .filter(|(_, channels)| !channels.is_empty())
            .map(|(level, _)| level.as_str())
            .collect()
    }
}

// ── Dispatcher ────────────────────────────────────────────────

/// Result of dispatching one entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Channels that accepted the alert.
    pub delivered: usize,
    /// Channels that were tried and failed.
    pub failed: usize,
    /// Routed channel names with no enabled channel behind them.
    pub skipped: usize,
}

/// Sends entries to the channels their level is routed to.
pub struct Dispatcher {
    routes: LevelRoutes,
    channels: HashMap<String, Arc<dyn NotificationChannel>>,
}

impl Dispatcher {
    pub fn new(routes: LevelRoutes) -> Self {
        Self {
            routes,
            channels: HashMap::new(),
        }
    }

    /// Build routes from `config` and register the enabled channels.
    pub fn from_config(config: &WatcherConfig) -> WatchResult<Self> {
        let mut dispatcher = Self::new(LevelRoutes::new(config.levels.clone()));
        if config.telegram.enabled {
            let telegram = TelegramChannel::new(config.telegram.clone())?;
            dispatcher.register(Arc::new(telegram));
        } else {
            tracing::info!("telegram channel disabled");
        }
        Ok(dispatcher)
    }

    /// Register `channel` under its own name, replacing any previous one.
    pub fn register(&mut self, channel: Arc<dyn NotificationChannel>) {
        self.channels.insert(channel.name().to_string(), channel);
    }

    pub fn routes(&self) -> &LevelRoutes {
        &self.routes
    }

    pub fn has_channel(&self, name: &str) -> bool {
        self.channels.contains_key(name)
    }

    /// Try every channel routed for the entry's level, in order.
    ///
    /// A failing channel is logged and counted; it never stops the
    /// remaining channels from being tried.
    pub async fn dispatch(&self, entry: &LogEntry) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();

        for name in self.routes.channels_for(&entry.level) {
            let Some(channel) = self.channels.get(name) else {
                tracing::debug!(channel = %name, "no enabled channel registered; skipping");
                outcome.skipped += 1;
                continue;
            };

            match channel.send(entry).await {
                Ok(()) => {
                    tracing::info!(
                        channel = %name,
                        level = %entry.level,
                        environment = %entry.environment,
                        "alert sent"
                    );
                    outcome.delivered += 1;
                }
                Err(e) => {
                    tracing::error!(channel = %name, error = %e, "failed to send notification");
                    outcome.failed += 1;
                }
            }
        }

        outcome
    }
}
