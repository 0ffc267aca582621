//! Watcher configuration, loadable from TOML and the environment.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tw_notify_channel::TelegramConfig;

/// Top-level configuration for the watcher.
#[derive(Debug, Clone, Deserialize)]
pub struct WatcherConfig {
    /// Directory holding the rotating log files.
    #[serde(default = "default_log_path")]
    pub log_path: PathBuf,
    /// File name prefix of the series (`<prefix>-YYYY-MM-DD.log`).
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
    /// Sleep between two polls, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Severity name → channels to notify, in order.
    #[serde(default = "default_levels")]
    pub levels: BTreeMap<String, Vec<String>>,
    /// Duplicate suppression settings.
    #[serde(default)]
    pub throttle: ThrottleConfig,
    /// Telegram channel settings.
    #[serde(default)]
    pub telegram: TelegramConfig,
}

/// Duplicate suppression settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ThrottleConfig {
    #[serde(default = "default_throttle_enabled")]
    pub enabled: bool,
    /// Window during which identical entries alert only once.
    #[serde(default = "default_throttle_minutes")]
    pub minutes: u64,
}

fn default_log_path() -> PathBuf {
    PathBuf::from("storage/logs")
}
fn default_file_prefix() -> String {
    "laravel".into()
}
fn default_poll_interval_ms() -> u64 {
    500
}
fn default_levels() -> BTreeMap<String, Vec<String>> {
    BTreeMap::from([
        ("critical".to_string(), vec!["telegram".to_string()]),
        ("error".to_string(), vec!["telegram".to_string()]),
        ("warning".to_string(), Vec::new()),
    ])
}
fn default_throttle_enabled() -> bool {
    true
}
fn default_throttle_minutes() -> u64 {
    5
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            enabled: default_throttle_enabled(),
            minutes: default_throttle_minutes(),
        }
    }
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            log_path: default_log_path(),
            file_prefix: default_file_prefix(),
            poll_interval_ms: default_poll_interval_ms(),
            levels: default_levels(),
            throttle: ThrottleConfig::default(),
            telegram: TelegramConfig::default(),
        }
    }
}

// ── Warnings ──────────────────────────────────────────────────

/// Incomplete-but-runnable configuration, reported at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigWarning {
    #[error("telegram bot token is not configured (set TAILWATCH_TELEGRAM_TOKEN)")]
    MissingBotToken,

    #[error("telegram chat id is not configured (set TAILWATCH_TELEGRAM_CHAT_ID)")]
    MissingChatId,

    #[error("no log levels are routed to any channel")]
    NoActiveLevels,

    #[error("throttle window is zero minutes; duplicates are only suppressed within the same second")]
    ZeroThrottleWindow,
}

// ── Loading ───────────────────────────────────────────────────

impl WatcherConfig {
    /// Load config from a TOML file path.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load from `path` (defaults when `None`), then apply environment overrides.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config.normalized())
    }

    /// Override fields from `TAILWATCH_*` variables resolved by `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        if let Some(path) = lookup("TAILWATCH_LOG_PATH") {
            self.log_path = PathBuf::from(path);
        }
        if let Some(prefix) = lookup("TAILWATCH_FILE_PREFIX") {
            self.file_prefix = prefix;
        }
        if let Some(enabled) = lookup("TAILWATCH_TELEGRAM_ENABLED") {
            self.telegram.enabled = parse_bool(&enabled);
        }
        if let Some(token) = lookup("TAILWATCH_TELEGRAM_TOKEN") {
            self.telegram.bot_token = Some(token);
        }
        if let Some(chat_id) = lookup("TAILWATCH_TELEGRAM_CHAT_ID") {
            self.telegram.chat_id = Some(chat_id);
        }
        if let Some(enabled) = lookup("TAILWATCH_THROTTLE_ENABLED") {
            self.throttle.enabled = parse_bool(&enabled);
        }
        if let Some(minutes) = lookup("TAILWATCH_THROTTLE_MINUTES") {
            self.throttle.minutes = minutes.trim().parse().map_err(|e| {
                anyhow::anyhow!("TAILWATCH_THROTTLE_MINUTES must be a whole number: {e}")
            })?;
        }
        Ok(())
    }

    /// Lower-case level names and drop repeated channel names (first wins).
    pub fn normalized(mut self) -> Self {
        let mut levels: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (level, channels) in std::mem::take(&mut self.levels) {
            let slot = levels.entry(level.trim().to_lowercase()).or_default();
            for channel in channels {
                let channel = channel.trim().to_lowercase();
                if !channel.is_empty() && !slot.contains(&channel) {
                    slot.push(channel);
                }
            }
        }
        self.levels = levels;
        self
    }

    /// Report configuration that will keep alerts from going out.
    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        let telegram_routed = self
            .levels
            .values()
            .any(|channels| channels.iter().any(|c| c == "telegram"));
        if self.telegram.enabled && telegram_routed {
            if self.telegram.token().is_none() {
                warnings.push(ConfigWarning::MissingBotToken);
            }
            if self.telegram.chat().is_none() {
                warnings.push(ConfigWarning::MissingChatId);
            }
        }

        if self.levels.values().all(Vec::is_empty) {
            warnings.push(ConfigWarning::NoActiveLevels);
        }

        if self.throttle.enabled && self.throttle.minutes == 0 {
            warnings.push(ConfigWarning::ZeroThrottleWindow);
        }

        warnings
    }

    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.poll_interval_ms)
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
