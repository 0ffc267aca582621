//! Telegram channel configuration.

use serde::Deserialize;

/// Telegram Bot API settings.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    /// Whether alerts routed to "telegram" are actually sent.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Bot token issued by @BotFather.
    #[serde(default)]
    pub bot_token: Option<String>,
    /// Target chat (user, group or channel id).
    #[serde(default)]
    pub chat_id: Option<String>,
    /// Bot API base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_enabled() -> bool {
    true
}
fn default_api_url() -> String {
    "https://api.telegram.org".into()
}
fn default_timeout_secs() -> u64 {
    10
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            bot_token: None,
            chat_id: None,
            api_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl TelegramConfig {
    /// Non-empty bot token, if any.
    pub fn token(&self) -> Option<&str> {
        self.bot_token.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    /// Non-empty chat id, if any.
    pub fn chat(&self) -> Option<&str> {
        self.chat_id.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }

    pub fn has_credentials(&self) -> bool {
        self.token().is_some() && self.chat().is_some()
    }
}
