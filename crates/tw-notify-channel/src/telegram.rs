//! Telegram Bot API channel.
//!
//! Sends each alert as an HTML-formatted message via `sendMessage`.

use async_trait::async_trait;
use serde::Serialize;
use tw_log_tools::LogEntry;

use crate::channel::NotificationChannel;
use crate::config::TelegramConfig;
use crate::error::{NotifyError, NotifyResult};
use crate::format;

/// Name used in level routing tables.
pub const CHANNEL_NAME: &str = "telegram";

/// `sendMessage` request body.
#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

/// Client for the Telegram Bot API.
pub struct TelegramChannel {
    client: reqwest::Client,
    config: TelegramConfig,
}

impl TelegramChannel {
    pub fn new(config: TelegramConfig) -> NotifyResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| NotifyError::Client(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn endpoint(&self, token: &str) -> String {
        format!(
            "{}/bot{token}/sendMessage",
            self.config.api_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl NotificationChannel for TelegramChannel {
    fn name(&self) -> &str {
        CHANNEL_NAME
    }

    async fn send(&self, entry: &LogEntry) -> NotifyResult<()> {
        let (Some(token), Some(chat_id)) = (self.config.token(), self.config.chat()) else {
            tracing::warn!("telegram credentials not configured");
            return Err(NotifyError::MissingCredentials {
                channel: CHANNEL_NAME.into(),
            });
        };

        let text = format::render_message(entry);
        let body = SendMessage {
            chat_id,
            text: &text,
            parse_mode: "HTML",
        };

        let response = self
            .client
            .post(self.endpoint(token))
            .json(&body)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Status {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(level = %entry.level, "telegram alert delivered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn entry() -> LogEntry {
        LogEntry {
            timestamp: "2025-12-09 16:06:14".into(),
            environment: "production".into(),
            level: "error".into(),
            message: "Database connection failed".into(),
            raw: "[2025-12-09 16:06:14] production.ERROR: Database connection failed".into(),
        }
    }

    fn config(api_url: &str) -> TelegramConfig {
        TelegramConfig {
            bot_token: Some("123:abc".into()),
            chat_id: Some("-1001".into()),
            api_url: api_url.into(),
            timeout_secs: 2,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn posts_html_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .and(body_partial_json(serde_json::json!({
                "chat_id": "-1001",
                "parse_mode": "HTML",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let channel = TelegramChannel::new(config(&server.uri())).unwrap();
        channel.send(&entry()).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        let text = body["text"].as_str().unwrap();
        assert!(text.contains("<b>ERROR</b>"));
        assert!(text.contains("Database connection failed"));
    }

    #[tokio::test]
    async fn non_success_status_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("Bad Request: chat not found"))
            .mount(&server)
            .await;

        let channel = TelegramChannel::new(config(&server.uri())).unwrap();
        let err = channel.send(&entry()).await.unwrap_err();
        match err {
            NotifyError::Status { status, body } => {
                assert_eq!(status, 400);
                assert!(body.contains("chat not found"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn missing_credentials_short_circuit() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut cfg = config(&server.uri());
        cfg.chat_id = None;
        let channel = TelegramChannel::new(cfg).unwrap();
        let err = channel.send(&entry()).await.unwrap_err();
        assert!(matches!(err, NotifyError::MissingCredentials { .. }));
    }

    #[tokio::test]
    async fn unreachable_host_is_transport_failure() {
        // Port 9 (discard) on localhost is not listening in test environments.
        let channel = TelegramChannel::new(config("http://127.0.0.1:9")).unwrap();
        let err = channel.send(&entry()).await.unwrap_err();
        assert!(matches!(err, NotifyError::Transport(_)));
    }

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        let channel = TelegramChannel::new(config("http://localhost:8080/")).unwrap();
        assert_eq!(
            channel.endpoint("t0k"),
            "http://localhost:8080/bott0k/sendMessage"
        );
    }
}
