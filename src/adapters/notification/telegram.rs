//! Telegram Bot API notification sender.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ports::{
    cancellation_message, NotificationChannel, NotificationError, NotificationSender,
};

/// Configuration for the Telegram sender.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    bot_token: Secret<String>,
    /// Base URL of the Bot API (default: https://api.telegram.org).
    pub base_url: String,
    pub timeout: Duration,
}

impl TelegramConfig {
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            bot_token: Secret::new(bot_token.into()),
            base_url: "https://api.telegram.org".to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct BotApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Sends cancellation notices through a Telegram bot.
pub struct TelegramSender {
    config: TelegramConfig,
    client: Client,
}

impl TelegramSender {
    pub fn new(config: TelegramConfig) -> Result<Self, NotificationError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| NotificationError::Delivery(format!("HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    fn send_message_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.config.base_url.trim_end_matches('/'),
            self.config.bot_token.expose_secret()
        )
    }
}

/// Telegram addresses users by numeric chat id.
fn parse_chat_id(recipient: &str) -> Result<i64, NotificationError> {
    recipient
        .trim()
        .parse::<i64>()
        .map_err(|_| NotificationError::InvalidRecipient {
            recipient: recipient.to_string(),
            reason: "telegram chat id must be numeric".to_string(),
        })
}

#[async_trait]
impl NotificationSender for TelegramSender {
    fn channel(&self) -> NotificationChannel {
        NotificationChannel::Telegram
    }

    async fn send(
        &self,
        recipient: &str,
        event_name: &str,
        seat_count: u32,
    ) -> Result<(), NotificationError> {
        let chat_id = parse_chat_id(recipient)?;
        let text = cancellation_message(event_name, seat_count);

        let response = self
            .client
            .post(self.send_message_url())
            .json(&SendMessageRequest {
                chat_id,
                text: &text,
            })
            .send()
            .await
            .map_err(|e| NotificationError::Delivery(e.without_url().to_string()))?;

        let status = response.status();
        let body: BotApiResponse = response
            .json()
            .await
            .map_err(|e| NotificationError::Delivery(format!("status {}: {}", status, e)))?;

        if !status.is_success() || !body.ok {
            return Err(NotificationError::Delivery(format!(
                "status {}: {}",
                status,
                body.description.unwrap_or_default()
            )));
        }

        tracing::debug!(chat_id, "Telegram notification sent");
        Ok(())
    }
}
