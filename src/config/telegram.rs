//! Telegram Bot API configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::adapters::notification::TelegramConfig as TelegramClientConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: Secret<String>,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl TelegramConfig {
    pub fn client_config(&self) -> TelegramClientConfig {
        TelegramClientConfig::new(self.bot_token.expose_secret().clone())
            .with_base_url(self.api_base_url.clone())
            .with_timeout(Duration::from_secs(self.timeout_secs))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.bot_token.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("TELEGRAM__BOT_TOKEN"));
        }
        if !self.api_base_url.starts_with("https://") && !self.api_base_url.starts_with("http://")
        {
            return Err(ValidationError::InvalidTelegramUrl);
        }
        Ok(())
    }
}

fn default_api_base_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(token: &str) -> TelegramConfig {
        TelegramConfig {
            bot_token: Secret::new(token.to_string()),
            api_base_url: default_api_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }

    #[test]
    fn empty_token_is_rejected() {
        assert!(matches!(
            config("").validate(),
            Err(ValidationError::MissingRequired(_))
        ));
    }

    #[test]
    fn client_config_uses_base_url_and_timeout() {
        let client = config("123:abc").client_config();
        assert_eq!(client.base_url, "https://api.telegram.org");
        assert_eq!(client.timeout, Duration::from_secs(10));
    }

    #[test]
    fn non_http_base_url_is_rejected() {
        let config = TelegramConfig {
            api_base_url: "ftp://bots".to_string(),
            ..config("123:abc")
        };
        assert!(matches!(config.validate(), Err(ValidationError::InvalidTelegramUrl)));
    }
}
