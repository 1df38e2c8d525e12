//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables carry the `EVENT_BOOKER` prefix
//! and nested values are separated by double underscores.
//!
//! # Example
//!
//! ```no_run
//! use event_booker::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Consuming with {} workers", config.broker.workers);
//! ```

mod booking;
mod broker;
mod database;
mod email;
mod error;
mod log;
mod retry;
mod telegram;

pub use booking::BookingConfig;
pub use broker::BrokerConfig;
pub use database::DatabaseConfig;
pub use email::EmailConfig;
pub use error::{ConfigError, ValidationError};
pub use log::LogConfig;
pub use retry::RetryConfig;
pub use telegram::TelegramConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
/// Email and Telegram are optional; a missing section disables that
/// notification channel.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration (PostgreSQL connection)
    pub database: DatabaseConfig,

    /// AMQP broker and expiry consumer
    pub broker: BrokerConfig,

    /// Backoff for ledger calls made while expiring bookings
    #[serde(default)]
    pub retry: RetryConfig,

    /// Supported booking TTLs
    #[serde(default)]
    pub booking: BookingConfig,

    /// SMTP settings for cancellation emails
    #[serde(default)]
    pub email: Option<EmailConfig>,

    /// Bot API settings for cancellation messages
    #[serde(default)]
    pub telegram: Option<TelegramConfig>,

    #[serde(default)]
    pub log: LogConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `EVENT_BOOKER` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Splits the supported TTL list on commas
    ///
    /// # Environment Variable Format
    ///
    /// - `EVENT_BOOKER__DATABASE__URL=...` -> `database.url = ...`
    /// - `EVENT_BOOKER__BOOKING__SUPPORTED_TTL_MINUTES=5,15` -> `booking.supported_ttl_minutes = [5, 15]`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed into the expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("EVENT_BOOKER")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("booking.supported_ttl_minutes"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first section that is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.database.validate()?;
        self.broker.validate()?;
        self.retry.validate()?;
        self.booking.validate()?;
        if let Some(email) = &self.email {
            email.validate()?;
        }
        if let Some(telegram) = &self.telegram {
            telegram.validate()?;
        }
        self.log.validate()?;
        Ok(())
    }
}
