//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Invalid AMQP URL format")]
    InvalidBrokerUrl,

    #[error("{0} must be greater than zero")]
    MustBePositive(&'static str),

    #[error("Retry backoff must be at least 1.0")]
    InvalidBackoff,

    #[error("Invalid supported TTL list: {0}")]
    InvalidTtls(String),

    #[error("Invalid from email address")]
    InvalidFromEmail,

    #[error("Telegram API base URL must be http(s)")]
    InvalidTelegramUrl,

    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),
}
