//! Booking configuration

use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::booking::SupportedTtls;

/// Booking settings
///
/// Every entry of `supported_ttl_minutes` gets its own delay queue, so
/// changing the list changes the broker topology declared at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingConfig {
    /// Comma separated in the environment, e.g. `5,15,30`
    #[serde(default = "default_supported_ttl_minutes")]
    pub supported_ttl_minutes: Vec<u32>,
}

impl BookingConfig {
    pub fn supported_ttls(&self) -> Result<SupportedTtls, ValidationError> {
        SupportedTtls::new(self.supported_ttl_minutes.iter().copied())
            .map_err(|e| ValidationError::InvalidTtls(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.supported_ttls().map(|_| ())
    }
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            supported_ttl_minutes: default_supported_ttl_minutes(),
        }
    }
}

fn default_supported_ttl_minutes() -> Vec<u32> {
    vec![1, 5, 10, 15, 30, 60]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_buckets() {
        let ttls = BookingConfig::default().supported_ttls().unwrap();
        let minutes: Vec<u32> = ttls.buckets().map(|b| b.minutes()).collect();
        assert_eq!(minutes, vec![1, 5, 10, 15, 30, 60]);
    }

    #[test]
    fn empty_list_is_rejected() {
        let config = BookingConfig {
            supported_ttl_minutes: vec![],
        };
        assert!(matches!(config.validate(), Err(ValidationError::InvalidTtls(_))));
    }

    #[test]
    fn zero_minute_bucket_is_rejected() {
        let config = BookingConfig {
            supported_ttl_minutes: vec![0, 5],
        };
        assert!(config.validate().is_err());
    }
}
