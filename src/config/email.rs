//! Email configuration

use secrecy::Secret;
use serde::Deserialize;

use super::error::ValidationError;
use crate::adapters::notification::SmtpSettings;

/// SMTP relay used for cancellation emails
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    pub smtp_host: String,

    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    pub smtp_username: String,

    pub smtp_password: Secret<String>,

    /// From email address
    #[serde(default = "default_from_email")]
    pub from_email: String,

    /// From name
    #[serde(default = "default_from_name")]
    pub from_name: String,
}

impl EmailConfig {
    /// Get formatted "From" header value
    pub fn from_header(&self) -> String {
        format!("{} <{}>", self.from_name, self.from_email)
    }

    pub fn smtp_settings(&self) -> SmtpSettings {
        SmtpSettings {
            host: self.smtp_host.clone(),
            port: self.smtp_port,
            username: self.smtp_username.clone(),
            password: self.smtp_password.clone(),
            from_address: self.from_email.clone(),
            from_name: self.from_name.clone(),
        }
    }

    /// Validate email configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.smtp_host.is_empty() {
            return Err(ValidationError::MissingRequired("EMAIL__SMTP_HOST"));
        }
        if !self.from_email.contains('@') {
            return Err(ValidationError::InvalidFromEmail);
        }
        Ok(())
    }
}

fn default_smtp_port() -> u16 {
    587
}

fn default_from_email() -> String {
    "noreply@event-booker.local".to_string()
}

fn default_from_name() -> String {
    "Event Booker".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn config() -> EmailConfig {
        EmailConfig {
            smtp_host: "smtp.example.com".to_string(),
            smtp_port: default_smtp_port(),
            smtp_username: "mailer".to_string(),
            smtp_password: Secret::new("hunter2".to_string()),
            from_email: default_from_email(),
            from_name: default_from_name(),
        }
    }

    #[test]
    fn from_header_combines_name_and_address() {
        assert_eq!(
            config().from_header(),
            "Event Booker <noreply@event-booker.local>"
        );
    }

    #[test]
    fn password_is_redacted_in_debug_output() {
        let debug = format!("{:?}", config());
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn smtp_settings_carry_credentials() {
        let settings = config().smtp_settings();
        assert_eq!(settings.host, "smtp.example.com");
        assert_eq!(settings.port, 587);
        assert_eq!(settings.password.expose_secret(), "hunter2");
    }

    #[test]
    fn invalid_from_email_is_rejected() {
        let config = EmailConfig {
            from_email: "nobody".to_string(),
            ..config()
        };
        assert!(matches!(config.validate(), Err(ValidationError::InvalidFromEmail)));
    }
}
