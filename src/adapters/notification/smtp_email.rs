//! SMTP email notification sender using Lettre.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::{ExposeSecret, Secret};

use crate::ports::{
    cancellation_message, NotificationChannel, NotificationError, NotificationSender,
};

const SUBJECT: &str = "Booking cancelled";

/// SMTP connection settings.
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: Secret<String>,
    pub from_address: String,
    pub from_name: String,
}

/// Sends cancellation notices by email.
pub struct SmtpEmailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpEmailSender {
    /// Builds the transport. No connection is opened until the first send.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRecipient` if the sender address does not parse and
    /// `Delivery` if the relay cannot be configured.
    pub fn new(settings: SmtpSettings) -> Result<Self, NotificationError> {
        let from: Mailbox = format!("{} <{}>", settings.from_name, settings.from_address)
            .parse()
            .map_err(|e| NotificationError::InvalidRecipient {
                recipient: settings.from_address.clone(),
                reason: format!("invalid from address: {}", e),
            })?;

        let credentials = Credentials::new(
            settings.username,
            settings.password.expose_secret().clone(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
            .map_err(|e| NotificationError::Delivery(format!("SMTP relay error: {}", e)))?
            .port(settings.port)
            .credentials(credentials)
            .build();

        Ok(Self { transport, from })
    }
}

/// Builds the plain-text cancellation email.
fn build_message(
    from: &Mailbox,
    recipient: &str,
    event_name: &str,
    seat_count: u32,
) -> Result<Message, NotificationError> {
    let to: Mailbox = recipient
        .parse()
        .map_err(|e| NotificationError::InvalidRecipient {
            recipient: recipient.to_string(),
            reason: format!("{}", e),
        })?;

    Message::builder()
        .from(from.clone())
        .to(to)
        .subject(SUBJECT)
        .header(ContentType::TEXT_PLAIN)
        .body(cancellation_message(event_name, seat_count))
        .map_err(|e| NotificationError::Message(e.to_string()))
}

#[async_trait]
impl NotificationSender for SmtpEmailSender {
    fn channel(&self) -> NotificationChannel {
        NotificationChannel::Email
    }

    async fn send(
        &self,
        recipient: &str,
        event_name: &str,
        seat_count: u32,
    ) -> Result<(), NotificationError> {
        let message = build_message(&self.from, recipient, event_name, seat_count)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| NotificationError::Delivery(format!("Failed to send email: {}", e)))?;

        tracing::debug!(recipient, "Email notification sent");
        Ok(())
    }
}
