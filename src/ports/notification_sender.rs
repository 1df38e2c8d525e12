//! Notification gateway port.
//!
//! One implementation per channel. Callers decide which channels to use
//! from the booking's preference flags and invoke each independently.

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// Delivery channel of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationChannel {
    Email,
    Telegram,
}

impl fmt::Display for NotificationChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationChannel::Email => f.write_str("email"),
            NotificationChannel::Telegram => f.write_str("telegram"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotificationError {
    #[error("Invalid recipient '{recipient}': {reason}")]
    InvalidRecipient { recipient: String, reason: String },

    #[error("Failed to build message: {0}")]
    Message(String),

    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// Sends a "booking cancelled" notice over one channel.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    fn channel(&self) -> NotificationChannel;

    async fn send(
        &self,
        recipient: &str,
        event_name: &str,
        seat_count: u32,
    ) -> Result<(), NotificationError>;
}

/// Text shared by every channel.
pub fn cancellation_message(event_name: &str, seat_count: u32) -> String {
    format!(
        "Your booking of {} seat(s) for event \"{}\" was cancelled because it was not confirmed in time.",
        seat_count, event_name
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_mentions_count_and_event() {
        let text = cancellation_message("Jazz Night", 3);
        assert!(text.contains("3 seat(s)"));
        assert!(text.contains("Jazz Night"));
    }

    #[test]
    fn notification_sender_is_object_safe() {
        fn _accepts_dyn(_sender: &dyn NotificationSender) {}
    }
}
