//! Notification sender that records instead of delivering.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::ports::{NotificationChannel, NotificationError, NotificationSender};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
    pub recipient: String,
    pub event_name: String,
    pub seat_count: u32,
}

/// Captures notifications for assertions. Can be told to fail.
///
/// ```ignore
/// let email = Arc::new(RecordingNotifier::new(NotificationChannel::Email));
/// // ... run an expiry ...
/// assert_eq!(email.sent().len(), 1);
/// ```
pub struct RecordingNotifier {
    channel: NotificationChannel,
    sent: Mutex<Vec<SentNotification>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    pub fn new(channel: NotificationChannel) -> Self {
        Self {
            channel,
            sent: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    /// A notifier whose every send fails.
    pub fn failing(channel: NotificationChannel) -> Self {
        let notifier = Self::new(channel);
        notifier.set_failing(true);
        notifier
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Successful sends so far.
    pub fn sent(&self) -> Vec<SentNotification> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl NotificationSender for RecordingNotifier {
    fn channel(&self) -> NotificationChannel {
        self.channel
    }

    async fn send(
        &self,
        recipient: &str,
        event_name: &str,
        seat_count: u32,
    ) -> Result<(), NotificationError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotificationError::Delivery(format!(
                "{} channel unavailable",
                self.channel
            )));
        }
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SentNotification {
                recipient: recipient.to_string(),
                event_name: event_name.to_string(),
                seat_count,
            });
        Ok(())
    }
}
