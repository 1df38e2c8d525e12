//! Notification channel adapters.

mod recording;
mod smtp_email;
mod telegram;

pub use recording::{RecordingNotifier, SentNotification};
pub use smtp_email::{SmtpEmailSender, SmtpSettings};
pub use telegram::{TelegramConfig, TelegramSender};
