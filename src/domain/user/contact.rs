//! Contact details of a registered user.

use crate::domain::booking::Recipients;
use crate::domain::foundation::UserId;
use serde::{Deserialize, Serialize};

/// The parts of a user record bookings need for notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContact {
    pub user_id: UserId,
    pub email: Option<String>,

    /// Numeric Telegram chat id, stored as text.
    pub telegram_chat_id: Option<String>,
}

impl UserContact {
    /// Copies contact details into booking recipients. Blank values become `None`.
    pub fn recipients(&self) -> Recipients {
        fn non_blank(value: &Option<String>) -> Option<String> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        }

        Recipients {
            email: non_blank(&self.email),
            telegram_chat_id: non_blank(&self.telegram_chat_id),
        }
    }
}
