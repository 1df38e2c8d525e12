//! User directory port (read only).

use crate::domain::foundation::UserId;
use crate::domain::user::UserContact;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Looks up contact details of registered users.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Returns `None` if the user does not exist.
    async fn find_contact(&self, user_id: UserId) -> Result<Option<UserContact>, DirectoryError>;
}
