//! PostgreSQL implementation of UserDirectory.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::UserId;
use crate::domain::user::UserContact;
use crate::ports::{DirectoryError, UserDirectory};

/// Reads contact details from the `users` table.
#[derive(Clone)]
pub struct PostgresUserDirectory {
    pool: PgPool,
}

impl PostgresUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PostgresUserDirectory {
    async fn find_contact(&self, user_id: UserId) -> Result<Option<UserContact>, DirectoryError> {
        let row: Option<(Option<String>, Option<String>)> =
            sqlx::query_as("SELECT email, telegram_chat_id FROM users WHERE id = $1")
                .bind(user_id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DirectoryError::Storage(format!("Failed to fetch user: {}", e)))?;

        Ok(row.map(|(email, telegram_chat_id)| UserContact {
            user_id,
            email,
            telegram_chat_id,
        }))
    }
}
