//! PostgreSQL implementation of SeatLedger.
//!
//! Seat counters live on `events.available_seats`. Every mutation runs in a
//! single transaction and takes seats with a conditional update, so the
//! counter can never go negative and a booking row never exists without
//! its seats.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};

use crate::domain::booking::{Booking, BookingStatus, NotificationPreferences, Recipients};
use crate::domain::foundation::{BookingId, EventId, Money, Timestamp, UserId};
use crate::ports::{LedgerError, SeatLedger};

const BOOKING_COLUMNS: &str = r#"
    id, event_id, user_id, event_name, count, total_price_cents, status,
    created_at, expires_at, notify_email, notify_telegram,
    recipient_email, recipient_telegram_chat_id
"#;

/// PostgreSQL implementation of SeatLedger.
#[derive(Clone)]
pub struct PostgresSeatLedger {
    pool: PgPool,
}

impl PostgresSeatLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn begin(&self) -> Result<Transaction<'static, Postgres>, LedgerError> {
        self.pool
            .begin()
            .await
            .map_err(storage("Failed to begin transaction"))
    }

    /// Tells a missing booking apart from one that already left `created`.
    async fn classify_unchanged(
        &self,
        booking_id: BookingId,
        event_id: Option<EventId>,
    ) -> Result<LedgerError, LedgerError> {
        let exists: Option<(String,)> = match event_id {
            Some(event_id) => {
                sqlx::query_as("SELECT status FROM bookings WHERE id = $1 AND event_id = $2")
                    .bind(booking_id.as_uuid())
                    .bind(event_id.as_uuid())
                    .fetch_optional(&self.pool)
                    .await
            }
            None => {
                sqlx::query_as("SELECT status FROM bookings WHERE id = $1")
                    .bind(booking_id.as_uuid())
                    .fetch_optional(&self.pool)
                    .await
            }
        }
        .map_err(storage("Failed to fetch booking status"))?;

        Ok(match exists {
            Some(_) => LedgerError::AlreadyFinalized(booking_id),
            None => LedgerError::BookingNotFound(booking_id),
        })
    }
}

#[async_trait]
impl SeatLedger for PostgresSeatLedger {
    async fn reserve(&self, booking: &Booking) -> Result<(), LedgerError> {
        let count = to_db_count(booking.count)?;
        let mut tx = self.begin().await?;

        // Take the seats first so the event row is locked for the insert
        let taken = sqlx::query(
            r#"
            UPDATE events SET available_seats = available_seats - $1
            WHERE id = $2 AND available_seats >= $1
            "#,
        )
        .bind(count)
        .bind(booking.event_id.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(storage("Failed to take seats"))?;

        if taken.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(storage("Failed to roll back reservation"))?;

            let event: Option<(i32,)> =
                sqlx::query_as("SELECT available_seats FROM events WHERE id = $1")
                    .bind(booking.event_id.as_uuid())
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(storage("Failed to fetch event"))?;

            return Err(match event {
                Some(_) => LedgerError::InsufficientSeats {
                    event_id: booking.event_id,
                    requested: booking.count,
                },
                None => LedgerError::EventNotFound(booking.event_id),
            });
        }

        sqlx::query(
            r#"
            INSERT INTO bookings (
                id, event_id, user_id, event_name, count, total_price_cents, status,
                created_at, expires_at, notify_email, notify_telegram,
                recipient_email, recipient_telegram_chat_id
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(booking.id.as_uuid())
        .bind(booking.event_id.as_uuid())
        .bind(booking.user_id.as_uuid())
        .bind(&booking.event_name)
        .bind(count)
        .bind(to_db_cents(booking.total_price)?)
        .bind(booking.status.as_str())
        .bind(booking.created_at.as_datetime())
        .bind(booking.expires_at.map(|t| *t.as_datetime()))
        .bind(booking.notifications.email)
        .bind(booking.notifications.telegram)
        .bind(booking.recipients.email.as_deref())
        .bind(booking.recipients.telegram_chat_id.as_deref())
        .execute(&mut *tx)
        .await
        .map_err(storage("Failed to insert booking"))?;

        tx.commit()
            .await
            .map_err(storage("Failed to commit reservation"))?;

        tracing::debug!(booking_id = %booking.id, event_id = %booking.event_id, count, "Seats reserved");
        Ok(())
    }

    async fn release(&self, booking_id: BookingId, event_id: EventId) -> Result<(), LedgerError> {
        let mut tx = self.begin().await?;

        let cancelled: Option<(i32,)> = sqlx::query_as(
            r#"
            UPDATE bookings SET status = 'cancelled'
            WHERE id = $1 AND event_id = $2 AND status = 'created'
            RETURNING count
            "#,
        )
        .bind(booking_id.as_uuid())
        .bind(event_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(storage("Failed to cancel booking"))?;

        let Some((count,)) = cancelled else {
            tx.rollback()
                .await
                .map_err(storage("Failed to roll back release"))?;
            return Err(self.classify_unchanged(booking_id, Some(event_id)).await?);
        };

        let returned = sqlx::query(
            "UPDATE events SET available_seats = available_seats + $1 WHERE id = $2",
        )
        .bind(count)
        .bind(event_id.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(storage("Failed to return seats"))?;

        if returned.rows_affected() == 0 {
            // Dropping the transaction rolls the cancellation back
            return Err(LedgerError::EventNotFound(event_id));
        }

        tx.commit()
            .await
            .map_err(storage("Failed to commit release"))?;

        tracing::debug!(booking_id = %booking_id, event_id = %event_id, count, "Seats released");
        Ok(())
    }

    async fn confirm(&self, booking_id: BookingId) -> Result<(), LedgerError> {
        let result = sqlx::query(
            r#"
            UPDATE bookings SET status = 'confirmed'
            WHERE id = $1 AND status IN ('created', 'confirmed')
            "#,
        )
        .bind(booking_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(storage("Failed to confirm booking"))?;

        if result.rows_affected() == 0 {
            return Err(self.classify_unchanged(booking_id, None).await?);
        }
        Ok(())
    }

    async fn booking_status(
        &self,
        booking_id: BookingId,
    ) -> Result<Option<BookingStatus>, LedgerError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT status FROM bookings WHERE id = $1")
            .bind(booking_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage("Failed to fetch booking status"))?;

        row.map(|(status,)| parse_status(&status)).transpose()
    }

    async fn find_booking(&self, booking_id: BookingId) -> Result<Option<Booking>, LedgerError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM bookings WHERE id = $1",
            BOOKING_COLUMNS
        ))
        .bind(booking_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage("Failed to fetch booking"))?;

        row.map(row_to_booking).transpose()
    }

    async fn bookings_for_event(&self, event_id: EventId) -> Result<Vec<Booking>, LedgerError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM bookings WHERE event_id = $1 ORDER BY created_at, id",
            BOOKING_COLUMNS
        ))
        .bind(event_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(storage("Failed to fetch bookings by event"))?;

        rows.into_iter().map(row_to_booking).collect()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Helper functions
// ════════════════════════════════════════════════════════════════════════════

fn storage(context: &'static str) -> impl FnOnce(sqlx::Error) -> LedgerError {
    move |e| LedgerError::Storage(format!("{}: {}", context, e))
}

fn to_db_count(count: u32) -> Result<i32, LedgerError> {
    i32::try_from(count)
        .map_err(|_| LedgerError::Storage(format!("Seat count {} exceeds column range", count)))
}

fn to_db_cents(money: Money) -> Result<i64, LedgerError> {
    i64::try_from(money.cents())
        .map_err(|_| LedgerError::Storage(format!("Amount {} exceeds column range", money)))
}

fn parse_status(s: &str) -> Result<BookingStatus, LedgerError> {
    s.parse()
        .map_err(|e| LedgerError::Storage(format!("Invalid booking status: {}", e)))
}

fn get<'r, T>(row: &'r PgRow, column: &str) -> Result<T, LedgerError>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(column)
        .map_err(|e| LedgerError::Storage(format!("Failed to get {}: {}", column, e)))
}

fn row_to_booking(row: PgRow) -> Result<Booking, LedgerError> {
    let count: i32 = get(&row, "count")?;
    let total_price_cents: i64 = get(&row, "total_price_cents")?;
    let status: String = get(&row, "status")?;
    let expires_at: Option<chrono::DateTime<chrono::Utc>> = get(&row, "expires_at")?;

    Ok(Booking {
        id: BookingId::from_uuid(get(&row, "id")?),
        event_id: EventId::from_uuid(get(&row, "event_id")?),
        user_id: UserId::from_uuid(get(&row, "user_id")?),
        event_name: get(&row, "event_name")?,
        count: u32::try_from(count)
            .map_err(|_| LedgerError::Storage(format!("Invalid seat count: {}", count)))?,
        total_price: Money::from_cents(u64::try_from(total_price_cents).map_err(|_| {
            LedgerError::Storage(format!("Invalid total price: {}", total_price_cents))
        })?),
        status: parse_status(&status)?,
        created_at: Timestamp::from_datetime(get(&row, "created_at")?),
        expires_at: expires_at.map(Timestamp::from_datetime),
        notifications: NotificationPreferences {
            email: get(&row, "notify_email")?,
            telegram: get(&row, "notify_telegram")?,
        },
        recipients: Recipients {
            email: get(&row, "recipient_email")?,
            telegram_chat_id: get(&row, "recipient_telegram_chat_id")?,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_strings_parse() {
        assert_eq!(parse_status("created").unwrap(), BookingStatus::Created);
        assert_eq!(parse_status("cancelled").unwrap(), BookingStatus::Cancelled);
    }

    #[test]
    fn unknown_status_is_a_storage_error() {
        assert!(matches!(parse_status("pending"), Err(LedgerError::Storage(_))));
    }

    #[test]
    fn counts_beyond_integer_column_are_rejected() {
        assert_eq!(to_db_count(7).unwrap(), 7);
        assert!(to_db_count(u32::MAX).is_err());
        assert!(to_db_cents(Money::from_cents(u64::MAX)).is_err());
    }

    #[test]
    fn storage_errors_carry_context() {
        let err = storage("Failed to take seats")(sqlx::Error::RowNotFound);
        match err {
            LedgerError::Storage(msg) => assert!(msg.starts_with("Failed to take seats: ")),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
