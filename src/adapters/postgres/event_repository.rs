//! PostgreSQL implementation of EventRepository.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::event::{Event, EventError};
use crate::domain::foundation::{EventId, Money, Timestamp, UserId};
use crate::ports::EventRepository;

/// PostgreSQL implementation of EventRepository.
#[derive(Clone)]
pub struct PostgresEventRepository {
    pool: PgPool,
}

impl PostgresEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepository for PostgresEventRepository {
    async fn save(&self, event: &Event) -> Result<(), EventError> {
        sqlx::query(
            r#"
            INSERT INTO events (
                id, owner_id, date, name, description, total_seats,
                available_seats, price_cents, booking_ttl_minutes
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(event.id.as_uuid())
        .bind(event.owner_id.as_uuid())
        .bind(event.date.as_datetime())
        .bind(&event.name)
        .bind(&event.description)
        .bind(to_db_int("total_seats", event.total_seats)?)
        .bind(to_db_int("available_seats", event.available_seats)?)
        .bind(
            i64::try_from(event.price.cents())
                .map_err(|_| EventError::Storage(format!("Price {} out of range", event.price)))?,
        )
        .bind(to_db_int("booking_ttl_minutes", event.booking_ttl_minutes)?)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                EventError::AlreadyExists(event.id)
            }
            other => EventError::Storage(format!("Failed to insert event: {}", other)),
        })?;

        Ok(())
    }

    async fn find_by_id(&self, id: EventId) -> Result<Option<Event>, EventError> {
        let row = sqlx::query(
            r#"
            SELECT id, owner_id, date, name, description, total_seats,
                   available_seats, price_cents, booking_ttl_minutes
            FROM events
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| EventError::Storage(format!("Failed to fetch event: {}", e)))?;

        row.map(row_to_event).transpose()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Helper functions
// ════════════════════════════════════════════════════════════════════════════

fn to_db_int(column: &str, value: u32) -> Result<i32, EventError> {
    i32::try_from(value)
        .map_err(|_| EventError::Storage(format!("{} {} exceeds column range", column, value)))
}

fn from_db_int(column: &str, value: i32) -> Result<u32, EventError> {
    u32::try_from(value)
        .map_err(|_| EventError::Storage(format!("Invalid {}: {}", column, value)))
}

fn row_to_event(row: PgRow) -> Result<Event, EventError> {
    let column = |e: sqlx::Error| EventError::Storage(format!("Failed to read event row: {}", e));

    let price_cents: i64 = row.try_get("price_cents").map_err(column)?;
    let date: chrono::DateTime<chrono::Utc> = row.try_get("date").map_err(column)?;

    Ok(Event {
        id: EventId::from_uuid(row.try_get("id").map_err(column)?),
        owner_id: UserId::from_uuid(row.try_get("owner_id").map_err(column)?),
        date: Timestamp::from_datetime(date),
        name: row.try_get("name").map_err(column)?,
        description: row.try_get("description").map_err(column)?,
        total_seats: from_db_int("total_seats", row.try_get("total_seats").map_err(column)?)?,
        available_seats: from_db_int(
            "available_seats",
            row.try_get("available_seats").map_err(column)?,
        )?,
        price: Money::from_cents(u64::try_from(price_cents).map_err(|_| {
            EventError::Storage(format!("Invalid price_cents: {}", price_cents))
        })?),
        booking_ttl_minutes: from_db_int(
            "booking_ttl_minutes",
            row.try_get("booking_ttl_minutes").map_err(column)?,
        )?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_column_values_are_rejected() {
        assert_eq!(from_db_int("total_seats", 12).unwrap(), 12);
        assert!(matches!(
            from_db_int("available_seats", -1),
            Err(EventError::Storage(_))
        ));
    }

    #[test]
    fn oversized_values_are_rejected() {
        assert!(to_db_int("total_seats", u32::MAX).is_err());
    }
}
