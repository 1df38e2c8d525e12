//! CreateEventHandler - Command handler for publishing an event.

use std::sync::Arc;

use crate::domain::booking::SupportedTtls;
use crate::domain::event::{Event, EventError, NewEvent};
use crate::domain::foundation::Timestamp;
use crate::ports::EventRepository;

/// Command to publish a new event.
#[derive(Debug, Clone)]
pub struct CreateEventCommand {
    pub owner_id: String,
    pub name: String,
    pub description: String,
    pub date: Timestamp,
    pub booking_ttl_minutes: i64,
    pub total_seats: i64,
    pub price_cents: i64,
}

#[derive(Debug, Clone)]
pub struct CreateEventResult {
    pub event: Event,
}

/// Validates and stores new events.
///
/// The supported TTL set is the same one the expiry topology is declared
/// from, so every priced event has a delay queue.
pub struct CreateEventHandler {
    repository: Arc<dyn EventRepository>,
    ttls: SupportedTtls,
}

impl CreateEventHandler {
    pub fn new(repository: Arc<dyn EventRepository>, ttls: SupportedTtls) -> Self {
        Self { repository, ttls }
    }

    pub async fn handle(&self, cmd: CreateEventCommand) -> Result<CreateEventResult, EventError> {
        let event = Event::create(
            NewEvent {
                owner_ref: &cmd.owner_id,
                name: cmd.name,
                description: cmd.description,
                date: cmd.date,
                booking_ttl_minutes: cmd.booking_ttl_minutes,
                total_seats: cmd.total_seats,
                price_cents: cmd.price_cents,
            },
            &self.ttls,
            Timestamp::now(),
        )?;

        self.repository.save(&event).await?;

        tracing::info!(
            event_id = %event.id,
            seats = event.total_seats,
            price = %event.price,
            ttl_minutes = event.booking_ttl_minutes,
            "Event created"
        );
        Ok(CreateEventResult { event })
    }
}
