//! GetEventHandler - Query handler for an event and its bookings.

use std::sync::Arc;

use crate::domain::booking::Booking;
use crate::domain::event::{Event, EventError};
use crate::domain::foundation::EventId;
use crate::ports::{EventRepository, SeatLedger};

#[derive(Debug, Clone)]
pub struct GetEventQuery {
    pub event_id: String,
}

/// An event together with every booking made on it.
#[derive(Debug, Clone)]
pub struct EventDetails {
    pub event: Event,
    pub bookings: Vec<Booking>,
}

pub struct GetEventHandler {
    events: Arc<dyn EventRepository>,
    ledger: Arc<dyn SeatLedger>,
}

impl GetEventHandler {
    pub fn new(events: Arc<dyn EventRepository>, ledger: Arc<dyn SeatLedger>) -> Self {
        Self { events, ledger }
    }

    pub async fn handle(&self, query: GetEventQuery) -> Result<EventDetails, EventError> {
        let event_id = EventId::parse(&query.event_id)?;

        let event = self
            .events
            .find_by_id(event_id)
            .await?
            .ok_or(EventError::NotFound(event_id))?;

        let bookings = self
            .ledger
            .bookings_for_event(event_id)
            .await
            .map_err(|e| EventError::Storage(e.to_string()))?;

        Ok(EventDetails { event, bookings })
    }
}
