//! ConfirmBookingHandler - Command handler for paying a booking.

use std::sync::Arc;

use crate::domain::booking::BookingError;
use crate::domain::foundation::BookingId;
use crate::ports::SeatLedger;

#[derive(Debug, Clone)]
pub struct ConfirmBookingCommand {
    pub booking_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmBookingResult {
    pub booking_id: BookingId,
}

/// Confirms a `created` booking so expiry leaves it alone.
///
/// Confirming twice succeeds; confirming a cancelled booking returns
/// `AlreadyFinalized`.
pub struct ConfirmBookingHandler {
    ledger: Arc<dyn SeatLedger>,
}

impl ConfirmBookingHandler {
    pub fn new(ledger: Arc<dyn SeatLedger>) -> Self {
        Self { ledger }
    }

    pub async fn handle(
        &self,
        cmd: ConfirmBookingCommand,
    ) -> Result<ConfirmBookingResult, BookingError> {
        let booking_id = BookingId::parse(&cmd.booking_id)?;

        self.ledger.confirm(booking_id).await?;

        tracing::info!(booking_id = %booking_id, "Booking confirmed");
        Ok(ConfirmBookingResult { booking_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::domain::booking::{
        Booking, BookingStatus, NewBooking, NotificationPreferences, Recipients, SupportedTtls,
    };
    use crate::domain::event::{Event, NewEvent};
    use crate::domain::foundation::{Timestamp, UserId};
    use crate::ports::EventRepository;

    async fn reserved_booking(store: &InMemoryStore) -> Booking {
        let now = Timestamp::now();
        let owner = UserId::new().to_string();
        let event = Event::create(
            NewEvent {
                owner_ref: &owner,
                name: "Lecture".to_string(),
                description: String::new(),
                date: now.plus_minutes(90),
                booking_ttl_minutes: 10,
                total_seats: 3,
                price_cents: 900,
            },
            &SupportedTtls::new([10]).unwrap(),
            now,
        )
        .unwrap();
        store.save(&event).await.unwrap();

        let event_ref = event.id.to_string();
        let user_ref = UserId::new().to_string();
        let booking = Booking::create(
            NewBooking {
                event_ref: &event_ref,
                user_ref: &user_ref,
                event_name: event.name.clone(),
                recipients: Recipients::default(),
                notifications: NotificationPreferences::default(),
                count: 1,
                ttl_minutes: 10,
                unit_price: event.price,
            },
            now,
        )
        .unwrap();
        store.reserve(&booking).await.unwrap();
        booking
    }

    fn command(id: BookingId) -> ConfirmBookingCommand {
        ConfirmBookingCommand {
            booking_id: id.to_string(),
        }
    }

    #[tokio::test]
    async fn confirms_created_booking_twice() {
        let store = Arc::new(InMemoryStore::new());
        let booking = reserved_booking(&store).await;
        let handler = ConfirmBookingHandler::new(store.clone());

        handler.handle(command(booking.id)).await.unwrap();
        handler.handle(command(booking.id)).await.unwrap();

        assert_eq!(
            store.booking_status(booking.id).await.unwrap(),
            Some(BookingStatus::Confirmed)
        );
    }

    #[tokio::test]
    async fn cancelled_booking_cannot_be_confirmed() {
        let store = Arc::new(InMemoryStore::new());
        let booking = reserved_booking(&store).await;
        store.release(booking.id, booking.event_id).await.unwrap();
        let handler = ConfirmBookingHandler::new(store.clone());

        let err = handler.handle(command(booking.id)).await.unwrap_err();

        assert_eq!(err, BookingError::AlreadyFinalized(booking.id));
    }

    #[tokio::test]
    async fn malformed_and_unknown_ids_are_rejected() {
        let handler = ConfirmBookingHandler::new(Arc::new(InMemoryStore::new()));

        assert!(matches!(
            handler
                .handle(ConfirmBookingCommand {
                    booking_id: "x".to_string()
                })
                .await,
            Err(BookingError::InvalidArgument(_))
        ));

        let missing = BookingId::new();
        assert_eq!(
            handler.handle(command(missing)).await.unwrap_err(),
            BookingError::BookingNotFound(missing)
        );
    }
}
