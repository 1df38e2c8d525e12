//! CreateBookingHandler - Command handler for reserving seats.

use std::sync::Arc;

use crate::domain::booking::{Booking, BookingError, NewBooking, NotificationPreferences};
use crate::domain::event::MAX_SEATS;
use crate::domain::foundation::{EventId, Timestamp, UserId, ValidationError};
use crate::ports::{EventRepository, ExpiryScheduler, SeatLedger, UserDirectory};

/// Command to reserve seats on an event.
#[derive(Debug, Clone)]
pub struct CreateBookingCommand {
    pub event_id: String,
    pub user_id: String,
    pub telegram_notification: bool,
    pub email_notification: bool,
    pub count: i64,
}

#[derive(Debug, Clone)]
pub struct CreateBookingResult {
    pub booking: Booking,
}

/// Handler for seat reservations.
///
/// Free events confirm immediately. Priced bookings are left `created`
/// and scheduled for expiry after the ledger commit. If scheduling
/// fails the booking still exists; the caller gets `ExpiryNotScheduled`
/// carrying its id.
pub struct CreateBookingHandler {
    events: Arc<dyn EventRepository>,
    users: Arc<dyn UserDirectory>,
    ledger: Arc<dyn SeatLedger>,
    scheduler: Arc<dyn ExpiryScheduler>,
}

impl CreateBookingHandler {
    pub fn new(
        events: Arc<dyn EventRepository>,
        users: Arc<dyn UserDirectory>,
        ledger: Arc<dyn SeatLedger>,
        scheduler: Arc<dyn ExpiryScheduler>,
    ) -> Self {
        Self {
            events,
            users,
            ledger,
            scheduler,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateBookingCommand,
    ) -> Result<CreateBookingResult, BookingError> {
        // 1. Validate input before touching storage
        let event_id = EventId::parse(&cmd.event_id)?;
        let user_id = UserId::parse(&cmd.user_id)?;
        if cmd.count <= 0 || cmd.count > MAX_SEATS {
            return Err(ValidationError::out_of_range("count", 1, MAX_SEATS, cmd.count).into());
        }
        let requested = cmd.count as u32;

        // 2. Load the event
        let event = self
            .events
            .find_by_id(event_id)
            .await
            .map_err(|e| BookingError::Storage(e.to_string()))?
            .ok_or(BookingError::EventNotFound(event_id))?;

        // 3. Fail fast on a sold-out event; the ledger re-checks atomically
        if !event.has_capacity_for(requested) {
            return Err(BookingError::InsufficientSeats {
                event_id,
                requested,
            });
        }

        // 4. Load contact details for notifications
        let contact = self
            .users
            .find_contact(user_id)
            .await
            .map_err(|e| BookingError::Storage(e.to_string()))?
            .ok_or(BookingError::UserNotFound(user_id))?;

        // 5. Build the aggregate from event terms
        let booking = Booking::create(
            NewBooking {
                event_ref: &cmd.event_id,
                user_ref: &cmd.user_id,
                event_name: event.name.clone(),
                recipients: contact.recipients(),
                notifications: NotificationPreferences {
                    email: cmd.email_notification,
                    telegram: cmd.telegram_notification,
                },
                count: cmd.count,
                ttl_minutes: event.booking_ttl_minutes,
                unit_price: event.price,
            },
            Timestamp::now(),
        )?;

        // 6. Reserve seats
        self.ledger.reserve(&booking).await?;

        tracing::info!(
            booking_id = %booking.id,
            event_id = %booking.event_id,
            seats = booking.count,
            status = %booking.status,
            "Booking created"
        );

        // 7. Schedule expiry for priced bookings
        if booking.is_priced() {
            if let Err(source) = self.scheduler.schedule(&booking).await {
                tracing::error!(
                    booking_id = %booking.id,
                    error = %source,
                    "Booking saved but expiry not scheduled"
                );
                return Err(BookingError::ExpiryNotScheduled {
                    booking_id: booking.id,
                    source,
                });
            }
        }

        Ok(CreateBookingResult { booking })
    }
}
