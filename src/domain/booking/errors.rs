//! Booking-specific error types.

use crate::domain::foundation::{BookingId, EventId, UserId, ValidationError};
use thiserror::Error;

/// Errors returned by booking operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookingError {
    /// Caller input was rejected before any side effect.
    #[error("Invalid argument: {0}")]
    InvalidArgument(#[from] ValidationError),

    #[error("Event not found: {0}")]
    EventNotFound(EventId),

    #[error("User not found: {0}")]
    UserNotFound(UserId),

    #[error("Booking not found: {0}")]
    BookingNotFound(BookingId),

    /// Not enough seats left; nothing was written.
    #[error("Not enough seats on event {event_id}: requested {requested}")]
    InsufficientSeats { event_id: EventId, requested: u32 },

    /// Booking already left the `Created` state.
    #[error("Booking {0} is already finalized")]
    AlreadyFinalized(BookingId),

    /// The booking was committed but its expiry message was not published.
    #[error("Booking {booking_id} was saved but its expiry was not scheduled: {source}")]
    ExpiryNotScheduled {
        booking_id: BookingId,
        #[source]
        source: ScheduleError,
    },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl BookingError {
    /// Id of a booking that exists despite the error, if any.
    pub fn committed_booking(&self) -> Option<BookingId> {
        match self {
            BookingError::ExpiryNotScheduled { booking_id, .. } => Some(*booking_id),
            _ => None,
        }
    }
}

/// Errors raised while publishing a booking to its delay queue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    /// No delay queue exists for this TTL.
    #[error("No delay queue for a TTL of {minutes} minutes")]
    UnsupportedTtl { minutes: u32 },

    /// Free bookings are never scheduled.
    #[error("Booking {0} has no expiry")]
    NoExpiry(BookingId),

    #[error("Failed to encode expiry message: {0}")]
    Encoding(String),

    #[error("Broker rejected expiry message: {0}")]
    Broker(String),
}
