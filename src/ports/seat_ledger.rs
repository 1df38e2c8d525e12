//! Seat ledger port.
//!
//! The ledger owns the `available_seats` column of every event and the
//! booking rows that consume it. Every mutating call is one transaction:
//! either the booking row and the seat counter change together, or
//! neither does.
//!
//! # Ledger invariant
//!
//! For every event, the seat counts of its `created` and `confirmed`
//! bookings sum to `total_seats - available_seats` after each commit.

use crate::domain::booking::{Booking, BookingError, BookingStatus};
use crate::domain::foundation::{BookingId, EventId};
use async_trait::async_trait;
use thiserror::Error;

/// Errors reported by seat ledger implementations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Not enough seats on event {event_id}: requested {requested}")]
    InsufficientSeats { event_id: EventId, requested: u32 },

    /// Booking is no longer `created`; the call changed nothing.
    #[error("Booking {0} is already finalized")]
    AlreadyFinalized(BookingId),

    #[error("Booking not found: {0}")]
    BookingNotFound(BookingId),

    #[error("Event not found: {0}")]
    EventNotFound(EventId),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    /// Infrastructure failures may succeed on a later attempt; business
    /// outcomes never will.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::Storage(_))
    }
}

impl From<LedgerError> for BookingError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientSeats {
                event_id,
                requested,
            } => BookingError::InsufficientSeats {
                event_id,
                requested,
            },
            LedgerError::AlreadyFinalized(id) => BookingError::AlreadyFinalized(id),
            LedgerError::BookingNotFound(id) => BookingError::BookingNotFound(id),
            LedgerError::EventNotFound(id) => BookingError::EventNotFound(id),
            LedgerError::Storage(msg) => BookingError::Storage(msg),
        }
    }
}

/// Transactional seat inventory.
#[async_trait]
pub trait SeatLedger: Send + Sync {
    /// Inserts the booking and takes `count` seats from its event.
    ///
    /// # Errors
    ///
    /// - `InsufficientSeats` if fewer than `count` seats are left
    /// - `EventNotFound` if the event does not exist
    /// - `Storage` on persistence failure
    async fn reserve(&self, booking: &Booking) -> Result<(), LedgerError>;

    /// Cancels a `created` booking and gives its seats back.
    ///
    /// # Errors
    ///
    /// - `AlreadyFinalized` if the booking is confirmed or cancelled
    /// - `BookingNotFound` if no such booking exists for the event
    /// - `Storage` on persistence failure
    async fn release(&self, booking_id: BookingId, event_id: EventId) -> Result<(), LedgerError>;

    /// Confirms a booking. Confirming a confirmed booking succeeds.
    ///
    /// # Errors
    ///
    /// - `AlreadyFinalized` if the booking was cancelled
    /// - `BookingNotFound` if no such booking exists
    async fn confirm(&self, booking_id: BookingId) -> Result<(), LedgerError>;

    /// Current status, `None` if the booking does not exist.
    async fn booking_status(&self, booking_id: BookingId)
        -> Result<Option<BookingStatus>, LedgerError>;

    async fn find_booking(&self, booking_id: BookingId) -> Result<Option<Booking>, LedgerError>;

    /// All bookings of an event, oldest first.
    async fn bookings_for_event(&self, event_id: EventId) -> Result<Vec<Booking>, LedgerError>;
}
