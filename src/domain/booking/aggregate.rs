//! Booking aggregate entity.
//!
//! A booking holds `count` seats of one event for one user. Construction
//! is pure: it validates caller input and derives price, status and expiry
//! but touches neither storage nor the broker.
//!
//! # Invariants
//!
//! - `count > 0`
//! - `total_price == unit_price * count`
//! - `status == Confirmed` iff the event is free
//! - `expires_at` is set iff the booking is priced

use crate::domain::foundation::{
    BookingId, EventId, Money, StateMachine, Timestamp, UserId, ValidationError,
};
use crate::domain::event::MAX_SEATS;
use serde::{Deserialize, Serialize};

use super::{BookingError, BookingStatus};

/// Which channels to use when the booking expires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPreferences {
    pub email: bool,
    pub telegram: bool,
}

/// Contact details copied from the user at booking time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipients {
    pub email: Option<String>,
    pub telegram_chat_id: Option<String>,
}

/// Input for [`Booking::create`].
#[derive(Debug, Clone)]
pub struct NewBooking<'a> {
    pub event_ref: &'a str,
    pub user_ref: &'a str,
    pub event_name: String,
    pub recipients: Recipients,
    pub notifications: NotificationPreferences,
    pub count: i64,
    pub ttl_minutes: u32,
    pub unit_price: Money,
}

/// Seat booking aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub event_id: EventId,
    pub user_id: UserId,

    /// Event name, denormalized for notifications.
    pub event_name: String,

    pub count: u32,
    pub total_price: Money,
    pub status: BookingStatus,
    pub created_at: Timestamp,

    /// When an unconfirmed booking gives its seats back. `None` for free bookings.
    pub expires_at: Option<Timestamp>,

    pub notifications: NotificationPreferences,
    pub recipients: Recipients,
}

impl Booking {
    /// Validates input and builds a new booking.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when either reference is not a UUID, `count` is not
    /// positive, or the total price overflows.
    pub fn create(new: NewBooking<'_>, now: Timestamp) -> Result<Self, BookingError> {
        let event_id = EventId::parse(new.event_ref)?;
        let user_id = UserId::parse(new.user_ref)?;

        if new.count <= 0 || new.count > MAX_SEATS {
            return Err(ValidationError::out_of_range("count", 1, MAX_SEATS, new.count).into());
        }
        let count = new.count as u32;

        // Stored as BIGINT cents
        let total_price = new
            .unit_price
            .checked_mul(count)
            .filter(|total| i64::try_from(total.cents()).is_ok())
            .ok_or_else(|| {
                ValidationError::invalid_format("total_price", "price times count overflows")
            })?;

        let (status, expires_at) = if new.unit_price.is_zero() {
            (BookingStatus::Confirmed, None)
        } else {
            (
                BookingStatus::Created,
                Some(now.plus_minutes(i64::from(new.ttl_minutes))),
            )
        };

        Ok(Self {
            id: BookingId::new(),
            event_id,
            user_id,
            event_name: new.event_name,
            count,
            total_price,
            status,
            created_at: now,
            expires_at,
            notifications: new.notifications,
            recipients: new.recipients,
        })
    }

    /// True when the booking must be paid for before it expires.
    pub fn is_priced(&self) -> bool {
        self.expires_at.is_some()
    }

    /// Time between creation and expiry.
    pub fn ttl(&self) -> Option<chrono::Duration> {
        self.expires_at
            .map(|expires| expires.duration_since(&self.created_at))
    }

    /// Marks the booking as paid. Confirming twice is a no-op.
    pub fn confirm(&mut self) -> Result<(), BookingError> {
        if self.status == BookingStatus::Confirmed {
            return Ok(());
        }
        self.status = self
            .status
            .transition_to(BookingStatus::Confirmed)
            .map_err(|_| BookingError::AlreadyFinalized(self.id))?;
        Ok(())
    }

    /// Cancels an unconfirmed booking.
    pub fn cancel(&mut self) -> Result<(), BookingError> {
        self.status = self
            .status
            .transition_to(BookingStatus::Cancelled)
            .map_err(|_| BookingError::AlreadyFinalized(self.id))?;
        Ok(())
    }
}
