//! Event aggregate.
//!
//! An event owns a fixed seat capacity. `available_seats` is only ever
//! changed by the seat ledger; this type never mutates it after creation.

use crate::domain::booking::SupportedTtls;
use crate::domain::foundation::{EventId, Money, Timestamp, UserId, ValidationError};
use serde::{Deserialize, Serialize};

/// Largest seat count an event or booking may carry. Seat columns are `INTEGER`.
pub const MAX_SEATS: i64 = i32::MAX as i64;

/// Input for [`Event::create`].
#[derive(Debug, Clone)]
pub struct NewEvent<'a> {
    pub owner_ref: &'a str,
    pub name: String,
    pub description: String,
    pub date: Timestamp,
    pub booking_ttl_minutes: i64,
    pub total_seats: i64,
    pub price_cents: i64,
}

/// A bookable event with limited capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub owner_id: UserId,
    pub date: Timestamp,
    pub name: String,
    pub description: String,
    pub total_seats: u32,
    pub available_seats: u32,
    pub price: Money,

    /// Minutes a priced booking may stay unconfirmed. Always 0 for free events.
    pub booking_ttl_minutes: u32,
}

impl Event {
    /// Validates input and builds an event with every seat available.
    ///
    /// Free events get a TTL of zero regardless of the requested value.
    /// Priced events must use a TTL that has a delay queue.
    pub fn create(
        new: NewEvent<'_>,
        supported: &SupportedTtls,
        now: Timestamp,
    ) -> Result<Self, ValidationError> {
        let owner_id = UserId::parse(new.owner_ref).map_err(|_| {
            ValidationError::invalid_format("owner_id", "owner must be a valid UUID")
        })?;

        if new.name.trim().is_empty() {
            return Err(ValidationError::empty_field("name"));
        }

        if new.total_seats <= 0 || new.total_seats > MAX_SEATS {
            return Err(ValidationError::out_of_range(
                "total_seats",
                1,
                MAX_SEATS,
                new.total_seats,
            ));
        }

        if new.price_cents < 0 {
            return Err(ValidationError::out_of_range(
                "price",
                0,
                i64::MAX,
                new.price_cents,
            ));
        }

        if !new.date.is_after(&now) {
            return Err(ValidationError::invalid_format(
                "date",
                "event date must be in the future",
            ));
        }

        let price = Money::from_cents(new.price_cents as u64);
        let booking_ttl_minutes = if price.is_zero() {
            0
        } else {
            let ttl = u32::try_from(new.booking_ttl_minutes).map_err(|_| {
                ValidationError::out_of_range(
                    "booking_ttl_minutes",
                    1,
                    i64::from(u32::MAX),
                    new.booking_ttl_minutes,
                )
            })?;
            if !supported.contains(ttl) {
                return Err(ValidationError::invalid_format(
                    "booking_ttl_minutes",
                    format!("{} is not a supported booking TTL", ttl),
                ));
            }
            ttl
        };

        let total_seats = new.total_seats as u32;
        Ok(Self {
            id: EventId::new(),
            owner_id,
            date: new.date,
            name: new.name,
            description: new.description,
            total_seats,
            available_seats: total_seats,
            price,
            booking_ttl_minutes,
        })
    }

    pub fn is_free(&self) -> bool {
        self.price.is_zero()
    }

    /// Seats currently held by created or confirmed bookings.
    pub fn booked_seats(&self) -> u32 {
        self.total_seats.saturating_sub(self.available_seats)
    }

    pub fn has_capacity_for(&self, count: u32) -> bool {
        self.available_seats >= count
    }
}
