//! Booking status state machine.

use crate::domain::foundation::{StateMachine, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a seat booking.
///
/// `Created` is the only non-terminal state. A booking leaves it either by
/// payment confirmation or by expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Seats are held until the booking TTL runs out.
    Created,

    /// Booking is paid for (or free). Seats stay taken.
    Confirmed,

    /// Booking expired; its seats went back to the event.
    Cancelled,
}

impl BookingStatus {
    /// True while the booking still holds seats in the ledger.
    pub fn holds_seats(&self) -> bool {
        matches!(self, BookingStatus::Created | BookingStatus::Confirmed)
    }

    /// Storage representation used by the `bookings.status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Created => "created",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

impl StateMachine for BookingStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use BookingStatus::*;
        matches!((self, target), (Created, Confirmed) | (Created, Cancelled))
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use BookingStatus::*;
        match self {
            Created => vec![Confirmed, Cancelled],
            Confirmed | Cancelled => vec![],
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(BookingStatus::Created),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("unknown booking status '{}'", other),
            )),
        }
    }
}
