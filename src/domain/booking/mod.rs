//! Booking domain module.
//!
//! Seat bookings, their lifecycle and the TTL buckets that drive expiry.

mod aggregate;
mod errors;
mod status;
mod ttl;

pub use aggregate::{Booking, NewBooking, NotificationPreferences, Recipients};
pub use errors::{BookingError, ScheduleError};
pub use status::BookingStatus;
pub use ttl::{round_to_minutes, SupportedTtls, TtlBucket};
