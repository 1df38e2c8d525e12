//! Expiry handlers.

mod expire_booking;

pub use expire_booking::{ExpireBookingHandler, ExpiryError, ExpiryOutcome};
