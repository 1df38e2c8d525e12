//! Event domain module.
//!
//! Events carry the seat capacity, price and booking TTL that bookings
//! inherit.

mod aggregate;
mod errors;

pub use aggregate::{Event, NewEvent, MAX_SEATS};
pub use errors::EventError;
