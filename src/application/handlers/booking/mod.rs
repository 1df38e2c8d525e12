//! Booking handlers.
//!
//! ## Commands
//! - Reserving seats (with expiry scheduling for priced events)
//! - Confirming a reserved booking

mod confirm_booking;
mod create_booking;

pub use confirm_booking::{ConfirmBookingCommand, ConfirmBookingHandler, ConfirmBookingResult};
pub use create_booking::{CreateBookingCommand, CreateBookingHandler, CreateBookingResult};
