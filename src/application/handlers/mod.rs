//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod booking;
pub mod event;
pub mod expiry;

pub use booking::{
    ConfirmBookingCommand, ConfirmBookingHandler, ConfirmBookingResult, CreateBookingCommand,
    CreateBookingHandler, CreateBookingResult,
};
pub use event::{
    CreateEventCommand, CreateEventHandler, CreateEventResult, EventDetails, GetEventHandler,
    GetEventQuery,
};
pub use expiry::{ExpireBookingHandler, ExpiryError, ExpiryOutcome};
