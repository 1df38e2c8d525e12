//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.

pub mod handlers;

pub use handlers::{
    ConfirmBookingCommand, ConfirmBookingHandler, ConfirmBookingResult, CreateBookingCommand,
    CreateBookingHandler, CreateBookingResult, CreateEventCommand, CreateEventHandler,
    CreateEventResult, EventDetails, ExpireBookingHandler, ExpiryError, ExpiryOutcome,
    GetEventHandler, GetEventQuery,
};
