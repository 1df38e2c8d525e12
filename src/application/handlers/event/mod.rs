//! Event handlers.
//!
//! ## Commands
//! - Publishing an event
//!
//! ## Queries
//! - Event details with bookings

mod create_event;
mod get_event;

pub use create_event::{CreateEventCommand, CreateEventHandler, CreateEventResult};
pub use get_event::{EventDetails, GetEventHandler, GetEventQuery};
