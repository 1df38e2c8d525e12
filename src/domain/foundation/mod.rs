//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, time and money value objects, the state
//! machine trait and validation errors used by every bounded context.

mod errors;
mod ids;
mod money;
mod state_machine;
mod timestamp;

pub use errors::ValidationError;
pub use ids::{BookingId, EventId, UserId};
pub use money::Money;
pub use state_machine::{StateMachine, TransitionError};
pub use timestamp::Timestamp;
