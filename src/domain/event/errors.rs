//! Event-specific error types.

use crate::domain::foundation::{EventId, ValidationError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(#[from] ValidationError),

    #[error("Event not found: {0}")]
    NotFound(EventId),

    #[error("Event {0} already exists")]
    AlreadyExists(EventId),

    #[error("Storage error: {0}")]
    Storage(String),
}
