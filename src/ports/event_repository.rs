//! Event repository port.

use crate::domain::event::{Event, EventError};
use crate::domain::foundation::EventId;
use async_trait::async_trait;

/// Persistence for event aggregates.
///
/// Seat counters are written by `save` only when the event is first
/// stored; afterwards the seat ledger owns them.
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Stores a new event.
    ///
    /// # Errors
    ///
    /// - `AlreadyExists` if the id is taken
    /// - `Storage` on persistence failure
    async fn save(&self, event: &Event) -> Result<(), EventError>;

    /// Returns `None` if not found.
    async fn find_by_id(&self, id: EventId) -> Result<Option<Event>, EventError>;
}
