//! Expiry scheduler port.

use crate::domain::booking::{Booking, ScheduleError};
use async_trait::async_trait;

/// Arranges for an expiry message to reach the expiry consumer once the
/// booking's TTL has passed.
#[async_trait]
pub trait ExpiryScheduler: Send + Sync {
    /// Publishes exactly one delayed expiry message for a priced booking.
    ///
    /// # Errors
    ///
    /// - `NoExpiry` for free bookings
    /// - `UnsupportedTtl` if no delay queue matches the booking TTL
    /// - `Encoding` / `Broker` if the message could not be published
    async fn schedule(&self, booking: &Booking) -> Result<(), ScheduleError>;
}
