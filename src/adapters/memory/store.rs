//! In-memory storage for tests and local runs.
//!
//! One mutex guards events, bookings and users together, so each ledger
//! call is atomic the same way a Postgres transaction is.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::domain::booking::{Booking, BookingStatus};
use crate::domain::event::{Event, EventError};
use crate::domain::foundation::{BookingId, EventId, UserId};
use crate::domain::user::UserContact;
use crate::ports::{DirectoryError, EventRepository, LedgerError, SeatLedger, UserDirectory};

#[derive(Default)]
struct State {
    events: HashMap<EventId, Event>,
    bookings: Vec<Booking>,
    users: HashMap<UserId, UserContact>,
}

/// Seat ledger, event repository and user directory backed by process memory.
///
/// # Example
///
/// ```ignore
/// let store = Arc::new(InMemoryStore::new());
/// store.add_user(contact);
/// store.save(&event).await?;
/// store.reserve(&booking).await?;
/// assert_eq!(store.available_seats(event.id), Some(event.total_seats - booking.count));
/// ```
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
    failing_releases: AtomicUsize,
    releases: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // === Test Helpers ===

    /// Registers a user so bookings can find their contact details.
    pub fn add_user(&self, contact: UserContact) {
        self.lock().users.insert(contact.user_id, contact);
    }

    pub fn available_seats(&self, event_id: EventId) -> Option<u32> {
        self.lock().events.get(&event_id).map(|e| e.available_seats)
    }

    /// Number of successful releases so far.
    pub fn release_count(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    /// Makes the next `n` releases fail with a storage error.
    pub fn fail_next_releases(&self, n: usize) {
        self.failing_releases.store(n, Ordering::SeqCst);
    }

    /// Sum of seats held by created and confirmed bookings of an event.
    pub fn held_seats(&self, event_id: EventId) -> u32 {
        self.lock()
            .bookings
            .iter()
            .filter(|b| b.event_id == event_id && b.status.holds_seats())
            .map(|b| b.count)
            .sum()
    }

    fn take_injected_failure(&self) -> bool {
        self.failing_releases
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl SeatLedger for InMemoryStore {
    async fn reserve(&self, booking: &Booking) -> Result<(), LedgerError> {
        let mut state = self.lock();

        if state.bookings.iter().any(|b| b.id == booking.id) {
            return Err(LedgerError::Storage(format!(
                "booking {} already exists",
                booking.id
            )));
        }

        let event = state
            .events
            .get_mut(&booking.event_id)
            .ok_or(LedgerError::EventNotFound(booking.event_id))?;

        if event.available_seats < booking.count {
            return Err(LedgerError::InsufficientSeats {
                event_id: booking.event_id,
                requested: booking.count,
            });
        }
        event.available_seats -= booking.count;
        state.bookings.push(booking.clone());
        Ok(())
    }

    async fn release(&self, booking_id: BookingId, event_id: EventId) -> Result<(), LedgerError> {
        if self.take_injected_failure() {
            return Err(LedgerError::Storage("injected release failure".to_string()));
        }

        let mut state = self.lock();
        let State {
            events, bookings, ..
        } = &mut *state;

        let booking = bookings
            .iter_mut()
            .find(|b| b.id == booking_id && b.event_id == event_id)
            .ok_or(LedgerError::BookingNotFound(booking_id))?;

        let event = events
            .get_mut(&event_id)
            .ok_or(LedgerError::EventNotFound(event_id))?;

        booking
            .cancel()
            .map_err(|_| LedgerError::AlreadyFinalized(booking_id))?;
        event.available_seats = event.available_seats.saturating_add(booking.count);
        self.releases.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn confirm(&self, booking_id: BookingId) -> Result<(), LedgerError> {
        let mut state = self.lock();
        let booking = state
            .bookings
            .iter_mut()
            .find(|b| b.id == booking_id)
            .ok_or(LedgerError::BookingNotFound(booking_id))?;

        booking
            .confirm()
            .map_err(|_| LedgerError::AlreadyFinalized(booking_id))
    }

    async fn booking_status(
        &self,
        booking_id: BookingId,
    ) -> Result<Option<BookingStatus>, LedgerError> {
        Ok(self
            .lock()
            .bookings
            .iter()
            .find(|b| b.id == booking_id)
            .map(|b| b.status))
    }

    async fn find_booking(&self, booking_id: BookingId) -> Result<Option<Booking>, LedgerError> {
        Ok(self
            .lock()
            .bookings
            .iter()
            .find(|b| b.id == booking_id)
            .cloned())
    }

    async fn bookings_for_event(&self, event_id: EventId) -> Result<Vec<Booking>, LedgerError> {
        Ok(self
            .lock()
            .bookings
            .iter()
            .filter(|b| b.event_id == event_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl EventRepository for InMemoryStore {
    async fn save(&self, event: &Event) -> Result<(), EventError> {
        let mut state = self.lock();
        if state.events.contains_key(&event.id) {
            return Err(EventError::AlreadyExists(event.id));
        }
        state.events.insert(event.id, event.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: EventId) -> Result<Option<Event>, EventError> {
        Ok(self.lock().events.get(&id).cloned())
    }
}

#[async_trait]
impl UserDirectory for InMemoryStore {
    async fn find_contact(&self, user_id: UserId) -> Result<Option<UserContact>, DirectoryError> {
        Ok(self.lock().users.get(&user_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::booking::{NewBooking, NotificationPreferences, Recipients, SupportedTtls};
    use crate::domain::event::NewEvent;
    use crate::domain::foundation::Timestamp;

    async fn event_with(store: &InMemoryStore, seats: i64, price: i64) -> Event {
        let now = Timestamp::now();
        let owner = UserId::new().to_string();
        let event = Event::create(
            NewEvent {
                owner_ref: &owner,
                name: "Workshop".to_string(),
                description: String::new(),
                date: now.plus_minutes(600),
                booking_ttl_minutes: 5,
                total_seats: seats,
                price_cents: price,
            },
            &SupportedTtls::new([5]).unwrap(),
            now,
        )
        .unwrap();
        store.save(&event).await.unwrap();
        event
    }

    fn booking_for(event: &Event, count: i64) -> Booking {
        let event_ref = event.id.to_string();
        let user_ref = UserId::new().to_string();
        Booking::create(
            NewBooking {
                event_ref: &event_ref,
                user_ref: &user_ref,
                event_name: event.name.clone(),
                recipients: Recipients::default(),
                notifications: NotificationPreferences::default(),
                count,
                ttl_minutes: event.booking_ttl_minutes,
                unit_price: event.price,
            },
            Timestamp::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn reserve_takes_seats() {
        let store = InMemoryStore::new();
        let event = event_with(&store, 10, 100).await;

        store.reserve(&booking_for(&event, 4)).await.unwrap();

        assert_eq!(store.available_seats(event.id), Some(6));
        assert_eq!(store.held_seats(event.id), 4);
    }

    #[tokio::test]
    async fn reserve_beyond_capacity_changes_nothing() {
        let store = InMemoryStore::new();
        let event = event_with(&store, 2, 100).await;

        let err = store.reserve(&booking_for(&event, 3)).await.unwrap_err();

        assert!(matches!(err, LedgerError::InsufficientSeats { requested: 3, .. }));
        assert_eq!(store.available_seats(event.id), Some(2));
        assert!(store.bookings_for_event(event.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reserve_for_unknown_event_fails() {
        let store = InMemoryStore::new();
        let event = event_with(&InMemoryStore::new(), 2, 100).await;

        let err = store.reserve(&booking_for(&event, 1)).await.unwrap_err();
        assert_eq!(err, LedgerError::EventNotFound(event.id));
    }

    #[tokio::test]
    async fn release_returns_seats_once() {
        let store = InMemoryStore::new();
        let event = event_with(&store, 5, 100).await;
        let booking = booking_for(&event, 3);
        store.reserve(&booking).await.unwrap();

        store.release(booking.id, event.id).await.unwrap();
        let second = store.release(booking.id, event.id).await;

        assert_eq!(second, Err(LedgerError::AlreadyFinalized(booking.id)));
        assert_eq!(store.available_seats(event.id), Some(5));
        assert_eq!(store.release_count(), 1);
        assert_eq!(
            store.booking_status(booking.id).await.unwrap(),
            Some(BookingStatus::Cancelled)
        );
    }

    #[tokio::test]
    async fn release_of_confirmed_booking_is_already_finalized() {
        let store = InMemoryStore::new();
        let event = event_with(&store, 5, 100).await;
        let booking = booking_for(&event, 2);
        store.reserve(&booking).await.unwrap();
        store.confirm(booking.id).await.unwrap();

        let err = store.release(booking.id, event.id).await.unwrap_err();

        assert_eq!(err, LedgerError::AlreadyFinalized(booking.id));
        assert_eq!(store.available_seats(event.id), Some(3));
    }

    #[tokio::test]
    async fn confirm_is_idempotent_but_rejects_cancelled() {
        let store = InMemoryStore::new();
        let event = event_with(&store, 5, 100).await;
        let kept = booking_for(&event, 1);
        let dropped = booking_for(&event, 1);
        store.reserve(&kept).await.unwrap();
        store.reserve(&dropped).await.unwrap();

        store.confirm(kept.id).await.unwrap();
        store.confirm(kept.id).await.unwrap();
        store.release(dropped.id, event.id).await.unwrap();

        assert_eq!(
            store.confirm(dropped.id).await,
            Err(LedgerError::AlreadyFinalized(dropped.id))
        );
        let missing = BookingId::new();
        assert_eq!(
            store.confirm(missing).await,
            Err(LedgerError::BookingNotFound(missing))
        );
    }

    #[tokio::test]
    async fn find_booking_reflects_ledger_transitions() {
        let store = InMemoryStore::new();
        let event = event_with(&store, 5, 100).await;
        let kept = booking_for(&event, 2);
        let expired = booking_for(&event, 1);
        store.reserve(&kept).await.unwrap();
        store.reserve(&expired).await.unwrap();

        store.confirm(kept.id).await.unwrap();
        store.release(expired.id, event.id).await.unwrap();

        let found = store.find_booking(kept.id).await.unwrap().unwrap();
        assert_eq!(found.status, BookingStatus::Confirmed);
        assert_eq!(found.count, 2);
        assert_eq!(found.recipients, kept.recipients);

        let found = store.find_booking(expired.id).await.unwrap().unwrap();
        assert_eq!(found.status, BookingStatus::Cancelled);
        assert_eq!(found.expires_at, expired.expires_at);

        assert_eq!(store.find_booking(BookingId::new()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn release_of_free_booking_is_already_finalized() {
        let store = InMemoryStore::new();
        let event = event_with(&store, 5, 0).await;
        let booking = booking_for(&event, 2);
        store.reserve(&booking).await.unwrap();

        let err = store.release(booking.id, event.id).await.unwrap_err();

        assert_eq!(err, LedgerError::AlreadyFinalized(booking.id));
        assert_eq!(store.available_seats(event.id), Some(3));
        assert_eq!(store.release_count(), 0);
    }

    #[tokio::test]
    async fn injected_release_failures_are_consumed() {
        let store = InMemoryStore::new();
        let event = event_with(&store, 5, 100).await;
        let booking = booking_for(&event, 1);
        store.reserve(&booking).await.unwrap();
        store.fail_next_releases(1);

        let first = store.release(booking.id, event.id).await;
        let second = store.release(booking.id, event.id).await;

        assert!(matches!(first, Err(LedgerError::Storage(_))));
        assert!(second.is_ok());
    }
}
