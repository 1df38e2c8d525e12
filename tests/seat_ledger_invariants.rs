//! Seat ledger invariants under concurrency and arbitrary operation sequences.

use std::sync::Arc;

use proptest::prelude::*;

use event_booker::adapters::memory::InMemoryStore;
use event_booker::domain::booking::{
    Booking, NewBooking, NotificationPreferences, Recipients, SupportedTtls,
};
use event_booker::domain::event::{Event, NewEvent};
use event_booker::domain::foundation::{Timestamp, UserId};
use event_booker::ports::{EventRepository, LedgerError, SeatLedger};

async fn event(store: &InMemoryStore, seats: i64) -> Event {
    let now = Timestamp::now();
    let owner = UserId::new().to_string();
    let event = Event::create(
        NewEvent {
            owner_ref: &owner,
            name: "Concert".to_string(),
            description: String::new(),
            date: now.plus_minutes(24 * 60),
            booking_ttl_minutes: 10,
            total_seats: seats,
            price_cents: 4_000,
        },
        &SupportedTtls::new([10]).unwrap(),
        now,
    )
    .unwrap();
    store.save(&event).await.unwrap();
    event
}

fn booking(event: &Event, count: i64) -> Booking {
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

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_reservations_never_oversell() {
    const SEATS: u32 = 25;
    let store = Arc::new(InMemoryStore::new());
    let event = event(&store, i64::from(SEATS)).await;

    let tasks: Vec<_> = (0..60)
        .map(|i| {
            let store = store.clone();
            let booking = booking(&event, 1 + (i % 3));
            tokio::spawn(async move {
                match store.reserve(&booking).await {
                    Ok(()) => booking.count,
                    Err(LedgerError::InsufficientSeats { .. }) => 0,
                    Err(e) => panic!("unexpected ledger error: {}", e),
                }
            })
        })
        .collect();

    let mut admitted = 0;
    for task in tasks {
        admitted += task.await.unwrap();
    }

    assert!(admitted <= SEATS);
    assert_eq!(store.available_seats(event.id), Some(SEATS - admitted));
    assert_eq!(store.held_seats(event.id), admitted);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_release_and_confirm_settle_on_one_outcome() {
    let store = Arc::new(InMemoryStore::new());
    let event = event(&store, 40).await;

    let mut pairs = Vec::new();
    for _ in 0..20 {
        let b = booking(&event, 2);
        store.reserve(&b).await.unwrap();
        let (booking_id, event_id) = (b.id, b.event_id);

        let release = {
            let store = store.clone();
            tokio::spawn(async move { store.release(booking_id, event_id).await })
        };
        let confirm = {
            let store = store.clone();
            tokio::spawn(async move { store.confirm(booking_id).await })
        };
        pairs.push((release, confirm));
    }

    for (release, confirm) in pairs {
        let released = release.await.unwrap().is_ok();
        let confirmed = confirm.await.unwrap().is_ok();
        assert_ne!(released, confirmed, "exactly one of release/confirm wins");
    }

    let available = store.available_seats(event.id).unwrap();
    assert_eq!(store.held_seats(event.id), 40 - available);
}

#[derive(Debug, Clone)]
enum Op {
    Reserve(i64),
    Release(usize),
    Confirm(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1i64..6).prop_map(Op::Reserve),
        any::<usize>().prop_map(Op::Release),
        any::<usize>().prop_map(Op::Confirm),
    ]
}

proptest! {
    #[test]
    fn held_seats_always_match_the_counter(
        seats in 1i64..30,
        ops in prop::collection::vec(op(), 1..40),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        runtime.block_on(async {
            let store = InMemoryStore::new();
            let event = event(&store, seats).await;
            let total = event.total_seats;
            let mut reserved: Vec<Booking> = Vec::new();

            for op in ops {
                match op {
                    Op::Reserve(count) => {
                        let b = booking(&event, count);
                        if store.reserve(&b).await.is_ok() {
                            reserved.push(b);
                        }
                    }
                    Op::Release(i) if !reserved.is_empty() => {
                        let b = &reserved[i % reserved.len()];
                        let _ = store.release(b.id, b.event_id).await;
                    }
                    Op::Confirm(i) if !reserved.is_empty() => {
                        let b = &reserved[i % reserved.len()];
                        let _ = store.confirm(b.id).await;
                    }
                    _ => {}
                }

                let available = store.available_seats(event.id).unwrap();
                prop_assert!(available <= total);
                prop_assert_eq!(store.held_seats(event.id), total - available);
            }
            Ok::<(), TestCaseError>(())
        })?;
    }
}
