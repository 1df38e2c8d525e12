//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Storage Ports
//!
//! - `SeatLedger` - Transactional seat inventory and booking rows
//! - `EventRepository` - Event persistence
//! - `UserDirectory` - Read-only user contact lookup
//!
//! ## Messaging Ports
//!
//! - `MessageBroker` - Exchanges, TTL queues, publish and consume
//! - `ExpiryScheduler` - Delayed expiry of priced bookings
//! - `NotificationSender` - Per-channel cancellation notices

mod event_repository;
mod expiry_scheduler;
mod message_broker;
mod notification_sender;
mod seat_ledger;
mod user_directory;

pub use event_repository::EventRepository;
pub use expiry_scheduler::ExpiryScheduler;
pub use message_broker::{
    BrokerError, ConsumeOptions, DeadLetter, Delivery, DeliveryAcker, DeliveryStream,
    ExchangeDeclaration, ExchangeKind, MessageBroker, QueueBinding, QueueDeclaration,
};
pub use notification_sender::{
    cancellation_message, NotificationChannel, NotificationError, NotificationSender,
};
pub use seat_ledger::{LedgerError, SeatLedger};
pub use user_directory::{DirectoryError, UserDirectory};
