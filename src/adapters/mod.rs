//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `broker` - AMQP and in-memory message brokers, expiry coordinator and consumer
//! - `memory` - In-memory store for tests and local runs
//! - `notification` - SMTP and Telegram cancellation senders
//! - `postgres` - PostgreSQL seat ledger, event repository and user directory
//! - `retry` - Bounded backoff used around ledger calls

pub mod broker;
pub mod memory;
pub mod notification;
pub mod postgres;
pub mod retry;

pub use broker::{
    AmqpBroker, DelayExpiryCoordinator, ExpiryConsumer, ExpiryConsumerConfig, ExpiryTopology,
    InMemoryBroker,
};
pub use memory::InMemoryStore;
pub use notification::{RecordingNotifier, SmtpEmailSender, TelegramSender};
pub use postgres::{PostgresEventRepository, PostgresSeatLedger, PostgresUserDirectory};
pub use retry::RetryPolicy;
