//! Message broker adapters and the expiry pipeline built on them.
//!
//! - `amqp` - RabbitMQ over `lapin`
//! - `in_memory` - In-process broker with TTL dead-lettering (tests)
//! - `coordinator` - Expiry topology and delayed publish
//! - `expiry_consumer` - Worker pool over the expired queue

mod amqp;
mod coordinator;
mod expiry_consumer;
mod in_memory;

pub use amqp::AmqpBroker;
pub use coordinator::{DelayExpiryCoordinator, ExpiryTopology};
pub use expiry_consumer::{ExpiryConsumer, ExpiryConsumerConfig, Settlement};
pub use in_memory::{InMemoryBroker, PublishedMessage};
