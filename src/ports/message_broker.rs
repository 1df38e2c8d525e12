//! Message broker port.
//!
//! A thin view of an AMQP 0-9-1 broker: exchanges, queues with per-queue
//! message TTL and dead-lettering, publishing, and consuming deliveries
//! that must be explicitly acked or rejected.
//!
//! Delivery is at-least-once. A delivery that is neither acked nor
//! rejected before the consumer goes away is redelivered.

use async_trait::async_trait;
use futures::stream::BoxStream;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrokerError {
    #[error("Broker connection failed: {0}")]
    Connection(String),

    #[error("Failed to declare '{name}': {reason}")]
    Declare { name: String, reason: String },

    #[error("Exchange '{0}' does not exist")]
    UnknownExchange(String),

    #[error("Queue '{0}' does not exist")]
    UnknownQueue(String),

    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("Consume failed: {0}")]
    Consume(String),

    #[error("Acknowledgement failed: {0}")]
    Acknowledge(String),
}

/// Exchange type. The expiry topology routes on exact routing keys only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeKind {
    Direct,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeDeclaration {
    pub name: String,
    pub kind: ExchangeKind,
    pub durable: bool,
}

impl ExchangeDeclaration {
    /// Durable direct exchange.
    pub fn direct(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ExchangeKind::Direct,
            durable: true,
        }
    }
}

/// Where a queue sends messages that expire or are rejected without requeue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadLetter {
    pub exchange: String,
    pub routing_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueBinding {
    pub exchange: String,
    pub routing_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueDeclaration {
    pub name: String,
    pub durable: bool,
    pub binding: Option<QueueBinding>,

    /// Per-message TTL (`x-message-ttl`).
    pub message_ttl: Option<Duration>,

    /// Dead-letter target (`x-dead-letter-exchange` / `-routing-key`).
    pub dead_letter: Option<DeadLetter>,
}

impl QueueDeclaration {
    /// Durable queue with no binding, TTL or dead-letter target.
    pub fn durable(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            durable: true,
            binding: None,
            message_ttl: None,
            dead_letter: None,
        }
    }

    pub fn bound_to(mut self, exchange: impl Into<String>, routing_key: impl Into<String>) -> Self {
        self.binding = Some(QueueBinding {
            exchange: exchange.into(),
            routing_key: routing_key.into(),
        });
        self
    }

    pub fn with_message_ttl(mut self, ttl: Duration) -> Self {
        self.message_ttl = Some(ttl);
        self
    }

    pub fn dead_letter_to(
        mut self,
        exchange: impl Into<String>,
        routing_key: impl Into<String>,
    ) -> Self {
        self.dead_letter = Some(DeadLetter {
            exchange: exchange.into(),
            routing_key: routing_key.into(),
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumeOptions {
    pub consumer_tag: String,

    /// Maximum unacknowledged deliveries in flight.
    pub prefetch_count: u16,
}

/// Settles a single delivery with the broker.
#[async_trait]
pub trait DeliveryAcker: Send + Sync {
    async fn ack(&self) -> Result<(), BrokerError>;

    async fn reject(&self, requeue: bool) -> Result<(), BrokerError>;
}

/// A message handed to a consumer.
pub struct Delivery {
    pub payload: Vec<u8>,
    pub redelivered: bool,
    acker: Box<dyn DeliveryAcker>,
}

impl Delivery {
    pub fn new(payload: Vec<u8>, redelivered: bool, acker: Box<dyn DeliveryAcker>) -> Self {
        Self {
            payload,
            redelivered,
            acker,
        }
    }

    pub async fn ack(self) -> Result<(), BrokerError> {
        self.acker.ack().await
    }

    pub async fn reject(self, requeue: bool) -> Result<(), BrokerError> {
        self.acker.reject(requeue).await
    }
}

impl fmt::Debug for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delivery")
            .field("payload_len", &self.payload.len())
            .field("redelivered", &self.redelivered)
            .finish()
    }
}

pub type DeliveryStream = BoxStream<'static, Result<Delivery, BrokerError>>;

/// Broker operations used by the expiry pipeline.
#[async_trait]
pub trait MessageBroker: Send + Sync {
    /// Idempotent: redeclaring with the same arguments is a no-op.
    async fn declare_exchange(&self, exchange: &ExchangeDeclaration) -> Result<(), BrokerError>;

    /// Declares the queue and, if given, binds it.
    async fn declare_queue(&self, queue: &QueueDeclaration) -> Result<(), BrokerError>;

    /// Publishes a persistent message. Returns once the broker has taken it.
    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        payload: Vec<u8>,
    ) -> Result<(), BrokerError>;

    async fn consume(
        &self,
        queue: &str,
        options: &ConsumeOptions,
    ) -> Result<DeliveryStream, BrokerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_broker_is_object_safe() {
        fn _accepts_dyn(_broker: &dyn MessageBroker) {}
    }

    #[test]
    fn queue_builder_sets_ttl_and_dead_letter() {
        let q = QueueDeclaration::durable("delay_5.queue")
            .bound_to("booking.delay.exchange", "delay_5")
            .with_message_ttl(Duration::from_secs(300))
            .dead_letter_to("booking.dlx.exchange", "booking.expired");

        assert!(q.durable);
        assert_eq!(q.binding.unwrap().routing_key, "delay_5");
        assert_eq!(q.message_ttl, Some(Duration::from_secs(300)));
        assert_eq!(q.dead_letter.unwrap().exchange, "booking.dlx.exchange");
    }
}
