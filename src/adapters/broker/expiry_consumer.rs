//! Expiry consumer - drains the expired queue with a pool of workers.
//!
//! Each delivery is decoded and handed to [`ExpireBookingHandler`]; ledger
//! failures are retried with backoff before the message is given up.
//!
//! # Configuration
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `queue` | `expired.queue` | Queue to consume |
//! | `consumer_tag` | `booking-expired-worker` | Tag shown in the broker UI |
//! | `prefetch_count` | 10 | Unacked deliveries in flight |
//! | `workers` | 5 | Deliveries processed concurrently |
//! | `retry` | 3 attempts, 1s, x2 | Backoff for ledger failures |
//!
//! # Acknowledgement
//!
//! | Outcome | Action |
//! |---------|--------|
//! | Released / already resolved / not found | ack |
//! | Malformed payload | reject, no requeue |
//! | Retries exhausted | reject, no requeue (logged at error) |
//!
//! # Shutdown
//!
//! On shutdown the consumer stops taking deliveries and lets in-flight
//! ones finish. Unsettled deliveries are redelivered by the broker.

use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::watch;

use crate::adapters::retry::{retry_with_backoff, RetryPolicy};
use crate::application::handlers::{ExpireBookingHandler, ExpiryError, ExpiryOutcome};
use crate::ports::{BrokerError, ConsumeOptions, Delivery, MessageBroker};

/// Configuration for the expiry consumer.
#[derive(Debug, Clone)]
pub struct ExpiryConsumerConfig {
    pub queue: String,
    pub consumer_tag: String,
    pub prefetch_count: u16,
    pub workers: usize,
    pub retry: RetryPolicy,
}

impl Default for ExpiryConsumerConfig {
    fn default() -> Self {
        Self {
            queue: "expired.queue".to_string(),
            consumer_tag: "booking-expired-worker".to_string(),
            prefetch_count: 10,
            workers: 5,
            retry: RetryPolicy::default(),
        }
    }
}

impl ExpiryConsumerConfig {
    pub fn with_queue(mut self, queue: impl Into<String>) -> Self {
        self.queue = queue.into();
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// How a delivery was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Acked,
    Rejected,
}

pub struct ExpiryConsumer {
    broker: Arc<dyn MessageBroker>,
    handler: Arc<ExpireBookingHandler>,
    config: ExpiryConsumerConfig,
}

impl ExpiryConsumer {
    pub fn new(
        broker: Arc<dyn MessageBroker>,
        handler: Arc<ExpireBookingHandler>,
        config: ExpiryConsumerConfig,
    ) -> Self {
        Self {
            broker,
            handler,
            config,
        }
    }

    /// Consumes until shutdown is signalled or the delivery stream ends.
    ///
    /// # Errors
    ///
    /// Returns an error only if the consumer cannot be registered.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), BrokerError> {
        let options = ConsumeOptions {
            consumer_tag: self.config.consumer_tag.clone(),
            prefetch_count: self.config.prefetch_count,
        };
        let deliveries = self.broker.consume(&self.config.queue, &options).await?;
        let workers = self.config.workers.max(1);

        tracing::info!(
            queue = %self.config.queue,
            workers,
            prefetch = self.config.prefetch_count,
            "Expiry consumer started"
        );

        deliveries
            .take_until(wait_for_shutdown(&mut shutdown))
            .for_each_concurrent(workers, |item| async move {
                match item {
                    Ok(delivery) => {
                        self.process(delivery).await;
                    }
                    Err(e) => tracing::error!(error = %e, "Failed to receive delivery"),
                }
            })
            .await;

        tracing::info!(queue = %self.config.queue, "Expiry consumer stopped");
        Ok(())
    }

    /// Handles one delivery and settles it with the broker.
    pub async fn process(&self, delivery: Delivery) -> Settlement {
        let handler = &self.handler;
        let payload = delivery.payload.as_slice();

        let result = retry_with_backoff(
            &self.config.retry,
            move || handler.handle_payload(payload),
            ExpiryError::is_retryable,
        )
        .await;

        let (settlement, settled) = match result {
            Ok(outcome) => {
                log_outcome(&outcome, delivery.redelivered);
                (Settlement::Acked, delivery.ack().await)
            }
            Err(ExpiryError::Malformed(reason)) => {
                tracing::warn!(reason = %reason, "Dropping malformed expiry message");
                (Settlement::Rejected, delivery.reject(false).await)
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    attempts = self.config.retry.max_attempts,
                    "Expiry failed after retries, dropping message"
                );
                (Settlement::Rejected, delivery.reject(false).await)
            }
        };

        if let Err(e) = settled {
            tracing::error!(error = %e, "Failed to settle delivery");
        }
        settlement
    }
}

fn log_outcome(outcome: &ExpiryOutcome, redelivered: bool) {
    match outcome {
        ExpiryOutcome::Released {
            booking_id,
            notified,
        } => tracing::debug!(
            booking_id = %booking_id,
            notified = notified.len(),
            redelivered,
            "Expiry handled"
        ),
        ExpiryOutcome::AlreadyResolved { booking_id } => {
            tracing::debug!(booking_id = %booking_id, redelivered, "Expiry was a no-op")
        }
        ExpiryOutcome::NotFound { booking_id } => {
            tracing::warn!(booking_id = %booking_id, redelivered, "Acking expiry for missing booking")
        }
    }
}

async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    while !*shutdown.borrow() {
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::broker::InMemoryBroker;
    use crate::adapters::memory::InMemoryStore;
    use crate::ports::{ExchangeDeclaration, QueueDeclaration};
    use std::time::Duration;

    async fn setup() -> (InMemoryBroker, Arc<InMemoryStore>, ExpiryConsumer) {
        let broker = InMemoryBroker::new();
        broker
            .declare_exchange(&ExchangeDeclaration::direct("dlx"))
            .await
            .unwrap();
        broker
            .declare_queue(&QueueDeclaration::durable("expired.queue").bound_to("dlx", "expired"))
            .await
            .unwrap();

        let store = Arc::new(InMemoryStore::new());
        let handler = Arc::new(ExpireBookingHandler::new(store.clone()));
        let consumer = ExpiryConsumer::new(
            Arc::new(broker.clone()),
            handler,
            ExpiryConsumerConfig::default().with_retry(RetryPolicy {
                max_attempts: 2,
                initial_delay: Duration::from_millis(1),
                backoff: 2.0,
                max_delay: Duration::from_millis(5),
            }),
        );
        (broker, store, consumer)
    }

    #[tokio::test]
    async fn malformed_message_is_rejected_and_consumer_keeps_going() {
        let (broker, _store, consumer) = setup().await;
        let (tx, rx) = watch::channel(false);
        let consumer = Arc::new(consumer);
        let runner = {
            let consumer = consumer.clone();
            tokio::spawn(async move { consumer.run(rx).await })
        };

        broker.publish("dlx", "expired", b"garbage".to_vec()).await.unwrap();
        broker.publish("dlx", "expired", b"{}".to_vec()).await.unwrap();

        tokio::time::timeout(Duration::from_secs(5), async {
            while broker.dropped_count() < 2 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        tx.send(true).unwrap();
        runner.await.unwrap().unwrap();
        assert_eq!(broker.acked_count(), 0);
    }

    #[tokio::test]
    async fn run_returns_after_shutdown_signal() {
        let (_broker, _store, consumer) = setup().await;
        let (tx, rx) = watch::channel(false);

        let run = consumer.run(rx);
        tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(1), run)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn unknown_queue_fails_to_start() {
        let (broker, store, _) = setup().await;
        let consumer = ExpiryConsumer::new(
            Arc::new(broker),
            Arc::new(ExpireBookingHandler::new(store)),
            ExpiryConsumerConfig::default().with_queue("missing.queue"),
        );
        let (_tx, rx) = watch::channel(false);

        let err = consumer.run(rx).await.unwrap_err();
        assert_eq!(err, BrokerError::UnknownQueue("missing.queue".to_string()));
    }
}
