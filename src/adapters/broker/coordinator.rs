//! Delay-queue expiry coordinator.
//!
//! Topology:
//!
//! ```text
//! booking.delay.exchange --delay_<m>--> delay_<m>.queue  (x-message-ttl = m min)
//!                                            |
//!                                  dead-letter on expiry
//!                                            v
//! booking.dlx.exchange --booking.expired--> expired.queue --> expiry consumer
//! ```
//!
//! One delay queue exists per supported TTL bucket. Nothing consumes the
//! delay queues; messages leave them only by expiring.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::booking::{Booking, ScheduleError, SupportedTtls};
use crate::ports::{
    BrokerError, ExchangeDeclaration, ExpiryScheduler, MessageBroker, QueueDeclaration,
};

/// Exchange, queue and routing key names of the expiry pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiryTopology {
    pub delay_exchange: String,
    pub dead_letter_exchange: String,
    pub expired_queue: String,
    pub expired_routing_key: String,
}

impl Default for ExpiryTopology {
    fn default() -> Self {
        Self {
            delay_exchange: "booking.delay.exchange".to_string(),
            dead_letter_exchange: "booking.dlx.exchange".to_string(),
            expired_queue: "expired.queue".to_string(),
            expired_routing_key: "booking.expired".to_string(),
        }
    }
}

/// Declares the expiry topology and publishes priced bookings into it.
pub struct DelayExpiryCoordinator {
    broker: Arc<dyn MessageBroker>,
    ttls: SupportedTtls,
    topology: ExpiryTopology,
}

impl DelayExpiryCoordinator {
    pub fn new(broker: Arc<dyn MessageBroker>, ttls: SupportedTtls) -> Self {
        Self::with_topology(broker, ttls, ExpiryTopology::default())
    }

    pub fn with_topology(
        broker: Arc<dyn MessageBroker>,
        ttls: SupportedTtls,
        topology: ExpiryTopology,
    ) -> Self {
        Self {
            broker,
            ttls,
            topology,
        }
    }

    pub fn topology(&self) -> &ExpiryTopology {
        &self.topology
    }

    /// Declares both exchanges, the expired queue and one delay queue per bucket.
    ///
    /// Safe to call on every start; redeclaring identical entities is a no-op.
    pub async fn declare_infrastructure(&self) -> Result<(), BrokerError> {
        let t = &self.topology;

        self.broker
            .declare_exchange(&ExchangeDeclaration::direct(&t.dead_letter_exchange))
            .await?;
        self.broker
            .declare_queue(
                &QueueDeclaration::durable(&t.expired_queue)
                    .bound_to(&t.dead_letter_exchange, &t.expired_routing_key),
            )
            .await?;

        self.broker
            .declare_exchange(&ExchangeDeclaration::direct(&t.delay_exchange))
            .await?;
        for bucket in self.ttls.buckets() {
            let queue = QueueDeclaration::durable(bucket.queue_name())
                .bound_to(&t.delay_exchange, bucket.routing_key())
                .with_message_ttl(bucket.message_ttl())
                .dead_letter_to(&t.dead_letter_exchange, &t.expired_routing_key);
            self.broker.declare_queue(&queue).await?;
            tracing::debug!(queue = %queue.name, minutes = bucket.minutes(), "Declared delay queue");
        }

        tracing::info!(
            buckets = self.ttls.buckets().count(),
            expired_queue = %t.expired_queue,
            "Expiry topology declared"
        );
        Ok(())
    }
}

#[async_trait]
impl ExpiryScheduler for DelayExpiryCoordinator {
    async fn schedule(&self, booking: &Booking) -> Result<(), ScheduleError> {
        let ttl = booking.ttl().ok_or(ScheduleError::NoExpiry(booking.id))?;
        let bucket = self.ttls.bucket_for(ttl)?;

        let payload =
            serde_json::to_vec(booking).map_err(|e| ScheduleError::Encoding(e.to_string()))?;

        self.broker
            .publish(&self.topology.delay_exchange, &bucket.routing_key(), payload)
            .await
            .map_err(|e| ScheduleError::Broker(e.to_string()))?;

        tracing::info!(
            booking_id = %booking.id,
            routing_key = %bucket.routing_key(),
            "Booking expiry scheduled"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::broker::InMemoryBroker;
    use crate::domain::booking::{NewBooking, NotificationPreferences, Recipients};
    use crate::domain::foundation::{EventId, Money, Timestamp, UserId};
    use std::time::Duration;

    fn booking(ttl_minutes: u32, price: u64) -> Booking {
        let event_ref = EventId::new().to_string();
        let user_ref = UserId::new().to_string();
        Booking::create(
            NewBooking {
                event_ref: &event_ref,
                user_ref: &user_ref,
                event_name: "Talk".to_string(),
                recipients: Recipients::default(),
                notifications: NotificationPreferences::default(),
                count: 1,
                ttl_minutes,
                unit_price: Money::from_cents(price),
            },
            Timestamp::now(),
        )
        .unwrap()
    }

    async fn coordinator() -> (InMemoryBroker, DelayExpiryCoordinator) {
        let broker = InMemoryBroker::new();
        let coordinator = DelayExpiryCoordinator::new(
            Arc::new(broker.clone()),
            SupportedTtls::new([5, 15]).unwrap(),
        );
        coordinator.declare_infrastructure().await.unwrap();
        (broker, coordinator)
    }

    #[tokio::test]
    async fn declares_one_delay_queue_per_bucket() {
        let (broker, _) = coordinator().await;

        assert!(broker.has_exchange("booking.delay.exchange"));
        assert!(broker.has_exchange("booking.dlx.exchange"));
        assert!(broker.queue_declaration("expired.queue").is_some());

        let delay = broker.queue_declaration("delay_15.queue").unwrap();
        assert_eq!(delay.message_ttl, Some(Duration::from_secs(900)));
        let dead_letter = delay.dead_letter.unwrap();
        assert_eq!(dead_letter.exchange, "booking.dlx.exchange");
        assert_eq!(dead_letter.routing_key, "booking.expired");
        assert_eq!(delay.binding.unwrap().routing_key, "delay_15");

        assert!(broker.queue_declaration("delay_10.queue").is_none());
    }

    #[tokio::test]
    async fn declaring_twice_is_harmless() {
        let (_, coordinator) = coordinator().await;
        coordinator.declare_infrastructure().await.unwrap();
    }

    #[tokio::test]
    async fn priced_booking_is_published_to_its_bucket() {
        let (broker, coordinator) = coordinator().await;
        let booking = booking(15, 500);

        coordinator.schedule(&booking).await.unwrap();

        let published = broker.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].exchange, "booking.delay.exchange");
        assert_eq!(published[0].routing_key, "delay_15");
        let decoded: Booking = serde_json::from_slice(&published[0].payload).unwrap();
        assert_eq!(decoded.id, booking.id);
        assert_eq!(broker.delayed_count("delay_15.queue"), 1);
    }

    #[tokio::test]
    async fn unsupported_bucket_is_rejected_before_publishing() {
        let (broker, coordinator) = coordinator().await;

        let err = coordinator.schedule(&booking(7, 500)).await.unwrap_err();

        assert_eq!(err, ScheduleError::UnsupportedTtl { minutes: 7 });
        assert!(broker.published().is_empty());
    }

    #[tokio::test]
    async fn free_booking_is_never_scheduled() {
        let (broker, coordinator) = coordinator().await;
        let free = booking(0, 0);

        let err = coordinator.schedule(&free).await.unwrap_err();

        assert_eq!(err, ScheduleError::NoExpiry(free.id));
        assert!(broker.published().is_empty());
    }
}
