//! In-memory message broker for tests.
//!
//! Models the parts of AMQP the expiry pipeline relies on: direct and
//! fanout routing, queues with a per-message TTL that dead-letter on
//! expiry, explicit ack/reject, requeue with the redelivered flag, and a
//! prefetch limit on unsettled deliveries. TTL timers run on tokio time,
//! so tests can use a paused clock.
//!
//! Messages in a TTL queue are never handed to consumers; they wait out
//! the TTL and are dead-lettered, which is how delay queues are used.
//! Each queue accepts a single consumer. Unsettled deliveries are not
//! redelivered when that consumer goes away.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};

use crate::ports::{
    BrokerError, ConsumeOptions, DeadLetter, Delivery, DeliveryAcker, DeliveryStream,
    ExchangeDeclaration, MessageBroker, QueueDeclaration,
};

/// A message accepted by `publish`, kept for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub exchange: String,
    pub routing_key: String,
    pub payload: Vec<u8>,
}

struct QueuedMessage {
    payload: Vec<u8>,
    redelivered: bool,
}

struct Binding {
    exchange: String,
    routing_key: String,
    queue: String,
}

struct QueueSlot {
    declaration: QueueDeclaration,
    sender: mpsc::UnboundedSender<QueuedMessage>,
    receiver: Option<mpsc::UnboundedReceiver<QueuedMessage>>,
    delayed: usize,
}

#[derive(Default)]
struct BrokerState {
    exchanges: HashMap<String, ExchangeDeclaration>,
    bindings: Vec<Binding>,
    queues: HashMap<String, QueueSlot>,
    published: Vec<PublishedMessage>,
}

#[derive(Default)]
struct Inner {
    state: Mutex<BrokerState>,
    acked: AtomicUsize,
    requeued: AtomicUsize,
    dropped: AtomicUsize,
    unroutable: AtomicUsize,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, BrokerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Routes a message through an exchange. Returns the number of queues reached.
    fn route(
        self: &Arc<Self>,
        exchange: &str,
        routing_key: &str,
        payload: Vec<u8>,
        redelivered: bool,
    ) -> Result<usize, BrokerError> {
        let mut state = self.lock();
        if !state.exchanges.contains_key(exchange) {
            return Err(BrokerError::UnknownExchange(exchange.to_string()));
        }

        let targets: Vec<String> = state
            .bindings
            .iter()
            .filter(|b| b.exchange == exchange && b.routing_key == routing_key)
            .map(|b| b.queue.clone())
            .collect();

        if targets.is_empty() {
            self.unroutable.fetch_add(1, Ordering::SeqCst);
            tracing::debug!(exchange, routing_key, "Dropping unroutable message");
            return Ok(0);
        }

        for queue in &targets {
            if let Some(slot) = state.queues.get_mut(queue) {
                self.enqueue(slot, payload.clone(), redelivered);
            }
        }
        Ok(targets.len())
    }

    fn enqueue(self: &Arc<Self>, slot: &mut QueueSlot, payload: Vec<u8>, redelivered: bool) {
        match slot.declaration.message_ttl {
            Some(ttl) => {
                slot.delayed += 1;
                let inner = Arc::clone(self);
                let queue = slot.declaration.name.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(ttl).await;
                    inner.expire(&queue, payload);
                });
            }
            None => {
                let message = QueuedMessage {
                    payload,
                    redelivered,
                };
                if slot.sender.send(message).is_err() {
                    self.dropped.fetch_add(1, Ordering::SeqCst);
                    tracing::warn!(queue = %slot.declaration.name, "Consumer gone, message dropped");
                }
            }
        }
    }

    fn expire(self: &Arc<Self>, queue: &str, payload: Vec<u8>) {
        let target = {
            let mut state = self.lock();
            state.queues.get_mut(queue).and_then(|slot| {
                slot.delayed = slot.delayed.saturating_sub(1);
                slot.declaration.dead_letter.clone()
            })
        };
        self.dead_letter(target, payload);
    }

    fn dead_letter(self: &Arc<Self>, target: Option<DeadLetter>, payload: Vec<u8>) {
        let Some(target) = target else {
            self.dropped.fetch_add(1, Ordering::SeqCst);
            return;
        };
        if let Err(e) = self.route(&target.exchange, &target.routing_key, payload, false) {
            self.dropped.fetch_add(1, Ordering::SeqCst);
            tracing::warn!(error = %e, "Dead-letter routing failed");
        }
    }

    fn requeue(&self, queue: &str, payload: Vec<u8>) {
        let state = self.lock();
        let sent = state.queues.get(queue).map(|slot| {
            slot.sender.send(QueuedMessage {
                payload,
                redelivered: true,
            })
        });
        if matches!(sent, Some(Ok(()))) {
            self.requeued.fetch_add(1, Ordering::SeqCst);
        } else {
            self.dropped.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// In-memory broker.
///
/// Cloning shares the same exchanges and queues.
#[derive(Clone, Default)]
pub struct InMemoryBroker {
    inner: Arc<Inner>,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    // === Test Helpers ===

    /// Every message accepted by `publish`, in order.
    pub fn published(&self) -> Vec<PublishedMessage> {
        self.inner.lock().published.clone()
    }

    /// Messages waiting out the TTL of a delay queue.
    pub fn delayed_count(&self, queue: &str) -> usize {
        self.inner
            .lock()
            .queues
            .get(queue)
            .map(|slot| slot.delayed)
            .unwrap_or(0)
    }

    pub fn queue_declaration(&self, queue: &str) -> Option<QueueDeclaration> {
        self.inner
            .lock()
            .queues
            .get(queue)
            .map(|slot| slot.declaration.clone())
    }

    pub fn has_exchange(&self, exchange: &str) -> bool {
        self.inner.lock().exchanges.contains_key(exchange)
    }

    pub fn acked_count(&self) -> usize {
        self.inner.acked.load(Ordering::SeqCst)
    }

    pub fn requeued_count(&self) -> usize {
        self.inner.requeued.load(Ordering::SeqCst)
    }

    /// Messages discarded after a reject without requeue or a missing dead-letter target.
    pub fn dropped_count(&self) -> usize {
        self.inner.dropped.load(Ordering::SeqCst)
    }

    pub fn unroutable_count(&self) -> usize {
        self.inner.unroutable.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessageBroker for InMemoryBroker {
    async fn declare_exchange(&self, exchange: &ExchangeDeclaration) -> Result<(), BrokerError> {
        let mut state = self.inner.lock();
        match state.exchanges.get(&exchange.name) {
            Some(existing) if existing != exchange => Err(BrokerError::Declare {
                name: exchange.name.clone(),
                reason: "exchange exists with different arguments".to_string(),
            }),
            Some(_) => Ok(()),
            None => {
                state
                    .exchanges
                    .insert(exchange.name.clone(), exchange.clone());
                Ok(())
            }
        }
    }

    async fn declare_queue(&self, queue: &QueueDeclaration) -> Result<(), BrokerError> {
        let mut state = self.inner.lock();

        if let Some(binding) = &queue.binding {
            if !state.exchanges.contains_key(&binding.exchange) {
                return Err(BrokerError::UnknownExchange(binding.exchange.clone()));
            }
        }

        match state.queues.get(&queue.name) {
            Some(existing) if existing.declaration != *queue => {
                return Err(BrokerError::Declare {
                    name: queue.name.clone(),
                    reason: "queue exists with different arguments".to_string(),
                });
            }
            Some(_) => return Ok(()),
            None => {}
        }

        let (sender, receiver) = mpsc::unbounded_channel();
        state.queues.insert(
            queue.name.clone(),
            QueueSlot {
                declaration: queue.clone(),
                sender,
                receiver: Some(receiver),
                delayed: 0,
            },
        );
        if let Some(binding) = &queue.binding {
            state.bindings.push(Binding {
                exchange: binding.exchange.clone(),
                routing_key: binding.routing_key.clone(),
                queue: queue.name.clone(),
            });
        }
        Ok(())
    }

    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        payload: Vec<u8>,
    ) -> Result<(), BrokerError> {
        if !self.inner.lock().exchanges.contains_key(exchange) {
            return Err(BrokerError::UnknownExchange(exchange.to_string()));
        }
        self.inner.lock().published.push(PublishedMessage {
            exchange: exchange.to_string(),
            routing_key: routing_key.to_string(),
            payload: payload.clone(),
        });
        self.inner.route(exchange, routing_key, payload, false)?;
        Ok(())
    }

    async fn consume(
        &self,
        queue: &str,
        options: &ConsumeOptions,
    ) -> Result<DeliveryStream, BrokerError> {
        let receiver = {
            let mut state = self.inner.lock();
            let slot = state
                .queues
                .get_mut(queue)
                .ok_or_else(|| BrokerError::UnknownQueue(queue.to_string()))?;
            slot.receiver.take().ok_or_else(|| {
                BrokerError::Consume(format!("queue '{}' already has a consumer", queue))
            })?
        };

        let prefetch = Arc::new(Semaphore::new(usize::from(options.prefetch_count.max(1))));
        let seed = (receiver, prefetch, Arc::clone(&self.inner), queue.to_string());

        let deliveries = stream::unfold(seed, |(mut receiver, prefetch, inner, queue)| async move {
            let permit = Arc::clone(&prefetch).acquire_owned().await.ok()?;
            let message = receiver.recv().await?;
            let acker = InMemoryAcker {
                inner: Arc::clone(&inner),
                queue: queue.clone(),
                payload: message.payload.clone(),
                settled: AtomicBool::new(false),
                permit: Mutex::new(Some(permit)),
            };
            let delivery = Delivery::new(message.payload, message.redelivered, Box::new(acker));
            Some((Ok(delivery), (receiver, prefetch, inner, queue)))
        });

        Ok(deliveries.boxed())
    }
}

struct InMemoryAcker {
    inner: Arc<Inner>,
    queue: String,
    payload: Vec<u8>,
    settled: AtomicBool,
    permit: Mutex<Option<OwnedSemaphorePermit>>,
}

impl InMemoryAcker {
    fn settle(&self) -> Result<(), BrokerError> {
        if self.settled.swap(true, Ordering::SeqCst) {
            return Err(BrokerError::Acknowledge(
                "delivery already settled".to_string(),
            ));
        }
        self.permit
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        Ok(())
    }
}

#[async_trait]
impl DeliveryAcker for InMemoryAcker {
    async fn ack(&self) -> Result<(), BrokerError> {
        self.settle()?;
        self.inner.acked.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn reject(&self, requeue: bool) -> Result<(), BrokerError> {
        self.settle()?;
        if requeue {
            self.inner.requeue(&self.queue, self.payload.clone());
        } else {
            let target = self
                .inner
                .lock()
                .queues
                .get(&self.queue)
                .and_then(|slot| slot.declaration.dead_letter.clone());
            self.inner.dead_letter(target, self.payload.clone());
        }
        Ok(())
    }
}
