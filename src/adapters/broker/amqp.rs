//! RabbitMQ adapter over `lapin`.
//!
//! Publishing uses a dedicated channel in confirm mode: `publish` returns
//! only once the broker has acked the message. Each consumer gets its own
//! channel so its prefetch limit does not affect publishing.

use async_trait::async_trait;
use futures::StreamExt;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicPublishOptions, BasicQosOptions,
    BasicRejectOptions, ConfirmSelectOptions, ExchangeDeclareOptions, QueueBindOptions,
    QueueDeclareOptions,
};
use lapin::types::{AMQPValue, FieldTable, LongString, ShortString};
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties};

use crate::ports::{
    BrokerError, ConsumeOptions, Delivery, DeliveryAcker, DeliveryStream, ExchangeDeclaration,
    ExchangeKind, MessageBroker, QueueDeclaration,
};

const PERSISTENT: u8 = 2;

/// Message broker backed by an AMQP 0-9-1 connection.
pub struct AmqpBroker {
    connection: Connection,
    publisher: Channel,
}

impl AmqpBroker {
    /// Opens the connection and the publishing channel.
    pub async fn connect(url: &str, connection_name: &str) -> Result<Self, BrokerError> {
        let properties = ConnectionProperties::default()
            .with_connection_name(LongString::from(connection_name.to_string()));

        let connection = Connection::connect(url, properties)
            .await
            .map_err(|e| BrokerError::Connection(e.to_string()))?;

        let publisher = connection
            .create_channel()
            .await
            .map_err(|e| BrokerError::Connection(e.to_string()))?;
        publisher
            .confirm_select(ConfirmSelectOptions::default())
            .await
            .map_err(|e| BrokerError::Connection(e.to_string()))?;

        tracing::info!(connection_name, "Connected to AMQP broker");
        Ok(Self {
            connection,
            publisher,
        })
    }

    /// Closes the connection with a normal reply code.
    pub async fn close(&self) -> Result<(), BrokerError> {
        self.connection
            .close(200, "shutdown")
            .await
            .map_err(|e| BrokerError::Connection(e.to_string()))
    }
}

fn exchange_kind(kind: ExchangeKind) -> lapin::ExchangeKind {
    match kind {
        ExchangeKind::Direct => lapin::ExchangeKind::Direct,
    }
}

/// Translates TTL and dead-letter settings into queue arguments.
fn queue_arguments(queue: &QueueDeclaration) -> FieldTable {
    let mut args = FieldTable::default();
    if let Some(ttl) = queue.message_ttl {
        let millis = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        args.insert(
            ShortString::from("x-message-ttl"),
            AMQPValue::LongLongInt(millis),
        );
    }
    if let Some(dead_letter) = &queue.dead_letter {
        args.insert(
            ShortString::from("x-dead-letter-exchange"),
            AMQPValue::LongString(LongString::from(dead_letter.exchange.clone())),
        );
        args.insert(
            ShortString::from("x-dead-letter-routing-key"),
            AMQPValue::LongString(LongString::from(dead_letter.routing_key.clone())),
        );
    }
    args
}

#[async_trait]
impl MessageBroker for AmqpBroker {
    async fn declare_exchange(&self, exchange: &ExchangeDeclaration) -> Result<(), BrokerError> {
        let options = ExchangeDeclareOptions {
            durable: exchange.durable,
            ..ExchangeDeclareOptions::default()
        };
        self.publisher
            .exchange_declare(
                &exchange.name,
                exchange_kind(exchange.kind),
                options,
                FieldTable::default(),
            )
            .await
            .map_err(|e| BrokerError::Declare {
                name: exchange.name.clone(),
                reason: e.to_string(),
            })
    }

    async fn declare_queue(&self, queue: &QueueDeclaration) -> Result<(), BrokerError> {
        let declare_error = |e: lapin::Error| BrokerError::Declare {
            name: queue.name.clone(),
            reason: e.to_string(),
        };

        let options = QueueDeclareOptions {
            durable: queue.durable,
            ..QueueDeclareOptions::default()
        };
        self.publisher
            .queue_declare(&queue.name, options, queue_arguments(queue))
            .await
            .map_err(declare_error)?;

        if let Some(binding) = &queue.binding {
            self.publisher
                .queue_bind(
                    &queue.name,
                    &binding.exchange,
                    &binding.routing_key,
                    QueueBindOptions::default(),
                    FieldTable::default(),
                )
                .await
                .map_err(declare_error)?;
        }
        Ok(())
    }

    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        payload: Vec<u8>,
    ) -> Result<(), BrokerError> {
        let properties = BasicProperties::default()
            .with_content_type(ShortString::from("application/json"))
            .with_delivery_mode(PERSISTENT);

        let confirmation = self
            .publisher
            .basic_publish(
                exchange,
                routing_key,
                BasicPublishOptions::default(),
                &payload,
                properties,
            )
            .await
            .map_err(|e| BrokerError::Publish(e.to_string()))?
            .await
            .map_err(|e| BrokerError::Publish(e.to_string()))?;

        if confirmation.is_nack() {
            return Err(BrokerError::Publish(format!(
                "broker nacked message for {}/{}",
                exchange, routing_key
            )));
        }
        Ok(())
    }

    async fn consume(
        &self,
        queue: &str,
        options: &ConsumeOptions,
    ) -> Result<DeliveryStream, BrokerError> {
        let channel = self
            .connection
            .create_channel()
            .await
            .map_err(|e| BrokerError::Consume(e.to_string()))?;
        channel
            .basic_qos(options.prefetch_count, BasicQosOptions::default())
            .await
            .map_err(|e| BrokerError::Consume(e.to_string()))?;

        let consumer = channel
            .basic_consume(
                queue,
                &options.consumer_tag,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|e| BrokerError::Consume(e.to_string()))?;

        tracing::info!(queue, consumer_tag = %options.consumer_tag, "Consuming");

        // The consumer channel must outlive the stream.
        let deliveries = consumer.map(move |item| {
            let _channel = &channel;
            item.map(|delivery| {
                Delivery::new(
                    delivery.data,
                    delivery.redelivered,
                    Box::new(AmqpAcker(delivery.acker)),
                )
            })
            .map_err(|e| BrokerError::Consume(e.to_string()))
        });

        Ok(deliveries.boxed())
    }
}

struct AmqpAcker(lapin::acker::Acker);

#[async_trait]
impl DeliveryAcker for AmqpAcker {
    async fn ack(&self) -> Result<(), BrokerError> {
        self.0
            .ack(BasicAckOptions::default())
            .await
            .map(|_| ())
            .map_err(|e| BrokerError::Acknowledge(e.to_string()))
    }

    async fn reject(&self, requeue: bool) -> Result<(), BrokerError> {
        self.0
            .reject(BasicRejectOptions { requeue })
            .await
            .map(|_| ())
            .map_err(|e| BrokerError::Acknowledge(e.to_string()))
    }
}
