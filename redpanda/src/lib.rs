//! Redpanda event bus for the account service.
//!
//! Implements the [`EventBus`] trait from `account-service-core` on top of
//! rdkafka, so it works with Redpanda or any Kafka-compatible broker.
//!
//! # Wire format
//!
//! Other services on the bus are not Rust services, so messages carry the
//! event's JSON bytes as-is:
//!
//! - **payload**: `SerializedEvent::data`
//! - **key**: `SerializedEvent::key` (e.g. the account id), falling back to the
//!   event type when the event has no key
//! - **header** `event-type`: `SerializedEvent::event_type`
//!
//! On the consume side, the yielded event's `event_type` is the topic the
//! message came from and `metadata` holds `{partition, offset}`.
//!
//! # Delivery Semantics
//!
//! **At-least-once delivery** with manual offset commits:
//! - Offsets are committed AFTER the message reaches the subscriber's channel
//! - If the process crashes before commit, messages are redelivered
//! - Handlers must be idempotent
//! - Ordering is guaranteed within a partition (same key)
//!
//! # Example
//!
//! ```no_run
//! use account_service_redpanda::RedpandaEventBus;
//! use account_service_core::event_bus::EventBus;
//! use account_service_core::event::SerializedEvent;
//! use futures::StreamExt;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let event_bus = RedpandaEventBus::builder()
//!     .brokers("localhost:9092")
//!     .consumer_group("account-service")
//!     .build()?;
//!
//! let event = SerializedEvent::new(
//!     "AccountCreated.v1".to_string(),
//!     Some("acc-1".to_string()),
//!     br#"{"id":"acc-1"}"#.to_vec(),
//! );
//! event_bus.publish("account-created", &event).await?;
//!
//! let mut stream = event_bus.subscribe(&["customer-created"]).await?;
//! while let Some(result) = stream.next().await {
//!     match result {
//!         Ok(event) => println!("Received from {}", event.event_type),
//!         Err(e) => eprintln!("Error: {e}"),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use account_service_core::event::SerializedEvent;
use account_service_core::event_bus::{EventBus, EventBusError, EventStream};
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::{Header, Message, OwnedHeaders};
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Header carrying the producer-side event type.
pub const EVENT_TYPE_HEADER: &str = "event-type";

const DEFAULT_BUFFER_SIZE: usize = 1000;
const DEFAULT_OFFSET_RESET: &str = "earliest";

/// Redpanda event bus implementation.
///
/// # Configuration
///
/// - **Broker addresses**: Bootstrap servers (required)
/// - **Producer settings**: acks, compression, send timeout
/// - **Consumer group**: Explicit ID or derived from the subscribed topics
/// - **Buffer size**: Messages buffered per subscription (default: 1000)
/// - **Offset reset**: Where new groups start reading (default: "earliest")
///
/// # Example
///
/// ```no_run
/// use account_service_redpanda::RedpandaEventBus;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let event_bus = RedpandaEventBus::builder()
///     .brokers("localhost:9092,localhost:9093")
///     .producer_acks("all")
///     .compression("lz4")
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct RedpandaEventBus {
    producer: FutureProducer,
    brokers: String,
    timeout: Duration,
    consumer_group: Option<String>,
    buffer_size: usize,
    auto_offset_reset: String,
}

impl RedpandaEventBus {
    /// Create a new builder for configuring the event bus.
    #[must_use]
    pub fn builder() -> RedpandaEventBusBuilder {
        RedpandaEventBusBuilder::default()
    }

    fn group_for(&self, topics: &[String]) -> String {
        self.consumer_group.clone().unwrap_or_else(|| {
            let mut sorted = topics.to_vec();
            sorted.sort();
            format!("account-service-{}", sorted.join("-"))
        })
    }
}

/// Builder for configuring a [`RedpandaEventBus`].
#[derive(Default)]
pub struct RedpandaEventBusBuilder {
    brokers: Option<String>,
    producer_acks: Option<String>,
    compression: Option<String>,
    timeout: Option<Duration>,
    consumer_group: Option<String>,
    buffer_size: Option<usize>,
    auto_offset_reset: Option<String>,
}

impl RedpandaEventBusBuilder {
    /// Set the broker addresses (comma-separated, e.g. "localhost:9092").
    #[must_use]
    pub fn brokers(mut self, brokers: impl Into<String>) -> Self {
        self.brokers = Some(brokers.into());
        self
    }

    /// Set the producer acknowledgment mode: "0", "1" (default) or "all".
    #[must_use]
    pub fn producer_acks(mut self, acks: impl Into<String>) -> Self {
        self.producer_acks = Some(acks.into());
        self
    }

    /// Set the compression codec: "none" (default), "gzip", "snappy", "lz4", "zstd".
    #[must_use]
    pub fn compression(mut self, compression: impl Into<String>) -> Self {
        self.compression = Some(compression.into());
        self
    }

    /// Set the producer send timeout.
    ///
    /// Default: 5 seconds
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the consumer group ID for subscriptions.
    ///
    /// Instances sharing a group split the partitions between them. Without
    /// one, a group name is derived from the subscribed topics.
    #[must_use]
    pub fn consumer_group(mut self, consumer_group: impl Into<String>) -> Self {
        self.consumer_group = Some(consumer_group.into());
        self
    }

    /// Set how many messages may wait between the consumer and the subscriber.
    ///
    /// Values below 1 are treated as 1.
    #[must_use]
    pub fn buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = Some(buffer_size.max(1));
        self
    }

    /// Set where new consumer groups start reading: "earliest" (default),
    /// "latest" or "error".
    #[must_use]
    pub fn auto_offset_reset(mut self, policy: impl Into<String>) -> Self {
        self.auto_offset_reset = Some(policy.into());
        self
    }

    /// Build the [`RedpandaEventBus`].
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::ConnectionFailed`] if brokers are not set or
    /// the producer cannot be created.
    pub fn build(self) -> Result<RedpandaEventBus, EventBusError> {
        let brokers = self
            .brokers
            .ok_or_else(|| EventBusError::ConnectionFailed("Brokers not configured".to_string()))?;
        let acks = self.producer_acks.unwrap_or_else(|| "1".to_string());
        let compression = self.compression.unwrap_or_else(|| "none".to_string());
        let timeout = self.timeout.unwrap_or(Duration::from_secs(5));

        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &brokers)
            .set("message.timeout.ms", timeout.as_millis().to_string())
            .set("acks", &acks)
            .set("compression.type", &compression)
            .create()
            .map_err(|e| EventBusError::ConnectionFailed(format!("Failed to create producer: {e}")))?;

        let bus = RedpandaEventBus {
            producer,
            brokers,
            timeout,
            consumer_group: self.consumer_group,
            buffer_size: self.buffer_size.unwrap_or(DEFAULT_BUFFER_SIZE),
            auto_offset_reset: self
                .auto_offset_reset
                .unwrap_or_else(|| DEFAULT_OFFSET_RESET.to_string()),
        };

        tracing::info!(
            brokers = %bus.brokers,
            acks = %acks,
            compression = %compression,
            buffer_size = bus.buffer_size,
            auto_offset_reset = %bus.auto_offset_reset,
            "RedpandaEventBus created"
        );

        Ok(bus)
    }
}

/// Message key for an outgoing event.
fn message_key(event: &SerializedEvent) -> &str {
    event.key.as_deref().unwrap_or(&event.event_type)
}

/// Convert a consumed message into a [`SerializedEvent`].
fn to_event<M: Message>(message: &M) -> Result<SerializedEvent, EventBusError> {
    let payload = message.payload().ok_or_else(|| {
        EventBusError::DeserializationFailed(format!(
            "Message on '{}' has no payload",
            message.topic()
        ))
    })?;
    let key = message
        .key()
        .map(|k| String::from_utf8_lossy(k).into_owned());

    Ok(SerializedEvent::new(message.topic().to_string(), key, payload.to_vec()).with_metadata(
        serde_json::json!({
            "partition": message.partition(),
            "offset": message.offset(),
        }),
    ))
}

impl EventBus for RedpandaEventBus {
    fn publish(
        &self,
        topic: &str,
        event: &SerializedEvent,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>> {
        let topic = topic.to_string();
        let event = event.clone();

        Box::pin(async move {
            let headers = OwnedHeaders::new().insert(Header {
                key: EVENT_TYPE_HEADER,
                value: Some(event.event_type.as_str()),
            });
            let record = FutureRecord::to(&topic)
                .payload(&event.data)
                .key(message_key(&event))
                .headers(headers);

            match self.producer.send(record, Timeout::After(self.timeout)).await {
                Ok((partition, offset)) => {
                    tracing::debug!(
                        topic = %topic,
                        partition,
                        offset,
                        key = message_key(&event),
                        event_type = %event.event_type,
                        "Event published"
                    );
                    Ok(())
                }
                Err((kafka_error, _)) => {
                    tracing::error!(topic = %topic, error = %kafka_error, "Failed to publish event");
                    Err(EventBusError::PublishFailed {
                        topic,
                        reason: kafka_error.to_string(),
                    })
                }
            }
        })
    }

    fn subscribe(
        &self,
        topics: &[&str],
    ) -> Pin<Box<dyn Future<Output = Result<EventStream, EventBusError>> + Send + '_>> {
        let topics: Vec<String> = topics.iter().map(|s| (*s).to_string()).collect();

        Box::pin(async move {
            let group_id = self.group_for(&topics);
            let subscription_error = |reason: String| EventBusError::SubscriptionFailed {
                topics: topics.clone(),
                reason,
            };

            let consumer: StreamConsumer = ClientConfig::new()
                .set("bootstrap.servers", &self.brokers)
                .set("group.id", &group_id)
                .set("enable.auto.commit", "false")
                .set("auto.offset.reset", &self.auto_offset_reset)
                .set("session.timeout.ms", "6000")
                .set("enable.partition.eof", "false")
                .create()
                .map_err(|e| subscription_error(format!("Failed to create consumer: {e}")))?;

            let topic_refs: Vec<&str> = topics.iter().map(String::as_str).collect();
            consumer
                .subscribe(&topic_refs)
                .map_err(|e| subscription_error(format!("Failed to subscribe: {e}")))?;

            tracing::info!(
                topics = ?topics,
                consumer_group = %group_id,
                buffer_size = self.buffer_size,
                "Subscribed to topics"
            );

            let (tx, mut rx) = tokio::sync::mpsc::channel(self.buffer_size);

            tokio::spawn(async move {
                use futures::StreamExt;
                use rdkafka::consumer::CommitMode;

                let mut stream = consumer.stream();

                while let Some(received) = stream.next().await {
                    let message = match received {
                        Ok(message) => message,
                        Err(e) => {
                            let err = EventBusError::TransportError(format!(
                                "Failed to receive message: {e}"
                            ));
                            if tx.send(Err(err)).await.is_err() {
                                break;
                            }
                            continue;
                        }
                    };

                    let event = to_event(&message);
                    if let Ok(event) = &event {
                        tracing::trace!(
                            topic = %event.event_type,
                            partition = message.partition(),
                            offset = message.offset(),
                            "Received event"
                        );
                    }

                    // Commit only once the subscriber's channel has accepted the message.
                    if tx.send(event).await.is_err() {
                        tracing::debug!("Subscriber dropped, stopping consumer task");
                        break;
                    }

                    if let Err(e) = consumer.commit_message(&message, CommitMode::Async) {
                        tracing::warn!(
                            topic = message.topic(),
                            partition = message.partition(),
                            offset = message.offset(),
                            error = %e,
                            "Failed to commit offset (message may be redelivered)"
                        );
                    }
                }

                tracing::debug!("Consumer task exiting");
            });

            let stream = async_stream::stream! {
                while let Some(result) = rx.recv().await {
                    yield result;
                }
            };

            Ok(Box::pin(stream) as EventStream)
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Tests can use unwrap

    use super::*;
    use rdkafka::message::{OwnedMessage, Timestamp};

    #[test]
    fn redpanda_event_bus_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<RedpandaEventBus>();
        assert_sync::<RedpandaEventBus>();
    }

    #[test]
    fn build_without_brokers_fails() {
        let result = RedpandaEventBus::builder().build();
        assert!(matches!(result, Err(EventBusError::ConnectionFailed(_))));
    }

    #[test]
    fn message_key_prefers_event_key() {
        let keyed = SerializedEvent::new("T.v1".to_string(), Some("acc-1".to_string()), vec![]);
        let unkeyed = SerializedEvent::new("T.v1".to_string(), None, vec![]);

        assert_eq!(message_key(&keyed), "acc-1");
        assert_eq!(message_key(&unkeyed), "T.v1");
    }

    #[test]
    fn consumed_message_carries_topic_key_and_raw_payload() {
        let message = OwnedMessage::new(
            Some(br#"{"id":"C-1"}"#.to_vec()),
            Some(b"C-1".to_vec()),
            "customer-created".to_string(),
            Timestamp::NotAvailable,
            2,
            41,
            None,
        );

        let event = to_event(&message).unwrap();

        assert_eq!(event.event_type, "customer-created");
        assert_eq!(event.key.as_deref(), Some("C-1"));
        assert_eq!(event.data, br#"{"id":"C-1"}"#.to_vec());
        assert_eq!(event.metadata.unwrap()["offset"], 41);
    }

    #[test]
    fn consumed_message_without_payload_is_an_error() {
        let message = OwnedMessage::new(
            None,
            None,
            "customer-created".to_string(),
            Timestamp::NotAvailable,
            0,
            0,
            None,
        );

        assert!(matches!(
            to_event(&message),
            Err(EventBusError::DeserializationFailed(_))
        ));
    }
}
