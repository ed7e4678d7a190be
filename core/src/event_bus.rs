//! Event bus abstraction for notifications between services.
//!
//! The account service publishes "account created" / "account updated"
//! notifications and consumes customer and wallet events from other services.
//! Both directions go through the [`EventBus`] trait.
//!
//! # Delivery
//!
//! - **Publishing is best-effort** from the caller's point of view: a failed
//!   publish is reported, and the caller decides whether it matters.
//! - **Consumption is at-least-once**: handlers must tolerate duplicates.
//! - **Ordered within partition**: events sharing a key keep their order.
//!
//! # Implementations
//!
//! - `InMemoryEventBus` (testing crate) - records publishes, fans out to subscribers
//! - `RedpandaEventBus` (redpanda crate) - Kafka-compatible production bus

use crate::event::SerializedEvent;
use futures::Stream;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors that can occur during event bus operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventBusError {
    /// Failed to connect to the event bus
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Failed to publish an event to a topic
    #[error("Publish failed for topic '{topic}': {reason}")]
    PublishFailed {
        /// The topic that failed
        topic: String,
        /// The reason for failure
        reason: String,
    },

    /// Failed to subscribe to topics
    #[error("Subscription failed for topics {topics:?}: {reason}")]
    SubscriptionFailed {
        /// The topics that failed to subscribe
        topics: Vec<String>,
        /// The reason for failure
        reason: String,
    },

    /// Failed to deserialize an event
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    /// Network or transport error
    #[error("Transport error: {0}")]
    TransportError(String),
}

/// Stream of events from subscriptions.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<SerializedEvent, EventBusError>> + Send>>;

/// Trait for event bus implementations.
///
/// # Dyn Compatibility
///
/// This trait uses explicit `Pin<Box<dyn Future>>` returns instead of `async fn`
/// so services can hold an `Arc<dyn EventBus>`.
pub trait EventBus: Send + Sync {
    /// Publish an event to a topic.
    ///
    /// The event's `key` (when present) selects the partition.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::PublishFailed`] if the publish operation fails.
    fn publish(
        &self,
        topic: &str,
        event: &SerializedEvent,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>>;

    /// Subscribe to one or more topics and receive a stream of events.
    ///
    /// Each yielded event has `event_type` set to the topic it was read from.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::SubscriptionFailed`] if subscription fails.
    fn subscribe(
        &self,
        topics: &[&str],
    ) -> Pin<Box<dyn Future<Output = Result<EventStream, EventBusError>> + Send + '_>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_failed_names_topic() {
        let err = EventBusError::PublishFailed {
            topic: "account-created".to_string(),
            reason: "broker down".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Publish failed for topic 'account-created': broker down"
        );
    }

    #[test]
    fn event_bus_is_object_safe() {
        fn takes_dyn(_bus: Option<&dyn EventBus>) {}
        takes_dyn(None);
    }
}
