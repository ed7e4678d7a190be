//! In-memory event bus for fast, deterministic tests.
//!
//! [`InMemoryEventBus`] records every publish so tests can assert on the
//! notifications a service emitted, can be switched into a failing mode to
//! exercise best-effort publishing, and fans events out to live subscribers so
//! consumers can be driven without a broker.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Lock poisoning only happens if a test already panicked

use account_service_core::event::SerializedEvent;
use account_service_core::event_bus::{EventBus, EventBusError, EventStream};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc;

#[derive(Debug)]
struct Subscriber {
    topics: Vec<String>,
    sender: mpsc::UnboundedSender<SerializedEvent>,
}

/// In-memory [`EventBus`] implementation.
///
/// Clones share the same recorded history and subscribers.
///
/// # Example
///
/// ```
/// use account_service_core::event::SerializedEvent;
/// use account_service_core::event_bus::EventBus;
/// use account_service_testing::InMemoryEventBus;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let bus = InMemoryEventBus::new();
/// let event = SerializedEvent::new("AccountCreated.v1".to_string(), None, b"{}".to_vec());
/// bus.publish("account-created", &event).await?;
///
/// assert_eq!(bus.published_to("account-created").len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryEventBus {
    published: Arc<RwLock<Vec<(String, SerializedEvent)>>>,
    subscribers: Arc<RwLock<Vec<Subscriber>>>,
    failing: Arc<AtomicBool>,
}

impl InMemoryEventBus {
    /// Create a new empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent publish fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// All successful publishes, in order, as `(topic, event)` pairs.
    #[must_use]
    pub fn published(&self) -> Vec<(String, SerializedEvent)> {
        self.published.read().unwrap().clone()
    }

    /// Events successfully published to `topic`, in order.
    #[must_use]
    pub fn published_to(&self, topic: &str) -> Vec<SerializedEvent> {
        self.published
            .read()
            .unwrap()
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, event)| event.clone())
            .collect()
    }

    /// Number of successful publishes across all topics.
    #[must_use]
    pub fn publish_count(&self) -> usize {
        self.published.read().unwrap().len()
    }

    /// Forget recorded publishes (subscribers stay attached).
    pub fn clear(&self) {
        self.published.write().unwrap().clear();
    }

    fn deliver(&self, topic: &str, event: &SerializedEvent) {
        let mut subscribers = self.subscribers.write().unwrap();
        subscribers.retain(|sub| !sub.sender.is_closed());
        for sub in subscribers.iter().filter(|sub| sub.topics.iter().any(|t| t == topic)) {
            let mut delivered = event.clone();
            delivered.event_type = topic.to_string();
            let _ = sub.sender.send(delivered);
        }
    }
}

impl EventBus for InMemoryEventBus {
    fn publish(
        &self,
        topic: &str,
        event: &SerializedEvent,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>> {
        let topic = topic.to_string();
        let event = event.clone();

        Box::pin(async move {
            if self.failing.load(Ordering::SeqCst) {
                return Err(EventBusError::PublishFailed {
                    topic,
                    reason: "in-memory bus set to fail".to_string(),
                });
            }

            self.deliver(&topic, &event);
            self.published.write().unwrap().push((topic, event));
            Ok(())
        })
    }

    fn subscribe(
        &self,
        topics: &[&str],
    ) -> Pin<Box<dyn Future<Output = Result<EventStream, EventBusError>> + Send + '_>> {
        let topics: Vec<String> = topics.iter().map(ToString::to_string).collect();

        Box::pin(async move {
            let (sender, mut receiver) = mpsc::unbounded_channel();
            self.subscribers
                .write()
                .unwrap()
                .push(Subscriber { topics, sender });

            let stream = async_stream::stream! {
                while let Some(event) = receiver.recv().await {
                    yield Ok(event);
                }
            };

            Ok(Box::pin(stream) as EventStream)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn event(key: &str) -> SerializedEvent {
        SerializedEvent::new("Test.v1".to_string(), Some(key.to_string()), b"{}".to_vec())
    }

    #[tokio::test]
    async fn records_publishes_per_topic() {
        let bus = InMemoryEventBus::new();

        bus.publish("a", &event("1")).await.unwrap();
        bus.publish("b", &event("2")).await.unwrap();
        bus.publish("a", &event("3")).await.unwrap();

        assert_eq!(bus.publish_count(), 3);
        let keys: Vec<_> = bus
            .published_to("a")
            .into_iter()
            .filter_map(|e| e.key)
            .collect();
        assert_eq!(keys, vec!["1".to_string(), "3".to_string()]);
    }

    #[tokio::test]
    async fn failing_bus_rejects_and_records_nothing() {
        let bus = InMemoryEventBus::new();
        bus.set_failing(true);

        let result = bus.publish("a", &event("1")).await;

        assert!(matches!(result, Err(EventBusError::PublishFailed { .. })));
        assert_eq!(bus.publish_count(), 0);

        bus.set_failing(false);
        assert!(bus.publish("a", &event("1")).await.is_ok());
    }

    #[tokio::test]
    async fn subscribers_receive_only_their_topics() {
        let bus = InMemoryEventBus::new();
        let mut stream = bus.subscribe(&["wanted"]).await.unwrap();

        bus.publish("other", &event("x")).await.unwrap();
        bus.publish("wanted", &event("y")).await.unwrap();

        let received = stream.next().await.unwrap().unwrap();
        assert_eq!(received.event_type, "wanted");
        assert_eq!(received.key.as_deref(), Some("y"));
    }

    #[tokio::test]
    async fn dropped_subscribers_are_pruned() {
        let bus = InMemoryEventBus::new();
        let stream = bus.subscribe(&["t"]).await.unwrap();
        drop(stream);

        bus.publish("t", &event("1")).await.unwrap();

        assert!(bus.subscribers.read().unwrap().is_empty());
    }
}
