//! Event trait and the wire envelope used on the message bus.
//!
//! Events represent facts about things that have already happened (an account
//! was created, a card link was confirmed). They are published to the bus for
//! other services, most of which are not written in Rust, so payloads are
//! encoded as JSON.
//!
//! # Example
//!
//! ```
//! use account_service_core::event::Event;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Clone, Debug, Serialize, Deserialize)]
//! struct AccountOpened { account_id: String }
//!
//! impl Event for AccountOpened {
//!     fn event_type(&self) -> &'static str {
//!         "AccountOpened.v1"
//!     }
//!
//!     fn partition_key(&self) -> Option<String> {
//!         Some(self.account_id.clone())
//!     }
//! }
//! ```

use serde::{Serialize, de::DeserializeOwned};
use std::fmt;
use thiserror::Error;

/// Error types for event operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventError {
    /// Failed to serialize event to bytes.
    #[error("Failed to serialize event: {0}")]
    SerializationError(String),

    /// Failed to deserialize event from bytes.
    #[error("Failed to deserialize event: {0}")]
    DeserializationError(String),
}

/// An event that can be published on the bus.
///
/// # Event Naming Convention
///
/// `event_type()` returns a stable identifier, preferably with a version
/// suffix (`"AccountCreated.v1"`), so consumers can route and evolve schemas.
///
/// # Partitioning
///
/// `partition_key()` selects the bus partition. Events sharing a key keep
/// their relative order. Entity events use the entity id.
pub trait Event: Send + Sync + 'static {
    /// Returns the event type identifier for this event.
    fn event_type(&self) -> &'static str;

    /// Returns the key used to partition this event, if any.
    fn partition_key(&self) -> Option<String> {
        None
    }

    /// Serialize this event to JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns `EventError::SerializationError` if the event cannot be serialized.
    fn to_bytes(&self) -> Result<Vec<u8>, EventError>
    where
        Self: Serialize,
    {
        serde_json::to_vec(self).map_err(|e| EventError::SerializationError(e.to_string()))
    }
}

/// A serialized event ready for the bus.
///
/// On the publish side `event_type` names the event. On the consume side it
/// carries the topic the message was read from, because foreign producers do
/// not send our type names.
#[derive(Clone, Debug, PartialEq)]
pub struct SerializedEvent {
    /// The event type identifier (e.g., "AccountCreated.v1") or source topic.
    pub event_type: String,

    /// Partition key (e.g., the account id).
    pub key: Option<String>,

    /// The JSON-encoded event data.
    pub data: Vec<u8>,

    /// Optional metadata (correlation ids and the like).
    pub metadata: Option<serde_json::Value>,
}

impl SerializedEvent {
    /// Create a new serialized event.
    ///
    /// # Examples
    ///
    /// ```
    /// use account_service_core::event::SerializedEvent;
    ///
    /// let event = SerializedEvent::new(
    ///     "customer-created".to_string(),
    ///     Some("C-1".to_string()),
    ///     br#"{"id":"C-1"}"#.to_vec(),
    /// );
    /// assert_eq!(event.key.as_deref(), Some("C-1"));
    /// ```
    #[must_use]
    pub const fn new(event_type: String, key: Option<String>, data: Vec<u8>) -> Self {
        Self {
            event_type,
            key,
            data,
            metadata: None,
        }
    }

    /// Attach metadata to this event.
    #[must_use]
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Create a serialized event from an `Event`.
    ///
    /// # Errors
    ///
    /// Returns `EventError::SerializationError` if the event cannot be serialized.
    pub fn from_event<E: Event + Serialize>(event: &E) -> Result<Self, EventError> {
        Ok(Self {
            event_type: event.event_type().to_string(),
            key: event.partition_key(),
            data: event.to_bytes()?,
            metadata: None,
        })
    }

    /// Decode the payload as `T`.
    ///
    /// # Errors
    ///
    /// Returns `EventError::DeserializationError` if the payload is not valid JSON for `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, EventError> {
        serde_json::from_slice(&self.data)
            .map_err(|e| EventError::DeserializationError(e.to_string()))
    }
}

impl fmt::Display for SerializedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SerializedEvent {{ type: {}, key: {}, size: {} bytes }}",
            self.event_type,
            self.key.as_deref().unwrap_or("-"),
            self.data.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    struct BalanceChanged {
        account_id: String,
        new_balance: i64,
    }

    impl Event for BalanceChanged {
        fn event_type(&self) -> &'static str {
            "BalanceChanged.v1"
        }

        fn partition_key(&self) -> Option<String> {
            Some(self.account_id.clone())
        }
    }

    #[test]
    #[allow(clippy::expect_used)] // Panics: Test will fail if serialization fails
    fn serialized_event_from_event_carries_key_and_json() {
        let event = BalanceChanged {
            account_id: "acc-1".to_string(),
            new_balance: 250,
        };

        let serialized = SerializedEvent::from_event(&event).expect("serialization should succeed");

        assert_eq!(serialized.event_type, "BalanceChanged.v1");
        assert_eq!(serialized.key.as_deref(), Some("acc-1"));
        let json: serde_json::Value =
            serde_json::from_slice(&serialized.data).expect("payload should be JSON");
        assert_eq!(json["accountId"], "acc-1");

        let decoded: BalanceChanged = serialized.decode().expect("decode should succeed");
        assert_eq!(decoded, event);
    }

    #[test]
    fn decode_rejects_foreign_payload() {
        let serialized = SerializedEvent::new("x".to_string(), None, b"not json".to_vec());
        let result: Result<BalanceChanged, _> = serialized.decode();
        assert!(matches!(result, Err(EventError::DeserializationError(_))));
    }

    #[test]
    fn serialized_event_display() {
        let serialized = SerializedEvent::new("TestEvent.v1".to_string(), None, vec![1, 2, 3, 4, 5]);

        let display = format!("{serialized}");
        assert!(display.contains("TestEvent.v1"));
        assert!(display.contains("5 bytes"));
    }
}
