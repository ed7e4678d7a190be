//! Account notifications.
//!
//! [`AccountEventPublisher`] is best effort: a publish failure is logged and
//! counted, and the operation that triggered it still succeeds.

use crate::config::Topics;
use crate::model::Account;
use account_service_core::event::{Event, SerializedEvent};
use account_service_core::event_bus::EventBus;
use account_service_runtime::metrics::NotificationMetrics;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// An account was created. The payload is the account itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountCreated(pub Account);

/// An account was updated. The payload is the account itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountUpdated(pub Account);

impl Event for AccountCreated {
    fn event_type(&self) -> &'static str {
        "AccountCreated.v1"
    }

    fn partition_key(&self) -> Option<String> {
        Some(self.0.id.to_string())
    }
}

impl Event for AccountUpdated {
    fn event_type(&self) -> &'static str {
        "AccountUpdated.v1"
    }

    fn partition_key(&self) -> Option<String> {
        Some(self.0.id.to_string())
    }
}

/// Publishes account notifications keyed by account id.
#[derive(Clone)]
pub struct AccountEventPublisher {
    bus: Arc<dyn EventBus>,
    created_topic: String,
    updated_topic: String,
}

impl AccountEventPublisher {
    /// Create a publisher for the configured topics.
    #[must_use]
    pub fn new(bus: Arc<dyn EventBus>, topics: &Topics) -> Self {
        Self {
            bus,
            created_topic: topics.account_created.clone(),
            updated_topic: topics.account_updated.clone(),
        }
    }

    /// Announce a new account.
    pub async fn account_created(&self, account: &Account) {
        self.publish(&self.created_topic, &AccountCreated(account.clone()))
            .await;
    }

    /// Announce an updated account.
    pub async fn account_updated(&self, account: &Account) {
        self.publish(&self.updated_topic, &AccountUpdated(account.clone()))
            .await;
    }

    async fn publish<E: Event + Serialize>(&self, topic: &str, event: &E) {
        let serialized = match SerializedEvent::from_event(event) {
            Ok(serialized) => serialized,
            Err(e) => {
                NotificationMetrics::record_failure(topic);
                warn!(topic, error = %e, "Failed to encode account notification");
                return;
            }
        };

        let started = Instant::now();
        match self.bus.publish(topic, &serialized).await {
            Ok(()) => {
                NotificationMetrics::record_publish(topic, started.elapsed());
                debug!(topic, key = ?serialized.key, "Account notification published");
            }
            Err(e) => {
                NotificationMetrics::record_failure(topic);
                warn!(topic, key = ?serialized.key, error = %e, "Account notification not delivered");
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mocks::account;
    use crate::model::AccountType;
    use account_service_testing::InMemoryEventBus;

    #[tokio::test]
    async fn created_is_keyed_by_account_id() {
        let bus = InMemoryEventBus::new();
        let publisher = AccountEventPublisher::new(Arc::new(bus.clone()), &Topics::default());
        let acc = account("acc-1", "C-1", AccountType::Savings);

        publisher.account_created(&acc).await;

        let published = bus.published_to("account-created");
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].key.as_deref(), Some("acc-1"));
        assert_eq!(published[0].decode::<Account>().unwrap(), acc);
    }

    #[tokio::test]
    async fn payload_is_camel_case_account() {
        let bus = InMemoryEventBus::new();
        let publisher = AccountEventPublisher::new(Arc::new(bus.clone()), &Topics::default());

        publisher
            .account_updated(&account("acc-1", "C-1", AccountType::Checking))
            .await;

        let value: serde_json::Value = bus.published_to("account-updated")[0].decode().unwrap();
        assert_eq!(value["customerId"], "C-1");
        assert_eq!(value["accountType"], "CHECKING");
    }

    #[tokio::test]
    async fn bus_failure_is_swallowed() {
        let bus = InMemoryEventBus::new();
        bus.set_failing(true);
        let publisher = AccountEventPublisher::new(Arc::new(bus.clone()), &Topics::default());

        publisher
            .account_created(&account("acc-1", "C-1", AccountType::Savings))
            .await;

        assert_eq!(bus.publish_count(), 0);
    }
}
