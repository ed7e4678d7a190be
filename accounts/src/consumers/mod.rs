//! Inbound bus consumers.
//!
//! | topic                               | handler                        |
//! |-------------------------------------|--------------------------------|
//! | `customer-created`                  | [`CustomerEventConsumer`]      |
//! | `bootcoin.bank.account.association` | [`WalletAssociationConsumer`]  |
//! | `yanki.card.link.requested`         | [`CardLinkConsumer`]           |
//!
//! [`run_consumers`] drives a subscribed stream until it ends or shutdown is
//! signalled. A failing message is logged and skipped.

pub mod card_link;
pub mod customer_events;
pub mod wallet_association;

pub use card_link::{CardLinkConfirmed, CardLinkConsumer, CardLinkRejected, CardLinkRequested};
pub use customer_events::CustomerEventConsumer;
pub use wallet_association::{
    WalletAssociationConsumer, WalletAssociationRequest, WalletAssociationResponse,
};

use crate::config::Topics;
use crate::error::{AccountError, CacheError};
use account_service_core::event::{EventError, SerializedEvent};
use account_service_core::event_bus::{EventBus, EventBusError, EventStream};
use account_service_runtime::metrics::ConsumerMetrics;
use futures::StreamExt;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Failure while handling one inbound message.
#[derive(Debug, Error)]
pub enum ConsumerError {
    /// The payload could not be decoded.
    #[error("Malformed message: {0}")]
    Decode(#[from] EventError),

    /// A referenced record does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The message came from a topic nobody handles.
    #[error("No handler for topic {0}")]
    UnknownTopic(String),

    /// A domain operation failed.
    #[error(transparent)]
    Account(#[from] AccountError),

    /// The customer cache failed.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// A reply could not be published.
    #[error(transparent)]
    Bus(#[from] EventBusError),
}

/// All inbound handlers, routed by topic.
#[derive(Clone)]
pub struct AccountConsumers {
    customer_events: CustomerEventConsumer,
    wallet_association: WalletAssociationConsumer,
    card_link: CardLinkConsumer,
    topics: Topics,
}

impl AccountConsumers {
    /// Bundle the handlers.
    #[must_use]
    pub const fn new(
        customer_events: CustomerEventConsumer,
        wallet_association: WalletAssociationConsumer,
        card_link: CardLinkConsumer,
        topics: Topics,
    ) -> Self {
        Self {
            customer_events,
            wallet_association,
            card_link,
            topics,
        }
    }

    /// Topics to subscribe to.
    #[must_use]
    pub fn inbound_topics(&self) -> [&str; 3] {
        [
            self.topics.customer_created.as_str(),
            self.topics.wallet_association_requested.as_str(),
            self.topics.card_link_requested.as_str(),
        ]
    }

    /// Route one message to its handler. `event_type` carries the topic.
    ///
    /// # Errors
    ///
    /// Returns the handler's error, or `UnknownTopic`.
    pub async fn dispatch(&self, event: &SerializedEvent) -> Result<(), ConsumerError> {
        let topic = event.event_type.as_str();
        if topic == self.topics.customer_created {
            self.customer_events.handle(event).await
        } else if topic == self.topics.wallet_association_requested {
            self.wallet_association.handle(event).await
        } else if topic == self.topics.card_link_requested {
            self.card_link.handle(event).await
        } else {
            Err(ConsumerError::UnknownTopic(topic.to_string()))
        }
    }

    /// Subscribe on `bus` and process messages until shutdown.
    ///
    /// # Errors
    ///
    /// Returns `ConsumerError::Bus` if the subscription fails.
    pub async fn run(
        &self,
        bus: &dyn EventBus,
        shutdown: watch::Receiver<bool>,
    ) -> Result<(), ConsumerError> {
        let stream = bus.subscribe(&self.inbound_topics()).await?;
        run_consumers(self, stream, shutdown).await;
        Ok(())
    }
}

/// Process `stream` until it ends or `shutdown` turns `true`.
pub async fn run_consumers(
    consumers: &AccountConsumers,
    mut stream: EventStream,
    mut shutdown: watch::Receiver<bool>,
) {
    info!(topics = ?consumers.inbound_topics(), "Consumers started");

    while !*shutdown.borrow() {
        tokio::select! {
            next = stream.next() => {
                match next {
                    Some(Ok(event)) => {
                        let topic = event.event_type.clone();
                        match consumers.dispatch(&event).await {
                            Ok(()) => ConsumerMetrics::record_consumed(&topic),
                            Err(e) => {
                                ConsumerMetrics::record_rejected(&topic);
                                error!(topic = %topic, key = ?event.key, error = %e, "Failed to handle message");
                            }
                        }
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "Error receiving message from bus");
                    }
                    None => {
                        info!("Bus stream ended");
                        break;
                    }
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }
    }
}

/// Encode `payload` as JSON and publish it on `topic`.
async fn reply<T: Serialize>(
    bus: &dyn EventBus,
    topic: &str,
    key: &str,
    payload: &T,
) -> Result<(), ConsumerError> {
    let data = serde_json::to_vec(payload)
        .map_err(|e| EventError::SerializationError(e.to_string()))?;
    let event = SerializedEvent::new(topic.to_string(), Some(key.to_string()), data);
    bus.publish(topic, &event).await?;
    Ok(())
}
