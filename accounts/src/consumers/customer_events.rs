//! Customer registrations: populate the directory cache.

use super::ConsumerError;
use crate::model::Customer;
use crate::providers::CustomerCache;
use account_service_core::event::SerializedEvent;
use std::sync::Arc;
use tracing::info;

/// Writes announced customers into the cache.
#[derive(Clone)]
pub struct CustomerEventConsumer {
    cache: Arc<dyn CustomerCache>,
}

impl CustomerEventConsumer {
    /// Create the consumer.
    #[must_use]
    pub fn new(cache: Arc<dyn CustomerCache>) -> Self {
        Self { cache }
    }

    /// Cache the customer carried by `event`.
    ///
    /// # Errors
    ///
    /// - `ConsumerError::Decode` if the payload is not a customer
    /// - `ConsumerError::Cache` if the write fails
    pub async fn handle(&self, event: &SerializedEvent) -> Result<(), ConsumerError> {
        let customer: Customer = event.decode()?;
        self.cache.put(&customer.id, &customer).await?;
        info!(customer_id = %customer.id, "Customer cached");
        Ok(())
    }
}
