//! Customer resolution.
//!
//! [`CustomerGateway`] is the breaker-guarded customer service.
//! [`CustomerResolver`] puts the directory cache in front of it.

use crate::error::{AccountError, Result};
use crate::model::{Customer, CustomerId, StatusKind};
use crate::providers::{CustomerCache, CustomerClient};
use crate::resilience::failure_reason;
use account_service_runtime::metrics::CacheMetrics;
use account_service_runtime::CircuitBreaker;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Customer service behind its circuit breaker.
///
/// Every failure, including a short-circuit, surfaces as
/// `AccountError::CustomerUnavailable`. There is no fallback customer.
#[derive(Clone)]
pub struct CustomerGateway {
    client: Arc<dyn CustomerClient>,
    breaker: CircuitBreaker,
}

impl CustomerGateway {
    /// Create a gateway.
    #[must_use]
    pub fn new(client: Arc<dyn CustomerClient>, breaker: CircuitBreaker) -> Self {
        Self { client, breaker }
    }

    /// Fetch a customer from the service, bypassing any cache.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::CustomerUnavailable` if the call fails or is
    /// short-circuited.
    pub async fn fetch(&self, id: &CustomerId) -> Result<Customer> {
        self.breaker
            .call(|| self.client.get_customer(id))
            .await
            .map_err(|e| {
                let reason = failure_reason(&e);
                error!(customer_id = %id, %reason, "Customer lookup failed");
                AccountError::CustomerUnavailable {
                    customer_id: id.clone(),
                    reason,
                }
            })
    }

    /// Fetch a customer by document number.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::CustomerUnavailable` (with the document number
    /// in place of the id) if the call fails or is short-circuited.
    pub async fn find_by_document(&self, document_number: &str) -> Result<Customer> {
        self.breaker
            .call(|| self.client.get_by_document(document_number))
            .await
            .map_err(|e| {
                let reason = failure_reason(&e);
                error!(document_number, %reason, "Customer lookup by document failed");
                AccountError::CustomerUnavailable {
                    customer_id: CustomerId::new(document_number),
                    reason,
                }
            })
    }

    /// Push a VIP or PYM flag to the customer service.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::CustomerUnavailable` if the call fails or is
    /// short-circuited.
    pub async fn push_status(&self, id: &CustomerId, value: bool, kind: StatusKind) -> Result<()> {
        self.breaker
            .call(|| self.client.update_status(id, value, kind))
            .await
            .map(|_| {
                debug!(customer_id = %id, %kind, value, "Customer status pushed");
            })
            .map_err(|e| {
                let reason = failure_reason(&e);
                error!(customer_id = %id, %kind, value, %reason, "Customer status push failed");
                AccountError::CustomerUnavailable {
                    customer_id: id.clone(),
                    reason,
                }
            })
    }
}

/// Cache-aside customer lookup.
///
/// 1. Read the directory cache; a hit is returned as is.
/// 2. On a miss or a cache error, fetch through [`CustomerGateway`].
/// 3. Write the fetched record back; a failed write is logged only.
///
/// At most one remote fetch happens per resolution.
#[derive(Clone)]
pub struct CustomerResolver {
    cache: Arc<dyn CustomerCache>,
    gateway: CustomerGateway,
}

impl CustomerResolver {
    /// Create a resolver.
    #[must_use]
    pub fn new(cache: Arc<dyn CustomerCache>, gateway: CustomerGateway) -> Self {
        Self { cache, gateway }
    }

    /// The underlying gateway.
    #[must_use]
    pub const fn gateway(&self) -> &CustomerGateway {
        &self.gateway
    }

    /// Resolve a customer.
    ///
    /// # Errors
    ///
    /// - `AccountError::InvalidCustomerId` if the id is blank
    /// - `AccountError::CustomerUnavailable` if the remote fetch fails
    pub async fn resolve(&self, id: &CustomerId) -> Result<Customer> {
        if id.is_blank() {
            return Err(AccountError::InvalidCustomerId);
        }

        match self.cache.get(id).await {
            Ok(Some(customer)) => {
                CacheMetrics::record_hit();
                return Ok(customer);
            }
            Ok(None) => CacheMetrics::record_miss(),
            Err(e) => {
                CacheMetrics::record_error("get");
                warn!(customer_id = %id, error = %e, "Customer cache read failed, falling back to service");
            }
        }

        let customer = self.gateway.fetch(id).await?;

        if let Err(e) = self.cache.put(id, &customer).await {
            CacheMetrics::record_error("put");
            warn!(customer_id = %id, error = %e, "Customer cache write failed");
        }

        Ok(customer)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mocks::{customer, MockCustomerCache, MockCustomerClient};
    use crate::model::CustomerType;
    use crate::resilience::DependencyBreakers;

    fn resolver(cache: &MockCustomerCache, client: &MockCustomerClient) -> CustomerResolver {
        let breakers = DependencyBreakers::default();
        CustomerResolver::new(
            Arc::new(cache.clone()),
            CustomerGateway::new(Arc::new(client.clone()), breakers.customer),
        )
    }

    #[tokio::test]
    async fn cache_hit_skips_the_service() {
        let cache = MockCustomerCache::new();
        let client = MockCustomerClient::new();
        let ana = customer("C-1", "Ana Perez", CustomerType::Personal);
        cache.insert(ana.clone());

        let resolved = resolver(&cache, &client).resolve(&ana.id).await.unwrap();

        assert_eq!(resolved, ana);
        assert_eq!(client.fetch_count(), 0);
    }

    #[tokio::test]
    async fn miss_fetches_once_and_populates_cache() {
        let cache = MockCustomerCache::new();
        let client = MockCustomerClient::new();
        let ana = customer("C-1", "Ana Perez", CustomerType::Personal);
        client.insert(ana.clone());

        let resolved = resolver(&cache, &client).resolve(&ana.id).await.unwrap();

        assert_eq!(resolved, ana);
        assert_eq!(client.fetch_count(), 1);
        assert_eq!(cache.cached(&ana.id), Some(ana));
    }

    #[tokio::test]
    async fn cache_failure_falls_back_to_service() {
        let cache = MockCustomerCache::new();
        cache.set_failing(true);
        let client = MockCustomerClient::new();
        let ana = customer("C-1", "Ana Perez", CustomerType::Personal);
        client.insert(ana.clone());

        let resolved = resolver(&cache, &client).resolve(&ana.id).await.unwrap();

        assert_eq!(resolved, ana);
        assert_eq!(client.fetch_count(), 1);
    }

    #[tokio::test]
    async fn service_failure_is_customer_unavailable() {
        let cache = MockCustomerCache::new();
        let client = MockCustomerClient::new();
        client.set_failing(true);

        let err = resolver(&cache, &client)
            .resolve(&CustomerId::new("C-1"))
            .await
            .unwrap_err();

        assert!(matches!(err, AccountError::CustomerUnavailable { .. }));
    }

    #[tokio::test]
    async fn blank_id_is_rejected_before_any_lookup() {
        let cache = MockCustomerCache::new();
        let client = MockCustomerClient::new();

        let err = resolver(&cache, &client)
            .resolve(&CustomerId::new(""))
            .await
            .unwrap_err();

        assert_eq!(err, AccountError::InvalidCustomerId);
        assert_eq!(client.fetch_count(), 0);
    }

    #[tokio::test]
    async fn open_breaker_does_not_reach_the_service() {
        let cache = MockCustomerCache::new();
        let client = MockCustomerClient::new();
        client.insert(customer("C-1", "Ana Perez", CustomerType::Personal));
        let breakers = DependencyBreakers::default();
        breakers.customer.trip().await;
        let gateway = CustomerGateway::new(Arc::new(client.clone()), breakers.customer);

        let err = gateway.fetch(&CustomerId::new("C-1")).await.unwrap_err();

        assert!(matches!(err, AccountError::CustomerUnavailable { ref reason, .. } if reason == "circuit open"));
        assert_eq!(client.fetch_count(), 0);
    }
}
