//! Mock customer cache.

use super::lock;
use crate::error::CacheError;
use crate::model::{Customer, CustomerId};
use crate::providers::{cache_key, CustomerCache};
use futures::future::{BoxFuture, FutureExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Mock customer cache keyed exactly like the Redis one.
#[derive(Debug, Clone, Default)]
pub struct MockCustomerCache {
    entries: Arc<Mutex<HashMap<String, Customer>>>,
    failing: Arc<AtomicBool>,
}

impl MockCustomerCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation fail with a backend error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Seed the cache.
    pub fn insert(&self, customer: Customer) {
        let key = format!("{}{}", crate::providers::CUSTOMER_KEY_PREFIX, customer.id);
        lock(&self.entries).insert(key, customer);
    }

    /// Cached record for `id`, read without going through the trait.
    #[must_use]
    pub fn cached(&self, id: &CustomerId) -> Option<Customer> {
        let key = cache_key(id).ok()?;
        lock(&self.entries).get(&key).cloned()
    }

    fn check(&self, id: &CustomerId) -> Result<String, CacheError> {
        let key = cache_key(id)?;
        if self.failing.load(Ordering::SeqCst) {
            return Err(CacheError::Backend("connection refused".to_string()));
        }
        Ok(key)
    }
}

impl CustomerCache for MockCustomerCache {
    fn get<'a>(
        &'a self,
        id: &'a CustomerId,
    ) -> BoxFuture<'a, Result<Option<Customer>, CacheError>> {
        async move {
            let key = self.check(id)?;
            Ok(lock(&self.entries).get(&key).cloned())
        }
        .boxed()
    }

    fn put<'a>(
        &'a self,
        id: &'a CustomerId,
        customer: &'a Customer,
    ) -> BoxFuture<'a, Result<(), CacheError>> {
        async move {
            let key = self.check(id)?;
            lock(&self.entries).insert(key, customer.clone());
            Ok(())
        }
        .boxed()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mocks::customer;
    use crate::model::CustomerType;

    #[tokio::test]
    async fn blank_key_is_invalid() {
        let cache = MockCustomerCache::new();
        let err = cache.get(&CustomerId::new("")).await.unwrap_err();
        assert_eq!(err, CacheError::InvalidKey);
    }

    #[tokio::test]
    async fn put_then_get() {
        let cache = MockCustomerCache::new();
        let ana = customer("C-1", "Ana", CustomerType::Personal);

        cache.put(&ana.id, &ana).await.unwrap();

        assert_eq!(cache.get(&ana.id).await.unwrap(), Some(ana));
    }
}
