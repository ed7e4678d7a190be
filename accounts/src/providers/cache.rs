//! Customer directory cache trait.
//!
//! Entries have no expiry. They are refreshed when a resolution misses and
//! when the customer stream announces a customer, so a cached record may lag
//! the customer service until one of those happens.

use crate::error::CacheError;
use crate::model::{Customer, CustomerId};
use futures::future::BoxFuture;

/// Key prefix for customer entries.
pub const CUSTOMER_KEY_PREFIX: &str = "Customer:";

/// Cache key for a customer id.
///
/// # Errors
///
/// Returns `CacheError::InvalidKey` if the id is blank.
///
/// # Examples
///
/// ```
/// # use account_service::model::CustomerId;
/// # use account_service::providers::cache_key;
/// assert_eq!(cache_key(&CustomerId::new("42")).unwrap(), "Customer:42");
/// assert!(cache_key(&CustomerId::new("  ")).is_err());
/// ```
pub fn cache_key(id: &CustomerId) -> Result<String, CacheError> {
    if id.is_blank() {
        return Err(CacheError::InvalidKey);
    }
    Ok(format!("{CUSTOMER_KEY_PREFIX}{id}"))
}

/// Read-through cache of customer records.
pub trait CustomerCache: Send + Sync {
    /// Cached customer, if any.
    ///
    /// # Errors
    ///
    /// - `CacheError::InvalidKey` if the id is blank
    /// - `CacheError::Backend` / `CacheError::Serialization` on cache failure
    fn get<'a>(&'a self, id: &'a CustomerId)
    -> BoxFuture<'a, Result<Option<Customer>, CacheError>>;

    /// Store a customer under `id`.
    ///
    /// # Errors
    ///
    /// - `CacheError::InvalidKey` if the id is blank
    /// - `CacheError::Backend` / `CacheError::Serialization` on cache failure
    fn put<'a>(
        &'a self,
        id: &'a CustomerId,
        customer: &'a Customer,
    ) -> BoxFuture<'a, Result<(), CacheError>>;
}
