//! Redis-backed customer directory cache.
//!
//! Entries live under `Customer:{id}` as bincode-encoded [`Customer`]
//! records, with no TTL.
//!
//! # Example
//!
//! ```no_run
//! use account_service::stores::RedisCustomerCache;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let cache = RedisCustomerCache::new("redis://127.0.0.1:6379").await?;
//! # Ok(())
//! # }
//! ```

use crate::error::CacheError;
use crate::model::{Customer, CustomerId};
use crate::providers::{cache_key, CustomerCache};
use futures::future::{BoxFuture, FutureExt};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

/// Redis customer cache.
#[derive(Clone)]
pub struct RedisCustomerCache {
    /// Connection manager for connection pooling.
    conn_manager: ConnectionManager,
}

impl RedisCustomerCache {
    /// Connect to Redis.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Backend` if the connection cannot be set up.
    pub async fn new(redis_url: &str) -> Result<Self, CacheError> {
        let client = Client::open(redis_url)
            .map_err(|e| CacheError::Backend(format!("Failed to create Redis client: {e}")))?;

        let conn_manager = ConnectionManager::new(client).await.map_err(|e| {
            CacheError::Backend(format!("Failed to create Redis connection manager: {e}"))
        })?;

        Ok(Self { conn_manager })
    }
}

impl CustomerCache for RedisCustomerCache {
    fn get<'a>(
        &'a self,
        id: &'a CustomerId,
    ) -> BoxFuture<'a, Result<Option<Customer>, CacheError>> {
        async move {
            let key = cache_key(id)?;
            let mut conn = self.conn_manager.clone();

            let bytes: Option<Vec<u8>> = conn
                .get(&key)
                .await
                .map_err(|e| CacheError::Backend(format!("Failed to read {key}: {e}")))?;

            bytes
                .map(|bytes| {
                    bincode::deserialize(&bytes)
                        .map_err(|e| CacheError::Serialization(e.to_string()))
                })
                .transpose()
        }
        .boxed()
    }

    fn put<'a>(
        &'a self,
        id: &'a CustomerId,
        customer: &'a Customer,
    ) -> BoxFuture<'a, Result<(), CacheError>> {
        async move {
            let key = cache_key(id)?;
            let bytes = bincode::serialize(customer)
                .map_err(|e| CacheError::Serialization(e.to_string()))?;

            let mut conn = self.conn_manager.clone();
            conn.set::<_, _, ()>(&key, bytes)
                .await
                .map_err(|e| CacheError::Backend(format!("Failed to write {key}: {e}")))
        }
        .boxed()
    }
}
