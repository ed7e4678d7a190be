//! Storage adapters.
//!
//! - [`RedisCustomerCache`]: customer directory cache
//! - [`postgres`]: account and debit card repositories

pub mod postgres;
pub mod redis;

pub use self::postgres::{PostgresAccountRepository, PostgresDebitCardRepository};
pub use self::redis::RedisCustomerCache;
