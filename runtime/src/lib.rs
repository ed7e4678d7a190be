//! # Account Service Runtime
//!
//! Resilience and observability plumbing shared by the account service:
//!
//! - [`circuit_breaker`] guards each remote dependency with its own breaker
//! - [`metrics`] installs the Prometheus recorder and exposes typed recorders
//!
//! Nothing here knows about accounts or cards. Call sites decide what a
//! short-circuited or failed call means for them.

pub mod circuit_breaker;
pub mod metrics;

pub use circuit_breaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, CircuitBreakerStats, State,
};
