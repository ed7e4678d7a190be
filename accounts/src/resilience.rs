//! Per-dependency circuit breakers.
//!
//! One [`CircuitBreaker`] per remote service, owned here and injected into
//! the components that call it. Clones share state, so the customer breaker
//! seen by the resolver is the same one the consumers use.

use crate::config::BreakerSettings;
use account_service_runtime::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError};
use std::fmt::Display;

/// Breaker name for the customer service.
pub const CUSTOMER: &str = "customer";
/// Breaker name for the credit service.
pub const CREDIT: &str = "credit";
/// Breaker name for the eligibility service.
pub const ELIGIBILITY: &str = "eligibility";

/// The three breakers guarding outbound calls.
#[derive(Debug, Clone)]
pub struct DependencyBreakers {
    /// Customer service
    pub customer: CircuitBreaker,
    /// Credit service
    pub credit: CircuitBreaker,
    /// Eligibility service
    pub eligibility: CircuitBreaker,
}

impl DependencyBreakers {
    /// Build breakers from configuration.
    #[must_use]
    pub fn new(settings: &BreakerSettings) -> Self {
        Self {
            customer: CircuitBreaker::new(CUSTOMER, settings.customer.clone()),
            credit: CircuitBreaker::new(CREDIT, settings.credit.clone()),
            eligibility: CircuitBreaker::new(ELIGIBILITY, settings.eligibility.clone()),
        }
    }
}

impl Default for DependencyBreakers {
    fn default() -> Self {
        Self::new(&BreakerSettings {
            customer: CircuitBreakerConfig::default(),
            credit: CircuitBreakerConfig::default(),
            eligibility: CircuitBreakerConfig::default(),
        })
    }
}

/// Human-readable reason for a guarded call that did not succeed.
pub fn failure_reason<E: Display>(err: &CircuitBreakerError<E>) -> String {
    match err {
        CircuitBreakerError::Open => "circuit open".to_string(),
        CircuitBreakerError::Inner(e) => e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RemoteError;
    use account_service_runtime::State;

    #[tokio::test]
    async fn breakers_are_named_per_dependency() {
        let breakers = DependencyBreakers::default();

        assert_eq!(breakers.customer.name(), CUSTOMER);
        assert_eq!(breakers.credit.name(), CREDIT);
        assert_eq!(breakers.eligibility.name(), ELIGIBILITY);
        assert_eq!(breakers.credit.state().await, State::Closed);
    }

    #[tokio::test]
    async fn clones_share_state() {
        let breakers = DependencyBreakers::default();
        let copy = breakers.clone();

        breakers.eligibility.trip().await;

        assert_eq!(copy.eligibility.state().await, State::Open);
        assert_eq!(copy.customer.state().await, State::Closed);
    }

    #[test]
    fn reasons_distinguish_open_from_inner() {
        let open: CircuitBreakerError<RemoteError> = CircuitBreakerError::Open;
        let inner = CircuitBreakerError::Inner(RemoteError::Transport("refused".to_string()));

        assert_eq!(failure_reason(&open), "circuit open");
        assert_eq!(failure_reason(&inner), "network error: refused");
    }
}
