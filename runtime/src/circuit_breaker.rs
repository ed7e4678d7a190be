//! Circuit breaker pattern for outbound calls to remote services.
//!
//! A circuit breaker monitors calls to one named dependency and "opens" (stops
//! attempting calls) when failures exceed a threshold, so a struggling service
//! is not hammered while it recovers.
//!
//! # States
//!
//! - **Closed**: Normal operation. Calls pass through. Failures are counted.
//! - **Open**: Too many failures detected. Calls are short-circuited without a
//!   network attempt until the timeout elapses.
//! - **HalfOpen**: After the timeout, probe calls are let through. Enough
//!   successes close the circuit, any failure reopens it.
//!
//! The breaker is policy-free: it only decides *whether* to attempt a call and
//! records the outcome. What to return when a call is short-circuited or fails
//! is decided by the call site.
//!
//! # Example
//!
//! ```rust
//! use account_service_runtime::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CircuitBreakerConfig::builder()
//!     .failure_threshold(5)
//!     .timeout(Duration::from_secs(30))
//!     .success_threshold(1)
//!     .build();
//!
//! let breaker = CircuitBreaker::new("credit", config);
//!
//! match breaker.call(|| async {
//!     // Your fallible operation
//!     Ok::<_, String>(42)
//! }).await {
//!     Ok(result) => println!("Success: {result}"),
//!     Err(e) => println!("Failed: {e}"),
//! }
//! # Ok(())
//! # }
//! ```

use crate::metrics::CircuitBreakerMetrics;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;

/// Circuit breaker configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Number of consecutive failures before opening the circuit
    pub failure_threshold: usize,
    /// Duration to wait before transitioning from Open to `HalfOpen`
    pub timeout: Duration,
    /// Number of successes in `HalfOpen` state before closing the circuit
    pub success_threshold: usize,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            timeout: Duration::from_secs(30),
            success_threshold: 1,
        }
    }
}

impl CircuitBreakerConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub const fn builder() -> CircuitBreakerConfigBuilder {
        CircuitBreakerConfigBuilder {
            failure_threshold: None,
            timeout: None,
            success_threshold: None,
        }
    }
}

/// Builder for [`CircuitBreakerConfig`].
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfigBuilder {
    failure_threshold: Option<usize>,
    timeout: Option<Duration>,
    success_threshold: Option<usize>,
}

impl CircuitBreakerConfigBuilder {
    /// Set the failure threshold.
    ///
    /// Circuit opens after this many consecutive failures.
    #[must_use]
    pub const fn failure_threshold(mut self, threshold: usize) -> Self {
        self.failure_threshold = Some(threshold);
        self
    }

    /// Set the timeout duration.
    ///
    /// How long to wait in Open state before trying `HalfOpen`.
    #[must_use]
    pub const fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Set the success threshold.
    ///
    /// Number of successes in `HalfOpen` state before closing the circuit.
    #[must_use]
    pub const fn success_threshold(mut self, threshold: usize) -> Self {
        self.success_threshold = Some(threshold);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> CircuitBreakerConfig {
        let defaults = CircuitBreakerConfig::default();
        CircuitBreakerConfig {
            failure_threshold: self.failure_threshold.unwrap_or(defaults.failure_threshold).max(1),
            timeout: self.timeout.unwrap_or(defaults.timeout),
            success_threshold: self.success_threshold.unwrap_or(defaults.success_threshold).max(1),
        }
    }
}

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Circuit is closed, requests pass through normally
    Closed,
    /// Circuit is open, requests are short-circuited
    Open,
    /// Circuit is half-open, testing if service recovered
    HalfOpen,
}

impl State {
    /// Stable label used in logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half_open",
        }
    }
}

/// Errors from circuit breaker operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CircuitBreakerError<E> {
    /// Circuit is open, the call was not attempted
    #[error("Circuit breaker is open")]
    Open,
    /// Operation was attempted and failed
    #[error("Operation failed: {0}")]
    Inner(E),
}

/// Internal state of the circuit breaker.
#[derive(Debug)]
struct CircuitBreakerState {
    state: State,
    failure_count: usize,
    success_count: usize,
    opened_at: Option<Instant>,
}

/// Circuit breaker guarding one named dependency.
///
/// Cloning is cheap and clones share state, so one instance per dependency can
/// be handed to every component that calls it.
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    name: Arc<str>,
    config: Arc<CircuitBreakerConfig>,
    state: Arc<RwLock<CircuitBreakerState>>,
    total_calls: Arc<AtomicU64>,
    total_successes: Arc<AtomicU64>,
    total_failures: Arc<AtomicU64>,
    total_rejections: Arc<AtomicU64>,
}

impl CircuitBreaker {
    /// Create a new circuit breaker for the dependency `name`.
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config: Arc::new(config),
            state: Arc::new(RwLock::new(CircuitBreakerState {
                state: State::Closed,
                failure_count: 0,
                success_count: 0,
                opened_at: None,
            })),
            total_calls: Arc::new(AtomicU64::new(0)),
            total_successes: Arc::new(AtomicU64::new(0)),
            total_failures: Arc::new(AtomicU64::new(0)),
            total_rejections: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Name of the guarded dependency.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Configuration this breaker was built with.
    #[must_use]
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Get the current state of the circuit breaker.
    pub async fn state(&self) -> State {
        let state = self.state.read().await;
        state.state
    }

    /// Call an operation through the circuit breaker.
    ///
    /// # Errors
    ///
    /// Returns `CircuitBreakerError::Open` if the circuit is open (the operation
    /// is not invoked). Returns `CircuitBreakerError::Inner` if the operation fails.
    pub async fn call<F, Fut, T, E>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
    {
        self.total_calls.fetch_add(1, Ordering::Relaxed);
        CircuitBreakerMetrics::record_call(&self.name);

        if !self.can_attempt().await {
            self.total_rejections.fetch_add(1, Ordering::Relaxed);
            CircuitBreakerMetrics::record_rejection(&self.name);
            tracing::warn!(dependency = %self.name, "Circuit breaker is OPEN, short-circuiting call");
            return Err(CircuitBreakerError::Open);
        }

        match operation().await {
            Ok(result) => {
                self.on_success().await;
                self.total_successes.fetch_add(1, Ordering::Relaxed);
                CircuitBreakerMetrics::record_success(&self.name);
                Ok(result)
            }
            Err(err) => {
                self.on_failure().await;
                self.total_failures.fetch_add(1, Ordering::Relaxed);
                CircuitBreakerMetrics::record_failure(&self.name);
                Err(CircuitBreakerError::Inner(err))
            }
        }
    }

    /// Check if the circuit breaker should allow an attempt.
    async fn can_attempt(&self) -> bool {
        let mut state = self.state.write().await;

        match state.state {
            State::Closed | State::HalfOpen => true,
            State::Open => {
                let expired = state
                    .opened_at
                    .is_some_and(|opened| opened.elapsed() >= self.config.timeout);
                if expired {
                    self.transition(&mut state, State::HalfOpen);
                    state.success_count = 0;
                }
                expired
            }
        }
    }

    /// Handle successful operation.
    async fn on_success(&self) {
        let mut state = self.state.write().await;

        match state.state {
            State::Closed | State::Open => {
                state.failure_count = 0;
            }
            State::HalfOpen => {
                state.success_count += 1;
                if state.success_count >= self.config.success_threshold {
                    self.transition(&mut state, State::Closed);
                    state.failure_count = 0;
                    state.success_count = 0;
                    state.opened_at = None;
                }
            }
        }
    }

    /// Handle failed operation.
    async fn on_failure(&self) {
        let mut state = self.state.write().await;

        match state.state {
            State::Closed => {
                state.failure_count += 1;
                if state.failure_count >= self.config.failure_threshold {
                    tracing::warn!(
                        dependency = %self.name,
                        failures = state.failure_count,
                        threshold = self.config.failure_threshold,
                        "Failure threshold reached"
                    );
                    self.transition(&mut state, State::Open);
                    state.opened_at = Some(Instant::now());
                }
            }
            State::HalfOpen => {
                self.transition(&mut state, State::Open);
                state.opened_at = Some(Instant::now());
                state.failure_count = 1;
                state.success_count = 0;
            }
            State::Open => {
                state.failure_count += 1;
            }
        }
    }

    fn transition(&self, state: &mut CircuitBreakerState, to: State) {
        let from = state.state;
        state.state = to;
        CircuitBreakerMetrics::record_transition(&self.name, from.as_str(), to.as_str());
        if to == State::Open {
            tracing::warn!(dependency = %self.name, from = from.as_str(), to = to.as_str(), "Circuit breaker state change");
        } else {
            tracing::info!(dependency = %self.name, from = from.as_str(), to = to.as_str(), "Circuit breaker state change");
        }
    }

    /// Get circuit breaker counters.
    #[must_use]
    pub fn stats(&self) -> CircuitBreakerStats {
        CircuitBreakerStats {
            total_calls: self.total_calls.load(Ordering::Relaxed),
            total_successes: self.total_successes.load(Ordering::Relaxed),
            total_failures: self.total_failures.load(Ordering::Relaxed),
            total_rejections: self.total_rejections.load(Ordering::Relaxed),
        }
    }

    /// Force the circuit open, as if the failure threshold had just been hit.
    ///
    /// Used for manual intervention (and to get deterministic fallbacks in tests).
    pub async fn trip(&self) {
        let mut state = self.state.write().await;
        if state.state != State::Open {
            self.transition(&mut state, State::Open);
        }
        state.opened_at = Some(Instant::now());
        state.success_count = 0;
    }

    /// Reset the circuit breaker to closed state.
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        tracing::info!(dependency = %self.name, "Circuit breaker manually reset to CLOSED");
        state.state = State::Closed;
        state.failure_count = 0;
        state.success_count = 0;
        state.opened_at = None;
    }
}

/// Counters for circuit breaker monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerStats {
    /// Total number of calls attempted
    pub total_calls: u64,
    /// Total number of successful calls
    pub total_successes: u64,
    /// Total number of failed calls
    pub total_failures: u64,
    /// Total number of short-circuited calls (circuit open)
    pub total_rejections: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn breaker(threshold: usize, timeout: Duration) -> CircuitBreaker {
        CircuitBreaker::new(
            "test",
            CircuitBreakerConfig::builder()
                .failure_threshold(threshold)
                .timeout(timeout)
                .build(),
        )
    }

    #[tokio::test]
    async fn test_circuit_breaker_closed_on_success() {
        let breaker = CircuitBreaker::new("test", CircuitBreakerConfig::default());

        let result = breaker.call(|| async { Ok::<_, String>(42) }).await;

        assert_eq!(result, Ok(42));
        assert_eq!(breaker.state().await, State::Closed);
    }

    #[tokio::test]
    async fn test_circuit_breaker_opens_after_threshold() {
        let breaker = breaker(3, Duration::from_secs(60));

        for _ in 0..3 {
            let _ = breaker.call(|| async { Err::<i32, _>("error") }).await;
        }

        assert_eq!(breaker.state().await, State::Open);
    }

    #[tokio::test]
    async fn test_open_circuit_does_not_invoke_operation() {
        let breaker = breaker(2, Duration::from_secs(60));
        for _ in 0..2 {
            let _ = breaker.call(|| async { Err::<i32, _>("error") }).await;
        }

        let invoked = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&invoked);
        let result = breaker
            .call(|| async move {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(42)
            })
            .await;

        assert!(matches!(result, Err(CircuitBreakerError::Open)));
        assert_eq!(invoked.load(Ordering::SeqCst), 0);
        assert_eq!(breaker.stats().total_rejections, 1);
    }

    #[tokio::test]
    async fn test_success_resets_consecutive_failures() {
        let breaker = breaker(2, Duration::from_secs(60));

        let _ = breaker.call(|| async { Err::<i32, _>("error") }).await;
        let _ = breaker.call(|| async { Ok::<_, &str>(1) }).await;
        let _ = breaker.call(|| async { Err::<i32, _>("error") }).await;

        assert_eq!(breaker.state().await, State::Closed);
    }

    #[tokio::test]
    async fn test_half_open_probe_success_closes() {
        let breaker = breaker(2, Duration::from_millis(50));
        for _ in 0..2 {
            let _ = breaker.call(|| async { Err::<i32, _>("error") }).await;
        }
        assert_eq!(breaker.state().await, State::Open);

        tokio::time::sleep(Duration::from_millis(80)).await;

        let result = breaker.call(|| async { Ok::<_, String>(42) }).await;
        assert_eq!(result, Ok(42));
        assert_eq!(breaker.state().await, State::Closed);
    }

    #[tokio::test]
    async fn test_half_open_needs_success_threshold() {
        let config = CircuitBreakerConfig::builder()
            .failure_threshold(1)
            .timeout(Duration::from_millis(50))
            .success_threshold(2)
            .build();
        let breaker = CircuitBreaker::new("test", config);
        let _ = breaker.call(|| async { Err::<i32, _>("error") }).await;

        tokio::time::sleep(Duration::from_millis(80)).await;

        let _ = breaker.call(|| async { Ok::<_, String>(1) }).await;
        assert_eq!(breaker.state().await, State::HalfOpen);
        let _ = breaker.call(|| async { Ok::<_, String>(2) }).await;
        assert_eq!(breaker.state().await, State::Closed);
    }

    #[tokio::test]
    async fn test_circuit_breaker_reopens_on_half_open_failure() {
        let breaker = breaker(2, Duration::from_millis(50));
        for _ in 0..2 {
            let _ = breaker.call(|| async { Err::<i32, _>("error") }).await;
        }

        tokio::time::sleep(Duration::from_millis(80)).await;

        let _ = breaker.call(|| async { Err::<i32, _>("error") }).await;

        assert_eq!(breaker.state().await, State::Open);
    }

    #[tokio::test]
    async fn test_trip_and_reset() {
        let breaker = breaker(5, Duration::from_secs(60));

        breaker.trip().await;
        assert_eq!(breaker.state().await, State::Open);
        let result = breaker.call(|| async { Ok::<_, String>(1) }).await;
        assert!(matches!(result, Err(CircuitBreakerError::Open)));

        breaker.reset().await;
        assert_eq!(breaker.state().await, State::Closed);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let breaker = breaker(1, Duration::from_secs(60));
        let clone = breaker.clone();

        let _ = clone.call(|| async { Err::<i32, _>("error") }).await;

        assert_eq!(breaker.state().await, State::Open);
        assert_eq!(breaker.name(), "test");
    }

    #[tokio::test]
    async fn test_circuit_breaker_concurrent_calls() {
        let breaker = Arc::new(CircuitBreaker::new("test", CircuitBreakerConfig::default()));

        let counter = Arc::new(AtomicUsize::new(0));
        let mut handles = vec![];

        for _ in 0..50 {
            let breaker_clone = Arc::clone(&breaker);
            let counter_clone = Arc::clone(&counter);

            handles.push(tokio::spawn(async move {
                let _ = breaker_clone
                    .call(|| async {
                        counter_clone.fetch_add(1, Ordering::SeqCst);
                        Ok::<_, String>(())
                    })
                    .await;
            }));
        }

        for handle in handles {
            handle.await.ok();
        }

        let stats = breaker.stats();
        assert_eq!(stats.total_calls, 50);
        assert_eq!(stats.total_successes, 50);
        assert_eq!(stats.total_rejections, 0);
        assert_eq!(counter.load(Ordering::SeqCst), 50);
    }
}
