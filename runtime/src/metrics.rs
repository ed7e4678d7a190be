//! Prometheus metrics for observability and monitoring.
//!
//! This module provides metric collection for the account service:
//! - Circuit breakers guarding remote services
//! - Customer directory cache hits and misses
//! - Notification publishing on the event bus
//! - Card number generation
//! - Inbound bus consumers
//!
//! # Example
//!
//! ```rust,no_run
//! use account_service_runtime::metrics::MetricsServer;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Start metrics server on port 9090
//! let mut server = MetricsServer::new("0.0.0.0:9090".parse()?);
//! server.start()?;
//!
//! // Metrics available at http://localhost:9090/metrics
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

// Re-export metrics macros for use in other crates
pub use metrics::{counter, gauge, histogram};

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Prometheus metrics server.
///
/// Exposes metrics on an HTTP endpoint for Prometheus scraping.
pub struct MetricsServer {
    addr: SocketAddr,
    handle: Option<PrometheusHandle>,
}

impl MetricsServer {
    /// Create a new metrics server.
    ///
    /// # Arguments
    ///
    /// * `addr` - Socket address to bind to (e.g., `0.0.0.0:9090`)
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self { addr, handle: None }
    }

    /// Install the global recorder and spawn the scrape listener.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns error if the exporter cannot be built (e.g. the address cannot be bound).
    ///
    /// # Note
    ///
    /// If a metrics recorder is already installed (e.g., in tests), this logs a
    /// warning and returns `Ok` without a handle.
    pub fn start(&mut self) -> Result<(), MetricsError> {
        let (recorder, exporter) = PrometheusBuilder::new()
            .with_http_listener(self.addr)
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[
                    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
                ],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?
            .build()
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        let handle = recorder.handle();
        if metrics::set_global_recorder(recorder).is_err() {
            tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
            return Ok(());
        }

        tokio::spawn(async move {
            // `ExporterError` implements neither `Display` nor `Debug` in this version.
            if exporter.await.is_err() {
                tracing::error!("Metrics exporter stopped");
            }
        });

        register_metrics();
        self.handle = Some(handle);
        tracing::info!(
            addr = %self.addr,
            "Metrics server started - available at http://{}/metrics",
            self.addr
        );
        Ok(())
    }

    /// Get the metrics handle for rendering.
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Render current metrics in Prometheus format.
    ///
    /// Returns `None` if this server did not install the recorder.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

/// Register all metric descriptions.
fn register_metrics() {
    // Circuit Breaker Metrics
    describe_gauge!(
        "circuit_breaker_state",
        "Current circuit breaker state per dependency (0=closed, 1=half-open, 2=open)"
    );
    describe_counter!(
        "circuit_breaker_calls_total",
        "Total number of calls through circuit breaker"
    );
    describe_counter!(
        "circuit_breaker_successes_total",
        "Total number of successful calls"
    );
    describe_counter!(
        "circuit_breaker_failures_total",
        "Total number of failed calls"
    );
    describe_counter!(
        "circuit_breaker_rejections_total",
        "Total number of short-circuited calls (circuit open)"
    );
    describe_counter!(
        "circuit_breaker_state_changes_total",
        "Total number of circuit breaker state transitions"
    );

    // Cache Metrics
    describe_counter!("customer_cache_hits_total", "Customer lookups served from cache");
    describe_counter!("customer_cache_misses_total", "Customer lookups not in cache");
    describe_counter!(
        "customer_cache_errors_total",
        "Customer cache reads or writes that failed"
    );

    // Notification Metrics
    describe_counter!(
        "notifications_published_total",
        "Total number of notifications published to the event bus"
    );
    describe_counter!(
        "notifications_failed_total",
        "Total number of notifications that could not be published"
    );
    describe_histogram!(
        "notification_publish_duration_seconds",
        "Time taken to publish a notification"
    );

    // Card Number Metrics
    describe_counter!(
        "card_number_collisions_total",
        "Generated card numbers rejected because they already exist"
    );

    // Consumer Metrics
    describe_counter!(
        "bus_messages_consumed_total",
        "Total number of messages consumed from the event bus"
    );
    describe_counter!(
        "bus_messages_rejected_total",
        "Total number of consumed messages that could not be handled"
    );
}

/// Circuit breaker metrics recorder, labelled by dependency.
pub struct CircuitBreakerMetrics;

impl CircuitBreakerMetrics {
    /// Record a call attempt.
    pub fn record_call(dependency: &str) {
        counter!("circuit_breaker_calls_total", "dependency" => dependency.to_string()).increment(1);
    }

    /// Record a successful call.
    pub fn record_success(dependency: &str) {
        counter!("circuit_breaker_successes_total", "dependency" => dependency.to_string())
            .increment(1);
    }

    /// Record a failed call.
    pub fn record_failure(dependency: &str) {
        counter!("circuit_breaker_failures_total", "dependency" => dependency.to_string())
            .increment(1);
    }

    /// Record a rejected call (circuit open).
    pub fn record_rejection(dependency: &str) {
        counter!("circuit_breaker_rejections_total", "dependency" => dependency.to_string())
            .increment(1);
    }

    /// Record a state transition and update the state gauge.
    pub fn record_transition(dependency: &str, from: &'static str, to: &'static str) {
        counter!(
            "circuit_breaker_state_changes_total",
            "dependency" => dependency.to_string(),
            "from" => from,
            "to" => to
        )
        .increment(1);
        let level = match to {
            "closed" => 0.0,
            "half_open" => 1.0,
            _ => 2.0,
        };
        gauge!("circuit_breaker_state", "dependency" => dependency.to_string()).set(level);
    }
}

/// Customer cache metrics recorder.
pub struct CacheMetrics;

impl CacheMetrics {
    /// Record a cache hit.
    pub fn record_hit() {
        counter!("customer_cache_hits_total").increment(1);
    }

    /// Record a cache miss.
    pub fn record_miss() {
        counter!("customer_cache_misses_total").increment(1);
    }

    /// Record a failed cache operation.
    pub fn record_error(operation: &'static str) {
        counter!("customer_cache_errors_total", "operation" => operation).increment(1);
    }
}

/// Notification (event bus publish) metrics recorder.
pub struct NotificationMetrics;

impl NotificationMetrics {
    /// Record a published notification.
    pub fn record_publish(topic: &str, duration: Duration) {
        counter!("notifications_published_total", "topic" => topic.to_string()).increment(1);
        histogram!("notification_publish_duration_seconds").record(duration.as_secs_f64());
    }

    /// Record a notification that could not be published.
    pub fn record_failure(topic: &str) {
        counter!("notifications_failed_total", "topic" => topic.to_string()).increment(1);
    }
}

/// Card number generation metrics recorder.
pub struct CardNumberMetrics;

impl CardNumberMetrics {
    /// Record a generated number that was already taken.
    pub fn record_collision() {
        counter!("card_number_collisions_total").increment(1);
    }
}

/// Bus consumer metrics recorder.
pub struct ConsumerMetrics;

impl ConsumerMetrics {
    /// Record a consumed message.
    pub fn record_consumed(topic: &str) {
        counter!("bus_messages_consumed_total", "topic" => topic.to_string()).increment(1);
    }

    /// Record a message the handler could not process.
    pub fn record_rejected(topic: &str) {
        counter!("bus_messages_rejected_total", "topic" => topic.to_string()).increment(1);
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Tests can use unwrap

    use super::*;

    #[test]
    fn test_metrics_server_creation() {
        let addr = "127.0.0.1:0".parse().unwrap();
        let server = MetricsServer::new(addr);
        assert!(server.handle().is_none());
        assert!(server.render().is_none());
    }

    #[test]
    fn test_recorders_without_installed_recorder() {
        // Recording against the no-op recorder must not panic.
        CircuitBreakerMetrics::record_call("customer");
        CircuitBreakerMetrics::record_transition("customer", "closed", "open");
        CacheMetrics::record_hit();
        CacheMetrics::record_error("get");
        NotificationMetrics::record_publish("account-created", Duration::from_millis(5));
        CardNumberMetrics::record_collision();
        ConsumerMetrics::record_rejected("customer-created");
    }

    #[tokio::test]
    async fn test_metrics_server_render() {
        let addr = "127.0.0.1:0".parse().unwrap();
        let mut server = MetricsServer::new(addr);

        server.start().unwrap();

        CircuitBreakerMetrics::record_call("credit");
        NotificationMetrics::record_publish("account-created", Duration::from_millis(50));

        // Another test in the process may already own the global recorder.
        if let Some(rendered) = server.render() {
            assert!(rendered.contains("circuit_breaker_calls_total"));
            assert!(rendered.contains("notifications_published_total"));
        }
    }
}
