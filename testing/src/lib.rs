//! # Account Service Testing
//!
//! Test doubles shared by the account service crates.
//!
//! This crate provides:
//! - [`FixedClock`] / [`test_clock`] for deterministic time
//! - [`InMemoryEventBus`] for asserting on published notifications and
//!   driving bus consumers without a broker
//!
//! ## Example
//!
//! ```
//! use account_service_core::environment::Clock;
//! use account_service_testing::{test_clock, InMemoryEventBus};
//!
//! let clock = test_clock();
//! assert_eq!(clock.now(), clock.now());
//!
//! let bus = InMemoryEventBus::new();
//! assert_eq!(bus.publish_count(), 0);
//! ```

use chrono::{DateTime, Utc};
use account_service_core::environment::Clock;

pub mod event_bus;

/// Mock implementations of environment traits.
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use account_service_testing::mocks::FixedClock;
    /// use account_service_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

pub use event_bus::InMemoryEventBus;
pub use mocks::{FixedClock, test_clock};
