//! # Account Service Core
//!
//! Core traits and types shared by the account service crates.
//!
//! The domain crate never talks to infrastructure directly. Time, outbound
//! notifications and inbound event streams are reached through the traits in
//! this crate, so production adapters and deterministic test doubles can be
//! swapped freely.
//!
//! - [`environment::Clock`]: the source of "now" for timestamps
//! - [`event::Event`] / [`event::SerializedEvent`]: notification payloads
//! - [`event_bus::EventBus`]: publish/subscribe over a message bus

// Re-export commonly used types
pub use chrono::{DateTime, Utc};

pub mod event;
pub mod event_bus;

/// Environment module - Dependency injection traits
///
/// All external dependencies are abstracted behind traits and injected
/// into the services that need them.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```
    /// use account_service_core::environment::{Clock, SystemClock};
    ///
    /// let clock = SystemClock;
    /// let before = chrono::Utc::now();
    /// assert!(clock.now() >= before);
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall-clock time for production use.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::environment::{Clock, SystemClock};

    #[test]
    fn system_clock_moves_forward() {
        let clock = SystemClock;
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
    }
}
