//! # Recsys Core
//!
//! Shared vocabulary for the recommendation platform services.
//!
//! Every service (identity, user, product, recommendation, analytics) depends on
//! this crate and nothing else for the contracts it shares with its peers:
//!
//! - [`event::DomainEvent`]: the closed set of facts exchanged over the bus
//! - [`event_bus::EventBus`]: publish / per-topic group subscription / topic admin
//! - [`cache::Cache`]: TTL-bounded side cache in front of the repositories
//! - [`ports`]: repository traits implemented by the Postgres crate and the mocks
//! - [`model`]: records owned by each domain
//!
//! ## Control flow
//!
//! ```text
//! API call ──► repository write ──► publish DomainEvent ──► bus
//!                                                           │
//!                    ┌──────────────────────────────────────┤
//!                    ▼                                      ▼
//!         recommendation group                      analytics group
//!      (category scores, cache delete)          (product/user counters)
//! ```

pub use chrono::{DateTime, Utc};

pub mod cache;
pub mod error;
pub mod event;
pub mod event_bus;
pub mod model;
pub mod ports;
pub mod topic;

/// Injected environment dependencies.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```ignore
    /// // Test - fixed time for deterministic tests
    /// struct FixedClock { time: DateTime<Utc> }
    /// impl Clock for FixedClock {
    ///     fn now(&self) -> DateTime<Utc> {
    ///         self.time
    ///     }
    /// }
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall-clock time.
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
