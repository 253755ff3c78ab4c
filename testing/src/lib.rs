//! # Recsys Testing
//!
//! Testing utilities for the recommendation platform.
//!
//! This crate provides:
//! - [`InMemoryEventBus`]: topic logs with replay, publish-failure injection
//! - [`InMemoryCache`]: TTL map with failure injection
//! - [`FixedClock`]: deterministic time
//! - [`helpers`]: event builders and polling for asynchronous consumers
//! - [`properties`]: proptest strategies for bus payloads
//!
//! ## Example
//!
//! ```ignore
//! use recsys_testing::{InMemoryEventBus, helpers};
//!
//! #[tokio::test]
//! async fn analytics_counts_likes() {
//!     let bus = Arc::new(InMemoryEventBus::new());
//!     let handles = consumer.spawn(&shutdown);
//!
//!     publish_event(bus.as_ref(), Topic::UserUpdates, &helpers::liked(1, 2)).await?;
//!
//!     assert!(helpers::eventually(Duration::from_secs(1), || stats.processed() == 1).await);
//! }
//! ```

use chrono::{DateTime, Utc};
use recsys_core::environment::Clock;

pub mod bus;
pub mod cache;

/// Mock implementations for testing.
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// # Example
    ///
    /// ```
    /// use recsys_testing::mocks::FixedClock;
    /// use recsys_core::environment::Clock;
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
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(DateTime::<Utc>::from_timestamp(1_735_689_600, 0).unwrap_or_default())
    }
}

/// Test helpers and utilities.
pub mod helpers {
    use recsys_core::event::DomainEvent;
    use recsys_core::model::{ProductId, UserId};
    use std::time::Duration;

    /// `user_liked` without the stored record.
    #[must_use]
    pub const fn liked(user_id: UserId, product_id: ProductId) -> DomainEvent {
        DomainEvent::UserLiked {
            user_id,
            product_id,
            like: None,
        }
    }

    /// `user_disliked` without the stored record.
    #[must_use]
    pub const fn disliked(user_id: UserId, product_id: ProductId) -> DomainEvent {
        DomainEvent::UserDisliked {
            user_id,
            product_id,
            dislike: None,
        }
    }

    /// `user_purchased` without the stored record.
    #[must_use]
    pub const fn purchased(user_id: UserId, product_id: ProductId) -> DomainEvent {
        DomainEvent::UserPurchased {
            user_id,
            product_id,
            purchase: None,
        }
    }

    /// Poll `condition` every few milliseconds until it holds or `timeout`
    /// elapses. Returns whether it held.
    pub async fn eventually(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if condition() {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    /// Install a test subscriber honouring `RUST_LOG`. Safe to call repeatedly.
    pub fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use proptest::prelude::*;

    /// Arbitrary bytes, including invalid UTF-8.
    pub fn arbitrary_payload() -> impl Strategy<Value = Vec<u8>> {
        proptest::collection::vec(any::<u8>(), 0..256)
    }

    /// JSON objects with an `event` field of any string and random extra fields.
    pub fn arbitrary_envelope() -> impl Strategy<Value = Vec<u8>> {
        (
            "[a-z_]{0,24}",
            proptest::collection::vec(("[a-z_]{1,12}", any::<i64>()), 0..4),
        )
            .prop_map(|(kind, fields)| {
                let extra: String = fields
                    .iter()
                    .map(|(name, value)| format!(r#","{name}":{value}"#))
                    .collect();
                format!(r#"{{"event":"{kind}"{extra}}}"#).into_bytes()
            })
    }
}

pub use bus::InMemoryEventBus;
pub use cache::InMemoryCache;
pub use mocks::{FixedClock, test_clock};

#[cfg(test)]
mod tests {
    use super::*;
    use recsys_core::event::DomainEvent;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
        assert_eq!(clock.now().to_rfc3339(), "2025-01-01T00:00:00+00:00");
    }

    #[test]
    fn builders_produce_interactions() {
        assert!(helpers::liked(1, 2).interaction().is_some());
        assert!(matches!(
            helpers::purchased(1, 2),
            DomainEvent::UserPurchased { purchase: None, .. }
        ));
    }

    #[tokio::test]
    async fn eventually_times_out() {
        let held = helpers::eventually(std::time::Duration::from_millis(20), || false).await;
        assert!(!held);
    }
}
