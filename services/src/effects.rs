//! Best-effort side effects shared by the services.
//!
//! A committed write is never undone because a side effect failed. Publish
//! failures and cache failures are logged at `warn`, counted, and swallowed;
//! a failed cache read is a miss.

use recsys_core::cache::{self, Cache};
use recsys_core::event::DomainEvent;
use recsys_core::event_bus::{EventBus, publish_event};
use recsys_core::topic::Topic;
use recsys_runtime::metrics::{CacheMetrics, PublishMetrics};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

/// Publish `event`, logging instead of failing.
pub(crate) async fn publish(bus: &dyn EventBus, topic: Topic, event: &DomainEvent) {
    match publish_event(bus, topic, event).await {
        Ok(()) => debug!(topic = %topic, kind = event.kind(), "Event published"),
        Err(e) => {
            warn!(topic = %topic, kind = event.kind(), error = %e, "Failed to publish event");
            PublishMetrics::record_failure(topic.as_str());
        }
    }
}

/// Read a JSON entry. Errors and undecodable entries count as a miss.
pub(crate) async fn cached<T: DeserializeOwned>(
    cache: &dyn Cache,
    family: &'static str,
    key: &str,
) -> Option<T> {
    match cache::get_json(cache, key).await {
        Ok(Some(value)) => {
            CacheMetrics::record_hit(family);
            debug!(key, "Cache hit");
            Some(value)
        }
        Ok(None) => {
            CacheMetrics::record_miss(family);
            debug!(key, "Cache miss");
            None
        }
        Err(e) => {
            CacheMetrics::record_error(family);
            warn!(key, error = %e, "Cache read failed, falling back to store");
            None
        }
    }
}

/// Populate an entry.
pub(crate) async fn fill<T: Serialize + Sync>(
    cache: &dyn Cache,
    key: &str,
    value: &T,
    ttl: Duration,
) {
    if let Err(e) = cache::set_json(cache, key, value, ttl).await {
        warn!(key, error = %e, "Failed to populate cache");
    }
}

/// Drop an entry after the write it mirrors.
pub(crate) async fn invalidate(cache: &dyn Cache, key: &str) {
    match cache.delete(key).await {
        Ok(()) => debug!(key, "Cache entry invalidated"),
        Err(e) => warn!(key, error = %e, "Failed to invalidate cache entry"),
    }
}
