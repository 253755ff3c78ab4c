//! Side cache in front of the repositories.
//!
//! The cache is advisory. Reads populate it on miss (read-through) and writes
//! delete affected keys (write-side invalidation); nothing ever updates an entry
//! in place. A miss and a cache failure are both treated as a cold start by the
//! services.
//!
//! # Keys
//!
//! | key | value | default TTL |
//! |-----|-------|-------------|
//! | `user:<id>` | JSON [`User`](crate::model::User) | 1h |
//! | `recommendations:user:<id>` | JSON array of product ids | 1h |

use crate::model::UserId;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;

/// Errors from cache operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Could not reach the cache.
    #[error("Cache connection failed: {0}")]
    ConnectionFailed(String),

    /// The cache rejected or failed a command.
    #[error("Cache command '{command}' failed: {reason}")]
    CommandFailed {
        /// Command name (GET, SET, DEL)
        command: &'static str,
        /// Error message
        reason: String,
    },

    /// Value could not be (de)serialized.
    #[error("Cache value serialization failed: {0}")]
    Serialization(String),
}

/// TTL-bounded key/value store.
///
/// Uses explicit `Pin<Box<dyn Future>>` returns so services can hold an
/// `Arc<dyn Cache>`.
pub trait Cache: Send + Sync {
    /// Read a value. `Ok(None)` is a miss.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the cache is unreachable.
    fn get(
        &self,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<String>, CacheError>> + Send + '_>>;

    /// Store a value with a time to live.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the cache is unreachable.
    fn set(
        &self,
        key: &str,
        value: String,
        ttl: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<(), CacheError>> + Send + '_>>;

    /// Remove a key. Removing a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the cache is unreachable.
    fn delete(&self, key: &str) -> Pin<Box<dyn Future<Output = Result<(), CacheError>> + Send + '_>>;
}

/// Read and decode a JSON value.
///
/// An entry that no longer decodes is reported as [`CacheError::Serialization`]
/// so callers can treat it as a miss.
///
/// # Errors
///
/// Returns [`CacheError`] on cache failure or undecodable entry.
pub async fn get_json<T: DeserializeOwned>(
    cache: &dyn Cache,
    key: &str,
) -> Result<Option<T>, CacheError> {
    match cache.get(key).await? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| CacheError::Serialization(e.to_string())),
        None => Ok(None),
    }
}

/// Encode and store a JSON value.
///
/// # Errors
///
/// Returns [`CacheError`] on cache failure or if the value cannot be encoded.
pub async fn set_json<T: Serialize + Sync>(
    cache: &dyn Cache,
    key: &str,
    value: &T,
    ttl: Duration,
) -> Result<(), CacheError> {
    let raw = serde_json::to_string(value).map_err(|e| CacheError::Serialization(e.to_string()))?;
    cache.set(key, raw, ttl).await
}

/// Cache key builders.
pub mod keys {
    use super::UserId;

    /// `user:<id>`
    #[must_use]
    pub fn user(id: UserId) -> String {
        format!("user:{id}")
    }

    /// `recommendations:user:<id>`
    #[must_use]
    pub fn recommendations(user_id: UserId) -> String {
        format!("recommendations:user:{user_id}")
    }
}
