//! Redis-backed side cache.
//!
//! Implements the [`Cache`] trait from `recsys-core` over a redis
//! [`ConnectionManager`], which multiplexes one connection and reconnects on
//! failure. Every call clones the manager; clones share the connection.
//!
//! The manager is created on first use, not in [`RedisCache::new`], so a
//! service boots while Redis is down. Until a connection succeeds every call
//! returns [`CacheError::ConnectionFailed`] and the next call tries again.
//!
//! # Example
//!
//! ```no_run
//! use recsys_redis::RedisCache;
//! use recsys_core::cache::Cache;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let cache = RedisCache::new("redis://127.0.0.1:6379")?;
//! cache.set("user:1", "{}".to_string(), Duration::from_secs(3600)).await?;
//! # Ok(())
//! # }
//! ```

use recsys_core::cache::{Cache, CacheError};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

/// Upper bound on one connection attempt.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Redis cache with TTL-based expiration.
#[derive(Clone)]
pub struct RedisCache {
    client: Client,
    /// Connection manager, set by the first successful connect.
    conn_manager: Arc<OnceCell<ConnectionManager>>,
}

impl RedisCache {
    /// Create a cache for `redis_url` without connecting.
    ///
    /// # Arguments
    ///
    /// * `redis_url` - Redis connection URL (e.g., "redis://127.0.0.1:6379")
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::ConnectionFailed`] if the URL is invalid.
    pub fn new(redis_url: &str) -> Result<Self, CacheError> {
        let client = Client::open(redis_url).map_err(|e| {
            CacheError::ConnectionFailed(format!("Failed to create Redis client: {e}"))
        })?;

        Ok(Self {
            client,
            conn_manager: Arc::new(OnceCell::new()),
        })
    }

    /// Whether a connection has been established.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.conn_manager.initialized()
    }

    async fn connection(&self) -> Result<ConnectionManager, CacheError> {
        self.conn_manager
            .get_or_try_init(|| async {
                let manager = tokio::time::timeout(
                    CONNECT_TIMEOUT,
                    ConnectionManager::new(self.client.clone()),
                )
                .await
                .map_err(|_| {
                    CacheError::ConnectionFailed("Timed out connecting to Redis".to_string())
                })?
                .map_err(|e| {
                    CacheError::ConnectionFailed(format!(
                        "Failed to create Redis connection manager: {e}"
                    ))
                })?;
                tracing::info!("Redis cache connected");
                Ok(manager)
            })
            .await
            .cloned()
    }
}

fn command_failed(command: &'static str, error: &redis::RedisError) -> CacheError {
    CacheError::CommandFailed {
        command,
        reason: error.to_string(),
    }
}

impl Cache for RedisCache {
    fn get(
        &self,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<String>, CacheError>> + Send + '_>> {
        let key = key.to_string();

        Box::pin(async move {
            let mut conn = self.connection().await?;
            let value: Option<String> = conn
                .get(&key)
                .await
                .map_err(|e| command_failed("GET", &e))?;
            tracing::trace!(key = %key, hit = value.is_some(), "Cache lookup");
            Ok(value)
        })
    }

    fn set(
        &self,
        key: &str,
        value: String,
        ttl: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<(), CacheError>> + Send + '_>> {
        let key = key.to_string();
        // SETEX rejects a zero TTL
        let ttl_seconds = ttl.as_secs().max(1);

        Box::pin(async move {
            let mut conn = self.connection().await?;
            conn.set_ex::<_, _, ()>(&key, value, ttl_seconds)
                .await
                .map_err(|e| command_failed("SETEX", &e))
        })
    }

    fn delete(&self, key: &str) -> Pin<Box<dyn Future<Output = Result<(), CacheError>> + Send + '_>> {
        let key = key.to_string();

        Box::pin(async move {
            let mut conn = self.connection().await?;
            conn.del::<_, ()>(&key)
                .await
                .map_err(|e| command_failed("DEL", &e))
        })
    }
}
