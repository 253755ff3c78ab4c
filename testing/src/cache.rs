//! In-memory cache with expiry and failure injection.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)]

use recsys_core::cache::{Cache, CacheError};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

struct Entry {
    value: String,
    ttl: Duration,
    expires_at: Instant,
}

/// In-memory [`Cache`] for tests.
///
/// With [`set_failing(true)`](Self::set_failing) every call returns
/// [`CacheError::ConnectionFailed`], which lets tests check that services fall
/// back to the repositories.
#[derive(Clone, Default)]
pub struct InMemoryCache {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
    failing: Arc<AtomicBool>,
}

impl InMemoryCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Whether a live entry exists for `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .lock()
            .unwrap()
            .get(key)
            .is_some_and(|entry| entry.expires_at > Instant::now())
    }

    /// Raw value of a live entry.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap()
            .get(key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.value.clone())
    }

    /// TTL the entry was stored with.
    #[must_use]
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        self.entries.lock().unwrap().get(key).map(|entry| entry.ttl)
    }

    /// Store a value directly, bypassing failure injection.
    pub fn seed(&self, key: &str, value: impl Into<String>, ttl: Duration) {
        self.entries.lock().unwrap().insert(
            key.to_string(),
            Entry {
                value: value.into(),
                ttl,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    fn check(&self, command: &'static str) -> Result<(), CacheError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(CacheError::ConnectionFailed(format!(
                "injected failure on {command}"
            )))
        } else {
            Ok(())
        }
    }
}

impl Cache for InMemoryCache {
    fn get(
        &self,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<String>, CacheError>> + Send + '_>> {
        let result = self.check("GET").map(|()| self.raw(key));
        Box::pin(async move { result })
    }

    fn set(
        &self,
        key: &str,
        value: String,
        ttl: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<(), CacheError>> + Send + '_>> {
        let result = self.check("SET").map(|()| self.seed(key, value, ttl));
        Box::pin(async move { result })
    }

    fn delete(&self, key: &str) -> Pin<Box<dyn Future<Output = Result<(), CacheError>> + Send + '_>> {
        let result = self.check("DEL").map(|()| {
            self.entries.lock().unwrap().remove(key);
        });
        Box::pin(async move { result })
    }
}
