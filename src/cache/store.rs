//! Cache read path and the deduplicated write path.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheBackend, CacheKey, CachedEntry, SingleFlight, CACHE_TTL};
use crate::observability::metrics;

/// Result of a [`CacheStore::write_once`] call, shared by every caller that
/// joined the same flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// This flight stored the entry.
    Written,
    /// The key was already populated; nothing was written.
    AlreadyCached,
    /// Encoding or the backend failed; the error was logged.
    Failed,
}

impl WriteOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            WriteOutcome::Written => "written",
            WriteOutcome::AlreadyCached => "already_cached",
            WriteOutcome::Failed => "failed",
        }
    }
}

/// Response cache handed to the proxy handler.
#[derive(Clone)]
pub struct CacheStore {
    backend: Arc<dyn CacheBackend>,
    flights: Arc<SingleFlight<CacheKey, WriteOutcome>>,
    ttl: Duration,
}

impl CacheStore {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self::with_ttl(backend, CACHE_TTL)
    }

    pub fn with_ttl(backend: Arc<dyn CacheBackend>, ttl: Duration) -> Self {
        Self {
            backend,
            flights: Arc::new(SingleFlight::new()),
            ttl,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Look up `key`. Every failure is reported as a miss.
    pub async fn read(&self, key: &CacheKey) -> Option<CachedEntry> {
        match self.backend.get(key.as_str()).await {
            Ok(Some(raw)) => match CachedEntry::decode(&raw) {
                Ok(entry) => {
                    metrics::record_cache_lookup("hit");
                    Some(entry)
                }
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Discarding unreadable cache entry");
                    metrics::record_cache_lookup("invalid");
                    None
                }
            },
            Ok(None) => {
                metrics::record_cache_lookup("miss");
                None
            }
            Err(e) => {
                tracing::warn!(key = %key, backend = self.backend.name(), error = %e, "Cache read failed");
                metrics::record_cache_lookup("error");
                None
            }
        }
    }

    /// Store `entry` unless another write for `key` is in flight or the key
    /// is already populated.
    pub async fn write_once(&self, key: &CacheKey, entry: CachedEntry) -> WriteOutcome {
        let backend = self.backend.clone();
        let ttl = self.ttl;
        let flight_key = key.clone();

        let (outcome, leader) = self
            .flights
            .run(key.clone(), move || async move {
                write_if_absent(backend.as_ref(), &flight_key, &entry, ttl).await
            })
            .await;

        if !leader {
            tracing::debug!(key = %key, outcome = outcome.as_str(), "Joined in-flight cache write");
        }
        metrics::record_cache_write(outcome.as_str());
        outcome
    }
}

async fn write_if_absent(
    backend: &dyn CacheBackend,
    key: &CacheKey,
    entry: &CachedEntry,
    ttl: Duration,
) -> WriteOutcome {
    match backend.exists(key.as_str()).await {
        Ok(true) => return WriteOutcome::AlreadyCached,
        Ok(false) => {}
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Cache recheck failed, writing anyway");
        }
    }

    let raw = match entry.encode() {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Response not cacheable");
            return WriteOutcome::Failed;
        }
    };

    match backend.set(key.as_str(), raw, ttl).await {
        Ok(()) => {
            tracing::debug!(key = %key, ttl_secs = ttl.as_secs(), "Cached response");
            WriteOutcome::Written
        }
        Err(e) => {
            tracing::warn!(key = %key, backend = backend.name(), error = %e, "Cache write failed");
            WriteOutcome::Failed
        }
    }
}
