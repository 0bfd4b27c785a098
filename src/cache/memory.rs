//! In-process cache backend.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::cache::{CacheBackend, CacheError};

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: Arc<Vec<u8>>,
    expires_at: Instant,
}

impl MemoryEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// A bounded, TTL-aware map shared by all request tasks.
///
/// The capacity check and the insert are separate map operations, so
/// concurrent writes to distinct keys can overshoot `max_entries` by up to
/// the number of concurrent writers. Writes to one key never race here:
/// `CacheStore` funnels them through a single flight.
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    inner: Arc<DashMap<String, MemoryEntry>>,
    max_entries: usize,
}

impl MemoryBackend {
    pub fn new(max_entries: usize) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            max_entries,
        }
    }

    /// Number of stored entries, expired ones included until swept.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.inner.len();
        self.inner.retain(|_, entry| entry.is_live(now));
        before.saturating_sub(self.inner.len())
    }

    fn live(&self, key: &str) -> Option<MemoryEntry> {
        let now = Instant::now();
        let entry = self.inner.get(key)?.value().clone();
        if entry.is_live(now) {
            Some(entry)
        } else {
            self.inner.remove_if(key, |_, e| !e.is_live(now));
            None
        }
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self.live(key).map(|entry| entry.value.as_ref().clone()))
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.live(key).is_some())
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        if self.inner.len() >= self.max_entries && !self.inner.contains_key(key) {
            let purged = self.purge_expired();
            tracing::debug!(purged, "Memory cache full, swept expired entries");
            if self.inner.len() >= self.max_entries {
                return Err(CacheError::Backend(format!(
                    "memory cache is full ({} entries)",
                    self.max_entries
                )));
            }
        }

        self.inner.insert(
            key.to_string(),
            MemoryEntry {
                value: Arc::new(value),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
