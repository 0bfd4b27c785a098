//! Response cache subsystem.
//!
//! # Data Flow
//! ```text
//! Proxy handler
//!     → store.rs read(key)          → backend GET → entry.rs decode → hit / miss
//!     → store.rs write_once(key)    → single_flight.rs (one writer per key)
//!                                   → backend EXISTS → entry.rs encode → backend SET EX
//!
//! Backends:
//!     memory.rs  (in-process DashMap with expiry)
//!     redis.rs   (shared Redis, feature "redis")
//! ```
//!
//! # Design Decisions
//! - Caching is an optimization, never a correctness dependency: every
//!   backend error degrades to a miss or a skipped write
//! - Entries are immutable and expire by TTL only
//! - Only cache writes are deduplicated, not upstream fetches

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub mod entry;
pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;
pub mod single_flight;
pub mod store;

pub use entry::{CacheKey, CachedEntry};
pub use memory::MemoryBackend;
pub use single_flight::SingleFlight;
pub use store::{CacheStore, WriteOutcome};

/// Lifetime of every cache entry.
pub const CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Errors raised by cache backends and entry decoding.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache entry is malformed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("cache entry is invalid: {0}")]
    InvalidEntry(String),

    #[error("cache backend error: {0}")]
    Backend(String),

    #[cfg(feature = "redis")]
    #[error("redis error: {0}")]
    Redis(#[from] ::redis::RedisError),
}

/// Raw key-value store behind the cache.
///
/// Implementations only move bytes; encoding and write deduplication live in
/// [`CacheStore`].
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Fetch the raw value for `key`, `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Whether `key` currently holds a live value.
    async fn exists(&self, key: &str) -> Result<bool, CacheError>;

    /// Store `value` under `key`, expiring after `ttl`.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;

    /// Short backend name for logs and metrics.
    fn name(&self) -> &'static str;
}
