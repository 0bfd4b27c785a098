//! Startup orchestration.
//!
//! # Responsibilities
//! - Pick and connect the cache backend
//! - Fall back to running uncached when Redis is unreachable
//!
//! # Design Decisions
//! - The Redis connect attempt is bounded so a dead server cannot stall boot
//! - Subsystems initialize in order, not concurrently

use std::sync::Arc;
#[cfg(feature = "redis")]
use std::time::Duration;

use crate::cache::{CacheStore, MemoryBackend};
use crate::config::{CacheBackendKind, CacheConfig};

#[cfg(feature = "redis")]
const REDIS_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Build the response cache selected by `config`, or `None` to run uncached.
pub async fn build_cache_store(config: &CacheConfig) -> Option<CacheStore> {
    match config.backend {
        CacheBackendKind::None => {
            tracing::info!("Response cache disabled");
            None
        }
        CacheBackendKind::Memory => {
            tracing::info!(max_entries = config.memory_max_entries, "Using in-memory response cache");
            Some(CacheStore::new(Arc::new(MemoryBackend::new(config.memory_max_entries))))
        }
        CacheBackendKind::Redis => connect_redis(config).await,
    }
}

#[cfg(feature = "redis")]
async fn connect_redis(config: &CacheConfig) -> Option<CacheStore> {
    use crate::cache::redis::RedisBackend;

    match tokio::time::timeout(REDIS_CONNECT_TIMEOUT, RedisBackend::connect(config)).await {
        Ok(Ok(backend)) => {
            tracing::info!(db = config.redis_db, "Connected to Redis response cache");
            Some(CacheStore::new(Arc::new(backend)))
        }
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Redis unavailable, continuing without cache");
            None
        }
        Err(_) => {
            tracing::warn!(
                timeout_secs = REDIS_CONNECT_TIMEOUT.as_secs(),
                "Redis connect timed out, continuing without cache"
            );
            None
        }
    }
}

#[cfg(not(feature = "redis"))]
async fn connect_redis(_config: &CacheConfig) -> Option<CacheStore> {
    tracing::warn!("Built without the `redis` feature, continuing without cache");
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_none_backend() {
        let config = CacheConfig {
            backend: CacheBackendKind::None,
            ..Default::default()
        };
        assert!(build_cache_store(&config).await.is_none());
    }

    #[tokio::test]
    async fn test_memory_backend() {
        let store = build_cache_store(&CacheConfig::default()).await.unwrap();
        assert_eq!(store.backend_name(), "memory");
    }

    #[tokio::test]
    async fn test_unreachable_redis_runs_uncached() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = CacheConfig {
            backend: CacheBackendKind::Redis,
            redis_url: addr.to_string(),
            ..Default::default()
        };
        assert!(build_cache_store(&config).await.is_none());
    }
}
