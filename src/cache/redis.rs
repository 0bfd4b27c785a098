//! Redis cache backend.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::cache::{CacheBackend, CacheError};
use crate::config::CacheConfig;

/// Shared Redis store reached through a reconnecting multiplexed connection.
#[derive(Clone)]
pub struct RedisBackend {
    conn: ConnectionManager,
}

impl RedisBackend {
    /// Connect and verify the server answers `PING`.
    pub async fn connect(config: &CacheConfig) -> Result<Self, CacheError> {
        let url = connection_url(&config.redis_url, &config.redis_password, config.redis_db);
        let client = redis::Client::open(url)?;
        let mut conn = client.get_connection_manager().await?;

        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        tracing::debug!(reply = %pong, "Redis answered ping");

        Ok(Self { conn })
    }
}

/// Accept either a bare `host:port` address or a full `redis://` URL.
fn connection_url(address: &str, password: &str, db: i64) -> String {
    if address.starts_with("redis://") || address.starts_with("rediss://") {
        return address.to_string();
    }
    let auth = if password.is_empty() {
        String::new()
    } else {
        format!(":{}@", urlencoding::encode(password))
    };
    format!("redis://{}{}/{}", auth, address, db)
}

#[async_trait]
impl CacheBackend for RedisBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn.get(key).await?;
        Ok(value)
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        let mut conn = self.conn.clone();
        let exists: bool = conn.exists(key).await?;
        Ok(exists)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(key, value, ttl.as_secs().max(1)).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_url() {
        assert_eq!(connection_url("localhost:6379", "", 0), "redis://localhost:6379/0");
        assert_eq!(
            connection_url("cache:6380", "p@ss word", 2),
            "redis://:p%40ss%20word@cache:6380/2"
        );
        assert_eq!(
            connection_url("rediss://user:pw@cache:6380/1", "ignored", 5),
            "rediss://user:pw@cache:6380/1"
        );
    }
}
