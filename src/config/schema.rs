//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the HLS proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Proxy endpoint settings (route path, referer, playlist rewriting).
    pub proxy: ProxyRouteConfig,

    /// Outbound client settings.
    pub upstream: UpstreamConfig,

    /// Response cache settings.
    pub cache: CacheConfig,

    /// CORS settings.
    pub cors: CorsConfig,

    /// Static Cache-Control response header.
    pub cache_control: CacheControlConfig,

    /// Server-side timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:4040").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:4040".to_string(),
        }
    }
}

/// Settings for the proxy endpoint itself.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyRouteConfig {
    /// Route path the proxy handler is mounted on. Rewritten playlist lines
    /// point back at this path.
    pub path: String,

    /// Referer/Origin sent upstream when the client does not supply one.
    pub default_referer: String,

    /// Extensions (other than `.m3u8`/`.ts`) treated as static assets.
    pub static_extensions: Vec<String>,
}

impl Default for ProxyRouteConfig {
    fn default() -> Self {
        Self {
            path: "/m3u8-proxy".to_string(),
            default_referer: "https://megacloud.blog/".to_string(),
            static_extensions: default_static_extensions(),
        }
    }
}

pub fn default_static_extensions() -> Vec<String> {
    [".png", ".jpg", ".webp", ".ico", ".html", ".js", ".css", ".txt"]
        .iter()
        .map(|ext| ext.to_string())
        .collect()
}

/// Outbound HTTP client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Overall upstream request timeout (connect + headers + body) in seconds.
    pub request_timeout_secs: u64,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Maximum idle connections kept per upstream host.
    pub pool_max_idle_per_host: usize,

    /// Idle pooled connections are closed after this many seconds.
    pub pool_idle_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            pool_max_idle_per_host: 10,
            pool_idle_timeout_secs: 90,
        }
    }
}

/// Which store backs the response cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackendKind {
    /// In-process map, lost on restart.
    Memory,
    /// Shared Redis instance.
    Redis,
    /// Caching disabled.
    None,
}

/// Response cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackendKind,

    /// Redis address, either `host:port` or a full `redis://` URL.
    pub redis_url: String,

    pub redis_password: String,

    pub redis_db: i64,

    /// Upper bound on entries held by the memory backend.
    pub memory_max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackendKind::Memory,
            redis_url: String::new(),
            redis_password: String::new(),
            redis_db: 0,
            memory_max_entries: 10_000,
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Comma separated list of allowed domains, or `*`.
    pub domains: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            domains: "*".to_string(),
        }
    }
}

/// Static `Cache-Control` header attached to successful responses.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheControlConfig {
    pub enabled: bool,
    pub max_age_secs: u64,
    pub public: bool,
    pub must_revalidate: bool,
}

impl Default for CacheControlConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_age_secs: 3600,
            public: true,
            must_revalidate: true,
        }
    }
}

/// Timeout configuration for the inbound side.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 60 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
