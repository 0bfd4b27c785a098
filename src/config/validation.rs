//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check that the proxy route does not shadow the health route
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{CacheBackendKind, ProxyConfig};

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("proxy.path must start with '/' and must not be '/' or '/health', got {0:?}")]
    InvalidProxyPath(String),

    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),

    #[error("proxy.static_extensions entry {0:?} must start with '.' and be lowercase")]
    InvalidExtension(String),

    #[error(
        "timeouts.request_secs ({request_secs}) must exceed upstream.request_timeout_secs ({upstream_secs})"
    )]
    TimeoutOrder { request_secs: u64, upstream_secs: u64 },

    #[error("cache.redis_url is required when cache.backend is \"redis\"")]
    MissingRedisUrl,
}

pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    let path = config.proxy.path.as_str();
    if !path.starts_with('/') || path == "/" || path == "/health" {
        errors.push(ValidationError::InvalidProxyPath(path.to_string()));
    }

    for ext in &config.proxy.static_extensions {
        // Targets are matched by their lowercased path.
        if !ext.starts_with('.') || ext.len() < 2 || ext.chars().any(|c| c.is_ascii_uppercase()) {
            errors.push(ValidationError::InvalidExtension(ext.clone()));
        }
    }

    if config.upstream.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroValue("upstream.request_timeout_secs"));
    }
    if config.upstream.connect_timeout_secs == 0 {
        errors.push(ValidationError::ZeroValue("upstream.connect_timeout_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroValue("timeouts.request_secs"));
    }
    // Otherwise the server-side timeout answers before the upstream one
    // can turn into a 504.
    if config.upstream.request_timeout_secs > 0
        && config.timeouts.request_secs > 0
        && config.timeouts.request_secs <= config.upstream.request_timeout_secs
    {
        errors.push(ValidationError::TimeoutOrder {
            request_secs: config.timeouts.request_secs,
            upstream_secs: config.upstream.request_timeout_secs,
        });
    }

    match config.cache.backend {
        CacheBackendKind::Redis if config.cache.redis_url.is_empty() => {
            errors.push(ValidationError::MissingRedisUrl);
        }
        CacheBackendKind::Memory if config.cache.memory_max_entries == 0 => {
            errors.push(ValidationError::ZeroValue("cache.memory_max_entries"));
        }
        _ => {}
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
