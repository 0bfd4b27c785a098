//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use crate::config::schema::{CacheBackendKind, ProxyConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// An environment variable that was set but could not be applied.
///
/// Returned instead of logged: configuration is loaded before the tracing
/// subscriber exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoredEnv {
    pub name: &'static str,
    pub value: String,
    pub reason: &'static str,
}

impl std::fmt::Display for IgnoredEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ignoring {}={:?}: {}", self.name, self.value, self.reason)
    }
}

/// Load configuration from an optional TOML file, apply environment
/// overrides, then validate. Also returns the overrides that were skipped.
pub fn load_config(path: Option<&Path>) -> Result<(ProxyConfig, Vec<IgnoredEnv>), ConfigError> {
    let mut config = match path {
        Some(path) => parse_file(path)?,
        None => ProxyConfig::default(),
    };

    let ignored = apply_env_overrides(&mut config, |name| std::env::var(name).ok());

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok((config, ignored))
}

fn parse_file(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Apply the environment variables understood by the deployment scripts.
///
/// `PORT` replaces the port of the bind address, `REDIS_URL` switches the
/// cache to the redis backend. Values that cannot be applied are left out
/// and reported back.
pub fn apply_env_overrides<F>(config: &mut ProxyConfig, lookup: F) -> Vec<IgnoredEnv>
where
    F: Fn(&str) -> Option<String>,
{
    let mut ignored = Vec::new();

    if let Some(port) = lookup("PORT").filter(|p| !p.is_empty()) {
        let host = config
            .listener
            .bind_address
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        config.listener.bind_address = format!("{}:{}", host, port);
    }

    if let Some(domains) = lookup("CORS_DOMAIN") {
        config.cors.domains = domains;
    }

    if let Some(url) = lookup("REDIS_URL").filter(|u| !u.is_empty()) {
        config.cache.redis_url = url;
        config.cache.backend = CacheBackendKind::Redis;
    }

    if let Some(password) = lookup("REDIS_PASSWORD") {
        config.cache.redis_password = password;
    }

    if let Some(db) = lookup("REDIS_DB") {
        match db.parse() {
            Ok(db) => config.cache.redis_db = db,
            Err(_) => ignored.push(IgnoredEnv {
                name: "REDIS_DB",
                value: db,
                reason: "not a number",
            }),
        }
    }

    ignored
}
