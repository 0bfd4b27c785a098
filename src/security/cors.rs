//! Cross-origin policy for browser players.
//!
//! `domains` is a comma-separated list. Entries with an explicit scheme are
//! used as-is; bare hosts are allowed over both http and https. `*` (alone
//! or anywhere in the list) allows every origin.

use axum::http::{HeaderValue, Method};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};

use crate::config::schema::CorsConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigins {
    Any,
    List(Vec<String>),
}

pub fn allowed_origins(domains: &str) -> AllowedOrigins {
    let mut origins = Vec::new();
    for domain in domains.split(',').map(str::trim).filter(|d| !d.is_empty()) {
        if domain == "*" {
            return AllowedOrigins::Any;
        }
        let domain = domain.trim_end_matches('/');
        if domain.starts_with("http://") || domain.starts_with("https://") {
            origins.push(domain.to_string());
        } else {
            origins.push(format!("http://{domain}"));
            origins.push(format!("https://{domain}"));
        }
    }

    if origins.is_empty() {
        AllowedOrigins::Any
    } else {
        AllowedOrigins::List(origins)
    }
}

pub fn layer(config: &CorsConfig) -> CorsLayer {
    let allow_origin = match allowed_origins(&config.domains) {
        AllowedOrigins::Any => AllowOrigin::any(),
        AllowedOrigins::List(origins) => {
            let values: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|origin| match HeaderValue::from_str(origin) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        tracing::warn!(origin = %origin, "Skipping invalid CORS origin");
                        None
                    }
                })
                .collect();
            AllowOrigin::list(values)
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(AllowHeaders::mirror_request())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard() {
        assert_eq!(allowed_origins("*"), AllowedOrigins::Any);
        assert_eq!(allowed_origins("example.com,*"), AllowedOrigins::Any);
        assert_eq!(allowed_origins(""), AllowedOrigins::Any);
    }

    #[test]
    fn test_bare_domain_gets_both_schemes() {
        assert_eq!(
            allowed_origins("player.example/"),
            AllowedOrigins::List(vec![
                "http://player.example".to_string(),
                "https://player.example".to_string(),
            ])
        );
    }

    #[test]
    fn test_explicit_scheme_kept() {
        assert_eq!(
            allowed_origins("https://a.example/, b.example"),
            AllowedOrigins::List(vec![
                "https://a.example".to_string(),
                "http://b.example".to_string(),
                "https://b.example".to_string(),
            ])
        );
    }
}
