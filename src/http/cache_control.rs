//! `Cache-Control` on successful responses.
//!
//! Every response with a status below 400 gets the configured directive,
//! overriding whatever the origin sent. Error responses are left alone so
//! downstream caches do not pin failures.

use axum::http::{header, HeaderValue, Response};
use tower_http::set_header::{MakeHeaderValue, SetResponseHeaderLayer};

use crate::config::CacheControlConfig;

#[derive(Debug, Clone)]
pub struct CacheControlHeader {
    value: HeaderValue,
}

impl CacheControlHeader {
    /// `None` when the header is disabled or the directive is not a valid
    /// header value.
    pub fn from_config(config: &CacheControlConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        let value = header_value(config);
        match HeaderValue::from_str(&value) {
            Ok(value) => Some(Self { value }),
            Err(e) => {
                tracing::warn!(directive = %value, error = %e, "Ignoring invalid Cache-Control directive");
                None
            }
        }
    }

    pub fn layer(self) -> SetResponseHeaderLayer<Self> {
        SetResponseHeaderLayer::overriding(header::CACHE_CONTROL, self)
    }
}

impl<B> MakeHeaderValue<Response<B>> for CacheControlHeader {
    fn make_header_value(&mut self, response: &Response<B>) -> Option<HeaderValue> {
        (response.status().as_u16() < 400).then(|| self.value.clone())
    }
}

/// Render the directive, e.g. `public, max-age=3600, must-revalidate`.
pub fn header_value(config: &CacheControlConfig) -> String {
    let mut directives = Vec::with_capacity(3);
    if config.public {
        directives.push("public".to_string());
    }
    directives.push(format!("max-age={}", config.max_age_secs));
    if config.must_revalidate {
        directives.push("must-revalidate".to_string());
    }
    directives.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn response(status: StatusCode) -> Response<()> {
        let mut response = Response::new(());
        *response.status_mut() = status;
        response
    }

    #[test]
    fn test_default_directive() {
        assert_eq!(
            header_value(&CacheControlConfig::default()),
            "public, max-age=3600, must-revalidate"
        );
    }

    #[test]
    fn test_private_directive() {
        let config = CacheControlConfig {
            public: false,
            must_revalidate: false,
            max_age_secs: 60,
            ..Default::default()
        };
        assert_eq!(header_value(&config), "max-age=60");
    }

    #[test]
    fn test_disabled() {
        let config = CacheControlConfig {
            enabled: false,
            ..Default::default()
        };
        assert!(CacheControlHeader::from_config(&config).is_none());
    }

    #[test]
    fn test_only_below_400() {
        let mut make = CacheControlHeader::from_config(&CacheControlConfig::default()).unwrap();
        assert!(make.make_header_value(&response(StatusCode::OK)).is_some());
        assert!(make.make_header_value(&response(StatusCode::PARTIAL_CONTENT)).is_some());
        assert!(make.make_header_value(&response(StatusCode::FOUND)).is_some());
        assert!(make.make_header_value(&response(StatusCode::BAD_REQUEST)).is_none());
        assert!(make.make_header_value(&response(StatusCode::BAD_GATEWAY)).is_none());
    }
}
