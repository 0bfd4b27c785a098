//! Client-visible error responses.
//!
//! # Responsibilities
//! - Map request validation, upstream and transform failures to status codes
//! - Render a short plain-text reason
//!
//! # Design Decisions
//! - Upstream timeouts result in 504 Gateway Timeout, other transport faults in 502
//! - Error details stay in the logs; clients get a fixed message
//! - Cache failures never reach this type

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::proxy::fetcher::FetchError;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Missing 'url' query parameter")]
    MissingTarget,

    #[error("Invalid 'url' query parameter")]
    InvalidTarget,

    #[error("Invalid 'referer' query parameter")]
    InvalidReferer,

    #[error("Upstream server timed out")]
    UpstreamTimeout,

    #[error("Failed to fetch content from upstream server")]
    Upstream,

    #[error("Error transforming M3U8 content")]
    Transform(#[source] std::io::Error),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MissingTarget | ProxyError::InvalidTarget | ProxyError::InvalidReferer => {
                StatusCode::BAD_REQUEST
            }
            ProxyError::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::Upstream => StatusCode::BAD_GATEWAY,
            ProxyError::Transform(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Metrics label.
    pub fn outcome(&self) -> &'static str {
        match self {
            ProxyError::MissingTarget | ProxyError::InvalidTarget | ProxyError::InvalidReferer => {
                "bad_request"
            }
            ProxyError::UpstreamTimeout => "upstream_timeout",
            ProxyError::Upstream => "upstream_error",
            ProxyError::Transform(_) => "transform_error",
        }
    }
}

impl From<FetchError> for ProxyError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::Timeout(_) => ProxyError::UpstreamTimeout,
            FetchError::Transport(_) => ProxyError::Upstream,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}
