//! Outbound fetches to the origin.
//!
//! One pooled client is shared by every request task. The pool bounds idle
//! connections per host and expires idle connections; the client-wide
//! timeout bounds the whole exchange including the body read. There is no
//! retry: one failed attempt is final.

use std::time::{Duration, Instant};

use axum::body::Bytes;
use axum::http::{header, HeaderMap, StatusCode};
use thiserror::Error;
use url::Url;

use crate::config::UpstreamConfig;
use crate::observability::metrics;

/// Why an upstream fetch produced no response.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("upstream request timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    #[error("upstream request failed: {0}")]
    Transport(#[source] reqwest::Error),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout(e)
        } else {
            FetchError::Transport(e)
        }
    }
}

/// A fully buffered upstream response.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[derive(Debug, Clone)]
pub struct UpstreamFetcher {
    client: reqwest::Client,
    default_referer: String,
}

impl UpstreamFetcher {
    pub fn new(config: &UpstreamConfig, default_referer: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(Duration::from_secs(config.pool_idle_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            default_referer: default_referer.into(),
        })
    }

    /// GET `target`, presenting `referer` (or the default) as both `Referer`
    /// and `Origin`.
    pub async fn fetch(&self, target: &Url, referer: Option<&str>) -> Result<UpstreamResponse, FetchError> {
        let referer = referer.unwrap_or(&self.default_referer);
        let start = Instant::now();

        let response = self
            .client
            .get(target.clone())
            .header(header::ACCEPT, "*/*")
            .header(header::REFERER, referer)
            .header(header::ORIGIN, referer)
            .send()
            .await?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        metrics::record_upstream_fetch(status.as_u16(), start);
        tracing::debug!(
            target_url = %target,
            status = status.as_u16(),
            bytes = body.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Fetched upstream"
        );

        Ok(UpstreamResponse {
            status,
            headers,
            body,
        })
    }
}
