//! Cache keys and the stored representation of a proxied response.

use std::collections::BTreeMap;
use std::fmt;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::Response;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::cache::CacheError;

const KEY_PREFIX: &str = "m3u8proxy_cache:";

/// Namespaced key derived from the raw target URL alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// The target is embedded verbatim, not re-encoded.
    pub fn for_target(target: &str) -> Self {
        Self(format!("{KEY_PREFIX}{target}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A complete response as it was sent to the client.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedEntry {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// On-store layout. Header names are canonical MIME keys and the body is
/// standard base64; other writers sharing the keyspace use the same shape.
#[derive(Serialize, Deserialize)]
struct WireEntry {
    status_code: u16,
    #[serde(default)]
    headers: Option<BTreeMap<String, Vec<String>>>,
    #[serde(default)]
    body: Option<String>,
}

impl CachedEntry {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Serialize for the backing store.
    pub fn encode(&self) -> Result<Vec<u8>, CacheError> {
        let mut headers: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, value) in self.headers.iter() {
            let value = value.to_str().map_err(|_| {
                CacheError::InvalidEntry(format!("header {} is not visible ASCII", name))
            })?;
            headers
                .entry(canonical_header_name(name.as_str()))
                .or_default()
                .push(value.to_string());
        }

        let wire = WireEntry {
            status_code: self.status.as_u16(),
            headers: Some(headers),
            body: Some(STANDARD.encode(&self.body)),
        };
        Ok(serde_json::to_vec(&wire)?)
    }

    /// Parse a stored value. Anything that cannot be replayed exactly is an
    /// error so the caller can fall back to the origin.
    pub fn decode(raw: &[u8]) -> Result<Self, CacheError> {
        let wire: WireEntry = serde_json::from_slice(raw)?;

        let status = StatusCode::from_u16(wire.status_code)
            .map_err(|_| CacheError::InvalidEntry(format!("status code {}", wire.status_code)))?;

        let mut headers = HeaderMap::new();
        for (name, values) in wire.headers.unwrap_or_default() {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| CacheError::InvalidEntry(format!("header name {:?}", name)))?;
            for value in values {
                let header_value = HeaderValue::from_str(&value).map_err(|_| {
                    CacheError::InvalidEntry(format!("value of header {:?}", name))
                })?;
                headers.append(header_name.clone(), header_value);
            }
        }

        let body = match wire.body {
            Some(encoded) => STANDARD
                .decode(encoded)
                .map_err(|e| CacheError::InvalidEntry(format!("body: {}", e)))?,
            None => Vec::new(),
        };

        Ok(Self {
            status,
            headers,
            body: Bytes::from(body),
        })
    }

    /// Replay the entry verbatim.
    pub fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// `content-type` → `Content-Type`, `etag` → `Etag`.
fn canonical_header_name(name: &str) -> String {
    let mut upper = true;
    name.chars()
        .map(|c| {
            let mapped = if upper {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            };
            upper = c == '-';
            mapped
        })
        .collect()
}
