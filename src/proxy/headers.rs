//! Response header allow-list.
//!
//! Only a fixed set of upstream headers reaches the client; everything else
//! (cookies, server banners, CORS headers of the origin) is dropped. Cache
//! validators are forwarded only for successful full or partial content.

use axum::http::{header, HeaderMap, HeaderName, StatusCode};

static ALWAYS_FORWARDED: [HeaderName; 4] = [
    header::CONTENT_TYPE,
    header::CONTENT_DISPOSITION,
    header::ACCEPT_RANGES,
    header::CONTENT_RANGE,
];

static VALIDATORS: [HeaderName; 2] = [header::ETAG, header::LAST_MODIFIED];

/// Build the outbound header set for an upstream response.
pub fn select_headers(upstream: &HeaderMap, status: StatusCode) -> HeaderMap {
    let forwards_validators = status == StatusCode::OK || status == StatusCode::PARTIAL_CONTENT;

    let mut outbound = HeaderMap::new();
    let allowed = ALWAYS_FORWARDED
        .iter()
        .chain(VALIDATORS.iter().filter(|_| forwards_validators));

    for name in allowed {
        if let Some(value) = upstream.get(name) {
            if !value.is_empty() {
                outbound.insert(name.clone(), value.clone());
            }
        }
    }
    outbound
}
