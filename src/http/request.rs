//! Request parsing and validation.
//!
//! # Responsibilities
//! - Extract the `url` and `referer` query parameters
//! - Require an absolute http(s) target
//! - Decode the referer and make sure it can be sent as a header
//!
//! # Design Decisions
//! - Validation happens before the cache is consulted
//! - The raw target string is kept alongside the parsed URL; the cache key
//!   and the playlist base both use it unmodified

use axum::http::HeaderValue;
use serde::Deserialize;
use url::Url;

use crate::http::response::ProxyError;

/// Query string of the proxy endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ProxyParams {
    pub url: Option<String>,
    pub referer: Option<String>,
}

/// A validated proxy request.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub target: Url,
    pub target_raw: String,
    pub referer: Option<String>,
}

impl ProxyRequest {
    pub fn from_params(params: ProxyParams) -> Result<Self, ProxyError> {
        let target_raw = params
            .url
            .filter(|url| !url.is_empty())
            .ok_or(ProxyError::MissingTarget)?;

        let target = Url::parse(&target_raw).map_err(|_| ProxyError::InvalidTarget)?;
        if !matches!(target.scheme(), "http" | "https") || !target.has_host() {
            return Err(ProxyError::InvalidTarget);
        }

        let referer = match params.referer.filter(|r| !r.is_empty()) {
            Some(raw) => Some(decode_referer(&raw)?),
            None => None,
        };

        Ok(Self {
            target,
            target_raw,
            referer,
        })
    }
}

/// Undo one extra level of percent-encoding, as players commonly encode the
/// referer twice. Malformed escapes are rejected.
fn decode_referer(raw: &str) -> Result<String, ProxyError> {
    if !has_valid_escapes(raw) {
        return Err(ProxyError::InvalidReferer);
    }
    let decoded = urlencoding::decode(raw).map_err(|_| ProxyError::InvalidReferer)?;
    HeaderValue::from_str(&decoded).map_err(|_| ProxyError::InvalidReferer)?;
    Ok(decoded.into_owned())
}

fn has_valid_escapes(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes
        .iter()
        .enumerate()
        .filter(|(_, b)| **b == b'%')
        .all(|(i, _)| {
            bytes
                .get(i + 1..i + 3)
                .is_some_and(|pair| pair.iter().all(u8::is_ascii_hexdigit))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(url: Option<&str>, referer: Option<&str>) -> ProxyParams {
        ProxyParams {
            url: url.map(String::from),
            referer: referer.map(String::from),
        }
    }

    #[test]
    fn test_missing_target() {
        assert!(matches!(
            ProxyRequest::from_params(params(None, None)),
            Err(ProxyError::MissingTarget)
        ));
        assert!(matches!(
            ProxyRequest::from_params(params(Some(""), None)),
            Err(ProxyError::MissingTarget)
        ));
    }

    #[test]
    fn test_target_must_be_absolute_http() {
        for bad in ["/videos/index.m3u8", "index.m3u8", "ftp://cdn.example/a.ts", "https://", "data:text/plain,hi"] {
            assert!(
                matches!(ProxyRequest::from_params(params(Some(bad), None)), Err(ProxyError::InvalidTarget)),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_valid_request_keeps_raw_target() {
        let raw = "https://cdn.example/live/index.m3u8?token=a%2Fb";
        let request = ProxyRequest::from_params(params(Some(raw), None)).unwrap();
        assert_eq!(request.target_raw, raw);
        assert_eq!(request.target.host_str(), Some("cdn.example"));
        assert!(request.referer.is_none());
    }

    #[test]
    fn test_referer_is_decoded() {
        let request = ProxyRequest::from_params(params(
            Some("https://cdn.example/a.m3u8"),
            Some("https%3A%2F%2Fplayer.example%2F"),
        ))
        .unwrap();
        assert_eq!(request.referer.as_deref(), Some("https://player.example/"));

        let plain = ProxyRequest::from_params(params(
            Some("https://cdn.example/a.m3u8"),
            Some("https://player.example/"),
        ))
        .unwrap();
        assert_eq!(plain.referer.as_deref(), Some("https://player.example/"));
    }

    #[test]
    fn test_bad_referer_is_rejected() {
        for bad in ["https://x/%zz", "https://x/%4", "%", "https://x/%0A"] {
            assert!(
                matches!(
                    ProxyRequest::from_params(params(Some("https://cdn.example/a.ts"), Some(bad))),
                    Err(ProxyError::InvalidReferer)
                ),
                "{bad} should be rejected"
            );
        }
    }
}
