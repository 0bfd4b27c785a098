//! The proxy endpoint.
//!
//! Validate → cache read → upstream fetch → header policy → optional
//! playlist rewrite → respond → cache write-through.

use std::time::Instant;

use axum::body::{Body, Bytes};
use axum::extract::{rejection::QueryRejection, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::Instrument;

use crate::cache::{CacheKey, CachedEntry};
use crate::http::request::{ProxyParams, ProxyRequest};
use crate::http::response::ProxyError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::proxy::headers::select_headers;
use crate::proxy::playlist::rewrite_playlist;
use crate::proxy::target::TargetKind;

/// Entry point for `GET <proxy.path>`. The work runs on its own task so a
/// client disconnect does not abort the upstream fetch or the cache write.
pub async fn proxy_handler(
    State(state): State<AppState>,
    params: Result<Query<ProxyParams>, QueryRejection>,
) -> Response {
    let start = Instant::now();

    let params = match params {
        Ok(Query(params)) => params,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Unparseable query string");
            return finish(Err(ProxyError::InvalidTarget), start);
        }
    };

    let work = async move { handle(&state, params).await }.in_current_span();
    match tokio::spawn(work).await {
        Ok(result) => finish(result, start),
        Err(e) => {
            tracing::error!(error = %e, "Proxy task failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn finish(result: Result<(Response, &'static str), ProxyError>, start: Instant) -> Response {
    match result {
        Ok((response, outcome)) => {
            metrics::record_request(outcome, response.status().as_u16(), start);
            response
        }
        Err(err) => {
            metrics::record_request(err.outcome(), err.status().as_u16(), start);
            err.into_response()
        }
    }
}

async fn handle(state: &AppState, params: ProxyParams) -> Result<(Response, &'static str), ProxyError> {
    let request = ProxyRequest::from_params(params)?;
    let key = CacheKey::for_target(&request.target_raw);

    if let Some(cache) = &state.cache {
        if let Some(entry) = cache.read(&key).await {
            tracing::debug!(target_url = %request.target_raw, "Cache hit");
            return Ok((entry.into_response(), "cache_hit"));
        }
        tracing::debug!(target_url = %request.target_raw, "Cache miss");
    }

    let kind = TargetKind::classify(&request.target, &state.static_extensions);

    let upstream = state
        .fetcher
        .fetch(&request.target, request.referer.as_deref())
        .await
        .map_err(|e| {
            tracing::warn!(target_url = %request.target_raw, error = %e, "Upstream fetch failed");
            ProxyError::from(e)
        })?;

    let status = upstream.status;
    let mut headers = select_headers(&upstream.headers, status);

    let body = if kind.is_rewritable() && status == StatusCode::OK {
        let rewritten = rewrite_playlist(
            &upstream.body,
            &request.target_raw,
            &state.playlist_prefix,
            &state.static_extensions,
        )
        .map_err(|e| {
            tracing::error!(target_url = %request.target_raw, error = %e, "Playlist rewrite failed");
            ProxyError::Transform(e)
        })?;
        metrics::record_playlist_rewrite();
        // Length changed, so the upstream Content-Length is not forwarded.
        Bytes::from(rewritten)
    } else {
        if kind.is_static_asset || status != StatusCode::OK {
            if let Some(length) = upstream.headers.get(header::CONTENT_LENGTH) {
                headers.insert(header::CONTENT_LENGTH, length.clone());
            }
        }
        upstream.body
    };

    if status == StatusCode::OK || status == StatusCode::PARTIAL_CONTENT {
        if let Some(cache) = state.cache.clone() {
            let entry = CachedEntry::new(status, headers.clone(), body.clone());
            tokio::spawn(
                async move {
                    cache.write_once(&key, entry).await;
                }
                .in_current_span(),
            );
        }
    }

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok((response, "upstream"))
}
