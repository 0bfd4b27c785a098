//! Metrics collection and exposition.
//!
//! # Metrics
//! - `hls_proxy_requests_total` (counter): requests by outcome and status
//! - `hls_proxy_request_duration_seconds` (histogram): end-to-end latency by outcome
//! - `hls_proxy_upstream_duration_seconds` (histogram): upstream fetch latency
//! - `hls_proxy_cache_lookups_total` (counter): hit / miss / invalid / error
//! - `hls_proxy_cache_writes_total` (counter): written / already_cached / failed
//! - `hls_proxy_playlists_rewritten_total` (counter)
//!
//! Recording is a no-op until a recorder is installed, so library code and
//! tests can call these freely.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished proxy request.
pub fn record_request(outcome: &'static str, status: u16, start: Instant) {
    metrics::counter!(
        "hls_proxy_requests_total",
        "outcome" => outcome,
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("hls_proxy_request_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_upstream_fetch(status: u16, start: Instant) {
    metrics::histogram!("hls_proxy_upstream_duration_seconds", "status" => status.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_cache_lookup(result: &'static str) {
    metrics::counter!("hls_proxy_cache_lookups_total", "result" => result).increment(1);
}

pub fn record_cache_write(outcome: &'static str) {
    metrics::counter!("hls_proxy_cache_writes_total", "outcome" => outcome).increment(1);
}

pub fn record_playlist_rewrite() {
    metrics::counter!("hls_proxy_playlists_rewritten_total").increment(1);
}
