//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the proxy and health endpoints
//! - Wire up middleware (request ID, tracing, timeout, CORS, Cache-Control)
//! - Build the shared upstream client
//! - Bind the server to a listener and drain on shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::Request,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::cache::CacheStore;
use crate::config::ProxyConfig;
use crate::http::cache_control::CacheControlHeader;
use crate::proxy::{proxy_handler, UpstreamFetcher};
use crate::security::cors;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub fetcher: UpstreamFetcher,
    pub cache: Option<CacheStore>,
    pub static_extensions: Arc<[String]>,
    /// Prepended to every rewritten playlist reference, e.g. `m3u8-proxy?url=`.
    pub playlist_prefix: Arc<str>,
}

/// HTTP server for the HLS proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server. `cache` is `None` when caching is disabled
    /// or the backend could not be reached.
    pub fn new(config: ProxyConfig, cache: Option<CacheStore>) -> Result<Self, reqwest::Error> {
        let fetcher = UpstreamFetcher::new(&config.upstream, config.proxy.default_referer.clone())?;

        let state = AppState {
            fetcher,
            cache,
            static_extensions: config.proxy.static_extensions.clone().into(),
            playlist_prefix: playlist_prefix(&config.proxy.path).into(),
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        let mut router = Router::new()
            .route(&config.proxy.path, get(proxy_handler))
            .route("/health", get(health))
            .with_state(state);

        if let Some(cache_control) = CacheControlHeader::from_config(&config.cache_control) {
            router = router.layer(cache_control.layer());
        }

        router
            .layer(cors::layer(&config.cors))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %request_id,
                )
            }))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            proxy_path = %self.config.proxy.path,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

async fn health() -> &'static str {
    "OK"
}

/// Rewritten references are resolved by the player against the playlist's
/// own proxy URL, so the prefix is the last segment of the route path:
/// `/api/hls` gives `hls?url=`, which resolves back to `/api/hls?url=`.
fn playlist_prefix(path: &str) -> String {
    let last_segment = path.rsplit('/').next().unwrap_or_default();
    format!("{last_segment}?url=")
}
