//! HLS reverse proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────┐
//!                      │                  HLS PROXY                    │
//!   Player request     │  ┌────────┐   ┌─────────┐   ┌─────────────┐  │
//!   ───────────────────┼─▶│ http   │──▶│ proxy   │──▶│  fetcher    │──┼──▶ Origin
//!                      │  │ server │   │ handler │   │ (reqwest)   │  │
//!                      │  └────────┘   └────┬────┘   └─────────────┘  │
//!                      │                    │                          │
//!                      │          ┌─────────┴─────────┐                │
//!                      │          ▼                   ▼                │
//!                      │   ┌────────────┐      ┌─────────────┐         │
//!   Player response    │   │  playlist  │      │    cache    │         │
//!   ◀──────────────────┼───│  rewrite   │      │ memory/redis│         │
//!                      │   └────────────┘      └─────────────┘         │
//!                      └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use hls_proxy::config::load_config;
use hls_proxy::http::HttpServer;
use hls_proxy::lifecycle::startup::build_cache_store;
use hls_proxy::lifecycle::Shutdown;
use hls_proxy::observability::{logging, metrics};

#[derive(Parser, Debug)]
#[command(name = "hls-proxy", version, about = "HLS reverse proxy with playlist rewriting")]
struct Cli {
    /// Path to a TOML config file. Environment variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let (config, ignored_env) = load_config(cli.config.as_deref())?;
    logging::init_logging(&config.observability);
    for ignored in &ignored_env {
        tracing::warn!(variable = ignored.name, value = %ignored.value, "{}", ignored);
    }

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "hls-proxy starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        proxy_path = %config.proxy.path,
        cache_backend = ?config.cache.backend,
        upstream_timeout_secs = config.upstream.request_timeout_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let cache = build_cache_store(&config.cache).await;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let shutdown_rx = shutdown.subscribe();
    tokio::spawn(shutdown.trigger_on_signal());

    let server = HttpServer::new(config, cache)?;
    server.run(listener, shutdown_rx).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
