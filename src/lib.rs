//! HLS reverse proxy library.
//!
//! Fetches playlists and segments on behalf of browser players, rewrites
//! playlist references so follow-up requests come back through the proxy,
//! and caches successful responses.

pub mod cache;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;
pub mod security;

pub use cache::CacheStore;
pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
