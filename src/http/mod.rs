//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (extract and validate `url` / `referer`)
//!     → [proxy pipeline fetches and rewrites]
//!     → response.rs (error mapping) / cache_control.rs (Cache-Control)
//!     → Send to client
//! ```

pub mod cache_control;
pub mod request;
pub mod response;
pub mod server;

pub use request::{ProxyParams, ProxyRequest};
pub use response::ProxyError;
pub use server::{AppState, HttpServer};
