//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → cors.rs (preflight answered, Access-Control-* added to responses)
//!     → Pass to the proxy endpoint
//! ```
//!
//! # Design Decisions
//! - Origins come from one comma-separated setting (`CORS_DOMAIN`)
//! - Requested headers are mirrored back on preflight

pub mod cors;
