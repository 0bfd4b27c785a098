//! HLS proxy pipeline.
//!
//! # Data Flow
//! ```text
//! GET /m3u8-proxy?url=<target>&referer=<r>
//!     → handler.rs (validate, cache read)
//!     → fetcher.rs (pooled GET with Referer/Origin)
//!     → headers.rs (allow-list by status)
//!     → target.rs + playlist.rs (rewrite .m3u8/.ts bodies on 200)
//!     → client response
//!     → cache write-through (200/206 only)
//! ```

pub mod fetcher;
pub mod handler;
pub mod headers;
pub mod playlist;
pub mod target;

pub use fetcher::UpstreamFetcher;
pub use handler::proxy_handler;
pub use playlist::{LineKind, PlaylistTransformer};
pub use target::TargetKind;
