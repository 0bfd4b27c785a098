//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Connect cache → Build server → Bind listener
//!
//! Shutdown (shutdown.rs):
//!     SIGTERM/SIGINT → Stop accepting → Drain in-flight requests → Exit
//! ```
//!
//! # Design Decisions
//! - Configuration errors are fatal; an unreachable cache is not
//! - Listener binds last (traffic only when ready)

pub mod shutdown;
pub mod startup;

pub use shutdown::Shutdown;
