//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     Shutdown::trigger() or Ctrl+C
//!     → axum stops accepting
//!     → in-flight requests drain
//!     → per-request cancellation tokens fire as handlers are dropped
//! ```
//!
//! # Design Decisions
//! - One broadcast coordinator per host, cheap to subscribe to
//! - Tests drive shutdown explicitly instead of sending signals

pub mod shutdown;

pub use shutdown::{shutdown_signal, Shutdown};
