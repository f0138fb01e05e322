//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → api_keys.rs (bearer key → Principal in request extensions)
//!     → dispatcher reads the Principal
//!     → authorization.rs (merged AccessMetadata → allow / 401 / 403)
//!     → Invoke
//! ```
//!
//! # Design Decisions
//! - Access metadata is merged once per operation when a service is mounted
//! - Authentication is the host's business; only its result (a `Principal`)
//!   is consumed here
//! - Fail closed: an unknown policy never passes

pub mod api_keys;
pub mod authorization;
pub mod principal;

pub use api_keys::{api_key_middleware, ApiKeyStore};
pub use authorization::{AccessDenied, AccessMarker, AccessMetadata, PolicyRegistry, Requirement};
pub use principal::Principal;
