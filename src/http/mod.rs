//! Server side of a bridge.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (principal, body limit, timeout, trace layers)
//!     → dispatcher.rs (one route per operation)
//!     → extract.rs (route > query > form values, uploaded files)
//!     → handler.rs (typed decode, invoke)
//!     → ResponseEnvelope or HttpResponseError (error.rs)
//! ```
//!
//! # Design Decisions
//! - Service implementations are checked against their bridge at mount time
//! - Operation metadata is immutable after mount and shared without locks

pub mod dispatcher;
pub mod error;
pub mod extract;
pub mod handler;
pub mod server;
pub mod service;

pub use dispatcher::RouteDispatcher;
pub use error::{DispatchError, HttpResponseError, ServiceError};
pub use handler::{ArgumentCursor, OperationHandler};
pub use server::BridgeServer;
pub use service::BridgeService;
