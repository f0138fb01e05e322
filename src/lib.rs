//! Interface Bridge Library
//!
//! Turns a declared interface (operations with an HTTP verb, a route template
//! and a body encoding) into a typed REST client and a typed axum dispatcher
//! that agree on the wire shape.
//!
//! ```text
//!   BridgeDefinition ──────────────┬──────────────────────────────┐
//!   (contract: routes, bodies,     │                              │
//!    parameter roles)              ▼                              ▼
//!                          client::BridgeClient           http::RouteDispatcher
//!   call(op, args) ──▶ RequestBuilder ──▶ HTTP ──▶ extract ──▶ decode ──▶ invoke
//!   result ◀── ResponseDecoder ◀────────── HTTP ◀────────── encode ◀──────┘
//! ```

#[macro_use]
mod macros;

pub mod client;
pub mod codec;
pub mod config;
pub mod contract;
pub mod greeter;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use client::{BridgeClient, ClientError};
pub use codec::{FilePart, Json, SerializerProfile, WireReturn, WireType};
pub use config::BridgeConfig;
pub use contract::{BridgeDefinition, BodyEncoding, ContractError, OperationSpec, Verb};
pub use http::{BridgeServer, BridgeService, HttpResponseError, RouteDispatcher, ServiceError};
pub use lifecycle::Shutdown;
pub use security::{AccessMetadata, Principal};
