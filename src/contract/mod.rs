//! Bridge contracts.
//!
//! # Responsibilities
//! - Parse and join route templates
//! - Resolve body encodings from verb and file parts
//! - Classify parameters into wire roles
//! - Refuse to build a bridge whose operations cannot be served
//!
//! # Data Flow
//! ```text
//! OperationSpec (verb, route, params, return)
//!     → route.rs (join prefix, simplify placeholders)
//!     → parameter.rs (route / cancellation / file / scalar / complex)
//!     → body.rs (none / form / multipart)
//!     → Operation (immutable, shared by client and dispatcher)
//! ```

pub mod body;
pub mod definition;
pub mod operation;
pub mod parameter;
pub mod route;

pub use body::{BodyEncoding, BodyPolicyError, ResolvedBody};
pub use definition::{BridgeDefinition, BridgeDefinitionBuilder};
pub use operation::{Operation, OperationSpec, Verb};
pub use parameter::{classify, Parameter, ParameterRole, Placement};
pub use route::{simplify, RouteError, RouteTemplate, Segment};

use std::fmt;

use thiserror::Error;

/// One structural problem found while building or mounting a bridge.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractViolation {
    #[error("operation {operation}: {source}")]
    Route { operation: String, source: RouteError },

    #[error("operation {operation}: {source}")]
    BodyPolicy {
        operation: String,
        source: BodyPolicyError,
    },

    #[error("duplicate operation {0:?}")]
    DuplicateOperation(String),

    #[error("duplicate parameter {parameter:?} in operation {operation}")]
    DuplicateParameter { operation: String, parameter: String },

    #[error("operations {first} and {second} both register {verb} {path}")]
    DuplicateRoute {
        verb: Verb,
        path: String,
        first: String,
        second: String,
    },

    #[error("route {path} conflicts with {existing}: placeholder names differ")]
    ConflictingRoute { path: String, existing: String },

    #[error("operation {operation}: placeholder {placeholder:?} has no parameter")]
    UnboundPlaceholder {
        operation: String,
        placeholder: String,
    },

    #[error("operation {operation}: parameter {parameter:?} cannot be bound to the route")]
    RouteBoundSignal { operation: String, parameter: String },

    #[error("operation {operation}: more than one cancellation parameter")]
    MultipleCancellation { operation: String },

    #[error("operation {operation}: sequence parameter {parameter:?} must travel in a body, not a GET query")]
    SequenceOnGet { operation: String, parameter: String },

    #[error("operation {operation}: body arguments declared but the body encoding is none")]
    BodyArgumentsWithoutBody { operation: String },

    #[error("unknown serializer profile {0:?}")]
    UnknownProfile(String),

    #[error("no handler for operation {0}")]
    MissingHandler(String),

    #[error("handler registered for unknown operation {0:?}")]
    UnknownOperation(String),

    #[error("operation {operation}: handler takes ({found}) but the operation declares ({expected})")]
    ArgumentMismatch {
        operation: String,
        expected: String,
        found: String,
    },

    #[error("operation {operation}: handler returns {found} but the operation declares {expected}")]
    ReturnMismatch {
        operation: String,
        expected: String,
        found: String,
    },

    #[error("operation {operation}: unknown authorization policy {policy:?}")]
    UnknownPolicy { operation: String, policy: String },
}

/// Every violation found for one bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractError {
    pub bridge: String,
    pub violations: Vec<ContractViolation>,
}

impl fmt::Display for ContractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Bridge {} has {} contract violation(s):",
            self.bridge,
            self.violations.len()
        )?;
        for violation in &self.violations {
            writeln!(f, "  - {}", violation)?;
        }
        Ok(())
    }
}

impl std::error::Error for ContractError {}
