//! Parameter classification.

use crate::codec::{TypeShape, WireKind};

use super::{ResolvedBody, RouteTemplate, Verb};

/// Where a parameter's value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterRole {
    /// Bound to a route placeholder; serialized by its own wire kind.
    Route,
    /// The ambient request cancellation signal, never on the wire.
    Cancellation,
    /// A binary file part.
    File,
    Scalar,
    Complex,
}

/// Wire location of a parameter's value for a given operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Path,
    Query,
    Form,
    MultipartText,
    MultipartFile,
    /// Carries nothing on the wire.
    Detached,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub shape: TypeShape,
    pub role: ParameterRole,
}

impl Parameter {
    pub fn is_nullable(&self) -> bool {
        self.shape.nullable
    }

    /// Whether the value travels in the query or body.
    pub fn is_payload(&self) -> bool {
        matches!(
            self.role,
            ParameterRole::Scalar | ParameterRole::Complex | ParameterRole::File
        )
    }

    pub fn placement(&self, verb: Verb, body: ResolvedBody) -> Placement {
        match self.role {
            ParameterRole::Route => Placement::Path,
            ParameterRole::Cancellation => Placement::Detached,
            ParameterRole::File => Placement::MultipartFile,
            ParameterRole::Scalar | ParameterRole::Complex => match (verb, body) {
                (Verb::Get, _) => Placement::Query,
                (_, ResolvedBody::Multipart) => Placement::MultipartText,
                (_, ResolvedBody::FormUrlEncoded) => Placement::Form,
                (_, ResolvedBody::None) => Placement::Detached,
            },
        }
    }
}

/// Decides the role of a parameter from the route and its type.
///
/// Route membership is checked first, so a file or cancellation parameter
/// named like a placeholder comes back as `Route`; the definition builder
/// reports that as a violation.
pub fn classify(name: &str, shape: TypeShape, route: &RouteTemplate) -> Parameter {
    let role = if route.has_placeholder(name) {
        ParameterRole::Route
    } else {
        match shape.kind {
            WireKind::Cancellation => ParameterRole::Cancellation,
            WireKind::File => ParameterRole::File,
            WireKind::Scalar => ParameterRole::Scalar,
            WireKind::Complex => ParameterRole::Complex,
        }
    };
    Parameter {
        name: name.to_string(),
        shape,
        role,
    }
}
