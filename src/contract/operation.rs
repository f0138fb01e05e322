//! Operation declarations.

use std::fmt;

use axum::{http::Method, routing::MethodFilter};
use serde::{Deserialize, Serialize};

use super::{BodyEncoding, Parameter, ParameterRole, ResolvedBody, RouteTemplate};
use crate::codec::{ReturnShape, TypeShape, WireReturn, WireType};
use crate::security::{AccessMarker, Requirement};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Verb {
    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Patch => "PATCH",
            Verb::Delete => "DELETE",
        }
    }

    pub fn method(self) -> Method {
        match self {
            Verb::Get => Method::GET,
            Verb::Post => Method::POST,
            Verb::Put => Method::PUT,
            Verb::Patch => Method::PATCH,
            Verb::Delete => Method::DELETE,
        }
    }

    pub fn method_filter(self) -> MethodFilter {
        match self {
            Verb::Get => MethodFilter::GET,
            Verb::Post => MethodFilter::POST,
            Verb::Put => MethodFilter::PUT,
            Verb::Patch => MethodFilter::PATCH,
            Verb::Delete => MethodFilter::DELETE,
        }
    }

    /// Only POST, PUT and PATCH may carry file parts.
    pub fn accepts_files(self) -> bool {
        matches!(self, Verb::Post | Verb::Put | Verb::Patch)
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declarative description of one operation, checked when the bridge is built.
///
/// ```
/// use interface_bridge::{FilePart, OperationSpec};
/// use uuid::Uuid;
///
/// let put = OperationSpec::put("put", "{id}")
///     .param::<Uuid>("id")
///     .param::<FilePart>("file")
///     .returns::<Uuid>();
/// assert_eq!(put.name(), "put");
/// ```
#[derive(Debug, Clone)]
pub struct OperationSpec {
    pub(crate) name: String,
    pub(crate) verb: Verb,
    pub(crate) route: String,
    pub(crate) body: BodyEncoding,
    pub(crate) params: Vec<(String, TypeShape)>,
    pub(crate) returns: ReturnShape,
    pub(crate) access: Vec<AccessMarker>,
}

impl OperationSpec {
    pub fn new(verb: Verb, name: impl Into<String>, route: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            verb,
            route: route.into(),
            body: BodyEncoding::Auto,
            params: Vec::new(),
            returns: <()>::return_shape(),
            access: Vec::new(),
        }
    }

    pub fn get(name: impl Into<String>, route: impl Into<String>) -> Self {
        Self::new(Verb::Get, name, route)
    }

    pub fn post(name: impl Into<String>, route: impl Into<String>) -> Self {
        Self::new(Verb::Post, name, route)
    }

    pub fn put(name: impl Into<String>, route: impl Into<String>) -> Self {
        Self::new(Verb::Put, name, route)
    }

    pub fn patch(name: impl Into<String>, route: impl Into<String>) -> Self {
        Self::new(Verb::Patch, name, route)
    }

    pub fn delete(name: impl Into<String>, route: impl Into<String>) -> Self {
        Self::new(Verb::Delete, name, route)
    }

    pub fn param<T: WireType>(mut self, name: impl Into<String>) -> Self {
        self.params.push((name.into(), T::shape()));
        self
    }

    pub fn returns<R: WireReturn>(mut self) -> Self {
        self.returns = R::return_shape();
        self
    }

    pub fn body(mut self, body: BodyEncoding) -> Self {
        self.body = body;
        self
    }

    pub fn authorize(mut self, requirement: Requirement) -> Self {
        self.access.push(AccessMarker::Authorize(requirement));
        self
    }

    pub fn allow_anonymous(mut self) -> Self {
        self.access.push(AccessMarker::AllowAnonymous);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A validated operation. Immutable and shared by the client and dispatcher.
#[derive(Debug, Clone)]
pub struct Operation {
    pub(crate) name: String,
    pub(crate) verb: Verb,
    pub(crate) route: RouteTemplate,
    pub(crate) body: ResolvedBody,
    pub(crate) parameters: Vec<Parameter>,
    pub(crate) returns: ReturnShape,
    pub(crate) access: Vec<AccessMarker>,
}

impl Operation {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn verb(&self) -> Verb {
        self.verb
    }

    pub fn route(&self) -> &RouteTemplate {
        &self.route
    }

    pub fn body(&self) -> ResolvedBody {
        self.body
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn returns(&self) -> &ReturnShape {
        &self.returns
    }

    /// Markers declared on the operation itself.
    pub fn access(&self) -> &[AccessMarker] {
        &self.access
    }

    pub fn argument_shapes(&self) -> impl Iterator<Item = &TypeShape> {
        self.parameters.iter().map(|p| &p.shape)
    }

    pub fn has_file_part(&self) -> bool {
        self.parameters.iter().any(|p| p.role == ParameterRole::File)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.verb, self.route, self.name)
    }
}
