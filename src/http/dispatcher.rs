//! Route registration and per-request dispatch.
//!
//! # Responsibilities
//! - Check a service against its bridge before any route is registered
//! - Register one axum route per operation (verb + simplified path)
//! - Per request: enforce access, extract values, decode, invoke, respond
//!
//! # Data Flow
//! ```text
//! Request
//!     → AccessMetadata::evaluate (401 / 403)
//!     → extract.rs (route > query > form, files)
//!     → ArgumentCursor (WireType::from_wire per parameter)
//!     → handler future (per-request CancellationToken)
//!     → ResponseEnvelope | HttpResponseError verbatim | bare 500
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::Request,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::MethodRouter,
    Router,
};
use tokio_util::sync::CancellationToken;

use super::extract::extract_values;
use super::handler::ArgumentCursor;
use super::service::{BridgeService, ErasedHandler};
use super::{DispatchError, ServiceError};
use crate::codec::{SerializerProfile, SerializerProfiles, TypeShape, WireValue};
use crate::contract::{ContractError, ContractViolation, Operation, ParameterRole, Verb};
use crate::observability::metrics;
use crate::security::{AccessMetadata, PolicyRegistry, Principal};

/// Serves every mounted bridge from one axum router.
#[derive(Debug)]
pub struct RouteDispatcher {
    router: Router,
    profiles: SerializerProfiles,
    policies: PolicyRegistry,
    /// Simplified path (placeholders blanked) to the registered path.
    paths: HashMap<String, String>,
    /// Verb and simplified path to `bridge.operation`.
    owners: HashMap<(Verb, String), String>,
}

impl RouteDispatcher {
    pub fn new(profiles: SerializerProfiles) -> Self {
        Self {
            router: Router::new(),
            profiles,
            policies: PolicyRegistry::new(),
            paths: HashMap::new(),
            owners: HashMap::new(),
        }
    }

    /// Registers a named policy. Must precede the mounts that reference it.
    pub fn with_policy<F>(mut self, name: impl Into<String>, policy: F) -> Self
    where
        F: Fn(&Principal) -> bool + Send + Sync + 'static,
    {
        self.policies.insert(name, policy);
        self
    }

    /// Checks `service` against its bridge and registers its routes.
    ///
    /// Nothing is registered unless every operation passes.
    pub fn mount<S: Send + Sync + 'static>(mut self, service: BridgeService<S>) -> Result<Self, ContractError> {
        let definition = service.definition.clone();
        let bridge = definition.name().to_string();
        let mut violations = Vec::new();

        let profile = match self.profiles.resolve(definition.serializer_profile()) {
            Some(profile) => Some(Arc::new(profile.clone())),
            None => {
                violations.push(ContractViolation::UnknownProfile(
                    definition.serializer_profile().unwrap_or_default().to_string(),
                ));
                None
            }
        };

        let mut handlers = service.handlers;
        let mut unknown: Vec<&String> = handlers
            .keys()
            .filter(|name| definition.operation(name).is_none())
            .collect();
        unknown.sort();
        violations.extend(
            unknown
                .into_iter()
                .map(|name| ContractViolation::UnknownOperation(name.clone())),
        );

        let mut planned = Vec::with_capacity(definition.operations().len());
        let mut paths = self.paths.clone();
        let mut owners = self.owners.clone();
        for operation in definition.operations() {
            let name = operation.name().to_string();
            let Some(registration) = handlers.remove(&name) else {
                violations.push(ContractViolation::MissingHandler(name));
                continue;
            };

            let expected: Vec<TypeShape> = operation.argument_shapes().cloned().collect();
            if expected != registration.arguments {
                violations.push(ContractViolation::ArgumentMismatch {
                    operation: name.clone(),
                    expected: join_shapes(&expected),
                    found: join_shapes(&registration.arguments),
                });
            }
            if *operation.returns() != registration.returns {
                violations.push(ContractViolation::ReturnMismatch {
                    operation: name.clone(),
                    expected: operation.returns().to_string(),
                    found: registration.returns.to_string(),
                });
            }

            let access = AccessMetadata::merge(
                definition.access(),
                operation.access(),
                &service.access,
                &registration.access,
            );
            for policy in access.policies() {
                if !self.policies.contains(policy) {
                    violations.push(ContractViolation::UnknownPolicy {
                        operation: name.clone(),
                        policy: policy.to_string(),
                    });
                }
            }

            let key = operation.route().match_key();
            let path = operation.route().path();
            let owner = format!("{bridge}.{name}");
            match paths.get(&key) {
                Some(existing) if *existing != path => {
                    violations.push(ContractViolation::ConflictingRoute {
                        path: path.clone(),
                        existing: existing.clone(),
                    });
                }
                Some(_) => {}
                None => {
                    paths.insert(key.clone(), path.clone());
                }
            }
            if let Some(first) = owners.insert((operation.verb(), key), owner.clone()) {
                violations.push(ContractViolation::DuplicateRoute {
                    verb: operation.verb(),
                    path,
                    first,
                    second: owner,
                });
            }

            planned.push((operation.clone(), access, registration.invoke));
        }

        let profile = match profile {
            Some(profile) if violations.is_empty() => profile,
            _ => return Err(ContractError { bridge, violations }),
        };

        let policies = Arc::new(self.policies.clone());
        for (operation, access, invoke) in planned {
            let path = operation.route().path();
            tracing::info!(
                bridge = %bridge,
                operation = %operation.name(),
                verb = %operation.verb(),
                path = %path,
                anonymous = access.anonymous,
                requirements = access.requirements.len(),
                "Registered bridge route"
            );
            let endpoint = Arc::new(Endpoint {
                bridge: bridge.clone(),
                operation: operation.clone(),
                access,
                policies: policies.clone(),
                profile: profile.clone(),
                invoke,
            });
            let method_router = MethodRouter::new().on(operation.verb().method_filter(), move |request: Request| {
                let endpoint = endpoint.clone();
                async move { endpoint.dispatch(request).await }
            });
            self.router = self.router.route(&path, method_router);
        }
        self.paths = paths;
        self.owners = owners;
        Ok(self)
    }

    pub fn into_router(self) -> Router {
        self.router
    }
}

impl Default for RouteDispatcher {
    fn default() -> Self {
        Self::new(SerializerProfiles::default())
    }
}

fn join_shapes(shapes: &[TypeShape]) -> String {
    shapes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Everything one route needs at request time; immutable after mount.
struct Endpoint {
    bridge: String,
    operation: Arc<Operation>,
    access: AccessMetadata,
    policies: Arc<PolicyRegistry>,
    profile: Arc<SerializerProfile>,
    invoke: ErasedHandler,
}

impl Endpoint {
    async fn dispatch(&self, request: Request) -> Response {
        let start = Instant::now();
        let response = match self.respond(request).await {
            Ok(response) => response,
            Err(err) => {
                tracing::debug!(
                    bridge = %self.bridge,
                    operation = %self.operation.name(),
                    status = err.status().as_u16(),
                    error = %err,
                    "Request rejected"
                );
                err.into_response()
            }
        };
        metrics::record_request(
            &self.bridge,
            self.operation.name(),
            response.status().as_u16(),
            start,
        );
        response
    }

    async fn respond(&self, request: Request) -> Result<Response, DispatchError> {
        let principal = request.extensions().get::<Principal>().cloned();
        if let Err(denied) = self.access.evaluate(principal.as_ref(), &self.policies) {
            tracing::warn!(
                bridge = %self.bridge,
                operation = %self.operation.name(),
                principal = principal.as_ref().map(|p| p.name.as_str()).unwrap_or("anonymous"),
                reason = ?denied,
                "Access denied"
            );
            return Err(denied.into());
        }

        let route_bound = self.operation.route().placeholder_names().next().is_some();
        let mut values = extract_values(request, route_bound).await?;

        // Cancelled when this future completes or is dropped with the connection.
        let token = CancellationToken::new();
        let _guard = token.clone().drop_guard();

        let mut arguments = Vec::with_capacity(self.operation.parameters().len());
        for parameter in self.operation.parameters() {
            let value = match parameter.role {
                ParameterRole::Cancellation => Some(WireValue::Cancellation(token.clone())),
                ParameterRole::File => match values.take_file(&parameter.name) {
                    Some(file) => Some(WireValue::File(file)),
                    None if parameter.is_nullable() => None,
                    None => return Err(DispatchError::MissingFile(parameter.name.clone())),
                },
                ParameterRole::Route | ParameterRole::Scalar | ParameterRole::Complex => {
                    values.take_value(&parameter.name).map(WireValue::Text)
                }
            };
            arguments.push((parameter.name.clone(), value));
        }

        let cursor = ArgumentCursor::new(self.operation.name(), arguments, self.profile.clone());
        let call = (self.invoke)(cursor)?;
        match call.await {
            Ok(envelope) => Ok(envelope.into_response()),
            Err(ServiceError::Response(err)) => {
                tracing::debug!(
                    bridge = %self.bridge,
                    operation = %self.operation.name(),
                    status = err.status().as_u16(),
                    "Service raised an HTTP response"
                );
                Ok(err.into_response())
            }
            Err(ServiceError::Internal(err)) => {
                tracing::error!(
                    bridge = %self.bridge,
                    operation = %self.operation.name(),
                    error = %err,
                    "Service call failed"
                );
                Ok(StatusCode::INTERNAL_SERVER_ERROR.into_response())
            }
        }
    }
}
