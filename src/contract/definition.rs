//! Bridge definitions.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::{
    body, classify, BodyEncoding, ContractError, ContractViolation, Operation, OperationSpec,
    ParameterRole, ResolvedBody, RouteTemplate, Verb,
};
use crate::codec::WireKind;
use crate::security::{AccessMarker, Requirement};

/// A named interface contract: an ordered set of operations under an
/// optional route prefix. Immutable once built.
#[derive(Debug)]
pub struct BridgeDefinition {
    name: String,
    prefix: Option<String>,
    serializer_profile: Option<String>,
    access: Vec<AccessMarker>,
    operations: Vec<Arc<Operation>>,
    by_name: HashMap<String, usize>,
}

impl BridgeDefinition {
    pub fn builder(name: impl Into<String>) -> BridgeDefinitionBuilder {
        BridgeDefinitionBuilder {
            name: name.into(),
            prefix: None,
            serializer_profile: None,
            default_body: BodyEncoding::Auto,
            access: Vec::new(),
            operations: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Declared serializer profile name; `None` selects the default profile.
    pub fn serializer_profile(&self) -> Option<&str> {
        self.serializer_profile.as_deref()
    }

    /// Markers declared on the bridge as a whole.
    pub fn access(&self) -> &[AccessMarker] {
        &self.access
    }

    pub fn operations(&self) -> &[Arc<Operation>] {
        &self.operations
    }

    pub fn operation(&self, name: &str) -> Option<&Arc<Operation>> {
        self.by_name.get(name).map(|&index| &self.operations[index])
    }
}

pub struct BridgeDefinitionBuilder {
    name: String,
    prefix: Option<String>,
    serializer_profile: Option<String>,
    default_body: BodyEncoding,
    access: Vec<AccessMarker>,
    operations: Vec<OperationSpec>,
}

impl BridgeDefinitionBuilder {
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn serializer_profile(mut self, profile: impl Into<String>) -> Self {
        self.serializer_profile = Some(profile.into());
        self
    }

    /// Body encoding for non-GET operations that declare `Auto`.
    pub fn default_body(mut self, body: BodyEncoding) -> Self {
        self.default_body = body;
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

    pub fn operation(mut self, operation: OperationSpec) -> Self {
        self.operations.push(operation);
        self
    }

    /// Validates every operation, reporting all contract violations at once.
    pub fn build(mut self) -> Result<BridgeDefinition, ContractError> {
        let specs = std::mem::take(&mut self.operations);
        let mut violations = Vec::new();
        let mut operations = Vec::with_capacity(specs.len());
        let mut by_name = HashMap::new();
        let mut routes: HashMap<(Verb, String), String> = HashMap::new();
        let mut paths: HashMap<String, String> = HashMap::new();

        for spec in specs {
            if by_name.contains_key(&spec.name) {
                violations.push(ContractViolation::DuplicateOperation(spec.name.clone()));
                continue;
            }
            let Some(operation) = build_operation(spec, &self, &mut violations) else {
                continue;
            };

            let key = operation.route.match_key();
            if let Some(first) = routes.insert((operation.verb, key.clone()), operation.name.clone()) {
                violations.push(ContractViolation::DuplicateRoute {
                    verb: operation.verb,
                    path: operation.route.path(),
                    first,
                    second: operation.name.clone(),
                });
            }
            let path = operation.route.path();
            match paths.get(&key) {
                Some(existing) if *existing != path => {
                    violations.push(ContractViolation::ConflictingRoute {
                        path,
                        existing: existing.clone(),
                    });
                }
                Some(_) => {}
                None => {
                    paths.insert(key, path);
                }
            }

            by_name.insert(operation.name.clone(), operations.len());
            operations.push(Arc::new(operation));
        }

        if !violations.is_empty() {
            return Err(ContractError {
                bridge: self.name,
                violations,
            });
        }

        Ok(BridgeDefinition {
            name: self.name,
            prefix: self.prefix,
            serializer_profile: self.serializer_profile,
            access: self.access,
            operations,
            by_name,
        })
    }
}

fn build_operation(
    spec: OperationSpec,
    bridge: &BridgeDefinitionBuilder,
    violations: &mut Vec<ContractViolation>,
) -> Option<Operation> {
    let before = violations.len();
    let name = spec.name;

    let route = match RouteTemplate::join(bridge.prefix.as_deref(), &spec.route) {
        Ok(route) => route,
        Err(source) => {
            violations.push(ContractViolation::Route {
                operation: name,
                source,
            });
            return None;
        }
    };

    let mut seen = HashSet::new();
    let mut parameters = Vec::with_capacity(spec.params.len());
    for (param_name, shape) in spec.params {
        if !seen.insert(param_name.clone()) {
            violations.push(ContractViolation::DuplicateParameter {
                operation: name.clone(),
                parameter: param_name,
            });
            continue;
        }
        let parameter = classify(&param_name, shape, &route);
        if parameter.role == ParameterRole::Route
            && matches!(parameter.shape.kind, WireKind::File | WireKind::Cancellation)
        {
            violations.push(ContractViolation::RouteBoundSignal {
                operation: name.clone(),
                parameter: param_name.clone(),
            });
        }
        if spec.verb == Verb::Get && parameter.role == ParameterRole::Complex && parameter.shape.sequence {
            violations.push(ContractViolation::SequenceOnGet {
                operation: name.clone(),
                parameter: param_name.clone(),
            });
        }
        parameters.push(parameter);
    }

    for placeholder in route.placeholder_names() {
        if !seen.contains(placeholder) {
            violations.push(ContractViolation::UnboundPlaceholder {
                operation: name.clone(),
                placeholder: placeholder.to_string(),
            });
        }
    }

    let cancellations = parameters
        .iter()
        .filter(|p| p.shape.kind == WireKind::Cancellation)
        .count();
    if cancellations > 1 {
        violations.push(ContractViolation::MultipleCancellation {
            operation: name.clone(),
        });
    }

    let has_file_part = parameters.iter().any(|p| p.role == ParameterRole::File);
    let declared = match spec.body {
        BodyEncoding::Auto if spec.verb != Verb::Get => bridge.default_body,
        declared => declared,
    };
    let body = match body::resolve(spec.verb, has_file_part, declared) {
        Ok(body) => body,
        Err(source) => {
            violations.push(ContractViolation::BodyPolicy {
                operation: name.clone(),
                source,
            });
            ResolvedBody::None
        }
    };
    if spec.verb != Verb::Get && body == ResolvedBody::None && parameters.iter().any(|p| p.is_payload()) {
        violations.push(ContractViolation::BodyArgumentsWithoutBody {
            operation: name.clone(),
        });
    }

    if violations.len() > before {
        return None;
    }

    Some(Operation {
        name,
        verb: spec.verb,
        route,
        body,
        parameters,
        returns: spec.returns,
        access: spec.access,
    })
}
