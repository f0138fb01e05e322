//! A service implementation bound to a bridge definition.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use super::handler::{ArgumentCursor, OperationHandler};
use super::{DispatchError, ServiceError};
use crate::codec::{ResponseEnvelope, ReturnShape, TypeShape, WireReturn};
use crate::contract::BridgeDefinition;
use crate::security::{AccessMarker, Requirement};

pub(crate) type ErasedHandler = Arc<
    dyn Fn(ArgumentCursor) -> Result<BoxFuture<'static, Result<ResponseEnvelope, ServiceError>>, DispatchError>
        + Send
        + Sync,
>;

pub(crate) struct Registration {
    pub(crate) arguments: Vec<TypeShape>,
    pub(crate) returns: ReturnShape,
    pub(crate) access: Vec<AccessMarker>,
    pub(crate) invoke: ErasedHandler,
}

/// Handlers for the operations of one bridge, backed by a shared `S`.
///
/// Access markers set here are the implementation-side sources of the
/// authorization merge: `authorize`/`allow_anonymous` apply to the whole
/// service, `handle_with` markers to one operation.
pub struct BridgeService<S> {
    pub(crate) definition: Arc<BridgeDefinition>,
    service: Arc<S>,
    pub(crate) access: Vec<AccessMarker>,
    pub(crate) handlers: HashMap<String, Registration>,
}

impl<S: Send + Sync + 'static> BridgeService<S> {
    pub fn new(definition: Arc<BridgeDefinition>, service: S) -> Self {
        Self::from_arc(definition, Arc::new(service))
    }

    pub fn from_arc(definition: Arc<BridgeDefinition>, service: Arc<S>) -> Self {
        Self {
            definition,
            service,
            access: Vec::new(),
            handlers: HashMap::new(),
        }
    }

    pub fn authorize(mut self, requirement: Requirement) -> Self {
        self.access.push(AccessMarker::Authorize(requirement));
        self
    }

    pub fn allow_anonymous(mut self) -> Self {
        self.access.push(AccessMarker::AllowAnonymous);
        self
    }

    pub fn handle<H, Args, R>(self, operation: &str, handler: H) -> Self
    where
        H: OperationHandler<S, Args, R>,
        R: WireReturn,
    {
        self.handle_with(operation, Vec::new(), handler)
    }

    /// Registers a handler together with its own access markers.
    pub fn handle_with<H, Args, R, M>(mut self, operation: &str, access: M, handler: H) -> Self
    where
        H: OperationHandler<S, Args, R>,
        R: WireReturn,
        M: IntoIterator<Item = AccessMarker>,
    {
        let service = self.service.clone();
        let invoke: ErasedHandler = Arc::new(move |arguments: ArgumentCursor| {
            let profile = arguments.profile();
            let call = handler.call(service.clone(), arguments)?;
            Ok(Box::pin(async move {
                let result = call.await?;
                result.into_envelope(&profile).map_err(ServiceError::internal)
            }) as BoxFuture<'static, _>)
        });

        self.handlers.insert(
            operation.to_string(),
            Registration {
                arguments: H::argument_shapes(),
                returns: H::return_shape(),
                access: access.into_iter().collect(),
                invoke,
            },
        );
        self
    }

    pub fn definition(&self) -> &Arc<BridgeDefinition> {
        &self.definition
    }
}

impl<S> fmt::Debug for BridgeService<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeService")
            .field("bridge", &self.definition.name())
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}
