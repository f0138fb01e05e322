//! The bundled greeting bridge served by the `interface-bridge` binary.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::client::{BridgeClient, ClientError};
use crate::contract::{BridgeDefinition, ContractError, OperationSpec};
use crate::http::{BridgeService, ServiceError};

pub const BRIDGE_NAME: &str = "HelloApi";

/// `GET /api/hello/greet/{name}` returning a plain-text greeting.
pub fn definition() -> Result<BridgeDefinition, ContractError> {
    BridgeDefinition::builder(BRIDGE_NAME)
        .prefix("api/hello")
        .operation(
            OperationSpec::get("greet", "greet/{name}")
                .param::<String>("name")
                .param::<CancellationToken>("cancellation")
                .returns::<String>(),
        )
        .allow_anonymous()
        .build()
}

#[derive(Debug, Default)]
pub struct Greeter;

impl Greeter {
    pub async fn greet(self: Arc<Self>, name: String, _cancellation: CancellationToken) -> Result<String, ServiceError> {
        Ok(format!("Hello, {name}!"))
    }

    pub fn service(definition: Arc<BridgeDefinition>) -> BridgeService<Greeter> {
        BridgeService::new(definition, Greeter).handle("greet", Greeter::greet)
    }
}

/// Typed wrapper over a [`BridgeClient`] for the greeting bridge.
#[derive(Debug, Clone)]
pub struct GreeterClient {
    inner: BridgeClient,
}

impl GreeterClient {
    pub fn new(inner: BridgeClient) -> Self {
        Self { inner }
    }

    pub async fn greet(&self, name: &str, cancellation: CancellationToken) -> Result<String, ClientError> {
        self.inner
            .call("greet", (name.to_string(), cancellation))
            .await
    }
}
