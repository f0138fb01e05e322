//! Client side of a bridge.
//!
//! # Data Flow
//! ```text
//! BridgeClient::call(operation, (a1, .., an))
//!     → argument shapes checked against the operation
//!     → IntoArguments::into_wire (serializer chosen per type)
//!     → request.rs (path, query, form or multipart)
//!     → reqwest (raced against the caller's cancellation token)
//!     → response.rs (status check, WireReturn::from_envelope)
//! ```

pub mod error;
pub mod request;
pub mod response;

pub use error::ClientError;
pub use request::{PreparedBody, PreparedPart, PreparedRequest};

use std::sync::Arc;
use std::time::{Duration, Instant};

use url::Url;

use crate::codec::{IntoArguments, SerializerProfile, SerializerProfiles, TypeShape, WireReturn};
use crate::config::BridgeConfig;
use crate::contract::BridgeDefinition;
use crate::observability::metrics;

/// Typed caller for the operations of one bridge.
#[derive(Debug, Clone)]
pub struct BridgeClient {
    http: reqwest::Client,
    base_url: Url,
    definition: Arc<BridgeDefinition>,
    profile: Arc<SerializerProfile>,
    api_key: Option<String>,
}

impl BridgeClient {
    pub fn new(definition: Arc<BridgeDefinition>, base_url: &str) -> Result<Self, ClientError> {
        Self::with_client(
            definition,
            base_url,
            reqwest::Client::new(),
            &SerializerProfiles::default(),
        )
    }

    /// Uses a caller-provided reqwest client; the bridge's serializer profile
    /// is looked up in `profiles`.
    pub fn with_client(
        definition: Arc<BridgeDefinition>,
        base_url: &str,
        http: reqwest::Client,
        profiles: &SerializerProfiles,
    ) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url).map_err(|err| ClientError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: err.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: "cannot be a base".into(),
            });
        }
        let profile = profiles
            .resolve(definition.serializer_profile())
            .cloned()
            .ok_or_else(|| {
                ClientError::UnknownProfile(definition.serializer_profile().unwrap_or_default().to_string())
            })?;
        Ok(Self {
            http,
            base_url,
            definition,
            profile: Arc::new(profile),
            api_key: None,
        })
    }

    /// Builds the reqwest client, profiles and credentials from configuration.
    pub fn from_config(definition: Arc<BridgeDefinition>, config: &BridgeConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.client.timeout_secs))
            .connect_timeout(Duration::from_secs(config.client.connect_timeout_secs))
            .build()?;
        let profiles = SerializerProfiles::from_config(&config.serialization);
        let client = Self::with_client(definition, &config.client.base_url, http, &profiles)?;
        Ok(match &config.client.api_key {
            Some(key) => client.with_api_key(key.clone()),
            None => client,
        })
    }

    /// Sends `Authorization: Bearer <key>` on every call.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn definition(&self) -> &Arc<BridgeDefinition> {
        &self.definition
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Calls `operation` with `arguments` in declaration order.
    ///
    /// A `CancellationToken` argument is never sent; cancelling it abandons
    /// the call with [`ClientError::Cancelled`].
    pub async fn call<R, A>(&self, operation: &str, arguments: A) -> Result<R, ClientError>
    where
        R: WireReturn,
        A: IntoArguments,
    {
        let start = Instant::now();
        let result = self.execute::<R, A>(operation, arguments).await;
        let outcome = match &result {
            Ok(_) => "success",
            Err(ClientError::UnsuccessfulStatus(_)) => "unsuccessful_status",
            Err(ClientError::Cancelled) => "cancelled",
            Err(ClientError::Transport(_)) => "transport_error",
            Err(_) => "error",
        };
        metrics::record_client_call(self.definition.name(), operation, outcome, start);
        if let Err(err) = &result {
            tracing::debug!(
                bridge = %self.definition.name(),
                operation = %operation,
                error = %err,
                "Bridge call failed"
            );
        }
        result
    }

    async fn execute<R, A>(&self, name: &str, arguments: A) -> Result<R, ClientError>
    where
        R: WireReturn,
        A: IntoArguments,
    {
        let operation = self
            .definition
            .operation(name)
            .ok_or_else(|| ClientError::UnknownOperation(name.to_string()))?;

        let expected: Vec<TypeShape> = operation.argument_shapes().cloned().collect();
        let found = A::shapes();
        if expected != found {
            return Err(ClientError::ArgumentMismatch {
                operation: name.to_string(),
                expected: join_shapes(&expected),
                found: join_shapes(&found),
            });
        }
        let returns = R::return_shape();
        if *operation.returns() != returns {
            return Err(ClientError::ReturnMismatch {
                operation: name.to_string(),
                expected: operation.returns().to_string(),
                found: returns.to_string(),
            });
        }

        let values = arguments.into_wire(&self.profile).map_err(ClientError::Encode)?;
        let prepared = PreparedRequest::build(&self.base_url, operation, values)?;
        tracing::debug!(
            bridge = %self.definition.name(),
            operation = %name,
            verb = %operation.verb(),
            url = %prepared.url,
            "Calling bridge operation"
        );
        let cancellation = prepared.cancellation.clone();
        let request = prepared.into_request(&self.http, self.api_key.as_deref())?;

        let exchange = async {
            let response = request.send().await?;
            response::read_envelope(response).await
        };
        let envelope = match cancellation {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => return Err(ClientError::Cancelled),
                result = exchange => result?,
            },
            None => exchange.await?,
        };

        response::decode::<R>(name, envelope, &self.profile)
    }
}

fn join_shapes(shapes: &[TypeShape]) -> String {
    shapes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::OperationSpec;
    use tokio_util::sync::CancellationToken;

    fn client() -> BridgeClient {
        let definition = BridgeDefinition::builder("HelloApi")
            .prefix("api/hello")
            .operation(
                OperationSpec::get("greet", "greet/{name}")
                    .param::<String>("name")
                    .param::<CancellationToken>("token")
                    .returns::<String>(),
            )
            .build()
            .unwrap();
        // Nothing listens here; calls that pass local checks fail in transport.
        BridgeClient::new(Arc::new(definition), "http://127.0.0.1:9/").unwrap()
    }

    #[tokio::test]
    async fn test_unknown_operation() {
        let err = client().call::<String, _>("farewell", ()).await.unwrap_err();
        assert!(matches!(err, ClientError::UnknownOperation(name) if name == "farewell"));
    }

    #[tokio::test]
    async fn test_argument_shapes_are_checked_before_io() {
        let err = client().call::<String, _>("greet", (42,)).await.unwrap_err();
        assert!(matches!(err, ClientError::ArgumentMismatch { .. }));

        let err = client()
            .call::<i32, _>("greet", ("World".to_string(), CancellationToken::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::ReturnMismatch { .. }));
    }

    #[tokio::test]
    async fn test_cancelled_token_abandons_call() {
        let token = CancellationToken::new();
        token.cancel();
        let err = client()
            .call::<String, _>("greet", ("World".to_string(), token))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Cancelled));
    }

    #[test]
    fn test_invalid_base_url() {
        let definition = Arc::new(BridgeDefinition::builder("Empty").build().unwrap());
        assert!(matches!(
            BridgeClient::new(definition.clone(), "not a url"),
            Err(ClientError::InvalidBaseUrl { .. })
        ));
        assert!(matches!(
            BridgeClient::new(definition, "mailto:someone@example.com"),
            Err(ClientError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn test_unknown_profile() {
        let definition = Arc::new(
            BridgeDefinition::builder("Legacy")
                .serializer_profile("klingon")
                .build()
                .unwrap(),
        );
        assert!(matches!(
            BridgeClient::new(definition, "http://localhost/"),
            Err(ClientError::UnknownProfile(name)) if name == "klingon"
        ));
    }
}
