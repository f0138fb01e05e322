//! HTTP server setup for the bridge host.
//!
//! # Responsibilities
//! - Wrap the dispatcher router with host middleware (principal, limits, timeout, tracing)
//! - Bind to a listener and serve until shutdown

use std::time::Duration;

use axum::{extract::DefaultBodyLimit, middleware, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use super::RouteDispatcher;
use crate::config::BridgeConfig;
use crate::lifecycle::shutdown_signal;
use crate::security::{api_key_middleware, ApiKeyStore};

/// HTTP server serving every bridge mounted on a [`RouteDispatcher`].
pub struct BridgeServer {
    router: Router,
}

impl BridgeServer {
    pub fn new(config: &BridgeConfig, dispatcher: RouteDispatcher) -> Self {
        let router = Self::build_router(config, dispatcher.into_router());
        Self { router }
    }

    /// Build the router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &BridgeConfig, routes: Router) -> Router {
        let keys = ApiKeyStore::from_config(&config.security.api_keys);
        let max_body = config.server.max_body_bytes;
        routes
            .layer(middleware::from_fn_with_state(keys, api_key_middleware))
            .layer(DefaultBodyLimit::max(max_body))
            .layer(RequestBodyLimitLayer::new(max_body))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.server.request_timeout_secs,
            )))
            .layer(TraceLayer::new_for_http())
    }

    /// The fully layered router, for in-process tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections until `shutdown` fires or Ctrl+C.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Bridge server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal(shutdown))
            .await?;

        tracing::info!("Bridge server stopped");
        Ok(())
    }
}
