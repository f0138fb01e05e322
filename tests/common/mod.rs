//! Shared utilities for end-to-end tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use interface_bridge::codec::SerializerProfiles;
use interface_bridge::config::ApiKeyConfig;
use interface_bridge::{BridgeClient, BridgeConfig, BridgeDefinition, BridgeServer, RouteDispatcher, Shutdown};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A bridge host on an ephemeral local port.
pub struct TestHost {
    pub addr: SocketAddr,
    shutdown: Shutdown,
    handle: JoinHandle<()>,
}

impl TestHost {
    pub fn base_url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// A client for `definition` talking to this host, optionally with a bearer key.
    pub fn client(&self, definition: Arc<BridgeDefinition>, api_key: Option<&str>) -> BridgeClient {
        let client = BridgeClient::with_client(
            definition,
            &self.base_url(),
            http_client(),
            &SerializerProfiles::default(),
        )
        .expect("client");
        match api_key {
            Some(key) => client.with_api_key(key),
            None => client,
        }
    }

    pub async fn stop(self) {
        self.shutdown.trigger();
        let _ = self.handle.await;
    }
}

/// Config with two API keys: `alice-key` (no roles) and `admin-key` (Admin).
pub fn config() -> BridgeConfig {
    let mut config = BridgeConfig::default();
    config.security.api_keys = vec![
        ApiKeyConfig {
            key: "alice-key".into(),
            name: "alice".into(),
            roles: vec![],
        },
        ApiKeyConfig {
            key: "admin-key".into(),
            name: "root".into(),
            roles: vec!["Admin".into()],
        },
    ];
    config
}

/// Bind, then serve in the background; the listener is ready on return.
pub async fn start_host(config: BridgeConfig, dispatcher: RouteDispatcher) -> TestHost {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = BridgeServer::new(&config, dispatcher);
    let rx = shutdown.subscribe();
    let handle = tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });
    TestHost {
        addr,
        shutdown,
        handle,
    }
}

/// A reqwest client that never goes through a system proxy.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
