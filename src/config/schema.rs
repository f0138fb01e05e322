//! Configuration schema definitions.
//!
//! This module defines the configuration of a bridge host and its clients.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::codec::FieldNaming;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BridgeConfig {
    /// Host settings (bind address, limits).
    pub server: ServerConfig,

    /// Client settings (base URL, timeouts).
    pub client: ClientConfig,

    /// Structured serializer profiles.
    pub serialization: SerializationConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Caller identities.
    pub security: SecurityConfig,
}

/// Host configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:5199").
    pub bind_address: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Maximum request body size in bytes (form and multipart bodies included).
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:5199".to_string(),
            request_timeout_secs: 30,
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL every operation path is resolved against.
    pub base_url: String,

    /// Whole-call timeout in seconds.
    pub timeout_secs: u64,

    pub connect_timeout_secs: u64,

    /// Bearer API key sent with every call.
    pub api_key: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5199/".to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 5,
            api_key: None,
        }
    }
}

/// Structured serializer configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SerializationConfig {
    /// Profile used by bridges that do not name one.
    pub default_profile: String,

    /// Additional named profiles.
    pub profiles: Vec<ProfileConfig>,
}

impl Default for SerializationConfig {
    fn default() -> Self {
        Self {
            default_profile: "web".to_string(),
            profiles: Vec::new(),
        }
    }
}

/// A named serializer profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProfileConfig {
    pub name: String,
    pub naming: FieldNaming,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Security configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SecurityConfig {
    /// Bearer API keys and the principals they authenticate.
    pub api_keys: Vec<ApiKeyConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiKeyConfig {
    pub key: String,

    /// Principal name.
    pub name: String,

    #[serde(default)]
    pub roles: Vec<String>,
}
