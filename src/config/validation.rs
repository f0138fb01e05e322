//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (the default profile exists)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Detect duplicate profile names and API keys
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BridgeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::fmt;
use std::net::SocketAddr;

use url::Url;

use crate::codec::SerializerProfiles;
use crate::config::schema::BridgeConfig;

/// One semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &BridgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "server.bind_address",
            format!("invalid socket address {:?}", config.server.bind_address),
        ));
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::new("server.request_timeout_secs", "must be greater than 0"));
    }
    if config.server.max_body_bytes == 0 {
        errors.push(ValidationError::new("server.max_body_bytes", "must be greater than 0"));
    }

    match Url::parse(&config.client.base_url) {
        Ok(url) if url.cannot_be_a_base() => {
            errors.push(ValidationError::new("client.base_url", "must be a base URL"));
        }
        Ok(_) => {}
        Err(err) => {
            errors.push(ValidationError::new("client.base_url", err.to_string()));
        }
    }
    if config.client.timeout_secs == 0 {
        errors.push(ValidationError::new("client.timeout_secs", "must be greater than 0"));
    }
    if config.client.connect_timeout_secs == 0 {
        errors.push(ValidationError::new("client.connect_timeout_secs", "must be greater than 0"));
    }

    let builtin = SerializerProfiles::new();
    let mut names = HashSet::new();
    for (index, profile) in config.serialization.profiles.iter().enumerate() {
        let field = format!("serialization.profiles[{index}].name");
        if profile.name.trim().is_empty() {
            errors.push(ValidationError::new(field, "must not be empty"));
        } else if builtin.contains(&profile.name) {
            errors.push(ValidationError::new(
                field,
                format!("{:?} is a built-in profile", profile.name),
            ));
        } else if !names.insert(profile.name.as_str()) {
            errors.push(ValidationError::new(
                field,
                format!("duplicate profile {:?}", profile.name),
            ));
        }
    }
    let default = config.serialization.default_profile.as_str();
    if !builtin.contains(default) && !names.contains(default) {
        errors.push(ValidationError::new(
            "serialization.default_profile",
            format!("unknown profile {default:?}"),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("invalid socket address {:?}", config.observability.metrics_address),
        ));
    }

    let mut keys = HashSet::new();
    for (index, entry) in config.security.api_keys.iter().enumerate() {
        if entry.key.trim().is_empty() {
            errors.push(ValidationError::new(
                format!("security.api_keys[{index}].key"),
                "must not be empty",
            ));
        } else if !keys.insert(entry.key.as_str()) {
            errors.push(ValidationError::new(
                format!("security.api_keys[{index}].key"),
                "duplicate key",
            ));
        }
        if entry.name.trim().is_empty() {
            errors.push(ValidationError::new(
                format!("security.api_keys[{index}].name"),
                "must not be empty",
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::FieldNaming;
    use crate::config::schema::{ApiKeyConfig, ProfileConfig};

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&BridgeConfig::default()), Ok(()));
    }

    #[test]
    fn test_all_errors_are_collected() {
        let mut config = BridgeConfig::default();
        config.server.bind_address = "nowhere".into();
        config.server.request_timeout_secs = 0;
        config.client.base_url = "not a url".into();
        config.serialization.default_profile = "legacy".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "server.bind_address",
                "server.request_timeout_secs",
                "client.base_url",
                "serialization.default_profile",
            ]
        );
    }

    #[test]
    fn test_declared_profile_can_be_default() {
        let mut config = BridgeConfig::default();
        config.serialization.default_profile = "legacy".into();
        config.serialization.profiles.push(ProfileConfig {
            name: "legacy".into(),
            naming: FieldNaming::PascalCase,
        });
        assert_eq!(validate_config(&config), Ok(()));

        config.serialization.profiles.push(ProfileConfig {
            name: "web".into(),
            naming: FieldNaming::SnakeCase,
        });
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "serialization.profiles[1].name");
    }

    #[test]
    fn test_duplicate_api_keys() {
        let mut config = BridgeConfig::default();
        for name in ["alice", "bob"] {
            config.security.api_keys.push(ApiKeyConfig {
                key: "same".into(),
                name: name.into(),
                roles: Vec::new(),
            });
        }
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "security.api_keys[1].key: duplicate key");
    }
}
