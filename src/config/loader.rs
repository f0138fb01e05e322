//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::BridgeConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Validation(_) => None,
        }
    }
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<BridgeConfig, ConfigError> {
    let config: BridgeConfig = toml::from_str(content).map_err(ConfigError::Parse)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<BridgeConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::FieldNaming;
    use crate::config::schema::LogFormat;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.server.bind_address, "127.0.0.1:5199");
        assert_eq!(config.serialization.default_profile, "web");
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_full_config() {
        let config = parse_config(
            r#"
            [server]
            bind_address = "0.0.0.0:8080"
            request_timeout_secs = 10

            [client]
            base_url = "http://bridge.internal:8080/"
            api_key = "secret"

            [serialization]
            default_profile = "legacy"
            [[serialization.profiles]]
            name = "legacy"
            naming = "pascal_case"

            [observability]
            log_format = "json"

            [[security.api_keys]]
            key = "secret"
            name = "alice"
            roles = ["Admin"]
            "#,
        )
        .unwrap();

        assert_eq!(config.server.request_timeout_secs, 10);
        assert_eq!(config.server.max_body_bytes, 2 * 1024 * 1024);
        assert_eq!(config.client.api_key.as_deref(), Some("secret"));
        assert_eq!(config.serialization.profiles[0].naming, FieldNaming::PascalCase);
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.security.api_keys[0].roles, vec!["Admin"]);
    }

    #[test]
    fn test_parse_and_validation_errors() {
        assert!(matches!(parse_config("[server"), Err(ConfigError::Parse(_))));

        let err = parse_config("[server]\nrequest_timeout_secs = 0").unwrap_err();
        assert!(matches!(&err, ConfigError::Validation(errors) if errors.len() == 1));
        assert!(err.to_string().starts_with("Validation failed: server.request_timeout_secs"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
