//! Structured serializer profiles.
//!
//! A profile decides how struct field names look on the wire. Outgoing field
//! names take the profile's casing; incoming keys bind to fields by exact
//! name, the profile's spelling, or case-insensitively, so a web client
//! sending `fullName` or `FullName` binds the same field. Map keys are data
//! and are never renamed.

use std::collections::HashMap;

use heck::{ToLowerCamelCase, ToSnakeCase, ToUpperCamelCase};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use super::naming;

use crate::config::schema::SerializationConfig;

/// Key casing applied by a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldNaming {
    /// Keys are written and read exactly as serde produces them.
    Preserve,
    CamelCase,
    PascalCase,
    SnakeCase,
}

impl FieldNaming {
    pub(crate) fn outgoing(self, key: &str) -> String {
        match self {
            FieldNaming::Preserve => key.to_string(),
            FieldNaming::CamelCase => key.to_lower_camel_case(),
            FieldNaming::PascalCase => key.to_upper_camel_case(),
            FieldNaming::SnakeCase => key.to_snake_case(),
        }
    }
}

/// A named structured-serializer configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializerProfile {
    name: String,
    naming: FieldNaming,
}

impl SerializerProfile {
    pub const WEB: &'static str = "web";

    pub fn new(name: impl Into<String>, naming: FieldNaming) -> Self {
        Self {
            name: name.into(),
            naming,
        }
    }

    /// Web-conventional naming (camelCase), the default profile.
    pub fn web() -> Self {
        Self::new(Self::WEB, FieldNaming::CamelCase)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn naming(&self) -> FieldNaming {
        self.naming
    }

    pub fn to_value<T: Serialize + ?Sized>(&self, value: &T) -> Result<Value, serde_json::Error> {
        naming::to_value(self.naming, value)
    }

    pub fn to_text<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.to_value(value)?)
    }

    pub fn to_bytes<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&self.to_value(value)?)
    }

    pub fn parse_value(&self, text: &[u8]) -> Result<Value, serde_json::Error> {
        serde_json::from_slice(text)
    }

    /// Binds a parsed value, matching object keys to struct fields.
    pub fn from_value<T: DeserializeOwned>(&self, value: Value) -> Result<T, serde_json::Error> {
        naming::from_value(self.naming, value)
    }

    pub fn from_text<T: DeserializeOwned>(&self, text: &str) -> Result<T, serde_json::Error> {
        self.from_value(self.parse_value(text.as_bytes())?)
    }
}

impl Default for SerializerProfile {
    fn default() -> Self {
        Self::web()
    }
}

/// Registry of named profiles a bridge definition can refer to.
#[derive(Debug, Clone)]
pub struct SerializerProfiles {
    profiles: HashMap<String, SerializerProfile>,
    default_profile: String,
}

impl SerializerProfiles {
    /// The built-in profiles: `web` (default), `pascal`, `snake` and `preserve`.
    pub fn new() -> Self {
        let profiles = [
            SerializerProfile::web(),
            SerializerProfile::new("pascal", FieldNaming::PascalCase),
            SerializerProfile::new("snake", FieldNaming::SnakeCase),
            SerializerProfile::new("preserve", FieldNaming::Preserve),
        ]
        .into_iter()
        .map(|profile| (profile.name.clone(), profile))
        .collect();

        Self {
            profiles,
            default_profile: SerializerProfile::WEB.to_string(),
        }
    }

    /// Built-ins plus the profiles declared in configuration.
    ///
    /// Expects a validated config; an unknown default falls back to `web`.
    pub fn from_config(config: &SerializationConfig) -> Self {
        let mut profiles = Self::new();
        for profile in &config.profiles {
            profiles.insert(SerializerProfile::new(&profile.name, profile.naming));
        }
        if profiles.contains(&config.default_profile) {
            profiles.default_profile = config.default_profile.clone();
        } else {
            tracing::warn!(
                profile = %config.default_profile,
                "Unknown default serializer profile, using web"
            );
        }
        profiles
    }

    pub fn insert(&mut self, profile: SerializerProfile) {
        self.profiles.insert(profile.name.clone(), profile);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.profiles.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&SerializerProfile> {
        self.profiles.get(name)
    }

    pub fn default_profile(&self) -> &SerializerProfile {
        self.profiles
            .get(&self.default_profile)
            .unwrap_or_else(|| &self.profiles[SerializerProfile::WEB])
    }

    /// Resolves a bridge's declared profile, falling back to the default.
    pub fn resolve(&self, name: Option<&str>) -> Option<&SerializerProfile> {
        match name {
            Some(name) => self.get(name),
            None => Some(self.default_profile()),
        }
    }
}

impl Default for SerializerProfiles {
    fn default() -> Self {
        Self::new()
    }
}
