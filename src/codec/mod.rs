//! Wire value codecs.
//!
//! # Data Flow
//! ```text
//! client argument  → WireType::to_wire   → WireValue::Text / File / Cancellation
//!                  → RequestBuilder (path, query, form, multipart)
//! server request   → extract (route > query > form)
//!                  → WireType::from_wire → handler argument
//! handler result   → WireReturn::into_envelope → ResponseEnvelope → HTTP
//! HTTP response    → ResponseEnvelope → WireReturn::from_envelope → client result
//! ```
//!
//! # Design Decisions
//! - Serializer selection is done by the Rust type (trait impls), so the
//!   encoder and decoder for a parameter are always the same pair
//! - Complex values go through a named `SerializerProfile` (JSON)
//! - The table of shapes is computed once per operation, never per call

pub mod arguments;
pub mod file_part;
mod naming;
pub mod profile;
pub mod returns;
pub mod scalar;

pub use arguments::IntoArguments;
pub use file_part::FilePart;
pub use profile::{FieldNaming, SerializerProfile, SerializerProfiles};
pub use returns::{ResponseEnvelope, ReturnKind, ReturnShape, WireReturn};
pub use scalar::WireEnum;

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// How a value is carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireKind {
    /// Canonical string form (numbers, booleans, UUIDs, enum case names, strings).
    Scalar,
    /// Structured serializer text (JSON through a profile).
    Complex,
    /// Binary part with its own metadata.
    File,
    /// Bound to the ambient cancellation signal, never on the wire.
    Cancellation,
}

/// Static description of a parameter type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeShape {
    pub type_name: &'static str,
    pub kind: WireKind,
    pub nullable: bool,
    /// True for arrays of structured values.
    pub sequence: bool,
}

impl TypeShape {
    pub fn scalar<T: ?Sized>() -> Self {
        Self::of::<T>(WireKind::Scalar)
    }

    pub fn complex<T: ?Sized>() -> Self {
        Self::of::<T>(WireKind::Complex)
    }

    pub fn of<T: ?Sized>(kind: WireKind) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            kind,
            nullable: false,
            sequence: false,
        }
    }
}

impl std::fmt::Display for TypeShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.nullable {
            write!(f, "Option<{}>", self.type_name)
        } else {
            f.write_str(self.type_name)
        }
    }
}

/// The wire representation of one argument.
#[derive(Debug)]
pub enum WireValue {
    Text(String),
    /// A nullable argument with no value.
    Null,
    File(FilePart),
    Cancellation(CancellationToken),
}

impl WireValue {
    /// Text content, `None` for `Null`. Files and signals are rejected.
    pub fn into_text(self) -> Result<Option<String>, CodecError> {
        match self {
            WireValue::Text(text) => Ok(Some(text)),
            WireValue::Null => Ok(None),
            WireValue::File(_) | WireValue::Cancellation(_) => {
                Err(CodecError::UnexpectedWire { expected: "text" })
            }
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            WireValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Errors raised while encoding or decoding wire values.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid value {value:?} for {type_name}: {reason}")]
    InvalidValue {
        type_name: &'static str,
        value: String,
        reason: String,
    },

    #[error("missing value for {0}")]
    Missing(&'static str),

    #[error("structured value error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a {expected} wire value")]
    UnexpectedWire { expected: &'static str },

    /// A non-nullable structured result decoded to `null`.
    #[error("response was null for non-nullable {0}")]
    NullResult(&'static str),
}

impl CodecError {
    pub fn invalid<T: ?Sized>(value: &str, reason: impl std::fmt::Display) -> Self {
        CodecError::InvalidValue {
            type_name: std::any::type_name::<T>(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// A type that can travel as an operation argument.
pub trait WireType: Sized + Send + 'static {
    fn shape() -> TypeShape;

    /// Client-side encoding.
    fn to_wire(self, profile: &SerializerProfile) -> Result<WireValue, CodecError>;

    /// Server-side decoding of a value that was present in the request.
    fn from_wire(value: WireValue, profile: &SerializerProfile) -> Result<Self, CodecError>;

    /// Value bound when the request carried nothing under the parameter's name.
    fn absent() -> Result<Self, CodecError> {
        Err(CodecError::Missing(std::any::type_name::<Self>()))
    }

    /// Whether `text` counts as no value for a nullable parameter.
    fn is_blank(text: &str) -> bool {
        text.trim().is_empty()
    }
}

impl<T: WireType> WireType for Option<T> {
    fn shape() -> TypeShape {
        TypeShape {
            nullable: true,
            ..T::shape()
        }
    }

    fn to_wire(self, profile: &SerializerProfile) -> Result<WireValue, CodecError> {
        match self {
            Some(value) => value.to_wire(profile),
            None => Ok(WireValue::Null),
        }
    }

    fn from_wire(value: WireValue, profile: &SerializerProfile) -> Result<Self, CodecError> {
        match value {
            WireValue::Null => Ok(None),
            WireValue::Text(text) if T::is_blank(&text) => Ok(None),
            other => T::from_wire(other, profile).map(Some),
        }
    }

    fn absent() -> Result<Self, CodecError> {
        Ok(None)
    }
}

/// Marks a value for the structured serializer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> WireType for Json<T>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    fn shape() -> TypeShape {
        TypeShape::complex::<T>()
    }

    fn to_wire(self, profile: &SerializerProfile) -> Result<WireValue, CodecError> {
        Ok(WireValue::Text(profile.to_text(&self.0)?))
    }

    fn from_wire(value: WireValue, profile: &SerializerProfile) -> Result<Self, CodecError> {
        match value.into_text()? {
            Some(text) => Ok(Json(profile.from_text(&text)?)),
            None => Self::absent(),
        }
    }
}

impl<T> WireType for Vec<T>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    fn shape() -> TypeShape {
        TypeShape {
            sequence: true,
            ..TypeShape::complex::<Self>()
        }
    }

    fn to_wire(self, profile: &SerializerProfile) -> Result<WireValue, CodecError> {
        Ok(WireValue::Text(profile.to_text(&self)?))
    }

    fn from_wire(value: WireValue, profile: &SerializerProfile) -> Result<Self, CodecError> {
        match value.into_text()? {
            Some(text) => Ok(profile.from_text(&text)?),
            None => Self::absent(),
        }
    }
}

impl WireType for CancellationToken {
    fn shape() -> TypeShape {
        TypeShape::of::<Self>(WireKind::Cancellation)
    }

    fn to_wire(self, _profile: &SerializerProfile) -> Result<WireValue, CodecError> {
        Ok(WireValue::Cancellation(self))
    }

    fn from_wire(value: WireValue, _profile: &SerializerProfile) -> Result<Self, CodecError> {
        match value {
            WireValue::Cancellation(token) => Ok(token),
            _ => Err(CodecError::UnexpectedWire {
                expected: "cancellation",
            }),
        }
    }

    fn absent() -> Result<Self, CodecError> {
        Ok(CancellationToken::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct PocoTest {
        child_name: String,
        child_age: i32,
    }

    fn round_trip<T: WireType>(value: T) -> T {
        let profile = SerializerProfile::web();
        let wire = value.to_wire(&profile).unwrap();
        T::from_wire(wire, &profile).unwrap()
    }

    #[test]
    fn test_option_round_trip() {
        assert_eq!(round_trip(Some(42i32)), Some(42));
        assert_eq!(round_trip(None::<i32>), None);
        assert_eq!(round_trip(Some("x".to_string())), Some("x".to_string()));
    }

    #[test]
    fn test_option_empty_text_is_none() {
        let profile = SerializerProfile::web();
        let decoded = Option::<i64>::from_wire(WireValue::Text("  ".into()), &profile).unwrap();
        assert_eq!(decoded, None);
        assert_eq!(Option::<i64>::absent().unwrap(), None);
    }

    #[test]
    fn test_option_string_keeps_whitespace() {
        assert_eq!(round_trip(Some("  ".to_string())), Some("  ".to_string()));
        let profile = SerializerProfile::web();
        assert_eq!(Option::<String>::from_wire(WireValue::Text(String::new()), &profile).unwrap(), None);
    }

    #[test]
    fn test_complex_round_trip() {
        let value = Json(PocoTest {
            child_name: "Kid".into(),
            child_age: 7,
        });
        assert_eq!(round_trip(value.clone()), value);
    }

    #[test]
    fn test_sequence_round_trip() {
        let items = vec![
            PocoTest { child_name: "A".into(), child_age: 1 },
            PocoTest { child_name: "B".into(), child_age: 2 },
        ];
        assert_eq!(round_trip(items.clone()), items);
        assert!(Vec::<PocoTest>::shape().sequence);
    }

    #[test]
    fn test_complex_uses_profile_naming() {
        let profile = SerializerProfile::web();
        let wire = Json(PocoTest {
            child_name: "Kid".into(),
            child_age: 7,
        })
        .to_wire(&profile)
        .unwrap();
        let text = wire.as_text().unwrap();
        assert!(text.contains("\"childName\""));
        assert!(text.contains("\"childAge\""));
    }

    #[test]
    fn test_missing_complex_is_an_error() {
        assert!(matches!(
            Json::<PocoTest>::absent(),
            Err(CodecError::Missing(_))
        ));
    }

    #[test]
    fn test_shape_display() {
        let shape = Option::<i32>::shape();
        assert!(shape.nullable);
        assert_eq!(shape.to_string(), "Option<i32>");
    }
}
