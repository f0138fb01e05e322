//! Built-in scalar codecs.
//!
//! Scalars travel in their canonical string form. Decoding uses the type's
//! canonical parse, falling back to a best-effort numeric or boolean
//! conversion ("3.0" for an integer, "1"/"0" for a boolean). Out-of-range
//! integers are rejected, never saturated. Non-nullable scalars with no
//! value (or an empty one) decode to the type's default.

use std::num::IntErrorKind;

use uuid::Uuid;

use super::{CodecError, SerializerProfile, TypeShape, WireType, WireValue};

/// An enum encoded by its case name.
///
/// Implemented through [`wire_enum!`](crate::wire_enum).
pub trait WireEnum: Sized + Copy + Send + 'static {
    const VARIANTS: &'static [Self];

    fn name(&self) -> &'static str;

    /// Exact name first, then a case-insensitive match.
    fn from_name(name: &str) -> Option<Self> {
        Self::VARIANTS
            .iter()
            .copied()
            .find(|variant| variant.name() == name)
            .or_else(|| {
                Self::VARIANTS
                    .iter()
                    .copied()
                    .find(|variant| variant.name().eq_ignore_ascii_case(name))
            })
    }
}

pub fn encode_enum<E: WireEnum>(value: E) -> WireValue {
    WireValue::Text(value.name().to_string())
}

pub fn decode_enum<E: WireEnum>(value: WireValue) -> Result<E, CodecError> {
    let text = value.into_text()?.unwrap_or_default();
    let name = text.trim();
    if name.is_empty() {
        return Err(CodecError::Missing(std::any::type_name::<E>()));
    }
    E::from_name(name).ok_or_else(|| {
        let known: Vec<&str> = E::VARIANTS.iter().map(WireEnum::name).collect();
        CodecError::invalid::<E>(name, format!("expected one of {}", known.join(", ")))
    })
}

/// Implements [`WireEnum`] and [`WireType`] for a field-less enum.
///
/// ```
/// #[derive(Debug, Clone, Copy, PartialEq)]
/// enum TestEnum { A, B, C }
/// interface_bridge::wire_enum!(TestEnum { A, B, C });
/// ```
#[macro_export]
macro_rules! wire_enum {
    ($ty:ident { $($variant:ident),+ $(,)? }) => {
        impl $crate::codec::WireEnum for $ty {
            const VARIANTS: &'static [Self] = &[$($ty::$variant),+];

            fn name(&self) -> &'static str {
                match self {
                    $($ty::$variant => stringify!($variant)),+
                }
            }
        }

        impl $crate::codec::WireType for $ty {
            fn shape() -> $crate::codec::TypeShape {
                $crate::codec::TypeShape::scalar::<Self>()
            }

            fn to_wire(
                self,
                _profile: &$crate::codec::SerializerProfile,
            ) -> Result<$crate::codec::WireValue, $crate::codec::CodecError> {
                Ok($crate::codec::scalar::encode_enum(self))
            }

            fn from_wire(
                value: $crate::codec::WireValue,
                _profile: &$crate::codec::SerializerProfile,
            ) -> Result<Self, $crate::codec::CodecError> {
                $crate::codec::scalar::decode_enum(value)
            }
        }
    };
}

/// Implements [`WireType`] for a type with `FromStr` and `Display`.
///
/// A missing value is an error since such types have no neutral default.
#[macro_export]
macro_rules! wire_parse {
    ($($ty:ty),+ $(,)?) => {$(
        impl $crate::codec::WireType for $ty {
            fn shape() -> $crate::codec::TypeShape {
                $crate::codec::TypeShape::scalar::<Self>()
            }

            fn to_wire(
                self,
                _profile: &$crate::codec::SerializerProfile,
            ) -> Result<$crate::codec::WireValue, $crate::codec::CodecError> {
                Ok($crate::codec::WireValue::Text(self.to_string()))
            }

            fn from_wire(
                value: $crate::codec::WireValue,
                _profile: &$crate::codec::SerializerProfile,
            ) -> Result<Self, $crate::codec::CodecError> {
                match value.into_text()? {
                    Some(text) if !text.trim().is_empty() => text
                        .trim()
                        .parse::<$ty>()
                        .map_err(|err| $crate::codec::CodecError::invalid::<$ty>(&text, err)),
                    _ => <Self as $crate::codec::WireType>::absent(),
                }
            }
        }
    )+};
}

/// Returns the trimmed text, or `None` when there is nothing to parse.
fn scalar_text(value: WireValue) -> Result<Option<String>, CodecError> {
    Ok(value
        .into_text()?
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty()))
}

/// A whole number written with a fraction or exponent ("3.0", "1e3").
fn integral_float(text: &str) -> Option<f64> {
    if !text.contains(['.', 'e', 'E']) {
        return None;
    }
    text.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite() && n.fract() == 0.0)
}

macro_rules! integer_wire_type {
    ($($ty:ty),+) => {$(
        impl WireType for $ty {
            fn shape() -> TypeShape {
                TypeShape::scalar::<Self>()
            }

            fn to_wire(self, _profile: &SerializerProfile) -> Result<WireValue, CodecError> {
                Ok(WireValue::Text(self.to_string()))
            }

            fn from_wire(value: WireValue, _profile: &SerializerProfile) -> Result<Self, CodecError> {
                let Some(text) = scalar_text(value)? else {
                    return Self::absent();
                };
                text.parse::<$ty>().or_else(|err| {
                    if matches!(err.kind(), IntErrorKind::PosOverflow | IntErrorKind::NegOverflow) {
                        return Err(CodecError::invalid::<$ty>(&text, err));
                    }
                    integral_float(&text)
                        .filter(|n| *n >= <$ty>::MIN as f64 && *n < <$ty>::MAX as f64 + 1.0)
                        .and_then(|n| {
                            let cast = n as $ty;
                            (cast as f64 == n).then_some(cast)
                        })
                        .ok_or_else(|| CodecError::invalid::<$ty>(&text, err))
                })
            }

            fn absent() -> Result<Self, CodecError> {
                Ok(0)
            }
        }
    )+};
}

integer_wire_type!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

macro_rules! float_wire_type {
    ($($ty:ty),+) => {$(
        impl WireType for $ty {
            fn shape() -> TypeShape {
                TypeShape::scalar::<Self>()
            }

            fn to_wire(self, _profile: &SerializerProfile) -> Result<WireValue, CodecError> {
                Ok(WireValue::Text(self.to_string()))
            }

            fn from_wire(value: WireValue, _profile: &SerializerProfile) -> Result<Self, CodecError> {
                match scalar_text(value)? {
                    Some(text) => text
                        .parse::<$ty>()
                        .map_err(|err| CodecError::invalid::<$ty>(&text, err)),
                    None => Self::absent(),
                }
            }

            fn absent() -> Result<Self, CodecError> {
                Ok(0.0)
            }
        }
    )+};
}

float_wire_type!(f32, f64);

impl WireType for bool {
    fn shape() -> TypeShape {
        TypeShape::scalar::<Self>()
    }

    fn to_wire(self, _profile: &SerializerProfile) -> Result<WireValue, CodecError> {
        Ok(WireValue::Text(self.to_string()))
    }

    fn from_wire(value: WireValue, _profile: &SerializerProfile) -> Result<Self, CodecError> {
        let Some(text) = scalar_text(value)? else {
            return Self::absent();
        };
        if text.eq_ignore_ascii_case("true") || text == "1" {
            Ok(true)
        } else if text.eq_ignore_ascii_case("false") || text == "0" {
            Ok(false)
        } else {
            Err(CodecError::invalid::<bool>(&text, "expected true or false"))
        }
    }

    fn absent() -> Result<Self, CodecError> {
        Ok(false)
    }
}

impl WireType for Uuid {
    fn shape() -> TypeShape {
        TypeShape::scalar::<Self>()
    }

    fn to_wire(self, _profile: &SerializerProfile) -> Result<WireValue, CodecError> {
        Ok(WireValue::Text(self.hyphenated().to_string()))
    }

    fn from_wire(value: WireValue, _profile: &SerializerProfile) -> Result<Self, CodecError> {
        match scalar_text(value)? {
            Some(text) => Uuid::parse_str(&text).map_err(|err| CodecError::invalid::<Uuid>(&text, err)),
            None => Self::absent(),
        }
    }

    fn absent() -> Result<Self, CodecError> {
        Ok(Uuid::nil())
    }
}

impl WireType for String {
    fn shape() -> TypeShape {
        TypeShape::scalar::<Self>()
    }

    fn to_wire(self, _profile: &SerializerProfile) -> Result<WireValue, CodecError> {
        Ok(WireValue::Text(self))
    }

    // Strings are taken verbatim, an empty string stays empty.
    fn from_wire(value: WireValue, _profile: &SerializerProfile) -> Result<Self, CodecError> {
        Ok(value.into_text()?.unwrap_or_default())
    }

    fn absent() -> Result<Self, CodecError> {
        Ok(String::new())
    }

    fn is_blank(text: &str) -> bool {
        text.is_empty()
    }
}
