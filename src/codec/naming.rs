//! Field-name casing applied through serde.
//!
//! Only struct field names are renamed. Map keys, enum variant names and
//! string values pass through untouched. Outgoing values are serialized
//! straight into a `serde_json::Value` with each field key converted by the
//! profile's [`FieldNaming`]. Incoming objects bound to a struct have their
//! keys matched against the struct's declared fields: exact name first, then
//! the profile's spelling of the field, then a case-insensitive match.

use serde::de::{self, DeserializeSeed, Deserializer, Visitor};
use serde::ser::{self, Serialize, Serializer};
use serde::forward_to_deserialize_any;
use serde_json::{Map, Value};

use super::profile::FieldNaming;

impl FieldNaming {
    /// Binds an incoming key to one of `fields`, or returns it unchanged.
    fn match_field(self, key: String, fields: &'static [&'static str]) -> String {
        if self == FieldNaming::Preserve || fields.contains(&key.as_str()) {
            return key;
        }
        fields
            .iter()
            .find(|field| self.outgoing(field) == key)
            .or_else(|| {
                fields.iter().find(|field| {
                    field.eq_ignore_ascii_case(&key) || self.outgoing(field).eq_ignore_ascii_case(&key)
                })
            })
            .map(|field| field.to_string())
            .unwrap_or(key)
    }
}

pub(crate) fn to_value<T: Serialize + ?Sized>(naming: FieldNaming, value: &T) -> Result<Value, serde_json::Error> {
    value.serialize(Outgoing(naming))
}

pub(crate) fn from_value<T: de::DeserializeOwned>(naming: FieldNaming, value: Value) -> Result<T, serde_json::Error> {
    T::deserialize(Incoming { value, naming })
}

fn variant_object(variant: &'static str, value: Value) -> Value {
    let mut object = Map::new();
    object.insert(variant.to_string(), value);
    Value::Object(object)
}

#[derive(Clone, Copy)]
struct Outgoing(FieldNaming);

macro_rules! delegate_to_json {
    ($($method:ident($ty:ty)),* $(,)?) => {$(
        fn $method(self, v: $ty) -> Result<Value, serde_json::Error> {
            serde_json::value::Serializer.$method(v)
        }
    )*};
}

impl Serializer for Outgoing {
    type Ok = Value;
    type Error = serde_json::Error;
    type SerializeSeq = OutgoingSeq;
    type SerializeTuple = OutgoingSeq;
    type SerializeTupleStruct = OutgoingSeq;
    type SerializeTupleVariant = OutgoingSeq;
    type SerializeMap = OutgoingMap;
    type SerializeStruct = OutgoingStruct;
    type SerializeStructVariant = OutgoingStruct;

    delegate_to_json!(
        serialize_bool(bool),
        serialize_i8(i8),
        serialize_i16(i16),
        serialize_i32(i32),
        serialize_i64(i64),
        serialize_i128(i128),
        serialize_u8(u8),
        serialize_u16(u16),
        serialize_u32(u32),
        serialize_u64(u64),
        serialize_u128(u128),
        serialize_f32(f32),
        serialize_f64(f64),
        serialize_char(char),
        serialize_str(&str),
        serialize_bytes(&[u8]),
    );

    fn serialize_none(self) -> Result<Value, serde_json::Error> {
        Ok(Value::Null)
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<Value, serde_json::Error> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value, serde_json::Error> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value, serde_json::Error> {
        Ok(Value::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
    ) -> Result<Value, serde_json::Error> {
        Ok(Value::String(variant.to_string()))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Value, serde_json::Error> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value, serde_json::Error> {
        Ok(variant_object(variant, value.serialize(self)?))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<OutgoingSeq, serde_json::Error> {
        Ok(OutgoingSeq::new(self, None, len.unwrap_or(0)))
    }

    fn serialize_tuple(self, len: usize) -> Result<OutgoingSeq, serde_json::Error> {
        Ok(OutgoingSeq::new(self, None, len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<OutgoingSeq, serde_json::Error> {
        Ok(OutgoingSeq::new(self, None, len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<OutgoingSeq, serde_json::Error> {
        Ok(OutgoingSeq::new(self, Some(variant), len))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<OutgoingMap, serde_json::Error> {
        Ok(OutgoingMap {
            naming: self,
            entries: Map::new(),
            key: None,
        })
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<OutgoingStruct, serde_json::Error> {
        Ok(OutgoingStruct {
            naming: self,
            variant: None,
            fields: Map::new(),
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<OutgoingStruct, serde_json::Error> {
        Ok(OutgoingStruct {
            naming: self,
            variant: Some(variant),
            fields: Map::new(),
        })
    }
}

struct OutgoingSeq {
    naming: Outgoing,
    variant: Option<&'static str>,
    items: Vec<Value>,
}

impl OutgoingSeq {
    fn new(naming: Outgoing, variant: Option<&'static str>, len: usize) -> Self {
        Self {
            naming,
            variant,
            items: Vec::with_capacity(len),
        }
    }

    fn push<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), serde_json::Error> {
        self.items.push(value.serialize(self.naming)?);
        Ok(())
    }

    fn finish(self) -> Value {
        let array = Value::Array(self.items);
        match self.variant {
            Some(variant) => variant_object(variant, array),
            None => array,
        }
    }
}

impl ser::SerializeSeq for OutgoingSeq {
    type Ok = Value;
    type Error = serde_json::Error;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), serde_json::Error> {
        self.push(value)
    }

    fn end(self) -> Result<Value, serde_json::Error> {
        Ok(self.finish())
    }
}

impl ser::SerializeTuple for OutgoingSeq {
    type Ok = Value;
    type Error = serde_json::Error;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), serde_json::Error> {
        self.push(value)
    }

    fn end(self) -> Result<Value, serde_json::Error> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleStruct for OutgoingSeq {
    type Ok = Value;
    type Error = serde_json::Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), serde_json::Error> {
        self.push(value)
    }

    fn end(self) -> Result<Value, serde_json::Error> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleVariant for OutgoingSeq {
    type Ok = Value;
    type Error = serde_json::Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), serde_json::Error> {
        self.push(value)
    }

    fn end(self) -> Result<Value, serde_json::Error> {
        Ok(self.finish())
    }
}

struct OutgoingMap {
    naming: Outgoing,
    entries: Map<String, Value>,
    key: Option<String>,
}

impl ser::SerializeMap for OutgoingMap {
    type Ok = Value;
    type Error = serde_json::Error;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<(), serde_json::Error> {
        // Map keys are data: kept as written, only stringified like serde_json does.
        let key = match key.serialize(serde_json::value::Serializer)? {
            Value::String(key) => key,
            Value::Number(key) => key.to_string(),
            Value::Bool(key) => key.to_string(),
            _ => return Err(ser::Error::custom("map key must be a string")),
        };
        self.key = Some(key);
        Ok(())
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), serde_json::Error> {
        let key = self
            .key
            .take()
            .ok_or_else(|| <serde_json::Error as ser::Error>::custom("map value without a key"))?;
        self.entries.insert(key, value.serialize(self.naming)?);
        Ok(())
    }

    fn end(self) -> Result<Value, serde_json::Error> {
        Ok(Value::Object(self.entries))
    }
}

struct OutgoingStruct {
    naming: Outgoing,
    variant: Option<&'static str>,
    fields: Map<String, Value>,
}

impl OutgoingStruct {
    fn insert<T: Serialize + ?Sized>(&mut self, key: &'static str, value: &T) -> Result<(), serde_json::Error> {
        let value = value.serialize(self.naming)?;
        self.fields.insert(self.naming.0.outgoing(key), value);
        Ok(())
    }

    fn finish(self) -> Value {
        let object = Value::Object(self.fields);
        match self.variant {
            Some(variant) => variant_object(variant, object),
            None => object,
        }
    }
}

impl ser::SerializeStruct for OutgoingStruct {
    type Ok = Value;
    type Error = serde_json::Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, key: &'static str, value: &T) -> Result<(), serde_json::Error> {
        self.insert(key, value)
    }

    fn end(self) -> Result<Value, serde_json::Error> {
        Ok(self.finish())
    }
}

impl ser::SerializeStructVariant for OutgoingStruct {
    type Ok = Value;
    type Error = serde_json::Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, key: &'static str, value: &T) -> Result<(), serde_json::Error> {
        self.insert(key, value)
    }

    fn end(self) -> Result<Value, serde_json::Error> {
        Ok(self.finish())
    }
}

/// A parsed JSON value deserialized under a profile's naming.
struct Incoming {
    value: Value,
    naming: FieldNaming,
}

impl<'de> Deserializer<'de> for Incoming {
    type Error = serde_json::Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, serde_json::Error> {
        match self.value {
            Value::Array(items) => visitor.visit_seq(IncomingSeq {
                items: items.into_iter(),
                naming: self.naming,
            }),
            Value::Object(entries) => visitor.visit_map(IncomingMap::new(entries, self.naming, None)),
            other => other.deserialize_any(visitor),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, serde_json::Error> {
        match self.value {
            Value::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, serde_json::Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, serde_json::Error> {
        match self.value {
            Value::Object(entries) => visitor.visit_map(IncomingMap::new(entries, self.naming, Some(fields))),
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, serde_json::Error> {
        match self.value {
            Value::Object(entries) if entries.len() == 1 => {
                let naming = self.naming;
                let Some((variant, value)) = entries.into_iter().next() else {
                    return Err(de::Error::invalid_length(0, &"one variant"));
                };
                visitor.visit_enum(IncomingEnum {
                    variant,
                    payload: Incoming { value, naming },
                })
            }
            other => other.deserialize_enum(name, variants, visitor),
        }
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple tuple_struct map identifier ignored_any
    }
}

struct IncomingSeq {
    items: std::vec::IntoIter<Value>,
    naming: FieldNaming,
}

impl<'de> de::SeqAccess<'de> for IncomingSeq {
    type Error = serde_json::Error;

    fn next_element_seed<T: DeserializeSeed<'de>>(&mut self, seed: T) -> Result<Option<T::Value>, serde_json::Error> {
        match self.items.next() {
            Some(value) => seed
                .deserialize(Incoming {
                    value,
                    naming: self.naming,
                })
                .map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.items.len())
    }
}

struct IncomingMap {
    entries: serde_json::map::IntoIter,
    naming: FieldNaming,
    fields: Option<&'static [&'static str]>,
    pending: Option<Value>,
}

impl IncomingMap {
    fn new(entries: Map<String, Value>, naming: FieldNaming, fields: Option<&'static [&'static str]>) -> Self {
        Self {
            entries: entries.into_iter(),
            naming,
            fields,
            pending: None,
        }
    }
}

impl<'de> de::MapAccess<'de> for IncomingMap {
    type Error = serde_json::Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>, serde_json::Error> {
        let Some((key, value)) = self.entries.next() else {
            return Ok(None);
        };
        self.pending = Some(value);
        let key = match self.fields {
            Some(fields) => self.naming.match_field(key, fields),
            None => key,
        };
        seed.deserialize(Value::String(key)).map(Some)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value, serde_json::Error> {
        let value = self
            .pending
            .take()
            .ok_or_else(|| <serde_json::Error as de::Error>::custom("value is missing"))?;
        seed.deserialize(Incoming {
            value,
            naming: self.naming,
        })
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.entries.len())
    }
}

struct IncomingEnum {
    variant: String,
    payload: Incoming,
}

impl<'de> de::EnumAccess<'de> for IncomingEnum {
    type Error = serde_json::Error;
    type Variant = Incoming;

    fn variant_seed<V: DeserializeSeed<'de>>(self, seed: V) -> Result<(V::Value, Incoming), serde_json::Error> {
        let variant = seed.deserialize(Value::String(self.variant))?;
        Ok((variant, self.payload))
    }
}

impl<'de> de::VariantAccess<'de> for Incoming {
    type Error = serde_json::Error;

    fn unit_variant(self) -> Result<(), serde_json::Error> {
        match self.value {
            Value::Null => Ok(()),
            _ => Err(de::Error::invalid_type(de::Unexpected::Map, &"unit variant")),
        }
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(self, seed: T) -> Result<T::Value, serde_json::Error> {
        seed.deserialize(self)
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value, serde_json::Error> {
        self.deserialize_any(visitor)
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, serde_json::Error> {
        self.deserialize_struct("", fields, visitor)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    enum Shape {
        Point,
        Circle { radius_mm: u32 },
        Pair(i32, i32),
    }

    #[test]
    fn test_field_matching_order() {
        let fields: &'static [&'static str] = &["full_name", "DisplayName"];
        assert_eq!(FieldNaming::CamelCase.match_field("fullName".into(), fields), "full_name");
        assert_eq!(FieldNaming::CamelCase.match_field("FULLNAME".into(), fields), "full_name");
        assert_eq!(FieldNaming::SnakeCase.match_field("display_name".into(), fields), "DisplayName");
        assert_eq!(FieldNaming::Preserve.match_field("fullName".into(), fields), "fullName");
        assert_eq!(FieldNaming::CamelCase.match_field("other".into(), fields), "other");
    }

    #[test]
    fn test_enum_variants_keep_their_names() {
        let shapes = vec![Shape::Point, Shape::Circle { radius_mm: 3 }, Shape::Pair(1, 2)];
        let value = to_value(FieldNaming::PascalCase, &shapes).unwrap();
        assert_eq!(
            value,
            serde_json::json!(["Point", {"Circle": {"RadiusMm": 3}}, {"Pair": [1, 2]}])
        );
        let back: Vec<Shape> = from_value(FieldNaming::PascalCase, value).unwrap();
        assert_eq!(back, shapes);
    }

    #[test]
    fn test_map_keys_inside_structs_are_data() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Tally {
            by_user: BTreeMap<String, u32>,
        }

        let tally = Tally {
            by_user: BTreeMap::from([("user_ID".to_string(), 2)]),
        };
        let value = to_value(FieldNaming::CamelCase, &tally).unwrap();
        assert_eq!(value, serde_json::json!({"byUser": {"user_ID": 2}}));
        assert_eq!(from_value::<Tally>(FieldNaming::CamelCase, value).unwrap(), tally);
    }
}
