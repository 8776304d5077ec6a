use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use serde::de::{DeserializeOwned, IntoDeserializer, Visitor};
use serde::ser::{SerializeMap, SerializeSeq, SerializeTupleStruct};
use serde::{Deserialize, Serialize, Serializer};

use crate::structure::{BasicStruct, Structure};
use crate::value::{Value, ValueMap};
use crate::{ErrorCode, PackStreamError};

/// Marks a structure crossing the serde data model.
///
/// Serializing emits a tuple struct of this name holding `(signature, fields)`, which
/// [`to_value`] rebuilds into a [`Value::Struct`]. Self-describing deserialization presents a
/// structure as a one-entry map under this key, which `Deserialize for Value` recognises.
/// Sequence-shaped targets see `(signature, fields)`.
const STRUCT_TOKEN: &str = "$packstream::Structure";

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::Text(s) => serializer.serialize_str(s),
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Map(map) => {
                let mut m = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map.iter() {
                    m.serialize_entry(k, v)?;
                }
                m.end()
            }
            Self::Struct(s) => serialize_structure(s, serializer),
            Self::Domain(d) => serialize_structure(d, serializer),
        }
    }
}

fn serialize_structure<T, S>(s: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Structure + ?Sized,
    S: Serializer,
{
    let mut ts = serializer.serialize_tuple_struct(STRUCT_TOKEN, 2)?;
    ts.serialize_field(&s.signature())?;
    ts.serialize_field(&*s.fields())?;
    ts.end()
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a PackStream value")
    }

    fn visit_bool<E>(self, v: bool) -> Result<Self::Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Value::Int(v))
    }

    fn visit_i128<E>(self, v: i128) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        i64::try_from(v)
            .map(Value::Int)
            .map_err(|_| E::custom("integer outside the signed 64-bit range"))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        i64::try_from(v)
            .map(Value::Int)
            .map_err(|_| E::custom("integer outside the signed 64-bit range"))
    }

    fn visit_u128<E>(self, v: u128) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        i64::try_from(v)
            .map(Value::Int)
            .map_err(|_| E::custom("integer outside the signed 64-bit range"))
    }

    fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E> {
        Ok(Value::Float(v))
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E> {
        Ok(Value::text(v))
    }

    fn visit_string<E>(self, v: String) -> Result<Self::Value, E> {
        Ok(Value::Text(v))
    }

    fn visit_bytes<E>(self, _v: &[u8]) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Err(E::custom("byte strings have no PackStream representation"))
    }

    fn visit_none<E>(self) -> Result<Self::Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Deserialize::deserialize(deserializer)
    }

    fn visit_unit<E>(self) -> Result<Self::Value, E> {
        Ok(Value::Null)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::SeqAccess<'de>,
    {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0).min(4096));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::List(items))
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::MapAccess<'de>,
    {
        let mut entries: Vec<(Value, Value)> =
            Vec::with_capacity(map.size_hint().unwrap_or(0).min(4096));
        while let Some(entry) = map.next_entry()? {
            entries.push(entry);
        }
        let marked = matches!(
            entries.as_slice(),
            [(Value::Text(key), Value::List(_))] if key.as_str() == STRUCT_TOKEN
        );
        if marked {
            if let Some((_, Value::List(parts))) = entries.pop() {
                return structure_from_parts(parts)
                    .map(Value::Struct)
                    .map_err(|code| <A::Error as serde::de::Error>::custom(code.message()));
            }
        }
        Ok(Value::Map(ValueMap::from_entries(entries)))
    }
}

/// Serialize a Rust value into PackStream bytes.
///
/// # Errors
///
/// Returns `UnsupportedValue` for byte buffers, `ValueOutOfRange` for integers outside the
/// signed 64-bit range, or any encoding error.
pub fn to_vec<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, PackStreamError> {
    let v = to_value(value)?;
    crate::pack(&v)
}

/// Deserialize a Rust value from a buffer holding exactly one PackStream value.
///
/// # Errors
///
/// Returns a decode error for malformed input or a conversion error if the decoded value does
/// not match the target type.
pub fn from_slice<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, PackStreamError> {
    let v = crate::unpack_single(bytes, None)?;
    from_value(v)
}

/// Convert a Rust value into a [`Value`].
///
/// Structs become maps keyed by field name. Enum variants become single-entry maps
/// `{variant: payload}`, with a null payload for unit variants.
///
/// # Errors
///
/// Returns `UnsupportedValue` for byte buffers and `ValueOutOfRange` for integers outside the
/// signed 64-bit range.
pub fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value, PackStreamError> {
    value
        .serialize(ValueSerializer)
        .map_err(|err| PackStreamError::new(err.code, 0))
}

/// Deserialize a Rust value from a [`Value`].
///
/// # Errors
///
/// Returns a conversion error if the value does not match the target type.
pub fn from_value<T: DeserializeOwned>(value: Value) -> Result<T, PackStreamError> {
    T::deserialize(ValueDeserializer::new(value)).map_err(|err| PackStreamError::convert(err.code))
}

#[derive(Debug, Clone, Copy)]
struct SerdeError {
    code: ErrorCode,
}

impl SerdeError {
    const fn with_code(code: ErrorCode) -> Self {
        Self { code }
    }
}

impl fmt::Display for SerdeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&PackStreamError::new(self.code, 0), f)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SerdeError {}

impl serde::ser::Error for SerdeError {
    fn custom<T: fmt::Display>(_msg: T) -> Self {
        Self::with_code(ErrorCode::Serde)
    }
}

impl serde::de::Error for SerdeError {
    fn custom<T: fmt::Display>(_msg: T) -> Self {
        Self::with_code(ErrorCode::Serde)
    }
}

const fn mismatch() -> SerdeError {
    SerdeError::with_code(ErrorCode::TypeMismatch)
}

const fn out_of_range() -> SerdeError {
    SerdeError::with_code(ErrorCode::ValueOutOfRange)
}

/// Rebuild a structure from its `[signature, fields]` marker payload.
fn structure_from_parts(parts: Vec<Value>) -> Result<BasicStruct, ErrorCode> {
    let mut parts = parts.into_iter();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(Value::Int(sig)), Some(Value::List(fields)), None) => {
            let signature = i8::try_from(sig).map_err(|_| ErrorCode::ValueOutOfRange)?;
            Ok(BasicStruct::new(signature, fields))
        }
        _ => Err(ErrorCode::TypeMismatch),
    }
}

struct ValueSerializer;

impl Serializer for ValueSerializer {
    type Ok = Value;
    type Error = SerdeError;

    type SerializeSeq = SeqSerializer;
    type SerializeTuple = SeqSerializer;
    type SerializeTupleStruct = SeqSerializer;
    type SerializeTupleVariant = TupleVariantSerializer;
    type SerializeMap = MapSerializer;
    type SerializeStruct = StructSerializer;
    type SerializeStructVariant = StructVariantSerializer;

    fn serialize_bool(self, v: bool) -> Result<Self::Ok, Self::Error> {
        Ok(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Self::Ok, Self::Error> {
        Ok(Value::from(v))
    }

    fn serialize_i16(self, v: i16) -> Result<Self::Ok, Self::Error> {
        Ok(Value::from(v))
    }

    fn serialize_i32(self, v: i32) -> Result<Self::Ok, Self::Error> {
        Ok(Value::from(v))
    }

    fn serialize_i64(self, v: i64) -> Result<Self::Ok, Self::Error> {
        Ok(Value::Int(v))
    }

    fn serialize_i128(self, v: i128) -> Result<Self::Ok, Self::Error> {
        i64::try_from(v).map(Value::Int).map_err(|_| out_of_range())
    }

    fn serialize_u8(self, v: u8) -> Result<Self::Ok, Self::Error> {
        Ok(Value::from(v))
    }

    fn serialize_u16(self, v: u16) -> Result<Self::Ok, Self::Error> {
        Ok(Value::from(v))
    }

    fn serialize_u32(self, v: u32) -> Result<Self::Ok, Self::Error> {
        Ok(Value::from(v))
    }

    fn serialize_u64(self, v: u64) -> Result<Self::Ok, Self::Error> {
        i64::try_from(v).map(Value::Int).map_err(|_| out_of_range())
    }

    fn serialize_u128(self, v: u128) -> Result<Self::Ok, Self::Error> {
        i64::try_from(v).map(Value::Int).map_err(|_| out_of_range())
    }

    fn serialize_f32(self, v: f32) -> Result<Self::Ok, Self::Error> {
        Ok(Value::from(v))
    }

    fn serialize_f64(self, v: f64) -> Result<Self::Ok, Self::Error> {
        Ok(Value::Float(v))
    }

    fn serialize_char(self, v: char) -> Result<Self::Ok, Self::Error> {
        Ok(Value::from(v))
    }

    fn serialize_str(self, v: &str) -> Result<Self::Ok, Self::Error> {
        Ok(Value::text(v))
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<Self::Ok, Self::Error> {
        Err(SerdeError::with_code(ErrorCode::UnsupportedValue))
    }

    fn serialize_none(self) -> Result<Self::Ok, Self::Error> {
        Ok(Value::Null)
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<Self::Ok, Self::Error> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Self::Ok, Self::Error> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Self::Ok, Self::Error> {
        Ok(Value::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Self::Ok, Self::Error> {
        Ok(enum_map(variant, Value::Null))
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Self::Ok, Self::Error> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Self::Ok, Self::Error> {
        let inner = value.serialize(Self)?;
        Ok(enum_map(variant, inner))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq, Self::Error> {
        Ok(SeqSerializer::new(len, false))
    }

    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple, Self::Error> {
        Ok(SeqSerializer::new(Some(len), false))
    }

    fn serialize_tuple_struct(
        self,
        name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleStruct, Self::Error> {
        Ok(SeqSerializer::new(Some(len), name == STRUCT_TOKEN))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleVariant, Self::Error> {
        Ok(TupleVariantSerializer {
            variant,
            items: Vec::with_capacity(len),
        })
    }

    fn serialize_map(self, len: Option<usize>) -> Result<Self::SerializeMap, Self::Error> {
        Ok(MapSerializer::new(len))
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeStruct, Self::Error> {
        Ok(StructSerializer {
            map: ValueMap::with_capacity(len),
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeStructVariant, Self::Error> {
        Ok(StructVariantSerializer {
            variant,
            map: ValueMap::with_capacity(len),
        })
    }
}

struct SeqSerializer {
    items: Vec<Value>,
    structure: bool,
}

impl SeqSerializer {
    fn new(len: Option<usize>, structure: bool) -> Self {
        let items = len.map_or_else(Vec::new, Vec::with_capacity);
        Self { items, structure }
    }

    fn into_structure(self) -> Result<Value, SerdeError> {
        structure_from_parts(self.items)
            .map(Value::Struct)
            .map_err(SerdeError::with_code)
    }
}

impl SerializeSeq for SeqSerializer {
    type Ok = Value;
    type Error = SerdeError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Self::Error> {
        self.items.push(value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<Self::Ok, Self::Error> {
        if self.structure {
            return self.into_structure();
        }
        Ok(Value::List(self.items))
    }
}

impl serde::ser::SerializeTuple for SeqSerializer {
    type Ok = Value;
    type Error = SerdeError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Self::Error> {
        SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Self::Ok, Self::Error> {
        SerializeSeq::end(self)
    }
}

impl SerializeTupleStruct for SeqSerializer {
    type Ok = Value;
    type Error = SerdeError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Self::Error> {
        SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Self::Ok, Self::Error> {
        SerializeSeq::end(self)
    }
}

struct TupleVariantSerializer {
    variant: &'static str,
    items: Vec<Value>,
}

impl serde::ser::SerializeTupleVariant for TupleVariantSerializer {
    type Ok = Value;
    type Error = SerdeError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Self::Error> {
        self.items.push(value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<Self::Ok, Self::Error> {
        Ok(enum_map(self.variant, Value::List(self.items)))
    }
}

struct MapSerializer {
    map: ValueMap,
    next_key: Option<Value>,
}

impl MapSerializer {
    fn new(len: Option<usize>) -> Self {
        let map = len.map_or_else(ValueMap::new, ValueMap::with_capacity);
        Self {
            map,
            next_key: None,
        }
    }
}

impl SerializeMap for MapSerializer {
    type Ok = Value;
    type Error = SerdeError;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<(), Self::Error> {
        self.next_key = Some(key.serialize(ValueSerializer)?);
        Ok(())
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Self::Error> {
        let key = self
            .next_key
            .take()
            .ok_or_else(|| SerdeError::with_code(ErrorCode::Serde))?;
        let val = value.serialize(ValueSerializer)?;
        self.map.insert(key, val);
        Ok(())
    }

    fn end(self) -> Result<Self::Ok, Self::Error> {
        Ok(Value::Map(self.map))
    }
}

struct StructSerializer {
    map: ValueMap,
}

impl serde::ser::SerializeStruct for StructSerializer {
    type Ok = Value;
    type Error = SerdeError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), Self::Error> {
        let val = value.serialize(ValueSerializer)?;
        self.map.insert(key, val);
        Ok(())
    }

    fn end(self) -> Result<Self::Ok, Self::Error> {
        Ok(Value::Map(self.map))
    }
}

struct StructVariantSerializer {
    variant: &'static str,
    map: ValueMap,
}

impl serde::ser::SerializeStructVariant for StructVariantSerializer {
    type Ok = Value;
    type Error = SerdeError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), Self::Error> {
        let val = value.serialize(ValueSerializer)?;
        self.map.insert(key, val);
        Ok(())
    }

    fn end(self) -> Result<Self::Ok, Self::Error> {
        Ok(enum_map(self.variant, Value::Map(self.map)))
    }
}

fn enum_map(variant: &str, value: Value) -> Value {
    Value::Map(ValueMap::from_entries(vec![(Value::text(variant), value)]))
}

struct ValueDeserializer {
    value: Value,
}

impl ValueDeserializer {
    const fn new(value: Value) -> Self {
        Self { value }
    }

    fn into_i64(self) -> Result<i64, SerdeError> {
        self.value.as_i64().ok_or_else(mismatch)
    }

    fn into_f64(self) -> Result<f64, SerdeError> {
        self.value.as_f64().ok_or_else(mismatch)
    }
}

macro_rules! deserialize_int {
    ($de:lifetime; $($method:ident => $visit:ident: $t:ty),* $(,)?) => {$(
        fn $method<V>(self, visitor: V) -> Result<V::Value, Self::Error>
        where
            V: Visitor<$de>,
        {
            let v = self.into_i64()?;
            visitor.$visit(<$t>::try_from(v).map_err(|_| out_of_range())?)
        }
    )*};
}

impl<'de> serde::de::Deserializer<'de> for ValueDeserializer {
    type Error = SerdeError;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Value::Null => visitor.visit_unit(),
            Value::Bool(b) => visitor.visit_bool(b),
            Value::Int(i) => visitor.visit_i64(i),
            Value::Float(f) => visitor.visit_f64(f),
            Value::Text(s) => visitor.visit_string(s),
            Value::List(items) => visitor.visit_seq(SeqAccess::new(items)),
            Value::Map(map) => visitor.visit_map(MapAccess::new(map)),
            Value::Struct(s) => visitor.visit_map(MapAccess::structure(s)),
            Value::Domain(d) => visitor.visit_map(MapAccess::structure(d.to_basic())),
        }
    }

    fn deserialize_bool<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_bool(self.value.as_bool().ok_or_else(mismatch)?)
    }

    deserialize_int! {
        'de;
        deserialize_i8 => visit_i8: i8,
        deserialize_i16 => visit_i16: i16,
        deserialize_i32 => visit_i32: i32,
        deserialize_u8 => visit_u8: u8,
        deserialize_u16 => visit_u16: u16,
        deserialize_u32 => visit_u32: u32,
        deserialize_u64 => visit_u64: u64,
        deserialize_u128 => visit_u128: u128,
    }

    fn deserialize_i64<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_i64(self.into_i64()?)
    }

    fn deserialize_i128<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_i128(i128::from(self.into_i64()?))
    }

    #[allow(clippy::cast_possible_truncation)]
    fn deserialize_f32<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        let v = self.into_f64()?;
        if v.is_finite() && (v > f64::from(f32::MAX) || v < f64::from(f32::MIN)) {
            return Err(out_of_range());
        }
        visitor.visit_f32(v as f32)
    }

    fn deserialize_f64<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_f64(self.into_f64()?)
    }

    fn deserialize_char<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        let s = self.value.as_str().ok_or_else(mismatch)?;
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => visitor.visit_char(c),
            _ => Err(mismatch()),
        }
    }

    fn deserialize_str<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_string(visitor)
    }

    fn deserialize_string<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Value::Text(s) => visitor.visit_string(s),
            _ => Err(mismatch()),
        }
    }

    fn deserialize_bytes<V>(self, _visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        Err(SerdeError::with_code(ErrorCode::UnsupportedValue))
    }

    fn deserialize_byte_buf<V>(self, _visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        Err(SerdeError::with_code(ErrorCode::UnsupportedValue))
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        if self.value.is_null() {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_unit<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        if self.value.is_null() {
            visitor.visit_unit()
        } else {
            Err(mismatch())
        }
    }

    fn deserialize_unit_struct<V>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Value::List(items) => visitor.visit_seq(SeqAccess::new(items)),
            Value::Struct(s) => visitor.visit_seq(SeqAccess::structure(s)),
            Value::Domain(d) => visitor.visit_seq(SeqAccess::structure(d.to_basic())),
            _ => Err(mismatch()),
        }
    }

    fn deserialize_tuple<V>(self, _len: usize, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Value::Map(map) => visitor.visit_map(MapAccess::new(map)),
            _ => Err(mismatch()),
        }
    }

    fn deserialize_struct<V>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_map(visitor)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Value::Text(variant) => visitor.visit_enum(EnumAccess {
                variant,
                value: None,
            }),
            Value::Map(map) => visitor.visit_enum(EnumAccess::from_map(map)?),
            _ => Err(mismatch()),
        }
    }

    fn deserialize_identifier<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_string(visitor)
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_unit()
    }
}

fn structure_parts(s: BasicStruct) -> Vec<Value> {
    vec![Value::Int(i64::from(s.signature)), Value::List(s.fields)]
}

struct SeqAccess {
    iter: vec::IntoIter<Value>,
}

impl SeqAccess {
    fn new(items: Vec<Value>) -> Self {
        Self {
            iter: items.into_iter(),
        }
    }

    fn structure(s: BasicStruct) -> Self {
        Self::new(structure_parts(s))
    }
}

impl<'de> serde::de::SeqAccess<'de> for SeqAccess {
    type Error = SerdeError;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>, Self::Error>
    where
        T: serde::de::DeserializeSeed<'de>,
    {
        self.iter
            .next()
            .map(|value| seed.deserialize(ValueDeserializer::new(value)))
            .transpose()
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct MapAccess {
    iter: vec::IntoIter<(Value, Value)>,
    pending: Option<Value>,
}

impl MapAccess {
    fn new(map: ValueMap) -> Self {
        Self::from_entries(map.into_entries())
    }

    /// A single `STRUCT_TOKEN` entry whose value is `[signature, fields]`.
    fn structure(s: BasicStruct) -> Self {
        Self::from_entries(vec![(
            Value::text(STRUCT_TOKEN),
            Value::List(structure_parts(s)),
        )])
    }

    fn from_entries(entries: Vec<(Value, Value)>) -> Self {
        Self {
            iter: entries.into_iter(),
            pending: None,
        }
    }
}

impl<'de> serde::de::MapAccess<'de> for MapAccess {
    type Error = SerdeError;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>, Self::Error>
    where
        K: serde::de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            None => Ok(None),
            Some((key, value)) => {
                self.pending = Some(value);
                seed.deserialize(ValueDeserializer::new(key)).map(Some)
            }
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value, Self::Error>
    where
        V: serde::de::DeserializeSeed<'de>,
    {
        let value = self
            .pending
            .take()
            .ok_or_else(|| SerdeError::with_code(ErrorCode::Serde))?;
        seed.deserialize(ValueDeserializer::new(value))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct EnumAccess {
    variant: String,
    value: Option<Value>,
}

impl EnumAccess {
    fn from_map(map: ValueMap) -> Result<Self, SerdeError> {
        if map.len() != 1 {
            return Err(mismatch());
        }
        match map.into_iter().next() {
            Some((Value::Text(variant), value)) => Ok(Self {
                variant,
                value: Some(value),
            }),
            _ => Err(mismatch()),
        }
    }
}

impl<'de> serde::de::EnumAccess<'de> for EnumAccess {
    type Error = SerdeError;
    type Variant = VariantAccess;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant), Self::Error>
    where
        V: serde::de::DeserializeSeed<'de>,
    {
        let de: serde::de::value::StringDeserializer<SerdeError> =
            self.variant.into_deserializer();
        let val = seed.deserialize(de)?;
        Ok((val, VariantAccess { value: self.value }))
    }
}

struct VariantAccess {
    value: Option<Value>,
}

impl<'de> serde::de::VariantAccess<'de> for VariantAccess {
    type Error = SerdeError;

    fn unit_variant(self) -> Result<(), Self::Error> {
        match self.value {
            None | Some(Value::Null) => Ok(()),
            _ => Err(mismatch()),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value, Self::Error>
    where
        T: serde::de::DeserializeSeed<'de>,
    {
        let value = self.value.ok_or_else(mismatch)?;
        seed.deserialize(ValueDeserializer::new(value))
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Some(Value::List(items)) => visitor.visit_seq(SeqAccess::new(items)),
            _ => Err(mismatch()),
        }
    }

    fn struct_variant<V>(
        self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Some(Value::Map(map)) => visitor.visit_map(MapAccess::new(map)),
            _ => Err(mismatch()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structure_round_trips_through_value() {
        let v = Value::structure(0x4E, vec![Value::Int(1), Value::text("x")]);
        assert_eq!(to_value(&v).unwrap(), v);
    }

    #[test]
    fn value_round_trips_through_deserializer() {
        let mut m = ValueMap::new();
        m.insert(1, "one");
        m.insert("list", vec![Value::Null, Value::Bool(true)]);
        let v = Value::Map(m);
        let back: Value = from_value(v.clone()).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn bytes_are_unsupported() {
        struct Raw;
        impl Serialize for Raw {
            fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
                s.serialize_bytes(&[1, 2, 3])
            }
        }
        let err = to_vec(&Raw).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnsupportedValue);
        assert!(err.is_encode());
    }

    #[test]
    fn large_unsigned_is_out_of_range() {
        let err = to_value(&u64::MAX).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValueOutOfRange);
        let err = from_value::<u8>(Value::Int(300)).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValueOutOfRange);
        assert!(!err.is_encode());
    }
}
