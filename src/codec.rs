use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use crate::encode::Packer;
use crate::structure::{BasicStruct, DomainValue};
use crate::value::{Value, ValueMap};
use crate::{ErrorCode, PackStreamError};

/// Encode a value into PackStream using the streaming encoder.
///
/// Implemented for [`Value`], primitives, text, options, sequences, maps and structures.
/// `#[derive(Structure)]` implements it for domain types.
pub trait Pack {
    /// Encode `self` into the provided encoder.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    fn pack(&self, enc: &mut Packer) -> Result<(), PackStreamError>;
}

/// Convert an owned decoded [`Value`] into a Rust type.
pub trait TryFromValue: Sized {
    /// Convert `value` into `Self`.
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` if the value has the wrong kind and `ValueOutOfRange` if a number
    /// does not fit.
    fn try_from_value(value: Value) -> Result<Self, PackStreamError>;
}

const fn mismatch() -> PackStreamError {
    PackStreamError::convert(ErrorCode::TypeMismatch)
}

const fn out_of_range() -> PackStreamError {
    PackStreamError::convert(ErrorCode::ValueOutOfRange)
}

impl Pack for () {
    fn pack(&self, enc: &mut Packer) -> Result<(), PackStreamError> {
        enc.null()
    }
}

impl Pack for bool {
    fn pack(&self, enc: &mut Packer) -> Result<(), PackStreamError> {
        enc.bool(*self)
    }
}

macro_rules! impl_pack_lossless_int {
    ($($t:ty),* $(,)?) => {$(
        impl Pack for $t {
            fn pack(&self, enc: &mut Packer) -> Result<(), PackStreamError> {
                enc.int(i64::from(*self))
            }
        }
    )*};
}

impl_pack_lossless_int!(i8, i16, i32, i64, u8, u16, u32);

impl Pack for u64 {
    fn pack(&self, enc: &mut Packer) -> Result<(), PackStreamError> {
        enc.int_u64(*self)
    }
}

impl Pack for usize {
    fn pack(&self, enc: &mut Packer) -> Result<(), PackStreamError> {
        let v = u64::try_from(*self)
            .map_err(|_| PackStreamError::encode(ErrorCode::ValueOutOfRange, enc.len()))?;
        enc.int_u64(v)
    }
}

impl Pack for isize {
    fn pack(&self, enc: &mut Packer) -> Result<(), PackStreamError> {
        let v = i64::try_from(*self)
            .map_err(|_| PackStreamError::encode(ErrorCode::ValueOutOfRange, enc.len()))?;
        enc.int(v)
    }
}

impl Pack for i128 {
    fn pack(&self, enc: &mut Packer) -> Result<(), PackStreamError> {
        enc.int_i128(*self)
    }
}

impl Pack for u128 {
    fn pack(&self, enc: &mut Packer) -> Result<(), PackStreamError> {
        let v = i128::try_from(*self)
            .map_err(|_| PackStreamError::encode(ErrorCode::ValueOutOfRange, enc.len()))?;
        enc.int_i128(v)
    }
}

impl Pack for f64 {
    fn pack(&self, enc: &mut Packer) -> Result<(), PackStreamError> {
        enc.float(*self)
    }
}

impl Pack for f32 {
    fn pack(&self, enc: &mut Packer) -> Result<(), PackStreamError> {
        enc.float(f64::from(*self))
    }
}

impl Pack for str {
    fn pack(&self, enc: &mut Packer) -> Result<(), PackStreamError> {
        enc.text(self)
    }
}

impl Pack for String {
    fn pack(&self, enc: &mut Packer) -> Result<(), PackStreamError> {
        enc.text(self)
    }
}

impl Pack for char {
    fn pack(&self, enc: &mut Packer) -> Result<(), PackStreamError> {
        let mut buf = [0u8; 4];
        enc.text(self.encode_utf8(&mut buf))
    }
}

impl<T: Pack> Pack for Option<T> {
    fn pack(&self, enc: &mut Packer) -> Result<(), PackStreamError> {
        match self {
            Some(v) => v.pack(enc),
            None => enc.null(),
        }
    }
}

impl<T: Pack> Pack for [T] {
    fn pack(&self, enc: &mut Packer) -> Result<(), PackStreamError> {
        enc.list(self.len(), |l| self.iter().try_for_each(|v| l.value(v)))
    }
}

impl<T: Pack> Pack for Vec<T> {
    fn pack(&self, enc: &mut Packer) -> Result<(), PackStreamError> {
        self.as_slice().pack(enc)
    }
}

impl<T: Pack, const N: usize> Pack for [T; N] {
    fn pack(&self, enc: &mut Packer) -> Result<(), PackStreamError> {
        self.as_slice().pack(enc)
    }
}

impl<T: Pack + ?Sized> Pack for &T {
    fn pack(&self, enc: &mut Packer) -> Result<(), PackStreamError> {
        (**self).pack(enc)
    }
}

impl<T: Pack + ?Sized> Pack for Box<T> {
    fn pack(&self, enc: &mut Packer) -> Result<(), PackStreamError> {
        (**self).pack(enc)
    }
}

impl<K: Pack, V: Pack> Pack for BTreeMap<K, V> {
    fn pack(&self, enc: &mut Packer) -> Result<(), PackStreamError> {
        enc.map(self.len(), |m| self.iter().try_for_each(|(k, v)| m.pair(k, v)))
    }
}

impl Pack for ValueMap {
    fn pack(&self, enc: &mut Packer) -> Result<(), PackStreamError> {
        enc.map(self.len(), |m| self.iter().try_for_each(|(k, v)| m.pair(k, v)))
    }
}

impl Pack for BasicStruct {
    fn pack(&self, enc: &mut Packer) -> Result<(), PackStreamError> {
        enc.structure(self)
    }
}

impl Pack for DomainValue {
    fn pack(&self, enc: &mut Packer) -> Result<(), PackStreamError> {
        enc.structure(self)
    }
}

impl Pack for Value {
    fn pack(&self, enc: &mut Packer) -> Result<(), PackStreamError> {
        match self {
            Self::Null => enc.null(),
            Self::Bool(b) => enc.bool(*b),
            Self::Int(i) => enc.int(*i),
            Self::Float(f) => enc.float(*f),
            Self::Text(s) => enc.text(s),
            Self::List(items) => items.pack(enc),
            Self::Map(map) => map.pack(enc),
            Self::Struct(s) => enc.structure(s),
            Self::Domain(d) => enc.structure(d),
        }
    }
}

impl TryFromValue for Value {
    fn try_from_value(value: Value) -> Result<Self, PackStreamError> {
        Ok(value)
    }
}

impl TryFromValue for () {
    fn try_from_value(value: Value) -> Result<Self, PackStreamError> {
        match value {
            Value::Null => Ok(()),
            _ => Err(mismatch()),
        }
    }
}

impl TryFromValue for bool {
    fn try_from_value(value: Value) -> Result<Self, PackStreamError> {
        value.as_bool().ok_or_else(mismatch)
    }
}

impl TryFromValue for i64 {
    fn try_from_value(value: Value) -> Result<Self, PackStreamError> {
        value.as_i64().ok_or_else(mismatch)
    }
}

macro_rules! impl_try_from_value_narrow_int {
    ($($t:ty),* $(,)?) => {$(
        impl TryFromValue for $t {
            fn try_from_value(value: Value) -> Result<Self, PackStreamError> {
                let v = value.as_i64().ok_or_else(mismatch)?;
                <$t>::try_from(v).map_err(|_| out_of_range())
            }
        }
    )*};
}

impl_try_from_value_narrow_int!(i8, i16, i32, isize, u8, u16, u32, u64, usize, u128);

impl TryFromValue for i128 {
    fn try_from_value(value: Value) -> Result<Self, PackStreamError> {
        value.as_i64().map(Self::from).ok_or_else(mismatch)
    }
}

impl TryFromValue for f64 {
    fn try_from_value(value: Value) -> Result<Self, PackStreamError> {
        value.as_f64().ok_or_else(mismatch)
    }
}

impl TryFromValue for f32 {
    #[allow(clippy::cast_possible_truncation)]
    fn try_from_value(value: Value) -> Result<Self, PackStreamError> {
        value.as_f64().map(|v| v as Self).ok_or_else(mismatch)
    }
}

impl TryFromValue for String {
    fn try_from_value(value: Value) -> Result<Self, PackStreamError> {
        match value {
            Value::Text(s) => Ok(s),
            _ => Err(mismatch()),
        }
    }
}

impl TryFromValue for char {
    fn try_from_value(value: Value) -> Result<Self, PackStreamError> {
        let s = value.as_str().ok_or_else(mismatch)?;
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(mismatch()),
        }
    }
}

impl<T: TryFromValue> TryFromValue for Option<T> {
    fn try_from_value(value: Value) -> Result<Self, PackStreamError> {
        match value {
            Value::Null => Ok(None),
            other => T::try_from_value(other).map(Some),
        }
    }
}

impl<T: TryFromValue> TryFromValue for Vec<T> {
    fn try_from_value(value: Value) -> Result<Self, PackStreamError> {
        match value {
            Value::List(items) => items.into_iter().map(T::try_from_value).collect(),
            _ => Err(mismatch()),
        }
    }
}

impl<K: TryFromValue + Ord, V: TryFromValue> TryFromValue for BTreeMap<K, V> {
    fn try_from_value(value: Value) -> Result<Self, PackStreamError> {
        match value {
            Value::Map(map) => map
                .into_iter()
                .map(|(k, v)| Ok((K::try_from_value(k)?, V::try_from_value(v)?)))
                .collect(),
            _ => Err(mismatch()),
        }
    }
}

impl TryFromValue for ValueMap {
    fn try_from_value(value: Value) -> Result<Self, PackStreamError> {
        match value {
            Value::Map(map) => Ok(map),
            _ => Err(mismatch()),
        }
    }
}

impl TryFromValue for BasicStruct {
    fn try_from_value(value: Value) -> Result<Self, PackStreamError> {
        match value {
            Value::Struct(s) => Ok(s),
            Value::Domain(d) => Ok(d.to_basic()),
            _ => Err(mismatch()),
        }
    }
}

impl From<()> for Value {
    fn from((): ()) -> Self {
        Self::Null
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

macro_rules! impl_value_from_int {
    ($($t:ty),* $(,)?) => {$(
        impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Self::Int(i64::from(v))
            }
        }
    )*};
}

impl_value_from_int!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! impl_value_try_from_wide_int {
    ($($t:ty),* $(,)?) => {$(
        impl TryFrom<$t> for Value {
            type Error = PackStreamError;

            fn try_from(v: $t) -> Result<Self, Self::Error> {
                i64::try_from(v).map(Self::Int).map_err(|_| out_of_range())
            }
        }
    )*};
}

impl_value_try_from_wide_int!(u64, usize, isize, i128, u128);

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(String::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<char> for Value {
    fn from(v: char) -> Self {
        let mut s = String::new();
        s.push(v);
        Self::Text(s)
    }
}

impl<T: Into<Self>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl<K: Into<Self>, V: Into<Self>> From<BTreeMap<K, V>> for Value {
    fn from(v: BTreeMap<K, V>) -> Self {
        Self::Map(v.into_iter().collect())
    }
}

impl From<ValueMap> for Value {
    fn from(v: ValueMap) -> Self {
        Self::Map(v)
    }
}

impl From<BasicStruct> for Value {
    fn from(v: BasicStruct) -> Self {
        Self::Struct(v)
    }
}

impl From<DomainValue> for Value {
    fn from(v: DomainValue) -> Self {
        Self::Domain(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::pack;
    use alloc::vec;

    #[test]
    fn value_and_native_encodings_agree() {
        let native = pack(&vec![Some(1_i32), None]).unwrap();
        let value = pack(&Value::List(vec![Value::Int(1), Value::Null])).unwrap();
        assert_eq!(native, value);
        assert_eq!(native, [0x92, 0x01, 0xC0]);
    }

    #[test]
    fn wide_integers_out_of_range() {
        assert_eq!(
            pack(&(1_i128 << 65)).unwrap_err().code,
            ErrorCode::ValueOutOfRange
        );
        assert_eq!(
            Value::try_from(u64::MAX).unwrap_err().code,
            ErrorCode::ValueOutOfRange
        );
        assert_eq!(Value::try_from(7_u64).unwrap(), Value::Int(7));
    }

    #[test]
    fn char_packs_as_utf8_text() {
        assert_eq!(pack(&'é').unwrap(), [0x82, 0xC3, 0xA9]);
    }

    #[test]
    fn try_from_value_checks_kind_and_range() {
        assert_eq!(u8::try_from_value(Value::Int(255)).unwrap(), 255);
        assert_eq!(
            u8::try_from_value(Value::Int(256)).unwrap_err().code,
            ErrorCode::ValueOutOfRange
        );
        assert_eq!(
            i64::try_from_value(Value::Float(1.0)).unwrap_err().code,
            ErrorCode::TypeMismatch
        );
        let list = Value::List(vec![Value::Int(1), Value::Null]);
        assert_eq!(
            Vec::<Option<i64>>::try_from_value(list).unwrap(),
            vec![Some(1), None]
        );
    }

    #[test]
    fn btree_map_round_trips_through_value() {
        let mut m = BTreeMap::new();
        m.insert(String::from("b"), 2_i64);
        m.insert(String::from("a"), 1_i64);
        let v = Value::from(m.clone());
        assert_eq!(BTreeMap::<String, i64>::try_from_value(v).unwrap(), m);
    }
}
