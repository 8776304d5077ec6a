use alloc::string::String;
use alloc::vec::Vec;
use core::any::Any;
use core::cmp::Ordering;
use core::slice;

use crate::structure::{BasicStruct, DomainValue};

/// The kind of a [`Value`], independent of its contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ValueKind {
    /// `Null`.
    Null,
    /// `Bool`.
    Bool,
    /// `Int`.
    Int,
    /// `Float`.
    Float,
    /// `Text`.
    Text,
    /// `List`.
    List,
    /// `Map`.
    Map,
    /// `Struct` or `Domain`: both are structures on the wire.
    Structure,
}

/// An owned PackStream value.
///
/// `Struct` is the generic carrier produced when no registry entry matches a decoded
/// signature. `Domain` holds whatever a registry reconstruction function built; it re-encodes
/// through its [`crate::Structure`] implementation.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed 64-bit integer.
    Int(i64),
    /// IEEE-754 binary64.
    Float(f64),
    /// UTF-8 text.
    Text(String),
    /// Ordered list.
    List(Vec<Value>),
    /// Insertion-ordered map.
    Map(ValueMap),
    /// Structure without domain knowledge.
    Struct(BasicStruct),
    /// Structure reconstructed by a registry entry.
    Domain(DomainValue),
}

impl Value {
    /// Construct a text value.
    #[must_use]
    pub fn text<S: Into<String>>(s: S) -> Self {
        Self::Text(s.into())
    }

    /// Construct a generic structure value.
    #[must_use]
    pub const fn structure(signature: i8, fields: Vec<Self>) -> Self {
        Self::Struct(BasicStruct::new(signature, fields))
    }

    /// Wrap a domain type as a value.
    #[must_use]
    pub fn domain<T: crate::DomainStructure>(value: T) -> Self {
        Self::Domain(DomainValue::new(value))
    }

    /// The value's kind.
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
            Self::Text(_) => ValueKind::Text,
            Self::List(_) => ValueKind::List,
            Self::Map(_) => ValueKind::Map,
            Self::Struct(_) | Self::Domain(_) => ValueKind::Structure,
        }
    }

    /// Returns true iff this is `Null`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Return the boolean if this is `Bool`.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Return the integer if this is `Int`.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Return the float if this is `Float`.
    #[must_use]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Return the text if this is `Text`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Return the items if this is `List`.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Return the map if this is `Map`.
    #[must_use]
    pub const fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Return the generic structure if this is `Struct`.
    #[must_use]
    pub const fn as_struct(&self) -> Option<&BasicStruct> {
        match self {
            Self::Struct(s) => Some(s),
            _ => None,
        }
    }

    /// Return the domain value if this is `Domain`.
    #[must_use]
    pub const fn as_domain(&self) -> Option<&DomainValue> {
        match self {
            Self::Domain(d) => Some(d),
            _ => None,
        }
    }

    /// Borrow the registry-built domain value as `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_domain().and_then(DomainValue::downcast_ref)
    }

    /// Compare two values under the total order used for map key identity.
    ///
    /// Kinds order as `Null < Bool < Int < Float < Text < List < Map < Structure`. Floats use
    /// [`f64::total_cmp`], so `-0.0` and `0.0` differ and every NaN bit pattern is equal to
    /// itself. Structures compare by signature, then fields.
    #[must_use]
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        crate::order::cmp_values(self, other)
    }
}

/// An insertion-ordered map of PackStream values.
///
/// Keys may be any [`Value`]. Inserting a key that is already present replaces its value
/// and keeps the entry at its original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueMap {
    entries: Vec<(Value, Value)>,
}

impl ValueMap {
    /// Create an empty map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Create an empty map with room for `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Build a map from entries in order; later duplicates overwrite earlier ones.
    ///
    /// Runs in `O(n log n)`.
    #[must_use]
    pub fn from_entries(mut entries: Vec<(Value, Value)>) -> Self {
        crate::order::dedup_last_wins(&mut entries);
        Self { entries }
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true iff the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert or replace an entry. Returns the previous value for `key`, if any.
    pub fn insert<K: Into<Value>, V: Into<Value>>(&mut self, key: K, value: V) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.position(&key) {
            Some(idx) => Some(core::mem::replace(&mut self.entries[idx].1, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Look up the value stored for `key`.
    #[must_use]
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.position(key).map(|idx| &self.entries[idx].1)
    }

    /// Look up the value stored under a text key.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_str() == Some(key))
            .map(|(_, v)| v)
    }

    /// Returns true iff `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &Value) -> bool {
        self.position(key).is_some()
    }

    /// Remove `key`, shifting later entries down to keep order.
    pub fn remove(&mut self, key: &Value) -> Option<Value> {
        self.position(key).map(|idx| self.entries.remove(idx).1)
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// Iterate keys in insertion order.
    pub fn keys(&self) -> impl ExactSizeIterator<Item = &Value> {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Iterate values in insertion order.
    pub fn values(&self) -> impl ExactSizeIterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// Borrow the entries slice.
    #[must_use]
    pub fn as_slice(&self) -> &[(Value, Value)] {
        &self.entries
    }

    /// Consume into the entries vector.
    #[must_use]
    pub fn into_entries(self) -> Vec<(Value, Value)> {
        self.entries
    }

    fn position(&self, key: &Value) -> Option<usize> {
        self.entries
            .iter()
            .position(|(k, _)| k.total_cmp(key) == Ordering::Equal)
    }
}

impl<K: Into<Value>, V: Into<Value>> FromIterator<(K, V)> for ValueMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let entries = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::from_entries(entries)
    }
}

impl IntoIterator for ValueMap {
    type Item = (Value, Value);
    type IntoIter = alloc::vec::IntoIter<(Value, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValueMap {
    type Item = &'a (Value, Value);
    type IntoIter = slice::Iter<'a, (Value, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn insert_overwrites_in_place() {
        let mut m = ValueMap::new();
        m.insert("a", 1);
        m.insert("b", 2);
        assert_eq!(m.insert("a", 3), Some(Value::Int(1)));
        let keys: Vec<_> = m.keys().filter_map(Value::as_str).collect();
        assert_eq!(keys, ["a", "b"]);
        assert_eq!(m.get_str("a"), Some(&Value::Int(3)));
    }

    #[test]
    fn from_entries_keeps_first_position_and_last_value() {
        let m = ValueMap::from_entries(vec![
            (Value::text("x"), Value::Int(1)),
            (Value::Int(7), Value::Int(2)),
            (Value::text("x"), Value::Int(3)),
        ]);
        assert_eq!(
            m.as_slice(),
            &[
                (Value::text("x"), Value::Int(3)),
                (Value::Int(7), Value::Int(2)),
            ]
        );
    }

    #[test]
    fn int_and_float_keys_are_distinct() {
        let mut m = ValueMap::new();
        m.insert(1, "int");
        m.insert(1.0, "float");
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn remove_preserves_order() {
        let mut m: ValueMap = [("a", 1), ("b", 2), ("c", 3)].into_iter().collect();
        assert_eq!(m.remove(&Value::text("b")), Some(Value::Int(2)));
        let keys: Vec<_> = m.keys().filter_map(Value::as_str).collect();
        assert_eq!(keys, ["a", "c"]);
    }
}
