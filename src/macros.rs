//! Construction macros.
//!
//! [`packstream!`] builds [`crate::Value`] trees with a JSON-like literal syntax and
//! [`pack!`] encodes a sequence of values into one buffer. Both are fallible.
//!
//! Map key rules:
//! - `{ a: 1 }` uses the text key `"a"` (identifier stringized)
//! - `{ "a": 1 }` or `{ 7: 1 }` uses the literal as the key
//! - `{ (k): 1 }` uses the expression `k` as the key
//!
//! ```
//! # fn demo() -> Result<(), packstream::PackStreamError> {
//! let user_key = "dynamic";
//! let v = packstream::packstream!({
//!     a: 1,
//!     (user_key): [true, null, 1.5],
//! })?;
//! assert_eq!(v.as_map().map(packstream::ValueMap::len), Some(2));
//! # Ok(()) }
//! # demo().unwrap();
//! ```

/// Construct a [`crate::Value`] using a JSON-like literal syntax.
///
/// This macro returns `Result<crate::Value, crate::PackStreamError>`.
///
/// Supported forms:
/// - `packstream!(null)`
/// - `packstream!(true)` / `packstream!(false)`
/// - `packstream!([ ... ])`
/// - `packstream!({ key: value, "key": value, (expr_key): value, ... })`
/// - `packstream!(expr)` where `expr` is a primitive, text, `Value`, `ValueMap`, structure,
///   option or vector of values
///
/// Integers outside the signed 64-bit range fail with `ValueOutOfRange`. Duplicate keys keep
/// the first position and the last value.
#[macro_export]
macro_rules! packstream {
    (null) => {
        ::core::result::Result::<$crate::Value, $crate::PackStreamError>::Ok($crate::Value::Null)
    };
    (true) => {
        ::core::result::Result::<$crate::Value, $crate::PackStreamError>::Ok(
            $crate::Value::Bool(true),
        )
    };
    (false) => {
        ::core::result::Result::<$crate::Value, $crate::PackStreamError>::Ok(
            $crate::Value::Bool(false),
        )
    };

    ([ $($elem:tt),* $(,)? ]) => {{
        (|| -> ::core::result::Result<$crate::Value, $crate::PackStreamError> {
            let mut items = $crate::__packstream_macro::Vec::new();
            $crate::__packstream_macro::try_reserve_exact(
                &mut items,
                0usize $(+ { let _ = stringify!($elem); 1usize })*,
            )?;

            $(
                items.push($crate::packstream!($elem)?);
            )*

            ::core::result::Result::Ok($crate::Value::List(items))
        })()
    }};

    ({ $($key:tt : $value:tt),* $(,)? }) => {{
        (|| -> ::core::result::Result<$crate::Value, $crate::PackStreamError> {
            let mut entries = $crate::__packstream_macro::Vec::new();
            $crate::__packstream_macro::try_reserve_exact(
                &mut entries,
                0usize $(+ { let _ = stringify!($key); let _ = stringify!($value); 1usize })*,
            )?;

            $(
                let k = $crate::__packstream_key!($key)?;
                let v = $crate::packstream!($value)?;
                entries.push((k, v));
            )*

            ::core::result::Result::Ok($crate::Value::Map($crate::ValueMap::from_entries(entries)))
        })()
    }};

    ($other:expr) => {{
        $crate::__packstream_macro::IntoValue::into_value($other)
    }};
}

/// Internal helper for map keys.
#[doc(hidden)]
#[macro_export]
macro_rules! __packstream_key {
    ($key:ident) => {{
        $crate::__packstream_macro::IntoValue::into_value(::core::stringify!($key))
    }};
    (($key:expr)) => {{
        $crate::__packstream_macro::IntoValue::into_value($key)
    }};
    ($key:literal) => {{
        $crate::__packstream_macro::IntoValue::into_value($key)
    }};
}

/// Encode each argument in order into one buffer.
///
/// Returns `Result<Vec<u8>, crate::PackStreamError>`. Each argument must implement
/// [`crate::Pack`]. `pack!()` yields an empty buffer.
///
/// ```
/// let bytes = packstream::pack!(1, "a", [true]).unwrap();
/// assert_eq!(bytes, [0x01, 0x81, b'a', 0x91, 0xC3]);
/// ```
#[macro_export]
macro_rules! pack {
    () => {
        ::core::result::Result::<$crate::__packstream_macro::Vec<u8>, $crate::PackStreamError>::Ok(
            $crate::__packstream_macro::Vec::new(),
        )
    };
    ($($value:expr),+ $(,)?) => {{
        (|| -> ::core::result::Result<$crate::__packstream_macro::Vec<u8>, $crate::PackStreamError> {
            let mut enc = $crate::Packer::new();
            $(
                enc.value(&$value)?;
            )+
            ::core::result::Result::Ok(enc.into_vec())
        })()
    }};
}

/// Hidden support module used by macro expansions.
#[doc(hidden)]
#[allow(missing_docs)]
pub mod __packstream_macro {
    use alloc::string::String;

    pub use alloc::borrow::Cow;
    pub use alloc::vec::Vec;

    use crate::{BasicStruct, DomainValue, PackStreamError, Value, ValueMap};

    pub fn try_reserve_exact<T>(v: &mut Vec<T>, additional: usize) -> Result<(), PackStreamError> {
        v.try_reserve_exact(additional)
            .map_err(|_| PackStreamError::alloc_failed(0))
    }

    pub trait IntoValue {
        fn into_value(self) -> Result<Value, PackStreamError>;
    }

    macro_rules! impl_into_value_infallible {
        ($($t:ty),* $(,)?) => {$(
            impl IntoValue for $t {
                fn into_value(self) -> Result<Value, PackStreamError> {
                    Ok(Value::from(self))
                }
            }
        )*};
    }

    impl_into_value_infallible!(
        (),
        bool,
        i8,
        i16,
        i32,
        i64,
        u8,
        u16,
        u32,
        f32,
        f64,
        char,
        &str,
        String,
        ValueMap,
        BasicStruct,
        DomainValue,
    );

    macro_rules! impl_into_value_wide {
        ($($t:ty),* $(,)?) => {$(
            impl IntoValue for $t {
                fn into_value(self) -> Result<Value, PackStreamError> {
                    Value::try_from(self)
                        .map_err(|err| PackStreamError::encode(err.code, 0))
                }
            }
        )*};
    }

    impl_into_value_wide!(u64, usize, isize, i128, u128);

    impl IntoValue for Value {
        fn into_value(self) -> Result<Value, PackStreamError> {
            Ok(self)
        }
    }

    impl IntoValue for &Value {
        fn into_value(self) -> Result<Value, PackStreamError> {
            Ok(self.clone())
        }
    }

    impl IntoValue for &String {
        fn into_value(self) -> Result<Value, PackStreamError> {
            Ok(Value::text(self.as_str()))
        }
    }

    impl<T: IntoValue> IntoValue for Option<T> {
        fn into_value(self) -> Result<Value, PackStreamError> {
            self.map_or(Ok(Value::Null), IntoValue::into_value)
        }
    }

    impl<T: IntoValue> IntoValue for Vec<T> {
        fn into_value(self) -> Result<Value, PackStreamError> {
            let mut items = Vec::new();
            try_reserve_exact(&mut items, self.len())?;
            for item in self {
                items.push(item.into_value()?);
            }
            Ok(Value::List(items))
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{ErrorCode, Value, ValueMap};
    use alloc::vec;

    #[test]
    fn literal_forms() {
        assert_eq!(packstream!(null).unwrap(), Value::Null);
        assert_eq!(packstream!(false).unwrap(), Value::Bool(false));
        assert_eq!(
            packstream!([1, "a", null]).unwrap(),
            Value::List(vec![Value::Int(1), Value::text("a"), Value::Null])
        );
    }

    #[test]
    fn map_keys_and_duplicates() {
        let k = "dyn";
        let v = packstream!({ a: 1, "b": 2, 7: 3, (k): 4, a: 5 }).unwrap();
        let mut expected = ValueMap::new();
        expected.insert("a", 5);
        expected.insert("b", 2);
        expected.insert(7, 3);
        expected.insert("dyn", 4);
        assert_eq!(v, Value::Map(expected));
    }

    #[test]
    fn wide_int_is_out_of_range() {
        let err = packstream!([(u64::MAX)]).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValueOutOfRange);
        let err = packstream!([1, (i128::MIN)]).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValueOutOfRange);
        assert!(err.is_encode());
    }

    #[test]
    fn pack_concatenates_arguments() {
        assert!(pack!().unwrap().is_empty());
        assert_eq!(pack!(1, -1, true).unwrap(), [0x01, 0xFF, 0xC3]);
    }
}
