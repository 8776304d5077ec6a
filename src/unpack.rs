use alloc::vec::Vec;
use core::iter::FusedIterator;

use crate::cursor::ByteCursor;
use crate::decode::{decode_one, decode_one_with_limits};
use crate::structure::Registry;
use crate::value::Value;
use crate::{DecodeLimits, ErrorCode, PackStreamError};

/// Lazy sequence of the top-level values in a buffer.
///
/// Each call to `next` decodes exactly one value. The sequence ends when the buffer is
/// exhausted, so an empty buffer yields nothing. The first error is yielded once and then the
/// iterator is fused; there is no resynchronisation after corrupt input.
///
/// The iterator cannot be rewound. Call [`unpack`] again on the same bytes to replay.
#[derive(Debug, Clone)]
pub struct Unpack<'a> {
    cursor: ByteCursor<'a>,
    registry: Option<&'a Registry>,
    limits: DecodeLimits,
    failed: bool,
}

impl<'a> Unpack<'a> {
    /// Unpack `bytes`, consulting `registry` for structures.
    #[must_use]
    pub const fn new(bytes: &'a [u8], registry: Option<&'a Registry>) -> Self {
        Self::with_limits(bytes, registry, DecodeLimits::unlimited())
    }

    /// Unpack `bytes` under explicit resource limits.
    #[must_use]
    pub const fn with_limits(
        bytes: &'a [u8],
        registry: Option<&'a Registry>,
        limits: DecodeLimits,
    ) -> Self {
        Self {
            cursor: ByteCursor::new(bytes),
            registry,
            limits,
            failed: false,
        }
    }

    /// Offset of the next value to be decoded.
    ///
    /// After an error this is the start of the value that failed.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.cursor.position()
    }

    /// Bytes not yet consumed.
    #[must_use]
    pub fn remaining_bytes(&self) -> &'a [u8] {
        let data = self.cursor.data();
        &data[self.cursor.position()..]
    }
}

impl Iterator for Unpack<'_> {
    type Item = Result<Value, PackStreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.cursor.at_end() {
            return None;
        }
        match decode_one_with_limits(&mut self.cursor, self.registry, self.limits) {
            Ok(value) => {
                crate::log::trace!(
                    end = self.cursor.position(),
                    kind = ?value.kind(),
                    "unpacked value"
                );
                Some(Ok(value))
            }
            Err(err) => {
                self.failed = true;
                crate::log::debug!(offset = err.offset, error = %err, "unpack failed");
                Some(Err(err))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            return (0, Some(0));
        }
        let remaining = self.cursor.remaining();
        (usize::from(remaining > 0), Some(remaining))
    }
}

impl FusedIterator for Unpack<'_> {}

/// Lazily unpack every top-level value in `bytes`.
///
/// Structures decode to [`Value::Struct`].
#[must_use]
pub const fn unpack(bytes: &[u8]) -> Unpack<'_> {
    Unpack::new(bytes, None)
}

/// Lazily unpack every top-level value in `bytes`, rebuilding registered structures.
#[must_use]
pub const fn unpack_with<'a>(bytes: &'a [u8], registry: &'a Registry) -> Unpack<'a> {
    Unpack::new(bytes, Some(registry))
}

/// Eagerly unpack every top-level value in `bytes`.
///
/// # Errors
///
/// Returns the first decode error.
pub fn unpack_all(bytes: &[u8], registry: Option<&Registry>) -> Result<Vec<Value>, PackStreamError> {
    Unpack::new(bytes, registry).collect()
}

/// Unpack a buffer that holds exactly one value.
///
/// # Errors
///
/// Returns `TruncatedInput` for an empty or short buffer, `TrailingBytes` if anything follows
/// the value, or any decode error.
pub fn unpack_single(bytes: &[u8], registry: Option<&Registry>) -> Result<Value, PackStreamError> {
    let mut cursor = ByteCursor::new(bytes);
    let value = decode_one(&mut cursor, registry)?;
    if !cursor.at_end() {
        return Err(PackStreamError::decode(
            ErrorCode::TrailingBytes,
            cursor.position(),
        ));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn empty_buffer_is_empty_sequence() {
        assert_eq!(unpack(&[]).count(), 0);
        assert!(unpack_all(&[], None).unwrap().is_empty());
    }

    #[test]
    fn values_come_out_in_order() {
        let bytes = [0x01, 0x81, b'a', 0xC0];
        let values: Vec<_> = unpack(&bytes).collect::<Result<_, _>>().unwrap();
        assert_eq!(values, vec![Value::Int(1), Value::text("a"), Value::Null]);
    }

    #[test]
    fn error_is_yielded_once_then_fused() {
        let bytes = [0x01, 0xCC, 0x02];
        let mut it = unpack(&bytes);
        assert_eq!(it.next().unwrap().unwrap(), Value::Int(1));
        let err = it.next().unwrap().unwrap_err();
        assert_eq!(err.code, ErrorCode::UnrecognizedMarker(0xCC));
        assert_eq!(it.position(), 1);
        assert!(it.next().is_none());
        assert!(it.next().is_none());
    }

    #[test]
    fn single_rejects_trailing_and_empty() {
        assert_eq!(unpack_single(&[0xC3], None).unwrap(), Value::Bool(true));
        let err = unpack_single(&[0xC3, 0xC0], None).unwrap_err();
        assert_eq!(err.code, ErrorCode::TrailingBytes);
        assert_eq!(err.offset, 1);
        assert!(unpack_single(&[], None).unwrap_err().is_truncation());
    }

    #[test]
    fn remaining_bytes_tracks_progress() {
        let bytes = [0x01, 0x02];
        let mut it = unpack(&bytes);
        it.next();
        assert_eq!(it.remaining_bytes(), [0x02]);
    }
}
