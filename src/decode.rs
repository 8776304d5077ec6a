use alloc::string::String;
use alloc::vec::Vec;

use crate::alloc_util::vec_for_declared;
use crate::cursor::ByteCursor;
use crate::marker;
use crate::structure::Registry;
use crate::value::{Value, ValueMap};
use crate::{DecodeLimits, ErrorCode, PackStreamError};

struct Decoder<'r> {
    registry: Option<&'r Registry>,
    limits: DecodeLimits,
    depth: usize,
}

impl Decoder<'_> {
    #[inline]
    fn enter_container(&mut self, len: usize, off: usize) -> Result<(), PackStreamError> {
        if len > self.limits.max_container_len {
            return Err(PackStreamError::decode(
                ErrorCode::ContainerLenLimitExceeded,
                off,
            ));
        }
        let next_depth = self.depth + 1;
        if next_depth > self.limits.max_depth {
            return Err(PackStreamError::decode(ErrorCode::DepthLimitExceeded, off));
        }
        self.depth = next_depth;
        Ok(())
    }

    #[inline]
    fn exit_container(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn value(&mut self, c: &mut ByteCursor<'_>) -> Result<Value, PackStreamError> {
        let off = c.position();
        let m = c.read_u8()?;
        match m {
            0x00..=0x7F => Ok(Value::Int(i64::from(m))),
            0xF0..=0xFF => Ok(Value::Int(i64::from(i8::from_be_bytes([m])))),

            marker::NULL => Ok(Value::Null),
            marker::FALSE => Ok(Value::Bool(false)),
            marker::TRUE => Ok(Value::Bool(true)),
            marker::FLOAT_64 => c.read_f64().map(Value::Float),

            marker::INT_8 => c.read_i8().map(|v| Value::Int(i64::from(v))),
            marker::INT_16 => c.read_i16().map(|v| Value::Int(i64::from(v))),
            marker::INT_32 => c.read_i32().map(|v| Value::Int(i64::from(v))),
            marker::INT_64 => c.read_i64().map(Value::Int),

            0x80..=0x8F => self.text(c, tiny_len(m), off),
            marker::TEXT_8 => {
                let len = read_len8(c)?;
                self.text(c, len, off)
            }
            marker::TEXT_16 => {
                let len = read_len16(c)?;
                self.text(c, len, off)
            }
            marker::TEXT_32 => {
                let len = read_len32(c, off)?;
                self.text(c, len, off)
            }

            0x90..=0x9F => self.list(c, tiny_len(m), off),
            marker::LIST_8 => {
                let len = read_len8(c)?;
                self.list(c, len, off)
            }
            marker::LIST_16 => {
                let len = read_len16(c)?;
                self.list(c, len, off)
            }
            marker::LIST_32 => {
                let len = read_len32(c, off)?;
                self.list(c, len, off)
            }

            0xA0..=0xAF => self.map(c, tiny_len(m), off),
            marker::MAP_8 => {
                let len = read_len8(c)?;
                self.map(c, len, off)
            }
            marker::MAP_16 => {
                let len = read_len16(c)?;
                self.map(c, len, off)
            }
            marker::MAP_32 => {
                let len = read_len32(c, off)?;
                self.map(c, len, off)
            }

            0xB0..=0xBF => self.structure(c, tiny_len(m), off),
            marker::STRUCT_8 => {
                let len = read_len8(c)?;
                self.structure(c, len, off)
            }
            marker::STRUCT_16 => {
                let len = read_len16(c)?;
                self.structure(c, len, off)
            }

            _ => Err(PackStreamError::decode(ErrorCode::UnrecognizedMarker(m), off)),
        }
    }

    fn text(
        &self,
        c: &mut ByteCursor<'_>,
        len: usize,
        off: usize,
    ) -> Result<Value, PackStreamError> {
        if len > self.limits.max_text_len {
            return Err(PackStreamError::decode(ErrorCode::TextLenLimitExceeded, off));
        }
        let s = c.read_text(len)?;
        let mut out = String::new();
        out.try_reserve_exact(s.len())
            .map_err(|_| PackStreamError::alloc_failed(off))?;
        out.push_str(s);
        Ok(Value::Text(out))
    }

    fn items(
        &mut self,
        c: &mut ByteCursor<'_>,
        len: usize,
        off: usize,
    ) -> Result<Vec<Value>, PackStreamError> {
        self.enter_container(len, off)?;
        let mut items = vec_for_declared(len, c.remaining());
        for _ in 0..len {
            items.push(self.value(c)?);
        }
        self.exit_container();
        Ok(items)
    }

    fn list(
        &mut self,
        c: &mut ByteCursor<'_>,
        len: usize,
        off: usize,
    ) -> Result<Value, PackStreamError> {
        self.items(c, len, off).map(Value::List)
    }

    fn map(
        &mut self,
        c: &mut ByteCursor<'_>,
        len: usize,
        off: usize,
    ) -> Result<Value, PackStreamError> {
        self.enter_container(len, off)?;
        let mut entries = vec_for_declared(len, c.remaining() / 2);
        for _ in 0..len {
            let k = self.value(c)?;
            let v = self.value(c)?;
            entries.push((k, v));
        }
        self.exit_container();
        Ok(Value::Map(ValueMap::from_entries(entries)))
    }

    fn structure(
        &mut self,
        c: &mut ByteCursor<'_>,
        len: usize,
        off: usize,
    ) -> Result<Value, PackStreamError> {
        let signature = c.read_i8()?;
        let fields = self.items(c, len, off)?;
        Registry::reconstruct(self.registry, signature, fields)
    }
}

#[inline]
fn tiny_len(m: u8) -> usize {
    usize::from(m & marker::TINY_SIZE_MASK)
}

#[inline]
fn read_len8(c: &mut ByteCursor<'_>) -> Result<usize, PackStreamError> {
    c.read_u8().map(usize::from)
}

#[inline]
fn read_len16(c: &mut ByteCursor<'_>) -> Result<usize, PackStreamError> {
    c.read_u16().map(usize::from)
}

#[inline]
fn read_len32(c: &mut ByteCursor<'_>, off: usize) -> Result<usize, PackStreamError> {
    let n = c.read_u32()?;
    usize::try_from(n).map_err(|_| PackStreamError::decode(ErrorCode::ContainerLenLimitExceeded, off))
}

/// Decode exactly one value at the cursor.
///
/// Structures whose signature has an entry in `registry` are rebuilt by that entry; all others
/// decode to [`Value::Struct`]. Nesting is bounded by [`crate::DEFAULT_MAX_DEPTH`].
///
/// On error the cursor is left where the value started.
///
/// # Errors
///
/// Returns a decode error for truncated or malformed input, or whatever error a registry
/// entry returns.
pub fn decode_one(
    cursor: &mut ByteCursor<'_>,
    registry: Option<&Registry>,
) -> Result<Value, PackStreamError> {
    decode_one_with_limits(cursor, registry, DecodeLimits::default())
}

/// Decode exactly one value at the cursor under explicit resource limits.
///
/// # Errors
///
/// As [`decode_one`], plus the limit errors configured by `limits`.
pub fn decode_one_with_limits(
    cursor: &mut ByteCursor<'_>,
    registry: Option<&Registry>,
    limits: DecodeLimits,
) -> Result<Value, PackStreamError> {
    let start = *cursor;
    let mut decoder = Decoder {
        registry,
        limits,
        depth: 0,
    };
    decoder.value(cursor).map_err(|err| {
        *cursor = start;
        err
    })
}
