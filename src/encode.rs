use alloc::vec::Vec;

use crate::alloc_util::try_reserve;
use crate::codec::Pack;
use crate::marker::{self, Family};
use crate::structure::Structure;
use crate::{ErrorCode, PackStreamError};

trait Sink {
    fn write(&mut self, bytes: &[u8]) -> Result<(), PackStreamError>;

    fn write_u8(&mut self, byte: u8) -> Result<(), PackStreamError> {
        self.write(&[byte])
    }

    fn position(&self) -> usize;
}

struct VecSink {
    buf: Vec<u8>,
}

impl VecSink {
    const fn new() -> Self {
        Self { buf: Vec::new() }
    }

    fn with_capacity(capacity: usize) -> Self {
        let mut buf = Vec::new();
        let _ = buf.try_reserve(capacity);
        Self { buf }
    }

    fn into_vec(self) -> Vec<u8> {
        self.buf
    }

    #[inline]
    fn reserve(&mut self, additional: usize) -> Result<(), PackStreamError> {
        let available = self.buf.capacity().saturating_sub(self.buf.len());
        if additional <= available {
            return Ok(());
        }
        let offset = self.buf.len();
        try_reserve(&mut self.buf, additional, offset)
    }
}

impl Sink for VecSink {
    fn write(&mut self, bytes: &[u8]) -> Result<(), PackStreamError> {
        self.reserve(bytes.len())?;
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    fn write_u8(&mut self, byte: u8) -> Result<(), PackStreamError> {
        if self.buf.len() == self.buf.capacity() {
            self.reserve(1)?;
        }
        self.buf.push(byte);
        Ok(())
    }

    fn position(&self) -> usize {
        self.buf.len()
    }
}

fn err_at<S: Sink>(sink: &S, code: ErrorCode) -> PackStreamError {
    PackStreamError::encode(code, sink.position())
}

fn encode_int<S: Sink>(sink: &mut S, v: i64) -> Result<(), PackStreamError> {
    if let Ok(b) = i8::try_from(v) {
        if v >= marker::TINY_INT_MIN {
            return sink.write(&b.to_be_bytes());
        }
        sink.write_u8(marker::INT_8)?;
        return sink.write(&b.to_be_bytes());
    }
    if let Ok(h) = i16::try_from(v) {
        sink.write_u8(marker::INT_16)?;
        return sink.write(&h.to_be_bytes());
    }
    if let Ok(w) = i32::try_from(v) {
        sink.write_u8(marker::INT_32)?;
        return sink.write(&w.to_be_bytes());
    }
    sink.write_u8(marker::INT_64)?;
    sink.write(&v.to_be_bytes())
}

fn encode_float64<S: Sink>(sink: &mut S, v: f64) -> Result<(), PackStreamError> {
    let mut buf = [0u8; 9];
    buf[0] = marker::FLOAT_64;
    buf[1..9].copy_from_slice(&v.to_bits().to_be_bytes());
    sink.write(&buf)
}

fn encode_len<S: Sink>(sink: &mut S, family: Family, len: usize) -> Result<(), PackStreamError> {
    let (tiny, class8, class16, class32) = family.markers();
    if let Ok(n) = u8::try_from(len) {
        if len <= marker::TINY_SIZE_MAX {
            return sink.write_u8(tiny | n);
        }
        sink.write_u8(class8)?;
        return sink.write_u8(n);
    }
    if let Ok(n) = u16::try_from(len) {
        sink.write_u8(class16)?;
        return sink.write(&n.to_be_bytes());
    }
    if let Ok(n) = u32::try_from(len) {
        sink.write_u8(class32)?;
        return sink.write(&n.to_be_bytes());
    }
    Err(err_at(sink, ErrorCode::ValueOutOfRange))
}

fn encode_text<S: Sink>(sink: &mut S, s: &str) -> Result<(), PackStreamError> {
    let b = s.as_bytes();
    encode_len(sink, Family::Text, b.len())?;
    sink.write(b)
}

fn encode_struct_header<S: Sink>(
    sink: &mut S,
    signature: i8,
    len: usize,
) -> Result<(), PackStreamError> {
    if len > marker::MAX_STRUCT_FIELDS {
        return Err(err_at(sink, ErrorCode::ValueOutOfRange));
    }
    if let Ok(n) = u8::try_from(len) {
        if len <= marker::TINY_SIZE_MAX {
            sink.write_u8(marker::TINY_STRUCT | n)?;
        } else {
            sink.write_u8(marker::STRUCT_8)?;
            sink.write_u8(n)?;
        }
    } else {
        let n = u16::try_from(len).map_err(|_| err_at(sink, ErrorCode::ValueOutOfRange))?;
        sink.write_u8(marker::STRUCT_16)?;
        sink.write(&n.to_be_bytes())?;
    }
    sink.write(&signature.to_be_bytes())
}

/// Streaming encoder that writes PackStream directly into a `Vec<u8>`.
///
/// Every value is written with the smallest marker class that can hold it. Successive values
/// are simply concatenated, which is how a multi-value message is built.
pub struct Packer {
    sink: VecSink,
}

impl Packer {
    /// Create a new encoder.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            sink: VecSink::new(),
        }
    }

    /// Create an encoder with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sink: VecSink::with_capacity(capacity),
        }
    }

    /// Return the number of bytes written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sink.buf.len()
    }

    /// Returns `true` if no bytes have been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sink.buf.is_empty()
    }

    /// Borrow the bytes emitted so far.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.sink.buf
    }

    /// Consume and return the encoded bytes.
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.sink.into_vec()
    }

    /// Encode null.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the underlying buffer fails.
    pub fn null(&mut self) -> Result<(), PackStreamError> {
        self.sink.write_u8(marker::NULL)
    }

    /// Encode a boolean.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the underlying buffer fails.
    pub fn bool(&mut self, v: bool) -> Result<(), PackStreamError> {
        self.sink
            .write_u8(if v { marker::TRUE } else { marker::FALSE })
    }

    /// Encode an integer in the smallest class that holds it.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the underlying buffer fails.
    pub fn int(&mut self, v: i64) -> Result<(), PackStreamError> {
        encode_int(&mut self.sink, v)
    }

    /// Encode a wide integer.
    ///
    /// # Errors
    ///
    /// Returns `ValueOutOfRange` if `v` does not fit a signed 64-bit integer.
    pub fn int_i128(&mut self, v: i128) -> Result<(), PackStreamError> {
        let v = i64::try_from(v).map_err(|_| err_at(&self.sink, ErrorCode::ValueOutOfRange))?;
        self.int(v)
    }

    /// Encode an unsigned integer.
    ///
    /// # Errors
    ///
    /// Returns `ValueOutOfRange` if `v` exceeds `i64::MAX`.
    pub fn int_u64(&mut self, v: u64) -> Result<(), PackStreamError> {
        let v = i64::try_from(v).map_err(|_| err_at(&self.sink, ErrorCode::ValueOutOfRange))?;
        self.int(v)
    }

    /// Encode an IEEE-754 double. NaN payloads and the sign of zero are preserved.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the underlying buffer fails.
    pub fn float(&mut self, v: f64) -> Result<(), PackStreamError> {
        encode_float64(&mut self.sink, v)
    }

    /// Encode UTF-8 text; the length class is chosen from the byte length.
    ///
    /// # Errors
    ///
    /// Returns `ValueOutOfRange` if the text is 2^32 bytes or longer.
    pub fn text(&mut self, s: &str) -> Result<(), PackStreamError> {
        encode_text(&mut self.sink, s)
    }

    /// Encode any [`Pack`] value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be encoded.
    pub fn value<T: Pack + ?Sized>(&mut self, v: &T) -> Result<(), PackStreamError> {
        v.pack(self)
    }

    /// Encode a list of `len` items and fill it via the provided builder.
    ///
    /// On any error the partially written list is removed from the output.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails or if the builder emits a different number of items.
    pub fn list<F>(&mut self, len: usize, f: F) -> Result<(), PackStreamError>
    where
        F: FnOnce(&mut SeqPacker<'_>) -> Result<(), PackStreamError>,
    {
        let start = self.sink.buf.len();
        let res = encode_len(&mut self.sink, Family::List, len)
            .and_then(|()| self.reserve_min_items(len))
            .and_then(|()| self.fill_seq(len, f));
        self.rollback_on_err(start, res)
    }

    /// Encode a map of `len` entries and fill it via the provided builder.
    ///
    /// On any error the partially written map is removed from the output.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails or if the builder emits a different number of entries.
    pub fn map<F>(&mut self, len: usize, f: F) -> Result<(), PackStreamError>
    where
        F: FnOnce(&mut MapPacker<'_>) -> Result<(), PackStreamError>,
    {
        let start = self.sink.buf.len();
        let res = encode_len(&mut self.sink, Family::Map, len)
            .and_then(|()| {
                let items = len
                    .checked_mul(2)
                    .ok_or_else(|| err_at(&self.sink, ErrorCode::ValueOutOfRange))?;
                self.reserve_min_items(items)
            })
            .and_then(|()| {
                let mut m = MapPacker {
                    enc: self,
                    remaining: len,
                };
                f(&mut m)?;
                m.finish()
            });
        self.rollback_on_err(start, res)
    }

    /// Encode a structure header for `len` fields and fill the fields via the provided builder.
    ///
    /// # Errors
    ///
    /// Returns `ValueOutOfRange` for more than 65535 fields, `LengthMismatch` if the builder
    /// emits a different number of fields, or any error from the fields themselves.
    pub fn structure_with<F>(&mut self, signature: i8, len: usize, f: F) -> Result<(), PackStreamError>
    where
        F: FnOnce(&mut SeqPacker<'_>) -> Result<(), PackStreamError>,
    {
        let start = self.sink.buf.len();
        let res = encode_struct_header(&mut self.sink, signature, len)
            .and_then(|()| self.reserve_min_items(len))
            .and_then(|()| self.fill_seq(len, f));
        self.rollback_on_err(start, res)
    }

    /// Encode anything with the structure capability.
    ///
    /// # Errors
    ///
    /// Returns `ValueOutOfRange` for more than 65535 fields, or any error from the fields.
    pub fn structure<S: Structure + ?Sized>(&mut self, s: &S) -> Result<(), PackStreamError> {
        let fields = s.fields();
        self.structure_with(s.signature(), fields.len(), |seq| {
            fields.iter().try_for_each(|field| seq.value(field))
        })
    }

    fn fill_seq<F>(&mut self, len: usize, f: F) -> Result<(), PackStreamError>
    where
        F: FnOnce(&mut SeqPacker<'_>) -> Result<(), PackStreamError>,
    {
        let mut seq = SeqPacker {
            enc: self,
            remaining: len,
        };
        f(&mut seq)?;
        seq.finish()
    }

    fn rollback_on_err(
        &mut self,
        start: usize,
        res: Result<(), PackStreamError>,
    ) -> Result<(), PackStreamError> {
        if res.is_err() {
            self.sink.buf.truncate(start);
        }
        res
    }

    fn reserve_min_items(&mut self, len: usize) -> Result<(), PackStreamError> {
        if len == 0 {
            return Ok(());
        }
        self.sink.reserve(len)
    }
}

impl Default for Packer {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for list items and structure fields.
pub struct SeqPacker<'a> {
    enc: &'a mut Packer,
    remaining: usize,
}

impl SeqPacker<'_> {
    fn consume_one(&mut self) -> Result<(), PackStreamError> {
        if self.remaining == 0 {
            return Err(err_at(&self.enc.sink, ErrorCode::LengthMismatch));
        }
        self.remaining -= 1;
        Ok(())
    }

    fn finish(&self) -> Result<(), PackStreamError> {
        if self.remaining != 0 {
            return Err(err_at(&self.enc.sink, ErrorCode::LengthMismatch));
        }
        Ok(())
    }

    /// Number of items still expected.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.remaining
    }

    /// Encode null.
    ///
    /// # Errors
    ///
    /// Returns an error if the declared length is exceeded or if encoding fails.
    pub fn null(&mut self) -> Result<(), PackStreamError> {
        self.consume_one()?;
        self.enc.null()
    }

    /// Encode a boolean.
    ///
    /// # Errors
    ///
    /// Returns an error if the declared length is exceeded or if encoding fails.
    pub fn bool(&mut self, v: bool) -> Result<(), PackStreamError> {
        self.consume_one()?;
        self.enc.bool(v)
    }

    /// Encode an integer.
    ///
    /// # Errors
    ///
    /// Returns an error if the declared length is exceeded or if encoding fails.
    pub fn int(&mut self, v: i64) -> Result<(), PackStreamError> {
        self.consume_one()?;
        self.enc.int(v)
    }

    /// Encode a double.
    ///
    /// # Errors
    ///
    /// Returns an error if the declared length is exceeded or if encoding fails.
    pub fn float(&mut self, v: f64) -> Result<(), PackStreamError> {
        self.consume_one()?;
        self.enc.float(v)
    }

    /// Encode text.
    ///
    /// # Errors
    ///
    /// Returns an error if the declared length is exceeded or if encoding fails.
    pub fn text(&mut self, s: &str) -> Result<(), PackStreamError> {
        self.consume_one()?;
        self.enc.text(s)
    }

    /// Encode any [`Pack`] value.
    ///
    /// # Errors
    ///
    /// Returns an error if the declared length is exceeded or if encoding fails.
    pub fn value<T: Pack + ?Sized>(&mut self, v: &T) -> Result<(), PackStreamError> {
        self.consume_one()?;
        v.pack(self.enc)
    }

    /// Encode a nested list.
    ///
    /// # Errors
    ///
    /// Returns an error if the declared length is exceeded or if encoding fails.
    pub fn list<F>(&mut self, len: usize, f: F) -> Result<(), PackStreamError>
    where
        F: FnOnce(&mut SeqPacker<'_>) -> Result<(), PackStreamError>,
    {
        self.consume_one()?;
        self.enc.list(len, f)
    }

    /// Encode a nested map.
    ///
    /// # Errors
    ///
    /// Returns an error if the declared length is exceeded or if encoding fails.
    pub fn map<F>(&mut self, len: usize, f: F) -> Result<(), PackStreamError>
    where
        F: FnOnce(&mut MapPacker<'_>) -> Result<(), PackStreamError>,
    {
        self.consume_one()?;
        self.enc.map(len, f)
    }

    /// Encode a nested structure.
    ///
    /// # Errors
    ///
    /// Returns an error if the declared length is exceeded or if encoding fails.
    pub fn structure<S: Structure + ?Sized>(&mut self, s: &S) -> Result<(), PackStreamError> {
        self.consume_one()?;
        self.enc.structure(s)
    }
}

/// Builder for map entries. Entries are written in the order they are added.
pub struct MapPacker<'a> {
    enc: &'a mut Packer,
    remaining: usize,
}

impl MapPacker<'_> {
    fn finish(&self) -> Result<(), PackStreamError> {
        if self.remaining != 0 {
            return Err(err_at(&self.enc.sink, ErrorCode::LengthMismatch));
        }
        Ok(())
    }

    fn write_entry<K, F>(&mut self, write_key: K, f: F) -> Result<(), PackStreamError>
    where
        K: FnOnce(&mut Packer) -> Result<(), PackStreamError>,
        F: FnOnce(&mut Packer) -> Result<(), PackStreamError>,
    {
        if self.remaining == 0 {
            return Err(err_at(&self.enc.sink, ErrorCode::LengthMismatch));
        }
        let entry_start = self.enc.sink.buf.len();
        let res = write_key(&mut *self.enc).and_then(|()| f(&mut *self.enc));
        self.enc.rollback_on_err(entry_start, res)?;
        self.remaining -= 1;
        Ok(())
    }

    /// Number of entries still expected.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.remaining
    }

    /// Insert an entry with a text key, writing the value via `f`.
    ///
    /// # Errors
    ///
    /// Returns an error if the declared length is exceeded or if encoding fails.
    pub fn entry<F>(&mut self, key: &str, f: F) -> Result<(), PackStreamError>
    where
        F: FnOnce(&mut Packer) -> Result<(), PackStreamError>,
    {
        self.write_entry(|enc| enc.text(key), f)
    }

    /// Insert an entry with arbitrary key and value.
    ///
    /// No duplicate check is made; a decoder keeps the last value for a repeated key.
    ///
    /// # Errors
    ///
    /// Returns an error if the declared length is exceeded or if encoding fails.
    pub fn pair<K, V>(&mut self, key: &K, value: &V) -> Result<(), PackStreamError>
    where
        K: Pack + ?Sized,
        V: Pack + ?Sized,
    {
        self.write_entry(|enc| key.pack(enc), |enc| value.pack(enc))
    }
}

/// Encode a single value.
///
/// # Errors
///
/// Returns an error if the value cannot be encoded.
pub fn pack<T: Pack + ?Sized>(value: &T) -> Result<Vec<u8>, PackStreamError> {
    let mut enc = Packer::new();
    value.pack(&mut enc)?;
    Ok(enc.into_vec())
}

/// Encode every value in order and concatenate the results.
///
/// An empty iterator yields an empty buffer.
///
/// # Errors
///
/// Returns the first encoding error.
pub fn pack_all<I>(values: I) -> Result<Vec<u8>, PackStreamError>
where
    I: IntoIterator,
    I::Item: Pack,
{
    let mut enc = Packer::new();
    for v in values {
        v.pack(&mut enc)?;
    }
    Ok(enc.into_vec())
}
