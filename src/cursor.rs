use crate::{utf8, ErrorCode, PackStreamError};

/// A forward-only reader over an immutable byte buffer.
///
/// All multi-byte reads are big-endian. A read that would run past the end of the buffer
/// fails with [`ErrorCode::TruncatedInput`] and leaves the cursor where it was.
#[derive(Debug, Clone, Copy)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    /// Create a cursor positioned at the start of `data`.
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// The whole underlying buffer.
    #[must_use]
    pub const fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Current byte offset.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Number of unread bytes.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Returns true iff every byte has been consumed.
    #[must_use]
    pub const fn at_end(&self) -> bool {
        self.pos == self.data.len()
    }

    const fn truncated(&self, requested: usize) -> PackStreamError {
        PackStreamError::decode(
            ErrorCode::TruncatedInput {
                requested,
                available: self.remaining(),
            },
            self.pos,
        )
    }

    /// Read exactly `n` bytes.
    ///
    /// # Errors
    ///
    /// Returns `TruncatedInput` if fewer than `n` bytes remain.
    pub fn read_exact(&mut self, n: usize) -> Result<&'a [u8], PackStreamError> {
        if n > self.remaining() {
            return Err(self.truncated(n));
        }
        let end = self.pos + n;
        let s = &self.data[self.pos..end];
        self.pos = end;
        Ok(s)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], PackStreamError> {
        let s = self.read_exact(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(s);
        Ok(out)
    }

    /// Read one unsigned byte.
    ///
    /// # Errors
    ///
    /// Returns `TruncatedInput` at end of buffer.
    pub fn read_u8(&mut self) -> Result<u8, PackStreamError> {
        let b = *self.data.get(self.pos).ok_or_else(|| self.truncated(1))?;
        self.pos += 1;
        Ok(b)
    }

    /// Read a big-endian `u16`.
    ///
    /// # Errors
    ///
    /// Returns `TruncatedInput` if fewer than 2 bytes remain.
    pub fn read_u16(&mut self) -> Result<u16, PackStreamError> {
        self.read_array().map(u16::from_be_bytes)
    }

    /// Read a big-endian `u32`.
    ///
    /// # Errors
    ///
    /// Returns `TruncatedInput` if fewer than 4 bytes remain.
    pub fn read_u32(&mut self) -> Result<u32, PackStreamError> {
        self.read_array().map(u32::from_be_bytes)
    }

    /// Read a big-endian `u64`.
    ///
    /// # Errors
    ///
    /// Returns `TruncatedInput` if fewer than 8 bytes remain.
    pub fn read_u64(&mut self) -> Result<u64, PackStreamError> {
        self.read_array().map(u64::from_be_bytes)
    }

    /// Read one signed byte.
    ///
    /// # Errors
    ///
    /// Returns `TruncatedInput` at end of buffer.
    pub fn read_i8(&mut self) -> Result<i8, PackStreamError> {
        self.read_array().map(i8::from_be_bytes)
    }

    /// Read a big-endian `i16`.
    ///
    /// # Errors
    ///
    /// Returns `TruncatedInput` if fewer than 2 bytes remain.
    pub fn read_i16(&mut self) -> Result<i16, PackStreamError> {
        self.read_array().map(i16::from_be_bytes)
    }

    /// Read a big-endian `i32`.
    ///
    /// # Errors
    ///
    /// Returns `TruncatedInput` if fewer than 4 bytes remain.
    pub fn read_i32(&mut self) -> Result<i32, PackStreamError> {
        self.read_array().map(i32::from_be_bytes)
    }

    /// Read a big-endian `i64`.
    ///
    /// # Errors
    ///
    /// Returns `TruncatedInput` if fewer than 8 bytes remain.
    pub fn read_i64(&mut self) -> Result<i64, PackStreamError> {
        self.read_array().map(i64::from_be_bytes)
    }

    /// Read a big-endian IEEE-754 double.
    ///
    /// # Errors
    ///
    /// Returns `TruncatedInput` if fewer than 8 bytes remain.
    pub fn read_f64(&mut self) -> Result<f64, PackStreamError> {
        self.read_u64().map(f64::from_bits)
    }

    /// Read `len` bytes and interpret them as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns `TruncatedInput` if fewer than `len` bytes remain, or `InvalidUtf8` (at the
    /// offset where the text starts) if the bytes are not UTF-8.
    pub fn read_text(&mut self, len: usize) -> Result<&'a str, PackStreamError> {
        let off = self.pos;
        let bytes = self.read_exact(len)?;
        utf8::validate(bytes).map_err(|()| {
            self.pos = off;
            PackStreamError::decode(ErrorCode::InvalidUtf8, off)
        })
    }
}
