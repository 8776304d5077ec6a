//! The PackStream marker table.
//!
//! Every encoded value starts with one marker byte. Tiny values carry their payload or size in
//! the low nibble of the marker; everything else is followed by a big-endian length or scalar.

pub const NULL: u8 = 0xC0;
pub const FLOAT_64: u8 = 0xC1;
pub const FALSE: u8 = 0xC2;
pub const TRUE: u8 = 0xC3;

pub const INT_8: u8 = 0xC8;
pub const INT_16: u8 = 0xC9;
pub const INT_32: u8 = 0xCA;
pub const INT_64: u8 = 0xCB;

pub const TINY_TEXT: u8 = 0x80;
pub const TEXT_8: u8 = 0xD0;
pub const TEXT_16: u8 = 0xD1;
pub const TEXT_32: u8 = 0xD2;

pub const TINY_LIST: u8 = 0x90;
pub const LIST_8: u8 = 0xD4;
pub const LIST_16: u8 = 0xD5;
pub const LIST_32: u8 = 0xD6;

pub const TINY_MAP: u8 = 0xA0;
pub const MAP_8: u8 = 0xD8;
pub const MAP_16: u8 = 0xD9;
pub const MAP_32: u8 = 0xDA;

pub const TINY_STRUCT: u8 = 0xB0;
pub const STRUCT_8: u8 = 0xDC;
pub const STRUCT_16: u8 = 0xDD;

/// Low-nibble mask for tiny text/list/map/struct markers.
pub const TINY_SIZE_MASK: u8 = 0x0F;

/// Largest size that fits in a tiny marker.
pub const TINY_SIZE_MAX: usize = 0x0F;

/// Smallest integer encoded inline as a single byte.
pub const TINY_INT_MIN: i64 = -0x10;

/// Largest structure field count (16-bit size class).
pub const MAX_STRUCT_FIELDS: usize = 0xFFFF;

/// Marker families sharing the same length-class layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Text,
    List,
    Map,
}

impl Family {
    /// Returns `(tiny, class8, class16, class32)` markers for this family.
    pub const fn markers(self) -> (u8, u8, u8, u8) {
        match self {
            Self::Text => (TINY_TEXT, TEXT_8, TEXT_16, TEXT_32),
            Self::List => (TINY_LIST, LIST_8, LIST_16, LIST_32),
            Self::Map => (TINY_MAP, MAP_8, MAP_16, MAP_32),
        }
    }
}
