//! # packstream
//!
//! A codec for **PackStream**, the compact, marker-tagged binary serialization format used by the
//! Bolt graph database protocol.
//!
//! ## Data model
//!
//! Every value starts with a one-byte marker that names its kind and, for small values, carries
//! the value or its length inline. All multi-byte quantities are big-endian.
//!
//! - `Null`, `Bool`, `Int` (signed 64-bit), `Float` (IEEE-754 binary64)
//! - `Text` (UTF-8), `List`, `Map` (keys of any kind, insertion ordered)
//! - Structures: a signed 8-bit signature plus up to 65 535 fields
//!
//! Integers are always written in the smallest class that holds them, and lengths use the
//! smallest of the tiny, 8-bit, 16-bit and 32-bit headers. Encoding is therefore deterministic.
//!
//! ## Encoding
//!
//! [`pack`] and [`pack_all`] encode anything implementing [`Pack`]; [`Packer`] writes
//! values one at a time, with closure builders for containers that roll back on error.
//!
//! ## Decoding
//!
//! [`unpack`] returns a lazy, fused iterator over every top-level value in a buffer, so
//! concatenated packs unpack as a sequence. [`Registry`] maps structure signatures to
//! reconstruction functions; structures without an entry decode to [`Value::Struct`].
//!
//! ## Feature flags
//!
//! - `std` *(default)*: implements `std::error::Error` for [`PackStreamError`].
//! - `serde` *(default)*: serde conversions through [`Value`].
//! - `simdutf8`: enables SIMD-accelerated UTF-8 validation where supported.
//! - `tracing`: emits `trace`/`debug` events while unpacking and reconstructing structures.
//!
//! ## `no_std`
//!
//! The crate is `no_std` compatible and requires an allocator.

#![cfg_attr(not(feature = "std"), no_std)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

extern crate alloc;

mod alloc_util;
mod codec;
mod cursor;
mod decode;
mod encode;
mod error;
mod limits;
mod log;
mod macros;
mod marker;
mod order;
#[cfg(feature = "serde")]
mod serde_impl;
mod structure;
mod unpack;
pub(crate) mod utf8;
mod value;

pub use crate::codec::{Pack, TryFromValue};
pub use crate::cursor::ByteCursor;
pub use crate::decode::{decode_one, decode_one_with_limits};
pub use crate::encode::{pack, pack_all, MapPacker, Packer, SeqPacker};
pub use crate::error::{ErrorCode, ErrorKind, PackStreamError};
pub use crate::limits::{DecodeLimits, DEFAULT_MAX_DEPTH};
#[doc(hidden)]
pub use crate::macros::__packstream_macro;
pub use crate::structure::{
    BasicStruct, DomainStructure, DomainValue, FromStructure, Reconstruct, Registry, Structure,
};
pub use crate::unpack::{unpack, unpack_all, unpack_single, unpack_with, Unpack};
pub use crate::value::{Value, ValueKind, ValueMap};

#[cfg(feature = "serde")]
pub use crate::serde_impl::{from_slice, from_value, to_value, to_vec};

pub use packstream_derive::Structure;
