use core::fmt;

/// The high-level class of an error.
///
/// PackStream distinguishes:
/// - **Encode** errors: the value cannot be represented on the wire.
/// - **Decode** errors: the input bytes are truncated or malformed.
/// - **Convert** errors: a decoded [`crate::Value`] does not fit the requested Rust type.
///
/// The split matters to transports: a decode error may be cured by waiting for more bytes,
/// an encode error never will be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Encoding failure.
    Encode,
    /// Decode/framing failure.
    Decode,
    /// Conversion from a decoded value into a Rust type failed.
    Convert,
}

/// A structured error code identifying why a value or a buffer was rejected.
///
/// This enum is string-free to support `no_std`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorCode {
    /// The value's kind has no PackStream representation.
    UnsupportedValue,
    /// Integer outside the signed 64-bit range, or a size beyond its largest length class.
    ValueOutOfRange,
    /// A streaming container builder emitted a different number of items than declared.
    LengthMismatch,
    /// Memory allocation failed while building an encoded buffer or a decoded value.
    ///
    /// Always classified as [`ErrorKind::Encode`]; the offset says where it happened.
    AllocationFailed,

    /// A read needed more bytes than the buffer has left.
    TruncatedInput {
        /// Bytes the read asked for.
        requested: usize,
        /// Bytes that were still available.
        available: usize,
    },
    /// The marker byte is not part of the PackStream marker table.
    UnrecognizedMarker(u8),
    /// Text payload is not valid UTF-8.
    InvalidUtf8,
    /// Input continues after the single value that was expected.
    TrailingBytes,
    /// Nesting depth limit exceeded.
    DepthLimitExceeded,
    /// Declared list/map/structure length exceeds the configured limit.
    ContainerLenLimitExceeded,
    /// Declared text length exceeds the configured limit.
    TextLenLimitExceeded,
    /// A structure's signature or fields were rejected during reconstruction.
    InvalidStructure,

    /// The value has a different kind than the target type expects.
    TypeMismatch,
    /// A serde data-model error without a more specific code.
    Serde,
}

impl ErrorCode {
    pub(crate) const fn message(self) -> &'static str {
        match self {
            Self::UnsupportedValue => "value kind has no PackStream representation",
            Self::ValueOutOfRange => "value out of representable range",
            Self::LengthMismatch => "container length does not match items written",
            Self::AllocationFailed => "allocation failed",

            Self::TruncatedInput { .. } => "truncated input",
            Self::UnrecognizedMarker(_) => "unrecognized marker byte",
            Self::InvalidUtf8 => "text must be valid UTF-8",
            Self::TrailingBytes => "trailing bytes after single value",
            Self::DepthLimitExceeded => "nesting depth limit exceeded",
            Self::ContainerLenLimitExceeded => "container length exceeds decode limits",
            Self::TextLenLimitExceeded => "text length exceeds decode limits",
            Self::InvalidStructure => "structure rejected by reconstruction",

            Self::TypeMismatch => "value has unexpected kind",
            Self::Serde => "serde conversion error",
        }
    }
}

/// A PackStream error with a classification, a stable code, and a byte offset.
///
/// Offsets are meaningful for `Decode` errors and point at the byte where the failing read
/// started. For `Encode` errors the offset is the output length when the error was raised;
/// for `Convert` errors it is `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackStreamError {
    /// The error kind.
    pub kind: ErrorKind,
    /// The error code.
    pub code: ErrorCode,
    /// Byte offset associated with the error.
    pub offset: usize,
}

impl PackStreamError {
    /// Construct an error, deriving its kind from `code`.
    #[inline]
    #[must_use]
    pub const fn new(code: ErrorCode, offset: usize) -> Self {
        let kind = match code {
            ErrorCode::UnsupportedValue
            | ErrorCode::ValueOutOfRange
            | ErrorCode::LengthMismatch
            | ErrorCode::AllocationFailed => ErrorKind::Encode,
            ErrorCode::TypeMismatch | ErrorCode::Serde => ErrorKind::Convert,
            _ => ErrorKind::Decode,
        };
        Self { kind, code, offset }
    }

    /// Allocation failure at `offset`, classified the same way as [`Self::new`].
    #[inline]
    #[must_use]
    pub(crate) const fn alloc_failed(offset: usize) -> Self {
        Self::new(ErrorCode::AllocationFailed, offset)
    }

    /// Construct an encode error at output offset `offset`.
    #[inline]
    #[must_use]
    pub const fn encode(code: ErrorCode, offset: usize) -> Self {
        Self {
            kind: ErrorKind::Encode,
            code,
            offset,
        }
    }

    /// Construct a decode error at input offset `offset`.
    #[inline]
    #[must_use]
    pub const fn decode(code: ErrorCode, offset: usize) -> Self {
        Self {
            kind: ErrorKind::Decode,
            code,
            offset,
        }
    }

    /// Construct a conversion error.
    #[inline]
    #[must_use]
    pub const fn convert(code: ErrorCode) -> Self {
        Self {
            kind: ErrorKind::Convert,
            code,
            offset: 0,
        }
    }

    /// Returns true iff decoding failed only because the buffer ended early.
    ///
    /// Callers reading from a transport may fetch more bytes and unpack again from scratch.
    #[inline]
    #[must_use]
    pub const fn is_truncation(self) -> bool {
        matches!(self.code, ErrorCode::TruncatedInput { .. })
    }

    /// Returns true iff this is an encode error.
    #[inline]
    #[must_use]
    pub const fn is_encode(self) -> bool {
        matches!(self.kind, ErrorKind::Encode)
    }

    /// Returns true iff this is a decode error.
    #[inline]
    #[must_use]
    pub const fn is_decode(self) -> bool {
        matches!(self.kind, ErrorKind::Decode)
    }
}

impl fmt::Display for PackStreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = self.code.message();
        match (self.kind, self.code) {
            (_, ErrorCode::TruncatedInput { requested, available }) => write!(
                f,
                "packstream decode failed at {}: {msg} (wanted {requested} bytes, found {available})",
                self.offset
            ),
            (_, ErrorCode::UnrecognizedMarker(marker)) => write!(
                f,
                "packstream decode failed at {}: {msg} 0x{marker:02X}",
                self.offset
            ),
            (ErrorKind::Encode, _) => write!(f, "packstream encode failed: {msg}"),
            (ErrorKind::Decode, _) => {
                write!(f, "packstream decode failed at {}: {msg}", self.offset)
            }
            (ErrorKind::Convert, _) => write!(f, "packstream conversion failed: {msg}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PackStreamError {}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn kind_follows_code() {
        assert_eq!(
            PackStreamError::new(ErrorCode::ValueOutOfRange, 3).kind,
            ErrorKind::Encode
        );
        assert_eq!(
            PackStreamError::new(ErrorCode::UnrecognizedMarker(0xCC), 0).kind,
            ErrorKind::Decode
        );
        assert_eq!(
            PackStreamError::new(ErrorCode::TypeMismatch, 0).kind,
            ErrorKind::Convert
        );
    }

    #[test]
    fn allocation_failure_has_one_classification() {
        let err = PackStreamError::alloc_failed(7);
        assert_eq!(err, PackStreamError::new(ErrorCode::AllocationFailed, 7));
        assert!(err.is_encode());
        assert!(!err.is_decode());
    }

    #[test]
    fn display_reports_requested_and_available() {
        let err = PackStreamError::decode(
            ErrorCode::TruncatedInput {
                requested: 8,
                available: 3,
            },
            1,
        );
        assert!(err.is_truncation());
        assert_eq!(
            err.to_string(),
            "packstream decode failed at 1: truncated input (wanted 8 bytes, found 3)"
        );
    }

    #[test]
    fn display_names_marker_in_hex() {
        let err = PackStreamError::decode(ErrorCode::UnrecognizedMarker(0xCC), 0);
        assert_eq!(
            err.to_string(),
            "packstream decode failed at 0: unrecognized marker byte 0xCC"
        );
    }
}
