/// Default maximum nesting depth limit.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Decode-time resource limits.
///
/// PackStream lengths are attacker-controlled: a four-byte prefix can claim four billion list
/// items. The decoder never pre-allocates more slots than there are bytes left in the input,
/// and these limits bound the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    /// Maximum nesting depth of lists, maps and structures.
    pub max_depth: usize,
    /// Maximum declared length of a list, map (pairs) or structure (fields).
    pub max_container_len: usize,
    /// Maximum text length in UTF-8 bytes.
    pub max_text_len: usize,
}

impl DecodeLimits {
    /// Limits that only bound nesting depth.
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_container_len: usize::MAX,
            max_text_len: usize::MAX,
        }
    }

    /// Conservative limits derived from a maximum message size.
    ///
    /// No single container or text can legitimately be longer than the message that carries
    /// it, so both length limits are set to `max_message_bytes`.
    #[must_use]
    pub const fn for_bytes(max_message_bytes: usize) -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_container_len: max_message_bytes,
            max_text_len: max_message_bytes,
        }
    }

    /// Replace the depth limit.
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self::unlimited()
    }
}
