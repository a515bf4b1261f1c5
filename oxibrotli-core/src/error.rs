//! Error types for OxiBrotli operations.
//!
//! A single error enum covers both crates of the workspace: parameter
//! validation in the encoder driver and bit-level reader failures in
//! tooling built on top of [`crate::bitstream::BitReader`].

use thiserror::Error;

/// The main error type for OxiBrotli operations.
#[derive(Debug, Error)]
pub enum OxibrotliError {
    /// Window size outside the encodable range.
    #[error("invalid window bits: {bits} (supported range is 16..=24)")]
    InvalidWindowBits {
        /// The rejected window size exponent.
        bits: u32,
    },

    /// Distance postfix bit count outside the encodable range.
    #[error("invalid distance postfix bits: {bits} (supported range is 0..=3)")]
    InvalidPostfixBits {
        /// The rejected postfix bit count.
        bits: u32,
    },

    /// Direct distance code count incompatible with the postfix bits.
    #[error(
        "invalid direct distance code count: {codes} with {postfix_bits} postfix bits \
         (must be a multiple of 1 << postfix_bits, at most 120, and fit in 4 bits \
         after shifting)"
    )]
    InvalidDirectDistanceCodes {
        /// The rejected direct code count.
        codes: u32,
        /// The postfix bit count it was paired with.
        postfix_bits: u32,
    },

    /// A meta-block was larger than the format allows.
    #[error("meta-block of {size} bytes exceeds the maximum of {max} bytes")]
    MetaBlockTooLarge {
        /// The rejected input size.
        size: usize,
        /// The largest size a single meta-block may hold.
        max: usize,
    },

    /// An empty meta-block was requested; the format cannot express one
    /// except as the final stream marker.
    #[error("cannot encode an empty meta-block")]
    EmptyMetaBlock,

    /// A bit-level read ran past the end of the input.
    #[error("unexpected end of bitstream at bit {bit_position}")]
    UnexpectedEof {
        /// Bit offset at which the read was attempted.
        bit_position: usize,
    },
}

/// Result type alias for OxiBrotli operations.
pub type Result<T> = std::result::Result<T, OxibrotliError>;

impl OxibrotliError {
    /// Create an invalid window bits error.
    pub fn invalid_window_bits(bits: u32) -> Self {
        Self::InvalidWindowBits { bits }
    }

    /// Create an invalid postfix bits error.
    pub fn invalid_postfix_bits(bits: u32) -> Self {
        Self::InvalidPostfixBits { bits }
    }

    /// Create an invalid direct distance code count error.
    pub fn invalid_direct_codes(codes: u32, postfix_bits: u32) -> Self {
        Self::InvalidDirectDistanceCodes { codes, postfix_bits }
    }

    /// Create a meta-block size error.
    pub fn meta_block_too_large(size: usize, max: usize) -> Self {
        Self::MetaBlockTooLarge { size, max }
    }

    /// Create an unexpected end-of-bitstream error.
    pub fn unexpected_eof(bit_position: usize) -> Self {
        Self::UnexpectedEof { bit_position }
    }
}
