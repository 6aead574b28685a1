//! Error types for the CQL wire format layer.
//!
//! Two layers: [`CodecError`] for primitive and body-variant decoding, and
//! [`ProtocolError`] for frame-level failures (unknown opcode, oversized
//! body, wrong version byte). `ProtocolError` wraps `CodecError` so callers
//! that only care about "did parsing fail" can match one type.

use thiserror::Error;

/// Errors raised while reading or writing a serialization primitive or body
/// variant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Cursor ran out of bytes before the value could be read.
    #[error("truncated: needed {needed} bytes, {available} available")]
    Truncated {
        /// Bytes required to complete the read.
        needed: usize,
        /// Bytes actually remaining in the cursor.
        available: usize,
    },

    /// Bytes were present but did not form a valid value (e.g. non-UTF-8
    /// string, negative length where one isn't permitted).
    #[error("invalid value: {0}")]
    Invalid(String),
}

/// Errors raised while decoding a complete frame (header + body).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Primitive or body decoding failed.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Header opcode has no registered body variant.
    #[error("unknown opcode: {0:#04x}")]
    UnknownOpcode(u8),

    /// Body length exceeds the configured ceiling.
    #[error("oversized frame: {size} bytes exceeds maximum of {max}")]
    OversizedFrame {
        /// Claimed body size.
        size: usize,
        /// Configured maximum.
        max: usize,
    },

    /// Header version byte is neither the request nor response value.
    #[error("unsupported version byte: {0:#04x}")]
    WrongVersion(u8),

    /// Whole-buffer decode was given fewer bytes than the header's `length`
    /// field promised.
    #[error("frame truncated: expected {expected} body bytes, got {actual}")]
    FrameTruncated {
        /// Body bytes the header claims.
        expected: usize,
        /// Body bytes actually available.
        actual: usize,
    },
}

/// Convenience alias used throughout `cql-proto`.
pub type Result<T> = std::result::Result<T, ProtocolError>;
