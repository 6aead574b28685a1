//! `ERROR` body (opcode 0x00).

use bytes::{Buf, BufMut};

use crate::error::CodecError;
use crate::primitives::{read_int, read_string, write_int, write_string};

/// Server-reported error: a numeric code plus a human-readable message.
///
/// The numeric code space (`0x0000` unavailable-exception through
/// `0x2500` unprepared) is server-defined and not re-validated here; callers
/// that need to branch on a specific code match `code` directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorBody {
    /// Server error code.
    pub code: i32,
    /// Human-readable error description.
    pub message: String,
}

impl ErrorBody {
    /// Decode an `ERROR` body.
    pub fn decode(buf: &mut impl Buf) -> Result<Self, CodecError> {
        let code = read_int(buf)?;
        let message = read_string(buf)?;
        Ok(Self { code, message })
    }

    /// Encode an `ERROR` body.
    pub fn encode(&self, buf: &mut impl BufMut) {
        write_int(buf, self.code);
        write_string(buf, &self.message);
    }
}
