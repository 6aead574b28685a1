//! `PREPARE` body (0x09).

use bytes::{Buf, BufMut};

use crate::error::CodecError;
use crate::primitives::{read_long_string, write_long_string};

/// Request to prepare a CQL statement for repeated execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrepareBody {
    /// The CQL statement text to prepare.
    pub query: String,
}

impl PrepareBody {
    /// Decode a `PREPARE` body.
    pub fn decode(buf: &mut impl Buf) -> Result<Self, CodecError> {
        Ok(Self { query: read_long_string(buf)? })
    }

    /// Encode a `PREPARE` body.
    pub fn encode(&self, buf: &mut impl BufMut) {
        write_long_string(buf, &self.query);
    }
}
