//! `OPTIONS` (0x05) and `READY` (0x02) bodies: both are empty on the wire.

use bytes::{Buf, BufMut};

use crate::error::CodecError;

/// Client capability query. Carries no fields; the server replies with
/// `SUPPORTED`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OptionsBody;

impl OptionsBody {
    /// Decode an `OPTIONS` body (always empty).
    pub fn decode(_buf: &mut impl Buf) -> Result<Self, CodecError> {
        Ok(Self)
    }

    /// Encode an `OPTIONS` body (always empty).
    pub fn encode(&self, _buf: &mut impl BufMut) {}
}

/// Server acknowledgement that the connection accepted `STARTUP` and is
/// ready for queries. Carries no fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReadyBody;

impl ReadyBody {
    /// Decode a `READY` body (always empty).
    pub fn decode(_buf: &mut impl Buf) -> Result<Self, CodecError> {
        Ok(Self)
    }

    /// Encode a `READY` body (always empty).
    pub fn encode(&self, _buf: &mut impl BufMut) {}
}
