//! Frame body variants, tagged by [`crate::opcode::Opcode`].
//!
//! Each variant owns its own binary encoding (CQL v2 is a fixed binary wire
//! format, not a self-describing one); [`Body::opcode`] and
//! [`Body::into_frame`]/[`Body::from_frame`] handle the glue to
//! [`crate::frame::Frame`].

pub mod error;
pub mod execute;
pub mod options;
pub mod prepare;
pub mod query;
pub mod result;
pub mod startup;

use bytes::{Bytes, BytesMut};

use crate::error::ProtocolError;
use crate::frame::Frame;
use crate::header::FrameHeader;
use crate::opcode::Opcode;
use error::ErrorBody;
use execute::ExecuteBody;
use options::{OptionsBody, ReadyBody};
use prepare::PrepareBody;
use query::QueryBody;
use result::ResultBody;
use startup::{StartupBody, SupportedBody};

/// A decoded frame body, tagged by the opcode it was parsed from.
///
/// `Authenticate`, `Credentials`, `Register`, and `Event` carry their raw
/// bytes rather than a typed payload: `REGISTER`'s body is just a string
/// list the caller already has in hand, and this driver doesn't implement
/// SASL authentication, but still needs to recognize `Authenticate` on the
/// wire so the connection state machine can fail a pending request with
/// `LibraryError::AuthNotSupported` without losing the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// `ERROR` (0x00).
    Error(ErrorBody),
    /// `STARTUP` (0x01).
    Startup(StartupBody),
    /// `READY` (0x02).
    Ready(ReadyBody),
    /// `AUTHENTICATE` (0x03), raw body bytes.
    Authenticate(Bytes),
    /// `CREDENTIALS` (0x04), raw body bytes.
    Credentials(Bytes),
    /// `OPTIONS` (0x05).
    Options(OptionsBody),
    /// `SUPPORTED` (0x06).
    Supported(SupportedBody),
    /// `QUERY` (0x07).
    Query(QueryBody),
    /// `RESULT` (0x08).
    Result(ResultBody),
    /// `PREPARE` (0x09).
    Prepare(PrepareBody),
    /// `EXECUTE` (0x0A).
    Execute(ExecuteBody),
    /// `REGISTER` (0x0B), raw body bytes.
    Register(Bytes),
    /// `EVENT` (0x0C), raw body bytes.
    Event(Bytes),
}

impl Body {
    /// The opcode this body encodes as.
    #[must_use]
    pub fn opcode(&self) -> Opcode {
        match self {
            Self::Error(_) => Opcode::Error,
            Self::Startup(_) => Opcode::Startup,
            Self::Ready(_) => Opcode::Ready,
            Self::Authenticate(_) => Opcode::Authenticate,
            Self::Credentials(_) => Opcode::Credentials,
            Self::Options(_) => Opcode::Options,
            Self::Supported(_) => Opcode::Supported,
            Self::Query(_) => Opcode::Query,
            Self::Result(_) => Opcode::Result,
            Self::Prepare(_) => Opcode::Prepare,
            Self::Execute(_) => Opcode::Execute,
            Self::Register(_) => Opcode::Register,
            Self::Event(_) => Opcode::Event,
        }
    }

    /// Encode the body to its wire bytes.
    #[must_use]
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::new();
        match self {
            Self::Error(body) => body.encode(&mut buf),
            Self::Startup(body) => body.encode(&mut buf),
            Self::Ready(body) => body.encode(&mut buf),
            Self::Authenticate(raw) | Self::Credentials(raw) | Self::Register(raw) | Self::Event(raw) => {
                buf.extend_from_slice(raw);
            },
            Self::Options(body) => body.encode(&mut buf),
            Self::Supported(_) => {
                // Clients never encode SUPPORTED; it's server-to-client only.
            },
            Self::Query(body) => body.encode(&mut buf),
            Self::Result(body) => body.encode(&mut buf),
            Self::Prepare(body) => body.encode(&mut buf),
            Self::Execute(body) => body.encode(&mut buf),
        }
        buf.freeze()
    }

    /// Decode a body given its opcode and raw bytes.
    pub fn decode(opcode: Opcode, mut bytes: Bytes) -> Result<Self, ProtocolError> {
        Ok(match opcode {
            Opcode::Error => Self::Error(ErrorBody::decode(&mut bytes)?),
            Opcode::Startup => Self::Startup(StartupBody::decode(&mut bytes)?),
            Opcode::Ready => Self::Ready(ReadyBody::decode(&mut bytes)?),
            Opcode::Authenticate => Self::Authenticate(bytes),
            Opcode::Credentials => Self::Credentials(bytes),
            Opcode::Options => Self::Options(OptionsBody::decode(&mut bytes)?),
            Opcode::Supported => Self::Supported(SupportedBody::decode(&mut bytes)?),
            Opcode::Query => Self::Query(QueryBody::decode(&mut bytes)?),
            Opcode::Result => Self::Result(ResultBody::decode(&mut bytes)?),
            Opcode::Prepare => Self::Prepare(PrepareBody::decode(&mut bytes)?),
            Opcode::Execute => Self::Execute(ExecuteBody::decode(&mut bytes)?),
            Opcode::Register => Self::Register(bytes),
            Opcode::Event => Self::Event(bytes),
        })
    }

    /// Wrap this body in a frame with the given stream id.
    #[must_use]
    pub fn into_frame(self, stream: i8) -> Frame {
        let header = FrameHeader::request(self.opcode(), stream);
        Frame::new(header, self.encode())
    }

    /// Decode a frame's body according to its header's opcode.
    pub fn from_frame(frame: &Frame) -> Result<Self, ProtocolError> {
        let opcode = frame
            .header()
            .opcode()
            .ok_or_else(|| ProtocolError::UnknownOpcode(frame.header().opcode_raw()))?;
        Self::decode(opcode, frame.body().clone())
    }
}
