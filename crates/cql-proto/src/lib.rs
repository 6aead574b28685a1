//! CQL native protocol v2 wire format: the 8-byte frame header, the
//! incremental inbound accumulator, primitive (de)serialization, and the
//! per-opcode body variants.
//!
//! This crate has no I/O and no notion of a connection; it only knows how
//! to turn bytes into [`Frame`]s and [`body::Body`] values and back. The
//! connection state machine that decides what to do with a decoded body
//! lives in `cql-core`.

pub mod body;
pub mod error;
pub mod frame;
pub mod header;
pub mod opcode;
pub mod primitives;

pub use body::Body;
pub use error::{CodecError, ProtocolError};
pub use frame::{Frame, FrameAccumulator, DEFAULT_MAX_FRAME_SIZE};
pub use header::FrameHeader;
pub use opcode::{Consistency, Opcode};
