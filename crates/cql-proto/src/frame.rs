//! Whole-buffer frame codec and the incremental inbound accumulator.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::ProtocolError;
use crate::header::FrameHeader;

/// A complete frame: header plus its raw body bytes.
///
/// The body is kept as opaque [`Bytes`] here; [`crate::body::Body`] decodes
/// it according to the header's opcode once the caller is ready to interpret
/// it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    header: FrameHeader,
    body: Bytes,
}

impl Frame {
    /// Pair a header with its body, stamping the header's length field from
    /// the body's actual size.
    #[must_use]
    pub fn new(mut header: FrameHeader, body: Bytes) -> Self {
        #[allow(clippy::cast_possible_wrap)]
        header.set_length(body.len() as i32);
        Self { header, body }
    }

    /// The frame header.
    #[must_use]
    pub fn header(&self) -> &FrameHeader {
        &self.header
    }

    /// The raw body bytes.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Serialize header followed by body.
    pub fn encode(&self, dst: &mut impl BufMut) {
        dst.put_slice(&self.header.to_bytes());
        dst.put_slice(&self.body);
    }

    /// Decode a complete frame from a buffer that already holds the whole
    /// header and body (used by tests and by callers who've already
    /// delimited a frame another way). Prefer [`FrameAccumulator`] for
    /// reading off a live socket.
    pub fn decode(mut bytes: Bytes, max_frame_size: usize) -> Result<Self, ProtocolError> {
        if bytes.len() < FrameHeader::SIZE {
            return Err(ProtocolError::Codec(crate::error::CodecError::Truncated {
                needed: FrameHeader::SIZE,
                available: bytes.len(),
            }));
        }
        #[allow(clippy::expect_used, reason = "length already checked above")]
        let header = *FrameHeader::ref_from_bytes(&bytes[..FrameHeader::SIZE])
            .expect("length already checked above");
        if header.version() != FrameHeader::REQUEST_VERSION && header.version() != FrameHeader::RESPONSE_VERSION {
            return Err(ProtocolError::WrongVersion(header.version()));
        }
        let body_len = header.length();
        if body_len < 0 {
            return Err(ProtocolError::Codec(crate::error::CodecError::Invalid(format!(
                "negative body length: {body_len}"
            ))));
        }
        let body_len = body_len as usize;
        if body_len > max_frame_size {
            return Err(ProtocolError::OversizedFrame { size: body_len, max: max_frame_size });
        }
        bytes.advance(FrameHeader::SIZE);
        if bytes.len() < body_len {
            return Err(ProtocolError::FrameTruncated { expected: body_len, actual: bytes.len() });
        }
        let body = bytes.split_to(body_len);
        Ok(Self { header, body })
    }
}

/// Two-phase incremental parser for inbound bytes arriving in arbitrary TCP
/// chunk boundaries.
///
/// Feed it bytes as they arrive via [`Self::fill`]; once a complete frame has
/// accumulated, [`Self::take_frame`] returns it and the accumulator resets
/// to parse the next one. A terminal failure (`UnknownOpcode`,
/// `OversizedFrame`) poisons the accumulator: every subsequent call returns
/// the same error, since the byte stream can no longer be trusted to
/// resynchronize on a frame boundary.
#[derive(Debug)]
pub struct FrameAccumulator {
    max_frame_size: usize,
    header_buf: BytesMut,
    header: Option<FrameHeader>,
    body_buf: BytesMut,
    body_len: usize,
    ready: bool,
    poisoned: Option<ProtocolError>,
}

/// Default ceiling on a frame's claimed body length: 256 MiB.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 256 * 1024 * 1024;

impl FrameAccumulator {
    /// Create an accumulator with the given maximum accepted body length.
    #[must_use]
    pub fn new(max_frame_size: usize) -> Self {
        Self {
            max_frame_size,
            header_buf: BytesMut::with_capacity(FrameHeader::SIZE),
            header: None,
            body_buf: BytesMut::new(),
            body_len: 0,
            ready: false,
            poisoned: None,
        }
    }

    /// Feed newly-received bytes. Returns the number of bytes consumed from
    /// `input`; callers should keep calling `fill` with the remainder (and
    /// draining completed frames via [`Self::take_frame`]) until `input` is
    /// exhausted.
    ///
    /// Never reads past a single frame boundary in one call: once a frame
    /// becomes ready, `fill` stops consuming so the caller can drain it
    /// before the next frame's bytes are considered.
    pub fn fill(&mut self, input: &[u8]) -> Result<usize, ProtocolError> {
        if let Some(err) = &self.poisoned {
            return Err(err.clone());
        }
        if self.ready {
            return Ok(0);
        }

        let mut consumed = 0;

        if self.header.is_none() {
            let needed = FrameHeader::SIZE - self.header_buf.len();
            let take = needed.min(input.len() - consumed);
            self.header_buf.extend_from_slice(&input[consumed..consumed + take]);
            consumed += take;

            if self.header_buf.len() < FrameHeader::SIZE {
                return Ok(consumed);
            }

            #[allow(clippy::expect_used, reason = "header_buf holds exactly FrameHeader::SIZE bytes")]
            let header = *FrameHeader::ref_from_bytes(&self.header_buf)
                .expect("header_buf holds exactly FrameHeader::SIZE bytes");
            if header.version() != FrameHeader::REQUEST_VERSION && header.version() != FrameHeader::RESPONSE_VERSION {
                let err = ProtocolError::WrongVersion(header.version());
                self.poisoned = Some(err.clone());
                return Err(err);
            }
            let length = header.length();
            if length < 0 {
                let err = ProtocolError::Codec(crate::error::CodecError::Invalid(format!(
                    "negative body length: {length}"
                )));
                self.poisoned = Some(err.clone());
                return Err(err);
            }
            let body_len = length as usize;
            if body_len > self.max_frame_size {
                let err =
                    ProtocolError::OversizedFrame { size: body_len, max: self.max_frame_size };
                self.poisoned = Some(err.clone());
                return Err(err);
            }
            if header.opcode().is_none() {
                let err = ProtocolError::UnknownOpcode(header.opcode_raw());
                self.poisoned = Some(err.clone());
                return Err(err);
            }

            self.header = Some(header);
            self.body_len = body_len;
            self.body_buf = BytesMut::with_capacity(body_len);
        }

        if self.body_buf.len() < self.body_len {
            let needed = self.body_len - self.body_buf.len();
            let take = needed.min(input.len() - consumed);
            self.body_buf.extend_from_slice(&input[consumed..consumed + take]);
            consumed += take;
        }

        if self.body_buf.len() == self.body_len {
            self.ready = true;
        }

        Ok(consumed)
    }

    /// `true` once a complete frame is ready to be taken.
    #[must_use]
    pub fn has_frame(&self) -> bool {
        self.ready
    }

    /// Take the completed frame and reset the accumulator for the next one.
    /// Returns `None` if no frame is ready yet.
    pub fn take_frame(&mut self) -> Option<Frame> {
        if !self.ready {
            return None;
        }
        #[allow(clippy::expect_used, reason = "ready implies header is set")]
        let header = self.header.take().expect("ready implies header is set");
        let body = std::mem::take(&mut self.body_buf).freeze();
        self.header_buf.clear();
        self.body_len = 0;
        self.ready = false;
        Some(Frame { header, body })
    }
}
