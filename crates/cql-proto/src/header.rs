//! Frame header: the fixed 8-byte prefix of every CQL native-protocol v2
//! message.
//!
//! Stored as raw bytes behind `#[repr(C, packed)]` with `zerocopy` traits so
//! headers can be cast directly from a socket-read buffer with no copy and
//! no unsafe code: every 8-byte pattern is a structurally valid header (the
//! individual field values are validated separately by [`Self::version()`]
//! and the frame/body layer, not by the cast itself).

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::opcode::Opcode;

/// Fixed 8-byte frame header (big-endian network byte order).
#[repr(C, packed)]
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct FrameHeader {
    version: u8,
    flags: u8,
    stream: i8,
    opcode: u8,
    length: [u8; 4],
}

/// `flags` bit denoting that the body is compressed.
pub const FLAG_COMPRESSION: u8 = 0x01;
/// `flags` bit denoting that tracing was requested/enabled for this frame.
pub const FLAG_TRACING: u8 = 0x02;

impl FrameHeader {
    /// Size of the serialized header in bytes.
    pub const SIZE: usize = 8;

    /// Version byte for client-originated requests.
    pub const REQUEST_VERSION: u8 = 0x02;

    /// Version byte for server-originated responses (request version with
    /// the high bit set).
    pub const RESPONSE_VERSION: u8 = 0x82;

    /// Build a request header (version [`Self::REQUEST_VERSION`]) for the
    /// given opcode and stream, with `length` set to zero until the body is
    /// known.
    #[must_use]
    pub fn request(opcode: Opcode, stream: i8) -> Self {
        Self {
            version: Self::REQUEST_VERSION,
            flags: 0,
            stream,
            opcode: opcode.to_u8(),
            length: [0; 4],
        }
    }

    /// Parse a header from exactly [`Self::SIZE`] bytes (zero-copy).
    ///
    /// Returns `None` if `bytes` is shorter than [`Self::SIZE`]; the caller
    /// is expected to have already accumulated that many bytes (see
    /// [`crate::frame::FrameAccumulator`]).
    #[must_use]
    pub fn ref_from_bytes(bytes: &[u8]) -> Option<&Self> {
        Self::ref_from_prefix(bytes).ok().map(|(header, _rest)| header)
    }

    /// Serialize the header to its wire bytes.
    #[must_use]
    pub fn to_bytes(self) -> [u8; Self::SIZE] {
        let mut arr = [0u8; Self::SIZE];
        arr.copy_from_slice(IntoBytes::as_bytes(&self));
        arr
    }

    /// Raw version byte.
    #[must_use]
    pub fn version(&self) -> u8 {
        self.version
    }

    /// `true` if this header's version byte marks a server response
    /// ([`Self::RESPONSE_VERSION`]).
    #[must_use]
    pub fn is_response(&self) -> bool {
        self.version & 0x80 != 0
    }

    /// Raw flags byte.
    #[must_use]
    pub fn flags(&self) -> u8 {
        self.flags
    }

    /// `true` if [`FLAG_COMPRESSION`] is set.
    #[must_use]
    pub fn compressed(&self) -> bool {
        self.flags & FLAG_COMPRESSION != 0
    }

    /// `true` if [`FLAG_TRACING`] is set.
    #[must_use]
    pub fn tracing(&self) -> bool {
        self.flags & FLAG_TRACING != 0
    }

    /// Set the flags byte.
    pub fn set_flags(&mut self, flags: u8) {
        self.flags = flags;
    }

    /// Stream ID: `>= 1` for caller requests, `0` for connection-lifecycle
    /// frames, `< 0` for server-initiated events.
    #[must_use]
    pub fn stream(&self) -> i8 {
        self.stream
    }

    /// Stamp the stream ID (used by the connection when handing a frame to
    /// the stream registry).
    pub fn set_stream(&mut self, stream: i8) {
        self.stream = stream;
    }

    /// Raw opcode byte.
    #[must_use]
    pub fn opcode_raw(&self) -> u8 {
        self.opcode
    }

    /// Opcode as the typed enum. `None` if unrecognized.
    #[must_use]
    pub fn opcode(&self) -> Option<Opcode> {
        Opcode::from_u8(self.opcode)
    }

    /// Claimed body length. Not validated against any ceiling by the header
    /// itself; see [`crate::frame::FrameAccumulator`] for the bounded-length
    /// check.
    #[must_use]
    pub fn length(&self) -> i32 {
        i32::from_be_bytes(self.length)
    }

    /// Set the body length field.
    pub fn set_length(&mut self, length: i32) {
        self.length = length.to_be_bytes();
    }
}

impl std::fmt::Debug for FrameHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameHeader")
            .field("version", &format!("{:#04x}", self.version()))
            .field("flags", &format!("{:#04x}", self.flags()))
            .field("stream", &self.stream())
            .field("opcode", &format!("{:#04x}", self.opcode_raw()))
            .field("length", &self.length())
            .finish()
    }
}

impl PartialEq for FrameHeader {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for FrameHeader {}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    impl Arbitrary for FrameHeader {
        type Parameters = ();
        type Strategy = BoxedStrategy<Self>;

        fn arbitrary_with((): Self::Parameters) -> Self::Strategy {
            (any::<u8>(), any::<u8>(), any::<i8>(), any::<u8>(), any::<i32>())
                .prop_map(|(version, flags, stream, opcode, length)| Self {
                    version,
                    flags,
                    stream,
                    opcode,
                    length: length.to_be_bytes(),
                })
                .boxed()
        }
    }

    #[test]
    fn header_size_is_eight_bytes() {
        assert_eq!(std::mem::size_of::<FrameHeader>(), FrameHeader::SIZE);
        assert_eq!(FrameHeader::SIZE, 8);
    }

    proptest! {
        #[test]
        fn header_round_trip(header in any::<FrameHeader>()) {
            let bytes = header.to_bytes();
            let parsed = FrameHeader::ref_from_bytes(&bytes).expect("should parse");
            prop_assert_eq!(&header, parsed);
        }
    }

    #[test]
    fn reject_short_buffer() {
        let short = [0u8; 7];
        assert!(FrameHeader::ref_from_bytes(&short).is_none());
    }

    #[test]
    fn request_header_has_request_version() {
        let header = FrameHeader::request(Opcode::Options, 0);
        assert_eq!(header.version(), FrameHeader::REQUEST_VERSION);
        assert!(!header.is_response());
        assert_eq!(header.opcode(), Some(Opcode::Options));
        assert_eq!(header.stream(), 0);
    }

    #[test]
    fn error_scenario_header_bytes() {
        // 81 01 7F 00 00 00 00 0C: version=0x81 -> not a recognized version
        // constant, but parses structurally; stream=0x7F, opcode=ERROR,
        // length=12.
        let bytes = [0x81, 0x01, 0x7F, 0x00, 0x00, 0x00, 0x00, 0x0C];
        let header = FrameHeader::ref_from_bytes(&bytes).unwrap();
        assert_eq!(header.version(), 0x81);
        assert!(header.is_response());
        assert_eq!(header.stream(), 0x7F);
        assert_eq!(header.opcode(), Some(Opcode::Error));
        assert_eq!(header.length(), 12);
    }
}
