//! Connection configuration.

use std::time::Duration;

use cql_proto::frame::DEFAULT_MAX_FRAME_SIZE;

/// Default time allowed to complete TCP connect, TLS handshake, and the
/// OPTIONS/SUPPORTED/STARTUP/READY negotiation.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Compression algorithm negotiated in `STARTUP`. Negotiation only; this
/// driver does not implement the compression codecs themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// Google Snappy.
    Snappy,
    /// LZ4.
    Lz4,
}

impl Compression {
    /// The `STARTUP` option value for this algorithm.
    #[must_use]
    pub fn option_value(self) -> &'static str {
        match self {
            Self::Snappy => "snappy",
            Self::Lz4 => "lz4",
        }
    }
}

/// Caller-supplied parameters for a single connection.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Time allowed to complete connect + handshake + negotiation.
    pub handshake_timeout: Duration,
    /// Time allowed without activity before the connection is considered
    /// dead. `None` disables idle timeout enforcement.
    pub idle_timeout: Option<Duration>,
    /// Ceiling on a frame's claimed body length, enforced by the frame
    /// accumulator before allocation.
    pub max_frame_size: u32,
    /// `CQL_VERSION` sent in `STARTUP`.
    pub default_cql_version: String,
    /// Compression algorithm to request, if any.
    pub compression: Option<Compression>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            idle_timeout: None,
            #[allow(clippy::cast_possible_truncation)]
            max_frame_size: DEFAULT_MAX_FRAME_SIZE as u32,
            default_cql_version: cql_proto::body::startup::DEFAULT_CQL_VERSION.to_string(),
            compression: None,
        }
    }
}
