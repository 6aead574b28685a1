//! Error types for the connection core.
//!
//! One `thiserror`-derived [`ConnectionError`] with a variant per error
//! source named in the taxonomy, plus the two error kinds specific to
//! subsystems that need their own vocabulary: [`TlsError`] (the pump's
//! want-more/fatal split) and [`LibraryError`] (invariant violations
//! internal to this crate, not the wire or the OS).

use thiserror::Error;

use crate::connection::ConnectionState;

/// Errors from the TLS adapter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TlsError {
    /// The pump needs more ciphertext or plaintext before it can make
    /// progress; not fatal, keep pumping once more bytes are available.
    #[error("TLS wants more data: {0}")]
    WantMore(String),

    /// The TLS session failed irrecoverably (handshake failure, certificate
    /// verification failure, decrypt failure).
    #[error("TLS fatal error: {0}")]
    Fatal(String),
}

/// Errors internal to this crate's invariants, not caused by the wire or the
/// OS.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LibraryError {
    /// The stream registry had no free IDs (127 already in flight).
    #[error("no free stream IDs available")]
    NoStreams,

    /// `send`/`prepare`/`set_keyspace` was called before the connection
    /// reached `READY`.
    #[error("connection is not ready")]
    NotReady,

    /// The request was cancelled, e.g. by `Connection::close` while still
    /// in flight.
    #[error("request was cancelled")]
    Cancelled,

    /// The server requested authentication, which this driver does not
    /// implement.
    #[error("server requires authentication, which is not supported")]
    AuthNotSupported,

    /// An internal invariant was violated (a bug in this crate, not the
    /// peer's behavior).
    #[error("internal invariant violated: {0}")]
    Invariant(String),
}

/// Unified error type for connection-core operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// OS-level failure: socket, DNS resolution, event loop registration.
    #[error("os error: {0}")]
    Os(String),

    /// Network-level failure: peer closed the connection, a write timed
    /// out, a read failed.
    #[error("network error: {0}")]
    Network(String),

    /// TLS handshake or session failure.
    #[error("tls error: {0}")]
    Tls(#[from] TlsError),

    /// Frame codec or wire-format failure.
    #[error("protocol error: {0}")]
    Protocol(#[from] cql_proto::ProtocolError),

    /// The server sent an `ERROR` frame.
    #[error("server error {code:#06x}: {message}")]
    Server {
        /// Server-assigned error code.
        code: i32,
        /// Human-readable error description.
        message: String,
    },

    /// An error internal to this driver rather than the wire or OS.
    #[error("library error: {0}")]
    Library(#[from] LibraryError),

    /// A frame arrived that is not valid for the connection's current
    /// state (e.g. `SUPPORTED` while already `READY`).
    #[error("unexpected frame for state {state:?}: opcode {opcode:#04x}")]
    UnexpectedFrame {
        /// Current state when the frame was received.
        state: ConnectionState,
        /// Opcode of the unexpected frame.
        opcode: u8,
    },
}

impl ConnectionError {
    /// `true` if this error occurred while the connection was still being
    /// established (before `READY`), meaning it belongs on the connect
    /// callback rather than the post-setup error callback.
    #[must_use]
    pub fn is_setup_phase(&self) -> bool {
        matches!(self, Self::Library(LibraryError::AuthNotSupported))
    }

    /// `true` if retrying the same operation might succeed without any
    /// change in the caller's behavior (pure network flakiness, not a
    /// protocol or configuration problem).
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Os(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_and_os_errors_are_transient() {
        assert!(ConnectionError::Network("peer reset".to_string()).is_transient());
        assert!(ConnectionError::Os("socket error".to_string()).is_transient());
    }

    #[test]
    fn protocol_and_server_errors_are_not_transient() {
        assert!(!ConnectionError::Server { code: 0x1200, message: "unavailable".to_string() }
            .is_transient());
        assert!(!ConnectionError::Library(LibraryError::NoStreams).is_transient());
    }

    #[test]
    fn auth_not_supported_is_setup_phase() {
        assert!(ConnectionError::Library(LibraryError::AuthNotSupported).is_setup_phase());
        assert!(!ConnectionError::Library(LibraryError::NoStreams).is_setup_phase());
    }
}
