//! TLS adapter interface: a transport- and crypto-library-agnostic "pump"
//! that exchanges ciphertext and plaintext through a single synchronous
//! call, in place of a stateful multi-parameter read/write function.
//!
//! `cql-core` depends only on this trait. The concrete implementation
//! (`cql-client::tls::RustlsPump`, wrapping rustls's synchronous
//! `ClientConnection`) lives in `cql-client`, keeping the transport-agnostic
//! core separate from the feature-gated transport crate.

use crate::error::TlsError;

/// Input to a single [`TlsPump::pump`] call.
#[derive(Debug, Clone, Copy, Default)]
pub struct PumpRequest<'a> {
    /// Ciphertext just received from the socket, if any.
    pub ciphertext_in: Option<&'a [u8]>,
    /// Plaintext the application wishes to send, if any.
    pub plaintext_in: Option<&'a [u8]>,
}

/// Output of a single [`TlsPump::pump`] call.
#[derive(Debug, Clone, Default)]
pub struct PumpResult {
    /// Plaintext newly decrypted and available to the application.
    pub plaintext_out: Vec<u8>,
    /// Ciphertext newly produced that must be written to the socket.
    pub ciphertext_out: Vec<u8>,
    /// Bytes of `ciphertext_in` actually consumed by this call.
    pub ciphertext_consumed: usize,
}

/// A byte-pipe wrapper presenting a plaintext read/write interface over a
/// TLS session that internally buffers ciphertext.
///
/// All socket I/O happens outside `pump`; all TLS mechanics happen inside
/// it. The handshake itself is driven implicitly: calling `pump` with
/// whatever ciphertext/plaintext is available advances the handshake state
/// until [`Self::handshake_done`] reports completion.
pub trait TlsPump {
    /// Exchange ciphertext and plaintext with the TLS session.
    ///
    /// # Errors
    ///
    /// Returns [`TlsError::WantMore`] if the session needs more input before
    /// it can produce output (not fatal — call again once more bytes
    /// arrive), or [`TlsError::Fatal`] if the session failed irrecoverably.
    fn pump(&mut self, req: PumpRequest<'_>) -> Result<PumpResult, TlsError>;

    /// `true` once the TLS handshake has completed and application data can
    /// flow.
    fn handshake_done(&self) -> bool;
}
