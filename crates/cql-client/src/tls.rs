//! [`cql_core::TlsPump`] backed by rustls's synchronous `ClientConnection`.

use std::io::{Read, Write};
use std::sync::Arc;

use cql_core::{PumpRequest, PumpResult, TlsError, TlsPump};
use rustls::pki_types::ServerName;
use rustls::{ClientConfig, ClientConnection, RootCertStore};

/// Build a `rustls::ClientConfig` trusting the platform/`webpki-roots`
/// certificate authorities. The common case; callers needing a custom trust
/// store or client certificates should build their own `ClientConfig` and
/// use [`RustlsPump::new`] directly.
#[must_use]
pub fn default_tls_config() -> Arc<ClientConfig> {
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    Arc::new(ClientConfig::builder().with_root_certificates(roots).with_no_client_auth())
}

/// Drives a single rustls client session through [`TlsPump`].
pub struct RustlsPump {
    conn: ClientConnection,
}

impl RustlsPump {
    /// Start a new TLS session against `server_name` using `config`.
    ///
    /// # Errors
    ///
    /// Returns [`TlsError::Fatal`] if `server_name` is not a valid DNS name
    /// or IP address, or the session cannot be constructed.
    pub fn new(config: Arc<ClientConfig>, server_name: &str) -> Result<Self, TlsError> {
        let name = ServerName::try_from(server_name.to_string())
            .map_err(|e| TlsError::Fatal(format!("invalid server name {server_name:?}: {e}")))?;
        let conn = ClientConnection::new(config, name)
            .map_err(|e| TlsError::Fatal(format!("failed to start TLS session: {e}")))?;
        Ok(Self { conn })
    }
}

impl TlsPump for RustlsPump {
    fn pump(&mut self, req: PumpRequest<'_>) -> Result<PumpResult, TlsError> {
        let mut ciphertext_consumed = 0;
        if let Some(ciphertext) = req.ciphertext_in {
            let mut cursor = std::io::Cursor::new(ciphertext);
            ciphertext_consumed = self
                .conn
                .read_tls(&mut cursor)
                .map_err(|e| TlsError::Fatal(format!("read_tls failed: {e}")))?;
            if let Err(e) = self.conn.process_new_packets() {
                return Err(TlsError::Fatal(format!("TLS session failed: {e}")));
            }
        }

        if let Some(plaintext) = req.plaintext_in {
            self.conn
                .writer()
                .write_all(plaintext)
                .map_err(|e| TlsError::Fatal(format!("tls writer failed: {e}")))?;
        }

        let mut ciphertext_out = Vec::new();
        while self.conn.wants_write() {
            self.conn
                .write_tls(&mut ciphertext_out)
                .map_err(|e| TlsError::Fatal(format!("write_tls failed: {e}")))?;
        }

        let mut plaintext_out = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            match self.conn.reader().read(&mut buf) {
                Ok(0) => break,
                Ok(n) => plaintext_out.extend_from_slice(&buf[..n]),
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(e) => return Err(TlsError::Fatal(format!("tls reader failed: {e}"))),
            }
        }

        Ok(PumpResult { plaintext_out, ciphertext_out, ciphertext_consumed })
    }

    fn handshake_done(&self) -> bool {
        !self.conn.is_handshaking()
    }
}
