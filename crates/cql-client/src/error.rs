//! Errors specific to the async transport.

use thiserror::Error;

/// Errors from connecting and driving the TCP/TLS transport.
#[derive(Error, Debug)]
pub enum ClientError {
    /// DNS resolution returned no addresses.
    #[error("DNS resolution returned no addresses for {0}")]
    NoAddresses(String),

    /// The TCP socket failed.
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),

    /// TLS setup (building the `ClientConfig`, constructing the session)
    /// failed before any handshake bytes were exchanged.
    #[error("tls setup error: {0}")]
    TlsSetup(String),

    /// The connection core reported an error.
    #[error("connection error: {0}")]
    Connection(#[from] cql_core::ConnectionError),

    /// The connection's background task is no longer running.
    #[error("connection task has already stopped")]
    Closed,
}
