//! Async TCP/TLS transport for a CQL native protocol v2 driver.
//!
//! Wraps the sans-IO [`cql_core::Connection`] state machine with a `tokio`
//! task that owns the socket and an optional `rustls` session, exposing a
//! channel-backed [`transport::ConnectedClient`] handle to callers.
//!
//! Everything in this crate is feature-gated behind `transport`; without it,
//! only `cql-core`'s sans-IO types are usable, for callers who want to drive
//! their own I/O loop.

#![cfg_attr(not(feature = "transport"), allow(unused))]

#[cfg(feature = "transport")]
mod callbacks;
#[cfg(feature = "transport")]
mod error;
#[cfg(feature = "transport")]
mod tls;
#[cfg(feature = "transport")]
pub mod transport;

#[cfg(feature = "transport")]
pub use callbacks::ClientCallbacks;
#[cfg(feature = "transport")]
pub use error::ClientError;
#[cfg(feature = "transport")]
pub use tls::{default_tls_config, RustlsPump};
#[cfg(feature = "transport")]
pub use transport::{connect, ConnectedClient};
