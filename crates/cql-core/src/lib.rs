//! Sans-IO connection core for a CQL native protocol v2 driver.
//!
//! This crate owns no socket, no executor, and no TLS implementation: it is
//! the connection state machine, stream multiplexer, and request handle,
//! driven by events and returning actions for a transport (`cql-client`) to
//! execute.

pub mod callbacks;
pub mod config;
pub mod connection;
pub mod error;
pub mod pending;
pub mod registry;
pub mod tls;

pub use config::{Compression, ConnectionConfig};
pub use connection::{Connection, ConnectionAction, ConnectionEvent, ConnectionState};
pub use error::{ConnectionError, LibraryError, TlsError};
pub use pending::{PendingRequest, RequestOutcome};
pub use registry::StreamRegistry;
pub use tls::{PumpRequest, PumpResult, TlsPump};
