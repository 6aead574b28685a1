//! Callback surface type aliases.
//!
//! `cql-core`'s [`crate::connection::Connection`] is sans-IO: it never holds
//! or invokes these closures itself, only reports the corresponding
//! [`crate::connection::ConnectionAction`] variant. `cql-client`'s transport
//! loop owns the actual registered callbacks and invokes them off the I/O
//! thread when it sees the matching action.

use crate::error::ConnectionError;

/// Invoked once when the connection reaches `READY`, or terminally fails
/// during setup.
pub type ConnectionCallback = Box<dyn FnOnce(Option<ConnectionError>) + Send>;

/// Invoked for post-setup asynchronous errors. May fire more than once.
pub type ErrorCallback = Box<dyn Fn(ConnectionError) + Send>;

/// Invoked when a `SET_KEYSPACE` result arrives.
pub type KeyspaceCallback = Box<dyn Fn(&str) + Send>;

/// Invoked for each `PREPARED` result (or failure) from a `prepare` call.
pub type PrepareCallback = Box<dyn Fn(Option<ConnectionError>, &str, &[u8]) + Send>;

/// Kind of schema change carried by a `SCHEMA_CHANGE` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaEventKind {
    /// A keyspace or table was created.
    Created,
    /// A keyspace or table was altered.
    Updated,
    /// A keyspace or table was dropped.
    Dropped,
}

impl SchemaEventKind {
    /// Parse the wire representation (`CREATED`/`UPDATED`/`DROPPED`).
    /// `None` if unrecognized.
    #[must_use]
    pub fn from_wire(value: &str) -> Option<Self> {
        Some(match value {
            "CREATED" => Self::Created,
            "UPDATED" => Self::Updated,
            "DROPPED" => Self::Dropped,
            _ => return None,
        })
    }
}

/// Invoked for server schema events, if `REGISTER` was issued.
pub type SchemaCallback = Box<dyn Fn(SchemaEventKind, &str, &str) + Send>;
