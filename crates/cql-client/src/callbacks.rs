//! Callback registration for [`crate::transport::connect`].
//!
//! `cql-core` only reports [`cql_core::ConnectionAction`] variants; this
//! crate is where the actual callback closures are stored and invoked off
//! the I/O-loop thread via `tokio::task::spawn_blocking`. `on_connected`
//! fires once, so it's a plain `FnOnce` taken out of a mutex; the rest may
//! fire repeatedly, so they're reference-counted `Fn`s.

use std::sync::{Arc, Mutex};

use cql_core::ConnectionError;

pub use cql_core::callbacks::SchemaEventKind;

type OnConnected = Mutex<Option<Box<dyn FnOnce(Option<ConnectionError>) + Send>>>;
type OnError = Arc<dyn Fn(ConnectionError) + Send + Sync>;
type OnKeyspace = Arc<dyn Fn(String) + Send + Sync>;
type OnPrepared = Arc<dyn Fn(Option<ConnectionError>, String, Vec<u8>) + Send + Sync>;
type OnSchemaChange = Arc<dyn Fn(SchemaEventKind, String, String) + Send + Sync>;

/// Callbacks a caller registers before [`crate::transport::connect`].
#[derive(Default)]
pub struct ClientCallbacks {
    pub(crate) on_connected: OnConnected,
    pub(crate) on_error: Option<OnError>,
    pub(crate) on_keyspace: Option<OnKeyspace>,
    pub(crate) on_prepared: Option<OnPrepared>,
    pub(crate) on_schema_change: Option<OnSchemaChange>,
}

impl ClientCallbacks {
    /// Start with no callbacks registered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires once when the connection reaches `READY` or fails during setup.
    #[must_use]
    pub fn on_connected(mut self, callback: impl FnOnce(Option<ConnectionError>) + Send + 'static) -> Self {
        self.on_connected = Mutex::new(Some(Box::new(callback)));
        self
    }

    /// Fires for post-setup asynchronous errors. May fire more than once.
    #[must_use]
    pub fn on_error(mut self, callback: impl Fn(ConnectionError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(callback));
        self
    }

    /// Fires when a `SET_KEYSPACE` result arrives.
    #[must_use]
    pub fn on_keyspace(mut self, callback: impl Fn(String) + Send + Sync + 'static) -> Self {
        self.on_keyspace = Some(Arc::new(callback));
        self
    }

    /// Fires for each `PREPARED` result (or failure).
    #[must_use]
    pub fn on_prepared(
        mut self,
        callback: impl Fn(Option<ConnectionError>, String, Vec<u8>) + Send + Sync + 'static,
    ) -> Self {
        self.on_prepared = Some(Arc::new(callback));
        self
    }

    /// Fires for server schema-change events once [`crate::ConnectedClient::register`]
    /// has been acknowledged with `READY`; unsolicited `EVENT` frames are
    /// ignored.
    #[must_use]
    pub fn on_schema_change(
        mut self,
        callback: impl Fn(SchemaEventKind, String, String) + Send + Sync + 'static,
    ) -> Self {
        self.on_schema_change = Some(Arc::new(callback));
        self
    }
}
