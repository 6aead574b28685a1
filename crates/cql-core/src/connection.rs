//! Connection state machine.
//!
//! Sans-IO: this type does no socket or TLS I/O itself. Methods take events
//! (or caller requests) and return `Vec<ConnectionAction>` for a driver
//! (`cql-client`'s transport loop) to execute. This keeps the state machine
//! pure and lets tests drive it with deterministic stub events instead of a
//! real socket, advancing the connection through `handle_frame`'s
//! `match (self.state, opcode)` dispatch.
//!
//! # State machine
//!
//! ```text
//! NEW ──resolve_ok──> RESOLVED ──tcp_connect_ok──> CONNECTED
//! CONNECTED ──tls_off | tls_done──> HANDSHAKE (sends OPTIONS)
//! HANDSHAKE ──recv(SUPPORTED)──> SUPPORTED (sends STARTUP)
//! SUPPORTED ──recv(READY)──> READY
//! SUPPORTED ──recv(AUTHENTICATE)──> DISCONNECTING (auth not supported)
//! any ──socket_error | frame_error | recv(ERROR on stream 0) before READY──> DISCONNECTING
//! READY ──close()──> DISCONNECTING
//! DISCONNECTING ──close_done──> DISCONNECTED
//! ```

use std::collections::{HashMap, HashSet};
use std::ops::Sub;
use std::time::{Duration, Instant};

use cql_proto::body::query::QueryBody;
use cql_proto::body::result::ResultBody;
use cql_proto::body::startup::StartupBody;
use cql_proto::primitives::{read_string, write_string_list};
use cql_proto::{Body, Consistency, Frame, Opcode};

use crate::config::ConnectionConfig;
use crate::error::{ConnectionError, LibraryError};
use crate::pending::{PendingRequest, RequestOutcome};
use crate::registry::StreamRegistry;

/// Stream ID connection-lifecycle frames are exchanged on.
const CONTROL_STREAM: i8 = 0;

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No network activity has started.
    New,
    /// DNS resolution succeeded; TCP connect not yet attempted.
    Resolved,
    /// TCP connected; TLS not yet negotiated.
    Connected,
    /// TLS resolved (on or off); OPTIONS sent, waiting for SUPPORTED.
    Handshake,
    /// SUPPORTED received; STARTUP sent, waiting for READY.
    Supported,
    /// Negotiation complete; requests may be sent.
    Ready,
    /// Closing, draining in-flight requests.
    Disconnecting,
    /// Fully closed.
    Disconnected,
}

/// Events that advance the connection.
///
/// `send(OPTIONS)` and `send(STARTUP)` are not events — they are actions the
/// connection emits itself on entering `HANDSHAKE`/`SUPPORTED`.
#[derive(Debug, Clone)]
pub enum ConnectionEvent {
    /// DNS resolution completed.
    ResolveOk,
    /// TCP connect completed.
    TcpConnectOk,
    /// No TLS configured for this connection.
    TlsOff,
    /// TLS handshake completed.
    TlsDone,
    /// A frame arrived from the peer.
    FrameReceived(Frame),
    /// The socket failed (read or write error).
    SocketError(String),
    /// The inbound frame parser failed (truncation, bad opcode, oversized
    /// frame, bad version byte).
    FrameError(cql_proto::ProtocolError),
    /// The caller requested the connection be closed.
    Close,
    /// The driver finished tearing down the socket after `DISCONNECTING`.
    CloseDone,
}

/// Actions the driver must execute in response to an event.
#[derive(Debug, Clone)]
pub enum ConnectionAction {
    /// Send this frame to the peer.
    SendFrame(Frame),
    /// Close the socket with this reason.
    Close {
        /// Human-readable reason, for logging.
        reason: String,
    },
    /// The connection reached `READY`, or terminally failed during setup.
    NotifyConnected(Option<ConnectionError>),
    /// A post-setup asynchronous error occurred.
    NotifyError(ConnectionError),
    /// A `SET_KEYSPACE` result arrived for a `set_keyspace` call.
    NotifyKeyspace(String),
    /// A `PREPARED` result (or an error) arrived for a `prepare` call.
    NotifyPrepared {
        /// The statement text that was prepared.
        statement: String,
        /// The server-assigned prepared-statement ID.
        prepared_id: Vec<u8>,
        /// Set if the prepare failed.
        error: Option<ConnectionError>,
    },
    /// A schema-change event arrived (only if `REGISTER` was issued).
    NotifySchemaChange {
        /// `CREATED`, `UPDATED`, or `DROPPED`.
        kind: String,
        /// Affected keyspace.
        keyspace: String,
        /// Affected object (table name), empty for keyspace-level changes.
        object: String,
    },
}

/// Sans-IO connection state machine.
///
/// Generic over an `Instant`-like type so tests can drive it with a virtual
/// clock instead of real wall time.
#[derive(Debug)]
pub struct Connection<I = Instant>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    state: ConnectionState,
    config: ConnectionConfig,
    last_activity: I,
    registry: StreamRegistry,
    /// Streams awaiting a `PREPARED` result, keyed by stream ID, valued by
    /// the statement text (needed to populate `NotifyPrepared`, which the
    /// response frame itself doesn't carry).
    pending_prepares: HashMap<u8, String>,
    /// Streams awaiting a `SET_KEYSPACE` result.
    pending_keyspace: HashSet<u8>,
    /// Streams awaiting the `READY` that acknowledges a `REGISTER` request.
    pending_register: HashSet<u8>,
    /// Set once a `REGISTER` has been acknowledged; gates `NotifySchemaChange`
    /// so unsolicited `EVENT` frames from a server that ignored `REGISTER`
    /// aren't surfaced as schema changes.
    registered: bool,
    connected_notified: bool,
}

impl<I> Connection<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    /// Create a new connection in [`ConnectionState::New`].
    pub fn new(now: I, config: ConnectionConfig) -> Self {
        Self {
            state: ConnectionState::New,
            config,
            last_activity: now,
            registry: StreamRegistry::new(),
            pending_prepares: HashMap::new(),
            pending_keyspace: HashSet::new(),
            pending_register: HashSet::new(),
            registered: false,
            connected_notified: false,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// `true` once the connection can accept `send`/`prepare`/`set_keyspace`.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state == ConnectionState::Ready
    }

    /// Number of requests currently in flight.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.registry.occupied_count()
    }

    fn options_frame(&self) -> Frame {
        Body::Options(cql_proto::body::options::OptionsBody).into_frame(CONTROL_STREAM)
    }

    fn startup_frame(&self) -> Frame {
        let mut startup = StartupBody::with_default_version();
        startup.options.retain(|(k, _)| k != "CQL_VERSION");
        startup.options.insert(0, ("CQL_VERSION".to_string(), self.config.default_cql_version.clone()));
        if let Some(compression) = self.config.compression {
            startup.options.push(("COMPRESSION".to_string(), compression.option_value().to_string()));
        }
        Body::Startup(startup).into_frame(CONTROL_STREAM)
    }

    fn enter_disconnecting(&mut self, now: I, error: ConnectionError) -> Vec<ConnectionAction> {
        let was_ready = self.state == ConnectionState::Ready;
        tracing::warn!(from = ?self.state, %error, "connection entering DISCONNECTING");
        self.state = ConnectionState::Disconnecting;
        self.last_activity = now;
        self.registry.fail_all(|| RequestOutcome::Failed(error.clone()));

        let mut actions = vec![ConnectionAction::Close { reason: error.to_string() }];
        if was_ready || self.connected_notified {
            actions.push(ConnectionAction::NotifyError(error));
        } else {
            self.connected_notified = true;
            actions.push(ConnectionAction::NotifyConnected(Some(error)));
        }
        actions
    }

    /// Advance the state machine with `event`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::UnexpectedFrame`] if a frame arrives that
    /// is not valid for the current state; the connection is left unchanged
    /// (the bad frame is ignored, not fatal).
    pub fn handle_event(
        &mut self,
        event: ConnectionEvent,
        now: I,
    ) -> Result<Vec<ConnectionAction>, ConnectionError> {
        self.last_activity = now;

        match event {
            ConnectionEvent::SocketError(reason) => {
                Ok(self.enter_disconnecting(now, ConnectionError::Network(reason)))
            },
            ConnectionEvent::FrameError(err) => {
                Ok(self.enter_disconnecting(now, ConnectionError::Protocol(err)))
            },
            ConnectionEvent::Close => {
                if self.state == ConnectionState::Disconnected {
                    return Ok(vec![]);
                }
                self.state = ConnectionState::Disconnecting;
                self.registry.fail_all(|| {
                    RequestOutcome::Failed(ConnectionError::Library(LibraryError::Cancelled))
                });
                Ok(vec![ConnectionAction::Close { reason: "closed by caller".to_string() }])
            },
            ConnectionEvent::CloseDone => {
                self.state = ConnectionState::Disconnected;
                Ok(vec![])
            },
            ConnectionEvent::ResolveOk if self.state == ConnectionState::New => {
                self.state = ConnectionState::Resolved;
                Ok(vec![])
            },
            ConnectionEvent::TcpConnectOk if self.state == ConnectionState::Resolved => {
                self.state = ConnectionState::Connected;
                Ok(vec![])
            },
            ConnectionEvent::TlsOff | ConnectionEvent::TlsDone
            if self.state == ConnectionState::Connected =>
            {
                self.state = ConnectionState::Handshake;
                Ok(vec![ConnectionAction::SendFrame(self.options_frame())])
            },
            ConnectionEvent::FrameReceived(frame) => self.handle_frame(&frame, now),
            ConnectionEvent::ResolveOk
            | ConnectionEvent::TcpConnectOk
            | ConnectionEvent::TlsOff
            | ConnectionEvent::TlsDone => {
                Err(ConnectionError::UnexpectedFrame { state: self.state, opcode: 0xFF })
            },
        }
    }

    fn handle_frame(&mut self, frame: &Frame, now: I) -> Result<Vec<ConnectionAction>, ConnectionError> {
        let Some(opcode) = frame.header().opcode() else {
            return Ok(self.enter_disconnecting(
                now,
                ConnectionError::Protocol(cql_proto::ProtocolError::UnknownOpcode(
                    frame.header().opcode_raw(),
                )),
            ));
        };
        let stream = frame.header().stream();

        if opcode == Opcode::Error && stream == CONTROL_STREAM {
            let body = Body::from_frame(frame)?;
            let Body::Error(error_body) = body else {
                return Err(ConnectionError::UnexpectedFrame { state: self.state, opcode: opcode.to_u8() });
            };
            let error = ConnectionError::Server { code: error_body.code, message: error_body.message };
            if self.state == ConnectionState::Ready {
                // Informational once READY: connection stays open.
                return Ok(vec![]);
            }
            return Ok(self.enter_disconnecting(now, error));
        }

        match (self.state, opcode) {
            (ConnectionState::Handshake, Opcode::Supported) => {
                self.state = ConnectionState::Supported;
                Ok(vec![ConnectionAction::SendFrame(self.startup_frame())])
            },
            (ConnectionState::Supported, Opcode::Ready) => {
                self.state = ConnectionState::Ready;
                self.connected_notified = true;
                tracing::debug!("connection READY");
                Ok(vec![ConnectionAction::NotifyConnected(None)])
            },
            (ConnectionState::Supported, Opcode::Authenticate) => {
                Ok(self.enter_disconnecting(now, ConnectionError::Library(LibraryError::AuthNotSupported)))
            },
            (ConnectionState::Ready, _) if stream != CONTROL_STREAM => {
                self.dispatch_to_registry(frame, opcode, stream)
            },
            (state, opcode) => {
                Err(ConnectionError::UnexpectedFrame { state, opcode: opcode.to_u8() })
            },
        }
    }

    #[allow(clippy::cast_sign_loss)]
    fn dispatch_to_registry(
        &mut self,
        frame: &Frame,
        opcode: Opcode,
        stream: i8,
    ) -> Result<Vec<ConnectionAction>, ConnectionError> {
        let stream_id = stream as u8;
        let mut actions = Vec::new();

        if let Some(statement) = self.pending_prepares.remove(&stream_id) {
            actions.push(prepared_notification(frame, opcode, statement));
        } else if self.pending_keyspace.remove(&stream_id) {
            if let Some(action) = keyspace_notification(frame, opcode) {
                actions.push(action);
            }
        } else if self.pending_register.remove(&stream_id) {
            if opcode == Opcode::Ready {
                self.registered = true;
            }
        } else if opcode == Opcode::Event && self.registered {
            if let Some(action) = schema_change_notification(frame) {
                actions.push(action);
            }
        }

        if let Some(handle) = self.registry.take(stream_id) {
            handle.complete(response_outcome(frame, opcode));
        }

        Ok(actions)
    }

    /// Send a request body. Fails synchronously with `NotReady` unless the
    /// connection is `READY`, or `NoStreams` if all 127 stream IDs are in
    /// flight. On success the caller retains `handle` to await the
    /// response; the connection keeps its own clone in the stream registry.
    pub fn send(&mut self, body: Body, handle: PendingRequest) -> Result<ConnectionAction, LibraryError> {
        if self.state != ConnectionState::Ready {
            return Err(LibraryError::NotReady);
        }
        let stream = self.registry.acquire(handle)?;
        #[allow(clippy::cast_possible_wrap)]
        let frame = body.into_frame(stream as i8);
        Ok(ConnectionAction::SendFrame(frame))
    }

    /// Convenience wrapper emitting `PREPARE`. On the corresponding
    /// `PREPARED` result, [`ConnectionAction::NotifyPrepared`] is emitted
    /// before the handle completes.
    pub fn prepare(
        &mut self,
        statement: impl Into<String>,
        handle: PendingRequest,
    ) -> Result<ConnectionAction, LibraryError> {
        if self.state != ConnectionState::Ready {
            return Err(LibraryError::NotReady);
        }
        let statement = statement.into();
        let stream = self.registry.acquire(handle)?;
        self.pending_prepares.insert(stream, statement.clone());
        #[allow(clippy::cast_possible_wrap)]
        let frame =
            Body::Prepare(cql_proto::body::prepare::PrepareBody { query: statement }).into_frame(stream as i8);
        Ok(ConnectionAction::SendFrame(frame))
    }

    /// Synthesize and send `USE <name>` without a caller-visible handle; the
    /// keyspace callback fires when the `SET_KEYSPACE` result arrives.
    pub fn set_keyspace(&mut self, name: impl Into<String>) -> Result<ConnectionAction, LibraryError> {
        if self.state != ConnectionState::Ready {
            return Err(LibraryError::NotReady);
        }
        let name = name.into();
        let stream = self.registry.acquire(PendingRequest::new())?;
        self.pending_keyspace.insert(stream);
        let query = QueryBody::simple(format!("USE {name}"), Consistency::One);
        #[allow(clippy::cast_possible_wrap)]
        let frame = Body::Query(query).into_frame(stream as i8);
        Ok(ConnectionAction::SendFrame(frame))
    }

    /// Send `REGISTER` for the given event types. Until the server
    /// acknowledges it with `READY`, incoming `EVENT` frames are ignored
    /// rather than surfaced as [`ConnectionAction::NotifySchemaChange`].
    pub fn register(
        &mut self,
        event_types: impl IntoIterator<Item = String>,
    ) -> Result<ConnectionAction, LibraryError> {
        if self.state != ConnectionState::Ready {
            return Err(LibraryError::NotReady);
        }
        let stream = self.registry.acquire(PendingRequest::new())?;
        self.pending_register.insert(stream);
        let types: Vec<String> = event_types.into_iter().collect();
        let mut body = bytes::BytesMut::new();
        write_string_list(&mut body, &types);
        #[allow(clippy::cast_possible_wrap)]
        let frame = Body::Register(body.freeze()).into_frame(stream as i8);
        Ok(ConnectionAction::SendFrame(frame))
    }
}

/// Resolve a pending request's handle from its response frame. An `ERROR`
/// opcode fails the request with the server's code/message rather than
/// handing the caller an error frame dressed up as a successful response.
fn response_outcome(frame: &Frame, opcode: Opcode) -> RequestOutcome {
    if opcode == Opcode::Error {
        if let Ok(Body::Error(err)) = Body::decode(opcode, frame.body().clone()) {
            return RequestOutcome::Failed(ConnectionError::Server {
                code: err.code,
                message: err.message,
            });
        }
    }
    RequestOutcome::Response(frame.clone())
}

fn prepared_notification(frame: &Frame, opcode: Opcode, statement: String) -> ConnectionAction {
    match Body::decode(opcode, frame.body().clone()) {
        Ok(Body::Result(ResultBody::Prepared(prepared_id))) => {
            ConnectionAction::NotifyPrepared { statement, prepared_id, error: None }
        },
        Ok(Body::Error(err)) => ConnectionAction::NotifyPrepared {
            statement,
            prepared_id: Vec::new(),
            error: Some(ConnectionError::Server { code: err.code, message: err.message }),
        },
        Ok(_) | Err(_) => ConnectionAction::NotifyPrepared {
            statement,
            prepared_id: Vec::new(),
            error: Some(ConnectionError::Library(LibraryError::Invariant(
                        "PREPARE response was neither PREPARED nor ERROR".to_string(),
            ))),
        },
    }
}

fn keyspace_notification(frame: &Frame, opcode: Opcode) -> Option<ConnectionAction> {
    match Body::decode(opcode, frame.body().clone()) {
        Ok(Body::Result(ResultBody::SetKeyspace(name))) => Some(ConnectionAction::NotifyKeyspace(name)),
        _ => None,
    }
}

/// `EVENT` bodies carry `[string event_type][string change][string keyspace][string object]`
/// for `SCHEMA_CHANGE`; this driver only surfaces that one event type.
fn schema_change_notification(frame: &Frame) -> Option<ConnectionAction> {
    let mut body = frame.body().clone();
    let event_type = read_string(&mut body).ok()?;
    if event_type != "SCHEMA_CHANGE" {
        return None;
    }
    let kind = read_string(&mut body).ok()?;
    let keyspace = read_string(&mut body).ok()?;
    let object = read_string(&mut body).unwrap_or_default();
    Some(ConnectionAction::NotifySchemaChange { kind, keyspace, object })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use cql_proto::body::error::ErrorBody;
    use cql_proto::body::options::ReadyBody;
    use cql_proto::body::result::ResultBody;
    use cql_proto::body::startup::SupportedBody;

    use super::*;

    type TestClock = u64;

    fn config() -> ConnectionConfig {
        ConnectionConfig::default()
    }

    fn drive_to_ready(conn: &mut Connection<TestClock>) -> Vec<ConnectionAction> {
        let mut actions = Vec::new();
        actions.extend(conn.handle_event(ConnectionEvent::ResolveOk, 0).unwrap());
        actions.extend(conn.handle_event(ConnectionEvent::TcpConnectOk, 0).unwrap());
        actions.extend(conn.handle_event(ConnectionEvent::TlsOff, 0).unwrap());
        let supported = Body::Supported(SupportedBody { options: vec![] }).into_frame(CONTROL_STREAM);
        actions.extend(conn.handle_event(ConnectionEvent::FrameReceived(supported), 0).unwrap());
        let ready = Body::Ready(ReadyBody).into_frame(CONTROL_STREAM);
        actions.extend(conn.handle_event(ConnectionEvent::FrameReceived(ready), 0).unwrap());
        actions
    }

    #[test]
    fn reaches_ready_and_fires_connect_callback_exactly_once() {
        let mut conn = Connection::new(0u64, config());
        let actions = drive_to_ready(&mut conn);

        assert_eq!(conn.state(), ConnectionState::Ready);
        let connected =
            actions.iter().filter(|a| matches!(a, ConnectionAction::NotifyConnected(None))).count();
        assert_eq!(connected, 1);
    }

    #[test]
    fn startup_error_fails_setup_exactly_once_and_disconnects() {
        let mut conn = Connection::new(0u64, config());
        conn.handle_event(ConnectionEvent::ResolveOk, 0).unwrap();
        conn.handle_event(ConnectionEvent::TcpConnectOk, 0).unwrap();
        conn.handle_event(ConnectionEvent::TlsOff, 0).unwrap();
        let supported = Body::Supported(SupportedBody { options: vec![] }).into_frame(CONTROL_STREAM);
        conn.handle_event(ConnectionEvent::FrameReceived(supported), 0).unwrap();

        let error =
            Body::Error(ErrorBody { code: 0x0000, message: "server error".to_string() }).into_frame(0);
        let actions = conn.handle_event(ConnectionEvent::FrameReceived(error), 0).unwrap();

        assert_eq!(conn.state(), ConnectionState::Disconnecting);
        let connect_failures: Vec<_> = actions
            .iter()
            .filter(|a| matches!(a, ConnectionAction::NotifyConnected(Some(_))))
            .collect();
        assert_eq!(connect_failures.len(), 1);
    }

    #[test]
    fn error_on_control_stream_while_ready_is_informational() {
        let mut conn = Connection::new(0u64, config());
        drive_to_ready(&mut conn);

        let error = Body::Error(ErrorBody { code: 0x1001, message: "unavailable".to_string() })
            .into_frame(CONTROL_STREAM);
        let actions = conn.handle_event(ConnectionEvent::FrameReceived(error), 1).unwrap();

        assert_eq!(conn.state(), ConnectionState::Ready);
        assert!(actions.is_empty());
    }

    #[test]
    fn close_in_ready_cancels_all_in_flight_handles() {
        let mut conn = Connection::new(0u64, config());
        drive_to_ready(&mut conn);

        let handles: Vec<_> = (0..5)
            .map(|_| {
                let handle = PendingRequest::new();
                let action = conn
                    .send(
                        Body::Query(QueryBody::simple("SELECT * FROM t", Consistency::One)),
                        handle.clone(),
                    )
                    .unwrap();
                assert!(matches!(action, ConnectionAction::SendFrame(_)));
                handle
            })
            .collect();

        conn.handle_event(ConnectionEvent::Close, 2).unwrap();

        for handle in &handles {
            assert!(handle.ready());
            assert!(matches!(
                handle.wait(),
                RequestOutcome::Failed(ConnectionError::Library(LibraryError::Cancelled))
            ));
        }
    }

    #[test]
    fn send_before_ready_fails_with_not_ready() {
        let mut conn = Connection::new(0u64, config());
        let result =
            conn.send(Body::Options(cql_proto::body::options::OptionsBody), PendingRequest::new());
        assert!(matches!(result, Err(LibraryError::NotReady)));
    }

    #[test]
    fn stream_exhaustion_is_not_fatal_to_connection() {
        let mut conn = Connection::new(0u64, config());
        drive_to_ready(&mut conn);

        for _ in 0..127 {
            conn.send(
                Body::Query(QueryBody::simple("SELECT * FROM t", Consistency::One)),
                PendingRequest::new(),
            )
            .unwrap();
        }

        let result = conn.send(
            Body::Query(QueryBody::simple("SELECT * FROM t", Consistency::One)),
            PendingRequest::new(),
        );
        assert!(matches!(result, Err(LibraryError::NoStreams)));
        assert_eq!(conn.state(), ConnectionState::Ready);
    }

    #[test]
    fn prepare_fires_prepared_notification_before_completing_handle() {
        let mut conn = Connection::new(0u64, config());
        drive_to_ready(&mut conn);

        let handle = PendingRequest::new();
        let ConnectionAction::SendFrame(sent) =
            conn.prepare("SELECT * FROM t WHERE k = ?", handle.clone()).unwrap()
        else {
            panic!("expected SendFrame");
        };
        let stream = sent.header().stream();

        let response =
            Body::Result(ResultBody::Prepared(vec![1, 2, 3])).into_frame(stream);
        let actions = conn.handle_event(ConnectionEvent::FrameReceived(response), 1).unwrap();

        assert!(actions.iter().any(|a| matches!(
            a,
            ConnectionAction::NotifyPrepared { prepared_id, error: None, .. } if *prepared_id == vec![1, 2, 3]
        )));
        assert!(handle.ready());
    }

    #[test]
    fn set_keyspace_fires_keyspace_notification() {
        let mut conn = Connection::new(0u64, config());
        drive_to_ready(&mut conn);

        let ConnectionAction::SendFrame(sent) = conn.set_keyspace("system").unwrap() else {
            panic!("expected SendFrame");
        };
        let stream = sent.header().stream();

        let response = Body::Result(ResultBody::SetKeyspace("system".to_string())).into_frame(stream);
        let actions = conn.handle_event(ConnectionEvent::FrameReceived(response), 1).unwrap();

        assert!(actions
            .iter()
            .any(|a| matches!(a, ConnectionAction::NotifyKeyspace(name) if name == "system")));
    }

    #[test]
    fn schema_change_event_produces_notification() {
        let mut conn = Connection::new(0u64, config());
        drive_to_ready(&mut conn);

        let ConnectionAction::SendFrame(sent) =
            conn.register(["SCHEMA_CHANGE".to_string()]).unwrap()
        else {
            panic!("expected SendFrame");
        };
        let register_stream = sent.header().stream();
        let ack = Body::Ready(ReadyBody).into_frame(register_stream);
        conn.handle_event(ConnectionEvent::FrameReceived(ack), 1).unwrap();

        let mut body = bytes::BytesMut::new();
        cql_proto::primitives::write_string(&mut body, "SCHEMA_CHANGE");
        cql_proto::primitives::write_string(&mut body, "CREATED");
        cql_proto::primitives::write_string(&mut body, "my_keyspace");
        cql_proto::primitives::write_string(&mut body, "my_table");
        let event = Body::Event(body.freeze()).into_frame(-1);

        let actions = conn.handle_event(ConnectionEvent::FrameReceived(event), 1).unwrap();
        assert!(actions.iter().any(|a| matches!(
            a,
            ConnectionAction::NotifySchemaChange { kind, keyspace, object }
                if kind == "CREATED" && keyspace == "my_keyspace" && object == "my_table"
        )));
    }

    #[test]
    fn schema_change_event_is_ignored_without_register() {
        let mut conn = Connection::new(0u64, config());
        drive_to_ready(&mut conn);

        let mut body = bytes::BytesMut::new();
        cql_proto::primitives::write_string(&mut body, "SCHEMA_CHANGE");
        cql_proto::primitives::write_string(&mut body, "CREATED");
        cql_proto::primitives::write_string(&mut body, "my_keyspace");
        cql_proto::primitives::write_string(&mut body, "my_table");
        let event = Body::Event(body.freeze()).into_frame(-1);

        let actions = conn.handle_event(ConnectionEvent::FrameReceived(event), 1).unwrap();
        assert!(actions.is_empty(), "unsolicited EVENT should not fire without REGISTER");
    }

    #[test]
    fn socket_error_drains_registry_and_notifies_once() {
        let mut conn = Connection::new(0u64, config());
        drive_to_ready(&mut conn);

        let handle = PendingRequest::new();
        conn.send(
            Body::Query(QueryBody::simple("SELECT * FROM t", Consistency::One)),
            handle.clone(),
        )
        .unwrap();

        let actions = conn.handle_event(ConnectionEvent::SocketError("reset".to_string()), 1).unwrap();

        assert_eq!(conn.state(), ConnectionState::Disconnecting);
        assert_eq!(
            actions.iter().filter(|a| matches!(a, ConnectionAction::NotifyError(_))).count(),
            1
        );
        assert!(handle.ready());
    }

    #[test]
    fn authenticate_is_treated_as_unsupported() {
        let mut conn = Connection::new(0u64, config());
        conn.handle_event(ConnectionEvent::ResolveOk, 0).unwrap();
        conn.handle_event(ConnectionEvent::TcpConnectOk, 0).unwrap();
        conn.handle_event(ConnectionEvent::TlsOff, 0).unwrap();
        let supported = Body::Supported(SupportedBody { options: vec![] }).into_frame(CONTROL_STREAM);
        conn.handle_event(ConnectionEvent::FrameReceived(supported), 0).unwrap();

        let authenticate = Body::Authenticate(bytes::Bytes::new()).into_frame(CONTROL_STREAM);
        let actions = conn.handle_event(ConnectionEvent::FrameReceived(authenticate), 0).unwrap();

        assert_eq!(conn.state(), ConnectionState::Disconnecting);
        assert!(actions.iter().any(|a| matches!(
            a,
            ConnectionAction::NotifyConnected(Some(ConnectionError::Library(
                LibraryError::AuthNotSupported
            )))
        )));
    }

    #[test]
    fn unexpected_frame_for_state_is_rejected_without_crashing() {
        let mut conn = Connection::new(0u64, config());
        let ready = Body::Ready(ReadyBody).into_frame(CONTROL_STREAM);
        let result = conn.handle_event(ConnectionEvent::FrameReceived(ready), 0);
        assert!(matches!(result, Err(ConnectionError::UnexpectedFrame { .. })));
        assert_eq!(conn.state(), ConnectionState::New);
    }
}
