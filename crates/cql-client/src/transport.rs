//! Async TCP/TLS transport driving the sans-IO [`cql_core::Connection`].
//!
//! One [`connect`] call spawns a single task owning the socket, the TLS
//! session (if any), and the connection state machine. The task is the only
//! thing that ever touches the socket or the state machine; callers
//! interact through [`ConnectedClient`], whose methods submit work over a
//! channel to the I/O task.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use cql_core::{
    Connection, ConnectionAction, ConnectionConfig, ConnectionError, ConnectionEvent,
    PendingRequest, RequestOutcome,
};
use cql_proto::{Body, Frame, FrameAccumulator, ProtocolError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use crate::callbacks::{ClientCallbacks, SchemaEventKind};
use crate::error::ClientError;
use crate::tls::RustlsPump;

const READ_BUFFER_SIZE: usize = 64 * 1024;

enum Command {
    Send(Body, PendingRequest),
    Prepare(String, PendingRequest),
    SetKeyspace(String),
    Register(Vec<String>),
    Close,
}

/// A live connection to a CQL server.
///
/// Dropping this without calling [`Self::close`] leaves the background task
/// running until the socket itself errors; prefer an explicit close.
pub struct ConnectedClient {
    commands: mpsc::UnboundedSender<Command>,
    task: tokio::task::JoinHandle<()>,
}

impl ConnectedClient {
    /// Submit a request body. Fails immediately if the connection isn't
    /// `READY` or has no free stream IDs; otherwise returns a handle
    /// the caller can `wait()`/`wait_for()`/`on_complete()`.
    pub fn send(&self, body: Body) -> Result<PendingRequest, ClientError> {
        let handle = PendingRequest::new();
        self.commands
            .send(Command::Send(body, handle.clone()))
            .map_err(|_| ClientError::Closed)?;
        Ok(handle)
    }

    /// Prepare a statement. The registered `on_prepared` callback (if any)
    /// fires before the returned handle completes.
    pub fn prepare(&self, statement: impl Into<String>) -> Result<PendingRequest, ClientError> {
        let handle = PendingRequest::new();
        self.commands
            .send(Command::Prepare(statement.into(), handle.clone()))
            .map_err(|_| ClientError::Closed)?;
        Ok(handle)
    }

    /// Switch the connection's current keyspace. The registered
    /// `on_keyspace` callback (if any) fires when the server confirms.
    pub fn set_keyspace(&self, name: impl Into<String>) -> Result<(), ClientError> {
        self.commands.send(Command::SetKeyspace(name.into())).map_err(|_| ClientError::Closed)
    }

    /// Register for server-pushed events. The registered `on_schema_change`
    /// callback (if any) only fires once the server acknowledges this with
    /// `READY`.
    pub fn register(
        &self,
        event_types: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<(), ClientError> {
        let event_types = event_types.into_iter().map(Into::into).collect();
        self.commands.send(Command::Register(event_types)).map_err(|_| ClientError::Closed)
    }

    /// Close the connection, cancelling all in-flight requests, and wait for
    /// the background task to exit.
    pub async fn close(self) -> Result<(), ClientError> {
        let _ = self.commands.send(Command::Close);
        self.task.await.map_err(|_| ClientError::Closed)
    }
}

/// Resolve `host:port`, preferring an IPv4 address if the resolver returns
/// more than one.
async fn resolve(addr: &str) -> Result<SocketAddr, ClientError> {
    let mut addrs: Vec<SocketAddr> = tokio::net::lookup_host(addr).await?.collect();
    if addrs.is_empty() {
        return Err(ClientError::NoAddresses(addr.to_string()));
    }
    addrs.sort_by_key(|a| !a.is_ipv4());
    Ok(addrs[0])
}

/// Connect to a CQL server at `addr` (`host:port`). `tls` enables TLS using
/// the given config with `addr`'s host as the server name; `None` connects
/// in plaintext.
///
/// # Errors
///
/// Returns [`ClientError::NoAddresses`] if DNS resolution fails, or
/// [`ClientError::Io`]/[`ClientError::TlsSetup`] if the TCP connect or TLS
/// session setup fails. Once the background task starts, failures are
/// reported through `callbacks.on_connected` instead.
pub async fn connect(
    addr: &str,
    config: ConnectionConfig,
    tls: Option<Arc<rustls::ClientConfig>>,
    callbacks: ClientCallbacks,
) -> Result<ConnectedClient, ClientError> {
    let socket_addr = resolve(addr).await?;
    let host = addr.rsplit_once(':').map_or(addr, |(host, _)| host).to_string();

    let tcp = TcpStream::connect(socket_addr).await?;
    tcp.set_nodelay(true)?;

    let tls_pump = match tls {
        Some(tls_config) => Some(
            RustlsPump::new(tls_config, &host).map_err(|e| ClientError::TlsSetup(e.to_string()))?,
        ),
        None => None,
    };

    let (tx, rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(run(tcp, tls_pump, config, callbacks, rx));
    Ok(ConnectedClient { commands: tx, task })
}

async fn run(
    mut socket: TcpStream,
    mut tls: Option<RustlsPump>,
    config: ConnectionConfig,
    callbacks: ClientCallbacks,
    mut commands: mpsc::UnboundedReceiver<Command>,
) {
    let mut conn = Connection::new(Instant::now(), config.clone());
    let mut accumulator = FrameAccumulator::new(config.max_frame_size as usize);

    for action in conn.handle_event(ConnectionEvent::ResolveOk, Instant::now()).unwrap_or_default() {
        dispatch(action, &mut socket, &mut tls, &callbacks).await;
    }
    for action in conn.handle_event(ConnectionEvent::TcpConnectOk, Instant::now()).unwrap_or_default() {
        dispatch(action, &mut socket, &mut tls, &callbacks).await;
    }

    if let Some(pump) = tls.as_mut() {
        if let Err(error) = drive_tls_handshake(&mut socket, pump).await {
            notify_connected(&callbacks, Some(error)).await;
            return;
        }
        for action in conn.handle_event(ConnectionEvent::TlsDone, Instant::now()).unwrap_or_default() {
            dispatch(action, &mut socket, &mut tls, &callbacks).await;
        }
    } else {
        for action in conn.handle_event(ConnectionEvent::TlsOff, Instant::now()).unwrap_or_default() {
            dispatch(action, &mut socket, &mut tls, &callbacks).await;
        }
    }

    let mut read_buf = vec![0u8; READ_BUFFER_SIZE];
    loop {
        tokio::select! {
            result = socket.read(&mut read_buf) => {
                let event = match result {
                    Ok(0) => ConnectionEvent::SocketError("connection closed by peer".to_string()),
                    Ok(n) => match inbound_to_event(&mut accumulator, &mut tls, &read_buf[..n]) {
                        Ok(events) => {
                            for event in events {
                                let actions = match conn.handle_event(event, Instant::now()) {
                                    Ok(actions) => actions,
                                    Err(error) => {
                                        dispatch(
                                            ConnectionAction::NotifyError(error),
                                            &mut socket,
                                            &mut tls,
                                            &callbacks,
                                        )
                                        .await;
                                        continue;
                                    },
                                };
                                for action in actions {
                                    dispatch(action, &mut socket, &mut tls, &callbacks).await;
                                }
                            }
                            continue;
                        },
                        Err(error) => ConnectionEvent::FrameError(error),
                    },
                    Err(e) => ConnectionEvent::SocketError(e.to_string()),
                };
                let done = matches!(event, ConnectionEvent::SocketError(_) | ConnectionEvent::FrameError(_));
                if let Ok(actions) = conn.handle_event(event, Instant::now()) {
                    for action in actions {
                        dispatch(action, &mut socket, &mut tls, &callbacks).await;
                    }
                }
                if done {
                    return;
                }
            },
            command = commands.recv() => {
                let Some(command) = command else { return; };
                if !handle_command(&mut conn, command, &mut socket, &mut tls, &callbacks).await {
                    return;
                }
            },
        }
    }
}

async fn handle_command(
    conn: &mut Connection<Instant>,
    command: Command,
    socket: &mut TcpStream,
    tls: &mut Option<RustlsPump>,
    callbacks: &ClientCallbacks,
) -> bool {
    match command {
        Command::Send(body, handle) => match conn.send(body, handle.clone()) {
            Ok(action) => dispatch(action, socket, tls, callbacks).await,
            Err(err) => handle.complete(RequestOutcome::Failed(ConnectionError::Library(err))),
        },
        Command::Prepare(statement, handle) => match conn.prepare(statement, handle.clone()) {
            Ok(action) => dispatch(action, socket, tls, callbacks).await,
            Err(err) => handle.complete(RequestOutcome::Failed(ConnectionError::Library(err))),
        },
        Command::SetKeyspace(name) => {
            if let Ok(action) = conn.set_keyspace(name) {
                dispatch(action, socket, tls, callbacks).await;
            }
        },
        Command::Register(event_types) => {
            if let Ok(action) = conn.register(event_types) {
                dispatch(action, socket, tls, callbacks).await;
            }
        },
        Command::Close => {
            if let Ok(actions) = conn.handle_event(ConnectionEvent::Close, Instant::now()) {
                for action in actions {
                    dispatch(action, socket, tls, callbacks).await;
                }
            }
            return false;
        },
    }
    true
}

async fn drive_tls_handshake(socket: &mut TcpStream, tls: &mut RustlsPump) -> Result<(), ConnectionError> {
    use cql_core::PumpRequest;

    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    let result = tls.pump(PumpRequest::default()).map_err(ConnectionError::Tls)?;
    if !result.ciphertext_out.is_empty() {
        socket.write_all(&result.ciphertext_out).await.map_err(|e| ConnectionError::Os(e.to_string()))?;
    }
    while !tls.handshake_done() {
        let n = socket.read(&mut buf).await.map_err(|e| ConnectionError::Os(e.to_string()))?;
        if n == 0 {
            return Err(ConnectionError::Network("connection closed during TLS handshake".to_string()));
        }
        let result = tls
            .pump(PumpRequest { ciphertext_in: Some(&buf[..n]), plaintext_in: None })
            .map_err(ConnectionError::Tls)?;
        if !result.ciphertext_out.is_empty() {
            socket
                .write_all(&result.ciphertext_out)
                .await
                .map_err(|e| ConnectionError::Os(e.to_string()))?;
        }
    }
    Ok(())
}

fn inbound_to_event(
    accumulator: &mut FrameAccumulator,
    tls: &mut Option<RustlsPump>,
    bytes: &[u8],
) -> Result<Vec<ConnectionEvent>, ProtocolError> {
    let plaintext = match tls {
        Some(pump) => {
            use cql_core::PumpRequest;
            let result = pump
                .pump(PumpRequest { ciphertext_in: Some(bytes), plaintext_in: None })
                .map_err(|_| ProtocolError::Codec(cql_proto::CodecError::Invalid("tls error".to_string())))?;
            result.plaintext_out
        },
        None => bytes.to_vec(),
    };

    let mut frames = Vec::new();
    let mut offset = 0;
    while offset < plaintext.len() {
        let consumed = accumulator.fill(&plaintext[offset..])?;
        offset += consumed;
        if accumulator.has_frame() {
            if let Some(frame) = accumulator.take_frame() {
                frames.push(frame);
            }
        } else if consumed == 0 {
            break;
        }
    }
    Ok(frames.into_iter().map(ConnectionEvent::FrameReceived).collect())
}

async fn dispatch(
    action: ConnectionAction,
    socket: &mut TcpStream,
    tls: &mut Option<RustlsPump>,
    callbacks: &ClientCallbacks,
) {
    match action {
        ConnectionAction::SendFrame(frame) => {
            if let Err(error) = write_frame(socket, tls, &frame).await {
                tracing::warn!(%error, "failed to write frame");
            }
        },
        ConnectionAction::Close { reason } => {
            tracing::debug!(%reason, "closing connection");
            let _ = socket.shutdown().await;
        },
        ConnectionAction::NotifyConnected(error) => notify_connected(callbacks, error).await,
        ConnectionAction::NotifyError(error) => {
            if let Some(callback) = &callbacks.on_error {
                let callback = callback.clone();
                let _ = tokio::task::spawn_blocking(move || callback(error)).await;
            }
        },
        ConnectionAction::NotifyKeyspace(name) => {
            if let Some(callback) = &callbacks.on_keyspace {
                let callback = callback.clone();
                let _ = tokio::task::spawn_blocking(move || callback(name)).await;
            }
        },
        ConnectionAction::NotifyPrepared { statement, prepared_id, error } => {
            if let Some(callback) = &callbacks.on_prepared {
                let callback = callback.clone();
                let _ =
                    tokio::task::spawn_blocking(move || callback(error, statement, prepared_id)).await;
            }
        },
        ConnectionAction::NotifySchemaChange { kind, keyspace, object } => {
            if let Some(callback) = &callbacks.on_schema_change {
                if let Some(kind) = SchemaEventKind::from_wire(&kind) {
                    let callback = callback.clone();
                    let _ = tokio::task::spawn_blocking(move || callback(kind, keyspace, object)).await;
                }
            }
        },
    }
}

async fn notify_connected(callbacks: &ClientCallbacks, error: Option<ConnectionError>) {
    if let Some(callback) =
        callbacks.on_connected.lock().unwrap_or_else(std::sync::PoisonError::into_inner).take()
    {
        let _ = tokio::task::spawn_blocking(move || callback(error)).await;
    }
}

async fn write_frame(
    socket: &mut TcpStream,
    tls: &mut Option<RustlsPump>,
    frame: &Frame,
) -> std::io::Result<()> {
    let mut bytes = Vec::new();
    frame.encode(&mut bytes);

    match tls {
        Some(pump) => {
            use cql_core::PumpRequest;
            let result = pump
                .pump(PumpRequest { ciphertext_in: None, plaintext_in: Some(&bytes) })
                .map_err(|e| std::io::Error::other(e.to_string()))?;
            socket.write_all(&result.ciphertext_out).await
        },
        None => socket.write_all(&bytes).await,
    }
}
