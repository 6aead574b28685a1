//! Integration tests for the real TCP transport.
//!
//! These drive [`cql_client::connect`] against a hand-rolled loopback server
//! that speaks just enough of the OPTIONS/STARTUP handshake to exercise the
//! client's state machine end to end, rather than against a real
//! Cassandra-family server.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use cql_client::{connect, ClientCallbacks};
use cql_core::{ConnectionConfig, ConnectionError, LibraryError};
use cql_proto::body::options::ReadyBody;
use cql_proto::body::result::ResultBody;
use cql_proto::body::startup::SupportedBody;
use cql_proto::{Body, Opcode};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

async fn read_request(socket: &mut TcpStream) -> (Opcode, i8) {
    let mut header_buf = [0u8; 8];
    socket.read_exact(&mut header_buf).await.unwrap();
    let length = i32::from_be_bytes(header_buf[4..8].try_into().unwrap());
    let mut body = vec![0u8; length as usize];
    if length > 0 {
        socket.read_exact(&mut body).await.unwrap();
    }
    let opcode = Opcode::from_u8(header_buf[3]).expect("known opcode");
    let stream = header_buf[2] as i8;
    (opcode, stream)
}

async fn write_response(socket: &mut TcpStream, body: Body, stream: i8) {
    let frame = body.into_frame(stream);
    let mut bytes = Vec::new();
    frame.encode(&mut bytes);
    socket.write_all(&bytes).await.unwrap();
}

/// Accept one connection and complete OPTIONS/SUPPORTED then STARTUP/READY,
/// handing the socket back so the test can keep driving it.
async fn accept_and_handshake(listener: &TcpListener) -> TcpStream {
    let (mut socket, _) = listener.accept().await.unwrap();
    let (opcode, stream) = read_request(&mut socket).await;
    assert_eq!(opcode, Opcode::Options);
    write_response(&mut socket, Body::Supported(SupportedBody { options: vec![] }), stream).await;

    let (opcode, stream) = read_request(&mut socket).await;
    assert_eq!(opcode, Opcode::Startup);
    write_response(&mut socket, Body::Ready(ReadyBody), stream).await;

    socket
}

#[tokio::test]
async fn handshake_reaches_ready_and_fires_connected_callback() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    let server = tokio::spawn(async move {
        let _socket = accept_and_handshake(&listener).await;
        // Hold the socket open; the test only cares about the handshake.
        tokio::time::sleep(Duration::from_secs(5)).await;
    });

    let (tx, rx) = tokio::sync::oneshot::channel();
    let tx = Arc::new(Mutex::new(Some(tx)));
    let callbacks = ClientCallbacks::new().on_connected(move |error| {
        if let Some(tx) = tx.lock().unwrap().take() {
            let _ = tx.send(error);
        }
    });

    let client = connect(&addr, ConnectionConfig::default(), None, callbacks).await.unwrap();

    let error = timeout(Duration::from_secs(5), rx).await.expect("on_connected fired").unwrap();
    assert!(error.is_none(), "handshake should succeed: {error:?}");

    client.close().await.unwrap();
    server.abort();
}

#[tokio::test]
async fn connect_fails_when_nothing_is_listening() {
    // Bind then drop the listener to get a port nothing is listening on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);

    let result = connect(&addr, ConnectionConfig::default(), None, ClientCallbacks::new()).await;
    assert!(result.is_err(), "connecting to a closed port should fail");
}

#[tokio::test]
async fn authenticate_after_startup_is_surfaced_as_auth_not_supported() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let (opcode, stream) = read_request(&mut socket).await;
        assert_eq!(opcode, Opcode::Options);
        write_response(&mut socket, Body::Supported(SupportedBody { options: vec![] }), stream)
            .await;

        let (opcode, stream) = read_request(&mut socket).await;
        assert_eq!(opcode, Opcode::Startup);
        write_response(&mut socket, Body::Authenticate(bytes::Bytes::new()), stream).await;

        tokio::time::sleep(Duration::from_secs(5)).await;
    });

    let (tx, rx) = tokio::sync::oneshot::channel();
    let tx = Arc::new(Mutex::new(Some(tx)));
    let callbacks = ClientCallbacks::new().on_connected(move |error| {
        if let Some(tx) = tx.lock().unwrap().take() {
            let _ = tx.send(error);
        }
    });

    let client = connect(&addr, ConnectionConfig::default(), None, callbacks).await.unwrap();
    let error = timeout(Duration::from_secs(5), rx).await.expect("on_connected fired").unwrap();

    assert!(matches!(error, Some(ConnectionError::Library(LibraryError::AuthNotSupported))));

    let _ = client.close().await;
    server.abort();
}

#[tokio::test]
async fn query_after_ready_resolves_through_pending_request() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    let server = tokio::spawn(async move {
        let mut socket = accept_and_handshake(&listener).await;
        let (opcode, stream) = read_request(&mut socket).await;
        assert_eq!(opcode, Opcode::Query);
        write_response(&mut socket, Body::Result(ResultBody::Void), stream).await;
        tokio::time::sleep(Duration::from_secs(5)).await;
    });

    let client =
        connect(&addr, ConnectionConfig::default(), None, ClientCallbacks::new()).await.unwrap();

    // Give the background task a moment to observe READY before sending.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let query =
        cql_proto::body::query::QueryBody::simple("SELECT * FROM t", cql_proto::Consistency::One);
    let pending = client.send(Body::Query(query)).expect("connection should be ready");

    let outcome =
        timeout(Duration::from_secs(5), tokio::task::spawn_blocking(move || pending.wait()))
            .await
            .expect("response within timeout")
            .unwrap();

    match outcome {
        cql_core::RequestOutcome::Response(frame) => {
            assert_eq!(frame.header().stream(), 1);
            let body = Body::from_frame(&frame).unwrap();
            assert_eq!(body, Body::Result(ResultBody::Void));
        },
        cql_core::RequestOutcome::Failed(error) => panic!("query should not fail: {error}"),
    }

    let _ = client.close().await;
    server.abort();
}
