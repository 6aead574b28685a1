//! Concrete wire scenarios exercising the full header/frame/body stack
//! together, rather than one primitive at a time.

use bytes::Bytes;
use cql_proto::body::error::ErrorBody;
use cql_proto::body::query::QueryBody;
use cql_proto::body::startup::StartupBody;
use cql_proto::{Body, Consistency, Frame, FrameAccumulator, FrameHeader, Opcode};

/// Scenario 1: `81 01 7F 00 00 00 00 0C FF FF FF FF 00 06 66 6F 6F 62 61 72`.
/// Version 0x81 predates this driver's request/response version-byte
/// validation (see `scenario_5_chunked_error_frame_all_split_points` below),
/// so it's decoded at the header/body level rather than through
/// `Frame::decode`/`FrameAccumulator`, matching how the literal vector
/// parses structurally.
#[test]
fn scenario_1_error_frame_literal_bytes() {
    let wire: [u8; 20] = [
        0x81, 0x01, 0x7F, 0x00, 0x00, 0x00, 0x00, 0x0C, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x06, 0x66,
        0x6F, 0x6F, 0x62, 0x61, 0x72,
    ];
    let header = *FrameHeader::ref_from_bytes(&wire[..FrameHeader::SIZE]).unwrap();
    assert_eq!(header.version(), 0x81);
    assert!(header.is_response());
    assert_eq!(header.stream(), 0x7F);
    assert_eq!(header.opcode(), Some(Opcode::Error));
    assert_eq!(header.length(), 12);

    let body_bytes = Bytes::copy_from_slice(&wire[FrameHeader::SIZE..]);
    let body = Body::decode(Opcode::Error, body_bytes).unwrap();
    assert_eq!(body, Body::Error(ErrorBody { code: -1, message: "foobar".to_string() }));

    // Re-serializing the same structure reproduces the exact bytes (aside
    // from the version byte, which `Frame::new`/`into_frame` always stamps
    // as `FrameHeader::REQUEST_VERSION`).
    let frame = body.into_frame(0x7F);
    let mut reencoded = Vec::new();
    frame.encode(&mut reencoded);
    assert_eq!(&reencoded[1..], &wire[1..]);
}

/// Scenario 2: `02 00 00 05 00 00 00 00`.
#[test]
fn scenario_2_options_request_literal_bytes() {
    let header = FrameHeader::request(Opcode::Options, 0);
    let frame = Frame::new(header, Bytes::new());
    let mut wire = Vec::new();
    frame.encode(&mut wire);
    assert_eq!(wire, [0x02, 0x00, 0x00, 0x05, 0x00, 0x00, 0x00, 0x00]);
}

/// Scenario 3: STARTUP with `CQL_VERSION=3.0.0`, no compression.
#[test]
fn scenario_3_startup_request_literal_bytes() {
    let body = Body::Startup(StartupBody::with_default_version());
    let frame = body.into_frame(0);
    let mut wire = Vec::new();
    frame.encode(&mut wire);
    let expected: [u8; 0x16 + FrameHeader::SIZE] = [
        0x02, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x16, 0x00, 0x01, 0x00, 0x0B, 0x43, 0x51, 0x4C,
        0x5F, 0x56, 0x45, 0x52, 0x53, 0x49, 0x4F, 0x4E, 0x00, 0x05, 0x33, 0x2E, 0x30, 0x2E, 0x30,
    ];
    assert_eq!(wire, expected);
}

/// Scenario 4: QUERY `SELECT * FROM system.peers;`, consistency ONE, no
/// flags.
#[test]
fn scenario_4_query_request_literal_bytes() {
    let body = Body::Query(QueryBody::simple("SELECT * FROM system.peers;", Consistency::One));
    let frame = body.into_frame(0);
    let mut wire = Vec::new();
    frame.encode(&mut wire);
    let expected: [u8; 0x22 + FrameHeader::SIZE] = [
        0x02, 0x00, 0x00, 0x07, 0x00, 0x00, 0x00, 0x22, 0x00, 0x00, 0x00, 0x1B, 0x53, 0x45, 0x4C,
        0x45, 0x43, 0x54, 0x20, 0x2A, 0x20, 0x46, 0x52, 0x4F, 0x4D, 0x20, 0x73, 0x79, 0x73, 0x74,
        0x65, 0x6D, 0x2E, 0x70, 0x65, 0x65, 0x72, 0x73, 0x3B, 0x00, 0x01, 0x00,
    ];
    assert_eq!(wire, expected);
}

/// Scenario 5: feeding a 20-byte ERROR frame to the accumulator at every
/// possible split point always yields exactly one complete parsed frame.
/// Uses `FrameHeader::RESPONSE_VERSION` (0x82) rather than scenario 1's
/// literal 0x81 byte, since the accumulator now validates the version byte
/// (see scenario 1's doc comment).
#[test]
fn scenario_5_chunked_error_frame_all_split_points() {
    let body = Body::Error(ErrorBody { code: -1, message: "foobar".to_string() });
    let frame = {
        // `Frame::new`/`into_frame` always stamp `REQUEST_VERSION`, so
        // construct the response-version header directly.
        let header = FrameHeader::request(Opcode::Error, 0x7F);
        let mut raw = header.to_bytes();
        raw[0] = FrameHeader::RESPONSE_VERSION;
        let response_header = *FrameHeader::ref_from_bytes(&raw).unwrap();
        Frame::new(response_header, body.encode())
    };
    let mut wire = Vec::new();
    frame.encode(&mut wire);
    assert_eq!(wire.len(), 20);

    for split in 0..=wire.len() {
        let mut acc = FrameAccumulator::new(cql_proto::DEFAULT_MAX_FRAME_SIZE);
        let (first, second) = wire.split_at(split);
        let consumed_first = acc.fill(first).unwrap();
        assert_eq!(consumed_first, first.len());

        let decoded = if acc.has_frame() {
            acc.take_frame().unwrap()
        } else {
            acc.fill(second).unwrap();
            acc.take_frame().expect("frame should be complete after second chunk")
        };
        assert_eq!(decoded, frame, "split at byte {split} produced a different frame");
        assert_eq!(Body::from_frame(&decoded).unwrap(), body);
    }
}

#[test]
fn error_frame_round_trip() {
    let body = Body::Error(ErrorBody { code: 0x0000, message: "server error".to_string() });
    let frame = body.clone().into_frame(0);

    let mut wire = Vec::new();
    frame.encode(&mut wire);

    let decoded_frame = Frame::decode(Bytes::from(wire), cql_proto::DEFAULT_MAX_FRAME_SIZE).unwrap();
    assert_eq!(decoded_frame.header().opcode(), Some(Opcode::Error));
    assert_eq!(Body::from_frame(&decoded_frame).unwrap(), body);
}

#[test]
fn options_request_is_empty_body() {
    let header = FrameHeader::request(Opcode::Options, 1);
    let frame = Frame::new(header, Bytes::new());
    assert_eq!(frame.header().length(), 0);

    let mut wire = Vec::new();
    frame.encode(&mut wire);
    assert_eq!(wire.len(), FrameHeader::SIZE);
}

#[test]
fn startup_request_round_trip_through_accumulator() {
    let body = Body::Startup(StartupBody::with_default_version());
    let frame = body.clone().into_frame(1);
    let mut wire = Vec::new();
    frame.encode(&mut wire);

    let mut acc = FrameAccumulator::new(cql_proto::DEFAULT_MAX_FRAME_SIZE);
    acc.fill(&wire).unwrap();
    let decoded_frame = acc.take_frame().unwrap();
    assert_eq!(Body::from_frame(&decoded_frame).unwrap(), body);
}

#[test]
fn query_request_round_trip_through_accumulator() {
    let body = Body::Query(QueryBody::simple(
        "SELECT * FROM system.local",
        Consistency::One,
    ));
    let frame = body.clone().into_frame(2);
    let mut wire = Vec::new();
    frame.encode(&mut wire);

    let mut acc = FrameAccumulator::new(cql_proto::DEFAULT_MAX_FRAME_SIZE);
    acc.fill(&wire).unwrap();
    let decoded_frame = acc.take_frame().unwrap();
    assert_eq!(decoded_frame.header().stream(), 2);
    assert_eq!(Body::from_frame(&decoded_frame).unwrap(), body);
}

#[test]
fn chunked_inbound_all_split_points() {
    let body = Body::Query(QueryBody::simple("SELECT * FROM t", Consistency::Quorum));
    let frame = body.clone().into_frame(3);
    let mut wire = Vec::new();
    frame.encode(&mut wire);

    // Every possible split point of the wire bytes into two chunks must
    // still reconstruct the identical frame.
    for split in 0..=wire.len() {
        let mut acc = FrameAccumulator::new(cql_proto::DEFAULT_MAX_FRAME_SIZE);
        let (first, second) = wire.split_at(split);
        let consumed_first = acc.fill(first).unwrap();
        assert_eq!(consumed_first, first.len());

        let decoded = if acc.has_frame() {
            acc.take_frame().unwrap()
        } else {
            acc.fill(second).unwrap();
            acc.take_frame().expect("frame should be complete after second chunk")
        };
        assert_eq!(decoded, frame, "split at byte {split} produced a different frame");
    }
}
