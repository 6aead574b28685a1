//! CQL native protocol serialization primitives.
//!
//! All multi-byte integers are big-endian. Readers are pure functions over a
//! [`bytes::Buf`] cursor: they either advance the cursor and return a value,
//! or fail with [`CodecError`] without consuming partial input. Writers are
//! infallible and append to a [`bytes::BufMut`] sink.

use bytes::{Buf, BufMut};

use crate::error::CodecError;

fn require(buf: &impl Buf, needed: usize) -> Result<(), CodecError> {
    let available = buf.remaining();
    if available < needed {
        return Err(CodecError::Truncated { needed, available });
    }
    Ok(())
}

/// Read a single unsigned byte.
pub fn read_byte(buf: &mut impl Buf) -> Result<u8, CodecError> {
    require(buf, 1)?;
    Ok(buf.get_u8())
}

/// Write a single unsigned byte.
pub fn write_byte(buf: &mut impl BufMut, value: u8) {
    buf.put_u8(value);
}

/// Read a big-endian `u16`.
pub fn read_short(buf: &mut impl Buf) -> Result<u16, CodecError> {
    require(buf, 2)?;
    Ok(buf.get_u16())
}

/// Write a big-endian `u16`.
pub fn write_short(buf: &mut impl BufMut, value: u16) {
    buf.put_u16(value);
}

/// Read a big-endian `i32`.
pub fn read_int(buf: &mut impl Buf) -> Result<i32, CodecError> {
    require(buf, 4)?;
    Ok(buf.get_i32())
}

/// Write a big-endian `i32`.
pub fn write_int(buf: &mut impl BufMut, value: i32) {
    buf.put_i32(value);
}

/// Read a `[short length][UTF-8 bytes]` string (length in bytes, ≤ 65535).
pub fn read_string(buf: &mut impl Buf) -> Result<String, CodecError> {
    let len = read_short(buf)? as usize;
    require(buf, len)?;
    let mut raw = vec![0u8; len];
    buf.copy_to_slice(&mut raw);
    String::from_utf8(raw).map_err(|e| CodecError::Invalid(format!("string not UTF-8: {e}")))
}

/// Write a `[short length][UTF-8 bytes]` string.
pub fn write_string(buf: &mut impl BufMut, value: &str) {
    let bytes = value.as_bytes();
    #[allow(clippy::cast_possible_truncation)]
    write_short(buf, bytes.len() as u16);
    buf.put_slice(bytes);
}

/// Read a `[int length][bytes]` long string (length ≥ 0).
pub fn read_long_string(buf: &mut impl Buf) -> Result<String, CodecError> {
    let len = read_int(buf)?;
    if len < 0 {
        return Err(CodecError::Invalid(format!("negative long-string length: {len}")));
    }
    let len = len as usize;
    require(buf, len)?;
    let mut raw = vec![0u8; len];
    buf.copy_to_slice(&mut raw);
    String::from_utf8(raw).map_err(|e| CodecError::Invalid(format!("long-string not UTF-8: {e}")))
}

/// Write a `[int length][bytes]` long string.
pub fn write_long_string(buf: &mut impl BufMut, value: &str) {
    let bytes = value.as_bytes();
    #[allow(clippy::cast_possible_wrap)]
    write_int(buf, bytes.len() as i32);
    buf.put_slice(bytes);
}

/// Read a `[short length][bytes]` short-bytes value.
pub fn read_short_bytes(buf: &mut impl Buf) -> Result<Vec<u8>, CodecError> {
    let len = read_short(buf)? as usize;
    require(buf, len)?;
    let mut raw = vec![0u8; len];
    buf.copy_to_slice(&mut raw);
    Ok(raw)
}

/// Write a `[short length][bytes]` short-bytes value.
pub fn write_short_bytes(buf: &mut impl BufMut, value: &[u8]) {
    #[allow(clippy::cast_possible_truncation)]
    write_short(buf, value.len() as u16);
    buf.put_slice(value);
}

/// Read a `[int length][bytes]` value; length `-1` denotes null.
pub fn read_bytes(buf: &mut impl Buf) -> Result<Option<Vec<u8>>, CodecError> {
    let len = read_int(buf)?;
    if len < 0 {
        return Ok(None);
    }
    let len = len as usize;
    require(buf, len)?;
    let mut raw = vec![0u8; len];
    buf.copy_to_slice(&mut raw);
    Ok(Some(raw))
}

/// Write a `[int length][bytes]` value; `None` is encoded as length `-1`.
pub fn write_bytes(buf: &mut impl BufMut, value: Option<&[u8]>) {
    match value {
        None => write_int(buf, -1),
        Some(raw) => {
            #[allow(clippy::cast_possible_wrap)]
            write_int(buf, raw.len() as i32);
            buf.put_slice(raw);
        },
    }
}

/// Read a `[short count][(string,string)...]` map.
pub fn read_string_map(buf: &mut impl Buf) -> Result<Vec<(String, String)>, CodecError> {
    let count = read_short(buf)?;
    let mut entries = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let key = read_string(buf)?;
        let value = read_string(buf)?;
        entries.push((key, value));
    }
    Ok(entries)
}

/// Write a `[short count][(string,string)...]` map. Key order is
/// implementation-defined; servers must accept any order.
pub fn write_string_map(buf: &mut impl BufMut, entries: &[(String, String)]) {
    #[allow(clippy::cast_possible_truncation)]
    write_short(buf, entries.len() as u16);
    for (key, value) in entries {
        write_string(buf, key);
        write_string(buf, value);
    }
}

/// Read a `[short count][string...]` list.
pub fn read_string_list(buf: &mut impl Buf) -> Result<Vec<String>, CodecError> {
    let count = read_short(buf)?;
    let mut items = Vec::with_capacity(count as usize);
    for _ in 0..count {
        items.push(read_string(buf)?);
    }
    Ok(items)
}

/// Write a `[short count][string...]` list.
pub fn write_string_list(buf: &mut impl BufMut, items: &[String]) {
    #[allow(clippy::cast_possible_truncation)]
    write_short(buf, items.len() as u16);
    for item in items {
        write_string(buf, item);
    }
}

/// Read a `[short count][(string,string-list)...]` multimap (server
/// capability advertisement; clients only decode this, never encode it).
pub fn read_string_multimap(buf: &mut impl Buf) -> Result<Vec<(String, Vec<String>)>, CodecError> {
    let count = read_short(buf)?;
    let mut entries = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let key = read_string(buf)?;
        let values = read_string_list(buf)?;
        entries.push((key, values));
    }
    Ok(entries)
}

/// Write a `[short count][(string,string-list)...]` multimap.
pub fn write_string_multimap(buf: &mut impl BufMut, entries: &[(String, Vec<String>)]) {
    #[allow(clippy::cast_possible_truncation)]
    write_short(buf, entries.len() as u16);
    for (key, values) in entries {
        write_string(buf, key);
        write_string_list(buf, values);
    }
}

/// A decoded `inet` value: an IPv4 or IPv6 address plus a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inet {
    /// IPv4 address and port.
    V4 { addr: [u8; 4], port: i32 },
    /// IPv6 address and port.
    V6 { addr: [u8; 16], port: i32 },
}

/// Read a `[byte length][address][int port]` inet value.
pub fn read_inet(buf: &mut impl Buf) -> Result<Inet, CodecError> {
    let len = read_byte(buf)?;
    match len {
        4 => {
            require(buf, 4)?;
            let mut addr = [0u8; 4];
            buf.copy_to_slice(&mut addr);
            let port = read_int(buf)?;
            Ok(Inet::V4 { addr, port })
        },
        16 => {
            require(buf, 16)?;
            let mut addr = [0u8; 16];
            buf.copy_to_slice(&mut addr);
            let port = read_int(buf)?;
            Ok(Inet::V6 { addr, port })
        },
        other => Err(CodecError::Invalid(format!("invalid inet address length: {other}"))),
    }
}

/// Write a `[byte length][address][int port]` inet value.
pub fn write_inet(buf: &mut impl BufMut, value: Inet) {
    match value {
        Inet::V4 { addr, port } => {
            write_byte(buf, 4);
            buf.put_slice(&addr);
            write_int(buf, port);
        },
        Inet::V6 { addr, port } => {
            write_byte(buf, 16);
            buf.put_slice(&addr);
            write_int(buf, port);
        },
    }
}
