//! `EXECUTE` body (0x0A).
//!
//! Same parameter encoding as [`super::query::QueryBody`] (consistency,
//! flags, bound values, paging) but addressed by a prepared-statement id
//! instead of carrying the query text.

use bytes::{Buf, BufMut};

use super::query::{
    FLAG_PAGE_SIZE, FLAG_PAGING_STATE, FLAG_SERIAL_CONSISTENCY, FLAG_SKIP_METADATA, FLAG_VALUES,
    QueryValue,
};
use crate::error::CodecError;
use crate::opcode::Consistency;
use crate::primitives::{
    read_bytes, read_int, read_short, read_short_bytes, write_bytes, write_int, write_short,
    write_short_bytes,
};

/// Request to execute a previously prepared statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecuteBody {
    /// Prepared-statement id returned by the server's `RESULT::Prepared`.
    pub prepared_id: Vec<u8>,
    /// Requested consistency level.
    pub consistency: Consistency,
    /// Bound variable values, in positional order.
    pub values: Option<Vec<QueryValue>>,
    /// Suppress column metadata in the response.
    pub skip_metadata: bool,
    /// Requested page size, in rows.
    pub page_size: Option<i32>,
    /// Opaque paging-continuation token from a previous page.
    pub paging_state: Option<Vec<u8>>,
    /// Consistency level for the serial phase of a lightweight transaction.
    pub serial_consistency: Option<Consistency>,
}

impl ExecuteBody {
    fn flags(&self) -> u8 {
        let mut flags = 0;
        if self.values.is_some() {
            flags |= FLAG_VALUES;
        }
        if self.skip_metadata {
            flags |= FLAG_SKIP_METADATA;
        }
        if self.page_size.is_some() {
            flags |= FLAG_PAGE_SIZE;
        }
        if self.paging_state.is_some() {
            flags |= FLAG_PAGING_STATE;
        }
        if self.serial_consistency.is_some() {
            flags |= FLAG_SERIAL_CONSISTENCY;
        }
        flags
    }

    /// Encode an `EXECUTE` body.
    pub fn encode(&self, buf: &mut impl BufMut) {
        write_short_bytes(buf, &self.prepared_id);
        write_short(buf, self.consistency.to_u16());
        crate::primitives::write_byte(buf, self.flags());

        if let Some(values) = &self.values {
            #[allow(clippy::cast_possible_truncation)]
            write_short(buf, values.len() as u16);
            for value in values {
                write_bytes(buf, value.as_deref());
            }
        }
        if let Some(page_size) = self.page_size {
            write_int(buf, page_size);
        }
        if let Some(paging_state) = &self.paging_state {
            write_bytes(buf, Some(paging_state));
        }
        if let Some(serial) = self.serial_consistency {
            write_short(buf, serial.to_u16());
        }
    }

    /// Decode an `EXECUTE` body.
    pub fn decode(buf: &mut impl Buf) -> Result<Self, CodecError> {
        let prepared_id = read_short_bytes(buf)?;
        let consistency_raw = read_short(buf)?;
        let consistency = Consistency::from_u16(consistency_raw)
            .ok_or_else(|| CodecError::Invalid(format!("unknown consistency: {consistency_raw:#06x}")))?;
        let flags = crate::primitives::read_byte(buf)?;

        let values = if flags & FLAG_VALUES != 0 {
            let count = read_short(buf)?;
            let mut items = Vec::with_capacity(count as usize);
            for _ in 0..count {
                items.push(read_bytes(buf)?);
            }
            Some(items)
        } else {
            None
        };
        let skip_metadata = flags & FLAG_SKIP_METADATA != 0;
        let page_size = if flags & FLAG_PAGE_SIZE != 0 { Some(read_int(buf)?) } else { None };
        let paging_state = if flags & FLAG_PAGING_STATE != 0 { read_bytes(buf)? } else { None };
        let serial_consistency = if flags & FLAG_SERIAL_CONSISTENCY != 0 {
            let raw = read_short(buf)?;
            Some(
                Consistency::from_u16(raw)
                    .ok_or_else(|| CodecError::Invalid(format!("unknown consistency: {raw:#06x}")))?,
            )
        } else {
            None
        };

        Ok(Self {
            prepared_id,
            consistency,
            values,
            skip_metadata,
            page_size,
            paging_state,
            serial_consistency,
        })
    }
}
