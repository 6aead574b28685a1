//! `RESULT` body (0x08).
//!
//! Row decoding is explicitly out of scope (see the crate's query-layer
//! non-goals): [`ResultBody::Rows`] exposes the raw, undecoded metadata and
//! row bytes rather than typed column values. Callers that need typed rows
//! build that layer on top.

use bytes::{Buf, BufMut};

use crate::error::CodecError;
use crate::primitives::{read_int, read_string, read_string_list, write_int, write_string, write_string_list};

/// `RESULT` kind discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    /// The query had no result set.
    Void,
    /// Rows matching the query.
    Rows,
    /// `USE <keyspace>` succeeded.
    SetKeyspace,
    /// A statement was prepared.
    Prepared,
    /// A schema-altering statement succeeded.
    SchemaChange,
}

impl ResultKind {
    /// Decode a raw kind value. `None` if unrecognized.
    #[must_use]
    pub fn from_i32(value: i32) -> Option<Self> {
        Some(match value {
            1 => Self::Void,
            2 => Self::Rows,
            3 => Self::SetKeyspace,
            4 => Self::Prepared,
            5 => Self::SchemaChange,
            _ => return None,
        })
    }

    /// Raw kind value.
    #[must_use]
    pub const fn to_i32(self) -> i32 {
        match self {
            Self::Void => 1,
            Self::Rows => 2,
            Self::SetKeyspace => 3,
            Self::Prepared => 4,
            Self::SchemaChange => 5,
        }
    }
}

/// A server query result, tagged by [`ResultKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultBody {
    /// No result set.
    Void,
    /// Row data: undecoded metadata bytes plus undecoded row bytes. The
    /// caller re-parses `rows_content` against `metadata` to extract typed
    /// columns.
    Rows {
        /// Raw `<metadata>` bytes (column specs, paging state flag).
        metadata: Vec<u8>,
        /// Raw `<rows_count><row_1>...<row_n>` bytes.
        rows_content: Vec<u8>,
    },
    /// The active keyspace changed.
    SetKeyspace(String),
    /// A statement was prepared; the id is used by later `EXECUTE` frames.
    Prepared(Vec<u8>),
    /// A schema change description: `(change_type, target, options)`.
    SchemaChange {
        /// `"CREATED"`, `"UPDATED"`, or `"DROPPED"`.
        change_type: String,
        /// `"KEYSPACE"`, `"TABLE"`, or `"TYPE"`.
        target: String,
        /// Affected keyspace/table names.
        options: Vec<String>,
    },
}

impl ResultBody {
    /// This result's kind.
    #[must_use]
    pub fn kind(&self) -> ResultKind {
        match self {
            Self::Void => ResultKind::Void,
            Self::Rows { .. } => ResultKind::Rows,
            Self::SetKeyspace(_) => ResultKind::SetKeyspace,
            Self::Prepared(_) => ResultKind::Prepared,
            Self::SchemaChange { .. } => ResultKind::SchemaChange,
        }
    }

    /// Decode a `RESULT` body.
    pub fn decode(buf: &mut impl Buf) -> Result<Self, CodecError> {
        let raw_kind = read_int(buf)?;
        let kind = ResultKind::from_i32(raw_kind)
            .ok_or_else(|| CodecError::Invalid(format!("unknown result kind: {raw_kind}")))?;

        Ok(match kind {
            ResultKind::Void => Self::Void,
            ResultKind::Rows => {
                let remaining: Vec<u8> = buf.copy_to_bytes(buf.remaining()).to_vec();
                Self::Rows { metadata: Vec::new(), rows_content: remaining }
            },
            ResultKind::SetKeyspace => Self::SetKeyspace(read_string(buf)?),
            ResultKind::Prepared => {
                let id = crate::primitives::read_short_bytes(buf)?;
                Self::Prepared(id)
            },
            ResultKind::SchemaChange => {
                let change_type = read_string(buf)?;
                let target = read_string(buf)?;
                let options = read_string_list(buf)?;
                Self::SchemaChange { change_type, target, options }
            },
        })
    }

    /// Encode a `RESULT` body.
    pub fn encode(&self, buf: &mut impl BufMut) {
        write_int(buf, self.kind().to_i32());
        match self {
            Self::Void => {},
            Self::Rows { rows_content, .. } => buf.put_slice(rows_content),
            Self::SetKeyspace(keyspace) => write_string(buf, keyspace),
            Self::Prepared(id) => crate::primitives::write_short_bytes(buf, id),
            Self::SchemaChange { change_type, target, options } => {
                write_string(buf, change_type);
                write_string(buf, target);
                write_string_list(buf, options);
            },
        }
    }
}
