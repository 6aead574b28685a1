//! `STARTUP` (0x01) and `SUPPORTED` (0x06) bodies.

use bytes::{Buf, BufMut};

use crate::error::CodecError;
use crate::primitives::{read_string_map, read_string_multimap, write_string_map};

/// CQL version requested by the client when no other value is supplied.
pub const DEFAULT_CQL_VERSION: &str = "3.0.0";

/// Key under which the CQL version lives in [`StartupBody::options`].
pub const OPTION_CQL_VERSION: &str = "CQL_VERSION";

/// Key under which an optional compression algorithm lives in
/// [`StartupBody::options`].
pub const OPTION_COMPRESSION: &str = "COMPRESSION";

/// Client protocol-negotiation request: a string map of options. `CQL_VERSION`
/// is required by the protocol; `COMPRESSION` is optional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupBody {
    /// Negotiation options, e.g. `[("CQL_VERSION", "3.0.0")]`.
    pub options: Vec<(String, String)>,
}

impl StartupBody {
    /// Build a `STARTUP` body requesting [`DEFAULT_CQL_VERSION`] with no
    /// compression.
    #[must_use]
    pub fn with_default_version() -> Self {
        Self { options: vec![(OPTION_CQL_VERSION.to_string(), DEFAULT_CQL_VERSION.to_string())] }
    }

    /// The requested CQL version, if present.
    #[must_use]
    pub fn cql_version(&self) -> Option<&str> {
        self.options
            .iter()
            .find(|(key, _)| key == OPTION_CQL_VERSION)
            .map(|(_, value)| value.as_str())
    }

    /// Decode a `STARTUP` body.
    pub fn decode(buf: &mut impl Buf) -> Result<Self, CodecError> {
        Ok(Self { options: read_string_map(buf)? })
    }

    /// Encode a `STARTUP` body.
    pub fn encode(&self, buf: &mut impl BufMut) {
        write_string_map(buf, &self.options);
    }
}

/// Server capability advertisement: a string multimap (e.g. supported CQL
/// versions, compression algorithms). Clients only ever decode this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedBody {
    /// Advertised capabilities.
    pub options: Vec<(String, Vec<String>)>,
}

impl SupportedBody {
    /// Decode a `SUPPORTED` body.
    pub fn decode(buf: &mut impl Buf) -> Result<Self, CodecError> {
        Ok(Self { options: read_string_multimap(buf)? })
    }

    /// Look up the values advertised for a given capability key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.options.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_slice())
    }
}
