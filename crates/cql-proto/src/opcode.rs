//! Opcode and consistency-level constants.

/// One-byte selector identifying a frame's body variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// Server-reported error.
    Error,
    /// Client protocol negotiation request.
    Startup,
    /// Server acknowledgement that the connection is ready for queries.
    Ready,
    /// Server request for authentication credentials.
    Authenticate,
    /// Client authentication credentials (legacy, pre-SASL).
    Credentials,
    /// Client capability query.
    Options,
    /// Server capability advertisement.
    Supported,
    /// Client CQL query.
    Query,
    /// Server query result.
    Result,
    /// Client request to prepare a statement.
    Prepare,
    /// Client request to execute a prepared statement.
    Execute,
    /// Client subscription to schema/status events.
    Register,
    /// Server-pushed schema/status event.
    Event,
}

impl Opcode {
    /// Decode a raw opcode byte. `None` if unrecognized.
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0x00 => Self::Error,
            0x01 => Self::Startup,
            0x02 => Self::Ready,
            0x03 => Self::Authenticate,
            0x04 => Self::Credentials,
            0x05 => Self::Options,
            0x06 => Self::Supported,
            0x07 => Self::Query,
            0x08 => Self::Result,
            0x09 => Self::Prepare,
            0x0A => Self::Execute,
            0x0B => Self::Register,
            0x0C => Self::Event,
            _ => return None,
        })
    }

    /// Raw opcode byte.
    #[must_use]
    pub const fn to_u8(self) -> u8 {
        match self {
            Self::Error => 0x00,
            Self::Startup => 0x01,
            Self::Ready => 0x02,
            Self::Authenticate => 0x03,
            Self::Credentials => 0x04,
            Self::Options => 0x05,
            Self::Supported => 0x06,
            Self::Query => 0x07,
            Self::Result => 0x08,
            Self::Prepare => 0x09,
            Self::Execute => 0x0A,
            Self::Register => 0x0B,
            Self::Event => 0x0C,
        }
    }
}

/// Replication-acknowledgement requirement for a `QUERY`/`EXECUTE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Consistency {
    /// No acknowledgement required.
    Any,
    /// One replica.
    One,
    /// Two replicas.
    Two,
    /// Three replicas.
    Three,
    /// A quorum of all replicas.
    Quorum,
    /// Every replica.
    All,
    /// A quorum within the local datacenter.
    LocalQuorum,
    /// A quorum in every datacenter.
    EachQuorum,
    /// Linearizable consistency for a lightweight transaction.
    Serial,
    /// Linearizable consistency confined to the local datacenter.
    LocalSerial,
    /// One replica within the local datacenter.
    LocalOne,
}

impl Consistency {
    /// Decode a raw consistency level. `None` if unrecognized.
    #[must_use]
    pub fn from_u16(value: u16) -> Option<Self> {
        Some(match value {
            0x0000 => Self::Any,
            0x0001 => Self::One,
            0x0002 => Self::Two,
            0x0003 => Self::Three,
            0x0004 => Self::Quorum,
            0x0005 => Self::All,
            0x0006 => Self::LocalQuorum,
            0x0007 => Self::EachQuorum,
            0x0008 => Self::Serial,
            0x0009 => Self::LocalSerial,
            0x000A => Self::LocalOne,
            _ => return None,
        })
    }

    /// Raw consistency-level value.
    #[must_use]
    pub const fn to_u16(self) -> u16 {
        match self {
            Self::Any => 0x0000,
            Self::One => 0x0001,
            Self::Two => 0x0002,
            Self::Three => 0x0003,
            Self::Quorum => 0x0004,
            Self::All => 0x0005,
            Self::LocalQuorum => 0x0006,
            Self::EachQuorum => 0x0007,
            Self::Serial => 0x0008,
            Self::LocalSerial => 0x0009,
            Self::LocalOne => 0x000A,
        }
    }
}
