//! Network-level header structs, laid out exactly as they appear on the wire
//!
//! Each struct here only covers the fixed-size header portion of a payload;
//! variable-length bodies are handled by [`crate::codec`] and the payload
//! modules under [`crate::payload`].

use zerocopy::network_endian::{U16, U32, U64};
use zerocopy::{AsBytes, FromBytes, FromZeroes, Unaligned};

/// Fixed 28-octet IKEv2 message header (§4.C)
///
/// ```text
///                          1                   2                   3
///      0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
///     +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///     |                       IKE SA Initiator's SPI                 |
///     +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///     |                       IKE SA Responder's SPI                 |
///     +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///     |  Next Payload | MjVer | MnVer | Exchange Type |     Flags     |
///     +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///     |                          Message ID                          |
///     +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///     |                            Length                            |
///     +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Debug, FromBytes, FromZeroes, AsBytes, Unaligned, Copy, Clone)]
#[repr(C, packed)]
pub struct Header {
    /// 8-octet SPI chosen by the original initiator of the IKE SA
    pub initiator_spi: U64,
    /// 8-octet SPI chosen by the responder, zero until the responder replies
    pub responder_spi: U64,
    /// Type of the first payload following this header
    pub next_payload: u8,
    /// Upper nibble: major version (must be 2), lower nibble: minor version
    pub version: u8,
    /// Exchange type, see [`crate::params::ExchangeType`]
    pub exchange_type: u8,
    /// Response/version/initiator flag bits, see `FLAG_*` in [`crate::params`]
    pub flags: u8,
    /// Message identifier, incremented per request/response pair
    pub message_id: U32,
    /// Total length of the message in octets, including this header
    pub length: U32,
}

impl Header {
    /// Split `version` into (major, minor)
    pub fn version_parts(&self) -> (u8, u8) {
        (self.version >> 4, self.version & 0x0f)
    }

    /// Pack (major, minor) into the single `version` octet
    pub fn pack_version(major: u8, minor: u8) -> u8 {
        (major << 4) | (minor & 0x0f)
    }
}

/// Generic 4-octet payload header shared by (almost) every IKEv2 payload
///
/// ```text
///       0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
///      +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///      | Next Payload  |C|  RESERVED   |         Payload Length        |
///      +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Debug, FromBytes, FromZeroes, AsBytes, Unaligned, Copy, Clone)]
#[repr(C, packed)]
pub struct GenericPayloadHeader {
    /// Type of the next payload in the chain
    pub next_payload: u8,
    /// Bit 7 is the critical flag, the rest is reserved and must be zero
    pub critical_reserved: u8,
    /// Length in octets of this payload, including this 4-octet header
    pub payload_length: U16,
}

/// Header of a Key Exchange payload body, following the generic payload header
#[derive(Debug, FromBytes, FromZeroes, AsBytes, Unaligned, Copy, Clone)]
#[repr(C, packed)]
pub struct KeyExchangeHeader {
    /// Diffie-Hellman group the key exchange data was computed in
    pub dh_group_num: U16,
    /// Reserved, must be zero
    pub reserved: U16,
}

/// Header of a Notify payload body, following the generic payload header
#[derive(Debug, FromBytes, FromZeroes, AsBytes, Unaligned, Copy, Clone)]
#[repr(C, packed)]
pub struct NotifyHeader {
    /// Protocol the notification concerns, or 0 if it concerns the IKE SA
    pub protocol_id: u8,
    /// Length in octets of the following SPI field
    pub spi_size: u8,
    /// Notify message type, see [`crate::params::NotifyMessageType`]
    pub notify_message_type: U16,
}

/// Header of a Proposal substructure inside a Security Association payload
#[derive(Debug, FromBytes, FromZeroes, AsBytes, Unaligned, Copy, Clone)]
#[repr(C, packed)]
pub struct ProposalHeader {
    /// 0 if this is the last proposal of the SA, 2 otherwise
    pub last_substruct: u8,
    /// Reserved, must be zero
    pub reserved: u8,
    /// Length in octets of this proposal, including this header
    pub proposal_length: U16,
    /// 1-based, strictly incrementing number of this proposal
    pub proposal_num: u8,
    /// Protocol identifier, see [`crate::params::SecurityProtocol`]
    pub protocol_id: u8,
    /// Length in octets of the SPI that follows this header
    pub spi_size: u8,
    /// Number of transforms following the SPI
    pub num_transforms: u8,
}

/// Header of a Transform substructure inside a Proposal
#[derive(Debug, FromBytes, FromZeroes, AsBytes, Unaligned, Copy, Clone)]
#[repr(C, packed)]
pub struct TransformHeader {
    /// 0 if this is the last transform of the proposal, 3 otherwise
    pub last_substruct: u8,
    /// Reserved, must be zero
    pub reserved: u8,
    /// Length in octets of this transform, including this header
    pub transform_length: U16,
    /// Type of transform, see [`crate::params::TransformType`]
    pub transform_type: u8,
    /// Reserved, must be zero
    pub reserved2: u8,
    /// Transform ID, meaning depends on `transform_type`
    pub transform_id: U16,
}

/// Fixed-length (TV) transform attribute: type with the high bit set, value inline
#[derive(Debug, FromBytes, FromZeroes, AsBytes, Unaligned, Copy, Clone)]
#[repr(C, packed)]
pub struct AttributeHeaderTv {
    /// Attribute type with bit 15 (`FLAG_ATTRIBUTE_FORMAT`) set
    pub attribute_type: U16,
    /// Inline attribute value
    pub attribute_value: U16,
}

/// Bit 15 of a transform attribute's type field: set means fixed-length (TV), clear means TLV
pub const FLAG_ATTRIBUTE_FORMAT: u16 = 0x8000;

/// Transform attribute type for the single attribute this crate understands
pub const ATTRIBUTE_TYPE_KEY_LENGTH: u16 = 14;
