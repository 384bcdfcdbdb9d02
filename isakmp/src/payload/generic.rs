//! Payload kinds whose body is a thin, mostly-opaque wrapper around raw
//! octets: Nonce, Vendor ID, Identification, Authentication, the
//! certificate-family payloads, and traffic selectors

use std::mem::size_of;

use zerocopy::network_endian::U16;
use zerocopy::{AsBytes, FromBytes, FromZeroes, Unaligned};

use crate::error::{IsakmpError, Result};

/// Nonce payload body (RFC 7296 §3.9): 16-256 octets of randomness
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nonce(pub Vec<u8>);

impl Nonce {
    pub(crate) fn decode(body: &[u8]) -> Self {
        Self(body.to_vec())
    }

    pub(crate) fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.0);
    }

    /// RFC 7296 mandates a nonce length of 16 to 256 octets
    pub fn verify(&self) -> std::result::Result<(), &'static str> {
        if self.0.len() < 16 || self.0.len() > 256 {
            return Err("nonce length out of the 16-256 octet range");
        }
        Ok(())
    }
}

/// Vendor ID payload body (RFC 7296 §3.12): opaque vendor-defined constant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorId(pub Vec<u8>);

impl VendorId {
    pub(crate) fn decode(body: &[u8]) -> Self {
        Self(body.to_vec())
    }

    pub(crate) fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.0);
    }
}

/// Any payload whose body this crate does not interpret further: Certificate,
/// Certificate Request, Configuration and Extensible Authentication
///
/// Certificate/CRL parsing is explicitly out of scope (spec.md §1); the bytes
/// are carried opaquely for a caller that does understand them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPayload(pub Vec<u8>);

impl RawPayload {
    pub(crate) fn decode(body: &[u8]) -> Self {
        Self(body.to_vec())
    }

    pub(crate) fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.0);
    }
}

/// Fixed 4-octet header in front of an Identification payload body
#[derive(Debug, FromBytes, FromZeroes, AsBytes, Unaligned, Copy, Clone)]
#[repr(C, packed)]
struct IdentificationHeader {
    id_type: u8,
    reserved: [u8; 3],
}

/// Identification payload body (RFC 7296 §3.5), shared by ID_i and ID_r
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identification {
    /// ID_TYPE value (e.g. ID_IPV4_ADDR = 1, ID_FQDN = 2, ID_RFC822_ADDR = 3)
    pub id_type: u8,
    /// Identification data, meaning depends on `id_type`
    pub data: Vec<u8>,
}

impl Identification {
    pub(crate) fn decode(body: &[u8]) -> Result<Self> {
        let header = IdentificationHeader::read_from_prefix(body)
            .ok_or_else(|| IsakmpError::ParseError("identification payload too short".into()))?;
        Ok(Self {
            id_type: header.id_type,
            data: body[size_of::<IdentificationHeader>()..].to_vec(),
        })
    }

    pub(crate) fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(
            IdentificationHeader {
                id_type: self.id_type,
                reserved: [0; 3],
            }
            .as_bytes(),
        );
        out.extend_from_slice(&self.data);
    }

    pub fn verify(&self) -> std::result::Result<(), &'static str> {
        Ok(())
    }
}

/// Fixed 4-octet header in front of an Authentication payload body
#[derive(Debug, FromBytes, FromZeroes, AsBytes, Unaligned, Copy, Clone)]
#[repr(C, packed)]
struct AuthenticationHeader {
    auth_method: u8,
    reserved: [u8; 3],
}

/// Authentication payload body (RFC 7296 §3.8)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authentication {
    /// Auth Method value (1 = RSA signature, 2 = shared key MAC, 3 = DSS signature)
    pub method: u8,
    /// Authentication data
    pub data: Vec<u8>,
}

impl Authentication {
    pub(crate) fn decode(body: &[u8]) -> Result<Self> {
        let header = AuthenticationHeader::read_from_prefix(body)
            .ok_or_else(|| IsakmpError::ParseError("authentication payload too short".into()))?;
        Ok(Self {
            method: header.auth_method,
            data: body[size_of::<AuthenticationHeader>()..].to_vec(),
        })
    }

    pub(crate) fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(
            AuthenticationHeader {
                auth_method: self.method,
                reserved: [0; 3],
            }
            .as_bytes(),
        );
        out.extend_from_slice(&self.data);
    }

    pub fn verify(&self) -> std::result::Result<(), &'static str> {
        if self.method == 0 {
            return Err("auth method 0 is reserved");
        }
        Ok(())
    }
}

/// Fixed header in front of the traffic selector list (RFC 7296 §3.13)
#[derive(Debug, FromBytes, FromZeroes, AsBytes, Unaligned, Copy, Clone)]
#[repr(C, packed)]
struct TrafficSelectorsHeader {
    num_ts: u8,
    reserved: [u8; 3],
}

/// Fixed header of one traffic selector entry
#[derive(Debug, FromBytes, FromZeroes, AsBytes, Unaligned, Copy, Clone)]
#[repr(C, packed)]
struct TrafficSelectorHeader {
    ts_type: u8,
    ip_protocol_id: u8,
    selector_length: U16,
    start_port: U16,
    end_port: U16,
}

/// TS Type value for an IPv4 address range (RFC 7296 §3.13.1)
const TS_IPV4_ADDR_RANGE: u8 = 7;
/// TS Type value for an IPv6 address range
const TS_IPV6_ADDR_RANGE: u8 = 8;

/// One traffic selector: an address range, port range and IP protocol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrafficSelector {
    /// TS Type; only the IPv4/IPv6 address range types are understood
    pub ts_type: u8,
    /// IP protocol ID this selector restricts to, or 0 for any
    pub ip_protocol_id: u8,
    /// Inclusive start of the port range
    pub start_port: u16,
    /// Inclusive end of the port range
    pub end_port: u16,
    /// Start address, 4 or 16 octets depending on `ts_type`
    pub start_address: Vec<u8>,
    /// End address, same length as `start_address`
    pub end_address: Vec<u8>,
}

impl TrafficSelector {
    fn address_len(ts_type: u8) -> Result<usize> {
        match ts_type {
            TS_IPV4_ADDR_RANGE => Ok(4),
            TS_IPV6_ADDR_RANGE => Ok(16),
            _ => Err(IsakmpError::ParseError(format!(
                "unsupported traffic selector type {ts_type}"
            ))),
        }
    }

    fn decode(buf: &[u8]) -> Result<(Self, usize)> {
        let header = TrafficSelectorHeader::read_from_prefix(buf)
            .ok_or_else(|| IsakmpError::ParseError("traffic selector too short".into()))?;
        let total = header.selector_length.get() as usize;
        let header_len = size_of::<TrafficSelectorHeader>();
        let addr_len = Self::address_len(header.ts_type)?;
        if total != header_len + 2 * addr_len {
            return Err(IsakmpError::ParseError(
                "traffic selector length inconsistent with its type".into(),
            ));
        }
        if buf.len() < total {
            return Err(IsakmpError::ParseError(
                "traffic selector exceeds remaining buffer".into(),
            ));
        }
        let start_address = buf[header_len..header_len + addr_len].to_vec();
        let end_address = buf[header_len + addr_len..header_len + 2 * addr_len].to_vec();
        Ok((
            Self {
                ts_type: header.ts_type,
                ip_protocol_id: header.ip_protocol_id,
                start_port: header.start_port.get(),
                end_port: header.end_port.get(),
                start_address,
                end_address,
            },
            total,
        ))
    }

    fn encode_into(&self, out: &mut Vec<u8>) -> Result<()> {
        let addr_len = Self::address_len(self.ts_type)?;
        if self.start_address.len() != addr_len || self.end_address.len() != addr_len {
            return Err(IsakmpError::ParseError(
                "traffic selector address length does not match its type".into(),
            ));
        }
        let total = size_of::<TrafficSelectorHeader>() + 2 * addr_len;
        out.extend_from_slice(
            TrafficSelectorHeader {
                ts_type: self.ts_type,
                ip_protocol_id: self.ip_protocol_id,
                selector_length: U16::from(total as u16),
                start_port: U16::from(self.start_port),
                end_port: U16::from(self.end_port),
            }
            .as_bytes(),
        );
        out.extend_from_slice(&self.start_address);
        out.extend_from_slice(&self.end_address);
        Ok(())
    }
}

/// Traffic selector list payload body, shared by TSi and TSr (RFC 7296 §3.13)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrafficSelectors {
    pub selectors: Vec<TrafficSelector>,
}

impl TrafficSelectors {
    pub(crate) fn decode(body: &[u8]) -> Result<Self> {
        let header = TrafficSelectorsHeader::read_from_prefix(body)
            .ok_or_else(|| IsakmpError::ParseError("traffic selector list too short".into()))?;
        let mut offset = size_of::<TrafficSelectorsHeader>();
        let mut selectors = Vec::with_capacity(header.num_ts as usize);
        for _ in 0..header.num_ts {
            let (ts, len) = TrafficSelector::decode(&body[offset..])?;
            offset += len;
            selectors.push(ts);
        }
        Ok(Self { selectors })
    }

    pub(crate) fn encode_into(&self, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(
            TrafficSelectorsHeader {
                num_ts: self.selectors.len() as u8,
                reserved: [0; 3],
            }
            .as_bytes(),
        );
        for ts in &self.selectors {
            ts.encode_into(out)?;
        }
        Ok(())
    }

    pub fn verify(&self) -> std::result::Result<(), &'static str> {
        if self.selectors.len() > 255 {
            return Err("more than 255 traffic selectors");
        }
        for ts in &self.selectors {
            let expected = TrafficSelector::address_len(ts.ts_type).map_err(|_| "unsupported ts_type")?;
            if ts.start_address.len() != expected || ts.end_address.len() != expected {
                return Err("address length does not match ts_type");
            }
        }
        Ok(())
    }
}
