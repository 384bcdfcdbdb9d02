//! Payload objects chained inside a message (§4.B)
//!
//! Every concrete payload type below owns only its header-less body;
//! [`crate::message::Message`] is the single place that prepends/strips the
//! 4-octet generic payload header and threads the next-payload links between
//! successive records.

pub mod encryption;
pub mod generic;
pub mod key_exchange;
pub mod notify;
pub mod sa;

use std::mem::size_of;

use zerocopy::FromBytes;

use crate::error::{IsakmpError, Result};
use crate::params::PayloadType;
use crate::wire::GenericPayloadHeader;

pub use encryption::EncryptionPayload;
pub use generic::{Authentication, Identification, Nonce, RawPayload, TrafficSelectors, VendorId};
pub use key_exchange::KeyExchange;
pub use notify::Notification;
pub use sa::SecurityAssociation;

/// A payload body together with the next-payload link captured for it at the
/// position it occupies in a [`crate::message::Message`] or
/// [`EncryptionPayload`]'s inner list
///
/// The wire header stores the next-type link alongside each payload body;
/// keeping it here instead of duplicating a `next_type` field on every
/// concrete payload struct mirrors `payload_entry_t` in the original, which
/// pairs a `payload_type_t` with otherwise-opaque payload data.
#[derive(Debug, Clone)]
pub struct PayloadRecord {
    /// The decoded or caller-constructed payload body
    pub body: PayloadBody,
    pub(crate) next_type: PayloadType,
}

impl From<PayloadBody> for PayloadRecord {
    fn from(body: PayloadBody) -> Self {
        PayloadRecord::new(body)
    }
}

impl PayloadRecord {
    /// Wrap a payload body with no next-type link yet (set once it is
    /// appended to a list that assigns it a successor)
    pub fn new(body: PayloadBody) -> Self {
        Self {
            body,
            next_type: PayloadType::NoNextPayload,
        }
    }

    /// The type of this record's body
    pub fn payload_type(&self) -> PayloadType {
        self.body.payload_type()
    }

    /// This record's next-type link
    pub fn next_type(&self) -> PayloadType {
        self.next_type
    }

    /// Check this record's payload-local invariants
    pub fn verify(&self) -> Result<()> {
        self.body.verify()
    }

    pub(crate) fn encode_body(&self, out: &mut Vec<u8>) -> Result<()> {
        self.body.encode_body(out)
    }
}

/// Tagged union of every payload kind this crate understands, the
/// "polymorphic payload object" of §9 expressed as a closed Rust enum
/// instead of the original's function-pointer records
#[derive(Debug, Clone)]
#[allow(missing_docs)]
pub enum PayloadBody {
    SecurityAssociation(SecurityAssociation),
    KeyExchange(KeyExchange),
    IdentificationInitiator(Identification),
    IdentificationResponder(Identification),
    Certificate(RawPayload),
    CertificateRequest(RawPayload),
    Authentication(Authentication),
    Nonce(Nonce),
    Notify(Notification),
    VendorId(VendorId),
    TrafficSelectorInitiator(TrafficSelectors),
    TrafficSelectorResponder(TrafficSelectors),
    Encrypted(EncryptionPayload),
    Configuration(RawPayload),
    ExtensibleAuthentication(RawPayload),
}

impl PayloadBody {
    /// Report the [`PayloadType`] this variant encodes as
    pub fn payload_type(&self) -> PayloadType {
        match self {
            PayloadBody::SecurityAssociation(_) => PayloadType::SecurityAssociation,
            PayloadBody::KeyExchange(_) => PayloadType::KeyExchange,
            PayloadBody::IdentificationInitiator(_) => PayloadType::IdentificationInitiator,
            PayloadBody::IdentificationResponder(_) => PayloadType::IdentificationResponder,
            PayloadBody::Certificate(_) => PayloadType::Certificate,
            PayloadBody::CertificateRequest(_) => PayloadType::CertificateRequest,
            PayloadBody::Authentication(_) => PayloadType::Authentication,
            PayloadBody::Nonce(_) => PayloadType::Nonce,
            PayloadBody::Notify(_) => PayloadType::Notify,
            PayloadBody::VendorId(_) => PayloadType::VendorID,
            PayloadBody::TrafficSelectorInitiator(_) => PayloadType::TrafficSelectorInitiator,
            PayloadBody::TrafficSelectorResponder(_) => PayloadType::TrafficSelectorResponder,
            PayloadBody::Encrypted(_) => PayloadType::Encrypted,
            PayloadBody::Configuration(_) => PayloadType::Configuration,
            PayloadBody::ExtensibleAuthentication(_) => PayloadType::ExtensibleAuthentication,
        }
    }

    /// Check this payload's local invariants, per §4.B never consulting
    /// anything outside the payload itself
    pub fn verify(&self) -> Result<()> {
        let ok = match self {
            PayloadBody::SecurityAssociation(v) => v.verify(),
            PayloadBody::KeyExchange(v) => v.verify(),
            PayloadBody::IdentificationInitiator(v) => v.verify(),
            PayloadBody::IdentificationResponder(v) => v.verify(),
            PayloadBody::Authentication(v) => v.verify(),
            PayloadBody::Nonce(v) => v.verify(),
            PayloadBody::Notify(v) => v.verify(),
            PayloadBody::TrafficSelectorInitiator(v) => v.verify(),
            PayloadBody::TrafficSelectorResponder(v) => v.verify(),
            PayloadBody::Encrypted(v) => v.verify(),
            PayloadBody::Certificate(_)
            | PayloadBody::CertificateRequest(_)
            | PayloadBody::VendorId(_)
            | PayloadBody::Configuration(_)
            | PayloadBody::ExtensibleAuthentication(_) => Ok(()),
        };
        ok.map_err(|_: &'static str| IsakmpError::VerifyError(self.payload_type()))
    }

    pub(crate) fn encode_body(&self, out: &mut Vec<u8>) -> Result<()> {
        match self {
            PayloadBody::SecurityAssociation(v) => v.encode_into(out),
            PayloadBody::KeyExchange(v) => v.encode_into(out),
            PayloadBody::IdentificationInitiator(v) => v.encode_into(out),
            PayloadBody::IdentificationResponder(v) => v.encode_into(out),
            PayloadBody::Certificate(v)
            | PayloadBody::CertificateRequest(v)
            | PayloadBody::Configuration(v)
            | PayloadBody::ExtensibleAuthentication(v) => v.encode_into(out),
            PayloadBody::Authentication(v) => v.encode_into(out),
            PayloadBody::Nonce(v) => v.encode_into(out),
            PayloadBody::Notify(v) => v.encode_into(out),
            PayloadBody::VendorId(v) => v.encode_into(out),
            PayloadBody::TrafficSelectorInitiator(v) => return v.encode_into(out),
            PayloadBody::TrafficSelectorResponder(v) => return v.encode_into(out),
            PayloadBody::Encrypted(v) => v.encode_into(out),
        }
        Ok(())
    }

    pub(crate) fn decode(payload_type: PayloadType, body: &[u8]) -> Result<Self> {
        Ok(match payload_type {
            PayloadType::SecurityAssociation => {
                PayloadBody::SecurityAssociation(SecurityAssociation::decode(body)?)
            }
            PayloadType::KeyExchange => PayloadBody::KeyExchange(KeyExchange::decode(body)?),
            PayloadType::IdentificationInitiator => {
                PayloadBody::IdentificationInitiator(Identification::decode(body)?)
            }
            PayloadType::IdentificationResponder => {
                PayloadBody::IdentificationResponder(Identification::decode(body)?)
            }
            PayloadType::Certificate => PayloadBody::Certificate(RawPayload::decode(body)),
            PayloadType::CertificateRequest => {
                PayloadBody::CertificateRequest(RawPayload::decode(body))
            }
            PayloadType::Authentication => {
                PayloadBody::Authentication(Authentication::decode(body)?)
            }
            PayloadType::Nonce => PayloadBody::Nonce(Nonce::decode(body)),
            PayloadType::Notify => PayloadBody::Notify(Notification::decode(body)?),
            PayloadType::Delete => {
                return Err(IsakmpError::NotSupported(PayloadType::Delete));
            }
            PayloadType::VendorID => PayloadBody::VendorId(VendorId::decode(body)),
            PayloadType::TrafficSelectorInitiator => {
                PayloadBody::TrafficSelectorInitiator(TrafficSelectors::decode(body)?)
            }
            PayloadType::TrafficSelectorResponder => {
                PayloadBody::TrafficSelectorResponder(TrafficSelectors::decode(body)?)
            }
            PayloadType::Encrypted => PayloadBody::Encrypted(EncryptionPayload::decode(body)),
            PayloadType::Configuration => PayloadBody::Configuration(RawPayload::decode(body)),
            PayloadType::ExtensibleAuthentication => {
                PayloadBody::ExtensibleAuthentication(RawPayload::decode(body))
            }
            PayloadType::NoNextPayload => {
                return Err(IsakmpError::ParseError(
                    "NO_NEXT_PAYLOAD does not name a payload body".into(),
                ));
            }
        })
    }
}

/// Walk a chained list of generic-header-prefixed payloads starting from
/// `next_type`, stopping at [`PayloadType::NoNextPayload`]
///
/// Used both for the outer payload chain (§4.A "parser contract") and for
/// the inner chain recovered by [`EncryptionPayload::decrypt`].
///
/// An Encrypted payload is always the last payload of whichever chain it
/// appears in (RFC 7296 §3.14): its header's Next Payload field is an
/// exception to the usual chaining rule and instead names the type of the
/// first payload embedded inside it, not the next outer payload. The walk
/// stops there rather than following that field as a continuation link.
pub(crate) fn decode_chain(mut next_type: PayloadType, buf: &[u8]) -> Result<Vec<PayloadRecord>> {
    let mut records = Vec::new();
    let mut offset = 0usize;
    let header_len = size_of::<GenericPayloadHeader>();

    while next_type != PayloadType::NoNextPayload {
        let header = buf
            .get(offset..offset + header_len)
            .and_then(|s| GenericPayloadHeader::read_from(s))
            .ok_or_else(|| {
                IsakmpError::ParseError("short generic payload header".to_string())
            })?;
        let total_len = header.payload_length.get() as usize;
        if total_len < header_len {
            return Err(IsakmpError::ParseError(
                "payload length smaller than its own header".into(),
            ));
        }
        let end = offset
            .checked_add(total_len)
            .ok_or_else(|| IsakmpError::ParseError("payload length overflow".into()))?;
        if end > buf.len() {
            return Err(IsakmpError::ParseError(
                "payload length exceeds remaining buffer".into(),
            ));
        }

        let this_type = next_type;
        let following = PayloadType::try_from(header.next_payload)?;
        let body = PayloadBody::decode(this_type, &buf[offset + header_len..end])?;
        let record = PayloadRecord {
            body,
            next_type: following,
        };
        record.verify()?;
        records.push(record);

        offset = end;
        if this_type == PayloadType::Encrypted {
            break;
        }
        next_type = following;
    }

    Ok(records)
}

/// Write one record's generic header + body into `out`, patching the
/// payload-length field once the body is known (§4.A "back-patch" rule)
pub(crate) fn encode_record(record: &PayloadRecord, out: &mut Vec<u8>) -> Result<()> {
    use zerocopy::AsBytes;

    let start = out.len();
    out.extend_from_slice(
        GenericPayloadHeader {
            next_payload: record.next_type as u8,
            critical_reserved: 0,
            payload_length: zerocopy::network_endian::U16::new(0),
        }
        .as_bytes(),
    );
    record.encode_body(out)?;
    crate::codec::patch_length_u16(out, start + 2, out.len() - start);
    Ok(())
}
