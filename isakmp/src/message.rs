//! Message: the top-level container orchestrating generate/parse (§4.E)

use std::mem::size_of;
use std::net::SocketAddr;

use log::{debug, trace, warn};
use zerocopy::network_endian::{U32, U64};
use zerocopy::{AsBytes, FromBytes};

use crate::error::{IsakmpError, Result};
use crate::params::{
    ExchangeType, PayloadType, FLAG_INITIATOR, FLAG_RESPONSE, IKE_VERSION_MAJOR,
};
use crate::payload::{decode_chain, encode_record, PayloadBody, PayloadRecord};
use crate::rules::{self, MessageRule, SupportedPayloadEntry};
use crate::transform::{Crypter, Signer};
use crate::wire::Header;

/// A Message's position in the send/receive state machine (§4.E "State machine")
///
/// Generate and parse are mutually exclusive on one Message: the send path
/// only ever moves `Created → PayloadsAdded → Generated`, the receive path
/// only ever moves `Created → HeaderParsed → BodyParsed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageState {
    Created,
    PayloadsAdded,
    Generated,
    HeaderParsed,
    BodyParsed,
}

/// The IKE SA id: the pair of SPIs plus which side originally initiated the SA
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IkeSaId {
    pub initiator_spi: u64,
    pub responder_spi: u64,
    pub is_original_initiator: bool,
}

/// Top-level container for one IKEv2 datagram: exchange metadata, the
/// ordered payload list, and the cached serialized buffer
pub struct Message {
    major_version: u8,
    minor_version: u8,
    exchange_type: Option<ExchangeType>,
    is_request: bool,
    message_id: u32,
    ike_sa_id: IkeSaId,
    source: Option<SocketAddr>,
    destination: Option<SocketAddr>,
    payloads: Vec<PayloadRecord>,
    packet: Option<Vec<u8>>,
    first_payload: PayloadType,
    state: MessageState,
}

impl Default for Message {
    fn default() -> Self {
        Self::new()
    }
}

impl Message {
    /// A fresh, empty Message ready to be populated for the send path
    pub fn new() -> Self {
        Self {
            major_version: IKE_VERSION_MAJOR,
            minor_version: 0,
            exchange_type: None,
            is_request: true,
            message_id: 0,
            ike_sa_id: IkeSaId::default(),
            source: None,
            destination: None,
            payloads: Vec::new(),
            packet: None,
            first_payload: PayloadType::NoNextPayload,
            state: MessageState::Created,
        }
    }

    /// A Message built from a received packet buffer, ready for [`Message::parse_header`]
    pub fn from_packet() -> Self {
        Self::new()
    }

    pub fn exchange_type(&self) -> Option<ExchangeType> {
        self.exchange_type
    }

    pub fn set_exchange_type(&mut self, exchange_type: ExchangeType) {
        self.exchange_type = Some(exchange_type);
    }

    pub fn is_request(&self) -> bool {
        self.is_request
    }

    pub fn set_request(&mut self, is_request: bool) {
        self.is_request = is_request;
    }

    pub fn message_id(&self) -> u32 {
        self.message_id
    }

    pub fn set_message_id(&mut self, message_id: u32) {
        self.message_id = message_id;
    }

    pub fn ike_sa_id(&self) -> IkeSaId {
        self.ike_sa_id
    }

    pub fn set_ike_sa_id(&mut self, ike_sa_id: IkeSaId) {
        self.ike_sa_id = ike_sa_id;
    }

    pub fn set_endpoints(&mut self, source: SocketAddr, destination: SocketAddr) {
        self.source = Some(source);
        self.destination = Some(destination);
    }

    pub fn source(&self) -> Option<SocketAddr> {
        self.source
    }

    pub fn destination(&self) -> Option<SocketAddr> {
        self.destination
    }

    pub fn first_payload(&self) -> PayloadType {
        self.first_payload
    }

    pub fn state(&self) -> MessageState {
        self.state
    }

    /// The cached buffer from the last successful `generate` or the buffer
    /// this Message was parsed from
    pub fn packet(&self) -> Option<&[u8]> {
        self.packet.as_deref()
    }

    /// Forward, single-pass iterator over the current payload list
    pub fn payloads(&self) -> impl Iterator<Item = &PayloadRecord> {
        self.payloads.iter()
    }

    /// Append `payload`, updating the previous tail's next-type link and
    /// `first_payload` if this is the first element (invariant 1 and 2 of §3)
    pub fn add_payload(&mut self, payload: impl Into<PayloadRecord>) {
        let record = payload.into();
        if let Some(previous) = self.payloads.last_mut() {
            previous.next_type = record.payload_type();
        } else {
            self.first_payload = record.payload_type();
        }
        self.payloads.push(record);
        if self.state == MessageState::Created {
            self.state = MessageState::PayloadsAdded;
        }
    }

    fn get_message_rule(&self) -> Result<&'static MessageRule> {
        let exchange_type = self
            .exchange_type
            .ok_or(IsakmpError::InvalidState("exchange type is undefined"))?;
        rules::get_message_rule(exchange_type, self.is_request).ok_or(IsakmpError::NotFound)
    }

    fn get_supported_payload_entry(
        rule: &'static MessageRule,
        payload_type: PayloadType,
    ) -> Result<&'static SupportedPayloadEntry> {
        rules::get_supported_payload_entry(rule, payload_type).ok_or(IsakmpError::NotFound)
    }

    /// `verify()`: re-check the final (post-decrypt, flattened) payload list
    /// against the rule table's per-type multiplicity bounds
    pub fn verify(&self) -> Result<()> {
        let rule = self.get_message_rule()?;
        for entry in rule.payloads {
            let count = self
                .payloads
                .iter()
                .filter(|record| record.payload_type() == entry.payload_type)
                .count();
            if count < entry.min_occurrence as usize || count > entry.max_occurrence as usize {
                warn!(
                    "{:?} occurs {count} time(s), rule requires [{}, {}]",
                    entry.payload_type, entry.min_occurrence, entry.max_occurrence
                );
                return Err(IsakmpError::NotSupported(entry.payload_type));
            }
        }
        Ok(())
    }

    /// Run the encrypt pass (§4.E generate, step 1): classify *every*
    /// payload whose rule entry is `must_be_encrypted`, move it into a fresh
    /// Encryption payload, and re-append that envelope as the new tail
    ///
    /// Unlike the original `encrypt_payloads`, which appears to stop
    /// classifying after the first encrypted payload it finds (a latent bug
    /// spec.md §9 flags and instructs not to reproduce), this scans the
    /// whole list.
    fn encrypt_pass(
        &mut self,
        crypter: Box<dyn Crypter>,
        signer: Box<dyn Signer>,
    ) -> Result<()> {
        let rule = self.get_message_rule()?;
        if !rule.encrypted_content {
            return Ok(());
        }

        let detached = std::mem::take(&mut self.payloads);
        let mut outer = Vec::with_capacity(detached.len());
        let mut envelope = crate::payload::EncryptionPayload::new();

        for record in detached {
            let entry = Self::get_supported_payload_entry(rule, record.payload_type())?;
            if entry.must_be_encrypted {
                envelope.add_payload(record.body);
            } else {
                outer.push(record.body);
            }
        }
        let first_inner_type = envelope
            .inner_payloads()
            .first()
            .map(PayloadRecord::payload_type)
            .unwrap_or(PayloadType::NoNextPayload);
        envelope.set_transforms(crypter, signer);
        envelope.encrypt()?;
        outer.push(PayloadBody::Encrypted(envelope));

        self.payloads.clear();
        self.first_payload = PayloadType::NoNextPayload;
        for body in outer {
            self.add_payload(body);
        }
        // The Encrypted payload's generic header repurposes its next-payload
        // field: per RFC 7296 §3.14 it names the first payload embedded
        // inside it, not the next outer payload (it is always outer-last, so
        // there is no "next outer payload" for it to name).
        if let Some(record) = self.payloads.last_mut() {
            if matches!(record.body, PayloadBody::Encrypted(_)) {
                record.next_type = first_inner_type;
            }
        }
        trace!("encrypt pass moved protected payloads into the encryption envelope");
        Ok(())
    }

    /// `generate(crypter, signer) -> packet` (§4.E)
    pub fn generate(&mut self, crypter: Box<dyn Crypter>, signer: Box<dyn Signer>) -> Result<Vec<u8>> {
        if matches!(self.state, MessageState::Generated | MessageState::HeaderParsed | MessageState::BodyParsed) {
            return Err(IsakmpError::InvalidState(
                "generate called on an already-generated or parsed message",
            ));
        }
        let exchange_type = self
            .exchange_type
            .ok_or(IsakmpError::InvalidState("exchange type is undefined"))?;
        if self.source.is_none() || self.destination.is_none() {
            return Err(IsakmpError::InvalidState(
                "source and destination endpoints are unset",
            ));
        }
        if self.ike_sa_id.initiator_spi == 0 {
            return Err(IsakmpError::InvalidState("IKE SA id is unassigned"));
        }

        self.encrypt_pass(crypter, signer)?;

        let mut buf = vec![0u8; size_of::<Header>()];
        for record in &self.payloads {
            encode_record(record, &mut buf)?;
        }

        let first = self
            .payloads
            .first()
            .map(PayloadRecord::payload_type)
            .unwrap_or(PayloadType::NoNextPayload);
        let mut flags = 0u8;
        if !self.is_request {
            flags |= FLAG_RESPONSE;
        }
        if self.ike_sa_id.is_original_initiator {
            flags |= FLAG_INITIATOR;
        }
        let header = Header {
            initiator_spi: U64::from(self.ike_sa_id.initiator_spi),
            responder_spi: U64::from(self.ike_sa_id.responder_spi),
            next_payload: first as u8,
            version: Header::pack_version(self.major_version, self.minor_version),
            exchange_type: exchange_type as u8,
            flags,
            message_id: U32::from(self.message_id),
            length: U32::from(buf.len() as u32),
        };
        buf[..size_of::<Header>()].copy_from_slice(header.as_bytes());

        if let Some(PayloadBody::Encrypted(envelope)) =
            self.payloads.last_mut().map(|r| &mut r.body)
        {
            envelope.build_signature(&mut buf)?;
        }

        self.packet = Some(buf.clone());
        self.first_payload = first;
        self.state = MessageState::Generated;
        debug!(
            "generated a {:?} {} of {} octet(s)",
            exchange_type,
            if self.is_request { "request" } else { "response" },
            buf.len()
        );
        Ok(buf)
    }

    /// `parse_header()`: parse only the first 28 octets
    pub fn parse_header(&mut self, buf: &[u8]) -> Result<()> {
        if self.state != MessageState::Created {
            return Err(IsakmpError::InvalidState(
                "parse_header may only run once, from the Created state",
            ));
        }
        let header = Header::read_from_prefix(buf)
            .ok_or_else(|| IsakmpError::ParseError("buffer shorter than the message header".into()))?;
        let (major, minor) = header.version_parts();
        if major != IKE_VERSION_MAJOR {
            return Err(IsakmpError::ParseError(format!(
                "unsupported major version {major}"
            )));
        }
        if header.length.get() as usize != buf.len() {
            return Err(IsakmpError::ParseError(
                "header length field does not match the buffer length".into(),
            ));
        }

        self.major_version = major;
        self.minor_version = minor;
        self.exchange_type = Some(ExchangeType::try_from(header.exchange_type)?);
        self.is_request = header.flags & FLAG_RESPONSE == 0;
        self.ike_sa_id = IkeSaId {
            initiator_spi: header.initiator_spi.get(),
            responder_spi: header.responder_spi.get(),
            is_original_initiator: header.flags & FLAG_INITIATOR != 0,
        };
        self.message_id = header.message_id.get();
        self.first_payload = PayloadType::try_from(header.next_payload)?;
        self.packet = Some(buf.to_vec());
        self.state = MessageState::HeaderParsed;
        Ok(())
    }

    /// `parse_body(crypter, signer)`: walk the chain, verify each payload,
    /// run the decrypt pass, then [`Message::verify`]
    pub fn parse_body(&mut self, crypter: Box<dyn Crypter>, signer: Box<dyn Signer>) -> Result<()> {
        if self.state != MessageState::HeaderParsed {
            return Err(IsakmpError::InvalidState(
                "parse_body requires a prior parse_header",
            ));
        }
        let buf = self
            .packet
            .clone()
            .ok_or(IsakmpError::InvalidState("no packet buffer to parse"))?;

        self.payloads = decode_chain(self.first_payload, &buf[size_of::<Header>()..])?;

        self.decrypt_pass(crypter, signer, &buf)?;
        self.verify()?;
        self.state = MessageState::BodyParsed;
        Ok(())
    }

    /// Run the decrypt pass (§4.E parse_body): find the envelope (must be
    /// last if present), verify its MAC, decrypt and splice its inner
    /// payloads into the outer list in its place, then cross-check every
    /// flattened payload's observed protection state against the rule
    fn decrypt_pass(
        &mut self,
        crypter: Box<dyn Crypter>,
        signer: Box<dyn Signer>,
        outer_buf: &[u8],
    ) -> Result<()> {
        let rule = self.get_message_rule()?;

        let envelope_position = self
            .payloads
            .iter()
            .position(|record| matches!(record.body, PayloadBody::Encrypted(_)));

        // Boundary index into the post-splice `self.payloads`: entries at or
        // after it came from inside the envelope and were therefore observed
        // protected; entries before it were not. `None` means no envelope was
        // present at all, so nothing was protected.
        let protected_from = match envelope_position {
            None => {
                if rule.encrypted_content {
                    return Err(IsakmpError::Failed(
                        "rule requires encrypted content but no encryption payload is present",
                    ));
                }
                None
            }
            Some(position) => {
                if position != self.payloads.len() - 1 {
                    return Err(IsakmpError::Failed(
                        "encryption payload is not the last element of the message",
                    ));
                }
                if !rule.encrypted_content {
                    return Err(IsakmpError::Failed(
                        "rule forbids encrypted content but an encryption payload is present",
                    ));
                }

                let next_inner_type = self.payloads[position].next_type();
                let PayloadBody::Encrypted(mut envelope) = self.payloads.pop().unwrap().body
                else {
                    unreachable!("position was just located as an Encrypted variant");
                };

                envelope.set_transforms(crypter, signer);
                envelope.verify_signature(outer_buf)?;
                envelope.decrypt(next_inner_type)?;

                let boundary = self.payloads.len();
                for record in envelope.create_payload_iterator().cloned().collect::<Vec<_>>() {
                    self.payloads.push(record);
                }
                Some(boundary)
            }
        };

        // `verify()` re-validates occurrence counts per rule entry afterwards
        // but never walks `self.payloads` itself, so an unknown payload type
        // or a mismatched protection state would otherwise slip through
        // unnoticed.
        for (index, record) in self.payloads.iter().enumerate() {
            let entry = Self::get_supported_payload_entry(rule, record.payload_type())
                .map_err(|_| IsakmpError::NotSupported(record.payload_type()))?;
            let was_protected = protected_from.is_some_and(|boundary| index >= boundary);
            if entry.must_be_encrypted != was_protected {
                return Err(IsakmpError::Failed(
                    "payload's observed protection state does not match its rule entry",
                ));
            }
        }

        trace!("decrypt pass flattened {} payload(s)", self.payloads.len());
        Ok(())
    }
}

impl Drop for Message {
    fn drop(&mut self) {
        trace!("destroying message, releasing {} payload(s)", self.payloads.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_requires_exchange_type() {
        let mut msg = Message::new();
        msg.set_endpoints(
            "127.0.0.1:500".parse().unwrap(),
            "127.0.0.1:500".parse().unwrap(),
        );
        let err = msg
            .generate(Box::new(NullCrypter), Box::new(NullSigner))
            .unwrap_err();
        assert!(matches!(err, IsakmpError::InvalidState(_)));
    }

    #[test]
    fn truncated_header_fails_to_parse() {
        let mut msg = Message::new();
        let err = msg.parse_header(&[0u8; 20]).unwrap_err();
        assert!(matches!(err, IsakmpError::ParseError(_)));
    }

    struct NullCrypter;
    impl Crypter for NullCrypter {
        fn block_size(&self) -> usize {
            16
        }
        fn encrypt(&self, data: &[u8], _iv: &[u8]) -> Vec<u8> {
            data.to_vec()
        }
        fn decrypt(&self, data: &[u8], _iv: &[u8]) -> Vec<u8> {
            data.to_vec()
        }
    }

    struct NullSigner;
    impl Signer for NullSigner {
        fn block_size(&self) -> usize {
            12
        }
        fn get_signature(&self, _data: &[u8]) -> Vec<u8> {
            vec![0u8; 12]
        }
    }
}
