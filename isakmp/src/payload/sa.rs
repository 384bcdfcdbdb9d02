//! Security Association payload and its Proposal/Transform/Attribute
//! substructures (RFC 7296 §3.3), kept from the teacher's
//! `v2::generator::{security_association,proposal,transform,attribute}` and
//! extended with the parser half the teacher left as `todo!()`

use std::mem::size_of;

use zerocopy::network_endian::U16;
use zerocopy::{AsBytes, FromBytes};

use crate::error::{IsakmpError, Result};
use crate::params::{
    EncryptionAlgorithm, IntegrityAlgorithm, KeyExchangeMethod, PseudorandomFunction,
    SecurityProtocol, TransformType,
};
use crate::wire::{
    AttributeHeaderTv, ProposalHeader, TransformHeader, ATTRIBUTE_TYPE_KEY_LENGTH,
    FLAG_ATTRIBUTE_FORMAT,
};

/// Security Association payload body: an ordered list of alternative proposals
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SecurityAssociation {
    pub proposals: Vec<Proposal>,
}

impl SecurityAssociation {
    pub(crate) fn decode(body: &[u8]) -> Result<Self> {
        let mut proposals = Vec::new();
        let mut offset = 0usize;
        let mut expected_num = 1u8;
        loop {
            if offset >= body.len() {
                break;
            }
            let (proposal, len, last) = Proposal::decode(&body[offset..], expected_num)?;
            offset += len;
            proposals.push(proposal);
            expected_num += 1;
            if last {
                break;
            }
        }
        Ok(Self { proposals })
    }

    pub(crate) fn encode_into(&self, out: &mut Vec<u8>) {
        let count = self.proposals.len();
        for (i, proposal) in self.proposals.iter().enumerate() {
            proposal.encode_into(i as u8 + 1, i + 1 == count, out);
        }
    }

    pub fn verify(&self) -> std::result::Result<(), &'static str> {
        if self.proposals.len() >= 255 {
            return Err("more than 254 proposals in a security association");
        }
        for proposal in &self.proposals {
            proposal.verify()?;
        }
        Ok(())
    }
}

/// One proposal inside a Security Association: a protocol, its SPI and the
/// transforms offered for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    pub protocol: SecurityProtocol,
    pub spi: Vec<u8>,
    pub transforms: Vec<Transform>,
}

impl Proposal {
    /// Parse one proposal, returning its length in octets and whether it was
    /// the last of the Security Association
    fn decode(buf: &[u8], expected_num: u8) -> Result<(Self, usize, bool)> {
        let header = ProposalHeader::read_from_prefix(buf)
            .ok_or_else(|| IsakmpError::ParseError("proposal header too short".into()))?;
        if header.proposal_num != expected_num {
            return Err(IsakmpError::ParseError(format!(
                "proposal numbering out of sequence: expected {expected_num}, got {}",
                header.proposal_num
            )));
        }
        let header_len = size_of::<ProposalHeader>();
        let spi_len = header.spi_size as usize;
        let total_len = header.proposal_length.get() as usize;
        if total_len < header_len + spi_len || buf.len() < total_len {
            return Err(IsakmpError::ParseError(
                "proposal length inconsistent with buffer".into(),
            ));
        }
        let spi = buf[header_len..header_len + spi_len].to_vec();

        let mut transforms = Vec::with_capacity(header.num_transforms as usize);
        let mut offset = header_len + spi_len;
        loop {
            let (transform, len, last) = Transform::decode(&buf[offset..total_len])?;
            offset += len;
            transforms.push(transform);
            if last || offset >= total_len {
                break;
            }
        }
        if transforms.len() != header.num_transforms as usize {
            return Err(IsakmpError::ParseError(
                "num_transforms does not match the decoded transform count".into(),
            ));
        }

        Ok((
            Self {
                protocol: SecurityProtocol::try_from(header.protocol_id)?,
                spi,
                transforms,
            },
            total_len,
            header.last_substruct == 0,
        ))
    }

    fn encode_into(&self, num: u8, last: bool, out: &mut Vec<u8>) {
        let mut transforms = Vec::new();
        let count = self.transforms.len();
        for (i, transform) in self.transforms.iter().enumerate() {
            transform.encode_into(i + 1 == count, &mut transforms);
        }

        let total_len = size_of::<ProposalHeader>() + self.spi.len() + transforms.len();
        out.extend_from_slice(
            ProposalHeader {
                last_substruct: if last { 0 } else { 2 },
                reserved: 0,
                proposal_length: U16::from(total_len as u16),
                proposal_num: num,
                protocol_id: self.protocol as u8,
                spi_size: self.spi.len() as u8,
                num_transforms: self.transforms.len() as u8,
            }
            .as_bytes(),
        );
        out.extend_from_slice(&self.spi);
        out.extend_from_slice(&transforms);
    }

    fn verify(&self) -> std::result::Result<(), &'static str> {
        if self.transforms.is_empty() {
            return Err("a proposal must offer at least one transform");
        }
        if self.transforms.len() >= 255 {
            return Err("more than 254 transforms in a proposal");
        }
        Ok(())
    }
}

/// One transform inside a Proposal, naming an algorithm for one transform type
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Transform {
    Encryption(EncryptionAlgorithm, Option<u16>),
    PseudoRandomFunction(PseudorandomFunction),
    Integrity(IntegrityAlgorithm),
    KeyExchange(KeyExchangeMethod),
    ExtendedSequenceNumbers(bool),
}

impl Transform {
    fn decode(buf: &[u8]) -> Result<(Self, usize, bool)> {
        let header = TransformHeader::read_from_prefix(buf)
            .ok_or_else(|| IsakmpError::ParseError("transform header too short".into()))?;
        let header_len = size_of::<TransformHeader>();
        let total_len = header.transform_length.get() as usize;
        if total_len < header_len || buf.len() < total_len {
            return Err(IsakmpError::ParseError(
                "transform length inconsistent with buffer".into(),
            ));
        }
        let attr_buf = &buf[header_len..total_len];
        let transform_type = TransformType::try_from(header.transform_type)?;
        let id = header.transform_id.get();

        let transform = match transform_type {
            TransformType::EncryptionAlgorithm => {
                let key_length = decode_key_length_attribute(attr_buf)?;
                Transform::Encryption(EncryptionAlgorithm::try_from(id)?, key_length)
            }
            TransformType::PseudoRandomFunction => {
                Transform::PseudoRandomFunction(PseudorandomFunction::try_from(id)?)
            }
            TransformType::IntegrityAlgorithm => {
                Transform::Integrity(IntegrityAlgorithm::try_from(id)?)
            }
            TransformType::KeyExchangeMethod => {
                Transform::KeyExchange(KeyExchangeMethod::try_from(id)?)
            }
            TransformType::ExtendedSequenceNumbers => Transform::ExtendedSequenceNumbers(id == 1),
        };

        Ok((transform, total_len, header.last_substruct == 0))
    }

    fn encode_into(&self, last: bool, out: &mut Vec<u8>) {
        let (transform_type, transform_id, attributes) = match self {
            Transform::Encryption(algorithm, key_length) => (
                TransformType::EncryptionAlgorithm,
                *algorithm as u16,
                key_length.map(encode_key_length_attribute).unwrap_or_default(),
            ),
            Transform::PseudoRandomFunction(f) => {
                (TransformType::PseudoRandomFunction, *f as u16, Vec::new())
            }
            Transform::Integrity(i) => (TransformType::IntegrityAlgorithm, *i as u16, Vec::new()),
            Transform::KeyExchange(k) => {
                (TransformType::KeyExchangeMethod, *k as u16, Vec::new())
            }
            Transform::ExtendedSequenceNumbers(esn) => (
                TransformType::ExtendedSequenceNumbers,
                if *esn { 1 } else { 0 },
                Vec::new(),
            ),
        };

        let total_len = size_of::<TransformHeader>() + attributes.len();
        out.extend_from_slice(
            TransformHeader {
                last_substruct: if last { 0 } else { 3 },
                reserved: 0,
                transform_length: U16::from(total_len as u16),
                transform_type: transform_type as u8,
                reserved2: 0,
                transform_id: U16::from(transform_id),
            }
            .as_bytes(),
        );
        out.extend_from_slice(&attributes);
    }
}

fn encode_key_length_attribute(key_length: u16) -> Vec<u8> {
    AttributeHeaderTv {
        attribute_type: U16::from(ATTRIBUTE_TYPE_KEY_LENGTH | FLAG_ATTRIBUTE_FORMAT),
        attribute_value: U16::from(key_length),
    }
    .as_bytes()
    .to_vec()
}

fn decode_key_length_attribute(buf: &[u8]) -> Result<Option<u16>> {
    if buf.is_empty() {
        return Ok(None);
    }
    let header = AttributeHeaderTv::read_from_prefix(buf)
        .ok_or_else(|| IsakmpError::ParseError("transform attribute too short".into()))?;
    let attribute_type = header.attribute_type.get();
    if attribute_type & FLAG_ATTRIBUTE_FORMAT == 0 {
        return Err(IsakmpError::ParseError(
            "only fixed-length (TV) transform attributes are supported".into(),
        ));
    }
    if attribute_type & !FLAG_ATTRIBUTE_FORMAT != ATTRIBUTE_TYPE_KEY_LENGTH {
        return Err(IsakmpError::ParseError(
            "unsupported transform attribute type".into(),
        ));
    }
    Ok(Some(header.attribute_value.get()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{EncryptionAlgorithm, SecurityProtocol};

    #[test]
    fn empty_sa_round_trips() {
        let sa = SecurityAssociation::default();
        let mut buf = Vec::new();
        sa.encode_into(&mut buf);
        assert!(buf.is_empty());
        assert_eq!(SecurityAssociation::decode(&buf).unwrap(), sa);
    }

    #[test]
    fn single_proposal_round_trips() {
        let sa = SecurityAssociation {
            proposals: vec![Proposal {
                protocol: SecurityProtocol::InternetKeyExchange,
                spi: vec![0x42],
                transforms: vec![
                    Transform::Encryption(EncryptionAlgorithm::AesGcm16, Some(256)),
                    Transform::PseudoRandomFunction(PseudorandomFunction::HmacSha2_256),
                    Transform::KeyExchange(KeyExchangeMethod::Curve448),
                ],
            }],
        };
        let mut buf = Vec::new();
        sa.encode_into(&mut buf);
        assert_eq!(SecurityAssociation::decode(&buf).unwrap(), sa);
    }
}
