//! IKEv2 parameters as defined in the IANA IKEv2 parameters registry
//! <https://www.iana.org/assignments/ikev2-parameters/ikev2-parameters.xhtml>
//!
//! Each registry is a closed Rust enum for the values this crate needs to
//! understand, with a `TryFrom<u8>`/`TryFrom<u16>` that buckets anything else
//! into [`UnparseableParameter`], the same shape the reserved/unassigned/
//! private-use regions of these registries always take.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::Display;

/// Why a wire-level parameter value could not be turned into its enum
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum UnparseableParameter {
    /// Reserved and must not be used, as it may conflict with older standards
    Reserved,
    /// No recognized meaning in any known standard
    Unassigned,
    /// Reserved for Private Use by proprietary implementations
    PrivateUse,
    /// The value cannot be reached by the field it was read from; the packet
    /// that produced it must be malformed
    OutOfRange,
}

/// Flag bit for the IKE header: message is a response, not a request
pub const FLAG_RESPONSE: u8 = 0b0010_0000;
/// Flag bit for the IKE header: "higher version supported" (always 0 here, RFC 7296 §3.1)
pub const FLAG_VERSION: u8 = 0b0001_0000;
/// Flag bit for the IKE header: sender is the original initiator of the IKE SA
pub const FLAG_INITIATOR: u8 = 0b0000_1000;

/// Flag bit for a generic payload header: payload is critical
pub const FLAG_CRITICAL: u8 = 0b1000_0000;

/// Major version this crate speaks; `parse_header` rejects anything else
pub const IKE_VERSION_MAJOR: u8 = 2;

/// Type of exchange a [`crate::Message`] belongs to
///
/// The rule table in [`crate::rules`] only has entries for the four exchange
/// types below; the others defined by later RFCs parse but have no rule,
/// so [`crate::Message::get_message_rule`] reports [`crate::IsakmpError::NotFound`]
/// for them, same as the original `message_rules[]` lookup does for any
/// exchange type it doesn't carry a rule for.
#[derive(Debug, Display, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum ExchangeType {
    /// RFC 7296: negotiates the IKE SA itself
    IkeSaInit = 34,
    /// RFC 7296: authenticates the IKE SA and sets up the first child SA
    IkeAuth = 35,
    /// RFC 7296: creates or rekeys a child SA, or rekeys the IKE SA
    CreateChildSa = 36,
    /// RFC 7296: notifications and deletions outside of an active negotiation
    Informational = 37,
}

impl TryFrom<u8> for ExchangeType {
    type Error = UnparseableParameter;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0..=33 => Err(UnparseableParameter::Reserved),
            34 => Ok(ExchangeType::IkeSaInit),
            35 => Ok(ExchangeType::IkeAuth),
            36 => Ok(ExchangeType::CreateChildSa),
            37 => Ok(ExchangeType::Informational),
            38..=239 => Err(UnparseableParameter::Unassigned),
            240..=255 => Err(UnparseableParameter::PrivateUse),
        }
    }
}

/// Type of an IKEv2 payload
///
/// Values 1-32 are reserved, 55-127 are currently unassigned and 128-255 are
/// reserved for private use.
#[derive(Debug, Display, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum PayloadType {
    NoNextPayload = 0,
    SecurityAssociation = 33,
    KeyExchange = 34,
    IdentificationInitiator = 35,
    IdentificationResponder = 36,
    Certificate = 37,
    CertificateRequest = 38,
    Authentication = 39,
    Nonce = 40,
    Notify = 41,
    Delete = 42,
    VendorID = 43,
    TrafficSelectorInitiator = 44,
    TrafficSelectorResponder = 45,
    Encrypted = 46,
    Configuration = 47,
    ExtensibleAuthentication = 48,
}

impl TryFrom<u8> for PayloadType {
    type Error = UnparseableParameter;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PayloadType::NoNextPayload),
            1..=32 => Err(UnparseableParameter::Reserved),
            33 => Ok(PayloadType::SecurityAssociation),
            34 => Ok(PayloadType::KeyExchange),
            35 => Ok(PayloadType::IdentificationInitiator),
            36 => Ok(PayloadType::IdentificationResponder),
            37 => Ok(PayloadType::Certificate),
            38 => Ok(PayloadType::CertificateRequest),
            39 => Ok(PayloadType::Authentication),
            40 => Ok(PayloadType::Nonce),
            41 => Ok(PayloadType::Notify),
            42 => Ok(PayloadType::Delete),
            43 => Ok(PayloadType::VendorID),
            44 => Ok(PayloadType::TrafficSelectorInitiator),
            45 => Ok(PayloadType::TrafficSelectorResponder),
            46 => Ok(PayloadType::Encrypted),
            47 => Ok(PayloadType::Configuration),
            48 => Ok(PayloadType::ExtensibleAuthentication),
            49..=127 => Err(UnparseableParameter::Unassigned),
            128..=255 => Err(UnparseableParameter::PrivateUse),
        }
    }
}

/// Type of transform inside a [`crate::payload::sa::Proposal`]
#[derive(Debug, Display, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum TransformType {
    EncryptionAlgorithm = 1,
    PseudoRandomFunction = 2,
    IntegrityAlgorithm = 3,
    KeyExchangeMethod = 4,
    ExtendedSequenceNumbers = 5,
}

impl TryFrom<u8> for TransformType {
    type Error = UnparseableParameter;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Err(UnparseableParameter::Reserved),
            1 => Ok(TransformType::EncryptionAlgorithm),
            2 => Ok(TransformType::PseudoRandomFunction),
            3 => Ok(TransformType::IntegrityAlgorithm),
            4 => Ok(TransformType::KeyExchangeMethod),
            5 => Ok(TransformType::ExtendedSequenceNumbers),
            6..=240 => Err(UnparseableParameter::Unassigned),
            241..=255 => Err(UnparseableParameter::PrivateUse),
        }
    }
}

/// Protocol identifier inside a [`crate::payload::sa::Proposal`]
#[derive(Debug, Display, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum SecurityProtocol {
    InternetKeyExchange = 1,
    AuthenticationHeader = 2,
    EncapsulatingSecurityPayload = 3,
}

impl TryFrom<u8> for SecurityProtocol {
    type Error = UnparseableParameter;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Err(UnparseableParameter::Reserved),
            1 => Ok(SecurityProtocol::InternetKeyExchange),
            2 => Ok(SecurityProtocol::AuthenticationHeader),
            3 => Ok(SecurityProtocol::EncapsulatingSecurityPayload),
            4..=200 => Err(UnparseableParameter::Unassigned),
            201..=255 => Err(UnparseableParameter::PrivateUse),
        }
    }
}

/// Transform ID for transform type 1 (Encryption Algorithm)
#[derive(Debug, Display, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u16)]
#[allow(missing_docs)]
pub enum EncryptionAlgorithm {
    Des = 2,
    TripleDes = 3,
    Blowfish = 7,
    AesCbc = 12,
    AesCtr = 13,
    AesGcm8 = 18,
    AesGcm12 = 19,
    AesGcm16 = 20,
    ChaCha20Poly1305 = 28,
}

impl TryFrom<u16> for EncryptionAlgorithm {
    type Error = UnparseableParameter;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(EncryptionAlgorithm::Des),
            3 => Ok(EncryptionAlgorithm::TripleDes),
            7 => Ok(EncryptionAlgorithm::Blowfish),
            12 => Ok(EncryptionAlgorithm::AesCbc),
            13 => Ok(EncryptionAlgorithm::AesCtr),
            18 => Ok(EncryptionAlgorithm::AesGcm8),
            19 => Ok(EncryptionAlgorithm::AesGcm12),
            20 => Ok(EncryptionAlgorithm::AesGcm16),
            28 => Ok(EncryptionAlgorithm::ChaCha20Poly1305),
            _ => Err(UnparseableParameter::Unassigned),
        }
    }
}

/// Transform ID for transform type 2 (Pseudorandom Function)
#[derive(Debug, Display, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u16)]
#[allow(missing_docs)]
pub enum PseudorandomFunction {
    HmacMd5 = 1,
    HmacSha1 = 2,
    HmacSha2_256 = 5,
    HmacSha2_384 = 6,
    HmacSha2_512 = 7,
}

impl TryFrom<u16> for PseudorandomFunction {
    type Error = UnparseableParameter;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(PseudorandomFunction::HmacMd5),
            2 => Ok(PseudorandomFunction::HmacSha1),
            5 => Ok(PseudorandomFunction::HmacSha2_256),
            6 => Ok(PseudorandomFunction::HmacSha2_384),
            7 => Ok(PseudorandomFunction::HmacSha2_512),
            _ => Err(UnparseableParameter::Unassigned),
        }
    }
}

/// Transform ID for transform type 3 (Integrity Algorithm)
#[derive(Debug, Display, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u16)]
#[allow(missing_docs)]
pub enum IntegrityAlgorithm {
    HmacMd5_96 = 1,
    HmacSha1_96 = 2,
    HmacSha2_256_128 = 12,
    HmacSha2_384_192 = 13,
    HmacSha2_512_256 = 14,
}

impl TryFrom<u16> for IntegrityAlgorithm {
    type Error = UnparseableParameter;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(IntegrityAlgorithm::HmacMd5_96),
            2 => Ok(IntegrityAlgorithm::HmacSha1_96),
            12 => Ok(IntegrityAlgorithm::HmacSha2_256_128),
            13 => Ok(IntegrityAlgorithm::HmacSha2_384_192),
            14 => Ok(IntegrityAlgorithm::HmacSha2_512_256),
            _ => Err(UnparseableParameter::Unassigned),
        }
    }
}

/// Transform ID for transform type 4 (Key Exchange Method / D-H group)
#[derive(Debug, Display, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u16)]
#[allow(missing_docs)]
pub enum KeyExchangeMethod {
    Modp1024 = 2,
    Modp2048 = 14,
    Modp3072 = 15,
    Modp4096 = 16,
    Curve25519 = 31,
    Curve448 = 32,
}

impl TryFrom<u16> for KeyExchangeMethod {
    type Error = UnparseableParameter;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(KeyExchangeMethod::Modp1024),
            14 => Ok(KeyExchangeMethod::Modp2048),
            15 => Ok(KeyExchangeMethod::Modp3072),
            16 => Ok(KeyExchangeMethod::Modp4096),
            31 => Ok(KeyExchangeMethod::Curve25519),
            32 => Ok(KeyExchangeMethod::Curve448),
            _ => Err(UnparseableParameter::Unassigned),
        }
    }
}

/// Notify message type, split into the error range (0-16383) and the status
/// range (16384-65535) by RFC 7296 §3.10.1
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[allow(missing_docs)]
pub enum NotifyMessageType {
    UnsupportedCriticalPayload = 1,
    InvalidSyntax = 7,
    AuthenticationFailed = 24,
    NoProposalChosen = 14,
    TemporaryFailure = 43,
    InitialContact = 16384,
    SetWindowSize = 16392,
}

impl NotifyMessageType {
    /// Types below 16384 report an error; the recipient must treat the
    /// corresponding request as having failed entirely
    pub fn is_error(self) -> bool {
        (self as u16) < 16384
    }
}

impl TryFrom<u16> for NotifyMessageType {
    type Error = UnparseableParameter;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(NotifyMessageType::UnsupportedCriticalPayload),
            7 => Ok(NotifyMessageType::InvalidSyntax),
            14 => Ok(NotifyMessageType::NoProposalChosen),
            24 => Ok(NotifyMessageType::AuthenticationFailed),
            43 => Ok(NotifyMessageType::TemporaryFailure),
            16384 => Ok(NotifyMessageType::InitialContact),
            16392 => Ok(NotifyMessageType::SetWindowSize),
            _ => Err(UnparseableParameter::Unassigned),
        }
    }
}

impl fmt::Display for NotifyMessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}
