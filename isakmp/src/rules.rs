//! Static rule table (§3 "Rule table (static)"), transcribed from
//! strongSwan's `message_rules[]`/`supported_*_payloads[]`
//!
//! Immutable, process-wide data; there is no dynamic registration (§9
//! "Static rule table").

use crate::params::{ExchangeType, PayloadType};

/// One entry of a [`MessageRule`]'s payload list: a payload type and the
/// multiplicity/protection constraints the rule places on it
#[derive(Debug, Clone, Copy)]
pub struct SupportedPayloadEntry {
    pub payload_type: PayloadType,
    pub min_occurrence: u8,
    pub max_occurrence: u8,
    pub must_be_encrypted: bool,
}

const fn entry(
    payload_type: PayloadType,
    min_occurrence: u8,
    max_occurrence: u8,
    must_be_encrypted: bool,
) -> SupportedPayloadEntry {
    SupportedPayloadEntry {
        payload_type,
        min_occurrence,
        max_occurrence,
        must_be_encrypted,
    }
}

/// The rule for one (exchange type, direction) pair
#[derive(Debug, Clone, Copy)]
pub struct MessageRule {
    pub exchange_type: ExchangeType,
    pub is_request: bool,
    /// Whether this (exchange, direction) carries an Encryption envelope at all
    pub encrypted_content: bool,
    pub payloads: &'static [SupportedPayloadEntry],
}

const IKE_SA_INIT_PAYLOADS: &[SupportedPayloadEntry] = &[
    entry(PayloadType::SecurityAssociation, 1, 1, false),
    entry(PayloadType::KeyExchange, 1, 1, false),
    entry(PayloadType::Nonce, 1, 1, false),
];

const IKE_AUTH_REQUEST_PAYLOADS: &[SupportedPayloadEntry] = &[
    entry(PayloadType::IdentificationInitiator, 1, 1, true),
    entry(PayloadType::Certificate, 0, 1, true),
    entry(PayloadType::CertificateRequest, 0, 1, true),
    entry(PayloadType::IdentificationResponder, 0, 1, true),
    entry(PayloadType::Authentication, 1, 1, true),
    entry(PayloadType::SecurityAssociation, 1, 1, true),
    entry(PayloadType::TrafficSelectorInitiator, 1, 1, true),
    entry(PayloadType::TrafficSelectorResponder, 1, 1, true),
];

const IKE_AUTH_RESPONSE_PAYLOADS: &[SupportedPayloadEntry] = &[
    entry(PayloadType::Certificate, 0, 1, true),
    entry(PayloadType::Authentication, 1, 1, true),
    entry(PayloadType::SecurityAssociation, 1, 1, true),
    entry(PayloadType::TrafficSelectorInitiator, 1, 1, true),
    entry(PayloadType::TrafficSelectorResponder, 1, 1, true),
];

/// The static rule table (`message_rules[]` in the original)
///
/// `CREATE_CHILD_SA` and `INFORMATIONAL` carry no entry here, on purpose:
/// the original's table has none either, so [`get_message_rule`] returns
/// [`crate::IsakmpError::NotFound`] for them rather than synthesizing a
/// permissive rule (§6 "Open questions resolved").
const MESSAGE_RULES: &[MessageRule] = &[
    MessageRule {
        exchange_type: ExchangeType::IkeSaInit,
        is_request: true,
        encrypted_content: false,
        payloads: IKE_SA_INIT_PAYLOADS,
    },
    MessageRule {
        exchange_type: ExchangeType::IkeSaInit,
        is_request: false,
        encrypted_content: false,
        payloads: IKE_SA_INIT_PAYLOADS,
    },
    MessageRule {
        exchange_type: ExchangeType::IkeAuth,
        is_request: true,
        encrypted_content: true,
        payloads: IKE_AUTH_REQUEST_PAYLOADS,
    },
    MessageRule {
        exchange_type: ExchangeType::IkeAuth,
        is_request: false,
        encrypted_content: true,
        payloads: IKE_AUTH_RESPONSE_PAYLOADS,
    },
];

/// `get_message_rule()`: find the rule for `(exchange_type, is_request)`
pub fn get_message_rule(exchange_type: ExchangeType, is_request: bool) -> Option<&'static MessageRule> {
    MESSAGE_RULES
        .iter()
        .find(|rule| rule.exchange_type == exchange_type && rule.is_request == is_request)
}

/// `get_supported_payload_entry()`: find `rule`'s entry for `payload_type`
pub fn get_supported_payload_entry(
    rule: &MessageRule,
    payload_type: PayloadType,
) -> Option<&'static SupportedPayloadEntry> {
    rule.payloads
        .iter()
        .find(|candidate| candidate.payload_type == payload_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_child_sa_has_no_rule() {
        assert!(get_message_rule(ExchangeType::CreateChildSa, true).is_none());
        assert!(get_message_rule(ExchangeType::Informational, false).is_none());
    }

    #[test]
    fn ike_sa_init_requires_sa_ke_nonce() {
        let rule = get_message_rule(ExchangeType::IkeSaInit, true).unwrap();
        assert!(!rule.encrypted_content);
        assert!(get_supported_payload_entry(rule, PayloadType::SecurityAssociation).is_some());
        assert!(get_supported_payload_entry(rule, PayloadType::Authentication).is_none());
    }

    #[test]
    fn ike_auth_response_drops_id_i_and_cert_req() {
        let rule = get_message_rule(ExchangeType::IkeAuth, false).unwrap();
        assert!(get_supported_payload_entry(rule, PayloadType::IdentificationInitiator).is_none());
        assert!(get_supported_payload_entry(rule, PayloadType::CertificateRequest).is_none());
        assert!(get_supported_payload_entry(rule, PayloadType::SecurityAssociation).is_some());
    }
}
