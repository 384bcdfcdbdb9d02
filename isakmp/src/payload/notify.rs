//! Notify payload (RFC 7296 §3.10), kept and extended from the teacher's
//! `v2::generator::notification`/`v2::parser::notification`

use std::mem::size_of;

use zerocopy::{AsBytes, FromBytes};

use crate::error::{IsakmpError, Result};
use crate::params::{NotifyMessageType, SecurityProtocol};
use crate::wire::NotifyHeader;

/// Notify payload body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Notify message type; [`NotifyMessageType::is_error`] splits the range
    pub message_type: NotifyMessageType,
    /// Protocol the notification concerns, `None` when it concerns the IKE SA
    pub protocol: Option<SecurityProtocol>,
    /// SPI of the SA the notification concerns, `None` for the IKE SA
    pub spi: Option<Vec<u8>>,
    /// Notification data, meaning depends on `message_type`
    pub data: Vec<u8>,
}

impl Notification {
    pub(crate) fn decode(body: &[u8]) -> Result<Self> {
        let header = NotifyHeader::read_from_prefix(body)
            .ok_or_else(|| IsakmpError::ParseError("notify payload too short".into()))?;
        let header_len = size_of::<NotifyHeader>();
        let spi_len = header.spi_size as usize;
        if body.len() < header_len + spi_len {
            return Err(IsakmpError::ParseError(
                "notify SPI exceeds remaining buffer".into(),
            ));
        }
        let protocol = if header.protocol_id == 0 {
            None
        } else {
            Some(SecurityProtocol::try_from(header.protocol_id)?)
        };
        let spi = if spi_len > 0 {
            Some(body[header_len..header_len + spi_len].to_vec())
        } else {
            None
        };
        Ok(Self {
            message_type: NotifyMessageType::try_from(header.notify_message_type.get())?,
            protocol,
            spi,
            data: body[header_len + spi_len..].to_vec(),
        })
    }

    pub(crate) fn encode_into(&self, out: &mut Vec<u8>) {
        let spi_len = self.spi.as_ref().map(Vec::len).unwrap_or(0) as u8;
        out.extend_from_slice(
            NotifyHeader {
                protocol_id: self.protocol.map(|p| p as u8).unwrap_or(0),
                spi_size: spi_len,
                notify_message_type: (self.message_type as u16).into(),
            }
            .as_bytes(),
        );
        if let Some(spi) = &self.spi {
            out.extend_from_slice(spi);
        }
        out.extend_from_slice(&self.data);
    }

    /// An SPI only makes sense alongside the protocol it belongs to, and
    /// vice versa; either both are present or neither is
    pub fn verify(&self) -> std::result::Result<(), &'static str> {
        match (&self.protocol, &self.spi) {
            (Some(_), None) | (None, Some(_)) => {
                Err("notify protocol and SPI must be present or absent together")
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_spi_round_trips() {
        let n = Notification {
            message_type: NotifyMessageType::NoProposalChosen,
            protocol: None,
            spi: None,
            data: vec![],
        };
        assert!(n.verify().is_ok());
        let mut buf = Vec::new();
        n.encode_into(&mut buf);
        assert_eq!(buf, vec![0x00, 0x00, 0x00, 0x0e]);
        assert_eq!(Notification::decode(&buf).unwrap(), n);
    }

    #[test]
    fn inconsistent_spi_fails_verify() {
        let n = Notification {
            message_type: NotifyMessageType::InvalidSyntax,
            protocol: Some(SecurityProtocol::EncapsulatingSecurityPayload),
            spi: None,
            data: vec![],
        };
        assert!(n.verify().is_err());
    }
}
