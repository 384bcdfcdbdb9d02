//! Key Exchange payload (RFC 7296 §3.4), kept from the teacher's
//! `v2::generator::key_exchange` and extended with the parser half

use std::mem::size_of;

use zerocopy::{AsBytes, FromBytes};

use crate::error::{IsakmpError, Result};
use crate::params::KeyExchangeMethod;
use crate::wire::KeyExchangeHeader;

/// Key Exchange payload body: a Diffie-Hellman group and the public value
/// computed in it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyExchange {
    /// Diffie-Hellman group the data below was computed in
    pub dh_group: KeyExchangeMethod,
    /// Key exchange data, length depends on `dh_group`
    pub data: Vec<u8>,
}

impl KeyExchange {
    pub(crate) fn decode(body: &[u8]) -> Result<Self> {
        let header = KeyExchangeHeader::read_from_prefix(body)
            .ok_or_else(|| IsakmpError::ParseError("key exchange payload too short".into()))?;
        Ok(Self {
            dh_group: KeyExchangeMethod::try_from(header.dh_group_num.get())?,
            data: body[size_of::<KeyExchangeHeader>()..].to_vec(),
        })
    }

    pub(crate) fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(
            KeyExchangeHeader {
                dh_group_num: (self.dh_group as u16).into(),
                reserved: 0u16.into(),
            }
            .as_bytes(),
        );
        out.extend_from_slice(&self.data);
    }

    pub fn verify(&self) -> std::result::Result<(), &'static str> {
        if self.data.is_empty() {
            return Err("key exchange data must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::KeyExchangeMethod;

    #[test]
    fn round_trips() {
        let ke = KeyExchange {
            dh_group: KeyExchangeMethod::Curve25519,
            data: vec![1, 2, 3, 4, 5, 6, 7, 8],
        };
        let mut buf = Vec::new();
        ke.encode_into(&mut buf);
        assert_eq!(
            buf,
            vec![0x00, 0x1f, 0x00, 0x00, 1, 2, 3, 4, 5, 6, 7, 8]
        );
        assert_eq!(KeyExchange::decode(&buf).unwrap(), ke);
    }
}
