//! Encryption payload envelope (§4.D): the encrypt-then-MAC framing that
//! protects the payloads a rule marks `must_be_encrypted`
//!
//! This is the one payload whose wire body cannot be split into its fields
//! (IV / ciphertext / checksum) at the moment it is first discovered while
//! walking the outer payload chain, because those field lengths depend on
//! the cipher and MAC bound for this exchange, which the Message only learns
//! when the caller supplies `crypter`/`signer`. [`EncryptionPayload::decode`]
//! therefore stages the whole body as `raw` bytes; [`EncryptionPayload::decrypt`]
//! does the real split once transforms are bound.

use log::{debug, trace};
use rand::RngCore;

use super::{decode_chain, encode_record, PayloadRecord};
use crate::error::{IsakmpError, Result};
use crate::params::PayloadType;
use crate::transform::{Crypter, Signer};

/// Encryption payload body: a sub-list of inner payloads plus the IV/
/// ciphertext/checksum staged by [`EncryptionPayload::encrypt`] or split out
/// by [`EncryptionPayload::decrypt`]
pub struct EncryptionPayload {
    inner: Vec<PayloadRecord>,
    transforms: Option<(Box<dyn Crypter>, Box<dyn Signer>)>,
    iv: Vec<u8>,
    ciphertext: Vec<u8>,
    checksum: Vec<u8>,
    raw: Vec<u8>,
}

impl std::fmt::Debug for EncryptionPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionPayload")
            .field("inner_payloads", &self.inner.len())
            .field("bound", &self.transforms.is_some())
            .field("iv_len", &self.iv.len())
            .field("ciphertext_len", &self.ciphertext.len())
            .field("checksum_len", &self.checksum.len())
            .finish()
    }
}

impl Clone for EncryptionPayload {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            transforms: None,
            iv: self.iv.clone(),
            ciphertext: self.ciphertext.clone(),
            checksum: self.checksum.clone(),
            raw: self.raw.clone(),
        }
    }
}

impl Default for EncryptionPayload {
    fn default() -> Self {
        Self::new()
    }
}

impl EncryptionPayload {
    /// An empty, unbound envelope ready to receive inner payloads
    pub fn new() -> Self {
        Self {
            inner: Vec::new(),
            transforms: None,
            iv: Vec::new(),
            ciphertext: Vec::new(),
            checksum: Vec::new(),
            raw: Vec::new(),
        }
    }

    pub(crate) fn decode(body: &[u8]) -> Self {
        Self {
            raw: body.to_vec(),
            ..Self::new()
        }
    }

    /// Append `payload` to the inner ordered list, wiring the previous tail's
    /// next-type link
    pub fn add_payload(&mut self, payload: impl Into<PayloadRecord>) {
        let record = payload.into();
        if let Some(previous) = self.inner.last_mut() {
            previous.next_type = record.payload_type();
        }
        self.inner.push(record);
    }

    /// The inner payload list, in encounter/insertion order
    pub fn inner_payloads(&self) -> &[PayloadRecord] {
        &self.inner
    }

    /// Bind the cipher and MAC capabilities used by `encrypt`/`decrypt` and
    /// `build_signature`/`verify_signature`
    pub fn set_transforms(&mut self, crypter: Box<dyn Crypter>, signer: Box<dyn Signer>) {
        self.transforms = Some((crypter, signer));
    }

    /// Lazy, forward, non-restartable traversal of the inner payloads; the
    /// envelope retains ownership
    pub fn create_payload_iterator(&self) -> impl Iterator<Item = &PayloadRecord> {
        self.inner.iter()
    }

    fn transforms(&self) -> Result<(&dyn Crypter, &dyn Signer)> {
        self.transforms
            .as_ref()
            .map(|(c, s)| (c.as_ref(), s.as_ref()))
            .ok_or(IsakmpError::InvalidState(
                "no crypter/signer bound to the encryption payload",
            ))
    }

    /// Serialize the inner payload chain, pad it, generate a fresh IV and
    /// encrypt it, staging the result as this payload's body
    ///
    /// The integrity checksum field is zero-filled here and left that way
    /// until [`EncryptionPayload::build_signature`] runs over the completed
    /// outer buffer.
    pub fn encrypt(&mut self) -> Result<()> {
        let (crypter, signer) = self.transforms()?;
        let block_size = crypter.block_size();
        if block_size == 0 {
            return Err(IsakmpError::InvalidState("cipher block size is zero"));
        }

        let mut plaintext = Vec::new();
        for record in &self.inner {
            encode_record(record, &mut plaintext)?;
        }

        // Pad length byte comes last; the bytes before it are arbitrary
        // padding whose count brings the total up to a block-size multiple.
        let pad_len = (block_size - (plaintext.len() + 1) % block_size) % block_size;
        plaintext.extend(std::iter::repeat(0u8).take(pad_len));
        plaintext.push(pad_len as u8);

        let mut iv = vec![0u8; block_size];
        rand::rng().fill_bytes(&mut iv);

        self.ciphertext = crypter.encrypt(&plaintext, &iv);
        self.iv = iv;
        self.checksum = vec![0u8; signer.block_size()];
        trace!(
            "encrypted {} inner payload(s) into {} octets of ciphertext",
            self.inner.len(),
            self.ciphertext.len()
        );
        Ok(())
    }

    /// Compute the MAC over `outer_buf` with the integrity-checksum region
    /// treated as zero, then overwrite that region with the result
    ///
    /// Called once the outer generator has emitted the complete message, so
    /// the checksum region's real position within `outer_buf` is known: its
    /// final `signer.block_size()` octets.
    pub fn build_signature(&mut self, outer_buf: &mut [u8]) -> Result<()> {
        let (_crypter, signer) = self.transforms()?;
        let mac_len = signer.block_size();
        if outer_buf.len() < mac_len {
            return Err(IsakmpError::ParseError(
                "outer buffer shorter than the MAC length".into(),
            ));
        }
        let checksum_at = outer_buf.len() - mac_len;
        let mut scratch = outer_buf.to_vec();
        scratch[checksum_at..].fill(0);
        let mac = signer.get_signature(&scratch);

        outer_buf[checksum_at..].copy_from_slice(&mac);
        self.checksum = mac;
        debug!("computed {mac_len}-octet MAC over the generated message");
        Ok(())
    }

    /// Verify `outer_buf`'s trailing MAC against the bound signer, with the
    /// checksum region itself treated as zero during recomputation
    pub fn verify_signature(&self, outer_buf: &[u8]) -> Result<()> {
        let (_crypter, signer) = self.transforms()?;
        let mac_len = signer.block_size();
        if outer_buf.len() < mac_len {
            return Err(IsakmpError::ParseError(
                "outer buffer shorter than the MAC length".into(),
            ));
        }
        let checksum_at = outer_buf.len() - mac_len;
        let mut scratch = outer_buf.to_vec();
        scratch[checksum_at..].fill(0);

        if !signer.verify_signature(&scratch, &outer_buf[checksum_at..]) {
            return Err(IsakmpError::InvalidState("MAC verification failed"));
        }
        Ok(())
    }

    /// Split the staged raw body into IV/ciphertext/checksum, decrypt it,
    /// strip the padding and re-parse the plaintext as a chain of payloads
    /// starting from `first_inner_type`
    ///
    /// `first_inner_type` is the next-type link the outer [`PayloadRecord`]
    /// carried for this envelope — the inner chain's own first link, which
    /// this payload's body never stores.
    pub fn decrypt(&mut self, first_inner_type: PayloadType) -> Result<()> {
        let (crypter, signer) = self.transforms()?;
        let block_size = crypter.block_size();
        let mac_len = signer.block_size();
        if self.raw.len() < block_size + mac_len {
            return Err(IsakmpError::ParseError(
                "encryption payload too short for IV and checksum".into(),
            ));
        }

        let checksum_at = self.raw.len() - mac_len;
        let iv = self.raw[..block_size].to_vec();
        let ciphertext = self.raw[block_size..checksum_at].to_vec();
        let checksum = self.raw[checksum_at..].to_vec();

        let plaintext = crypter.decrypt(&ciphertext, &iv);
        let pad_len = *plaintext
            .last()
            .ok_or_else(|| IsakmpError::ParseError("decrypted plaintext is empty".into()))?
            as usize;
        if plaintext.len() < pad_len + 1 {
            return Err(IsakmpError::ParseError(
                "pad length exceeds decrypted plaintext".into(),
            ));
        }
        let body = &plaintext[..plaintext.len() - pad_len - 1];

        self.inner = decode_chain(first_inner_type, body)?;
        self.iv = iv;
        self.ciphertext = ciphertext;
        self.checksum = checksum;
        debug!(
            "decrypted envelope into {} inner payload(s)",
            self.inner.len()
        );
        Ok(())
    }

    pub(crate) fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.iv);
        out.extend_from_slice(&self.ciphertext);
        out.extend_from_slice(&self.checksum);
    }

    pub fn verify(&self) -> std::result::Result<(), &'static str> {
        Ok(())
    }
}

impl PartialEq for EncryptionPayload {
    fn eq(&self, other: &Self) -> bool {
        self.inner.iter().map(|r| r.payload_type()).eq(other.inner.iter().map(|r| r.payload_type()))
    }
}

impl Eq for EncryptionPayload {}
