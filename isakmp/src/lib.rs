//! # isakmp
//!
//! The IKEv2 message encoding core: a binary codec for the chained, self-describing
//! payload records of an IKEv2 datagram, a rule table constraining which payloads
//! may appear in which exchange, and the encrypt-then-MAC envelope that protects
//! the authenticated part of a message.
//!
//! Socket I/O, SA keying and the cryptographic primitives themselves are not part
//! of this crate; [`transform::Crypter`] and [`transform::Signer`] are the seams
//! at which a caller plugs those in.

#![warn(missing_docs, clippy::unwrap_used, clippy::expect_used)]

mod codec;
pub mod error;
pub mod message;
pub mod params;
pub mod payload;
pub mod rules;
pub mod transform;
mod wire;

pub use error::IsakmpError;
pub use message::Message;

pub use zerocopy;
