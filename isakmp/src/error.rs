//! Error kinds produced by the message encoding core
//!
//! These mirror the status codes of the original charon `message_t`: every
//! fallible operation returns one of these instead of raising an exception,
//! and `Ok(())`/`Ok(_)` stands in for the original's `SUCCESS`.

use thiserror::Error;

use crate::params::{PayloadType, UnparseableParameter};

/// Failure of a message encoding core operation
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum IsakmpError {
    /// Preconditions unmet: exchange type undefined, endpoints unset, no transforms
    /// bound, or a MAC mismatch was encountered
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    /// Structural octet-level failure while parsing
    #[error("parse error: {0}")]
    ParseError(String),

    /// A payload's own `verify` rejected it
    #[error("payload of type {0} failed verification")]
    VerifyError(PayloadType),

    /// Payload disallowed for this message, or multiplicity out of range
    #[error("payload of type {0} not supported here")]
    NotSupported(PayloadType),

    /// Rule lookup failed for the current (exchange, direction)
    #[error("no message rule found")]
    NotFound,

    /// Rule requires encrypted content but the payload layout violates the
    /// single-envelope-last invariant
    #[error("encrypted content required but payload layout is invalid: {0}")]
    Failed(&'static str),
}

impl From<UnparseableParameter> for IsakmpError {
    fn from(value: UnparseableParameter) -> Self {
        IsakmpError::ParseError(format!("unparseable parameter: {value:?}"))
    }
}

/// Convenience alias for results of core operations
pub type Result<T> = std::result::Result<T, IsakmpError>;
