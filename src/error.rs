use std::{io, time::Duration};

use thiserror::Error;

use crate::pinging::mc_modern::helpers::ProtocolError;

/// Every way a ping or a vote can fail.
///
/// Callers get one of these as a value for every failure path, so a wrapping
/// handler can always produce a well-formed response.
#[derive(Error, Debug)]
pub enum Error {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("connection error: {0}")]
    Connection(#[source] io::Error),

    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("encryption error: {0}")]
    Encryption(#[from] EncryptionError),
}

/// Coarse classification of an [`Error`], for logging and response mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Connection,
    Timeout,
    Protocol,
    Encryption,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::Connection(_) => ErrorKind::Connection,
            Error::Timeout(_) => ErrorKind::Timeout,
            Error::Protocol(_) => ErrorKind::Protocol,
            Error::Encryption(_) => ErrorKind::Encryption,
        }
    }

    /// Whether repeating the same call later could succeed.
    ///
    /// Validation and encryption failures need the input or the stored key
    /// fixed first.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Connection | ErrorKind::Timeout | ErrorKind::Protocol
        )
    }
}

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("address {0:?} is not an allowed public IPv4 address")]
    DisallowedAddress(String),

    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("invalid field `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("malformed request body: {0}")]
    MalformedBody(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum EncryptionError {
    #[error("invalid public key: {0}")]
    InvalidKey(String),

    #[error("failed to serialize vote payload")]
    Payload(#[from] serde_json::Error),

    #[error("RSA encryption failed: {0}")]
    EncryptionFailed(#[from] rsa::Error),
}
