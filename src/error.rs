// src/error.rs
use std::fmt;

use thiserror::Error;

/// Fault codes Gandi answers with when the API key is malformed or unknown.
pub const INVALID_KEY_FAULT_CODES: [i64; 2] = [501237, 510150];

/// Structured remote error: numeric code plus human readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    pub code: i64,
    pub message: String,
}

impl Fault {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn is_invalid_key(&self) -> bool {
        INVALID_KEY_FAULT_CODES.contains(&self.code)
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Everything a single remote call can fail with.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("{0}")]
    Fault(Fault),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("endpoint answered with HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed XML-RPC response: {0}")]
    Malformed(String),

    #[error("{method} returned false")]
    Rejected { method: &'static str },
}

impl RpcError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        RpcError::Malformed(msg.into())
    }

    pub fn fault(&self) -> Option<&Fault> {
        match self {
            RpcError::Fault(fault) => Some(fault),
            _ => None,
        }
    }
}

impl From<Fault> for RpcError {
    fn from(fault: Fault) -> Self {
        RpcError::Fault(fault)
    }
}

impl From<quick_xml::Error> for RpcError {
    fn from(err: quick_xml::Error) -> Self {
        RpcError::Malformed(err.to_string())
    }
}

/// Outcome of the pre-flight key check when it does not succeed.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Your API key seems invalid")]
    Invalid(Fault),

    #[error(transparent)]
    Remote(RpcError),
}

impl From<RpcError> for CredentialError {
    fn from(err: RpcError) -> Self {
        match err {
            RpcError::Fault(fault) if fault.is_invalid_key() => CredentialError::Invalid(fault),
            other => CredentialError::Remote(other),
        }
    }
}
