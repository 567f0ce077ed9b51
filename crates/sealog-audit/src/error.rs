//! Event log error types.

use sealog_crypto::CryptoError;
use thiserror::Error;

/// Errors that can occur while appending or reading events.
///
/// Integrity mismatches are not errors: they are reported as results in a
/// [`VerificationReport`](crate::VerificationReport).
#[derive(Debug, Error)]
pub enum AuditError {
    /// Malformed input to append. Not retried automatically.
    #[error("validation error: {0}")]
    Validation(String),

    /// Canonicalization or (de)serialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Opaque failure from the storage collaborator.
    #[error("storage error: {0}")]
    Storage(String),

    /// Key handling error.
    #[error("crypto error: {0}")]
    Crypto(CryptoError),
}

impl From<CryptoError> for AuditError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::Serialization(msg) => Self::Serialization(msg),
            other => Self::Crypto(other),
        }
    }
}

impl From<serde_json::Error> for AuditError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for event log operations.
pub type AuditResult<T> = Result<T, AuditError>;
