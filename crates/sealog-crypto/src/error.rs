//! Cryptographic error types.

use thiserror::Error;

/// Errors that can occur during hashing and key handling.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// A value could not be put into canonical form.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Key material is too short.
    #[error("invalid key length: expected at least {minimum} bytes, got {actual}")]
    InvalidKeyLength {
        /// Minimum length in bytes.
        minimum: usize,
        /// Actual length in bytes.
        actual: usize,
    },

    /// Invalid hex encoding.
    #[error("invalid hex encoding")]
    InvalidHexEncoding,

    /// I/O error (e.g. reading/writing key files).
    #[error("I/O error: {0}")]
    IoError(String),
}

/// Result type for cryptographic operations.
pub type CryptoResult<T> = Result<T, CryptoError>;
