//! Error handling for key generation and envelope decoding

use thiserror::Error;

/// Key-specific errors
#[derive(Debug, Error)]
pub enum KeyError {
    /// Key generation error occurred
    #[error("Key generation error: {0}")]
    KeyGeneration(String),

    /// Requested RSA modulus size is not supported
    #[error("Unsupported key size: {actual} bits (supported: {supported})")]
    UnsupportedKeySize {
        /// Requested size in bits
        actual: u32,
        /// Human readable list of accepted sizes
        supported: &'static str,
    },

    /// Key material could not be encoded into an envelope
    #[error("Key encoding error: {0}")]
    Encoding(String),

    /// Envelope bytes are not a usable key
    #[error("Invalid key format: {0}")]
    InvalidKeyFormat(String),

    /// Envelope carries a different key type than requested
    #[error("Envelope type mismatch: expected {expected}, found {found}")]
    EnvelopeMismatch {
        /// PEM tag that was expected
        expected: &'static str,
        /// PEM tag that was found
        found: String,
    },
}

impl KeyError {
    /// Create an invalid key format error
    pub fn invalid_format(msg: impl Into<String>) -> Self {
        Self::InvalidKeyFormat(msg.into())
    }
}

/// Result type for key operations
pub type Result<T> = std::result::Result<T, KeyError>;
