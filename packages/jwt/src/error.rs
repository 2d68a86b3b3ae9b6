//! JWT error types

use std::fmt;

/// JWT operation result type
pub type JwtResult<T> = Result<T, JwtError>;

/// JWT error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JwtError {
    /// Invalid JWT format
    InvalidToken(String),
    /// Invalid signature
    InvalidSignature,
    /// Token has expired
    TokenExpired,
    /// Invalid issuer
    InvalidIssuer,
    /// Invalid audience
    InvalidAudience,
    /// Unsupported algorithm
    UnsupportedAlgorithm(String),
    /// Serialization failed
    Serialization(String),
    /// Invalid claims configuration
    InvalidClaims(String),
}

impl fmt::Display for JwtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JwtError::InvalidToken(msg) => write!(f, "Invalid JWT token: {msg}"),
            JwtError::InvalidSignature => write!(f, "Invalid JWT signature"),
            JwtError::TokenExpired => write!(f, "JWT token has expired"),
            JwtError::InvalidIssuer => write!(f, "Invalid JWT issuer"),
            JwtError::InvalidAudience => write!(f, "Invalid JWT audience"),
            JwtError::UnsupportedAlgorithm(alg) => write!(f, "Unsupported algorithm: {alg}"),
            JwtError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            JwtError::InvalidClaims(msg) => write!(f, "Invalid claims: {msg}"),
        }
    }
}

impl std::error::Error for JwtError {}

impl JwtError {
    /// Create an invalid token error
    #[inline]
    #[must_use]
    pub fn invalid_token(msg: &str) -> Self {
        JwtError::InvalidToken(msg.to_string())
    }

    /// Create a serialization error
    #[inline]
    #[must_use]
    pub fn serialization(msg: &str) -> Self {
        JwtError::Serialization(msg.to_string())
    }

    /// Create an invalid claims error
    #[inline]
    #[must_use]
    pub fn invalid_claims(msg: &str) -> Self {
        JwtError::InvalidClaims(msg.to_string())
    }
}
