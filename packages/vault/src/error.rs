use crate::store::StoreError;
use jwks_jwt::JwtError;
use jwks_key::KeyError;

#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("Invalid field '{field}': {message}")]
    Validation { field: String, message: String },
    #[error("No such engine: {engine_id}")]
    NotFound { engine_id: String },
    #[error("Corrupt data for engine {engine_id}: {message}")]
    CorruptData { engine_id: String, message: String },
    #[error("User {caller} does not have access to engine {engine_id}")]
    AccessDenied { caller: String, engine_id: String },
    #[error("Storage error for engine {engine_id}: {source}")]
    Storage {
        engine_id: String,
        #[source]
        source: StoreError,
    },
    #[error("Crypto error for engine {engine_id}: {source}")]
    Crypto {
        engine_id: String,
        #[source]
        source: KeyError,
    },
    #[error("Token error for engine {engine_id}: {source}")]
    Token {
        engine_id: String,
        #[source]
        source: JwtError,
    },
    #[error("Invalid path: {0}")]
    InvalidPath(String),
    #[error("Operation not supported: {0}")]
    UnsupportedOperation(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl VaultError {
    /// Create a validation error for a payload field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        VaultError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(engine_id: impl Into<String>) -> Self {
        VaultError::NotFound {
            engine_id: engine_id.into(),
        }
    }

    /// Create a corrupt data error
    pub fn corrupt(engine_id: impl Into<String>, message: impl Into<String>) -> Self {
        VaultError::CorruptData {
            engine_id: engine_id.into(),
            message: message.into(),
        }
    }

    /// Create an access denied error; carries no configuration content
    pub fn access_denied(caller: impl Into<String>, engine_id: impl Into<String>) -> Self {
        VaultError::AccessDenied {
            caller: caller.into(),
            engine_id: engine_id.into(),
        }
    }

    /// Wrap a store failure with the engine it happened on
    pub fn storage(engine_id: impl Into<String>, source: StoreError) -> Self {
        VaultError::Storage {
            engine_id: engine_id.into(),
            source,
        }
    }

    /// Wrap a key generation or decoding failure
    pub fn crypto(engine_id: impl Into<String>, source: KeyError) -> Self {
        VaultError::Crypto {
            engine_id: engine_id.into(),
            source,
        }
    }

    /// Wrap a token signing or verification failure
    pub fn token(engine_id: impl Into<String>, source: JwtError) -> Self {
        VaultError::Token {
            engine_id: engine_id.into(),
            source,
        }
    }

    /// Whether retrying the same call could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, VaultError::Storage { .. })
    }
}

pub type VaultResult<T> = Result<T, VaultError>;
