//! Configuration store abstraction
//!
//! Engines persist three flat string keys per engine id through a
//! [`ConfigStore`]. The store knows nothing about engines; the key layout
//! is a convention of the callers (see [`crate::engine::EngineId`]).

mod entry;
mod file;
mod memory;

pub use entry::StorageEntry;
pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by store implementations
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem or device failure on a key
    #[error("IO error on key '{key}': {source}")]
    Io {
        /// Storage key the operation was for
        key: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Any other backend failure
    #[error("Backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Create a backend error
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    pub(crate) fn io(key: &str, source: std::io::Error) -> Self {
        Self::Io {
            key: key.to_string(),
            source,
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Key/value storage used by the engine manager
///
/// Implementations must be safe for concurrent use. Each call is atomic
/// per key; nothing spans multiple keys.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Fetch the value stored under `key`
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous value
    async fn put(&self, key: &str, value: Vec<u8>) -> StoreResult<()>;

    /// Remove `key`; removing a missing key succeeds
    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// Whether `key` currently holds a value
    async fn exists(&self, key: &str) -> StoreResult<bool> {
        Ok(self.get(key).await?.is_some())
    }
}
