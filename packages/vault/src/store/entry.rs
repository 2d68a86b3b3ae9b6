//! JSON storage entries
//!
//! Structured records are stored as `{"key": <storage key>, "value": <record>}`
//! so a value copied under the wrong key is detectable on read.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A record together with the key it was written under
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageEntry {
    /// Storage key
    pub key: String,
    /// Serialized record
    pub value: serde_json::Value,
}

impl StorageEntry {
    /// Serialize `record` into an entry for `key`
    pub fn json<T: Serialize>(key: impl Into<String>, record: &T) -> serde_json::Result<Self> {
        Ok(Self {
            key: key.into(),
            value: serde_json::to_value(record)?,
        })
    }

    /// Bytes written to the store
    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    /// Parse stored bytes
    pub fn from_bytes(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    /// Decode the wrapped record
    pub fn decode_json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        T::deserialize(&self.value)
    }
}
