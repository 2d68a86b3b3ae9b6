//! Engine identifiers and the storage keys derived from them

use crate::error::{VaultError, VaultResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

// ASCII word characters only, as in the host's generic name pattern
static ENGINE_NAME: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_](([A-Za-z0-9_.-]+)?[A-Za-z0-9_])?$"));

const CONFIG_PREFIX: &str = "config/";
const PRIVATE_KEY_PREFIX: &str = "private_key";
const PUBLIC_KEY_PREFIX: &str = "public_key";

/// Validated engine name
///
/// ASCII letters, digits and `_`, with `.` and `-` allowed in the interior.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EngineId(String);

impl EngineId {
    /// Validate `name` as an engine id
    pub fn new(name: impl Into<String>) -> VaultResult<Self> {
        let name = name.into();
        let pattern = ENGINE_NAME
            .as_ref()
            .map_err(|e| VaultError::Internal(format!("engine name pattern: {e}")))?;
        if pattern.is_match(&name) {
            Ok(Self(name))
        } else {
            Err(VaultError::InvalidPath(format!(
                "'{name}' is not a valid engine name"
            )))
        }
    }

    /// Extract the engine id from a request path such as `config/payments`
    ///
    /// The path must have exactly two segments; the second is the id.
    pub fn from_path(path: &str) -> VaultResult<Self> {
        let mut segments = path.split('/');
        match (segments.next(), segments.next(), segments.next()) {
            (Some(prefix), Some(name), None) if !prefix.is_empty() => Self::new(name),
            _ => Err(VaultError::InvalidPath(path.to_string())),
        }
    }

    /// The id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key of the config record
    pub fn config_key(&self) -> String {
        format!("{CONFIG_PREFIX}{}", self.0)
    }

    /// Key of the private key envelope
    pub fn private_key_key(&self) -> String {
        format!("{PRIVATE_KEY_PREFIX}{}", self.0)
    }

    /// Key of the public key envelope
    pub fn public_key_key(&self) -> String {
        format!("{PUBLIC_KEY_PREFIX}{}", self.0)
    }
}

impl fmt::Display for EngineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EngineId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EngineId {
    type Error = VaultError;

    fn try_from(value: String) -> VaultResult<Self> {
        Self::new(value)
    }
}

impl From<EngineId> for String {
    fn from(id: EngineId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        for name in ["a", "payments", "team-1.signer", "a_b", "x9"] {
            assert!(EngineId::new(name).is_ok(), "{name} should be valid");
        }
        assert!(EngineId::new("a".repeat(120)).is_ok());
    }

    #[test]
    fn test_invalid_names() {
        for name in ["", "-lead", "trail.", "has space", "a/b", "bücher", "ünïcode", "名前"] {
            assert!(EngineId::new(name).is_err(), "{name:?} should be rejected");
        }
    }

    #[test]
    fn test_from_path_takes_second_segment() {
        let id = EngineId::from_path("config/payments").unwrap();
        assert_eq!(id.as_str(), "payments");

        assert!(EngineId::from_path("config").is_err());
        assert!(EngineId::from_path("config/").is_err());
        assert!(EngineId::from_path("config/a/b").is_err());
        assert!(EngineId::from_path("/payments").is_err());
    }

    #[test]
    fn test_storage_keys() {
        let id = EngineId::new("payments").unwrap();
        assert_eq!(id.config_key(), "config/payments");
        assert_eq!(id.private_key_key(), "private_keypayments");
        assert_eq!(id.public_key_key(), "public_keypayments");
    }

    #[test]
    fn test_serde_validates() {
        let id: EngineId = serde_json::from_str("\"payments\"").unwrap();
        assert_eq!(id.to_string(), "payments");
        assert!(serde_json::from_str::<EngineId>("\"bad name\"").is_err());
    }
}
