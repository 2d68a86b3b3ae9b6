use crate::error::{VaultError, VaultResult};
use crate::store::{ConfigStore, FileStore, MemoryStore};
use jwks_key::KeySize;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

/// What happens to an engine's key pair when its config is updated
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyPolicy {
    /// Every write generates a fresh key pair
    #[default]
    RotateOnWrite,
    /// Updates keep an intact existing pair and only replace the config
    PreserveOnUpdate,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineSettings {
    #[serde(default = "default_key_bits")]
    pub key_bits: u32,
    #[serde(default)]
    pub key_policy: KeyPolicy,
    /// Identities that may read every engine
    #[serde(default = "default_privileged_identities")]
    pub privileged_identities: Vec<String>,
    /// Serialize multi-record operations per engine id
    #[serde(default = "default_serialize_engine_operations")]
    pub serialize_engine_operations: bool,
    /// Root of the file store; in-memory when unset
    #[serde(default)]
    pub storage_path: Option<PathBuf>,
}

fn default_key_bits() -> u32 {
    KeySize::DEFAULT.bits()
}

fn default_privileged_identities() -> Vec<String> {
    vec![crate::auth::ROOT_IDENTITY.to_string()]
}

fn default_serialize_engine_operations() -> bool {
    true
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            key_bits: default_key_bits(),
            key_policy: KeyPolicy::default(),
            privileged_identities: default_privileged_identities(),
            serialize_engine_operations: default_serialize_engine_operations(),
            storage_path: None,
        }
    }
}

impl EngineSettings {
    /// Load settings from a JSON file
    pub async fn load(path: impl AsRef<Path>) -> VaultResult<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read(path).await.map_err(|e| {
            VaultError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        let settings: Self = serde_json::from_slice(&raw).map_err(|e| {
            VaultError::Configuration(format!("invalid settings in {}: {e}", path.display()))
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the manager cannot run with
    pub fn validate(&self) -> VaultResult<()> {
        self.key_size()?;

        if self.privileged_identities.is_empty() {
            warn!("No privileged identities configured; only allow lists grant access");
        }
        if self.privileged_identities.iter().any(|id| id.is_empty()) {
            return Err(VaultError::Configuration(
                "privileged identities must not be empty strings".to_string(),
            ));
        }
        if !self.serialize_engine_operations {
            warn!("Per-engine serialization disabled; concurrent writes to one engine may interleave");
        }
        Ok(())
    }

    /// Configured key size
    pub fn key_size(&self) -> VaultResult<KeySize> {
        KeySize::new(self.key_bits).map_err(|e| VaultError::Configuration(e.to_string()))
    }

    /// Open the configured store
    pub async fn open_store(&self) -> VaultResult<Arc<dyn ConfigStore>> {
        match &self.storage_path {
            Some(path) => {
                let store = FileStore::open(path)
                    .await
                    .map_err(|e| VaultError::Configuration(e.to_string()))?;
                Ok(Arc::new(store))
            }
            None => Ok(Arc::new(MemoryStore::new())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        let settings: EngineSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.key_bits, 2048);
        assert_eq!(settings.key_policy, KeyPolicy::RotateOnWrite);
        assert_eq!(settings.privileged_identities, vec!["root"]);
        assert!(settings.serialize_engine_operations);
        assert!(settings.storage_path.is_none());
        settings.validate().unwrap();
    }

    #[test]
    fn test_key_policy_names() {
        let settings: EngineSettings =
            serde_json::from_str(r#"{"key_policy": "preserve_on_update"}"#).unwrap();
        assert_eq!(settings.key_policy, KeyPolicy::PreserveOnUpdate);
    }

    #[test]
    fn test_validate_rejects_odd_key_size() {
        let settings = EngineSettings {
            key_bits: 1000,
            ..Default::default()
        };
        assert!(matches!(settings.validate(), Err(VaultError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"key_bits": 3072, "privileged_identities": ["admin"], "storage_path": "/tmp/x"}"#,
        )
        .unwrap();

        let settings = EngineSettings::load(&path).await.unwrap();
        assert_eq!(settings.key_size().unwrap().bits(), 3072);
        assert_eq!(settings.privileged_identities, vec!["admin"]);
        assert_eq!(settings.storage_path, Some(PathBuf::from("/tmp/x")));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let err = EngineSettings::load("/definitely/not/here.json").await.unwrap_err();
        assert!(matches!(err, VaultError::Configuration(_)));
    }
}
