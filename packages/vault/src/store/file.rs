//! Directory-backed store
//!
//! One file per key. Filenames are the hex SHA-256 digest of the key, so
//! every key, whatever its length or characters, maps to a flat file name of
//! fixed length. Writes go to a temp file that is renamed over the target.

use super::{ConfigStore, StoreError, StoreResult};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

const ENTRY_EXTENSION: &str = "entry";

/// [`ConfigStore`] persisting each key as a file under a root directory
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `root`
    pub async fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .map_err(|e| StoreError::io(&root.display().to_string(), e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o700);
            if let Err(e) = fs::set_permissions(&root, perms).await {
                tracing::warn!(path = %root.display(), error = %e, "Failed to restrict store directory permissions");
            }
        }

        tracing::debug!(path = %root.display(), "Opened file store");
        Ok(Self { root })
    }

    /// Root directory of the store
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.root
            .join(format!("{}.{}", hex::encode(digest), ENTRY_EXTENSION))
    }
}

#[async_trait]
impl ConfigStore for FileStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        match fs::read(self.entry_path(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(key, e)),
        }
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> StoreResult<()> {
        let path = self.entry_path(key);
        let temp_path = path.with_extension(format!("{}.tmp", uuid::Uuid::new_v4().simple()));

        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| StoreError::io(key, e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            if let Err(e) = fs::set_permissions(&temp_path, perms).await {
                tracing::warn!(key, error = %e, "Failed to restrict entry permissions");
            }
        }

        let written = async {
            file.write_all(&value).await?;
            file.sync_all().await
        }
        .await;
        drop(file);

        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path).await;
            return Err(StoreError::io(key, e));
        }

        if let Err(e) = fs::rename(&temp_path, &path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(StoreError::io(key, e));
        }

        tracing::trace!(key, bytes = value.len(), "Stored entry");
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        match fs::remove_file(self.entry_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(key, e)),
        }
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        fs::try_exists(self.entry_path(key))
            .await
            .map_err(|e| StoreError::io(key, e))
    }
}
