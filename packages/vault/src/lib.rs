//! # JWKS Vault Engines
//!
//! Named signing identities ("engines") for a secret store. Each engine
//! owns an RSA key pair, a claims policy (issuer, audience, TTL) and the
//! list of subjects allowed to read it.
//!
//! ```rust,no_run
//! use jwks_vault::{EngineConfigPayload, EngineId, EngineManager, MemoryStore};
//! use jwks_key::RsaKeyGenerator;
//! use std::sync::Arc;
//!
//! # async fn demo() -> jwks_vault::VaultResult<()> {
//! let manager = EngineManager::new(Arc::new(MemoryStore::new()), Arc::new(RsaKeyGenerator::new()));
//! let id = EngineId::new("payments")?;
//!
//! manager.write(&id, EngineConfigPayload::new(["bob"], "vault", "vault", 3600)?).await?;
//! let config = manager.read(&id, "bob").await?;
//! assert_eq!(config.allowed_subjects, vec!["bob"]);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod backend;
pub mod config;
pub mod engine;
pub mod error;
pub mod store;

pub use auth::{AccessPolicy, ROOT_IDENTITY, is_authorized};
pub use backend::{EngineBackend, Operation, Request, Response};
pub use config::{EngineSettings, KeyPolicy};
pub use engine::{
    DeleteOutcome, DeleteReport, DeleteStatus, EngineConfig, EngineConfigPayload, EngineHealth,
    EngineId, EngineManager,
};
pub use error::{VaultError, VaultResult};
pub use store::{ConfigStore, FileStore, MemoryStore, StorageEntry, StoreError, StoreResult};
