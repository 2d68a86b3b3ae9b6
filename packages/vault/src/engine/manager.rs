//! Engine lifecycle manager
//!
//! The manager is the only writer of an engine's three records:
//!
//! - `config/<id>`: JSON [`StorageEntry`] wrapping the [`EngineConfig`]
//! - `private_key<id>`: PEM `RSA PRIVATE KEY`
//! - `public_key<id>`: PEM `RSA PUBLIC KEY`
//!
//! Writes store the private key, then the public key, then the config, so
//! a config record is only ever visible once both keys are in place.
//! Nothing here is transactional; partial states left by a failed store
//! call are reported by [`EngineManager::inspect`] and fixed by
//! [`EngineManager::repair`].

use super::config::EngineConfig;
use super::id::EngineId;
use super::locks::EngineLocks;
use super::payload::EngineConfigPayload;
use super::report::{DeleteReport, DeleteStatus, EngineHealth};
use crate::auth::AccessPolicy;
use crate::config::{EngineSettings, KeyPolicy};
use crate::error::{VaultError, VaultResult};
use crate::store::{ConfigStore, StorageEntry};
use chrono::TimeDelta;
use jwks_common::{LoggingTransformer, log_security_event};
use jwks_jwt::{Claims, ClaimsBuilder, Validation};
use jwks_key::{JwkSet, KeyEnvelope, KeyPair, KeyPairGenerator, KeySize, RsaJwk, RsaKeyGenerator};
use log::{debug, info, warn};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

/// Orchestrates create, read, update and delete of engines
pub struct EngineManager {
    store: Arc<dyn ConfigStore>,
    generator: Arc<dyn KeyPairGenerator>,
    policy: AccessPolicy,
    key_size: KeySize,
    key_policy: KeyPolicy,
    locks: EngineLocks,
}

impl EngineManager {
    /// Manager with default policy, key size and rotate-on-write keys
    pub fn new(store: Arc<dyn ConfigStore>, generator: Arc<dyn KeyPairGenerator>) -> Self {
        Self {
            store,
            generator,
            policy: AccessPolicy::default(),
            key_size: KeySize::DEFAULT,
            key_policy: KeyPolicy::default(),
            locks: EngineLocks::default(),
        }
    }

    /// Build a manager from validated settings, opening the configured store
    pub async fn from_settings(settings: &EngineSettings) -> VaultResult<Self> {
        settings.validate()?;
        let store = settings.open_store().await?;
        Ok(Self::new(store, Arc::new(RsaKeyGenerator::new()))
            .with_key_size(settings.key_size()?)
            .with_key_policy(settings.key_policy)
            .with_policy(AccessPolicy::with_privileged_identities(
                settings.privileged_identities.iter().cloned(),
            ))
            .with_serialized_operations(settings.serialize_engine_operations))
    }

    /// Replace the authorization policy
    pub fn with_policy(mut self, policy: AccessPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Size of generated keys
    pub fn with_key_size(mut self, key_size: KeySize) -> Self {
        self.key_size = key_size;
        self
    }

    /// Key handling on update
    pub fn with_key_policy(mut self, key_policy: KeyPolicy) -> Self {
        self.key_policy = key_policy;
        self
    }

    /// Turn per-engine serialization on or off
    pub fn with_serialized_operations(mut self, enabled: bool) -> Self {
        self.locks = EngineLocks::new(enabled);
        self
    }

    /// Authorization policy in use
    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    /// Whether a config record exists for `id`
    pub async fn exists(&self, id: &EngineId) -> VaultResult<bool> {
        self.store
            .exists(&id.config_key())
            .await
            .map_err(|e| VaultError::storage(id.as_str(), e))
    }

    /// Create or update an engine from raw request data
    pub async fn write_value(&self, id: &EngineId, data: &Value) -> VaultResult<EngineConfig> {
        let payload = EngineConfigPayload::from_value(data)?;
        self.write(id, payload).await
    }

    /// Create or update an engine
    ///
    /// Under [`KeyPolicy::RotateOnWrite`] a fresh key pair is generated on
    /// every call. Under [`KeyPolicy::PreserveOnUpdate`] an existing intact
    /// pair is kept and only the config record is replaced.
    pub async fn write(
        &self,
        id: &EngineId,
        payload: EngineConfigPayload,
    ) -> VaultResult<EngineConfig> {
        let _guard = self.locks.acquire(id).await;
        let config = payload.into_config(id);

        let reuse_keys = match self.key_policy {
            KeyPolicy::RotateOnWrite => false,
            KeyPolicy::PreserveOnUpdate => {
                self.exists(id).await? && self.has_intact_keys(id).await?
            }
        };

        if reuse_keys {
            debug!("Keeping existing key pair for engine {id}");
        } else {
            let pair = self.generate_pair(id).await?;
            self.store_pair(id, &pair).await?;
        }

        let entry = StorageEntry::json(id.config_key(), &config)?;
        self.put(id, &id.config_key(), entry.to_bytes()?).await?;

        info!("Engine {id} configured ({} allowed subjects)", config.allowed_subjects.len());
        Ok(config)
    }

    /// Read an engine's config as `caller`
    pub async fn read(&self, id: &EngineId, caller: &str) -> VaultResult<EngineConfig> {
        let config = self.load_config(id).await?;
        self.authorize(id, caller, &config)?;
        Ok(config)
    }

    /// Delete an engine's records
    ///
    /// Each key is deleted independently, private key first and config
    /// last. Failures are collected into the report; nothing is rolled back
    /// and deleting an unknown engine succeeds.
    pub async fn delete(&self, id: &EngineId) -> DeleteReport {
        let _guard = self.locks.acquire(id).await;
        let mut report = DeleteReport::new(id.clone());

        for key in [id.private_key_key(), id.public_key_key(), id.config_key()] {
            let status = match self.store.delete(&key).await {
                Ok(()) => DeleteStatus::Deleted,
                Err(e) => {
                    warn!("Failed to delete {} for engine {id}: {e}", LoggingTransformer::secure_hash_key(&key));
                    DeleteStatus::Failed {
                        error: e.to_string(),
                    }
                }
            };
            LoggingTransformer::log_store_operation("delete", &key, status == DeleteStatus::Deleted);
            report.record(key, status);
        }

        log_security_event(
            "ENGINE_DELETE",
            &format!("engine={id} failures={}", report.failures().count()),
            report.is_complete(),
        );
        report
    }

    /// Replace the key pair of a configured engine, keeping its config
    pub async fn rotate_keys(&self, id: &EngineId) -> VaultResult<RsaJwk> {
        let _guard = self.locks.acquire(id).await;
        if !self.exists(id).await? {
            return Err(VaultError::not_found(id.as_str()));
        }

        let pair = self.generate_pair(id).await?;
        self.store_pair(id, &pair).await?;

        let jwk = RsaJwk::from_public_envelope(pair.public())
            .map_err(|e| VaultError::crypto(id.as_str(), e))?;
        log_security_event("KEY_ROTATION", &format!("engine={id} kid={}", jwk.kid), true);
        Ok(jwk)
    }

    /// The engine's public key as a JWK set, for authorized callers
    pub async fn public_jwks(&self, id: &EngineId, caller: &str) -> VaultResult<JwkSet> {
        let config = self.load_config(id).await?;
        self.authorize(id, caller, &config)?;

        let public = self.load_envelope(id, &id.public_key_key()).await?;
        let jwk = RsaJwk::from_public_envelope(&public)
            .map_err(|e| VaultError::corrupt(id.as_str(), format!("public key: {e}")))?;
        Ok(JwkSet::single(jwk))
    }

    /// Issue an RS256 token for `caller`, signed with the engine's key
    ///
    /// `sub` is the caller, `iss`/`aud` come from the config and the token
    /// expires `TTL` seconds after issue.
    pub async fn issue_token(&self, id: &EngineId, caller: &str) -> VaultResult<String> {
        let config = self.load_config(id).await?;
        self.authorize(id, caller, &config)?;

        let pair = self.load_pair(id).await?;
        let private_key = pair
            .private()
            .to_private_key()
            .map_err(|e| VaultError::corrupt(id.as_str(), format!("private key: {e}")))?;
        let jwk = RsaJwk::from_public_envelope(pair.public())
            .map_err(|e| VaultError::corrupt(id.as_str(), format!("public key: {e}")))?;

        let ttl = i64::try_from(config.ttl)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX);

        let claims = ClaimsBuilder::new()
            .subject(caller)
            .valid_for(ttl)
            .issuer(config.issuer.as_str())
            .audience(config.audience.as_str())
            .jwt_id(uuid::Uuid::new_v4().to_string())
            .build();

        let token = jwks_jwt::encode(&claims, &private_key, Some(&jwk.kid))
            .map_err(|e| VaultError::token(id.as_str(), e))?;

        log_security_event(
            "TOKEN_ISSUED",
            &format!("engine={id} kid={}", jwk.kid),
            true,
        );
        Ok(token)
    }

    /// Verify a token against the engine's public key and claims policy
    pub async fn verify_token(&self, id: &EngineId, token: &str) -> VaultResult<Claims> {
        let config = self.load_config(id).await?;
        let public = self.load_envelope(id, &id.public_key_key()).await?;
        let public_key = public
            .to_public_key()
            .map_err(|e| VaultError::corrupt(id.as_str(), format!("public key: {e}")))?;

        let validation = Validation::new(config.issuer, config.audience);
        jwks_jwt::decode(token, &public_key, &validation).map_err(|e| {
            debug!("Token rejected for engine {id}: {e}");
            VaultError::token(id.as_str(), e)
        })
    }

    /// Report which records exist and whether the stored keys pair up
    pub async fn inspect(&self, id: &EngineId) -> VaultResult<EngineHealth> {
        let config = self.exists(id).await?;
        let private_key = self.key_exists(id, &id.private_key_key()).await?;
        let public_key = self.key_exists(id, &id.public_key_key()).await?;

        let health = EngineHealth::from_presence(config, private_key, public_key);
        if health != EngineHealth::Consistent {
            return Ok(health);
        }

        let config_decodes = match self.load_config(id).await {
            Ok(_) => true,
            Err(VaultError::CorruptData { .. }) => false,
            Err(e) => return Err(e),
        };
        let intact = config_decodes && self.has_intact_keys(id).await?;
        Ok(if intact {
            EngineHealth::Consistent
        } else {
            EngineHealth::Mismatched
        })
    }

    /// Bring an engine back to a consistent state
    ///
    /// With a config present, missing or mismatched keys are regenerated.
    /// Without one, orphaned key envelopes are deleted. A config record
    /// that fails to decode cannot be repaired and is reported as corrupt.
    pub async fn repair(&self, id: &EngineId) -> VaultResult<EngineHealth> {
        let _guard = self.locks.acquire(id).await;
        let before = self.inspect(id).await?;

        match before {
            EngineHealth::Absent | EngineHealth::Consistent => return Ok(before),
            EngineHealth::Partial { config: false, .. } => {
                for key in [id.private_key_key(), id.public_key_key()] {
                    self.store
                        .delete(&key)
                        .await
                        .map_err(|e| VaultError::storage(id.as_str(), e))?;
                }
                warn!("Removed orphaned key material for engine {id}");
            }
            EngineHealth::Partial { config: true, .. } | EngineHealth::Mismatched => {
                self.load_config(id).await?;
                let pair = self.generate_pair(id).await?;
                self.store_pair(id, &pair).await?;
                warn!("Regenerated key pair for engine {id}");
            }
        }

        let after = self.inspect(id).await?;
        log_security_event(
            "ENGINE_REPAIR",
            &format!("engine={id} before={before:?} after={after:?}"),
            after.is_healthy(),
        );
        Ok(after)
    }

    fn authorize(&self, id: &EngineId, caller: &str, config: &EngineConfig) -> VaultResult<()> {
        let granted = self.policy.is_authorized(caller, config);
        LoggingTransformer::log_access_decision(id.as_str(), caller, granted);
        if granted {
            Ok(())
        } else {
            Err(VaultError::access_denied(caller, id.as_str()))
        }
    }

    async fn load_config(&self, id: &EngineId) -> VaultResult<EngineConfig> {
        let raw = self
            .store
            .get(&id.config_key())
            .await
            .map_err(|e| VaultError::storage(id.as_str(), e))?
            .ok_or_else(|| VaultError::not_found(id.as_str()))?;

        let entry = StorageEntry::from_bytes(&raw)
            .map_err(|e| VaultError::corrupt(id.as_str(), format!("config entry: {e}")))?;
        if entry.key != id.config_key() {
            return Err(VaultError::corrupt(
                id.as_str(),
                format!("config entry was written for '{}'", entry.key),
            ));
        }

        let config: EngineConfig = entry
            .decode_json()
            .map_err(|e| VaultError::corrupt(id.as_str(), format!("config record: {e}")))?;
        if &config.id != id {
            return Err(VaultError::corrupt(
                id.as_str(),
                format!("config record belongs to engine '{}'", config.id),
            ));
        }
        Ok(config)
    }

    async fn load_envelope(&self, id: &EngineId, key: &str) -> VaultResult<KeyEnvelope> {
        let raw = self
            .store
            .get(key)
            .await
            .map_err(|e| VaultError::storage(id.as_str(), e))?
            .ok_or_else(|| VaultError::corrupt(id.as_str(), format!("{key} is missing")))?;

        KeyEnvelope::parse(&raw).map_err(|e| VaultError::corrupt(id.as_str(), format!("{key}: {e}")))
    }

    async fn load_pair(&self, id: &EngineId) -> VaultResult<KeyPair> {
        let private = self.load_envelope(id, &id.private_key_key()).await?;
        let public = self.load_envelope(id, &id.public_key_key()).await?;
        KeyPair::from_parts(private, public)
            .map_err(|e| VaultError::corrupt(id.as_str(), e.to_string()))
    }

    /// Missing or undecodable keys are `false`; store failures propagate
    async fn has_intact_keys(&self, id: &EngineId) -> VaultResult<bool> {
        match self.load_pair(id).await {
            Ok(pair) => Ok(pair.is_matching().unwrap_or(false)),
            Err(VaultError::CorruptData { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn key_exists(&self, id: &EngineId, key: &str) -> VaultResult<bool> {
        self.store
            .exists(key)
            .await
            .map_err(|e| VaultError::storage(id.as_str(), e))
    }

    async fn generate_pair(&self, id: &EngineId) -> VaultResult<KeyPair> {
        let generator = Arc::clone(&self.generator);
        let size = self.key_size;
        let started = Instant::now();

        let result = tokio::task::spawn_blocking(move || generator.generate(size))
            .await
            .map_err(|e| VaultError::Internal(format!("key generation task failed: {e}")))?;

        LoggingTransformer::log_performance_metric(
            "key_generation",
            u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            result.is_ok(),
        );

        match result {
            Ok(pair) => {
                log_security_event("KEY_GENERATION", &format!("engine={id} bits={size}"), true);
                Ok(pair)
            }
            Err(e) => {
                LoggingTransformer::log_crypto_error("key_generation", &e);
                log_security_event("KEY_GENERATION", &format!("engine={id} bits={size}"), false);
                Err(VaultError::crypto(id.as_str(), e))
            }
        }
    }

    async fn store_pair(&self, id: &EngineId, pair: &KeyPair) -> VaultResult<()> {
        self.put(id, &id.private_key_key(), pair.private().as_bytes().to_vec())
            .await?;
        self.put(id, &id.public_key_key(), pair.public().as_bytes().to_vec())
            .await
    }

    async fn put(&self, id: &EngineId, key: &str, value: Vec<u8>) -> VaultResult<()> {
        let result = self.store.put(key, value).await;
        LoggingTransformer::log_store_operation("put", key, result.is_ok());
        result.map_err(|e| VaultError::storage(id.as_str(), e))
    }
}

impl std::fmt::Debug for EngineManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineManager")
            .field("policy", &self.policy)
            .field("key_size", &self.key_size)
            .field("key_policy", &self.key_policy)
            .field("serialized", &self.locks.is_enabled())
            .finish_non_exhaustive()
    }
}
