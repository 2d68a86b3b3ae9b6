//! File store durability tests
//!
//! Engines written through a `FileStore` must survive dropping the manager
//! and reopening the directory, as they would across a process restart.

use jwks_key::{KeySize, RsaKeyGenerator};
use jwks_vault::{
    ConfigStore, EngineConfigPayload, EngineHealth, EngineId, EngineManager, EngineSettings,
    FileStore, KeyPolicy,
};
use std::sync::Arc;

async fn manager_at(path: &std::path::Path) -> EngineManager {
    let store = FileStore::open(path).await.unwrap();
    EngineManager::new(Arc::new(store), Arc::new(RsaKeyGenerator::new()))
        .with_key_size(KeySize::new(1024).unwrap())
}

#[tokio::test]
async fn test_engine_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let engine = EngineId::new("payments").unwrap();

    let (config, token) = {
        let manager = manager_at(dir.path()).await;
        let payload = EngineConfigPayload::new(["bob"], "vault", "vault", 3600).unwrap();
        let config = manager.write(&engine, payload).await.unwrap();
        let token = manager.issue_token(&engine, "bob").await.unwrap();
        (config, token)
    };

    let manager = manager_at(dir.path()).await;
    assert!(manager.exists(&engine).await.unwrap());
    assert_eq!(manager.read(&engine, "bob").await.unwrap(), config);
    assert_eq!(manager.inspect(&engine).await.unwrap(), EngineHealth::Consistent);
    assert_eq!(manager.verify_token(&engine, &token).await.unwrap().sub, "bob");
}

#[tokio::test]
async fn test_delete_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let engine = EngineId::new("payments").unwrap();

    {
        let manager = manager_at(dir.path()).await;
        manager
            .write(&engine, EngineConfigPayload::default())
            .await
            .unwrap();
        assert!(manager.delete(&engine).await.is_complete());
    }

    let manager = manager_at(dir.path()).await;
    assert!(!manager.exists(&engine).await.unwrap());
    assert_eq!(manager.inspect(&engine).await.unwrap(), EngineHealth::Absent);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_config_entry_layout_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let engine = EngineId::new("payments").unwrap();
    let manager = manager_at(dir.path()).await;
    manager
        .write(&engine, EngineConfigPayload::default())
        .await
        .unwrap();

    let store = FileStore::open(dir.path()).await.unwrap();
    let raw = store.get("config/payments").await.unwrap().unwrap();
    let json: serde_json::Value = serde_json::from_slice(&raw).unwrap();
    assert_eq!(json["key"], "config/payments");
    assert_eq!(json["value"]["Id"], "payments");
    assert_eq!(json["value"]["AllowedSubjects"], serde_json::json!(["vault"]));
    assert_eq!(json["value"]["TTL"], 3600);
}

#[tokio::test]
async fn test_long_engine_name_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let engine = EngineId::new("e".repeat(120)).unwrap();
    let manager = manager_at(dir.path()).await;

    let payload = EngineConfigPayload::new(["bob"], "vault", "vault", 60).unwrap();
    let config = manager.write(&engine, payload).await.unwrap();
    assert_eq!(manager.read(&engine, "bob").await.unwrap(), config);
    assert_eq!(manager.inspect(&engine).await.unwrap(), EngineHealth::Consistent);
    assert!(manager.issue_token(&engine, "bob").await.is_ok());

    assert!(manager.delete(&engine).await.is_complete());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_manager_from_settings_uses_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let settings = EngineSettings {
        key_bits: 1024,
        key_policy: KeyPolicy::PreserveOnUpdate,
        privileged_identities: vec!["admin".to_string()],
        serialize_engine_operations: true,
        storage_path: Some(dir.path().join("engines")),
    };

    let engine = EngineId::new("payments").unwrap();
    let manager = EngineManager::from_settings(&settings).await.unwrap();
    manager
        .write(&engine, EngineConfigPayload::new(Vec::<String>::new(), "i", "a", 1).unwrap())
        .await
        .unwrap();

    assert!(manager.read(&engine, "admin").await.is_ok());
    assert!(manager.read(&engine, "root").await.is_err());
    assert!(dir.path().join("engines").is_dir());
}
