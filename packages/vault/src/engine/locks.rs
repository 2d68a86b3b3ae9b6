//! Per-engine operation locks
//!
//! Multi-step sequences on the same engine id (write, rotate, delete,
//! repair) take the engine's mutex so their store writes never interleave.
//! Different ids use different mutexes. Entries are dropped from the table
//! once nobody holds or waits on them.

use super::id::EngineId;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Table of per-engine async mutexes
#[derive(Debug)]
pub struct EngineLocks {
    enabled: bool,
    table: DashMap<String, Arc<Mutex<()>>>,
}

impl EngineLocks {
    /// Create a lock table; when `enabled` is false every acquire is a no-op
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            table: DashMap::new(),
        }
    }

    /// Whether acquires actually serialize
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Wait for exclusive access to `id`
    pub async fn acquire(&self, id: &EngineId) -> EngineGuard<'_> {
        if !self.enabled {
            return EngineGuard {
                locks: self,
                key: String::new(),
                guard: None,
            };
        }

        let mutex = self
            .table
            .entry(id.as_str().to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let guard = mutex.lock_owned().await;
        EngineGuard {
            locks: self,
            key: id.as_str().to_string(),
            guard: Some(guard),
        }
    }

    /// Number of engines with a live lock entry
    pub fn active(&self) -> usize {
        self.table.len()
    }
}

impl Default for EngineLocks {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Exclusive access to one engine, released on drop
pub struct EngineGuard<'a> {
    locks: &'a EngineLocks,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for EngineGuard<'_> {
    fn drop(&mut self) {
        if self.guard.take().is_some() {
            self.locks
                .table
                .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_entries_removed_after_release() {
        let locks = EngineLocks::default();
        let id = EngineId::new("alpha").unwrap();
        {
            let _guard = locks.acquire(&id).await;
            assert_eq!(locks.active(), 1);
        }
        assert_eq!(locks.active(), 0);
    }

    #[tokio::test]
    async fn test_same_id_is_serialized() {
        let locks = Arc::new(EngineLocks::default());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let locks = locks.clone();
            let inside = inside.clone();
            let max_inside = max_inside.clone();
            handles.push(tokio::spawn(async move {
                let id = EngineId::new("alpha").unwrap();
                let _guard = locks.acquire(&id).await;
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                max_inside.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(2)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
        assert_eq!(locks.active(), 0);
    }

    #[tokio::test]
    async fn test_different_ids_do_not_block() {
        let locks = EngineLocks::default();
        let a = EngineId::new("a").unwrap();
        let b = EngineId::new("b").unwrap();

        let _first = locks.acquire(&a).await;
        let second = tokio::time::timeout(Duration::from_secs(1), locks.acquire(&b)).await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn test_disabled_table_never_blocks() {
        let locks = EngineLocks::new(false);
        let id = EngineId::new("a").unwrap();

        let _first = locks.acquire(&id).await;
        let second = tokio::time::timeout(Duration::from_secs(1), locks.acquire(&id)).await;
        assert!(second.is_ok());
        assert_eq!(locks.active(), 0);
    }
}
