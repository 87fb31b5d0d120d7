//! Three independent name-keyed read-write lock registries: by PDF checksum,
//! by page identifier, by document identifier. Each registry lazily creates
//! a lock on first lookup and never evicts. A coarse lock guards the map
//! itself; the per-key lock is what callers actually hold.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

/// A lazily-populated registry of per-key read-write locks.
#[derive(Default)]
pub struct LockerRegistry {
    locks: Mutex<HashMap<String, Arc<RwLock<()>>>>,
}

impl LockerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the lock for `key`, creating it if this is the first lookup.
    pub async fn get(&self, key: &str) -> Arc<RwLock<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(())))
            .clone()
    }
}

/// The three named locker registries used across the pipeline.
#[derive(Default)]
pub struct Lockers {
    pub checksum: LockerRegistry,
    pub page: LockerRegistry,
    pub document: LockerRegistry,
}

impl Lockers {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_key_returns_same_lock() {
        let registry = LockerRegistry::new();
        let a = registry.get("doc-1").await;
        let b = registry.get("doc-1").await;
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn different_keys_return_different_locks() {
        let registry = LockerRegistry::new();
        let a = registry.get("doc-1").await;
        let b = registry.get("doc-2").await;
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn document_lock_is_exclusive() {
        let lockers = Lockers::new();
        let lock = lockers.document.get("doc-1").await;
        let _guard = lock.write().await;
        assert!(lock.try_read().is_err());
    }
}
