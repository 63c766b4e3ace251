//! In-memory tile registry.
//!
//! Maps keys to memoized [`Tile`] records. `DashMap` sharding keeps lookup
//! concurrent; the `entry` API makes creation atomic, so at most one record
//! ever exists per key. Entries are never evicted; memory grows with the
//! set of distinct keys served, which is acceptable for bounded tile
//! pyramids and a known gap otherwise.

use std::sync::Arc;

use dashmap::DashMap;

use crate::key::TileKey;
use crate::resolver::{Strategy, Tile};
use crate::store::DiskStore;

/// Registry of resolved and in-progress tiles for one adapter.
#[derive(Default)]
pub struct TileRegistry {
    tiles: DashMap<TileKey, Arc<Tile>>,
}

impl TileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the record for a key, creating it on first sight.
    ///
    /// `strategy` is only invoked when the key is new; concurrent callers
    /// for the same key all receive the same record.
    pub fn get_or_create(
        &self,
        key: TileKey,
        store: &DiskStore,
        strategy: impl FnOnce() -> Strategy,
    ) -> Arc<Tile> {
        self.tiles
            .entry(key)
            .or_insert_with(|| Arc::new(Tile::new(key, strategy(), store.clone())))
            .clone()
    }

    /// Number of keys the registry has seen.
    pub fn entry_count(&self) -> usize {
        self.tiles.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn local_strategy() -> Strategy {
        Strategy::Local {
            path: PathBuf::from("/tiles/1/2/3.png"),
        }
    }

    #[test]
    fn test_same_key_returns_same_record() {
        let registry = TileRegistry::new();
        let store = DiskStore::new();
        let a = registry.get_or_create(TileKey::new(1, 2, 3), &store, local_strategy);
        let b = registry.get_or_create(TileKey::new(1, 2, 3), &store, local_strategy);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.entry_count(), 1);
    }

    #[test]
    fn test_distinct_keys_get_distinct_records() {
        let registry = TileRegistry::new();
        let store = DiskStore::new();
        let a = registry.get_or_create(TileKey::new(1, 2, 3), &store, local_strategy);
        let b = registry.get_or_create(TileKey::new(1, 2, 4), &store, local_strategy);
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(registry.entry_count(), 2);
    }

    #[test]
    fn test_strategy_factory_runs_once_per_key() {
        let registry = TileRegistry::new();
        let store = DiskStore::new();
        let created = AtomicUsize::new(0);
        for _ in 0..5 {
            registry.get_or_create(TileKey::new(7, 7, 7), &store, || {
                created.fetch_add(1, Ordering::SeqCst);
                local_strategy()
            });
        }
        assert_eq!(created.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_get_or_create_single_record() {
        let registry = Arc::new(TileRegistry::new());
        let store = DiskStore::new();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let registry = Arc::clone(&registry);
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                registry.get_or_create(TileKey::new(3, 3, 3), &store, local_strategy)
            }));
        }

        let first = handles.remove(0).await.unwrap();
        for handle in handles {
            assert!(Arc::ptr_eq(&first, &handle.await.unwrap()));
        }
        assert_eq!(registry.entry_count(), 1);
    }
}
