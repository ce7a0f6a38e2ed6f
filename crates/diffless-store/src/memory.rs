use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::error::StoreResult;
use crate::layout::{first_segment, Addressing};
use crate::traits::CacheBackend;

/// In-memory cache backend.
///
/// Intended for tests and embedding. Mirrors [`FileStore`](crate::FileStore)
/// semantics, including the hierarchical delete that removes every key
/// sharing the deleted key's first segment.
pub struct InMemoryStore {
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
    addressing: Addressing,
}

impl InMemoryStore {
    /// Create a new empty flat-addressed store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            addressing: Addressing::Flat,
        }
    }

    /// Create a new empty store with the given addressing.
    ///
    /// Rejects the same addressing schemes as [`FileStore`](crate::FileStore).
    pub fn with_addressing(addressing: Addressing) -> StoreResult<Self> {
        addressing.validate()?;
        Ok(Self {
            entries: RwLock::new(BTreeMap::new()),
            addressing,
        })
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> usize {
        self.entries.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().expect("lock poisoned").is_empty()
    }

    /// All keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.entries
            .read()
            .expect("lock poisoned")
            .keys()
            .cloned()
            .collect()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheBackend for InMemoryStore {
    fn read_entry(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.read().expect("lock poisoned").get(key).cloned()
    }

    fn write_entry(&self, key: &str, value: &[u8]) -> bool {
        self.entries
            .write()
            .expect("lock poisoned")
            .insert(key.to_owned(), value.to_vec());
        true
    }

    fn delete_entry(&self, key: &str) -> bool {
        let mut map = self.entries.write().expect("lock poisoned");
        match &self.addressing {
            Addressing::Flat => map.remove(key).is_some(),
            Addressing::Hierarchical { delimiter } => {
                if !map.contains_key(key) {
                    return false;
                }
                let target = first_segment(key, delimiter);
                map.retain(|k, _| first_segment(k, delimiter) != target);
                true
            }
        }
    }

    fn clear(&self) -> bool {
        self.entries.write().expect("lock poisoned").clear();
        true
    }
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("entry_count", &self.len())
            .field("addressing", &self.addressing)
            .finish()
    }
}
