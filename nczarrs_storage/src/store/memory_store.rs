//! An in-memory store.

use std::collections::BTreeMap;

use parking_lot::Mutex;

use crate::{
    Bytes, MaybeBytes, ReadableStorageTraits, StorageError, StoreKey, StoreKeys, StorePrefix,
    WritableStorageTraits,
};

/// An in-memory store.
///
/// Values are kept in a key-ordered map, so [`MemoryStore::keys`] lists chunks in key order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<BTreeMap<StoreKey, Bytes>>,
}

impl MemoryStore {
    /// Create a new empty memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the number of values in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.lock().len()
    }

    /// Returns true if the store holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.lock().is_empty()
    }

    /// Return the keys under `prefix` in key order.
    #[must_use]
    pub fn keys(&self, prefix: &StorePrefix) -> StoreKeys {
        self.values
            .lock()
            .keys()
            .filter(|key| key.has_prefix(prefix))
            .cloned()
            .collect()
    }
}

impl ReadableStorageTraits for MemoryStore {
    fn get(&self, key: &StoreKey) -> Result<MaybeBytes, StorageError> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn size_key(&self, key: &StoreKey) -> Result<Option<u64>, StorageError> {
        Ok(self.values.lock().get(key).map(|value| value.len() as u64))
    }
}

impl WritableStorageTraits for MemoryStore {
    fn set(&self, key: &StoreKey, value: Bytes) -> Result<(), StorageError> {
        self.values.lock().insert(key.clone(), value);
        Ok(())
    }

    fn erase(&self, key: &StoreKey) -> Result<(), StorageError> {
        self.values.lock().remove(key);
        Ok(())
    }
}
