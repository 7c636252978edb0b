//! A storage adapter counting the requests reaching a store.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use derive_more::Display;

use crate::{Bytes, MaybeBytes, ReadableStorageTraits, StorageError, StoreKey, WritableStorageTraits};

/// A snapshot of the counters of a [`PerformanceMetricsStorageAdapter`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Display)]
#[display(
    "{reads} reads ({misses} missing, {bytes_read} bytes), {writes} writes ({bytes_written} bytes), {erases} erases"
)]
pub struct StorageMetrics {
    /// The number of get requests, including requests for missing keys.
    pub reads: u64,
    /// The number of get requests for missing keys.
    pub misses: u64,
    /// The number of bytes returned by get requests.
    pub bytes_read: u64,
    /// The number of set requests.
    pub writes: u64,
    /// The number of bytes passed to set requests.
    pub bytes_written: u64,
    /// The number of erase requests.
    pub erases: u64,
}

#[derive(Debug, Default)]
struct Counters {
    reads: AtomicU64,
    misses: AtomicU64,
    bytes_read: AtomicU64,
    writes: AtomicU64,
    bytes_written: AtomicU64,
    erases: AtomicU64,
}

/// The performance metrics storage adapter.
///
/// Wraps a store and counts the chunk traffic passing through it.
/// Tests use it to check which chunks a transfer fetched and when a chunk cache wrote back.
///
/// ### Example
/// ```rust
/// # use std::sync::Arc;
/// # use nczarrs_storage::{ReadableStorageTraits, StoreKey};
/// # use nczarrs_storage::store::MemoryStore;
/// # use nczarrs_storage::storage_adapter::performance_metrics::PerformanceMetricsStorageAdapter;
/// let store = Arc::new(PerformanceMetricsStorageAdapter::new(Arc::new(MemoryStore::new())));
/// assert!(store.get(&StoreKey::new("var/0.0").unwrap()).unwrap().is_none());
/// assert_eq!(store.reads(), 1);
/// assert_eq!(store.metrics().misses, 1);
/// assert_eq!(store.writes(), 0);
/// ```
#[derive(Debug)]
pub struct PerformanceMetricsStorageAdapter<TStorage: ?Sized> {
    storage: Arc<TStorage>,
    counters: Counters,
}

impl<TStorage: ?Sized> PerformanceMetricsStorageAdapter<TStorage> {
    /// Create a new performance metrics storage adapter over `storage`.
    #[must_use]
    pub fn new(storage: Arc<TStorage>) -> Self {
        Self {
            storage,
            counters: Counters::default(),
        }
    }

    /// Return a snapshot of all counters.
    #[must_use]
    pub fn metrics(&self) -> StorageMetrics {
        let counters = &self.counters;
        StorageMetrics {
            reads: counters.reads.load(Ordering::Relaxed),
            misses: counters.misses.load(Ordering::Relaxed),
            bytes_read: counters.bytes_read.load(Ordering::Relaxed),
            writes: counters.writes.load(Ordering::Relaxed),
            bytes_written: counters.bytes_written.load(Ordering::Relaxed),
            erases: counters.erases.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        for counter in [
            &self.counters.reads,
            &self.counters.misses,
            &self.counters.bytes_read,
            &self.counters.writes,
            &self.counters.bytes_written,
            &self.counters.erases,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }

    /// Return the number of get requests, including requests for missing keys.
    #[must_use]
    pub fn reads(&self) -> u64 {
        self.counters.reads.load(Ordering::Relaxed)
    }

    /// Return the number of set requests.
    #[must_use]
    pub fn writes(&self) -> u64 {
        self.counters.writes.load(Ordering::Relaxed)
    }
}

impl<TStorage: ?Sized + ReadableStorageTraits> ReadableStorageTraits
    for PerformanceMetricsStorageAdapter<TStorage>
{
    fn get(&self, key: &StoreKey) -> Result<MaybeBytes, StorageError> {
        let value = self.storage.get(key)?;
        self.counters.reads.fetch_add(1, Ordering::Relaxed);
        match &value {
            Some(bytes) => {
                self.counters
                    .bytes_read
                    .fetch_add(bytes.len() as u64, Ordering::Relaxed);
            }
            None => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
            }
        }
        Ok(value)
    }

    fn size_key(&self, key: &StoreKey) -> Result<Option<u64>, StorageError> {
        self.storage.size_key(key)
    }
}

impl<TStorage: ?Sized + WritableStorageTraits> WritableStorageTraits
    for PerformanceMetricsStorageAdapter<TStorage>
{
    fn set(&self, key: &StoreKey, value: Bytes) -> Result<(), StorageError> {
        self.counters.writes.fetch_add(1, Ordering::Relaxed);
        self.counters
            .bytes_written
            .fetch_add(value.len() as u64, Ordering::Relaxed);
        self.storage.set(key, value)
    }

    fn erase(&self, key: &StoreKey) -> Result<(), StorageError> {
        self.counters.erases.fetch_add(1, Ordering::Relaxed);
        self.storage.erase(key)
    }
}
