use std::{num::NonZeroUsize, sync::Arc};

use lru::LruCache;
use nczarrs_chunk_grid::ArrayIndices;
use nczarrs_storage::{
    Bytes, ReadableStorageTraits, ReadableWritableStorage, StorageError, StoreKey, StorePrefix,
    WritableStorageTraits,
};
use parking_lot::Mutex;

use super::{CachedChunk, ChunkCache, ChunkGuard, ChunkStatus};
use crate::variable::ChunkKeyEncoding;

type ChunkIndices = ArrayIndices;

/// An LRU (least recently used) chunk cache with a fixed chunk capacity.
///
/// Chunks are read from and written to a store under the keys of a [`ChunkKeyEncoding`].
/// Modified chunks are written back to the store when they are evicted and on [`flush`](ChunkCache::flush).
pub struct ChunkCacheLru {
    storage: ReadableWritableStorage,
    prefix: StorePrefix,
    chunk_key_encoding: ChunkKeyEncoding,
    chunk_size: usize,
    cache: Mutex<LruCache<ChunkIndices, Arc<Mutex<CachedChunk>>>>,
}

impl ChunkCacheLru {
    /// Create a new [`ChunkCacheLru`] with a capacity in chunks of `chunk_capacity`.
    ///
    /// Chunks of `chunk_size` bytes are stored under `prefix` in `storage`.
    #[must_use]
    pub fn new(
        storage: ReadableWritableStorage,
        prefix: StorePrefix,
        chunk_key_encoding: ChunkKeyEncoding,
        chunk_size: usize,
        chunk_capacity: u64,
    ) -> Self {
        let capacity = NonZeroUsize::new(usize::try_from(chunk_capacity).unwrap_or(usize::MAX))
            .unwrap_or(NonZeroUsize::MIN);
        Self {
            storage,
            prefix,
            chunk_key_encoding,
            chunk_size,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Return the store key of the chunk at `chunk_indices`.
    #[must_use]
    pub fn chunk_key(&self, chunk_indices: &[u64]) -> StoreKey {
        self.chunk_key_encoding.encode(&self.prefix, chunk_indices)
    }

    fn write_back(&self, chunk_indices: &[u64], chunk: &mut CachedChunk) -> Result<(), StorageError> {
        if chunk.is_dirty() {
            let key = self.chunk_key(chunk_indices);
            log::debug!("writing back chunk {key}");
            self.storage.set(&key, Bytes::copy_from_slice(chunk.bytes()))?;
            chunk.set_clean();
        }
        Ok(())
    }

    fn allocate(&self) -> Result<Vec<u8>, StorageError> {
        let mut bytes = Vec::new();
        bytes.try_reserve_exact(self.chunk_size).map_err(|err| {
            StorageError::Other(format!(
                "failed to allocate a chunk of {} bytes: {err}",
                self.chunk_size
            ))
        })?;
        bytes.resize(self.chunk_size, 0);
        Ok(bytes)
    }

    /// Return the cache entry of `chunk_indices`, inserting an unloaded entry if absent.
    fn entry(&self, chunk_indices: &[u64]) -> Result<Arc<Mutex<CachedChunk>>, StorageError> {
        let mut cache = self.cache.lock();
        if let Some(entry) = cache.get(chunk_indices) {
            return Ok(entry.clone());
        }

        if cache.len() == cache.cap().get()
            && let Some((evicted_indices, evicted)) = cache.pop_lru()
        {
            let mut chunk = evicted.lock();
            if let Err(err) = self.write_back(&evicted_indices, &mut chunk) {
                drop(chunk);
                cache.push(evicted_indices, evicted);
                return Err(err);
            }
            chunk.set_evicted();
            log::debug!("evicted chunk {evicted_indices:?}");
        }

        let entry = Arc::new(Mutex::new(CachedChunk::default()));
        cache.push(chunk_indices.to_vec(), entry.clone());
        Ok(entry)
    }
}

impl ChunkCache for ChunkCacheLru {
    fn read_chunk(&self, chunk_indices: &[u64]) -> Result<(ChunkStatus, ChunkGuard), StorageError> {
        loop {
            let mut guard = ChunkGuard::lock(self.entry(chunk_indices)?);
            if guard.chunk().is_evicted() {
                // evicted between lookup and lock, look it up again
                continue;
            }
            if guard.chunk().is_loaded() {
                return Ok((ChunkStatus::Found, guard));
            }

            let key = self.chunk_key(chunk_indices);
            let status = match self.storage.get(&key)? {
                Some(bytes) => {
                    if bytes.len() != self.chunk_size {
                        return Err(StorageError::InvalidValueSize {
                            key,
                            size: bytes.len() as u64,
                            expected: self.chunk_size as u64,
                        });
                    }
                    guard.chunk_mut().set_loaded(bytes.to_vec());
                    ChunkStatus::Found
                }
                None => {
                    guard.chunk_mut().set_loaded(self.allocate()?);
                    ChunkStatus::NotFound
                }
            };
            return Ok((status, guard));
        }
    }

    fn flush(&self) -> Result<(), StorageError> {
        let cache = self.cache.lock();
        for (chunk_indices, entry) in cache.iter() {
            self.write_back(chunk_indices, &mut entry.lock())?;
        }
        Ok(())
    }

    fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn len(&self) -> usize {
        self.cache.lock().len()
    }
}
