//! Chunk caches.
//!
//! The transfer engine reads and writes chunks exclusively through a [`ChunkCache`].
//! [`ChunkCache::read_chunk`] is atomic per chunk: the returned [`ChunkGuard`] holds the lock of the chunk until it is dropped.

use std::sync::Arc;

use nczarrs_storage::{MaybeSend, MaybeSync, StorageError};
use parking_lot::{Mutex, RawMutex, lock_api::ArcMutexGuard};

mod chunk_cache_lru;

pub use chunk_cache_lru::ChunkCacheLru;

/// Whether a chunk read through a [`ChunkCache`] already existed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChunkStatus {
    /// The chunk exists in the cache or the store.
    Found,
    /// The chunk did not exist and has been freshly allocated.
    ///
    /// Its bytes are unspecified and must be initialised by the caller, or the guard discarded with [`ChunkGuard::discard`].
    NotFound,
}

/// A cached chunk.
#[derive(Debug, Default)]
pub struct CachedChunk {
    bytes: Vec<u8>,
    loaded: bool,
    dirty: bool,
    evicted: bool,
}

impl CachedChunk {
    /// Create a new cached chunk holding `bytes`.
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            loaded: true,
            dirty: false,
            evicted: false,
        }
    }

    /// Returns true if the chunk bytes have been loaded or allocated.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Returns true if the chunk has been modified since it was last written to the store.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn set_loaded(&mut self, bytes: Vec<u8>) {
        self.bytes = bytes;
        self.loaded = true;
    }

    pub(crate) fn set_unloaded(&mut self) {
        self.loaded = false;
        self.dirty = false;
    }

    pub(crate) fn set_clean(&mut self) {
        self.dirty = false;
    }

    pub(crate) fn is_evicted(&self) -> bool {
        self.evicted
    }

    pub(crate) fn set_evicted(&mut self) {
        self.evicted = true;
    }

    pub(crate) fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Exclusive access to a cached chunk.
///
/// The chunk stays locked until the guard is dropped.
pub struct ChunkGuard {
    guard: ArcMutexGuard<RawMutex, CachedChunk>,
}

impl ChunkGuard {
    /// Lock `chunk`, blocking until it is available.
    #[must_use]
    pub fn lock(chunk: Arc<Mutex<CachedChunk>>) -> Self {
        Self {
            guard: chunk.lock_arc(),
        }
    }

    /// Return the bytes of the chunk in stored byte order.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.guard.bytes
    }

    /// Return the bytes of the chunk in stored byte order, mutably.
    ///
    /// Call [`ChunkGuard::set_dirty`] after modifying the chunk so the cache writes it back.
    #[must_use]
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.guard.bytes
    }

    /// Mark the chunk as modified.
    pub fn set_dirty(&mut self) {
        self.guard.dirty = true;
    }

    /// Returns true if the chunk has been modified since it was last written to the store.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.guard.dirty
    }

    /// Release the chunk without keeping its bytes.
    ///
    /// The next [`ChunkCache::read_chunk`] of the chunk reads it from the store again.
    /// Use this when a chunk returned with [`ChunkStatus::NotFound`] could not be initialised.
    pub fn discard(mut self) {
        self.guard.set_unloaded();
    }

    pub(crate) fn chunk(&self) -> &CachedChunk {
        &self.guard
    }

    pub(crate) fn chunk_mut(&mut self) -> &mut CachedChunk {
        &mut self.guard
    }
}

impl std::fmt::Debug for ChunkGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkGuard")
            .field("len", &self.guard.bytes.len())
            .field("dirty", &self.guard.dirty)
            .finish()
    }
}

/// Traits for a chunk cache.
pub trait ChunkCache: MaybeSend + MaybeSync {
    /// Read or create the chunk at `chunk_indices`, returning its status and a guard holding the chunk lock.
    ///
    /// Exactly one caller observes [`ChunkStatus::NotFound`] for a missing chunk.
    /// Concurrent callers for the same chunk block until the guard is dropped, and then observe [`ChunkStatus::Found`].
    ///
    /// # Errors
    /// Returns a [`StorageError`] if the chunk cannot be read from the store, has an unexpected size, or cannot be allocated.
    fn read_chunk(&self, chunk_indices: &[u64]) -> Result<(ChunkStatus, ChunkGuard), StorageError>;

    /// Write all modified chunks to the store.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if a chunk cannot be written.
    fn flush(&self) -> Result<(), StorageError>;

    /// Return the size of a chunk in bytes.
    fn chunk_size(&self) -> usize;

    /// Return the number of chunks in the cache.
    fn len(&self) -> usize;

    /// Returns true if the cache is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
