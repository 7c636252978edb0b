use auto_impl::auto_impl;

use super::{Bytes, MaybeBytes, MaybeSend, MaybeSync, StorageError, StoreKey};

/// Read whole chunk values from a store.
#[auto_impl(Arc)]
pub trait ReadableStorageTraits: MaybeSend + MaybeSync {
    /// Retrieve the value stored at `key`.
    ///
    /// Returns [`None`] if nothing is stored at `key`, which is how a chunk that has never been written is reported.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if there is an underlying storage error.
    fn get(&self, key: &StoreKey) -> Result<MaybeBytes, StorageError>;

    /// Return the size in bytes of the value at `key`, or [`None`] if it does not exist.
    ///
    /// The default implementation retrieves the value.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if there is an underlying storage error.
    fn size_key(&self, key: &StoreKey) -> Result<Option<u64>, StorageError> {
        Ok(self.get(key)?.map(|bytes| bytes.len() as u64))
    }
}

/// Write and erase whole chunk values in a store.
#[auto_impl(Arc)]
pub trait WritableStorageTraits: MaybeSend + MaybeSync {
    /// Store `value` at `key`, replacing any existing value.
    ///
    /// # Errors
    /// Returns a [`StorageError`] on failure to store.
    fn set(&self, key: &StoreKey, value: Bytes) -> Result<(), StorageError>;

    /// Erase the value at `key`.
    ///
    /// Erasing a missing key succeeds.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if there is an underlying storage error.
    fn erase(&self, key: &StoreKey) -> Result<(), StorageError>;
}

/// A store that is both readable and writable, as required by a chunk cache.
pub trait ReadableWritableStorageTraits: ReadableStorageTraits + WritableStorageTraits {}

impl<T> ReadableWritableStorageTraits for T where T: ReadableStorageTraits + WritableStorageTraits {}
