//! The storage API for the [`nczarrs`](https://docs.rs/nczarrs/latest/nczarrs/index.html) crate.
//!
//! A store is a key/value system holding the chunks of chunked variables.
//! For example: a filesystem, HTTP server, Amazon S3 bucket, ZIP file, or memory.
//! The chunk transfer engine in `nczarrs` never talks to a store directly, it goes through a chunk cache which reads and writes whole chunk values with the traits defined here.
//!
//! This crate includes an in-memory store implementation ([`store::MemoryStore`]) and a [`storage_adapter`] for recording storage traffic.
//!
//! ## Licence
//! `nczarrs_storage` is licensed under either of
//! - the Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> or
//! - the MIT license <http://opensource.org/licenses/MIT>, at your option.

mod maybe;
pub mod storage_adapter;
mod storage_sync;
pub mod store;
mod store_key;

pub use maybe::{MaybeSend, MaybeSync};

use std::sync::Arc;

use thiserror::Error;

pub use store_key::{StoreKey, StoreKeyError, StoreKeys, StorePrefix, StorePrefixError};

pub use self::storage_sync::{
    ReadableStorageTraits, ReadableWritableStorageTraits, WritableStorageTraits,
};

/// [`Arc`] wrapped readable and writable storage, the store of a chunk cache.
pub type ReadableWritableStorage = Arc<dyn ReadableWritableStorageTraits>;

/// The type for bytes used in store set and get methods.
///
/// An alias for [`bytes::Bytes`].
pub type Bytes = bytes::Bytes;

/// An alias for bytes which may or may not be available.
///
/// When a value is read from a store, it returns `MaybeBytes` which is [`None`] if the key is not available.
/// A chunk cache converts a missing chunk into a freshly allocated chunk that must be filled by its caller.
pub type MaybeBytes = Option<Bytes>;

/// A storage error.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// An IO error.
    #[error(transparent)]
    IOError(#[from] Arc<std::io::Error>),
    /// An invalid store prefix.
    #[error("invalid store prefix {0}")]
    StorePrefixError(#[from] StorePrefixError),
    /// An invalid store key.
    #[error("invalid store key {0}")]
    InvalidStoreKey(#[from] StoreKeyError),
    /// A stored value does not have the size implied by its key.
    #[error("value at {key} has size {size}, expected {expected}")]
    InvalidValueSize {
        /// The store key.
        key: StoreKey,
        /// The size of the stored value.
        size: u64,
        /// The expected size.
        expected: u64,
    },
    /// Any other error.
    #[error("{0}")]
    Other(String),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::IOError(Arc::new(err))
    }
}
