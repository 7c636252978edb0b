//! `nczarrs` transfers hyperslabs between chunked [NCZarr](https://docs.unidata.ucar.edu/nug/current/nczarr_head.html) variables and flat memory buffers.
//!
//! A hyperslab is described per dimension by a `start`, `count` and `stride`.
//! The transfer engine decomposes the request into the chunks it touches, projects the selection onto each chunk, and moves the selected elements between chunk storage and memory without materialising the whole variable.
//! Elements are converted between the native byte order and the byte order of the stored chunks on the fly.
//!
//! The engine moves bytes through a narrow [`ChunkCache`](variable::ChunkCache) interface.
//! The bundled [`ChunkCacheLru`](variable::ChunkCacheLru) caches chunks of any store implementing the [`nczarrs_storage`] API, writing dirty chunks back on eviction and on [`flush`](variable::Variable::flush).
//!
//! ## Example
//! ```rust
//! # use std::sync::Arc;
//! use nczarrs::variable::{DataType, TransferOptions, VariableBuilder};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(nczarrs::storage::store::MemoryStore::new());
//! let variable = VariableBuilder::new(vec![4, 4], DataType::Int, vec![2, 2])
//!     .fill_value(-1i32)
//!     .build(store.clone(), "/group/var")?;
//!
//! let options = TransferOptions::default();
//! variable.store_slice_elements(&[1, 1], &[2, 2], &[1, 1], &[1i32, 2, 3, 4], &options)?;
//! let elements: Vec<i32> = variable.retrieve_slice_elements(&[0, 0], &[2, 4], &[1, 1], &options)?;
//! assert_eq!(elements, vec![-1, -1, -1, -1, -1, 1, 2, -1]);
//! variable.flush()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate Features
//! `nczarrs` has no optional features.
//! Diagnostics are emitted through the [`log`] facade, with verbosity set by [`TransferOptions`](variable::TransferOptions).
//!
//! ## Licence
//! `nczarrs` is licensed under either of
//!  - the Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> or
//!  - the MIT license <http://opensource.org/licenses/MIT>, at your option.

pub mod variable;

pub use nczarrs_chunk_grid as chunk_grid;
pub use nczarrs_storage as storage;
