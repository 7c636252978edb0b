//! Chunked variables and hyperslab transfers.
//!
//! A [`Variable`] is a chunked N-dimensional array of a fixed-size [`DataType`] whose chunks live in a [`ChunkCache`].
//! It is created with a [`VariableBuilder`].
//!
//! Hyperslabs are read and written with [`Variable::transfer_slice`] and its wrappers:
//!  - [`retrieve_slice`](Variable::retrieve_slice) / [`store_slice`](Variable::store_slice) operate on raw native-endian bytes,
//!  - [`retrieve_slice_elements`](Variable::retrieve_slice_elements) / [`store_slice_elements`](Variable::store_slice_elements) operate on typed [`Element`]s.
//!
//! Chunks that have never been written read as the [`FillValue`] of the variable, or zero if it has none.

mod chunk_cache;
mod chunk_key_encoding;
mod data_type;
mod element;
mod endianness;
mod fill_value;
mod options;
mod transfer;
mod variable_builder;
mod variable_errors;

use std::sync::Arc;

pub use chunk_cache::{CachedChunk, ChunkCache, ChunkCacheLru, ChunkGuard, ChunkStatus};
pub use chunk_key_encoding::{ChunkKeyEncoding, ChunkKeySeparator};
pub use data_type::{DataType, InvalidTypeError};
pub use element::Element;
pub use endianness::Endianness;
pub use fill_value::FillValue;
pub use nczarrs_chunk_grid::{ArrayIndices, ArrayShape};
pub use options::{ENV_NO_OPTIMIZATION, ENV_VERBOSITY, TransferOptions};
pub use transfer::{TransferBuffer, TransferPath, TransferSummary};
pub use variable_builder::{DEFAULT_CHUNK_CACHE_CAPACITY, VariableBuilder};
pub use variable_errors::{TransferError, VariableCreateError};

/// A chunked variable.
///
/// Concurrent transfers on a variable share only its chunk cache.
pub struct Variable {
    path: String,
    shape: ArrayShape,
    data_type: DataType,
    chunk_shape: ArrayShape,
    fill_value: Option<FillValue>,
    endianness: Endianness,
    chunk_cache: Arc<dyn ChunkCache>,
}

impl std::fmt::Debug for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Variable")
            .field("path", &self.path)
            .field("shape", &self.shape)
            .field("data_type", &self.data_type)
            .field("chunk_shape", &self.chunk_shape)
            .field("fill_value", &self.fill_value)
            .field("endianness", &self.endianness)
            .finish_non_exhaustive()
    }
}

impl Variable {
    /// Return the path of the variable.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Return the shape of the variable.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    /// Return the dimensionality of the variable.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.shape.len()
    }

    /// Returns true if the variable is a scalar (rank 0).
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        self.shape.is_empty()
    }

    /// Return the data type of the variable.
    #[must_use]
    pub const fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Return the chunk shape of the variable.
    #[must_use]
    pub fn chunk_shape(&self) -> &[u64] {
        &self.chunk_shape
    }

    /// Return the shape of the chunk grid.
    #[must_use]
    pub fn chunk_grid_shape(&self) -> ArrayShape {
        std::iter::zip(&self.shape, &self.chunk_shape)
            .map(|(len, chunk_len)| len.div_ceil(*chunk_len))
            .collect()
    }

    /// Return the number of elements in a chunk.
    #[must_use]
    pub fn chunk_elements(&self) -> u64 {
        self.chunk_shape.iter().product()
    }

    /// Return the fill value of the variable, if any.
    #[must_use]
    pub fn fill_value(&self) -> Option<&FillValue> {
        self.fill_value.as_ref()
    }

    /// Return the byte order of the stored chunks.
    #[must_use]
    pub const fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Return the chunk cache of the variable.
    #[must_use]
    pub fn chunk_cache(&self) -> &Arc<dyn ChunkCache> {
        &self.chunk_cache
    }

    /// Transfer the hyperslab `start`/`count`/`stride` between the variable and the memory of `buffer`.
    ///
    /// The memory holds `count` elements per dimension in row-major order and native byte order.
    /// `type_code` is the netCDF atomic type code of the memory elements, which must have the size of the variable data type.
    /// A `count` extending beyond the variable is clamped, and memory positions beyond the clamped selection are left untouched on read.
    ///
    /// # Errors
    /// Returns a [`TransferError`] if
    ///  - `type_code` is unknown or its size differs from the variable data type,
    ///  - the dimensionality of `start`, `count`, or `stride` differs from the variable,
    ///  - a stride is zero or a start is out of bounds,
    ///  - the memory size is not the product of `count` times the element size,
    ///  - allocation fails, or
    ///  - there is an underlying store error.
    ///
    /// Chunks transferred before an error keep their new content.
    pub fn transfer_slice(
        &self,
        buffer: TransferBuffer<'_>,
        start: &[u64],
        count: &[u64],
        stride: &[u64],
        type_code: i32,
        options: &TransferOptions,
    ) -> Result<TransferSummary, TransferError> {
        transfer::transfer_slice(self, buffer, start, count, stride, type_code, options)
    }

    /// Read the hyperslab `start`/`count`/`stride` into `bytes`.
    ///
    /// # Errors
    /// See [`Variable::transfer_slice`].
    pub fn retrieve_slice(
        &self,
        start: &[u64],
        count: &[u64],
        stride: &[u64],
        bytes: &mut [u8],
        options: &TransferOptions,
    ) -> Result<TransferSummary, TransferError> {
        self.transfer_slice(
            TransferBuffer::Read(bytes),
            start,
            count,
            stride,
            self.data_type.type_code(),
            options,
        )
    }

    /// Write `bytes` to the hyperslab `start`/`count`/`stride`.
    ///
    /// # Errors
    /// See [`Variable::transfer_slice`].
    pub fn store_slice(
        &self,
        start: &[u64],
        count: &[u64],
        stride: &[u64],
        bytes: &[u8],
        options: &TransferOptions,
    ) -> Result<TransferSummary, TransferError> {
        self.transfer_slice(
            TransferBuffer::Write(bytes),
            start,
            count,
            stride,
            self.data_type.type_code(),
            options,
        )
    }

    /// Read the hyperslab `start`/`count`/`stride` into a vector of elements.
    ///
    /// # Errors
    /// See [`Variable::transfer_slice`].
    pub fn retrieve_slice_elements<T: Element>(
        &self,
        start: &[u64],
        count: &[u64],
        stride: &[u64],
        options: &TransferOptions,
    ) -> Result<Vec<T>, TransferError> {
        let num_elements = count
            .iter()
            .try_fold(1u64, |acc, &count| acc.checked_mul(count))
            .and_then(|num_elements| usize::try_from(num_elements).ok())
            .ok_or_else(|| {
                TransferError::OutOfMemory(format!("{count:?} elements overflow the address space"))
            })?;
        let mut elements = Vec::new();
        elements.try_reserve_exact(num_elements)?;
        elements.resize(num_elements, T::zeroed());
        self.transfer_slice(
            TransferBuffer::Read(bytemuck::cast_slice_mut(&mut elements)),
            start,
            count,
            stride,
            T::DATA_TYPE.type_code(),
            options,
        )?;
        Ok(elements)
    }

    /// Write `elements` to the hyperslab `start`/`count`/`stride`.
    ///
    /// # Errors
    /// See [`Variable::transfer_slice`].
    pub fn store_slice_elements<T: Element>(
        &self,
        start: &[u64],
        count: &[u64],
        stride: &[u64],
        elements: &[T],
        options: &TransferOptions,
    ) -> Result<TransferSummary, TransferError> {
        self.transfer_slice(
            TransferBuffer::Write(bytemuck::cast_slice(elements)),
            start,
            count,
            stride,
            T::DATA_TYPE.type_code(),
            options,
        )
    }

    /// Read the bytes of the chunk at `chunk_indices` in stored byte order.
    ///
    /// A chunk that has never been written reads as the fill value.
    /// The single chunk of a scalar variable has indices `[]` or `[0]`.
    ///
    /// # Errors
    /// Returns [`TransferError::InvalidChunkGridIndices`] if `chunk_indices` is not in the chunk grid, or an error if the chunk cannot be read.
    pub fn read_chunk_bytes(&self, chunk_indices: &[u64]) -> Result<Vec<u8>, TransferError> {
        transfer::read_chunk_bytes(self, chunk_indices)
    }

    /// Write all modified chunks in the chunk cache to the store.
    ///
    /// # Errors
    /// Returns a [`TransferError::StorageError`] if a chunk cannot be written.
    pub fn flush(&self) -> Result<(), TransferError> {
        Ok(self.chunk_cache.flush()?)
    }
}
