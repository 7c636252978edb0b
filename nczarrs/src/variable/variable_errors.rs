use nczarrs_chunk_grid::{ArrayIndices, ArrayShape, ChunkGridError};
use nczarrs_storage::{StorageError, StorePrefixError};
use thiserror::Error;

use super::{DataType, FillValue, InvalidTypeError};

/// A variable creation error.
#[derive(Clone, Debug, Error)]
pub enum VariableCreateError {
    /// The dimensionality of the chunk shape does not match the variable.
    #[error("chunk shape dimensionality {0} does not match variable dimensionality {1}")]
    InvalidChunkDimensionality(usize, usize),
    /// A chunk shape containing zero.
    #[error("invalid chunk shape {0:?}: all elements must be non-zero")]
    InvalidChunkShape(ArrayShape),
    /// The fill value size does not match the data type.
    #[error("invalid fill value {fill_value} for data type `{data_type}`")]
    InvalidFillValue {
        /// The data type.
        data_type: DataType,
        /// The fill value.
        fill_value: FillValue,
    },
    /// An invalid variable path.
    #[error("invalid variable path {0}")]
    InvalidPath(String),
    /// An invalid store prefix.
    #[error(transparent)]
    StorePrefixError(#[from] StorePrefixError),
    /// The chunk size of a chunk cache does not match the variable.
    #[error("chunk cache with chunk size {0} does not match chunk size {1}")]
    InvalidChunkCacheSize(usize, usize),
    /// The chunk size overflows the address space.
    #[error("chunk of shape {0:?} is too large to address")]
    ChunkTooLarge(ArrayShape),
}

/// A hyperslab transfer error.
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub enum TransferError {
    /// An unknown atomic type code.
    #[error(transparent)]
    InvalidType(#[from] InvalidTypeError),
    /// The size of the memory type does not match the variable data type.
    #[error("memory type `{0}` is incompatible with variable data type `{1}`")]
    IncompatibleElementSize(DataType, DataType),
    /// An unexpected memory buffer size.
    #[error("got memory buffer with size {0}, expected {1}")]
    InvalidBytesInputSize(usize, u64),
    /// Incompatible dimensionality.
    #[error("got {0} dimensions, expected {1}")]
    IncompatibleDimensionality(usize, usize),
    /// A hyperslab start beyond the variable.
    #[error("hyperslab start {start:?} with count {count:?} is out of bounds of variable shape {shape:?}")]
    SliceOutOfBounds {
        /// The hyperslab start.
        start: ArrayIndices,
        /// The hyperslab count.
        count: ArrayShape,
        /// The variable shape.
        shape: ArrayShape,
    },
    /// A zero stride.
    #[error("stride of dimension {0} is zero")]
    ZeroStride(usize),
    /// Invalid chunk grid indices.
    #[error("invalid chunk grid indices: {0:?}")]
    InvalidChunkGridIndices(ArrayIndices),
    /// An allocation failure.
    #[error("out of memory: {0}")]
    OutOfMemory(String),
    /// A store error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
    /// A chunk grid error.
    #[error(transparent)]
    ChunkGridError(ChunkGridError),
}

impl From<ChunkGridError> for TransferError {
    fn from(err: ChunkGridError) -> Self {
        match err {
            ChunkGridError::IncompatibleDimensionality { got, expected } => {
                Self::IncompatibleDimensionality(got, expected)
            }
            ChunkGridError::ZeroStride(dim) => Self::ZeroStride(dim),
            ChunkGridError::OutOfMemory(err) => Self::OutOfMemory(err.to_string()),
            err => Self::ChunkGridError(err),
        }
    }
}

impl From<std::collections::TryReserveError> for TransferError {
    fn from(err: std::collections::TryReserveError) -> Self {
        Self::OutOfMemory(err.to_string())
    }
}
