//! Chunk ranges, slice projections and odometers for the [`nczarrs`](https://docs.rs/nczarrs/latest/nczarrs/index.html) crate.
//!
//! A hyperslab request against a chunked variable is described per dimension by a [`Slice`].
//! This crate decomposes such a request into the chunks it touches:
//!  - [`compute_chunk_ranges`] derives, per dimension, the minimal [`ChunkRange`] of chunk indices holding selected elements,
//!  - [`project_slices`] computes one [`Projection`] per dimension and chunk index, pairing a chunk-local [`Slice`] with the matching memory-local [`Slice`],
//!  - an [`Odometer`] enumerates chunk index combinations, chunk-local element positions or memory element positions in row-major order.
//!
//! ## Licence
//! `nczarrs_chunk_grid` is licensed under either of
//!  - the Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> or
//!  - the MIT license <http://opensource.org/licenses/MIT>, at your option.

mod chunk_range;
mod odometer;
mod projection;
mod slice;

pub use chunk_range::{compute_chunk_ranges, ChunkRange};
pub use odometer::Odometer;
pub use projection::{
    compute_slice_projections, project_slices, ProjectedSlices, Projection, SliceProjections,
};
pub use slice::Slice;

use thiserror::Error;

/// The shape of an array, chunk, or memory buffer.
pub type ArrayShape = Vec<u64>;

/// An ND index to an element or a chunk.
pub type ArrayIndices = Vec<u64>;

/// An ND index to an element or a chunk.
/// Uses [`TinyVec`](tinyvec::TinyVec) for stack allocation up to 4 dimensions.
pub type ArrayIndicesTinyVec = tinyvec::TinyVec<[u64; 4]>;

/// A chunk grid error.
#[derive(Clone, Debug, Error)]
pub enum ChunkGridError {
    /// Incompatible dimensionality.
    #[error("incompatible dimensionality {got}, expected {expected}")]
    IncompatibleDimensionality {
        /// The dimensionality supplied.
        got: usize,
        /// The expected dimensionality.
        expected: usize,
    },
    /// A chunk length of zero.
    #[error("chunk length of dimension {0} is zero")]
    ZeroChunkLength(usize),
    /// A stride of zero in dimension `.0`.
    #[error("stride of dimension {0} is zero")]
    ZeroStride(usize),
    /// A [`Slice`] with a stride of zero.
    #[error("slice stride is zero")]
    ZeroSliceStride,
    /// A slice violating `start <= stop <= len`.
    #[error("invalid slice start {start}, stop {stop} for length {len}")]
    InvalidSlice {
        /// The slice start.
        start: u64,
        /// The slice stop (exclusive).
        stop: u64,
        /// The dimension length.
        len: u64,
    },
    /// An allocation failure.
    #[error("out of memory: {0}")]
    OutOfMemory(#[from] std::collections::TryReserveError),
}

impl ChunkGridError {
    /// Create a new incompatible dimensionality error.
    #[must_use]
    pub const fn incompatible_dimensionality(got: usize, expected: usize) -> Self {
        Self::IncompatibleDimensionality { got, expected }
    }
}

fn check_dimensionality(got: usize, expected: usize) -> Result<(), ChunkGridError> {
    if got == expected {
        Ok(())
    } else {
        Err(ChunkGridError::incompatible_dimensionality(got, expected))
    }
}
