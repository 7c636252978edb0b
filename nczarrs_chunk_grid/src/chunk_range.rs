use std::ops::Range;

use derive_more::Display;

use crate::{check_dimensionality, ChunkGridError, Slice};

/// A half-open range of chunk indices along one dimension.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display)]
#[display("{start}..{stop}")]
pub struct ChunkRange {
    start: u64,
    stop: u64,
}

impl ChunkRange {
    /// Create a new chunk range.
    ///
    /// # Panics
    /// Panics if `start > stop`.
    #[must_use]
    pub fn new(start: u64, stop: u64) -> Self {
        assert!(start <= stop, "chunk range start {start} exceeds stop {stop}");
        Self { start, stop }
    }

    /// Return the first chunk index.
    #[must_use]
    pub const fn start(&self) -> u64 {
        self.start
    }

    /// Return the exclusive upper bound of the chunk indices.
    #[must_use]
    pub const fn stop(&self) -> u64 {
        self.stop
    }

    /// Return the number of chunk indices in the range.
    #[must_use]
    pub const fn count(&self) -> u64 {
        self.stop - self.start
    }

    /// Returns true if the range holds no chunk indices.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.stop
    }

    /// Return the range as a [`Range`].
    #[must_use]
    pub const fn to_range(&self) -> Range<u64> {
        self.start..self.stop
    }
}

impl From<ChunkRange> for Range<u64> {
    fn from(range: ChunkRange) -> Self {
        range.to_range()
    }
}

fn chunk_range(slice: &Slice, chunk_len: u64) -> ChunkRange {
    let first = slice.start() / chunk_len;
    match slice.last() {
        Some(last) => ChunkRange::new(first, last / chunk_len + 1),
        None => ChunkRange::new(first, first),
    }
}

/// Compute, per dimension, the range of chunk indices holding at least one selected position.
///
/// The range runs from the chunk holding `start` to the chunk holding the last selected position.
/// A dimension without selected positions yields an empty range.
///
/// # Errors
/// Returns a [`ChunkGridError`] if
///  - `slices` and `chunk_lens` differ in length, or
///  - any chunk length is zero.
pub fn compute_chunk_ranges(
    slices: &[Slice],
    chunk_lens: &[u64],
) -> Result<Vec<ChunkRange>, ChunkGridError> {
    check_dimensionality(chunk_lens.len(), slices.len())?;
    let mut ranges = Vec::new();
    ranges.try_reserve_exact(slices.len())?;
    for (dim, (slice, &chunk_len)) in std::iter::zip(slices, chunk_lens).enumerate() {
        if chunk_len == 0 {
            return Err(ChunkGridError::ZeroChunkLength(dim));
        }
        ranges.push(chunk_range(slice, chunk_len));
    }
    Ok(ranges)
}
