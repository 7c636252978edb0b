use std::fmt::Display;

use itertools::{izip, Itertools};

use crate::{ArrayIndices, ArrayIndicesTinyVec, ArrayShape, ChunkGridError, Slice};

/// A row-major bounded counter over strided index vectors.
///
/// Each dimension `i` counts from `start[i]` to below `stop[i]` in steps of `stride[i]`, with the last dimension varying fastest.
/// Linear offsets are computed against `shape`.
///
/// With runs enabled (see [`Odometer::with_runs`]), the last dimension is walked as a single run of [`Odometer::last_len`] positions per step.
///
/// ### Example
/// ```rust
/// # use nczarrs_chunk_grid::Odometer;
/// let mut odometer = Odometer::new(vec![0, 1], vec![2, 4], vec![1, 2], vec![2, 4])?;
/// let mut offsets = vec![];
/// while odometer.more() {
///     offsets.push(odometer.offset());
///     odometer.advance();
/// }
/// assert_eq!(offsets, vec![1, 3, 5, 7]);
/// # Ok::<(), nczarrs_chunk_grid::ChunkGridError>(())
/// ```
#[derive(Clone, Debug)]
pub struct Odometer {
    start: ArrayIndices,
    stop: ArrayIndices,
    stride: ArrayIndices,
    shape: ArrayShape,
    index: ArrayIndicesTinyVec,
    runs: bool,
    exhausted: bool,
}

impl Odometer {
    /// Create a new odometer.
    ///
    /// # Errors
    /// Returns [`ChunkGridError::IncompatibleDimensionality`] if the argument lengths differ or [`ChunkGridError::ZeroStride`] if any stride is zero.
    pub fn new(
        start: ArrayIndices,
        stop: ArrayIndices,
        stride: ArrayIndices,
        shape: ArrayShape,
    ) -> Result<Self, ChunkGridError> {
        let rank = start.len();
        for len in [stop.len(), stride.len(), shape.len()] {
            crate::check_dimensionality(len, rank)?;
        }
        if let Some(dim) = stride.iter().position(|&stride| stride == 0) {
            return Err(ChunkGridError::ZeroStride(dim));
        }
        Ok(Self::new_unchecked(start, stop, stride, shape))
    }

    pub(crate) fn new_unchecked(
        start: ArrayIndices,
        stop: ArrayIndices,
        stride: ArrayIndices,
        shape: ArrayShape,
    ) -> Self {
        let index = start.iter().copied().collect();
        let exhausted = izip!(&start, &stop).any(|(start, stop)| start >= stop);
        Self {
            start,
            stop,
            stride,
            shape,
            index,
            runs: false,
            exhausted,
        }
    }

    /// Create an odometer over the positions selected by `slices`, with offsets against the slice lengths.
    #[must_use]
    pub fn from_slices(slices: &[Slice]) -> Self {
        Self::new_unchecked(
            slices.iter().map(Slice::start).collect(),
            slices.iter().map(Slice::stop).collect(),
            slices.iter().map(Slice::stride).collect(),
            slices.iter().map(Slice::len).collect(),
        )
    }

    /// Enable or disable walking the last dimension as a single run.
    #[must_use]
    pub fn with_runs(mut self, runs: bool) -> Self {
        self.runs = runs;
        self
    }

    /// Return the dimensionality.
    #[must_use]
    pub fn rank(&self) -> usize {
        self.start.len()
    }

    /// Returns true while the odometer is at a valid position.
    #[must_use]
    pub const fn more(&self) -> bool {
        !self.exhausted
    }

    /// Step to the next position.
    ///
    /// The fastest dimension is incremented by its stride, resetting to its start and carrying into the next slower dimension on reaching its stop.
    /// With runs enabled, the carry begins at the second to last dimension.
    pub fn advance(&mut self) {
        if self.exhausted {
            return;
        }
        let dims = if self.runs {
            self.rank().saturating_sub(1)
        } else {
            self.rank()
        };
        for dim in (0..dims).rev() {
            self.index[dim] += self.stride[dim];
            if self.index[dim] < self.stop[dim] {
                return;
            }
            self.index[dim] = self.start[dim];
        }
        self.exhausted = true;
    }

    /// Return the current index vector.
    #[must_use]
    pub fn indices(&self) -> &[u64] {
        &self.index
    }

    /// Return the row-major linear offset of the current position in the odometer shape.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset_in(&self.shape)
    }

    /// Return the row-major linear offset of the current position in `shape`.
    ///
    /// # Panics
    /// Panics if `shape` does not match the dimensionality of the odometer.
    #[must_use]
    pub fn offset_in(&self, shape: &[u64]) -> u64 {
        assert_eq!(shape.len(), self.rank());
        std::iter::zip(self.index.iter(), shape)
            .fold(0, |offset, (&index, &len)| offset * len + index)
    }

    /// Return the number of elements addressed by the current position.
    ///
    /// This is [`Odometer::last_len`] with runs enabled, otherwise 1.
    #[must_use]
    pub fn avail(&self) -> u64 {
        if self.runs {
            self.last_len()
        } else {
            1
        }
    }

    /// Return the stride of the last dimension, or 1 for rank 0.
    #[must_use]
    pub fn last_stride(&self) -> u64 {
        self.stride.last().copied().unwrap_or(1)
    }

    /// Return the number of positions along the last dimension, or 1 for rank 0.
    #[must_use]
    pub fn last_len(&self) -> u64 {
        match (self.start.last(), self.stop.last(), self.stride.last()) {
            (Some(&start), Some(&stop), Some(&stride)) => dim_positions(start, stop, stride),
            _ => 1,
        }
    }

    /// Returns true if each run is a contiguous block: runs are enabled and the last stride is 1.
    #[must_use]
    pub fn is_optimized(&self) -> bool {
        self.runs && self.last_stride() == 1
    }

    /// Return the total number of positions the odometer addresses.
    #[must_use]
    pub fn num_positions(&self) -> u64 {
        izip!(&self.start, &self.stop, &self.stride)
            .map(|(&start, &stop, &stride)| dim_positions(start, stop, stride))
            .product()
    }
}

fn dim_positions(start: u64, stop: u64, stride: u64) -> u64 {
    if stop > start {
        (stop - start - 1) / stride + 1
    } else {
        0
    }
}

impl Display for Odometer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "odometer{{rank={} start=[{}] stop=[{}] stride=[{}] shape=[{}] index=[{}] runs={}}}",
            self.rank(),
            self.start.iter().join(","),
            self.stop.iter().join(","),
            self.stride.iter().join(","),
            self.shape.iter().join(","),
            self.index.iter().join(","),
            self.runs
        )
    }
}
