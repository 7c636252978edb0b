use itertools::izip;

use crate::{
    check_dimensionality, compute_chunk_ranges, ArrayShape, ChunkGridError, ChunkRange, Odometer,
    Slice,
};

/// The portion of a dimension's slice falling within one chunk.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Projection {
    chunk_index: u64,
    iocount: u64,
    chunk_slice: Slice,
    memory_slice: Slice,
}

impl Projection {
    /// Return the chunk index along the dimension.
    #[must_use]
    pub const fn chunk_index(&self) -> u64 {
        self.chunk_index
    }

    /// Return the number of selected positions within the chunk.
    #[must_use]
    pub const fn iocount(&self) -> u64 {
        self.iocount
    }

    /// Return the chunk-local slice.
    #[must_use]
    pub const fn chunk_slice(&self) -> &Slice {
        &self.chunk_slice
    }

    /// Return the memory-local slice.
    #[must_use]
    pub const fn memory_slice(&self) -> &Slice {
        &self.memory_slice
    }

    /// Returns true if the chunk holds no selected position.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.iocount == 0
    }
}

/// The projections of one dimension's slice, one per chunk index in its [`ChunkRange`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SliceProjections {
    range: ChunkRange,
    projections: Vec<Projection>,
}

impl SliceProjections {
    /// Return the chunk range.
    #[must_use]
    pub const fn range(&self) -> &ChunkRange {
        &self.range
    }

    /// Return the projections, ordered by chunk index.
    #[must_use]
    pub fn projections(&self) -> &[Projection] {
        &self.projections
    }

    /// Return the projection of chunk index `chunk_index`, if it is in range.
    #[must_use]
    pub fn get(&self, chunk_index: u64) -> Option<&Projection> {
        let offset = chunk_index.checked_sub(self.range.start())?;
        self.projections.get(usize::try_from(offset).ok()?)
    }

    /// Return the total number of selected positions across all chunks.
    #[must_use]
    pub fn iocount(&self) -> u64 {
        self.projections.iter().map(Projection::iocount).sum()
    }
}

/// Project one dimension's `slice` onto each chunk index of `range`.
///
/// For chunk `m` covering `[m * chunk_len, (m + 1) * chunk_len)`, the projection holds the first selected position in the chunk, the number of selected positions (`iocount`), the chunk-local slice and a contiguous memory-local slice starting after the positions emitted by earlier chunks.
/// A chunk in range without selected positions (possible for `stride > 1`) yields an empty projection.
///
/// # Errors
/// Returns [`ChunkGridError::ZeroChunkLength`] if `chunk_len` is zero or [`ChunkGridError::OutOfMemory`] if the projections cannot be allocated.
///
/// # Panics
/// Panics if the number of projections differs from the chunk range count, or if `memory_len` is smaller than the number of selected positions.
pub fn compute_slice_projections(
    slice: &Slice,
    range: ChunkRange,
    chunk_len: u64,
    memory_len: u64,
) -> Result<SliceProjections, ChunkGridError> {
    if chunk_len == 0 {
        return Err(ChunkGridError::ZeroChunkLength(0));
    }
    assert!(
        memory_len >= slice.count(),
        "memory extent {memory_len} is smaller than the selection {slice}"
    );

    let stride = slice.stride();
    let mut projections = Vec::new();
    projections.try_reserve_exact(usize::try_from(range.count()).unwrap_or(usize::MAX))?;
    let mut emitted = 0;
    for chunk_index in range.to_range() {
        let chunk_start = chunk_index * chunk_len;
        let chunk_end = chunk_start + chunk_len;
        let first = if slice.start() >= chunk_start {
            slice.start()
        } else {
            slice.start() + (chunk_start - slice.start()).div_ceil(stride) * stride
        };
        let limit = slice.stop().min(chunk_end);
        let iocount = if first < limit {
            (limit - 1 - first) / stride + 1
        } else {
            0
        };
        let chunk_slice = if iocount == 0 {
            Slice::new_unchecked(0, 0, stride, chunk_len)
        } else {
            let local_start = first - chunk_start;
            Slice::new_unchecked(
                local_start,
                local_start + (iocount - 1) * stride + 1,
                stride,
                chunk_len,
            )
        };
        let memory_slice = Slice::new_unchecked(emitted, emitted + iocount, 1, memory_len);
        projections.push(Projection {
            chunk_index,
            iocount,
            chunk_slice,
            memory_slice,
        });
        emitted += iocount;
    }

    assert_eq!(
        range.count(),
        projections.len() as u64,
        "projection count does not match chunk range {range}"
    );
    Ok(SliceProjections { range, projections })
}

/// The projections of a hyperslab onto a chunked variable.
#[derive(Clone, Debug)]
pub struct ProjectedSlices {
    projections: Vec<SliceProjections>,
    shape: ArrayShape,
    grid_shape: ArrayShape,
}

impl ProjectedSlices {
    /// Return the per-dimension projections.
    #[must_use]
    pub fn projections(&self) -> &[SliceProjections] {
        &self.projections
    }

    /// Return the output shape, the per-dimension sum of `iocount`.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    /// Return the shape of the chunk grid.
    #[must_use]
    pub fn grid_shape(&self) -> &[u64] {
        &self.grid_shape
    }

    /// Return the chunk ranges.
    pub fn ranges(&self) -> impl Iterator<Item = &ChunkRange> + '_ {
        self.projections.iter().map(SliceProjections::range)
    }

    /// Returns true if any dimension selects no positions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shape.iter().any(|&len| len == 0)
    }

    /// Return the number of chunk combinations in range.
    #[must_use]
    pub fn num_chunks(&self) -> u64 {
        self.ranges().map(ChunkRange::count).product()
    }

    /// Return an odometer over the chunk index combinations in range, in row-major order.
    #[must_use]
    pub fn chunk_odometer(&self) -> Odometer {
        let start = self.ranges().map(ChunkRange::start).collect();
        let stop = self.ranges().map(ChunkRange::stop).collect();
        let stride = vec![1; self.projections.len()];
        Odometer::new_unchecked(start, stop, stride, self.grid_shape.clone())
    }

    /// Return the projection of each dimension for the chunk at `chunk_indices`.
    ///
    /// # Panics
    /// Panics if `chunk_indices` is not a chunk combination in range.
    #[must_use]
    pub fn select(&self, chunk_indices: &[u64]) -> Vec<&Projection> {
        assert_eq!(chunk_indices.len(), self.projections.len());
        std::iter::zip(&self.projections, chunk_indices)
            .map(|(projections, &chunk_index)| {
                projections
                    .get(chunk_index)
                    .unwrap_or_else(|| panic!("chunk index {chunk_index} out of range"))
            })
            .collect()
    }
}

/// Project the hyperslab `slices` onto a chunk grid with chunk lengths `chunk_lens`.
///
/// `memory_shape` is the extent of the memory buffer per dimension, usually the requested count.
///
/// # Errors
/// Returns a [`ChunkGridError`] if
///  - the dimensionality of `slices`, `chunk_lens` and `memory_shape` differ,
///  - any chunk length is zero, or
///  - allocation fails.
pub fn project_slices(
    slices: &[Slice],
    chunk_lens: &[u64],
    memory_shape: &[u64],
) -> Result<ProjectedSlices, ChunkGridError> {
    check_dimensionality(memory_shape.len(), slices.len())?;
    let ranges = compute_chunk_ranges(slices, chunk_lens)?;

    let mut projections = Vec::new();
    projections.try_reserve_exact(slices.len())?;
    for (slice, range, &chunk_len, &memory_len) in izip!(slices, ranges, chunk_lens, memory_shape)
    {
        projections.push(compute_slice_projections(
            slice, range, chunk_len, memory_len,
        )?);
    }

    let shape = projections.iter().map(SliceProjections::iocount).collect();
    let grid_shape = std::iter::zip(slices, chunk_lens)
        .map(|(slice, chunk_len)| slice.len().div_ceil(*chunk_len))
        .collect();
    Ok(ProjectedSlices {
        projections,
        shape,
        grid_shape,
    })
}
