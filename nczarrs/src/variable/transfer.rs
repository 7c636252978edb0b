//! The hyperslab transfer engine.
//!
//! A transfer validates the request, clamps it into per-dimension [`Slice`]s, and then takes one of three paths:
//!  - a scalar variable moves its single element from or to chunk `[0]`,
//!  - a request selecting every element of a variable held in one chunk moves the chunk as a single block,
//!  - otherwise the slices are projected onto the chunk grid and each chunk holding selected elements is walked.

use derive_more::Display;
use itertools::{Itertools, izip};
use nczarrs_chunk_grid::{Odometer, ProjectedSlices, Projection, Slice, project_slices};

use super::{
    ChunkGuard, ChunkStatus, DataType, TransferError, TransferOptions, Variable,
    endianness::reverse_endianness,
};

/// The chunk indices of the single chunk of a scalar variable.
const SCALAR_CHUNK_INDICES: [u64; 1] = [0];

/// The memory of a hyperslab transfer, which also sets the direction of the transfer.
#[derive(Debug)]
pub enum TransferBuffer<'a> {
    /// Read from the variable into memory.
    Read(&'a mut [u8]),
    /// Write memory to the variable.
    Write(&'a [u8]),
}

impl TransferBuffer<'_> {
    /// Return the size of the memory in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Read(memory) => memory.len(),
            Self::Write(memory) => memory.len(),
        }
    }

    /// Returns true if the memory is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The path taken by a transfer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display)]
pub enum TransferPath {
    /// The single element of a scalar variable.
    #[display("scalar")]
    Scalar,
    /// A variable held in a single chunk, transferred as one block.
    #[display("whole variable")]
    WholeVariable,
    /// The general path walking each chunk holding selected elements.
    #[display("chunked")]
    Chunked,
}

/// A summary of a completed transfer.
#[derive(Clone, Debug, PartialEq, Eq, Display)]
#[display(
    "{path}: {chunks_visited} chunks visited, {chunks_skipped} chunks skipped, {runs} runs, {elements} elements"
)]
pub struct TransferSummary {
    path: TransferPath,
    chunks_visited: u64,
    chunks_skipped: u64,
    runs: u64,
    elements: u64,
}

impl TransferSummary {
    const fn new(path: TransferPath) -> Self {
        Self {
            path,
            chunks_visited: 0,
            chunks_skipped: 0,
            runs: 0,
            elements: 0,
        }
    }

    /// Return the path taken by the transfer.
    #[must_use]
    pub const fn path(&self) -> TransferPath {
        self.path
    }

    /// Return the number of chunks read from the chunk cache.
    #[must_use]
    pub const fn chunks_visited(&self) -> u64 {
        self.chunks_visited
    }

    /// Return the number of chunks in range holding no selected element.
    ///
    /// These chunks are never read or created.
    #[must_use]
    pub const fn chunks_skipped(&self) -> u64 {
        self.chunks_skipped
    }

    /// Return the number of runs transferred.
    ///
    /// A run is a single element, or the selected elements along the last dimension of a chunk if runs are optimized.
    #[must_use]
    pub const fn runs(&self) -> u64 {
        self.runs
    }

    /// Return the number of elements transferred.
    #[must_use]
    pub const fn elements(&self) -> u64 {
        self.elements
    }
}

/// A run of elements, with offsets and strides in elements.
#[derive(Copy, Clone, Debug)]
struct Run {
    chunk_offset: usize,
    chunk_stride: usize,
    memory_offset: usize,
    len: usize,
}

/// A transfer direction holding the memory.
trait Direction {
    const NAME: &'static str;

    fn transfer(&mut self, chunk: &mut ChunkGuard, run: Run, element_size: usize, swap: bool);
}

/// Chunk to memory.
struct Reader<'a> {
    memory: &'a mut [u8],
}

impl Direction for Reader<'_> {
    const NAME: &'static str = "read";

    fn transfer(&mut self, chunk: &mut ChunkGuard, run: Run, element_size: usize, swap: bool) {
        transfer_elements(
            &chunk.bytes()[run.chunk_offset * element_size..],
            run.chunk_stride,
            &mut self.memory[run.memory_offset * element_size..],
            1,
            run.len,
            element_size,
            swap,
        );
    }
}

/// Memory to chunk.
struct Writer<'a> {
    memory: &'a [u8],
}

impl Direction for Writer<'_> {
    const NAME: &'static str = "write";

    fn transfer(&mut self, chunk: &mut ChunkGuard, run: Run, element_size: usize, swap: bool) {
        transfer_elements(
            &self.memory[run.memory_offset * element_size..],
            1,
            &mut chunk.bytes_mut()[run.chunk_offset * element_size..],
            run.chunk_stride,
            run.len,
            element_size,
            swap,
        );
        chunk.set_dirty();
    }
}

/// Copy `len` elements from `src` to `dst` with element strides, then reverse the byte order of the copied elements if `swap` is set.
fn transfer_elements(
    src: &[u8],
    src_stride: usize,
    dst: &mut [u8],
    dst_stride: usize,
    len: usize,
    element_size: usize,
    swap: bool,
) {
    if src_stride == 1 && dst_stride == 1 {
        let size = len * element_size;
        let dst = &mut dst[..size];
        dst.copy_from_slice(&src[..size]);
        if swap {
            reverse_endianness(dst, element_size);
        }
    } else {
        for i in 0..len {
            let src_offset = i * src_stride * element_size;
            let dst_offset = i * dst_stride * element_size;
            let element = &mut dst[dst_offset..dst_offset + element_size];
            element.copy_from_slice(&src[src_offset..src_offset + element_size]);
            if swap {
                element.reverse();
            }
        }
    }
}

/// Build a chunk of `chunk_size` bytes repeating `fill_value`.
fn fill_template(fill_value: &[u8], chunk_size: usize) -> Result<Vec<u8>, TransferError> {
    let mut template = Vec::new();
    template.try_reserve_exact(chunk_size)?;
    for _ in 0..chunk_size / fill_value.len() {
        template.extend_from_slice(fill_value);
    }
    Ok(template)
}

/// The state of a single transfer.
struct TransferContext<'v> {
    variable: &'v Variable,
    element_size: usize,
    swap: bool,
    /// The fill value in stored byte order.
    fill_value: Option<Vec<u8>>,
    fill_template: Option<Vec<u8>>,
    chunk_size: usize,
    optimize: bool,
    whole_variable_fast_path: bool,
    verbosity: u8,
    summary: TransferSummary,
}

impl<'v> TransferContext<'v> {
    fn new(variable: &'v Variable, options: &TransferOptions) -> Self {
        let element_size = variable.data_type().size();
        let swap = element_size > 1 && !variable.endianness().is_native();
        Self {
            variable,
            element_size,
            swap,
            fill_value: variable
                .fill_value()
                .map(|fill_value| fill_value.to_bytes_swapped(swap)),
            fill_template: None,
            chunk_size: variable.chunk_cache().chunk_size(),
            optimize: options.optimize(),
            whole_variable_fast_path: options.whole_variable_fast_path(),
            verbosity: options.verbosity(),
            summary: TransferSummary::new(TransferPath::Chunked),
        }
    }

    /// Read a chunk through the chunk cache, initialising it with the fill value if it did not exist.
    fn read_chunk(&mut self, chunk_indices: &[u64]) -> Result<ChunkGuard, TransferError> {
        let (status, mut guard) = self.variable.chunk_cache().read_chunk(chunk_indices)?;
        if status == ChunkStatus::NotFound {
            if self.verbosity >= 2 {
                log::debug!("chunk {chunk_indices:?} not found, filling");
            }
            if let Err(err) = self.fill(&mut guard) {
                guard.discard();
                return Err(err);
            }
        }
        Ok(guard)
    }

    fn fill(&mut self, guard: &mut ChunkGuard) -> Result<(), TransferError> {
        let chunk = guard.bytes_mut();
        match &self.fill_value {
            None => chunk.fill(0),
            Some(fill_value) => {
                if self.fill_template.is_none() {
                    self.fill_template = Some(fill_template(fill_value, self.chunk_size)?);
                }
                if let Some(template) = &self.fill_template {
                    chunk.copy_from_slice(template);
                }
            }
        }
        Ok(())
    }

    fn run<D: Direction>(
        mut self,
        mut direction: D,
        start: &[u64],
        count: &[u64],
        stride: &[u64],
    ) -> Result<TransferSummary, TransferError> {
        let variable = self.variable;
        if self.verbosity >= 1 {
            log::debug!(
                "{} {}: start=[{}] count=[{}] stride=[{}] rank={} dim_lens=[{}] chunk_lens=[{}]",
                D::NAME,
                variable.path(),
                start.iter().join(","),
                count.iter().join(","),
                stride.iter().join(","),
                variable.dimensionality(),
                variable.shape().iter().join(","),
                variable.chunk_shape().iter().join(","),
            );
        }

        if variable.is_scalar() {
            self.transfer_scalar(&mut direction)?;
        } else {
            let slices = izip!(start, count, stride, variable.shape())
                .map(|(&start, &count, &stride, &len)| Slice::new_clamped(start, count, stride, len))
                .collect::<Result<Vec<_>, _>>()?;
            if self.verbosity >= 2 {
                log::debug!("slices: {}", slices.iter().join(","));
            }

            if self.whole_variable_fast_path
                && is_whole_variable(&slices, count, variable.chunk_shape())
            {
                self.transfer_whole_variable(&mut direction)?;
            } else {
                let projected = project_slices(&slices, variable.chunk_shape(), count)?;
                self.transfer_chunks(&mut direction, &projected)?;
            }
        }

        if self.verbosity >= 1 {
            log::debug!("{} {}: {}", D::NAME, variable.path(), self.summary);
        }
        Ok(self.summary)
    }

    fn transfer_scalar<D: Direction>(&mut self, direction: &mut D) -> Result<(), TransferError> {
        self.summary.path = TransferPath::Scalar;
        let mut guard = self.read_chunk(&SCALAR_CHUNK_INDICES)?;
        let run = Run {
            chunk_offset: 0,
            chunk_stride: 1,
            memory_offset: 0,
            len: 1,
        };
        direction.transfer(&mut guard, run, self.element_size, self.swap);
        self.summary.chunks_visited = 1;
        self.summary.runs = 1;
        self.summary.elements = 1;
        Ok(())
    }

    fn transfer_whole_variable<D: Direction>(
        &mut self,
        direction: &mut D,
    ) -> Result<(), TransferError> {
        if self.verbosity >= 1 {
            log::debug!(
                "{} {}: whole variable fast path",
                D::NAME,
                self.variable.path()
            );
        }
        self.summary.path = TransferPath::WholeVariable;
        let chunk_indices = vec![0; self.variable.dimensionality()];
        let mut guard = self.read_chunk(&chunk_indices)?;
        let len = self.chunk_size / self.element_size;
        let run = Run {
            chunk_offset: 0,
            chunk_stride: 1,
            memory_offset: 0,
            len,
        };
        direction.transfer(&mut guard, run, self.element_size, self.swap);
        self.summary.chunks_visited = 1;
        self.summary.runs = 1;
        self.summary.elements = len as u64;
        Ok(())
    }

    fn transfer_chunks<D: Direction>(
        &mut self,
        direction: &mut D,
        projected: &ProjectedSlices,
    ) -> Result<(), TransferError> {
        let mut chunk_odometer = projected.chunk_odometer();
        if self.verbosity >= 2 {
            log::debug!("chunks: {chunk_odometer}");
        }
        while chunk_odometer.more() {
            let chunk_indices = chunk_odometer.indices();
            let projections = projected.select(chunk_indices);
            if projections.iter().any(|projection| projection.is_empty()) {
                if self.verbosity >= 2 {
                    log::debug!("chunk {chunk_indices:?}: no selected elements, skipping");
                }
                self.summary.chunks_skipped += 1;
            } else {
                if self.verbosity >= 2 {
                    log::debug!(
                        "chunk {chunk_indices:?}: chunk slices {} memory slices {}",
                        projections.iter().map(|p| p.chunk_slice()).join(","),
                        projections.iter().map(|p| p.memory_slice()).join(","),
                    );
                }
                let mut guard = self.read_chunk(chunk_indices)?;
                self.walk(direction, &mut guard, &projections);
                self.summary.chunks_visited += 1;
            }
            chunk_odometer.advance();
        }
        Ok(())
    }

    /// Transfer the selected elements of one chunk, walking the chunk-local and memory positions in lockstep.
    fn walk<D: Direction>(
        &mut self,
        direction: &mut D,
        guard: &mut ChunkGuard,
        projections: &[&Projection],
    ) {
        let chunk_slices: Vec<Slice> = projections.iter().map(|p| *p.chunk_slice()).collect();
        let memory_slices: Vec<Slice> = projections.iter().map(|p| *p.memory_slice()).collect();
        let mut chunk_odometer = Odometer::from_slices(&chunk_slices).with_runs(self.optimize);
        let mut memory_odometer = Odometer::from_slices(&memory_slices).with_runs(self.optimize);
        assert_eq!(
            chunk_odometer.avail(),
            memory_odometer.avail(),
            "chunk and memory run lengths differ"
        );

        let len = usize::try_from(chunk_odometer.avail()).unwrap();
        let chunk_stride = usize::try_from(chunk_odometer.last_stride()).unwrap();
        while chunk_odometer.more() {
            assert!(memory_odometer.more(), "memory positions exhausted early");
            let run = Run {
                chunk_offset: usize::try_from(chunk_odometer.offset()).unwrap(),
                chunk_stride,
                memory_offset: usize::try_from(memory_odometer.offset()).unwrap(),
                len,
            };
            if self.verbosity >= 3 {
                log::trace!(
                    "run: chunk {:?} memory {:?} {run:?}",
                    chunk_odometer.indices(),
                    memory_odometer.indices()
                );
            }
            direction.transfer(guard, run, self.element_size, self.swap);
            self.summary.runs += 1;
            self.summary.elements += len as u64;
            chunk_odometer.advance();
            memory_odometer.advance();
        }
        assert!(!memory_odometer.more(), "chunk positions exhausted early");
    }
}

/// Returns true if the request selects every element of a variable held in a single chunk.
fn is_whole_variable(slices: &[Slice], count: &[u64], chunk_shape: &[u64]) -> bool {
    izip!(slices, count, chunk_shape).all(|(slice, &count, &chunk_len)| {
        slice.start() == 0 && slice.stride() == 1 && count == slice.len() && slice.len() == chunk_len
    })
}

fn validate(
    variable: &Variable,
    buffer_len: usize,
    start: &[u64],
    count: &[u64],
    stride: &[u64],
    type_code: i32,
) -> Result<(), TransferError> {
    let memory_type = DataType::from_type_code(type_code)?;
    if memory_type.size() != variable.data_type().size() {
        return Err(TransferError::IncompatibleElementSize(
            memory_type,
            variable.data_type(),
        ));
    }

    let rank = variable.dimensionality();
    for len in [start.len(), count.len(), stride.len()] {
        if len != rank {
            return Err(TransferError::IncompatibleDimensionality(len, rank));
        }
    }
    if let Some(dim) = stride.iter().position(|&stride| stride == 0) {
        return Err(TransferError::ZeroStride(dim));
    }
    let out_of_bounds = izip!(start, count, variable.shape())
        .any(|(&start, &count, &len)| start > len || (count > 0 && start >= len));
    if out_of_bounds {
        return Err(TransferError::SliceOutOfBounds {
            start: start.to_vec(),
            count: count.to_vec(),
            shape: variable.shape().to_vec(),
        });
    }

    let expected = count
        .iter()
        .fold(memory_type.size() as u64, |size, &count| {
            size.saturating_mul(count)
        });
    if buffer_len as u64 != expected {
        return Err(TransferError::InvalidBytesInputSize(buffer_len, expected));
    }
    Ok(())
}

pub(super) fn transfer_slice(
    variable: &Variable,
    buffer: TransferBuffer<'_>,
    start: &[u64],
    count: &[u64],
    stride: &[u64],
    type_code: i32,
    options: &TransferOptions,
) -> Result<TransferSummary, TransferError> {
    validate(variable, buffer.len(), start, count, stride, type_code)?;
    let context = TransferContext::new(variable, options);
    match buffer {
        TransferBuffer::Read(memory) => context.run(Reader { memory }, start, count, stride),
        TransferBuffer::Write(memory) => context.run(Writer { memory }, start, count, stride),
    }
}

pub(super) fn read_chunk_bytes(
    variable: &Variable,
    chunk_indices: &[u64],
) -> Result<Vec<u8>, TransferError> {
    let valid = if variable.is_scalar() {
        chunk_indices.is_empty() || chunk_indices == SCALAR_CHUNK_INDICES
    } else {
        let chunk_grid_shape = variable.chunk_grid_shape();
        chunk_indices.len() == chunk_grid_shape.len()
            && std::iter::zip(chunk_indices, &chunk_grid_shape).all(|(index, len)| index < len)
    };
    if !valid {
        return Err(TransferError::InvalidChunkGridIndices(
            chunk_indices.to_vec(),
        ));
    }
    let chunk_indices: &[u64] = if variable.is_scalar() {
        &SCALAR_CHUNK_INDICES
    } else {
        chunk_indices
    };

    let mut context = TransferContext::new(variable, &TransferOptions::default());
    let guard = context.read_chunk(chunk_indices)?;
    let mut bytes = Vec::new();
    bytes.try_reserve_exact(guard.bytes().len())?;
    bytes.extend_from_slice(guard.bytes());
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_elements_contiguous() {
        let src = [1u8, 2, 3, 4, 5, 6];
        let mut dst = [0u8; 6];
        transfer_elements(&src, 1, &mut dst, 1, 3, 2, false);
        assert_eq!(dst, src);
        transfer_elements(&src, 1, &mut dst, 1, 3, 2, true);
        assert_eq!(dst, [2, 1, 4, 3, 6, 5]);
    }

    #[test]
    fn transfer_elements_strided() {
        let src = [1u8, 2, 3, 4, 5, 6, 7, 8];
        let mut dst = [0u8; 4];
        transfer_elements(&src, 2, &mut dst, 1, 2, 2, false);
        assert_eq!(dst, [1, 2, 5, 6]);
        transfer_elements(&src, 2, &mut dst, 1, 2, 2, true);
        assert_eq!(dst, [2, 1, 6, 5]);

        let mut dst = [0u8; 7];
        transfer_elements(&src[..2], 1, &mut dst, 3, 2, 1, false);
        assert_eq!(dst, [1, 0, 0, 2, 0, 0, 0]);
    }

    #[test]
    fn fill_template_repeats() {
        assert_eq!(fill_template(&[1, 2], 6).unwrap(), vec![1, 2, 1, 2, 1, 2]);
    }

    #[test]
    fn whole_variable() {
        let slices = [Slice::full(4), Slice::full(3)];
        assert!(is_whole_variable(&slices, &[4, 3], &[4, 3]));
        assert!(!is_whole_variable(&slices, &[4, 3], &[2, 3]));
        // a count overshooting the variable is clamped, but is not a whole variable request
        assert!(!is_whole_variable(&slices, &[5, 3], &[4, 3]));
        let slices = [Slice::new(0, 4, 2, 4).unwrap(), Slice::full(3)];
        assert!(!is_whole_variable(&slices, &[2, 3], &[4, 3]));
    }
}
