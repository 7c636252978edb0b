use derive_more::Display;

use crate::ChunkGridError;

/// A strided selection of a single dimension.
///
/// Selects the positions `start, start + stride, ...` strictly below `stop`, within a dimension of length `len`.
/// Invariants: `stride >= 1` and `start <= stop <= len`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display)]
#[display("[{start}:{stop}:{stride}|{len}]")]
pub struct Slice {
    start: u64,
    stop: u64,
    stride: u64,
    len: u64,
}

impl Slice {
    /// Create a new slice.
    ///
    /// # Errors
    /// Returns [`ChunkGridError::ZeroSliceStride`] if `stride` is zero or [`ChunkGridError::InvalidSlice`] unless `start <= stop <= len`.
    pub fn new(start: u64, stop: u64, stride: u64, len: u64) -> Result<Self, ChunkGridError> {
        if stride == 0 {
            Err(ChunkGridError::ZeroSliceStride)
        } else if start <= stop && stop <= len {
            Ok(Self {
                start,
                stop,
                stride,
                len,
            })
        } else {
            Err(ChunkGridError::InvalidSlice { start, stop, len })
        }
    }

    /// Create a slice of `count` positions from `start` with `stride`, clamping the stop to `len`.
    ///
    /// The stop is `min(start + count * stride, len)`, so a `count` overshooting the dimension selects fewer positions.
    ///
    /// # Errors
    /// Returns [`ChunkGridError::ZeroSliceStride`] if `stride` is zero or [`ChunkGridError::InvalidSlice`] if `start > len`.
    pub fn new_clamped(
        start: u64,
        count: u64,
        stride: u64,
        len: u64,
    ) -> Result<Self, ChunkGridError> {
        let stop = start.saturating_add(count.saturating_mul(stride)).min(len);
        if start > len {
            return Err(ChunkGridError::InvalidSlice { start, stop, len });
        }
        Self::new(start, stop, stride, len)
    }

    /// Create a slice selecting all `len` positions.
    #[must_use]
    pub const fn full(len: u64) -> Self {
        Self {
            start: 0,
            stop: len,
            stride: 1,
            len,
        }
    }

    /// Create a slice without validation.
    pub(crate) const fn new_unchecked(start: u64, stop: u64, stride: u64, len: u64) -> Self {
        debug_assert!(stride > 0);
        debug_assert!(start <= stop && stop <= len);
        Self {
            start,
            stop,
            stride,
            len,
        }
    }

    /// Return the first position.
    #[must_use]
    pub const fn start(&self) -> u64 {
        self.start
    }

    /// Return the exclusive upper bound of the selection.
    #[must_use]
    pub const fn stop(&self) -> u64 {
        self.stop
    }

    /// Return the stride.
    #[must_use]
    pub const fn stride(&self) -> u64 {
        self.stride
    }

    /// Return the length of the sliced dimension.
    #[must_use]
    #[allow(clippy::len_without_is_empty)]
    pub const fn len(&self) -> u64 {
        self.len
    }

    /// Return the number of selected positions.
    #[must_use]
    pub const fn count(&self) -> u64 {
        if self.stop > self.start {
            (self.stop - self.start - 1) / self.stride + 1
        } else {
            0
        }
    }

    /// Returns true if no positions are selected.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.stop <= self.start
    }

    /// Return the last selected position, if any.
    #[must_use]
    pub const fn last(&self) -> Option<u64> {
        if self.is_empty() {
            None
        } else {
            Some(self.start + (self.count() - 1) * self.stride)
        }
    }

    /// Returns true if the slice selects every position of its dimension.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.start == 0 && self.stride == 1 && self.stop == self.len
    }

    /// Return an iterator over the selected positions.
    pub fn positions(&self) -> impl Iterator<Item = u64> {
        let stride = usize::try_from(self.stride).unwrap_or(usize::MAX);
        (self.start..self.stop).step_by(stride)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_count() {
        let slice = Slice::new(1, 8, 3, 10).unwrap();
        assert_eq!(slice.count(), 3);
        assert_eq!(slice.last(), Some(7));
        assert_eq!(slice.positions().collect::<Vec<_>>(), vec![1, 4, 7]);
        assert_eq!(slice.to_string(), "[1:8:3|10]");

        let slice = Slice::new(5, 5, 1, 10).unwrap();
        assert!(slice.is_empty());
        assert_eq!(slice.count(), 0);
        assert_eq!(slice.last(), None);

        assert!(Slice::full(4).is_full());
        assert!(!Slice::new(0, 4, 2, 4).unwrap().is_full());
    }

    #[test]
    fn slice_invalid() {
        assert!(matches!(
            Slice::new(0, 4, 0, 4),
            Err(ChunkGridError::ZeroSliceStride)
        ));
        assert!(matches!(
            Slice::new_clamped(0, 2, 0, 4),
            Err(ChunkGridError::ZeroSliceStride)
        ));
        assert!(Slice::new(3, 2, 1, 4).is_err());
        assert!(Slice::new(0, 5, 1, 4).is_err());
    }

    #[test]
    fn slice_clamped() {
        let slice = Slice::new_clamped(2, 10, 1, 5).unwrap();
        assert_eq!(slice.stop(), 5);
        assert_eq!(slice.count(), 3);

        let slice = Slice::new_clamped(0, 3, 2, 10).unwrap();
        assert_eq!(slice.stop(), 6);
        assert_eq!(slice.count(), 3);

        let slice = Slice::new_clamped(5, 0, 1, 5).unwrap();
        assert!(slice.is_empty());

        assert!(Slice::new_clamped(6, 0, 1, 5).is_err());
        assert!(Slice::new_clamped(0, u64::MAX, u64::MAX, 5).is_ok());
    }
}
