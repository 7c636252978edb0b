//! Fill values.

use derive_more::Display;

use super::endianness::reverse_endianness;

/// A fill value.
///
/// The value of each element of a chunk that has never been written, held as native-endian bytes.
#[derive(Clone, Eq, PartialEq, Debug, Display)]
#[display("{_0:?}")]
pub struct FillValue(Vec<u8>);

impl From<&[u8]> for FillValue {
    fn from(value: &[u8]) -> Self {
        Self(value.to_vec())
    }
}

impl<const N: usize> From<[u8; N]> for FillValue {
    fn from(value: [u8; N]) -> Self {
        Self(value.to_vec())
    }
}

impl From<Vec<u8>> for FillValue {
    fn from(value: Vec<u8>) -> Self {
        Self(value)
    }
}

macro_rules! impl_fill_value_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for FillValue {
                fn from(value: $t) -> Self {
                    Self(value.to_ne_bytes().to_vec())
                }
            }
        )*
    };
}

impl_fill_value_from!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

impl FillValue {
    /// Create a new fill value composed of `bytes` in native byte order.
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Returns the size in bytes of the fill value.
    #[must_use]
    pub fn size(&self) -> usize {
        self.0.len()
    }

    /// Return the byte representation of the fill value in native byte order.
    #[must_use]
    pub fn as_ne_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Return the byte representation of the fill value, reversed if `swap` is set.
    #[must_use]
    pub fn to_bytes_swapped(&self, swap: bool) -> Vec<u8> {
        let mut bytes = self.0.clone();
        if swap {
            let element_size = bytes.len();
            reverse_endianness(&mut bytes, element_size);
        }
        bytes
    }

    /// Check if the bytes are equal to a sequence of the fill value.
    #[must_use]
    pub fn equals_all(&self, bytes: &[u8]) -> bool {
        match self.0.len() {
            0 => bytes.is_empty(),
            1 => bytes.iter().all(|&byte| byte == self.0[0]),
            size => {
                bytes.len() % size == 0
                    && bytes
                        .chunks_exact(size)
                        .all(|element| element == self.0.as_slice())
            }
        }
    }
}
