//! Byte order of stored elements.

use derive_more::Display;

/// The byte order of multi-byte elements.
///
/// Defaults to little endian, the NCZarr default.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Display)]
pub enum Endianness {
    /// Little endian.
    #[default]
    #[display("little")]
    Little,
    /// Big endian.
    #[display("big")]
    Big,
}

impl Endianness {
    /// Return the byte order of the target platform.
    #[must_use]
    pub const fn native() -> Self {
        if cfg!(target_endian = "big") {
            Self::Big
        } else {
            Self::Little
        }
    }

    /// Returns true if this is the byte order of the target platform.
    #[must_use]
    pub fn is_native(self) -> bool {
        self == Self::native()
    }
}

/// Reverse the byte order of each `element_size` sized element of `bytes` in place.
///
/// Trailing bytes that do not form a whole element are left untouched.
pub(crate) fn reverse_endianness(bytes: &mut [u8], element_size: usize) {
    match element_size {
        0 | 1 => {}
        2 => {
            for element in bytes.as_chunks_mut::<2>().0 {
                *element = u16::from_ne_bytes(*element).swap_bytes().to_ne_bytes();
            }
        }
        4 => {
            for element in bytes.as_chunks_mut::<4>().0 {
                *element = u32::from_ne_bytes(*element).swap_bytes().to_ne_bytes();
            }
        }
        8 => {
            for element in bytes.as_chunks_mut::<8>().0 {
                *element = u64::from_ne_bytes(*element).swap_bytes().to_ne_bytes();
            }
        }
        _ => {
            for element in bytes.chunks_exact_mut(element_size) {
                element.reverse();
            }
        }
    }
}
