//! NCZarr chunk key encoding.

use derive_more::Display;
use itertools::Itertools;
use nczarrs_storage::{StoreKey, StorePrefix};

/// A chunk key separator.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Display)]
pub enum ChunkKeySeparator {
    /// The `.` separator.
    #[default]
    #[display(".")]
    Dot,
    /// The `/` separator.
    #[display("/")]
    Slash,
}

impl From<ChunkKeySeparator> for char {
    fn from(separator: ChunkKeySeparator) -> Self {
        match separator {
            ChunkKeySeparator::Dot => '.',
            ChunkKeySeparator::Slash => '/',
        }
    }
}

/// The NCZarr chunk key encoding.
///
/// The key of a chunk is the variable prefix followed by, for each dimension:
/// - the ASCII decimal string representation of the chunk index within that dimension, followed by
/// - the separator character, except that it is omitted for the last dimension.
///
/// The single chunk of a scalar variable has the key `0`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ChunkKeyEncoding {
    separator: ChunkKeySeparator,
}

impl ChunkKeyEncoding {
    /// Create a new chunk key encoding with separator `separator`.
    #[must_use]
    pub const fn new(separator: ChunkKeySeparator) -> Self {
        Self { separator }
    }

    /// Return the separator.
    #[must_use]
    pub const fn separator(&self) -> ChunkKeySeparator {
        self.separator
    }

    /// Encode chunk grid indices into a store key under `prefix`.
    #[must_use]
    pub fn encode(&self, prefix: &StorePrefix, chunk_grid_indices: &[u64]) -> StoreKey {
        let mut key = prefix.as_str().to_string();
        if chunk_grid_indices.is_empty() {
            key.push('0');
        } else {
            let mut separator_str: [u8; 4] = [0; 4];
            let separator_char: char = self.separator.into();
            let separator_str: &str = separator_char.encode_utf8(&mut separator_str);

            let mut buffers = vec![itoa::Buffer::new(); chunk_grid_indices.len()];
            key.push_str(
                &chunk_grid_indices
                    .iter()
                    .zip(&mut buffers)
                    .map(|(&n, buffer)| buffer.format(n))
                    .join(separator_str),
            );
        }
        // SAFETY: a valid prefix is empty or ends with `/`, and the suffix is non-empty without a leading or trailing `/`
        unsafe { StoreKey::new_unchecked(key) }
    }
}
