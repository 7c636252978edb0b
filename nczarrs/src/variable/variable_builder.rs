use std::sync::Arc;

use nczarrs_storage::{ReadableWritableStorage, StorePrefix};

use super::{
    ArrayShape, ChunkCache, ChunkCacheLru, ChunkKeyEncoding, DataType, Endianness, FillValue,
    Variable, VariableCreateError,
};

/// The default capacity in chunks of the chunk cache created by [`VariableBuilder::build`].
pub const DEFAULT_CHUNK_CACHE_CAPACITY: u64 = 64;

/// A [`Variable`] builder.
///
/// [`VariableBuilder`] is initialised from a variable shape, data type, and chunk shape.
///  - The variable has no fill value, so unwritten chunks read as zero.
///  - Chunks are stored little endian.
///  - The chunk key encoding uses the `.` separator.
///  - [`build`](VariableBuilder::build) creates a [`ChunkCacheLru`] holding [`DEFAULT_CHUNK_CACHE_CAPACITY`] chunks.
///
/// ### Example
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// # use std::sync::Arc;
/// use nczarrs::variable::{DataType, Endianness, VariableBuilder};
/// # let store = Arc::new(nczarrs::storage::store::MemoryStore::new());
/// let variable = VariableBuilder::new(
///     vec![8, 8], // variable shape
///     DataType::Float, // data type
///     vec![4, 4], // chunk shape
/// )
/// .fill_value(f32::NAN)
/// .endianness(Endianness::Big)
/// .build(store.clone(), "/group/variable")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct VariableBuilder {
    shape: ArrayShape,
    data_type: DataType,
    chunk_shape: ArrayShape,
    fill_value: Option<FillValue>,
    endianness: Endianness,
    chunk_key_encoding: ChunkKeyEncoding,
    chunk_cache_capacity: u64,
}

impl VariableBuilder {
    /// Create a new variable builder.
    #[must_use]
    pub fn new(
        shape: impl Into<ArrayShape>,
        data_type: DataType,
        chunk_shape: impl Into<ArrayShape>,
    ) -> Self {
        Self {
            shape: shape.into(),
            data_type,
            chunk_shape: chunk_shape.into(),
            fill_value: None,
            endianness: Endianness::default(),
            chunk_key_encoding: ChunkKeyEncoding::default(),
            chunk_cache_capacity: DEFAULT_CHUNK_CACHE_CAPACITY,
        }
    }

    /// Create a new builder copying the configuration of an existing variable.
    #[must_use]
    pub fn from_variable(variable: &Variable) -> Self {
        let mut builder = Self::new(
            variable.shape().to_vec(),
            variable.data_type(),
            variable.chunk_shape().to_vec(),
        );
        builder.fill_value = variable.fill_value().cloned();
        builder.endianness = variable.endianness();
        builder
    }

    /// Set the shape.
    pub fn shape(&mut self, shape: impl Into<ArrayShape>) -> &mut Self {
        self.shape = shape.into();
        self
    }

    /// Set the data type.
    pub fn data_type(&mut self, data_type: DataType) -> &mut Self {
        self.data_type = data_type;
        self
    }

    /// Set the chunk shape.
    pub fn chunk_shape(&mut self, chunk_shape: impl Into<ArrayShape>) -> &mut Self {
        self.chunk_shape = chunk_shape.into();
        self
    }

    /// Set the fill value.
    pub fn fill_value(&mut self, fill_value: impl Into<FillValue>) -> &mut Self {
        self.fill_value = Some(fill_value.into());
        self
    }

    /// Remove the fill value, so unwritten chunks read as zero.
    pub fn no_fill_value(&mut self) -> &mut Self {
        self.fill_value = None;
        self
    }

    /// Set the byte order of the stored chunks.
    pub fn endianness(&mut self, endianness: Endianness) -> &mut Self {
        self.endianness = endianness;
        self
    }

    /// Set the chunk key encoding.
    pub fn chunk_key_encoding(&mut self, chunk_key_encoding: ChunkKeyEncoding) -> &mut Self {
        self.chunk_key_encoding = chunk_key_encoding;
        self
    }

    /// Set the capacity in chunks of the chunk cache created by [`build`](VariableBuilder::build).
    pub fn chunk_cache_capacity(&mut self, chunk_cache_capacity: u64) -> &mut Self {
        self.chunk_cache_capacity = chunk_cache_capacity;
        self
    }

    /// Return the size of a chunk in bytes.
    ///
    /// # Errors
    /// Returns a [`VariableCreateError`] if the chunk shape is incompatible with the shape or its size overflows.
    pub fn chunk_size(&self) -> Result<usize, VariableCreateError> {
        if self.chunk_shape.len() != self.shape.len() {
            return Err(VariableCreateError::InvalidChunkDimensionality(
                self.chunk_shape.len(),
                self.shape.len(),
            ));
        }
        if self.chunk_shape.contains(&0) {
            return Err(VariableCreateError::InvalidChunkShape(
                self.chunk_shape.clone(),
            ));
        }
        self.chunk_shape
            .iter()
            .try_fold(self.data_type.size(), |size, &chunk_len| {
                size.checked_mul(usize::try_from(chunk_len).ok()?)
            })
            .ok_or_else(|| VariableCreateError::ChunkTooLarge(self.chunk_shape.clone()))
    }

    /// Build into a [`Variable`] at `path` of `storage`, caching chunks in a [`ChunkCacheLru`].
    ///
    /// `path` is an absolute path such as `/group/variable`.
    /// Chunks are stored under the path without its leading `/`.
    ///
    /// # Errors
    /// Returns a [`VariableCreateError`] if the path, chunk shape, or fill value is invalid.
    pub fn build(
        &self,
        storage: ReadableWritableStorage,
        path: &str,
    ) -> Result<Variable, VariableCreateError> {
        let chunk_cache = ChunkCacheLru::new(
            storage,
            path_to_prefix(path)?,
            self.chunk_key_encoding,
            self.chunk_size()?,
            self.chunk_cache_capacity,
        );
        self.build_with_cache(Arc::new(chunk_cache), path)
    }

    /// Build into a [`Variable`] at `path` with a custom `chunk_cache`.
    ///
    /// # Errors
    /// Returns a [`VariableCreateError`] if the path, chunk shape, or fill value is invalid, or the chunk size of `chunk_cache` does not match.
    pub fn build_with_cache(
        &self,
        chunk_cache: Arc<dyn ChunkCache>,
        path: &str,
    ) -> Result<Variable, VariableCreateError> {
        path_to_prefix(path)?;
        let chunk_size = self.chunk_size()?;
        if chunk_cache.chunk_size() != chunk_size {
            return Err(VariableCreateError::InvalidChunkCacheSize(
                chunk_cache.chunk_size(),
                chunk_size,
            ));
        }
        if let Some(fill_value) = &self.fill_value
            && fill_value.size() != self.data_type.size()
        {
            return Err(VariableCreateError::InvalidFillValue {
                data_type: self.data_type,
                fill_value: fill_value.clone(),
            });
        }
        Ok(Variable {
            path: path.to_string(),
            shape: self.shape.clone(),
            data_type: self.data_type,
            chunk_shape: self.chunk_shape.clone(),
            fill_value: self.fill_value.clone(),
            endianness: self.endianness,
            chunk_cache,
        })
    }
}

/// Convert an absolute variable path to the store prefix of its chunks.
fn path_to_prefix(path: &str) -> Result<StorePrefix, VariableCreateError> {
    let valid = path == "/"
        || path
            .strip_prefix('/')
            .is_some_and(|rest| rest.split('/').all(|component| !component.is_empty()));
    if !valid {
        return Err(VariableCreateError::InvalidPath(path.to_string()));
    }
    let prefix = path.trim_start_matches('/');
    if prefix.is_empty() {
        Ok(StorePrefix::root())
    } else {
        Ok(StorePrefix::new(format!("{prefix}/"))?)
    }
}

#[cfg(test)]
mod tests {
    use nczarrs_storage::store::MemoryStore;

    use super::*;

    #[test]
    fn path_prefix() {
        assert_eq!(path_to_prefix("/").unwrap(), StorePrefix::root());
        assert_eq!(
            path_to_prefix("/group/var").unwrap(),
            StorePrefix::new("group/var/").unwrap()
        );
        for path in ["", "var", "/var/", "//var", "/group//var"] {
            assert!(matches!(
                path_to_prefix(path),
                Err(VariableCreateError::InvalidPath(_))
            ));
        }
    }

    #[test]
    fn builder_invalid() {
        let store = Arc::new(MemoryStore::new());
        assert!(matches!(
            VariableBuilder::new(vec![4, 4], DataType::Int, vec![2]).build(store.clone(), "/v"),
            Err(VariableCreateError::InvalidChunkDimensionality(1, 2))
        ));
        assert!(matches!(
            VariableBuilder::new(vec![4], DataType::Int, vec![0]).build(store.clone(), "/v"),
            Err(VariableCreateError::InvalidChunkShape(_))
        ));
        assert!(matches!(
            VariableBuilder::new(vec![4], DataType::Int, vec![2])
                .fill_value(1u8)
                .build(store.clone(), "/v"),
            Err(VariableCreateError::InvalidFillValue { .. })
        ));
        assert!(matches!(
            VariableBuilder::new(vec![4], DataType::Int, vec![u64::MAX]).build(store, "/v"),
            Err(VariableCreateError::ChunkTooLarge(_))
        ));
    }

    #[test]
    fn builder_from_variable() {
        let store = Arc::new(MemoryStore::new());
        let variable = VariableBuilder::new(vec![3], DataType::UShort, vec![3])
            .fill_value(7u16)
            .endianness(Endianness::Big)
            .build(store.clone(), "/a")
            .unwrap();
        let copy = VariableBuilder::from_variable(&variable)
            .build(store, "/b")
            .unwrap();
        assert_eq!(copy.fill_value(), variable.fill_value());
        assert_eq!(copy.endianness(), Endianness::Big);
        assert_eq!(copy.chunk_shape(), &[3]);
    }
}
