#![allow(missing_docs)]

use std::sync::{Arc, Mutex};

use nczarrs::storage::{
    StorageError, StoreKey, StorePrefix,
    storage_adapter::performance_metrics::PerformanceMetricsStorageAdapter, store::MemoryStore,
};
use nczarrs::variable::{
    ArrayShape, ChunkCache, ChunkCacheLru, ChunkGuard, ChunkKeyEncoding, ChunkStatus, DataType,
    Endianness, TransferBuffer, TransferOptions, TransferPath, VariableBuilder,
};

/// A chunk cache recording the chunk indices of each read.
struct RecordingChunkCache {
    inner: ChunkCacheLru,
    requests: Mutex<Vec<Vec<u64>>>,
}

impl RecordingChunkCache {
    fn new(inner: ChunkCacheLru) -> Self {
        Self {
            inner,
            requests: Mutex::default(),
        }
    }

    fn take_requests(&self) -> Vec<Vec<u64>> {
        std::mem::take(&mut self.requests.lock().unwrap())
    }
}

impl ChunkCache for RecordingChunkCache {
    fn read_chunk(&self, chunk_indices: &[u64]) -> Result<(ChunkStatus, ChunkGuard), StorageError> {
        self.requests.lock().unwrap().push(chunk_indices.to_vec());
        self.inner.read_chunk(chunk_indices)
    }

    fn flush(&self) -> Result<(), StorageError> {
        self.inner.flush()
    }

    fn chunk_size(&self) -> usize {
        self.inner.chunk_size()
    }

    fn len(&self) -> usize {
        self.inner.len()
    }
}

fn recording_cache(chunk_size: usize) -> Arc<RecordingChunkCache> {
    let store = Arc::new(MemoryStore::new());
    Arc::new(RecordingChunkCache::new(ChunkCacheLru::new(
        store,
        StorePrefix::new("var/").unwrap(),
        ChunkKeyEncoding::default(),
        chunk_size,
        16,
    )))
}

#[test]
fn transfer_4x4_chunk_2x2_visit_order() -> Result<(), Box<dyn std::error::Error>> {
    let cache = recording_cache(2 * 2 * 4);
    let variable = VariableBuilder::new(vec![4, 4], DataType::Int, vec![2, 2])
        .build_with_cache(cache.clone(), "/var")?;
    let options = TransferOptions::default();

    let elements: Vec<i32> = (0..16).collect();
    variable.store_slice_elements(&[0, 0], &[4, 4], &[1, 1], &elements, &options)?;
    cache.take_requests();

    let mut bytes = vec![0u8; 2 * 2 * 4];
    let summary = variable.transfer_slice(
        TransferBuffer::Read(&mut bytes),
        &[1, 1],
        &[2, 2],
        &[1, 1],
        DataType::Int.type_code(),
        &options,
    )?;
    assert_eq!(
        cache.take_requests(),
        vec![vec![0, 0], vec![0, 1], vec![1, 0], vec![1, 1]]
    );
    assert_eq!(summary.path(), TransferPath::Chunked);
    assert_eq!(summary.chunks_visited(), 4);
    assert_eq!(summary.chunks_skipped(), 0);
    assert_eq!(summary.runs(), 4);
    assert_eq!(summary.elements(), 4);
    let elements: &[i32] = bytemuck::cast_slice(&bytes);
    assert_eq!(elements, &[5, 6, 9, 10]);
    Ok(())
}

#[test]
fn transfer_whole_variable() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let variable =
        VariableBuilder::new(vec![10], DataType::UShort, vec![10]).build(store, "/var")?;
    let options = TransferOptions::default();

    let elements: Vec<u16> = (100..110).collect();
    let summary = variable.store_slice_elements(&[0], &[10], &[1], &elements, &options)?;
    assert_eq!(summary.path(), TransferPath::WholeVariable);

    let mut bytes = vec![0u8; 20];
    let summary = variable.retrieve_slice(&[0], &[10], &[1], &mut bytes, &options)?;
    assert_eq!(summary.path(), TransferPath::WholeVariable);
    assert_eq!(summary.chunks_visited(), 1);
    assert_eq!(summary.runs(), 1);
    assert_eq!(summary.elements(), 10);
    assert_eq!(bytemuck::cast_slice::<u8, u16>(&bytes), elements.as_slice());
    Ok(())
}

#[test]
fn transfer_whole_variable_log() -> Result<(), Box<dyn std::error::Error>> {
    testing_logger::setup();
    let store = Arc::new(MemoryStore::new());
    let variable = VariableBuilder::new(vec![3, 2], DataType::Int, vec![3, 2])
        .build(store, "/logged")?;
    let options = TransferOptions::default().with_verbosity(1);
    variable.retrieve_slice_elements::<i32>(&[0, 0], &[3, 2], &[1, 1], &options)?;
    testing_logger::validate(|captured_logs| {
        assert!(captured_logs.iter().any(|log| {
            log.level == log::Level::Debug
                && log.body.contains("/logged")
                && log.body.contains("whole variable fast path")
        }));
    });
    Ok(())
}

#[test]
fn transfer_fill_value() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let variable = VariableBuilder::new(vec![6, 4], DataType::Int, vec![4, 4])
        .fill_value(-1i32)
        .build(store, "/var")?;
    let options = TransferOptions::default();
    let elements: Vec<i32> = variable.retrieve_slice_elements(&[0, 0], &[6, 4], &[1, 1], &options)?;
    assert_eq!(elements, vec![-1; 24]);

    // a partial write leaves the remainder of the chunk filled
    variable.store_slice_elements(&[5, 1], &[1, 2], &[1, 1], &[7i32, 8], &options)?;
    let elements: Vec<i32> = variable.retrieve_slice_elements(&[4, 0], &[2, 4], &[1, 1], &options)?;
    assert_eq!(elements, vec![-1, -1, -1, -1, -1, 7, 8, -1]);
    Ok(())
}

#[test]
fn transfer_fill_value_read_twice() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let variable = VariableBuilder::new(vec![4], DataType::Short, vec![2])
        .fill_value(0x0102i16)
        .endianness(Endianness::Big)
        .build(store, "/var")?;
    let first = variable.read_chunk_bytes(&[1])?;
    let second = variable.read_chunk_bytes(&[1])?;
    assert_eq!(first, second);
    assert_eq!(first, vec![1, 2, 1, 2]);
    assert!(variable.read_chunk_bytes(&[2]).is_err());
    assert!(variable.read_chunk_bytes(&[0, 0]).is_err());
    Ok(())
}

#[test]
fn transfer_scalar() -> Result<(), Box<dyn std::error::Error>> {
    let cache = recording_cache(4);
    let variable = VariableBuilder::new(ArrayShape::new(), DataType::Int, ArrayShape::new())
        .fill_value(3i32)
        .build_with_cache(cache.clone(), "/scalar")?;
    let options = TransferOptions::default();

    let elements: Vec<i32> = variable.retrieve_slice_elements(&[], &[], &[], &options)?;
    assert_eq!(elements, vec![3]);

    let summary = variable.store_slice_elements(&[], &[], &[], &[42i32], &options)?;
    assert_eq!(summary.path(), TransferPath::Scalar);
    assert_eq!(summary.elements(), 1);
    assert_eq!(cache.take_requests(), vec![vec![0], vec![0]]);

    let elements: Vec<i32> = variable.retrieve_slice_elements(&[], &[], &[], &options)?;
    assert_eq!(elements, vec![42]);
    assert_eq!(variable.read_chunk_bytes(&[])?, 42i32.to_le_bytes());
    assert_eq!(variable.read_chunk_bytes(&[0])?, 42i32.to_le_bytes());
    Ok(())
}

#[test]
fn transfer_scalar_big_endian() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let variable = VariableBuilder::new(ArrayShape::new(), DataType::Int, ArrayShape::new())
        .fill_value(3i32)
        .endianness(Endianness::Big)
        .build(store, "/scalar")?;
    let options = TransferOptions::default();

    assert_eq!(variable.read_chunk_bytes(&[])?, 3i32.to_be_bytes());
    let elements: Vec<i32> = variable.retrieve_slice_elements(&[], &[], &[], &options)?;
    assert_eq!(elements, vec![3]);

    variable.store_slice_elements(&[], &[], &[], &[0x0102_0304i32], &options)?;
    assert_eq!(variable.read_chunk_bytes(&[])?, 0x0102_0304i32.to_be_bytes());
    assert_eq!(variable.read_chunk_bytes(&[])?, [1, 2, 3, 4]);
    let elements: Vec<i32> = variable.retrieve_slice_elements(&[], &[], &[], &options)?;
    assert_eq!(elements, vec![0x0102_0304]);
    Ok(())
}

#[test]
fn transfer_skipped_chunks_not_fetched() -> Result<(), Box<dyn std::error::Error>> {
    let memory = Arc::new(MemoryStore::new());
    let store = Arc::new(PerformanceMetricsStorageAdapter::new(memory.clone()));
    let variable = VariableBuilder::new(vec![12], DataType::Int64, vec![4])
        .build(store.clone(), "/v")?;
    let options = TransferOptions::default();

    // positions 1 and 9 live in chunks 0 and 2, chunk 1 holds no selected position
    let summary = variable.store_slice_elements(&[1], &[2], &[8], &[11i64, 99], &options)?;
    assert_eq!(summary.chunks_visited(), 2);
    assert_eq!(summary.chunks_skipped(), 1);
    assert_eq!(store.reads(), 2);

    variable.flush()?;
    assert_eq!(store.writes(), 2);
    assert_eq!(
        memory.keys(&StorePrefix::new("v/")?),
        vec![StoreKey::new("v/0")?, StoreKey::new("v/2")?]
    );
    assert_eq!(store.metrics().misses, 2);

    let elements: Vec<i64> = variable.retrieve_slice_elements(&[0], &[12], &[1], &options)?;
    let mut expected = vec![0i64; 12];
    expected[1] = 11;
    expected[9] = 99;
    assert_eq!(elements, expected);
    Ok(())
}
