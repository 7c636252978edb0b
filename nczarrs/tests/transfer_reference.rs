#![allow(missing_docs)]

use std::sync::Arc;

use itertools::Itertools;
use nczarrs::storage::store::MemoryStore;
use nczarrs::variable::{
    DataType, Endianness, TransferOptions, TransferPath, Variable, VariableBuilder,
};

/// A dense row-major model of a variable.
struct Model {
    shape: Vec<u64>,
    elements: Vec<i32>,
}

impl Model {
    fn new(shape: &[u64], fill: i32) -> Self {
        let num_elements = usize::try_from(shape.iter().product::<u64>()).unwrap();
        Self {
            shape: shape.to_vec(),
            elements: vec![fill; num_elements],
        }
    }

    fn linear(&self, position: &[u64]) -> usize {
        let index = std::iter::zip(position, &self.shape)
            .fold(0, |index, (&i, &len)| index * len + i);
        usize::try_from(index).unwrap()
    }

    /// The selected positions in memory order, or [`None`] for memory positions beyond the variable.
    fn selection(&self, start: &[u64], count: &[u64], stride: &[u64]) -> Vec<Option<usize>> {
        count
            .iter()
            .map(|&count| 0..count)
            .multi_cartesian_product()
            .map(|memory| {
                let position: Vec<u64> = (0..memory.len())
                    .map(|dim| start[dim] + memory[dim] * stride[dim])
                    .collect();
                std::iter::zip(&position, &self.shape)
                    .all(|(i, len)| i < len)
                    .then(|| self.linear(&position))
            })
            .collect()
    }

    fn store(&mut self, start: &[u64], count: &[u64], stride: &[u64], memory: &[i32]) {
        for (selected, &value) in std::iter::zip(self.selection(start, count, stride), memory) {
            if let Some(index) = selected {
                self.elements[index] = value;
            }
        }
    }

    fn retrieve(&self, start: &[u64], count: &[u64], stride: &[u64], untouched: i32) -> Vec<i32> {
        self.selection(start, count, stride)
            .into_iter()
            .map(|selected| selected.map_or(untouched, |index| self.elements[index]))
            .collect()
    }
}

struct Case {
    shape: &'static [u64],
    chunk_shape: &'static [u64],
    start: &'static [u64],
    count: &'static [u64],
    stride: &'static [u64],
}

const CASES: &[Case] = &[
    Case {
        shape: &[10],
        chunk_shape: &[3],
        start: &[1],
        count: &[4],
        stride: &[2],
    },
    Case {
        shape: &[10],
        chunk_shape: &[2],
        start: &[0],
        count: &[3],
        stride: &[5],
    },
    Case {
        shape: &[7, 9],
        chunk_shape: &[3, 4],
        start: &[1, 2],
        count: &[3, 3],
        stride: &[2, 3],
    },
    Case {
        shape: &[5, 6],
        chunk_shape: &[5, 6],
        start: &[0, 1],
        count: &[5, 5],
        stride: &[1, 1],
    },
    Case {
        shape: &[4, 5, 6],
        chunk_shape: &[2, 3, 4],
        start: &[0, 1, 1],
        count: &[4, 2, 5],
        stride: &[1, 2, 1],
    },
    Case {
        shape: &[4, 5, 6],
        chunk_shape: &[3, 2, 5],
        start: &[1, 0, 2],
        count: &[2, 5, 2],
        stride: &[2, 1, 3],
    },
    // count extends beyond the variable
    Case {
        shape: &[6, 6],
        chunk_shape: &[4, 4],
        start: &[3, 4],
        count: &[4, 3],
        stride: &[1, 1],
    },
    // zero count
    Case {
        shape: &[6, 6],
        chunk_shape: &[4, 4],
        start: &[2, 6],
        count: &[2, 0],
        stride: &[1, 1],
    },
];

fn variable(case: &Case, endianness: Endianness) -> Variable {
    let store = Arc::new(MemoryStore::new());
    VariableBuilder::new(case.shape, DataType::Int, case.chunk_shape)
        .fill_value(-7i32)
        .endianness(endianness)
        .chunk_cache_capacity(3)
        .build(store, "/reference")
        .unwrap()
}

#[test]
fn transfer_matches_model() -> Result<(), Box<dyn std::error::Error>> {
    for (case, endianness, optimize, whole_variable_fast_path) in itertools::iproduct!(
        CASES,
        [Endianness::Little, Endianness::Big],
        [false, true],
        [false, true]
    ) {
        let options = TransferOptions::default()
            .with_optimize(optimize)
            .with_whole_variable_fast_path(whole_variable_fast_path);
        let variable = variable(case, endianness);
        let mut model = Model::new(case.shape, -7);

        let num_memory = usize::try_from(case.count.iter().product::<u64>()).unwrap();
        let memory: Vec<i32> = (1..=i32::try_from(num_memory).unwrap()).collect();
        variable.store_slice_elements(case.start, case.count, case.stride, &memory, &options)?;
        model.store(case.start, case.count, case.stride, &memory);

        let ones = vec![1; case.shape.len()];
        let elements: Vec<i32> =
            variable.retrieve_slice_elements(&vec![0; case.shape.len()], case.shape, &ones, &options)?;
        assert_eq!(elements, model.elements, "{:?}", case.shape);

        let elements: Vec<i32> =
            variable.retrieve_slice_elements(case.start, case.count, case.stride, &options)?;
        assert_eq!(
            elements,
            model.retrieve(case.start, case.count, case.stride, 0),
            "{:?} {:?} {:?}",
            case.start,
            case.count,
            case.stride
        );
    }
    Ok(())
}

#[test]
fn transfer_summary_counts() -> Result<(), Box<dyn std::error::Error>> {
    let case = &CASES[2];
    let variable = variable(case, Endianness::Little);
    let selected = 9;
    for optimize in [false, true] {
        let options = TransferOptions::default().with_optimize(optimize);
        let summary = variable.store_slice_elements(
            case.start,
            case.count,
            case.stride,
            &[0i32; 9],
            &options,
        )?;
        assert_eq!(summary.path(), TransferPath::Chunked);
        assert_eq!(summary.elements(), selected);
        assert_eq!(
            summary.chunks_visited() + summary.chunks_skipped(),
            // rows 1..=5 touch chunk rows 0..=1, columns 2..=8 touch chunk columns 0..=2
            2 * 3
        );
        // a stride of 3 selects one element per chunk row, so every run holds one element
        assert_eq!(summary.runs(), selected);
    }
    Ok(())
}

#[test]
fn transfer_runs_contiguous() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let variable = VariableBuilder::new(vec![4, 8], DataType::Float, vec![2, 8])
        .build(store, "/runs")?;
    let elements: Vec<f32> = (0..24u8).map(f32::from).collect();

    let options = TransferOptions::default();
    let summary = variable.store_slice_elements(&[1, 1], &[3, 8], &[1, 1], &elements, &options)?;
    assert_eq!(summary.runs(), 3);
    assert_eq!(summary.elements(), 21);

    let options = options.with_optimize(false);
    let summary = variable.store_slice_elements(&[1, 1], &[3, 8], &[1, 1], &elements, &options)?;
    assert_eq!(summary.runs(), 21);
    assert_eq!(summary.elements(), 21);
    Ok(())
}

#[test]
fn transfer_stored_byte_order() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let variable = VariableBuilder::new(vec![7, 9], DataType::Short, vec![3, 4])
        .endianness(Endianness::Big)
        .build(store, "/big")?;
    let options = TransferOptions::default();
    let elements: Vec<i16> = (0..9).map(|i| 0x0100 * i + 0x0a).collect();
    variable.store_slice_elements(&[1, 2], &[3, 3], &[2, 3], &elements, &options)?;

    // (1, 2) is the first element written, local position (1, 2) of chunk (0, 0)
    let chunk = variable.read_chunk_bytes(&[0, 0])?;
    assert_eq!(&chunk[12..14], &elements[0].to_be_bytes());

    // (5, 8) is the last element written, local position (2, 0) of chunk (1, 2)
    let chunk = variable.read_chunk_bytes(&[1, 2])?;
    assert_eq!(&chunk[16..18], &elements[8].to_be_bytes());

    let read: Vec<i16> = variable.retrieve_slice_elements(&[1, 2], &[3, 3], &[2, 3], &options)?;
    assert_eq!(read, elements);
    Ok(())
}

#[test]
fn transfer_whole_variable_fast_path_equivalent() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let variable = VariableBuilder::new(vec![5, 3], DataType::UInt, vec![5, 3])
        .endianness(Endianness::Big)
        .build(store, "/whole")?;
    let elements: Vec<u32> = (0..15).map(|i| i * 1000 + 1).collect();

    let fast = TransferOptions::default();
    let slow = TransferOptions::default().with_whole_variable_fast_path(false);
    let summary = variable.store_slice_elements(&[0, 0], &[5, 3], &[1, 1], &elements, &fast)?;
    assert_eq!(summary.path(), TransferPath::WholeVariable);

    let mut bytes_fast = vec![0u8; 60];
    let mut bytes_slow = vec![0u8; 60];
    variable.retrieve_slice(&[0, 0], &[5, 3], &[1, 1], &mut bytes_fast, &fast)?;
    let summary = variable.retrieve_slice(&[0, 0], &[5, 3], &[1, 1], &mut bytes_slow, &slow)?;
    assert_eq!(summary.path(), TransferPath::Chunked);
    assert_eq!(summary.elements(), 15);
    assert_eq!(bytes_fast, bytes_slow);
    assert_eq!(bytemuck::cast_slice::<u8, u32>(&bytes_fast), elements.as_slice());

    // a count overshooting the variable does not take the fast path
    let mut bytes = vec![0u8; 72];
    let summary = variable.retrieve_slice(&[0, 0], &[6, 3], &[1, 1], &mut bytes, &fast)?;
    assert_eq!(summary.path(), TransferPath::Chunked);
    assert_eq!(&bytes[..60], bytes_fast.as_slice());
    assert_eq!(&bytes[60..], &[0u8; 12]);
    Ok(())
}
