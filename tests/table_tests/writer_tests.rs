//! Tests for the table writer
//!
//! These tests verify:
//! - Exact byte layout of small tables
//! - Sparse index checkpointing every BLOCK_SIZE bytes
//! - The final-record index entry
//! - Ordering enforcement and sink failures

use std::io::{self, Write};

use sparsekv::config::BLOCK_SIZE;
use sparsekv::table::{flush, flush_to_path, SparseIndexEntry, TableWriter};
use sparsekv::{ArrayStore, OrderedStore, SkipListStore, SparseError};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn record_size(key: &[u8], value: &[u8]) -> u32 {
    (8 + key.len() + value.len()) as u32
}

fn footer(bytes: &[u8]) -> u32 {
    u32::from_le_bytes(bytes[bytes.len() - 4..].try_into().unwrap())
}

/// Record offsets obtained by walking the data section
fn record_offsets(bytes: &[u8], index_offset: usize) -> Vec<u32> {
    let mut offsets = Vec::new();
    let mut pos = 0;
    while pos < index_offset {
        offsets.push(pos as u32);
        let key_len = u32::from_le_bytes(bytes[pos..pos + 4].try_into().unwrap()) as usize;
        pos += 4 + key_len;
        let value_len = u32::from_le_bytes(bytes[pos..pos + 4].try_into().unwrap()) as usize;
        pos += 4 + value_len;
    }
    assert_eq!(pos, index_offset);
    offsets
}

/// A sink that fails after accepting `budget` bytes
struct FailingSink {
    budget: usize,
}

impl Write for FailingSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.budget == 0 {
            return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
        }
        let n = buf.len().min(self.budget);
        self.budget -= n;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// =============================================================================
// Layout Tests
// =============================================================================

#[test]
fn test_single_record_layout() {
    let mut store = ArrayStore::new();
    store.put(b"k", b"v");

    let mut bytes = Vec::new();
    let summary = flush(&store, &mut bytes).unwrap();

    assert_eq!(summary.record_count, 1);
    assert_eq!(
        summary.index,
        vec![SparseIndexEntry {
            key: b"k".to_vec(),
            offset: 0
        }]
    );
    assert_eq!(summary.index_offset, record_size(b"k", b"v"));
    assert_eq!(footer(&bytes), record_size(b"k", b"v"));

    let expected: Vec<u8> = [
        &1u32.to_le_bytes()[..],
        b"k",
        &1u32.to_le_bytes()[..],
        b"v",
        // index: len | key | offset
        &1u32.to_le_bytes()[..],
        b"k",
        &0u32.to_le_bytes()[..],
        // footer
        &10u32.to_le_bytes()[..],
    ]
    .concat();
    assert_eq!(bytes, expected);
    assert_eq!(summary.total_bytes, bytes.len() as u64);
}

#[test]
fn test_empty_store_layout() {
    let store = ArrayStore::new();
    let mut bytes = Vec::new();
    let summary = flush(&store, &mut bytes).unwrap();

    assert_eq!(bytes, 0u32.to_le_bytes().to_vec());
    assert_eq!(summary.record_count, 0);
    assert!(summary.index.is_empty());
    assert_eq!(summary.index_offset, 0);
}

#[test]
fn test_empty_key_and_value() {
    let mut store = ArrayStore::new();
    store.put(b"", b"");
    let mut bytes = Vec::new();
    let summary = flush(&store, &mut bytes).unwrap();

    assert_eq!(summary.index.len(), 1);
    assert_eq!(summary.index[0].key, Vec::<u8>::new());
    assert_eq!(summary.index_offset, 8);
}

// =============================================================================
// Sparse Index Tests
// =============================================================================

#[test]
fn test_checkpoint_every_block() {
    // 100-byte values: records of 8 + 6 + 100 = 114 bytes
    let mut store = SkipListStore::with_seed(11);
    for i in 0..200 {
        store.put(format!("key{:03}", i).as_bytes(), &[b'x'; 100]);
    }

    let mut bytes = Vec::new();
    let summary = flush(&store, &mut bytes).unwrap();
    let offsets = record_offsets(&bytes, summary.index_offset as usize);
    assert_eq!(offsets.len(), 200);

    // Entries land on the first record at or past each checkpoint
    let mut expected = Vec::new();
    let mut checkpoint = 0;
    for (i, &offset) in offsets.iter().enumerate() {
        if offset >= checkpoint {
            expected.push(i);
            checkpoint = offset + BLOCK_SIZE;
        }
    }
    if *expected.last().unwrap() != offsets.len() - 1 {
        expected.push(offsets.len() - 1);
    }

    let got: Vec<u32> = summary.index.iter().map(|e| e.offset).collect();
    let want: Vec<u32> = expected.iter().map(|&i| offsets[i]).collect();
    assert_eq!(got, want);
    assert!(summary.index.len() > 2);
}

#[test]
fn test_index_is_monotonic_and_on_record_boundaries() {
    let mut store = SkipListStore::with_seed(12);
    for i in 0..3_000u32 {
        let key = format!("{:x}", i.wrapping_mul(2_654_435_761));
        store.put(key.as_bytes(), &vec![b'v'; (i % 50) as usize]);
    }

    let mut bytes = Vec::new();
    let summary = flush(&store, &mut bytes).unwrap();
    let offsets = record_offsets(&bytes, summary.index_offset as usize);

    for pair in summary.index.windows(2) {
        assert!(pair[0].key < pair[1].key);
        assert!(pair[0].offset < pair[1].offset);
    }
    for entry in &summary.index {
        assert!(offsets.binary_search(&entry.offset).is_ok());
    }
    assert_eq!(summary.index[0].offset, 0);
    assert_eq!(summary.index.last().unwrap().offset, *offsets.last().unwrap());
}

#[test]
fn test_last_record_not_duplicated_when_it_is_a_checkpoint() {
    // Second record starts exactly at BLOCK_SIZE
    let big_value = vec![b'x'; BLOCK_SIZE as usize - 9];
    let mut writer = TableWriter::new(Vec::new());
    writer.add(b"a", &big_value).unwrap();
    writer.add(b"b", b"").unwrap();
    let summary = writer.finish().unwrap();

    let offsets: Vec<u32> = summary.index.iter().map(|e| e.offset).collect();
    assert_eq!(offsets, vec![0, BLOCK_SIZE]);
}

// =============================================================================
// Error Tests
// =============================================================================

#[test]
fn test_writer_rejects_unordered_keys() {
    let mut writer = TableWriter::new(Vec::new());
    writer.add(b"b", b"1").unwrap();
    assert!(matches!(
        writer.add(b"a", b"2"),
        Err(SparseError::UnorderedKey(_))
    ));
    assert!(matches!(
        writer.add(b"b", b"3"),
        Err(SparseError::UnorderedKey(_))
    ));
}

#[test]
fn test_sink_failure_is_propagated() {
    let mut store = ArrayStore::new();
    for i in 0..100 {
        store.put(format!("key{:03}", i).as_bytes(), b"value");
    }
    let result = flush(&store, FailingSink { budget: 500 });
    match result {
        Err(SparseError::IoContext { context, source }) => {
            assert!(context.contains("key"), "context was {:?}", context);
            assert_eq!(source.kind(), io::ErrorKind::Other);
        }
        other => panic!("expected IoContext error, got {:?}", other.map(|s| s.record_count)),
    }
}

// =============================================================================
// File Tests
// =============================================================================

#[test]
fn test_flush_to_path_matches_in_memory_flush() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("store.sst");

    let mut store = ArrayStore::new();
    for i in 0..1_000 {
        store.put(format!("key{:05}", i).as_bytes(), format!("value{}", i).as_bytes());
    }

    let summary = flush_to_path(&store, &path).unwrap();
    let mut bytes = Vec::new();
    flush(&store, &mut bytes).unwrap();

    assert_eq!(std::fs::read(&path).unwrap(), bytes);
    assert_eq!(summary.total_bytes, bytes.len() as u64);
}
