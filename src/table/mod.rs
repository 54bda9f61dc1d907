//! Table Module
//!
//! Immutable on-disk snapshot of an ordered store, with a sparse index.
//!
//! ## File Format (little-endian)
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Data Section (ascending keys)                           │
//! │   [KeyLen: u32][Key][ValLen: u32][Value]                │
//! │   ... repeated for each record ...                      │
//! ├─────────────────────────────────────────────────────────┤
//! │ Index Section (one entry per ~BLOCK_SIZE of data)       │
//! │   [KeyLen: u32][Key][Offset: u32]                       │
//! │   ... repeated for each entry ...                       │
//! ├─────────────────────────────────────────────────────────┤
//! │ Footer (4 bytes)                                        │
//! │   IndexStart: u32                                       │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! The first record always starts a block, and so does the last one, so a
//! non-empty table has at least one index entry and its final record is
//! always addressable.

mod iterator;
mod reader;
mod writer;

use std::ops::Range;

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{Result, SparseError};

pub use iterator::TableIterator;
pub use reader::Table;
pub use writer::{flush, flush_to_path, TableSummary, TableWriter};

/// Size of each length / offset field
pub(crate) const LEN_SIZE: usize = 4;

/// One sparse index entry: the block at `offset` begins with `key`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparseIndexEntry {
    pub key: Vec<u8>,
    pub offset: u32,
}

// =============================================================================
// Shared Encoding (used by writer, reader, iterator)
// =============================================================================

/// Convert a length or offset to its u32 field
pub(crate) fn to_u32(n: u64, what: &str) -> Result<u32> {
    u32::try_from(n).map_err(|_| SparseError::TooLarge(format!("{} of {} bytes", what, n)))
}

/// Append `len | key | len | value`
pub(crate) fn encode_record(buf: &mut BytesMut, key: &[u8], value: &[u8]) -> Result<()> {
    let key_len = to_u32(key.len() as u64, "key")?;
    let value_len = to_u32(value.len() as u64, "value")?;
    buf.reserve(2 * LEN_SIZE + key.len() + value.len());
    buf.put_u32_le(key_len);
    buf.put_slice(key);
    buf.put_u32_le(value_len);
    buf.put_slice(value);
    Ok(())
}

/// Append `len | key | offset`
pub(crate) fn encode_index_entry(buf: &mut BytesMut, entry: &SparseIndexEntry) -> Result<()> {
    let key_len = to_u32(entry.key.len() as u64, "index key")?;
    buf.reserve(2 * LEN_SIZE + entry.key.len());
    buf.put_u32_le(key_len);
    buf.put_slice(&entry.key);
    buf.put_u32_le(entry.offset);
    Ok(())
}

/// Position of one decoded record inside a buffer
#[derive(Debug, Clone)]
pub(crate) struct RecordLayout {
    pub key: Range<usize>,
    pub value: Range<usize>,
    /// Total encoded size
    pub len: usize,
}

/// Decode the record at the start of `data`; `offset` is its file position
///
/// The record must lie entirely inside `data`: the buffer always ends on a
/// block boundary, so running out of bytes means the table is damaged.
pub(crate) fn decode_record(data: &[u8], offset: u64) -> Result<RecordLayout> {
    let mut buf = data;

    let key_len = read_len(&mut buf, offset, "key length")?;
    let key_start = data.len() - buf.remaining();
    if buf.remaining() < key_len {
        return Err(corrupt_record(offset, &format!("key of {} bytes overruns block", key_len)));
    }
    buf.advance(key_len);

    let value_len = read_len(&mut buf, offset, "value length")?;
    let value_start = data.len() - buf.remaining();
    if buf.remaining() < value_len {
        return Err(corrupt_record(
            offset,
            &format!(
                "value of {} bytes for key {:?} overruns block",
                value_len,
                String::from_utf8_lossy(&data[key_start..key_start + key_len])
            ),
        ));
    }

    Ok(RecordLayout {
        key: key_start..key_start + key_len,
        value: value_start..value_start + value_len,
        len: value_start + value_len,
    })
}

fn read_len(buf: &mut &[u8], offset: u64, what: &str) -> Result<usize> {
    if buf.remaining() < LEN_SIZE {
        return Err(corrupt_record(offset, &format!("truncated {}", what)));
    }
    Ok(buf.get_u32_le() as usize)
}

fn corrupt_record(offset: u64, detail: &str) -> SparseError {
    SparseError::CorruptedTable(format!("record at offset {}: {}", offset, detail))
}
