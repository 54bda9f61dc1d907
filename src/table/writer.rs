//! Table Writer
//!
//! Serializes records (ascending keys) into the table format, recording a
//! sparse index entry every `BLOCK_SIZE` bytes of data.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use bytes::BytesMut;
use tracing::{info, trace};

use crate::config::BLOCK_SIZE;
use crate::error::{Result, SparseError};
use crate::store::OrderedStore;

use super::{encode_index_entry, encode_record, to_u32, SparseIndexEntry};

/// What a finished table contains
#[derive(Debug, Clone)]
pub struct TableSummary {
    /// Number of records in the data section
    pub record_count: u64,
    /// Sparse index, as written
    pub index: Vec<SparseIndexEntry>,
    /// Where the index section starts (the footer value)
    pub index_offset: u32,
    /// Total bytes written, footer included
    pub total_bytes: u64,
}

/// Builder writing a table to any byte sink
///
/// Call `add()` in strictly ascending key order, then `finish()`.
pub struct TableWriter<W: Write> {
    sink: W,
    /// Bytes written so far
    offset: u64,
    /// The next record starting at or past this offset opens a block
    next_checkpoint: u64,
    index: Vec<SparseIndexEntry>,
    /// Key and offset of the most recent record
    last: Option<(Vec<u8>, u32)>,
    record_count: u64,
    /// Scratch space for encoding
    buf: BytesMut,
}

impl<W: Write> TableWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            offset: 0,
            next_checkpoint: 0,
            index: Vec::new(),
            last: None,
            record_count: 0,
            buf: BytesMut::new(),
        }
    }

    /// Append one record
    pub fn add(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        if let Some((prev, _)) = &self.last {
            if key <= prev.as_slice() {
                return Err(SparseError::UnorderedKey(format!(
                    "{:?} after {:?}",
                    String::from_utf8_lossy(key),
                    String::from_utf8_lossy(prev)
                )));
            }
        }

        let start = to_u32(self.offset, "data section")?;

        if u64::from(start) >= self.next_checkpoint {
            trace!(key = %String::from_utf8_lossy(key), offset = start, "index entry");
            self.index.push(SparseIndexEntry {
                key: key.to_vec(),
                offset: start,
            });
            self.next_checkpoint = u64::from(start) + u64::from(BLOCK_SIZE);
        }

        self.buf.clear();
        encode_record(&mut self.buf, key, value)?;
        self.sink.write_all(&self.buf).map_err(|e| {
            SparseError::io(
                format!(
                    "writing record for key {:?} ({} byte value) at offset {}",
                    String::from_utf8_lossy(key),
                    value.len(),
                    start
                ),
                e,
            )
        })?;

        self.offset += self.buf.len() as u64;
        self.last = Some((key.to_vec(), start));
        self.record_count += 1;
        Ok(())
    }

    /// Write index and footer, returning the summary and the sink
    pub fn finish_into_inner(mut self) -> Result<(TableSummary, W)> {
        // The final block must be addressable even if it was not a checkpoint
        if let Some((key, offset)) = self.last.take() {
            if self.index.last().map(|e| e.offset) != Some(offset) {
                trace!(key = %String::from_utf8_lossy(&key), offset, "final index entry");
                self.index.push(SparseIndexEntry { key, offset });
            }
        }

        let index_offset = to_u32(self.offset, "data section")?;

        self.buf.clear();
        for entry in &self.index {
            encode_index_entry(&mut self.buf, entry)?;
        }
        self.buf.extend_from_slice(&index_offset.to_le_bytes());

        self.sink
            .write_all(&self.buf)
            .map_err(|e| SparseError::io(format!("writing index at offset {}", index_offset), e))?;
        self.sink
            .flush()
            .map_err(|e| SparseError::io("flushing table", e))?;

        let total_bytes = self.offset + self.buf.len() as u64;

        info!(
            records = self.record_count,
            index_entries = self.index.len(),
            bytes = total_bytes,
            "table written"
        );

        let summary = TableSummary {
            record_count: self.record_count,
            index: self.index,
            index_offset,
            total_bytes,
        };
        Ok((summary, self.sink))
    }

    /// Write index and footer
    pub fn finish(self) -> Result<TableSummary> {
        self.finish_into_inner().map(|(summary, _)| summary)
    }
}

/// Snapshot a whole store into `sink`
pub fn flush<S, W>(store: &S, sink: W) -> Result<TableSummary>
where
    S: OrderedStore + ?Sized,
    W: Write,
{
    write_store(store, TableWriter::new(sink)).map(|(summary, _)| summary)
}

/// Snapshot a whole store into a new file at `path`, synced before returning
pub fn flush_to_path<S>(store: &S, path: &Path) -> Result<TableSummary>
where
    S: OrderedStore + ?Sized,
{
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .map_err(|e| SparseError::io(format!("creating {}", path.display()), e))?;

    let (summary, writer) = write_store(store, TableWriter::new(BufWriter::new(file)))?;

    let file: File = writer
        .into_inner()
        .map_err(|e| SparseError::io("flushing table buffer", e.into_error()))?;
    file.sync_all()
        .map_err(|e| SparseError::io(format!("syncing {}", path.display()), e))?;

    Ok(summary)
}

fn write_store<S, W>(store: &S, mut writer: TableWriter<W>) -> Result<(TableSummary, W)>
where
    S: OrderedStore + ?Sized,
    W: Write,
{
    let mut iter = store.range_scan(b"", b"");
    if iter.is_valid() {
        loop {
            writer.add(iter.key(), iter.value())?;
            if !iter.next() {
                break;
            }
        }
    }
    writer.finish_into_inner()
}
