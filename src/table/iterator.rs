//! Table Iterator
//!
//! Range scan over a table, one block in memory at a time. Crossing into the
//! next block re-reads from the source at the next index offset.

use std::io::{Read, Seek};

use bytes::{Buf, Bytes};

use crate::error::Result;
use crate::store::before_end;

use super::decode_record;
use super::reader::Table;

/// Forward-only cursor over a table key range
///
/// Same shape as [`crate::store::RangeIterator`], except that advancing can
/// fail with an I/O or corruption error.
pub struct TableIterator<'a, R> {
    table: &'a Table<R>,
    /// Next block to load once `block` is used up
    next_slot: usize,
    /// Unread remainder of the current block
    block: Bytes,
    /// File offset of the first byte of `block`
    block_offset: u64,
    /// Upper bound (empty = none)
    end: Vec<u8>,
    current: Option<(Bytes, Bytes)>,
}

impl<'a, R: Read + Seek> TableIterator<'a, R> {
    pub(super) fn new(table: &'a Table<R>, start: &[u8], end: &[u8]) -> Result<Self> {
        // Last block whose first key is <= start; keys before it are all smaller
        let slot = table
            .index()
            .partition_point(|e| e.key.as_slice() <= start)
            .saturating_sub(1);

        let mut iter = Self {
            table,
            next_slot: slot,
            block: Bytes::new(),
            block_offset: 0,
            end: end.to_vec(),
            current: None,
        };

        while let Some((key, value)) = iter.read_next()? {
            if key.as_ref() >= start {
                if before_end(&key, &iter.end) {
                    iter.current = Some((key, value));
                }
                break;
            }
        }
        Ok(iter)
    }

    /// Advance; returns whether a current record now exists
    pub fn next(&mut self) -> Result<bool> {
        if self.current.is_none() {
            return Ok(false);
        }
        self.current = match self.read_next()? {
            Some((key, value)) if before_end(&key, &self.end) => Some((key, value)),
            _ => None,
        };
        Ok(self.current.is_some())
    }

    /// Drain the remaining records into owned pairs
    pub fn collect_pairs(mut self) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut out = Vec::new();
        while let Some((key, value)) = &self.current {
            out.push((key.to_vec(), value.to_vec()));
            self.next()?;
        }
        Ok(out)
    }

    /// Decode the next record in file order, loading blocks as needed
    fn read_next(&mut self) -> Result<Option<(Bytes, Bytes)>> {
        while self.block.is_empty() {
            if self.next_slot >= self.table.index().len() {
                return Ok(None);
            }
            self.block = self.table.read_block(self.next_slot)?;
            self.block_offset = u64::from(self.table.index()[self.next_slot].offset);
            self.next_slot += 1;
        }

        let record = decode_record(&self.block, self.block_offset)?;
        let key = self.block.slice(record.key);
        let value = self.block.slice(record.value);
        self.block.advance(record.len);
        self.block_offset += record.len as u64;
        Ok(Some((key, value)))
    }
}

impl<R> TableIterator<'_, R> {
    /// Whether a current record exists
    pub fn is_valid(&self) -> bool {
        self.current.is_some()
    }

    /// Key of the current record
    ///
    /// # Panics
    /// When the iterator is exhausted.
    pub fn key(&self) -> &[u8] {
        match &self.current {
            Some((key, _)) => key,
            None => panic!("key() called on an exhausted table iterator"),
        }
    }

    /// Value of the current record
    ///
    /// # Panics
    /// When the iterator is exhausted.
    pub fn value(&self) -> &[u8] {
        match &self.current {
            Some((_, value)) => value,
            None => panic!("value() called on an exhausted table iterator"),
        }
    }
}
