//! Table Reader
//!
//! Opens a table by loading only its sparse index. Point lookups binary-search
//! the index, then scan one block.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use bytes::{Buf, Bytes};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::config::FOOTER_SIZE;
use crate::error::{Result, SparseError};

use super::iterator::TableIterator;
use super::{decode_record, SparseIndexEntry, LEN_SIZE};

/// An opened, read-only table
///
/// The source sits behind a lock so lookups take `&self`; one table can serve
/// readers on several threads.
pub struct Table<R> {
    source: Mutex<R>,
    index: Vec<SparseIndexEntry>,
    /// Start of the index section == end of the data section
    index_offset: u64,
    len_bytes: u64,
}

impl Table<BufReader<File>> {
    /// Open a table file
    pub fn open_path(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| SparseError::io(format!("opening {}", path.display()), e))?;
        Self::open(BufReader::new(file))
    }
}

impl<R: Read + Seek> Table<R> {
    /// Parse the footer and sparse index of a table
    ///
    /// Besides a short file, a footer past the end, and a truncated index
    /// entry, `open` also rejects layouts no [`TableWriter`] produces:
    /// - a non-empty data section with no index entries
    /// - a first index entry not at offset 0
    /// - index keys or offsets that do not strictly ascend
    /// - an index offset at or beyond the start of the index section
    ///
    /// Each of these would leave records unreachable by [`Table::get`], so
    /// they are reported as [`SparseError::CorruptedTable`].
    ///
    /// [`TableWriter`]: crate::table::TableWriter
    pub fn open(mut source: R) -> Result<Self> {
        let len_bytes = source
            .seek(SeekFrom::End(0))
            .map_err(|e| SparseError::io("seeking to end of table", e))?;

        if len_bytes < FOOTER_SIZE {
            return Err(corrupted(format!(
                "table is {} bytes, smaller than its {} byte footer",
                len_bytes, FOOTER_SIZE
            )));
        }
        let index_end = len_bytes - FOOTER_SIZE;

        let mut footer = [0u8; FOOTER_SIZE as usize];
        source
            .seek(SeekFrom::Start(index_end))
            .and_then(|_| source.read_exact(&mut footer))
            .map_err(|e| SparseError::io("reading index start location", e))?;
        let index_offset = u64::from(u32::from_le_bytes(footer));

        if index_offset > index_end {
            return Err(corrupted(format!(
                "index start {} is past index end {}",
                index_offset, index_end
            )));
        }

        let index = if index_offset == index_end {
            Vec::new()
        } else {
            let raw = read_range(&mut source, index_offset, index_end)?;
            parse_index(&raw, index_offset)?
        };
        validate_index(&index, index_offset)?;

        debug!(
            index_entries = index.len(),
            index_offset,
            bytes = len_bytes,
            "table opened"
        );

        Ok(Self {
            source: Mutex::new(source),
            index,
            index_offset,
            len_bytes,
        })
    }

    /// Point lookup
    ///
    /// Reads at most one block: the last one whose first key is <= `key`.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let slot = self.index.partition_point(|e| e.key.as_slice() <= key);
        if slot == 0 {
            return Ok(None);
        }

        let block_start = u64::from(self.index[slot - 1].offset);
        let block = self.read_block(slot - 1)?;

        let mut pos = 0;
        while pos < block.len() {
            let record = decode_record(&block[pos..], block_start + pos as u64)?;
            let found = &block[pos + record.key.start..pos + record.key.end];
            match found.cmp(key) {
                std::cmp::Ordering::Equal => {
                    let value = &block[pos + record.value.start..pos + record.value.end];
                    return Ok(Some(value.to_vec()));
                }
                std::cmp::Ordering::Greater => return Ok(None),
                std::cmp::Ordering::Less => pos += record.len,
            }
        }
        Ok(None)
    }

    /// Iterate records with key in `[start, end)`; empty bounds are open
    pub fn range_scan(&self, start: &[u8], end: &[u8]) -> Result<TableIterator<'_, R>> {
        TableIterator::new(self, start, end)
    }

    /// Iterate every record
    pub fn iter(&self) -> Result<TableIterator<'_, R>> {
        self.range_scan(b"", b"")
    }

    /// Bytes of block `slot`, from its index offset to the next block start
    pub(super) fn read_block(&self, slot: usize) -> Result<Bytes> {
        let start = u64::from(self.index[slot].offset);
        let end = self
            .index
            .get(slot + 1)
            .map_or(self.index_offset, |e| u64::from(e.offset));
        let mut source = self.source.lock();
        read_range(&mut *source, start, end).map(Bytes::from)
    }
}

impl<R> Table<R> {
    /// The sparse index, ascending
    pub fn index(&self) -> &[SparseIndexEntry] {
        &self.index
    }

    /// Start of the index section
    pub fn index_offset(&self) -> u64 {
        self.index_offset
    }

    /// Total table size in bytes
    pub fn len_bytes(&self) -> u64 {
        self.len_bytes
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Smallest key in the table
    pub fn first_key(&self) -> Option<&[u8]> {
        self.index.first().map(|e| e.key.as_slice())
    }

    /// Largest key in the table (the last record is always indexed)
    pub fn last_key(&self) -> Option<&[u8]> {
        self.index.last().map(|e| e.key.as_slice())
    }

    /// Quick check if a key might be in this table (range check)
    pub fn might_contain(&self, key: &[u8]) -> bool {
        match (self.first_key(), self.last_key()) {
            (Some(first), Some(last)) => key >= first && key <= last,
            _ => false,
        }
    }
}

// =============================================================================
// Private Helpers
// =============================================================================

fn corrupted(detail: String) -> SparseError {
    warn!(%detail, "corrupted table");
    SparseError::CorruptedTable(detail)
}

fn read_range<R: Read + Seek>(source: &mut R, start: u64, end: u64) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; (end - start) as usize];
    source
        .seek(SeekFrom::Start(start))
        .and_then(|_| source.read_exact(&mut buf))
        .map_err(|e| SparseError::io(format!("reading bytes {}..{}", start, end), e))?;
    Ok(buf)
}

/// Parse `len | key | offset` entries until the section is used up exactly
fn parse_index(raw: &[u8], index_offset: u64) -> Result<Vec<SparseIndexEntry>> {
    let mut buf = raw;
    let mut index = Vec::new();

    while buf.has_remaining() {
        let at = index_offset + (raw.len() - buf.remaining()) as u64;

        if buf.remaining() < LEN_SIZE {
            return Err(corrupted(format!(
                "index entry {} at offset {}: truncated key length",
                index.len(),
                at
            )));
        }
        let key_len = buf.get_u32_le() as usize;

        if buf.remaining() < key_len {
            return Err(corrupted(format!(
                "index entry {} at offset {}: key of {} bytes truncated",
                index.len(),
                at,
                key_len
            )));
        }
        let key = buf[..key_len].to_vec();
        buf.advance(key_len);

        if buf.remaining() < LEN_SIZE {
            return Err(corrupted(format!(
                "index entry {} at offset {}: truncated block offset for key {:?}",
                index.len(),
                at,
                String::from_utf8_lossy(&key)
            )));
        }
        let offset = buf.get_u32_le();

        index.push(SparseIndexEntry { key, offset });
    }

    Ok(index)
}

/// Index must start the data section, ascend strictly, and stay inside it
fn validate_index(index: &[SparseIndexEntry], index_offset: u64) -> Result<()> {
    match index.first() {
        None if index_offset > 0 => {
            return Err(corrupted(format!(
                "{} bytes of records but no index entries",
                index_offset
            )))
        }
        Some(first) if first.offset != 0 => {
            return Err(corrupted(format!(
                "first index entry points at offset {}, not 0",
                first.offset
            )))
        }
        _ => {}
    }

    for pair in index.windows(2) {
        if pair[1].key <= pair[0].key || pair[1].offset <= pair[0].offset {
            return Err(corrupted(format!(
                "index not ascending at key {:?} (offset {})",
                String::from_utf8_lossy(&pair[1].key),
                pair[1].offset
            )));
        }
    }

    if let Some(last) = index.last() {
        if u64::from(last.offset) >= index_offset {
            return Err(corrupted(format!(
                "index entry offset {} is outside the data section (ends at {})",
                last.offset, index_offset
            )));
        }
    }

    Ok(())
}
