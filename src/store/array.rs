//! Array-backed store
//!
//! Sorted `Vec` of records; binary search for lookup, shifting for
//! insert/delete.

use super::{before_end, OrderedStore, RangeIterator};

/// Sorted contiguous store
#[derive(Debug, Default, Clone)]
pub struct ArrayStore {
    records: Vec<(Vec<u8>, Vec<u8>)>,
}

impl ArrayStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn search(&self, key: &[u8]) -> std::result::Result<usize, usize> {
        self.records.binary_search_by(|(k, _)| k.as_slice().cmp(key))
    }
}

impl OrderedStore for ArrayStore {
    fn put(&mut self, key: &[u8], value: &[u8]) {
        match self.search(key) {
            Ok(pos) => self.records[pos].1 = value.to_vec(),
            Err(pos) => self.records.insert(pos, (key.to_vec(), value.to_vec())),
        }
    }

    fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.search(key).ok().map(|pos| self.records[pos].1.as_slice())
    }

    fn delete(&mut self, key: &[u8]) {
        if let Ok(pos) = self.search(key) {
            self.records.remove(pos);
        }
    }

    fn range_scan<'a>(&'a self, start: &[u8], end: &[u8]) -> Box<dyn RangeIterator + 'a> {
        // Lower bound: first record with key >= start
        let pos = self.records.partition_point(|(k, _)| k.as_slice() < start);
        Box::new(ArrayIterator {
            records: &self.records,
            pos,
            end: end.to_vec(),
        })
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}

/// Cursor over a slice of the sorted records
struct ArrayIterator<'a> {
    records: &'a [(Vec<u8>, Vec<u8>)],
    pos: usize,
    end: Vec<u8>,
}

impl RangeIterator for ArrayIterator<'_> {
    fn is_valid(&self) -> bool {
        self.records
            .get(self.pos)
            .map_or(false, |(k, _)| before_end(k, &self.end))
    }

    fn key(&self) -> &[u8] {
        assert!(self.is_valid(), "key() called on an exhausted iterator");
        &self.records[self.pos].0
    }

    fn value(&self) -> &[u8] {
        assert!(self.is_valid(), "value() called on an exhausted iterator");
        &self.records[self.pos].1
    }

    fn next(&mut self) -> bool {
        if self.pos < self.records.len() {
            self.pos += 1;
        }
        self.is_valid()
    }
}
