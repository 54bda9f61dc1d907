//! Store Module
//!
//! In-memory ordered key-value stores sharing one contract.
//!
//! ## Implementations
//! - [`ArrayStore`]: sorted `Vec`, binary search, O(n) insert/delete
//! - [`LinkedListStore`]: sorted singly-linked chain, O(n) everything
//! - [`SkipListStore`]: probabilistic levels, expected O(log n)
//!
//! All three behave identically through [`OrderedStore`]; only their cost
//! differs.
//!
//! ## Range Sentinels
//! `range_scan(start, end)` covers `[start, end)`. An empty `start` is the
//! smallest possible key anyway, so it means "from the first key". An empty
//! `end` means "no upper bound", not "stop before the empty key".

mod array;
mod linked_list;
mod skiplist;

pub use array::ArrayStore;
pub use linked_list::LinkedListStore;
pub use skiplist::{LevelGenerator, RandomLevels, SkipListStore};

/// Ordered key-value store contract
///
/// Keys are unique; ordering is byte-wise lexicographic.
pub trait OrderedStore {
    /// Insert a record, overwriting the value if the key exists
    fn put(&mut self, key: &[u8], value: &[u8]);

    /// Look up a key
    fn get(&self, key: &[u8]) -> Option<&[u8]>;

    /// Remove a key; absent keys are a no-op
    fn delete(&mut self, key: &[u8]);

    /// Iterate records with key in `[start, end)` in ascending order
    ///
    /// See the module docs for the empty-key sentinels.
    fn range_scan<'a>(&'a self, start: &[u8], end: &[u8]) -> Box<dyn RangeIterator + 'a>;

    /// Number of live records
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Forward-only cursor over a key range
///
/// Positioned at the first matching record on creation. Single pass.
pub trait RangeIterator {
    /// Whether a current record exists
    fn is_valid(&self) -> bool;

    /// Key of the current record
    ///
    /// # Panics
    /// When the iterator is exhausted. Check `is_valid()` or the result of
    /// `next()` first.
    fn key(&self) -> &[u8];

    /// Value of the current record
    ///
    /// # Panics
    /// When the iterator is exhausted.
    fn value(&self) -> &[u8];

    /// Advance; returns whether a current record now exists
    fn next(&mut self) -> bool;
}

/// Drain an iterator into owned pairs
pub fn collect_range<I: RangeIterator + ?Sized>(iter: &mut I) -> Vec<(Vec<u8>, Vec<u8>)> {
    let mut out = Vec::new();
    if !iter.is_valid() {
        return out;
    }
    loop {
        out.push((iter.key().to_vec(), iter.value().to_vec()));
        if !iter.next() {
            break;
        }
    }
    out
}

/// Whether `key` falls before the (possibly unbounded) upper bound
#[inline]
pub(crate) fn before_end(key: &[u8], end: &[u8]) -> bool {
    end.is_empty() || key < end
}

/// The three store implementations, by name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Array,
    LinkedList,
    SkipList,
}

impl StoreKind {
    pub const ALL: [StoreKind; 3] = [StoreKind::Array, StoreKind::LinkedList, StoreKind::SkipList];

    /// Create an empty store of this kind
    pub fn build(self) -> Box<dyn OrderedStore> {
        match self {
            StoreKind::Array => Box::new(ArrayStore::new()),
            StoreKind::LinkedList => Box::new(LinkedListStore::new()),
            StoreKind::SkipList => Box::new(SkipListStore::new()),
        }
    }

    /// Report name
    pub fn name(self) -> &'static str {
        match self {
            StoreKind::Array => "simple",
            StoreKind::LinkedList => "linked list",
            StoreKind::SkipList => "skip list",
        }
    }
}
