//! Skip list store
//!
//! Nodes live in an arena (`Vec<Node>`) and link to each other by index.
//! Slot 0 is the header sentinel: it owns one forward link per possible
//! level and never holds a record.
//!
//! ```text
//! Level 2:  HEAD ───────────────► c ─────────────────► NIL
//! Level 1:  HEAD ───────► b ────► c ───────► e ──────► NIL
//! Level 0:  HEAD ──► a ─► b ─► c ─► d ─► e ─► f ─────► NIL
//! ```
//!
//! ## Invariants
//! - At every level the linked keys are strictly ascending
//! - A node linked at level i is linked at every level below i
//! - `height` is the number of levels with at least one node (min 1)

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::config::{LEVEL_PROBABILITY, MAX_LEVEL};

use super::{before_end, OrderedStore, RangeIterator};

/// Arena slot of the header sentinel
const HEAD: usize = 0;

// =============================================================================
// Level Generation
// =============================================================================

/// Source of node heights
///
/// Returns the number of levels a new node occupies. Values outside
/// `1..=MAX_LEVEL` are clamped by the store.
pub trait LevelGenerator {
    fn random_level(&mut self) -> usize;
}

/// Geometric level distribution: promoted with `LEVEL_PROBABILITY` per level
#[derive(Debug, Clone)]
pub struct RandomLevels<R> {
    rng: R,
}

impl<R: Rng> RandomLevels<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> LevelGenerator for RandomLevels<R> {
    fn random_level(&mut self) -> usize {
        let mut level = 1;
        while level < MAX_LEVEL && self.rng.gen_bool(LEVEL_PROBABILITY) {
            level += 1;
        }
        level
    }
}

/// Any closure can script node heights (used to force layouts in tests)
impl<F: FnMut() -> usize> LevelGenerator for F {
    fn random_level(&mut self) -> usize {
        self()
    }
}

// =============================================================================
// Skip List
// =============================================================================

#[derive(Debug, Default)]
struct Node {
    key: Vec<u8>,
    value: Vec<u8>,
    /// `forward[i]` is the next node at level i; len = node height
    forward: Vec<Option<usize>>,
}

/// Skip list store with an injectable level generator
pub struct SkipListStore<G = RandomLevels<SmallRng>> {
    /// Slot 0 is the header
    nodes: Vec<Node>,
    /// Slots of deleted nodes, reused by later inserts
    free: Vec<usize>,
    /// Levels currently in use
    height: usize,
    len: usize,
    levels: G,
}

impl SkipListStore {
    /// Create a skip list seeded from OS entropy
    pub fn new() -> Self {
        Self::with_levels(RandomLevels::new(SmallRng::from_entropy()))
    }

    /// Create a skip list with a reproducible level sequence
    pub fn with_seed(seed: u64) -> Self {
        Self::with_levels(RandomLevels::new(SmallRng::seed_from_u64(seed)))
    }
}

impl Default for SkipListStore {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: LevelGenerator> SkipListStore<G> {
    /// Create a skip list drawing node heights from `levels`
    pub fn with_levels(levels: G) -> Self {
        let header = Node {
            key: Vec::new(),
            value: Vec::new(),
            forward: vec![None; MAX_LEVEL],
        };
        Self {
            nodes: vec![header],
            free: Vec::new(),
            height: 1,
            len: 0,
            levels,
        }
    }

    /// Number of levels currently in use
    pub fn height(&self) -> usize {
        self.height
    }

    /// Keys linked at `level`, in link order
    pub fn level_keys(&self, level: usize) -> Vec<&[u8]> {
        let mut keys = Vec::new();
        if level >= MAX_LEVEL {
            return keys;
        }
        let mut cur = self.nodes[HEAD].forward[level];
        while let Some(id) = cur {
            let node = &self.nodes[id];
            keys.push(node.key.as_slice());
            cur = node.forward.get(level).copied().flatten();
        }
        keys
    }

    /// Last node at each level whose key is strictly less than `key`
    fn find_predecessors(&self, key: &[u8]) -> [usize; MAX_LEVEL] {
        let mut update = [HEAD; MAX_LEVEL];
        let mut x = HEAD;
        for level in (0..self.height).rev() {
            while let Some(next) = self.nodes[x].forward[level] {
                if self.nodes[next].key.as_slice() < key {
                    x = next;
                } else {
                    break;
                }
            }
            update[level] = x;
        }
        update
    }

    /// First node with key >= `key`
    fn lower_bound(&self, key: &[u8]) -> Option<usize> {
        let mut x = HEAD;
        for level in (0..self.height).rev() {
            while let Some(next) = self.nodes[x].forward[level] {
                if self.nodes[next].key.as_slice() < key {
                    x = next;
                } else {
                    break;
                }
            }
        }
        self.nodes[x].forward[0]
    }

    fn alloc(&mut self, node: Node) -> usize {
        match self.free.pop() {
            Some(id) => {
                self.nodes[id] = node;
                id
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }
}

impl<G: LevelGenerator> OrderedStore for SkipListStore<G> {
    fn put(&mut self, key: &[u8], value: &[u8]) {
        let update = self.find_predecessors(key);

        if let Some(next) = self.nodes[update[0]].forward[0] {
            if self.nodes[next].key.as_slice() == key {
                self.nodes[next].value = value.to_vec();
                return;
            }
        }

        let level = self.levels.random_level().clamp(1, MAX_LEVEL);
        // Levels above the old height have the header as predecessor,
        // which `update` already holds
        if level > self.height {
            self.height = level;
        }

        let forward = (0..level)
            .map(|l| self.nodes[update[l]].forward[l])
            .collect();
        let id = self.alloc(Node {
            key: key.to_vec(),
            value: value.to_vec(),
            forward,
        });
        for (l, &pred) in update.iter().enumerate().take(level) {
            self.nodes[pred].forward[l] = Some(id);
        }
        self.len += 1;
    }

    fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.lower_bound(key)
            .map(|id| &self.nodes[id])
            .filter(|node| node.key.as_slice() == key)
            .map(|node| node.value.as_slice())
    }

    fn delete(&mut self, key: &[u8]) {
        let update = self.find_predecessors(key);

        let target = match self.nodes[update[0]].forward[0] {
            Some(id) if self.nodes[id].key.as_slice() == key => id,
            _ => return,
        };

        let removed = std::mem::take(&mut self.nodes[target]);
        for (l, next) in removed.forward.into_iter().enumerate() {
            let pred = update[l];
            debug_assert_eq!(self.nodes[pred].forward[l], Some(target));
            self.nodes[pred].forward[l] = next;
        }

        while self.height > 1 && self.nodes[HEAD].forward[self.height - 1].is_none() {
            self.height -= 1;
        }

        self.free.push(target);
        self.len -= 1;
    }

    fn range_scan<'a>(&'a self, start: &[u8], end: &[u8]) -> Box<dyn RangeIterator + 'a> {
        Box::new(SkipListIterator {
            nodes: &self.nodes,
            current: self.lower_bound(start),
            end: end.to_vec(),
        })
    }

    fn len(&self) -> usize {
        self.len
    }
}

/// Walks level 0 links
struct SkipListIterator<'a> {
    nodes: &'a [Node],
    current: Option<usize>,
    end: Vec<u8>,
}

impl<'a> SkipListIterator<'a> {
    fn node(&self) -> &'a Node {
        match self.current {
            Some(id) if before_end(&self.nodes[id].key, &self.end) => &self.nodes[id],
            _ => panic!("read from an exhausted iterator"),
        }
    }
}

impl RangeIterator for SkipListIterator<'_> {
    fn is_valid(&self) -> bool {
        self.current
            .map_or(false, |id| before_end(&self.nodes[id].key, &self.end))
    }

    fn key(&self) -> &[u8] {
        &self.node().key
    }

    fn value(&self) -> &[u8] {
        &self.node().value
    }

    fn next(&mut self) -> bool {
        if let Some(id) = self.current {
            self.current = self.nodes[id].forward[0];
        }
        self.is_valid()
    }
}
