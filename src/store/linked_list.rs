//! Linked-list store
//!
//! Singly-linked chain kept in ascending key order. Every operation walks
//! from the head.

use super::{before_end, OrderedStore, RangeIterator};

type Link = Option<Box<Node>>;

#[derive(Debug)]
struct Node {
    key: Vec<u8>,
    value: Vec<u8>,
    next: Link,
}

/// Sorted singly-linked store
#[derive(Debug, Default)]
pub struct LinkedListStore {
    head: Link,
    len: usize,
}

impl LinkedListStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The link holding the first node with key >= `key` (or the tail link)
    fn seek_mut(&mut self, key: &[u8]) -> &mut Link {
        let mut link = &mut self.head;
        while matches!(link, Some(node) if node.key.as_slice() < key) {
            if let Some(node) = link {
                link = &mut node.next;
            }
        }
        link
    }

    /// First node with key >= `key`
    fn seek(&self, key: &[u8]) -> Option<&Node> {
        let mut cur = self.head.as_deref();
        while let Some(node) = cur {
            if node.key.as_slice() >= key {
                return Some(node);
            }
            cur = node.next.as_deref();
        }
        None
    }
}

impl OrderedStore for LinkedListStore {
    fn put(&mut self, key: &[u8], value: &[u8]) {
        let link = self.seek_mut(key);
        if let Some(node) = link {
            if node.key.as_slice() == key {
                node.value = value.to_vec();
                return;
            }
        }
        let next = link.take();
        *link = Some(Box::new(Node {
            key: key.to_vec(),
            value: value.to_vec(),
            next,
        }));
        self.len += 1;
    }

    fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.seek(key)
            .filter(|node| node.key.as_slice() == key)
            .map(|node| node.value.as_slice())
    }

    fn delete(&mut self, key: &[u8]) {
        let link = self.seek_mut(key);
        if !matches!(link, Some(node) if node.key.as_slice() == key) {
            return;
        }
        if let Some(mut node) = link.take() {
            *link = node.next.take();
            self.len -= 1;
        }
    }

    fn range_scan<'a>(&'a self, start: &[u8], end: &[u8]) -> Box<dyn RangeIterator + 'a> {
        Box::new(LinkedListIterator {
            current: self.seek(start),
            end: end.to_vec(),
        })
    }

    fn len(&self) -> usize {
        self.len
    }
}

impl Drop for LinkedListStore {
    // Unlink iteratively; the default recursive drop overflows on long chains
    fn drop(&mut self) {
        let mut link = self.head.take();
        while let Some(mut node) = link {
            link = node.next.take();
        }
    }
}

struct LinkedListIterator<'a> {
    current: Option<&'a Node>,
    end: Vec<u8>,
}

impl<'a> LinkedListIterator<'a> {
    fn node(&self) -> &'a Node {
        match self.current {
            Some(node) if before_end(&node.key, &self.end) => node,
            _ => panic!("read from an exhausted iterator"),
        }
    }
}

impl RangeIterator for LinkedListIterator<'_> {
    fn is_valid(&self) -> bool {
        self.current
            .map_or(false, |node| before_end(&node.key, &self.end))
    }

    fn key(&self) -> &[u8] {
        &self.node().key
    }

    fn value(&self) -> &[u8] {
        &self.node().value
    }

    fn next(&mut self) -> bool {
        if let Some(node) = self.current {
            self.current = node.next.as_deref();
        }
        self.is_valid()
    }
}
