//! Page handles, and the table that keeps them in address order.

use crate::arena::Arena;
use crate::interval::{IntersectKind, Interval};
use crate::list::{Chain, List, Links, Walk};
use crate::pagevec::PageVecError;
use crate::slab::{Key, Slab};

/// A committed, page-aligned range handed out to the caller.
#[derive(Copy, Clone, Debug)]
pub struct Handle {
    pub region: Interval,
    /// The lowest-address arena overlapping `region`.
    pub first_arena: Key,
    sorted: Links,
}

pub struct ByAddress;

impl Chain<Handle> for ByAddress {
    fn links(node: &Handle) -> &Links {
        &node.sorted
    }
    fn links_mut(node: &mut Handle) -> &mut Links {
        &mut node.sorted
    }
}

/// All live handles, ascending by address.
#[derive(Default)]
pub struct HandleTable {
    slab: Slab<Handle>,
    sorted: List<ByAddress>,
}

impl HandleTable {
    pub const fn new() -> Self {
        HandleTable {
            slab: Slab::new(),
            sorted: List::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    pub fn get(&self, key: Key) -> &Handle {
        self.slab.get(key)
    }

    pub fn get_mut(&mut self, key: Key) -> &mut Handle {
        self.slab.get_mut(key)
    }

    pub fn region(&self, key: Key) -> Interval {
        self.slab.get(key).region
    }

    pub fn generation(&self, key: Key) -> u32 {
        self.slab.generation(key)
    }

    pub fn is_live(&self, key: Key, generation: u32) -> bool {
        self.slab.is_live(key, generation)
    }

    pub fn head(&self) -> Option<Key> {
        self.sorted.head()
    }

    pub fn next(&self, key: Key) -> Option<Key> {
        self.sorted.next(&self.slab, key)
    }

    pub fn prev(&self, key: Key) -> Option<Key> {
        self.sorted.prev(&self.slab, key)
    }

    /// Ensure the next `additional` creates cannot fail.
    pub fn reserve(&mut self, additional: usize) -> Result<(), PageVecError> {
        self.slab.reserve(additional)
    }

    /// Create a handle record. It is not on the sorted list until linked.
    pub fn create(&mut self, region: Interval, first_arena: Key) -> Result<Key, PageVecError> {
        self.slab.insert(Handle {
            region,
            first_arena,
            sorted: Links::default(),
        })
    }

    /// Link `key` right after `anchor`, or at the front if `anchor` is `None`.
    pub fn link_after(&mut self, anchor: Option<Key>, key: Key) {
        self.sorted.insert_after(&mut self.slab, anchor, key);
    }

    /// Link `key` right before `anchor`, or at the back if `anchor` is `None`.
    pub fn link_before(&mut self, anchor: Option<Key>, key: Key) {
        self.sorted.insert_before(&mut self.slab, anchor, key);
    }

    /// Unlink and forget a handle.
    pub fn remove(&mut self, key: Key) -> Handle {
        self.sorted.remove(&mut self.slab, key);
        self.slab.remove(key)
    }

    /// Handles overlapping `arena`, in address order.
    pub fn residents<'a>(&'a self, arena: &Arena) -> Residents<'a> {
        Residents {
            table: self,
            next: arena.first_resident,
            span: arena.span,
        }
    }

    /// The first handle after `key` that still overlaps `span`.
    pub fn next_resident(&self, key: Key, span: Interval) -> Option<Key> {
        let next = self.next(key)?;
        if self.region(next).overlaps(&span) {
            Some(next)
        } else {
            None
        }
    }

    /// All handles in address order.
    pub fn iter(&self) -> Walk<'_, Handle, ByAddress> {
        self.sorted.iter(&self.slab)
    }
}

/// The handles living (at least partly) in one arena.
///
/// Starts at the arena's first resident and stops at the first handle that
/// lies wholly past the arena.
pub struct Residents<'a> {
    table: &'a HandleTable,
    next: Option<Key>,
    span: Interval,
}

impl<'a> Iterator for Residents<'a> {
    type Item = Key;

    fn next(&mut self) -> Option<Key> {
        let key = self.next?;
        if self.table.region(key).classify(&self.span) == IntersectKind::FullyAfter {
            self.next = None;
            return None;
        }
        self.next = self.table.next(key);
        Some(key)
    }
}
