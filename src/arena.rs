//! Arenas, and the table that keeps them in address order.

use crate::interval::{IntersectKind, Interval};
use crate::list::{Chain, List, Links, Walk};
use crate::pagevec::PageVecError;
use crate::slab::{Key, Slab};

/// One contiguous reservation obtained from the page source.
#[derive(Copy, Clone, Debug)]
pub struct Arena {
    /// `[base, base + size)`; both ends are multiples of the granularity.
    pub span: Interval,
    /// Number of live handles overlapping `span`.
    pub refcount: usize,
    /// The lowest-address handle overlapping `span`.
    pub first_resident: Option<Key>,
    sorted: Links,
    all: Links,
}

impl Arena {
    fn new(span: Interval) -> Self {
        Arena {
            span,
            refcount: 0,
            first_resident: None,
            sorted: Links::default(),
            all: Links::default(),
        }
    }
}

pub struct BySorted;

impl Chain<Arena> for BySorted {
    fn links(node: &Arena) -> &Links {
        &node.sorted
    }
    fn links_mut(node: &mut Arena) -> &mut Links {
        &mut node.sorted
    }
}

pub struct ByAll;

impl Chain<Arena> for ByAll {
    fn links(node: &Arena) -> &Links {
        &node.all
    }
    fn links_mut(node: &mut Arena) -> &mut Links {
        &mut node.all
    }
}

/// All live arenas.
///
/// Every arena is on two lists: `sorted`, ascending by address, which is
/// what searches and neighbor lookups walk; and `all`, in creation order,
/// which teardown walks.
#[derive(Default)]
pub struct ArenaTable {
    slab: Slab<Arena>,
    sorted: List<BySorted>,
    all: List<ByAll>,
}

impl ArenaTable {
    pub const fn new() -> Self {
        ArenaTable {
            slab: Slab::new(),
            sorted: List::new(),
            all: List::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    pub fn get(&self, key: Key) -> &Arena {
        self.slab.get(key)
    }

    pub fn get_mut(&mut self, key: Key) -> &mut Arena {
        self.slab.get_mut(key)
    }

    pub fn span(&self, key: Key) -> Interval {
        self.slab.get(key).span
    }

    pub fn head(&self) -> Option<Key> {
        self.sorted.head()
    }

    pub fn tail(&self) -> Option<Key> {
        self.sorted.tail()
    }

    pub fn next(&self, key: Key) -> Option<Key> {
        self.sorted.next(&self.slab, key)
    }

    pub fn prev(&self, key: Key) -> Option<Key> {
        self.sorted.prev(&self.slab, key)
    }

    /// Ensure the next `additional` inserts cannot fail.
    pub fn reserve(&mut self, additional: usize) -> Result<(), PageVecError> {
        self.slab.reserve(additional)
    }

    /// Add an arena directly after `hint` in address order, or at the front
    /// if `hint` is `None`.
    pub fn insert_after(&mut self, hint: Option<Key>, span: Interval) -> Result<Key, PageVecError> {
        let key = self.slab.insert(Arena::new(span))?;
        self.sorted.insert_after(&mut self.slab, hint, key);
        self.all.push_back(&mut self.slab, key);
        debug_assert!(self.is_ordered_around(key));
        Ok(key)
    }

    /// Add an arena directly before `hint` in address order, or at the back
    /// if `hint` is `None`.
    pub fn insert_before(&mut self, hint: Option<Key>, span: Interval) -> Result<Key, PageVecError> {
        let key = self.slab.insert(Arena::new(span))?;
        self.sorted.insert_before(&mut self.slab, hint, key);
        self.all.push_back(&mut self.slab, key);
        debug_assert!(self.is_ordered_around(key));
        Ok(key)
    }

    /// Add an arena wherever it belongs, searching from the back of the list.
    pub fn insert_sorted(&mut self, span: Interval) -> Result<Key, PageVecError> {
        let after = self
            .sorted
            .iter_back_from(&self.slab, self.sorted.tail())
            .find(|&k| self.slab.get(k).span.start < span.start);
        self.insert_after(after, span)
    }

    /// Unlink and forget an arena.
    pub fn remove(&mut self, key: Key) -> Arena {
        self.sorted.remove(&mut self.slab, key);
        self.all.remove(&mut self.slab, key);
        self.slab.remove(key)
    }

    /// First arena at or after `anchor` (in address order) satisfying `pred`.
    pub fn scan_from<F: FnMut(&Arena) -> bool>(&self, anchor: Option<Key>, mut pred: F) -> Option<Key> {
        self.sorted
            .iter_from(&self.slab, anchor)
            .find(|&k| pred(self.slab.get(k)))
    }

    /// The arena whose span contains `addr`.
    pub fn containing(&self, addr: usize) -> Option<Key> {
        let key = self.scan_from(self.head(), |a| addr < a.span.end)?;
        if self.span(key).contains(addr) {
            Some(key)
        } else {
            None
        }
    }

    /// Arenas overlapping `region`, in address order, starting the search
    /// at `anchor`.
    pub fn covering(&self, anchor: Option<Key>, region: Interval) -> Covering<'_> {
        Covering {
            table: self,
            next: anchor,
            region,
        }
    }

    /// All arenas in address order.
    pub fn iter(&self) -> Walk<'_, Arena, BySorted> {
        self.sorted.iter(&self.slab)
    }

    /// All arenas in the order they were created.
    pub fn iter_all(&self) -> Walk<'_, Arena, ByAll> {
        self.all.iter(&self.slab)
    }

    fn is_ordered_around(&self, key: Key) -> bool {
        let span = self.span(key);
        let before = self
            .prev(key)
            .map_or(true, |p| self.span(p).classify(&span) == IntersectKind::FullyBefore);
        let after = self
            .next(key)
            .map_or(true, |n| self.span(n).classify(&span) == IntersectKind::FullyAfter);
        before && after
    }
}

/// Iterator over the arenas overlapping a region; see
/// [`ArenaTable::covering`](struct.ArenaTable.html#method.covering).
pub struct Covering<'a> {
    table: &'a ArenaTable,
    next: Option<Key>,
    region: Interval,
}

impl<'a> Iterator for Covering<'a> {
    type Item = Key;

    fn next(&mut self) -> Option<Key> {
        loop {
            let key = self.next?;
            self.next = self.table.next(key);
            match self.table.span(key).classify(&self.region) {
                IntersectKind::FullyBefore => continue,
                IntersectKind::FullyAfter => {
                    self.next = None;
                    return None;
                }
                _ => return Some(key),
            }
        }
    }
}
