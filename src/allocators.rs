//! The page allocator, generic and Unix-specific.
//!
//! ## Basic Types
//!
//! ### [`PageAllocator`](struct.PageAllocator.html)
//!
//! A `PageAllocator` is a single-threaded manager of arenas (reservations
//! from a [`PageSource`](../source/trait.PageSource.html)) and the page
//! handles carved out of them. It is not thread-safe; every call must be
//! serialized by the caller.
//!
//! ### [`GenericPageAllocator`](struct.GenericPageAllocator.html)
//!
//! A `GenericPageAllocator` wraps `PageAllocator` in a spin lock, and builds
//! it lazily, so it can live in a `static`.
//!
//! ### [`UnixPageAllocator`](struct.UnixPageAllocator.html)
//!
//! `UnixPageAllocator` is a `GenericPageAllocator` over real Unix virtual
//! memory.

use core::fmt;
use core::ops::Range;

use log::{debug, trace};
use spin::{Mutex, MutexGuard, Once};
use static_assertions::assert_impl_all;

use crate::arena::ArenaTable;
use crate::cut::Direction;
use crate::flow::PendingInsert;
use crate::handle::{Handle, HandleTable};
use crate::interval::{align_down, align_up, IntersectKind, Interval};
use crate::pagevec::PageVec;
use crate::slab::Key;
use crate::source::PageSource;
use crate::unix::UnixPages;

/// Log and terminate. Used when the page source fails at something that
/// cannot fail without leaving the allocator inconsistent.
#[cold]
pub(crate) fn fatal(what: &str, err: &dyn fmt::Debug) -> ! {
    log::error!("page allocator: {}: {:?}", what, err);
    unsafe { libc::abort() }
}

/// An opaque reference to a live page handle.
///
/// Handles are only meaningful to the allocator that issued them. Once freed,
/// or absorbed by a merge, a handle is stale; using it panics.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PageHandle {
    key: Key,
    generation: u32,
}

/// A snapshot of one arena, as reported by
/// [`PageAllocator::arenas`](struct.PageAllocator.html#method.arenas).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaInfo {
    pub span: Range<usize>,
    pub refcount: usize,
}

/// A reservation-and-commit page allocator.
///
/// Between any two public calls:
///
/// - No two handles overlap, and no two arenas overlap.
/// - Every byte of every handle lies in exactly one arena.
/// - Each arena's refcount is the number of handles overlapping it, and its
///   first resident is the lowest of them.
/// - Each handle's first arena is the lowest arena overlapping it.
/// - Both the arena list and the handle list ascend by address.
///
/// [`stats`](#method.stats) checks all of these.
pub struct PageAllocator<O: PageSource> {
    pub(crate) source: O,
    pub(crate) page_size: usize,
    pub(crate) granularity: usize,
    pub(crate) arenas: ArenaTable,
    pub(crate) handles: HandleTable,
    pub(crate) journal: PageVec<PendingInsert>,
}

assert_impl_all!(PageAllocator<UnixPages>: Send);

impl<O: PageSource + Default> Default for PageAllocator<O> {
    fn default() -> Self {
        PageAllocator::new(O::default())
    }
}

impl<O: PageSource> PageAllocator<O> {
    /// Create a new `PageAllocator` drawing address space from `source`.
    pub fn new(source: O) -> Self {
        let page_size = source.page_size();
        let granularity = source.granularity();
        assert!(
            page_size.is_power_of_two(),
            "page size {} is not a power of two",
            page_size
        );
        assert!(
            granularity.is_power_of_two() && granularity % page_size == 0,
            "granularity {} is not a power-of-two multiple of page size {}",
            granularity,
            page_size
        );

        PageAllocator {
            source,
            page_size,
            granularity,
            arenas: ArenaTable::new(),
            handles: HandleTable::new(),
            journal: PageVec::new(),
        }
    }

    pub fn source(&self) -> &O {
        &self.source
    }

    /// Mutable access to the page source.
    ///
    /// Releasing or decommitting anything the allocator owns through this
    /// breaks the allocator.
    pub fn source_mut(&mut self) -> &mut O {
        &mut self.source
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn granularity(&self) -> usize {
        self.granularity
    }

    /// `size` rounded up to whole pages.
    pub fn page_range(&self, size: usize) -> Option<usize> {
        align_up(size, self.page_size)
    }

    /// `size` rounded up to whole reservation units.
    pub fn arena_range(&self, size: usize) -> Option<usize> {
        align_up(size, self.granularity)
    }

    pub fn arena_count(&self) -> usize {
        self.arenas.len()
    }

    pub fn handle_count(&self) -> usize {
        self.handles.len()
    }

    fn resolve(&self, handle: PageHandle) -> Key {
        if !self.handles.is_live(handle.key, handle.generation) {
            panic!("Stale page handle {:?}", handle);
        }
        handle.key
    }

    fn public(&self, key: Key) -> PageHandle {
        PageHandle {
            key,
            generation: self.handles.generation(key),
        }
    }

    /// Whether `handle` still refers to a live handle of this allocator.
    pub fn is_live(&self, handle: PageHandle) -> bool {
        self.handles.is_live(handle.key, handle.generation)
    }

    /// Start of the handle's memory.
    pub fn target(&self, handle: PageHandle) -> *mut u8 {
        self.handles.region(self.resolve(handle)).start as *mut u8
    }

    /// Size of the handle's memory, in bytes. Always whole pages.
    pub fn size(&self, handle: PageHandle) -> usize {
        self.handles.region(self.resolve(handle)).len()
    }

    pub fn region(&self, handle: PageHandle) -> Range<usize> {
        self.handles.region(self.resolve(handle)).into()
    }

    /// All arenas, in address order.
    pub fn arenas(&self) -> impl Iterator<Item = ArenaInfo> + '_ {
        self.arenas.iter().map(move |k| {
            let arena = self.arenas.get(k);
            ArenaInfo {
                span: arena.span.into(),
                refcount: arena.refcount,
            }
        })
    }

    /// All live handles, in address order.
    pub fn handles(&self) -> impl Iterator<Item = PageHandle> + '_ {
        self.handles.iter().map(move |k| self.public(k))
    }

    ////////////////////////////////////////////////////////////
    // Public operations

    /// Allocate at least `size` bytes of committed memory.
    ///
    /// With a hint, the handle covers exactly the pages spanned by
    /// `[hint, hint + size)`, or the call fails; it never lands elsewhere.
    /// Without one, the first free stretch of existing arenas that fits is
    /// used, and a fresh arena is reserved if there is none.
    pub fn allocate(&mut self, hint: Option<usize>, size: usize) -> Option<PageHandle> {
        debug!("allocate({:x?}, {})", hint, size);
        if size == 0 {
            return None;
        }
        // Creating the record must not fail once arenas are committed.
        if self.handles.reserve(1).is_err() {
            debug!("  handle table could not grow");
            return None;
        }

        let placed = match hint {
            Some(addr) => {
                let end = addr.checked_add(size)?;
                let region = Interval::new(
                    align_down(addr, self.page_size),
                    align_up(end, self.page_size)?,
                );
                let head = self.arenas.head();
                self.flow_allocate(region, head, Direction::Forward, None)
                    .ok()
                    .map(|first| (region, first))
            }
            None => {
                let len = self.page_range(size)?;
                self.search(len)
            }
        };

        let (region, first_arena) = match placed {
            Some(p) => p,
            None => {
                debug!("  allocate failed");
                return None;
            }
        };

        let key = match self.handles.create(region, first_arena) {
            Ok(k) => k,
            Err(e) => fatal("handle table refused a reserved insert", &e),
        };
        self.link_sorted(key);
        self.settle(key, None, &[]);
        self.commit_pieces(first_arena, region);

        debug!("  allocated {:?} at {:?}", key, region);
        Some(self.public(key))
    }

    /// Decommit a handle's memory and forget it. Arenas left without any
    /// handle are released.
    pub fn free(&mut self, handle: PageHandle) {
        let key = self.resolve(handle);
        let Handle {
            region,
            first_arena,
            ..
        } = *self.handles.get(key);
        debug!("free({:?}) {:?}", key, region);

        self.decommit_pieces(first_arena, region);
        self.drop_coverage(key, first_arena, region, Interval::default());
        self.handles.remove(key);
    }

    /// Move the right edge of a handle so that it holds `size` bytes (rounded
    /// up to whole pages).
    ///
    /// Shrinking always succeeds. Growing fails, leaving the handle as it was,
    /// if another handle is in the way or the address space past the handle
    /// cannot be reserved. A size of zero is rejected; use `free`.
    pub fn set_handle_size(&mut self, handle: PageHandle, size: usize) -> bool {
        let key = self.resolve(handle);
        let old = *self.handles.get(key);
        debug!("set_handle_size({:?} {:?}, {})", key, old.region, size);

        let len = match self.page_range(size) {
            Some(l) if l > 0 => l,
            _ => return false,
        };
        let current = old.region.len();
        if len == current {
            return true;
        }

        let new_region = if len > current {
            let delta = match old.region.adjacent_after(len - current) {
                Some(d) => d,
                None => return false,
            };
            let new_region = Interval::new(old.region.start, delta.end);
            if self
                .flow_allocate(delta, Some(old.first_arena), Direction::Forward, Some(key))
                .is_err()
            {
                return false;
            }
            self.handles.get_mut(key).region = new_region;
            self.settle(key, None, &[old.region]);
            self.commit_pieces(old.first_arena, delta);
            new_region
        } else {
            let new_region = Interval::new(old.region.start, old.region.start + len);
            let tail = Interval::new(new_region.end, old.region.end);
            self.decommit_pieces(old.first_arena, tail);
            self.drop_coverage(key, old.first_arena, old.region, new_region);
            self.handles.get_mut(key).region = new_region;
            new_region
        };

        debug!("  resized to {:?}", new_region);
        true
    }

    /// Move the left edge of a handle so that it holds `size` bytes (rounded
    /// up to whole pages). The handle's target moves; its end does not.
    ///
    /// Fails, leaving the handle as it was, under the same conditions as
    /// [`set_handle_size`](#method.set_handle_size).
    pub fn left_resize_handle(&mut self, handle: PageHandle, size: usize) -> bool {
        let key = self.resolve(handle);
        let old = *self.handles.get(key);
        debug!("left_resize_handle({:?} {:?}, {})", key, old.region, size);

        let len = match self.page_range(size) {
            Some(l) if l > 0 => l,
            _ => return false,
        };
        let current = old.region.len();
        if len == current {
            return true;
        }

        let new_region = if len > current {
            let delta = match old.region.adjacent_before(len - current) {
                Some(d) => d,
                None => return false,
            };
            let new_region = Interval::new(delta.start, old.region.end);
            let first = match self.flow_allocate(
                delta,
                Some(old.first_arena),
                Direction::Backward,
                Some(key),
            ) {
                Ok(first) => first,
                Err(_) => return false,
            };
            {
                let h = self.handles.get_mut(key);
                h.region = new_region;
                h.first_arena = first;
            }
            self.settle(key, None, &[old.region]);
            self.commit_pieces(first, delta);
            new_region
        } else {
            let new_region = Interval::new(old.region.end - len, old.region.end);
            let head = Interval::new(old.region.start, new_region.start);
            self.decommit_pieces(old.first_arena, head);
            let first = match self.arenas.covering(Some(old.first_arena), new_region).next() {
                Some(a) => a,
                None => fatal("handle lost its arenas", &new_region),
            };
            self.drop_coverage(key, old.first_arena, old.region, new_region);
            let h = self.handles.get_mut(key);
            h.region = new_region;
            h.first_arena = first;
            new_region
        };

        debug!("  resized to {:?}", new_region);
        true
    }

    /// Merge two handles into one covering both and everything between them.
    ///
    /// `one` survives and `two` becomes stale. Memory already committed in
    /// either handle is kept; the gap between them, if any, is reserved as
    /// needed and committed. Fails, changing nothing, if another handle lies
    /// in the gap, the gap cannot be reserved, or `one == two`.
    pub fn merge_page_handles(&mut self, one: PageHandle, two: PageHandle) -> bool {
        let k1 = self.resolve(one);
        let k2 = self.resolve(two);
        if k1 == k2 {
            return false;
        }
        let h1 = *self.handles.get(k1);
        let h2 = *self.handles.get(k2);
        debug!(
            "merge_page_handles({:?} {:?}, {:?} {:?})",
            k1, h1.region, k2, h2.region
        );

        let (first, second) = if h1.region.start < h2.region.start {
            (h1, h2)
        } else {
            (h2, h1)
        };
        let gap = Interval::new(first.region.end, second.region.start);
        if !gap.is_empty() {
            if let Err(e) =
                self.flow_allocate(gap, Some(first.first_arena), Direction::Forward, Some(k2))
            {
                debug!("  merge failed: {:?}", e);
                return false;
            }
        }

        let merged = Interval::new(first.region.start, second.region.end);
        {
            let h = self.handles.get_mut(k1);
            h.region = merged;
            h.first_arena = first.first_arena;
        }
        self.settle(k1, Some(k2), &[h1.region, h2.region]);
        self.handles.remove(k2);
        if !gap.is_empty() {
            self.commit_pieces(first.first_arena, gap);
        }

        debug!("  merged into {:?}", merged);
        true
    }

    /// The handle whose target is exactly `addr`.
    pub fn find_handle_by_address(&self, addr: usize) -> Option<PageHandle> {
        let arena = self.arenas.containing(addr)?;
        let found = self
            .handles
            .residents(self.arenas.get(arena))
            .find(|&h| self.handles.region(h).start == addr)?;
        Some(self.public(found))
    }

    ////////////////////////////////////////////////////////////
    // Bookkeeping

    // Link a freshly created handle into the sorted list. Start from the
    // nearest handle living around its first arena, then step until the
    // neighbors on both sides are disjoint from it.
    fn link_sorted(&mut self, key: Key) {
        let Handle {
            region,
            first_arena,
            ..
        } = *self.handles.get(key);

        let mut near = match self.nearest_resident(first_arena) {
            Some(h) => h,
            None => {
                debug_assert!(self.handles.is_empty());
                self.handles.link_after(None, key);
                return;
            }
        };

        loop {
            match self.handles.region(near).classify(&region) {
                IntersectKind::FullyBefore => match self.handles.next(near) {
                    Some(next)
                        if self.handles.region(next).classify(&region)
                            == IntersectKind::FullyBefore =>
                    {
                        near = next
                    }
                    _ => {
                        self.handles.link_after(Some(near), key);
                        return;
                    }
                },
                IntersectKind::FullyAfter => match self.handles.prev(near) {
                    Some(prev)
                        if self.handles.region(prev).classify(&region)
                            == IntersectKind::FullyAfter =>
                    {
                        near = prev
                    }
                    _ => {
                        self.handles.link_before(Some(near), key);
                        return;
                    }
                },
                kind => panic!(
                    "New handle {:?} overlaps {:?} ({:?})",
                    region,
                    self.handles.region(near),
                    kind
                ),
            }
        }
    }

    // Some resident of the arenas closest to `arena`, looking right then left
    // in turn.
    fn nearest_resident(&self, arena: Key) -> Option<Key> {
        let mut right = Some(arena);
        let mut left = self.arenas.prev(arena);
        while right.is_some() || left.is_some() {
            if let Some(a) = right {
                if let Some(h) = self.arenas.get(a).first_resident {
                    return Some(h);
                }
                right = self.arenas.next(a);
            }
            if let Some(a) = left {
                if let Some(h) = self.arenas.get(a).first_resident {
                    return Some(h);
                }
                left = self.arenas.prev(a);
            }
        }
        None
    }

    // After handle `key` has grown to its current region, fix up every arena
    // it now overlaps. `old` lists the regions that were already counted in
    // refcounts (the handle's previous extent, or both halves of a merge);
    // `absorbed` is a handle that is about to disappear into `key`.
    fn settle(&mut self, key: Key, absorbed: Option<Key>, old: &[Interval]) {
        let Handle {
            region,
            first_arena,
            ..
        } = *self.handles.get(key);

        let mut next = Some(first_arena);
        while let Some(a) = next {
            next = self.arenas.next(a);
            let span = self.arenas.span(a);
            match span.classify(&region) {
                IntersectKind::FullyBefore => continue,
                IntersectKind::FullyAfter => break,
                _ => {}
            }

            let counted = old.iter().filter(|o| o.overlaps(&span)).count();
            let keep = match self.arenas.get(a).first_resident {
                Some(r) if r != key && Some(r) != absorbed => {
                    self.handles.region(r).start < region.start
                }
                _ => false,
            };

            let arena = self.arenas.get_mut(a);
            arena.refcount = arena.refcount + 1 - counted;
            if !keep {
                arena.first_resident = Some(key);
            }
            trace!(
                "  arena {:?} refcount {} first resident {:?}",
                a,
                arena.refcount,
                arena.first_resident
            );
        }
    }

    // Handle `key` is shrinking from `old` to `kept` (or going away, if
    // `kept` is empty). Drop it from every arena it no longer overlaps,
    // releasing arenas nobody else lives in. Must run while `key` is still
    // linked.
    fn drop_coverage(&mut self, key: Key, anchor: Key, old: Interval, kept: Interval) {
        let mut next = Some(anchor);
        while let Some(a) = next {
            next = self.arenas.next(a);
            let span = self.arenas.span(a);
            match span.classify(&old) {
                IntersectKind::FullyBefore => continue,
                IntersectKind::FullyAfter => break,
                _ => {}
            }
            if span.overlaps(&kept) {
                continue;
            }

            let successor = self.handles.next_resident(key, span);
            let arena = self.arenas.get_mut(a);
            if arena.first_resident == Some(key) {
                arena.first_resident = successor;
            }
            arena.refcount -= 1;
            if arena.refcount == 0 {
                self.release_arena(a);
            }
        }
    }

    fn release_arena(&mut self, arena: Key) {
        let span = self.arenas.span(arena);
        trace!("  releasing arena {:?} {:?}", arena, span);
        if let Err(e) = unsafe { self.source.release(span.start, span.len()) } {
            fatal("failed to release an arena", &e);
        }
        self.arenas.remove(arena);
    }

    // Commit `region` one arena at a time, so no call crosses a reservation.
    fn commit_pieces(&mut self, anchor: Key, region: Interval) {
        for a in self.arenas.covering(Some(anchor), region) {
            let piece = self.arenas.span(a).intersection(&region);
            if let Err(e) = unsafe { self.source.commit(piece.start, piece.len()) } {
                fatal("failed to commit pages", &e);
            }
        }
    }

    fn decommit_pieces(&mut self, anchor: Key, region: Interval) {
        for a in self.arenas.covering(Some(anchor), region) {
            let piece = self.arenas.span(a).intersection(&region);
            if let Err(e) = unsafe { self.source.decommit(piece.start, piece.len()) } {
                fatal("failed to decommit pages", &e);
            }
        }
    }

    ////////////////////////////////////////////////////////////
    // Validation

    /// Get statistics on this allocator, and verify all its invariants.
    pub fn stats(&self) -> (Validity, Stats) {
        let mut validity = Validity::default();
        let mut stats = Stats::default();

        let mut previous: Option<Interval> = None;
        for a in self.arenas.iter() {
            let arena = self.arenas.get(a);
            let span = arena.span;
            if let Some(p) = previous {
                match p.classify(&span) {
                    IntersectKind::FullyBefore => {}
                    IntersectKind::FullyAfter => validity.out_of_orders += 1,
                    _ => validity.overlapping_arenas += 1,
                }
            }
            if span.start % self.granularity != 0 || span.len() % self.granularity != 0 {
                validity.misaligned += 1;
            }

            let mut residents = self
                .handles
                .iter()
                .filter(|&h| self.handles.region(h).overlaps(&span));
            let lowest = residents.next();
            let count = lowest.map_or(0, |_| 1 + residents.count());
            if count != arena.refcount || count == 0 {
                validity.wrong_refcounts += 1;
            }
            if lowest != arena.first_resident {
                validity.wrong_first_residents += 1;
            }

            stats.arenas += 1;
            stats.reserved += span.len();
            previous = Some(span);
        }

        let mut previous: Option<Interval> = None;
        for h in self.handles.iter() {
            let handle = self.handles.get(h);
            let region = handle.region;
            if let Some(p) = previous {
                match p.classify(&region) {
                    IntersectKind::FullyBefore => {}
                    IntersectKind::FullyAfter => validity.out_of_orders += 1,
                    _ => validity.overlapping_handles += 1,
                }
            }
            if region.is_empty()
                || region.start % self.page_size != 0
                || region.end % self.page_size != 0
            {
                validity.misaligned += 1;
            }

            let first = self
                .arenas
                .iter()
                .find(|&a| self.arenas.span(a).overlaps(&region));
            if first != Some(handle.first_arena) {
                validity.wrong_first_arenas += 1;
            }

            // Arenas are sorted, so coverage is a single sweep.
            let mut covered_to = region.start;
            for a in self.arenas.covering(first, region) {
                let span = self.arenas.span(a);
                if span.start > covered_to {
                    break;
                }
                covered_to = span.end;
            }
            if covered_to < region.end {
                validity.uncovered_handles += 1;
            }

            stats.handles += 1;
            stats.committed += region.len();
            previous = Some(region);
        }

        (validity, stats)
    }
}

impl<O: PageSource> Drop for PageAllocator<O> {
    fn drop(&mut self) {
        debug!(
            "Dropping allocator with {} arenas and {} handles",
            self.arenas.len(),
            self.handles.len()
        );
        loop {
            let oldest = self.arenas.iter_all().next();
            match oldest {
                Some(a) => self.release_arena(a),
                None => break,
            }
        }
    }
}

impl<O: PageSource> fmt::Display for PageAllocator<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PageAllocator(arenas: [")?;
        for (i, a) in self.arenas.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            let arena = self.arenas.get(a);
            write!(f, "{:?}x{}", arena.span, arena.refcount)?;
        }
        write!(f, "], handles: [")?;
        for (i, h) in self.handles.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{:?}", self.handles.region(h))?;
        }
        write!(f, "])")
    }
}

/// Validity contains a count of every broken invariant found in a
/// `PageAllocator`.
#[derive(Default, Debug, PartialEq, Eq)]
pub struct Validity {
    /// Adjacent handles in the sorted list that share addresses.
    pub overlapping_handles: usize,
    /// Adjacent arenas in the sorted list that share addresses.
    pub overlapping_arenas: usize,
    /// Handles with bytes outside every arena.
    pub uncovered_handles: usize,
    /// Arenas whose refcount is not the number of handles overlapping them,
    /// or which have no handle at all and should have been released.
    pub wrong_refcounts: usize,
    pub wrong_first_residents: usize,
    pub wrong_first_arenas: usize,
    /// Neighbors in either sorted list that are in the wrong order.
    pub out_of_orders: usize,
    /// Handles not on page boundaries, or arenas not on reservation
    /// boundaries.
    pub misaligned: usize,
}

impl Validity {
    /// Returns a boolean - a simple check if all cases are 0
    pub fn is_valid(&self) -> bool {
        *self == Validity::default()
    }
}

impl From<Validity> for bool {
    fn from(v: Validity) -> bool {
        v.is_valid()
    }
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub arenas: usize,
    pub handles: usize,
    /// Bytes of address space held in arenas.
    pub reserved: usize,
    /// Bytes committed to handles.
    pub committed: usize,
}

/// A thread-safe page allocator, using a spin lock around a `PageAllocator`.
///
/// The allocator itself is built on first use, so this can be constructed in
/// a `const` context.
pub struct GenericPageAllocator<O: PageSource> {
    raw: Once<Mutex<PageAllocator<O>>>,
}

impl<O: PageSource + Default> Default for GenericPageAllocator<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: PageSource + Default> GenericPageAllocator<O> {
    pub const fn new() -> Self {
        GenericPageAllocator { raw: Once::new() }
    }

    /// Lock the underlying `PageAllocator`, building it if needed.
    ///
    /// Every other user spins until the guard is dropped.
    pub fn lock(&self) -> MutexGuard<'_, PageAllocator<O>> {
        self.raw
            .call_once(|| Mutex::new(PageAllocator::default()))
            .lock()
    }

    pub fn stats(&self) -> (Validity, Stats) {
        self.lock().stats()
    }
}

#[derive(Default)]
pub struct UnixPageAllocator {
    alloc: GenericPageAllocator<UnixPages>,
}

assert_impl_all!(UnixPageAllocator: Send, Sync);

impl UnixPageAllocator {
    pub const fn new() -> Self {
        UnixPageAllocator {
            alloc: GenericPageAllocator::new(),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, PageAllocator<UnixPages>> {
        self.alloc.lock()
    }

    pub fn stats(&self) -> (Validity, Stats) {
        self.alloc.stats()
    }
}
