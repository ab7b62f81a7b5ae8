//! Making sure a region is backed by arenas, all or nothing.
//!
//! Flow-allocation runs in two phases. The plan phase walks the cut of the
//! region against the existing arenas: present pieces are checked for
//! colliding handles, absent pieces are reserved from the page source at
//! their exact address and written to the journal, but not linked anywhere.
//! If the whole plan succeeds, the commit phase links every journaled arena
//! into the arena table. If any step fails, the rollback releases every
//! journaled reservation, and nothing visible has changed.

use log::{debug, trace};

use crate::allocators::{fatal, PageAllocator};
use crate::arena::ArenaTable;
use crate::cut::{Cuts, Direction, Slice};
use crate::handle::HandleTable;
use crate::interval::{align_up, Interval};
use crate::slab::Key;
use crate::source::PageSource;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FlowError {
    /// An existing handle overlaps the region.
    Obstructed(Key),
    /// The page source refused a reservation, or our bookkeeping could not
    /// grow.
    Denied,
    /// The region does not fit in the address space.
    Overflow,
    /// There was nothing to allocate.
    Empty,
}

/// A reservation made during the plan phase, waiting to be linked.
#[derive(Copy, Clone, Debug)]
pub struct PendingInsert {
    pub span: Interval,
    /// Existing arena to link next to; see [`Slice::Absent`](../cut/enum.Slice.html).
    pub hint: Option<Key>,
    pub direction: Direction,
}

// Where the lowest arena over the region will come from.
#[derive(Copy, Clone, Debug)]
enum Lowest {
    Existing(Key),
    Pending(usize),
}

/// The first handle (other than `exclude`) living in `arena` that overlaps
/// `region`.
fn obstruction(
    arenas: &ArenaTable,
    handles: &HandleTable,
    arena: Key,
    region: Interval,
    exclude: Option<Key>,
) -> Option<Key> {
    handles
        .residents(arenas.get(arena))
        .filter(|&h| Some(h) != exclude)
        .find(|&h| handles.region(h).overlaps(&region))
}

fn release_or_die<O: PageSource>(source: &mut O, span: Interval) {
    if let Err(e) = unsafe { source.release(span.start, span.len()) } {
        fatal("failed to release a reservation", &e);
    }
}

impl<O: PageSource> PageAllocator<O> {
    /// Make sure every byte of `region` lies in some arena, reserving what is
    /// missing. `region` must be page aligned and non-empty.
    ///
    /// Returns the lowest-address arena overlapping `region`. On error the
    /// arena table and the page source are as they were.
    pub(crate) fn flow_allocate(
        &mut self,
        region: Interval,
        anchor: Option<Key>,
        direction: Direction,
        exclude: Option<Key>,
    ) -> Result<Key, FlowError> {
        if region.is_empty() {
            return Err(FlowError::Empty);
        }
        let footprint = region
            .align_out(self.granularity)
            .ok_or(FlowError::Overflow)?;
        trace!(
            "flow_allocate {:?} (footprint {:?}, {:?})",
            region,
            footprint,
            direction
        );

        self.journal.clear();
        let planned = match self.plan(region, footprint, anchor, direction, exclude) {
            Ok(lowest) => {
                // Committing must not fail halfway, so make room up front.
                let pending = self.journal.len();
                match self.arenas.reserve(pending) {
                    Ok(()) => Ok(lowest),
                    Err(_) => Err(FlowError::Denied),
                }
            }
            Err(e) => Err(e),
        };

        let result = match planned {
            Ok(lowest) => Ok(self.commit_plan(lowest)),
            Err(e) => {
                debug!("  flow_allocate {:?} failed: {:?}", region, e);
                self.rollback();
                Err(e)
            }
        };
        self.journal.clear();
        result
    }

    fn plan(
        &mut self,
        region: Interval,
        footprint: Interval,
        anchor: Option<Key>,
        direction: Direction,
        exclude: Option<Key>,
    ) -> Result<Lowest, FlowError> {
        let PageAllocator {
            arenas,
            handles,
            source,
            journal,
            ..
        } = self;

        let mut lowest = None;
        for slice in Cuts::new(arenas, anchor, footprint, direction) {
            let this = match slice {
                Slice::Present { arena, .. } => {
                    if let Some(h) = obstruction(arenas, handles, arena, region, exclude) {
                        return Err(FlowError::Obstructed(h));
                    }
                    Lowest::Existing(arena)
                }
                Slice::Absent { span, hint } => {
                    let base = match unsafe { source.reserve(Some(span.start), span.len()) } {
                        Ok(base) => base,
                        Err(e) => {
                            trace!("  reserving {:?} denied: {:?}", span, e);
                            return Err(FlowError::Denied);
                        }
                    };
                    debug_assert_eq!(base, span.start, "page source relocated a hinted reservation");

                    let pending = PendingInsert {
                        span,
                        hint,
                        direction,
                    };
                    if journal.push(pending).is_err() {
                        // The journal can't remember it, so the rollback
                        // won't see it; give it back now.
                        release_or_die(source, span);
                        return Err(FlowError::Denied);
                    }
                    trace!("  journaled {:?}", pending);
                    Lowest::Pending(journal.len() - 1)
                }
            };

            lowest = match (direction, lowest) {
                (Direction::Forward, Some(first)) => Some(first),
                _ => Some(this),
            };
        }

        lowest.ok_or(FlowError::Empty)
    }

    // Link every journaled arena. Capacity was reserved, so this can't fail.
    fn commit_plan(&mut self, lowest: Lowest) -> Key {
        let mut lowest_key = match lowest {
            Lowest::Existing(k) => Some(k),
            Lowest::Pending(_) => None,
        };

        for ix in 0..self.journal.len() {
            let PendingInsert {
                span,
                hint,
                direction,
            } = self.journal[ix];
            let inserted = match direction {
                Direction::Forward => self.arenas.insert_after(hint, span),
                Direction::Backward => self.arenas.insert_before(hint, span),
            };
            let key = match inserted {
                Ok(k) => k,
                Err(e) => fatal("arena table refused a reserved insert", &e),
            };
            trace!("  linked arena {:?} at {:?}", key, span);

            if let Lowest::Pending(p) = lowest {
                if p == ix {
                    lowest_key = Some(key);
                }
            }
        }

        match lowest_key {
            Some(k) => k,
            None => fatal("flow allocation lost its lowest arena", &lowest),
        }
    }

    fn rollback(&mut self) {
        for ix in 0..self.journal.len() {
            let pending = self.journal[ix];
            trace!("  rolling back {:?}", pending);
            release_or_die(&mut self.source, pending.span);
        }
    }

    /// Find room for `len` bytes (a multiple of the page size), preferring
    /// space in arenas that already exist over asking for new ones.
    ///
    /// Returns the region and the lowest arena overlapping it. The region is
    /// reserved, but no handle has been created for it.
    pub(crate) fn search(&mut self, len: usize) -> Option<(Interval, Key)> {
        let mut arena = self.arenas.head();
        let mut resident = self.handles.head();
        let mut candidate = 0;

        'arenas: while let Some(a) = arena {
            let span = self.arenas.span(a);
            candidate = candidate.max(span.start);

            loop {
                // Handles are sorted and disjoint, and the candidate only
                // grows, so the cursor never moves backwards.
                while let Some(h) = resident {
                    if self.handles.region(h).end > candidate {
                        break;
                    }
                    resident = self.handles.next(h);
                }

                if candidate >= span.end {
                    break;
                }
                let region = match Interval::from_base_len(candidate, len) {
                    Some(r) => r,
                    None => break 'arenas,
                };

                if let Some(h) = resident {
                    let obstacle = self.handles.region(h);
                    if obstacle.overlaps(&region) {
                        candidate = obstacle.end;
                        continue;
                    }
                }

                match self.flow_allocate(region, Some(a), Direction::Forward, None) {
                    Ok(first) => {
                        debug!("  search placed {:?} in existing arenas", region);
                        return Some((region, first));
                    }
                    Err(FlowError::Obstructed(h)) => candidate = self.handles.region(h).end,
                    Err(_) => break,
                }
            }

            arena = self.arenas.next(a);
        }

        self.fresh_arena(len)
    }

    // Reserve a brand new arena anywhere, and place the region at its start.
    fn fresh_arena(&mut self, len: usize) -> Option<(Interval, Key)> {
        let size = align_up(len, self.granularity)?;
        let base = match unsafe { self.source.reserve(None, size) } {
            Ok(base) => base,
            Err(e) => {
                debug!("  no room for {} bytes anywhere: {:?}", size, e);
                return None;
            }
        };
        debug_assert_eq!(base % self.granularity, 0);

        let span = Interval::new(base, base + size);
        match self.arenas.insert_sorted(span) {
            Ok(key) => {
                debug!("  search reserved fresh arena {:?}", span);
                Some((Interval::new(base, base + len), key))
            }
            Err(e) => {
                debug!("  arena table could not grow: {}", e);
                release_or_die(&mut self.source, span);
                None
            }
        }
    }
}
