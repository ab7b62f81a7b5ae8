//! Cutting a wanted interval against the arenas that already exist.
//!
//! Walking the address-sorted arena list against an interval `R` yields the
//! maximal pieces of `R`, in order, each tagged as either already reserved
//! by an arena, or absent and in need of a fresh reservation. A request that
//! straddles two arenas with a hole between them comes out as
//! present / absent / present.

use log::trace;

use crate::arena::ArenaTable;
use crate::interval::Interval;
use crate::slab::Key;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Lowest addresses first. New arenas are linked after their hint.
    Forward,
    /// Highest addresses first. New arenas are linked before their hint.
    Backward,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Slice {
    /// `span` is inside `arena`.
    Present { arena: Key, span: Interval },
    /// Nothing covers `span`. `hint` is the existing arena a reservation of
    /// `span` would be linked next to: its predecessor when walking forward,
    /// its successor when walking backward, or `None` for the list's end.
    Absent { span: Interval, hint: Option<Key> },
}

impl Slice {
    pub fn span(&self) -> Interval {
        match *self {
            Slice::Present { span, .. } | Slice::Absent { span, .. } => span,
        }
    }
}

/// Iterator over the [`Slice`](enum.Slice.html)s of an interval.
///
/// Invariant: every address in `[lo, hi)` is still to be yielded; `next` is
/// the closest arena not yet passed in the walking direction, and `hint` the
/// last arena passed.
pub struct Cuts<'a> {
    arenas: &'a ArenaTable,
    lo: usize,
    hi: usize,
    next: Option<Key>,
    hint: Option<Key>,
    direction: Direction,
}

impl<'a> Cuts<'a> {
    /// Cut `want` walking upward from `anchor`.
    ///
    /// No arena before `anchor` may overlap `want`. `None` starts at the head
    /// of the list.
    pub fn forward(arenas: &'a ArenaTable, anchor: Option<Key>, want: Interval) -> Self {
        let next = anchor.or_else(|| arenas.head());
        Cuts {
            arenas,
            lo: want.start,
            hi: want.end,
            next,
            hint: next.and_then(|k| arenas.prev(k)),
            direction: Direction::Forward,
        }
    }

    /// Cut `want` walking downward from `anchor`.
    ///
    /// No arena after `anchor` may overlap `want`. `None` starts at the tail
    /// of the list.
    pub fn backward(arenas: &'a ArenaTable, anchor: Option<Key>, want: Interval) -> Self {
        let next = anchor.or_else(|| arenas.tail());
        Cuts {
            arenas,
            lo: want.start,
            hi: want.end,
            next,
            hint: next.and_then(|k| arenas.next(k)),
            direction: Direction::Backward,
        }
    }

    pub fn new(arenas: &'a ArenaTable, anchor: Option<Key>, want: Interval, direction: Direction) -> Self {
        match direction {
            Direction::Forward => Cuts::forward(arenas, anchor, want),
            Direction::Backward => Cuts::backward(arenas, anchor, want),
        }
    }

    fn step_forward(&mut self) -> Option<Slice> {
        if self.lo >= self.hi {
            return None;
        }

        // Skip arenas wholly below the cursor.
        while let Some(k) = self.next {
            if self.arenas.span(k).end > self.lo {
                break;
            }
            self.hint = Some(k);
            self.next = self.arenas.next(k);
        }

        let slice = match self.next {
            Some(k) if self.arenas.span(k).start <= self.lo => {
                let end = self.arenas.span(k).end.min(self.hi);
                let span = Interval::new(self.lo, end);
                self.hint = Some(k);
                self.next = self.arenas.next(k);
                Slice::Present { arena: k, span }
            }
            upcoming => {
                let end = upcoming.map_or(self.hi, |k| self.arenas.span(k).start.min(self.hi));
                Slice::Absent {
                    span: Interval::new(self.lo, end),
                    hint: self.hint,
                }
            }
        };

        self.lo = slice.span().end;
        Some(slice)
    }

    fn step_backward(&mut self) -> Option<Slice> {
        if self.lo >= self.hi {
            return None;
        }

        // Skip arenas wholly above the cursor.
        while let Some(k) = self.next {
            if self.arenas.span(k).start < self.hi {
                break;
            }
            self.hint = Some(k);
            self.next = self.arenas.prev(k);
        }

        let slice = match self.next {
            Some(k) if self.arenas.span(k).end >= self.hi => {
                let start = self.arenas.span(k).start.max(self.lo);
                let span = Interval::new(start, self.hi);
                self.hint = Some(k);
                self.next = self.arenas.prev(k);
                Slice::Present { arena: k, span }
            }
            upcoming => {
                let start = upcoming.map_or(self.lo, |k| self.arenas.span(k).end.max(self.lo));
                Slice::Absent {
                    span: Interval::new(start, self.hi),
                    hint: self.hint,
                }
            }
        };

        self.hi = slice.span().start;
        Some(slice)
    }
}

impl<'a> Iterator for Cuts<'a> {
    type Item = Slice;

    fn next(&mut self) -> Option<Slice> {
        let slice = match self.direction {
            Direction::Forward => self.step_forward(),
            Direction::Backward => self.step_backward(),
        }?;
        trace!("  cut {:?}", slice);
        Some(slice)
    }
}
