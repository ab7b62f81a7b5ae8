//! Half-open address intervals and the intersection classification used to
//! order arenas and handles.
//!
//! Every interval in this crate is `[start, end)`. An interval with
//! `start == end` is empty.

use core::fmt;
use core::ops::Range;

/// How interval `A` relates to interval `B`.
///
/// Exactly one of these holds for any pair of non-empty intervals.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IntersectKind {
    /// `A = B`
    Equal,
    /// `A` lies strictly within `B`.
    AInsideB,
    /// `B` lies strictly within `A`.
    AEnclosesB,
    /// `A` overlaps the tail of `B`: `B.start < A.start < B.end < A.end`.
    TouchesStart,
    /// `A` overlaps the head of `B`: `A.start < B.start < A.end < B.end`.
    TouchesEnd,
    /// `A.end <= B.start`
    FullyBefore,
    /// `B.end <= A.start`
    FullyAfter,
}

impl IntersectKind {
    /// The two intervals share no address.
    pub fn is_floating(self) -> bool {
        matches!(self, IntersectKind::FullyBefore | IntersectKind::FullyAfter)
    }

    /// Every address of `A` is also in `B`.
    pub fn is_covered(self) -> bool {
        matches!(self, IntersectKind::Equal | IntersectKind::AInsideB)
    }

    /// Every address of `B` is also in `A`.
    pub fn is_covering(self) -> bool {
        matches!(self, IntersectKind::Equal | IntersectKind::AEnclosesB)
    }
}

/// A half-open interval of addresses.
#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub struct Interval {
    pub start: usize,
    pub end: usize,
}

impl fmt::Debug for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:#x}, {:#x})", self.start, self.end)
    }
}

impl From<Interval> for Range<usize> {
    fn from(i: Interval) -> Range<usize> {
        i.start..i.end
    }
}

impl Interval {
    pub const fn new(start: usize, end: usize) -> Self {
        Interval { start, end }
    }

    /// `[base, base + len)`, or `None` if the end is not representable.
    pub fn from_base_len(base: usize, len: usize) -> Option<Self> {
        let end = base.checked_add(len)?;
        Some(Interval::new(base, end))
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn contains(&self, addr: usize) -> bool {
        self.start <= addr && addr < self.end
    }

    /// Whether the two intervals share at least one address.
    pub fn overlaps(&self, other: &Interval) -> bool {
        !self.classify(other).is_floating()
    }

    /// The addresses both intervals cover. Empty when they are disjoint.
    pub fn intersection(&self, other: &Interval) -> Interval {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        if start >= end {
            Interval::new(start, start)
        } else {
            Interval::new(start, end)
        }
    }

    /// The interval of `len` bytes that starts exactly where this one ends.
    ///
    /// Returns `None` at the top of the address space.
    pub fn adjacent_after(&self, len: usize) -> Option<Interval> {
        Interval::from_base_len(self.end, len)
    }

    /// The interval of `len` bytes that ends exactly where this one starts.
    ///
    /// Returns `None` at the bottom of the address space.
    pub fn adjacent_before(&self, len: usize) -> Option<Interval> {
        let start = self.start.checked_sub(len)?;
        Some(Interval::new(start, self.start))
    }

    /// Widen to multiples of `align`, which must be a power of two.
    ///
    /// Returns `None` if rounding the end up overflows.
    pub fn align_out(&self, align: usize) -> Option<Interval> {
        Some(Interval::new(
            align_down(self.start, align),
            align_up(self.end, align)?,
        ))
    }

    /// Classify `self` (as `A`) against `other` (as `B`).
    pub fn classify(&self, other: &Interval) -> IntersectKind {
        let (a, b) = (self, other);
        if a.end <= b.start {
            IntersectKind::FullyBefore
        } else if b.end <= a.start {
            IntersectKind::FullyAfter
        } else if a.start == b.start && a.end == b.end {
            IntersectKind::Equal
        } else if b.start <= a.start && a.end <= b.end {
            IntersectKind::AInsideB
        } else if a.start <= b.start && b.end <= a.end {
            IntersectKind::AEnclosesB
        } else if a.start > b.start {
            IntersectKind::TouchesStart
        } else {
            IntersectKind::TouchesEnd
        }
    }
}

/// Round `value` down to a multiple of `align` (a power of two).
pub fn align_down(value: usize, align: usize) -> usize {
    debug_assert!(align.is_power_of_two());
    value & !(align - 1)
}

/// Round `value` up to a multiple of `align` (a power of two), or `None` on
/// overflow.
pub fn align_up(value: usize, align: usize) -> Option<usize> {
    debug_assert!(align.is_power_of_two());
    Some(value.checked_add(align - 1)? & !(align - 1))
}
