//! The contract between the allocator and whatever hands out address space.
//!
//! ## [`PageSource`](trait.PageSource.html)
//!
//! `PageSource` abstracts over the four virtual memory calls the allocator
//! needs, plus the two sizes that govern them.
//!
//! ## [`ToyPages`](struct.ToyPages.html)
//!
//! `ToyPages` pretends to be an address space. It never backs anything with
//! memory, which makes it useful for testing placement decisions
//! deterministically, with any page size and allocation granularity.

use core::fmt;

use crate::interval::{align_up, Interval};
use crate::pagevec::PageVec;

pub trait PageSource {
    type Err: fmt::Debug;

    /// Smallest unit that can be committed or decommitted.
    fn page_size(&self) -> usize;

    /// Smallest unit that can be reserved. A multiple of `page_size`.
    fn granularity(&self) -> usize;

    /// Reserve `size` bytes of address space.
    ///
    /// # Safety
    ///
    /// `size` must be a non-zero multiple of `granularity()`, and `hint`
    /// aligned to it. With a hint, implementations must return exactly `hint`
    /// or an error; they may never relocate.
    unsafe fn reserve(&mut self, hint: Option<usize>, size: usize) -> Result<usize, Self::Err>;

    /// Return a whole prior reservation.
    ///
    /// # Safety
    ///
    /// `base` and `size` must match a previous `reserve` exactly, and nothing
    /// may reference the range afterwards.
    unsafe fn release(&mut self, base: usize, size: usize) -> Result<(), Self::Err>;

    /// Back a page-aligned range inside one reservation with memory.
    ///
    /// # Safety
    ///
    /// The range must lie in a single live reservation.
    unsafe fn commit(&mut self, addr: usize, size: usize) -> Result<(), Self::Err>;

    /// Give back the memory behind a committed range, keeping the reservation.
    ///
    /// # Safety
    ///
    /// The range must lie in a single live reservation; its contents are lost.
    unsafe fn decommit(&mut self, addr: usize, size: usize) -> Result<(), Self::Err>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToyError {
    /// The hint was taken, or nothing in the universe was large enough.
    Denied,
    /// A call named a range that is not (entirely) inside one reservation.
    NotReserved,
    /// Our own bookkeeping could not grow.
    Bookkeeping,
}

/// A simulated address space for testing.
///
/// Addresses are handed out from `universe`. Some of it can be marked as
/// reserved by someone else with [`block`](#method.block), which makes
/// hinted reservations there fail, the way a foreign mapping would.
pub struct ToyPages {
    pub page_size: usize,
    pub granularity: usize,
    pub universe: Interval,
    /// Number of successful `reserve` calls.
    pub reserves: usize,
    /// Number of `reserve` calls that were refused.
    pub denials: usize,
    /// Bytes currently committed.
    pub committed: usize,
    reservations: PageVec<Interval>,
}

impl Default for ToyPages {
    fn default() -> Self {
        ToyPages::new(4096, 64 * 1024, Interval::new(0x1000_0000, 0x2000_0000))
    }
}

impl ToyPages {
    pub fn new(page_size: usize, granularity: usize, universe: Interval) -> Self {
        assert!(page_size.is_power_of_two());
        assert!(granularity.is_power_of_two() && granularity % page_size == 0);
        ToyPages {
            page_size,
            granularity,
            universe,
            reserves: 0,
            denials: 0,
            committed: 0,
            reservations: PageVec::new(),
        }
    }

    /// Mark `range` as reserved by something other than the allocator.
    pub fn block(&mut self, range: Interval) -> Result<(), ToyError> {
        if self.collides(range) {
            return Err(ToyError::Denied);
        }
        self.reservations
            .push(range)
            .map_err(|_| ToyError::Bookkeeping)
    }

    /// All live reservations, including blocked ranges.
    pub fn reservations(&self) -> &[Interval] {
        self.reservations.as_slice()
    }

    /// Whether `[addr, addr + size)` lies in one live reservation.
    pub fn is_reserved(&self, addr: usize, size: usize) -> bool {
        let range = match Interval::from_base_len(addr, size) {
            Some(r) => r,
            None => return false,
        };
        self.reservations
            .iter()
            .any(|r| range.classify(r).is_covered())
    }

    fn collides(&self, range: Interval) -> bool {
        self.reservations.iter().any(|r| r.overlaps(&range))
    }

    // First granularity-aligned gap in the universe that fits `size`.
    fn find_free(&self, size: usize) -> Option<usize> {
        let mut candidate = align_up(self.universe.start, self.granularity)?;
        loop {
            let range = Interval::from_base_len(candidate, size)?;
            if range.end > self.universe.end {
                return None;
            }
            match self.reservations.iter().find(|r| r.overlaps(&range)) {
                None => return Some(candidate),
                Some(r) => candidate = align_up(r.end, self.granularity)?,
            }
        }
    }

    fn deny(&mut self) -> Result<usize, ToyError> {
        self.denials += 1;
        Err(ToyError::Denied)
    }
}

impl PageSource for ToyPages {
    type Err = ToyError;

    fn page_size(&self) -> usize {
        self.page_size
    }

    fn granularity(&self) -> usize {
        self.granularity
    }

    unsafe fn reserve(&mut self, hint: Option<usize>, size: usize) -> Result<usize, ToyError> {
        debug_assert!(size > 0 && size % self.granularity == 0);
        let base = match hint {
            Some(h) => {
                debug_assert!(h % self.granularity == 0);
                let range = match Interval::from_base_len(h, size) {
                    Some(r) => r,
                    None => return self.deny(),
                };
                if !range.classify(&self.universe).is_covered() || self.collides(range) {
                    return self.deny();
                }
                h
            }
            None => match self.find_free(size) {
                Some(b) => b,
                None => return self.deny(),
            },
        };

        self.reservations
            .push(Interval::new(base, base + size))
            .map_err(|_| ToyError::Bookkeeping)?;
        self.reserves += 1;
        Ok(base)
    }

    unsafe fn release(&mut self, base: usize, size: usize) -> Result<(), ToyError> {
        let wanted = Interval::new(base, base + size);
        let ix = self
            .reservations
            .iter()
            .position(|r| *r == wanted)
            .ok_or(ToyError::NotReserved)?;
        self.reservations.swap_remove(ix);
        Ok(())
    }

    unsafe fn commit(&mut self, addr: usize, size: usize) -> Result<(), ToyError> {
        if addr % self.page_size != 0 || !self.is_reserved(addr, size) {
            return Err(ToyError::NotReserved);
        }
        self.committed += size;
        Ok(())
    }

    unsafe fn decommit(&mut self, addr: usize, size: usize) -> Result<(), ToyError> {
        if addr % self.page_size != 0 || !self.is_reserved(addr, size) || size > self.committed {
            return Err(ToyError::NotReserved);
        }
        self.committed -= size;
        Ok(())
    }
}
