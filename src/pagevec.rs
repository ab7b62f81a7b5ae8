//! A vector that lives in its own virtual memory reservation.
//!
//! The allocator cannot keep its bookkeeping on the Rust heap: that heap may
//! be the very thing calling into it, or may be exhausted. `PageVec` instead
//! reserves a fixed stretch of address space the first time it grows, and
//! commits pages of it as elements are pushed. Growing never moves the
//! elements, and the only system call made on growth is a commit.

use core::fmt;
use core::marker::PhantomData;
use core::mem::size_of;
use core::ops::{Index, IndexMut};
use core::ptr::{null_mut, NonNull};

use log::trace;
use static_assertions::const_assert;

use crate::allocators::fatal;
use crate::interval::align_up;
use crate::unix::{self, OsError};

/// Default upper bound on the number of elements a `PageVec` can hold.
pub const DEFAULT_MAX_LEN: usize = 1 << 20;

// Pages are committed in chunks of at least this many bytes.
const COMMIT_CHUNK: usize = 64 * 1024;
const_assert!(COMMIT_CHUNK.is_power_of_two());

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PageVecError {
    /// `max_len` elements are already stored.
    Full,
    /// Reserving or committing address space failed.
    Os(OsError),
}

impl fmt::Display for PageVecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageVecError::Full => write!(f, "page vector is full"),
            PageVecError::Os(e) => write!(f, "page vector could not grow: {}", e),
        }
    }
}

impl From<OsError> for PageVecError {
    fn from(e: OsError) -> Self {
        PageVecError::Os(e)
    }
}

/// A growable vector of `Copy` records backed by self-managed pages.
///
/// Invariants:
///
/// - `base` is null until the first growth, after which it points to a
///   reservation of `reserved` bytes.
/// - The first `committed` bytes of that reservation are readable and
///   writable, and `len * size_of::<T>() <= committed`.
pub struct PageVec<T: Copy> {
    base: *mut T,
    len: usize,
    committed: usize,
    reserved: usize,
    max_len: usize,
    marker: PhantomData<T>,
}

// A PageVec owns its reservation outright, so moving it across threads is
// fine as long as its elements can move too.
unsafe impl<T: Copy + Send> Send for PageVec<T> {}

impl<T: Copy> Default for PageVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy> PageVec<T> {
    /// An empty vector. Nothing is reserved until the first push.
    pub const fn new() -> Self {
        Self::with_max_len(DEFAULT_MAX_LEN)
    }

    /// An empty vector that can hold at most `max_len` elements.
    pub const fn with_max_len(max_len: usize) -> Self {
        PageVec {
            base: null_mut(),
            len: 0,
            committed: 0,
            reserved: 0,
            max_len,
            marker: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of elements that fit without committing more pages.
    pub fn capacity(&self) -> usize {
        self.committed / size_of::<T>()
    }

    pub fn as_slice(&self) -> &[T] {
        match NonNull::new(self.base) {
            None => &[],
            Some(p) => unsafe { core::slice::from_raw_parts(p.as_ptr(), self.len) },
        }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        match NonNull::new(self.base) {
            None => &mut [],
            Some(p) => unsafe { core::slice::from_raw_parts_mut(p.as_ptr(), self.len) },
        }
    }

    pub fn iter(&self) -> core::slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.as_slice().get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.as_mut_slice().get_mut(index)
    }

    /// Forget all elements. Committed pages are kept for reuse.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Ensure `additional` more elements can be pushed without failing.
    pub fn reserve(&mut self, additional: usize) -> Result<(), PageVecError> {
        let wanted = self.len.checked_add(additional).ok_or(PageVecError::Full)?;
        if wanted > self.max_len {
            return Err(PageVecError::Full);
        }
        if wanted <= self.capacity() {
            return Ok(());
        }
        self.grow(wanted * size_of::<T>())
    }

    pub fn push(&mut self, value: T) -> Result<(), PageVecError> {
        self.reserve(1)?;
        unsafe { self.base.add(self.len).write(value) };
        self.len += 1;
        Ok(())
    }

    /// Remove the element at `index`, replacing it with the last one.
    ///
    /// Panics if `index` is out of bounds.
    pub fn swap_remove(&mut self, index: usize) -> T {
        let len = self.len;
        assert!(index < len, "swap_remove index {} out of {}", index, len);
        let slice = self.as_mut_slice();
        slice.swap(index, len - 1);
        let value = slice[len - 1];
        self.len -= 1;
        value
    }

    fn grow(&mut self, needed_bytes: usize) -> Result<(), PageVecError> {
        let page = unix::page_size();
        if self.base.is_null() {
            let bytes = self
                .max_len
                .checked_mul(size_of::<T>())
                .and_then(|b| align_up(b, page))
                .ok_or(PageVecError::Full)?;
            let base = unsafe { unix::reserve(None, bytes)? };
            trace!("PageVec reserved {} bytes at {:#x}", bytes, base);
            self.base = base as *mut T;
            self.reserved = bytes;
        }

        // Commit in chunks, doubling, but never past the reservation.
        let target = needed_bytes
            .max(self.committed * 2)
            .max(COMMIT_CHUNK)
            .min(self.reserved);
        let target = align_up(target, page)
            .ok_or(PageVecError::Full)?
            .min(self.reserved);
        if target < needed_bytes {
            return Err(PageVecError::Full);
        }

        let start = self.base as usize + self.committed;
        unsafe { unix::commit(start, target - self.committed)? };
        trace!(
            "PageVec committed {} -> {} bytes at {:#x}",
            self.committed,
            target,
            self.base as usize
        );
        self.committed = target;
        Ok(())
    }
}

impl<T: Copy> Drop for PageVec<T> {
    fn drop(&mut self) {
        if self.base.is_null() {
            return;
        }
        if let Err(e) = unsafe { unix::release(self.base as usize, self.reserved) } {
            fatal("page vector failed to release its reservation", &e);
        }
    }
}

impl<T: Copy> Index<usize> for PageVec<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.as_slice()[index]
    }
}

impl<T: Copy> IndexMut<usize> for PageVec<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.as_mut_slice()[index]
    }
}

impl<T: Copy + fmt::Debug> fmt::Debug for PageVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
