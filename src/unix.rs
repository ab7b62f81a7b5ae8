//! Virtual memory calls on Unix, and the page source built on them.
//!
//! Reservations are made `PROT_NONE`, so reserved-but-uncommitted pages fault
//! on access. Committing flips a range to read/write; decommitting hands the
//! physical pages back with `MADV_DONTNEED` and revokes access again.

use core::fmt;
use core::ptr::null_mut;

use errno::Errno;

use crate::source::PageSource;

/// The call that failed, and what the OS said about it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OsError {
    Mmap(Errno),
    /// The OS placed a hinted reservation somewhere other than the hint. The
    /// stray mapping has already been unmapped.
    Relocated { wanted: usize, got: usize },
    Munmap(Errno),
    Mprotect(Errno),
    Madvise(Errno),
}

impl fmt::Display for OsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OsError::Mmap(e) => write!(f, "mmap failed: {}", e),
            OsError::Relocated { wanted, got } => {
                write!(f, "mmap placed {:#x} instead of {:#x}", got, wanted)
            }
            OsError::Munmap(e) => write!(f, "munmap failed: {}", e),
            OsError::Mprotect(e) => write!(f, "mprotect failed: {}", e),
            OsError::Madvise(e) => write!(f, "madvise failed: {}", e),
        }
    }
}

/// The OS page size.
pub fn page_size() -> usize {
    sysconf::page::pagesize()
}

#[cfg(target_os = "linux")]
const RESERVE_FLAGS: libc::c_int = libc::MAP_PRIVATE | libc::MAP_ANONYMOUS | libc::MAP_NORESERVE;
#[cfg(not(target_os = "linux"))]
const RESERVE_FLAGS: libc::c_int = libc::MAP_PRIVATE | libc::MAP_ANON;

#[cfg(target_os = "linux")]
const HINT_FLAGS: libc::c_int = libc::MAP_FIXED_NOREPLACE;
#[cfg(not(target_os = "linux"))]
const HINT_FLAGS: libc::c_int = 0;

/// Reserve `size` bytes of address space without backing it.
///
/// With a hint, the reservation lands exactly at `hint` or not at all.
///
/// # Safety
///
/// `size` must be a non-zero multiple of the page size, and `hint` (if any)
/// page aligned.
pub unsafe fn reserve(hint: Option<usize>, size: usize) -> Result<usize, OsError> {
    let (addr, flags) = match hint {
        Some(h) => (h as *mut libc::c_void, RESERVE_FLAGS | HINT_FLAGS),
        None => (null_mut(), RESERVE_FLAGS),
    };

    let ptr = libc::mmap(addr, size, libc::PROT_NONE, flags, -1, 0);
    if ptr == libc::MAP_FAILED {
        return Err(OsError::Mmap(errno::errno()));
    }

    let got = ptr as usize;
    if let Some(wanted) = hint {
        if got != wanted {
            // Older kernels ignore MAP_FIXED_NOREPLACE and treat the address
            // as a plain hint.
            release(got, size)?;
            return Err(OsError::Relocated { wanted, got });
        }
    }

    Ok(got)
}

/// Unmap a whole prior reservation.
///
/// # Safety
///
/// `[base, base + size)` must be a reservation nobody references any more.
pub unsafe fn release(base: usize, size: usize) -> Result<(), OsError> {
    if libc::munmap(base as *mut libc::c_void, size) != 0 {
        return Err(OsError::Munmap(errno::errno()));
    }
    Ok(())
}

/// Make a reserved range readable and writable.
///
/// # Safety
///
/// The range must be page aligned and lie inside a live reservation.
pub unsafe fn commit(addr: usize, size: usize) -> Result<(), OsError> {
    let prot = libc::PROT_READ | libc::PROT_WRITE;
    if libc::mprotect(addr as *mut libc::c_void, size, prot) != 0 {
        return Err(OsError::Mprotect(errno::errno()));
    }
    Ok(())
}

/// Drop the physical pages behind a committed range and revoke access.
///
/// # Safety
///
/// The range must be page aligned and lie inside a live reservation. Any data
/// in it is lost.
pub unsafe fn decommit(addr: usize, size: usize) -> Result<(), OsError> {
    if libc::madvise(addr as *mut libc::c_void, size, libc::MADV_DONTNEED) != 0 {
        return Err(OsError::Madvise(errno::errno()));
    }
    if libc::mprotect(addr as *mut libc::c_void, size, libc::PROT_NONE) != 0 {
        return Err(OsError::Mprotect(errno::errno()));
    }
    Ok(())
}

/// `UnixPages` hands out real address space from the OS.
///
/// On Unix a reservation can start at any page, so the allocation
/// granularity equals the page size.
#[derive(Debug, Clone, Copy)]
pub struct UnixPages {
    page_size: usize,
    // Just for tracking, not really needed
    reservations: usize,
}

impl Default for UnixPages {
    fn default() -> Self {
        UnixPages {
            page_size: page_size(),
            reservations: 0,
        }
    }
}

impl UnixPages {
    /// Number of successful reservations made so far.
    pub fn reservations(&self) -> usize {
        self.reservations
    }
}

impl PageSource for UnixPages {
    type Err = OsError;

    fn page_size(&self) -> usize {
        self.page_size
    }

    fn granularity(&self) -> usize {
        self.page_size
    }

    unsafe fn reserve(&mut self, hint: Option<usize>, size: usize) -> Result<usize, OsError> {
        let base = reserve(hint, size)?;
        self.reservations += 1;
        Ok(base)
    }

    unsafe fn release(&mut self, base: usize, size: usize) -> Result<(), OsError> {
        release(base, size)
    }

    unsafe fn commit(&mut self, addr: usize, size: usize) -> Result<(), OsError> {
        commit(addr, size)
    }

    unsafe fn decommit(&mut self, addr: usize, size: usize) -> Result<(), OsError> {
        decommit(addr, size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    #[test]
    fn test_reserve_commit_release() {
        let page = page_size();
        unsafe {
            let base = reserve(None, 4 * page).unwrap();
            assert_eq!(base % page, 0);

            commit(base + page, 2 * page).unwrap();
            let p = (base + page) as *mut u8;
            for i in 0..2 * page {
                *p.add(i) = (i & 0xff) as u8;
            }
            assert_eq!(*p.add(2 * page - 1), ((2 * page - 1) & 0xff) as u8);

            decommit(base + page, page).unwrap();
            // The second committed page is untouched.
            assert_eq!(*p.add(page), (page & 0xff) as u8);

            release(base, 4 * page).unwrap();
        }
    }

    #[test]
    fn test_hinted_reserve_is_exact_or_denied() {
        let page = page_size();
        unsafe {
            let base = reserve(None, 2 * page).unwrap();
            // The hint is taken, so asking again must not relocate.
            let again = reserve(Some(base), 2 * page);
            assert!(again.is_err(), "{:?}", again);

            release(base, 2 * page).unwrap();
            let retry = reserve(Some(base), 2 * page);
            if let Ok(b) = retry {
                assert_eq!(b, base);
                release(b, 2 * page).unwrap();
            }
        }
    }
}
