#![no_std]

//! A reservation-and-commit page allocator.
//!
//! Address space is reserved from the operating system in large, aligned
//! chunks ("arenas") and committed page by page as callers ask for it. Each
//! allocation is a page handle: a page-aligned region that may span several
//! arenas, and that can later be grown or shrunk from either end, or merged
//! with another handle, without moving its contents.
//!
//! All of the allocator's own bookkeeping lives in directly mapped virtual
//! memory, so nothing here depends on a heap allocator.
//!
//! ```no_run
//! use page_allocator::UnixPageAllocator;
//!
//! static PAGES: UnixPageAllocator = UnixPageAllocator::new();
//!
//! let mut pages = PAGES.lock();
//! let handle = pages.allocate(None, 10_000).unwrap();
//! assert!(pages.set_handle_size(handle, 100_000));
//! unsafe { *pages.target(handle) = 1 };
//! pages.free(handle);
//! ```

pub mod allocators;
pub mod arena;
pub mod cut;
pub mod flow;
pub mod handle;
pub mod interval;
pub mod list;
pub mod pagevec;
pub mod slab;
pub mod source;
pub mod unix;

pub use allocators::{
    ArenaInfo, GenericPageAllocator, PageAllocator, PageHandle, Stats, UnixPageAllocator, Validity,
};
pub use interval::{IntersectKind, Interval};
pub use source::{PageSource, ToyError, ToyPages};
pub use unix::{OsError, UnixPages};
