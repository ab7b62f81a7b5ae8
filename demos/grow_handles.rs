//! A minimal example of growing a page handle in place.
//!
//! Run with `RUST_LOG=page_allocator=debug` to watch the arenas come and go.

use page_allocator::UnixPageAllocator;

static PAGES: UnixPageAllocator = UnixPageAllocator::new();

fn main() {
    env_logger::init();

    let mut pages = PAGES.lock();
    let page = pages.page_size();
    println!("Page size: {}", page);

    let h = pages.allocate(None, 8).unwrap();
    println!("Allocated {:x?}", pages.region(h));
    unsafe { *pages.target(h) = 42 };

    for n in [2, 16, 256].iter() {
        let ok = pages.set_handle_size(h, n * page);
        println!("Growing to {} pages: {} -> {:x?}", n, ok, pages.region(h));
    }
    let ok = pages.left_resize_handle(h, 512 * page);
    println!("Growing down to 512 pages: {} -> {:x?}", ok, pages.region(h));

    println!("{}", *pages);
    let (validity, stats) = pages.stats();
    println!("Valid: {}, {:?}", validity.is_valid(), stats);

    pages.free(h);
    println!("Freed; {} arenas left", pages.arena_count());
}
