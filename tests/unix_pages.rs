use page_allocator::{PageAllocator, UnixPageAllocator, UnixPages};

use test_log::test;

fn fill(ptr: *mut u8, len: usize, seed: u8) {
    for i in 0..len {
        unsafe { *ptr.add(i) = seed.wrapping_add(i as u8) };
    }
}

fn check(ptr: *const u8, len: usize, seed: u8) {
    for i in (0..len).step_by(509) {
        assert_eq!(unsafe { *ptr.add(i) }, seed.wrapping_add(i as u8), "at {}", i);
    }
}

#[test]
fn test_memory_is_usable() {
    let mut allocator = PageAllocator::new(UnixPages::default());
    let page = allocator.page_size();

    let h = allocator.allocate(None, 3 * page + 1).unwrap();
    assert_eq!(allocator.size(h), 4 * page);
    fill(allocator.target(h), allocator.size(h), 7);
    check(allocator.target(h), allocator.size(h), 7);

    let (validity, stats) = allocator.stats();
    assert!(validity.is_valid(), "{:?}", validity);
    assert_eq!(stats.committed, 4 * page);
    allocator.free(h);
    assert_eq!(allocator.arena_count(), 0);
}

#[test]
fn test_growth_keeps_contents() {
    let mut allocator = PageAllocator::new(UnixPages::default());
    let page = allocator.page_size();

    let h = allocator.allocate(None, 2 * page).unwrap();
    let target = allocator.target(h);
    fill(target, 2 * page, 3);

    // Growing in place may fail if the OS has something mapped right after,
    // but it must never move the handle.
    if allocator.set_handle_size(h, 16 * page) {
        assert_eq!(allocator.target(h), target);
        fill(unsafe { target.add(2 * page) }, 14 * page, 9);
        check(target, 2 * page, 3);
        check(unsafe { target.add(2 * page) }, 14 * page, 9);

        assert!(allocator.set_handle_size(h, page));
        check(target, page, 3);
    } else {
        assert_eq!(allocator.size(h), 2 * page);
        check(target, 2 * page, 3);
    }

    let (validity, _) = allocator.stats();
    assert!(validity.is_valid(), "{:?}", validity);
    allocator.free(h);
}

#[test]
fn test_merge_neighbors() {
    let mut allocator = PageAllocator::new(UnixPages::default());
    let page = allocator.page_size();

    let left = allocator.allocate(None, 4 * page).unwrap();
    let base = allocator.target(left) as usize;
    fill(allocator.target(left), 4 * page, 1);

    // Carve the right half off into its own handle by shrinking and
    // allocating at the address right after.
    assert!(allocator.set_handle_size(left, 2 * page));
    let right = match allocator.allocate(Some(base + 2 * page), 2 * page) {
        Some(r) => r,
        None => return,
    };
    fill(allocator.target(right), 2 * page, 5);
    assert_eq!(allocator.find_handle_by_address(base + 2 * page), Some(right));

    assert!(allocator.merge_page_handles(left, right));
    assert_eq!(allocator.region(left), base..(base + 4 * page));
    check(base as *const u8, 2 * page, 1);
    check((base + 2 * page) as *const u8, 2 * page, 5);

    let (validity, stats) = allocator.stats();
    assert!(validity.is_valid(), "{:?}", validity);
    assert_eq!(stats.handles, 1);
    allocator.free(left);
}

#[test]
fn test_shared_allocator() {
    static PAGES: UnixPageAllocator = UnixPageAllocator::new();

    let threads: Vec<_> = (0..4u8)
        .map(|n| {
            std::thread::spawn(move || {
                for round in 0..32 {
                    let (h, target, size) = {
                        let mut pages = PAGES.lock();
                        let size = pages.page_size() * (1 + (round % 5));
                        let h = pages.allocate(None, size).unwrap();
                        (h, pages.target(h) as usize, size)
                    };
                    fill(target as *mut u8, size, n);
                    check(target as *const u8, size, n);
                    PAGES.lock().free(h);
                }
            })
        })
        .collect();
    for t in threads {
        t.join().unwrap();
    }

    let (validity, stats) = PAGES.stats();
    assert!(validity.is_valid(), "{:?}", validity);
    assert_eq!(stats.handles, 0);
    assert_eq!(PAGES.lock().arena_count(), 0);
}
