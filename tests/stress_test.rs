use page_allocator::{PageAllocator, PageHandle, ToyPages};

use rand::distributions::Distribution;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore, SeedableRng};
use test_log::test;

const PAGE: usize = 4096;

fn validate(allocator: &PageAllocator<ToyPages>, handles: &[Option<PageHandle>]) {
    let (validity, stats) = allocator.stats();
    log::info!(
        "Committed: {}; reserved: {}; Validity: {:?}, Stats: {:?}",
        allocator.source().committed,
        stats.reserved,
        validity,
        stats,
    );
    log::debug!("{}", allocator);
    assert!(validity.is_valid());

    let expected: usize = handles
        .iter()
        .flatten()
        .map(|&h| allocator.size(h))
        .sum();
    assert_eq!(stats.committed, expected);
    assert_eq!(allocator.source().committed, expected);
    assert_eq!(stats.handles, handles.iter().flatten().count());
    assert!(stats.reserved >= stats.committed);
}

fn run(allocator: &mut PageAllocator<ToyPages>, seed: u64, steps: usize) {
    log::info!("Using seed {}", seed);
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let pages = rand::distributions::Uniform::new_inclusive(1usize, 40);

    // Anything reserved before we start belongs to someone else.
    let foreign = allocator.source().reservations().len();
    let mut handles: [Option<PageHandle>; 64] = [None; 64];

    for _ in 0..steps {
        let ix = rng.gen_range(0, handles.len());
        match handles[ix] {
            None => {
                let size = pages.sample(&mut rng) * PAGE - rng.gen_range(0, PAGE);
                // Sometimes ask for the space right next to another handle.
                let hint = match handles.choose(&mut rng) {
                    Some(Some(other)) if rng.gen_bool(0.5) => {
                        let r = allocator.region(*other);
                        if rng.gen_bool(0.5) {
                            Some(r.end + rng.gen_range(0, 4) * PAGE)
                        } else {
                            r.start.checked_sub(size + rng.gen_range(0, 4) * PAGE)
                        }
                    }
                    _ => None,
                };
                log::info!("Allocating {} at {:x?}", size, hint);
                let got = allocator.allocate(hint, size);
                log::info!("  Allocated {:?}", got.map(|h| allocator.region(h)));
                if hint.is_none() {
                    assert!(got.is_some(), "unhinted allocation failed");
                }
                if let (Some(h), Some(addr)) = (got, hint) {
                    assert_eq!(allocator.region(h).start, addr - addr % PAGE);
                }
                handles[ix] = got;
            }
            Some(h) => match rng.gen_range(0, 4) {
                0 => {
                    log::info!("Freeing {:?}", allocator.region(h));
                    allocator.free(h);
                    handles[ix] = None;
                }
                1 => {
                    let before = allocator.region(h);
                    let size = pages.sample(&mut rng) * PAGE;
                    let ok = allocator.set_handle_size(h, size);
                    log::info!("Resizing {:?} to {}: {}", before, size, ok);
                    let after = allocator.region(h);
                    assert_eq!(after.start, before.start);
                    if ok {
                        assert_eq!(after.end - after.start, size);
                    } else {
                        assert_eq!(after, before);
                    }
                }
                2 => {
                    let before = allocator.region(h);
                    let size = pages.sample(&mut rng) * PAGE;
                    let ok = allocator.left_resize_handle(h, size);
                    log::info!("Left-resizing {:?} to {}: {}", before, size, ok);
                    let after = allocator.region(h);
                    assert_eq!(after.end, before.end);
                    if ok {
                        assert_eq!(after.end - after.start, size);
                    } else {
                        assert_eq!(after, before);
                    }
                }
                _ => {
                    let jx = rng.gen_range(0, handles.len());
                    let other = match handles[jx] {
                        Some(o) if jx != ix => o,
                        _ => continue,
                    };
                    let (r1, r2) = (allocator.region(h), allocator.region(other));
                    let ok = allocator.merge_page_handles(h, other);
                    log::info!("Merging {:?} and {:?}: {}", r1, r2, ok);
                    if ok {
                        let merged = allocator.region(h);
                        assert_eq!(merged.start, r1.start.min(r2.start));
                        assert_eq!(merged.end, r1.end.max(r2.end));
                        assert!(!allocator.is_live(other));
                        handles[jx] = None;
                    } else {
                        assert_eq!(allocator.region(h), r1);
                        assert_eq!(allocator.region(other), r2);
                    }
                }
            },
        }

        validate(allocator, &handles);
    }

    for slot in handles.iter_mut() {
        if let Some(h) = slot.take() {
            allocator.free(h);
        }
    }
    validate(allocator, &handles);
    assert_eq!(allocator.arena_count(), 0);
    assert_eq!(allocator.source().reservations().len(), foreign);
}

#[test]
fn test_stress() {
    let mut allocator = PageAllocator::new(ToyPages::default());
    let seed: u64 = rand::thread_rng().next_u64();
    run(&mut allocator, seed, 1024 * 4);
}

#[test]
fn test_stress_page_granularity() {
    // Every page is its own reservation unit, as on Unix.
    let universe = page_allocator::Interval::new(0x4000_0000, 0x6000_0000);
    let mut allocator = PageAllocator::new(ToyPages::new(PAGE, PAGE, universe));
    let seed: u64 = rand::thread_rng().next_u64();
    run(&mut allocator, seed, 1024 * 4);
}

#[test]
fn test_stress_fixed_seeds() {
    for &seed in [0u64, 1, 0xdead_beef].iter() {
        let mut allocator = PageAllocator::new(ToyPages::default());
        run(&mut allocator, seed, 1024);
    }
}

#[test]
fn test_stress_foreign_blocks() {
    // Scatter foreign reservations through the low end of the address space
    // so hinted reservations, growth and merges keep running into them.
    let mut source = ToyPages::default();
    let granule = source.granularity;
    let start = source.universe.start;
    for &n in [1usize, 3, 4, 9, 17, 30, 31, 58].iter() {
        let at = start + n * granule;
        source
            .block(page_allocator::Interval::new(at, at + granule))
            .unwrap();
    }
    let mut allocator = PageAllocator::new(source);
    let seed: u64 = rand::thread_rng().next_u64();
    run(&mut allocator, seed, 1024 * 4);
    assert!(allocator.source().denials > 0);
}
