//! An example program that keeps a pool of growable buffers in page handles,
//! grows, shrinks, merges and frees them at random, writes through all of
//! them, and checks validity along the way.

use page_allocator::{PageHandle, UnixPageAllocator};

use rand::distributions::{Distribution, Uniform};
use rand::{Rng, RngCore, SeedableRng};

static PAGES: UnixPageAllocator = UnixPageAllocator::new();

// Number of buffers to keep before we start freeing
const MIN_BUFFERS: usize = 64;
// Total number of operations
const OPERATIONS: usize = 16 * 1024;
// Largest buffer, in pages
const MAX_PAGES: usize = 64;

struct Buffer {
    handle: PageHandle,
    // Every byte of the buffer holds `tag`.
    tag: u8,
}

fn write(buffer: &Buffer) {
    let pages = PAGES.lock();
    let target = pages.target(buffer.handle);
    let size = pages.size(buffer.handle);
    unsafe { core::ptr::write_bytes(target, buffer.tag, size) };
}

fn verify(buffer: &Buffer, len: usize) {
    let pages = PAGES.lock();
    let target = pages.target(buffer.handle);
    for i in (0..len).step_by(1021) {
        assert_eq!(unsafe { *target.add(i) }, buffer.tag);
    }
}

#[derive(Default)]
struct Pool {
    buffers: Vec<Buffer>,
    max_pages: usize,
}

impl Pool {
    fn create<R: Rng>(&mut self, rng: &mut R) {
        let page = PAGES.lock().page_size();
        let size = Uniform::new_inclusive(1, self.max_pages).sample(rng) * page;
        let handle = match PAGES.lock().allocate(None, size) {
            Some(h) => h,
            None => return,
        };
        let buffer = Buffer {
            handle,
            tag: rng.gen(),
        };
        write(&buffer);
        self.buffers.push(buffer);
    }

    fn resize<R: Rng>(&mut self, rng: &mut R) {
        if self.buffers.is_empty() {
            return;
        }
        let ix = rng.gen_range(0, self.buffers.len());
        let page = PAGES.lock().page_size();
        let pages = Uniform::new_inclusive(1, self.max_pages).sample(rng);
        let buffer = &self.buffers[ix];
        let before = PAGES.lock().size(buffer.handle);
        let grown = PAGES.lock().set_handle_size(buffer.handle, pages * page);
        if grown {
            verify(buffer, before.min(pages * page));
            write(buffer);
        }
    }

    fn merge<R: Rng>(&mut self, rng: &mut R) {
        if self.buffers.len() < 2 {
            return;
        }
        let ix = rng.gen_range(0, self.buffers.len());
        let jx = rng.gen_range(0, self.buffers.len());
        if ix == jx {
            return;
        }
        let (h1, h2) = (self.buffers[ix].handle, self.buffers[jx].handle);
        // Only adjacent buffers stay small enough to be worth merging.
        let adjacent = {
            let pages = PAGES.lock();
            let (r1, r2) = (pages.region(h1), pages.region(h2));
            r1.end == r2.start || r2.end == r1.start
        };
        if adjacent && PAGES.lock().merge_page_handles(h1, h2) {
            self.buffers.swap_remove(jx);
            let ix = self.buffers.iter().position(|b| b.handle == h1).unwrap();
            write(&self.buffers[ix]);
        }
    }

    fn destroy<R: Rng>(&mut self, rng: &mut R) {
        if self.buffers.is_empty() {
            return;
        }
        let ix = rng.gen_range(0, self.buffers.len());
        let buffer = self.buffers.swap_remove(ix);
        let size = PAGES.lock().size(buffer.handle);
        verify(&buffer, size);
        PAGES.lock().free(buffer.handle);
    }
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.contains(&"--help".to_owned()) {
        println!("USAGE: {} [OPERATIONS] [MIN_BUFFERS] [MAX_PAGES]", args[0]);
        return;
    }
    let mut operations: usize = args
        .get(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(OPERATIONS);
    let min_buffers: usize = args
        .get(2)
        .and_then(|s| s.parse().ok())
        .unwrap_or(MIN_BUFFERS);
    if operations < min_buffers {
        operations = min_buffers;
    }
    let max_pages: usize = args
        .get(3)
        .and_then(|s| s.parse().ok())
        .unwrap_or(MAX_PAGES)
        .max(1);

    env_logger::init();
    println!("Running Stress Test.\n\nParameters:");
    println!("    {} total operations", operations);
    println!("    {} buffers before any are freed", min_buffers);
    println!("    {} pages max buffer size", max_pages);

    let seed: u64 = rand::thread_rng().next_u64();
    log::info!("Using seed {}", seed);
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);

    let mut pool = Pool {
        buffers: Vec::new(),
        max_pages,
    };

    for i in 1..=operations {
        if pool.buffers.len() < min_buffers {
            pool.create(&mut rng);
        } else {
            match rng.gen_range(0, 8) {
                0..=2 => pool.create(&mut rng),
                3..=4 => pool.resize(&mut rng),
                5 => pool.merge(&mut rng),
                _ => pool.destroy(&mut rng),
            }
        }

        let (validity, stats) = PAGES.stats();
        if i % 1024 == 0 {
            println!("Step {} / {}", i, operations);
            println!("    Buffers: {}", pool.buffers.len());
            println!("    Allocator stats: {:?}", stats);
        }
        assert!(validity.is_valid(), "{:?}", validity);
    }

    while !pool.buffers.is_empty() {
        pool.destroy(&mut rng);
        let (validity, _) = PAGES.stats();
        assert!(validity.is_valid());
    }

    let (validity, stats) = PAGES.stats();
    println!("\nFinished.");
    println!("    Stats:    {:?}", stats);
    assert!(validity.is_valid());
    assert_eq!(PAGES.lock().arena_count(), 0);
}
