//! Record storage with stable 32-bit keys.
//!
//! Arenas and handles refer to each other by `Key` rather than by pointer.
//! Slots are reused through a free list; each slot carries a generation that
//! is bumped on removal, so a stale public handle can be told apart from the
//! record that later took over its slot.

use core::fmt;

use static_assertions::const_assert_eq;

use crate::pagevec::{PageVec, PageVecError};

/// Index of a slot in a `Slab`.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key(u32);

const_assert_eq!(core::mem::size_of::<Key>(), 4);
const_assert_eq!(core::mem::size_of::<Option<Key>>(), 8);

impl Key {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Copy, Clone)]
enum Entry<T> {
    Occupied(T),
    Vacant { next_free: Option<Key> },
}

#[derive(Copy, Clone)]
struct Slot<T> {
    generation: u32,
    entry: Entry<T>,
}

pub struct Slab<T: Copy> {
    slots: PageVec<Slot<T>>,
    free: Option<Key>,
    free_count: usize,
    len: usize,
}

impl<T: Copy> Default for Slab<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy> Slab<T> {
    pub const fn new() -> Self {
        Slab {
            slots: PageVec::new(),
            free: None,
            free_count: 0,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Make sure the next `additional` inserts cannot fail.
    pub fn reserve(&mut self, additional: usize) -> Result<(), PageVecError> {
        let fresh = additional.saturating_sub(self.free_count);
        self.slots.reserve(fresh)
    }

    pub fn insert(&mut self, value: T) -> Result<Key, PageVecError> {
        if let Some(key) = self.free {
            let slot = &mut self.slots[key.index()];
            self.free = match slot.entry {
                Entry::Vacant { next_free } => next_free,
                Entry::Occupied(_) => panic!("Slab free list points at a live slot {:?}", key),
            };
            slot.entry = Entry::Occupied(value);
            self.free_count -= 1;
            self.len += 1;
            return Ok(key);
        }

        let index = self.slots.len();
        if index > u32::MAX as usize {
            return Err(PageVecError::Full);
        }
        self.slots.push(Slot {
            generation: 0,
            entry: Entry::Occupied(value),
        })?;
        self.len += 1;
        Ok(Key(index as u32))
    }

    /// Remove the record at `key`, returning it.
    ///
    /// Panics if the slot is vacant.
    pub fn remove(&mut self, key: Key) -> T {
        let next_free = self.free;
        let slot = &mut self.slots[key.index()];
        let value = match slot.entry {
            Entry::Occupied(v) => v,
            Entry::Vacant { .. } => panic!("Removing vacant slab slot {:?}", key),
        };
        slot.entry = Entry::Vacant { next_free };
        slot.generation = slot.generation.wrapping_add(1);
        self.free = Some(key);
        self.free_count += 1;
        self.len -= 1;
        value
    }

    /// The current generation of the slot at `key`.
    pub fn generation(&self, key: Key) -> u32 {
        self.slots[key.index()].generation
    }

    /// Whether `key` holds a record whose generation is `generation`.
    pub fn is_live(&self, key: Key, generation: u32) -> bool {
        match self.slots.get(key.index()) {
            Some(Slot {
                generation: g,
                entry: Entry::Occupied(_),
            }) => *g == generation,
            _ => false,
        }
    }

    /// Panics if the slot is vacant.
    pub fn get(&self, key: Key) -> &T {
        match &self.slots[key.index()].entry {
            Entry::Occupied(v) => v,
            Entry::Vacant { .. } => panic!("Vacant slab slot {:?}", key),
        }
    }

    /// Panics if the slot is vacant.
    pub fn get_mut(&mut self, key: Key) -> &mut T {
        match &mut self.slots[key.index()].entry {
            Entry::Occupied(v) => v,
            Entry::Vacant { .. } => panic!("Vacant slab slot {:?}", key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    #[test]
    fn test_insert_remove_reuse() {
        let mut slab: Slab<u64> = Slab::new();
        let a = slab.insert(10).unwrap();
        let b = slab.insert(20).unwrap();
        let c = slab.insert(30).unwrap();
        assert_eq!(slab.len(), 3);
        assert_eq!(*slab.get(b), 20);

        let gen_b = slab.generation(b);
        assert_eq!(slab.remove(b), 20);
        assert!(!slab.is_live(b, gen_b));
        assert!(slab.is_live(a, slab.generation(a)));

        // The freed slot is reused, with a new generation.
        let d = slab.insert(40).unwrap();
        assert_eq!(d, b);
        assert_ne!(slab.generation(d), gen_b);
        assert!(!slab.is_live(d, gen_b));

        *slab.get_mut(c) += 1;
        assert_eq!(*slab.get(c), 31);
        assert_eq!(slab.len(), 3);
    }

    #[test]
    fn test_reserve_counts_free_slots() {
        let mut slab: Slab<u32> = Slab::new();
        let keys: [Key; 4] = [
            slab.insert(0).unwrap(),
            slab.insert(1).unwrap(),
            slab.insert(2).unwrap(),
            slab.insert(3).unwrap(),
        ];
        for &k in keys.iter() {
            slab.remove(k);
        }
        assert!(slab.is_empty());
        slab.reserve(6).unwrap();
        for i in 0..6 {
            slab.insert(i).unwrap();
        }
        assert_eq!(slab.len(), 6);
    }

    #[test]
    #[should_panic]
    fn test_get_vacant_panics() {
        let mut slab: Slab<u8> = Slab::new();
        let k = slab.insert(1).unwrap();
        slab.remove(k);
        slab.get(k);
    }
}
