//! Intrusive doubly-linked lists threaded through slab records.
//!
//! The links live inside the records themselves, so linking and unlinking
//! never allocates and never fails. A record may sit on several lists at
//! once; each list is told which of the record's `Links` it owns through a
//! [`Chain`](trait.Chain.html) marker type.

use core::marker::PhantomData;

use crate::slab::{Key, Slab};

#[derive(Copy, Clone, Default, Debug, PartialEq, Eq)]
pub struct Links {
    pub prev: Option<Key>,
    pub next: Option<Key>,
}

/// Selects which `Links` field of a `T` a list threads through.
pub trait Chain<T> {
    fn links(node: &T) -> &Links;
    fn links_mut(node: &mut T) -> &mut Links;
}

/// A linked list of keys into a `Slab<T>`.
///
/// Invariants:
///
/// - `head` and `tail` are both `None`, or both point at linked records.
/// - Following `next` from `head` visits exactly `len` records and ends at
///   `tail`; `prev` mirrors it.
pub struct List<C> {
    head: Option<Key>,
    tail: Option<Key>,
    len: usize,
    marker: PhantomData<C>,
}

impl<C> Default for List<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> List<C> {
    pub const fn new() -> Self {
        List {
            head: None,
            tail: None,
            len: 0,
            marker: PhantomData,
        }
    }

    pub fn head(&self) -> Option<Key> {
        self.head
    }

    pub fn tail(&self) -> Option<Key> {
        self.tail
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn next<T: Copy>(&self, slab: &Slab<T>, key: Key) -> Option<Key>
    where
        C: Chain<T>,
    {
        C::links(slab.get(key)).next
    }

    pub fn prev<T: Copy>(&self, slab: &Slab<T>, key: Key) -> Option<Key>
    where
        C: Chain<T>,
    {
        C::links(slab.get(key)).prev
    }

    /// Link `key` in directly after `anchor`, or at the head if `anchor` is
    /// `None`.
    pub fn insert_after<T: Copy>(&mut self, slab: &mut Slab<T>, anchor: Option<Key>, key: Key)
    where
        C: Chain<T>,
    {
        let next = match anchor {
            Some(a) => C::links(slab.get(a)).next,
            None => self.head,
        };
        self.link_between(slab, anchor, key, next);
    }

    /// Link `key` in directly before `anchor`, or at the tail if `anchor` is
    /// `None`.
    pub fn insert_before<T: Copy>(&mut self, slab: &mut Slab<T>, anchor: Option<Key>, key: Key)
    where
        C: Chain<T>,
    {
        let prev = match anchor {
            Some(a) => C::links(slab.get(a)).prev,
            None => self.tail,
        };
        self.link_between(slab, prev, key, anchor);
    }

    pub fn push_back<T: Copy>(&mut self, slab: &mut Slab<T>, key: Key)
    where
        C: Chain<T>,
    {
        self.insert_before(slab, None, key);
    }

    fn link_between<T: Copy>(
        &mut self,
        slab: &mut Slab<T>,
        prev: Option<Key>,
        key: Key,
        next: Option<Key>,
    ) where
        C: Chain<T>,
    {
        *C::links_mut(slab.get_mut(key)) = Links { prev, next };
        match prev {
            Some(p) => C::links_mut(slab.get_mut(p)).next = Some(key),
            None => self.head = Some(key),
        }
        match next {
            Some(n) => C::links_mut(slab.get_mut(n)).prev = Some(key),
            None => self.tail = Some(key),
        }
        self.len += 1;
    }

    /// Unlink `key`. The record itself stays in the slab.
    pub fn remove<T: Copy>(&mut self, slab: &mut Slab<T>, key: Key)
    where
        C: Chain<T>,
    {
        let Links { prev, next } = *C::links(slab.get(key));
        match prev {
            Some(p) => C::links_mut(slab.get_mut(p)).next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => C::links_mut(slab.get_mut(n)).prev = prev,
            None => self.tail = prev,
        }
        *C::links_mut(slab.get_mut(key)) = Links::default();
        self.len -= 1;
    }

    /// Walk from `start` (inclusive) towards the tail.
    pub fn iter_from<'a, T: Copy>(&'a self, slab: &'a Slab<T>, start: Option<Key>) -> Walk<'a, T, C>
    where
        C: Chain<T>,
    {
        Walk {
            slab,
            next: start,
            forward: true,
            marker: PhantomData,
        }
    }

    /// Walk from `start` (inclusive) towards the head.
    pub fn iter_back_from<'a, T: Copy>(
        &'a self,
        slab: &'a Slab<T>,
        start: Option<Key>,
    ) -> Walk<'a, T, C>
    where
        C: Chain<T>,
    {
        Walk {
            slab,
            next: start,
            forward: false,
            marker: PhantomData,
        }
    }

    pub fn iter<'a, T: Copy>(&'a self, slab: &'a Slab<T>) -> Walk<'a, T, C>
    where
        C: Chain<T>,
    {
        self.iter_from(slab, self.head)
    }
}

/// Iterator over the keys of a `List`, in either direction.
pub struct Walk<'a, T: Copy, C> {
    slab: &'a Slab<T>,
    next: Option<Key>,
    forward: bool,
    marker: PhantomData<C>,
}

impl<'a, T: Copy, C: Chain<T>> Iterator for Walk<'a, T, C> {
    type Item = Key;

    fn next(&mut self) -> Option<Key> {
        let key = self.next.take()?;
        let links = C::links(self.slab.get(key));
        self.next = if self.forward { links.next } else { links.prev };
        Some(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    #[derive(Copy, Clone, Default)]
    struct Node {
        value: u32,
        links: Links,
    }

    struct ByLinks;

    impl Chain<Node> for ByLinks {
        fn links(node: &Node) -> &Links {
            &node.links
        }
        fn links_mut(node: &mut Node) -> &mut Links {
            &mut node.links
        }
    }

    fn values(list: &List<ByLinks>, slab: &Slab<Node>) -> [u32; 8] {
        let mut out = [0; 8];
        for (i, k) in list.iter(slab).enumerate() {
            out[i] = slab.get(k).value;
        }
        out
    }

    fn node(slab: &mut Slab<Node>, value: u32) -> Key {
        slab.insert(Node {
            value,
            links: Links::default(),
        })
        .unwrap()
    }

    #[test]
    fn test_insert_and_remove() {
        let mut slab = Slab::new();
        let mut list: List<ByLinks> = List::new();

        let two = node(&mut slab, 2);
        let four = node(&mut slab, 4);
        let one = node(&mut slab, 1);
        let three = node(&mut slab, 3);
        let five = node(&mut slab, 5);

        list.push_back(&mut slab, two);
        list.push_back(&mut slab, four);
        list.insert_after(&mut slab, None, one);
        list.insert_after(&mut slab, Some(two), three);
        list.insert_before(&mut slab, None, five);
        assert_eq!(list.len(), 5);
        assert_eq!(values(&list, &slab), [1, 2, 3, 4, 5, 0, 0, 0]);
        assert_eq!(list.head(), Some(one));
        assert_eq!(list.tail(), Some(five));

        let backwards: u32 = list
            .iter_back_from(&slab, list.tail())
            .map(|k| slab.get(k).value)
            .fold(0, |acc, v| acc * 10 + v);
        assert_eq!(backwards, 54321);

        list.remove(&mut slab, one);
        list.remove(&mut slab, five);
        list.remove(&mut slab, three);
        assert_eq!(values(&list, &slab), [2, 4, 0, 0, 0, 0, 0, 0]);
        assert_eq!(list.prev(&slab, four), Some(two));
        assert_eq!(list.next(&slab, four), None);

        list.insert_before(&mut slab, Some(two), one);
        assert_eq!(list.head(), Some(one));
        assert_eq!(values(&list, &slab), [1, 2, 4, 0, 0, 0, 0, 0]);
    }
}
