//! EntryList: insertion-ordered entry storage with stable positions.
//!
//! Nodes live in a `SlotMap` arena and are threaded onto an intrusive
//! doubly linked list through their slot keys. A position (slot key)
//! stays valid while its node lives, regardless of splices elsewhere in
//! the list, and a removed position can never resolve to a later node
//! because the arena bumps the slot generation on reuse.

use slotmap::{DefaultKey, SlotMap};

#[derive(Debug)]
pub(crate) struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    /// Digest computed once at insertion; bucket selection never
    /// re-invokes `K: Hash`.
    pub(crate) hash: u64,
    pub(crate) prev: Option<DefaultKey>,
    pub(crate) next: Option<DefaultKey>,
}

#[derive(Debug)]
pub(crate) struct EntryList<K, V> {
    slots: SlotMap<DefaultKey, Node<K, V>>,
    head: Option<DefaultKey>,
    tail: Option<DefaultKey>,
}

impl<K, V> EntryList<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            slots: SlotMap::with_key(),
            head: None,
            tail: None,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub(crate) fn node(&self, at: DefaultKey) -> Option<&Node<K, V>> {
        self.slots.get(at)
    }

    pub(crate) fn node_mut(&mut self, at: DefaultKey) -> Option<&mut Node<K, V>> {
        self.slots.get_mut(at)
    }

    /// Append a node at the back of the list.
    pub(crate) fn push_back(&mut self, key: K, value: V, hash: u64) -> DefaultKey {
        let prev = self.tail;
        let at = self.slots.insert(Node {
            key,
            value,
            hash,
            prev,
            next: None,
        });
        match prev {
            Some(p) => self.slots[p].next = Some(at),
            None => self.head = Some(at),
        }
        self.tail = Some(at);
        at
    }

    /// Splice a node directly after `after`, which must be a live
    /// position. Returns the new node's position.
    pub(crate) fn insert_after(&mut self, after: DefaultKey, key: K, value: V, hash: u64) -> DefaultKey {
        let next = self.slots[after].next;
        let at = self.slots.insert(Node {
            key,
            value,
            hash,
            prev: Some(after),
            next,
        });
        self.slots[after].next = Some(at);
        match next {
            Some(n) => self.slots[n].prev = Some(at),
            None => self.tail = Some(at),
        }
        at
    }

    /// Unlink and return the node at `at`. The returned node still
    /// carries its pre-removal `prev`/`next` links so callers can shrink
    /// a window boundary without a second lookup.
    pub(crate) fn remove(&mut self, at: DefaultKey) -> Option<Node<K, V>> {
        let node = self.slots.remove(at)?;
        match node.prev {
            Some(p) => self.slots[p].next = node.next,
            None => self.head = node.next,
        }
        match node.next {
            Some(n) => self.slots[n].prev = node.prev,
            None => self.tail = node.prev,
        }
        Some(node)
    }

    /// Unlink and return the front node, in list order.
    pub(crate) fn pop_front(&mut self) -> Option<Node<K, V>> {
        let at = self.head?;
        self.remove(at)
    }

    /// Drop every node. Positions handed out earlier go stale; the arena
    /// generation bump keeps them from resolving after reuse.
    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.head = None;
        self.tail = None;
    }

    /// Shared traversal in list order.
    pub(crate) fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            list: self,
            cur: self.head,
        }
    }

    /// Mutable traversal in arena storage order. List order is not
    /// reproducible here without unsafe aliasing; callers treat the
    /// order as unspecified.
    pub(crate) fn iter_mut(&mut self) -> slotmap::basic::IterMut<'_, DefaultKey, Node<K, V>> {
        self.slots.iter_mut()
    }
}

pub(crate) struct Iter<'a, K, V> {
    list: &'a EntryList<K, V>,
    cur: Option<DefaultKey>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (DefaultKey, &'a Node<K, V>);

    fn next(&mut self) -> Option<Self::Item> {
        let at = self.cur?;
        let node = self.list.node(at)?;
        self.cur = node.next;
        Some((at, node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys_in_order(list: &EntryList<&'static str, i32>) -> Vec<&'static str> {
        list.iter().map(|(_, n)| n.key).collect()
    }

    /// Invariant: push_back preserves arrival order and len tracks the
    /// number of live nodes.
    #[test]
    fn push_back_orders_and_counts() {
        let mut l: EntryList<&str, i32> = EntryList::new();
        assert!(l.is_empty());
        l.push_back("a", 1, 0);
        l.push_back("b", 2, 0);
        l.push_back("c", 3, 0);
        assert_eq!(l.len(), 3);
        assert_eq!(keys_in_order(&l), vec!["a", "b", "c"]);
    }

    /// Invariant: insert_after splices directly behind the given
    /// position, including when that position is the tail.
    #[test]
    fn insert_after_splices_mid_and_tail() {
        let mut l: EntryList<&str, i32> = EntryList::new();
        let a = l.push_back("a", 1, 0);
        l.push_back("c", 3, 0);
        l.insert_after(a, "b", 2, 0);
        assert_eq!(keys_in_order(&l), vec!["a", "b", "c"]);

        let c = l.iter().last().map(|(at, _)| at).unwrap();
        l.insert_after(c, "d", 4, 0);
        assert_eq!(keys_in_order(&l), vec!["a", "b", "c", "d"]);
    }

    /// Invariant: remove unlinks head, interior and tail correctly and
    /// the returned node carries its pre-removal neighbors.
    #[test]
    fn remove_relinks_neighbors() {
        let mut l: EntryList<&str, i32> = EntryList::new();
        let a = l.push_back("a", 1, 0);
        let b = l.push_back("b", 2, 0);
        let c = l.push_back("c", 3, 0);

        let nb = l.remove(b).unwrap();
        assert_eq!(nb.prev, Some(a));
        assert_eq!(nb.next, Some(c));
        assert_eq!(keys_in_order(&l), vec!["a", "c"]);

        let na = l.remove(a).unwrap();
        assert_eq!(na.prev, None);
        assert_eq!(keys_in_order(&l), vec!["c"]);

        let nc = l.remove(c).unwrap();
        assert_eq!(nc.next, None);
        assert!(l.is_empty());
    }

    /// Invariant: a removed position never resolves again, even after
    /// the physical slot is reused (generational keys).
    #[test]
    fn stale_position_does_not_alias() {
        let mut l: EntryList<&str, i32> = EntryList::new();
        let a = l.push_back("old", 1, 0);
        l.remove(a).unwrap();
        let b = l.push_back("new", 2, 0);
        assert_ne!(a, b);
        assert!(l.node(a).is_none());
        assert_eq!(l.node(b).map(|n| n.key), Some("new"));
    }

    /// Invariant: pop_front drains in list order and clear empties the
    /// list in one step.
    #[test]
    fn pop_front_and_clear() {
        let mut l: EntryList<&str, i32> = EntryList::new();
        for (k, v) in [("a", 1), ("b", 2), ("c", 3)] {
            l.push_back(k, v, 0);
        }
        assert_eq!(l.pop_front().map(|n| n.key), Some("a"));
        assert_eq!(l.pop_front().map(|n| n.key), Some("b"));
        assert_eq!(l.len(), 1);

        l.push_back("d", 4, 0);
        l.clear();
        assert!(l.is_empty());
        assert!(l.pop_front().is_none());
    }
}
