//! WindowHashMap: chained hash map with bucket-owned windows of one
//! shared entry list.
//!
//! Every bucket that holds anything records the `[head, tail]` boundary
//! of a contiguous run of positions in the shared [`EntryList`]; all
//! keys in that run hash to the bucket, and no key outside it does.
//! Keeping the runs contiguous is what the insert and erase paths are
//! organized around: a colliding insert splices directly after the
//! bucket's tail, and erase shrinks a window only at its ends or
//! unlinks a strict interior node.

use crate::entry_list::{EntryList, Node};
use crate::guard::ReentryCheck;
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use slotmap::DefaultKey;
use std::collections::hash_map::RandomState;

/// Bucket count of a fresh map. The table doubles under load and never
/// shrinks.
const INITIAL_BUCKETS: usize = 16;

/// Position of a live entry. Stable until the entry is erased or the
/// table rebuilds; after either, the position resolves to `None` and
/// can never alias a different entry.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Pos(DefaultKey);

impl Pos {
    pub(crate) fn new(at: DefaultKey) -> Self {
        Pos(at)
    }
    pub(crate) fn raw(&self) -> DefaultKey {
        self.0
    }

    pub fn key<'a, K, V, S>(&self, map: &'a WindowHashMap<K, V, S>) -> Option<&'a K>
    where
        K: Eq + Hash,
        S: BuildHasher,
    {
        map.pos_key(*self)
    }

    pub fn value<'a, K, V, S>(&self, map: &'a WindowHashMap<K, V, S>) -> Option<&'a V>
    where
        K: Eq + Hash,
        S: BuildHasher,
    {
        map.pos_value(*self)
    }

    pub fn value_mut<'a, K, V, S>(&self, map: &'a mut WindowHashMap<K, V, S>) -> Option<&'a mut V>
    where
        K: Eq + Hash,
        S: BuildHasher,
    {
        map.pos_value_mut(*self)
    }
}

/// Boundary of one bucket's contiguous run in the entry list,
/// inclusive on both ends. `head == tail` is a single-entry window.
#[derive(Copy, Clone, Debug)]
struct Window {
    head: DefaultKey,
    tail: DefaultKey,
}

pub struct WindowHashMap<K, V, S = RandomState> {
    hasher: S,
    buckets: Vec<Option<Window>>,
    entries: EntryList<K, V>,
    reentry: ReentryCheck,
}

#[derive(Debug)]
pub enum AccessError {
    KeyNotFound,
}

impl<K, V> WindowHashMap<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }
}

impl<K, V> Default for WindowHashMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over shared entries, in entry-list order.
pub struct Iter<'a, K, V> {
    it: crate::entry_list::Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (Pos, &'a K, &'a V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it
            .next()
            .map(|(at, n)| (Pos::new(at), &n.key, &n.value))
    }
}

/// Iterator over mutable entries, in arena storage order.
pub struct IterMut<'a, K, V> {
    it: slotmap::basic::IterMut<'a, DefaultKey, Node<K, V>>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (Pos, &'a K, &'a mut V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it
            .next()
            .map(|(at, n)| (Pos::new(at), &n.key, &mut n.value))
    }
}

/// Draining iterator over owned entries, in entry-list order.
pub struct IntoIter<K, V> {
    list: EntryList<K, V>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);
    fn next(&mut self) -> Option<Self::Item> {
        self.list.pop_front().map(|n| (n.key, n.value))
    }
}

impl<K, V, S> WindowHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            hasher,
            buckets: vec![None; INITIAL_BUCKETS],
            entries: EntryList::new(),
            reentry: ReentryCheck::new(),
        }
    }

    /// The map's `BuildHasher`.
    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current bucket count. Starts at 16, doubles under load, never
    /// shrinks. After any insert, `2 * len() <= capacity()` holds.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    fn bucket_index(buckets: &[Option<Window>], hash: u64) -> usize {
        (hash % buckets.len() as u64) as usize
    }

    /// Scan one bucket's window for `q`, comparing keys by `Eq` (never
    /// by digest). Inclusive of both boundaries.
    fn scan_window<Q>(&self, w: Window, q: &Q) -> Option<DefaultKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let mut cur = Some(w.head);
        while let Some(at) = cur {
            let node = self.entries.node(at)?;
            if node.key.borrow() == q {
                return Some(at);
            }
            if at == w.tail {
                break;
            }
            cur = node.next;
        }
        None
    }

    fn key_at<Q>(&self, at: DefaultKey, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        self.entries
            .node(at)
            .map(|n| n.key.borrow() == q)
            .unwrap_or(false)
    }

    pub fn find<Q>(&self, q: &Q) -> Option<Pos>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _busy = self.reentry.enter();
        let w = self.buckets[Self::bucket_index(&self.buckets, self.make_hash(q))]?;
        self.scan_window(w, q).map(Pos::new)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find(q).is_some()
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let at = self.find(q)?;
        self.entries.node(at.raw()).map(|n| &n.value)
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let at = self.find(q)?;
        self.entries.node_mut(at.raw()).map(|n| &mut n.value)
    }

    /// Checked access. Read-only and never grows the table; the only
    /// operation that surfaces an error.
    pub fn at<Q>(&self, q: &Q) -> Result<&V, AccessError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get(q).ok_or(AccessError::KeyNotFound)
    }

    /// Insert `(key, value)`. A key that is already present keeps its
    /// stored value; the returned position then names the existing
    /// entry. The growth check runs first, so a returned position from
    /// an earlier call may have gone stale even when this call turns
    /// out to be a duplicate.
    pub fn insert(&mut self, key: K, value: V) -> Pos {
        let _busy = self.reentry.enter();
        Self::grow_if_needed(&mut self.buckets, &mut self.entries);
        let hash = self.make_hash(&key);
        if let Some(w) = self.buckets[Self::bucket_index(&self.buckets, hash)] {
            if let Some(at) = self.scan_window(w, &key) {
                // Already present: the stored value wins.
                return Pos::new(at);
            }
        }
        Pos::new(Self::place(
            &mut self.buckets,
            &mut self.entries,
            key,
            value,
            hash,
        ))
    }

    /// `operator[]`-style access: the stored value for `key`, inserting
    /// `V::default()` first when absent. May grow the table.
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        let at = match self.find(&key) {
            Some(at) => at,
            None => self.insert(key, V::default()),
        };
        self.entries
            .node_mut(at.raw())
            .map(|n| &mut n.value)
            .unwrap()
    }

    /// Remove the entry for `q`, silently doing nothing when absent.
    pub fn erase<Q>(&mut self, q: &Q)
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _busy = self.reentry.enter();
        let idx = Self::bucket_index(&self.buckets, self.make_hash(q));
        let Some(w) = self.buckets[idx] else {
            return;
        };

        if w.head == w.tail {
            if self.key_at(w.head, q) {
                self.entries.remove(w.head);
                self.buckets[idx] = None;
            }
            return;
        }
        if self.key_at(w.head, q) {
            // Boundary fast path: the window shrinks from the front.
            // The removed node's successor is inside the window because
            // the run is contiguous and longer than one entry.
            self.buckets[idx] = self
                .entries
                .remove(w.head)
                .and_then(|n| n.next)
                .map(|head| Window { head, tail: w.tail });
        } else if self.key_at(w.tail, q) {
            self.buckets[idx] = self
                .entries
                .remove(w.tail)
                .and_then(|n| n.prev)
                .map(|tail| Window { head: w.head, tail });
        } else if let Some(at) = self.scan_window(w, q) {
            // Strict interior match: unlinking leaves both boundaries
            // intact. Only reachable for windows of three or more
            // entries, since the two boundary checks above cover every
            // entry of a two-entry window.
            self.entries.remove(at);
        }
    }

    /// Drop every entry and mark every bucket unoccupied. Capacity is
    /// unchanged.
    pub fn clear(&mut self) {
        let _busy = self.reentry.enter();
        self.entries.clear();
        for b in self.buckets.iter_mut() {
            *b = None;
        }
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            it: self.entries.iter(),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            it: self.entries.iter_mut(),
        }
    }

    /// Append a fresh entry to its bucket's window, creating the window
    /// when the bucket is unoccupied. Callers guarantee the key is not
    /// already present. Takes the storage fields directly so mutation
    /// paths can call it while the reentry token pins the guard field.
    fn place(
        buckets: &mut [Option<Window>],
        entries: &mut EntryList<K, V>,
        key: K,
        value: V,
        hash: u64,
    ) -> DefaultKey {
        let idx = Self::bucket_index(buckets, hash);
        match buckets[idx] {
            None => {
                let at = entries.push_back(key, value, hash);
                buckets[idx] = Some(Window { head: at, tail: at });
                at
            }
            Some(w) => {
                // Splicing right after the tail keeps the run contiguous.
                let at = entries.insert_after(w.tail, key, value, hash);
                buckets[idx] = Some(Window {
                    head: w.head,
                    tail: at,
                });
                at
            }
        }
    }

    /// Double the bucket table before an insert that would push the
    /// load factor past 0.5, re-placing every entry under the new
    /// bucket count using its stored digest. Entries are drained and
    /// re-placed through the same arena, so the slot generation of
    /// every previously issued position is retired and a stale `Pos`
    /// can never resolve against the rebuilt map.
    fn grow_if_needed(buckets: &mut Vec<Option<Window>>, entries: &mut EntryList<K, V>) {
        if 2 * (entries.len() + 1) <= buckets.len() {
            return;
        }
        let doubled = buckets.len() * 2;
        buckets.clear();
        buckets.resize(doubled, None);
        let mut in_order = Vec::with_capacity(entries.len());
        while let Some(node) = entries.pop_front() {
            in_order.push(node);
        }
        for node in in_order {
            Self::place(buckets, entries, node.key, node.value, node.hash);
        }
    }

    pub(crate) fn pos_key(&self, at: Pos) -> Option<&K> {
        let _busy = self.reentry.enter();
        self.entries.node(at.raw()).map(|n| &n.key)
    }

    pub(crate) fn pos_value(&self, at: Pos) -> Option<&V> {
        let _busy = self.reentry.enter();
        self.entries.node(at.raw()).map(|n| &n.value)
    }

    pub(crate) fn pos_value_mut(&mut self, at: Pos) -> Option<&mut V> {
        let _busy = self.reentry.enter();
        self.entries.node_mut(at.raw()).map(|n| &mut n.value)
    }
}

impl<'a, K, V, S> IntoIterator for &'a WindowHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    type Item = (Pos, &'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut WindowHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    type Item = (Pos, &'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<K, V, S> IntoIterator for WindowHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;
    fn into_iter(self) -> Self::IntoIter {
        IntoIter { list: self.entries }
    }
}

impl<K, V, S> Extend<(K, V)> for WindowHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            let _ = self.insert(k, v);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for WindowHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::with_hasher(S::default());
        map.extend(iter);
        map
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for WindowHashMap<K, V>
where
    K: Eq + Hash,
{
    fn from(pairs: [(K, V); N]) -> Self {
        Self::from_iter(pairs)
    }
}

impl<K, V, S> Clone for WindowHashMap<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Clone,
    S: BuildHasher + Clone,
{
    /// Re-places every entry in list order, reusing the stored digests
    /// so user `Hash` code never runs. The clone keeps the source's
    /// capacity; its windows are rebuilt from scratch.
    fn clone(&self) -> Self {
        let mut out = Self {
            hasher: self.hasher.clone(),
            buckets: vec![None; self.buckets.len()],
            entries: EntryList::new(),
            reentry: ReentryCheck::new(),
        };
        for (_, node) in self.entries.iter() {
            Self::place(
                &mut out.buckets,
                &mut out.entries,
                node.key.clone(),
                node.value.clone(),
                node.hash,
            );
        }
        out
    }
}
