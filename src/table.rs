//! ProbeChainTable: linear probing for the first occurrence of a key,
//! chaining for every repeated occurrence.

use crate::config::TableConfig;
use crate::entry::{Entry, Handle, Slot};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use hashbrown::HashSet;
use log::{debug, trace};
use slotmap::{DefaultKey, SlotMap};
use std::collections::hash_map::RandomState;

/// Fixed-size bucket array where `put` never overwrites.
///
/// The first `put` of a key claims a bucket by linear probing. Later `put`s
/// of an equal key are appended to the chain hanging off that bucket's head,
/// so unrelated keys never see their probe sequences change. `remove` pops
/// the most recent value of a key.
pub struct ProbeChainTable<K, V, S = RandomState> {
    hasher: S,
    config: TableConfig,
    buckets: Vec<Slot>,
    nodes: SlotMap<DefaultKey, Entry<K, V>>, // every stored node, heads and chain members
    len: usize,
}

/// Outcome of a circular scan from a key's home bucket.
enum Probe {
    /// Bucket index and node of the live head holding the key.
    Found(usize, DefaultKey),
    /// First empty or tombstoned bucket on the scan.
    Vacant(usize),
    /// Every bucket is a live head for some other key.
    Exhausted,
}

impl<K, V> ProbeChainTable<K, V>
where
    K: Eq + Hash,
{
    /// Empty table with 11 buckets, a 0.71 load factor and `RandomState`.
    pub fn new() -> Self {
        Self::with_config(TableConfig::default())
    }

    /// Empty table sized and bounded by `config`.
    pub fn with_config(config: TableConfig) -> Self {
        Self::with_config_and_hasher(config, Default::default())
    }
}

impl<K, V> Default for ProbeChainTable<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over every stored node in bucket-index order, then chain order.
pub struct Iter<'a, K, V> {
    buckets: core::slice::Iter<'a, Slot>,
    nodes: &'a SlotMap<DefaultKey, Entry<K, V>>,
    cur: Option<DefaultKey>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (Handle, &'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let nodes = self.nodes;
        loop {
            if let Some(k) = self.cur {
                let e = nodes.get(k)?;
                self.cur = e.next;
                self.remaining -= 1;
                return Some((Handle::new(k), &e.key, &e.value));
            }
            if let Slot::Occupied(k) = self.buckets.next()? {
                self.cur = Some(*k);
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// Iterator over every stored value, in the same order as [`Iter`].
pub struct Values<'a, K, V> {
    it: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, _, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

/// Iterator over the key of every stored value, in the same order as [`Iter`].
/// A key appears once per value stored under it.
pub struct Keys<'a, K, V> {
    it: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

/// Iterator over the values of one key, oldest first.
pub struct Chain<'a, K, V> {
    nodes: &'a SlotMap<DefaultKey, Entry<K, V>>,
    cur: Option<DefaultKey>,
}

impl<'a, K, V> Iterator for Chain<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        let e = self.nodes.get(self.cur?)?;
        self.cur = e.next;
        Some(&e.value)
    }
}

impl<K, V, S> ProbeChainTable<K, V, S> {
    /// Number of stored values, counting every chain member.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when no values are stored.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of buckets in the backing array.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Every stored `(handle, key, value)`, bucket by bucket, oldest first within a chain.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            buckets: self.buckets.iter(),
            nodes: &self.nodes,
            cur: None,
            remaining: self.len,
        }
    }

    /// All stored values; yields exactly `len()` items.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { it: self.iter() }
    }

    /// Keys of all stored values; yields exactly `len()` items.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { it: self.iter() }
    }

    /// Every stored node as a distinct member, even when key and value repeat.
    pub fn entry_set(&self) -> HashSet<Handle> {
        self.iter().map(|(h, _, _)| h).collect()
    }

    /// Drops every entry and returns to the configured initial capacity.
    pub fn clear(&mut self) {
        trace!(
            "clearing table: {} values in {} buckets",
            self.len,
            self.buckets.len()
        );
        self.buckets = vec![Slot::Empty; self.config.initial_capacity()];
        self.nodes.clear();
        self.len = 0;
    }

    /// Per-bucket rendering of the table, for inspection only.
    pub fn dump(&self) -> Dump<'_, K, V, S> {
        Dump { table: self }
    }

    pub(crate) fn handle_entry(&self, h: Handle) -> Option<&Entry<K, V>> {
        self.nodes.get(h.raw_handle())
    }

    #[cfg(test)]
    pub(crate) fn buckets_for_test(&self) -> &[Slot] {
        &self.buckets
    }

    fn chain_from(&self, head: Option<DefaultKey>) -> Chain<'_, K, V> {
        Chain {
            nodes: &self.nodes,
            cur: head,
        }
    }
}

impl<K, V, S> ProbeChainTable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Empty table with the default config, hashing keys with `hasher`.
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_config_and_hasher(TableConfig::default(), hasher)
    }

    pub fn with_config_and_hasher(config: TableConfig, hasher: S) -> Self {
        Self {
            hasher,
            config,
            buckets: vec![Slot::Empty; config.initial_capacity()],
            nodes: SlotMap::with_key(),
            len: 0,
        }
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    /// Adds `value` under `key`. Never overwrites: a key already present gets
    /// the value appended to its chain. Returns the handle of the new node.
    pub fn put(&mut self, key: K, value: V) -> Handle {
        self.reserve_one();
        let hash = self.make_hash(&key);
        let node = self.nodes.insert(Entry::new(key, value, hash));
        self.link(node);
        self.len += 1;
        Handle::new(node)
    }

    /// Removes and returns the most recently added value for `q`.
    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        let Probe::Found(bucket, head) = self.probe(hash, q) else {
            return None;
        };
        let value = self.pop_last(bucket, head)?;
        self.len -= 1;
        Some(value)
    }

    /// True when `q` has at least one stored value.
    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find(q).is_some()
    }

    /// Handle of the bucket head holding `q`, i.e. its oldest value.
    pub fn find<Q>(&self, q: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find_head(q).map(Handle::new)
    }

    /// Values stored for `q` in insertion order. Empty when `q` is absent.
    pub fn get_all<Q>(&self, q: &Q) -> Chain<'_, K, V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.chain_from(self.find_head(q))
    }

    /// Number of values stored for `q`, or `None` when `q` is absent.
    pub fn key_values<Q>(&self, q: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let head = self.find_head(q)?;
        Some(self.chain_from(Some(head)).count())
    }

    /// Distinct keys; chain members never add a key their head lacks.
    pub fn key_set(&self) -> HashSet<&K> {
        self.buckets
            .iter()
            .filter_map(|slot| match slot {
                Slot::Occupied(k) => self.nodes.get(*k).map(|e| &e.key),
                _ => None,
            })
            .collect()
    }

    fn find_head<Q>(&self, q: &Q) -> Option<DefaultKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        match self.probe(self.make_hash(q), q) {
            Probe::Found(_, head) => Some(head),
            _ => None,
        }
    }

    /// Scans at most `capacity` buckets from the home index of `hash`.
    /// An empty bucket ends the scan; tombstones are skipped.
    fn probe<Q>(&self, hash: u64, q: &Q) -> Probe
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let cap = self.buckets.len();
        let home = (hash % cap as u64) as usize;
        let mut vacant = None;
        for step in 0..cap {
            let i = (home + step) % cap;
            match self.buckets[i] {
                Slot::Empty => return Probe::Vacant(vacant.unwrap_or(i)),
                Slot::Tombstone => {
                    vacant.get_or_insert(i);
                }
                Slot::Occupied(k) => {
                    let e = &self.nodes[k];
                    if e.hash == hash && e.key.borrow() == q {
                        return Probe::Found(i, k);
                    }
                }
            }
        }
        match vacant {
            Some(i) => Probe::Vacant(i),
            None => Probe::Exhausted,
        }
    }

    /// Places an already-stored node: as a new bucket head when its key has
    /// no live head, otherwise at the tail of that head's chain.
    fn link(&mut self, node: DefaultKey) {
        let e = &self.nodes[node];
        match self.probe(e.hash, &e.key) {
            Probe::Found(_, head) => {
                let mut tail = head;
                while let Some(n) = self.nodes[tail].next {
                    tail = n;
                }
                self.nodes[tail].next = Some(node);
            }
            Probe::Vacant(i) => self.buckets[i] = Slot::Occupied(node),
            Probe::Exhausted => panic!(
                "probe exhausted all {} buckets without a free slot",
                self.buckets.len()
            ),
        }
    }

    /// Detaches the chain tail of `head`, tombstoning the bucket when the
    /// head was the only node.
    fn pop_last(&mut self, bucket: usize, head: DefaultKey) -> Option<V> {
        let Some(mut last) = self.nodes.get(head)?.next else {
            self.buckets[bucket] = Slot::Tombstone;
            return self.nodes.remove(head).map(|e| e.value);
        };
        let mut prev = head;
        while let Some(n) = self.nodes.get(last)?.next {
            prev = last;
            last = n;
        }
        self.nodes[prev].next = None;
        self.nodes.remove(last).map(|e| e.value)
    }

    /// Grows before an insertion that would push the load factor past the
    /// configured maximum.
    fn reserve_one(&mut self) {
        let old = self.buckets.len();
        let mut capacity = old;
        while self.config.exceeds(self.len + 1, capacity) {
            capacity = capacity
                .checked_mul(2)
                .and_then(|c| c.checked_add(1))
                .expect("capacity overflow");
        }
        if capacity != old {
            debug!("growing table from {old} to {capacity} buckets ({} values)", self.len);
            self.rehash(capacity);
        }
    }

    /// Swaps in a fresh bucket array and relinks every node through `link`,
    /// chain by chain, so each key's values keep their order. Stored hashes
    /// are reused; `K: Hash` is not called.
    fn rehash(&mut self, capacity: usize) {
        let old = core::mem::replace(&mut self.buckets, vec![Slot::Empty; capacity]);
        for slot in old {
            let Slot::Occupied(mut cur) = slot else {
                continue;
            };
            loop {
                let next = self.nodes[cur].next.take();
                self.link(cur);
                match next {
                    Some(n) => cur = n,
                    None => break,
                }
            }
        }
    }
}

impl<K, V, S> Extend<(K, V)> for ProbeChainTable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.put(k, v);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for ProbeChainTable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = Self::with_config_and_hasher(TableConfig::default(), S::default());
        table.extend(iter);
        table
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for ProbeChainTable<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.iter().map(|(_, k, v)| (k, v)))
            .finish()
    }
}

/// Display adapter returned by [`ProbeChainTable::dump`]. One line per
/// bucket: `i-->(null,null)` for empty or tombstoned buckets, otherwise
/// `i-->(k,v)` for each node of the chain.
pub struct Dump<'a, K, V, S> {
    table: &'a ProbeChainTable<K, V, S>,
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Display for Dump<'_, K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, slot) in self.table.buckets.iter().enumerate() {
            let Slot::Occupied(head) = slot else {
                writeln!(f, "{i}-->(null,null)")?;
                continue;
            };
            let mut cur = Some(*head);
            let mut sep = "";
            while let Some(e) = cur.and_then(|k| self.table.nodes.get(k)) {
                write!(f, "{sep}{i}-->({:?},{:?})", e.key, e.value)?;
                sep = " ";
                cur = e.next;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
