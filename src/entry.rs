//! Chain nodes, bucket slots and the handles that name stored nodes.

use crate::table::ProbeChainTable;
use slotmap::DefaultKey;

/// One stored value. `next` links to the following insertion of the same key.
#[derive(Debug)]
pub(crate) struct Entry<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) hash: u64,
    pub(crate) next: Option<DefaultKey>,
}

impl<K, V> Entry<K, V> {
    pub(crate) fn new(key: K, value: V, hash: u64) -> Self {
        Entry {
            key,
            value,
            hash,
            next: None,
        }
    }
}

/// A bucket of the backing array.
///
/// A tombstone owns no node: it only keeps the probe sequence running past
/// the slot and marks it as reusable for a new head.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum Slot {
    #[default]
    Empty,
    Occupied(DefaultKey),
    Tombstone,
}

/// Identity of a single stored node, head or chain member.
///
/// Two nodes holding equal keys and values still have distinct handles.
/// A handle stays valid across growth and is invalidated when its node is
/// removed or the table is cleared.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Handle(DefaultKey);

impl Handle {
    pub(crate) fn new(k: DefaultKey) -> Self {
        Handle(k)
    }
    pub(crate) fn raw_handle(&self) -> DefaultKey {
        self.0
    }

    pub fn key<'a, K, V, S>(&self, table: &'a ProbeChainTable<K, V, S>) -> Option<&'a K> {
        table.handle_entry(*self).map(|e| &e.key)
    }

    pub fn value<'a, K, V, S>(&self, table: &'a ProbeChainTable<K, V, S>) -> Option<&'a V> {
        table.handle_entry(*self).map(|e| &e.value)
    }
}
