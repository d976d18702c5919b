//! probe-chain-table: a single-threaded hash table that never overwrites.
//!
//! Internal Design:
//!
//! Summary
//! - The first `put` of a key claims a bucket by linear probing from the
//!   key's home index (`hash % capacity`).
//! - Every later `put` of an equal key appends to a chain rooted at that
//!   bucket's head, in call order. Chains never occupy extra buckets, so
//!   unrelated keys keep their probe sequences.
//! - `remove` pops the newest value of a key. Only a head with no chain is
//!   tombstoned; a tombstone is skipped by lookups and reused by inserts.
//!
//! Storage
//! - `buckets: Vec<Slot>` is the backing array. A slot is empty, a
//!   tombstone, or names the head node of a chain.
//! - Nodes live in a `slotmap::SlotMap` arena; `next` links are arena keys.
//!   `Handle` wraps an arena key and goes stale when its node is removed.
//!
//! Growth
//! - Before an insert, if `(len + 1) / capacity` would exceed the maximum
//!   load factor (0.71 by default), capacity becomes `2 * capacity + 1`.
//! - Rehash swaps in a fresh bucket array and relinks every node through
//!   the same placement routine `put` uses, chain by chain, so each key's
//!   values keep their order. Each node stores its hash, so `K: Hash` is
//!   never invoked during rehash.
//!
//! Constraints
//! - Single-threaded; wrap the table in a lock for shared mutation.
//! - Probe scans are bounded by the capacity, so a completely full table
//!   (load factor 1.0) still terminates. Running out of free buckets on
//!   placement is a bug and panics.

pub mod config;
mod entry;
mod table;
mod table_proptest;

// Public surface
pub use config::{ConfigError, TableConfig};
pub use entry::Handle;
pub use table::{Chain, Dump, Iter, Keys, ProbeChainTable, Values};
