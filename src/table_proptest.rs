#![cfg(test)]

// Property tests for ProbeChainTable kept inside the crate so they can
// check the bucket array directly.

use crate::config::TableConfig;
use crate::entry::Slot;
use crate::table::ProbeChainTable;
use core::hash::{BuildHasher, Hash};
use proptest::prelude::*;
use std::collections::hash_map::RandomState;
use std::collections::{BTreeSet, HashMap};
use std::hash::Hasher;

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Put(usize, i32),
    Remove(usize),
    Contains(String),
    KeyValues(usize),
    Values,
    Clear,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=8).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            6 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Put(i, v)),
            3 => idx.clone().prop_map(OpI::Remove),
            1 => prop_oneof![
                contains_pool.prop_map(|s: String| s),
                "[a-z]{0,5}".prop_map(|s| s)
            ]
            .prop_map(OpI::Contains),
            1 => idx.clone().prop_map(OpI::KeyValues),
            1 => Just(OpI::Values),
            1 => Just(OpI::Clear),
        ];
        proptest::collection::vec(op, 1..120).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Drives the table and a `HashMap<String, Vec<i32>>` model in lockstep.
// Invariants checked after every op:
// - `len()` equals the model's total value count and `values().count()`.
// - `len() / capacity()` never exceeds the configured maximum load factor.
// - `key_set()` equals the model's keys with at least one value.
// - No key owns more than one live head bucket.
fn run_scenario<S>(
    mut sut: ProbeChainTable<String, i32, S>,
    pool: &[String],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError>
where
    S: BuildHasher,
{
    let mut model: HashMap<String, Vec<i32>> = HashMap::new();
    let initial_capacity = sut.capacity();
    for op in ops {
        match op {
            OpI::Put(i, v) => {
                let k = pool[i].clone();
                sut.put(k.clone(), v);
                model.entry(k).or_default().push(v);
            }
            OpI::Remove(i) => {
                let k = &pool[i];
                let expected = model.get_mut(k).and_then(|vs| vs.pop());
                prop_assert_eq!(sut.remove(k.as_str()), expected);
                if model.get(k).is_some_and(|vs| vs.is_empty()) {
                    model.remove(k);
                }
            }
            OpI::Contains(s) => {
                prop_assert_eq!(sut.contains_key(s.as_str()), model.contains_key(&s));
            }
            OpI::KeyValues(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.key_values(k.as_str()), model.get(k).map(Vec::len));
                let chain: Vec<i32> = sut.get_all(k.as_str()).copied().collect();
                let expected: Vec<i32> = model.get(k).cloned().unwrap_or_default();
                prop_assert_eq!(chain, expected);
            }
            OpI::Values => {
                let mut got: Vec<i32> = sut.values().copied().collect();
                let mut want: Vec<i32> = model.values().flatten().copied().collect();
                got.sort_unstable();
                want.sort_unstable();
                prop_assert_eq!(got, want);
            }
            OpI::Clear => {
                sut.clear();
                model.clear();
                prop_assert_eq!(sut.capacity(), initial_capacity);
            }
        }

        let total: usize = model.values().map(Vec::len).sum();
        prop_assert_eq!(sut.len(), total);
        prop_assert_eq!(sut.values().count(), total);
        prop_assert!(
            sut.len() as f64 / sut.capacity() as f64 <= sut.config().max_load_factor()
        );

        let s_keys: BTreeSet<&String> = sut.key_set().into_iter().collect();
        let m_keys: BTreeSet<&String> = model.keys().collect();
        prop_assert_eq!(s_keys, m_keys);

        let heads = sut
            .buckets_for_test()
            .iter()
            .filter(|s| matches!(s, Slot::Occupied(_)))
            .count();
        prop_assert_eq!(heads, model.len(), "one live head per key");
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        let sut: ProbeChainTable<String, i32, RandomState> = ProbeChainTable::new();
        run_scenario(sut, &pool, ops)?;
    }

    #[test]
    fn prop_state_machine_small_table((pool, ops) in arb_scenario()) {
        let config = TableConfig::new(1, 1.0).unwrap();
        let sut: ProbeChainTable<String, i32> = ProbeChainTable::with_config(config);
        run_scenario(sut, &pool, ops)?;
    }
}

// Collision variant using a constant hasher to stress equality resolution.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// Same invariants under worst-case collisions: every key shares home bucket
// zero, so probe runs span tombstones and chains of unrelated keys.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        let sut = ProbeChainTable::with_hasher(ConstBuildHasher);
        run_scenario(sut, &pool, ops)?;
    }
}

// Property: a rehash is invisible through the read surface. Fills a table
// just up to the growth threshold, snapshots it, then compares the snapshot
// with the grown table minus the value that triggered growth.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_rehash_preserves_content(
        puts in proptest::collection::vec((0u8..6, any::<i16>()), 7..=7),
        trigger in (0u8..6, any::<i16>()),
    ) {
        let mut t: ProbeChainTable<u8, i16> = ProbeChainTable::new();
        for (k, v) in &puts {
            t.put(*k, *v);
        }
        prop_assert_eq!(t.capacity(), 11);
        let before = snapshot(&t);

        let h = t.put(trigger.0, trigger.1);
        prop_assert_eq!(t.capacity(), 23);
        let after: BTreeSet<(u8, Vec<i16>)> = snapshot(&t);

        let mut expected: HashMap<u8, Vec<i16>> = before.into_iter().collect();
        expected.entry(trigger.0).or_default().push(trigger.1);
        let expected: BTreeSet<(u8, Vec<i16>)> = expected.into_iter().collect();
        prop_assert_eq!(after, expected);
        prop_assert_eq!(t.entry_set().len(), 8);
        prop_assert!(t.entry_set().contains(&h));
    }
}

fn snapshot<K, V, S>(t: &ProbeChainTable<K, V, S>) -> BTreeSet<(K, Vec<V>)>
where
    K: Eq + Hash + Ord + Clone,
    V: Ord + Clone,
    S: BuildHasher,
{
    t.key_set()
        .into_iter()
        .map(|k| (k.clone(), t.get_all(k).cloned().collect()))
        .collect()
}
