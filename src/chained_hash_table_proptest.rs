#![cfg(test)]

// Property tests for ChainedHashTable kept inside the crate so they can
// build tables with custom hashers and tiny capacities.

use crate::chained_hash_table::ChainedHashTable;
use crate::config::TableConfig;
use crate::error::InsertError;
use proptest::prelude::*;
use std::collections::hash_map::RandomState;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::hash::{BuildHasher, Hasher};

// Pool-indexed operations so shrinking walks toward earlier keys and shorter
// op lists.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    Remove(usize),
    Find(usize),
    Contains(String),
    Iterate,
}

fn arb_scenario() -> impl Strategy<Value = (usize, Vec<String>, Vec<OpI>)> {
    (2usize..=8, proptest::collection::vec("[a-z]{0,5}", 1..=24)).prop_flat_map(
        |(capacity, pool)| {
            let idxs: Vec<usize> = (0..pool.len()).collect();
            let idx = proptest::sample::select(idxs);
            let contains_pool = proptest::sample::select(pool.clone());
            let op = prop_oneof![
                3 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
                1 => idx.clone().prop_map(OpI::Remove),
                1 => idx.clone().prop_map(OpI::Find),
                1 => prop_oneof![
                    contains_pool.prop_map(|s: String| s),
                    "[a-z]{0,5}".prop_map(|s| s)
                ]
                .prop_map(OpI::Contains),
                1 => Just(OpI::Iterate),
            ];
            proptest::collection::vec(op, 1..80)
                .prop_map(move |ops| (capacity, pool.clone(), ops))
        },
    )
}

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

// Runs one scenario against a std HashMap model. Invariants checked after
// every op:
// - duplicate inserts fail iff the key is live, and change nothing;
// - find/contains agree with the model, removed keys are gone;
// - iteration yields each live entry exactly once;
// - len parity, capacity never shrinks, and the load bound holds after a
//   successful insert.
fn run_scenario<S>(
    sut: &mut ChainedHashTable<String, i32, S>,
    pool: &[String],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError>
where
    S: BuildHasher + Clone,
{
    let mut model: HashMap<String, i32> = HashMap::new();
    let mut last_capacity = sut.capacity();

    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = pool[i].clone();
                let already = model.contains_key(&k);
                let capacity_before = sut.capacity();
                match sut.insert(k.clone(), v) {
                    Ok(()) => {
                        prop_assert!(!already, "insert must fail on duplicate");
                        model.insert(k, v);
                        prop_assert!(
                            sut.len() as f64 / sut.capacity() as f64 <= sut.load_factor(),
                            "load bound violated after insert"
                        );
                        prop_assert!(
                            sut.capacity() == capacity_before
                                || sut.capacity() == capacity_before * 2,
                            "at most one doubling per insert"
                        );
                    }
                    Err(InsertError::DuplicateKey) => {
                        prop_assert!(already, "duplicate error only when key exists");
                        prop_assert_eq!(sut.capacity(), capacity_before);
                    }
                    Err(e) => prop_assert!(false, "unexpected error: {e}"),
                }
            }
            OpI::Remove(i) => {
                let k = &pool[i];
                let removed = sut.remove(k.as_str());
                prop_assert_eq!(removed, model.remove(k).is_some());
                prop_assert!(sut.find(k.as_str()).is_none());
            }
            OpI::Find(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.find(k.as_str()), model.get(k));
            }
            OpI::Contains(s) => {
                prop_assert_eq!(sut.contains_key(s.as_str()), model.contains_key(&s));
            }
            OpI::Iterate => {
                let mut visits: BTreeMap<String, usize> = BTreeMap::new();
                sut.for_each(|k, v| {
                    *visits.entry(k.clone()).or_default() += 1;
                    assert_eq!(model.get(k), Some(v));
                });
                prop_assert!(visits.values().all(|&n| n == 1), "entry visited twice");
                let s_keys: BTreeSet<_> = visits.into_keys().collect();
                let m_keys: BTreeSet<_> = model.keys().cloned().collect();
                prop_assert_eq!(s_keys, m_keys);
            }
        }

        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert!(sut.capacity() >= last_capacity, "capacity shrank");
        last_capacity = sut.capacity();
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((capacity, pool, ops) in arb_scenario()) {
        let config = TableConfig::default().with_initial_capacity(capacity);
        let mut sut: ChainedHashTable<String, i32, RandomState> =
            ChainedHashTable::with_config_and_hasher(config, RandomState::new()).unwrap();
        run_scenario(&mut sut, &pool, ops)?;
    }
}

// Same invariants with every key in one bucket: a single long chain that
// stresses unlinking and duplicate detection across growth.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((capacity, pool, ops) in arb_scenario()) {
        let config = TableConfig::default().with_initial_capacity(capacity);
        let mut sut: ChainedHashTable<String, i32, ConstBuildHasher> =
            ChainedHashTable::with_config_and_hasher(config, ConstBuildHasher).unwrap();
        run_scenario(&mut sut, &pool, ops)?;
    }
}
