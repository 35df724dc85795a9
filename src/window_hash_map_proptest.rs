#![cfg(test)]

// Property tests for WindowHashMap kept inside the crate so they can
// assert internal invariants (capacity, load bound) without exposing
// test-only hooks.

use crate::window_hash_map::{AccessError, Pos, WindowHashMap};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::collections::{BTreeSet, HashMap};
use std::hash::Hasher;

// Pool-indexed operations to improve shrinking: indices shrink to
// earlier keys, pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    GetOrDefault(usize),
    Erase(usize),
    Find(usize),
    At(usize),
    Mutate(usize, i32),
    Clear,
    Iterate,
}

fn key_from(pool: &[String], i: usize) -> String {
    pool[i].clone()
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=8).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            idx.clone().prop_map(OpI::GetOrDefault),
            idx.clone().prop_map(OpI::Erase),
            idx.clone().prop_map(OpI::Find),
            idx.clone().prop_map(OpI::At),
            (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            Just(OpI::Clear),
            Just(OpI::Iterate),
        ];
        proptest::collection::vec(op, 1..60).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn run_scenario<S>(sut: &mut WindowHashMap<String, i32, S>, pool: Vec<String>, ops: Vec<OpI>) -> Result<(), TestCaseError>
where
    S: std::hash::BuildHasher,
{
    let mut model: HashMap<String, i32> = HashMap::new();
    let mut live: HashMap<String, Pos> = HashMap::new();
    let mut stale: Vec<Pos> = Vec::new();

    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = key_from(&pool, i);
                let already = model.contains_key(&k);
                let grew_past = 2 * (sut.len() + 1) > sut.capacity();
                let p = sut.insert(k.clone(), v);
                if grew_past {
                    // A rebuild ran first: every previously issued
                    // position is stale now.
                    stale.extend(live.drain().map(|(_, p)| p));
                    for (mk, _) in model.iter() {
                        let np = sut.find(mk.as_str()).expect("entry survives rebuild");
                        live.insert(mk.clone(), np);
                    }
                }
                if already {
                    // Duplicate: value preserved, position names the
                    // existing entry.
                    prop_assert_eq!(p.value(sut), model.get(&k));
                    prop_assert_eq!(Some(&p), live.get(&k));
                } else {
                    model.insert(k.clone(), v);
                    live.insert(k, p);
                }
            }
            OpI::GetOrDefault(i) => {
                let k = key_from(&pool, i);
                let expected = model.get(&k).copied().unwrap_or_default();
                let grew_past = !model.contains_key(&k) && 2 * (sut.len() + 1) > sut.capacity();
                let got = *sut.get_or_insert_default(k.clone());
                prop_assert_eq!(got, expected);
                model.entry(k.clone()).or_default();
                if grew_past {
                    stale.extend(live.drain().map(|(_, p)| p));
                    for (mk, _) in model.iter() {
                        let np = sut.find(mk.as_str()).expect("entry survives rebuild");
                        live.insert(mk.clone(), np);
                    }
                } else if let Some(p) = sut.find(k.as_str()) {
                    live.insert(k, p);
                }
            }
            OpI::Erase(i) => {
                let k = key_from(&pool, i);
                sut.erase(k.as_str());
                model.remove(&k);
                if let Some(p) = live.remove(&k) {
                    stale.push(p);
                }
                prop_assert!(sut.find(k.as_str()).is_none());
            }
            OpI::Find(i) => {
                let k = key_from(&pool, i);
                let p = sut.find(k.as_str());
                prop_assert_eq!(p.is_some(), model.contains_key(&k));
                if let Some(p) = p {
                    prop_assert_eq!(p.value(sut), model.get(&k));
                    prop_assert_eq!(Some(&p), live.get(&k));
                }
            }
            OpI::At(i) => {
                let k = key_from(&pool, i);
                match (sut.at(k.as_str()), model.get(&k)) {
                    (Ok(v), Some(mv)) => prop_assert_eq!(v, mv),
                    (Err(AccessError::KeyNotFound), None) => {}
                    (got, want) => {
                        return Err(TestCaseError::fail(format!(
                            "at({k:?}) = {got:?}, model = {want:?}"
                        )))
                    }
                }
            }
            OpI::Mutate(i, d) => {
                let k = key_from(&pool, i);
                if let Some(v) = sut.get_mut(k.as_str()) {
                    *v = v.saturating_add(d);
                    let mv = model.get_mut(&k).expect("model tracks live keys");
                    *mv = mv.saturating_add(d);
                } else {
                    prop_assert!(!model.contains_key(&k));
                }
            }
            OpI::Clear => {
                let cap = sut.capacity();
                sut.clear();
                prop_assert!(sut.is_empty());
                prop_assert_eq!(sut.capacity(), cap);
                model.clear();
                stale.extend(live.drain().map(|(_, p)| p));
            }
            OpI::Iterate => {
                let s_keys: BTreeSet<_> = sut.iter().map(|(_, k, _)| k.clone()).collect();
                let m_keys: BTreeSet<_> = model.keys().cloned().collect();
                prop_assert_eq!(s_keys, m_keys);
            }
        }

        // Post-conditions after each op
        // 1) Stale positions must not resolve
        for &p in &stale {
            prop_assert!(p.value(sut).is_none());
        }
        // 2) Size parity with the model
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        // 3) Load bound: the table grows before it would be broken
        prop_assert!(2 * sut.len() <= sut.capacity());
    }
    Ok(())
}

// Property: state-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - Duplicate inserts preserve the stored value and name the existing entry.
// - find/at/get_mut parity with the model; erase-then-find is absent.
// - Rebuilds keep every entry retrievable and stale positions dead.
// - clear empties without touching capacity; len/is_empty parity after
//   each op; the 0.5 load bound holds after every op.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        let mut sut: WindowHashMap<String, i32> = WindowHashMap::new();
        run_scenario(&mut sut, pool, ops)?;
    }
}

// Collision variant using a constant hasher so every key lands in one
// bucket: one maximal window carries the entire map, stressing the
// boundary and interior erase paths and window adjacency on insert.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl std::hash::BuildHasher for ConstBuildHasher {
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

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        let mut sut: WindowHashMap<String, i32, ConstBuildHasher> =
            WindowHashMap::with_hasher(ConstBuildHasher);
        run_scenario(&mut sut, pool, ops)?;
    }
}
