#![cfg(test)]

// Property tests for ChainedHashMap kept inside the crate so they can
// observe internal counters (mod_count, arena size).

use crate::error::Error;
use crate::hashing::HashFn;
use crate::map::ChainedHashMap;
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Put(usize, i32),
    Erase(usize),
    Get(usize),
    Bump(usize, i32),
    Clear,
    // Walk `n` entries with a cursor and erase the one it lands on.
    CursorErase(usize),
    Iterate,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=8).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Put(i, v)),
            2 => idx.clone().prop_map(OpI::Erase),
            2 => idx.clone().prop_map(OpI::Get),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Bump(i, d)),
            1 => Just(OpI::Clear),
            2 => (0usize..8).prop_map(OpI::CursorErase),
            1 => Just(OpI::Iterate),
        ];
        proptest::collection::vec(op, 1..60).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn collide(_: &String) -> i64 {
    -3
}

// State-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - `put` returns the previous value (or 0) and only new keys bump mod_count.
// - `erase` of an absent key fails with KeyNotFound and changes nothing.
// - cursor erase removes exactly the entry under the cursor.
// - `len`, key set and values match the model after every op.
// - bins stay a power of two with `len <= bins * threshold`.
// - the arena holds exactly `len + bins` nodes (no leaked chains).
fn run_scenario(
    hash: HashFn<String>,
    threshold: f64,
    pool: Vec<String>,
    ops: Vec<OpI>,
) -> Result<(), TestCaseError> {
    let mut sut: ChainedHashMap<String, i32> = ChainedHashMap::new(threshold, Some(hash)).unwrap();
    let mut model: HashMap<String, i32> = HashMap::new();

    for op in ops {
        let mods = sut.mod_count();
        match op {
            OpI::Put(i, v) => {
                let k = pool[i].clone();
                let existed = model.contains_key(&k);
                let prev = sut.put(k.clone(), v);
                prop_assert_eq!(prev, model.insert(k, v).unwrap_or_default());
                prop_assert_eq!(sut.mod_count(), if existed { mods } else { mods + 1 });
            }
            OpI::Erase(i) => {
                let k = &pool[i];
                match (sut.erase(k), model.remove(k)) {
                    (Ok(v), Some(mv)) => {
                        prop_assert_eq!(v, mv);
                        prop_assert_eq!(sut.mod_count(), mods + 1);
                    }
                    (Err(Error::KeyNotFound { .. }), None) => {
                        prop_assert_eq!(sut.mod_count(), mods);
                    }
                    (got, want) => {
                        prop_assert!(false, "erase mismatch: {:?} vs {:?}", got, want);
                    }
                }
            }
            OpI::Get(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.get(k), model.get(k));
                prop_assert_eq!(sut.contains_key(k), model.contains_key(k));
            }
            OpI::Bump(i, d) => {
                let k = pool[i].clone();
                let v = sut.get_or_insert_default(k.clone());
                *v = v.wrapping_add(d);
                let mv = model.entry(k).or_default();
                *mv = mv.wrapping_add(d);
            }
            OpI::Clear => {
                sut.clear();
                model.clear();
                prop_assert_eq!(sut.mod_count(), mods + 1);
            }
            OpI::CursorErase(n) => {
                let mut c = sut.begin();
                for _ in 0..n {
                    if c.is_end() {
                        break;
                    }
                    c.advance(&sut).unwrap();
                }
                if c.is_end() {
                    prop_assert!(c.erase(&mut sut).is_err());
                } else {
                    let (k, v) = c.erase(&mut sut).unwrap();
                    prop_assert_eq!(model.remove(&k), Some(v));
                    prop_assert!(!sut.contains_key(&k));
                }
            }
            OpI::Iterate => {
                let s_keys: BTreeSet<_> = sut.keys().cloned().collect();
                let m_keys: BTreeSet<_> = model.keys().cloned().collect();
                prop_assert_eq!(s_keys, m_keys);
                let mut c = sut.begin();
                let mut walked = 0;
                while !c.is_end() {
                    let (k, v) = c.get(&sut).unwrap();
                    prop_assert_eq!(model.get(k), Some(v));
                    c.advance(&sut).unwrap();
                    walked += 1;
                }
                prop_assert_eq!(walked, model.len());
            }
        }

        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert!(sut.bins().is_power_of_two());
        prop_assert!(sut.len() as f64 <= sut.bins() as f64 * threshold);
        prop_assert_eq!(sut.buckets().arena_len(), sut.len() + sut.bins());
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario(), threshold in 1.0f64..4.0) {
        run_scenario(HashFn::std(), threshold, pool, ops)?;
    }
}

// Same invariants with every key in one chain, which exercises the
// successor-copy erase and the tail case of cursor erase on every step.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_scenario(crate::hash_fn!(collide), 1.0, pool, ops)?;
    }
}
