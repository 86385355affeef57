#![cfg(test)]

// Property tests for HashMap kept inside the crate so they can check
// the power-of-two capacity invariant alongside the public surface.

use crate::hash_map::{HashMap, InsertError};
use proptest::prelude::*;
use std::collections::HashMap as StdMap;

#[derive(Clone, Debug)]
enum Op {
    Insert(usize, i32),
    Remove(usize),
    Get(usize),
    Contains(usize),
    RemoveAt(usize),
    Iterate,
    ResizeUp,
    Compact,
    Clear,
}

fn arb_scenario() -> impl Strategy<Value = (usize, Vec<Op>)> {
    (1usize..=12).prop_flat_map(|pool| {
        let idx = 0..pool;
        let op = prop_oneof![
            (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Insert(i, v)),
            idx.clone().prop_map(Op::Remove),
            idx.clone().prop_map(Op::Get),
            idx.clone().prop_map(Op::Contains),
            idx.clone().prop_map(Op::RemoveAt),
            Just(Op::Iterate),
            Just(Op::ResizeUp),
            Just(Op::Compact),
            Just(Op::Clear),
        ];
        proptest::collection::vec(op, 1..100).prop_map(move |ops| (pool, ops))
    })
}

fn key(i: usize) -> String {
    format!("k{i}")
}

// Property: state-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - duplicate inserts are rejected and change nothing;
// - get/contains/remove parity with the model, including after
//   load-triggered growth, explicit resize, compact and clear;
// - iteration yields every live pair exactly once;
// - capacity is always a power of two strictly greater than len.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        let mut sut: HashMap<String, i32> = HashMap::new();
        let mut model: StdMap<String, i32> = StdMap::new();

        for op in ops {
            match op {
                Op::Insert(i, v) => {
                    let k = key(i);
                    let res = sut.insert(k.clone(), v);
                    if model.contains_key(&k) {
                        prop_assert_eq!(res, Err(InsertError::DuplicateKey));
                    } else {
                        prop_assert_eq!(res, Ok(()));
                        model.insert(k, v);
                    }
                }
                Op::Remove(i) => {
                    let k = key(i);
                    prop_assert_eq!(sut.remove(k.as_str()), model.remove(&k));
                }
                Op::Get(i) => {
                    let k = key(i);
                    prop_assert_eq!(sut.get(k.as_str()), model.get(&k));
                }
                Op::Contains(i) => {
                    let k = key(i);
                    prop_assert_eq!(sut.contains_key(k.as_str()), model.contains_key(&k));
                }
                Op::RemoveAt(i) => {
                    let k = key(i);
                    match sut.find(k.as_str()) {
                        Some(c) => {
                            prop_assert!(sut.is_valid(c));
                            let (rk, rv) = sut.remove_at(c);
                            prop_assert_eq!(&rk, &k);
                            prop_assert_eq!(Some(rv), model.remove(&k));
                            prop_assert!(!sut.is_valid(c));
                        }
                        None => prop_assert!(!model.contains_key(&k)),
                    }
                }
                Op::Iterate => {
                    let mut seen: StdMap<String, i32> = StdMap::new();
                    for (k, v) in sut.iter() {
                        // exactly once per live pair
                        prop_assert!(seen.insert(k.clone(), *v).is_none());
                    }
                    prop_assert_eq!(&seen, &model);
                }
                Op::ResizeUp => {
                    let target = sut.capacity() * 2;
                    sut.resize(target);
                    prop_assert_eq!(sut.capacity(), target);
                }
                Op::Compact => {
                    sut.compact();
                }
                Op::Clear => {
                    sut.clear();
                    model.clear();
                }
            }

            prop_assert_eq!(sut.len(), model.len());
            prop_assert!(sut.capacity().is_power_of_two());
            prop_assert!(sut.capacity() > sut.len());
        }

        // Every surviving key is still findable at the end.
        for (k, v) in &model {
            prop_assert_eq!(sut.get(k.as_str()), Some(v));
        }
    }
}
