#![cfg(test)]

// Property tests for DynamicSequence kept inside the crate so they can
// assert capacity-level invariants alongside the public surface.

use crate::sequence::DynamicSequence;
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    Push(i32),
    ExtendSlice(Vec<i32>),
    Pop,
    PopN(usize),
    Insert(usize, i32),
    Remove(usize),
    SwapRemove(usize),
    Truncate(usize),
    Reserve(usize),
    ResizeCapacity(usize),
    Compact,
    Clear,
    RemoveValue(i32),
}

fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    let op = prop_oneof![
        any::<i32>().prop_map(Op::Push),
        proptest::collection::vec(any::<i32>(), 0..8).prop_map(Op::ExtendSlice),
        Just(Op::Pop),
        (0usize..4).prop_map(Op::PopN),
        (0usize..40, any::<i32>()).prop_map(|(i, v)| Op::Insert(i, v)),
        (0usize..40).prop_map(Op::Remove),
        (0usize..40).prop_map(Op::SwapRemove),
        (0usize..40).prop_map(Op::Truncate),
        (0usize..64).prop_map(Op::Reserve),
        (0usize..64).prop_map(Op::ResizeCapacity),
        Just(Op::Compact),
        Just(Op::Clear),
        (-4i32..4).prop_map(Op::RemoveValue),
    ];
    proptest::collection::vec(op, 1..80)
}

// Property: state-machine equivalence against Vec<i32>, which shares
// the exact semantics of every operation here (including swap_remove).
// Invariants checked after every op:
// - contents equal the model's contents, in order;
// - len() <= capacity();
// - capacity never shrinks except through resize_capacity/compact.
proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]
    #[test]
    fn prop_matches_vec_model(
        (granularity, growth) in (1usize..8, 0usize..120),
        ops in arb_ops(),
    ) {
        let mut sut: DynamicSequence<i32> = DynamicSequence::with_policy(0, granularity, growth);
        let mut model: Vec<i32> = Vec::new();

        for op in ops {
            match op {
                Op::Push(v) => {
                    sut.push(v);
                    model.push(v);
                }
                Op::ExtendSlice(vs) => {
                    sut.extend_from_slice(&vs);
                    model.extend_from_slice(&vs);
                }
                Op::Pop => {
                    prop_assert_eq!(sut.pop(), model.pop());
                }
                Op::PopN(n) => {
                    let n = n.min(model.len());
                    sut.pop_n(n);
                    model.truncate(model.len() - n);
                }
                Op::Insert(i, v) => {
                    let i = i.min(model.len());
                    sut.insert(i, v);
                    model.insert(i, v);
                }
                Op::Remove(i) => {
                    if i < model.len() {
                        prop_assert_eq!(sut.remove(i), model.remove(i));
                    }
                }
                Op::SwapRemove(i) => {
                    if i < model.len() {
                        prop_assert_eq!(sut.swap_remove(i), model.swap_remove(i));
                    }
                }
                Op::Truncate(n) => {
                    sut.truncate(n);
                    model.truncate(n);
                }
                Op::Reserve(n) => {
                    sut.reserve(n);
                    if n > 0 {
                        prop_assert!(sut.capacity() >= n);
                    }
                }
                Op::ResizeCapacity(n) => {
                    sut.resize_capacity(n);
                    model.truncate(n);
                    prop_assert_eq!(sut.capacity(), n);
                }
                Op::Compact => {
                    sut.compact();
                    prop_assert_eq!(sut.capacity(), sut.len());
                }
                Op::Clear => {
                    sut.clear();
                    model.clear();
                }
                Op::RemoveValue(v) => {
                    let expected = model.iter().position(|x| *x == v);
                    let removed = sut.remove_value(&v);
                    prop_assert_eq!(removed, expected.is_some());
                    if let Some(i) = expected {
                        model.remove(i);
                    }
                }
            }

            prop_assert!(sut.len() <= sut.capacity());
            prop_assert_eq!(sut.as_slice(), model.as_slice());
        }
    }

    // Property: the clone is a deep copy — interleaved mutations of the
    // original and the clone never bleed into each other.
    #[test]
    fn prop_clone_independence(initial in proptest::collection::vec(any::<i32>(), 0..32)) {
        let mut original: DynamicSequence<i32> = DynamicSequence::new();
        original.extend_from_slice(&initial);
        let mut copy = original.clone();

        original.push(1);
        copy.push(2);
        if !copy.is_empty() {
            copy.swap_remove(0);
        }

        let mut expected_original = initial.clone();
        expected_original.push(1);
        let mut expected_copy = initial;
        expected_copy.push(2);
        expected_copy.swap_remove(0);

        prop_assert_eq!(original.as_slice(), expected_original.as_slice());
        prop_assert_eq!(copy.as_slice(), expected_copy.as_slice());
    }
}
