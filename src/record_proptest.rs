#![cfg(test)]

// Model-based property tests kept inside the crate so the record's
// bookkeeping can be compared to a plain model after every step.

use crate::{BorrowState, ExclusiveView, Owner, OwnershipToken, SharedView};
use proptest::prelude::*;
use std::cell::Cell;
use std::rc::Rc;

#[derive(Debug)]
struct Tracked {
    value: i64,
    drops: Rc<Cell<usize>>,
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.drops.set(self.drops.get() + 1);
    }
}

#[derive(Clone, Debug)]
enum Op {
    Share,
    CloneShare(usize),
    Unshare(usize),
    Exclusive,
    Write(i64),
    RelocateExclusive,
    Unexclusive,
    Read,
    Delegate,
    RelocateToken,
    DropToken,
    RelocateOwner,
}

fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    let op = prop_oneof![
        Just(Op::Share),
        (0usize..8).prop_map(Op::CloneShare),
        (0usize..8).prop_map(Op::Unshare),
        Just(Op::Exclusive),
        any::<i64>().prop_map(Op::Write),
        Just(Op::RelocateExclusive),
        Just(Op::Unexclusive),
        Just(Op::Read),
        Just(Op::Delegate),
        Just(Op::RelocateToken),
        Just(Op::DropToken),
        Just(Op::RelocateOwner),
    ];
    proptest::collection::vec(op, 1..80)
}

// Only legal operations are applied; an illegal one would abort the test
// process. Each op whose precondition does not hold in the model is skipped.
//
// Invariants checked after every step:
// - the live record's `BorrowState` equals the model;
// - reads observe the last written value;
// - the value has not been destroyed while it is still present.
// At the end, once every handle is dropped, the value was destroyed exactly
// once.
proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]
    #[test]
    fn prop_legal_sequences_never_abort(ops in arb_ops()) {
        let drops = Rc::new(Cell::new(0usize));
        let mut expected = 0i64;
        let mut husks: Vec<Owner<Tracked>> = Vec::new();
        let mut owner = Owner::new(Tracked { value: 0, drops: drops.clone() });
        let mut token: Option<OwnershipToken<Tracked>> = None;
        let mut shared: Vec<SharedView<Tracked>> = Vec::new();
        let mut exclusive: Option<ExclusiveView<Tracked>> = None;
        let mut model = BorrowState { present: true, ..BorrowState::default() };

        for op in ops {
            match op {
                Op::Share => {
                    if !model.exclusive && model.present {
                        let v = match token.as_ref() {
                            Some(t) => t.borrow(),
                            None => owner.borrow(),
                        };
                        shared.push(v);
                        model.shared += 1;
                    }
                }
                Op::CloneShare(i) => {
                    if !shared.is_empty() {
                        let v = shared[i % shared.len()].clone();
                        shared.push(v);
                        model.shared += 1;
                    }
                }
                Op::Unshare(i) => {
                    if !shared.is_empty() {
                        let idx = i % shared.len();
                        prop_assert_eq!(shared[idx].get().value, expected);
                        drop(shared.swap_remove(idx));
                        model.shared -= 1;
                    }
                }
                Op::Exclusive => {
                    if model.is_unborrowed() && model.present {
                        let e = match token.as_mut() {
                            Some(t) => t.borrow_mut(),
                            None => owner.borrow_mut(),
                        };
                        exclusive = Some(e);
                        model.exclusive = true;
                    }
                }
                Op::Write(v) => {
                    if let Some(e) = exclusive.as_mut() {
                        e.get_mut().value = v;
                        expected = v;
                    }
                }
                Op::RelocateExclusive => {
                    if let Some(mut e) = exclusive.take() {
                        let moved = e.relocate();
                        prop_assert!(!e.is_valid());
                        drop(e);
                        prop_assert!(owner.state().exclusive);
                        exclusive = Some(moved);
                    }
                }
                Op::Unexclusive => {
                    if exclusive.take().is_some() {
                        model.exclusive = false;
                    }
                }
                Op::Read => {
                    if model.is_unborrowed() && model.present {
                        let got = match token.as_ref() {
                            Some(t) => t.get().value,
                            None => owner.get().value,
                        };
                        prop_assert_eq!(got, expected);
                    }
                }
                Op::Delegate => {
                    if model.is_unborrowed() && model.present && !model.delegated {
                        token = Some(owner.delegate());
                        model.delegated = true;
                    }
                }
                Op::RelocateToken => {
                    if let Some(mut t) = token.take() {
                        let moved = t.relocate();
                        drop(t);
                        token = Some(moved);
                    }
                }
                Op::DropToken => {
                    if model.is_unborrowed() && token.is_some() {
                        token = None;
                        model.delegated = false;
                        model.present = false;
                    }
                }
                Op::RelocateOwner => {
                    if model.is_unborrowed() && !model.delegated {
                        let fresh = owner.relocate();
                        prop_assert!(!owner.state().present);
                        husks.push(std::mem::replace(&mut owner, fresh));
                    }
                }
            }

            let observed = match token.as_ref() {
                Some(t) => t.state(),
                None => owner.state(),
            };
            prop_assert_eq!(observed, model);
            prop_assert_eq!(drops.get(), usize::from(!model.present));
        }

        drop(exclusive);
        drop(shared);
        drop(token);
        drop(owner);
        drop(husks);
        prop_assert_eq!(drops.get(), 1);
    }
}
