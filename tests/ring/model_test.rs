/*!
 * Ring Model Tests
 * Random single-threaded operation sequences checked against a VecDeque
 */

use corepool::{Ring, RingError};
use proptest::prelude::*;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
enum Op {
    EnqueueBulk(usize),
    EnqueueBurst(usize),
    DequeueBulk(usize),
    DequeueBurst(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..12).prop_map(Op::EnqueueBulk),
        (0usize..12).prop_map(Op::EnqueueBurst),
        (0usize..12).prop_map(Op::DequeueBulk),
        (0usize..12).prop_map(Op::DequeueBurst),
    ]
}

proptest! {
    #[test]
    fn ring_matches_model(ops in proptest::collection::vec(op_strategy(), 0..300)) {
        const CAP: usize = 8;
        let ring = Ring::<u64>::new("model", CAP as u32, -1).unwrap();
        let mut model = VecDeque::new();
        let mut next = 0u64;
        let mut out = [0u64; 12];

        for op in ops {
            match op {
                Op::EnqueueBulk(n) => {
                    let batch: Vec<u64> = (next..next + n as u64).collect();
                    match ring.enqueue_bulk(&batch) {
                        Ok(done) => {
                            prop_assert_eq!(done, n);
                            model.extend(batch);
                            next += n as u64;
                        }
                        Err(RingError::NoSpace { requested, available }) => {
                            prop_assert_eq!(requested as usize, n);
                            prop_assert_eq!(available as usize, CAP - model.len());
                            prop_assert!(n > CAP - model.len());
                        }
                        Err(other) => prop_assert!(false, "unexpected {:?}", other),
                    }
                }
                Op::EnqueueBurst(n) => {
                    let batch: Vec<u64> = (next..next + n as u64).collect();
                    let done = ring.enqueue_burst(&batch);
                    prop_assert_eq!(done, n.min(CAP - model.len()));
                    model.extend(&batch[..done]);
                    next += done as u64;
                }
                Op::DequeueBulk(n) => match ring.dequeue_bulk(&mut out[..n]) {
                    Ok(done) => {
                        prop_assert_eq!(done, n);
                        for value in &out[..n] {
                            prop_assert_eq!(Some(*value), model.pop_front());
                        }
                    }
                    Err(err) => {
                        prop_assert!(err.is_capacity());
                        prop_assert!(n > model.len());
                    }
                },
                Op::DequeueBurst(n) => {
                    let done = ring.dequeue_burst(&mut out[..n]);
                    prop_assert_eq!(done, n.min(model.len()));
                    for value in &out[..done] {
                        prop_assert_eq!(Some(*value), model.pop_front());
                    }
                }
            }
            prop_assert_eq!(ring.count() as usize, model.len());
            prop_assert_eq!(ring.free_count() as usize, CAP - model.len());
        }
    }
}
