/*!
 * Cache Transparency Tests
 * A single core sees the same outcomes with and without a per-core cache
 */

use corepool::{HeapProvider, ObjPtr, PolicyRegistry, Pool, PoolConfig};
use proptest::prelude::*;

const POOL_SIZE: u32 = 64;

#[derive(Debug, Clone)]
enum Op {
    Get(usize),
    Put(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![(1usize..40).prop_map(Op::Get), (1usize..40).prop_map(Op::Put)]
}

fn pool(name: &str, cache: u32, policy: &str) -> Pool {
    let config = PoolConfig::new(name, POOL_SIZE, 32)
        .with_cache(cache)
        .with_policy(policy);
    Pool::create(&config, &PolicyRegistry::new(), &HeapProvider::new(), None).unwrap()
}

/// Apply `ops` through core 0 and record (success, count) after each step
fn run(pool: &Pool, ops: &[Op]) -> Vec<(bool, u32)> {
    let mut handle = pool.lcore(0).unwrap();
    let mut held: Vec<ObjPtr> = Vec::new();
    let mut trace = Vec::with_capacity(ops.len());

    for op in ops {
        let ok = match op {
            Op::Get(n) => {
                let mut buf = vec![ObjPtr::DANGLING; *n];
                let ok = handle.get_bulk(&mut buf).is_ok();
                if ok {
                    held.extend(buf);
                }
                ok
            }
            Op::Put(n) => {
                let n = (*n).min(held.len());
                let back: Vec<ObjPtr> = held.drain(held.len() - n..).collect();
                handle.put_bulk(&back).is_ok()
            }
        };
        assert_eq!(held.len() as u32 + pool.count(), POOL_SIZE);
        trace.push((ok, pool.count()));
    }
    trace
}

// Outcomes and counts must match; object identity may not, since the cache
// hands back objects LIFO while the ring store is FIFO.
proptest! {
    #[test]
    fn cache_is_transparent(
        ops in proptest::collection::vec(op_strategy(), 0..200),
        cache in prop_oneof![Just(1u32), Just(8), Just(16), Just(32)],
    ) {
        let uncached = pool("uncached", 0, "ring_mp_mc");
        let cached = pool("cached", cache, "ring_mp_mc");
        prop_assert_eq!(run(&uncached, &ops), run(&cached, &ops));
    }

    #[test]
    fn cache_is_transparent_over_stack(
        ops in proptest::collection::vec(op_strategy(), 0..200),
    ) {
        let uncached = pool("uncached_stack", 0, "stack");
        let cached = pool("cached_stack", 16, "stack");
        prop_assert_eq!(run(&uncached, &ops), run(&cached, &ops));
    }
}

#[test]
fn test_cache_absorbs_balanced_traffic() {
    let pool = pool("absorb", 32, "ring_mp_mc");
    let mut handle = pool.lcore(7).unwrap();
    let mut buf = [ObjPtr::DANGLING; 8];

    handle.get_bulk(&mut buf).unwrap();
    handle.put_bulk(&buf).unwrap();
    let store_after_warmup = pool.info().common_pool_count;

    for _ in 0..100 {
        handle.get_bulk(&mut buf).unwrap();
        handle.put_bulk(&buf).unwrap();
    }
    assert_eq!(pool.info().common_pool_count, store_after_warmup);
}
