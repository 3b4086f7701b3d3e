/*!
 * Pool Concurrency Tests
 * No double ownership and conservation across cores
 */

use corepool::{HeapProvider, ObjInit, ObjPtr, PolicyRegistry, Pool, PoolConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

const WORKERS: u32 = 6;
const ROUNDS: usize = 20_000;

fn owner_word(obj: ObjPtr) -> &'static AtomicU64 {
    // Objects are cache-line aligned, at least 8 bytes, and outlive the test threads
    unsafe { &*(obj.as_ptr() as *const AtomicU64) }
}

fn hammer(pool: &Pool) {
    thread::scope(|scope| {
        for core_id in 0..WORKERS {
            scope.spawn(move || {
                let mut rng = StdRng::seed_from_u64(core_id as u64);
                let mut handle = pool.lcore(core_id).unwrap();
                let me = core_id as u64 + 1;
                let mut held: Vec<ObjPtr> = Vec::new();

                for _ in 0..ROUNDS {
                    if held.len() < 48 && rng.gen_bool(0.55) {
                        let mut buf = vec![ObjPtr::DANGLING; rng.gen_range(1..=24)];
                        if handle.get_bulk(&mut buf).is_ok() {
                            for obj in &buf {
                                let prev = owner_word(*obj).swap(me, Ordering::AcqRel);
                                assert_eq!(prev, 0, "object {:?} already owned by {}", obj, prev);
                            }
                            held.extend(buf);
                        }
                    } else if !held.is_empty() {
                        let n = rng.gen_range(1..=held.len());
                        let back: Vec<ObjPtr> = held.drain(..n).collect();
                        for obj in &back {
                            owner_word(*obj).store(0, Ordering::Release);
                        }
                        handle.put_bulk(&back).unwrap();
                    }
                }

                for obj in &held {
                    owner_word(*obj).store(0, Ordering::Release);
                }
                handle.put_bulk(&held).unwrap();
            });
        }
    });
}

fn create(name: &str, cache: u32, policy: &str) -> Pool {
    let config = PoolConfig::new(name, 512, 64)
        .with_cache(cache)
        .with_policy(policy);
    let mut zero = |init: &ObjInit| owner_word(init.obj).store(0, Ordering::Relaxed);
    Pool::create(&config, &PolicyRegistry::new(), &HeapProvider::new(), Some(&mut zero)).unwrap()
}

#[test]
fn test_no_double_ownership_with_caches() {
    let pool = create("hammer_cached", 32, "ring_mp_mc");
    hammer(&pool);

    assert_eq!(pool.count(), 512);
    assert_eq!(pool.in_use_count(), 0);
    pool.audit().unwrap();

    let stats = pool.stats();
    assert_eq!(stats.per_core.len(), WORKERS as usize);
    assert_eq!(stats.total.get_success_objs, stats.total.put_objs);
}

#[test]
fn test_no_double_ownership_without_caches() {
    let pool = create("hammer_plain", 0, "ring_mp_mc");
    hammer(&pool);
    assert_eq!(pool.count(), 512);
    pool.audit().unwrap();
}

#[test]
fn test_no_double_ownership_over_stack() {
    let pool = create("hammer_stack", 16, "stack");
    hammer(&pool);
    assert_eq!(pool.count(), 512);
    pool.audit().unwrap();
}
