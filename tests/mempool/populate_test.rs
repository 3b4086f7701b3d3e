/*!
 * Populate Tests
 * Multi-region populate, IOVA, constructors and custom providers/policies
 */

use corepool::mempool::{populate_region, BackingStore, ObjCtor, PopulateJob, StackStore, StoreParams};
use corepool::{
    HeapProvider, Iova, MemoryProvider, MemoryRegion, ObjInit, PolicyRegistry, Pool, PoolConfig,
    PoolError, PoolResult, SocketId, StorePolicy,
};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn empty_pool(config: PoolConfig) -> Pool {
    Pool::create_empty(&config, &PolicyRegistry::new()).unwrap()
}

#[test]
fn test_populate_across_regions() {
    let mut pool = empty_pool(PoolConfig::new("chunks", 20, 64));
    let stride = pool.layout().total_size;
    let provider = HeapProvider::new();

    // Two regions of 8 objects, then one large enough for the rest and more
    let first = provider.reserve(stride * 8, 64, -1).unwrap();
    let second = provider.reserve(stride * 8, 64, -1).unwrap();
    let third = provider.reserve(stride * 10, 64, -1).unwrap();

    assert_eq!(pool.populate(first, None).unwrap(), 8);
    assert_eq!(pool.populate(second, None).unwrap(), 8);
    assert_eq!(pool.populate(third, None).unwrap(), 4);
    assert_eq!(pool.populated_size(), 20);
    assert_eq!(pool.chunk_count(), 3);

    // Full pool takes nothing more
    let extra = provider.reserve(stride * 2, 64, -1).unwrap();
    assert_eq!(pool.populate(extra, None).unwrap(), 0);
    assert_eq!(pool.chunk_count(), 3);

    assert_eq!(pool.obj_iter().count(), 20);
    assert_eq!(pool.count(), 20);
    pool.audit().unwrap();
}

#[test]
fn test_iova_is_base_plus_offset() {
    let mut pool = empty_pool(PoolConfig::new("iova", 4, 64));
    let stride = pool.layout().total_size;
    let header = pool.layout().header_size;

    let region = HeapProvider::new()
        .reserve(stride * 4, 64, 0)
        .unwrap()
        .with_iova(Iova(0x4000_0000));
    let base = region.addr();
    pool.populate(region, None).unwrap();

    for obj in pool.obj_iter() {
        let off = (obj.addr() - base) as u64;
        assert_eq!(pool.obj_iova(obj), Some(Iova(0x4000_0000 + off)));
        assert_eq!((off as usize - header) % stride, 0);
    }
}

#[test]
fn test_heap_iova_unknown() {
    let config = PoolConfig::new("noiova", 4, 64);
    let pool = Pool::create(&config, &PolicyRegistry::new(), &HeapProvider::new(), None).unwrap();
    let obj = pool.get().unwrap();
    assert_eq!(pool.obj_iova(obj), None);
    pool.put(obj).unwrap();
}

#[test]
fn test_ctor_initializes_every_object() {
    let config = PoolConfig::new("ctor", 32, 16).with_ctor_required(true);
    let mut calls = Vec::new();
    let mut ctor = |init: &ObjInit| {
        // SAFETY: the element is elt_size writable bytes
        unsafe { (init.obj.as_ptr() as *mut u64).write(0xC0FFEE00 + init.index as u64) };
        calls.push(init.index);
    };

    let pool = Pool::create(&config, &PolicyRegistry::new(), &HeapProvider::new(), Some(&mut ctor))
        .unwrap();

    assert_eq!(calls, (0..32).collect::<Vec<u32>>());
    for (i, obj) in pool.obj_iter().enumerate() {
        let value = unsafe { (obj.as_ptr() as *const u64).read() };
        assert_eq!(value, 0xC0FFEE00 + i as u64);
    }
}

#[test]
fn test_iova_overflow_rejected() {
    let mut pool = empty_pool(PoolConfig::new("highiova", 8, 64));
    let region = HeapProvider::new()
        .reserve(4096, 64, -1)
        .unwrap()
        .with_iova(Iova(u64::MAX - 100));

    assert!(matches!(pool.populate(region, None), Err(PoolError::InvalidParam(_))));
    assert_eq!(pool.populated_size(), 0);
    assert_eq!(pool.count(), 0);
    assert_eq!(pool.chunk_count(), 0);
}

#[test]
fn test_zero_length_region_rejected() {
    let mut pool = empty_pool(PoolConfig::new("zero", 4, 16));
    let mut byte = 0u8;
    let region = unsafe { MemoryRegion::from_raw(&mut byte, 0, -1) }.unwrap();
    assert!(matches!(pool.populate(region, None), Err(PoolError::InvalidParam(_))));
    assert_eq!(pool.populated_size(), 0);
}

#[test]
fn test_missing_ctor_rejected() {
    let mut pool = empty_pool(PoolConfig::new("needctor", 4, 16).with_ctor_required(true));
    let region = HeapProvider::new().reserve(4096, 64, -1).unwrap();
    assert_eq!(pool.populate(region, None), Err(PoolError::MissingConstructor));
    assert_eq!(pool.count(), 0);
}

/// Hands out regions half the requested size
struct StingyProvider;

impl MemoryProvider for StingyProvider {
    fn reserve(&self, len: usize, align: usize, socket_id: SocketId) -> PoolResult<MemoryRegion> {
        HeapProvider::new().reserve(len / 2, align, socket_id)
    }

    fn name(&self) -> &str {
        "stingy"
    }
}

#[test]
fn test_short_provider_reports_incomplete() {
    let config = PoolConfig::new("short", 16, 64);
    let result = Pool::create(&config, &PolicyRegistry::new(), &StingyProvider, None);
    assert_eq!(
        result.unwrap_err(),
        PoolError::IncompletePopulate {
            expected: 16,
            populated: 8
        }
    );

    // Completing by hand works
    let mut pool = Pool::create_empty(&config, &PolicyRegistry::new()).unwrap();
    assert!(pool.populate_default(&StingyProvider, None).is_err());
    assert_eq!(pool.populated_size(), 8);
    assert!(pool.populate_default(&StingyProvider, None).is_err());
    assert_eq!(pool.populated_size(), 12);
    pool.populate_default(&HeapProvider::new(), None).unwrap();
    assert_eq!(pool.populated_size(), 16);
}

/// Stack store that counts allocations and frees
struct CountingPolicy {
    allocs: Arc<AtomicUsize>,
    frees: Arc<AtomicUsize>,
}

impl StorePolicy for CountingPolicy {
    fn name(&self) -> &str {
        "counting"
    }

    fn alloc(&self, params: &StoreParams<'_>) -> PoolResult<Box<dyn BackingStore>> {
        self.allocs.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StackStore::new(params.capacity)))
    }

    fn free(&self, store: Box<dyn BackingStore>) {
        self.frees.fetch_add(1, Ordering::SeqCst);
        drop(store);
    }
}

#[test]
fn test_custom_policy_lifecycle() {
    let allocs = Arc::new(AtomicUsize::new(0));
    let frees = Arc::new(AtomicUsize::new(0));
    let policies = PolicyRegistry::new();
    policies
        .register(Arc::new(CountingPolicy {
            allocs: Arc::clone(&allocs),
            frees: Arc::clone(&frees),
        }))
        .unwrap();

    let config = PoolConfig::new("custom", 8, 32).with_policy("counting");
    let pool = Pool::create(&config, &policies, &HeapProvider::new(), None).unwrap();
    assert_eq!(pool.policy_name(), "counting");
    assert_eq!(pool.count(), 8);
    assert_eq!(allocs.load(Ordering::SeqCst), 1);

    drop(pool);
    assert_eq!(frees.load(Ordering::SeqCst), 1);

    // A failed populate still frees the store
    let result = Pool::create(&config, &policies, &StingyProvider, None);
    assert!(result.is_err());
    assert_eq!(allocs.load(Ordering::SeqCst), 2);
    assert_eq!(frees.load(Ordering::SeqCst), 2);
}

/// Leaves the first `skip` bytes of every region unused
struct PrefixPolicy {
    skip: usize,
}

impl StorePolicy for PrefixPolicy {
    fn name(&self) -> &str {
        "prefix"
    }

    fn alloc(&self, params: &StoreParams<'_>) -> PoolResult<Box<dyn BackingStore>> {
        Ok(Box::new(StackStore::new(params.capacity)))
    }

    fn populate(
        &self,
        store: &dyn BackingStore,
        job: &PopulateJob<'_>,
        ctor: ObjCtor<'_>,
    ) -> PoolResult<u32> {
        let region = job.region;
        let skip = self.skip.min(region.len());
        // SAFETY: a sub-span of the caller's region, which outlives this call
        let mut inner = unsafe {
            MemoryRegion::from_raw(
                region.as_ptr().add(skip),
                region.len() - skip,
                region.socket_id(),
            )
        }?;
        if let Some(iova) = region.iova() {
            inner = inner.with_iova(iova.add(skip));
        }
        populate_region(store, &PopulateJob { region: &inner, ..*job }, ctor)
    }
}

#[test]
fn test_overriding_policy_layout_tracked() {
    let policies = PolicyRegistry::new();
    policies.register(Arc::new(PrefixPolicy { skip: 8 })).unwrap();

    let config = PoolConfig::new("prefix", 8, 64).with_policy("prefix");
    let mut pool = Pool::create_empty(&config, &policies).unwrap();
    let stride = pool.layout().total_size;
    let header = pool.layout().header_size;

    let region = HeapProvider::new()
        .reserve(stride * 9, 64, -1)
        .unwrap()
        .with_iova(Iova(0x8000_0000));
    let base = region.addr();
    assert_eq!(pool.populate(region, None).unwrap(), 8);

    // The prefix pushes every object one alignment step later
    let mut iterated: Vec<usize> = pool.obj_iter().map(|o| o.addr()).collect();
    assert_eq!(iterated[0], base + 64 + header);

    let mut drained = vec![corepool::ObjPtr::DANGLING; 8];
    pool.get_bulk(&mut drained).unwrap();
    let mut drained_addrs: Vec<usize> = drained.iter().map(|o| o.addr()).collect();
    iterated.sort_unstable();
    drained_addrs.sort_unstable();
    assert_eq!(iterated, drained_addrs);

    for obj in &drained {
        assert!(pool.contains(*obj));
        let off = (obj.addr() - base) as u64;
        assert_eq!(pool.obj_iova(*obj), Some(Iova(0x8000_0000 + off)));
    }
    // Where the default layout would have put the first object
    let unshifted = corepool::ObjPtr::from_raw((base + header) as *mut u8).unwrap();
    assert!(!pool.contains(unshifted));

    pool.put_bulk(&drained).unwrap();
    pool.audit().unwrap();
}
