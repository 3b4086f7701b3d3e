/*!
 * Object Pool
 *
 * Fixed-size objects carved from one or more memory regions, held in a
 * pluggable backing store and optionally fronted by per-core caches.
 *
 * # Lifecycle
 *
 * ```text
 * create_empty -> populate (one or more regions) -> get/put -> drop
 * ```
 *
 * Objects cycle between the backing store, per-core caches and callers for
 * the pool's lifetime. Dropping the pool frees the store through its policy
 * and then the regions; no per-object destructor runs.
 */

use super::cache::LocalCache;
use super::config::{CacheConfig, PoolConfig};
use super::handle::LcoreHandle;
use super::header::ObjHeader;
use super::policy::PolicyRegistry;
use super::populate::{check_region, PlacementLog, PopulateJob};
use super::stats::CoreStats;
use super::traits::{BackingStore, StoreParams, StorePolicy};
use super::types::{CacheCount, CoreStatsSnapshot, ObjCtor, PoolFlags, PoolInfo, PoolStats};
use crate::core::errors::{PoolError, PoolResult};
use crate::core::limits::{MAX_CORES, TRAILER_COOKIE};
use crate::core::types::{CoreId, Iova, Name, ObjPtr, SocketId};
use crate::memory::{calc_obj_size, MemoryProvider, MemoryRegion, ObjLayout};
use crossbeam_utils::CachePadded;
use std::fmt;
use std::mem::ManuallyDrop;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);

/// A populated region and the objects placed in it
struct Chunk {
    region: MemoryRegion,
    /// Object pointers in address order
    objs: Vec<ObjPtr>,
}

impl Chunk {
    /// True if `obj` is an object placed in this chunk
    #[inline]
    fn holds(&self, obj: ObjPtr) -> bool {
        self.region.contains(obj.addr()) && self.objs.binary_search(&obj).is_ok()
    }
}

/// Fixed-size object pool
pub struct Pool {
    id: u64,
    name: Name,
    socket_id: SocketId,
    flags: PoolFlags,
    layout: ObjLayout,
    size: u32,
    cache: CacheConfig,
    requires_ctor: bool,
    policy: Arc<dyn StorePolicy>,
    store: ManuallyDrop<Box<dyn BackingStore>>,
    caches: Box<[CachePadded<LocalCache>]>,
    unbound_stats: CoreStats,
    populated_size: u32,
    chunks: Vec<Chunk>,
}

impl Pool {
    /// Create a pool with an allocated backing store and no objects yet
    pub fn create_empty(config: &PoolConfig, policies: &PolicyRegistry) -> PoolResult<Self> {
        if let Err(e) = config.validate() {
            warn!(pool = %config.name, error = %e, "Pool configuration rejected");
            return Err(e);
        }
        let policy = policies.get(&config.policy)?;
        let layout = calc_obj_size(config.elt_size, config.flags);

        let store = policy.alloc(&StoreParams {
            name: &config.name,
            capacity: config.size,
            socket_id: config.socket_id,
        })?;

        let caches = (0..MAX_CORES)
            .map(|_| CachePadded::new(LocalCache::new()))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        let id = NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed);
        info!(
            pool = %config.name,
            id,
            size = config.size,
            obj_size = layout.total_size,
            cache_size = config.cache.size,
            policy = %config.policy,
            socket_id = config.socket_id,
            "Pool created"
        );

        Ok(Self {
            id,
            name: Name::from(config.name.as_str()),
            socket_id: config.socket_id,
            flags: config.flags,
            layout,
            size: config.size,
            cache: config.cache,
            requires_ctor: config.requires_ctor,
            policy,
            store: ManuallyDrop::new(store),
            caches,
            unbound_stats: CoreStats::default(),
            populated_size: 0,
            chunks: Vec::new(),
        })
    }

    /// Create a pool and fully populate it from `provider`
    pub fn create(
        config: &PoolConfig,
        policies: &PolicyRegistry,
        provider: &dyn MemoryProvider,
        ctor: ObjCtor<'_>,
    ) -> PoolResult<Self> {
        let mut pool = Self::create_empty(config, policies)?;
        pool.populate_default(provider, ctor)?;
        Ok(pool)
    }

    /// Carve objects out of `region` until it or the pool is full
    ///
    /// Returns the number of objects placed. The pool keeps the region alive
    /// if any object was placed in it. May be called repeatedly with disjoint
    /// regions.
    pub fn populate(&mut self, region: MemoryRegion, ctor: ObjCtor<'_>) -> PoolResult<u32> {
        if self.requires_ctor && ctor.is_none() {
            return Err(PoolError::MissingConstructor);
        }
        check_region(&region)?;
        let remaining = self.size - self.populated_size;
        if remaining == 0 {
            debug!(pool = %self.name, "Pool already fully populated");
            return Ok(0);
        }

        let job = PopulateJob {
            pool_id: self.id,
            layout: &self.layout,
            region: &region,
            max_objs: remaining,
            first_index: self.populated_size,
        };
        let log = PlacementLog::new(&**self.store, &job);
        let result = self.policy.populate(&log, &job, ctor);
        // Objects already in the store must keep their memory even on failure
        let objs = log.into_placed();
        let placed = objs.len() as u32;

        if placed > 0 {
            debug!(
                pool = %self.name,
                placed,
                region_len = region.len(),
                iova = ?region.iova(),
                "Region populated"
            );
            self.chunks.push(Chunk { region, objs });
            self.populated_size += placed;
        }

        result
    }

    /// Reserve memory for all remaining objects from `provider` and populate it
    pub fn populate_default(
        &mut self,
        provider: &dyn MemoryProvider,
        ctor: ObjCtor<'_>,
    ) -> PoolResult<u32> {
        if self.requires_ctor && ctor.is_none() {
            return Err(PoolError::MissingConstructor);
        }
        let remaining = self.size - self.populated_size;
        if remaining == 0 {
            return Ok(0);
        }

        let len = self.policy.calc_mem_size(remaining, &self.layout);
        let region = provider.reserve(len, self.layout.align(), self.socket_id)?;
        let placed = self.populate(region, ctor)?;

        if self.populated_size < self.size {
            warn!(
                pool = %self.name,
                provider = provider.name(),
                populated = self.populated_size,
                expected = self.size,
                "Incomplete populate"
            );
            return Err(PoolError::IncompletePopulate {
                expected: self.size,
                populated: self.populated_size,
            });
        }
        Ok(placed)
    }

    #[inline(always)]
    pub(crate) fn store(&self) -> &dyn BackingStore {
        &**self.store
    }

    #[inline(always)]
    pub(crate) fn cache_config(&self) -> &CacheConfig {
        &self.cache
    }

    /// Claim the per-core cache slot of `core_id`
    pub fn lcore(&self, core_id: CoreId) -> PoolResult<LcoreHandle<'_>> {
        let cache = self
            .caches
            .get(core_id as usize)
            .ok_or(PoolError::CoreOutOfRange(core_id))?;
        if !cache.try_claim() {
            return Err(PoolError::CoreBusy(core_id));
        }
        if self.cache.is_enabled() {
            // SAFETY: the claim was just taken and no handle exists yet
            unsafe { cache.state_mut() }.ensure_storage(self.cache.storage_len());
        }
        Ok(LcoreHandle::new(self, core_id, cache))
    }

    /// Acquire objects directly from the backing store, all or none
    #[inline]
    pub fn get_bulk(&self, out: &mut [ObjPtr]) -> PoolResult<()> {
        if out.is_empty() {
            return Ok(());
        }
        let result = self.store.dequeue(out);
        self.unbound_stats.record_get(out.len(), result.is_ok());
        result
    }

    /// Release objects directly to the backing store
    #[inline]
    pub fn put_bulk(&self, objs: &[ObjPtr]) -> PoolResult<()> {
        if objs.is_empty() {
            return Ok(());
        }
        let result = self.store.enqueue(objs);
        if result.is_ok() {
            self.unbound_stats.record_put(objs.len());
        }
        result
    }

    #[inline]
    pub fn get(&self) -> PoolResult<ObjPtr> {
        let mut out = [ObjPtr::DANGLING];
        self.get_bulk(&mut out)?;
        Ok(out[0])
    }

    #[inline]
    pub fn put(&self, obj: ObjPtr) -> PoolResult<()> {
        self.put_bulk(std::slice::from_ref(&obj))
    }

    fn cache_total(&self) -> u32 {
        self.caches.iter().map(|c| c.len()).sum()
    }

    /// Objects available: backing store plus all per-core caches
    ///
    /// Clamped to the populated size, since concurrent reads can double count.
    pub fn count(&self) -> u32 {
        (self.store.count() + self.cache_total()).min(self.populated_size)
    }

    /// Objects held by callers
    pub fn in_use_count(&self) -> u32 {
        self.populated_size - self.count()
    }

    pub fn is_full(&self) -> bool {
        self.count() == self.populated_size
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// True if `obj` is an object of this pool
    pub fn contains(&self, obj: ObjPtr) -> bool {
        self.chunks.iter().any(|c| c.holds(obj))
            // SAFETY: obj was placed inside a live chunk
            && unsafe { ObjHeader::read(obj) }.pool_id == self.id
    }

    /// Device-visible address of `obj`, or `None` if unknown or not ours
    pub fn obj_iova(&self, obj: ObjPtr) -> Option<Iova> {
        if !self.contains(obj) {
            return None;
        }
        // SAFETY: contains() verified obj lies in a live chunk
        unsafe { ObjHeader::read(obj) }.iova()
    }

    /// Every populated object, wherever it currently is
    pub fn obj_iter(&self) -> impl Iterator<Item = ObjPtr> + '_ {
        self.chunks.iter().flat_map(|c| c.objs.iter().copied())
    }

    /// Verify object cookies and cache bounds
    pub fn audit(&self) -> PoolResult<()> {
        for obj in self.obj_iter() {
            // SAFETY: obj_iter only yields objects inside live chunks
            let header = unsafe { ObjHeader::read(obj) };
            let trailer = unsafe { ObjHeader::read_trailer(obj, self.layout.elt_size) };
            let problem = if !header.cookie_ok() {
                Some("bad header cookie")
            } else if header.pool_id != self.id {
                Some("foreign pool id")
            } else if trailer != TRAILER_COOKIE {
                Some("bad trailer cookie")
            } else {
                None
            };
            if let Some(problem) = problem {
                error!(pool = %self.name, obj = ?obj, problem, "Audit failed");
                return Err(PoolError::AuditFailed(format!("{:?}: {}", obj, problem)));
            }
        }

        let bound = self.cache.storage_len() as u32;
        for (core_id, cache) in self.caches.iter().enumerate() {
            if cache.len() > bound {
                error!(pool = %self.name, core_id, len = cache.len(), bound, "Audit failed");
                return Err(PoolError::AuditFailed(format!(
                    "core {} cache holds {} objects, bound {}",
                    core_id,
                    cache.len(),
                    bound
                )));
            }
        }
        Ok(())
    }

    pub fn stats(&self) -> PoolStats {
        let mut stats = PoolStats {
            unbound: self.unbound_stats.snapshot(),
            ..PoolStats::default()
        };
        stats.total.merge(&stats.unbound);
        for (core_id, cache) in self.caches.iter().enumerate() {
            let snap: CoreStatsSnapshot = cache.stats.snapshot();
            if !snap.is_zero() {
                stats.total.merge(&snap);
                stats.per_core.push((core_id as u32, snap));
            }
        }
        stats
    }

    /// Snapshot of sizes, cache occupancy, chunks and statistics
    pub fn info(&self) -> PoolInfo {
        let cache_counts: Vec<CacheCount> = self
            .caches
            .iter()
            .enumerate()
            .filter(|(_, c)| c.len() > 0)
            .map(|(core_id, c)| CacheCount {
                core_id: core_id as u32,
                len: c.len(),
            })
            .collect();
        let avail_count = self.count();

        PoolInfo {
            id: self.id,
            name: self.name.to_string(),
            socket_id: self.socket_id,
            flags: self.flags,
            policy: self.policy.name().to_string(),
            size: self.size,
            populated_size: self.populated_size,
            layout: self.layout,
            cache_size: self.cache.size,
            cache_flush_threshold: self.cache.flush_threshold(),
            common_pool_count: self.store.count(),
            total_cache_count: cache_counts.iter().map(|c| c.len).sum(),
            cache_counts,
            avail_count,
            in_use_count: self.populated_size - avail_count,
            chunks: self.chunks.iter().map(|c| c.region.info()).collect(),
            stats: self.stats(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Target object count
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn populated_size(&self) -> u32 {
        self.populated_size
    }

    pub fn socket_id(&self) -> SocketId {
        self.socket_id
    }

    pub fn flags(&self) -> PoolFlags {
        self.flags
    }

    pub fn layout(&self) -> &ObjLayout {
        &self.layout
    }

    /// Usable bytes per object
    pub fn elt_size(&self) -> usize {
        self.layout.elt_size
    }

    pub fn cache_size(&self) -> u32 {
        self.cache.size
    }

    pub fn policy_name(&self) -> &str {
        self.policy.name()
    }

    /// Number of regions objects were carved from
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        // SAFETY: the store is taken exactly once, here
        let store = unsafe { ManuallyDrop::take(&mut self.store) };
        self.policy.free(store);
        debug!(pool = %self.name, id = self.id, "Pool freed");
    }
}

impl fmt::Debug for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("size", &self.size)
            .field("populated_size", &self.populated_size)
            .field("policy", &self.policy.name())
            .field("count", &self.count())
            .finish()
    }
}
