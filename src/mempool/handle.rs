/*!
 * Core Handle
 * Exclusive access to one per-core cache of a pool
 */

use super::cache::LocalCache;
use super::pool::Pool;
use crate::core::errors::PoolResult;
use crate::core::types::{CoreId, ObjPtr};
use std::fmt;

/// A claimed per-core cache slot
///
/// Obtained from [`Pool::lcore`]. While the handle lives no other handle for
/// the same core id can exist; dropping it releases the slot but keeps any
/// cached objects there for the next claimant.
pub struct LcoreHandle<'p> {
    pool: &'p Pool,
    core_id: CoreId,
    cache: &'p LocalCache,
}

impl<'p> LcoreHandle<'p> {
    pub(crate) fn new(pool: &'p Pool, core_id: CoreId, cache: &'p LocalCache) -> Self {
        Self {
            pool,
            core_id,
            cache,
        }
    }

    pub fn core_id(&self) -> CoreId {
        self.core_id
    }

    pub fn pool(&self) -> &'p Pool {
        self.pool
    }

    /// Objects currently held in this core's cache
    pub fn cached(&self) -> u32 {
        self.cache.len()
    }

    /// Acquire `out.len()` objects, all or none
    #[inline]
    pub fn get_bulk(&mut self, out: &mut [ObjPtr]) -> PoolResult<()> {
        if out.is_empty() {
            return Ok(());
        }
        let cfg = self.pool.cache_config();
        let result = if cfg.is_enabled() {
            // SAFETY: this handle holds the claim and &mut self prevents aliasing
            let state = unsafe { self.cache.state_mut() };
            let result = state.get(self.pool.store(), cfg.size, out);
            self.cache.publish_len(state.len());
            result
        } else {
            self.pool.store().dequeue(out)
        };
        self.cache.stats.record_get(out.len(), result.is_ok());
        result
    }

    /// Release objects back to the pool
    #[inline]
    pub fn put_bulk(&mut self, objs: &[ObjPtr]) -> PoolResult<()> {
        if objs.is_empty() {
            return Ok(());
        }
        let cfg = self.pool.cache_config();
        let result = if cfg.is_enabled() {
            // SAFETY: this handle holds the claim and &mut self prevents aliasing
            let state = unsafe { self.cache.state_mut() };
            let result = state.put(self.pool.store(), cfg.flush_threshold(), objs);
            self.cache.publish_len(state.len());
            result
        } else {
            self.pool.store().enqueue(objs)
        };
        if result.is_ok() {
            self.cache.stats.record_put(objs.len());
        }
        result
    }

    #[inline]
    pub fn get(&mut self) -> PoolResult<ObjPtr> {
        let mut out = [ObjPtr::DANGLING];
        self.get_bulk(&mut out)?;
        Ok(out[0])
    }

    #[inline]
    pub fn put(&mut self, obj: ObjPtr) -> PoolResult<()> {
        self.put_bulk(std::slice::from_ref(&obj))
    }

    /// Return every cached object to the backing store
    pub fn flush(&mut self) -> PoolResult<()> {
        // SAFETY: this handle holds the claim and &mut self prevents aliasing
        let state = unsafe { self.cache.state_mut() };
        let result = state.flush(self.pool.store());
        self.cache.publish_len(state.len());
        result
    }
}

impl Drop for LcoreHandle<'_> {
    fn drop(&mut self) {
        self.cache.release();
    }
}

impl fmt::Debug for LcoreHandle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LcoreHandle")
            .field("pool", &self.pool.name())
            .field("core_id", &self.core_id)
            .field("cached", &self.cached())
            .finish()
    }
}
