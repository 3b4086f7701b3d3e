/*!
 * Per-Core Cache
 *
 * A small LIFO array of objects owned by one core at a time. Gets and puts
 * touch only this array until it runs dry or passes its flush threshold;
 * then objects move to or from the backing store in one bulk call.
 *
 * # Ownership
 *
 * The array is reached through `state_mut`, which requires the caller to hold
 * the cache claim (`try_claim`). `Pool::lcore` is the only claimant and the
 * returned handle releases the claim on drop, so no two threads ever touch
 * the same array.
 */

use super::stats::CoreStats;
use super::traits::BackingStore;
use crate::core::errors::{PoolError, PoolResult};
use crate::core::types::ObjPtr;
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Objects held by one cache
#[derive(Debug)]
pub(crate) struct CacheState {
    len: u32,
    objs: Box<[ObjPtr]>,
}

impl CacheState {
    fn new() -> Self {
        Self {
            len: 0,
            objs: Box::default(),
        }
    }

    #[inline]
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Allocate the backing array on first use
    pub fn ensure_storage(&mut self, storage_len: usize) {
        if self.objs.len() < storage_len {
            let mut objs = vec![ObjPtr::DANGLING; storage_len].into_boxed_slice();
            objs[..self.len as usize].copy_from_slice(&self.objs[..self.len as usize]);
            self.objs = objs;
        }
    }

    /// Move the `out.len()` most recently cached objects into `out`
    #[inline(always)]
    fn pop_into(&mut self, out: &mut [ObjPtr]) {
        let len = self.len as usize;
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.objs[len - 1 - i];
        }
        self.len -= out.len() as u32;
    }

    /// Take `out.len()` objects, refilling from `store` when short
    ///
    /// Fails only if the cache and the store together hold fewer than
    /// `out.len()` objects, in which case neither is modified.
    #[inline]
    pub fn get(
        &mut self,
        store: &dyn BackingStore,
        refill_size: u32,
        out: &mut [ObjPtr],
    ) -> PoolResult<()> {
        let n = out.len();
        let len = self.len as usize;

        if n <= len {
            self.pop_into(out);
            return Ok(());
        }

        let shortfall = n - len;
        if n <= refill_size as usize {
            // Leave refill_size objects behind once the request is served
            let refill = shortfall + refill_size as usize;
            if len + refill <= self.objs.len()
                && store.dequeue(&mut self.objs[len..len + refill]).is_ok()
            {
                self.len += refill as u32;
                self.pop_into(out);
                return Ok(());
            }
        }

        // Serve the shortfall straight from the store, the rest from the cache
        let cached = self.len;
        store
            .dequeue(&mut out[..shortfall])
            .map_err(|err| match err {
                PoolError::NoBuffers { available, .. } => PoolError::NoBuffers {
                    requested: n as u32,
                    available: available + cached,
                },
                other => other,
            })?;
        self.pop_into(&mut out[shortfall..]);
        Ok(())
    }

    /// Cache `objs`, flushing everything cached first if the flush threshold would be passed
    ///
    /// Requests larger than the threshold bypass the cache entirely.
    #[inline]
    pub fn put(
        &mut self,
        store: &dyn BackingStore,
        flush_threshold: u32,
        objs: &[ObjPtr],
    ) -> PoolResult<()> {
        let n = objs.len();
        if n > flush_threshold as usize {
            return store.enqueue(objs);
        }

        if self.len as usize + n > flush_threshold as usize {
            self.flush(store)?;
        }

        let len = self.len as usize;
        self.objs[len..len + n].copy_from_slice(objs);
        self.len += n as u32;
        Ok(())
    }

    /// Return every cached object to `store`
    pub fn flush(&mut self, store: &dyn BackingStore) -> PoolResult<()> {
        if self.len > 0 {
            store.enqueue(&self.objs[..self.len as usize])?;
            self.len = 0;
        }
        Ok(())
    }
}

/// One per-core slot of a pool
pub(crate) struct LocalCache {
    claimed: AtomicBool,
    /// Cached length as last published by the claim holder
    len_hint: AtomicU32,
    state: UnsafeCell<CacheState>,
    pub stats: CoreStats,
}

// `state` is only reached through state_mut by the single claim holder
unsafe impl Sync for LocalCache {}

impl LocalCache {
    pub fn new() -> Self {
        Self {
            claimed: AtomicBool::new(false),
            len_hint: AtomicU32::new(0),
            state: UnsafeCell::new(CacheState::new()),
            stats: CoreStats::default(),
        }
    }

    /// Claim exclusive use of this slot
    #[inline]
    pub fn try_claim(&self) -> bool {
        self.claimed
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    #[inline]
    pub fn release(&self) {
        self.claimed.store(false, Ordering::Release);
    }

    #[inline]
    pub fn is_claimed(&self) -> bool {
        self.claimed.load(Ordering::Relaxed)
    }

    /// Mutable access to the cached objects
    ///
    /// # Safety
    ///
    /// The caller must hold the claim and must not create a second reference
    /// while the first is live.
    #[inline(always)]
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn state_mut(&self) -> &mut CacheState {
        &mut *self.state.get()
    }

    /// Publish the cached length for `Pool::count` and dumps
    #[inline(always)]
    pub fn publish_len(&self, len: u32) {
        self.len_hint.store(len, Ordering::Relaxed);
    }

    #[inline]
    pub fn len(&self) -> u32 {
        self.len_hint.load(Ordering::Relaxed)
    }
}
