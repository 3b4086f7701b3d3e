/*!
 * Ring Store
 * FIFO backing store over the lock-free ring
 */

use super::traits::{BackingStore, StoreParams, StorePolicy};
use crate::core::errors::{PoolError, PoolResult, RingError};
use crate::core::limits::DEFAULT_POLICY;
use crate::core::types::{Name, ObjPtr};
use crate::ring::{Ring, RingFlags};

/// Backing store holding objects in a [`Ring`]
#[derive(Debug)]
pub struct RingStore {
    ring: Ring<ObjPtr>,
}

impl RingStore {
    pub fn new(ring: Ring<ObjPtr>) -> Self {
        Self { ring }
    }

    pub fn ring(&self) -> &Ring<ObjPtr> {
        &self.ring
    }
}

#[inline]
fn to_pool_error(err: RingError) -> PoolError {
    match err {
        RingError::NoSpace { requested, .. } => PoolError::NoSpace { requested },
        RingError::NoEntries {
            requested,
            available,
        } => PoolError::NoBuffers {
            requested,
            available,
        },
        other => PoolError::Ring(other),
    }
}

impl BackingStore for RingStore {
    #[inline]
    fn enqueue(&self, objs: &[ObjPtr]) -> PoolResult<()> {
        self.ring.enqueue_bulk(objs).map(|_| ()).map_err(to_pool_error)
    }

    #[inline]
    fn dequeue(&self, out: &mut [ObjPtr]) -> PoolResult<()> {
        self.ring.dequeue_bulk(out).map(|_| ()).map_err(to_pool_error)
    }

    #[inline]
    fn count(&self) -> u32 {
        self.ring.count()
    }
}

/// Policy producing [`RingStore`]s
///
/// The ring is sized to the next power of two at or above the pool size.
#[derive(Debug, Clone)]
pub struct RingPolicy {
    name: Name,
    flags: RingFlags,
}

impl RingPolicy {
    /// Multi-producer / multi-consumer rings, registered as `"ring_mp_mc"`
    pub fn mp_mc() -> Self {
        Self {
            name: Name::from(DEFAULT_POLICY),
            flags: RingFlags::empty(),
        }
    }

    /// Rings with explicit synchronization flags under a custom name
    ///
    /// # Safety
    ///
    /// Every pool created with this policy inherits the contract of
    /// [`Ring::with_flags`]: with `SP_ENQ` only one thread at a time may
    /// release objects to the backing store (including cache flushes), with
    /// `SC_DEQ` only one thread at a time may take objects from it
    /// (including cache refills).
    pub unsafe fn with_flags(name: &str, flags: RingFlags) -> Self {
        Self {
            name: Name::from(name),
            flags,
        }
    }

    pub fn flags(&self) -> RingFlags {
        self.flags
    }
}

impl StorePolicy for RingPolicy {
    fn name(&self) -> &str {
        &self.name
    }

    fn alloc(&self, params: &StoreParams<'_>) -> PoolResult<Box<dyn BackingStore>> {
        let size = params
            .capacity
            .max(1)
            .checked_next_power_of_two()
            .ok_or(PoolError::Ring(RingError::InvalidSize(params.capacity)))?;
        // SAFETY: the flags' exclusivity contract was accepted in RingPolicy::with_flags
        let ring = unsafe { Ring::with_flags(params.name, size, params.socket_id, self.flags)? };
        Ok(Box::new(RingStore::new(ring)))
    }
}
