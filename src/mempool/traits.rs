/*!
 * Backing Store Traits
 * The contract a pool uses to hold objects not checked out
 */

use super::populate::{populate_region, PopulateJob};
use super::types::ObjCtor;
use crate::core::errors::PoolResult;
use crate::core::types::{ObjPtr, SocketId};
use crate::memory::ObjLayout;

/// Shared object store behind a pool
///
/// Both transfers are all-or-nothing: on error nothing was stored or removed.
/// The pool never asks which implementation it holds.
pub trait BackingStore: Send + Sync {
    /// Store every object in `objs`
    fn enqueue(&self, objs: &[ObjPtr]) -> PoolResult<()>;

    /// Fill every slot of `out`
    fn dequeue(&self, out: &mut [ObjPtr]) -> PoolResult<()>;

    /// Objects currently held
    fn count(&self) -> u32;
}

/// Parameters for allocating a backing store
#[derive(Debug, Clone, Copy)]
pub struct StoreParams<'a> {
    pub name: &'a str,
    /// Number of objects the store must be able to hold at once
    pub capacity: u32,
    pub socket_id: SocketId,
}

/// Named factory for backing stores, selectable at pool creation
pub trait StorePolicy: Send + Sync {
    /// Name the policy is registered under
    fn name(&self) -> &str;

    /// Allocate a store able to hold `params.capacity` objects
    fn alloc(&self, params: &StoreParams<'_>) -> PoolResult<Box<dyn BackingStore>>;

    /// Release a store at pool destruction
    fn free(&self, store: Box<dyn BackingStore>) {
        drop(store);
    }

    /// Bytes of region memory needed for `obj_num` objects
    fn calc_mem_size(&self, obj_num: u32, layout: &ObjLayout) -> usize {
        layout.mem_size(obj_num)
    }

    /// Carve up to `max_objs` objects out of `region` into `store`
    ///
    /// Overrides may lay objects out however they like, as long as every
    /// enqueued object (header and trailer included) lies inside the region.
    /// The pool tracks exactly the objects enqueued here.
    fn populate(
        &self,
        store: &dyn BackingStore,
        job: &PopulateJob<'_>,
        ctor: ObjCtor<'_>,
    ) -> PoolResult<u32> {
        populate_region(store, job, ctor)
    }
}
