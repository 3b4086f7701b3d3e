/*!
 * Region Populate
 * Carves a memory region into objects and registers them in a backing store
 */

use super::header::ObjHeader;
use super::traits::BackingStore;
use super::types::{ObjCtor, ObjInit};
use crate::core::errors::{PoolError, PoolResult};
use crate::core::types::{align_up, ObjPtr};
use crate::memory::{MemoryRegion, ObjLayout};
use parking_lot::Mutex;

/// One populate request against one region
#[derive(Debug, Clone, Copy)]
pub struct PopulateJob<'a> {
    pub pool_id: u64,
    pub layout: &'a ObjLayout,
    pub region: &'a MemoryRegion,
    /// Upper bound on objects to place
    pub max_objs: u32,
    /// Index reported to the constructor for the first object placed
    pub first_index: u32,
}

/// Reject regions no object could be placed in safely
///
/// A known IOVA base must leave room for the whole region without wrapping.
pub fn check_region(region: &MemoryRegion) -> PoolResult<()> {
    if region.is_empty() {
        return Err(PoolError::InvalidParam("zero-length region".to_string()));
    }
    if let Some(base) = region.iova() {
        // Every object IOVA stays below base + len, so it never encodes as unknown
        if base.0.checked_add(region.len() as u64).is_none() {
            return Err(PoolError::InvalidParam(format!(
                "iova range {} + {} overflows",
                base,
                region.len()
            )));
        }
    }
    Ok(())
}

/// Place objects at successive strides of `job.region`
///
/// Returns the number placed; zero objects fitting is not an error. Invalid
/// regions are rejected before anything is touched.
pub fn populate_region(
    store: &dyn BackingStore,
    job: &PopulateJob<'_>,
    mut ctor: ObjCtor<'_>,
) -> PoolResult<u32> {
    let region = job.region;
    check_region(region)?;

    let layout = job.layout;
    let start = region.addr();
    let mut off = align_up(start, layout.align()) - start;
    let mut placed = 0u32;

    while placed < job.max_objs && off + layout.total_size <= region.len() {
        off += layout.header_size;

        let obj = ObjPtr::from_raw(region.as_ptr().wrapping_add(off))
            .ok_or_else(|| PoolError::InvalidParam("object address wrapped".to_string()))?;
        let iova = region.iova().map(|base| base.add(off));

        // SAFETY: [off - header_size, off + elt_size + trailer_size) lies inside
        // the region and off is aligned to at least 8 bytes
        unsafe { ObjHeader::init(obj, job.pool_id, iova, layout.elt_size) };

        if let Some(ctor) = ctor.as_deref_mut() {
            ctor(&ObjInit {
                pool_id: job.pool_id,
                index: job.first_index + placed,
                obj,
                iova,
                elt_size: layout.elt_size,
            });
        }

        store.enqueue(std::slice::from_ref(&obj))?;

        off += layout.elt_size + layout.trailer_size;
        placed += 1;
    }

    Ok(placed)
}

/// Store wrapper that records every object a policy places
///
/// Objects must lie wholly inside the job's region and stay within
/// `max_objs`; anything else is refused before reaching the store.
pub(crate) struct PlacementLog<'a> {
    inner: &'a dyn BackingStore,
    region: &'a MemoryRegion,
    layout: &'a ObjLayout,
    max_objs: u32,
    placed: Mutex<Vec<ObjPtr>>,
}

impl<'a> PlacementLog<'a> {
    pub fn new(inner: &'a dyn BackingStore, job: &PopulateJob<'a>) -> Self {
        Self {
            inner,
            region: job.region,
            layout: job.layout,
            max_objs: job.max_objs,
            placed: Mutex::new(Vec::new()),
        }
    }

    fn in_bounds(&self, obj: ObjPtr) -> bool {
        let start = self.region.addr();
        let end = start + self.region.len();
        let addr = obj.addr();
        addr >= start + self.layout.header_size
            && addr
                .checked_add(self.layout.elt_size + self.layout.trailer_size)
                .is_some_and(|obj_end| obj_end <= end)
    }

    /// Objects placed, in address order
    pub fn into_placed(self) -> Vec<ObjPtr> {
        let mut placed = self.placed.into_inner();
        placed.sort_unstable();
        placed
    }
}

impl BackingStore for PlacementLog<'_> {
    fn enqueue(&self, objs: &[ObjPtr]) -> PoolResult<()> {
        if let Some(obj) = objs.iter().find(|o| !self.in_bounds(**o)) {
            return Err(PoolError::InvalidParam(format!(
                "{:?} is outside the populated region",
                obj
            )));
        }
        let mut placed = self.placed.lock();
        if placed.len() + objs.len() > self.max_objs as usize {
            return Err(PoolError::NoSpace {
                requested: objs.len() as u32,
            });
        }
        self.inner.enqueue(objs)?;
        placed.extend_from_slice(objs);
        Ok(())
    }

    fn dequeue(&self, out: &mut [ObjPtr]) -> PoolResult<()> {
        self.inner.dequeue(out)
    }

    fn count(&self) -> u32 {
        self.inner.count()
    }
}
