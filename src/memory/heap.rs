/*!
 * Heap Provider
 * Memory regions from the global allocator
 */

use super::traits::MemoryProvider;
use super::types::MemoryRegion;
use crate::core::errors::{PoolError, PoolResult};
use crate::core::types::SocketId;
use std::alloc::{alloc_zeroed, Layout};
use std::ptr::NonNull;
use tracing::{debug, warn};

/// Zeroed, aligned regions from the process heap
///
/// IOVA is unknown for heap memory, so objects populated from it report
/// `None` from `Pool::obj_iova`. The socket id is recorded but not acted on.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeapProvider;

impl HeapProvider {
    pub fn new() -> Self {
        Self
    }
}

impl MemoryProvider for HeapProvider {
    fn reserve(&self, len: usize, align: usize, socket_id: SocketId) -> PoolResult<MemoryRegion> {
        if len == 0 {
            return Err(PoolError::InvalidParam("zero-length region".to_string()));
        }
        let layout = Layout::from_size_align(len, align).map_err(|_| {
            PoolError::InvalidParam(format!("invalid region layout: {} bytes, align {}", len, align))
        })?;

        // SAFETY: layout has non-zero size
        let ptr = unsafe { alloc_zeroed(layout) };
        let Some(addr) = NonNull::new(ptr) else {
            warn!(len, align, "Heap region allocation failed");
            return Err(PoolError::AllocationFailed { size: len, align });
        };

        debug!(len, align, socket_id, "Heap region reserved");
        // SAFETY: ptr was just allocated with layout
        Ok(unsafe { MemoryRegion::from_alloc(addr, layout, socket_id) })
    }

    fn name(&self) -> &str {
        "heap"
    }
}
