/*!
 * Memory Types
 * Regions handed to pool populate
 */

use crate::core::errors::{PoolError, PoolResult};
use crate::core::types::{Iova, SocketId};
use serde::Serialize;
use std::alloc::{dealloc, Layout};
use std::fmt;
use std::ptr::NonNull;

/// A contiguous range of memory objects are carved from
///
/// A region either owns its allocation (released on drop) or borrows external
/// memory through [`MemoryRegion::from_raw`].
pub struct MemoryRegion {
    addr: NonNull<u8>,
    len: usize,
    iova: Option<Iova>,
    socket_id: SocketId,
    owned: Option<Layout>,
}

// The region is only a byte range; objects carved from it are handed out by the pool
unsafe impl Send for MemoryRegion {}
unsafe impl Sync for MemoryRegion {}

impl MemoryRegion {
    /// Take ownership of an allocation made with `std::alloc` and `layout`
    ///
    /// # Safety
    ///
    /// `addr` must come from `std::alloc::alloc` (or `alloc_zeroed`) with
    /// exactly `layout`, and must not be freed elsewhere.
    pub(crate) unsafe fn from_alloc(addr: NonNull<u8>, layout: Layout, socket_id: SocketId) -> Self {
        Self {
            addr,
            len: layout.size(),
            iova: None,
            socket_id,
            owned: Some(layout),
        }
    }

    /// Wrap externally managed memory
    ///
    /// # Safety
    ///
    /// `addr..addr + len` must be valid for reads and writes, not used by
    /// anything else, and outlive the pool it is populated into.
    pub unsafe fn from_raw(addr: *mut u8, len: usize, socket_id: SocketId) -> PoolResult<Self> {
        let addr = NonNull::new(addr)
            .ok_or_else(|| PoolError::InvalidParam("null region address".to_string()))?;
        Ok(Self {
            addr,
            len,
            iova: None,
            socket_id,
            owned: None,
        })
    }

    /// Attach the device-visible address of the first byte
    pub fn with_iova(mut self, iova: Iova) -> Self {
        self.iova = Some(iova);
        self
    }

    #[inline]
    pub fn as_ptr(&self) -> *mut u8 {
        self.addr.as_ptr()
    }

    #[inline]
    pub fn addr(&self) -> usize {
        self.addr.as_ptr() as usize
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// IOVA of the first byte, if known
    #[inline]
    pub fn iova(&self) -> Option<Iova> {
        self.iova
    }

    #[inline]
    pub fn socket_id(&self) -> SocketId {
        self.socket_id
    }

    /// True if `addr` falls inside this region
    #[inline]
    pub fn contains(&self, addr: usize) -> bool {
        addr >= self.addr() && addr - self.addr() < self.len
    }

    pub fn info(&self) -> RegionInfo {
        RegionInfo {
            addr: self.addr(),
            len: self.len,
            iova: self.iova,
            socket_id: self.socket_id,
            owned: self.owned.is_some(),
        }
    }
}

impl Drop for MemoryRegion {
    fn drop(&mut self) {
        if let Some(layout) = self.owned.take() {
            // SAFETY: from_alloc's contract ties addr to this layout
            unsafe { dealloc(self.addr.as_ptr(), layout) };
        }
    }
}

impl fmt::Debug for MemoryRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryRegion")
            .field("addr", &self.addr)
            .field("len", &self.len)
            .field("iova", &self.iova)
            .field("socket_id", &self.socket_id)
            .finish()
    }
}

/// Serializable description of a region (a populated chunk)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionInfo {
    pub addr: usize,
    pub len: usize,
    pub iova: Option<Iova>,
    pub socket_id: SocketId,
    pub owned: bool,
}
