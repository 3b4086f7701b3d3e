/*!
 * Core Types
 * Common types used across the ring and the pool
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ptr::NonNull;

/// Index of the calling core, used to select a per-core cache slot
pub type CoreId = u32;

/// Opaque NUMA affinity hint, stored and passed through but never interpreted
pub type SocketId = i32;

/// Inline-allocated name for rings and pools (names are at most 31 bytes)
pub type Name = smartstring::alias::String;

/// Socket id meaning "no preference"
pub const SOCKET_ID_ANY: SocketId = -1;

/// Device-visible (DMA) address of an object
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Iova(pub u64);

impl Iova {
    /// Raw encoding used in object headers for "unknown"
    pub(crate) const UNKNOWN_RAW: u64 = u64::MAX;

    #[inline]
    pub(crate) fn encode(iova: Option<Iova>) -> u64 {
        iova.map_or(Self::UNKNOWN_RAW, |i| i.0)
    }

    #[inline]
    pub(crate) fn decode(raw: u64) -> Option<Iova> {
        (raw != Self::UNKNOWN_RAW).then_some(Iova(raw))
    }

    /// Offset this address by `off` bytes
    #[inline]
    pub fn add(self, off: usize) -> Iova {
        Iova(self.0 + off as u64)
    }
}

impl fmt::Display for Iova {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

/// Opaque handle to a fixed-size pool object
///
/// An `ObjPtr` is just an address: copying it does not copy the object, and
/// holding one confers no access rights by itself. The pool hands each object
/// to exactly one owner at a time; dereferencing it is up to that owner.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ObjPtr(NonNull<u8>);

// Object handles are plain addresses moved between cores through the ring
unsafe impl Send for ObjPtr {}
unsafe impl Sync for ObjPtr {}

impl ObjPtr {
    /// Placeholder used to pre-fill slot arrays; never handed out by a pool
    pub const DANGLING: ObjPtr = ObjPtr(NonNull::dangling());

    /// Wrap a non-null address
    #[inline]
    pub const fn new(ptr: NonNull<u8>) -> Self {
        Self(ptr)
    }

    /// Wrap a raw pointer, returning `None` for null
    #[inline]
    pub fn from_raw(ptr: *mut u8) -> Option<Self> {
        NonNull::new(ptr).map(Self)
    }

    /// Raw pointer to the first byte of the object
    #[inline]
    pub const fn as_ptr(self) -> *mut u8 {
        self.0.as_ptr()
    }

    /// Numeric address of the object
    #[inline]
    pub fn addr(self) -> usize {
        self.0.as_ptr() as usize
    }
}

impl From<NonNull<u8>> for ObjPtr {
    fn from(ptr: NonNull<u8>) -> Self {
        Self(ptr)
    }
}

impl fmt::Debug for ObjPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjPtr({:p})", self.0)
    }
}

impl fmt::Pointer for ObjPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Pointer::fmt(&self.0, f)
    }
}

/// Round `value` up to the next multiple of `align` (a power of two)
#[inline]
pub const fn align_up(value: usize, align: usize) -> usize {
    (value + align - 1) & !(align - 1)
}
