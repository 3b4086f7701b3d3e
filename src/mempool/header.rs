/*!
 * Object Header and Trailer
 *
 * The header record lives in the bytes immediately before each object and is
 * written once at populate time. The trailer cookie follows the element.
 */

use crate::core::limits::{HEADER_COOKIE, TRAILER_COOKIE};
use crate::core::types::{Iova, ObjPtr};
use std::mem::size_of;

/// Bytes reserved for the trailer cookie
pub(crate) const TRAILER_SIZE: usize = size_of::<u64>();

/// Per-object metadata
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ObjHeader {
    pub pool_id: u64,
    pub iova: u64,
    pub cookie: u64,
}

impl ObjHeader {
    #[inline]
    fn location(obj: ObjPtr) -> *mut ObjHeader {
        obj.as_ptr().wrapping_sub(size_of::<ObjHeader>()) as *mut ObjHeader
    }

    /// Write the header and trailer of a freshly carved object
    ///
    /// # Safety
    ///
    /// `obj` must be 8-byte aligned with at least `size_of::<ObjHeader>()`
    /// writable bytes before it and `elt_size + TRAILER_SIZE` after it.
    #[inline]
    pub unsafe fn init(obj: ObjPtr, pool_id: u64, iova: Option<Iova>, elt_size: usize) {
        Self::location(obj).write(ObjHeader {
            pool_id,
            iova: Iova::encode(iova),
            cookie: HEADER_COOKIE,
        });
        (obj.as_ptr().add(elt_size) as *mut u64).write(TRAILER_COOKIE);
    }

    /// Read the header of an object
    ///
    /// # Safety
    ///
    /// `obj` must have been initialized with [`ObjHeader::init`] and its
    /// memory must still be live.
    #[inline]
    pub unsafe fn read(obj: ObjPtr) -> ObjHeader {
        Self::location(obj).read()
    }

    /// Read the trailer cookie of an object
    ///
    /// # Safety
    ///
    /// Same as [`ObjHeader::read`].
    #[inline]
    pub unsafe fn read_trailer(obj: ObjPtr, elt_size: usize) -> u64 {
        (obj.as_ptr().add(elt_size) as *const u64).read()
    }

    #[inline]
    pub fn cookie_ok(&self) -> bool {
        self.cookie == HEADER_COOKIE
    }

    #[inline]
    pub fn iova(&self) -> Option<Iova> {
        Iova::decode(self.iova)
    }
}
