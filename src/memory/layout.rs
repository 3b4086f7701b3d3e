/*!
 * Object Layout
 *
 * Every pool object occupies one fixed stride:
 *
 * ```text
 * | header (padded) | element (elt_size rounded to 8) | trailer (cookie + pad) |
 *                   ^ object pointer
 * ```
 *
 * The header record sits immediately before the object pointer. Unless the
 * pool disables cache alignment, the header is rounded to a cache line and the
 * trailer absorbs the remaining padding so the stride is a cache-line multiple.
 */

use crate::core::limits::{CACHE_LINE_SIZE, MIN_OBJ_ALIGN};
use crate::core::types::align_up;
use crate::mempool::header::{ObjHeader, TRAILER_SIZE};
use crate::mempool::types::PoolFlags;
use serde::Serialize;
use std::mem::size_of;

/// Per-object size breakdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ObjLayout {
    pub header_size: usize,
    pub elt_size: usize,
    pub trailer_size: usize,
    pub total_size: usize,
}

impl ObjLayout {
    /// Alignment of object pointers
    #[inline]
    pub fn align(&self) -> usize {
        if self.total_size % CACHE_LINE_SIZE == 0 && self.header_size % CACHE_LINE_SIZE == 0 {
            CACHE_LINE_SIZE
        } else {
            MIN_OBJ_ALIGN
        }
    }

    /// Bytes needed to hold `obj_num` objects, excluding start alignment
    #[inline]
    pub fn mem_size(&self, obj_num: u32) -> usize {
        self.total_size * obj_num as usize
    }
}

/// Compute the stride of an object with `elt_size` usable bytes
pub fn calc_obj_size(elt_size: usize, flags: PoolFlags) -> ObjLayout {
    let align = if flags.contains(PoolFlags::NO_CACHE_ALIGN) {
        MIN_OBJ_ALIGN
    } else {
        CACHE_LINE_SIZE
    };

    let header_size = align_up(size_of::<ObjHeader>(), align);
    let elt_size = align_up(elt_size, MIN_OBJ_ALIGN);
    let unpadded = header_size + elt_size + TRAILER_SIZE;
    let total_size = align_up(unpadded, align);

    ObjLayout {
        header_size,
        elt_size,
        trailer_size: total_size - header_size - elt_size,
        total_size,
    }
}
