/*!
 * Lock-Free Ring
 * Fixed-capacity circular buffer with bulk and burst enqueue/dequeue
 */

use super::cursor::{CursorPair, HeadMove};
use super::types::{Behavior, RingFlags, RingInfo};
use crate::core::errors::{RingError, RingResult};
use crate::core::limits::{NAME_MAX_LEN, RING_SIZE_MAX};
use crate::core::types::{Name, SocketId};
use crossbeam_utils::CachePadded;
use std::cell::UnsafeCell;
use std::fmt;
use std::mem::MaybeUninit;
use std::sync::atomic::Ordering;
use tracing::debug;

type Slot<T> = UnsafeCell<MaybeUninit<T>>;

/// Lock-free bounded ring of `Copy` values (typically object handles)
///
/// # Capacity
///
/// A ring of `size` slots holds `size` entries: fullness is derived from the
/// distance between free-running cursors, so no sentinel slot is reserved.
///
/// # Thread Safety
///
/// Multi-producer / multi-consumer by default. Rings created with
/// [`RingFlags::SP_ENQ`] or [`RingFlags::SC_DEQ`] skip the head CAS and the
/// tail wait on that side; see [`Ring::with_flags`] for the contract.
pub struct Ring<T> {
    name: Name,
    socket_id: SocketId,
    flags: RingFlags,
    size: u32,
    mask: u32,
    capacity: u32,
    prod: CachePadded<CursorPair>,
    cons: CachePadded<CursorPair>,
    slots: Box<[Slot<T>]>,
}

// Slot access is serialized by the cursor protocol: a slot is written only
// inside a producer reservation and read only inside a consumer reservation.
unsafe impl<T: Send> Send for Ring<T> {}
unsafe impl<T: Send> Sync for Ring<T> {}

/// Validate a ring or pool name
pub(crate) fn check_name(name: &str) -> RingResult<()> {
    if name.len() > NAME_MAX_LEN {
        return Err(RingError::NameTooLong(name.to_string()));
    }
    Ok(())
}

#[inline(always)]
fn request_len(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

impl<T: Copy> Ring<T> {
    /// Create a multi-producer / multi-consumer ring
    ///
    /// `size` must be a power of two in `[1, 2^30]`.
    pub fn new(name: &str, size: u32, socket_id: SocketId) -> RingResult<Self> {
        // SAFETY: no single-thread flags, so there is no exclusivity contract
        unsafe { Self::with_flags(name, size, socket_id, RingFlags::empty()) }
    }

    /// Create a ring with explicit synchronization flags
    ///
    /// # Safety
    ///
    /// With `SP_ENQ`, no two enqueue calls may run concurrently on this ring.
    /// With `SC_DEQ`, no two dequeue calls may run concurrently on this ring.
    /// Violating either lets two threads reserve the same slots.
    pub unsafe fn with_flags(
        name: &str,
        size: u32,
        socket_id: SocketId,
        flags: RingFlags,
    ) -> RingResult<Self> {
        check_name(name)?;
        if size == 0 || !size.is_power_of_two() || size > RING_SIZE_MAX {
            return Err(RingError::InvalidSize(size));
        }

        let slots = (0..size)
            .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        debug!(ring = name, size, socket_id, flags = ?flags, "Ring created");

        Ok(Self {
            name: Name::from(name),
            socket_id,
            flags,
            size,
            mask: size - 1,
            capacity: size,
            prod: CachePadded::new(CursorPair::new(flags.contains(RingFlags::SP_ENQ))),
            cons: CachePadded::new(CursorPair::new(flags.contains(RingFlags::SC_DEQ))),
            slots,
        })
    }

    #[cfg(test)]
    fn starting_at(size: u32, start: u32) -> Self {
        let mut ring = Self::new("wrap", size, -1).unwrap();
        ring.prod = CachePadded::new(CursorPair::starting_at(false, start));
        ring.cons = CachePadded::new(CursorPair::starting_at(false, start));
        ring
    }

    #[inline(always)]
    fn slot(&self, index: u32) -> &Slot<T> {
        &self.slots[(index & self.mask) as usize]
    }

    #[inline(always)]
    fn write_slots(&self, head: u32, objs: &[T]) {
        let mut index = head;
        for obj in objs {
            // SAFETY: [head, head + len) is reserved by this producer until update_tail
            unsafe { (*self.slot(index).get()).write(*obj) };
            index = index.wrapping_add(1);
        }
    }

    #[inline(always)]
    fn read_slots(&self, head: u32, out: &mut [T]) {
        let mut index = head;
        for obj in out {
            // SAFETY: [head, head + len) was published by producers and is
            // reserved by this consumer until update_tail
            *obj = unsafe { (*self.slot(index).get()).assume_init_read() };
            index = index.wrapping_add(1);
        }
    }

    #[inline(always)]
    fn do_enqueue(&self, objs: &[T], behavior: Behavior) -> HeadMove {
        let mv = self
            .prod
            .move_head(&self.cons, self.capacity, request_len(objs.len()), behavior);
        if mv.n != 0 {
            self.write_slots(mv.old_head, &objs[..mv.n as usize]);
            self.prod.update_tail(mv.old_head, mv.new_head);
        }
        mv
    }

    #[inline(always)]
    fn do_dequeue(&self, out: &mut [T], behavior: Behavior) -> HeadMove {
        let mv = self
            .cons
            .move_head(&self.prod, 0, request_len(out.len()), behavior);
        if mv.n != 0 {
            self.read_slots(mv.old_head, &mut out[..mv.n as usize]);
            self.cons.update_tail(mv.old_head, mv.new_head);
        }
        mv
    }

    /// Enqueue all of `objs` or none of them
    ///
    /// Returns the number enqueued (`objs.len()`, or 0 for an empty slice).
    #[inline]
    pub fn enqueue_bulk(&self, objs: &[T]) -> RingResult<usize> {
        let mv = self.do_enqueue(objs, Behavior::Fixed);
        if mv.n == 0 && !objs.is_empty() {
            return Err(RingError::NoSpace {
                requested: request_len(objs.len()),
                available: mv.available,
            });
        }
        Ok(mv.n as usize)
    }

    /// Enqueue as many of `objs` as fit, in order; returns how many
    #[inline]
    pub fn enqueue_burst(&self, objs: &[T]) -> usize {
        self.do_enqueue(objs, Behavior::Variable).n as usize
    }

    /// Enqueue one value
    #[inline]
    pub fn enqueue(&self, obj: T) -> RingResult<()> {
        self.enqueue_bulk(std::slice::from_ref(&obj)).map(|_| ())
    }

    /// Fill all of `out` or leave the ring untouched
    ///
    /// Returns the number dequeued (`out.len()`, or 0 for an empty slice).
    #[inline]
    pub fn dequeue_bulk(&self, out: &mut [T]) -> RingResult<usize> {
        let requested = request_len(out.len());
        let mv = self.do_dequeue(out, Behavior::Fixed);
        if mv.n == 0 && requested != 0 {
            return Err(RingError::NoEntries {
                requested,
                available: mv.available,
            });
        }
        Ok(mv.n as usize)
    }

    /// Dequeue up to `out.len()` values into the front of `out`; returns how many
    #[inline]
    pub fn dequeue_burst(&self, out: &mut [T]) -> usize {
        self.do_dequeue(out, Behavior::Variable).n as usize
    }

    /// Dequeue one value
    #[inline]
    pub fn dequeue(&self) -> RingResult<T> {
        let mv = self.cons.move_head(&self.prod, 0, 1, Behavior::Fixed);
        if mv.n == 0 {
            return Err(RingError::NoEntries {
                requested: 1,
                available: mv.available,
            });
        }
        // SAFETY: slot old_head is published and reserved by this consumer
        let obj = unsafe { (*self.slot(mv.old_head).get()).assume_init_read() };
        self.cons.update_tail(mv.old_head, mv.new_head);
        Ok(obj)
    }
}

impl<T> Ring<T> {
    /// Number of entries currently published and not yet claimed by a consumer
    ///
    /// Exact when quiescent; a snapshot under concurrency.
    #[inline]
    pub fn count(&self) -> u32 {
        // cons.head first: prod.tail only grows, so the difference cannot go negative
        let cons_head = self.cons.head(Ordering::Acquire);
        let prod_tail = self.prod.tail(Ordering::Acquire);
        prod_tail.wrapping_sub(cons_head).min(self.capacity)
    }

    /// Number of free slots
    #[inline]
    pub fn free_count(&self) -> u32 {
        self.capacity - self.count()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.count() == self.capacity
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Number of slots in the ring
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Number of entries the ring can hold
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn socket_id(&self) -> SocketId {
        self.socket_id
    }

    pub fn flags(&self) -> RingFlags {
        self.flags
    }

    /// True when enqueue skips the head CAS
    pub fn is_single_producer(&self) -> bool {
        self.prod.is_single()
    }

    /// True when dequeue skips the head CAS
    pub fn is_single_consumer(&self) -> bool {
        self.cons.is_single()
    }

    /// Snapshot of cursors and occupancy
    pub fn info(&self) -> RingInfo {
        let used = self.count();
        RingInfo {
            name: self.name.to_string(),
            socket_id: self.socket_id,
            flags: self.flags,
            size: self.size,
            capacity: self.capacity,
            prod_head: self.prod.head(Ordering::Relaxed),
            prod_tail: self.prod.tail(Ordering::Relaxed),
            cons_head: self.cons.head(Ordering::Relaxed),
            cons_tail: self.cons.tail(Ordering::Relaxed),
            used,
            avail: self.capacity - used,
        }
    }
}

impl<T> fmt::Debug for Ring<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ring")
            .field("name", &self.name)
            .field("size", &self.size)
            .field("flags", &self.flags)
            .field("count", &self.count())
            .finish()
    }
}
