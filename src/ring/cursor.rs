/*!
 * Cursor Pair
 *
 * Head/tail counters for one direction of ring traffic. `head` marks how far
 * slots have been reserved, `tail` how far they have been published. Both are
 * free-running 32-bit counters compared with wrapping arithmetic.
 *
 * # Protocol
 *
 * ```text
 * move_head:   reserve [old_head, new_head) against the opposite tail
 * (copy slots)
 * update_tail: wait for tail == old_head, then release-store new_head
 * ```
 *
 * Reservations may complete out of order; publication never does.
 */

use super::types::Behavior;
use std::hint;
use std::sync::atomic::{fence, AtomicU32, Ordering};

/// Outcome of a head move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct HeadMove {
    pub old_head: u32,
    pub new_head: u32,
    /// Number of slots reserved (0 on failure)
    pub n: u32,
    /// Slots that were available to this side when the move was computed
    pub available: u32,
}

/// One (head, tail) pair
#[derive(Debug)]
pub(crate) struct CursorPair {
    head: AtomicU32,
    tail: AtomicU32,
    single: bool,
}

impl CursorPair {
    pub fn new(single: bool) -> Self {
        Self {
            head: AtomicU32::new(0),
            tail: AtomicU32::new(0),
            single,
        }
    }

    #[cfg(test)]
    pub fn starting_at(single: bool, start: u32) -> Self {
        Self {
            head: AtomicU32::new(start),
            tail: AtomicU32::new(start),
            single,
        }
    }

    #[inline(always)]
    pub fn is_single(&self) -> bool {
        self.single
    }

    #[inline(always)]
    pub fn head(&self, order: Ordering) -> u32 {
        self.head.load(order)
    }

    #[inline(always)]
    pub fn tail(&self, order: Ordering) -> u32 {
        self.tail.load(order)
    }

    /// Reserve up to `n` slots on this side
    ///
    /// `capacity` is the ring capacity when producing and 0 when consuming, so
    /// `capacity + opposite.tail - head` is the free-slot count for producers
    /// and the entry count for consumers.
    #[inline(always)]
    pub fn move_head(
        &self,
        opposite: &CursorPair,
        capacity: u32,
        n: u32,
        behavior: Behavior,
    ) -> HeadMove {
        let mut old_head = self.head.load(Ordering::Relaxed);

        loop {
            // The head read must not be reordered after the opposite tail read
            fence(Ordering::Acquire);
            let opposite_tail = opposite.tail.load(Ordering::Acquire);

            let available = capacity.wrapping_add(opposite_tail).wrapping_sub(old_head);

            let n = if n > available {
                match behavior {
                    Behavior::Fixed => 0,
                    Behavior::Variable => available,
                }
            } else {
                n
            };

            if n == 0 {
                return HeadMove {
                    old_head,
                    new_head: old_head,
                    n: 0,
                    available,
                };
            }

            let new_head = old_head.wrapping_add(n);

            if self.single {
                self.head.store(new_head, Ordering::Relaxed);
                return HeadMove {
                    old_head,
                    new_head,
                    n,
                    available,
                };
            }

            match self.head.compare_exchange_weak(
                old_head,
                new_head,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => {
                    return HeadMove {
                        old_head,
                        new_head,
                        n,
                        available,
                    }
                }
                // Another thread moved the head; recompute against the new value
                Err(current) => old_head = current,
            }
        }
    }

    /// Publish `[old_head, new_head)` to the opposite side
    #[inline(always)]
    pub fn update_tail(&self, old_head: u32, new_head: u32) {
        if !self.single {
            // Earlier reservations publish first so the opposite side never sees a hole
            while self.tail.load(Ordering::Relaxed) != old_head {
                hint::spin_loop();
            }
        }
        self.tail.store(new_head, Ordering::Release);
    }
}
