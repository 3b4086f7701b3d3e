/*!
 * Ring Types
 */

use crate::core::types::SocketId;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Ring synchronization flags
    ///
    /// With no flags set the ring is multi-producer / multi-consumer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct RingFlags: u32 {
        /// Enqueue is performed by a single producer at a time
        const SP_ENQ = 0x0001;
        /// Dequeue is performed by a single consumer at a time
        const SC_DEQ = 0x0002;
    }
}

/// How a bulk operation treats a request larger than what is available
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// All or nothing
    Fixed,
    /// As many as possible, never more than requested
    Variable,
}

/// Point-in-time snapshot of a ring
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RingInfo {
    pub name: String,
    pub socket_id: SocketId,
    pub flags: RingFlags,
    pub size: u32,
    pub capacity: u32,
    pub prod_head: u32,
    pub prod_tail: u32,
    pub cons_head: u32,
    pub cons_tail: u32,
    pub used: u32,
    pub avail: u32,
}
