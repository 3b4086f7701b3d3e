/*!
 * Pool Types
 * Flags, constructor callback, and snapshots
 */

use crate::core::types::{Iova, ObjPtr, SocketId};
use crate::memory::{ObjLayout, RegionInfo};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Pool creation flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct PoolFlags: u32 {
        /// Pad objects only to 8 bytes instead of a cache line
        const NO_CACHE_ALIGN = 0x0001;
    }
}

/// What a populate constructor is told about each new object
#[derive(Debug, Clone, Copy)]
pub struct ObjInit {
    pub pool_id: u64,
    /// Position of the object in populate order, across all chunks
    pub index: u32,
    pub obj: ObjPtr,
    pub iova: Option<Iova>,
    /// Usable bytes at `obj`
    pub elt_size: usize,
}

/// Object constructor invoked once per object at populate time
pub type ObjCtor<'a> = Option<&'a mut dyn FnMut(&ObjInit)>;

/// Counter snapshot for one core (or the shared non-core slot)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CoreStatsSnapshot {
    pub put_bulk: u64,
    pub put_objs: u64,
    pub get_success_bulk: u64,
    pub get_success_objs: u64,
    pub get_fail_bulk: u64,
    pub get_fail_objs: u64,
}

impl CoreStatsSnapshot {
    pub fn merge(&mut self, other: &CoreStatsSnapshot) {
        self.put_bulk += other.put_bulk;
        self.put_objs += other.put_objs;
        self.get_success_bulk += other.get_success_bulk;
        self.get_success_objs += other.get_success_objs;
        self.get_fail_bulk += other.get_fail_bulk;
        self.get_fail_objs += other.get_fail_objs;
    }

    pub fn is_zero(&self) -> bool {
        *self == CoreStatsSnapshot::default()
    }
}

/// Pool-wide statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub total: CoreStatsSnapshot,
    /// Per-core entries with any activity, as `(core_id, counters)`
    pub per_core: Vec<(u32, CoreStatsSnapshot)>,
    /// Calls made through the pool directly rather than a core handle
    pub unbound: CoreStatsSnapshot,
}

/// Cached object count for one core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheCount {
    pub core_id: u32,
    pub len: u32,
}

/// Point-in-time description of a pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolInfo {
    pub id: u64,
    pub name: String,
    pub socket_id: SocketId,
    pub flags: PoolFlags,
    pub policy: String,
    pub size: u32,
    pub populated_size: u32,
    pub layout: ObjLayout,
    pub cache_size: u32,
    pub cache_flush_threshold: u32,
    pub common_pool_count: u32,
    pub cache_counts: Vec<CacheCount>,
    pub total_cache_count: u32,
    pub avail_count: u32,
    pub in_use_count: u32,
    pub chunks: Vec<RegionInfo>,
    pub stats: PoolStats,
}
