/*!
 * corepool
 * Multi-core object pool allocator on top of a lock-free bounded ring
 */

pub mod core;
pub mod memory;
pub mod mempool;
pub mod monitoring;
pub mod registry;
pub mod ring;

// Re-exports
pub use crate::core::errors::{PoolError, PoolResult, RingError, RingResult};
pub use crate::core::types::{CoreId, Iova, ObjPtr, SocketId, SOCKET_ID_ANY};
pub use crate::core::RuntimeConfig;
pub use memory::{calc_obj_size, HeapProvider, MemoryProvider, MemoryRegion, ObjLayout};
pub use mempool::{
    BackingStore, CacheConfig, LcoreHandle, ObjCtor, ObjInit, PolicyRegistry, Pool, PoolConfig,
    PoolFlags, PoolInfo, PoolStats, RingPolicy, StackPolicy, StorePolicy,
};
pub use monitoring::init_tracing;
pub use registry::Registry;
pub use ring::{Ring, RingFlags, RingInfo};
