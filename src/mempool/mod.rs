/*!
 * Mempool Module
 * Multi-core fixed-size object pool
 */

mod cache;
pub mod config;
mod handle;
pub(crate) mod header;
pub mod policy;
mod pool;
pub mod populate;
pub mod ring_store;
pub mod stack_store;
mod stats;
pub mod traits;
pub mod types;

// Re-export for convenience
pub use config::{CacheConfig, PoolConfig};
pub use handle::LcoreHandle;
pub use policy::PolicyRegistry;
pub use pool::Pool;
pub use populate::{populate_region, PopulateJob};
pub use ring_store::{RingPolicy, RingStore};
pub use stack_store::{StackPolicy, StackStore};
pub use traits::{BackingStore, StoreParams, StorePolicy};
pub use types::*;
