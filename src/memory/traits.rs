/*!
 * Memory Traits
 * Memory reservation abstraction consumed by pool populate
 */

use super::types::MemoryRegion;
use crate::core::errors::PoolResult;
use crate::core::types::SocketId;

/// Source of raw memory regions for pool objects
///
/// Implementations decide where memory comes from (heap, huge pages,
/// device-visible buffers). The pool only requires a pointer, a length and an
/// optional IOVA base; `socket_id` is passed through uninterpreted.
pub trait MemoryProvider: Send + Sync {
    /// Reserve `len` bytes aligned to `align`
    fn reserve(&self, len: usize, align: usize, socket_id: SocketId) -> PoolResult<MemoryRegion>;

    /// Provider name for logs and dumps
    fn name(&self) -> &str {
        "custom"
    }
}
