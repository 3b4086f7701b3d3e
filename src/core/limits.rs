/*!
 * System Limits and Constants
 *
 * Centralized location for ring and pool limits, thresholds, and magic numbers.
 * Performance-critical constants are marked with [PERF].
 */

// =============================================================================
// LAYOUT
// =============================================================================

/// Cache line size assumed for object and cursor alignment
/// [PERF] Objects and cursor pairs never share a line
pub const CACHE_LINE_SIZE: usize = 64;

/// Minimum object alignment when cache alignment is disabled
pub const MIN_OBJ_ALIGN: usize = std::mem::size_of::<u64>();

// =============================================================================
// RING LIMITS
// =============================================================================

/// Largest ring size accepted (2^30 slots)
/// Cursors are 32-bit and wrap; the distance between them must stay below 2^31
pub const RING_SIZE_MAX: u32 = 1 << 30;

/// Maximum length of a ring or pool name in bytes
pub const NAME_MAX_LEN: usize = 31;

// =============================================================================
// PER-CORE CACHE LIMITS
// =============================================================================

/// Number of per-core cache slots in every pool
/// Core ids must be in `[0, MAX_CORES)`
pub const MAX_CORES: usize = 128;

/// Largest per-core cache size accepted at pool creation
pub const CACHE_MAX_SIZE: u32 = 512;

/// Default flush threshold is `size * NUM / DEN` (1.5x)
/// [PERF] Leaves room to absorb a burst of puts before touching the store
pub const CACHE_FLUSH_THRESHOLD_NUM: u32 = 3;
pub const CACHE_FLUSH_THRESHOLD_DEN: u32 = 2;

// =============================================================================
// OBJECT COOKIES
// =============================================================================

/// Written into every object header at populate time
pub const HEADER_COOKIE: u64 = 0xbadb_adba_dadd_2e55;

/// Written into every object trailer at populate time
pub const TRAILER_COOKIE: u64 = 0xadd2_e55b_adba_dbad;

// =============================================================================
// DEFAULTS
// =============================================================================

/// Backing store policy used when a pool config names none
pub const DEFAULT_POLICY: &str = "ring_mp_mc";
