/*!
 * Error Types
 * Centralized error handling with thiserror and miette
 */

use miette::Diagnostic;
use thiserror::Error;

/// Ring operation result
pub type RingResult<T> = Result<T, RingError>;

/// Pool operation result
pub type PoolResult<T> = Result<T, PoolError>;

/// Ring errors
///
/// `NoSpace` and `NoEntries` are routine outcomes on a saturated ring and
/// carry only plain integers so they stay cheap to build and return.
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum RingError {
    #[error("Ring full: requested {requested} slots, {available} free")]
    #[diagnostic(
        code(ring::no_space),
        help("Bulk enqueue is all-or-nothing. Retry later or use a burst enqueue.")
    )]
    NoSpace { requested: u32, available: u32 },

    #[error("Ring short: requested {requested} entries, {available} available")]
    #[diagnostic(
        code(ring::no_entries),
        help("Bulk dequeue is all-or-nothing. Retry later or use a burst dequeue.")
    )]
    NoEntries { requested: u32, available: u32 },

    #[error("Invalid ring size {0}")]
    #[diagnostic(
        code(ring::invalid_size),
        help("Ring size must be a non-zero power of two no larger than 2^30.")
    )]
    InvalidSize(u32),

    #[error("Name too long: {0}")]
    #[diagnostic(code(ring::name_too_long), help("Names are limited to 31 bytes."))]
    NameTooLong(String),

    #[error("Ring {0} already exists")]
    #[diagnostic(code(ring::already_exists), help("Ring names must be unique per registry."))]
    AlreadyExists(String),
}

/// Pool errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum PoolError {
    #[error("Pool exhausted: requested {requested} objects, {available} available")]
    #[diagnostic(
        code(pool::no_buffers),
        help("All objects are held by callers or other cores' caches. Release objects or retry.")
    )]
    NoBuffers { requested: u32, available: u32 },

    #[error("Backing store full: cannot store {requested} objects")]
    #[diagnostic(
        code(pool::no_space),
        help("More objects were released than the pool holds. Check for foreign or double releases.")
    )]
    NoSpace { requested: u32 },

    #[error("Invalid parameter: {0}")]
    #[diagnostic(code(pool::invalid_param))]
    InvalidParam(String),

    #[error("Invalid cache size {size} (flush threshold {flush_threshold}, pool size {pool_size})")]
    #[diagnostic(
        code(pool::invalid_cache_size),
        help("Cache size must be <= 512 and <= pool size; flush threshold must be >= cache size.")
    )]
    InvalidCacheSize {
        size: u32,
        flush_threshold: u32,
        pool_size: u32,
    },

    #[error("Unknown backing store policy: {0}")]
    #[diagnostic(
        code(pool::unknown_policy),
        help("Register the policy before creating the pool, or use ring_mp_mc / stack.")
    )]
    UnknownPolicy(String),

    #[error("Object constructor required but not provided")]
    #[diagnostic(code(pool::missing_constructor))]
    MissingConstructor,

    #[error("Memory allocation failed: {size} bytes aligned to {align}")]
    #[diagnostic(code(pool::allocation_failed), help("System may be low on memory."))]
    AllocationFailed { size: usize, align: usize },

    #[error("Core id {0} out of range")]
    #[diagnostic(code(pool::core_out_of_range), help("Core ids must be below MAX_CORES (128)."))]
    CoreOutOfRange(u32),

    #[error("Core {0} cache slot already claimed")]
    #[diagnostic(
        code(pool::core_busy),
        help("Each core id may be attached by one thread at a time. Drop the previous handle first.")
    )]
    CoreBusy(u32),

    #[error("Pool {0} already exists")]
    #[diagnostic(code(pool::already_exists))]
    AlreadyExists(String),

    #[error("Not found: {0}")]
    #[diagnostic(code(pool::not_found))]
    NotFound(String),

    #[error("Populate placed {populated} of {expected} objects")]
    #[diagnostic(
        code(pool::incomplete_populate),
        help("The memory provider returned less memory than required.")
    )]
    IncompletePopulate { expected: u32, populated: u32 },

    #[error("Audit failed: {0}")]
    #[diagnostic(code(pool::audit_failed), help("An object header or trailer was overwritten."))]
    AuditFailed(String),

    #[error("Ring error: {0}")]
    #[diagnostic(transparent)]
    Ring(#[from] RingError),
}

impl PoolError {
    /// True for the routine, recoverable capacity outcomes
    #[inline]
    pub fn is_capacity(&self) -> bool {
        matches!(
            self,
            PoolError::NoBuffers { .. }
                | PoolError::NoSpace { .. }
                | PoolError::Ring(RingError::NoSpace { .. } | RingError::NoEntries { .. })
        )
    }
}

impl RingError {
    /// True for the routine, recoverable capacity outcomes
    #[inline]
    pub fn is_capacity(&self) -> bool {
        matches!(self, RingError::NoSpace { .. } | RingError::NoEntries { .. })
    }
}
