/*!
 * Pool Configuration
 *
 * Creation parameters for a pool, loadable from JSON
 */

use super::types::PoolFlags;
use crate::core::errors::{PoolError, PoolResult};
use crate::core::limits::{
    CACHE_FLUSH_THRESHOLD_DEN, CACHE_FLUSH_THRESHOLD_NUM, CACHE_MAX_SIZE, DEFAULT_POLICY,
    RING_SIZE_MAX,
};
use crate::core::types::{SocketId, SOCKET_ID_ANY};
use crate::ring::check_name;
use serde::{Deserialize, Serialize};

/// Per-core cache sizing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Refill target in objects; 0 disables per-core caching
    #[serde(default)]
    pub size: u32,
    /// Cache length above which a release flushes to the backing store
    /// (defaults to 1.5x `size`)
    #[serde(default)]
    pub flush_threshold: Option<u32>,
}

impl CacheConfig {
    pub const fn disabled() -> Self {
        Self {
            size: 0,
            flush_threshold: None,
        }
    }

    pub const fn with_size(size: u32) -> Self {
        Self {
            size,
            flush_threshold: None,
        }
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.size > 0
    }

    /// Effective flush threshold
    pub fn flush_threshold(&self) -> u32 {
        if self.size == 0 {
            return 0;
        }
        self.flush_threshold
            .unwrap_or(self.size * CACHE_FLUSH_THRESHOLD_NUM / CACHE_FLUSH_THRESHOLD_DEN)
    }

    /// Objects a cache must be able to hold at once
    pub(crate) fn storage_len(&self) -> usize {
        (self.size as usize * 2).max(self.flush_threshold() as usize)
    }

    fn validate(&self, pool_size: u32) -> PoolResult<()> {
        let flush_threshold = self.flush_threshold();
        if self.size > CACHE_MAX_SIZE
            || self.size > pool_size
            || flush_threshold < self.size
            || flush_threshold > pool_size.max(self.size * 2)
        {
            return Err(PoolError::InvalidCacheSize {
                size: self.size,
                flush_threshold,
                pool_size,
            });
        }
        Ok(())
    }
}

fn default_policy() -> String {
    DEFAULT_POLICY.to_string()
}

fn default_socket() -> SocketId {
    SOCKET_ID_ANY
}

/// Pool creation parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    pub name: String,
    /// Number of objects
    pub size: u32,
    /// Usable bytes per object
    pub elt_size: usize,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default = "default_socket")]
    pub socket_id: SocketId,
    /// Backing store policy name
    #[serde(default = "default_policy")]
    pub policy: String,
    #[serde(default)]
    pub flags: PoolFlags,
    /// Reject populate calls that supply no object constructor
    #[serde(default)]
    pub requires_ctor: bool,
}

impl PoolConfig {
    pub fn new(name: impl Into<String>, size: u32, elt_size: usize) -> Self {
        Self {
            name: name.into(),
            size,
            elt_size,
            cache: CacheConfig::disabled(),
            socket_id: SOCKET_ID_ANY,
            policy: default_policy(),
            flags: PoolFlags::empty(),
            requires_ctor: false,
        }
    }

    pub fn with_cache(mut self, size: u32) -> Self {
        self.cache.size = size;
        self
    }

    pub fn with_flush_threshold(mut self, threshold: u32) -> Self {
        self.cache.flush_threshold = Some(threshold);
        self
    }

    pub fn with_socket(mut self, socket_id: SocketId) -> Self {
        self.socket_id = socket_id;
        self
    }

    pub fn with_policy(mut self, policy: impl Into<String>) -> Self {
        self.policy = policy.into();
        self
    }

    pub fn with_flags(mut self, flags: PoolFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_ctor_required(mut self, required: bool) -> Self {
        self.requires_ctor = required;
        self
    }

    /// Check every parameter; nothing is allocated here
    pub fn validate(&self) -> PoolResult<()> {
        check_name(&self.name)?;
        if self.size == 0 || self.size > RING_SIZE_MAX {
            return Err(PoolError::InvalidParam(format!(
                "pool size {} out of range [1, {}]",
                self.size, RING_SIZE_MAX
            )));
        }
        if self.elt_size == 0 {
            return Err(PoolError::InvalidParam("element size must be non-zero".to_string()));
        }
        self.cache.validate(self.size)
    }
}
