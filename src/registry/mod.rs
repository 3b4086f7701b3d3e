/*!
 * Registry
 * Named rings and pools, the policy table, and the memory provider
 */

use crate::core::errors::{PoolError, PoolResult, RingError};
use crate::core::types::{Name, ObjPtr, SocketId};
use crate::memory::{HeapProvider, MemoryProvider};
use crate::mempool::{ObjCtor, PolicyRegistry, Pool, PoolConfig, PoolInfo, StorePolicy};
use crate::ring::{Ring, RingFlags, RingInfo};
use ahash::RandomState;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Ring of object handles as stored in the registry
pub type ObjRing = Ring<ObjPtr>;

/// Serializable view of everything registered
#[derive(Debug, Clone, Serialize)]
pub struct RegistryDump {
    pub policies: Vec<String>,
    pub rings: Vec<RingInfo>,
    pub pools: Vec<PoolInfo>,
}

/// Name-addressed rings and pools
///
/// Names are unique per kind. Lookups hand out `Arc`s, so freeing a name
/// only drops the registry's reference; the object lives until the last
/// holder lets go.
pub struct Registry {
    policies: PolicyRegistry,
    provider: Arc<dyn MemoryProvider>,
    rings: DashMap<Name, Arc<ObjRing>, RandomState>,
    pools: DashMap<Name, Arc<Pool>, RandomState>,
}

impl Registry {
    /// Registry backed by heap memory with the default policies
    pub fn new() -> Self {
        Self::with_provider(Arc::new(HeapProvider::new()))
    }

    pub fn with_provider(provider: Arc<dyn MemoryProvider>) -> Self {
        Self {
            policies: PolicyRegistry::new(),
            provider,
            rings: DashMap::with_hasher(RandomState::new()),
            pools: DashMap::with_hasher(RandomState::new()),
        }
    }

    pub fn policies(&self) -> &PolicyRegistry {
        &self.policies
    }

    pub fn register_policy(&self, policy: Arc<dyn StorePolicy>) -> PoolResult<()> {
        self.policies.register(policy)
    }

    // =========================================================================
    // Rings
    // =========================================================================

    /// Create and register a multi-producer / multi-consumer ring
    pub fn ring_create(&self, name: &str, size: u32, socket_id: SocketId) -> PoolResult<Arc<ObjRing>> {
        // SAFETY: no single-thread flags
        unsafe { self.ring_create_with_flags(name, size, socket_id, RingFlags::empty()) }
    }

    /// Create and register a ring with explicit synchronization flags
    ///
    /// # Safety
    ///
    /// Same contract as [`Ring::with_flags`], extended to every holder of the
    /// returned `Arc` and of later lookups.
    pub unsafe fn ring_create_with_flags(
        &self,
        name: &str,
        size: u32,
        socket_id: SocketId,
        flags: RingFlags,
    ) -> PoolResult<Arc<ObjRing>> {
        match self.rings.entry(Name::from(name)) {
            Entry::Occupied(_) => Err(PoolError::Ring(RingError::AlreadyExists(name.to_string()))),
            Entry::Vacant(entry) => {
                let ring = Arc::new(Ring::with_flags(name, size, socket_id, flags)?);
                entry.insert(Arc::clone(&ring));
                info!(ring = name, size, socket_id, "Ring registered");
                Ok(ring)
            }
        }
    }

    pub fn ring_lookup(&self, name: &str) -> PoolResult<Arc<ObjRing>> {
        self.rings
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| PoolError::NotFound(name.to_string()))
    }

    /// Remove a ring from the registry
    pub fn ring_free(&self, name: &str) -> PoolResult<()> {
        self.rings
            .remove(name)
            .map(|_| info!(ring = name, "Ring freed"))
            .ok_or_else(|| PoolError::NotFound(name.to_string()))
    }

    // =========================================================================
    // Pools
    // =========================================================================

    /// Create, fully populate and register a pool
    ///
    /// Nothing is registered unless every step succeeds.
    pub fn pool_create(&self, config: &PoolConfig, ctor: ObjCtor<'_>) -> PoolResult<Arc<Pool>> {
        match self.pools.entry(Name::from(config.name.as_str())) {
            Entry::Occupied(_) => Err(PoolError::AlreadyExists(config.name.clone())),
            Entry::Vacant(entry) => {
                let pool = Arc::new(Pool::create(
                    config,
                    &self.policies,
                    self.provider.as_ref(),
                    ctor,
                )?);
                entry.insert(Arc::clone(&pool));
                info!(pool = %config.name, id = pool.id(), "Pool registered");
                Ok(pool)
            }
        }
    }

    pub fn pool_lookup(&self, name: &str) -> PoolResult<Arc<Pool>> {
        self.pools
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| PoolError::NotFound(name.to_string()))
    }

    /// Remove a pool from the registry
    pub fn pool_free(&self, name: &str) -> PoolResult<()> {
        self.pools
            .remove(name)
            .map(|_| info!(pool = name, "Pool freed"))
            .ok_or_else(|| PoolError::NotFound(name.to_string()))
    }

    /// Visit every registered pool
    pub fn pool_walk(&self, mut f: impl FnMut(&Pool)) {
        for entry in self.pools.iter() {
            f(entry.value());
        }
    }

    pub fn ring_count(&self) -> usize {
        self.rings.len()
    }

    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    /// Snapshot of every ring and pool, sorted by name
    pub fn dump(&self) -> RegistryDump {
        let mut rings: Vec<RingInfo> = self.rings.iter().map(|e| e.value().info()).collect();
        rings.sort_by(|a, b| a.name.cmp(&b.name));
        let mut pools: Vec<PoolInfo> = self.pools.iter().map(|e| e.value().info()).collect();
        pools.sort_by(|a, b| a.name.cmp(&b.name));

        RegistryDump {
            policies: self.policies.names(),
            rings,
            pools,
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
