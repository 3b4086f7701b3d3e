/*!
 * Policy Registry
 * Named table of backing store policies
 */

use super::ring_store::RingPolicy;
use super::stack_store::StackPolicy;
use super::traits::StorePolicy;
use crate::core::errors::{PoolError, PoolResult};
use crate::core::types::Name;
use ahash::RandomState;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

/// Backing store policies selectable by name at pool creation
///
/// A new registry holds `"ring_mp_mc"` (the default) and `"stack"`.
pub struct PolicyRegistry {
    policies: DashMap<Name, Arc<dyn StorePolicy>, RandomState>,
}

impl PolicyRegistry {
    pub fn new() -> Self {
        let registry = Self::empty();
        registry.insert(Arc::new(RingPolicy::mp_mc()));
        registry.insert(Arc::new(StackPolicy));
        registry
    }

    /// A registry with no policies at all
    pub fn empty() -> Self {
        Self {
            policies: DashMap::with_hasher(RandomState::new()),
        }
    }

    fn insert(&self, policy: Arc<dyn StorePolicy>) {
        self.policies.insert(Name::from(policy.name()), policy);
    }

    /// Add a policy; names must be unique
    pub fn register(&self, policy: Arc<dyn StorePolicy>) -> PoolResult<()> {
        match self.policies.entry(Name::from(policy.name())) {
            Entry::Occupied(entry) => Err(PoolError::AlreadyExists(entry.key().to_string())),
            Entry::Vacant(entry) => {
                debug!(policy = %entry.key(), "Backing store policy registered");
                entry.insert(policy);
                Ok(())
            }
        }
    }

    /// Look up a policy by name
    pub fn get(&self, name: &str) -> PoolResult<Arc<dyn StorePolicy>> {
        self.policies
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| PoolError::UnknownPolicy(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.policies.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.policies.iter().map(|e| e.key().to_string()).collect();
        names.sort();
        names
    }
}

impl Default for PolicyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PolicyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyRegistry")
            .field("policies", &self.names())
            .finish()
    }
}
