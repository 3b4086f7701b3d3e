/*!
 * Runtime Configuration
 *
 * Settings for the workload binary, read from an optional JSON file and
 * overridden by environment variables
 */

use crate::core::errors::{PoolError, PoolResult};
use crate::core::limits::MAX_CORES;
use crate::mempool::PoolConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Workload settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub pool: PoolConfig,
    /// Worker threads, each bound to its own core id
    #[serde(default = "default_workers")]
    pub workers: u32,
    /// Get/put rounds per worker
    #[serde(default = "default_iterations")]
    pub iterations: u64,
    /// Objects per get/put
    #[serde(default = "default_burst")]
    pub burst: u32,
    /// Pin worker `i` to CPU `i` (Linux only)
    #[serde(default)]
    pub pin: bool,
}

fn default_workers() -> u32 {
    4
}

fn default_iterations() -> u64 {
    100_000
}

fn default_burst() -> u32 {
    32
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            pool: PoolConfig::new("corepool_bench", 8192, 2048).with_cache(256),
            workers: default_workers(),
            iterations: default_iterations(),
            burst: default_burst(),
            pin: false,
        }
    }
}

fn env_parse<T: FromStr>(key: &str) -> PoolResult<Option<T>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| PoolError::InvalidParam(format!("{}: cannot parse {:?}", key, raw))),
        Err(_) => Ok(None),
    }
}

impl RuntimeConfig {
    /// Load from `COREPOOL_CONFIG` (if set) and apply environment overrides
    ///
    /// Environment variables:
    /// - COREPOOL_CONFIG: JSON file holding a full `RuntimeConfig`
    /// - COREPOOL_WORKERS, COREPOOL_ITERATIONS, COREPOOL_BURST, COREPOOL_PIN
    /// - COREPOOL_OBJECTS, COREPOOL_ELT_SIZE, COREPOOL_CACHE, COREPOOL_POLICY
    pub fn from_env() -> PoolResult<Self> {
        let mut config = match std::env::var("COREPOOL_CONFIG") {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };

        if let Some(workers) = env_parse("COREPOOL_WORKERS")? {
            config.workers = workers;
        }
        if let Some(iterations) = env_parse("COREPOOL_ITERATIONS")? {
            config.iterations = iterations;
        }
        if let Some(burst) = env_parse("COREPOOL_BURST")? {
            config.burst = burst;
        }
        if let Some(pin) = env_parse("COREPOOL_PIN")? {
            config.pin = pin;
        }
        if let Some(size) = env_parse("COREPOOL_OBJECTS")? {
            config.pool.size = size;
        }
        if let Some(elt_size) = env_parse("COREPOOL_ELT_SIZE")? {
            config.pool.elt_size = elt_size;
        }
        if let Some(cache) = env_parse("COREPOOL_CACHE")? {
            config.pool.cache.size = cache;
        }
        if let Ok(policy) = std::env::var("COREPOOL_POLICY") {
            config.pool.policy = policy;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> PoolResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| PoolError::InvalidParam(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> PoolResult<Self> {
        serde_json::from_str(raw).map_err(|e| PoolError::InvalidParam(format!("config: {}", e)))
    }

    pub fn validate(&self) -> PoolResult<()> {
        if self.workers == 0 || self.workers as usize > MAX_CORES {
            return Err(PoolError::InvalidParam(format!(
                "workers must be in [1, {}]",
                MAX_CORES
            )));
        }
        if self.burst == 0 || self.burst > self.pool.size {
            return Err(PoolError::InvalidParam(format!(
                "burst must be in [1, {}]",
                self.pool.size
            )));
        }
        self.pool.validate()
    }
}
