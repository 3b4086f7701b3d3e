/*!
 * Per-Core Pool Statistics
 * Relaxed atomic counters updated on every get/put
 */

use super::types::CoreStatsSnapshot;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one core slot
///
/// # Performance
/// - Cache-line aligned so cores never share a counter line
/// - Relaxed ordering; snapshots may be mutually inconsistent under load
#[repr(C, align(64))]
#[derive(Debug, Default)]
pub(crate) struct CoreStats {
    put_bulk: AtomicU64,
    put_objs: AtomicU64,
    get_success_bulk: AtomicU64,
    get_success_objs: AtomicU64,
    get_fail_bulk: AtomicU64,
    get_fail_objs: AtomicU64,
}

impl CoreStats {
    /// Count a completed release; failed releases are not recorded
    #[inline(always)]
    pub fn record_put(&self, n: usize) {
        self.put_bulk.fetch_add(1, Ordering::Relaxed);
        self.put_objs.fetch_add(n as u64, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn record_get(&self, n: usize, success: bool) {
        if success {
            self.get_success_bulk.fetch_add(1, Ordering::Relaxed);
            self.get_success_objs.fetch_add(n as u64, Ordering::Relaxed);
        } else {
            self.get_fail_bulk.fetch_add(1, Ordering::Relaxed);
            self.get_fail_objs.fetch_add(n as u64, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> CoreStatsSnapshot {
        CoreStatsSnapshot {
            put_bulk: self.put_bulk.load(Ordering::Relaxed),
            put_objs: self.put_objs.load(Ordering::Relaxed),
            get_success_bulk: self.get_success_bulk.load(Ordering::Relaxed),
            get_success_objs: self.get_success_objs.load(Ordering::Relaxed),
            get_fail_bulk: self.get_fail_bulk.load(Ordering::Relaxed),
            get_fail_objs: self.get_fail_objs.load(Ordering::Relaxed),
        }
    }
}
