/*!
 * corepool - Workload Driver
 *
 * Creates a pool from the runtime configuration, runs one worker thread per
 * core id doing burst get/put rounds through its per-core cache, then audits
 * the pool and prints its state as JSON.
 */

use anyhow::{Context, Result};
use corepool::monitoring::span_worker;
use corepool::{init_tracing, ObjPtr, Pool, Registry, RuntimeConfig};
use std::hint;
use std::time::Instant;
use tracing::{info, warn};

#[cfg(target_os = "linux")]
fn pin_to_cpu(cpu: usize) {
    use nix::sched::{sched_setaffinity, CpuSet};
    use nix::unistd::Pid;

    let mut set = CpuSet::new();
    let result = set
        .set(cpu)
        .and_then(|_| sched_setaffinity(Pid::from_raw(0), &set));
    if let Err(e) = result {
        warn!(cpu, error = %e, "Could not pin worker");
    }
}

#[cfg(not(target_os = "linux"))]
fn pin_to_cpu(cpu: usize) {
    warn!(cpu, "Worker pinning is only supported on Linux");
}

fn run_worker(pool: &Pool, core_id: u32, config: &RuntimeConfig) -> Result<u64> {
    if config.pin {
        pin_to_cpu(core_id as usize);
    }

    let mut handle = pool
        .lcore(core_id)
        .with_context(|| format!("claiming core {}", core_id))?;
    let mut span = span_worker(pool.name(), core_id);
    let mut objs = vec![ObjPtr::DANGLING; config.burst as usize];

    for _ in 0..config.iterations {
        if handle.get_bulk(&mut objs).is_err() {
            span.record_failure();
            hint::spin_loop();
            continue;
        }
        handle
            .put_bulk(&objs)
            .context("releasing objects to the pool")?;
        span.record_ops(objs.len() as u64 * 2);
    }

    handle.flush().context("flushing core cache")?;
    let elapsed = span.elapsed();
    drop(span);
    Ok(elapsed.as_nanos() as u64)
}

fn main() -> Result<()> {
    init_tracing();

    let config = RuntimeConfig::from_env().context("loading runtime configuration")?;
    info!(
        pool = %config.pool.name,
        objects = config.pool.size,
        elt_size = config.pool.elt_size,
        cache = config.pool.cache.size,
        policy = %config.pool.policy,
        workers = config.workers,
        iterations = config.iterations,
        burst = config.burst,
        "corepool starting"
    );

    let registry = Registry::new();
    let pool = registry
        .pool_create(&config.pool, None)
        .context("creating pool")?;

    let start = Instant::now();
    let results: Vec<Result<u64>> = std::thread::scope(|scope| {
        let workers: Vec<_> = (0..config.workers)
            .map(|core_id| {
                let pool = &pool;
                let config = &config;
                std::thread::Builder::new()
                    .name(format!("worker-{}", core_id))
                    .spawn_scoped(scope, move || run_worker(pool, core_id, config))
            })
            .collect();

        workers
            .into_iter()
            .map(|spawned| match spawned {
                Ok(handle) => handle
                    .join()
                    .unwrap_or_else(|_| Err(anyhow::anyhow!("worker panicked"))),
                Err(e) => Err(e.into()),
            })
            .collect()
    });
    let wall = start.elapsed();

    for result in results {
        result?;
    }

    let stats = pool.stats();
    let moved = stats.total.get_success_objs + stats.total.put_objs;
    info!(
        wall_ms = wall.as_millis() as u64,
        objects_moved = moved,
        mops = %format_args!("{:.2}", moved as f64 / wall.as_secs_f64().max(f64::EPSILON) / 1e6),
        get_failures = stats.total.get_fail_bulk,
        "Workload finished"
    );

    pool.audit().context("auditing pool")?;
    if pool.in_use_count() != 0 {
        warn!(in_use = pool.in_use_count(), "Objects still checked out after workload");
    }

    println!(
        "{}",
        serde_json::to_string_pretty(&pool.info()).context("serializing pool info")?
    );
    Ok(())
}
