/*!
 * Structured Tracing
 * Subscriber setup and per-worker spans using the tracing crate
 *
 * Pool and ring fast paths never log; spans here wrap whole workloads.
 */

use std::time::{Duration, Instant};
use tracing::{debug, info, span, Level};
use tracing_subscriber::{fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - COREPOOL_TRACE_JSON: Enable JSON output (default: false)
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var("COREPOOL_TRACE_JSON")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_line_number(true)
                    .with_file(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .init();
        info!("Structured tracing initialized with JSON output");
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_line_number(true)
                    .with_file(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .init();
        info!("Structured tracing initialized");
    }
}

/// Span covering one worker's get/put loop
pub struct WorkerSpan {
    span: tracing::Span,
    start: Instant,
    core_id: u32,
    ops: u64,
    failures: u64,
}

impl WorkerSpan {
    pub fn new(pool: &str, core_id: u32) -> Self {
        let span = span!(
            Level::INFO,
            "worker",
            pool = pool,
            core_id = core_id,
            ops = tracing::field::Empty,
            failures = tracing::field::Empty,
            duration_ms = tracing::field::Empty,
        );
        {
            let _entered = span.enter();
            debug!(core_id, "worker started");
        }
        Self {
            span,
            start: Instant::now(),
            core_id,
            ops: 0,
            failures: 0,
        }
    }

    /// Count objects moved
    #[inline]
    pub fn record_ops(&mut self, n: u64) {
        self.ops += n;
    }

    /// Count capacity failures
    #[inline]
    pub fn record_failure(&mut self) {
        self.failures += 1;
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}

impl Drop for WorkerSpan {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        self.span.record("ops", self.ops);
        self.span.record("failures", self.failures);
        self.span.record("duration_ms", duration.as_millis() as u64);

        let _entered = self.span.enter();
        let mops = self.ops as f64 / duration.as_secs_f64().max(f64::EPSILON) / 1e6;
        info!(
            core_id = self.core_id,
            ops = self.ops,
            failures = self.failures,
            mops = %format_args!("{:.2}", mops),
            "worker finished"
        );
    }
}

pub fn span_worker(pool: &str, core_id: u32) -> WorkerSpan {
    WorkerSpan::new(pool, core_id)
}
