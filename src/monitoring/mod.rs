/*!
 * Monitoring
 * Tracing setup for the library and the workload binary
 */

mod tracer;

pub use tracer::{init_tracing, span_worker, WorkerSpan};
