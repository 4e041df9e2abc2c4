/*!
 * Monitoring
 * Structured tracing for pools and arenas
 */

mod tracer;

pub use tracer::{init_tracing, span_maintenance, MaintenanceSpan};
