/*!
 * Tracing
 * Structured logging setup and spans for pool maintenance work
 *
 * Features:
 * - Env-filtered subscriber with optional JSON output
 * - Timed spans around prefill and trim, tagged with a correlation ID
 */

use std::time::Instant;
use tracing::{debug, info, span, warn, Level};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};
use uuid::Uuid;

/// Maintenance taking longer than this is reported as slow
const SLOW_MAINTENANCE_MS: u128 = 100;

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - POOL_TRACE_JSON: Enable JSON output (default: false)
///
/// Does nothing if a global subscriber is already installed.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var("POOL_TRACE_JSON")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
            .is_ok()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()
            .is_ok()
    };

    if installed {
        info!(json = use_json, "Pool tracing initialized");
    }
}

/// Timed span around an arena or pool maintenance pass
pub struct MaintenanceSpan {
    span: tracing::Span,
    start: Instant,
    trace_id: String,
}

impl MaintenanceSpan {
    pub fn new(operation: &'static str) -> Self {
        let trace_id = Uuid::new_v4().to_string();
        let span = span!(
            Level::DEBUG,
            "maintenance",
            trace_id = %trace_id,
            operation,
            buffers = tracing::field::Empty,
            bytes = tracing::field::Empty,
            duration_us = tracing::field::Empty,
        );

        Self {
            span,
            start: Instant::now(),
            trace_id,
        }
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub fn record_buffers(&self, count: usize) {
        self.span.record("buffers", count);
    }

    pub fn record_bytes(&self, bytes: usize) {
        self.span.record("bytes", bytes);
    }

    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}

impl Drop for MaintenanceSpan {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        self.span.record("duration_us", duration.as_micros());
        let _entered = self.span.enter();

        if duration.as_millis() > SLOW_MAINTENANCE_MS {
            warn!(
                trace_id = %self.trace_id,
                duration_ms = duration.as_millis(),
                slow = true,
                "slow maintenance detected"
            );
        } else {
            debug!(trace_id = %self.trace_id, "maintenance completed");
        }
    }
}

/// Start a maintenance span
#[inline]
pub fn span_maintenance(operation: &'static str) -> MaintenanceSpan {
    MaintenanceSpan::new(operation)
}
