//! Store operation metrics.
//!
//! Metrics are emitted through the `metrics` facade; the library installs no
//! exporter, so they are no-ops until the embedding application installs a
//! recorder.
//!
//! # Example
//!
//! ```rust,no_run
//! use pgrbac_core::telemetry::metrics::{OperationMetrics, Outcome};
//! use std::time::Duration;
//!
//! OperationMetrics::record("role_has_permission", "postgres", Outcome::Ok, Duration::from_millis(3));
//! ```

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::sync::Once;
use std::time::Duration;

/// Total store operations, labelled by operation, backend and outcome.
pub const OPERATIONS_TOTAL: &str = "pgrbac_operations_total";

/// Store operation latency in seconds, labelled by operation and backend.
pub const OPERATION_DURATION_SECONDS: &str = "pgrbac_operation_duration_seconds";

/// Total errors constructed, labelled by code, category, severity, retryable.
pub const ERRORS_TOTAL: &str = "pgrbac_errors_total";

static DESCRIBE: Once = Once::new();

/// Register metric descriptions with the installed recorder.
///
/// Safe to call more than once; only the first call has an effect.
pub fn describe_metrics() {
    DESCRIBE.call_once(|| {
        describe_counter!(OPERATIONS_TOTAL, "Total RBAC store operations");
        describe_histogram!(
            OPERATION_DURATION_SECONDS,
            metrics::Unit::Seconds,
            "RBAC store operation latency"
        );
        describe_counter!(ERRORS_TOTAL, "Total RBAC store errors");
    });
}

/// How an operation finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    Error,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
        }
    }
}

/// Operation counter and latency histogram.
pub struct OperationMetrics;

impl OperationMetrics {
    /// Record one finished operation.
    pub fn record(operation: &'static str, backend: &'static str, outcome: Outcome, elapsed: Duration) {
        counter!(
            OPERATIONS_TOTAL,
            "operation" => operation,
            "backend" => backend,
            "outcome" => outcome.as_str(),
        )
        .increment(1);

        histogram!(
            OPERATION_DURATION_SECONDS,
            "operation" => operation,
            "backend" => backend,
        )
        .record(elapsed.as_secs_f64());
    }
}
