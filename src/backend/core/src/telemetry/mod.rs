//! Telemetry: structured logging and operation metrics.
//!
//! - **Logging**: JSON/pretty logging via `tracing-subscriber`, with
//!   connection-URL credential redaction
//! - **Metrics**: operation counters and latency histograms via `metrics`
//!
//! # Example
//!
//! ```rust,no_run
//! use pgrbac_core::telemetry::{init_logging, LoggingConfig};
//!
//! init_logging(&LoggingConfig::default(), "production").expect("Failed to initialize logging");
//! ```

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, redact_url, LogFormat, LoggingConfig};
pub use metrics::{describe_metrics, OperationMetrics, Outcome};
