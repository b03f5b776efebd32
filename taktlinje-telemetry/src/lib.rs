//! # taktlinje-telemetry
//!
//! Observability layer for the simulator: `tracing` subscriber setup and
//! per-kernel prometheus collectors.

pub mod logging;
pub mod metrics;

pub use metrics::MetricsRecorder;
