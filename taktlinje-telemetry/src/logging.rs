//! ## taktlinje-telemetry::logging
//! **Structured logging with `tracing`**
//!
//! The kernel emits `tracing` events at decision boundaries and event
//! handlers; this module only installs the subscriber.

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins when set; otherwise `default_filter` applies. Safe to call
/// more than once: later calls are no-ops.
pub fn init(default_filter: &str) {
    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_span_events(FmtSpan::ENTER)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn init_is_idempotent() {
        init("info");
        init("debug");
    }

    #[traced_test]
    #[test]
    fn events_are_captured() {
        tracing::info!("decision boundary reached");
        assert!(logs_contain("decision boundary reached"));
    }
}
