//! ## taktlinje-telemetry::metrics
//! **Prometheus collectors for kernel activity**
//!
//! Each kernel instance owns its own recorder and registry, so concurrent
//! simulations never share collectors.

use prometheus::{Counter, Histogram, HistogramOpts, Registry};

/// Counters and histograms the kernel updates while processing events.
#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: Registry,
    pub events_handled: Counter,
    pub events_stale: Counter,
    pub machine_failures: Counter,
    pub repairs_completed: Counter,
    pub jobs_completed: Counter,
    pub jobs_scrapped: Counter,
    pub service_duration: Histogram,
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRecorder {
    pub fn new() -> Self {
        let registry = Registry::new();
        let events_handled =
            Counter::new("taktlinje_events_handled_total", "Events applied to line state").unwrap();
        let events_stale = Counter::new(
            "taktlinje_events_stale_total",
            "Popped events discarded because preconditions no longer held",
        )
        .unwrap();
        let machine_failures =
            Counter::new("taktlinje_machine_failures_total", "Machine failures handled").unwrap();
        let repairs_completed =
            Counter::new("taktlinje_repairs_completed_total", "Repairs completed").unwrap();
        let jobs_completed = Counter::new(
            "taktlinje_jobs_completed_total",
            "Jobs departing the last station",
        )
        .unwrap();
        let jobs_scrapped = Counter::new(
            "taktlinje_jobs_scrapped_total",
            "Units lost to machine failures mid-service",
        )
        .unwrap();
        let service_duration = Histogram::with_opts(
            HistogramOpts::new(
                "taktlinje_service_duration",
                "Sampled service durations in simulated time units",
            )
            .buckets(vec![0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]),
        )
        .unwrap();

        registry.register(Box::new(events_handled.clone())).unwrap();
        registry.register(Box::new(events_stale.clone())).unwrap();
        registry
            .register(Box::new(machine_failures.clone()))
            .unwrap();
        registry
            .register(Box::new(repairs_completed.clone()))
            .unwrap();
        registry.register(Box::new(jobs_completed.clone())).unwrap();
        registry.register(Box::new(jobs_scrapped.clone())).unwrap();
        registry
            .register(Box::new(service_duration.clone()))
            .unwrap();

        Self {
            registry,
            events_handled,
            events_stale,
            machine_failures,
            repairs_completed,
            jobs_completed,
            jobs_scrapped,
            service_duration,
        }
    }

    /// Encode all registered collectors in the prometheus text format.
    pub fn gather_metrics(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer).unwrap_or_default())
    }
}
