//! # Snapshot & Reward Projection
//!
//! Immutable read-only views of kernel state, plus the scalar reward derived
//! from them. A snapshot is a pure projection: serializing it and recomputing
//! the reward later yields the same value the kernel saw.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::events::EventKind;

/// The last non-stale event the kernel handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LastEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub station: usize,
}

/// Read-only view of one station.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationView {
    /// Encoded status: idle=0, working=1, blocked=2, down=3.
    pub status: u8,
    /// Remaining service time, zero unless working.
    pub remaining: f64,
    pub util_ema: f64,
    pub starved: bool,
    pub blocked: bool,
    pub down: bool,
    pub repairing: bool,
    /// Remaining repair time, zero unless down with a worker assigned.
    pub repair_remaining: f64,
}

/// Full line state at one decision boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    /// Absolute simulated time.
    pub t: f64,
    /// Start of the decision window this snapshot closes.
    pub t_start: f64,
    /// End of the decision window (equals `t`).
    pub t_end: f64,
    /// Last handled event, if any event has been handled yet.
    pub event: Option<LastEvent>,
    /// Buffer occupancy keyed by adjacent station pair (`b12`, `b23`, ...).
    pub buffers: BTreeMap<String, usize>,
    /// One record per station, in line order.
    pub stations: Vec<StationView>,
    /// Jobs departing the last station since the previous decision.
    pub throughput: usize,
    /// Units inside the line: buffer sum + working + blocked stations.
    pub wip: usize,
    pub blocked: usize,
    pub starved: usize,
    pub down: usize,
    pub workers_available: usize,
    pub workers_total: usize,
    /// Mean of the configured per-station service times.
    pub avg_processing_time: f64,
    /// Reciprocal of `avg_processing_time` (zero when undefined).
    pub avg_processing_speed: f64,
}

/// End-of-run (or any-time) aggregate statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_jobs: usize,
    pub jobs_completed: usize,
    /// Units lost to machine failures at non-first stations.
    pub jobs_scrapped: usize,
    /// Total simulated time elapsed.
    pub makespan: f64,
    /// Mean WIP sampled after every handled event.
    pub avg_wip: f64,
    /// Mean utilization EMA across stations.
    pub avg_util: f64,
    /// Completed jobs per unit of simulated time.
    pub throughput_rate: f64,
    pub down_stations: usize,
    pub workers_available: usize,
    pub workers_total: usize,
}

/// Scalar reward for one decision window, a pure function of the snapshot:
/// throughput minus WIP and congestion penalties.
pub fn compute_reward(snapshot: &Snapshot) -> f64 {
    snapshot.throughput as f64
        - 0.05 * snapshot.wip as f64
        - 0.1 * (snapshot.blocked + snapshot.starved) as f64
}
