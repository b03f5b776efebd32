//! # Kernel Events
//!
//! The three event kinds the queue schedules, ordered by `(time, sequence)`.
//! The sequence counter breaks time ties FIFO so replay with the same seed
//! visits events in exactly the same order.

use std::cmp::Ordering;

use serde::Serialize;

pub mod queue;

pub use queue::{EventQueue, HeapQueue, OrderedQueue};

/// What a scheduled event does when it reaches the head of the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    ServiceComplete,
    MachineFailure,
    RepairComplete,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::ServiceComplete => "service_complete",
            EventKind::MachineFailure => "machine_failure",
            EventKind::RepairComplete => "repair_complete",
        }
    }
}

/// A scheduled event. Events carry no payload beyond the target station;
/// handlers validate against current station state on pop, so speculative
/// events (failure during service) can simply go stale instead of being
/// cancelled.
#[derive(Debug, Clone, Copy)]
pub struct Event {
    /// Absolute simulated time at which the event fires.
    pub t: f64,
    /// Monotonic insertion sequence, assigned at schedule time.
    pub seq: u64,
    pub kind: EventKind,
    /// Index of the station the event targets.
    pub station: usize,
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.t.total_cmp(&other.t) == Ordering::Equal && self.seq == other.seq
    }
}

impl Eq for Event {}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        self.t.total_cmp(&other.t).then(self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn earlier_time_wins() {
        let a = Event {
            t: 1.0,
            seq: 5,
            kind: EventKind::ServiceComplete,
            station: 0,
        };
        let b = Event {
            t: 2.0,
            seq: 0,
            kind: EventKind::MachineFailure,
            station: 1,
        };
        assert!(a < b);
    }

    #[test]
    fn sequence_breaks_time_ties() {
        let a = Event {
            t: 1.0,
            seq: 0,
            kind: EventKind::ServiceComplete,
            station: 0,
        };
        let b = Event {
            t: 1.0,
            seq: 1,
            kind: EventKind::RepairComplete,
            station: 0,
        };
        assert!(a < b);
    }
}
