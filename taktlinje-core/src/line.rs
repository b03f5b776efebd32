//! # Line State
//!
//! Per-station status machine records. Stations and buffers are plain
//! index-addressed arrays owned by the kernel; buffer `i` sits between
//! stations `i` and `i + 1`.

/// Mutually exclusive station states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationStatus {
    /// No unit in service; may be starved for input.
    Idle,
    /// A unit is in service; `end_time` is set.
    Working,
    /// A finished unit is waiting for downstream buffer space.
    Blocked,
    /// Failed; waiting for or undergoing repair.
    Down,
}

impl StationStatus {
    /// Snapshot encoding: idle=0, working=1, blocked=2, down=3.
    pub fn code(self) -> u8 {
        match self {
            StationStatus::Idle => 0,
            StationStatus::Working => 1,
            StationStatus::Blocked => 2,
            StationStatus::Down => 3,
        }
    }
}

/// One station's state record.
///
/// Invariants the kernel maintains:
/// - `end_time` is set iff `status == Working`
/// - `has_finished_part` is true iff `status == Blocked`
/// - `repair_eta` is set iff `status == Down` and `repairing`
#[derive(Debug, Clone)]
pub struct Station {
    pub status: StationStatus,
    pub starved: bool,
    pub end_time: Option<f64>,
    pub util_ema: f64,
    pub has_finished_part: bool,
    pub job_id: Option<usize>,
    pub repairing: bool,
    pub repair_eta: Option<f64>,
}

impl Station {
    pub fn new() -> Self {
        Self {
            status: StationStatus::Idle,
            starved: false,
            end_time: None,
            util_ema: 0.0,
            has_finished_part: false,
            job_id: None,
            repairing: false,
            repair_eta: None,
        }
    }

    /// Continuous-time EMA update over one elapsed interval: `decay` is
    /// `(1 - alpha)^dt`, already computed once per advance for all stations.
    pub fn decay_util(&mut self, decay: f64) {
        let busy = if self.status == StationStatus::Working {
            1.0
        } else {
            0.0
        };
        self.util_ema = self.util_ema * decay + (1.0 - decay) * busy;
    }

    /// Drop all service and repair bookkeeping. Used when a failure preempts
    /// service and when a repair finishes.
    pub fn clear_transients(&mut self) {
        self.starved = false;
        self.has_finished_part = false;
        self.end_time = None;
        self.repairing = false;
        self.repair_eta = None;
    }
}

impl Default for Station {
    fn default() -> Self {
        Self::new()
    }
}
