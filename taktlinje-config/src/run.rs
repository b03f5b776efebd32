//! Run parameters: seeding, job count, and kernel backend selection.

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

/// Event queue backend behind the kernel's capability contract.
///
/// Both backends implement identical semantics; the choice is made once at
/// construction and never switched at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueBackend {
    /// Binary heap keyed by (time, sequence).
    #[default]
    Heap,
    /// Ordered map keyed by (time, sequence).
    Ordered,
}

/// Per-run parameters, fixed between resets.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RunConfig {
    /// RNG seed. `None` seeds from OS entropy (non-reproducible).
    #[serde(default)]
    pub seed: Option<u64>,

    /// Number of jobs queued ahead of the first station on reset.
    #[serde(default = "default_n_jobs")]
    #[validate(range(min = 1))]
    pub n_jobs: usize,

    /// Event queue backend.
    #[serde(default)]
    pub queue_backend: QueueBackend,
}

fn default_n_jobs() -> usize {
    100
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seed: None,
            n_jobs: default_n_jobs(),
            queue_backend: QueueBackend::default(),
        }
    }
}
