//! # taktlinje-core
//!
//! Discrete-event simulation kernel for a multi-station serial production
//! line: stations pull units through finite buffers, fail stochastically,
//! and compete for a shared pool of repair workers while an external
//! controller adjusts a global speed multiplier at decision boundaries.
//!
//! ### Guarantees:
//! - Strict `(time, sequence)` event ordering with FIFO tie-break
//! - Bit-reproducible trajectories for a fixed seed and action sequence
//! - Conservation invariants (jobs, buffer capacity, worker pool) at every
//!   snapshot
//!
//! ### Key Submodules:
//! - `events`: event kinds and the two interchangeable queue backends
//! - `kernel`: the state machine, greedy resolution pass, and control loop
//! - `timing`: seeded service/failure sampling
//! - `snapshot`: read-only projections and the reward function

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod clock;
pub mod error;
pub mod events;
pub mod kernel;
pub mod line;
pub mod snapshot;
pub mod timing;

pub mod prelude {
    pub use crate::events::{EventKind, EventQueue, HeapQueue, OrderedQueue};
    pub use crate::kernel::{build_kernel, HeapKernel, Kernel, LineKernel, OrderedKernel};
    pub use crate::snapshot::{compute_reward, LastEvent, Snapshot, StationView, Summary};
}

pub use error::KernelError;
pub use kernel::{build_kernel, Kernel};
pub use snapshot::{compute_reward, Snapshot, Summary};
