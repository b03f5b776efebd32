//! # Stochastic Timing Model
//!
//! Seeded sampling of service durations and failure occurrence. The RNG is
//! re-seeded only on `reset`; every draw flows through this module so a fixed
//! seed and action sequence reproduce the trajectory bit for bit.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp};

use taktlinje_config::DistKind;

use crate::error::KernelError;

/// Durations are floored here so a sampled service never takes zero or
/// negative time.
const MIN_SERVICE_TIME: f64 = 0.01;

/// Speed multipliers are clamped away from zero before dividing.
const MIN_SPEED: f64 = 1e-6;

/// Per-station service distribution, resolved at construction.
#[derive(Debug, Clone, Copy)]
enum ServiceDist {
    /// Uniform on (0, 2 * mean).
    Uniform { mean: f64 },
    Exponential(Exp<f64>),
}

/// Seeded source of service durations and failure timing.
#[derive(Debug)]
pub struct TimingModel {
    rng: StdRng,
    dists: Vec<ServiceDist>,
    fail_rate: f64,
}

impl TimingModel {
    pub fn new(
        means: &[f64],
        dists: &[DistKind],
        fail_rate: f64,
        seed: Option<u64>,
    ) -> Result<Self, KernelError> {
        if means.len() != dists.len() {
            return Err(KernelError::Config(
                "proc_means and proc_dists must have equal length".into(),
            ));
        }
        let dists = means
            .iter()
            .zip(dists)
            .map(|(&mean, kind)| match kind {
                DistKind::Uniform => Ok(ServiceDist::Uniform { mean }),
                DistKind::Exp => {
                    let lambda = if mean <= 1e-9 { 1.0 } else { 1.0 / mean };
                    Exp::new(lambda)
                        .map(ServiceDist::Exponential)
                        .map_err(|e| KernelError::Config(format!("bad exponential rate: {e}")))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            rng: Self::rng_from(seed),
            dists,
            fail_rate,
        })
    }

    /// Replace the RNG. Called only on `reset`.
    pub fn reseed(&mut self, seed: Option<u64>) {
        self.rng = Self::rng_from(seed);
    }

    fn rng_from(seed: Option<u64>) -> StdRng {
        match seed {
            Some(v) => StdRng::seed_from_u64(v),
            None => StdRng::from_os_rng(),
        }
    }

    /// Sample a service duration for `station` under the current speed
    /// multiplier, floored at a small positive minimum.
    pub fn sample_service(&mut self, station: usize, speed: f64) -> f64 {
        let base = match self.dists[station] {
            ServiceDist::Uniform { mean } => self.rng.random_range(0.0..(2.0 * mean)),
            ServiceDist::Exponential(exp) => exp.sample(&mut self.rng),
        };
        (base / speed.max(MIN_SPEED)).max(MIN_SERVICE_TIME)
    }

    /// Decide whether this service interval fails and, if so, at what offset
    /// within `[0, duration)`. Drawn once per service start.
    pub fn sample_failure_offset(&mut self, duration: f64) -> Option<f64> {
        if self.rng.random::<f64>() < self.fail_rate {
            Some(self.rng.random_range(0.0..duration))
        } else {
            None
        }
    }
}
