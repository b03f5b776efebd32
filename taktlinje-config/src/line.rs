//! Production line topology and stochastic parameters.
//!
//! Describes the serial line the kernel simulates: station count, finite
//! inter-station buffers, per-station service time distributions, failure
//! behavior, and the repair worker pool.

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

use crate::validation;
use crate::ConfigError;

/// Service time distribution family for one station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistKind {
    /// Uniform on (0, 2 * mean).
    Uniform,
    /// Exponential with the given mean.
    Exp,
}

/// Distribution selection: a single family broadcast to every station, or
/// one entry per station.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DistSpec {
    All(DistKind),
    PerStation(Vec<DistKind>),
}

impl Default for DistSpec {
    fn default() -> Self {
        DistSpec::All(DistKind::Uniform)
    }
}

impl DistSpec {
    /// Expand into exactly one `DistKind` per station.
    pub fn resolve(&self, n_stations: usize) -> Result<Vec<DistKind>, ConfigError> {
        match self {
            DistSpec::All(kind) => Ok(vec![*kind; n_stations]),
            DistSpec::PerStation(kinds) => {
                if kinds.len() != n_stations {
                    return Err(ConfigError::Shape(format!(
                        "proc_dists length {} must equal n_stations {}",
                        kinds.len(),
                        n_stations
                    )));
                }
                Ok(kinds.clone())
            }
        }
    }
}

/// Serial production line parameters.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LineConfig {
    /// Number of stations in the line.
    #[serde(default = "default_n_stations")]
    #[validate(range(min = 1))]
    pub n_stations: usize,

    /// Capacity of each inter-station buffer (exactly `n_stations - 1` entries).
    #[serde(default = "default_buffer_caps")]
    pub buffer_caps: Vec<usize>,

    /// Mean service time per station (exactly `n_stations` entries, all positive).
    #[serde(default = "default_proc_means")]
    #[validate(custom(function = validation::validate_all_positive))]
    pub proc_means: Vec<f64>,

    /// Service time distribution family, scalar or per station.
    #[serde(default)]
    pub proc_dists: DistSpec,

    /// Utilization EMA decay rate, in (0, 1].
    #[serde(default = "default_util_alpha")]
    #[validate(custom(function = validation::validate_decay_rate))]
    pub util_alpha: f64,

    /// Probability that a service interval suffers a machine failure.
    #[serde(default = "default_fail_rate")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub fail_rate: f64,

    /// Fixed repair duration once a worker is assigned.
    #[serde(default = "default_repair_time")]
    #[validate(custom(function = validation::validate_positive))]
    pub repair_time: f64,

    /// Size of the shared repair worker pool.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_n_stations() -> usize {
    3
}

fn default_buffer_caps() -> Vec<usize> {
    vec![5, 5]
}

fn default_proc_means() -> Vec<f64> {
    vec![4.0, 5.0, 4.5]
}

fn default_util_alpha() -> f64 {
    0.1
}

fn default_fail_rate() -> f64 {
    0.01
}

fn default_repair_time() -> f64 {
    60.0
}

fn default_workers() -> usize {
    3
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            n_stations: default_n_stations(),
            buffer_caps: default_buffer_caps(),
            proc_means: default_proc_means(),
            proc_dists: DistSpec::default(),
            util_alpha: default_util_alpha(),
            fail_rate: default_fail_rate(),
            repair_time: default_repair_time(),
            workers: default_workers(),
        }
    }
}

impl LineConfig {
    /// Check the cross-field couplings that tie array lengths to the station
    /// count. The `validator` derive covers the per-field ranges; this covers
    /// the rest. Called after loading and again by the kernel constructor.
    pub fn ensure_consistent(&self) -> Result<(), ConfigError> {
        if self.n_stations < 1 {
            return Err(ConfigError::Shape("need at least one station".into()));
        }
        if self.buffer_caps.len() != self.n_stations - 1 {
            return Err(ConfigError::Shape(format!(
                "buffer_caps length {} must be n_stations - 1 = {}",
                self.buffer_caps.len(),
                self.n_stations - 1
            )));
        }
        if self.proc_means.len() != self.n_stations {
            return Err(ConfigError::Shape(format!(
                "proc_means length {} must equal n_stations {}",
                self.proc_means.len(),
                self.n_stations
            )));
        }
        self.proc_dists.resolve(self.n_stations)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_line_is_consistent() {
        let config = LineConfig::default();
        config.validate().expect("default config should validate");
        config.ensure_consistent().expect("default shape");
    }

    #[test]
    fn scalar_dist_broadcasts() {
        let dists = DistSpec::All(DistKind::Exp).resolve(4).unwrap();
        assert_eq!(dists, vec![DistKind::Exp; 4]);
    }

    #[test]
    fn per_station_dist_length_checked() {
        let spec = DistSpec::PerStation(vec![DistKind::Uniform, DistKind::Exp]);
        assert!(spec.resolve(3).is_err());
        assert!(spec.resolve(2).is_ok());
    }

    #[test]
    fn buffer_cap_length_mismatch_rejected() {
        let config = LineConfig {
            buffer_caps: vec![5],
            ..LineConfig::default()
        };
        assert!(config.ensure_consistent().is_err());
    }

    #[test]
    fn nonpositive_mean_rejected() {
        let config = LineConfig {
            proc_means: vec![4.0, -5.0, 4.5],
            ..LineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
