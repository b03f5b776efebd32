//! # Taktlinje Configuration System
//!
//! Hierarchical configuration for the production line simulator.
//!
//! ## Features
//! - **Unified Configuration**: single source of truth across all components
//! - **Validation**: every parameter checked at the boundary, never coerced
//! - **Environment Awareness**: YAML files layered under `TAKTLINJE_*` overrides

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

mod error;
mod line;
mod run;
mod telemetry;
mod validation;

pub use error::ConfigError;
pub use line::{DistKind, DistSpec, LineConfig};
pub use run::{QueueBackend, RunConfig};
pub use telemetry::TelemetryConfig;

/// Top-level configuration container.
#[derive(Debug, Default, Clone, Serialize, Deserialize, Validate)]
pub struct TaktlinjeConfig {
    /// Line topology and stochastic parameters.
    #[validate(nested)]
    pub line: LineConfig,

    /// Seeding, job count, and backend selection.
    #[validate(nested)]
    pub run: RunConfig,

    /// Logging and metrics.
    #[validate(nested)]
    pub telemetry: TelemetryConfig,
}

impl TaktlinjeConfig {
    /// Load configuration from default files and environment.
    ///
    /// Hierarchy:
    /// 1. Default values
    /// 2. `config/taktlinje.yaml` - base settings. If missing, defaults are used.
    /// 3. `TAKTLINJE_*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(TaktlinjeConfig::default()));

        if Path::new("config/taktlinje.yaml").exists() {
            figment = figment.merge(Yaml::file("config/taktlinje.yaml"));
        }

        figment
            .merge(Env::prefixed("TAKTLINJE_").split("__"))
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.validate()?;
                config.line.ensure_consistent()?;
                Ok(config)
            })
    }

    /// Load configuration from a specific path for testing/validation.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(PathBuf::from(
                path.to_string_lossy().to_string(),
            )));
        }

        Figment::from(Serialized::defaults(TaktlinjeConfig::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed("TAKTLINJE_").split("__"))
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.validate()?;
                config.line.ensure_consistent()?;
                Ok(config)
            })
    }
}
