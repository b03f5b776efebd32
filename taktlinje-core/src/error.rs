use thiserror::Error;

use taktlinje_config::ConfigError;

#[derive(Debug, Error)]
pub enum KernelError {
    #[error("Invalid line configuration: {0}")]
    Config(String),
}

impl From<ConfigError> for KernelError {
    fn from(err: ConfigError) -> Self {
        KernelError::Config(err.to_string())
    }
}
