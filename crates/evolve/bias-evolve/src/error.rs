//! Optimizer error types

use bias_core::BiasError;
use thiserror::Error;

/// Result alias for the optimizer crate
pub type EvolveResult<T> = Result<T, EvolveError>;

/// Errors raised while configuring or starting the optimizer
#[derive(Debug, Error)]
pub enum EvolveError {
    /// Invalid hardware spec or simulation settings
    #[error(transparent)]
    Simulation(#[from] BiasError),
    /// Invalid optimizer settings
    #[error("invalid optimizer config: {reason}")]
    InvalidConfig { reason: String },
    /// Configuration file could not be read
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// Configuration file is not valid TOML
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    /// Configuration could not be rendered as TOML
    #[error("failed to render config: {0}")]
    Render(#[from] toml::ser::Error),
    /// A worker thread could not be started
    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },
}
