//! Error types for the simulation crate

use thiserror::Error;

/// Result alias used throughout the simulation crate
pub type BiasResult<T> = Result<T, BiasError>;

/// Configuration errors raised while building hardware specs or evaluators.
///
/// All of these are startup-time conditions; nothing in the simulation loop
/// itself can fail.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BiasError {
    /// A required hardware spec field was left at zero
    #[error("hardware spec '{description}' is missing required field '{field}'")]
    IncompleteHardwareSpec {
        description: String,
        field: &'static str,
    },
    /// A field that must be a power of two is not
    #[error("hardware spec '{description}': {field} must be a power of two, got {value}")]
    NotPowerOfTwo {
        description: String,
        field: &'static str,
        value: u32,
    },
    /// Cache line or page smaller than one array element
    #[error(
        "hardware spec '{description}': block size {block_size} is smaller than element size {element_size}"
    )]
    BlockSmallerThanElement {
        description: String,
        block_size: u32,
        element_size: u32,
    },
    /// Invalid simulation parameters
    #[error("invalid simulation config: {reason}")]
    InvalidSimulation { reason: String },
    /// Evaluator built without any hardware specs
    #[error("at least one hardware spec is required")]
    NoHardwareSpecs,
}
