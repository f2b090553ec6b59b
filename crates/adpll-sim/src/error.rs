//! Simulator error types

use std::io;

use adpll_core::ConfigError;
use thiserror::Error;

/// Result type for simulator operations
pub type SimResult<T> = Result<T, SimError>;

/// Errors raised while building or running a simulation
#[derive(Error, Debug)]
pub enum SimError {
    /// Scenario contains no steps
    #[error("Scenario '{0}' has no steps")]
    EmptyScenario(String),

    /// A scenario step cannot be executed as written
    #[error("Invalid step {index}: {reason}")]
    InvalidStep { index: usize, reason: String },

    /// Reference stimulus parameters are unusable
    #[error("Invalid reference source: {0}")]
    InvalidReference(String),

    /// Programming value does not fit the register
    #[error("Value {value} does not fit a {bits}-bit register")]
    ValueTooWide { value: u8, bits: u8 },

    /// An expectation on the device outputs did not hold
    #[error("Expectation failed at cycle {cycle}: {description}")]
    ExpectationFailed { cycle: u64, description: String },

    /// Core configuration rejected
    #[error("Core configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Scenario or trace file I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Scenario or trace document could not be (de)serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SimError {
    /// True for failures of the device under test rather than of the setup.
    pub fn is_device_failure(&self) -> bool {
        matches!(self, SimError::ExpectationFailed { .. })
    }
}
