//! Configuration error types
//!
//! The clocked path of the core has no failure mode: every input
//! combination maps to a defined next state and defined outputs. Errors
//! only arise when building a core from an invalid or unreadable
//! configuration.

use std::io;
use thiserror::Error;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while building or loading a core configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A field is outside its permitted range
    #[error("{field} = {value} is out of range ({min}..={max})")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    /// The DCO increment range would not be strictly monotonic or would alias
    #[error(
        "DCO increment range {lowest}..={highest} must lie within 1..={limit} \
         (center_increment {center}, control word {cw_min}..={cw_max})"
    )]
    DcoRange {
        center: u32,
        cw_min: i32,
        cw_max: i32,
        lowest: i64,
        highest: i64,
        limit: i64,
    },

    /// Feedback divider must be a non-zero even integer
    #[error("feedback_divider must be even and at least 2, got {0}")]
    InvalidDivider(u16),

    /// Failed to read or write a configuration file
    #[error("Configuration I/O failed: {0}")]
    Io(#[from] io::Error),

    /// Failed to parse a configuration document
    #[error("Configuration parse failed: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    /// Name of the offending field, when the error concerns one field
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ConfigError::OutOfRange { field, .. } => Some(field),
            ConfigError::DcoRange { .. } => Some("center_increment"),
            ConfigError::InvalidDivider(_) => Some("feedback_divider"),
            ConfigError::Io(_) | ConfigError::Parse(_) => None,
        }
    }
}
