//! Error types for Convoy.

use thiserror::Error;

/// Top-level error type for Convoy operations.
#[derive(Debug, Error)]
pub enum ConvoyError {
    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Ring buffer capacity below the supported minimum
    #[error("capacity {requested} is below the minimum of {minimum}")]
    CapacityTooSmall {
        /// Requested capacity
        requested: usize,
        /// Smallest accepted capacity
        minimum: usize,
    },

    /// A numeric field is negative, NaN or infinite
    #[error("{field} must be a finite non-negative number, got {value}")]
    InvalidValue {
        /// Field name
        field: &'static str,
        /// Offending value
        value: f32,
    },
}

/// Result type alias for Convoy operations.
pub type ConvoyResult<T> = Result<T, ConvoyError>;
