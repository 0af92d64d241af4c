//! Error types for the forager core library

use thiserror::Error;

/// Core error type for training and environment operations
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration rejected at construction
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Environment-related errors
    #[error("Environment error: {0}")]
    Environment(String),

    /// Policy-related errors
    #[error("Policy error: {0}")]
    Policy(String),

    /// Invalid action
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },

    /// Non-finite value out of the value function; the model can no
    /// longer be trusted and the caller must treat this as fatal
    #[error("Numeric fault: {0}")]
    NumericFault(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for forager operations
pub type Result<T> = std::result::Result<T, Error>;
