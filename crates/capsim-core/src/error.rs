//! Error types shared by the capsim library crates.

use thiserror::Error;

/// Result type alias for simulator, cost, and config operations.
pub type CapsimResult<T> = Result<T, CapsimError>;

/// Errors that can occur while configuring or running a simulation.
#[derive(Debug, Error)]
pub enum CapsimError {
    #[error("invalid scaling config: {0}")]
    InvalidConfig(String),

    #[error("insufficient burst capacity: requested {requested}, available {available}")]
    InsufficientBurst { requested: f64, available: f64 },

    #[error("cannot estimate cost of an empty series")]
    EmptySeries,

    #[error("config file error: {0}")]
    ConfigFile(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
