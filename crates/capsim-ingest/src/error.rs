//! Error types for metric and price ingestion.

use capsim_core::{BillingMode, Direction, StorageClass};
use thiserror::Error;

/// Result type alias for ingestion operations.
pub type IngestResult<T> = Result<T, IngestError>;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: {reason}")]
    MalformedRow { line: usize, reason: String },

    #[error("line {line}: invalid timestamp {value:?}")]
    InvalidTimestamp { line: usize, value: String },

    #[error("malformed metrics response: {0}")]
    MalformedResponse(String),

    #[error("no {billing_mode} {direction} price for {storage_class} tables in {region}")]
    PriceNotFound {
        region: String,
        direction: Direction,
        billing_mode: BillingMode,
        storage_class: StorageClass,
    },
}
