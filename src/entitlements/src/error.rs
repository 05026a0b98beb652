//! Error types for entitlement analysis

use thiserror::Error;

/// Entitlement analysis errors
#[derive(Debug, Error)]
pub enum EntitlementError {
    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid toxic combination policy
    #[error("Invalid policy: {0}")]
    InvalidPolicy(String),

    /// Required column absent from the input header
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// Row rejected under strict ingestion
    #[error("Malformed row at line {line}: missing or empty '{field}'")]
    MalformedRow {
        /// 1-based line number in the source file (header is line 1)
        line: u64,
        /// Column that was missing or empty
        field: String,
    },

    /// CSV read/write error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for entitlement operations
pub type Result<T> = std::result::Result<T, EntitlementError>;
