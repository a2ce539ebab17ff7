//! Error types for the report crate.

use recdiff_catalog::CatalogError;
use recdiff_types::RecordKey;

/// Errors that can occur while shaping or writing a report.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// A record referenced by the diff could not be read.
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// A record did not serialize to a JSON object.
    #[error("record {0} is not an object")]
    NotAnObject(RecordKey),

    /// JSON serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Writing the report failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for report results.
pub type ReportResult<T> = Result<T, ReportError>;
