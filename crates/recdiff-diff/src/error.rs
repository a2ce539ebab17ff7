//! Error types for the diff crate.

use recdiff_catalog::CatalogError;
use recdiff_types::{FieldKind, RecordKey};

/// Which side of a record pair an error refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Previous,
    Current,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Previous => write!(f, "previous"),
            Side::Current => write!(f, "current"),
        }
    }
}

/// Errors that can occur during diff operations.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// A digest was requested for two structurally different schemas.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// One side of a record pair is absent.
    #[error("{0} record is absent")]
    NullRecord(Side),

    /// A field changed between scalar and sequence and decomposition is disabled.
    #[error("field '{field}' changed shape from {previous} to {current}")]
    UnsupportedShapeChange {
        field: String,
        previous: FieldKind,
        current: FieldKind,
    },

    /// A record's token tree does not have the expected structure.
    #[error("malformed token at '{path}': {reason}")]
    MalformedToken { path: String, reason: String },

    /// Reading from a catalog failed (including key lookups).
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Serialization of a record failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A key's diff failed and the error policy aborted the run.
    #[error("diff of key {key} failed: {source}")]
    KeyFailed {
        key: RecordKey,
        #[source]
        source: Box<DiffError>,
    },

    /// The worker pool could not be created or a worker died.
    #[error("worker pool error: {0}")]
    WorkerPool(String),

    /// Configuration is invalid.
    #[error("configuration error: {0}")]
    Config(String),
}

impl DiffError {
    /// Wrap a per-key failure.
    pub fn key_failed(key: RecordKey, source: DiffError) -> Self {
        Self::KeyFailed {
            key,
            source: Box::new(source),
        }
    }
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
