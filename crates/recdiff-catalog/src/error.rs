//! Error types for the catalog crate.

use recdiff_types::{FieldKind, RecordKey};

/// Errors that can occur while building or reading a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// A key was looked up that the catalog does not hold.
    #[error("key not found: {0}")]
    KeyNotFound(RecordKey),

    /// A field was read that the record descriptor does not declare.
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// A field value does not have the shape its kind promises.
    #[error("field '{field}' is declared {expected} but holds {found}")]
    ShapeMismatch {
        field: String,
        expected: FieldKind,
        found: String,
    },

    /// A record key could not be parsed as an integer.
    #[error("invalid record key: {0}")]
    InvalidKey(String),

    /// An array-form document has an element without a usable key field.
    #[error("record at index {index} has no integer '{field}' field")]
    MissingKey { index: usize, field: String },

    /// Two records share the same key.
    #[error("duplicate record key: {0}")]
    DuplicateKey(RecordKey),

    /// A record is not a JSON object.
    #[error("record {0} is not an object")]
    InvalidRow(String),

    /// The document is neither an object nor an array of records.
    #[error("unsupported catalog document: {0}")]
    UnsupportedDocument(String),

    /// JSON parsing failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading the catalog file failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for catalog results.
pub type CatalogResult<T> = Result<T, CatalogError>;
