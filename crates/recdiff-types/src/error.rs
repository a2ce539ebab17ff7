use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("unknown field kind: {0}")]
    UnknownFieldKind(String),

    #[error("unknown diff operation: {0}")]
    UnknownOperation(String),
}
