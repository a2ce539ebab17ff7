//! Foundation types for recdiff.
//!
//! This crate provides the value types shared by the catalog, the diff core
//! and the report shapes. Every other recdiff crate depends on `recdiff-types`.
//!
//! # Key Types
//!
//! - [`RecordKey`] -- Integer key identifying one record within a catalog
//! - [`FieldKind`] / [`Schema`] -- Per-field shape (scalar or sequence), fixed per catalog
//! - [`ChangeEntry`] / [`DiffOperation`] -- One atomic Add/Remove/Replace at a property path
//! - [`DiffReport`] -- Added keys, removed keys and per-key change lists for one run

pub mod change;
pub mod error;
pub mod report;
pub mod schema;
pub mod token;

pub use change::{ChangeEntry, DiffOperation};
pub use error::TypeError;
pub use report::{DiffReport, KeyFailure};
pub use schema::{FieldKind, Schema};

/// Integer key identifying a record within a catalog.
pub type RecordKey = i64;
