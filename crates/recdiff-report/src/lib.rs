//! Report shapes for recdiff.
//!
//! A [`DiffReport`](recdiff_types::DiffReport) only carries keys and change
//! entries. The shapes here combine it with the compared catalogs into the
//! payload a consumer wants:
//!
//! - [`SimpleReport`] -- added keys, removed keys, per-key changes
//! - [`ExtendedReport`] -- full added/removed records and the previous
//!   version of every changed record
//! - [`FlatReport`] -- one row per touched record, sequences flattened into
//!   `Name[i]` columns
//!
//! Every shape implements [`Render`] for JSON output.

pub mod error;
pub mod extended;
pub mod flat;
pub mod shape;
pub mod simple;

pub use error::{ReportError, ReportResult};
pub use extended::ExtendedReport;
pub use flat::{FlatEntry, FlatOperation, FlatReport};
pub use shape::{Render, Report, ReportShape};
pub use simple::SimpleReport;
