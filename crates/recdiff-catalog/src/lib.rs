//! Keyed record catalogs for recdiff.
//!
//! A [`RecordCatalog`] holds one version of a keyed record collection together
//! with the [`RecordDescriptor`] of its record type: a table of
//! `(name, kind, accessor)` entries built once, from which the catalog's
//! [`Schema`](recdiff_types::Schema) is derived.
//!
//! Static record types implement [`Describe`]; dynamic JSON rows get a
//! descriptor inferred by the [`loader`].

pub mod catalog;
pub mod descriptor;
pub mod error;
pub mod loader;

pub use catalog::RecordCatalog;
pub use descriptor::{Describe, DescriptorBuilder, FieldDescriptor, Record, RecordDescriptor};
pub use error::{CatalogError, CatalogResult};
pub use loader::{infer_descriptor, load_json_catalog, parse_json_catalog, LoadOptions, Row};
