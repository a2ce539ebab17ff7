//! Per-record change generation.
//!
//! A [`DiffGenerator`] turns one record pair into an ordered change list:
//! common fields first, then added fields, then removed fields, each group
//! in [`FieldPlan`] order. Two strategies implement it:
//!
//! - [`AccessorGenerator`] reads values through the catalogs' descriptors.
//! - [`TokenGenerator`] serializes each record to a JSON tree and walks it.

mod accessor;
mod token;

pub use accessor::AccessorGenerator;
pub use token::TokenGenerator;

use recdiff_catalog::{Record, RecordCatalog};
use recdiff_types::ChangeEntry;

use crate::config::{DiffConfig, GeneratorKind};
use crate::error::DiffResult;
use crate::plan::FieldPlan;

/// Produces the change list for one record pair.
pub trait DiffGenerator<P, C>: Send + Sync {
    /// The field plan shared by every pair.
    fn plan(&self) -> &FieldPlan;

    /// Diff `previous` against `current`.
    ///
    /// Fails with [`DiffError::NullRecord`](crate::DiffError::NullRecord)
    /// if either side is absent.
    fn generate(&self, previous: Option<&P>, current: Option<&C>) -> DiffResult<Vec<ChangeEntry>>;
}

/// Build the generator selected by `config`.
pub fn build_generator<'a, P: Record, C: Record>(
    previous: &'a RecordCatalog<P>,
    current: &'a RecordCatalog<C>,
    config: &DiffConfig,
) -> Box<dyn DiffGenerator<P, C> + 'a> {
    match config.generator {
        GeneratorKind::Accessor => Box::new(AccessorGenerator::new(previous, current, config)),
        GeneratorKind::Token => Box::new(TokenGenerator::new(previous, current, config)),
    }
}
