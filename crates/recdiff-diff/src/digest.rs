//! Fast equality digests used to skip unchanged record pairs.
//!
//! A digest folds every field of a record, in schema order, into one `u64`.
//! It is not cryptographic: equal digests are trusted as "unchanged", so a
//! collision hides a change. Runs that cannot accept that trade-off disable
//! the shortcut in [`DiffConfig`](crate::DiffConfig).

use std::fmt;

use serde_json::Value;

use recdiff_catalog::{Record, RecordCatalog};
use recdiff_types::token::json_form;
use recdiff_types::{FieldKind, Schema};

use crate::error::{DiffError, DiffResult};

const FIELD_PRIME: u64 = 16_777_619;
const SEED: u64 = i64::MAX as u64;

/// Compute the digest of `record` using its catalog's schema.
pub fn digest<R: Record>(catalog: &RecordCatalog<R>, record: &R) -> DiffResult<u64> {
    let mut acc: Option<u64> = None;
    for (name, kind) in catalog.schema().iter() {
        let field_hash = match kind {
            FieldKind::Scalar => hash_value(&catalog.scalar_value(record, name)?),
            FieldKind::Sequence => hash_sequence(&catalog.sequence_value(record, name)?),
        };
        acc = Some(match acc {
            None => field_hash,
            Some(acc) => acc.wrapping_mul(FIELD_PRIME) ^ field_hash,
        });
    }
    Ok(SEED ^ acc.unwrap_or(0))
}

/// Digest comparison across two catalogs with identical schemas.
pub struct Digester<'a, P, C> {
    previous: &'a RecordCatalog<P>,
    current: &'a RecordCatalog<C>,
}

impl<'a, P: Record, C: Record> Digester<'a, P, C> {
    /// Create a digester.
    ///
    /// Fails with [`DiffError::SchemaMismatch`] unless both catalogs declare
    /// the same field names with the same kinds; digests over different
    /// schemas are not comparable.
    pub fn new(previous: &'a RecordCatalog<P>, current: &'a RecordCatalog<C>) -> DiffResult<Self> {
        if let Some(reason) = schema_difference(previous.schema(), current.schema()) {
            return Err(DiffError::SchemaMismatch(reason));
        }
        Ok(Self { previous, current })
    }

    /// Digest of a record from the previous catalog.
    pub fn previous_digest(&self, record: &P) -> DiffResult<u64> {
        digest(self.previous, record)
    }

    /// Digest of a record from the current catalog.
    pub fn current_digest(&self, record: &C) -> DiffResult<u64> {
        digest(self.current, record)
    }

    /// Returns `true` if both records have the same digest.
    pub fn unchanged(&self, previous: &P, current: &C) -> DiffResult<bool> {
        Ok(self.previous_digest(previous)? == self.current_digest(current)?)
    }
}

impl<P, C> fmt::Debug for Digester<'_, P, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Digester")
            .field("previous", self.previous)
            .field("current", self.current)
            .finish()
    }
}

fn schema_difference(previous: &Schema, current: &Schema) -> Option<String> {
    for (name, kind) in previous.iter() {
        match current.kind(name) {
            None => return Some(format!("field '{name}' is missing from the current schema")),
            Some(other) if other != kind => {
                return Some(format!("field '{name}' is {kind} before and {other} after"))
            }
            Some(_) => {}
        }
    }
    current
        .names()
        .find(|name| !previous.contains(name))
        .map(|name| format!("field '{name}' is missing from the previous schema"))
}

fn hash_value(value: &Value) -> u64 {
    hash_str(&json_form(value))
}

fn hash_sequence(items: &[Value]) -> u64 {
    items.iter().fold(0u64, |acc, item| {
        (acc << 5).wrapping_add(acc) ^ hash_value(item)
    })
}

fn hash_str(text: &str) -> u64 {
    let hash = blake3::hash(text.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}
