use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use recdiff_types::{FieldKind, RecordKey, Schema};

use crate::descriptor::{Describe, FieldDescriptor, Record, RecordDescriptor};
use crate::error::{CatalogError, CatalogResult};

/// One version of a keyed record collection.
///
/// The catalog owns its records and the descriptor of their type. It is
/// read-only after construction and safe to share between diff workers.
pub struct RecordCatalog<R> {
    records: BTreeMap<RecordKey, R>,
    descriptor: RecordDescriptor<R>,
}

impl<R: Record + Describe> RecordCatalog<R> {
    /// Build a catalog for a record type with a static descriptor.
    pub fn new(records: impl IntoIterator<Item = (RecordKey, R)>) -> Self {
        Self::with_descriptor(records, R::describe())
    }
}

impl<R: Record> RecordCatalog<R> {
    /// Build a catalog with an explicit descriptor.
    ///
    /// When `records` yields the same key twice the later record wins.
    pub fn with_descriptor(
        records: impl IntoIterator<Item = (RecordKey, R)>,
        descriptor: RecordDescriptor<R>,
    ) -> Self {
        Self {
            records: records.into_iter().collect(),
            descriptor,
        }
    }

    /// Keys held by this catalog, ascending.
    pub fn keys(&self) -> impl Iterator<Item = RecordKey> + '_ {
        self.records.keys().copied()
    }

    /// The key set as an ordered set.
    pub fn key_set(&self) -> BTreeSet<RecordKey> {
        self.records.keys().copied().collect()
    }

    /// Returns `true` if `key` is present.
    pub fn contains_key(&self, key: RecordKey) -> bool {
        self.records.contains_key(&key)
    }

    /// The record stored under `key`.
    pub fn get(&self, key: RecordKey) -> CatalogResult<&R> {
        self.records.get(&key).ok_or(CatalogError::KeyNotFound(key))
    }

    /// The record stored under `key`, or `None`.
    pub fn lookup(&self, key: RecordKey) -> Option<&R> {
        self.records.get(&key)
    }

    /// `(key, record)` pairs, ascending by key.
    pub fn iter(&self) -> impl Iterator<Item = (RecordKey, &R)> {
        self.records.iter().map(|(key, record)| (*key, record))
    }

    /// The field schema of this catalog's record type.
    pub fn schema(&self) -> &Schema {
        self.descriptor.schema()
    }

    /// The accessor table of this catalog's record type.
    pub fn descriptor(&self) -> &RecordDescriptor<R> {
        &self.descriptor
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the catalog holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Read a scalar field.
    ///
    /// Reading a sequence field through this accessor is a shape mismatch.
    pub fn scalar_value(&self, record: &R, field: &str) -> CatalogResult<Value> {
        let descriptor = self.expect_kind(field, FieldKind::Scalar)?;
        descriptor.read(record)
    }

    /// Read a sequence field as its ordered elements.
    pub fn sequence_value(&self, record: &R, field: &str) -> CatalogResult<Vec<Value>> {
        let descriptor = self.expect_kind(field, FieldKind::Sequence)?;
        match descriptor.read(record)? {
            Value::Array(items) => Ok(items),
            other => Err(CatalogError::ShapeMismatch {
                field: field.to_string(),
                expected: FieldKind::Sequence,
                found: value_type_name(&other).to_string(),
            }),
        }
    }

    fn expect_kind(&self, field: &str, kind: FieldKind) -> CatalogResult<&FieldDescriptor<R>> {
        let descriptor = self
            .descriptor
            .field(field)
            .ok_or_else(|| CatalogError::UnknownField(field.to_string()))?;
        if descriptor.kind() != kind {
            return Err(CatalogError::ShapeMismatch {
                field: field.to_string(),
                expected: kind,
                found: descriptor.kind().to_string(),
            });
        }
        Ok(descriptor)
    }
}

impl<R> std::fmt::Debug for RecordCatalog<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordCatalog")
            .field("record_count", &self.records.len())
            .field("schema", self.descriptor.schema())
            .finish()
    }
}

pub(crate) fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
