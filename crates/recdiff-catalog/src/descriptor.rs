//! Record descriptors: the per-type accessor table consulted by the diff core.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use recdiff_types::{FieldKind, Schema};

use crate::error::CatalogResult;

/// A value stored in a catalog.
///
/// Records must be serializable (the token strategy and the report shapes
/// work on their JSON form) and shareable across diff workers.
pub trait Record: Serialize + Send + Sync {}

impl<T: Serialize + Send + Sync> Record for T {}

/// A record type with a statically known descriptor.
pub trait Describe: Record + Sized {
    /// Build the descriptor for this type.
    fn describe() -> RecordDescriptor<Self>;
}

type Getter<R> = Arc<dyn Fn(&R) -> CatalogResult<Value> + Send + Sync>;

/// One entry of a [`RecordDescriptor`]: name, kind and accessor.
pub struct FieldDescriptor<R> {
    name: String,
    kind: FieldKind,
    getter: Getter<R>,
}

impl<R> FieldDescriptor<R> {
    /// The field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The field kind.
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Read the raw field value from `record`.
    ///
    /// Sequence fields yield a JSON array.
    pub fn read(&self, record: &R) -> CatalogResult<Value> {
        (self.getter)(record)
    }
}

impl<R> Clone for FieldDescriptor<R> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            kind: self.kind,
            getter: Arc::clone(&self.getter),
        }
    }
}

impl<R> fmt::Debug for FieldDescriptor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

/// The accessor table of a record type.
///
/// Built once per catalog; the derived [`Schema`] never changes afterwards.
pub struct RecordDescriptor<R> {
    fields: BTreeMap<String, FieldDescriptor<R>>,
    schema: Schema,
}

impl<R> RecordDescriptor<R> {
    /// Start building a descriptor.
    pub fn builder() -> DescriptorBuilder<R> {
        DescriptorBuilder { fields: Vec::new() }
    }

    /// The name → kind table.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor<R>> {
        self.fields.get(name)
    }

    /// All fields, ordered by name.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor<R>> {
        self.fields.values()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the descriptor has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<R> Clone for RecordDescriptor<R> {
    fn clone(&self) -> Self {
        Self {
            fields: self.fields.clone(),
            schema: self.schema.clone(),
        }
    }
}

impl<R> fmt::Debug for RecordDescriptor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordDescriptor")
            .field("schema", &self.schema)
            .finish()
    }
}

/// Builder for [`RecordDescriptor`].
///
/// A field registered twice keeps the last registration.
pub struct DescriptorBuilder<R> {
    fields: Vec<FieldDescriptor<R>>,
}

impl<R: 'static> DescriptorBuilder<R> {
    /// Register a scalar field.
    pub fn scalar<F>(self, name: impl Into<String>, getter: F) -> Self
    where
        F: Fn(&R) -> Value + Send + Sync + 'static,
    {
        self.field(name, FieldKind::Scalar, move |record| Ok(getter(record)))
    }

    /// Register a sequence field.
    pub fn sequence<F>(self, name: impl Into<String>, getter: F) -> Self
    where
        F: Fn(&R) -> Vec<Value> + Send + Sync + 'static,
    {
        self.field(name, FieldKind::Sequence, move |record| {
            Ok(Value::Array(getter(record)))
        })
    }

    /// Register a field with a fallible accessor.
    ///
    /// Sequence accessors must yield a JSON array; anything else is reported
    /// as a shape mismatch when the value is read.
    pub fn field<F>(mut self, name: impl Into<String>, kind: FieldKind, getter: F) -> Self
    where
        F: Fn(&R) -> CatalogResult<Value> + Send + Sync + 'static,
    {
        self.fields.push(FieldDescriptor {
            name: name.into(),
            kind,
            getter: Arc::new(getter),
        });
        self
    }

    /// Finish the descriptor and derive its schema.
    pub fn build(self) -> RecordDescriptor<R> {
        let fields: BTreeMap<String, FieldDescriptor<R>> = self
            .fields
            .into_iter()
            .map(|field| (field.name.clone(), field))
            .collect();
        let schema = fields
            .values()
            .map(|field| (field.name.clone(), field.kind))
            .collect();
        RecordDescriptor { fields, schema }
    }
}
