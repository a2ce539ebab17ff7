//! Loading catalogs of dynamic JSON rows.
//!
//! Two document forms are accepted:
//!
//! - an object keyed by integer strings: `{"1": {...}, "2": {...}}`
//! - an array of objects carrying an integer key field: `[{"id": 1, ...}]`
//!
//! The descriptor is inferred once from all rows. A field is a sequence if
//! any row holds an array for it; kind hints override inference.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;

use recdiff_types::{FieldKind, RecordKey};

use crate::catalog::{value_type_name, RecordCatalog};
use crate::descriptor::RecordDescriptor;
use crate::error::{CatalogError, CatalogResult};

/// A dynamic record: one JSON object.
pub type Row = Map<String, Value>;

/// Options for reading a catalog document.
#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    /// Key field for array-form documents. Defaults to `"id"`.
    pub key_field: Option<String>,
    /// Kinds forced for specific fields, bypassing inference.
    pub kind_hints: BTreeMap<String, FieldKind>,
}

impl LoadOptions {
    fn key_field(&self) -> &str {
        self.key_field.as_deref().unwrap_or("id")
    }
}

/// Read and parse a catalog file.
pub fn load_json_catalog(
    path: impl AsRef<Path>,
    options: &LoadOptions,
) -> CatalogResult<RecordCatalog<Row>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let catalog = parse_json_catalog(&text, options)?;
    debug!(
        path = %path.display(),
        records = catalog.len(),
        fields = catalog.schema().len(),
        "loaded catalog"
    );
    Ok(catalog)
}

/// Parse a catalog document held in memory.
pub fn parse_json_catalog(text: &str, options: &LoadOptions) -> CatalogResult<RecordCatalog<Row>> {
    let document: Value = serde_json::from_str(text)?;
    let rows = match document {
        Value::Object(map) => rows_from_object(map)?,
        Value::Array(items) => rows_from_array(items, options.key_field())?,
        other => {
            return Err(CatalogError::UnsupportedDocument(
                value_type_name(&other).to_string(),
            ))
        }
    };
    let descriptor = infer_descriptor(rows.values(), &options.kind_hints);
    Ok(RecordCatalog::with_descriptor(rows, descriptor))
}

fn rows_from_object(map: Map<String, Value>) -> CatalogResult<BTreeMap<RecordKey, Row>> {
    let mut rows = BTreeMap::new();
    for (raw_key, value) in map {
        let key: RecordKey = raw_key
            .trim()
            .parse()
            .map_err(|_| CatalogError::InvalidKey(raw_key.clone()))?;
        let Value::Object(row) = value else {
            return Err(CatalogError::InvalidRow(raw_key));
        };
        if rows.insert(key, row).is_some() {
            return Err(CatalogError::DuplicateKey(key));
        }
    }
    Ok(rows)
}

fn rows_from_array(items: Vec<Value>, key_field: &str) -> CatalogResult<BTreeMap<RecordKey, Row>> {
    let mut rows = BTreeMap::new();
    for (index, item) in items.into_iter().enumerate() {
        let Value::Object(row) = item else {
            return Err(CatalogError::InvalidRow(format!("at index {index}")));
        };
        let key = row
            .get(key_field)
            .and_then(Value::as_i64)
            .ok_or_else(|| CatalogError::MissingKey {
                index,
                field: key_field.to_string(),
            })?;
        if rows.insert(key, row).is_some() {
            return Err(CatalogError::DuplicateKey(key));
        }
    }
    Ok(rows)
}

/// Infer a row descriptor from the rows it will describe.
///
/// Fields are the union of all row members. Missing members read as `null`
/// for scalars and as an empty sequence for sequences.
pub fn infer_descriptor<'a>(
    rows: impl IntoIterator<Item = &'a Row>,
    kind_hints: &BTreeMap<String, FieldKind>,
) -> RecordDescriptor<Row> {
    let mut kinds: BTreeMap<String, FieldKind> = BTreeMap::new();
    for row in rows {
        for (name, value) in row {
            let kind = kinds.entry(name.clone()).or_insert(FieldKind::Scalar);
            if value.is_array() {
                *kind = FieldKind::Sequence;
            }
        }
    }
    for (name, kind) in kind_hints {
        kinds.insert(name.clone(), *kind);
    }

    kinds
        .into_iter()
        .fold(RecordDescriptor::builder(), |builder, (name, kind)| {
            let member = name.clone();
            match kind {
                FieldKind::Scalar => builder.field(name, kind, move |row: &Row| {
                    Ok(row.get(&member).cloned().unwrap_or(Value::Null))
                }),
                FieldKind::Sequence => builder.field(name, kind, move |row: &Row| {
                    match row.get(&member) {
                        None | Some(Value::Null) => Ok(Value::Array(Vec::new())),
                        Some(Value::Array(items)) => Ok(Value::Array(items.clone())),
                        Some(other) => Err(CatalogError::ShapeMismatch {
                            field: member.clone(),
                            expected: FieldKind::Sequence,
                            found: value_type_name(other).to_string(),
                        }),
                    }
                }),
            }
        })
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn parses_object_form() {
        let text = r#"{"1": {"Name": "A", "Tags": ["x"]}, "2": {"Name": "B"}}"#;
        let catalog = parse_json_catalog(text, &LoadOptions::default()).unwrap();
        assert_eq!(catalog.keys().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(catalog.schema().kind("Tags"), Some(FieldKind::Sequence));
        assert_eq!(catalog.schema().kind("Name"), Some(FieldKind::Scalar));

        let second = catalog.get(2).unwrap();
        assert!(catalog.sequence_value(second, "Tags").unwrap().is_empty());
    }

    #[test]
    fn parses_array_form_with_key_field() {
        let text = r#"[{"ID": 7, "Name": "A"}, {"ID": 3, "Name": "B"}]"#;
        let options = LoadOptions {
            key_field: Some("ID".into()),
            ..Default::default()
        };
        let catalog = parse_json_catalog(text, &options).unwrap();
        assert_eq!(catalog.keys().collect::<Vec<_>>(), vec![3, 7]);
        let record = catalog.get(7).unwrap();
        assert_eq!(catalog.scalar_value(record, "Name").unwrap(), json!("A"));
    }

    #[test]
    fn missing_scalar_reads_null() {
        let text = r#"{"1": {"Name": "A"}, "2": {"Other": 1}}"#;
        let catalog = parse_json_catalog(text, &LoadOptions::default()).unwrap();
        let record = catalog.get(2).unwrap();
        assert_eq!(catalog.scalar_value(record, "Name").unwrap(), Value::Null);
    }

    #[test]
    fn non_array_in_sequence_field_is_shape_mismatch() {
        let text = r#"{"1": {"Tags": ["x"]}, "2": {"Tags": "x"}}"#;
        let catalog = parse_json_catalog(text, &LoadOptions::default()).unwrap();
        let record = catalog.get(2).unwrap();
        assert!(matches!(
            catalog.sequence_value(record, "Tags"),
            Err(CatalogError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn kind_hints_override_inference() {
        let text = r#"{"1": {"Tags": null}}"#;
        let mut options = LoadOptions::default();
        options
            .kind_hints
            .insert("Tags".into(), FieldKind::Sequence);
        let catalog = parse_json_catalog(text, &options).unwrap();
        assert_eq!(catalog.schema().kind("Tags"), Some(FieldKind::Sequence));
    }

    #[test]
    fn rejects_bad_documents() {
        let options = LoadOptions::default();
        assert!(matches!(
            parse_json_catalog(r#"{"abc": {}}"#, &options),
            Err(CatalogError::InvalidKey(_))
        ));
        assert!(matches!(
            parse_json_catalog(r#"{"1": 5}"#, &options),
            Err(CatalogError::InvalidRow(_))
        ));
        assert!(matches!(
            parse_json_catalog(r#"[{"name": "x"}]"#, &options),
            Err(CatalogError::MissingKey { index: 0, .. })
        ));
        assert!(matches!(
            parse_json_catalog(r#"[{"id": 1}, {"id": 1}]"#, &options),
            Err(CatalogError::DuplicateKey(1))
        ));
        assert!(matches!(
            parse_json_catalog("42", &options),
            Err(CatalogError::UnsupportedDocument(_))
        ));
        assert!(matches!(
            parse_json_catalog("{", &options),
            Err(CatalogError::Json(_))
        ));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"5": {{"Name": "A"}}}}"#).unwrap();

        let catalog = load_json_catalog(file.path(), &LoadOptions::default()).unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(catalog.contains_key(5));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_json_catalog(dir.path().join("absent.json"), &LoadOptions::default());
        assert!(matches!(result, Err(CatalogError::Io(_))));
    }
}
