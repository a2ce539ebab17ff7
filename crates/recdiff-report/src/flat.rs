use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use recdiff_catalog::{Record, RecordCatalog};
use recdiff_types::token::index_path;
use recdiff_types::{ChangeEntry, DiffReport, RecordKey};

use crate::error::{ReportError, ReportResult};
use crate::shape::Render;

/// What happened to a record in a [`FlatReport`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlatOperation {
    Added,
    Removed,
    Modified,
}

/// One touched record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlatEntry {
    /// The record with sequence fields spread into `Name[i]` members. For
    /// modified records this is the previous version.
    pub row: Map<String, Value>,
    pub op: FlatOperation,
    /// Change entries; `null` unless the record was modified.
    pub diff: Option<Vec<ChangeEntry>>,
}

/// Added, removed and modified records as one list of flat rows, in that
/// order and by ascending key within each group.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlatReport(Vec<FlatEntry>);

impl FlatReport {
    pub fn build<P: Record, C: Record>(
        previous: &RecordCatalog<P>,
        current: &RecordCatalog<C>,
        report: &DiffReport,
    ) -> ReportResult<Self> {
        let mut entries = Vec::with_capacity(
            report.added_keys.len() + report.removed_keys.len() + report.changed_records.len(),
        );
        for &key in &report.added_keys {
            entries.push(FlatEntry {
                row: flatten(key, current.get(key)?)?,
                op: FlatOperation::Added,
                diff: None,
            });
        }
        for &key in &report.removed_keys {
            entries.push(FlatEntry {
                row: flatten(key, previous.get(key)?)?,
                op: FlatOperation::Removed,
                diff: None,
            });
        }
        for (&key, changes) in &report.changed_records {
            entries.push(FlatEntry {
                row: flatten(key, previous.get(key)?)?,
                op: FlatOperation::Modified,
                diff: Some(changes.clone()),
            });
        }
        Ok(Self(entries))
    }

    pub fn entries(&self) -> &[FlatEntry] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Render for FlatReport {}

fn flatten<R: Record>(key: RecordKey, record: &R) -> ReportResult<Map<String, Value>> {
    let Value::Object(members) = serde_json::to_value(record)? else {
        return Err(ReportError::NotAnObject(key));
    };
    let mut row = Map::new();
    for (name, value) in members {
        match value {
            Value::Array(items) => {
                for (i, item) in items.into_iter().enumerate() {
                    row.insert(index_path(&name, i), item);
                }
            }
            other => {
                row.insert(name, other);
            }
        }
    }
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use recdiff_catalog::{parse_json_catalog, LoadOptions};
    use serde_json::json;

    #[test]
    fn flattens_sequences_into_columns() {
        let row = flatten(1, &json!({"Name": "A", "Tags": ["x", "y"], "Empty": []})).unwrap();
        assert_eq!(
            Value::Object(row),
            json!({"Name": "A", "Tags[0]": "x", "Tags[1]": "y"})
        );
    }

    #[test]
    fn non_object_record_fails() {
        assert!(matches!(
            flatten(4, &json!("text")),
            Err(ReportError::NotAnObject(4))
        ));
    }

    #[test]
    fn groups_in_order() {
        let options = LoadOptions::default();
        let previous = parse_json_catalog(
            r#"{"1": {"Name": "A", "Tags": ["x"]}, "2": {"Name": "B", "Tags": []}}"#,
            &options,
        )
        .unwrap();
        let current = parse_json_catalog(r#"{"1": {"Name": "C", "Tags": ["x"]}, "3": {"Name": "D", "Tags": []}}"#, &options).unwrap();
        let mut report = DiffReport::new();
        report.added_keys = vec![3];
        report.removed_keys = vec![2];
        report
            .changed_records
            .insert(1, vec![ChangeEntry::replace("Name", json!("C"), json!("A"))]);

        let flat = FlatReport::build(&previous, &current, &report).unwrap();
        let ops: Vec<_> = flat.entries().iter().map(|e| e.op).collect();
        assert_eq!(
            ops,
            vec![FlatOperation::Added, FlatOperation::Removed, FlatOperation::Modified]
        );
        assert_eq!(flat.entries()[2].row["Tags[0]"], json!("x"));

        let value: Value = serde_json::from_str(&flat.to_json_string(false).unwrap()).unwrap();
        assert_eq!(value[0]["op"], json!("Added"));
        assert_eq!(value[0]["diff"], Value::Null);
        assert_eq!(value[2]["diff"][0]["property"], json!("Name"));
    }
}
