use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use recdiff_types::{ChangeEntry, DiffReport, KeyFailure, RecordKey};

use crate::shape::Render;

/// Keys only, plus the change entries of every changed record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SimpleReport {
    pub added_records: Vec<RecordKey>,
    pub removed_records: Vec<RecordKey>,
    pub changed_records: BTreeMap<RecordKey, Vec<ChangeEntry>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<KeyFailure>,
}

impl From<&DiffReport> for SimpleReport {
    fn from(report: &DiffReport) -> Self {
        Self {
            added_records: report.added_keys.clone(),
            removed_records: report.removed_keys.clone(),
            changed_records: report.changed_records.clone(),
            failures: report.failures.clone(),
        }
    }
}

impl From<DiffReport> for SimpleReport {
    fn from(report: DiffReport) -> Self {
        Self {
            added_records: report.added_keys,
            removed_records: report.removed_keys,
            changed_records: report.changed_records,
            failures: report.failures,
        }
    }
}

impl Render for SimpleReport {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn serializes_with_record_names() {
        let mut report = DiffReport::new();
        report.added_keys = vec![3];
        report.removed_keys = vec![2];
        report
            .changed_records
            .insert(1, vec![ChangeEntry::replace("Name", json!("B"), json!("A"))]);

        let simple = SimpleReport::from(&report);
        let value: Value = serde_json::from_str(&simple.to_json_string(false).unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "AddedRecords": [3],
                "RemovedRecords": [2],
                "ChangedRecords": {
                    "1": [{"op": "Replace", "property": "Name", "currentvalue": "B", "previousvalue": "A"}]
                }
            })
        );
    }

    #[test]
    fn failures_are_kept() {
        let mut report = DiffReport::new();
        report.failures.push(KeyFailure {
            key: 9,
            reason: "bad".into(),
        });
        let simple = SimpleReport::from(report);
        let text = simple.to_json_string(false).unwrap();
        assert!(text.contains("\"Failures\""));
        let back: SimpleReport = serde_json::from_str(&text).unwrap();
        assert_eq!(back, simple);
    }
}
