use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use recdiff_catalog::{Record, RecordCatalog};
use recdiff_types::{ChangeEntry, DiffReport, KeyFailure, RecordKey};

use crate::error::ReportResult;
use crate::shape::Render;

/// Full records alongside the change entries.
///
/// Changed records are given in their previous version; applying `diffs`
/// to them describes the current one.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExtendedReport {
    pub added_records: BTreeMap<RecordKey, Value>,
    pub removed_records: BTreeMap<RecordKey, Value>,
    pub changed_records: BTreeMap<RecordKey, Value>,
    pub diffs: BTreeMap<RecordKey, Vec<ChangeEntry>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<KeyFailure>,
}

impl ExtendedReport {
    pub fn build<P: Record, C: Record>(
        previous: &RecordCatalog<P>,
        current: &RecordCatalog<C>,
        report: &DiffReport,
    ) -> ReportResult<Self> {
        Ok(Self {
            added_records: records(current, &report.added_keys)?,
            removed_records: records(previous, &report.removed_keys)?,
            changed_records: records(previous, report.changed_records.keys())?,
            diffs: report.changed_records.clone(),
            failures: report.failures.clone(),
        })
    }
}

impl Render for ExtendedReport {}

fn records<'k, R: Record>(
    catalog: &RecordCatalog<R>,
    keys: impl IntoIterator<Item = &'k RecordKey>,
) -> ReportResult<BTreeMap<RecordKey, Value>> {
    keys.into_iter()
        .map(|&key| -> ReportResult<(RecordKey, Value)> {
            Ok((key, serde_json::to_value(catalog.get(key)?)?))
        })
        .collect()
}
