//! The result of one comparison run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::change::{ChangeEntry, DiffOperation};
use crate::RecordKey;

/// The outcome of comparing two catalogs.
///
/// A key appears in at most one of `added_keys`, `removed_keys` and
/// `changed_records`. `changed_records` never holds an empty list: keys whose
/// records are unchanged are omitted entirely.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DiffReport {
    /// Keys present only in the current catalog, ascending.
    pub added_keys: Vec<RecordKey>,
    /// Keys present only in the previous catalog, ascending.
    pub removed_keys: Vec<RecordKey>,
    /// Per-key change lists for keys present in both catalogs.
    pub changed_records: BTreeMap<RecordKey, Vec<ChangeEntry>>,
    /// Keys whose diff failed and were skipped by the error policy.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<KeyFailure>,
}

impl DiffReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if nothing was added, removed, changed or skipped.
    pub fn is_empty(&self) -> bool {
        self.added_keys.is_empty()
            && self.removed_keys.is_empty()
            && self.changed_records.is_empty()
            && self.failures.is_empty()
    }

    /// Number of keys with at least one change entry.
    pub fn changed_count(&self) -> usize {
        self.changed_records.len()
    }

    /// Total number of change entries across all keys.
    pub fn entry_count(&self) -> usize {
        self.changed_records.values().map(Vec::len).sum()
    }

    /// Number of change entries with the given operation.
    pub fn count_operation(&self, operation: DiffOperation) -> usize {
        self.changed_records
            .values()
            .flatten()
            .filter(|entry| entry.operation == operation)
            .count()
    }

    /// The change list for `key`, if it changed.
    pub fn changes_for(&self, key: RecordKey) -> Option<&[ChangeEntry]> {
        self.changed_records.get(&key).map(Vec::as_slice)
    }
}

/// A key whose diff failed and was recorded instead of aborting the run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyFailure {
    pub key: RecordKey,
    pub reason: String,
}
