//! The diff run: key partitioning, parallel fan-out, aggregation.

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use rayon::prelude::*;
use tracing::{debug, info};

use recdiff_catalog::{Record, RecordCatalog};
use recdiff_types::{ChangeEntry, DiffReport, RecordKey};

use crate::config::DiffConfig;
use crate::digest::Digester;
use crate::error::{DiffError, DiffResult};
use crate::generator::{build_generator, DiffGenerator};
use crate::policy::{policy_for, KeyErrorPolicy};

type KeyOutcome = (RecordKey, DiffResult<Vec<ChangeEntry>>);

/// Compares two catalogs.
///
/// Keys present in both catalogs are diffed on a rayon pool. Every worker
/// sends its outcome over a channel to one aggregating thread, so the
/// result map is never shared between workers.
#[derive(Clone, Debug)]
pub struct DiffEngine {
    config: DiffConfig,
    policy: Arc<dyn KeyErrorPolicy>,
}

impl Default for DiffEngine {
    fn default() -> Self {
        Self::new(DiffConfig::default())
    }
}

impl DiffEngine {
    /// Create an engine using the error policy named by `config`.
    pub fn new(config: DiffConfig) -> Self {
        let policy = policy_for(config.error_policy);
        Self { config, policy }
    }

    /// Replace the error policy.
    pub fn with_error_policy(mut self, policy: impl KeyErrorPolicy + 'static) -> Self {
        self.policy = Arc::new(policy);
        self
    }

    pub fn config(&self) -> &DiffConfig {
        &self.config
    }

    /// Diff `previous` against `current`.
    pub fn diff<P: Record, C: Record>(
        &self,
        previous: &RecordCatalog<P>,
        current: &RecordCatalog<C>,
    ) -> DiffResult<DiffReport> {
        let previous_keys = previous.key_set();
        let current_keys = current.key_set();
        let added_keys: Vec<RecordKey> = current_keys.difference(&previous_keys).copied().collect();
        let removed_keys: Vec<RecordKey> = previous_keys.difference(&current_keys).copied().collect();
        let common: Vec<RecordKey> = previous_keys.intersection(&current_keys).copied().collect();

        info!(
            previous = previous.len(),
            current = current.len(),
            common = common.len(),
            added = added_keys.len(),
            removed = removed_keys.len(),
            "starting diff run"
        );

        let generator = build_generator(previous, current, &self.config);
        let digester = self.digester(previous, current, generator.plan().has_matching_fields());

        let (changed_records, failed) = self.fan_out(&common, previous, current, generator.as_ref(), digester.as_ref())?;

        let mut report = DiffReport {
            added_keys,
            removed_keys,
            changed_records,
            failures: Vec::new(),
        };
        for (key, error) in failed {
            report.failures.push(self.policy.handle(key, error)?);
        }

        info!(
            changed = report.changed_count(),
            entries = report.entry_count(),
            failures = report.failures.len(),
            "diff run complete"
        );
        Ok(report)
    }

    fn digester<'a, P: Record, C: Record>(
        &self,
        previous: &'a RecordCatalog<P>,
        current: &'a RecordCatalog<C>,
        matching_fields: bool,
    ) -> Option<Digester<'a, P, C>> {
        if !self.config.digest_shortcut || !matching_fields {
            return None;
        }
        match Digester::new(previous, current) {
            Ok(digester) => Some(digester),
            Err(e) => {
                debug!(error = %e, "digest shortcut disabled");
                None
            }
        }
    }

    fn fan_out<P: Record, C: Record>(
        &self,
        keys: &[RecordKey],
        previous: &RecordCatalog<P>,
        current: &RecordCatalog<C>,
        generator: &dyn DiffGenerator<P, C>,
        digester: Option<&Digester<'_, P, C>>,
    ) -> DiffResult<(BTreeMap<RecordKey, Vec<ChangeEntry>>, BTreeMap<RecordKey, DiffError>)> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.threads)
            .build()
            .map_err(|e| DiffError::WorkerPool(e.to_string()))?;

        let (tx, rx) = mpsc::channel::<KeyOutcome>();

        thread::scope(|scope| {
            let aggregator = scope.spawn(move || {
                let mut changed = BTreeMap::new();
                let mut failed = BTreeMap::new();
                for (key, outcome) in rx {
                    match outcome {
                        Ok(entries) if entries.is_empty() => {}
                        Ok(entries) => {
                            changed.insert(key, entries);
                        }
                        Err(e) => {
                            failed.insert(key, e);
                        }
                    }
                }
                (changed, failed)
            });

            pool.install(|| {
                keys.par_iter().for_each_with(tx, |tx, &key| {
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                        diff_key(key, previous, current, generator, digester)
                    }))
                    .unwrap_or_else(|payload| {
                        Err(DiffError::WorkerPool(format!("worker panicked: {}", panic_message(&*payload))))
                    });
                    // the aggregator only stops once every sender is gone
                    let _ = tx.send((key, outcome));
                });
            });

            aggregator
                .join()
                .map_err(|_| DiffError::WorkerPool("aggregator thread panicked".into()))
        })
    }
}

fn diff_key<P: Record, C: Record>(
    key: RecordKey,
    previous: &RecordCatalog<P>,
    current: &RecordCatalog<C>,
    generator: &dyn DiffGenerator<P, C>,
    digester: Option<&Digester<'_, P, C>>,
) -> DiffResult<Vec<ChangeEntry>> {
    let a = previous.get(key)?;
    let b = current.get(key)?;
    if let Some(digester) = digester {
        if digester.unchanged(a, b)? {
            debug!(key, "digest match");
            return Ok(Vec::new());
        }
    }
    generator.generate(Some(a), Some(b))
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ArrayStrategy, ErrorPolicyKind, GeneratorKind};
    use crate::policy::SkipFailures;
    use recdiff_catalog::{parse_json_catalog, Describe, LoadOptions, RecordDescriptor, Row};
    use recdiff_types::DiffOperation;
    use serde::Serialize;
    use serde_json::json;

    #[derive(Serialize, Clone)]
    struct Item {
        name: String,
        tags: Vec<String>,
    }

    impl Describe for Item {
        fn describe() -> RecordDescriptor<Self> {
            RecordDescriptor::builder()
                .scalar("Name", |r: &Item| json!(r.name))
                .sequence("Tags", |r: &Item| r.tags.iter().map(|t| json!(t)).collect())
                .build()
        }
    }

    fn item(name: &str, tags: &[&str]) -> Item {
        Item {
            name: name.into(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn rows(text: &str) -> RecordCatalog<Row> {
        parse_json_catalog(text, &LoadOptions::default()).unwrap()
    }

    #[test]
    fn scalar_change_is_a_replace() {
        let previous = RecordCatalog::new(vec![(1, item("A", &[]))]);
        let current = RecordCatalog::new(vec![(1, item("B", &[]))]);
        let report = DiffEngine::default().diff(&previous, &current).unwrap();

        assert!(report.added_keys.is_empty());
        assert!(report.removed_keys.is_empty());
        assert_eq!(
            report.changes_for(1).unwrap(),
            &[ChangeEntry::replace("Name", json!("B"), json!("A"))]
        );
    }

    #[test]
    fn lcs_run_reports_single_removal() {
        let previous = RecordCatalog::new(vec![(1, item("A", &["x", "y", "z"]))]);
        let current = RecordCatalog::new(vec![(1, item("A", &["x", "z"]))]);
        let engine = DiffEngine::new(DiffConfig {
            array_strategy: ArrayStrategy::Lcs,
            ..Default::default()
        });
        let report = engine.diff(&previous, &current).unwrap();
        assert_eq!(
            report.changes_for(1).unwrap(),
            &[ChangeEntry::remove("Tags[1]", json!("y"))]
        );
    }

    #[test]
    fn added_and_removed_keys() {
        let previous = RecordCatalog::new(vec![(1, item("A", &[])), (2, item("B", &[]))]);
        let current = RecordCatalog::new(vec![(1, item("A", &[])), (3, item("C", &[]))]);
        let report = DiffEngine::default().diff(&previous, &current).unwrap();

        assert_eq!(report.removed_keys, vec![2]);
        assert_eq!(report.added_keys, vec![3]);
        assert!(report.changed_records.is_empty());
    }

    #[test]
    fn removed_field_emitted_per_record() {
        let previous = rows(r#"{"1": {"Name": "A", "Old": 5, "Gone": [1, 2]}, "2": {"Name": "B", "Old": 6, "Gone": []}}"#);
        let current = rows(r#"{"1": {"Name": "A"}, "2": {"Name": "B"}}"#);
        let report = DiffEngine::default().diff(&previous, &current).unwrap();

        assert_eq!(
            report.changes_for(1).unwrap(),
            &[
                ChangeEntry::remove("Gone[0]", json!(1)),
                ChangeEntry::remove("Gone[1]", json!(2)),
                ChangeEntry::remove("Old", json!(5)),
            ]
        );
        assert_eq!(
            report.changes_for(2).unwrap(),
            &[ChangeEntry::remove("Old", json!(6))]
        );
    }

    #[test]
    fn self_diff_is_empty() {
        let catalog = rows(r#"{"1": {"Name": "A", "Tags": ["x"]}, "2": {"Name": "B", "Stats": {"hp": 1}}}"#);
        for generator in [GeneratorKind::Accessor, GeneratorKind::Token] {
            for digest_shortcut in [true, false] {
                let engine = DiffEngine::new(DiffConfig {
                    generator,
                    digest_shortcut,
                    ..Default::default()
                });
                let report = engine.diff(&catalog, &catalog).unwrap();
                assert!(report.is_empty());
            }
        }
    }

    #[test]
    fn disjoint_key_sets() {
        let previous = RecordCatalog::new(vec![(1, item("A", &[])), (2, item("B", &[]))]);
        let current = RecordCatalog::new(vec![(3, item("C", &[]))]);
        let report = DiffEngine::default().diff(&previous, &current).unwrap();
        assert_eq!(report.removed_keys, vec![1, 2]);
        assert_eq!(report.added_keys, vec![3]);
        assert!(report.changed_records.is_empty());
    }

    #[test]
    fn many_keys_across_threads() {
        let previous = RecordCatalog::new((0..500).map(|k| (k, item(&format!("n{k}"), &["a", "b"]))));
        let current = RecordCatalog::new((0..500).map(|k| {
            let name = if k % 7 == 0 { format!("m{k}") } else { format!("n{k}") };
            (k, item(&name, &["a", "b"]))
        }));
        let engine = DiffEngine::new(DiffConfig {
            threads: 4,
            ..Default::default()
        });
        let report = engine.diff(&previous, &current).unwrap();
        assert_eq!(report.changed_count(), (0..500).filter(|k| k % 7 == 0).count());
        assert_eq!(report.count_operation(DiffOperation::Replace), report.changed_count());
    }

    #[test]
    fn shortcut_skips_only_identical_records() {
        let previous = RecordCatalog::new(vec![(1, item("A", &["x"])), (2, item("B", &["x"]))]);
        let current = RecordCatalog::new(vec![(1, item("A", &["x"])), (2, item("B", &["y"]))]);
        let report = DiffEngine::default().diff(&previous, &current).unwrap();
        assert!(report.changes_for(1).is_none());
        assert_eq!(report.changes_for(2).unwrap().len(), 1);
    }

    const BROKEN: &str = r#"{"1": {"Tags": ["x"]}, "2": {"Tags": "oops"}, "3": {"Tags": 5}, "4": {"Tags": ["y"]}}"#;
    const FIXED: &str = r#"{"1": {"Tags": ["x"]}, "2": {"Tags": ["a"]}, "3": {"Tags": ["b"]}, "4": {"Tags": ["z"]}}"#;

    #[test]
    fn abort_policy_reports_lowest_failing_key() {
        let err = DiffEngine::default()
            .diff(&rows(BROKEN), &rows(FIXED))
            .unwrap_err();
        assert!(matches!(err, DiffError::KeyFailed { key: 2, .. }));
    }

    #[test]
    fn skip_policy_records_failures() {
        let engine = DiffEngine::new(DiffConfig {
            error_policy: ErrorPolicyKind::Skip,
            ..Default::default()
        });
        let report = engine.diff(&rows(BROKEN), &rows(FIXED)).unwrap();
        let failed: Vec<_> = report.failures.iter().map(|f| f.key).collect();
        assert_eq!(failed, vec![2, 3]);
        assert_eq!(
            report.changes_for(4).unwrap(),
            &[ChangeEntry::replace("Tags[0]", json!("z"), json!("y"))]
        );
    }

    #[test]
    fn injected_policy_overrides_config() {
        let engine = DiffEngine::default().with_error_policy(SkipFailures);
        let report = engine.diff(&rows(BROKEN), &rows(FIXED)).unwrap();
        assert_eq!(report.failures.len(), 2);
    }

    #[test]
    fn token_generator_run() {
        let previous = rows(r#"{"1": {"Stats": {"hp": 1}, "Matrix": [[1], [2]]}}"#);
        let current = rows(r#"{"1": {"Stats": {"hp": 2}, "Matrix": [[1], [3]]}}"#);
        let engine = DiffEngine::new(DiffConfig {
            generator: GeneratorKind::Token,
            ..Default::default()
        });
        let report = engine.diff(&previous, &current).unwrap();
        assert_eq!(
            report.changes_for(1).unwrap(),
            &[
                ChangeEntry::replace("Matrix[1][0]", json!(3), json!(2)),
                ChangeEntry::replace("Stats.hp", json!(2), json!(1)),
            ]
        );
    }

    #[derive(Serialize)]
    struct Fragile {
        name: String,
    }

    impl Describe for Fragile {
        fn describe() -> RecordDescriptor<Self> {
            RecordDescriptor::builder()
                .scalar("Name", |r: &Fragile| {
                    if r.name == "boom" {
                        panic!("getter cannot read {}", r.name);
                    }
                    json!(r.name)
                })
                .build()
        }
    }

    fn fragile(names: &[(RecordKey, &str)]) -> RecordCatalog<Fragile> {
        RecordCatalog::new(names.iter().map(|(key, name)| (*key, Fragile { name: name.to_string() })))
    }

    #[test]
    fn panicking_getter_is_a_key_failure() {
        let previous = fragile(&[(1, "a"), (2, "boom"), (3, "c")]);
        let current = fragile(&[(1, "a"), (2, "b"), (3, "d")]);

        let engine = DiffEngine::new(DiffConfig {
            error_policy: ErrorPolicyKind::Skip,
            ..Default::default()
        });
        let report = engine.diff(&previous, &current).unwrap();
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].key, 2);
        assert!(report.failures[0].reason.contains("getter cannot read boom"));
        assert_eq!(
            report.changes_for(3).unwrap(),
            &[ChangeEntry::replace("Name", json!("d"), json!("c"))]
        );

        let err = DiffEngine::default().diff(&previous, &current).unwrap_err();
        assert!(matches!(
            err,
            DiffError::KeyFailed { key: 2, ref source } if matches!(**source, DiffError::WorkerPool(_))
        ));
    }
}
