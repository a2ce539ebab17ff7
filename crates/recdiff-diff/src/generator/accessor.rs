use serde_json::Value;

use recdiff_catalog::{CatalogError, Record, RecordCatalog};
use recdiff_types::token::{display_form, is_object_like};
use recdiff_types::{ChangeEntry, FieldKind};

use crate::config::{ArrayStrategy, DiffConfig, ShapeChangePolicy};
use crate::error::{DiffError, DiffResult, Side};
use crate::generator::DiffGenerator;
use crate::plan::FieldPlan;
use crate::sequence::{self, Shaped};

/// Generator that reads fields through the catalogs' descriptors.
///
/// Scalars are compared on their display form, so `"1"` and `1` are equal.
/// Object values are compared structurally and never equal a non-object.
/// Sequence elements are compared as leaves.
pub struct AccessorGenerator<'a, P, C> {
    previous: &'a RecordCatalog<P>,
    current: &'a RecordCatalog<C>,
    plan: FieldPlan,
    strategy: ArrayStrategy,
    shape_change: ShapeChangePolicy,
}

/// A field value read through a descriptor.
enum FieldValue {
    Scalar(Value),
    Sequence(Vec<Value>),
}

impl FieldValue {
    fn shaped(&self) -> Shaped<'_> {
        match self {
            FieldValue::Scalar(value) => Shaped::Scalar(value),
            FieldValue::Sequence(items) => Shaped::Sequence(items),
        }
    }
}

impl<'a, P: Record, C: Record> AccessorGenerator<'a, P, C> {
    pub fn new(
        previous: &'a RecordCatalog<P>,
        current: &'a RecordCatalog<C>,
        config: &DiffConfig,
    ) -> Self {
        Self {
            previous,
            current,
            plan: FieldPlan::build(previous.schema(), current.schema()),
            strategy: config.array_strategy,
            shape_change: config.shape_change,
        }
    }

    fn compare(&self, name: &str, a: &FieldValue, b: &FieldValue, out: &mut Vec<ChangeEntry>) -> DiffResult<()> {
        match (a, b) {
            (FieldValue::Scalar(a), FieldValue::Scalar(b)) => {
                compare_leaf(name, a, b, out);
                Ok(())
            }
            (FieldValue::Sequence(a), FieldValue::Sequence(b)) => match self.strategy {
                ArrayStrategy::Ordinal => sequence::ordinal(name, a, b, out, |path, x, y, out| {
                    compare_leaf(path, x, y, out);
                    Ok(())
                }),
                ArrayStrategy::Lcs => {
                    sequence::lcs(name, a, b, out, |v| display_form(v).into_owned());
                    Ok(())
                }
            },
            _ => sequence::shape_change(name, a.shaped(), b.shaped(), self.shape_change, out),
        }
    }
}

impl<P: Record, C: Record> DiffGenerator<P, C> for AccessorGenerator<'_, P, C> {
    fn plan(&self) -> &FieldPlan {
        &self.plan
    }

    fn generate(&self, previous: Option<&P>, current: Option<&C>) -> DiffResult<Vec<ChangeEntry>> {
        let previous = previous.ok_or(DiffError::NullRecord(Side::Previous))?;
        let current = current.ok_or(DiffError::NullRecord(Side::Current))?;
        let mut out = Vec::new();

        for name in &self.plan.common {
            let a = read(self.previous, previous, name)?;
            let b = read(self.current, current, name)?;
            self.compare(name, &a, &b, &mut out)?;
        }
        for name in &self.plan.added {
            match read(self.current, current, name)? {
                FieldValue::Scalar(value) => out.push(ChangeEntry::add(name.as_str(), value)),
                FieldValue::Sequence(items) => sequence::add_all(name, &items, &mut out),
            }
        }
        for name in &self.plan.removed {
            match read(self.previous, previous, name)? {
                FieldValue::Scalar(value) => out.push(ChangeEntry::remove(name.as_str(), value)),
                FieldValue::Sequence(items) => sequence::remove_all(name, &items, &mut out),
            }
        }

        Ok(out)
    }
}

fn read<R: Record>(catalog: &RecordCatalog<R>, record: &R, name: &str) -> DiffResult<FieldValue> {
    let kind = catalog
        .schema()
        .kind(name)
        .ok_or_else(|| CatalogError::UnknownField(name.to_string()))?;
    Ok(match kind {
        FieldKind::Scalar => FieldValue::Scalar(catalog.scalar_value(record, name)?),
        FieldKind::Sequence => FieldValue::Sequence(catalog.sequence_value(record, name)?),
    })
}

/// Push a `Replace` if two leaves differ.
fn compare_leaf(path: &str, previous: &Value, current: &Value, out: &mut Vec<ChangeEntry>) {
    let differ = match (is_object_like(previous), is_object_like(current)) {
        (false, false) => display_form(previous) != display_form(current),
        (true, true) => previous != current,
        _ => true,
    };
    if differ {
        out.push(ChangeEntry::replace(path, current.clone(), previous.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recdiff_catalog::{Describe, RecordDescriptor};
    use serde::Serialize;
    use serde_json::json;

    #[derive(Serialize, Clone)]
    struct Unit {
        name: String,
        level: i64,
        tags: Vec<String>,
    }

    impl Describe for Unit {
        fn describe() -> RecordDescriptor<Self> {
            RecordDescriptor::builder()
                .scalar("Name", |r: &Unit| json!(r.name))
                .scalar("Level", |r: &Unit| json!(r.level))
                .sequence("Tags", |r: &Unit| r.tags.iter().map(|t| json!(t)).collect())
                .build()
        }
    }

    fn unit(name: &str, level: i64, tags: &[&str]) -> Unit {
        Unit {
            name: name.into(),
            level,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn diff_with(config: DiffConfig, a: Unit, b: Unit) -> DiffResult<Vec<ChangeEntry>> {
        let previous = RecordCatalog::new(vec![(1, a)]);
        let current = RecordCatalog::new(vec![(1, b)]);
        let generator = AccessorGenerator::new(&previous, &current, &config);
        generator.generate(previous.lookup(1), current.lookup(1))
    }

    #[test]
    fn identical_records_have_no_changes() {
        let u = unit("A", 1, &["x"]);
        assert!(diff_with(DiffConfig::default(), u.clone(), u).unwrap().is_empty());
    }

    #[test]
    fn common_fields_in_lexicographic_order() {
        let entries = diff_with(
            DiffConfig::default(),
            unit("A", 1, &["x"]),
            unit("B", 2, &["y"]),
        )
        .unwrap();
        let properties: Vec<_> = entries.iter().map(|e| e.property.as_str()).collect();
        assert_eq!(properties, vec!["Level", "Name", "Tags[0]"]);
    }

    #[test]
    fn lcs_strategy_reports_middle_removal() {
        let config = DiffConfig {
            array_strategy: ArrayStrategy::Lcs,
            ..Default::default()
        };
        let entries = diff_with(config, unit("A", 1, &["x", "y", "z"]), unit("A", 1, &["x", "z"])).unwrap();
        assert_eq!(entries, vec![ChangeEntry::remove("Tags[1]", json!("y"))]);
    }

    #[test]
    fn absent_records_are_rejected() {
        let catalog = RecordCatalog::new(vec![(1, unit("A", 1, &[]))]);
        let generator = AccessorGenerator::new(&catalog, &catalog, &DiffConfig::default());
        assert!(matches!(
            generator.generate(None, catalog.lookup(1)),
            Err(DiffError::NullRecord(Side::Previous))
        ));
        assert!(matches!(
            generator.generate(catalog.lookup(1), None),
            Err(DiffError::NullRecord(Side::Current))
        ));
    }

    #[test]
    fn added_and_removed_fields() {
        #[derive(Serialize)]
        struct Slim {
            name: String,
            slots: Vec<i64>,
        }
        impl Describe for Slim {
            fn describe() -> RecordDescriptor<Self> {
                RecordDescriptor::builder()
                    .scalar("Name", |r: &Slim| json!(r.name))
                    .sequence("Slots", |r: &Slim| r.slots.iter().map(|s| json!(s)).collect())
                    .build()
            }
        }

        let previous = RecordCatalog::new(vec![(1, unit("A", 3, &["x", "y"]))]);
        let current = RecordCatalog::new(vec![(
            1,
            Slim {
                name: "A".into(),
                slots: vec![7, 8],
            },
        )]);
        let generator = AccessorGenerator::new(&previous, &current, &DiffConfig::default());
        let entries = generator
            .generate(previous.lookup(1), current.lookup(1))
            .unwrap();
        assert_eq!(
            entries,
            vec![
                ChangeEntry::add("Slots[0]", json!(7)),
                ChangeEntry::add("Slots[1]", json!(8)),
                ChangeEntry::remove("Level", json!(3)),
                ChangeEntry::remove("Tags[0]", json!("x")),
                ChangeEntry::remove("Tags[1]", json!("y")),
            ]
        );
    }

    #[test]
    fn leaves_compare_on_display_form() {
        let mut out = Vec::new();
        compare_leaf("Level", &json!("1"), &json!(1), &mut out);
        assert!(out.is_empty());

        compare_leaf("Stats", &json!({"hp": 1}), &json!({"hp": 1}), &mut out);
        assert!(out.is_empty());

        compare_leaf("Stats", &json!({"hp": 1}), &json!("{\"hp\":1}"), &mut out);
        assert_eq!(out.len(), 1, "object against string is always a replace");
    }

    #[test]
    fn shape_change_follows_policy() {
        let scalar_tags: RecordDescriptor<Unit> = RecordDescriptor::builder()
            .scalar("Tags", |r: &Unit| json!(r.tags.join(",")))
            .build();
        let sequence_tags: RecordDescriptor<Unit> = RecordDescriptor::builder()
            .sequence("Tags", |r: &Unit| r.tags.iter().map(|t| json!(t)).collect())
            .build();
        let previous = RecordCatalog::with_descriptor(vec![(1, unit("A", 1, &["x"]))], scalar_tags);
        let current = RecordCatalog::with_descriptor(vec![(1, unit("A", 1, &["x", "y"]))], sequence_tags);

        let generator = AccessorGenerator::new(&previous, &current, &DiffConfig::default());
        let entries = generator
            .generate(previous.lookup(1), current.lookup(1))
            .unwrap();
        assert_eq!(
            entries,
            vec![
                ChangeEntry::remove("Tags", json!("x")),
                ChangeEntry::add("Tags[0]", json!("x")),
                ChangeEntry::add("Tags[1]", json!("y")),
            ]
        );

        let config = DiffConfig {
            shape_change: ShapeChangePolicy::Reject,
            ..Default::default()
        };
        let generator = AccessorGenerator::new(&previous, &current, &config);
        assert!(matches!(
            generator.generate(previous.lookup(1), current.lookup(1)),
            Err(DiffError::UnsupportedShapeChange { .. })
        ));
    }
}
