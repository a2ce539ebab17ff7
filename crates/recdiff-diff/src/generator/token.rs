use std::borrow::Cow;

use serde_json::{Map, Value};

use recdiff_catalog::{CatalogError, Record, RecordCatalog};
use recdiff_types::token::{json_form, member_path};
use recdiff_types::ChangeEntry;

use crate::config::{ArrayStrategy, DiffConfig, ShapeChangePolicy};
use crate::error::{DiffError, DiffResult, Side};
use crate::generator::DiffGenerator;
use crate::plan::FieldPlan;
use crate::sequence::{self, Shaped};

/// Generator that compares serialized JSON trees.
///
/// Each record is serialized once with `serde_json`. Leaves are compared
/// structurally (`"1"` and `1` differ), objects member by member, and arrays
/// with the configured strategy. Under the ordinal strategy element pairs are
/// compared recursively, so nested arrays and objects yield paths such as
/// `Matrix[1][0]` or `Items[2].name`.
///
/// Planned fields are looked up by name in the tree. A field the tree does not
/// carry, such as a descriptor field whose serde name differs, is read through
/// the catalog's descriptor instead.
pub struct TokenGenerator<'a, P, C> {
    previous: &'a RecordCatalog<P>,
    current: &'a RecordCatalog<C>,
    plan: FieldPlan,
    strategy: ArrayStrategy,
    shape_change: ShapeChangePolicy,
}

impl<'a, P: Record, C: Record> TokenGenerator<'a, P, C> {
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
}

impl<P, C> TokenGenerator<'_, P, C> {
    fn compare(&self, path: &str, a: &Value, b: &Value, out: &mut Vec<ChangeEntry>) -> DiffResult<()> {
        match (a, b) {
            (Value::Array(x), Value::Array(y)) => self.compare_arrays(path, x, y, out),
            (Value::Array(x), _) => {
                sequence::shape_change(path, Shaped::Sequence(x), Shaped::Scalar(b), self.shape_change, out)
            }
            (_, Value::Array(y)) => {
                sequence::shape_change(path, Shaped::Scalar(a), Shaped::Sequence(y), self.shape_change, out)
            }
            (Value::Object(x), Value::Object(y)) => self.compare_objects(path, x, y, out),
            _ => {
                if a != b {
                    out.push(ChangeEntry::replace(path, b.clone(), a.clone()));
                }
                Ok(())
            }
        }
    }

    fn compare_arrays(&self, path: &str, a: &[Value], b: &[Value], out: &mut Vec<ChangeEntry>) -> DiffResult<()> {
        match self.strategy {
            ArrayStrategy::Ordinal => {
                sequence::ordinal(path, a, b, out, |at, x, y, out| self.compare(at, x, y, out))
            }
            ArrayStrategy::Lcs => {
                sequence::lcs(path, a, b, out, json_form);
                Ok(())
            }
        }
    }

    fn compare_objects(
        &self,
        path: &str,
        a: &Map<String, Value>,
        b: &Map<String, Value>,
        out: &mut Vec<ChangeEntry>,
    ) -> DiffResult<()> {
        let mut members: Vec<&String> = a.keys().chain(b.keys().filter(|k| !a.contains_key(*k))).collect();
        members.sort();

        for member in members {
            let at = member_path(path, member);
            match (a.get(member), b.get(member)) {
                (Some(x), Some(y)) => self.compare(&at, x, y, out)?,
                (Some(x), None) => out.push(ChangeEntry::remove(at, x.clone())),
                (None, Some(y)) => out.push(ChangeEntry::add(at, y.clone())),
                (None, None) => {}
            }
        }
        Ok(())
    }
}

impl<P: Record, C: Record> DiffGenerator<P, C> for TokenGenerator<'_, P, C> {
    fn plan(&self) -> &FieldPlan {
        &self.plan
    }

    fn generate(&self, previous: Option<&P>, current: Option<&C>) -> DiffResult<Vec<ChangeEntry>> {
        let previous = previous.ok_or(DiffError::NullRecord(Side::Previous))?;
        let current = current.ok_or(DiffError::NullRecord(Side::Current))?;
        let previous_tree = to_tree(previous, Side::Previous)?;
        let current_tree = to_tree(current, Side::Current)?;
        let mut out = Vec::new();

        for name in &self.plan.common {
            let a = member(self.previous, previous, &previous_tree, name)?;
            let b = member(self.current, current, &current_tree, name)?;
            self.compare(name, &a, &b, &mut out)?;
        }
        for name in &self.plan.added {
            match member(self.current, current, &current_tree, name)?.as_ref() {
                Value::Array(items) => sequence::add_all(name, items, &mut out),
                value => out.push(ChangeEntry::add(name.as_str(), value.clone())),
            }
        }
        for name in &self.plan.removed {
            match member(self.previous, previous, &previous_tree, name)?.as_ref() {
                Value::Array(items) => sequence::remove_all(name, items, &mut out),
                value => out.push(ChangeEntry::remove(name.as_str(), value.clone())),
            }
        }

        Ok(out)
    }
}

fn to_tree<R: Record>(record: &R, side: Side) -> DiffResult<Map<String, Value>> {
    match serde_json::to_value(record).map_err(|e| DiffError::Serialization(e.to_string()))? {
        Value::Object(map) => Ok(map),
        other => Err(DiffError::MalformedToken {
            path: String::new(),
            reason: format!("{side} record serialized to {}, expected an object", kind_name(&other)),
        }),
    }
}

/// The tree member called `name`, or the descriptor's reading of the field.
fn member<'t, R: Record>(
    catalog: &RecordCatalog<R>,
    record: &R,
    tree: &'t Map<String, Value>,
    name: &str,
) -> DiffResult<Cow<'t, Value>> {
    if let Some(value) = tree.get(name) {
        return Ok(Cow::Borrowed(value));
    }
    let field = catalog
        .descriptor()
        .field(name)
        .ok_or_else(|| CatalogError::UnknownField(name.to_string()))?;
    Ok(Cow::Owned(field.read(record)?))
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
