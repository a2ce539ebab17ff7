//! Field plans: the common/added/removed partition of two schemas.

use serde::Serialize;

use recdiff_types::Schema;

/// The partition of field names between a previous and a current schema.
///
/// The three lists are pairwise disjoint, each sorted lexicographically, and
/// together cover every field name of both schemas. A plan is computed once
/// per run and shared by every record pair.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FieldPlan {
    /// Fields present in both schemas.
    pub common: Vec<String>,
    /// Fields present only in the current schema.
    pub added: Vec<String>,
    /// Fields present only in the previous schema.
    pub removed: Vec<String>,
}

impl FieldPlan {
    /// Partition the fields of `previous` and `current`.
    pub fn build(previous: &Schema, current: &Schema) -> Self {
        let common = previous
            .names()
            .filter(|name| current.contains(name))
            .map(str::to_string)
            .collect();
        let added = current
            .names()
            .filter(|name| !previous.contains(name))
            .map(str::to_string)
            .collect();
        let removed = previous
            .names()
            .filter(|name| !current.contains(name))
            .map(str::to_string)
            .collect();

        Self {
            common,
            added,
            removed,
        }
    }

    /// Total number of distinct field names.
    pub fn count(&self) -> usize {
        self.common.len() + self.added.len() + self.removed.len()
    }

    /// Returns `true` if no field was added or removed.
    pub fn has_matching_fields(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recdiff_types::FieldKind;

    fn schema(names: &[&str]) -> Schema {
        names
            .iter()
            .map(|name| (name.to_string(), FieldKind::Scalar))
            .collect()
    }

    #[test]
    fn partitions_fields() {
        let previous = schema(&["Name", "Level", "Old"]);
        let current = schema(&["Name", "Level", "New", "Another"]);

        let plan = FieldPlan::build(&previous, &current);
        assert_eq!(plan.common, vec!["Level", "Name"]);
        assert_eq!(plan.added, vec!["Another", "New"]);
        assert_eq!(plan.removed, vec!["Old"]);
        assert_eq!(plan.count(), 5);
        assert!(!plan.has_matching_fields());
    }

    #[test]
    fn identical_schemas_match() {
        let s = schema(&["B", "A"]);
        let plan = FieldPlan::build(&s, &s);
        assert_eq!(plan.common, vec!["A", "B"]);
        assert!(plan.has_matching_fields());
        assert_eq!(plan.count(), 2);
    }

    #[test]
    fn disjoint_schemas() {
        let plan = FieldPlan::build(&schema(&["A"]), &schema(&["B"]));
        assert!(plan.common.is_empty());
        assert_eq!(plan.added, vec!["B"]);
        assert_eq!(plan.removed, vec!["A"]);
    }

    #[test]
    fn empty_schemas() {
        let plan = FieldPlan::build(&Schema::new(), &Schema::new());
        assert_eq!(plan.count(), 0);
        assert!(plan.has_matching_fields());
    }
}
