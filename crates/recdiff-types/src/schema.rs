//! Field schemas: the name → kind table derived once per catalog.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// The semantic shape of a record field.
///
/// The kind is fixed when a catalog is built and never inspected per value:
/// a `Sequence` field is always read as an ordered list of elements, a
/// `Scalar` field as a single leaf.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// A single leaf value.
    Scalar,
    /// An ordered sequence of leaf values.
    Sequence,
}

impl FieldKind {
    /// Returns `true` for [`FieldKind::Sequence`].
    pub fn is_sequence(&self) -> bool {
        matches!(self, FieldKind::Sequence)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Scalar => write!(f, "scalar"),
            FieldKind::Sequence => write!(f, "sequence"),
        }
    }
}

impl FromStr for FieldKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "scalar" => Ok(FieldKind::Scalar),
            "sequence" | "array" => Ok(FieldKind::Sequence),
            other => Err(TypeError::UnknownFieldKind(other.to_string())),
        }
    }
}

/// Mapping from field name to [`FieldKind`], ordered lexicographically by name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema(BTreeMap<String, FieldKind>);

impl Schema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or overwrite) a field.
    pub fn insert(&mut self, name: impl Into<String>, kind: FieldKind) {
        self.0.insert(name.into(), kind);
    }

    /// The kind of `name`, if the field exists.
    pub fn kind(&self, name: &str) -> Option<FieldKind> {
        self.0.get(name).copied()
    }

    /// Returns `true` if the schema has a field called `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Field names in lexicographic order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// `(name, kind)` pairs in lexicographic order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, FieldKind)> {
        self.0.iter().map(|(name, kind)| (name.as_str(), *kind))
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the schema has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, FieldKind)> for Schema {
    fn from_iter<I: IntoIterator<Item = (String, FieldKind)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
