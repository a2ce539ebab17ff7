//! Change entries: one atomic field-level difference between two records.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TypeError;

/// The kind of change recorded by a [`ChangeEntry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiffOperation {
    /// The property exists only in the current record.
    Add,
    /// The property exists only in the previous record.
    Remove,
    /// The property exists in both records with different values.
    Replace,
}

impl fmt::Display for DiffOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffOperation::Add => write!(f, "Add"),
            DiffOperation::Remove => write!(f, "Remove"),
            DiffOperation::Replace => write!(f, "Replace"),
        }
    }
}

impl FromStr for DiffOperation {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "add" => Ok(DiffOperation::Add),
            "remove" => Ok(DiffOperation::Remove),
            "replace" => Ok(DiffOperation::Replace),
            other => Err(TypeError::UnknownOperation(other.to_string())),
        }
    }
}

/// A single change at a property path.
///
/// `property` names the field, optionally followed by a bracketed sequence
/// index (`"Tags[2]"`) or a member path (`"Stats.hp"`). It is never absent;
/// the empty string denotes the record root.
///
/// `current_value` is set unless the operation is [`DiffOperation::Remove`];
/// `previous_value` is set unless the operation is [`DiffOperation::Add`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChangeEntry {
    #[serde(rename = "op")]
    pub operation: DiffOperation,

    pub property: String,

    #[serde(rename = "currentvalue", default, skip_serializing_if = "Option::is_none")]
    pub current_value: Option<Value>,

    #[serde(rename = "previousvalue", default, skip_serializing_if = "Option::is_none")]
    pub previous_value: Option<Value>,
}

impl ChangeEntry {
    /// A property that only exists in the current record.
    pub fn add(property: impl Into<String>, current: Value) -> Self {
        Self {
            operation: DiffOperation::Add,
            property: property.into(),
            current_value: Some(current),
            previous_value: None,
        }
    }

    /// A property that only exists in the previous record.
    pub fn remove(property: impl Into<String>, previous: Value) -> Self {
        Self {
            operation: DiffOperation::Remove,
            property: property.into(),
            current_value: None,
            previous_value: Some(previous),
        }
    }

    /// A property whose value changed.
    pub fn replace(property: impl Into<String>, current: Value, previous: Value) -> Self {
        Self {
            operation: DiffOperation::Replace,
            property: property.into(),
            current_value: Some(current),
            previous_value: Some(previous),
        }
    }

    /// Turn an `Add` into a `Replace` of `previous`.
    ///
    /// Used when a removal immediately follows an insertion at the same
    /// sequence position. Has no effect on entries that are not `Add`.
    pub fn absorb_removal(&mut self, previous: Value) {
        if self.operation == DiffOperation::Add {
            self.operation = DiffOperation::Replace;
            self.previous_value = Some(previous);
        }
    }
}

impl fmt::Display for ChangeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.operation, self.property)?;
        if let Some(current) = &self.current_value {
            write!(f, " {current}")?;
        }
        if let Some(previous) = &self.previous_value {
            write!(f, " {previous}")?;
        }
        Ok(())
    }
}
