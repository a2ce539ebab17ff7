//! Token normalisation and property-path helpers.
//!
//! Two normal forms are used for comparison:
//!
//! - the *display form* ([`display_form`]): strings as their raw text, every
//!   other value as compact JSON. `"1"` and `1` share a display form.
//! - the *JSON form* ([`json_form`]): compact JSON text for every value, so
//!   `"1"` and `1` differ.

use std::borrow::Cow;

use serde_json::Value;

/// String-normalised representation of a leaf value.
pub fn display_form(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s.as_str()),
        other => Cow::Owned(other.to_string()),
    }
}

/// Compact JSON text of a value.
pub fn json_form(value: &Value) -> String {
    value.to_string()
}

/// Returns `true` for JSON objects.
pub fn is_object_like(value: &Value) -> bool {
    matches!(value, Value::Object(_))
}

/// `path[index]`
pub fn index_path(path: &str, index: usize) -> String {
    format!("{path}[{index}]")
}

/// `path.member`, or just `member` at the root.
pub fn member_path(path: &str, member: &str) -> String {
    if path.is_empty() {
        member.to_string()
    } else {
        format!("{path}.{member}")
    }
}
