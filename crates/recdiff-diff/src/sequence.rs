//! Reduction of sequence comparisons to change entries.
//!
//! Both generators share these helpers so that a sequence field produces the
//! same entries whichever way its values were read.

use serde_json::Value;

use recdiff_types::token::index_path;
use recdiff_types::{ChangeEntry, DiffOperation, FieldKind};

use crate::config::ShapeChangePolicy;
use crate::error::{DiffError, DiffResult};
use crate::lcs::{align, EditStep};

/// A field value together with its shape.
#[derive(Clone, Copy, Debug)]
pub enum Shaped<'a> {
    Scalar(&'a Value),
    Sequence(&'a [Value]),
}

impl Shaped<'_> {
    /// The kind this value has.
    pub fn kind(&self) -> FieldKind {
        match self {
            Shaped::Scalar(_) => FieldKind::Scalar,
            Shaped::Sequence(_) => FieldKind::Sequence,
        }
    }
}

/// Compare two sequences position by position.
///
/// `pair` handles each index present on both sides. Extra previous elements
/// become trailing removals, extra current elements trailing additions.
pub fn ordinal<F>(
    path: &str,
    previous: &[Value],
    current: &[Value],
    out: &mut Vec<ChangeEntry>,
    mut pair: F,
) -> DiffResult<()>
where
    F: FnMut(&str, &Value, &Value, &mut Vec<ChangeEntry>) -> DiffResult<()>,
{
    let shared = previous.len().min(current.len());
    for i in 0..shared {
        pair(&index_path(path, i), &previous[i], &current[i], out)?;
    }
    for (i, value) in previous.iter().enumerate().skip(shared) {
        out.push(ChangeEntry::remove(index_path(path, i), value.clone()));
    }
    for (i, value) in current.iter().enumerate().skip(shared) {
        out.push(ChangeEntry::add(index_path(path, i), value.clone()));
    }
    Ok(())
}

/// Compare two sequences by longest-common-subsequence alignment.
///
/// Elements are aligned on the tokens produced by `token`. Reported indices
/// are positions in the sequence after the preceding edits were applied; a
/// removal directly after an insertion at the same position is folded into
/// that insertion as a `Replace`.
pub fn lcs<K, F>(path: &str, previous: &[Value], current: &[Value], out: &mut Vec<ChangeEntry>, token: F)
where
    K: Eq,
    F: Fn(&Value) -> K,
{
    let previous_tokens: Vec<K> = previous.iter().map(&token).collect();
    let current_tokens: Vec<K> = current.iter().map(&token).collect();
    let script = align(&previous_tokens, &current_tokens);

    let mut offset: isize = 0;
    for step in script {
        match step {
            EditStep::Skip { .. } => {}
            EditStep::Add { previous: p, current: c } => {
                let at = shifted(p, offset);
                out.push(ChangeEntry::add(index_path(path, at), current[c].clone()));
                offset += 1;
            }
            EditStep::Remove { previous: p, .. } => {
                let at = shifted(p, offset);
                let removed = previous[p].clone();
                match out.last_mut() {
                    Some(last) if at > 0 && inserted_at(last, &index_path(path, at - 1)) => {
                        last.absorb_removal(removed);
                    }
                    _ => out.push(ChangeEntry::remove(index_path(path, at), removed)),
                }
                offset -= 1;
            }
        }
    }
}

fn shifted(index: usize, offset: isize) -> usize {
    index.saturating_add_signed(offset)
}

fn inserted_at(entry: &ChangeEntry, property: &str) -> bool {
    entry.operation == DiffOperation::Add && entry.property == property
}

/// One indexed `Add` per element.
pub fn add_all(path: &str, items: &[Value], out: &mut Vec<ChangeEntry>) {
    out.extend(
        items
            .iter()
            .enumerate()
            .map(|(i, item)| ChangeEntry::add(index_path(path, i), item.clone())),
    );
}

/// One indexed `Remove` per element.
pub fn remove_all(path: &str, items: &[Value], out: &mut Vec<ChangeEntry>) {
    out.extend(
        items
            .iter()
            .enumerate()
            .map(|(i, item)| ChangeEntry::remove(index_path(path, i), item.clone())),
    );
}

/// Handle a value that is a scalar on one side and a sequence on the other.
///
/// With [`ShapeChangePolicy::Decompose`] the old shape is removed and the new
/// shape added, never replaced directly. With [`ShapeChangePolicy::Reject`]
/// the field fails with [`DiffError::UnsupportedShapeChange`].
pub fn shape_change(
    path: &str,
    previous: Shaped<'_>,
    current: Shaped<'_>,
    policy: ShapeChangePolicy,
    out: &mut Vec<ChangeEntry>,
) -> DiffResult<()> {
    if policy == ShapeChangePolicy::Reject {
        return Err(DiffError::UnsupportedShapeChange {
            field: path.to_string(),
            previous: previous.kind(),
            current: current.kind(),
        });
    }
    match (previous, current) {
        (Shaped::Scalar(old), Shaped::Sequence(items)) => {
            out.push(ChangeEntry::remove(path, old.clone()));
            add_all(path, items, out);
        }
        (Shaped::Sequence(items), Shaped::Scalar(new)) => {
            out.push(ChangeEntry::add(path, new.clone()));
            remove_all(path, items, out);
        }
        // same shapes never reach here; fall back to a plain comparison
        (Shaped::Scalar(old), Shaped::Scalar(new)) => {
            if old != new {
                out.push(ChangeEntry::replace(path, new.clone(), old.clone()));
            }
        }
        (Shaped::Sequence(old), Shaped::Sequence(new)) => {
            lcs(path, old, new, out, |v| v.to_string());
        }
    }
    Ok(())
}
