//! Deep pick: keep only the parts of a value an updater actually read.

use serde_json::{Map, Value};

use crate::trace::PathSet;
use crate::util::json::{child, child_mut_or_insert, is_container};

/// Returns a copy of `value` holding only the recorded `paths`.
///
/// A path ending at a container that other recorded paths descend into
/// yields an empty container of the same kind, filled in by those deeper
/// paths. A path with no recorded descendants copies its whole subtree.
/// Paths missing from `value` are skipped. Intermediate containers mirror
/// the source kind, and arrays are padded with nulls up to the picked index.
pub fn narrow(value: &Value, paths: &PathSet) -> Value {
    let mut out = empty_like(value);

    for path in paths {
        if path.is_empty() {
            if !paths.has_descendant_of(path) {
                return value.clone();
            }
            continue;
        }
        pick_into(&mut out, value, path, paths.has_descendant_of(path));
    }

    out
}

fn pick_into(out: &mut Value, source: &Value, path: &[String], has_descendants: bool) -> Option<()> {
    let (last, parents) = path.split_last()?;

    // Check the whole path before creating anything in `out`.
    let mut source_parent = source;
    for segment in parents {
        source_parent = child(source_parent, segment)?;
    }
    let leaf = child(source_parent, last)?;

    // Every index exists in `source`, so padding is bounded by its arrays.
    let mut source = source;
    let mut target = out;
    for segment in parents {
        source = child(source, segment)?;
        let kind = empty_like(source);
        target = child_mut_or_insert(target, segment, usize::MAX, || kind).ok()?;
    }

    if is_container(leaf) && has_descendants {
        child_mut_or_insert(target, last, usize::MAX, || empty_like(leaf)).ok()?;
    } else {
        *child_mut_or_insert(target, last, usize::MAX, || Value::Null).ok()? = leaf.clone();
    }
    Some(())
}

fn empty_like(value: &Value) -> Value {
    match value {
        Value::Array(_) => Value::Array(Vec::new()),
        _ => Value::Object(Map::new()),
    }
}
