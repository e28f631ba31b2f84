//! Path addressing over `serde_json::Value` trees.
//!
//! Paths are sequences of string keys. Array elements are addressed by the
//! decimal form of their index, which is how they appear in recorded traces.

use serde_json::{Map, Value};
use thiserror::Error;

/// Returns the value at `path`, or `None` if any segment is missing.
pub fn value_at<'a, S: AsRef<str>>(value: &'a Value, path: &[S]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, segment| child(current, segment.as_ref()))
}

/// Returns the direct child of an object or array addressed by `segment`.
pub fn child<'a>(value: &'a Value, segment: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|idx| items.get(idx)),
        _ => None,
    }
}

/// Most nulls an array is padded with to reach an addressed index.
pub const MAX_ARRAY_PADDING: usize = 1024;

/// A path segment addressing an array element too far past its end.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Index '{segment}' is out of reach for an array of length {len}")]
pub struct PathError {
    pub segment: String,
    pub len: usize,
}

/// Replaces the value at `path` inside `target` with `leaf` and returns the
/// updated tree. Missing or non-container intermediates become objects. An
/// empty path replaces the whole tree.
pub fn set_path<S: AsRef<str>>(mut target: Value, path: &[S], leaf: Value) -> Result<Value, PathError> {
    set_path_mut(&mut target, path, leaf)?;
    Ok(target)
}

/// In-place form of [`set_path`]. On error `target` may already hold the
/// intermediates created before the failing segment.
pub fn set_path_mut<S: AsRef<str>>(target: &mut Value, path: &[S], leaf: Value) -> Result<(), PathError> {
    let Some((last, parents)) = path.split_last() else {
        *target = leaf;
        return Ok(());
    };

    let mut current = target;
    for segment in parents {
        current = child_mut_or_insert(current, segment.as_ref(), MAX_ARRAY_PADDING, || {
            Value::Object(Map::new())
        })?;
    }
    *child_mut_or_insert(current, last.as_ref(), MAX_ARRAY_PADDING, || Value::Null)? = leaf;
    Ok(())
}

/// Returns a mutable reference to the child addressed by `segment`, creating
/// it with `init` when absent. Scalars are replaced by an empty object first.
/// Array segments that are not indices turn the array into an object; index
/// segments past the end pad with fewer than `max_padding` nulls.
pub(crate) fn child_mut_or_insert<'a>(
    value: &'a mut Value,
    segment: &str,
    max_padding: usize,
    init: impl FnOnce() -> Value,
) -> Result<&'a mut Value, PathError> {
    let index = match value {
        Value::Array(_) => segment.parse::<usize>().ok(),
        _ => None,
    };
    if index.is_none() && !value.is_object() {
        *value = Value::Object(Map::new());
    }

    match value {
        Value::Array(items) => {
            let idx = index.unwrap_or(items.len());
            if idx >= items.len() {
                if idx - items.len() >= max_padding {
                    return Err(PathError {
                        segment: segment.to_string(),
                        len: items.len(),
                    });
                }
                items.resize(idx + 1, Value::Null);
            }
            Ok(&mut items[idx])
        }
        Value::Object(map) => Ok(map.entry(segment.to_string()).or_insert_with(init)),
        _ => unreachable!("non-containers are replaced by an object above"),
    }
}

/// True for non-null objects and arrays, the values a path recorder descends into.
pub fn is_container(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}
