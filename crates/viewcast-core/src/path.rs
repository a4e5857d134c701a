//! Tolerant dot-path traversal over JSON documents
//!
//! Path mapping rules resolve through this helper. Traversal never
//! fails: a missing or non-container intermediate node yields `None`,
//! which the resolver turns into a silent omission.

use serde_json::Value;

/// Get a deeply nested value without erroring on missing nodes.
///
/// Segments are split on `.`; objects are descended by key and arrays
/// by numeric index (`"assets.0.name"`). Returns `None` when any
/// segment is absent or the current node is not a container. A present
/// JSON `null` is `Some(Null)`, not `None`.
pub fn get_nested<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}
