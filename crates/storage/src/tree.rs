//! In-place edits on a JSON tree with realtime-database semantics: `null`
//! and empty objects do not exist, and removing the last child of a node
//! removes the node.

use serde_json::{Map, Value};

use crate::path::StorePath;

/// Value at `segments` below `root`, if any.
#[must_use]
pub fn get_at<'a>(root: &'a Value, segments: &[String]) -> Option<&'a Value> {
    let mut node = root;
    for segment in segments {
        node = match node {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    match node {
        Value::Null => None,
        other => Some(other),
    }
}

/// Writes `value` at `segments`, replacing whatever was there.
///
/// Scalars on the way down are replaced by objects. A value that normalizes
/// to nothing removes the node instead.
pub fn set_at(root: &mut Value, segments: &[String], value: Value) {
    let value = normalize(value);
    if value.is_null() {
        remove_at(root, segments);
        return;
    }
    insert_at(root, segments, value);
}

/// Removes the node at `segments` and prunes ancestors left empty.
pub fn remove_at(root: &mut Value, segments: &[String]) {
    let Some((first, rest)) = segments.split_first() else {
        *root = Value::Null;
        return;
    };
    promote_array(root);
    let Value::Object(map) = root else {
        return;
    };
    if rest.is_empty() {
        map.remove(first);
    } else if let Some(child) = map.get_mut(first) {
        remove_at(child, rest);
        if child.is_null() {
            map.remove(first);
        }
    }
    if map.is_empty() {
        *root = Value::Null;
    }
}

/// Drops `null` members and empty containers, recursively. Arrays become
/// objects keyed by index. Returns `Null` when nothing remains.
#[must_use]
pub fn normalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let map: Map<String, Value> = map
                .into_iter()
                .map(|(key, child)| (key, normalize(child)))
                .filter(|(_, child)| !child.is_null())
                .collect();
            if map.is_empty() { Value::Null } else { Value::Object(map) }
        }
        Value::Array(items) => {
            let map = index_keyed(items.into_iter().map(normalize));
            if map.is_empty() { Value::Null } else { Value::Object(map) }
        }
        scalar => scalar,
    }
}

/// Leaf scalars of `value` with their full paths below `base`. Array
/// elements are addressed by index.
#[must_use]
pub fn flatten(base: &StorePath, value: &Value) -> Vec<(StorePath, Value)> {
    let mut leaves = Vec::new();
    collect_leaves(base.clone(), value, &mut leaves);
    leaves
}

fn collect_leaves(at: StorePath, value: &Value, leaves: &mut Vec<(StorePath, Value)>) {
    match value {
        Value::Null => {}
        Value::Object(map) => {
            for (key, child) in map {
                if let Ok(path) = at.join(key) {
                    collect_leaves(path, child, leaves);
                }
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                if let Ok(path) = at.join(index.to_string()) {
                    collect_leaves(path, child, leaves);
                }
            }
        }
        scalar => leaves.push((at, scalar.clone())),
    }
}

fn insert_at(node: &mut Value, segments: &[String], value: Value) {
    let Some((first, rest)) = segments.split_first() else {
        *node = value;
        return;
    };
    promote_array(node);
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    if let Value::Object(map) = node {
        let child = map.entry(first.clone()).or_insert(Value::Null);
        insert_at(child, rest, value);
    }
}

fn index_keyed(items: impl Iterator<Item = Value>) -> Map<String, Value> {
    items
        .enumerate()
        .filter(|(_, item)| !item.is_null())
        .map(|(index, item)| (index.to_string(), item))
        .collect()
}

// Arrays are addressed like objects keyed by index once they are edited.
fn promote_array(node: &mut Value) {
    if let Value::Array(items) = node {
        *node = Value::Object(index_keyed(std::mem::take(items).into_iter()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn segs(raw: &str) -> Vec<String> {
        raw.split('/').map(str::to_owned).collect()
    }

    #[test]
    fn set_creates_intermediate_objects() {
        let mut root = Value::Null;
        set_at(&mut root, &segs("users/u1/tracker/2024/0/day1/morning"), json!(true));
        assert_eq!(
            get_at(&root, &segs("users/u1/tracker/2024/0/day1")),
            Some(&json!({ "morning": true }))
        );
    }

    #[test]
    fn set_below_scalar_replaces_it() {
        let mut root = json!({ "a": 5 });
        set_at(&mut root, &segs("a/b"), json!(1));
        assert_eq!(root, json!({ "a": { "b": 1 } }));
    }

    #[test]
    fn null_write_prunes_empty_parents() {
        let mut root = json!({ "a": { "b": { "c": true } }, "z": 1 });
        set_at(&mut root, &segs("a/b/c"), Value::Null);
        assert_eq!(root, json!({ "z": 1 }));
        remove_at(&mut root, &segs("z"));
        assert!(root.is_null());
    }

    #[test]
    fn removing_missing_nodes_is_a_no_op() {
        let mut root = json!({ "a": { "b": 1 } });
        remove_at(&mut root, &segs("a/x/y"));
        remove_at(&mut root, &segs("a/b/c"));
        assert_eq!(root, json!({ "a": { "b": 1 } }));
    }

    #[test]
    fn normalize_drops_nulls_and_empty_objects() {
        let value = normalize(json!({ "a": null, "b": {}, "c": { "d": null }, "e": false }));
        assert_eq!(value, json!({ "e": false }));
        assert!(normalize(json!({})).is_null());
    }

    #[test]
    fn written_arrays_are_stored_as_index_keyed_objects() {
        let mut root = Value::Null;
        set_at(&mut root, &segs("2024"), json!([ { "day1": { "a": true } }, null, { "day2": null } ]));
        assert_eq!(root, json!({ "2024": { "0": { "day1": { "a": true } } } }));
        assert!(normalize(json!([null, {}])).is_null());
    }

    #[test]
    fn editing_an_array_turns_it_into_an_object() {
        let mut root = json!({ "2024": [ { "day1": { "a": true } }, null, { "day2": { "b": true } } ] });
        set_at(&mut root, &segs("2024/0/day1/a"), json!(false));
        assert_eq!(
            root,
            json!({ "2024": { "0": { "day1": { "a": false } }, "2": { "day2": { "b": true } } } })
        );
    }

    #[test]
    fn get_reads_arrays_by_index() {
        let root = json!({ "2024": [ { "day1": { "a": true } } ] });
        assert_eq!(get_at(&root, &segs("2024/0/day1/a")), Some(&json!(true)));
        assert_eq!(get_at(&root, &segs("2024/x")), None);
    }

    #[test]
    fn flatten_lists_leaves_with_paths() {
        let base = StorePath::parse("users/u1").unwrap();
        let leaves = flatten(&base, &json!({ "username": "sam", "tracker": { "2024": [ { "day1": { "a": true } } ] } }));
        let paths: Vec<String> = leaves.iter().map(|(path, _)| path.to_string()).collect();
        assert_eq!(paths, vec!["users/u1/tracker/2024/0/day1/a", "users/u1/username"]);
    }
}
