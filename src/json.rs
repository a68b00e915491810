//! JSON helpers.

use serde_json::{Map as JsonMap, Value};

pub(crate) use self::nullable::Nullable;

mod nullable;

/// Returns a map with single key-value entry.
pub(crate) fn single_entry_map(
    id: impl Into<String>,
    value: impl Into<Value>,
) -> JsonMap<String, Value> {
    let mut map = JsonMap::new();
    map.insert(id.into(), value.into());
    map
}

/// Returns the values of a JSON value, normalized to an array.
///
/// A non-array value is treated as a single-element array.
pub(crate) fn to_ref_array(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(arr) => arr.iter().collect(),
        v => vec![v],
    }
}

/// Converts a JSON value into an array, wrapping a non-array value.
pub(crate) fn into_array(value: Value) -> Vec<Value> {
    match value {
        Value::Array(arr) => arr,
        v => vec![v],
    }
}

/// Returns the entries of a map, sorted by key if `ordered` is set.
///
/// With `ordered` unset the author's entry order is preserved.
pub(crate) fn entries(map: &JsonMap<String, Value>, ordered: bool) -> Vec<(&String, &Value)> {
    let mut entries: Vec<_> = map.iter().collect();
    if ordered {
        entries.sort_by(|(a, _), (b, _)| a.cmp(b));
    }
    entries
}

/// Adds a value to the entry of `map` at `key`, promoting to arrays as needed.
///
/// This is the arrayification primitive shared by compaction and node map
/// generation: the entry is created on first use, an existing non-array entry
/// is promoted to an array when `as_array` is set, and array values are
/// concatenated rather than nested.
pub(crate) fn add_value(map: &mut JsonMap<String, Value>, key: &str, value: Value, as_array: bool) {
    if as_array && !map.get(key).map_or(false, Value::is_array) {
        match map.get_mut(key) {
            Some(existing) => {
                let prev = existing.take();
                *existing = Value::Array(vec![prev]);
            }
            None => {
                map.insert(key.to_owned(), Value::Array(Vec::new()));
            }
        }
    }

    if let Value::Array(values) = value {
        for v in values {
            add_value(map, key, v, as_array);
        }
        return;
    }

    match map.get_mut(key) {
        None => {
            map.insert(key.to_owned(), value);
        }
        Some(Value::Array(arr)) => arr.push(value),
        Some(existing) => {
            let prev = existing.take();
            *existing = Value::Array(vec![prev, value]);
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn add_value_creates_entry() {
        let mut map = JsonMap::new();
        add_value(&mut map, "k", json!("a"), false);
        assert_eq!(Value::Object(map), json!({"k": "a"}));
    }

    #[test]
    fn add_value_promotes_to_array() {
        let mut map = JsonMap::new();
        add_value(&mut map, "k", json!("a"), false);
        add_value(&mut map, "k", json!("b"), false);
        assert_eq!(Value::Object(map), json!({"k": ["a", "b"]}));
    }

    #[test]
    fn add_value_forced_array() {
        let mut map = JsonMap::new();
        add_value(&mut map, "k", json!("a"), true);
        assert_eq!(Value::Object(map), json!({"k": ["a"]}));
    }

    #[test]
    fn add_value_concatenates_arrays() {
        let mut map = JsonMap::new();
        add_value(&mut map, "k", json!(["a"]), false);
        add_value(&mut map, "k", json!(["b", "c"]), false);
        assert_eq!(Value::Object(map), json!({"k": ["a", "b", "c"]}));
    }
}
