//! JSON-LD syntax related stuff.

use serde_json::Value;

/// Keywords in JSON-LD 1.1, including the framing keywords.
///
/// See <https://www.w3.org/TR/json-ld11/#syntax-tokens-and-keywords>.
const KEYWORDS: &[&str] = &[
    "@any",
    "@base",
    "@container",
    "@context",
    "@default",
    "@direction",
    "@embed",
    "@explicit",
    "@graph",
    "@id",
    "@import",
    "@included",
    "@index",
    "@json",
    "@language",
    "@list",
    "@nest",
    "@none",
    "@null",
    "@omitDefault",
    "@prefix",
    "@preserve",
    "@propagate",
    "@protected",
    "@requireAll",
    "@reverse",
    "@set",
    "@type",
    "@value",
    "@version",
    "@vocab",
];

/// Checks if the given string is a keyword.
pub(crate) fn is_keyword(s: &str) -> bool {
    KEYWORDS.contains(&s)
}

/// Checks whether a string has the form of a keyword.
///
/// > having the form of a keyword (i.e., it matches the ABNF rule `"@"1*ALPHA`
/// > from \[RFC5234\]),
/// >
/// > --- <https://www.w3.org/TR/json-ld11-api/>
///
/// A token of this form which is not an actual keyword is reserved: it is
/// reported through a warning and otherwise ignored, never treated as an IRI.
pub(crate) fn has_form_of_keyword(s: &str) -> bool {
    s.len() >= 2 && s.starts_with('@') && s[1..].bytes().all(|b| b.is_ascii_alphabetic())
}

/// Checks whether the given value is a value object, i.e. a map with an
/// `@value` entry.
///
/// See <https://www.w3.org/TR/json-ld11/#value-objects>.
pub fn is_value_object(v: &Value) -> bool {
    v.as_object().map_or(false, |map| map.contains_key("@value"))
}

/// Checks whether the given value is a list object, i.e. a map with an
/// `@list` entry.
pub fn is_list_object(v: &Value) -> bool {
    v.as_object().map_or(false, |map| map.contains_key("@list"))
}

/// Checks whether the given value is a graph object: a map with an `@graph`
/// entry and no entries other than `@graph`, `@id` and `@index`.
pub fn is_graph_object(v: &Value) -> bool {
    v.as_object().map_or(false, |map| {
        map.contains_key("@graph")
            && map
                .keys()
                .all(|key| key == "@graph" || key == "@id" || key == "@index")
    })
}

/// Checks whether the given value is a graph object without an `@id` entry.
pub fn is_simple_graph_object(v: &Value) -> bool {
    is_graph_object(v) && !v.as_object().map_or(false, |map| map.contains_key("@id"))
}

/// Checks whether the given value is a subject reference, i.e. a map whose
/// sole entry is `@id`.
pub fn is_subject_reference(v: &Value) -> bool {
    v.as_object()
        .map_or(false, |map| map.len() == 1 && map.contains_key("@id"))
}

/// Checks whether the given value is a node object.
///
/// A node object is a map which is neither a value, list, set nor graph
/// object, and which either has more than one entry or whose single entry is
/// not `@id`.
///
/// See <https://www.w3.org/TR/json-ld11/#node-objects>.
pub fn is_subject(v: &Value) -> bool {
    v.as_object().map_or(false, |map| {
        !map.contains_key("@value")
            && !map.contains_key("@list")
            && !map.contains_key("@set")
            && !is_graph_object(v)
            && (map.len() > 1 || !map.contains_key("@id"))
    })
}

/// Checks whether the given value may denote a blank node.
///
/// A map with an `@id` entry is a blank node when that entry is a string
/// starting with `_:`. A map without `@id` is a blank node when it is empty
/// or carries any entry other than `@value`, `@set` and `@list`.
///
/// Note that a map without `@id` satisfying this predicate is only
/// *potentially* a blank node: flattening still registers such a map as a
/// node and allocates a fresh identifier for it.
pub fn is_blank_node(v: &Value) -> bool {
    let map = match v.as_object() {
        Some(map) => map,
        None => return false,
    };
    match map.get("@id") {
        Some(Value::String(id)) => id.starts_with("_:"),
        Some(_) => true,
        None => {
            map.is_empty()
                || !(map.contains_key("@value")
                    || map.contains_key("@set")
                    || map.contains_key("@list"))
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn keyword_form() {
        assert!(has_form_of_keyword("@foo"));
        assert!(has_form_of_keyword("@type"));
        assert!(!has_form_of_keyword("@"));
        assert!(!has_form_of_keyword("@foo1"));
        assert!(!has_form_of_keyword("foo"));
    }

    #[test]
    fn reserved_tokens_are_not_keywords() {
        assert!(is_keyword("@type"));
        assert!(is_keyword("@none"));
        assert!(!is_keyword("@ignoreMe"));
    }

    #[test]
    fn graph_objects() {
        assert!(is_graph_object(&json!({"@graph": []})));
        assert!(is_graph_object(&json!({"@graph": [], "@id": "ex:g", "@index": "i"})));
        assert!(!is_graph_object(&json!({"@graph": [], "ex:p": 1})));
        assert!(is_simple_graph_object(&json!({"@graph": []})));
        assert!(!is_simple_graph_object(&json!({"@graph": [], "@id": "ex:g"})));
    }

    #[test]
    fn subjects_and_references() {
        assert!(is_subject_reference(&json!({"@id": "ex:s"})));
        assert!(!is_subject_reference(&json!({"@id": "ex:s", "ex:p": 1})));
        assert!(is_subject(&json!({"@id": "ex:s", "ex:p": 1})));
        assert!(is_subject(&json!({"ex:p": 1})));
        assert!(!is_subject(&json!({"@id": "ex:s"})));
        assert!(!is_subject(&json!({"@value": "v"})));
        assert!(!is_subject(&json!({"@graph": []})));
    }

    #[test]
    fn blank_nodes() {
        assert!(is_blank_node(&json!({"@id": "_:b0"})));
        assert!(!is_blank_node(&json!({"@id": "ex:s"})));
        assert!(is_blank_node(&json!({})));
        assert!(is_blank_node(&json!({"ex:p": 1})));
        assert!(!is_blank_node(&json!({"@value": "v"})));
    }
}
