//! Value compaction.
//!
//! See <https://www.w3.org/TR/json-ld11-api/#value-compaction>.

use serde_json::{Map as JsonMap, Value};

use crate::{
    compact::iri::{compact_iri, compact_keyword_keys},
    context::{ContainerItem, Context, Definition},
    error::Result,
    json::Nullable,
    processor::ProcessorOptions,
};

/// Runs the value compaction algorithm on a value object or a subject
/// reference.
///
/// Returns a scalar when the value matches the mappings of the active
/// property, and a (re-keyed) map otherwise.
///
/// See <https://www.w3.org/TR/json-ld11-api/#value-compaction>.
pub(crate) fn compact_value(
    options: &ProcessorOptions,
    active_context: &Context,
    active_property: Option<&str>,
    value: &JsonMap<String, Value>,
) -> Result<Value> {
    let definition = active_property.and_then(|p| active_context.term_definition(p));
    let type_mapping = definition.and_then(Definition::ty);
    // Step 3, 4: the language and direction the active property would apply
    // to a plain string.
    let language = match definition.and_then(Definition::language) {
        Some(Nullable::Value(language)) => Some(language),
        Some(Nullable::Null) => None,
        None => active_context.default_language(),
    };
    let direction = match definition.and_then(Definition::direction) {
        Some(Nullable::Value(direction)) => Some(direction),
        Some(Nullable::Null) => None,
        None => active_context.default_base_direction(),
    };

    let has_index = value.contains_key("@index");
    let index_droppable = !has_index
        || definition.map_or(false, |def| def.container_contains(ContainerItem::Index));

    // Step 5: a subject reference compacts to its bare identifier when the
    // property is typed accordingly.
    let id_only = value.contains_key("@id")
        && value.keys().all(|key| key == "@id" || key == "@index");
    if id_only {
        if let Some(id) = value.get("@id").and_then(Value::as_str) {
            match type_mapping {
                Some("@id") if value.len() == 1 => {
                    return Ok(Value::from(compact_iri(
                        options,
                        active_context,
                        id,
                        false,
                        false,
                    )?));
                }
                Some("@vocab") if value.len() == 1 => {
                    return Ok(Value::from(compact_iri(
                        options,
                        active_context,
                        id,
                        true,
                        false,
                    )?));
                }
                _ => {
                    // The reference keeps its map shape, with the identifier
                    // compacted against the base.
                    let mut result = JsonMap::new();
                    let id_key = compact_iri(options, active_context, "@id", true, false)?;
                    result.insert(
                        id_key,
                        Value::from(compact_iri(options, active_context, id, false, false)?),
                    );
                    if let Some(index) = value.get("@index") {
                        let index_key =
                            compact_iri(options, active_context, "@index", true, false)?;
                        result.insert(index_key, index.clone());
                    }
                    return Ok(Value::Object(result));
                }
            }
        }
    }

    let value_type = value.get("@type").and_then(Value::as_str);
    let value_language = value.get("@language").and_then(Value::as_str);
    let value_direction = value.get("@direction").and_then(Value::as_str);

    // Step 6: a matching type mapping compacts to the bare value.
    if value_type.is_some() && value_type == type_mapping && index_droppable {
        return Ok(value
            .get("@value")
            .cloned()
            .expect("Should never fail: value objects carry `@value`"));
    }

    // Step 7: a type mismatch (or `@none` mapping) keeps the value object,
    // with its keys and type compacted.
    let type_mismatch = type_mapping == Some("@none")
        || (value_type.is_some() && value_type != type_mapping);
    if !type_mismatch {
        let raw_value = value
            .get("@value")
            .expect("Should never fail: value objects carry `@value`");
        if !raw_value.is_string() {
            // Step 8: non-string values carry their type in the JSON type.
            if index_droppable && value_type.is_none() {
                return Ok(raw_value.clone());
            }
        } else {
            // Step 9: a matching language and direction compact to the bare
            // string.
            let language_matches = match (value_language, language) {
                (None, None) => true,
                (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
                _ => false,
            };
            let direction_matches = match (value_direction, direction) {
                (None, None) => true,
                (Some(a), Some(b)) => a.eq_ignore_ascii_case(b.as_str()),
                _ => false,
            };
            if language_matches && direction_matches && index_droppable && value_type.is_none() {
                return Ok(raw_value.clone());
            }
        }
    }

    // Step 10
    Ok(Value::Object(compact_keyword_keys(
        options,
        active_context,
        value,
    )?))
}
