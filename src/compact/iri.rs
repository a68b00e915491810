//! IRI compaction.
//!
//! See <https://www.w3.org/TR/json-ld11-api/#iri-compaction>.

use anyhow::anyhow;
use serde_json::{Map as JsonMap, Value};

use crate::{
    context::Context,
    error::{ErrorCode, Result},
    iri::{relativize, to_prefix_and_suffix},
    json::Nullable,
    processor::ProcessorOptions,
    syntax::{is_graph_object, is_list_object, is_value_object},
};

/// Compacts the given IRI (or keyword) without considering any value.
pub(crate) fn compact_iri(
    options: &ProcessorOptions,
    active_context: &Context,
    var: &str,
    vocab: bool,
    reverse: bool,
) -> Result<String> {
    compact_iri_full(options, active_context, var, None, vocab, reverse)
}

/// Compacts the given IRI (or keyword), selecting the term most appropriate
/// for the given value.
pub(crate) fn compact_iri_with(
    options: &ProcessorOptions,
    active_context: &Context,
    var: &str,
    value: &Value,
    vocab: bool,
    reverse: bool,
) -> Result<String> {
    compact_iri_full(options, active_context, var, Some(value), vocab, reverse)
}

/// Runs the IRI compaction algorithm.
///
/// See <https://www.w3.org/TR/json-ld11-api/#iri-compaction>.
fn compact_iri_full(
    options: &ProcessorOptions,
    active_context: &Context,
    var: &str,
    value: Option<&Value>,
    vocab: bool,
    reverse: bool,
) -> Result<String> {
    // Step 2, 4: try to select a term through the inverse context.
    if vocab && active_context.inverse().contains(var) {
        let selection = build_selection(options, active_context, value, reverse)?;
        if let Some(term) = active_context.inverse().select_term(
            var,
            &selection.containers,
            selection.type_or_language,
            &selection.preferred_values,
        ) {
            return Ok(term.to_owned());
        }
    }

    // Step 5: try to shorten through the vocabulary mapping.
    if vocab {
        if let Some(vocab_mapping) = active_context.vocab() {
            if let Some(suffix) = var.strip_prefix(vocab_mapping) {
                if !suffix.is_empty() && active_context.term_definition(suffix).is_none() {
                    return Ok(suffix.to_owned());
                }
            }
        }
    }

    // Step 6, 7: try to construct a compact IRI, keeping the shortest (ties
    // broken lexicographically) usable candidate.
    let mut compact_iri: Option<String> = None;
    for (term, definition) in active_context.term_definitions() {
        if !definition.is_prefix() {
            continue;
        }
        let iri_mapping = match definition.iri() {
            Nullable::Value(mapping) if mapping != var => mapping,
            _ => continue,
        };
        let suffix = match var.strip_prefix(iri_mapping) {
            Some(suffix) if !suffix.is_empty() => suffix,
            _ => continue,
        };
        let candidate = format!("{}:{}", term, suffix);
        let improves = compact_iri.as_ref().map_or(true, |current| {
            candidate.len() < current.len()
                || (candidate.len() == current.len() && candidate < *current)
        });
        if !improves {
            continue;
        }
        match active_context.term_definition(&candidate) {
            None => compact_iri = Some(candidate),
            Some(def) => {
                if Option::<&str>::from(def.iri()) == Some(var) && value.is_none() {
                    compact_iri = Some(candidate);
                }
            }
        }
    }
    if let Some(compact_iri) = compact_iri {
        return Ok(compact_iri);
    }

    // Step 8: an IRI whose scheme collides with a prefix-flagged term and
    // which has no authority part would not survive a round trip.
    if let Some((scheme, rest)) = to_prefix_and_suffix(var) {
        if !rest.starts_with("//") {
            if let Some(def) = active_context.term_definition(scheme) {
                if def.is_prefix() {
                    return Err(ErrorCode::IriConfusedWithPrefix
                        .and_source(anyhow!("IRI = {:?}, prefix = {:?}", var, scheme)));
                }
            }
        }
    }

    // Step 9
    if !vocab && options.is_compact_to_relative() {
        if let Some(base) = active_context.base() {
            return Ok(relativize(var, base));
        }
    }

    // Step 10
    Ok(var.to_owned())
}

/// Parameters for term selection, derived from the shape of the value.
struct Selection {
    /// Preferred container mappings, most specific first.
    containers: Vec<&'static str>,
    /// Discriminator: `@type`, `@language` or `@any`.
    type_or_language: &'static str,
    /// Preferred values for the discriminator.
    preferred_values: Vec<String>,
}

/// Builds the container preferences and type/language preferences for the
/// given value, following the preference table of the IRI compaction
/// algorithm.
fn build_selection(
    options: &ProcessorOptions,
    active_context: &Context,
    value: Option<&Value>,
    reverse: bool,
) -> Result<Selection> {
    let mut containers: Vec<&'static str> = Vec::new();
    let mut type_or_language = "@language";
    let mut type_or_language_value: String = "@null".to_owned();
    // Appended after `@any` when the value carries both a language and a
    // direction.
    let mut direction_fallback: Option<String> = None;

    let value_map = value.and_then(Value::as_object);
    let has_index = value_map.map_or(false, |m| m.contains_key("@index"));
    let is_graph = value.map_or(false, is_graph_object);
    let is_list = value.map_or(false, is_list_object);
    let is_empty_list = is_list
        && value_map
            .and_then(|m| m.get("@list"))
            .and_then(Value::as_array)
            .map_or(false, Vec::is_empty);

    if has_index && !is_graph {
        containers.push("@index");
        containers.push("@index@set");
    }

    if reverse {
        type_or_language = "@type";
        type_or_language_value = "@reverse".to_owned();
        containers.push("@set");
    } else if is_list {
        // The list as a whole prefers a term with a matching common type or
        // common language across its items.
        if !has_index {
            containers.push("@list");
        }
        if is_empty_list {
            type_or_language = "@any";
            type_or_language_value = "@none".to_owned();
        } else {
            let list = value_map
                .and_then(|m| m.get("@list"))
                .and_then(Value::as_array)
                .expect("Should never fail: list objects carry a `@list` array");
            let mut common_language: Option<String> = None;
            let mut common_type: Option<String> = None;
            for item in list {
                let mut item_language = "@none".to_owned();
                let mut item_type = "@none".to_owned();
                if let Some(item_map) = item.as_object().filter(|m| m.contains_key("@value")) {
                    if let Some(direction) = item_map.get("@direction").and_then(Value::as_str) {
                        let language = item_map
                            .get("@language")
                            .and_then(Value::as_str)
                            .unwrap_or_default();
                        item_language = format!("{}_{}", language, direction).to_lowercase();
                    } else if let Some(language) =
                        item_map.get("@language").and_then(Value::as_str)
                    {
                        item_language = language.to_lowercase();
                    } else if let Some(ty) = item_map.get("@type").and_then(Value::as_str) {
                        item_type = ty.to_owned();
                    } else {
                        item_language = "@null".to_owned();
                    }
                } else {
                    item_type = "@id".to_owned();
                }
                common_language = match common_language {
                    None => Some(item_language.clone()),
                    Some(common) if common != item_language && is_value_object(item) => {
                        Some("@none".to_owned())
                    }
                    keep => keep,
                };
                common_type = match common_type {
                    None => Some(item_type.clone()),
                    Some(common) if common != item_type => Some("@none".to_owned()),
                    keep => keep,
                };
                if common_language.as_deref() == Some("@none")
                    && common_type.as_deref() == Some("@none")
                {
                    break;
                }
            }
            let common_language = common_language.unwrap_or_else(|| "@none".to_owned());
            let common_type = common_type.unwrap_or_else(|| "@none".to_owned());
            if common_type != "@none" {
                type_or_language = "@type";
                type_or_language_value = common_type;
            } else {
                type_or_language_value = common_language;
            }
        }
    } else if is_graph {
        // Prefer the container most appropriate for the particular graph
        // object.
        if has_index {
            containers.push("@graph@index");
            containers.push("@graph@index@set");
        }
        let graph_has_id = value_map.map_or(false, |m| m.contains_key("@id"));
        if graph_has_id {
            containers.push("@graph@id");
            containers.push("@graph@id@set");
        }
        containers.push("@graph");
        containers.push("@graph@set");
        containers.push("@set");
        if !has_index {
            containers.push("@graph@index");
            containers.push("@graph@index@set");
        }
        if !graph_has_id {
            containers.push("@graph@id");
            containers.push("@graph@id@set");
        }
        containers.push("@index");
        containers.push("@index@set");
        type_or_language = "@type";
        type_or_language_value = "@id".to_owned();
    } else {
        if let Some(map) = value_map.filter(|m| m.contains_key("@value")) {
            let language = map.get("@language").and_then(Value::as_str);
            let direction = map.get("@direction").and_then(Value::as_str);
            if (language.is_some() || direction.is_some()) && !has_index {
                containers.push("@language");
                containers.push("@language@set");
                type_or_language_value = match (language, direction) {
                    (Some(language), Some(direction)) => {
                        direction_fallback = Some(format!("_{}", direction));
                        format!("{}_{}", language, direction).to_lowercase()
                    }
                    (Some(language), None) => language.to_lowercase(),
                    (None, Some(direction)) => format!("_{}", direction),
                    (None, None) => unreachable!("Should never fail: just checked above"),
                };
            } else if let Some(ty) = map.get("@type").and_then(Value::as_str) {
                type_or_language = "@type";
                type_or_language_value = ty.to_owned();
            }
        } else {
            // A node object or a subject reference.
            type_or_language = "@type";
            type_or_language_value = "@id".to_owned();
            containers.push("@id");
            containers.push("@id@set");
            containers.push("@type");
            containers.push("@set@type");
        }
        containers.push("@set");
    }

    containers.push("@none");
    // Any term with an index container may also hold an index-less value.
    if !options.is_processing_mode_1_0() && !has_index {
        containers.push("@index");
        containers.push("@index@set");
    }
    let is_simple_value = value_map.map_or(false, |m| m.contains_key("@value") && m.len() == 1);
    if !options.is_processing_mode_1_0() && is_simple_value {
        containers.push("@language");
        containers.push("@language@set");
    }

    // Preferred values for the discriminator.
    let mut preferred_values: Vec<String> = Vec::new();
    if type_or_language_value == "@reverse" {
        preferred_values.push("@reverse".to_owned());
    }
    let id_value = value_map.and_then(|m| m.get("@id")).and_then(Value::as_str);
    if (type_or_language_value == "@id" || type_or_language_value == "@reverse")
        && id_value.is_some()
    {
        // Whether the value's `@id` compacts back through the vocabulary
        // decides the `@id`/`@vocab` preference order.
        let id = id_value.expect("Should never fail: just checked above");
        let compacted = compact_iri_full(options, active_context, id, None, true, false)?;
        let round_trips = active_context
            .term_definition(&compacted)
            .map_or(false, |def| Option::<&str>::from(def.iri()) == Some(id));
        if round_trips {
            preferred_values.push("@vocab".to_owned());
            preferred_values.push("@id".to_owned());
        } else {
            preferred_values.push("@id".to_owned());
            preferred_values.push("@vocab".to_owned());
        }
        preferred_values.push("@none".to_owned());
    } else {
        preferred_values.push(type_or_language_value);
        preferred_values.push("@none".to_owned());
    }
    preferred_values.push("@any".to_owned());
    if let Some(direction_fallback) = direction_fallback {
        preferred_values.push(direction_fallback);
    }

    Ok(Selection {
        containers,
        type_or_language,
        preferred_values,
    })
}

/// Compacts all keys of an expanded map, for the value-object re-keying path.
pub(crate) fn compact_keyword_keys(
    options: &ProcessorOptions,
    active_context: &Context,
    value: &JsonMap<String, Value>,
) -> Result<JsonMap<String, Value>> {
    let mut result = JsonMap::new();
    for (key, entry) in value {
        let compacted_key = compact_iri(options, active_context, key, true, false)?;
        let compacted_entry = if key == "@type" {
            match entry {
                Value::String(ty) => {
                    Value::from(compact_iri(options, active_context, ty, true, false)?)
                }
                Value::Array(types) => {
                    let mut compacted = Vec::with_capacity(types.len());
                    for ty in types {
                        let ty = ty.as_str().ok_or_else(|| {
                            ErrorCode::InvalidTypeValue.and_source(anyhow!("`@type` = {:?}", ty))
                        })?;
                        compacted
                            .push(Value::from(compact_iri(options, active_context, ty, true, false)?));
                    }
                    Value::Array(compacted)
                }
                v => v.clone(),
            }
        } else {
            entry.clone()
        };
        result.insert(compacted_key, compacted_entry);
    }

    Ok(result)
}
