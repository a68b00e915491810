//! Value expansion.
//!
//! See <https://www.w3.org/TR/json-ld11-api/#value-expansion>.

use serde_json::{Map as JsonMap, Value};

use crate::{
    context::Context,
    error::Result,
    expand::iri::ExpandIriOptions,
    json::Nullable,
    processor::Processor,
    remote::LoadRemoteDocument,
};

/// Runs the value expansion algorithm: wraps a scalar into a value object
/// (or a subject reference, for `@id`-typed terms) according to the term
/// definition of the active property.
///
/// See <https://www.w3.org/TR/json-ld11-api/#value-expansion>.
pub(crate) async fn expand_value<L: LoadRemoteDocument>(
    processor: &Processor<L>,
    active_context: &Context,
    active_property: &str,
    value: &Value,
) -> Result<Value> {
    let definition = active_context.term_definition(active_property);
    let type_mapping = definition.and_then(|def| def.ty());

    // Step 1, 2
    if let Value::String(s) = value {
        if type_mapping == Some("@id") || type_mapping == Some("@vocab") {
            let expanded = ExpandIriOptions::constant(active_context)
                .vocab(type_mapping == Some("@vocab"))
                .document_relative(true)
                .expand_str(processor, s)
                .await?;
            let mut result = JsonMap::new();
            result.insert("@id".to_owned(), expanded.map_or(Value::Null, Value::from));
            return Ok(Value::Object(result));
        }
    }

    // Step 3
    let mut result = JsonMap::new();
    result.insert("@value".to_owned(), value.clone());
    // Step 4
    match type_mapping {
        Some(ty) if ty != "@id" && ty != "@vocab" && ty != "@none" => {
            result.insert("@type".to_owned(), Value::from(ty));
        }
        _ => {
            // Step 5
            if value.is_string() {
                let language = match definition.and_then(|def| def.language()) {
                    Some(Nullable::Value(language)) => Some(language),
                    Some(Nullable::Null) => None,
                    None => active_context.default_language(),
                };
                let direction = match definition.and_then(|def| def.direction()) {
                    Some(Nullable::Value(direction)) => Some(direction),
                    Some(Nullable::Null) => None,
                    None => active_context.default_base_direction(),
                };
                if let Some(language) = language {
                    result.insert("@language".to_owned(), Value::from(language));
                }
                if let Some(direction) = direction {
                    result.insert("@direction".to_owned(), Value::from(direction.as_str()));
                }
            }
        }
    }

    // Step 6
    Ok(Value::Object(result))
}
