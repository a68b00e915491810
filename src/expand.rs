//! Expansion algorithm.
//!
//! See <https://www.w3.org/TR/json-ld11-api/#expansion-algorithm>.

use std::{borrow::Cow, future::Future, pin::Pin};

use anyhow::anyhow;
use iri_string::types::IriStr;
use langtag::LangTag;
use serde_json::{Map as JsonMap, Value};

use crate::{
    context::{merge, Container, ContainerItem, Context, Definition},
    error::{ErrorCode, Result},
    json::{add_value, entries, into_array, to_ref_array},
    processor::{Processor, Warning},
    remote::LoadRemoteDocument,
    syntax::{is_graph_object, is_keyword, is_list_object, is_value_object},
};

use self::{iri::ExpandIriOptions, value::expand_value};

pub(crate) mod iri;
mod value;

/// Runs the expansion algorithm on a single element.
///
/// Returns `Value::Null` for elements which expand to nothing.
///
/// This returns a boxed future as the algorithm is recursive.
///
/// See <https://www.w3.org/TR/json-ld11-api/#expansion-algorithm>.
pub(crate) fn expand_element<'a, L: LoadRemoteDocument>(
    processor: &'a Processor<L>,
    active_context: &'a Context,
    active_property: Option<&'a str>,
    element: &'a Value,
    base_url: Option<&'a IriStr>,
    from_map: bool,
) -> Pin<Box<dyn Future<Output = Result<Value>> + Send + 'a>> {
    Box::pin(expand_element_impl(
        processor,
        active_context,
        active_property,
        element,
        base_url,
        from_map,
    ))
}

/// Internal implementation of `expand_element()`.
async fn expand_element_impl<L: LoadRemoteDocument>(
    processor: &Processor<L>,
    active_context: &Context,
    active_property: Option<&str>,
    element: &Value,
    base_url: Option<&IriStr>,
    from_map: bool,
) -> Result<Value> {
    match element {
        // Step 1
        Value::Null => Ok(Value::Null),
        // Step 5
        Value::Array(items) => {
            expand_array(
                processor,
                active_context,
                active_property,
                items,
                base_url,
                from_map,
            )
            .await
        }
        // Step 6 and after
        Value::Object(map) => {
            expand_map(
                processor,
                active_context,
                active_property,
                map,
                base_url,
                from_map,
            )
            .await
        }
        // Step 4: a scalar.
        scalar => {
            // Step 4.1: free-floating scalars are dropped.
            if active_property.is_none() || active_property == Some("@graph") {
                return Ok(Value::Null);
            }
            // Step 4.2
            let active_context =
                apply_property_scoped_context(processor, active_context, active_property).await?;
            // Step 4.3
            expand_value(
                processor,
                &active_context,
                active_property.expect("Should never fail: just checked above"),
                scalar,
            )
            .await
        }
    }
}

/// Expands each item of an array, flattening one level.
async fn expand_array<L: LoadRemoteDocument>(
    processor: &Processor<L>,
    active_context: &Context,
    active_property: Option<&str>,
    items: &[Value],
    base_url: Option<&IriStr>,
    from_map: bool,
) -> Result<Value> {
    let container = definition_of(active_context, active_property).and_then(Definition::container);
    let is_list_container = container.map_or(false, |c| c.contains(ContainerItem::List));

    let mut result = Vec::new();
    for item in items {
        // Step 5.2.1
        let mut expanded =
            expand_element(processor, active_context, active_property, item, base_url, from_map)
                .await?;
        // Step 5.2.2: a nested array under a list container becomes a list.
        if is_list_container && expanded.is_array() {
            expanded = Value::Object(crate::json::single_entry_map("@list", expanded));
        }
        // Step 5.2.3
        match expanded {
            Value::Null => {}
            Value::Array(nested) => {
                result.extend(nested.into_iter().filter(|v| !v.is_null()));
            }
            v => result.push(v),
        }
    }

    Ok(Value::Array(result))
}

/// Expands a map.
async fn expand_map<L: LoadRemoteDocument>(
    processor: &Processor<L>,
    active_context: &Context,
    active_property: Option<&str>,
    element: &JsonMap<String, Value>,
    base_url: Option<&IriStr>,
    from_map: bool,
) -> Result<Value> {
    let mut active_context = Cow::Borrowed(active_context);

    // Step 7: the scope of a term-scoped context does not apply when
    // processing new node objects, so pop back to the previous context.
    if active_context.has_previous_context() && !from_map {
        let mut has_value_entry = false;
        let mut id_entry_only = !element.is_empty();
        for key in element.keys() {
            let expanded = ExpandIriOptions::constant(&active_context)
                .vocab(true)
                .expand_str(processor, key)
                .await?;
            match expanded.as_deref() {
                Some("@value") => has_value_entry = true,
                Some("@id") => {}
                _ => id_entry_only = false,
            }
        }
        id_entry_only = id_entry_only && element.len() == 1;
        if !has_value_entry && !id_entry_only {
            let previous = active_context
                .previous_context()
                .expect("Should never fail: just checked above")
                .clone();
            active_context = Cow::Owned(previous);
        }
    }

    // Step 8
    let property_scoped = definition_of(&active_context, active_property).and_then(|def| {
        def.local_context()
            .map(|ctx| (ctx.clone(), def.base_url().map(ToOwned::to_owned)))
    });
    if let Some((local_context, scoped_base_url)) = property_scoped {
        let new_context = merge::join_value(
            processor,
            &active_context,
            &local_context,
            scoped_base_url,
            merge::OptionalParams::new().override_protected(true),
        )
        .await?;
        active_context = Cow::Owned(new_context);
    }

    // Step 9
    if let Some(local_context) = element.get("@context") {
        let new_context = merge::join_value(
            processor,
            &active_context,
            local_context,
            base_url.map(ToOwned::to_owned),
            merge::OptionalParams::new(),
        )
        .await?;
        active_context = Cow::Owned(new_context);
    }

    // Step 10
    let type_scoped_context = active_context.clone().into_owned();

    // Step 11: apply type-scoped contexts, keys and type terms both in
    // lexicographical order, without propagation.
    let mut sorted_keys: Vec<&String> = element.keys().collect();
    sorted_keys.sort();
    let mut input_type = None;
    for key in &sorted_keys {
        let expanded_key = ExpandIriOptions::constant(&active_context)
            .vocab(true)
            .expand_str(processor, key)
            .await?;
        if expanded_key.as_deref() != Some("@type") {
            continue;
        }
        let mut terms: Vec<&str> = to_ref_array(&element[key.as_str()])
            .into_iter()
            .filter_map(Value::as_str)
            .collect();
        terms.sort_unstable();
        for term in &terms {
            if let Some(def) = type_scoped_context.term_definition(term) {
                if let Some(local_context) = def.local_context() {
                    let new_context = merge::join_value(
                        processor,
                        &active_context,
                        local_context,
                        def.base_url().map(ToOwned::to_owned),
                        merge::OptionalParams::new().propagate(false),
                    )
                    .await?;
                    active_context = Cow::Owned(new_context);
                }
            }
        }
        // Step 12: input type is the last type value of the first entry
        // expanding to `@type`.
        if input_type.is_none() {
            if let Some(last) = terms.last() {
                input_type = ExpandIriOptions::constant(&active_context)
                    .vocab(true)
                    .expand_str(processor, last)
                    .await?;
            }
        }
    }

    // Step 13, 14
    let mut result = JsonMap::new();
    process_entries(
        processor,
        &active_context,
        &type_scoped_context,
        active_property,
        element,
        base_url,
        input_type.as_deref(),
        &mut result,
    )
    .await?;

    finalize_expanded_map(processor, active_property, result)
}

/// Returns the term definition of the active property, if any.
fn definition_of<'a>(
    active_context: &'a Context,
    active_property: Option<&str>,
) -> Option<&'a Definition> {
    active_property.and_then(|property| active_context.term_definition(property))
}

/// Applies the property-scoped context of the active property, if any.
async fn apply_property_scoped_context<'a, L: LoadRemoteDocument>(
    processor: &Processor<L>,
    active_context: &'a Context,
    active_property: Option<&str>,
) -> Result<Cow<'a, Context>> {
    let definition = match definition_of(active_context, active_property) {
        Some(def) => def,
        None => return Ok(Cow::Borrowed(active_context)),
    };
    let local_context = match definition.local_context() {
        Some(ctx) => ctx,
        None => return Ok(Cow::Borrowed(active_context)),
    };

    let new_context = merge::join_value(
        processor,
        active_context,
        local_context,
        definition.base_url().map(ToOwned::to_owned),
        merge::OptionalParams::new().override_protected(true),
    )
    .await?;

    Ok(Cow::Owned(new_context))
}

/// Processes the entries of a map (steps 13 and 14 of the expansion
/// algorithm).
///
/// This is recursive through `@nest` entries, hence the boxed future.
#[allow(clippy::too_many_arguments)]
fn process_entries<'a, L: LoadRemoteDocument>(
    processor: &'a Processor<L>,
    active_context: &'a Context,
    type_scoped_context: &'a Context,
    active_property: Option<&'a str>,
    element: &'a JsonMap<String, Value>,
    base_url: Option<&'a IriStr>,
    input_type: Option<&'a str>,
    result: &'a mut JsonMap<String, Value>,
) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
    Box::pin(process_entries_impl(
        processor,
        active_context,
        type_scoped_context,
        active_property,
        element,
        base_url,
        input_type,
        result,
    ))
}

/// Internal implementation of `process_entries()`.
#[allow(clippy::too_many_arguments)]
async fn process_entries_impl<L: LoadRemoteDocument>(
    processor: &Processor<L>,
    active_context: &Context,
    type_scoped_context: &Context,
    active_property: Option<&str>,
    element: &JsonMap<String, Value>,
    base_url: Option<&IriStr>,
    input_type: Option<&str>,
    result: &mut JsonMap<String, Value>,
) -> Result<()> {
    let ordered = processor.options().is_ordered();
    let mut nests: Vec<&String> = Vec::new();

    // Step 13
    for (key, value) in entries(element, ordered) {
        // Step 13.1
        if key == "@context" {
            continue;
        }
        // Step 13.2
        let expanded_property = ExpandIriOptions::constant(active_context)
            .vocab(true)
            .expand_str(processor, key)
            .await?;
        let expanded_property = match expanded_property {
            // Step 13.3: drop properties which expand to neither a keyword
            // nor an IRI.
            None => continue,
            Some(p) if !p.contains(':') && !is_keyword(&p) => continue,
            Some(p) => p,
        };

        // Step 13.4
        if is_keyword(&expanded_property) {
            expand_keyword_entry(
                processor,
                active_context,
                type_scoped_context,
                active_property,
                &expanded_property,
                value,
                base_url,
                input_type,
                result,
                &mut nests,
                key,
            )
            .await?;
            continue;
        }

        // Step 13.5-13.14: a regular property.
        let definition = active_context.term_definition(key);
        let container = definition.and_then(Definition::container);
        let has = |item| container.map_or(false, |c: &Container| c.contains(item));

        // Step 13.6, 13.7, 13.8
        let mut expanded_value = if has(ContainerItem::Language) && value.is_object() {
            expand_language_map(processor, active_context, key, value).await?
        } else if (has(ContainerItem::Index) || has(ContainerItem::Type) || has(ContainerItem::Id))
            && value.is_object()
        {
            expand_index_map(processor, active_context, key, value, base_url).await?
        } else {
            // Step 13.9
            expand_element(processor, active_context, Some(key), value, base_url, false).await?
        };
        // Step 13.10
        if expanded_value.is_null() {
            continue;
        }
        // Step 13.11
        if has(ContainerItem::List) && !is_list_object(&expanded_value) {
            expanded_value = Value::Object(crate::json::single_entry_map(
                "@list",
                Value::Array(into_array(expanded_value)),
            ));
        }
        // Step 13.12
        if has(ContainerItem::Graph) && !has(ContainerItem::Id) && !has(ContainerItem::Index) {
            let wrapped: Vec<Value> = into_array(expanded_value)
                .into_iter()
                .map(|ev| {
                    Value::Object(crate::json::single_entry_map(
                        "@graph",
                        Value::Array(into_array(ev)),
                    ))
                })
                .collect();
            expanded_value = Value::Array(wrapped);
        }
        // Step 13.13
        if definition.map_or(false, Definition::is_reverse) {
            let reverse_map = result
                .entry("@reverse".to_owned())
                .or_insert_with(|| Value::Object(JsonMap::new()));
            let reverse_map = reverse_map
                .as_object_mut()
                .expect("Should never fail: `@reverse` is always a map here");
            for item in into_array(expanded_value) {
                if is_value_object(&item) || is_list_object(&item) {
                    return Err(ErrorCode::InvalidReversePropertyValue
                        .and_source(anyhow!("property = {:?}", expanded_property)));
                }
                add_value(reverse_map, &expanded_property, item, true);
            }
        } else {
            // Step 13.14
            add_value(result, &expanded_property, expanded_value, true);
        }
    }

    // Step 14: nested entries are processed after all other entries.
    for nesting_key in nests {
        let nested_values = element
            .get(nesting_key.as_str())
            .expect("Should never fail: the key was found in `element`");
        for nested_value in to_ref_array(nested_values) {
            let nested_map = match nested_value {
                Value::Object(map) => map,
                v => {
                    return Err(ErrorCode::InvalidNestValue
                        .and_source(anyhow!("Expected map but got {:?}", v)))
                }
            };
            for nested_key in nested_map.keys() {
                let expanded = ExpandIriOptions::constant(active_context)
                    .vocab(true)
                    .expand_str(processor, nested_key)
                    .await?;
                if expanded.as_deref() == Some("@value") {
                    return Err(ErrorCode::InvalidNestValue
                        .and_source(anyhow!("Nested value must not be a value object")));
                }
            }
            process_entries(
                processor,
                active_context,
                type_scoped_context,
                active_property,
                nested_map,
                base_url,
                input_type,
                result,
            )
            .await?;
        }
    }

    Ok(())
}

/// Expands a single keyword entry of a map (step 13.4 of the expansion
/// algorithm).
#[allow(clippy::too_many_arguments)]
async fn expand_keyword_entry<'a, L: LoadRemoteDocument>(
    processor: &Processor<L>,
    active_context: &Context,
    type_scoped_context: &Context,
    active_property: Option<&str>,
    expanded_property: &str,
    value: &Value,
    base_url: Option<&IriStr>,
    input_type: Option<&str>,
    result: &mut JsonMap<String, Value>,
    nests: &mut Vec<&'a String>,
    key: &'a String,
) -> Result<()> {
    let frame_expansion = processor.options().is_frame_expansion();

    // Step 13.4.1
    if active_property == Some("@reverse") {
        return Err(ErrorCode::InvalidReversePropertyMap
            .and_source(anyhow!("keyword {:?} inside `@reverse`", expanded_property)));
    }
    // Step 13.4.2
    if result.contains_key(expanded_property)
        && expanded_property != "@included"
        && expanded_property != "@type"
    {
        return Err(
            ErrorCode::CollidingKeywords.and_source(anyhow!("keyword = {:?}", expanded_property))
        );
    }

    match expanded_property {
        // Step 13.4.3
        "@id" => {
            let expanded = match value {
                Value::String(s) => {
                    ExpandIriOptions::constant(active_context)
                        .document_relative(true)
                        .expand_str(processor, s)
                        .await?
                        .map_or(Value::Null, Value::from)
                }
                v => {
                    return Err(
                        ErrorCode::InvalidIdValue.and_source(anyhow!("`@id` = {:?}", v))
                    )
                }
            };
            result.insert("@id".to_owned(), expanded);
        }
        // Step 13.4.4
        "@type" => {
            let type_values = to_ref_array(value);
            let mut expanded_types = Vec::new();
            for ty in &type_values {
                let ty = match ty {
                    Value::String(s) => s,
                    v => {
                        return Err(
                            ErrorCode::InvalidTypeValue.and_source(anyhow!("`@type` = {:?}", v))
                        )
                    }
                };
                // Type values expand against the type-scoped context.
                let expanded = ExpandIriOptions::constant(type_scoped_context)
                    .vocab(true)
                    .document_relative(true)
                    .expand_str(processor, ty)
                    .await?;
                if let Some(expanded) = expanded {
                    expanded_types.push(Value::from(expanded));
                }
            }
            let expanded_value = if value.is_array() {
                Value::Array(expanded_types)
            } else {
                expanded_types.into_iter().next().unwrap_or(Value::Null)
            };
            if !expanded_value.is_null() {
                add_value(result, "@type", expanded_value, false);
            }
        }
        // Step 13.4.5
        "@graph" => {
            let expanded =
                expand_element(processor, active_context, Some("@graph"), value, base_url, false)
                    .await?;
            let expanded: Vec<Value> = into_array(expanded)
                .into_iter()
                .filter(|v| !v.is_null())
                .collect();
            result.insert("@graph".to_owned(), Value::Array(expanded));
        }
        // Step 13.4.6
        "@included" => {
            if processor.options().is_processing_mode_1_0() {
                return Ok(());
            }
            let expanded = expand_element(
                processor,
                active_context,
                Some("@included"),
                value,
                base_url,
                false,
            )
            .await?;
            let expanded: Vec<Value> = into_array(expanded)
                .into_iter()
                .filter(|v| !v.is_null())
                .collect();
            for item in &expanded {
                if !crate::syntax::is_subject(item) && !crate::syntax::is_subject_reference(item) {
                    return Err(ErrorCode::InvalidIncludedValue
                        .and_source(anyhow!("`@included` item = {:?}", item)));
                }
            }
            add_value(result, "@included", Value::Array(expanded), true);
        }
        // Step 13.4.7
        "@value" => {
            if input_type == Some("@json") && !processor.options().is_processing_mode_1_0() {
                // A JSON literal keeps its value verbatim.
                result.insert("@value".to_owned(), value.clone());
            } else {
                match value {
                    Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
                        result.insert("@value".to_owned(), value.clone());
                    }
                    v => {
                        return Err(ErrorCode::InvalidValueObjectValue
                            .and_source(anyhow!("`@value` = {:?}", v)))
                    }
                }
            }
        }
        // Step 13.4.8
        "@language" => {
            let language = match value {
                Value::String(s) => s,
                v => {
                    return Err(ErrorCode::InvalidLanguageTaggedString
                        .and_source(anyhow!("`@language` = {:?}", v)))
                }
            };
            if LangTag::new(language).is_err() {
                processor.warn(Warning::MalformedLanguageTag(language.clone()));
            }
            result.insert("@language".to_owned(), Value::from(language.as_str()));
        }
        // Step 13.4.9
        "@direction" => {
            if processor.options().is_processing_mode_1_0() {
                return Ok(());
            }
            match value.as_str() {
                Some("ltr") | Some("rtl") => {
                    result.insert("@direction".to_owned(), value.clone());
                }
                _ => {
                    return Err(ErrorCode::InvalidBaseDirection
                        .and_source(anyhow!("`@direction` = {:?}", value)))
                }
            }
        }
        // Step 13.4.10
        "@index" => {
            let index = match value {
                Value::String(s) => s,
                v => {
                    return Err(
                        ErrorCode::InvalidIndexValue.and_source(anyhow!("`@index` = {:?}", v))
                    )
                }
            };
            result.insert("@index".to_owned(), Value::from(index.as_str()));
        }
        // Step 13.4.11
        "@list" => {
            // A free-floating list is dropped.
            if active_property.is_none() || active_property == Some("@graph") {
                return Ok(());
            }
            let expanded =
                expand_element(processor, active_context, active_property, value, base_url, false)
                    .await?;
            let expanded: Vec<Value> = into_array(expanded)
                .into_iter()
                .filter(|v| !v.is_null())
                .collect();
            result.insert("@list".to_owned(), Value::Array(expanded));
        }
        // Step 13.4.12
        "@set" => {
            let expanded =
                expand_element(processor, active_context, active_property, value, base_url, false)
                    .await?;
            result.insert("@set".to_owned(), expanded);
        }
        // Step 13.4.13
        "@reverse" => {
            let map = match value {
                Value::Object(_) => value,
                v => {
                    return Err(
                        ErrorCode::InvalidReverseValue.and_source(anyhow!("`@reverse` = {:?}", v))
                    )
                }
            };
            let expanded =
                expand_element(processor, active_context, Some("@reverse"), map, base_url, false)
                    .await?;
            let expanded = match expanded {
                Value::Object(map) => map,
                _ => return Ok(()),
            };
            // Step 13.4.13.3: reverse entries of a reverse map are forward
            // properties.
            if let Some(Value::Object(reverse_entries)) = expanded.get("@reverse") {
                for (property, items) in reverse_entries {
                    add_value(result, property, items.clone(), true);
                }
            }
            // Step 13.4.13.4
            let forward: Vec<(&String, &Value)> = expanded
                .iter()
                .filter(|(property, _)| property.as_str() != "@reverse")
                .collect();
            if !forward.is_empty() {
                let reverse_map = result
                    .entry("@reverse".to_owned())
                    .or_insert_with(|| Value::Object(JsonMap::new()));
                let reverse_map = reverse_map
                    .as_object_mut()
                    .expect("Should never fail: `@reverse` is always a map here");
                for (property, items) in forward {
                    for item in to_ref_array(items) {
                        if is_value_object(item) || is_list_object(item) {
                            return Err(ErrorCode::InvalidReversePropertyValue
                                .and_source(anyhow!("property = {:?}", property)));
                        }
                        add_value(reverse_map, property, item.clone(), true);
                    }
                }
            }
        }
        // Step 13.4.14
        "@nest" => {
            nests.push(key);
        }
        // Frame keywords are meaningful in frame expansion only; outside of
        // it they are dropped.
        "@default" | "@embed" | "@explicit" | "@omitDefault" | "@requireAll" => {
            if frame_expansion {
                let expanded = expand_element(
                    processor,
                    active_context,
                    Some(expanded_property),
                    value,
                    base_url,
                    false,
                )
                .await?;
                result.insert(expanded_property.to_owned(), expanded);
            }
        }
        _ => {}
    }

    Ok(())
}

/// Expands a language map (step 13.7 of the expansion algorithm).
async fn expand_language_map<L: LoadRemoteDocument>(
    processor: &Processor<L>,
    active_context: &Context,
    key: &str,
    value: &Value,
) -> Result<Value> {
    let map = value
        .as_object()
        .expect("Should never fail: checked by the caller");
    let definition = active_context.term_definition(key);
    let direction = match definition.and_then(Definition::direction) {
        Some(dir) => Option::from(dir),
        None => active_context.default_base_direction(),
    };

    let mut expanded_value = Vec::new();
    for (language, language_value) in entries(map, processor.options().is_ordered()) {
        for item in to_ref_array(language_value) {
            let item = match item {
                Value::Null => continue,
                Value::String(s) => s,
                v => {
                    return Err(ErrorCode::InvalidLanguageMapValue
                        .and_source(anyhow!("language map value = {:?}", v)))
                }
            };
            let mut v = JsonMap::new();
            v.insert("@value".to_owned(), Value::from(item.as_str()));
            let expanded_language = ExpandIriOptions::constant(active_context)
                .vocab(true)
                .expand_str(processor, language)
                .await?;
            if expanded_language.as_deref() != Some("@none") {
                if LangTag::new(language).is_err() {
                    processor.warn(Warning::MalformedLanguageTag(language.clone()));
                }
                v.insert("@language".to_owned(), Value::from(language.as_str()));
            }
            if let Some(direction) = direction {
                v.insert("@direction".to_owned(), Value::from(direction.as_str()));
            }
            expanded_value.push(Value::Object(v));
        }
    }

    Ok(Value::Array(expanded_value))
}

/// Expands an index map: `@index`, `@id` or `@type` containers (step 13.8 of
/// the expansion algorithm).
async fn expand_index_map<L: LoadRemoteDocument>(
    processor: &Processor<L>,
    active_context: &Context,
    key: &str,
    value: &Value,
    base_url: Option<&IriStr>,
) -> Result<Value> {
    let map = value
        .as_object()
        .expect("Should never fail: checked by the caller");
    let definition = active_context.term_definition(key);
    let container = definition
        .and_then(Definition::container)
        .expect("Should never fail: checked by the caller");
    let has = |item| container.contains(item);
    let index_key = definition.and_then(Definition::index).unwrap_or("@index");

    let mut expanded_value = Vec::new();
    for (index, index_value) in entries(map, processor.options().is_ordered()) {
        // Step 13.8.3.1, 13.8.3.2: for id and type maps, the map context
        // starts from the previous context, and type map keys may carry
        // their own scoped context.
        let mut map_context = if has(ContainerItem::Id) || has(ContainerItem::Type) {
            Cow::Borrowed(active_context.previous_context().unwrap_or(active_context))
        } else {
            Cow::Borrowed(active_context)
        };
        if has(ContainerItem::Type) {
            if let Some(index_def) = map_context.term_definition(index) {
                if let Some(local_context) = index_def.local_context() {
                    let new_context = merge::join_value(
                        processor,
                        &map_context,
                        local_context,
                        index_def.base_url().map(ToOwned::to_owned),
                        merge::OptionalParams::new(),
                    )
                    .await?;
                    map_context = Cow::Owned(new_context);
                }
            }
        }

        // Step 13.8.3.4
        let expanded_index = ExpandIriOptions::constant(active_context)
            .vocab(true)
            .expand_str(processor, index)
            .await?
            .unwrap_or_else(|| index.to_owned());
        // Step 13.8.3.5, 13.8.3.6
        let index_value_array = Value::Array(into_array(index_value.clone()));
        let expanded_items = expand_element(
            processor,
            &map_context,
            Some(key),
            &index_value_array,
            base_url,
            true,
        )
        .await?;

        for mut item in into_array(expanded_items) {
            // Step 13.8.3.7.1
            if has(ContainerItem::Graph) && !is_graph_object(&item) {
                item = Value::Object(crate::json::single_entry_map(
                    "@graph",
                    Value::Array(into_array(item)),
                ));
            }
            let item_map = item
                .as_object_mut()
                .expect("Should never fail: expanded items are maps");
            if has(ContainerItem::Index) && index_key != "@index" && expanded_index != "@none" {
                // Step 13.8.3.7.2: a property-valued index re-expands the
                // index as a value of that property.
                let re_expanded_index =
                    expand_value(processor, active_context, index_key, &Value::from(index.as_str()))
                        .await?;
                let expanded_index_key = ExpandIriOptions::constant(active_context)
                    .vocab(true)
                    .expand_str(processor, index_key)
                    .await?
                    .ok_or_else(|| {
                        ErrorCode::InvalidTermDefinition
                            .and_source(anyhow!("index key {:?} expands to null", index_key))
                    })?;
                let mut index_values = vec![re_expanded_index];
                if let Some(existing) = item_map.get(&expanded_index_key) {
                    index_values.extend(into_array(existing.clone()));
                }
                item_map.insert(expanded_index_key, Value::Array(index_values));
                if item_map.contains_key("@value") && item_map.len() > 1 {
                    return Err(ErrorCode::InvalidValueObject
                        .and_source(anyhow!("value object with a property-based index")));
                }
            } else if has(ContainerItem::Index)
                && !item_map.contains_key("@index")
                && expanded_index != "@none"
            {
                // Step 13.8.3.7.3
                item_map.insert("@index".to_owned(), Value::from(index.as_str()));
            } else if has(ContainerItem::Id)
                && !item_map.contains_key("@id")
                && expanded_index != "@none"
            {
                // Step 13.8.3.7.4
                let expanded_id = ExpandIriOptions::constant(active_context)
                    .document_relative(true)
                    .expand_str(processor, index)
                    .await?;
                item_map.insert("@id".to_owned(), expanded_id.map_or(Value::Null, Value::from));
            } else if has(ContainerItem::Type) && expanded_index != "@none" {
                // Step 13.8.3.7.5
                let mut types = vec![Value::from(expanded_index.as_str())];
                if let Some(existing) = item_map.get("@type") {
                    types.extend(into_array(existing.clone()));
                }
                item_map.insert("@type".to_owned(), Value::Array(types));
            }
            expanded_value.push(item);
        }
    }

    Ok(Value::Array(expanded_value))
}

/// Validates and normalizes the expanded map (steps 15 to 19 of the
/// expansion algorithm).
fn finalize_expanded_map<L: LoadRemoteDocument>(
    processor: &Processor<L>,
    active_property: Option<&str>,
    mut result: JsonMap<String, Value>,
) -> Result<Value> {
    let frame_expansion = processor.options().is_frame_expansion();

    // Step 15
    if result.contains_key("@value") {
        for key in result.keys() {
            match key.as_str() {
                "@direction" | "@index" | "@language" | "@type" | "@value" => {}
                v => {
                    return Err(
                        ErrorCode::InvalidValueObject.and_source(anyhow!("Unexpected key {:?}", v))
                    )
                }
            }
        }
        if result.contains_key("@type")
            && (result.contains_key("@language") || result.contains_key("@direction"))
        {
            return Err(ErrorCode::InvalidValueObject.and_source(anyhow!(
                "`@type` must not appear together with `@language` or `@direction`"
            )));
        }
        let ty = result.get("@type").and_then(Value::as_str);
        if ty != Some("@json") {
            let value = result
                .get("@value")
                .expect("Should never fail: just checked above");
            let droppable = matches!(value, Value::Null)
                || matches!(value, Value::Array(arr) if arr.is_empty());
            if droppable && !frame_expansion {
                return Ok(Value::Null);
            }
            if !value.is_string() && result.contains_key("@language") {
                return Err(ErrorCode::InvalidLanguageTaggedValue
                    .and_source(anyhow!("`@value` = {:?}", value)));
            }
            if let Some(ty) = ty {
                if !crate::iri::is_absolute_iri(ty) {
                    return Err(
                        ErrorCode::InvalidTypedValue.and_source(anyhow!("`@type` = {:?}", ty))
                    );
                }
            } else if result.contains_key("@type") {
                return Err(ErrorCode::InvalidTypedValue
                    .and_source(anyhow!("`@type` = {:?}", result.get("@type"))));
            }
        }
    }
    // Step 16
    else if let Some(ty) = result.get_mut("@type") {
        if !ty.is_array() {
            let single = ty.take();
            *ty = Value::Array(vec![single]);
        }
    }
    // Step 17
    else if result.contains_key("@set") || result.contains_key("@list") {
        // Step 17.1
        for key in result.keys() {
            match key.as_str() {
                "@set" | "@list" | "@index" => {}
                v => {
                    return Err(ErrorCode::InvalidSetOrListObject
                        .and_source(anyhow!("Unexpected key {:?}", v)))
                }
            }
        }
        // Step 17.2
        if let Some(set) = result.get_mut("@set") {
            return Ok(set.take());
        }
    }
    // Step 18
    if result.len() == 1 && result.contains_key("@language") {
        return Ok(Value::Null);
    }
    // Step 19
    if active_property.is_none() || active_property == Some("@graph") {
        // Step 19.1
        if result.is_empty()
            || result.contains_key("@value")
            || result.contains_key("@list")
        {
            return Ok(Value::Null);
        }
        // Step 19.2
        if result.len() == 1 && result.contains_key("@id") && !frame_expansion {
            return Ok(Value::Null);
        }
    }

    Ok(Value::Object(result))
}
