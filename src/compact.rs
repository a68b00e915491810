//! Compaction algorithm.
//!
//! See <https://www.w3.org/TR/json-ld11-api/#compaction-algorithm>.

use std::{borrow::Cow, future::Future, pin::Pin};

use anyhow::anyhow;
use serde_json::{Map as JsonMap, Value};

use crate::{
    context::{merge, Container, ContainerItem, Context, Definition},
    error::{ErrorCode, Result},
    expand::iri::ExpandIriOptions,
    json::{add_value, entries, into_array, to_ref_array},
    processor::Processor,
    remote::LoadRemoteDocument,
    syntax::{is_graph_object, is_list_object, is_simple_graph_object, is_subject_reference,
        is_value_object},
};

pub(crate) use self::iri::{compact_iri, compact_iri_with};
use self::value::compact_value;

mod iri;
mod value;

/// Runs the compaction algorithm on a single expanded element.
///
/// This returns a boxed future as the algorithm is recursive.
///
/// See <https://www.w3.org/TR/json-ld11-api/#compaction-algorithm>.
pub(crate) fn compact_element<'a, L: LoadRemoteDocument>(
    processor: &'a Processor<L>,
    active_context: &'a Context,
    active_property: Option<&'a str>,
    element: &'a Value,
) -> Pin<Box<dyn Future<Output = Result<Value>> + Send + 'a>> {
    Box::pin(compact_element_impl(
        processor,
        active_context,
        active_property,
        element,
    ))
}

/// Internal implementation of `compact_element()`.
async fn compact_element_impl<L: LoadRemoteDocument>(
    processor: &Processor<L>,
    active_context: &Context,
    active_property: Option<&str>,
    element: &Value,
) -> Result<Value> {
    match element {
        // Step 2: scalars are already compact.
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => Ok(element.clone()),
        // Step 3
        Value::Array(items) => {
            let mut result = Vec::new();
            for item in items {
                let compacted =
                    compact_element(processor, active_context, active_property, item).await?;
                if !compacted.is_null() {
                    result.push(compacted);
                }
            }
            // Step 3.2: a lone element replaces its array, unless the
            // property carries an explicit container.
            if result.len() == 1 && processor.options().is_compact_arrays() {
                let container = definition_of(active_context, active_property)
                    .and_then(Definition::container);
                if container.is_none() {
                    return Ok(result
                        .into_iter()
                        .next()
                        .expect("Should never fail: just checked the length"));
                }
            }
            Ok(Value::Array(result))
        }
        // Step 4 and after
        Value::Object(map) => {
            compact_map(processor, active_context, active_property, map).await
        }
    }
}

/// Returns the term definition of the active property, if any.
fn definition_of<'a>(
    active_context: &'a Context,
    active_property: Option<&str>,
) -> Option<&'a Definition> {
    active_property.and_then(|property| active_context.term_definition(property))
}

/// Compacts an expanded map.
async fn compact_map<L: LoadRemoteDocument>(
    processor: &Processor<L>,
    active_context: &Context,
    active_property: Option<&str>,
    element: &JsonMap<String, Value>,
) -> Result<Value> {
    let options = processor.options();
    let element_value = Value::Object(element.clone());
    let mut active_context = Cow::Borrowed(active_context);

    // Step 5: the scope of a term-scoped context does not apply when
    // processing new node objects, so pop back to the previous context.
    if active_context.has_previous_context()
        && !is_value_object(&element_value)
        && !is_subject_reference(&element_value)
    {
        let previous = active_context
            .previous_context()
            .expect("Should never fail: just checked above")
            .clone();
        active_context = Cow::Owned(previous);
    }

    // Step 6: apply the property-scoped context of the active property.
    let property_scoped = definition_of(&active_context, active_property).and_then(|def| {
        def.local_context()
            .map(|ctx| (ctx.clone(), def.base_url().map(ToOwned::to_owned)))
    });
    if let Some((local_context, base_url)) = property_scoped {
        let new_context = merge::join_value(
            processor,
            &active_context,
            &local_context,
            base_url,
            merge::OptionalParams::new().override_protected(true),
        )
        .await?;
        active_context = Cow::Owned(new_context);
    }

    // Step 7: value objects and bare subject references go through value
    // compaction.
    if is_value_object(&element_value) || is_subject_reference(&element_value) {
        return compact_value(options, &active_context, active_property, element);
    }

    // Step 8: a list under a matching list container inlines its items.
    if is_list_object(&element_value) {
        let container =
            definition_of(&active_context, active_property).and_then(Definition::container);
        if container.map_or(false, |c| c.contains(ContainerItem::List)) {
            let list = element
                .get("@list")
                .expect("Should never fail: just checked by the shape predicate");
            return compact_element(processor, &active_context, active_property, list).await;
        }
    }

    // Step 9
    let inside_reverse = active_property == Some("@reverse");
    // Step 10
    let mut result = JsonMap::new();

    // Step 11: apply type-scoped contexts, in lexicographical order of the
    // compacted type terms, without propagation.
    let input_context = active_context.clone().into_owned();
    if let Some(types) = element.get("@type") {
        let mut compacted_types = Vec::new();
        for ty in to_ref_array(types) {
            if let Some(ty) = ty.as_str() {
                compacted_types.push(compact_iri(options, &input_context, ty, true, false)?);
            }
        }
        compacted_types.sort();
        for term in &compacted_types {
            let scoped = input_context.term_definition(term).and_then(|def| {
                def.local_context()
                    .map(|ctx| (ctx.clone(), def.base_url().map(ToOwned::to_owned)))
            });
            if let Some((local_context, base_url)) = scoped {
                let new_context = merge::join_value(
                    processor,
                    &active_context,
                    &local_context,
                    base_url,
                    merge::OptionalParams::new().propagate(false),
                )
                .await?;
                active_context = Cow::Owned(new_context);
            }
        }
    }

    // Step 12
    for (expanded_property, expanded_value) in entries(element, options.is_ordered()) {
        match expanded_property.as_str() {
            // Step 12.1
            "@id" => {
                let id = expanded_value.as_str().ok_or_else(|| {
                    ErrorCode::InvalidIdValue.and_source(anyhow!("`@id` = {:?}", expanded_value))
                })?;
                let compacted = compact_iri(options, &active_context, id, false, false)?;
                let alias = compact_iri(options, &active_context, "@id", true, false)?;
                result.insert(alias, Value::from(compacted));
            }
            // Step 12.2
            "@type" => {
                let mut compacted_types = Vec::new();
                for ty in to_ref_array(expanded_value) {
                    let ty = ty.as_str().ok_or_else(|| {
                        ErrorCode::InvalidTypeValue.and_source(anyhow!("`@type` = {:?}", ty))
                    })?;
                    compacted_types
                        .push(Value::from(compact_iri(options, &input_context, ty, true, false)?));
                }
                let alias = compact_iri(options, &active_context, "@type", true, false)?;
                let alias_container = active_context
                    .term_definition(&alias)
                    .and_then(Definition::container);
                let as_array = compacted_types.len() > 1
                    || !options.is_compact_arrays()
                    || alias_container.map_or(false, |c| c.contains(ContainerItem::Set));
                let compacted_value = if as_array {
                    Value::Array(compacted_types)
                } else {
                    compacted_types
                        .into_iter()
                        .next()
                        .unwrap_or_else(|| Value::Array(Vec::new()))
                };
                result.insert(alias, compacted_value);
            }
            // Step 12.3
            "@reverse" => {
                let compacted = compact_element(
                    processor,
                    &active_context,
                    Some("@reverse"),
                    expanded_value,
                )
                .await?;
                let mut compacted = match compacted {
                    Value::Object(map) => map,
                    v => {
                        return Err(ErrorCode::InvalidReverseValue
                            .and_source(anyhow!("compacted `@reverse` = {:?}", v)))
                    }
                };
                // Step 12.3.1: reverse-property terms bubble up to the node
                // itself.
                let reverse_terms: Vec<String> = compacted
                    .keys()
                    .filter(|term| {
                        active_context
                            .term_definition(term)
                            .map_or(false, Definition::is_reverse)
                    })
                    .cloned()
                    .collect();
                for term in reverse_terms {
                    let value = compacted
                        .remove(&term)
                        .expect("Should never fail: the key was just listed");
                    let container = active_context
                        .term_definition(&term)
                        .and_then(Definition::container);
                    let as_array = !options.is_compact_arrays()
                        || container.map_or(false, |c| c.contains(ContainerItem::Set));
                    add_value(&mut result, &term, value, as_array);
                }
                // Step 12.3.2
                if !compacted.is_empty() {
                    let alias = compact_iri(options, &active_context, "@reverse", true, false)?;
                    result.insert(alias, Value::Object(compacted));
                }
            }
            // Step 12.4
            "@preserve" => {
                let compacted =
                    compact_element(processor, &active_context, active_property, expanded_value)
                        .await?;
                if !matches!(&compacted, Value::Array(arr) if arr.is_empty()) {
                    result.insert("@preserve".to_owned(), compacted);
                }
            }
            // Step 12.5: the index is folded into the surrounding index map.
            "@index"
                if definition_of(&active_context, active_property)
                    .map_or(false, |def| def.container_contains(ContainerItem::Index)) => {}
            // Step 12.6
            "@index" | "@value" | "@language" | "@direction" => {
                let alias =
                    compact_iri(options, &active_context, expanded_property, true, false)?;
                result.insert(alias, expanded_value.clone());
            }
            // Step 12.7, 12.8: regular properties (including `@graph`,
            // `@included` and `@list` entries of node objects).
            _ => {
                compact_property(
                    processor,
                    &active_context,
                    expanded_property,
                    expanded_value,
                    inside_reverse,
                    &mut result,
                )
                .await?;
            }
        }
    }

    Ok(Value::Object(result))
}

/// Compacts all values of a regular property (steps 12.7 and 12.8 of the
/// compaction algorithm).
async fn compact_property<L: LoadRemoteDocument>(
    processor: &Processor<L>,
    active_context: &Context,
    expanded_property: &str,
    expanded_value: &Value,
    inside_reverse: bool,
    result: &mut JsonMap<String, Value>,
) -> Result<()> {
    let options = processor.options();

    // Step 12.7: an empty array keeps an (empty) entry for the property.
    let items = match expanded_value.as_array() {
        Some(items) if items.is_empty() => {
            let item_active_property = compact_iri_with(
                options,
                active_context,
                expanded_property,
                expanded_value,
                true,
                inside_reverse,
            )?;
            let target = nest_target(
                processor,
                active_context,
                &item_active_property,
                result,
            )
            .await?;
            add_value(target, &item_active_property, Value::Array(Vec::new()), true);
            return Ok(());
        }
        Some(items) => items,
        None => {
            return Err(ErrorCode::Uncategorized.and_source(anyhow!(
                "Expected an array as expanded property value, but got {:?}",
                expanded_value
            )))
        }
    };

    // Step 12.8
    for item in items {
        // Step 12.8.1
        let item_active_property = compact_iri_with(
            options,
            active_context,
            expanded_property,
            item,
            true,
            inside_reverse,
        )?;
        // Step 12.8.2
        let target =
            nest_target(processor, active_context, &item_active_property, result).await?;
        let definition = active_context.term_definition(&item_active_property);
        let container = definition.and_then(Definition::container);
        let has = |item| container.map_or(false, |c: &Container| c.contains(item));
        let as_array = !options.is_compact_arrays()
            || has(ContainerItem::Set)
            || item_active_property == "@graph"
            || item_active_property == "@list";

        // Step 12.8.3: lists and graphs compact their inner content.
        let inner = if is_list_object(item) {
            item.get("@list")
                .expect("Should never fail: just checked by the shape predicate")
        } else if is_graph_object(item) {
            item.get("@graph")
                .expect("Should never fail: just checked by the shape predicate")
        } else {
            item
        };
        let compacted_item =
            compact_element(processor, active_context, Some(&item_active_property), inner).await?;

        // Step 12.8.4: list objects.
        if is_list_object(item) {
            let compacted_list = into_array(compacted_item);
            if !has(ContainerItem::List) {
                let list_alias = compact_iri(options, active_context, "@list", true, false)?;
                let mut wrapped =
                    crate::json::single_entry_map(list_alias, Value::Array(compacted_list));
                if let Some(index) = item.get("@index") {
                    let index_alias =
                        compact_iri(options, active_context, "@index", true, false)?;
                    wrapped.insert(index_alias, index.clone());
                }
                add_value(target, &item_active_property, Value::Object(wrapped), as_array);
            } else {
                // There can be at most one list under a list container.
                target.insert(item_active_property.clone(), Value::Array(compacted_list));
            }
            continue;
        }

        // Step 12.8.5-12.8.8: graph objects.
        if is_graph_object(item) {
            compact_graph_item(
                processor,
                active_context,
                &item_active_property,
                item,
                compacted_item,
                has(ContainerItem::Graph),
                has(ContainerItem::Id),
                has(ContainerItem::Index),
                as_array,
                target,
            )
            .await?;
            continue;
        }

        // Step 12.8.9: language, index, id and type maps.
        if has(ContainerItem::Language)
            || has(ContainerItem::Index)
            || has(ContainerItem::Id)
            || has(ContainerItem::Type)
        {
            compact_container_map_item(
                processor,
                active_context,
                &item_active_property,
                definition,
                item,
                compacted_item,
                as_array,
                target,
            )
            .await?;
            continue;
        }

        // Step 12.8.10
        add_value(target, &item_active_property, compacted_item, as_array);
    }

    Ok(())
}

/// Resolves the map the property lands in: the node map itself, or a nested
/// map when the term carries a nest value.
async fn nest_target<'a, L: LoadRemoteDocument>(
    processor: &Processor<L>,
    active_context: &Context,
    item_active_property: &str,
    result: &'a mut JsonMap<String, Value>,
) -> Result<&'a mut JsonMap<String, Value>> {
    let nest_term = active_context
        .term_definition(item_active_property)
        .and_then(Definition::nest);
    let nest_term = match nest_term {
        Some(term) => term.to_owned(),
        None => return Ok(result),
    };

    // The nest term must itself expand to `@nest`.
    let expanded = ExpandIriOptions::constant(active_context)
        .vocab(true)
        .expand_str(processor, &nest_term)
        .await?;
    if expanded.as_deref() != Some("@nest") {
        return Err(ErrorCode::InvalidNestValue
            .and_source(anyhow!("nest term {:?} does not expand to `@nest`", nest_term)));
    }

    let nested = result
        .entry(nest_term)
        .or_insert_with(|| Value::Object(JsonMap::new()));
    nested.as_object_mut().ok_or_else(|| {
        ErrorCode::InvalidNestValue.and_source(anyhow!("nest target is not a map"))
    })
}

/// Compacts one graph object item of a property (steps 12.8.5 to 12.8.8 of
/// the compaction algorithm).
#[allow(clippy::too_many_arguments)]
async fn compact_graph_item<L: LoadRemoteDocument>(
    processor: &Processor<L>,
    active_context: &Context,
    item_active_property: &str,
    item: &Value,
    compacted_item: Value,
    container_graph: bool,
    container_id: bool,
    container_index: bool,
    as_array: bool,
    nest_target: &mut JsonMap<String, Value>,
) -> Result<()> {
    let options = processor.options();
    let item_map = item
        .as_object()
        .expect("Should never fail: graph objects are maps");

    // Step 12.8.6: graph maps keyed by `@id`.
    if container_graph && container_id {
        let key = match item_map.get("@id").and_then(Value::as_str) {
            Some(id) => compact_iri(options, active_context, id, false, false)?,
            None => compact_iri(options, active_context, "@none", true, false)?,
        };
        let map_object = ensure_map(nest_target, item_active_property);
        add_value(map_object, &key, compacted_item, as_array);
        return Ok(());
    }

    // Step 12.8.7: graph maps keyed by `@index`, for simple graphs.
    if container_graph && container_index && is_simple_graph_object(item) {
        let key = match item_map.get("@index").and_then(Value::as_str) {
            Some(index) => index.to_owned(),
            None => compact_iri(options, active_context, "@none", true, false)?,
        };
        let map_object = ensure_map(nest_target, item_active_property);
        add_value(map_object, &key, compacted_item, as_array);
        return Ok(());
    }

    // Step 12.8.8 (first half): a simple graph under a graph container.
    if container_graph && is_simple_graph_object(item) {
        // Multiple values land under an `@included` sub-entry instead of a
        // nested array.
        let compacted_item = match compacted_item {
            Value::Array(arr) if arr.len() > 1 => {
                let included_alias =
                    compact_iri(options, active_context, "@included", true, false)?;
                Value::Object(crate::json::single_entry_map(included_alias, Value::Array(arr)))
            }
            v => v,
        };
        add_value(nest_target, item_active_property, compacted_item, as_array);
        return Ok(());
    }

    // Step 12.8.8 (second half): re-wrap under an `@graph` alias.
    let graph_alias = compact_iri(options, active_context, "@graph", true, false)?;
    let mut wrapped = crate::json::single_entry_map(graph_alias, compacted_item);
    if let Some(id) = item_map.get("@id").and_then(Value::as_str) {
        let id_alias = compact_iri(options, active_context, "@id", true, false)?;
        wrapped.insert(
            id_alias,
            Value::from(compact_iri(options, active_context, id, false, false)?),
        );
    }
    if let Some(index) = item_map.get("@index") {
        let index_alias = compact_iri(options, active_context, "@index", true, false)?;
        wrapped.insert(index_alias, index.clone());
    }
    add_value(nest_target, item_active_property, Value::Object(wrapped), as_array);

    Ok(())
}

/// Compacts one item of a property with a language, index, id or type
/// container (step 12.8.9 of the compaction algorithm).
#[allow(clippy::too_many_arguments)]
async fn compact_container_map_item<L: LoadRemoteDocument>(
    processor: &Processor<L>,
    active_context: &Context,
    item_active_property: &str,
    definition: Option<&Definition>,
    item: &Value,
    mut compacted_item: Value,
    as_array: bool,
    nest_target: &mut JsonMap<String, Value>,
) -> Result<()> {
    let options = processor.options();
    let container = definition.and_then(Definition::container);
    let has = |i| container.map_or(false, |c: &Container| c.contains(i));
    let item_map = item
        .as_object()
        .expect("Should never fail: expanded property values are maps");

    let none_key = || compact_iri(options, active_context, "@none", true, false);

    let key;
    if has(ContainerItem::Language) {
        // Step 12.8.9.2
        if is_value_object(item) {
            compacted_item = item_map
                .get("@value")
                .cloned()
                .expect("Should never fail: just checked by the shape predicate");
        }
        key = match item_map.get("@language").and_then(Value::as_str) {
            Some(language) => language.to_owned(),
            None => none_key()?,
        };
    } else if has(ContainerItem::Index) {
        let index_key = definition.and_then(Definition::index).unwrap_or("@index");
        if index_key == "@index" {
            // Step 12.8.9.4
            key = match item_map.get("@index").and_then(Value::as_str) {
                Some(index) => index.to_owned(),
                None => none_key()?,
            };
        } else {
            // Step 12.8.9.5: a property-valued index pulls the key out of
            // the compacted item itself.
            let container_key = compact_iri(options, active_context, index_key, true, false)?;
            let mut extracted = None;
            if let Some(map) = compacted_item.as_object_mut() {
                if let Some(existing) = map.get_mut(&container_key) {
                    let mut values = into_array(existing.take());
                    if !values.is_empty() {
                        extracted = Some(values.remove(0));
                    }
                    match values.len() {
                        0 => {
                            map.remove(&container_key);
                        }
                        1 => {
                            *map.get_mut(&container_key)
                                .expect("Should never fail: the entry is present") = values
                                .into_iter()
                                .next()
                                .expect("Should never fail: just checked the length");
                        }
                        _ => {
                            *map.get_mut(&container_key)
                                .expect("Should never fail: the entry is present") =
                                Value::Array(values);
                        }
                    }
                }
            }
            key = match extracted.as_ref().and_then(Value::as_str) {
                Some(index) => index.to_owned(),
                None => none_key()?,
            };
        }
    } else if has(ContainerItem::Id) {
        // Step 12.8.9.6
        let id_alias = compact_iri(options, active_context, "@id", true, false)?;
        key = match compacted_item
            .as_object_mut()
            .and_then(|map| map.remove(&id_alias))
            .as_ref()
            .and_then(Value::as_str)
        {
            Some(id) => id.to_owned(),
            None => none_key()?,
        };
    } else {
        // Step 12.8.9.7: a type map.
        let type_alias = compact_iri(options, active_context, "@type", true, false)?;
        let mut extracted = None;
        if let Some(map) = compacted_item.as_object_mut() {
            if let Some(existing) = map.get_mut(&type_alias) {
                let mut types = into_array(existing.take());
                if !types.is_empty() {
                    extracted = Some(types.remove(0));
                }
                match types.len() {
                    0 => {
                        map.remove(&type_alias);
                    }
                    1 => {
                        *map.get_mut(&type_alias)
                            .expect("Should never fail: the entry is present") = types
                            .into_iter()
                            .next()
                            .expect("Should never fail: just checked the length");
                    }
                    _ => {
                        *map.get_mut(&type_alias)
                            .expect("Should never fail: the entry is present") =
                            Value::Array(types);
                    }
                }
            }
        }
        // Step 12.8.9.7.2: a now-bare subject reference compacts further.
        let recompact = compacted_item
            .as_object()
            .map_or(false, |map| map.len() == 1 && item_map.contains_key("@id"));
        if recompact {
            let id_reference = Value::Object(crate::json::single_entry_map(
                "@id",
                item_map
                    .get("@id")
                    .cloned()
                    .expect("Should never fail: just checked above"),
            ));
            compacted_item = compact_element(
                processor,
                active_context,
                Some(item_active_property),
                &id_reference,
            )
            .await?;
        }
        key = match extracted.as_ref().and_then(Value::as_str) {
            Some(ty) => ty.to_owned(),
            None => none_key()?,
        };
    }

    // Step 12.8.9.8
    let map_object = ensure_map(nest_target, item_active_property);
    add_value(map_object, &key, compacted_item, as_array);

    Ok(())
}

/// Returns the (created on demand) map entry for the given property.
fn ensure_map<'a>(
    target: &'a mut JsonMap<String, Value>,
    property: &str,
) -> &'a mut JsonMap<String, Value> {
    target
        .entry(property.to_owned())
        .or_insert_with(|| Value::Object(JsonMap::new()))
        .as_object_mut()
        .expect("Should never fail: the entry is always created as a map")
}
