//! Part of create term definition algorithm, for non-reverse term
//! definitions.

use std::collections::HashMap;

use anyhow::anyhow;
use langtag::LangTag;
use serde_json::{Map as JsonMap, Value};

use crate::{
    context::{
        create_term_def::{create_term_definition, OptionalParams},
        definition::{Container, ContainerItem, Definition, DefinitionBuilder, Direction},
        merge, Context,
    },
    error::{ErrorCode, Result},
    expand::iri::ExpandIriOptions,
    iri::{
        has_compact_iri_form, is_absolute_iri, is_absolute_or_blank_node_ident,
        is_blank_node_identifier, is_gen_delims_byte, to_prefix_and_suffix,
    },
    json::Nullable,
    processor::{Processor, ProcessorOptions, Warning},
    remote::LoadRemoteDocument,
    syntax::{has_form_of_keyword, is_keyword},
};

/// Runs rest of the create term definition algorithm for the case `@reverse`
/// does not exist.
// Step 15 and after.
#[allow(clippy::too_many_arguments)]
pub(super) async fn run_for_non_reverse<L: LoadRemoteDocument>(
    processor: &Processor<L>,
    active_context: &mut Context,
    local_context: &JsonMap<String, Value>,
    term: &str,
    defined: &mut HashMap<String, bool>,
    params: &OptionalParams,
    value: &JsonMap<String, Value>,
    mut definition: DefinitionBuilder,
    previous_definition: Option<Definition>,
    simple_term: bool,
) -> Result<()> {
    // Step 15
    definition.set_reverse(false);
    // Step 16-20
    let committed = process_iri(
        processor,
        active_context,
        local_context,
        term,
        defined,
        params,
        value,
        &mut definition,
        simple_term,
    )
    .await?;
    if committed == IriMapping::WarnedAndSkipped {
        return Ok(());
    }
    // Step 21
    process_container(processor.options(), value, &mut definition)?;
    // Step 22
    process_index(processor, active_context, value, &mut definition).await?;
    // Step 23
    process_local_context(processor, active_context, params, value, &mut definition).await?;
    // Step 24
    process_language(processor, value, &mut definition)?;
    // Step 25
    process_direction(value, &mut definition)?;
    // Step 26
    process_nest(processor.options(), value, &mut definition)?;
    // Step 27
    process_prefix(processor.options(), term, value, &mut definition)?;
    // Step 28
    for key in value.keys() {
        match key.as_str() {
            "@container" | "@context" | "@direction" | "@id" | "@index" | "@language" | "@nest"
            | "@prefix" | "@protected" | "@reverse" | "@type" => {}
            v => {
                return Err(ErrorCode::InvalidTermDefinition
                    .and_source(anyhow!("Unexpected entry: key={:?}", v)))
            }
        }
    }
    // Step 29
    let definition = build_term_definition(params, definition, previous_definition)?;
    // Step 30
    active_context.insert_term_definition(term, definition);
    defined.insert(term.to_owned(), true);

    Ok(())
}

/// Outcome of the IRI mapping steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IriMapping {
    /// The IRI mapping was established.
    Established,
    /// The whole definition is skipped after a warning.
    WarnedAndSkipped,
}

/// Establishes the IRI mapping of the definition.
// Step 16-20.
#[allow(clippy::too_many_arguments)]
async fn process_iri<L: LoadRemoteDocument>(
    processor: &Processor<L>,
    active_context: &mut Context,
    local_context: &JsonMap<String, Value>,
    term: &str,
    defined: &mut HashMap<String, bool>,
    params: &OptionalParams,
    value: &JsonMap<String, Value>,
    definition: &mut DefinitionBuilder,
    simple_term: bool,
) -> Result<IriMapping> {
    // Step 16
    let id = value.get("@id").filter(|id| id.as_str() != Some(term));
    if let Some(id) = id {
        match id {
            // Step 16.1
            // A term mapped to `null` is kept in the context: it decouples
            // the term from any `@vocab` mapping.
            Value::Null => {
                definition.set_iri(Nullable::Null);
                return Ok(IriMapping::Established);
            }
            Value::String(id) => {
                // Step 16.3
                if !is_keyword(id) && has_form_of_keyword(id) {
                    processor.warn(Warning::KeywordLikeValue(id.clone()));
                    return Ok(IriMapping::WarnedAndSkipped);
                }
                // Step 16.4
                let id = ExpandIriOptions::mutable(active_context, local_context, defined, params)
                    .vocab(true)
                    .expand_str(processor, id)
                    .await?
                    .ok_or_else(|| {
                        ErrorCode::InvalidIriMapping
                            .and_source(anyhow!("@id ({:?}) is expanded to `null`", id))
                    })?;
                if !is_keyword(&id) && !is_absolute_or_blank_node_ident(&id) {
                    return Err(ErrorCode::InvalidIriMapping.and_source(anyhow!(
                        "@id ({:?}) should be a keyword, an IRI, or a blank node identifier",
                        id
                    )));
                }
                if id == "@context" {
                    return Err(ErrorCode::InvalidKeywordAlias
                        .and_source(anyhow!("Invalid alias to `@context`")));
                }
                definition.set_iri(id);
                // Step 16.5
                // A term which is itself usable as a compact IRI or a
                // relative IRI must expand to the same IRI through both
                // routes.
                let interior_colon = term
                    .get(1..term.len().saturating_sub(1))
                    .map_or(false, |inner| inner.contains(':'));
                if interior_colon || term.contains('/') {
                    defined.insert(term.to_owned(), true);
                    let expanded_term =
                        ExpandIriOptions::mutable(active_context, local_context, defined, params)
                            .vocab(true)
                            .expand_str(processor, term)
                            .await?;
                    let mapping: Option<&str> = definition.iri().into();
                    if expanded_term.as_deref() != mapping {
                        return Err(ErrorCode::InvalidIriMapping.and_source(anyhow!(
                            "term {:?} expands to {:?}, but its `@id` is {:?}",
                            term,
                            expanded_term,
                            mapping
                        )));
                    }
                }
                // Step 16.6
                if !term.contains(':') && !term.contains('/') && simple_term {
                    let ends_with_gen_delim = definition
                        .iri()
                        .value()
                        .and_then(|iri| iri.as_bytes().last().copied())
                        .map_or(false, is_gen_delims_byte);
                    let is_blank = definition
                        .iri()
                        .value()
                        .map_or(false, |iri| is_blank_node_identifier(iri));
                    if ends_with_gen_delim || is_blank {
                        definition.set_prefix(true);
                    }
                }
                return Ok(IriMapping::Established);
            }
            // Step 16.2
            v => {
                return Err(ErrorCode::InvalidIriMapping
                    .and_source(anyhow!("Expected string as @id but got {:?}", v)))
            }
        }
    }
    // Step 17
    if has_compact_iri_form(term) {
        let (prefix, suffix) = to_prefix_and_suffix(term)
            .expect("Should never fail: compact IRI form implies a colon");
        // Step 17.1
        if local_context.contains_key(prefix) {
            create_term_definition(processor, active_context, local_context, prefix, defined, params)
                .await?;
        }
        // Step 17.2
        if let Some(prefix_iri) = active_context
            .term_definition(prefix)
            .and_then(|def| Option::<&str>::from(def.iri()))
        {
            definition.set_iri(format!("{}{}", prefix_iri, suffix));
        } else {
            // Step 17.3: the term is itself an IRI or blank node identifier.
            definition.set_iri(term.to_owned());
        }
        return Ok(IriMapping::Established);
    }
    // Step 18
    if term.contains('/') {
        // The term is a relative IRI reference against the vocabulary.
        let resolved = ExpandIriOptions::constant(active_context)
            .vocab(true)
            .expand_str(processor, term)
            .await?
            .filter(|resolved| is_absolute_iri(resolved))
            .ok_or_else(|| {
                ErrorCode::InvalidIriMapping.and_source(anyhow!(
                    "Expected an IRI as resolved term, term={:?}",
                    term
                ))
            })?;
        definition.set_iri(resolved);
        return Ok(IriMapping::Established);
    }
    // Step 19
    if term == "@type" {
        definition.set_iri("@type".to_owned());
        return Ok(IriMapping::Established);
    }
    // Step 20
    match active_context.vocab() {
        Some(vocab) => definition.set_iri(format!("{}{}", vocab, term)),
        None => {
            return Err(ErrorCode::InvalidIriMapping.and_source(anyhow!(
                "term={:?}, active context has no vocab mapping",
                term
            )))
        }
    }

    Ok(IriMapping::Established)
}

/// Processes the container mapping.
// Step 21.
fn process_container(
    options: &ProcessorOptions,
    value: &JsonMap<String, Value>,
    definition: &mut DefinitionBuilder,
) -> Result<()> {
    let container = match value.get("@container") {
        Some(v) => v,
        None => return Ok(()),
    };
    // Step 21.1
    let container = validate_container_non_reverse(container)?;
    // Step 21.2
    if options.is_processing_mode_1_0() {
        let item = match container {
            Container::Single(v) => v,
            Container::Array(ref arr) => {
                return Err(ErrorCode::InvalidContainerMapping.and_source(anyhow!(
                    "Unexpected `@container` value {:?} with processing mode `json-ld-1.0`",
                    arr
                )))
            }
        };
        match item {
            ContainerItem::Graph | ContainerItem::Id | ContainerItem::Type => {
                return Err(ErrorCode::InvalidContainerMapping.and_source(anyhow!(
                    "Unexpected @container value {:?} with processing mode `json-ld-1.0`",
                    item
                )))
            }
            _ => {}
        }
    }
    // Step 21.3
    definition.set_container(Nullable::Value(container.clone()));
    // Step 21.4
    if definition.container_contains(ContainerItem::Type) {
        match definition.ty() {
            // Step 21.4.1
            None => definition.set_ty("@id"),
            // Step 21.4.2
            Some("@id") | Some("@vocab") => {}
            Some(ty) => {
                return Err(ErrorCode::InvalidTypeMapping.and_source(anyhow!(
                    "container = {:?}, type = {:?}",
                    container,
                    ty
                )));
            }
        }
    }

    Ok(())
}

/// Processes the index mapping.
// Step 22.
async fn process_index<L: LoadRemoteDocument>(
    processor: &Processor<L>,
    active_context: &Context,
    value: &JsonMap<String, Value>,
    definition: &mut DefinitionBuilder,
) -> Result<()> {
    let index = match value.get("@index") {
        Some(v) => v,
        None => return Ok(()),
    };
    // Step 22.1
    if processor.options().is_processing_mode_1_0()
        || !definition.container_contains(ContainerItem::Index)
    {
        return Err(ErrorCode::InvalidTermDefinition.and_source(anyhow!(
            "`value` has `@index` entry but container = {:?}",
            definition.container()
        )));
    }
    // Step 22.2
    let index = match index {
        Value::String(s) => s,
        v => {
            return Err(ErrorCode::InvalidTermDefinition
                .and_source(anyhow!("Invalid `@index` value {:?}", v)))
        }
    };
    let expanded = ExpandIriOptions::constant(active_context)
        .vocab(true)
        .expand_str(processor, index)
        .await?;
    if !expanded.map_or(false, |expanded| is_absolute_iri(&expanded)) {
        return Err(ErrorCode::InvalidTermDefinition.and_source(anyhow!(
            "`@index` ({:?}) does not expand to an IRI",
            index
        )));
    }
    // Step 22.3
    definition.set_index(index.as_str());

    Ok(())
}

/// Processes the scoped context.
// Step 23.
async fn process_local_context<L: LoadRemoteDocument>(
    processor: &Processor<L>,
    active_context: &Context,
    params: &OptionalParams,
    value: &JsonMap<String, Value>,
    definition: &mut DefinitionBuilder,
) -> Result<()> {
    let context = match value.get("@context") {
        Some(v) => v,
        None => return Ok(()),
    };
    // Step 23.1
    if processor.options().is_processing_mode_1_0() {
        return Err(ErrorCode::InvalidTermDefinition.and_source(anyhow!(
            "`value` has `@context` entry but processing mode is json-ld-1.0"
        )));
    }
    // Step 23.2, 23.3
    // The scoped context is verified to process cleanly, but the processed
    // result is discarded: the raw context is stored on the definition and
    // processed again when the term comes into play.
    merge::join_value(
        processor,
        active_context,
        context,
        params.base_url.clone(),
        merge::OptionalParams::new()
            .override_protected(true)
            .validate_scoped_context(false)
            .remote_contexts(params.remote_contexts.clone()),
    )
    .await
    .map_err(|e| ErrorCode::InvalidScopedContext.and_source(e))?;
    // Step 23.4
    definition.set_local_context(context.clone());
    if let Some(base_url) = &params.base_url {
        definition.set_base_url(base_url.clone());
    }

    Ok(())
}

/// Processes the language mapping.
// Step 24.
fn process_language<L: LoadRemoteDocument>(
    processor: &Processor<L>,
    value: &JsonMap<String, Value>,
    definition: &mut DefinitionBuilder,
) -> Result<()> {
    if let Some(language) = value.get("@language") {
        if !value.contains_key("@type") {
            // Step 24.1
            let language = match language {
                Value::Null => Nullable::Null,
                Value::String(s) => {
                    if LangTag::new(s).is_err() {
                        processor.warn(Warning::MalformedLanguageTag(s.clone()));
                    }
                    Nullable::Value(s.as_str())
                }
                v => {
                    return Err(ErrorCode::InvalidLanguageMapping.and_source(anyhow!(
                        "Expected string or null as `@language` value, but got {:?}",
                        v
                    )))
                }
            };
            // Step 24.2
            // NOTE: The spec says "Processors MAY normalize language tags to
            // lower case"; this one keeps them as authored.
            definition.set_language(language.map(ToOwned::to_owned));
        }
    }

    Ok(())
}

/// Processes the direction mapping.
// Step 25.
fn process_direction(
    value: &JsonMap<String, Value>,
    definition: &mut DefinitionBuilder,
) -> Result<()> {
    if let Some(direction) = value.get("@direction") {
        if !value.contains_key("@type") {
            // Step 25.1
            let direction = Nullable::<Direction>::try_from(direction)
                .map_err(|e| ErrorCode::InvalidBaseDirection.and_source(e))?;
            // Step 25.2
            definition.set_direction(direction);
        }
    }

    Ok(())
}

/// Processes the nest value.
// Step 26.
fn process_nest(
    options: &ProcessorOptions,
    value: &JsonMap<String, Value>,
    definition: &mut DefinitionBuilder,
) -> Result<()> {
    if let Some(nest) = value.get("@nest") {
        // Step 26.1
        if options.is_processing_mode_1_0() {
            return Err(ErrorCode::InvalidTermDefinition.and_source(anyhow!(
                "Found `@nest` but processing mode is `json-ld-1.0`"
            )));
        }
        // Step 26.2
        let nest = match nest {
            Value::String(s) => s.as_str(),
            v => {
                return Err(ErrorCode::InvalidNestValue
                    .and_source(anyhow!("Expected string but got {:?}", v)))
            }
        };
        if nest != "@nest" && is_keyword(nest) {
            return Err(ErrorCode::InvalidNestValue
                .and_source(anyhow!("Got a keyword {:?} other than `\"@nest\"`", nest)));
        }
        definition.set_nest(nest);
    }

    Ok(())
}

/// Processes the prefix flag.
// Step 27.
fn process_prefix(
    options: &ProcessorOptions,
    term: &str,
    value: &JsonMap<String, Value>,
    definition: &mut DefinitionBuilder,
) -> Result<()> {
    if let Some(prefix) = value.get("@prefix") {
        // Step 27.1
        if options.is_processing_mode_1_0() {
            return Err(ErrorCode::InvalidTermDefinition.and_source(anyhow!(
                "Found `@prefix` but processing mode is `json-ld-1.0`"
            )));
        }
        if term.contains(':') || term.contains('/') {
            return Err(ErrorCode::InvalidTermDefinition.and_source(anyhow!(
                "Found `@prefix` but the term {:?} contains colon or slash",
                term
            )));
        }
        // Step 27.2
        let prefix = match prefix {
            Value::Bool(v) => *v,
            v => {
                return Err(ErrorCode::InvalidPrefixValue
                    .and_source(anyhow!("Expected boolean but got {:?}", v)))
            }
        };
        definition.set_prefix(prefix);
        // Step 27.3
        if prefix && definition.iri().value().map_or(false, |iri| is_keyword(iri)) {
            return Err(ErrorCode::InvalidTermDefinition.and_source(anyhow!(
                "`prefix` flag is set to `true` for a definition \
                 whose IRI mapping is a keyword {:?}",
                definition.iri()
            )));
        }
    }

    Ok(())
}

/// Builds the final definition, enforcing protection of the previous one.
// Step 29.
fn build_term_definition(
    params: &OptionalParams,
    definition: DefinitionBuilder,
    previous_definition: Option<Definition>,
) -> Result<Definition> {
    let definition = definition.build();
    if let Some(previous) = previous_definition {
        if !params.override_protected && previous.is_protected() {
            // Step 29.1
            if !definition.is_same_other_than_protected(&previous) {
                return Err(ErrorCode::ProtectedTermRedefinition.into());
            }
            // Step 29.2: keep the previous definition, protected flag included.
            return Ok(previous);
        }
    }

    Ok(definition)
}

/// Validates `@container` value.
///
/// Returns `Ok(container)` if the value is valid, `Err(_)` otherwise.
fn validate_container_non_reverse(container: &Value) -> Result<Container> {
    let container = Container::try_from(container)
        .map_err(|e| ErrorCode::InvalidContainerMapping.and_source(e))?;
    let arr = match container {
        Container::Single(_) => {
            // > either `@graph`, `@id`, `@index`, `@language`, `@list`,
            // > `@set`, `@type`
            return Ok(container);
        }
        Container::Array(ref arr) => arr,
    };

    if arr.len() == 1 {
        // > an array containing exactly any one of those keywords
        return Ok(container);
    }

    {
        let mut has_graph = false;
        let mut has_id = false;
        let mut has_index = false;
        let mut valid = true;
        for item in arr {
            match item {
                ContainerItem::Graph => has_graph = true,
                ContainerItem::Id => has_id = true,
                ContainerItem::Index => has_index = true,
                ContainerItem::Set => {}
                _ => valid = false,
            }
        }
        if valid && has_graph && (has_id ^ has_index) {
            // > an array containing `@graph` and either `@id` or `@index`,
            // > optionally including `@set`
            return Ok(container);
        }
    }

    {
        let mut has_set = false;
        let mut valid = true;
        for item in arr {
            match item {
                ContainerItem::Set => has_set = true,
                ContainerItem::Index
                | ContainerItem::Id
                | ContainerItem::Type
                | ContainerItem::Language
                | ContainerItem::Graph => {}
                ContainerItem::List => valid = false,
            }
        }
        if valid && has_set {
            // > an array containing a combination of `@set` and any of
            // > `@index`, `@id`, `@graph`, `@type`, `@language` in any order
            return Ok(container);
        }
    }

    Err(ErrorCode::InvalidContainerMapping.and_source(anyhow!("Unexpected container {:?}", arr)))
}
