//! Processing function for a context definition.

use std::{
    borrow::Cow,
    collections::HashMap,
    sync::Arc,
};

use anyhow::anyhow;
use iri_string::types::{IriStr, IriString};
use serde_json::{Map as JsonMap, Value};

use crate::{
    context::{
        create_term_def::{create_term_definition, OptionalParams},
        definition::Direction,
        Context,
    },
    error::{ErrorCode, Result, ResultExt},
    expand::iri::ExpandIriOptions,
    iri::{is_absolute_or_blank_node_ident, resolve},
    json::Nullable,
    processor::{Processor, ProcessorOptions, Warning},
    remote::{LoadDocumentOptions, LoadRemoteDocument, Profile, RemoteDocument},
};

/// Processes single context which is a map (a context definition).
#[allow(clippy::too_many_arguments)]
pub(super) async fn process_context_definition<L: LoadRemoteDocument>(
    processor: &Processor<L>,
    remote_contexts: &[String],
    override_protected: bool,
    validate_scoped_context: bool,
    base_url: Option<&IriStr>,
    mut result: Context,
    context: &JsonMap<String, Value>,
    remote_contexts_cache: &mut HashMap<String, Arc<RemoteDocument>>,
) -> Result<Context> {
    // Step 5.5
    process_ctxdef_version(processor.options(), context)?;
    // Step 5.6
    let context: Cow<'_, JsonMap<String, Value>> =
        process_ctxdef_import(processor, base_url, context, remote_contexts_cache).await?;
    // Step 5.7
    process_ctxdef_base(remote_contexts, &mut result, &context)?;
    // Step 5.8
    process_ctxdef_vocab(processor, &mut result, &context).await?;
    // Step 5.9
    process_ctxdef_language(processor, &mut result, &context)?;
    // Step 5.10
    process_ctxdef_direction(processor.options(), &mut result, &context)?;
    // Step 5.11
    // Note that this does only error handling.
    process_ctxdef_propagate(processor.options(), &context)?;
    // Step 5.13 (validation; the value itself is read by create term definition)
    if let Some(protected) = context.get("@protected") {
        if processor.options().is_processing_mode_1_0() {
            return Err(ErrorCode::InvalidContextEntry.and_source(anyhow!(
                "Found `@protected` but processing mode is `json-ld-1.0`"
            )));
        }
        if !protected.is_boolean() {
            return Err(ErrorCode::InvalidProtectedValue
                .and_source(anyhow!("Expected boolean as `@protected`, but got {:?}", protected)));
        }
    }
    // Step 5.12
    let mut defined = HashMap::new();
    // Step 5.13
    let params = OptionalParams {
        override_protected,
        remote_contexts: remote_contexts.to_vec(),
        validate_scoped_context,
        base_url: base_url.map(ToOwned::to_owned),
    };
    for key in context.keys().map(String::as_str) {
        match key {
            "@base" | "@direction" | "@import" | "@language" | "@propagate" | "@protected"
            | "@version" | "@vocab" => continue,
            _ => {}
        }
        create_term_definition(processor, &mut result, &context, key, &mut defined, &params)
            .await?;
    }

    Ok(result)
}

/// Processes `@version` entry of the context definition.
fn process_ctxdef_version(
    options: &ProcessorOptions,
    context: &JsonMap<String, Value>,
) -> Result<()> {
    // Step 5.5
    if let Some(version) = context.get("@version") {
        // Step 5.5.1
        let is_1_1 = version.as_f64().map_or(false, |v| (1.09..=1.11).contains(&v));
        if !is_1_1 {
            return Err(
                ErrorCode::InvalidVersionValue.and_source(anyhow!("`@version` = {:?}", version))
            );
        }
        // Step 5.5.2
        if options.is_processing_mode_1_0() {
            return Err(ErrorCode::ProcessingModeConflict.and_source(anyhow!(
                "Got `@version` = 1.1, but processing mode is `json-ld-1.0`"
            )));
        }
    }

    Ok(())
}

/// Processes `@import` entry of the context definition.
async fn process_ctxdef_import<'a, L: LoadRemoteDocument>(
    processor: &Processor<L>,
    base_url: Option<&IriStr>,
    context: &'a JsonMap<String, Value>,
    remote_contexts_cache: &mut HashMap<String, Arc<RemoteDocument>>,
) -> Result<Cow<'a, JsonMap<String, Value>>> {
    use std::collections::hash_map::Entry;

    // Step 5.6
    let import = match context.get("@import") {
        Some(v) => v,
        None => return Ok(Cow::Borrowed(context)),
    };

    // Step 5.6.1
    if processor.options().is_processing_mode_1_0() {
        return Err(ErrorCode::InvalidContextEntry.and_source(anyhow!(
            "Found `@import` but processing mode is `json-ld-1.0`"
        )));
    }
    // Step 5.6.2
    let import = import.as_str().ok_or_else(|| {
        ErrorCode::InvalidImportValue.and_source(anyhow!("Expected string but got {:?}", import))
    })?;
    // Step 5.6.3
    let import: String = match base_url {
        Some(base) => resolve(import, base)
            .map(|iri| iri.to_string())
            .map_err(|e| ErrorCode::InvalidImportValue.and_source(e))?,
        None if crate::iri::is_absolute_iri(import) => import.to_owned(),
        None => {
            return Err(ErrorCode::InvalidImportValue.and_source(anyhow!(
                "Cannot resolve `@import` reference {:?} without a base URL",
                import
            )))
        }
    };
    // Step 5.6.4, 5.6.5
    let remote_doc: Arc<RemoteDocument> = match remote_contexts_cache.entry(import.clone()) {
        Entry::Occupied(entry) => entry.into_mut().clone(),
        Entry::Vacant(entry) => {
            let mut load_opts = LoadDocumentOptions::new();
            load_opts.set_profile(Profile::Context);
            load_opts.set_request_profile(Profile::Context);
            let doc = processor
                .loader()
                .load(&import, load_opts)
                .await
                .map_err(|e| {
                    ErrorCode::LoadingRemoteContextFailed
                        .and_source(e)
                        .context("Failed to dereference `@import`")
                })?;
            entry.insert(Arc::new(doc)).clone()
        }
    };
    // Step 5.6.6
    let import_context = match remote_doc.document().get("@context") {
        Some(Value::Object(map)) => map,
        Some(v) => {
            return Err(ErrorCode::InvalidRemoteContext.and_source(anyhow!(
                "Expected a map as `@context` entry in remote doc \
                 specified by `@import`, but got {:?}",
                v
            )))
        }
        None => {
            return Err(ErrorCode::InvalidRemoteContext.and_source(anyhow!(
                "`@context` entry not found in remote doc specified by `@import`"
            )))
        }
    };
    // Step 5.6.7
    if import_context.contains_key("@import") {
        return Err(ErrorCode::InvalidContextEntry.and_source(anyhow!(
            "`@import` entry found in the remote doc specified by `@import`"
        )));
    };
    // Step 5.6.8
    // The imported entries merge beneath the importing context: an entry
    // already present locally wins.
    if import_context.is_empty() {
        return Ok(Cow::Borrowed(context));
    }
    let mut merged = context.clone();
    for (k, v) in import_context {
        if !merged.contains_key(k) {
            merged.insert(k.clone(), v.clone());
        }
    }

    Ok(Cow::Owned(merged))
}

/// Processes `@base` entry of the context definition.
fn process_ctxdef_base(
    remote_contexts: &[String],
    result: &mut Context,
    context: &JsonMap<String, Value>,
) -> Result<()> {
    // Step 5.7
    if let Some(value) = context.get("@base") {
        if remote_contexts.is_empty() {
            let base = process_ctxdef_base_impl(result, value)?;
            result.set_base(base.into());
        }
    }

    Ok(())
}

/// Internal implementation of `process_ctxdef_base()`.
fn process_ctxdef_base_impl(result: &Context, value: &Value) -> Result<Nullable<IriString>> {
    // Step 5.7.1: Initialize value to the value associated with the `@base` entry.
    match value {
        // Step 5.7.2
        Value::Null => Ok(Nullable::Null),
        // Step 5.7.3, 5.7.4
        Value::String(value) => {
            // Step 5.7.3
            if let Ok(value) = IriStr::new(value) {
                return Ok(Nullable::Value(value.to_owned()));
            }
            // Step 5.7.4
            if let Some(result_base) = result.base() {
                let resolved = resolve(value, result_base).map_err(|e| {
                    ErrorCode::InvalidBaseIri
                        .and_source(e)
                        .context(format!("`@base` = {:?}", value))
                })?;
                return Ok(Nullable::Value(resolved));
            }
            // Step 5.7.5
            Err(ErrorCode::InvalidBaseIri.and_source(anyhow!(
                "Got a relative IRI reference {:?} as `@base`, \
                 but base IRI of `result` is not available",
                value
            )))
        }
        // Step 5.7.5
        v => Err(ErrorCode::InvalidBaseIri.and_source(anyhow!(
            "Expected `null` or a string as `@base`, but got {:?}",
            v
        ))),
    }
}

/// Processes `@vocab` entry of the context definition.
async fn process_ctxdef_vocab<L: LoadRemoteDocument>(
    processor: &Processor<L>,
    result: &mut Context,
    context: &JsonMap<String, Value>,
) -> Result<()> {
    // Step 5.8
    if let Some(value) = context.get("@vocab") {
        // Step 5.8.1: Initialize value to the value associated with the `@vocab` entry.
        let value = match value {
            // Step 5.8.2
            Value::Null => {
                result.set_vocab(None);
                return Ok(());
            }
            // Step 5.8.3
            Value::String(s) => s,
            v => {
                return Err(ErrorCode::InvalidVocabMapping
                    .and_source(anyhow!("Expected string as `@vocab`, but got {:?}", v)))
            }
        };
        // Step 5.8.3
        // Note that the value can be any IRI reference, including the empty
        // string; it is the expanded form which must be an IRI or a blank
        // node identifier.
        let expanded = ExpandIriOptions::constant(result)
            .vocab(true)
            .document_relative(true)
            .expand_str(processor, value)
            .await
            .context(format!("`@vocab` = {:?}", value))?;
        match expanded {
            Some(expanded) if is_absolute_or_blank_node_ident(&expanded) => {
                result.set_vocab(Some(expanded));
            }
            v => {
                return Err(ErrorCode::InvalidVocabMapping.and_source(anyhow!(
                    "Expected blank node identifier or an IRI as expanded \
                     `@vocab`, but got {:?}",
                    v
                )))
            }
        }
    }

    Ok(())
}

/// Processes `@language` entry of the context definition.
fn process_ctxdef_language<L: LoadRemoteDocument>(
    processor: &Processor<L>,
    result: &mut Context,
    context: &JsonMap<String, Value>,
) -> Result<()> {
    // Step 5.9
    if let Some(value) = context.get("@language") {
        // Step 5.9.1: Initialize value to the value associated with the `@language` entry.
        match value {
            // Step 5.9.2
            Value::Null => result.set_default_language(None),
            // Step 5.9.3
            Value::String(value) => {
                if langtag::LangTag::new(value).is_err() {
                    processor.warn(Warning::MalformedLanguageTag(value.clone()));
                }
                // NOTE: The spec says "Processors MAY normalize language tags
                // to lower case"; this one keeps them as authored.
                result.set_default_language(Some(value.into()));
            }
            v => {
                return Err(ErrorCode::InvalidDefaultLanguage.and_source(anyhow!(
                    "Expected `null` or string as `@language`, but got {:?}",
                    v
                )))
            }
        }
    }

    Ok(())
}

/// Processes `@direction` entry of the context definition.
fn process_ctxdef_direction(
    options: &ProcessorOptions,
    result: &mut Context,
    context: &JsonMap<String, Value>,
) -> Result<()> {
    // Step 5.10
    if let Some(value) = context.get("@direction") {
        // Step 5.10.1
        if options.is_processing_mode_1_0() {
            return Err(ErrorCode::InvalidContextEntry.and_source(anyhow!(
                "Found `@direction` while processing mode is `json-ld-1.0`"
            )));
        }
        // Step 5.10.2: Initialize value to the value associated with the `@direction` entry.
        // Step 5.10.3, 5.10.4
        let value: Nullable<Direction> = value
            .try_into()
            .map_err(|e| ErrorCode::InvalidBaseDirection.and_source(e))?;
        result.set_default_base_direction(value.into());
    }

    Ok(())
}

/// Processes `@propagate` entry of the context definition.
fn process_ctxdef_propagate(
    options: &ProcessorOptions,
    context: &JsonMap<String, Value>,
) -> Result<()> {
    // Step 5.11
    if let Some(value) = context.get("@propagate") {
        // Step 5.11.1
        if options.is_processing_mode_1_0() {
            return Err(ErrorCode::InvalidContextEntry.and_source(anyhow!(
                "Found `@propagate` while processing mode is `json-ld-1.0`"
            )));
        }
        // Step 5.11.2
        if !value.is_boolean() {
            return Err(ErrorCode::InvalidPropagateValue.and_source(anyhow!(
                "Expected boolean as `@propagate` but got {:?}",
                value
            )));
        }
    }

    Ok(())
}
