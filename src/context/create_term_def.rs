//! "Create term definition" algorithm.
//!
//! See <https://www.w3.org/TR/json-ld11-api/#create-term-definition>.

use std::{
    borrow::Cow,
    collections::HashMap,
    future::Future,
    pin::Pin,
};

use anyhow::anyhow;
use iri_string::types::IriString;
use serde_json::{Map as JsonMap, Value};

use crate::{
    context::{definition::DefinitionBuilder, Context},
    error::{ErrorCode, Result},
    expand::iri::ExpandIriOptions,
    iri::is_absolute_iri,
    json::single_entry_map,
    processor::{Processor, Warning},
    remote::LoadRemoteDocument,
    syntax::{has_form_of_keyword, is_keyword},
};

use self::{non_reverse::run_for_non_reverse, reverse::run_for_reverse};

mod non_reverse;
mod reverse;

/// Optional parameters (arguments) for create term definition algorithm.
///
/// The `protected` default is not carried here: it is read from the
/// `@protected` entry of the local context itself, so that definitions
/// created on demand during IRI expansion see the same default.
#[derive(Default, Debug, Clone)]
pub(crate) struct OptionalParams {
    /// Override protected.
    pub(crate) override_protected: bool,
    /// Remote contexts dereferenced so far.
    pub(crate) remote_contexts: Vec<String>,
    /// Validate scoped context.
    pub(crate) validate_scoped_context: bool,
    /// Base URL of the context being processed.
    pub(crate) base_url: Option<IriString>,
}

impl OptionalParams {
    /// Creates a new `OptionalParams`.
    pub(crate) fn new() -> Self {
        Self {
            validate_scoped_context: true,
            ..Self::default()
        }
    }
}

/// Runs create term definition algorithm.
///
/// See <https://www.w3.org/TR/json-ld11-api/#create-term-definition>.
///
/// This returns a boxed future: the algorithm is mutually recursive with IRI
/// expansion and context processing, and the indirection has to break the
/// cycle somewhere.
pub(crate) fn create_term_definition<'a, L: LoadRemoteDocument>(
    processor: &'a Processor<L>,
    active_context: &'a mut Context,
    local_context: &'a JsonMap<String, Value>,
    term: &'a str,
    defined: &'a mut HashMap<String, bool>,
    params: &'a OptionalParams,
) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
    Box::pin(create_term_definition_impl(
        processor,
        active_context,
        local_context,
        term,
        defined,
        params,
    ))
}

/// Internal implementation of `create_term_definition()`.
async fn create_term_definition_impl<L: LoadRemoteDocument>(
    processor: &Processor<L>,
    active_context: &mut Context,
    local_context: &JsonMap<String, Value>,
    term: &str,
    defined: &mut HashMap<String, bool>,
    params: &OptionalParams,
) -> Result<()> {
    use std::collections::hash_map::Entry;

    // Step 1, 2
    match defined.entry(term.into()) {
        Entry::Occupied(entry) => {
            // Step 1
            if *entry.get() {
                // Term definition for `term` has already been created.
                return Ok(());
            } else {
                return Err(ErrorCode::CyclicIriMapping.and_source(anyhow!("term = {:?}", term)));
            }
        }
        Entry::Vacant(entry) => {
            // Step 2
            entry.insert(false);
        }
    }
    if term.is_empty() {
        return Err(
            ErrorCode::InvalidTermDefinition.and_source(anyhow!("term is an empty string"))
        );
    }
    // Step 3
    let value = local_context.get(term).unwrap_or_else(|| {
        panic!(
            "Should never fail: the given `term` should have been chosen from \
             `local_context` keys: term={:?}",
            term
        )
    });
    // Step 4
    // `@type` can be redefined in JSON-LD 1.1, but only to switch on the
    // `@set` container and protection.
    if term == "@type" {
        if processor.options().is_processing_mode_1_0() {
            return Err(ErrorCode::KeywordRedefinition.and_source(anyhow!(
                "`term` = \"@type\" and processing mode is `json-ld-1.0`"
            )));
        }
        let map = match value {
            Value::Object(map) => map,
            v => {
                return Err(ErrorCode::KeywordRedefinition
                    .and_source(anyhow!("Unexpected `@type` redefinition: {:?}", v)))
            }
        };
        if map.get("@container").and_then(Value::as_str) != Some("@set") {
            return Err(ErrorCode::KeywordRedefinition.and_source(anyhow!(
                "Expected the value `@set` for `@container` entry, but got {:?}",
                map.get("@container")
            )));
        }
        if let Some((k, v)) = map
            .iter()
            .find(|(k, _)| *k != "@container" && *k != "@protected")
        {
            return Err(ErrorCode::KeywordRedefinition.and_source(anyhow!(
                "Unexpected entry: key={:?}, value={:?}",
                k,
                v
            )));
        }
    } else if is_keyword(term) {
        // Step 5: keywords cannot be overridden.
        return Err(ErrorCode::KeywordRedefinition.and_source(anyhow!("term = {:?}", term)));
    } else if has_form_of_keyword(term) {
        processor.warn(Warning::KeywordLikeTerm(term.to_owned()));
        defined.insert(term.to_owned(), true);
        return Ok(());
    }
    // Step 6
    let previous_definition = active_context.remove_term_definition(term);
    // Step 7-9
    let (value, simple_term) = match value {
        // Step 7
        Value::Null => (Cow::Owned(single_entry_map("@id", Value::Null)), false),
        // Step 8
        Value::String(s) => (Cow::Owned(single_entry_map("@id", s.clone())), true),
        // Step 9
        Value::Object(v) => (Cow::Borrowed(v), false),
        v => return Err(ErrorCode::InvalidTermDefinition.and_source(anyhow!("value = {:?}", v))),
    };
    // Step 10
    let mut definition = DefinitionBuilder::new();
    // Step 11, 12
    match value.get("@protected") {
        Some(Value::Bool(protected)) => {
            if processor.options().is_processing_mode_1_0() {
                return Err(ErrorCode::InvalidTermDefinition.and_source(anyhow!(
                    "`@protected` is used but processing mode is `json-ld-1.0`"
                )));
            }
            definition.set_protected(*protected);
        }
        Some(v) => {
            return Err(ErrorCode::InvalidProtectedValue
                .and_source(anyhow!("Expected boolean as `@protected`, but got {:?}", v)))
        }
        None => {
            // Step 12: the context-wide `@protected` is the default.
            if local_context
                .get("@protected")
                .and_then(Value::as_bool)
                .unwrap_or(false)
            {
                definition.set_protected(true);
            }
        }
    }
    // Step 13
    match value.get("@type") {
        Some(Value::String(ty)) => {
            // Step 13.2
            let ty = ExpandIriOptions::mutable(active_context, local_context, defined, params)
                .vocab(true)
                .expand_str(processor, ty)
                .await?
                .ok_or_else(|| {
                    ErrorCode::InvalidTypeMapping
                        .and_source(anyhow!("@type ({:?}) is expanded to `null`", ty))
                })?;
            // Step 13.3
            if (ty == "@json" || ty == "@none") && processor.options().is_processing_mode_1_0() {
                return Err(ErrorCode::InvalidTypeMapping.and_source(anyhow!(
                    "@type = {:?} while processing mode is json-ld-1.0",
                    ty
                )));
            }
            // Step 13.4, 13.5
            if ty == "@id" || ty == "@vocab" || ty == "@json" || ty == "@none" || is_absolute_iri(&ty)
            {
                definition.set_ty(ty);
            } else {
                return Err(
                    ErrorCode::InvalidTypeMapping.and_source(anyhow!("expanded type = {:?}", ty))
                );
            }
        }
        None => {}
        // Step 13.1
        v => return Err(ErrorCode::InvalidTypeMapping.and_source(anyhow!("@type = {:?}", v))),
    }
    // Step 14 and after
    if let Some(reverse) = value.get("@reverse") {
        run_for_reverse(
            processor,
            active_context,
            local_context,
            term,
            defined,
            params,
            &value,
            reverse,
            definition,
        )
        .await
    } else {
        run_for_non_reverse(
            processor,
            active_context,
            local_context,
            term,
            defined,
            params,
            &value,
            definition,
            previous_definition,
            simple_term,
        )
        .await
    }
}
