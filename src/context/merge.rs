//! Context processing algorithm.
//!
//! See <https://www.w3.org/TR/json-ld11-api/#context-processing-algorithm>.

use std::{
    collections::HashMap,
    future::Future,
    pin::Pin,
    sync::Arc,
};

use anyhow::anyhow;
use iri_string::types::{IriStr, IriString};
use serde_json::Value;

use crate::{
    context::Context,
    error::{ErrorCode, Result},
    iri::resolve,
    json::to_ref_array,
    processor::Processor,
    remote::{LoadDocumentOptions, LoadRemoteDocument, Profile, RemoteDocument},
};

use self::ctx_def::process_context_definition;

mod ctx_def;

/// Optional parameters for context processing algorithm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OptionalParams {
    /// Remote contexts dereferenced so far.
    ///
    /// Kept as an array (duplicates included): a cycle of remote contexts
    /// keeps growing this list until it trips the overflow bound.
    remote_contexts: Vec<String>,
    /// "Override protected" flag.
    override_protected: bool,
    /// "Propagate" flag.
    propagate: bool,
    /// "Validate scoped context" flag.
    validate_scoped_context: bool,
}

impl OptionalParams {
    /// Creates a new default `OptionalParams`.
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Sets the "override protected" flag.
    pub(crate) fn override_protected(self, override_protected: bool) -> Self {
        Self {
            override_protected,
            ..self
        }
    }

    /// Sets the "propagate" flag.
    pub(crate) fn propagate(self, propagate: bool) -> Self {
        Self { propagate, ..self }
    }

    /// Sets the "validate scoped context" flag.
    pub(crate) fn validate_scoped_context(self, validate_scoped_context: bool) -> Self {
        Self {
            validate_scoped_context,
            ..self
        }
    }

    /// Sets the already dereferenced remote contexts.
    pub(crate) fn remote_contexts(self, remote_contexts: Vec<String>) -> Self {
        Self {
            remote_contexts,
            ..self
        }
    }
}

impl Default for OptionalParams {
    fn default() -> Self {
        Self {
            remote_contexts: Default::default(),
            override_protected: false,
            propagate: true,
            validate_scoped_context: true,
        }
    }
}

/// Runs context processing algorithm and returns a new context.
///
/// See <https://www.w3.org/TR/json-ld11-api/#context-processing-algorithm>.
///
/// This is a wrapper for modules outside this module.
pub(crate) async fn join_value<L: LoadRemoteDocument>(
    processor: &Processor<L>,
    active_context: &Context,
    local_context: &Value,
    base_url: Option<IriString>,
    optional: OptionalParams,
) -> Result<Context> {
    let OptionalParams {
        remote_contexts,
        override_protected,
        propagate,
        validate_scoped_context,
    } = optional;

    join_value_impl(
        processor,
        active_context,
        local_context,
        base_url.as_deref(),
        remote_contexts,
        override_protected,
        propagate,
        validate_scoped_context,
        &mut Default::default(),
    )
    .await
}

/// Runs context processing algorithm and returns a new context.
///
/// This is a wrapper for recursive call.
#[allow(clippy::too_many_arguments)]
fn join_value_impl_recursive<'a, L: LoadRemoteDocument>(
    processor: &'a Processor<L>,
    active_context: &'a Context,
    local_context: &'a Value,
    base_url: Option<&'a IriStr>,
    remote_contexts: Vec<String>,
    override_protected: bool,
    propagate: bool,
    validate_scoped_context: bool,
    remote_contexts_cache: &'a mut HashMap<String, Arc<RemoteDocument>>,
) -> Pin<Box<dyn Future<Output = Result<Context>> + Send + 'a>> {
    Box::pin(async move {
        join_value_impl(
            processor,
            active_context,
            local_context,
            base_url,
            remote_contexts,
            override_protected,
            propagate,
            validate_scoped_context,
            remote_contexts_cache,
        )
        .await
    })
}

/// Runs context processing algorithm and returns a new context.
///
/// See <https://www.w3.org/TR/json-ld11-api/#context-processing-algorithm>.
#[allow(clippy::too_many_arguments)]
async fn join_value_impl<L: LoadRemoteDocument>(
    processor: &Processor<L>,
    active_context: &Context,
    local_context: &Value,
    base_url: Option<&IriStr>,
    mut remote_contexts: Vec<String>,
    override_protected: bool,
    propagate: bool,
    validate_scoped_context: bool,
    remote_contexts_cache: &mut HashMap<String, Arc<RemoteDocument>>,
) -> Result<Context> {
    // Step 1
    let mut result = active_context.clone();
    // Step 2
    let propagate = local_context
        .get("@propagate")
        .and_then(Value::as_bool)
        .unwrap_or(propagate);
    // Step 3
    if !propagate && !result.has_previous_context() {
        result.set_previous_context(active_context.clone());
    }
    // Step 4, 5
    for context in to_ref_array(local_context) {
        match context {
            // Step 5.1
            Value::Null => {
                result = process_single_null(override_protected, propagate, result)?;
            }
            // Step 5.2
            Value::String(context) => {
                result = process_single_string(
                    processor,
                    base_url,
                    &mut remote_contexts,
                    override_protected,
                    propagate,
                    validate_scoped_context,
                    remote_contexts_cache,
                    result,
                    context,
                )
                .await?;
                // Step 5.2.7: Continue with the next context.
            }
            // Step 5.4-5.13
            Value::Object(context) => {
                result = process_context_definition(
                    processor,
                    &remote_contexts,
                    override_protected,
                    validate_scoped_context,
                    base_url,
                    result,
                    context,
                    remote_contexts_cache,
                )
                .await?;
            }
            // Step 5.3
            v => {
                return Err(
                    ErrorCode::InvalidLocalContext.and_source(anyhow!("local context = {:?}", v))
                )
            }
        }
    }

    // Step 6
    Ok(result)
}

/// Processes single context which is `null`.
fn process_single_null(
    override_protected: bool,
    propagate: bool,
    result: Context,
) -> Result<Context> {
    // Step 5.1.1
    if !override_protected && result.has_protected_term_definition() {
        return Err(ErrorCode::InvalidContextNullification.into());
    }
    // Step 5.1.2
    // The fresh context keeps the original base URL of the document, and the
    // replaced context when propagation is disabled.
    let mut fresh = match result.original_base_url() {
        Some(url) => Context::with_base(url.to_owned()),
        None => Context::new(),
    };
    if !propagate {
        fresh.set_previous_context(result);
    }

    Ok(fresh)
}

/// Processes single context which is a string (a remote context reference).
#[allow(clippy::too_many_arguments)]
async fn process_single_string<L: LoadRemoteDocument>(
    processor: &Processor<L>,
    base_url: Option<&IriStr>,
    remote_contexts: &mut Vec<String>,
    override_protected: bool,
    propagate: bool,
    validate_scoped_context: bool,
    remote_contexts_cache: &mut HashMap<String, Arc<RemoteDocument>>,
    result: Context,
    context: &str,
) -> Result<Context> {
    use std::collections::hash_map::Entry;

    // Step 5.2.1
    let context: String = match base_url {
        Some(base) => resolve(context, base)
            .map(|iri| iri.to_string())
            .map_err(|e| ErrorCode::LoadingDocumentFailed.and_source(e))?,
        None if crate::iri::is_absolute_iri(context) => context.to_owned(),
        None => {
            return Err(ErrorCode::LoadingDocumentFailed.and_source(anyhow!(
                "Cannot resolve relative context reference {:?} without a base URL",
                context
            )))
        }
    };
    // Step 5.2.2
    if !validate_scoped_context && remote_contexts.contains(&context) {
        return Ok(result);
    }
    // Step 5.2.3
    if processor
        .options()
        .is_remote_context_limit_exceeded(remote_contexts.len())
    {
        return Err(ErrorCode::ContextOverflow.and_source(anyhow!(
            "Current number of remote contexts = {:?}",
            remote_contexts.len()
        )));
    }
    remote_contexts.push(context.clone());
    // Step 5.2.4
    // > If context was previously dereferenced, then the processor MUST NOT
    // > do a further dereference, and context is set to the previously
    // > established internal representation.
    let remote_doc: Arc<RemoteDocument> = match remote_contexts_cache.entry(context.clone()) {
        Entry::Occupied(entry) => entry.into_mut().clone(),
        Entry::Vacant(entry) => {
            let mut load_opts = LoadDocumentOptions::new();
            load_opts.set_profile(Profile::Context);
            load_opts.set_request_profile(Profile::Context);
            let doc = processor
                .loader()
                .load(&context, load_opts)
                .await
                .map_err(|e| ErrorCode::LoadingRemoteContextFailed.and_source(e))?;
            entry.insert(Arc::new(doc)).clone()
        }
    };
    // Step 5.2.5
    let loaded_context = remote_doc.document().get("@context").ok_or_else(|| {
        ErrorCode::InvalidRemoteContext
            .and_source(anyhow!("No `@context` entry in {:?}", remote_doc.document_url()))
    })?;
    let document_url = IriStr::new(remote_doc.document_url())
        .map(ToOwned::to_owned)
        .ok();
    // Step 5.2.6
    let result = join_value_impl_recursive(
        processor,
        &result,
        loaded_context,
        document_url.as_deref(),
        remote_contexts.clone(),
        override_protected,
        propagate,
        validate_scoped_context,
        remote_contexts_cache,
    )
    .await?;

    Ok(result)
}
