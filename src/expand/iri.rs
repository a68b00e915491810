//! IRI expansion.
//!
//! See <https://www.w3.org/TR/json-ld11-api/#iri-expansion>.

use std::collections::HashMap;

use serde_json::{Map as JsonMap, Value};

use crate::{
    context::{
        create_term_def::{create_term_definition, OptionalParams},
        Context,
    },
    error::Result,
    iri::{is_absolute_iri, resolve},
    json::Nullable,
    processor::{Processor, Warning},
    remote::LoadRemoteDocument,
    syntax::{has_form_of_keyword, is_keyword},
};

/// Context for IRI expansion.
#[derive(Debug)]
enum ExpandIriContext<'a> {
    /// Immutable context.
    Constant {
        /// Active context.
        active_context: &'a Context,
    },
    /// Mutable context, while a local context is being processed.
    Mutable {
        /// Active context.
        active_context: &'a mut Context,
        /// Local (currently loading) context.
        local_context: &'a JsonMap<String, Value>,
        /// Terms defined and being defined.
        defined: &'a mut HashMap<String, bool>,
        /// Parameters of the context processing run.
        params: &'a OptionalParams,
    },
}

impl<'a> ExpandIriContext<'a> {
    /// Returns the active context.
    fn active_context(&self) -> &Context {
        match self {
            Self::Constant { active_context } => active_context,
            Self::Mutable { active_context, .. } => active_context,
        }
    }
}

/// Options for IRI expansion algorithm.
#[derive(Debug)]
pub(crate) struct ExpandIriOptions<'a> {
    /// Context.
    context: ExpandIriContext<'a>,
    /// Vocab.
    vocab: bool,
    /// Document relative.
    document_relative: bool,
}

impl<'a> ExpandIriOptions<'a> {
    /// Creates a new `ExpandIriOptions` with the given immutable context.
    pub(crate) fn constant(active_context: &'a Context) -> Self {
        Self {
            context: ExpandIriContext::Constant { active_context },
            vocab: false,
            document_relative: false,
        }
    }

    /// Creates a new `ExpandIriOptions` with the given mutable context.
    pub(crate) fn mutable(
        active_context: &'a mut Context,
        local_context: &'a JsonMap<String, Value>,
        defined: &'a mut HashMap<String, bool>,
        params: &'a OptionalParams,
    ) -> Self {
        Self {
            context: ExpandIriContext::Mutable {
                active_context,
                local_context,
                defined,
                params,
            },
            vocab: false,
            document_relative: false,
        }
    }

    /// Sets "document relative" flag.
    pub(crate) fn document_relative(self, document_relative: bool) -> Self {
        Self {
            document_relative,
            ..self
        }
    }

    /// Sets "vocab" flag.
    pub(crate) fn vocab(self, vocab: bool) -> Self {
        Self { vocab, ..self }
    }

    /// Runs "create term definition" algorithm if necessary.
    async fn create_term_definition<L: LoadRemoteDocument>(
        &mut self,
        processor: &Processor<L>,
        value: &str,
    ) -> Result<()> {
        if let ExpandIriContext::Mutable {
            active_context,
            local_context,
            defined,
            params,
        } = &mut self.context
        {
            if local_context.contains_key(value) && defined.get(value) != Some(&true) {
                create_term_definition(processor, active_context, local_context, value, defined, params)
                    .await?;
            }
        }

        Ok(())
    }

    /// Runs IRI expansion algorithm for string value.
    ///
    /// This may return one of the below:
    ///
    /// * `Ok(Some(absolute_iri_reference))`
    /// * `Ok(Some(blank_node_identifier))`
    /// * `Ok(Some(keyword))`
    /// * `Ok(None)`
    ///     + This means the value is successfully expanded to `null`.
    /// * `Err(_)`
    ///
    /// See <https://www.w3.org/TR/json-ld11-api/#iri-expansion>.
    pub(crate) async fn expand_str<L: LoadRemoteDocument>(
        mut self,
        processor: &Processor<L>,
        value: &str,
    ) -> Result<Option<String>> {
        // Step 1
        if is_keyword(value) {
            return Ok(Some(value.to_owned()));
        }
        // Step 2
        if has_form_of_keyword(value) {
            processor.warn(Warning::KeywordLikeValue(value.to_owned()));
            return Ok(None);
        }
        // Step 3
        self.create_term_definition(processor, value).await?;
        // Step 4, 5
        if let Some(def) = self.context.active_context().term_definition(value) {
            if let Nullable::Value(iri) = def.iri() {
                if is_keyword(iri) {
                    // Step 4
                    return Ok(Some(iri.to_owned()));
                }
            }
            if self.vocab {
                // Step 5
                // NOTE: A term mapped to `null` indicates not only that the
                // term is not mapped to any IRI, but also that it must be
                // decoupled from `@vocab`. See W3C test t0032.
                return Ok(match def.iri() {
                    Nullable::Null => None,
                    Nullable::Value(iri) => Some(iri.to_owned()),
                });
            }
        }
        // Step 6
        if value.find(':').map_or(false, |pos| pos > 0) {
            let (prefix, suffix) = crate::iri::to_prefix_and_suffix(value)
                .expect("Should never fail: just found a colon");
            // Step 6.2
            // `value` is either an absolute IRI, a compact IRI, or a blank
            // node identifier.
            if prefix == "_" || suffix.starts_with("//") {
                return Ok(Some(value.to_owned()));
            }
            // Step 6.3
            self.create_term_definition(processor, prefix).await?;
            // Step 6.4
            // NOTE: Treat prefix as not defined if it is mapped to `null`.
            if let Some(prefix_def) = self
                .context
                .active_context()
                .term_definition(prefix)
                .filter(|def| def.is_prefix())
            {
                if let Nullable::Value(prefix_iri) = prefix_def.iri() {
                    return Ok(Some(format!("{}{}", prefix_iri, suffix)));
                }
            }
            // Step 6.5
            if is_absolute_iri(value) {
                // `value` is already an absolute IRI.
                return Ok(Some(value.to_owned()));
            }
        }
        // Step 7
        if self.vocab {
            if let Some(vocab) = self.context.active_context().vocab() {
                return Ok(Some(format!("{}{}", vocab, value)));
            }
        }
        // Step 8
        if self.document_relative {
            if let Some(base) = self.context.active_context().base() {
                if let Ok(resolved) = resolve(value, base) {
                    return Ok(Some(resolved.to_string()));
                }
                // A value which is not even an IRI reference is passed
                // through unchanged rather than rejected.
            }
        }

        // Step 9
        Ok(Some(value.to_owned()))
    }
}
