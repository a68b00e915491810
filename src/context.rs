//! JSON-LD context.
//!
//! See <https://www.w3.org/TR/json-ld11/#the-context>.

use indexmap::IndexMap;
use iri_string::types::{IriStr, IriString};
use once_cell::sync::OnceCell;
use serde_json::Value;

use crate::{
    error::Result,
    processor::Processor,
    remote::LoadRemoteDocument,
};

pub(crate) use self::{
    definition::{Container, ContainerItem, Definition, DefinitionBuilder, Direction},
    inverse::InverseContext,
};

pub(crate) mod create_term_def;
mod definition;
mod inverse;
pub(crate) mod merge;

/// Active context.
///
/// The accumulated interpretation state used while processing a document.
/// An active context is built by folding local contexts into an existing one
/// through [`Context::join_context_value`]; it is cloned, never shared, so a
/// consumer can keep using a context after deriving new ones from it.
///
/// See <https://www.w3.org/TR/json-ld11/#the-context>.
#[derive(Debug, Default)]
pub struct Context {
    /// Term definitions.
    term_definitions: IndexMap<String, Definition>,
    /// Base IRI.
    ///
    /// `None` either when no base is known or when it was nullified through
    /// `"@base": null`.
    base: Option<IriString>,
    /// Base URL of the document this context originates from.
    ///
    /// Unlike `base` this never changes once the context is created; a
    /// context nullification resets `base` back to this value.
    original_base_url: Option<IriString>,
    /// Default base direction (optional).
    default_base_direction: Option<Direction>,
    /// Default language (optional).
    default_language: Option<String>,
    /// Vocabulary mapping (optional).
    vocab: Option<String>,
    /// Previous context (optional).
    ///
    /// Saved when a non-propagating context replaces this one; used at most
    /// once when a nested node object pops back out of the scope.
    previous_context: Option<Box<Self>>,
    /// Inverse context, built on demand.
    ///
    /// Any mutation of the fields above marks this stale by clearing the
    /// cell; cloning a context never carries the cache over.
    inverse: OnceCell<InverseContext>,
}

impl Clone for Context {
    fn clone(&self) -> Self {
        Self {
            term_definitions: self.term_definitions.clone(),
            base: self.base.clone(),
            original_base_url: self.original_base_url.clone(),
            default_base_direction: self.default_base_direction,
            default_language: self.default_language.clone(),
            vocab: self.vocab.clone(),
            previous_context: self.previous_context.clone(),
            inverse: OnceCell::new(),
        }
    }
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        self.term_definitions == other.term_definitions
            && self.base == other.base
            && self.original_base_url == other.original_base_url
            && self.default_base_direction == other.default_base_direction
            && self.default_language == other.default_language
            && self.vocab == other.vocab
            && self.previous_context == other.previous_context
    }
}

impl Context {
    /// Creates a new empty `Context`.
    pub fn new() -> Self {
        Default::default()
    }

    /// Creates a new `Context` with the given base IRI.
    ///
    /// The IRI is recorded both as the base IRI and as the original base URL.
    pub fn with_base(base: IriString) -> Self {
        Self {
            base: Some(base.clone()),
            original_base_url: Some(base),
            ..Default::default()
        }
    }

    /// Returns the base IRI.
    pub(crate) fn base(&self) -> Option<&IriStr> {
        self.base.as_deref()
    }

    /// Sets the base IRI.
    pub(crate) fn set_base(&mut self, base: Option<IriString>) {
        self.inverse.take();
        self.base = base;
    }

    /// Returns the original base URL.
    pub(crate) fn original_base_url(&self) -> Option<&IriStr> {
        self.original_base_url.as_deref()
    }

    /// Returns the default base direction.
    pub(crate) fn default_base_direction(&self) -> Option<Direction> {
        self.default_base_direction
    }

    /// Sets the default base direction.
    pub(crate) fn set_default_base_direction(&mut self, dir: Option<Direction>) {
        self.inverse.take();
        self.default_base_direction = dir;
    }

    /// Returns the default language.
    pub(crate) fn default_language(&self) -> Option<&str> {
        self.default_language.as_deref()
    }

    /// Sets the default language.
    pub(crate) fn set_default_language(&mut self, lang: Option<String>) {
        self.inverse.take();
        self.default_language = lang;
    }

    /// Returns the vocabulary mapping.
    pub(crate) fn vocab(&self) -> Option<&str> {
        self.vocab.as_deref()
    }

    /// Sets the vocabulary mapping.
    pub(crate) fn set_vocab(&mut self, vocab: Option<String>) {
        self.inverse.take();
        self.vocab = vocab;
    }

    /// Returns the term definition for the given term.
    pub(crate) fn term_definition(&self, term: &str) -> Option<&Definition> {
        self.term_definitions.get(term)
    }

    /// Returns an iterator over the term definitions, in insertion order.
    pub(crate) fn term_definitions(&self) -> impl Iterator<Item = (&String, &Definition)> {
        self.term_definitions.iter()
    }

    /// Inserts the given term definition.
    pub(crate) fn insert_term_definition(&mut self, term: impl Into<String>, def: Definition) {
        self.inverse.take();
        self.term_definitions.insert(term.into(), def);
    }

    /// Removes the given term definition.
    ///
    /// This does nothing if the given term is not in the context.
    pub(crate) fn remove_term_definition(&mut self, term: &str) -> Option<Definition> {
        self.inverse.take();
        self.term_definitions.shift_remove(term)
    }

    /// Checks whether the context has the previous context.
    pub(crate) fn has_previous_context(&self) -> bool {
        self.previous_context.is_some()
    }

    /// Returns the previous context.
    pub(crate) fn previous_context(&self) -> Option<&Context> {
        self.previous_context.as_deref()
    }

    /// Sets the previous context.
    pub(crate) fn set_previous_context(&mut self, context: Self) {
        self.inverse.take();
        self.previous_context = Some(Box::new(context));
    }

    /// Checks whether the context has any protected term definition.
    pub(crate) fn has_protected_term_definition(&self) -> bool {
        self.term_definitions.values().any(Definition::is_protected)
    }

    /// Returns the inverse context, building it first if it is stale.
    ///
    /// See <https://www.w3.org/TR/json-ld11-api/#inverse-context-creation>.
    pub(crate) fn inverse(&self) -> &InverseContext {
        self.inverse.get_or_init(|| InverseContext::from(self))
    }

    /// Runs context processing algorithm and returns a new context.
    ///
    /// This receives a value associated to `@context` key.
    /// If you want to pass a JSON value which contains `@context` entry, use
    /// `Context::join_context_document` instead.
    ///
    /// See <https://www.w3.org/TR/json-ld11-api/#context-processing-algorithm>.
    pub async fn join_context_value<L: LoadRemoteDocument>(
        &self,
        processor: &Processor<L>,
        local_context: &Value,
        override_protected: bool,
    ) -> Result<Self> {
        merge::join_value(
            processor,
            self,
            local_context,
            self.original_base_url.clone(),
            merge::OptionalParams::new().override_protected(override_protected),
        )
        .await
    }

    /// Runs context processing algorithm and returns a new context.
    ///
    /// This receives a JSON value which contains `@context` entry.
    /// If you want to pass a value associated to `@context` key, use
    /// `Context::join_context_value` instead.
    ///
    /// See <https://www.w3.org/TR/json-ld11-api/#context-processing-algorithm>.
    pub async fn join_context_document<L: LoadRemoteDocument>(
        &self,
        processor: &Processor<L>,
        context_doc: &Value,
        override_protected: bool,
    ) -> Result<Self> {
        if let Some(local_context) = context_doc.get("@context") {
            self.join_context_value(processor, local_context, override_protected)
                .await
        } else {
            Ok(self.clone())
        }
    }
}
