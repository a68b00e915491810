//! Term definition.

use iri_string::types::{IriStr, IriString};
use serde_json::Value;

use crate::json::Nullable;

pub(crate) use self::{
    builder::DefinitionBuilder,
    container::{Container, ContainerItem},
    direction::Direction,
};

mod builder;
mod container;
mod direction;

/// Term definition.
///
/// See <https://www.w3.org/TR/json-ld11/#dfn-term-definition>.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Definition {
    /// IRI mapping (or reverse property).
    ///
    /// This can be a non-IRI-reference (such as keywords), so use `String`
    /// here. A `null` mapping decouples the term from `@vocab` without
    /// removing the definition.
    iri: Nullable<String>,
    /// Prefix flag.
    prefix: bool,
    /// Protected flag.
    protected: bool,
    /// Reverse property flag.
    reverse: bool,
    /// Base URL the term was defined against (optional).
    base_url: Option<IriString>,
    /// Unprocessed scoped context (optional).
    ///
    /// Kept raw by design: the context is processed each time the term comes
    /// into play as an active property or type, not at definition time.
    context: Option<Value>,
    /// Container mapping (optional).
    container: Option<Container>,
    /// Direction mapping (optional).
    direction: Option<Nullable<Direction>>,
    /// Index mapping (optional).
    index: Option<String>,
    /// Language mapping (optional).
    ///
    /// This property distinguishes explicit `null`.
    language: Option<Nullable<String>>,
    /// Nest value (optional).
    nest: Option<String>,
    /// Type mapping (optional).
    ty: Option<String>,
}

impl Definition {
    /// Returns the IRI mapping.
    pub(crate) fn iri(&self) -> Nullable<&str> {
        self.iri.as_ref().map(String::as_str)
    }

    /// Returns the prefix flag.
    pub(crate) fn is_prefix(&self) -> bool {
        self.prefix
    }

    /// Returns the protected flag.
    pub(crate) fn is_protected(&self) -> bool {
        self.protected
    }

    /// Returns the reverse property flag.
    pub(crate) fn is_reverse(&self) -> bool {
        self.reverse
    }

    /// Returns the base URL the term was defined against.
    pub(crate) fn base_url(&self) -> Option<&IriStr> {
        self.base_url.as_deref()
    }

    /// Returns the unprocessed scoped context.
    pub(crate) fn local_context(&self) -> Option<&Value> {
        self.context.as_ref()
    }

    /// Returns the container mapping.
    pub(crate) fn container(&self) -> Option<&Container> {
        self.container.as_ref()
    }

    /// Checks whether the container mapping contains the given item.
    pub(crate) fn container_contains(&self, v: ContainerItem) -> bool {
        self.container
            .as_ref()
            .map_or(false, |container| container.contains(v))
    }

    /// Returns the direction mapping.
    pub(crate) fn direction(&self) -> Option<Nullable<Direction>> {
        self.direction
    }

    /// Returns the index mapping.
    pub(crate) fn index(&self) -> Option<&str> {
        self.index.as_deref()
    }

    /// Returns the language mapping.
    pub(crate) fn language(&self) -> Option<Nullable<&str>> {
        self.language
            .as_ref()
            .map(|lang| lang.as_ref().map(String::as_str))
    }

    /// Returns the nest value.
    pub(crate) fn nest(&self) -> Option<&str> {
        self.nest.as_deref()
    }

    /// Returns the type mapping.
    pub(crate) fn ty(&self) -> Option<&str> {
        self.ty.as_deref()
    }

    /// Checks if the definition is the same as the given one in every field
    /// other than the protected flag.
    pub(crate) fn is_same_other_than_protected(&self, other: &Self) -> bool {
        self.iri == other.iri
            && self.prefix == other.prefix
            && self.reverse == other.reverse
            && self.base_url == other.base_url
            && self.context == other.context
            && self.container == other.container
            && self.direction == other.direction
            && self.index == other.index
            && self.language == other.language
            && self.nest == other.nest
            && self.ty == other.ty
    }
}
