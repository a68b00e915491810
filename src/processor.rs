//! JSON-LD processor.
//!
//! See <https://www.w3.org/TR/json-ld11-api/#the-jsonldprocessor-interface>.

use std::fmt;

use iri_string::types::{IriStr, IriString};
use serde_json::{Map as JsonMap, Value};

use crate::{
    compact,
    context::{merge, Context},
    error::Result,
    expand, flatten,
    remote::LoadRemoteDocument,
};

/// Processing mode.
///
/// See <https://www.w3.org/TR/json-ld11/#dfn-processing-mode>.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ProcessingMode {
    /// `json-ld-1.0`.
    JsonLd1_0,
    /// `json-ld-1.1`.
    #[default]
    JsonLd1_1,
}

/// How to represent base direction when serializing to RDF.
///
/// Only used by an RDF serialization layer; carried here because it is part
/// of the standard options set.
///
/// See <https://www.w3.org/TR/json-ld11-api/#dom-jsonldoptions-rdfdirection>.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RdfDirection {
    /// `i18n-datatype`.
    I18nDatatype,
    /// `compound-literal`.
    CompoundLiteral,
}

/// JSON-LD processor options.
///
/// See <https://www.w3.org/TR/json-ld11-api/#the-jsonldoptions-type>.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessorOptions {
    /// Base IRI of the document.
    base: Option<IriString>,
    /// Whether single-element arrays may be compacted to their lone value.
    compact_arrays: bool,
    /// Whether IRIs are compacted relative to the base IRI.
    compact_to_relative: bool,
    /// Context to apply before expansion starts.
    expand_context: Option<Value>,
    /// Frame expansion mode.
    frame_expansion: bool,
    /// Maximum number of remote contexts dereferenced in one run.
    max_remote_contexts: usize,
    /// Whether map entries are processed in lexicographical key order.
    ordered: bool,
    /// Processing mode.
    processing_mode: ProcessingMode,
    /// Whether an RDF serializer may emit generalized RDF.
    produce_generalized_rdf: bool,
    /// Base direction representation for RDF serialization.
    rdf_direction: Option<RdfDirection>,
    /// Whether an RDF deserializer uses native JSON types.
    use_native_types: bool,
    /// Whether an RDF deserializer maps `rdf:type` to `@type`.
    use_rdf_type: bool,
}

impl Default for ProcessorOptions {
    fn default() -> Self {
        Self {
            base: None,
            compact_arrays: true,
            compact_to_relative: true,
            expand_context: None,
            frame_expansion: false,
            max_remote_contexts: 50,
            ordered: false,
            processing_mode: ProcessingMode::default(),
            produce_generalized_rdf: false,
            rdf_direction: None,
            use_native_types: false,
            use_rdf_type: false,
        }
    }
}

impl ProcessorOptions {
    /// Creates a new default `ProcessorOptions`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base IRI.
    pub fn base(mut self, base: IriString) -> Self {
        self.base = Some(base);
        self
    }

    /// Sets whether single-element arrays are compacted to their lone value.
    pub fn compact_arrays(mut self, v: bool) -> Self {
        self.compact_arrays = v;
        self
    }

    /// Sets whether IRIs are compacted relative to the base IRI.
    pub fn compact_to_relative(mut self, v: bool) -> Self {
        self.compact_to_relative = v;
        self
    }

    /// Sets a context to apply before expansion starts.
    pub fn expand_context(mut self, context: Value) -> Self {
        self.expand_context = Some(context);
        self
    }

    /// Sets frame expansion mode.
    pub fn frame_expansion(mut self, v: bool) -> Self {
        self.frame_expansion = v;
        self
    }

    /// Sets the maximum number of remote contexts dereferenced in one run.
    pub fn max_remote_contexts(mut self, v: usize) -> Self {
        self.max_remote_contexts = v;
        self
    }

    /// Sets whether map entries are processed in lexicographical key order.
    pub fn ordered(mut self, v: bool) -> Self {
        self.ordered = v;
        self
    }

    /// Sets the processing mode.
    pub fn processing_mode(mut self, mode: ProcessingMode) -> Self {
        self.processing_mode = mode;
        self
    }

    /// Sets whether an RDF serializer may emit generalized RDF.
    pub fn produce_generalized_rdf(mut self, v: bool) -> Self {
        self.produce_generalized_rdf = v;
        self
    }

    /// Sets the base direction representation for RDF serialization.
    pub fn rdf_direction(mut self, v: RdfDirection) -> Self {
        self.rdf_direction = Some(v);
        self
    }

    /// Sets whether an RDF deserializer uses native JSON types.
    pub fn use_native_types(mut self, v: bool) -> Self {
        self.use_native_types = v;
        self
    }

    /// Sets whether an RDF deserializer maps `rdf:type` to `@type`.
    pub fn use_rdf_type(mut self, v: bool) -> Self {
        self.use_rdf_type = v;
        self
    }

    /// Returns the base IRI set by the processor.
    pub(crate) fn base_iri(&self) -> Option<&IriStr> {
        self.base.as_deref()
    }

    /// Checks if the processing mode is `json-ld-1.0`.
    pub(crate) fn is_processing_mode_1_0(&self) -> bool {
        self.processing_mode == ProcessingMode::JsonLd1_0
    }

    /// Returns whether single-element arrays may be compacted.
    pub(crate) fn is_compact_arrays(&self) -> bool {
        self.compact_arrays
    }

    /// Returns whether IRIs are compacted relative to the base IRI.
    pub(crate) fn is_compact_to_relative(&self) -> bool {
        self.compact_to_relative
    }

    /// Returns whether frame expansion is enabled.
    pub(crate) fn is_frame_expansion(&self) -> bool {
        self.frame_expansion
    }

    /// Returns whether map entries are processed in lexicographical order.
    pub(crate) fn is_ordered(&self) -> bool {
        self.ordered
    }

    /// Checks whether dereferencing one more remote context would exceed the
    /// configured bound.
    pub(crate) fn is_remote_context_limit_exceeded(&self, current: usize) -> bool {
        current >= self.max_remote_contexts
    }
}

/// Warning raised during processing.
///
/// Warnings never stop a transformation; they are delivered to the callback
/// installed through [`Processor::on_warning`], or logged through [`log`] by
/// default.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Warning {
    /// A term has the form of a keyword but is not a keyword.
    ///
    /// Such terms are reserved for future use and ignored.
    KeywordLikeTerm(String),
    /// A value has the form of a keyword but is not a keyword.
    KeywordLikeValue(String),
    /// A language tag is not well-formed according to section 2.2.9 of BCP47.
    MalformedLanguageTag(String),
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeywordLikeTerm(term) => write!(
                f,
                "terms beginning with \"@\" are reserved for future use and ignored: {:?}",
                term
            ),
            Self::KeywordLikeValue(value) => write!(
                f,
                "values beginning with \"@\" are reserved for future use and ignored: {:?}",
                value
            ),
            Self::MalformedLanguageTag(tag) => {
                write!(f, "language tag is not well-formed: {:?}", tag)
            }
        }
    }
}

/// JSON-LD processor.
///
/// Owns the options, the remote document loader and the warning callback,
/// and exposes the document transformations: [`expand`][Self::expand],
/// [`compact`][Self::compact] and [`flatten`][Self::flatten].
///
/// See <https://www.w3.org/TR/json-ld11-api/#the-jsonldprocessor-interface>.
pub struct Processor<L> {
    /// Processor options (except a loader).
    options: ProcessorOptions,
    /// Remote context loader.
    loader: L,
    /// Warning callback.
    warning_handler: Option<Box<dyn Fn(&Warning) + Send + Sync>>,
}

impl<L: LoadRemoteDocument> Processor<L> {
    /// Creates a new `Processor` with default options.
    pub fn new(loader: L) -> Self {
        Self::with_options(ProcessorOptions::default(), loader)
    }

    /// Creates a new `Processor` with the given options.
    pub fn with_options(options: ProcessorOptions, loader: L) -> Self {
        Self {
            options,
            loader,
            warning_handler: None,
        }
    }

    /// Installs a warning callback.
    pub fn on_warning(mut self, handler: impl Fn(&Warning) + Send + Sync + 'static) -> Self {
        self.warning_handler = Some(Box::new(handler));
        self
    }

    /// Returns processor options.
    pub fn options(&self) -> &ProcessorOptions {
        &self.options
    }

    /// Returns the loader.
    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Emits a warning.
    pub(crate) fn warn(&self, warning: Warning) {
        match &self.warning_handler {
            Some(handler) => handler(&warning),
            None => log::warn!("{}", warning),
        }
    }

    /// Expands the given document.
    ///
    /// The result is always an array of node objects in expanded form.
    ///
    /// See <https://www.w3.org/TR/json-ld11-api/#dom-jsonldprocessor-expand>.
    pub async fn expand(&self, input: &Value) -> Result<Value> {
        let mut active_context = match self.options.base_iri() {
            Some(base) => Context::with_base(base.to_owned()),
            None => Context::new(),
        };

        if let Some(expand_context) = &self.options.expand_context {
            let local_context = expand_context.get("@context").unwrap_or(expand_context);
            active_context = merge::join_value(
                self,
                &active_context,
                local_context,
                self.options.base.clone(),
                merge::OptionalParams::new(),
            )
            .await?;
        }

        let expanded = expand::expand_element(
            self,
            &active_context,
            None,
            input,
            self.options.base_iri(),
            false,
        )
        .await?;

        // A lone map with a sole `@graph` entry unwraps to the graph content.
        let expanded = match expanded {
            Value::Object(map) if map.len() == 1 && map.contains_key("@graph") => {
                map.into_iter().next().map(|(_, v)| v).unwrap_or(Value::Null)
            }
            v => v,
        };

        Ok(match expanded {
            Value::Null => Value::Array(Vec::new()),
            Value::Array(arr) => Value::Array(arr),
            v => Value::Array(vec![v]),
        })
    }

    /// Compacts the given document with the given context.
    ///
    /// The context may be either a context value or a document containing a
    /// top-level `@context` entry.
    ///
    /// See <https://www.w3.org/TR/json-ld11-api/#dom-jsonldprocessor-compact>.
    pub async fn compact(&self, input: &Value, context: &Value) -> Result<Value> {
        let expanded = self.expand(input).await?;
        self.compact_expanded(expanded, context).await
    }

    /// Flattens the given document, optionally compacting the result with the
    /// given context.
    ///
    /// See <https://www.w3.org/TR/json-ld11-api/#dom-jsonldprocessor-flatten>.
    pub async fn flatten(&self, input: &Value, context: Option<&Value>) -> Result<Value> {
        let expanded = self.expand(input).await?;
        let flattened = flatten::flatten_expanded(&expanded)?;

        match context {
            None => Ok(flattened),
            Some(context) => self.compact_expanded(flattened, context).await,
        }
    }

    /// Compacts an already expanded document with the given context.
    async fn compact_expanded(&self, expanded: Value, context: &Value) -> Result<Value> {
        let context_value = context.get("@context").unwrap_or(context);

        let initial_context = match self.options.base_iri() {
            Some(base) => Context::with_base(base.to_owned()),
            None => Context::new(),
        };
        let active_context = merge::join_value(
            self,
            &initial_context,
            context_value,
            self.options.base.clone(),
            merge::OptionalParams::new(),
        )
        .await?;

        let compacted = compact::compact_element(self, &active_context, None, &expanded).await?;

        // An array at the top level wraps into a map under (an alias of)
        // `@graph`, so that the context entry has somewhere to live.
        let mut result = match compacted {
            Value::Array(arr) if arr.is_empty() => JsonMap::new(),
            Value::Array(arr) => {
                let graph_key =
                    compact::compact_iri(&self.options, &active_context, "@graph", true, false)?;
                crate::json::single_entry_map(graph_key, Value::Array(arr))
            }
            Value::Object(map) => map,
            v => return Ok(v),
        };

        if !is_empty_context(context_value) {
            let mut with_context = JsonMap::new();
            with_context.insert("@context".to_owned(), context_value.clone());
            with_context.append(&mut result);
            result = with_context;
        }

        Ok(Value::Object(result))
    }
}

/// Checks whether a context value is empty, i.e. carries no information worth
/// echoing into compacted output.
fn is_empty_context(context: &Value) -> bool {
    match context {
        Value::Null => true,
        Value::Array(arr) => arr.iter().all(is_empty_context),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
