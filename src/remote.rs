//! Remote-document related stuff.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error as ThisError;

pub use self::profile::Profile;

mod profile;

/// A trait for types which can be used as remote document loader.
///
/// NOTE: This trait uses `async_trait` crate to make trait method async fn.
/// You should specify `#[async_trait]` for trait impl block if you implement
/// this trait for your custom loader type.
/// `async_trait` is re-exported by this crate, so you can do
/// `use jsonld::async_trait::async_trait`.
#[async_trait]
pub trait LoadRemoteDocument: Send + Sync {
    /// Error type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Loads a remote document.
    async fn load(
        &self,
        iri: &str,
        options: LoadDocumentOptions,
    ) -> Result<RemoteDocument, Self::Error>;
}

/// Options for a single document load.
///
/// See <https://www.w3.org/TR/json-ld11-api/#loaddocumentoptions>.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct LoadDocumentOptions {
    /// Profile to accept in the response.
    profile: Option<Profile>,
    /// Profiles to request.
    request_profile: Vec<Profile>,
}

impl LoadDocumentOptions {
    /// Creates a new default `LoadDocumentOptions`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the profile.
    pub fn set_profile(&mut self, profile: Profile) {
        self.profile = Some(profile);
    }

    /// Returns the profile.
    pub fn profile(&self) -> Option<Profile> {
        self.profile
    }

    /// Adds a profile to request.
    pub fn set_request_profile(&mut self, profile: Profile) {
        self.request_profile.push(profile);
    }

    /// Returns the profiles to request.
    pub fn request_profile(&self) -> &[Profile] {
        &self.request_profile
    }
}

/// Remote document.
///
/// See <https://www.w3.org/TR/json-ld11-api/#remotedocument>.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteDocument {
    /// Context URL, from a `Link` header of the response (if any).
    context_url: Option<String>,
    /// Document IRI, after following redirects.
    document_url: String,
    /// Document.
    document: Value,
}

impl RemoteDocument {
    /// Creates a new `RemoteDocument`.
    pub fn new(document_url: impl Into<String>, document: Value) -> Self {
        Self {
            context_url: None,
            document_url: document_url.into(),
            document,
        }
    }

    /// Returns the final URL of the document.
    pub fn document_url(&self) -> &str {
        &self.document_url
    }

    /// Returns a reference to the document.
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Returns the document with ownership.
    pub fn into_document(self) -> Value {
        self.document
    }
}

/// A loader which serves documents from a static URL-to-document table.
///
/// Mainly useful for tests and for applications which bundle the contexts
/// they depend on.
#[derive(Default, Debug, Clone)]
pub struct StaticLoader {
    /// Documents by URL.
    documents: HashMap<String, Value>,
}

impl StaticLoader {
    /// Creates a new empty `StaticLoader`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a document under the given URL.
    pub fn with_document(mut self, url: impl Into<String>, document: Value) -> Self {
        self.documents.insert(url.into(), document);
        self
    }
}

/// Error for [`StaticLoader`].
#[derive(Debug, Clone, ThisError)]
#[error("no document registered for {url:?}")]
pub struct DocumentNotRegistered {
    /// Requested URL.
    url: String,
}

#[async_trait]
impl LoadRemoteDocument for StaticLoader {
    type Error = DocumentNotRegistered;

    async fn load(
        &self,
        iri: &str,
        _options: LoadDocumentOptions,
    ) -> Result<RemoteDocument, Self::Error> {
        self.documents
            .get(iri)
            .map(|document| RemoteDocument::new(iri, document.clone()))
            .ok_or_else(|| DocumentNotRegistered {
                url: iri.to_owned(),
            })
    }
}

/// A loader which refuses to load any document.
///
/// Use this when the documents to process are known to be self-contained.
#[derive(Default, Debug, Clone, Copy)]
pub struct NoLoader;

/// Error for [`NoLoader`].
#[derive(Debug, Clone, ThisError)]
#[error("remote document loading is disabled: {url:?}")]
pub struct LoadingDisabled {
    /// Requested URL.
    url: String,
}

#[async_trait]
impl LoadRemoteDocument for NoLoader {
    type Error = LoadingDisabled;

    async fn load(
        &self,
        iri: &str,
        _options: LoadDocumentOptions,
    ) -> Result<RemoteDocument, Self::Error> {
        Err(LoadingDisabled {
            url: iri.to_owned(),
        })
    }
}
