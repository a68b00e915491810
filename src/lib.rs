//! JSON-LD 1.1 processing library.
//!
//! This crate implements the core document transformations of the JSON-LD
//! 1.1 API: [expansion][Processor::expand], [compaction][Processor::compact]
//! and [flattening][Processor::flatten], over plain [`serde_json::Value`]
//! documents.
//!
//! Remote contexts are dereferenced through the [`LoadRemoteDocument`]
//! trait; [`StaticLoader`] and [`NoLoader`] are provided for self-contained
//! documents.
//!
//! ```
//! use jsonld::{NoLoader, Processor};
//! use serde_json::json;
//!
//! # async fn example() -> jsonld::Result<()> {
//! let processor = Processor::new(NoLoader);
//! let doc = json!({
//!     "@context": {"name": "http://schema.org/name"},
//!     "name": "Alice"
//! });
//! let expanded = processor.expand(&doc).await?;
//! assert_eq!(
//!     expanded,
//!     json!([{"http://schema.org/name": [{"@value": "Alice"}]}])
//! );
//! # Ok(())
//! # }
//! ```
#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

// Re-export for use with third-party implementation of `LoadRemoteDocument`
// trait.
pub use async_trait;
pub use iri_string;
pub use serde_json;

pub use self::{
    context::Context,
    error::{Error, ErrorCode, Result},
    processor::{ProcessingMode, Processor, ProcessorOptions, RdfDirection, Warning},
    remote::{
        LoadDocumentOptions, LoadRemoteDocument, NoLoader, Profile, RemoteDocument, StaticLoader,
    },
};

pub(crate) mod compact;
pub(crate) mod context;
pub(crate) mod error;
pub(crate) mod expand;
pub(crate) mod flatten;
pub(crate) mod iri;
pub(crate) mod json;
pub(crate) mod processor;
pub(crate) mod remote;
pub mod syntax;
