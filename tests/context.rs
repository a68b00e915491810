//! Context processing tests: remote contexts, imports and processing modes.

use std::convert::Infallible;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use jsonld::async_trait::async_trait;
use jsonld::{
    ErrorCode, LoadDocumentOptions, LoadRemoteDocument, NoLoader, ProcessingMode, Processor,
    ProcessorOptions, RemoteDocument, StaticLoader,
};
use serde_json::json;

#[tokio::test]
async fn remote_context_is_dereferenced() {
    let loader = StaticLoader::new().with_document(
        "http://example.com/ctx",
        json!({"@context": {"name": "http://schema.org/name"}}),
    );
    let processor = Processor::new(loader);
    let doc = json!({
        "@context": "http://example.com/ctx",
        "name": "Alice"
    });
    let expanded = processor.expand(&doc).await.expect("should expand");
    assert_eq!(
        expanded,
        json!([{"http://schema.org/name": [{"@value": "Alice"}]}])
    );
}

#[tokio::test]
async fn missing_remote_document_fails() {
    let processor = Processor::new(NoLoader);
    let doc = json!({
        "@context": "http://example.com/ctx",
        "http://example.com/p": "v"
    });
    let err = processor.expand(&doc).await.expect_err("should fail");
    assert_eq!(err.code(), ErrorCode::LoadingRemoteContextFailed);
}

#[tokio::test]
async fn remote_document_without_context_entry_fails() {
    let loader = StaticLoader::new()
        .with_document("http://example.com/ctx", json!({"unrelated": true}));
    let processor = Processor::new(loader);
    let doc = json!({
        "@context": "http://example.com/ctx",
        "http://example.com/p": "v"
    });
    let err = processor.expand(&doc).await.expect_err("should fail");
    assert_eq!(err.code(), ErrorCode::InvalidRemoteContext);
}

/// A loader which serves a self-referential context and counts how often it
/// is actually dereferenced.
#[derive(Clone)]
struct CyclicLoader {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl LoadRemoteDocument for CyclicLoader {
    type Error = Infallible;

    async fn load(
        &self,
        iri: &str,
        _options: LoadDocumentOptions,
    ) -> Result<RemoteDocument, Self::Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(RemoteDocument::new(iri, json!({"@context": iri})))
    }
}

#[tokio::test]
async fn cyclic_remote_contexts_overflow() {
    let calls = Arc::new(AtomicUsize::new(0));
    let processor = Processor::new(CyclicLoader {
        calls: Arc::clone(&calls),
    });
    let doc = json!({
        "@context": "http://example.com/cycle",
        "http://example.com/p": "v"
    });
    let err = processor.expand(&doc).await.expect_err("should fail");
    assert_eq!(err.code(), ErrorCode::ContextOverflow);
    // A previously dereferenced context is never fetched again, so the
    // loader is touched at most once per unique URL within the bound.
    assert!(calls.load(Ordering::SeqCst) <= 50);
}

#[tokio::test]
async fn imported_context_merges_beneath_local_entries() {
    let loader = StaticLoader::new().with_document(
        "http://example.com/imported",
        json!({"@context": {
            "name": "http://schema.org/name",
            "age": "http://example.com/wrong-age"
        }}),
    );
    let processor = Processor::new(loader);
    let doc = json!({
        "@context": {
            "@import": "http://example.com/imported",
            "age": "http://schema.org/age"
        },
        "name": "Alice",
        "age": 7
    });
    let expanded = processor.expand(&doc).await.expect("should expand");
    assert_eq!(
        expanded,
        json!([{
            "http://schema.org/name": [{"@value": "Alice"}],
            "http://schema.org/age": [{"@value": 7}]
        }])
    );
}

#[tokio::test]
async fn processing_mode_1_0_rejects_scoped_contexts() {
    let processor = Processor::with_options(
        ProcessorOptions::new().processing_mode(ProcessingMode::JsonLd1_0),
        NoLoader,
    );
    let doc = json!({
        "@context": {
            "foo": {
                "@id": "http://example.com/foo",
                "@context": {"bar": "http://example.com/bar"}
            }
        },
        "foo": "x"
    });
    let err = processor.expand(&doc).await.expect_err("should fail");
    assert_eq!(err.code(), ErrorCode::InvalidTermDefinition);
}

#[tokio::test]
async fn processing_mode_1_0_rejects_version_1_1() {
    let processor = Processor::with_options(
        ProcessorOptions::new().processing_mode(ProcessingMode::JsonLd1_0),
        NoLoader,
    );
    let doc = json!({
        "@context": {"@version": 1.1, "name": "http://schema.org/name"},
        "name": "Alice"
    });
    let err = processor.expand(&doc).await.expect_err("should fail");
    assert_eq!(err.code(), ErrorCode::ProcessingModeConflict);
}

#[tokio::test]
async fn invalid_container_mapping_is_rejected() {
    let processor = Processor::new(NoLoader);
    let doc = json!({
        "@context": {
            "bad": {"@id": "http://example.com/bad", "@container": ["@list", "@set"]}
        },
        "bad": "x"
    });
    let err = processor.expand(&doc).await.expect_err("should fail");
    assert_eq!(err.code(), ErrorCode::InvalidContainerMapping);
}
