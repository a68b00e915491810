//! Compaction tests.

use jsonld::{ErrorCode, NoLoader, Processor, ProcessorOptions};
use serde_json::json;

use jsonld::iri_string::types::IriString;

/// Returns a processor with default options and no remote document support.
fn processor() -> Processor<NoLoader> {
    Processor::new(NoLoader)
}

/// Returns a processor with the given base IRI.
fn processor_with_base(base: &str) -> Processor<NoLoader> {
    let base: IriString = base.parse().expect("valid base IRI");
    Processor::with_options(ProcessorOptions::new().base(base), NoLoader)
}

#[tokio::test]
async fn compacts_to_compact_iri() {
    let context = json!({"schema": "http://schema.org/"});
    let doc = json!({
        "@context": {"schema": "http://schema.org/"},
        "schema:name": "Alice"
    });
    let compacted = processor()
        .compact(&doc, &context)
        .await
        .expect("should compact");
    assert_eq!(
        compacted,
        json!({
            "@context": {"schema": "http://schema.org/"},
            "schema:name": "Alice"
        })
    );
}

#[tokio::test]
async fn language_map_round_trips() {
    let context = json!({
        "label": {"@id": "http://example.com/label", "@container": "@language"}
    });
    let doc = json!({
        "@context": {
            "label": {"@id": "http://example.com/label", "@container": "@language"}
        },
        "label": {"en": "Hello", "fr": "Bonjour"}
    });
    let compacted = processor()
        .compact(&doc, &context)
        .await
        .expect("should compact");
    assert_eq!(
        compacted,
        json!({
            "@context": {
                "label": {"@id": "http://example.com/label", "@container": "@language"}
            },
            "label": {"en": "Hello", "fr": "Bonjour"}
        })
    );
}

#[tokio::test]
async fn list_container_round_trips() {
    let context = json!({
        "friends": {"@id": "http://example.com/friends", "@container": "@list"}
    });
    let doc = json!({
        "@context": {
            "friends": {"@id": "http://example.com/friends", "@container": "@list"}
        },
        "friends": ["a", "b"]
    });
    let compacted = processor()
        .compact(&doc, &context)
        .await
        .expect("should compact");
    assert_eq!(
        compacted,
        json!({
            "@context": {
                "friends": {"@id": "http://example.com/friends", "@container": "@list"}
            },
            "friends": ["a", "b"]
        })
    );
}

#[tokio::test]
async fn set_container_keeps_arrays() {
    let context = json!({
        "tags": {"@id": "http://example.com/tag", "@container": "@set"}
    });
    let doc = json!({
        "@context": {"tags": {"@id": "http://example.com/tag", "@container": "@set"}},
        "tags": "x"
    });
    let compacted = processor()
        .compact(&doc, &context)
        .await
        .expect("should compact");
    assert_eq!(
        compacted,
        json!({
            "@context": {"tags": {"@id": "http://example.com/tag", "@container": "@set"}},
            "tags": ["x"]
        })
    );
}

#[tokio::test]
async fn identifiers_compact_relative_to_base() {
    let doc = json!({
        "@id": "http://example.com/a",
        "http://example.com/p": "v"
    });
    let compacted = processor_with_base("http://example.com/")
        .compact(&doc, &json!({}))
        .await
        .expect("should compact");
    assert_eq!(
        compacted,
        json!({"@id": "a", "http://example.com/p": "v"})
    );
}

#[tokio::test]
async fn compact_arrays_disabled_keeps_arrays() {
    let context = json!({"schema": "http://schema.org/"});
    let doc = json!({
        "@context": {"schema": "http://schema.org/"},
        "schema:name": "Alice"
    });
    let processor = Processor::with_options(
        ProcessorOptions::new().compact_arrays(false),
        NoLoader,
    );
    let compacted = processor
        .compact(&doc, &context)
        .await
        .expect("should compact");
    // Without array compaction the top level also stays an array, wrapped
    // under `@graph`.
    assert_eq!(
        compacted,
        json!({
            "@context": {"schema": "http://schema.org/"},
            "@graph": [{"schema:name": ["Alice"]}]
        })
    );
}

#[tokio::test]
async fn iri_confused_with_prefix() {
    let context = json!({"http": {"@id": "ex:http", "@prefix": true}});
    let doc = json!({
        "@id": "http:example",
        "http://example.com/p": "v"
    });
    let err = processor()
        .compact(&doc, &context)
        .await
        .expect_err("should fail");
    assert_eq!(err.code(), ErrorCode::IriConfusedWithPrefix);
}

#[tokio::test]
async fn expand_compact_expand_round_trips() {
    let context = json!({
        "label": {"@id": "http://example.com/label", "@container": "@language"},
        "knows": {"@id": "http://example.com/knows", "@type": "@id"}
    });
    let doc = json!({
        "@context": {
            "label": {"@id": "http://example.com/label", "@container": "@language"},
            "knows": {"@id": "http://example.com/knows", "@type": "@id"}
        },
        "@id": "http://example.com/a",
        "label": {"en": "Hello", "fr": "Bonjour"},
        "knows": "http://example.com/b"
    });
    let processor = processor();
    let expanded = processor.expand(&doc).await.expect("should expand");
    let compacted = processor
        .compact(&expanded, &context)
        .await
        .expect("should compact");
    let re_expanded = processor.expand(&compacted).await.expect("should expand");
    assert_eq!(expanded, re_expanded);
}

#[tokio::test]
async fn type_coerced_values_compact_to_strings() {
    let context = json!({
        "knows": {"@id": "http://example.com/knows", "@type": "@id"}
    });
    let doc = json!({
        "@context": {"knows": {"@id": "http://example.com/knows", "@type": "@id"}},
        "@id": "http://example.com/a",
        "knows": "http://example.com/b"
    });
    let compacted = processor()
        .compact(&doc, &context)
        .await
        .expect("should compact");
    assert_eq!(
        compacted,
        json!({
            "@context": {"knows": {"@id": "http://example.com/knows", "@type": "@id"}},
            "@id": "http://example.com/a",
            "knows": "http://example.com/b"
        })
    );
}

#[tokio::test]
async fn keyword_aliases_apply() {
    let context = json!({"id": "@id", "type": "@type"});
    let doc = json!({
        "@id": "http://example.com/a",
        "@type": "http://example.com/Type",
        "http://example.com/p": "v"
    });
    let compacted = processor()
        .compact(&doc, &context)
        .await
        .expect("should compact");
    assert_eq!(
        compacted,
        json!({
            "@context": {"id": "@id", "type": "@type"},
            "id": "http://example.com/a",
            "type": "http://example.com/Type",
            "http://example.com/p": "v"
        })
    );
}
