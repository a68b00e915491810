//! Expansion tests.

use std::sync::{Arc, Mutex};

use jsonld::{ErrorCode, NoLoader, Processor, ProcessorOptions, Warning};
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
async fn single_term_alias() {
    let doc = json!({
        "@context": {"name": "http://schema.org/name"},
        "name": "Alice"
    });
    let expanded = processor().expand(&doc).await.expect("should expand");
    assert_eq!(
        expanded,
        json!([{"http://schema.org/name": [{"@value": "Alice"}]}])
    );
}

#[tokio::test]
async fn compact_iri_through_prefix() {
    let doc = json!({
        "@context": {"schema": "http://schema.org/"},
        "schema:name": "Alice"
    });
    let expanded = processor().expand(&doc).await.expect("should expand");
    assert_eq!(
        expanded,
        json!([{"http://schema.org/name": [{"@value": "Alice"}]}])
    );
}

#[tokio::test]
async fn language_map() {
    let doc = json!({
        "@context": {
            "label": {"@id": "http://example.com/label", "@container": "@language"}
        },
        "label": {"en": "Hello", "fr": "Bonjour"}
    });
    let expanded = processor().expand(&doc).await.expect("should expand");
    assert_eq!(
        expanded,
        json!([{
            "http://example.com/label": [
                {"@value": "Hello", "@language": "en"},
                {"@value": "Bonjour", "@language": "fr"}
            ]
        }])
    );
}

#[tokio::test]
async fn list_container() {
    let doc = json!({
        "@context": {"friends": {"@id": "ex:f", "@container": "@list"}},
        "friends": ["a", "b"]
    });
    let expanded = processor().expand(&doc).await.expect("should expand");
    assert_eq!(
        expanded,
        json!([{"ex:f": [{"@list": [{"@value": "a"}, {"@value": "b"}]}]}])
    );
}

#[tokio::test]
async fn expansion_is_idempotent() {
    let doc = json!({
        "@context": {
            "name": "http://schema.org/name",
            "knows": {"@id": "http://schema.org/knows", "@type": "@id"}
        },
        "@id": "http://example.com/alice",
        "name": "Alice",
        "knows": "http://example.com/bob"
    });
    let once = processor().expand(&doc).await.expect("should expand");
    let twice = processor().expand(&once).await.expect("should expand");
    assert_eq!(once, twice);
}

#[tokio::test]
async fn default_language_applies_to_strings() {
    let doc = json!({
        "@context": {"@language": "en", "p": "http://example.com/p"},
        "p": "v"
    });
    let expanded = processor().expand(&doc).await.expect("should expand");
    assert_eq!(
        expanded,
        json!([{"http://example.com/p": [{"@value": "v", "@language": "en"}]}])
    );
}

#[tokio::test]
async fn null_language_clears_default() {
    let doc = json!({
        "@context": [
            {"@language": "en"},
            {"@language": null, "p": "http://example.com/p"}
        ],
        "p": "v"
    });
    let expanded = processor().expand(&doc).await.expect("should expand");
    assert_eq!(
        expanded,
        json!([{"http://example.com/p": [{"@value": "v"}]}])
    );
}

#[tokio::test]
async fn id_typed_term_resolves_against_base() {
    let doc = json!({
        "@context": {"knows": {"@id": "http://example.com/knows", "@type": "@id"}},
        "knows": "bob"
    });
    let expanded = processor_with_base("http://example.com/")
        .expand(&doc)
        .await
        .expect("should expand");
    assert_eq!(
        expanded,
        json!([{"http://example.com/knows": [{"@id": "http://example.com/bob"}]}])
    );
}

#[tokio::test]
async fn empty_vocab_resolves_against_base() {
    let doc = json!({
        "@context": {"@vocab": ""},
        "name": "x"
    });
    let expanded = processor_with_base("http://example.com/")
        .expand(&doc)
        .await
        .expect("should expand");
    assert_eq!(
        expanded,
        json!([{"http://example.com/name": [{"@value": "x"}]}])
    );
}

#[tokio::test]
async fn property_scoped_context() {
    let doc = json!({
        "@context": {
            "foo": {
                "@id": "http://example.com/foo",
                "@context": {"bar": "http://example.com/bar"}
            }
        },
        "foo": {"bar": "baz"}
    });
    let expanded = processor().expand(&doc).await.expect("should expand");
    assert_eq!(
        expanded,
        json!([{
            "http://example.com/foo": [
                {"http://example.com/bar": [{"@value": "baz"}]}
            ]
        }])
    );
}

#[tokio::test]
async fn type_scoped_context() {
    let doc = json!({
        "@context": {
            "Person": {
                "@id": "http://example.com/Person",
                "@context": {"name": "http://example.com/name"}
            }
        },
        "@type": "Person",
        "name": "N"
    });
    let expanded = processor().expand(&doc).await.expect("should expand");
    assert_eq!(
        expanded,
        json!([{
            "@type": ["http://example.com/Person"],
            "http://example.com/name": [{"@value": "N"}]
        }])
    );
}

#[tokio::test]
async fn free_floating_values_are_dropped() {
    let expanded = processor()
        .expand(&json!({"@value": "free"}))
        .await
        .expect("should expand");
    assert_eq!(expanded, json!([]));

    let expanded = processor()
        .expand(&json!({"@list": ["free"]}))
        .await
        .expect("should expand");
    assert_eq!(expanded, json!([]));
}

#[tokio::test]
async fn keyword_like_term_warns_and_is_ignored() {
    let warnings = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&warnings);
    let processor = Processor::new(NoLoader).on_warning(move |warning| {
        seen.lock().expect("not poisoned").push(warning.clone());
    });

    let doc = json!({
        "@context": {"@ignoreMe": "http://example.com/ignored"},
        "http://example.com/p": "v"
    });
    let expanded = processor.expand(&doc).await.expect("should expand");
    assert_eq!(
        expanded,
        json!([{"http://example.com/p": [{"@value": "v"}]}])
    );
    let warnings = warnings.lock().expect("not poisoned");
    assert!(warnings
        .iter()
        .any(|w| matches!(w, Warning::KeywordLikeTerm(term) if term == "@ignoreMe")));
}

#[tokio::test]
async fn protected_term_redefinition_fails() {
    let doc = json!({
        "@context": [
            {"name": {"@id": "ex:n", "@protected": true}},
            {"name": "ex:other"}
        ],
        "name": "x"
    });
    let err = processor().expand(&doc).await.expect_err("should fail");
    assert_eq!(err.code(), ErrorCode::ProtectedTermRedefinition);
}

#[tokio::test]
async fn null_context_cannot_reset_protected_terms() {
    let doc = json!({
        "@context": [
            {"name": {"@id": "ex:n", "@protected": true}},
            null
        ],
        "name": "x"
    });
    let err = processor().expand(&doc).await.expect_err("should fail");
    assert_eq!(err.code(), ErrorCode::InvalidContextNullification);
}

#[tokio::test]
async fn reverse_property_with_list_value_fails() {
    let doc = json!({
        "@context": {"children": {"@reverse": "http://example.com/parent"}},
        "@id": "http://example.com/a",
        "children": {"@list": [{"@id": "http://example.com/b"}]}
    });
    let err = processor().expand(&doc).await.expect_err("should fail");
    assert_eq!(err.code(), ErrorCode::InvalidReversePropertyValue);
}

#[tokio::test]
async fn reverse_property_builds_reverse_map() {
    let doc = json!({
        "@context": {"children": {"@reverse": "http://example.com/parent"}},
        "@id": "http://example.com/a",
        "children": {"@id": "http://example.com/b"}
    });
    let expanded = processor().expand(&doc).await.expect("should expand");
    assert_eq!(
        expanded,
        json!([{
            "@id": "http://example.com/a",
            "@reverse": {
                "http://example.com/parent": [{"@id": "http://example.com/b"}]
            }
        }])
    );
}

#[tokio::test]
async fn undefined_prefix_is_kept_verbatim() {
    let doc = json!({
        "@context": {"p": "http://example.com/p"},
        "p": {"@id": "undef:x"}
    });
    // `undef:x` has the shape of an absolute IRI, so it passes through.
    let expanded = processor().expand(&doc).await.expect("should expand");
    assert_eq!(
        expanded,
        json!([{"http://example.com/p": [{"@id": "undef:x"}]}])
    );
}
