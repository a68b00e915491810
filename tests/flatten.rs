//! Flattening tests.

use jsonld::{NoLoader, Processor};
use serde_json::json;

/// Returns a processor with default options and no remote document support.
fn processor() -> Processor<NoLoader> {
    Processor::new(NoLoader)
}

#[tokio::test]
async fn nested_nodes_are_lifted() {
    let doc = json!({
        "@context": {
            "knows": {"@id": "http://xmlns.com/foaf/0.1/knows"},
            "name": "http://xmlns.com/foaf/0.1/name"
        },
        "@id": "http://example.com/a",
        "name": "A",
        "knows": {"name": "B"}
    });
    let flattened = processor()
        .flatten(&doc, None)
        .await
        .expect("should flatten");
    assert_eq!(
        flattened,
        json!([
            {
                "@id": "_:b0",
                "http://xmlns.com/foaf/0.1/name": [{"@value": "B"}]
            },
            {
                "@id": "http://example.com/a",
                "http://xmlns.com/foaf/0.1/knows": [{"@id": "_:b0"}],
                "http://xmlns.com/foaf/0.1/name": [{"@value": "A"}]
            }
        ])
    );
}

#[tokio::test]
async fn blank_node_relabeling_is_stable() {
    let doc = json!({
        "@id": "_:source",
        "http://example.com/p": [
            {"@id": "_:other"},
            {"@id": "_:source"}
        ]
    });
    let first = processor()
        .flatten(&doc, None)
        .await
        .expect("should flatten");
    let second = processor()
        .flatten(&doc, None)
        .await
        .expect("should flatten");
    assert_eq!(first, second);
    assert_eq!(
        first,
        json!([
            {
                "@id": "_:b0",
                "http://example.com/p": [{"@id": "_:b1"}, {"@id": "_:b0"}]
            }
        ])
    );
}

#[tokio::test]
async fn flattening_is_idempotent() {
    let doc = json!({
        "@context": {"knows": {"@id": "http://xmlns.com/foaf/0.1/knows"}},
        "@id": "http://example.com/a",
        "knows": {"http://xmlns.com/foaf/0.1/name": "B"}
    });
    let once = processor()
        .flatten(&doc, None)
        .await
        .expect("should flatten");
    let twice = processor()
        .flatten(&once, None)
        .await
        .expect("should flatten");
    assert_eq!(once, twice);
}

#[tokio::test]
async fn named_graphs_nest_under_graph_name() {
    let doc = json!({
        "@context": {"data": "http://example.com/data"},
        "@id": "http://example.com/g",
        "@graph": [
            {"@id": "http://example.com/a", "data": "v"}
        ]
    });
    let flattened = processor()
        .flatten(&doc, None)
        .await
        .expect("should flatten");
    assert_eq!(
        flattened,
        json!([
            {
                "@id": "http://example.com/g",
                "@graph": [
                    {
                        "@id": "http://example.com/a",
                        "http://example.com/data": [{"@value": "v"}]
                    }
                ]
            }
        ])
    );
}

#[tokio::test]
async fn flatten_compacts_with_supplied_context() {
    let context = json!({"data": "http://example.com/data"});
    let doc = json!({
        "@context": {"data": "http://example.com/data"},
        "@id": "http://example.com/g",
        "@graph": [
            {"@id": "http://example.com/a", "data": "v"}
        ]
    });
    let flattened = processor()
        .flatten(&doc, Some(&context))
        .await
        .expect("should flatten");
    assert_eq!(
        flattened,
        json!({
            "@context": {"data": "http://example.com/data"},
            "@id": "http://example.com/g",
            "@graph": [
                {"@id": "http://example.com/a", "data": "v"}
            ]
        })
    );
}

#[tokio::test]
async fn shared_values_are_deduplicated() {
    let doc = json!([
        {"@id": "http://example.com/a", "http://example.com/p": "v"},
        {"@id": "http://example.com/a", "http://example.com/p": "v"}
    ]);
    let flattened = processor()
        .flatten(&doc, None)
        .await
        .expect("should flatten");
    assert_eq!(
        flattened,
        json!([
            {"@id": "http://example.com/a", "http://example.com/p": [{"@value": "v"}]}
        ])
    );
}
