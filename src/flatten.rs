//! Node map generation and flattening.
//!
//! See <https://www.w3.org/TR/json-ld11-api/#node-map-generation> and
//! <https://www.w3.org/TR/json-ld11-api/#flattening-algorithm>.

use anyhow::anyhow;
use indexmap::IndexMap;
use serde_json::{Map as JsonMap, Value};

use crate::{
    error::{ErrorCode, Result},
    iri::is_blank_node_identifier,
    json::{single_entry_map, to_ref_array},
};

/// Blank node identifier issuer.
///
/// Issues `_:b<n>` labels from a per-run counter, keeping a map from source
/// identifiers to issued identifiers so that relabeling is consistent within
/// one run.
///
/// See <https://www.w3.org/TR/json-ld11-api/#generate-blank-node-identifier>.
#[derive(Default, Debug, Clone)]
pub(crate) struct BlankNodeIssuer {
    /// Number of identifiers issued so far.
    counter: usize,
    /// Already issued identifiers, by source identifier.
    ///
    /// Insertion order is kept so that reissuing is deterministic.
    issued: IndexMap<String, String>,
}

impl BlankNodeIssuer {
    /// Creates a new issuer with a fresh counter.
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns the blank node identifier for the given source identifier,
    /// issuing a new one on first use.
    ///
    /// Passing `None` always issues a fresh, unrelated identifier.
    pub(crate) fn issue(&mut self, identifier: Option<&str>) -> String {
        if let Some(identifier) = identifier {
            if let Some(existing) = self.issued.get(identifier) {
                return existing.clone();
            }
        }
        let issued = format!("_:b{}", self.counter);
        self.counter += 1;
        if let Some(identifier) = identifier {
            self.issued.insert(identifier.to_owned(), issued.clone());
        }
        issued
    }
}

/// Flattens an expanded document: collects all nodes into a node map and
/// emits them as a flat array, default graph first, other graphs under
/// `@graph` entries of their graph name node.
///
/// See <https://www.w3.org/TR/json-ld11-api/#flattening-algorithm>.
pub(crate) fn flatten_expanded(expanded: &Value) -> Result<Value> {
    // Step 1, 2
    let mut node_map = JsonMap::new();
    node_map.insert("@default".to_owned(), Value::Object(JsonMap::new()));
    let mut issuer = BlankNodeIssuer::new();
    generate_node_map(expanded, &mut node_map, "@default", None, None, None, &mut issuer)?;

    // Step 3: fold named graphs into their graph name node of the default
    // graph.
    let mut default_graph = match node_map.remove("@default") {
        Some(Value::Object(map)) => map,
        _ => JsonMap::new(),
    };
    let mut graph_names: Vec<String> = node_map.keys().cloned().collect();
    graph_names.sort();
    for graph_name in graph_names {
        let graph = match node_map.remove(&graph_name) {
            Some(Value::Object(map)) => map,
            _ => continue,
        };
        let entry = default_graph
            .entry(graph_name.clone())
            .or_insert_with(|| {
                Value::Object(single_entry_map("@id", Value::from(graph_name.as_str())))
            });
        let entry = entry
            .as_object_mut()
            .expect("Should never fail: node map entries are maps");
        entry.insert("@graph".to_owned(), Value::Array(nodes_of(&graph)));
    }

    // Step 4, 5
    Ok(Value::Array(nodes_of(&default_graph)))
}

/// Returns the nodes of a graph in identifier order, skipping nodes which
/// carry nothing but their identifier.
fn nodes_of(graph: &JsonMap<String, Value>) -> Vec<Value> {
    let mut ids: Vec<&String> = graph.keys().collect();
    ids.sort();
    ids.into_iter()
        .filter_map(|id| graph.get(id))
        .filter(|node| {
            node.as_object()
                .map_or(false, |map| map.len() > 1 || !map.contains_key("@id"))
        })
        .cloned()
        .collect()
}

/// Runs the node map generation algorithm.
///
/// `active_subject` is either a string (the parent subject identifier), or a
/// map (a reverse reference to assert on the visited node).
///
/// See <https://www.w3.org/TR/json-ld11-api/#node-map-generation>.
pub(crate) fn generate_node_map(
    element: &Value,
    node_map: &mut JsonMap<String, Value>,
    active_graph: &str,
    active_subject: Option<&Value>,
    active_property: Option<&str>,
    mut list: Option<&mut Vec<Value>>,
    issuer: &mut BlankNodeIssuer,
) -> Result<()> {
    // Step 1
    if let Value::Array(items) = element {
        for item in items {
            generate_node_map(
                item,
                node_map,
                active_graph,
                active_subject,
                active_property,
                list.as_mut().map(|l| &mut **l),
                issuer,
            )?;
        }
        return Ok(());
    }

    let element = match element {
        Value::Object(map) => map,
        v => {
            return Err(ErrorCode::Uncategorized
                .and_source(anyhow!("Expected a map in expanded input, but got {:?}", v)))
        }
    };
    let mut element = element.clone();

    // Step 3: relabel blank node identifiers in `@type`.
    if let Some(types) = element.get_mut("@type") {
        let relabeled: Vec<Value> = to_ref_array(types)
            .into_iter()
            .map(|ty| match ty.as_str() {
                Some(ty) if is_blank_node_identifier(ty) => {
                    Value::from(issuer.issue(Some(ty)))
                }
                _ => ty.clone(),
            })
            .collect();
        *types = if types.is_array() {
            Value::Array(relabeled)
        } else {
            relabeled
                .into_iter()
                .next()
                .expect("Should never fail: a non-array value yields one item")
        };
    }

    // Step 4: value objects attach to the parent node (or the pending list).
    if element.contains_key("@value") {
        let value = Value::Object(element);
        match list {
            None => {
                let subject = subject_id(active_subject);
                let property =
                    active_property.expect("Should never fail: values appear under a property");
                add_node_value(node_map, active_graph, subject, property, value);
            }
            Some(list) => list.push(value),
        }
        return Ok(());
    }

    // Step 5: list objects recurse with a fresh list sink.
    if let Some(list_values) = element.remove("@list") {
        let mut result_list = Vec::new();
        generate_node_map(
            &list_values,
            node_map,
            active_graph,
            active_subject,
            active_property,
            Some(&mut result_list),
            issuer,
        )?;
        let mut result = single_entry_map("@list", Value::Array(result_list));
        if let Some(index) = element.remove("@index") {
            result.insert("@index".to_owned(), index);
        }
        let result = Value::Object(result);
        match list {
            None => {
                let subject = subject_id(active_subject);
                let property =
                    active_property.expect("Should never fail: lists appear under a property");
                add_node_value(node_map, active_graph, subject, property, result);
            }
            Some(list) => list.push(result),
        }
        return Ok(());
    }

    // Step 6: a node object.
    // Step 6.1: establish its identifier, relabeling blank nodes.
    let id = match element.remove("@id") {
        Some(Value::String(id)) => {
            if is_blank_node_identifier(&id) {
                issuer.issue(Some(&id))
            } else {
                id
            }
        }
        _ => issuer.issue(None),
    };

    // Step 6.2, 6.3
    ensure_node(node_map, active_graph, &id);

    // Step 6.4: record the reference from (or to) the parent.
    if let Some(subject) = active_subject {
        if subject.is_object() {
            // A reverse reference: the visited node points back at the
            // parent.
            let property = active_property
                .expect("Should never fail: reverse references carry a property");
            add_node_value(node_map, active_graph, &id, property, subject.clone());
        } else if let Some(property) = active_property {
            let reference = Value::Object(single_entry_map("@id", Value::from(id.as_str())));
            match &mut list {
                None => {
                    let parent = subject
                        .as_str()
                        .expect("Should never fail: non-reverse subjects are strings");
                    add_node_value(node_map, active_graph, parent, property, reference);
                }
                Some(list) => list.push(reference),
            }
        }
    }

    // Step 6.5
    if let Some(types) = element.remove("@type") {
        for ty in crate::json::into_array(types) {
            add_node_value(node_map, active_graph, &id, "@type", ty);
        }
    }

    // Step 6.6
    if let Some(index) = element.remove("@index") {
        let node = node_mut(node_map, active_graph, &id);
        if let Some(existing) = node.get("@index") {
            if *existing != index {
                return Err(ErrorCode::ConflictingIndexes
                    .and_source(anyhow!("node = {:?}, index = {:?}", id, index)));
            }
        }
        node.insert("@index".to_owned(), index);
    }

    // Step 6.7: reverse properties assert an edge from each value back to
    // this node.
    if let Some(Value::Object(reverse_map)) = element.remove("@reverse") {
        let referenced = Value::Object(single_entry_map("@id", Value::from(id.as_str())));
        for (property, values) in &reverse_map {
            for value in to_ref_array(values) {
                generate_node_map(
                    value,
                    node_map,
                    active_graph,
                    Some(&referenced),
                    Some(property),
                    None,
                    issuer,
                )?;
            }
        }
    }

    // Step 6.8: the node's own graph content recurses with this node as the
    // active graph.
    if let Some(graph) = element.remove("@graph") {
        generate_node_map(&graph, node_map, &id, None, None, None, issuer)?;
    }

    // Step 6.9: `@included` content lives in the same graph.
    if let Some(included) = element.remove("@included") {
        generate_node_map(&included, node_map, active_graph, None, None, None, issuer)?;
    }

    // Step 6.10: remaining properties, in identifier order.
    let mut properties: Vec<String> = element.keys().cloned().collect();
    properties.sort();
    for property in properties {
        let values = element
            .get(&property)
            .expect("Should never fail: the key was just listed")
            .clone();
        let property = if is_blank_node_identifier(&property) {
            issuer.issue(Some(&property))
        } else {
            property
        };
        // The entry exists even when every value is dropped.
        let node = node_mut(node_map, active_graph, &id);
        node.entry(property.clone())
            .or_insert_with(|| Value::Array(Vec::new()));
        generate_node_map(
            &values,
            node_map,
            active_graph,
            Some(&Value::from(id.as_str())),
            Some(&property),
            None,
            issuer,
        )?;
    }

    Ok(())
}

/// Returns the subject identifier of a string active subject.
fn subject_id(active_subject: Option<&Value>) -> &str {
    active_subject
        .and_then(Value::as_str)
        .expect("Should never fail: the caller passes a string subject here")
}

/// Ensures a node entry exists for the given identifier.
fn ensure_node(node_map: &mut JsonMap<String, Value>, graph: &str, id: &str) {
    let graph = node_map
        .entry(graph.to_owned())
        .or_insert_with(|| Value::Object(JsonMap::new()))
        .as_object_mut()
        .expect("Should never fail: graphs are maps");
    graph
        .entry(id.to_owned())
        .or_insert_with(|| Value::Object(single_entry_map("@id", Value::from(id))));
}

/// Returns a mutable reference to the node with the given identifier,
/// creating it first if needed.
fn node_mut<'a>(
    node_map: &'a mut JsonMap<String, Value>,
    graph: &str,
    id: &str,
) -> &'a mut JsonMap<String, Value> {
    ensure_node(node_map, graph, id);
    node_map
        .get_mut(graph)
        .and_then(Value::as_object_mut)
        .and_then(|graph| graph.get_mut(id))
        .and_then(Value::as_object_mut)
        .expect("Should never fail: the node was just created")
}

/// Appends a value to a node property, ignoring exact duplicates.
fn add_node_value(
    node_map: &mut JsonMap<String, Value>,
    graph: &str,
    subject: &str,
    property: &str,
    value: Value,
) {
    let node = node_mut(node_map, graph, subject);
    let values = node
        .entry(property.to_owned())
        .or_insert_with(|| Value::Array(Vec::new()));
    let values = values
        .as_array_mut()
        .expect("Should never fail: node properties are arrays");
    if !values.contains(&value) {
        values.push(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issuer_is_consistent() {
        let mut issuer = BlankNodeIssuer::new();
        assert_eq!(issuer.issue(Some("_:a")), "_:b0");
        assert_eq!(issuer.issue(Some("_:b")), "_:b1");
        assert_eq!(issuer.issue(Some("_:a")), "_:b0");
        assert_eq!(issuer.issue(None), "_:b2");
        assert_eq!(issuer.issue(None), "_:b3");
    }
}
