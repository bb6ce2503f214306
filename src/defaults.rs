//! Fill store responses with per-node defaults.
//!
//! The store leaves out predicates a result does not have. Nodes that carry
//! a `default` get it filled back in, at every depth, under the name the
//! node renders as.

use serde_json::{Map, Value};

use crate::ast::types::QueryNode;

/// Apply the defaults of `queries` to a decoded store response. The
/// response is the mapping from root names to results.
pub fn apply_defaults(queries: &[QueryNode], response: Value) -> Value {
    match response {
        Value::Object(mut map) => {
            fill(queries, &mut map);
            Value::Object(map)
        }
        other => other,
    }
}

fn apply_node(node: &QueryNode, value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| apply_node(node, item))
                .collect(),
        ),
        Value::Object(mut map) => {
            fill(&node.children, &mut map);
            Value::Object(map)
        }
        other => other,
    }
}

fn fill(nodes: &[QueryNode], map: &mut Map<String, Value>) {
    for node in nodes {
        let name = node.name();
        if name.is_empty() {
            continue;
        }
        match map.remove(name) {
            Some(present) => {
                map.insert(name.to_string(), apply_node(node, present));
            }
            None => {
                if let Some(default) = &node.default {
                    map.insert(name.to_string(), default.clone());
                }
            }
        }
    }
}
