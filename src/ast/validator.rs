/// Round-trip validation of rendered text.
///
/// The external parser is the authority on the grammar. A render is only
/// trusted once parsing it back yields the tree we started from, with
/// `default` cleared since it has no textual form.
use std::collections::BTreeMap;

use serde_json::Value;

use super::adapter::QueryParser;
use super::compiler::render;
use super::parser::parse_block;
use super::types::*;
use crate::error::{ConsistencyError, Error};

/// Render `block` and check it against `parser`. Returns the rendered text.
pub async fn validate_round_trip<P: QueryParser>(
    parser: &P,
    block: &QueryBlock,
) -> Result<String, Error> {
    let text = render(block)?;

    // Only the declared names matter for the comparison, not their values.
    let variables: BTreeMap<String, String> = block
        .variables
        .keys()
        .map(|name| (name.clone(), name.clone()))
        .collect();
    let parsed = parse_block(parser, &text, &variables).await?;

    let expected: Vec<QueryNode> = block
        .queries
        .iter()
        .cloned()
        .map(QueryNode::strip_defaults)
        .collect();

    if parsed == expected {
        return Ok(text);
    }

    let difference = describe_difference(&expected, &parsed);
    tracing::warn!(
        parser = parser.name(),
        difference = %difference,
        "rendered query does not round-trip"
    );
    Err(ConsistencyError {
        rendered: text,
        difference,
    }
    .into())
}

/// Path and values of the first field that differs.
pub fn describe_difference(expected: &[QueryNode], parsed: &[QueryNode]) -> String {
    let (expected, parsed) = match (serde_json::to_value(expected), serde_json::to_value(parsed)) {
        (Ok(e), Ok(p)) => (e, p),
        _ => return "trees differ".to_string(),
    };
    first_difference("queries", &expected, &parsed)
        .unwrap_or_else(|| "trees differ".to_string())
}

fn first_difference(path: &str, expected: &Value, parsed: &Value) -> Option<String> {
    match (expected, parsed) {
        (Value::Object(e), Value::Object(p)) => {
            let keys: std::collections::BTreeSet<&String> = e.keys().chain(p.keys()).collect();
            keys.into_iter().find_map(|key| {
                let child = format!("{}.{}", path, key);
                first_difference(
                    &child,
                    e.get(key).unwrap_or(&Value::Null),
                    p.get(key).unwrap_or(&Value::Null),
                )
            })
        }
        (Value::Array(e), Value::Array(p)) => {
            let shared = e
                .iter()
                .zip(p)
                .enumerate()
                .find_map(|(i, (a, b))| first_difference(&format!("{}[{}]", path, i), a, b));
            shared.or_else(|| {
                (e.len() != p.len()).then(|| {
                    format!(
                        "{}: expected {} entries, parsed {}",
                        path,
                        e.len(),
                        p.len()
                    )
                })
            })
        }
        (e, p) if e == p => None,
        (e, p) => Some(format!("{}: expected {}, parsed {}", path, e, p)),
    }
}
