/// `@facets` directives.
///
/// A node's facet request is spread over several fields: the requested
/// keys, key→variable bindings and one optional order key. They merge into
/// a single `@facets(...)` clause.
use super::filter::render_filter_tree;
use super::types::*;
use crate::error::RenderError;

/// `@facets(<filter>)` for nodes filtered on facet values.
pub fn render_facets_filter(node: &str, query: &QueryNode) -> Result<Option<String>, RenderError> {
    match &query.facets_filter {
        Some(tree) => Ok(Some(format!("@facets({})", render_filter_tree(node, tree)?))),
        None => Ok(None),
    }
}

pub fn render_facets(query: &QueryNode) -> Option<String> {
    let params = query.facets.as_ref()?;
    if params.all_keys {
        return Some("@facets".to_string());
    }

    let mut arguments = Vec::new();
    arguments.extend(encode_order(query));
    arguments.extend(encode_bindings(query));
    arguments.extend(encode_params(query, params));

    if arguments.is_empty() {
        if query.children.is_empty() {
            return Some("@facets() { }".to_string());
        }
        return Some("@facets()".to_string());
    }
    Some(format!("@facets({})", arguments.join(", ")))
}

fn encode_order(query: &QueryNode) -> Option<String> {
    if query.facet_order.is_empty() {
        return None;
    }
    let direction = if query.facet_desc {
        "orderdesc"
    } else {
        "orderasc"
    };
    let key = match query.facet_var.get(&query.facet_order) {
        Some(var) => format!("{} as {}", var, query.facet_order),
        None => query.facet_order.clone(),
    };
    Some(format!("{}: {}", direction, key))
}

/// `var as key`, except for the order key which binds in the order clause.
fn encode_bindings(query: &QueryNode) -> Vec<String> {
    query
        .facet_var
        .iter()
        .filter(|(key, _)| **key != query.facet_order)
        .map(|(key, var)| format!("{} as {}", var, key))
        .collect()
}

fn encode_params(query: &QueryNode, params: &FacetParams) -> Vec<String> {
    params
        .param
        .iter()
        .filter(|p| !query.facet_var.contains_key(&p.key) && p.key != query.facet_order)
        .map(|p| {
            if p.alias.is_empty() {
                p.key.clone()
            } else {
                format!("{}: {}", p.alias, p.key)
            }
        })
        .collect()
}
