/// Filter tree rendering, shared by `@filter(...)` and `@facets(<filter>)`.
use super::compiler::{encode_args, encode_needed_vars, format_attribute, function_lang};
use super::types::*;
use crate::error::RenderError;

/// Connectives written prefix, `not (a(x))` rather than `(a(x) not b(y))`.
const PREFIX_CONNECTIVES: [&str; 2] = ["not", "eq"];

/// Render a filter tree without the surrounding directive.
pub fn render_filter_tree(node: &str, tree: &FilterTree) -> Result<String, RenderError> {
    match tree.kind() {
        FilterKind::Leaf(func) => render_leaf(node, func),
        FilterKind::Connective { op, children } => {
            if children.is_empty() {
                return Err(RenderError::EmptyConnective {
                    node: node.to_string(),
                    op: op.to_string(),
                });
            }
            let rendered = children
                .iter()
                .map(|child| render_filter_tree(node, child))
                .collect::<Result<Vec<_>, _>>()?;
            if PREFIX_CONNECTIVES.contains(&op) {
                Ok(format!("{} ({})", op, rendered.join(", ")))
            } else {
                Ok(format!("({})", rendered.join(&format!(" {} ", op))))
            }
        }
        FilterKind::Ambiguous => Err(RenderError::AmbiguousFilter {
            node: node.to_string(),
            op: tree.op.clone(),
        }),
        FilterKind::Empty => Err(RenderError::EmptyConnective {
            node: node.to_string(),
            op: String::new(),
        }),
    }
}

fn render_leaf(node: &str, func: &Function) -> Result<String, RenderError> {
    let empty = || RenderError::EmptyFunction {
        node: node.to_string(),
        function: func.name.clone(),
    };

    let Some(args) = encode_args(func) else {
        if !func.ids.is_empty() {
            let mut refs: Vec<String> = func.ids.iter().copied().map(format_uid).collect();
            refs.extend(func.needed_vars.iter().map(|v| v.name.clone()));
            return Ok(format!("{}({})", func.name, refs.join(", ")));
        }
        if !func.attr.is_empty() {
            return Ok(format!(
                "{}({}{})",
                func.name,
                format_attribute(&func.attr),
                function_lang(func)
            ));
        }
        if !func.needed_vars.is_empty() {
            return Ok(format!(
                "{}({})",
                func.name,
                encode_needed_vars(&func.needed_vars, true).join(", ")
            ));
        }
        return Err(empty());
    };

    if !func.attr.is_empty() {
        let attr = if func.is_value_var {
            format!("val({})", format_attribute(&func.attr))
        } else {
            format_attribute(&func.attr)
        };
        if func.is_count {
            return Ok(format!("{}(count({}), {})", func.name, attr, args));
        }
        return Ok(format!("{}({}{}, {})", func.name, attr, function_lang(func), args));
    }

    if !func.needed_vars.is_empty() {
        let raw: Vec<&str> = func.args.iter().map(|a| a.value.as_str()).collect();
        return Ok(format!(
            "{}({}, {})",
            func.name,
            encode_needed_vars(&func.needed_vars, true).join(", "),
            raw.join(", ")
        ));
    }

    Err(empty())
}
