/// Math expression rendering: prefix tree → `math(<infix>)`.
use super::types::*;
use crate::error::RenderError;

/// Operators written as function calls instead of infix.
fn call_form(fn_name: &str) -> Option<&'static str> {
    match fn_name {
        "u-" => Some("-"),
        "ln" => Some("ln"),
        "exp" => Some("exp"),
        "max" => Some("max"),
        "sqrt" => Some("sqrt"),
        "cond" => Some("cond"),
        _ => None,
    }
}

pub fn render_math(node: &str, tree: &MathTree) -> Result<String, RenderError> {
    Ok(format!("math{}", brace(&to_infix(node, tree)?)))
}

fn to_infix(node: &str, tree: &MathTree) -> Result<String, RenderError> {
    if tree.is_operand() {
        return operand(node, tree);
    }
    if tree.children.is_empty() {
        return Err(RenderError::EmptyMathOperator {
            node: node.to_string(),
            op: tree.fn_name.clone(),
        });
    }

    let children = tree
        .children
        .iter()
        .map(|child| to_infix(node, child))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(match call_form(&tree.fn_name) {
        // Unary minus binds to a single operand: `-a`, `-(a+b)`.
        Some("-") => format!("-{}", children.join(",")),
        Some(name) => format!("{}({})", name, children.join(",")),
        None => format!("({})", children.join(&tree.fn_name)),
    })
}

fn operand(node: &str, tree: &MathTree) -> Result<String, RenderError> {
    if !tree.constant.is_empty() {
        return Ok(match &tree.constant.value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        });
    }
    if !tree.var.is_empty() {
        return Ok(tree.var.clone());
    }
    Err(RenderError::EmptyMathOperand {
        node: node.to_string(),
    })
}

/// Wrap in parentheses unless the outermost pair already encloses the
/// whole text.
fn brace(text: &str) -> String {
    if encloses(text) {
        text.to_string()
    } else {
        format!("({})", text)
    }
}

fn encloses(text: &str) -> bool {
    if !text.starts_with('(') || !text.ends_with(')') {
        return false;
    }
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return i == text.len() - 1;
                }
            }
            _ => {}
        }
    }
    false
}
