/// Block-level symbol table.
///
/// Nodes refer to each other only by variable name: a node declaring
/// `var_name = X` (or binding a facet `X as key`) makes `X` available to
/// every node in the same block. This module walks a block once, records
/// those declarations and checks that every reference resolves.
use std::collections::BTreeSet;

use super::types::*;
use crate::error::RenderError;

/// Names declared anywhere in a block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    declared: BTreeSet<String>,
}

/// A variable reference and the node making it.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Reference<'a> {
    node: &'a str,
    name: &'a str,
}

impl SymbolTable {
    pub fn from_block(queries: &[QueryNode]) -> Self {
        let mut table = SymbolTable::default();
        for query in queries {
            table.declare(query);
        }
        table
    }

    fn declare(&mut self, node: &QueryNode) {
        if !node.var_name.is_empty() {
            self.declared.insert(node.var_name.clone());
        }
        self.declared.extend(node.facet_var.values().cloned());
        for child in &node.children {
            self.declare(child);
        }
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.declared.contains(name)
    }

    /// Every variable referenced in `queries` must be declared somewhere
    /// in the block.
    pub fn check_references(&self, queries: &[QueryNode]) -> Result<(), RenderError> {
        let mut references = Vec::new();
        for query in queries {
            collect_references(query, &mut references);
        }
        match references.into_iter().find(|r| !self.is_declared(r.name)) {
            Some(missing) => Err(RenderError::UndefinedVariable {
                node: missing.node.to_string(),
                name: missing.name.to_string(),
            }),
            None => Ok(()),
        }
    }
}

fn collect_references<'a>(node: &'a QueryNode, out: &mut Vec<Reference<'a>>) {
    let name = node.name();
    let name = if name.is_empty() {
        node.func.as_ref().map(|f| f.name.as_str()).unwrap_or("")
    } else {
        name
    };

    for var in &node.needed_vars {
        out.push(Reference {
            node: name,
            name: &var.name,
        });
    }
    if let Some(func) = &node.func {
        function_references(name, func, out);
    }
    if let Some(filter) = &node.filter {
        filter_references(name, filter, out);
    }
    if let Some(filter) = &node.facets_filter {
        filter_references(name, filter, out);
    }
    if let Some(math) = &node.math_exp {
        math_references(name, math, out);
    }
    for child in &node.children {
        collect_references(child, out);
    }
}

fn function_references<'a>(node: &'a str, func: &'a Function, out: &mut Vec<Reference<'a>>) {
    for var in &func.needed_vars {
        out.push(Reference {
            node,
            name: &var.name,
        });
    }
    for arg in func.args.iter().filter(|a| a.is_value_var) {
        out.push(Reference {
            node,
            name: &arg.value,
        });
    }
}

fn filter_references<'a>(node: &'a str, filter: &'a FilterTree, out: &mut Vec<Reference<'a>>) {
    if let Some(func) = &filter.func {
        function_references(node, func, out);
    }
    for child in &filter.children {
        filter_references(node, child, out);
    }
}

fn math_references<'a>(node: &'a str, math: &'a MathTree, out: &mut Vec<Reference<'a>>) {
    if math.is_operand() && !math.var.is_empty() {
        out.push(Reference {
            node,
            name: &math.var,
        });
    }
    for child in &math.children {
        math_references(node, child, out);
    }
}
