//! Query tree types for dqltools.
//!
//! This module defines the canonical representation shared by the decoder,
//! the renderer and the proof verifier. The tree is designed to be:
//! - Serializable (the JSON field names are the public wire format)
//! - Immutable-friendly (clone-based transformations)
//! - Self-contained (nodes reference each other only by variable name)

use std::collections::BTreeMap;
use std::num::ParseIntError;

use serde::{Deserialize, Serialize};

fn is_false(value: &bool) -> bool {
    !*value
}

/// A query block: ordered root queries rendered together as one request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryBlock {
    #[serde(default)]
    pub queries: Vec<QueryNode>,
    /// Optional operation name, `query <alias> { ... }`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub alias: String,
    /// Query-language variables (`$name`) mapped to their declared type.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, String>,
}

impl QueryBlock {
    pub fn new(queries: Vec<QueryNode>) -> Self {
        Self {
            queries,
            ..Default::default()
        }
    }
}

/// A single node of the query tree.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryNode {
    #[serde(default, alias = "uid", skip_serializing_if = "Vec::is_empty")]
    pub ids: Vec<u64>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub attr: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub langs: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub alias: String,
    /// Inserted into responses when the store has no value for this node.
    /// Never rendered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_count: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_internal: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_groupby: bool,
    #[serde(default, alias = "var", skip_serializing_if = "String::is_empty")]
    pub var_name: String,
    #[serde(default, alias = "needsVar", skip_serializing_if = "Vec::is_empty")]
    pub needed_vars: Vec<VarContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub func: Option<Function>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub expand: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub args: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order: Vec<Order>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<QueryNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<FilterTree>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub math_exp: Option<MathTree>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub normalize: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub recurse: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub cascade: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub ignore_reflex: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facets: Option<FacetParams>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facets_filter: Option<FilterTree>,
    /// Facet key mapped to the variable it is bound to.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub facet_var: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub facet_order: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub facet_desc: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groupby_attrs: Vec<GroupByAttr>,
}

impl QueryNode {
    /// The key this node's results appear under: the alias, else the attribute.
    pub fn name(&self) -> &str {
        if self.alias.is_empty() {
            &self.attr
        } else {
            &self.alias
        }
    }

    /// Internal nodes render inline (`name: expr`) instead of as a block.
    pub fn renders_internal(&self) -> bool {
        self.is_internal || self.children.is_empty()
    }

    /// Declared variable kinds of this node, keyed by variable name.
    pub fn needed_var_kinds(&self) -> BTreeMap<&str, VarKind> {
        self.needed_vars
            .iter()
            .map(|v| (v.name.as_str(), v.kind))
            .collect()
    }

    /// Clear `default` on this node and all descendants. Defaults have no
    /// textual form, so they must be removed before comparing a tree with
    /// one decoded from rendered text.
    pub fn strip_defaults(mut self) -> Self {
        self.default = None;
        self.children = self
            .children
            .into_iter()
            .map(QueryNode::strip_defaults)
            .collect();
        self
    }
}

/// Kind of a variable referenced by name within a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum VarKind {
    /// Bound to a set of node identifiers (`L as friends`).
    #[default]
    Uid,
    /// Bound to scalar values (`a as age`).
    Value,
    /// Bound to a list of predicates (`l as _predicate_`).
    List,
}

impl VarKind {
    pub fn code(self) -> u8 {
        match self {
            VarKind::Uid => 1,
            VarKind::Value => 2,
            VarKind::List => 3,
        }
    }
}

impl From<VarKind> for u8 {
    fn from(kind: VarKind) -> Self {
        kind.code()
    }
}

impl TryFrom<u8> for VarKind {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(VarKind::Uid),
            2 => Ok(VarKind::Value),
            3 => Ok(VarKind::List),
            other => Err(format!("unknown variable kind {}", other)),
        }
    }
}

/// A variable consumed by a node or function.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VarContext {
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "typ")]
    pub kind: VarKind,
}

impl VarContext {
    pub fn new(name: impl Into<String>, kind: VarKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Generating predicate or expression of a node, or a filter leaf.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Function {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub attr: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub lang: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Arg>,
    #[serde(default, alias = "uid", skip_serializing_if = "Vec::is_empty")]
    pub ids: Vec<u64>,
    #[serde(default, alias = "needsVar", skip_serializing_if = "Vec::is_empty")]
    pub needed_vars: Vec<VarContext>,
    /// `gt(count(friends), 10)`
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_count: bool,
    /// `eq(val(s), 5)`
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_value_var: bool,
}

impl Function {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// A single function argument.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Arg {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,
    /// The argument is `val(value)`.
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_value_var: bool,
    /// The argument names a query variable and renders unquoted.
    #[serde(default, alias = "isGraphQLVar", skip_serializing_if = "is_false")]
    pub is_graph_var: bool,
}

impl Arg {
    pub fn literal(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Default::default()
        }
    }
}

/// Boolean filter tree over function leaves.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterTree {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub op: String,
    #[serde(default, alias = "child", skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FilterTree>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub func: Option<Function>,
}

/// Borrowed view of what a [`FilterTree`] node is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterKind<'a> {
    Leaf(&'a Function),
    Connective {
        op: &'a str,
        children: &'a [FilterTree],
    },
    /// Both an operator and a function are set.
    Ambiguous,
    Empty,
}

impl FilterTree {
    pub fn leaf(func: Function) -> Self {
        Self {
            func: Some(func),
            ..Default::default()
        }
    }

    pub fn connective(op: impl Into<String>, children: Vec<FilterTree>) -> Self {
        Self {
            op: op.into(),
            children,
            func: None,
        }
    }

    pub fn kind(&self) -> FilterKind<'_> {
        match (&self.func, self.op.is_empty()) {
            (Some(_), false) => FilterKind::Ambiguous,
            (Some(func), true) => FilterKind::Leaf(func),
            (None, false) => FilterKind::Connective {
                op: &self.op,
                children: &self.children,
            },
            (None, true) => FilterKind::Empty,
        }
    }
}

/// Prefix-form math expression.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MathTree {
    /// Operator or function name; empty for operands.
    #[serde(default, rename = "fn", skip_serializing_if = "String::is_empty")]
    pub fn_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub var: String,
    #[serde(default, rename = "const", skip_serializing_if = "Val::is_empty")]
    pub constant: Val,
    /// Per-identifier values, populated only while executing.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub val: BTreeMap<u64, Val>,
    #[serde(default, alias = "child", skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MathTree>,
}

impl MathTree {
    pub fn is_operand(&self) -> bool {
        self.fn_name.is_empty()
    }

    pub fn var(name: impl Into<String>) -> Self {
        Self {
            var: name.into(),
            ..Default::default()
        }
    }

    pub fn constant(value: impl Into<serde_json::Value>) -> Self {
        Self {
            constant: Val {
                tid: FLOAT_TYPE_ID,
                value: value.into(),
            },
            ..Default::default()
        }
    }

    pub fn apply(fn_name: impl Into<String>, children: Vec<MathTree>) -> Self {
        Self {
            fn_name: fn_name.into(),
            children,
            ..Default::default()
        }
    }
}

/// Type id of the float constants math operands are parsed into.
pub const FLOAT_TYPE_ID: i32 = 4;

/// A typed scalar.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Val {
    #[serde(default, skip_serializing_if = "is_zero")]
    pub tid: i32,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub value: serde_json::Value,
}

fn is_zero(value: &i32) -> bool {
    *value == 0
}

impl Val {
    pub fn is_empty(&self) -> bool {
        self.tid == 0 && self.value.is_null()
    }
}

/// Ordering clause.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Order {
    #[serde(default)]
    pub attr: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub desc: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub langs: Vec<String>,
}

impl Order {
    pub fn asc(attr: impl Into<String>) -> Self {
        Self {
            attr: attr.into(),
            ..Default::default()
        }
    }

    pub fn desc(attr: impl Into<String>) -> Self {
        Self {
            attr: attr.into(),
            desc: true,
            langs: Vec::new(),
        }
    }

    pub fn direction(&self) -> &'static str {
        if self.desc {
            "orderdesc"
        } else {
            "orderasc"
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetParams {
    #[serde(default, skip_serializing_if = "is_false")]
    pub all_keys: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub param: Vec<FacetParam>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FacetParam {
    #[serde(default)]
    pub key: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub alias: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GroupByAttr {
    #[serde(default)]
    pub attr: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub alias: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub langs: Vec<String>,
}

/// Render a node identifier as `0x`-prefixed hex, at least two digits.
pub fn format_uid(uid: u64) -> String {
    format!("0x{:02x}", uid)
}

/// Parse a node identifier as the store reports it: `0x`/`0o`/`0b`
/// prefixed or plain decimal.
pub fn parse_uid(text: &str) -> Result<u64, ParseIntError> {
    let text = text.trim();
    let (digits, radix) = match text.get(..2) {
        Some("0x") | Some("0X") => (&text[2..], 16),
        Some("0o") | Some("0O") => (&text[2..], 8),
        Some("0b") | Some("0B") => (&text[2..], 2),
        _ => (text, 10),
    };
    u64::from_str_radix(digits, radix)
}
