//! The external parser's native tree.
//!
//! The authoritative grammar lives outside this crate and reports its parse
//! result as JSON laid out like its own exported structures. These types
//! mirror that layout and nothing else; [`super::parser`] and
//! [`super::encoder`] map them to and from the canonical tree.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// `null` and absent collections both decode to empty.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GraphQuery {
    #[serde(rename = "UID", default, deserialize_with = "nullable")]
    pub uid: Vec<u64>,
    #[serde(default)]
    pub attr: String,
    #[serde(default, deserialize_with = "nullable")]
    pub langs: Vec<String>,
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub is_count: bool,
    #[serde(default)]
    pub is_internal: bool,
    #[serde(default)]
    pub is_groupby: bool,
    #[serde(default)]
    pub var: String,
    #[serde(default, deserialize_with = "nullable")]
    pub needs_var: Vec<VarContext>,
    #[serde(default)]
    pub func: Option<Function>,
    #[serde(default)]
    pub expand: String,
    #[serde(default, deserialize_with = "nullable")]
    pub args: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "nullable")]
    pub order: Vec<Order>,
    #[serde(default, deserialize_with = "nullable")]
    pub children: Vec<GraphQuery>,
    #[serde(default)]
    pub filter: Option<FilterTree>,
    #[serde(default)]
    pub math_exp: Option<MathTree>,
    #[serde(default)]
    pub normalize: bool,
    #[serde(default)]
    pub recurse: bool,
    #[serde(default)]
    pub cascade: bool,
    #[serde(default)]
    pub ignore_reflex: bool,
    #[serde(default)]
    pub facets: Option<FacetParams>,
    #[serde(default)]
    pub facets_filter: Option<FilterTree>,
    #[serde(default, deserialize_with = "nullable")]
    pub groupby_attrs: Vec<GroupByAttr>,
    #[serde(default, deserialize_with = "nullable")]
    pub facet_var: BTreeMap<String, String>,
    #[serde(default)]
    pub facet_order: String,
    #[serde(default)]
    pub facet_desc: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Function {
    #[serde(default)]
    pub attr: String,
    #[serde(default)]
    pub lang: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub args: Vec<Arg>,
    #[serde(rename = "UID", default, deserialize_with = "nullable")]
    pub uid: Vec<u64>,
    #[serde(default, deserialize_with = "nullable")]
    pub needs_var: Vec<VarContext>,
    #[serde(default)]
    pub is_count: bool,
    #[serde(default)]
    pub is_value_var: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Arg {
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub is_value_var: bool,
    #[serde(rename = "IsGraphQLVar", default)]
    pub is_graphql_var: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VarContext {
    #[serde(default)]
    pub name: String,
    /// 1 for identifier variables, 2 for value variables, 3 for lists.
    #[serde(default)]
    pub typ: i32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FilterTree {
    #[serde(default)]
    pub op: String,
    #[serde(default, deserialize_with = "nullable")]
    pub child: Vec<FilterTree>,
    #[serde(default)]
    pub func: Option<Function>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MathTree {
    #[serde(rename = "Fn", default)]
    pub fn_name: String,
    #[serde(default)]
    pub var: String,
    #[serde(rename = "Const", default)]
    pub constant: Val,
    #[serde(default, deserialize_with = "nullable")]
    pub val: BTreeMap<u64, Val>,
    #[serde(default, deserialize_with = "nullable")]
    pub child: Vec<MathTree>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Val {
    #[serde(default)]
    pub tid: i32,
    #[serde(default)]
    pub value: serde_json::Value,
}

/// Orders and facet params come from the store's protobuf messages and use
/// their JSON names.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Order {
    #[serde(default)]
    pub attr: String,
    #[serde(default)]
    pub desc: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub langs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FacetParams {
    #[serde(default)]
    pub all_keys: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub param: Vec<FacetParam>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FacetParam {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub alias: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GroupByAttr {
    #[serde(default)]
    pub attr: String,
    #[serde(default)]
    pub alias: String,
    #[serde(default, deserialize_with = "nullable")]
    pub langs: Vec<String>,
}
