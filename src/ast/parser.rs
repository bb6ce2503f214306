/// External parse result → query tree decoder.
///
/// Translates the external parser's native tree into our canonical tree.
/// Parsing itself is delegated to a [`QueryParser`]; this module decouples
/// our tree from that representation, so the two can evolve independently.
use std::collections::BTreeMap;

use super::adapter::QueryParser;
use super::foreign;
use super::types::*;
use crate::error::ParseError;

/// Parse query text through `parser` and decode the result.
pub async fn parse_block<P: QueryParser>(
    parser: &P,
    text: &str,
    variables: &BTreeMap<String, String>,
) -> Result<Vec<QueryNode>, ParseError> {
    let parsed = parser.parse(text, variables).await?;
    Ok(decode_queries(parsed))
}

pub fn decode_queries(source: Vec<foreign::GraphQuery>) -> Vec<QueryNode> {
    source.into_iter().map(decode_query).collect()
}

pub fn decode_query(source: foreign::GraphQuery) -> QueryNode {
    QueryNode {
        ids: source.uid,
        attr: source.attr,
        langs: source.langs,
        alias: source.alias,
        default: None,
        is_count: source.is_count,
        is_internal: source.is_internal,
        is_groupby: source.is_groupby,
        var_name: source.var,
        needed_vars: decode_var_contexts(source.needs_var),
        func: source.func.map(decode_function),
        expand: source.expand,
        args: source.args,
        order: source.order.into_iter().map(decode_order).collect(),
        children: decode_queries(source.children),
        filter: source.filter.map(decode_filter_tree),
        math_exp: source.math_exp.map(decode_math_tree),
        normalize: source.normalize,
        recurse: source.recurse,
        cascade: source.cascade,
        ignore_reflex: source.ignore_reflex,
        facets: source.facets.map(decode_facet_params),
        facets_filter: source.facets_filter.map(decode_filter_tree),
        facet_var: source.facet_var,
        facet_order: source.facet_order,
        facet_desc: source.facet_desc,
        groupby_attrs: source
            .groupby_attrs
            .into_iter()
            .map(decode_group_by_attr)
            .collect(),
    }
}

fn decode_function(source: foreign::Function) -> Function {
    Function {
        attr: source.attr,
        lang: source.lang,
        name: source.name,
        args: source.args.into_iter().map(decode_arg).collect(),
        ids: source.uid,
        needed_vars: decode_var_contexts(source.needs_var),
        is_count: source.is_count,
        is_value_var: source.is_value_var,
    }
}

fn decode_arg(source: foreign::Arg) -> Arg {
    Arg {
        value: source.value,
        is_value_var: source.is_value_var,
        is_graph_var: source.is_graphql_var,
    }
}

fn decode_var_contexts(source: Vec<foreign::VarContext>) -> Vec<VarContext> {
    source
        .into_iter()
        .map(|v| VarContext {
            name: v.name,
            kind: decode_var_kind(v.typ),
        })
        .collect()
}

/// Kinds the parser leaves unset are identifier variables.
fn decode_var_kind(typ: i32) -> VarKind {
    match typ {
        2 => VarKind::Value,
        3 => VarKind::List,
        _ => VarKind::Uid,
    }
}

fn decode_order(source: foreign::Order) -> Order {
    Order {
        attr: source.attr,
        desc: source.desc,
        langs: source.langs,
    }
}

fn decode_filter_tree(source: foreign::FilterTree) -> FilterTree {
    FilterTree {
        op: source.op,
        children: source.child.into_iter().map(decode_filter_tree).collect(),
        func: source.func.map(decode_function),
    }
}

fn decode_math_tree(source: foreign::MathTree) -> MathTree {
    MathTree {
        fn_name: source.fn_name,
        var: source.var,
        constant: decode_val(source.constant),
        val: source
            .val
            .into_iter()
            .map(|(uid, v)| (uid, decode_val(v)))
            .collect(),
        children: source.child.into_iter().map(decode_math_tree).collect(),
    }
}

fn decode_val(source: foreign::Val) -> Val {
    Val {
        tid: source.tid,
        value: source.value,
    }
}

fn decode_facet_params(source: foreign::FacetParams) -> FacetParams {
    FacetParams {
        all_keys: source.all_keys,
        param: source
            .param
            .into_iter()
            .map(|p| FacetParam {
                key: p.key,
                alias: p.alias,
            })
            .collect(),
    }
}

fn decode_group_by_attr(source: foreign::GroupByAttr) -> GroupByAttr {
    GroupByAttr {
        attr: source.attr,
        alias: source.alias,
        langs: source.langs,
    }
}
