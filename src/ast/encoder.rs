/// Query tree → external parser tree encoder.
///
/// The inverse of [`super::parser`]'s decoding, for handing canonical trees
/// to collaborators that speak the external parser's representation.
use super::foreign;
use super::types::*;

pub fn encode_queries(source: &[QueryNode]) -> Vec<foreign::GraphQuery> {
    source.iter().map(encode_query).collect()
}

pub fn encode_query(source: &QueryNode) -> foreign::GraphQuery {
    foreign::GraphQuery {
        uid: source.ids.clone(),
        attr: source.attr.clone(),
        langs: source.langs.clone(),
        alias: source.alias.clone(),
        is_count: source.is_count,
        is_internal: source.is_internal,
        is_groupby: source.is_groupby,
        var: source.var_name.clone(),
        needs_var: encode_var_contexts(&source.needed_vars),
        func: source.func.as_ref().map(encode_function),
        expand: source.expand.clone(),
        args: source.args.clone(),
        order: source.order.iter().map(encode_order).collect(),
        children: encode_queries(&source.children),
        filter: source.filter.as_ref().map(encode_filter_tree),
        math_exp: source.math_exp.as_ref().map(encode_math_tree),
        normalize: source.normalize,
        recurse: source.recurse,
        cascade: source.cascade,
        ignore_reflex: source.ignore_reflex,
        facets: source.facets.as_ref().map(encode_facet_params),
        facets_filter: source.facets_filter.as_ref().map(encode_filter_tree),
        groupby_attrs: source
            .groupby_attrs
            .iter()
            .map(|g| foreign::GroupByAttr {
                attr: g.attr.clone(),
                alias: g.alias.clone(),
                langs: g.langs.clone(),
            })
            .collect(),
        facet_var: source.facet_var.clone(),
        facet_order: source.facet_order.clone(),
        facet_desc: source.facet_desc,
    }
}

fn encode_function(source: &Function) -> foreign::Function {
    foreign::Function {
        attr: source.attr.clone(),
        lang: source.lang.clone(),
        name: source.name.clone(),
        args: source
            .args
            .iter()
            .map(|a| foreign::Arg {
                value: a.value.clone(),
                is_value_var: a.is_value_var,
                is_graphql_var: a.is_graph_var,
            })
            .collect(),
        uid: source.ids.clone(),
        needs_var: encode_var_contexts(&source.needed_vars),
        is_count: source.is_count,
        is_value_var: source.is_value_var,
    }
}

fn encode_var_contexts(source: &[VarContext]) -> Vec<foreign::VarContext> {
    source
        .iter()
        .map(|v| foreign::VarContext {
            name: v.name.clone(),
            typ: i32::from(v.kind.code()),
        })
        .collect()
}

fn encode_order(source: &Order) -> foreign::Order {
    foreign::Order {
        attr: source.attr.clone(),
        desc: source.desc,
        langs: source.langs.clone(),
    }
}

fn encode_filter_tree(source: &FilterTree) -> foreign::FilterTree {
    foreign::FilterTree {
        op: source.op.clone(),
        child: source.children.iter().map(encode_filter_tree).collect(),
        func: source.func.as_ref().map(encode_function),
    }
}

fn encode_math_tree(source: &MathTree) -> foreign::MathTree {
    foreign::MathTree {
        fn_name: source.fn_name.clone(),
        var: source.var.clone(),
        constant: encode_val(&source.constant),
        val: source
            .val
            .iter()
            .map(|(uid, v)| (*uid, encode_val(v)))
            .collect(),
        child: source.children.iter().map(encode_math_tree).collect(),
    }
}

fn encode_val(source: &Val) -> foreign::Val {
    foreign::Val {
        tid: source.tid,
        value: source.value.clone(),
    }
}

fn encode_facet_params(source: &FacetParams) -> foreign::FacetParams {
    foreign::FacetParams {
        all_keys: source.all_keys,
        param: source
            .param
            .iter()
            .map(|p| foreign::FacetParam {
                key: p.key.clone(),
                alias: p.alias.clone(),
            })
            .collect(),
    }
}
