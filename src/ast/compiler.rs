/// Query tree → query text renderer.
///
/// Converts a [`QueryBlock`] into text the external parser accepts. The
/// validator parses that text back and compares trees, so every field the
/// parser reports must survive rendering.
use super::facets;
use super::filter;
use super::formatter::{indent, normalize_whitespace};
use super::math;
use super::symbols::SymbolTable;
use super::types::*;
use crate::error::RenderError;

/// Render a query block to normalized query text.
pub fn render(block: &QueryBlock) -> Result<String, RenderError> {
    SymbolTable::from_block(&block.queries).check_references(&block.queries)?;

    let mut lines = vec![block_header(block)];
    for query in &block.queries {
        render_root(query, 1, &mut lines)?;
    }
    lines.push("}".to_string());

    let text = normalize_whitespace(&lines.join("\n"));
    tracing::trace!(
        queries = block.queries.len(),
        bytes = text.len(),
        "rendered query block"
    );
    Ok(text)
}

fn block_header(block: &QueryBlock) -> String {
    let operation = if block.alias.is_empty() {
        "query".to_string()
    } else {
        format!("query {}", block.alias)
    };
    if !block.variables.is_empty() {
        let declared: Vec<String> = block
            .variables
            .iter()
            .map(|(name, kind)| format!("{}: {}", name, kind))
            .collect();
        return format!("{}({}) {{", operation, declared.join(", "));
    }
    if !block.alias.is_empty() {
        return format!("{} {{", operation);
    }
    "{".to_string()
}

/// Roots always open a block, even without children.
fn render_root(node: &QueryNode, depth: usize, out: &mut Vec<String>) -> Result<(), RenderError> {
    let name = node.name();
    if name.is_empty() {
        return Err(RenderError::UnnamedBlock);
    }

    let mut clauses = Vec::new();
    if let Some(func) = &node.func {
        clauses.push(format!("func: {}", render_func_body(node, func)?));
    }
    clauses.extend(render_orders(node));
    clauses.extend(render_args(node));

    let mut line = format!(
        "{}{}{}({})",
        indent(depth),
        var_prefix(node),
        name,
        clauses.join(", ")
    );
    push_directives(node, true, &mut line)?;
    line.push_str(" {");
    out.push(line);

    for child in &node.children {
        render_child(child, depth + 1, out)?;
    }
    out.push(format!("{}}}", indent(depth)));
    Ok(())
}

fn render_child(node: &QueryNode, depth: usize, out: &mut Vec<String>) -> Result<(), RenderError> {
    let mut line = format!("{}{}", indent(depth), var_prefix(node));
    let mut filter_inline = false;

    if let Some(func) = &node.func {
        line.push_str(&alias_prefix(node));
        if func.name == "checkpwd" {
            line.push_str(&render_check_pwd(node, func)?);
        } else {
            line.push_str(&render_func_body(node, func)?);
        }
    } else if let Some(tree) = &node.math_exp {
        line.push_str(&alias_prefix(node));
        line.push_str(&math::render_math(label(node), tree)?);
    } else if node.is_count {
        line.push_str(&alias_prefix(node));
        line.push_str(&render_count(node)?);
        filter_inline = true;
    } else if node.attr == "val" && !node.needed_vars.is_empty() {
        line.push_str(&alias_prefix(node));
        let names: Vec<&str> = node.needed_vars.iter().map(|v| v.name.as_str()).collect();
        line.push_str(&format!("val({})", names.join(", ")));
    } else {
        line.push_str(&render_attribute(node)?);
    }

    push_directives(node, !filter_inline, &mut line)?;

    if node.renders_internal() {
        out.push(line);
        return Ok(());
    }

    line.push_str(" {");
    out.push(line);
    for child in &node.children {
        render_child(child, depth + 1, out)?;
    }
    out.push(format!("{}}}", indent(depth)));
    Ok(())
}

fn push_directives(
    node: &QueryNode,
    with_filter: bool,
    line: &mut String,
) -> Result<(), RenderError> {
    let mut directives = Vec::new();
    if with_filter {
        directives.extend(filter_directive(node)?);
    }
    directives.extend(facets::render_facets_filter(label(node), node)?);
    directives.extend(facets::render_facets(node));
    directives.extend(render_group_by(node));
    if node.normalize {
        directives.push("@normalize".to_string());
    }
    if node.cascade {
        directives.push("@cascade".to_string());
    }
    if node.recurse {
        directives.push("@recurse".to_string());
    }
    if node.ignore_reflex {
        directives.push("@ignorereflex".to_string());
    }
    for directive in directives {
        line.push(' ');
        line.push_str(&directive);
    }
    Ok(())
}

fn filter_directive(node: &QueryNode) -> Result<Option<String>, RenderError> {
    match &node.filter {
        Some(tree) if tree.kind() != FilterKind::Empty => Ok(Some(format!(
            "@filter({})",
            filter::render_filter_tree(label(node), tree)?
        ))),
        _ => Ok(None),
    }
}

/// Name used in error messages: the result name, else the function name.
pub(super) fn label(node: &QueryNode) -> &str {
    let name = node.name();
    if name.is_empty() {
        node.func.as_ref().map(|f| f.name.as_str()).unwrap_or_default()
    } else {
        name
    }
}

fn var_prefix(node: &QueryNode) -> String {
    if node.var_name.is_empty() {
        String::new()
    } else {
        format!("{} as ", node.var_name)
    }
}

fn alias_prefix(node: &QueryNode) -> String {
    if node.alias.is_empty() {
        String::new()
    } else {
        format!("{}: ", node.alias)
    }
}

/// `name(...)` for the function generating a node.
fn render_func_body(node: &QueryNode, func: &Function) -> Result<String, RenderError> {
    if func.name.is_empty() {
        return Err(RenderError::EmptyFunction {
            node: label(node).to_string(),
            function: String::new(),
        });
    }

    let arguments = if !node.ids.is_empty() && func.args.is_empty() {
        let mut ids: Vec<String> = node.ids.iter().copied().map(format_uid).collect();
        ids.extend(func.needed_vars.iter().map(|v| v.name.clone()));
        ids.join(", ")
    } else if let Some(args) = encode_args(func) {
        args
    } else {
        encode_needed_vars(&func.needed_vars, node.attr.is_empty()).join(", ")
    };

    if !node.attr.is_empty() {
        if arguments.is_empty() {
            return Ok(format!(
                "{}({}{})",
                func.name,
                format_attribute(&node.attr),
                render_langs(&node.langs)
            ));
        }
        return Ok(format!("{}({}({}))", func.name, node.attr, arguments));
    }

    if !func.attr.is_empty() {
        if func.is_count {
            return Ok(format!(
                "{}(count({}), {})",
                func.name,
                format_attribute(&func.attr),
                arguments
            ));
        }
        let attr = format!("{}{}", format_attribute(&func.attr), function_lang(func));
        if arguments.is_empty() {
            return Ok(format!("{}({})", func.name, attr));
        }
        return Ok(format!("{}({}, {})", func.name, attr, arguments));
    }

    Ok(format!("{}({})", func.name, arguments))
}

fn render_check_pwd(node: &QueryNode, func: &Function) -> Result<String, RenderError> {
    if func.attr.is_empty() {
        return Err(RenderError::EmptyFunction {
            node: label(node).to_string(),
            function: func.name.clone(),
        });
    }
    match func.args.as_slice() {
        [password] => Ok(format!(
            "checkpwd({}, {})",
            format_attribute(&func.attr),
            quote(&password.value)
        )),
        other => Err(RenderError::CheckPwdArity {
            node: label(node).to_string(),
            found: other.len(),
        }),
    }
}

/// `count(attr[@langs][(args)][ @filter(...)])`
fn render_count(node: &QueryNode) -> Result<String, RenderError> {
    let mut inner = format!(
        "{}{}{}",
        format_attribute(&node.attr),
        render_langs(&node.langs),
        render_attribute_args(node)
    );
    if let Some(directive) = filter_directive(node)? {
        inner.push(' ');
        inner.push_str(&directive);
    }
    Ok(format!("count({})", inner))
}

/// `[alias: ]attr[@langs][(args, orders)][(expand)]`
fn render_attribute(node: &QueryNode) -> Result<String, RenderError> {
    if node.attr.is_empty() {
        if node.alias.is_empty() {
            return Err(RenderError::UnnamedBlock);
        }
        return Ok(format!("{}()", node.alias));
    }

    Ok(format!(
        "{}{}{}{}{}",
        alias_prefix(node),
        format_attribute(&node.attr),
        render_langs(&node.langs),
        render_attribute_args(node),
        render_expand(node)
    ))
}

fn render_attribute_args(node: &QueryNode) -> String {
    let mut clauses = render_args(node);
    clauses.extend(render_orders(node));
    if clauses.is_empty() {
        String::new()
    } else {
        format!("({})", clauses.join(", "))
    }
}

fn render_expand(node: &QueryNode) -> String {
    if node.expand.is_empty() {
        return String::new();
    }
    if node.needed_vars.is_empty() {
        return format!("({})", node.expand);
    }
    format!("({})", encode_needed_vars(&node.needed_vars, true).join(", "))
}

fn render_args(node: &QueryNode) -> Vec<String> {
    node.args
        .iter()
        .map(|(key, value)| format!("{}: {}", key, value))
        .collect()
}

fn render_orders(node: &QueryNode) -> Vec<String> {
    let kinds = node.needed_var_kinds();
    node.order
        .iter()
        .map(|order| match kinds.get(order.attr.as_str()) {
            Some(kind) => format!(
                "{}: val({})",
                order.direction(),
                encode_var(&order.attr, *kind)
            ),
            None => format!(
                "{}: {}{}",
                order.direction(),
                order.attr,
                render_langs(&order.langs)
            ),
        })
        .collect()
}

/// Identifier variables whose name is numeric are written as identifiers.
fn encode_var(name: &str, kind: VarKind) -> String {
    match (kind, name.parse::<u64>()) {
        (VarKind::Uid, Ok(uid)) => format_uid(uid),
        _ => name.to_string(),
    }
}

fn render_group_by(node: &QueryNode) -> Option<String> {
    if node.groupby_attrs.is_empty() {
        return None;
    }
    let attrs: Vec<String> = node
        .groupby_attrs
        .iter()
        .map(|g| {
            let alias = if g.alias.is_empty() {
                String::new()
            } else {
                format!("{}: ", g.alias)
            };
            format!("{}{}{}", alias, g.attr, render_langs(&g.langs))
        })
        .collect();
    Some(format!("@groupby({})", attrs.join(", ")))
}

pub(super) fn function_lang(func: &Function) -> String {
    if func.lang.is_empty() {
        String::new()
    } else {
        format!("@{}", func.lang)
    }
}

pub(super) fn render_langs(langs: &[String]) -> String {
    if langs.is_empty() {
        String::new()
    } else {
        format!("@{}", langs.join(":"))
    }
}

/// Attributes that are absolute URIs are written `<uri>`.
pub(super) fn format_attribute(attr: &str) -> String {
    match url::Url::parse(attr) {
        Ok(_) => format!("<{}>", attr),
        Err(_) => attr.to_string(),
    }
}

/// Double-quoted literal. Line breaks and tabs are escaped so the text
/// survives line splitting and whitespace normalization unchanged.
pub(super) fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

/// Variable names; value and list variables become `val(name)` when
/// `annotate` is set.
pub(super) fn encode_needed_vars(vars: &[VarContext], annotate: bool) -> Vec<String> {
    vars.iter()
        .map(|v| match v.kind {
            VarKind::Value | VarKind::List if annotate => format!("val({})", v.name),
            _ => v.name.clone(),
        })
        .collect()
}

/// Function arguments, or `None` when the function has none. An empty
/// literal is still an argument and renders as `""`.
pub(super) fn encode_args(func: &Function) -> Option<String> {
    let (first, rest) = func.args.split_first()?;

    if func.name == "regexp" {
        let mut encoded = format!("/{}/", first.value.replace('/', "\\/"));
        for flags in rest {
            encoded.push_str(&flags.value);
        }
        return Some(encoded);
    }

    let encoded: Vec<String> = func
        .args
        .iter()
        .map(|arg| {
            if arg.is_value_var {
                format!("val({})", arg.value)
            } else if arg.is_graph_var || func.is_value_var {
                arg.value.clone()
            } else {
                quote(&arg.value)
            }
        })
        .collect();
    Some(encoded.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn attr(name: &str) -> QueryNode {
        QueryNode {
            attr: name.into(),
            ..Default::default()
        }
    }

    fn uid_root(alias: &str, ids: Vec<u64>, children: Vec<QueryNode>) -> QueryNode {
        QueryNode {
            alias: alias.into(),
            ids,
            func: Some(Function::named("uid")),
            children,
            ..Default::default()
        }
    }

    fn render_one(node: QueryNode) -> String {
        render(&QueryBlock::new(vec![node])).unwrap()
    }

    #[test]
    fn test_render_simple_block() {
        let text = render_one(uid_root(
            "bladerunner",
            vec![0x107b2c],
            vec![
                attr("uid"),
                QueryNode {
                    langs: vec!["en".into()],
                    ..attr("name")
                },
                attr("initial_release_date"),
            ],
        ));
        assert_eq!(
            text,
            "{\n    bladerunner(func: uid(0x107b2c)) {\n        uid\n        name@en\n        initial_release_date\n    }\n}"
        );
    }

    #[test]
    fn test_block_header_forms() {
        let mut block = QueryBlock::new(vec![uid_root("me", vec![1], vec![])]);
        assert!(render(&block).unwrap().starts_with("{\n"));

        block.alias = "me".into();
        assert!(render(&block).unwrap().starts_with("query me {\n"));

        block.variables = BTreeMap::from([("$version".to_string(), "string".to_string())]);
        assert!(render(&block)
            .unwrap()
            .starts_with("query me($version: string) {\n"));

        block.alias.clear();
        assert!(render(&block)
            .unwrap()
            .starts_with("query($version: string) {\n"));
    }

    #[test]
    fn test_root_without_children_keeps_block() {
        let text = render_one(uid_root("me", vec![1], vec![]));
        assert_eq!(text, "{\n    me(func: uid(0x01)) {\n    }\n}");
    }

    #[test]
    fn test_unnamed_root_is_error() {
        let node = QueryNode {
            func: Some(Function::named("uid")),
            ids: vec![1],
            ..Default::default()
        };
        assert_eq!(
            render(&QueryBlock::new(vec![node])),
            Err(RenderError::UnnamedBlock)
        );
    }

    #[test]
    fn test_root_orders_and_args() {
        let mut node = uid_root("me", vec![1], vec![attr("name")]);
        node.order = vec![
            Order {
                attr: "name".into(),
                desc: false,
                langs: vec!["en".into(), "fr".into(), ".".into()],
            },
            Order::desc("lastname"),
        ];
        node.args.insert("first".into(), "5".into());
        let text = render_one(node);
        assert!(text.contains(
            "me(func: uid(0x01), orderasc: name@en:fr:., orderdesc: lastname, first: 5) {"
        ));
    }

    #[test]
    fn test_order_on_value_variable() {
        let var_root = QueryNode {
            alias: "var".into(),
            ids: vec![1],
            func: Some(Function::named("uid")),
            children: vec![QueryNode {
                var_name: "n".into(),
                ..attr("name")
            }],
            ..Default::default()
        };
        let mut me = QueryNode {
            alias: "me".into(),
            needed_vars: vec![VarContext::new("n", VarKind::Value)],
            func: Some(Function {
                name: "uid".into(),
                needed_vars: vec![VarContext::new("n", VarKind::Value)],
                ..Default::default()
            }),
            children: vec![attr("name")],
            ..Default::default()
        };
        me.order.push(Order::asc("n"));
        let text = render(&QueryBlock::new(vec![var_root, me])).unwrap();
        assert!(text.contains("orderasc: val(n)"));
        assert!(!text.contains("orderasc: n"));
        assert!(text.contains("n as name"));
    }

    #[test]
    fn test_encode_var_hex_for_numeric_identifier_names() {
        assert_eq!(encode_var("10", VarKind::Uid), "0x0a");
        assert_eq!(encode_var("L", VarKind::Uid), "L");
        assert_eq!(encode_var("10", VarKind::Value), "10");
    }

    #[test]
    fn test_func_body_with_attribute_and_lang() {
        let node = QueryNode {
            alias: "ab".into(),
            func: Some(Function {
                name: "eq".into(),
                attr: "name".into(),
                lang: "en".into(),
                args: vec![Arg::literal("$pringfield (or, How)")],
                ..Default::default()
            }),
            children: vec![attr("uid")],
            ..Default::default()
        };
        assert!(render_one(node).contains(r#"ab(func: eq(name@en, "$pringfield (or, How)")) {"#));
    }

    #[test]
    fn test_func_body_count() {
        let node = QueryNode {
            alias: "me".into(),
            func: Some(Function {
                name: "gt".into(),
                attr: "friend".into(),
                is_count: true,
                args: vec![Arg::literal("10")],
                ..Default::default()
            }),
            children: vec![attr("name")],
            ..Default::default()
        };
        assert!(render_one(node).contains(r#"me(func: gt(count(friend), "10")) {"#));
    }

    #[test]
    fn test_func_body_attribute_without_args() {
        let node = QueryNode {
            alias: "me".into(),
            func: Some(Function {
                name: "has".into(),
                attr: "name".into(),
                lang: "en".into(),
                ..Default::default()
            }),
            children: vec![attr("name")],
            ..Default::default()
        };
        assert!(render_one(node).contains("me(func: has(name@en)) {"));
    }

    #[test]
    fn test_uri_attribute_bracketed() {
        let node = QueryNode {
            alias: "me".into(),
            func: Some(Function {
                name: "anyofterms".into(),
                attr: "http://helloworld.com/how/are/you".into(),
                args: vec![Arg::literal("good better bad")],
                ..Default::default()
            }),
            children: vec![attr("http://verygood.com/what/about/you")],
            ..Default::default()
        };
        let text = render_one(node);
        assert!(text.contains(
            r#"me(func: anyofterms(<http://helloworld.com/how/are/you>, "good better bad")) {"#
        ));
        assert!(text.contains("        <http://verygood.com/what/about/you>\n"));
    }

    #[test]
    fn test_plain_attributes_not_bracketed() {
        assert_eq!(format_attribute("type.object.name"), "type.object.name");
        assert_eq!(format_attribute("name"), "name");
        assert_eq!(format_attribute("~user.company"), "~user.company");
    }

    #[test]
    fn test_regexp_args() {
        let func = Function {
            name: "regexp".into(),
            attr: "name".into(),
            args: vec![Arg::literal("a/b"), Arg::literal("i")],
            ..Default::default()
        };
        assert_eq!(encode_args(&func).unwrap(), r"/a\/b/i");
    }

    #[test]
    fn test_encode_args_quoting() {
        let func = Function {
            name: "eq".into(),
            args: vec![
                Arg::literal(r#"say "hi" \o/"#),
                Arg {
                    value: "$v".into(),
                    is_graph_var: true,
                    ..Default::default()
                },
                Arg {
                    value: "a".into(),
                    is_value_var: true,
                    ..Default::default()
                },
                Arg::default(),
            ],
            ..Default::default()
        };
        assert_eq!(
            encode_args(&func).unwrap(),
            r#""say \"hi\" \\o/", $v, val(a), """#
        );
        assert_eq!(encode_args(&Function::named("uid")), None);
    }

    #[test]
    fn test_aggregation_root() {
        let var_root = QueryNode {
            alias: "var".into(),
            func: Some(Function {
                name: "anyofterms".into(),
                attr: "name".into(),
                args: vec![Arg::literal("Rick Michonne Andrea")],
                ..Default::default()
            }),
            children: vec![QueryNode {
                var_name: "a".into(),
                ..attr("age")
            }],
            ..Default::default()
        };
        let aggregate = |name: &str| QueryNode {
            attr: "val".into(),
            needed_vars: vec![VarContext::new("a", VarKind::Value)],
            func: Some(Function {
                name: name.into(),
                needed_vars: vec![VarContext::new("a", VarKind::Value)],
                ..Default::default()
            }),
            ..Default::default()
        };
        let me = QueryNode {
            alias: "me".into(),
            children: vec![aggregate("sum"), aggregate("avg")],
            ..Default::default()
        };
        let text = render(&QueryBlock::new(vec![var_root, me])).unwrap();
        assert!(text.contains("    me() {\n        sum(val(a))\n        avg(val(a))\n    }"));
    }

    #[test]
    fn test_shortest_root() {
        let mut node = QueryNode {
            alias: "shortest".into(),
            children: vec![attr("friends"), attr("name")],
            ..Default::default()
        };
        node.args.insert("from".into(), "0x0a".into());
        node.args.insert("to".into(), "0x0b".into());
        node.args.insert("numpaths".into(), "3".into());
        assert!(render_one(node).contains("shortest(from: 0x0a, numpaths: 3, to: 0x0b) {"));
    }

    #[test]
    fn test_child_forms() {
        let password = QueryNode {
            attr: "password".into(),
            func: Some(Function {
                name: "checkpwd".into(),
                attr: "password".into(),
                args: vec![Arg::literal("123456")],
                ..Default::default()
            }),
            ..Default::default()
        };
        let count = QueryNode {
            alias: "nameCount".into(),
            is_count: true,
            ..attr("name")
        };
        let friends = QueryNode {
            alias: "bestFriend".into(),
            args: BTreeMap::from([("first".to_string(), "10".to_string())]),
            children: vec![count],
            ..attr("friends")
        };
        let text = render_one(uid_root("me", vec![10], vec![password, friends]));
        assert!(text.contains(r#"        checkpwd(password, "123456")"#));
        assert!(text.contains("        bestFriend: friends(first: 10) {"));
        assert!(text.contains("            nameCount: count(name)"));
    }

    #[test]
    fn test_checkpwd_arity() {
        let node = QueryNode {
            attr: "password".into(),
            func: Some(Function {
                name: "checkpwd".into(),
                attr: "password".into(),
                ..Default::default()
            }),
            ..Default::default()
        };
        let err = render(&QueryBlock::new(vec![uid_root("me", vec![1], vec![node])])).unwrap_err();
        assert_eq!(
            err,
            RenderError::CheckPwdArity {
                node: "password".into(),
                found: 0
            }
        );
    }

    #[test]
    fn test_checkpwd_without_attribute() {
        let node = QueryNode {
            alias: "ok".into(),
            func: Some(Function {
                name: "checkpwd".into(),
                args: vec![Arg::literal("x")],
                ..Default::default()
            }),
            ..Default::default()
        };
        let err = render(&QueryBlock::new(vec![uid_root("me", vec![1], vec![node])])).unwrap_err();
        assert_eq!(
            err,
            RenderError::EmptyFunction {
                node: "ok".into(),
                function: "checkpwd".into()
            }
        );
    }

    #[test]
    fn test_empty_literal_is_kept() {
        let root = QueryNode {
            alias: "me".into(),
            func: Some(Function {
                name: "eq".into(),
                attr: "name".into(),
                args: vec![Arg::literal("")],
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(render_one(root).contains(r#"me(func: eq(name, "")) {"#));
    }

    #[test]
    fn test_literal_whitespace_survives_normalization() {
        let root = QueryNode {
            alias: "me".into(),
            func: Some(Function {
                name: "eq".into(),
                attr: "name".into(),
                args: vec![Arg::literal("Steven  Tom\tX\nY")],
                ..Default::default()
            }),
            ..Default::default()
        };
        let text = render_one(root);
        assert!(text.contains(r#"me(func: eq(name, "Steven  Tom\tX\nY")) {"#));
        assert_eq!(text.lines().count(), 4);
    }

    #[test]
    fn test_count_with_inline_filter() {
        let node = QueryNode {
            is_count: true,
            filter: Some(FilterTree::leaf(Function {
                name: "regexp".into(),
                attr: "user.fullName".into(),
                args: vec![Arg::literal("joschka"), Arg::literal("i")],
                ..Default::default()
            })),
            ..attr("~user.company")
        };
        let company = QueryNode {
            children: vec![node],
            ..attr("user.company")
        };
        let text = render_one(uid_root("userCount", vec![0x186b4], vec![company]));
        assert!(text.contains(
            "            count(~user.company @filter(regexp(user.fullName, /joschka/i)))"
        ));
    }

    #[test]
    fn test_value_variable_read_and_expand() {
        let declare = QueryNode {
            alias: "var".into(),
            ids: vec![1],
            func: Some(Function::named("uid")),
            children: vec![QueryNode {
                var_name: "c".into(),
                is_count: true,
                ..attr("friend")
            }],
            ..Default::default()
        };
        let read = QueryNode {
            alias: "fcount".into(),
            needed_vars: vec![VarContext::new("c", VarKind::Value)],
            ..attr("val")
        };
        let expand = QueryNode {
            expand: "_all_".into(),
            ..attr("expand")
        };
        let text = render(&QueryBlock::new(vec![
            declare,
            uid_root("friend", vec![2], vec![read, expand]),
        ]))
        .unwrap();
        assert!(text.contains("        c as count(friend)"));
        assert!(text.contains("        fcount: val(c)"));
        assert!(text.contains("        expand(_all_)"));
    }

    #[test]
    fn test_directives_in_order() {
        let node = QueryNode {
            filter: Some(FilterTree::leaf(Function {
                name: "has".into(),
                attr: "genre".into(),
                ..Default::default()
            })),
            facets: Some(FacetParams {
                all_keys: true,
                param: vec![],
            }),
            groupby_attrs: vec![GroupByAttr {
                attr: "name".into(),
                alias: "Name".into(),
                langs: vec![],
            }],
            is_groupby: true,
            normalize: true,
            cascade: true,
            recurse: true,
            ignore_reflex: true,
            children: vec![QueryNode {
                is_count: true,
                ..attr("uid")
            }],
            ..attr("friends")
        };
        let text = render_one(uid_root("me", vec![1], vec![node]));
        assert!(text.contains(
            "        friends @filter(has(genre)) @facets @groupby(Name: name) @normalize @cascade @recurse @ignorereflex {"
        ));
    }

    #[test]
    fn test_empty_filter_renders_nothing() {
        let node = QueryNode {
            filter: Some(FilterTree::default()),
            children: vec![attr("name")],
            ..attr("friends")
        };
        let text = render_one(uid_root("me", vec![10], vec![node]));
        assert!(text.contains("        friends {"));
    }

    #[test]
    fn test_undefined_variable_rejected() {
        let node = QueryNode {
            alias: "me".into(),
            needed_vars: vec![VarContext::new("L", VarKind::Uid)],
            func: Some(Function {
                name: "uid".into(),
                needed_vars: vec![VarContext::new("L", VarKind::Uid)],
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(matches!(
            render(&QueryBlock::new(vec![node])),
            Err(RenderError::UndefinedVariable { .. })
        ));
    }

    #[test]
    fn test_render_is_deterministic() {
        let mut node = uid_root("me", vec![1, 3, 5], vec![attr("name")]);
        node.args.insert("offset".into(), "0".into());
        node.args.insert("first".into(), "1".into());
        let block = QueryBlock::new(vec![node]);
        assert_eq!(render(&block).unwrap(), render(&block).unwrap());
        assert!(render(&block)
            .unwrap()
            .contains("me(func: uid(0x01, 0x03, 0x05), first: 1, offset: 0) {"));
    }
}
