/// Query text layout.
///
/// The renderer emits one clause per line, indented by nesting depth, and
/// then normalizes: blank lines are dropped and every run of whitespace
/// after a line's leading indentation collapses to a single space. Quoted
/// strings and `/regexp/` literals are copied as they are.
use std::sync::OnceLock;

use regex::{Captures, Regex};

pub const INDENT: &str = "    ";

pub fn indent(level: usize) -> String {
    INDENT.repeat(level)
}

/// A quoted string, a regexp literal opening an argument, or a run of
/// whitespace outside both.
fn token() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| {
        Regex::new(r#""(?:[^"\\]|\\.)*"|[(,]\s*/(?:[^/\\]|\\.)*/|\s+"#)
            .expect("literal pattern")
    })
}

fn collapse(caps: &Captures) -> String {
    let matched = &caps[0];
    if matched.starts_with('"') {
        return matched.to_string();
    }
    match matched.find('/') {
        // `(` or `,`, the separating space if any, then the literal verbatim
        Some(at) => {
            let gap = if at > 1 { " " } else { "" };
            format!("{}{}{}", &matched[..1], gap, &matched[at..])
        }
        None => " ".to_string(),
    }
}

/// Normalize rendered query text. Normalizing twice is the same as
/// normalizing once.
pub fn normalize_whitespace(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let (lead, rest) = split_indent(line);
            format!("{}{}", lead, token().replace_all(rest, collapse))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn split_indent(line: &str) -> (&str, &str) {
    let at = line
        .find(|c| c != ' ' && c != '\t')
        .unwrap_or(line.len());
    line.split_at(at)
}
