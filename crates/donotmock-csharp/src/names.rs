//! Reading names, types and literals out of tree-sitter nodes.

use crate::syntax::{NameRef, TypeSyntax};
use donotmock_core::AnnotationArg;
use tree_sitter::Node;

pub(crate) fn text<'a>(node: &Node<'_>, src: &'a [u8]) -> &'a str {
    node.utf8_text(src).unwrap_or("")
}

/// Field `field`, or else the first named child of one of `kinds`.
pub(crate) fn field_or_kind<'t>(node: &Node<'t>, field: &str, kinds: &[&str]) -> Option<Node<'t>> {
    if let Some(child) = node.child_by_field_name(field) {
        return Some(child);
    }
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if kinds.contains(&child.kind()) {
            return Some(child);
        }
    }
    None
}

fn first_named<'t>(node: &Node<'t>) -> Option<Node<'t>> {
    node.named_child(0)
}

fn last_named<'t>(node: &Node<'t>) -> Option<Node<'t>> {
    let mut last = None;
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        last = Some(child);
    }
    last
}

/// Reads a name-like node (`identifier`, `generic_name`, `qualified_name`,
/// `alias_qualified_name`, a member-access chain, or `T?`).
pub(crate) fn name_ref(node: &Node<'_>, src: &[u8]) -> Option<NameRef> {
    let full = text(node, src).to_string();
    match node.kind() {
        "identifier" => Some(NameRef {
            alias: None,
            segments: vec![full.clone()],
            type_args: Vec::new(),
            text: full,
        }),
        "generic_name" => {
            let ident = field_or_kind(node, "name", &["identifier"])?;
            let type_args = field_or_kind(node, "type_arguments", &["type_argument_list"])
                .map(|list| type_arguments(&list, src))
                .unwrap_or_default();
            Some(NameRef {
                alias: None,
                segments: vec![text(&ident, src).to_string()],
                type_args,
                text: full,
            })
        }
        "qualified_name" | "member_access_expression" => {
            let (left_field, right_field) = if node.kind() == "qualified_name" {
                ("qualifier", "name")
            } else {
                ("expression", "name")
            };
            let left = node
                .child_by_field_name(left_field)
                .or_else(|| first_named(node))?;
            let right = node
                .child_by_field_name(right_field)
                .or_else(|| last_named(node))?;
            let left = name_ref(&left, src)?;
            let right = name_ref(&right, src)?;
            let mut segments = left.segments;
            segments.extend(right.segments);
            Some(NameRef {
                alias: left.alias,
                segments,
                type_args: right.type_args,
                text: full,
            })
        }
        "alias_qualified_name" => {
            let alias = node
                .child_by_field_name("alias")
                .or_else(|| first_named(node))?;
            let name = node
                .child_by_field_name("name")
                .or_else(|| last_named(node))?;
            let name = name_ref(&name, src)?;
            Some(NameRef {
                alias: Some(text(&alias, src).to_string()),
                segments: name.segments,
                type_args: name.type_args,
                text: full,
            })
        }
        "nullable_type" => {
            let inner = node.child_by_field_name("type").or_else(|| first_named(node))?;
            name_ref(&inner, src)
        }
        _ => None,
    }
}

/// Reads a type as written.
pub(crate) fn type_syntax(node: &Node<'_>, src: &[u8]) -> TypeSyntax {
    name_ref(node, src).map_or_else(|| TypeSyntax::Other(text(node, src).to_string()), TypeSyntax::Name)
}

/// Reads the types of a `type_argument_list`.
pub(crate) fn type_arguments(list: &Node<'_>, src: &[u8]) -> Vec<TypeSyntax> {
    let mut args = Vec::new();
    let mut cursor = list.walk();
    for child in list.named_children(&mut cursor) {
        args.push(type_syntax(&child, src));
    }
    args
}

/// Reads a constant attribute argument.
pub(crate) fn literal(node: &Node<'_>, src: &[u8]) -> AnnotationArg {
    let raw = text(node, src);
    match node.kind() {
        "string_literal" => AnnotationArg::String(decode_regular(raw)),
        "verbatim_string_literal" => AnnotationArg::String(decode_verbatim(raw)),
        "raw_string_literal" => AnnotationArg::String(decode_raw(raw)),
        "null_literal" => AnnotationArg::Null,
        "parenthesized_expression" => match first_named(node) {
            Some(inner) => literal(&inner, src),
            None => AnnotationArg::Other(raw.to_string()),
        },
        _ => AnnotationArg::Other(raw.to_string()),
    }
}

fn strip_utf8_suffix(raw: &str) -> &str {
    raw.strip_suffix("u8")
        .or_else(|| raw.strip_suffix("U8"))
        .unwrap_or(raw)
}

/// Decodes `"..."`, processing escape sequences.
pub(crate) fn decode_regular(raw: &str) -> String {
    let raw = strip_utf8_suffix(raw);
    let body = raw
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(raw);

    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('0') => out.push('\0'),
            Some('a') => out.push('\u{07}'),
            Some('b') => out.push('\u{08}'),
            Some('f') => out.push('\u{0C}'),
            Some('v') => out.push('\u{0B}'),
            Some('e') => out.push('\u{1B}'),
            Some(kind @ ('u' | 'U' | 'x')) => {
                let max = if kind == 'U' { 8 } else { 4 };
                let mut digits = String::new();
                while digits.len() < max {
                    match chars.peek() {
                        Some(d) if d.is_ascii_hexdigit() => {
                            digits.push(*d);
                            chars.next();
                        }
                        _ => break,
                    }
                }
                match u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push('\\');
                        out.push(kind);
                        out.push_str(&digits);
                    }
                }
            }
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Decodes `@"..."`, where `""` stands for one quote.
pub(crate) fn decode_verbatim(raw: &str) -> String {
    let raw = strip_utf8_suffix(raw);
    let body = raw
        .strip_prefix("@\"")
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(raw);
    body.replace("\"\"", "\"")
}

/// Decodes `"""..."""`, removing the closing line's indentation from
/// multi-line literals.
pub(crate) fn decode_raw(raw: &str) -> String {
    let raw = strip_utf8_suffix(raw);
    let quotes = raw.chars().take_while(|c| *c == '"').count();
    if quotes < 3 || raw.len() < quotes * 2 {
        return raw.to_string();
    }
    let body = &raw[quotes..raw.len() - quotes];
    if !body.contains('\n') {
        return body.to_string();
    }

    let lines: Vec<&str> = body.lines().collect();
    let Some((last, middle)) = lines.split_last() else {
        return String::new();
    };
    let indent = last.trim_end_matches('\r');
    let middle = middle.get(1..).unwrap_or_default();
    middle
        .iter()
        .map(|line| {
            let line = line.trim_end_matches('\r');
            line.strip_prefix(indent).unwrap_or_else(|| line.trim_start())
        })
        .collect::<Vec<_>>()
        .join("\n")
}
