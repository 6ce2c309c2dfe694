//! Syntax-tree extraction for Python files.

use std::collections::BTreeSet;

use tracing::debug;
use tree_sitter::{Node, Parser, Tree};

use super::{FileKind, Found, VERSION_TOKENS};

fn parse(text: &str) -> Option<Tree> {
    let mut parser = Parser::new();
    if let Err(err) = parser.set_language(&tree_sitter_python::LANGUAGE.into()) {
        debug!(error = %err, "python grammar unavailable");
        return None;
    }
    parser.parse(text, None)
}

/// Find a literal version declaration.
///
/// Build scripts first look for `setup(version=...)`. Otherwise the last
/// module-level assignment to a version token with a literal value wins.
pub(super) fn find(kind: FileKind, text: &str) -> Option<Found> {
    let tree = parse(text)?;
    let root = tree.root_node();
    let src = text.as_bytes();

    if kind == FileKind::BuildScript {
        let mut calls = Vec::new();
        collect(root, &["call"], false, &mut calls);
        if let Some(found) = calls
            .into_iter()
            .filter_map(|c| setup_version(c, src))
            .filter(|f| super::is_plausible(&f.raw))
            .last()
        {
            return Some(found);
        }
    }

    let mut assignments = Vec::new();
    collect(root, &["assignment"], true, &mut assignments);
    assignments
        .into_iter()
        .filter_map(|a| assignment_version(a, src))
        .filter(|f| super::is_plausible(&f.raw))
        .last()
}

/// Names listed in the module-level `__all__`, including `+=` extensions.
///
/// Entries that are not string literals are skipped.
pub fn public_symbols(text: &str) -> BTreeSet<String> {
    let mut symbols = BTreeSet::new();
    let Some(tree) = parse(text) else {
        return symbols;
    };
    let src = text.as_bytes();

    let mut nodes = Vec::new();
    collect(
        tree.root_node(),
        &["assignment", "augmented_assignment"],
        true,
        &mut nodes,
    );

    for node in nodes {
        let is_all = node
            .child_by_field_name("left")
            .and_then(|n| n.utf8_text(src).ok())
            .is_some_and(|name| name == "__all__");
        if !is_all {
            continue;
        }
        let Some(right) = node.child_by_field_name("right") else {
            continue;
        };
        if node.kind() == "assignment" {
            symbols.clear();
        }
        if matches!(right.kind(), "list" | "tuple") {
            symbols.extend(named_children(right).filter_map(|n| string_literal(n, src)));
        }
    }
    symbols
}

/// Depth-first collection of nodes of the given kinds, in document order.
///
/// With `module_level`, function and class bodies are not entered. Matched
/// nodes are not descended into, so a chained assignment is seen once.
fn collect<'t>(node: Node<'t>, kinds: &[&str], module_level: bool, out: &mut Vec<Node<'t>>) {
    let kind = node.kind();
    if kinds.contains(&kind) {
        out.push(node);
        if kind != "call" {
            return;
        }
    }
    if module_level && matches!(kind, "function_definition" | "class_definition" | "lambda") {
        return;
    }
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            collect(child, kinds, module_level, out);
        }
    }
}

fn named_children<'t>(node: Node<'t>) -> impl Iterator<Item = Node<'t>> {
    (0..node.named_child_count())
        .filter_map(move |i| node.named_child(i))
        .filter(|n| n.kind() != "comment")
}

/// `version=` keyword of a `setup(...)` or `<anything>.setup(...)` call.
fn setup_version(call: Node<'_>, src: &[u8]) -> Option<Found> {
    let function = call.child_by_field_name("function")?;
    let name = match function.kind() {
        "identifier" => function.utf8_text(src).ok()?,
        "attribute" => function.child_by_field_name("attribute")?.utf8_text(src).ok()?,
        _ => return None,
    };
    if name != "setup" {
        return None;
    }

    let arguments = call.child_by_field_name("arguments")?;
    named_children(arguments)
        .filter(|arg| arg.kind() == "keyword_argument")
        .filter(|arg| {
            arg.child_by_field_name("name")
                .and_then(|n| n.utf8_text(src).ok())
                .is_some_and(|n| n == "version")
        })
        .filter_map(|arg| literal(arg.child_by_field_name("value")?, src))
        .last()
        .map(|raw| Found::new(raw, "setup(version=)"))
}

/// Literal value of an assignment to a version token, following chained
/// assignments to the innermost right-hand side.
fn assignment_version(node: Node<'_>, src: &[u8]) -> Option<Found> {
    let mut symbol: Option<&str> = None;
    let mut current = node;
    loop {
        let left = current.child_by_field_name("left")?;
        if symbol.is_none() && left.kind() == "identifier" {
            let name = left.utf8_text(src).ok()?;
            symbol = VERSION_TOKENS.iter().copied().find(|t| *t == name);
        }
        let right = current.child_by_field_name("right")?;
        if right.kind() == "assignment" {
            current = right;
            continue;
        }
        let symbol = symbol?;
        return literal(right, src).map(|raw| Found::new(raw, symbol));
    }
}

/// A string, number, or tuple/list of those, rendered as a version string.
fn literal(node: Node<'_>, src: &[u8]) -> Option<String> {
    match node.kind() {
        "parenthesized_expression" => literal(named_children(node).next()?, src),
        "tuple" | "list" => {
            let parts = named_children(node)
                .map(|n| scalar(n, src))
                .collect::<Option<Vec<_>>>()?;
            (!parts.is_empty()).then(|| parts.join("."))
        }
        _ => scalar(node, src),
    }
}

fn scalar(node: Node<'_>, src: &[u8]) -> Option<String> {
    match node.kind() {
        "string" => string_literal(node, src),
        "concatenated_string" => named_children(node)
            .map(|n| string_literal(n, src))
            .collect::<Option<Vec<_>>>()
            .map(|parts| parts.concat()),
        "integer" | "float" => node.utf8_text(src).ok().map(str::to_string),
        _ => None,
    }
}

/// Contents of a string literal; `None` for f-strings with interpolation.
fn string_literal(node: Node<'_>, src: &[u8]) -> Option<String> {
    if node.kind() != "string" {
        return None;
    }
    let mut from = None;
    let mut to = None;
    for i in 0..node.child_count() {
        let child = node.child(i)?;
        match child.kind() {
            "interpolation" => return None,
            "string_start" => from = Some(child.end_byte()),
            "string_end" => to = Some(child.start_byte()),
            _ => {}
        }
    }
    let bytes = src.get(from?..to?)?;
    std::str::from_utf8(bytes).ok().map(str::to_string)
}
