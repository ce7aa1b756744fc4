//! Writes a store back out as a graph script.

use crate::graph::node::{format_number, quote};
use crate::graph::{FieldValue, Fields, Node, Size, Store};
use crate::project::ModuleMetadata;
use itertools::Itertools;
use std::fmt::Write;

const INDENT: &str = "    ";

/// Words the lexer never reads as an identifier.
const KEYWORDS: [&str; 15] = [
    "module",
    "namespace",
    "description",
    "flag",
    "node",
    "group",
    "connect",
    "at",
    "size",
    "inputs",
    "outputs",
    "true",
    "false",
    "inf",
    "nan",
];

/// Renders `metadata` and `store` as a script that reloads to the same graph:
/// same ids, types, fields, placement and connection order.
pub fn write_script(metadata: &ModuleMetadata, store: &Store) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "module {};", quote(&metadata.name));
    if !metadata.namespace.is_empty() {
        let _ = writeln!(out, "namespace {};", quote(&metadata.namespace));
    }
    if !metadata.description.is_empty() {
        let _ = writeln!(out, "description {};", quote(&metadata.description));
    }
    for (name, value) in &metadata.flags {
        let _ = writeln!(out, "flag {} = {};", script_name(name), value);
    }
    if !store.is_empty() {
        out.push('\n');
    }
    write_store(&mut out, store, 0);
    out
}

fn write_store(out: &mut String, store: &Store, depth: usize) {
    let pad = INDENT.repeat(depth);
    for node in store.nodes() {
        if node.is_group {
            write_group(out, node, depth);
        } else {
            let _ = write!(
                out,
                "{}node {} {}{}",
                pad,
                node.id,
                quote(&node.node_type),
                placement(node)
            );
            write_fields(out, &node.fields, depth);
        }
    }
    for c in store.connections() {
        let _ = writeln!(
            out,
            "{}connect {}:{} -> {}:{};",
            pad, c.from.node, c.from.port, c.to.node, c.to.port
        );
    }
}

fn write_group(out: &mut String, node: &Node, depth: usize) {
    let pad = INDENT.repeat(depth);
    let _ = writeln!(
        out,
        "{}group {} {}{} inputs {} outputs {} {{",
        pad,
        node.id,
        quote(node.display_name()),
        placement(node),
        labels(&node.inputs),
        labels(&node.outputs)
    );
    let inner_pad = INDENT.repeat(depth + 1);
    for (name, value) in node.fields.iter().filter(|(name, _)| *name != "name") {
        let _ = writeln!(out, "{}{} = {};", inner_pad, script_name(name), script_value(value));
    }
    if let Some(inner) = &node.sub_graph {
        write_store(out, inner, depth + 1);
    }
    let _ = writeln!(out, "{}}}", pad);
}

fn write_fields(out: &mut String, fields: &Fields, depth: usize) {
    if fields.is_empty() {
        out.push_str(";\n");
        return;
    }
    out.push_str(" {\n");
    let inner_pad = INDENT.repeat(depth + 1);
    for (name, value) in fields {
        let _ = writeln!(out, "{}{} = {};", inner_pad, script_name(name), script_value(value));
    }
    let _ = writeln!(out, "{}}}", INDENT.repeat(depth));
}

fn placement(node: &Node) -> String {
    let mut text = format!(
        " at ({}, {})",
        script_number(node.position.x),
        script_number(node.position.y)
    );
    if node.size != Size::default() {
        let _ = write!(
            text,
            " size ({}, {})",
            script_number(node.size.width),
            script_number(node.size.height)
        );
    }
    text
}

/// Names that would not lex back as a plain identifier are quoted.
fn script_name(name: &str) -> String {
    let mut chars = name.chars();
    let plain = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !KEYWORDS.contains(&name);
    if plain { name.to_string() } else { quote(name) }
}

fn script_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Number(n) => script_number(*n),
        FieldValue::Vector(values) => {
            format!("[{}]", values.iter().map(|v| script_number(*v)).join(", "))
        }
        other => other.to_source(),
    }
}

fn script_number(n: f64) -> String {
    if n.is_nan() {
        "nan".to_string()
    } else if n.is_infinite() {
        if n < 0.0 { "-inf" } else { "inf" }.to_string()
    } else {
        format_number(n)
    }
}

fn labels(labels: &[String]) -> String {
    format!("[{}]", labels.iter().map(|l| quote(l)).join(", "))
}
