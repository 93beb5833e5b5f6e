//! Emitter: `NamedVariant` / `Value` → table-literal text.
//!
//! The structural inverse of the parser. Output is always grammar-conformant
//! Lua: named members first in sorted key order, then positional members,
//! each followed by a trailing comma.

use crate::value::{NamedVariant, Table, Value};
use std::fmt::Write;

/// Spaces per indentation level.
pub const INDENT_WIDTH: usize = 4;

/// Emit a `name = value` document. An empty name emits the bare value.
#[must_use]
pub fn emit_document(doc: &NamedVariant) -> String {
    let mut out = String::with_capacity(1024);
    if !doc.name.is_empty() {
        out.push_str(&doc.name);
        out.push_str(" = ");
    }
    emit_into(&mut out, &doc.value, 0);
    out
}

/// Emit a single value whose opening brace (if a table) sits at
/// indentation level `level`.
#[must_use]
pub fn emit_value(value: &Value, level: usize) -> String {
    let mut out = String::new();
    emit_into(&mut out, value, level);
    out
}

fn indent(out: &mut String, level: usize) {
    for _ in 0..level * INDENT_WIDTH {
        out.push(' ');
    }
}

fn emit_into(out: &mut String, value: &Value, level: usize) {
    match value {
        Value::String(s) => {
            let _ = write!(out, "\"{s}\"");
        }
        Value::Localized(s) => {
            let _ = write!(out, "ZSTR \"{s}\"");
        }
        Value::Integer(i) => {
            let _ = write!(out, "{i}");
        }
        Value::Float(f) => out.push_str(&format_float(*f)),
        Value::Boolean(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Table(t) => emit_table(out, t, level),
    }
}

fn emit_table(out: &mut String, table: &Table, level: usize) {
    out.push_str("{\n");

    for (key, value) in table.named() {
        indent(out, level + 1);
        out.push_str(key);
        out.push_str(" = ");
        emit_into(out, value, level + 1);
        out.push_str(",\n");
    }

    for value in table.sequence() {
        indent(out, level + 1);
        emit_into(out, value, level + 1);
        out.push_str(",\n");
    }

    indent(out, level);
    out.push('}');
}

/// Render a float as the shortest plain decimal that parses back to the
/// same value. The result always contains a `.` so it re-parses as a float,
/// and never uses an exponent, which the grammar cannot read.
pub fn format_float(value: f64) -> String {
    if !value.is_finite() {
        log::warn!("cannot represent {value} in table-literal text, writing 0.0");
        return "0.0".to_string();
    }
    if value == 0.0 {
        return "0.0".to_string();
    }
    let mut out = format!("{value}");
    if !out.contains('.') {
        out.push_str(".0");
    }
    out
}
