//! Parser for table-literal text → `NamedVariant`.
//!
//! A recursive-descent reader over a restricted subset of Lua table
//! constructors: `name = { key = value, value, ... }` with quoted strings,
//! `ZSTR "..."` localization keys, integers, floats and booleans.
//! Built on `winnow` 0.7 combinators; there is no separate tokenizer. Once a
//! production has committed (an opening brace or quote) its failures are
//! cut, so the reported byte offset is where the input actually went wrong.
//!
//! Whole lines whose first non-blank characters are `--` are removed before
//! parsing. Trailing comments after code on the same line are not supported.

use crate::error::{Error, ParseError};
use crate::value::{NamedVariant, Table, Value};
use std::borrow::Cow;
use std::path::Path;
use winnow::ascii::multispace0;
use winnow::combinator::{alt, cut_err, delimited, fail, opt, preceded, terminated};
use winnow::error::{ContextError, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{one_of, take_till, take_while};

/// Parse a whole document.
///
/// Error offsets refer to the text after comment lines were stripped.
#[must_use = "parsing result should be used"]
pub fn parse_document(input: &str) -> Result<NamedVariant, ParseError> {
    let source = strip_comment_lines(input);
    delimited(ws, named_value, ws)
        .parse(&*source)
        .map_err(|e| ParseError::new(describe(e.inner()), e.offset()))
}

/// Read and parse a document from disk.
///
/// Parse failures are logged here, at the loading boundary, and returned.
pub fn load_document(path: impl AsRef<Path>) -> Result<NamedVariant, Error> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| {
        log::error!("cannot open {} for reading: {e}", path.display());
        Error::io(path, e)
    })?;
    log::debug!("read {} bytes from {}", text.len(), path.display());

    parse_document(&text).map_err(|e| {
        let context: String = strip_comment_lines(&text)
            .get(e.offset..)
            .map(|s| s.chars().take(5).collect())
            .unwrap_or_default();
        log::error!(
            "problem parsing {}: {} (near {context:?})",
            path.display(),
            e
        );
        Error::Parse(e)
    })
}

/// Remove every line whose trimmed content starts with `--`.
pub fn strip_comment_lines(input: &str) -> Cow<'_, str> {
    if !input.split('\n').any(is_comment_line) {
        return Cow::Borrowed(input);
    }
    let kept: Vec<&str> = input
        .split('\n')
        .filter(|line| !is_comment_line(line))
        .collect();
    Cow::Owned(kept.join("\n"))
}

fn is_comment_line(line: &str) -> bool {
    line.trim_start().starts_with("--")
}

/// The innermost context wins. A failure with no context can only come
/// from the end-of-input check after the top-level value.
fn describe(error: &ContextError) -> String {
    match error.context().next() {
        Some(StrContext::Label(label)) => (*label).to_string(),
        Some(StrContext::Expected(what)) => format!("expected {what}"),
        _ => "unexpected trailing input".to_string(),
    }
}

fn expected_char(c: char) -> StrContext {
    StrContext::Expected(StrContextValue::CharLiteral(c))
}

// ─── Tokens ─────────────────────────────────────────────────────────────

fn ws<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    multispace0.parse_next(input)
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_number_char(c: char) -> bool {
    c.is_ascii_digit() || c == '.' || c == '-'
}

fn parse_identifier<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    (one_of(is_ident_start), take_while(0.., is_ident_char))
        .take()
        .context(StrContext::Expected(StrContextValue::Description("identifier")))
        .parse_next(input)
}

/// `"..."` with no escape processing: everything up to the next quote.
fn parse_quoted_string<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    preceded(
        '"'.context(expected_char('"')),
        cut_err(terminated(
            take_till(0.., '"'),
            '"'.context(StrContext::Label("unterminated string literal")),
        )),
    )
    .parse_next(input)
}

fn parse_zstring(input: &mut &str) -> ModalResult<Value> {
    preceded("ZSTR", cut_err(preceded(ws, parse_quoted_string)))
        .map(|key: &str| Value::Localized(key.to_string()))
        .parse_next(input)
}

/// Scan a run of `[0-9.-]`, then try integer before float.
fn parse_number(input: &mut &str) -> ModalResult<Value> {
    let start = *input;
    let token = (one_of(|c: char| c.is_ascii_digit() || c == '-'), take_while(0.., is_number_char))
        .take()
        .parse_next(input)?;

    if let Ok(i) = token.parse::<i64>() {
        return Ok(Value::Integer(i));
    }
    if let Ok(f) = token.parse::<f64>() {
        return Ok(Value::Float(f));
    }
    *input = start;
    cut_err(fail.context(StrContext::Label("malformed number"))).parse_next(input)
}

/// Only `true` and `false` are accepted where an identifier starts a value.
fn parse_boolean(input: &mut &str) -> ModalResult<bool> {
    let start = *input;
    match parse_identifier.parse_next(input)? {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => {
            *input = start;
            cut_err(fail.context(StrContext::Label("expected a boolean value"))).parse_next(input)
        }
    }
}

fn unsupported_value(input: &mut &str) -> ModalResult<Value> {
    let label = if input.is_empty() {
        "expected a value but ran out of input"
    } else {
        "unsupported value"
    };
    cut_err(fail.context(StrContext::Label(label))).parse_next(input)
}

// ─── Grammar productions ────────────────────────────────────────────────

/// `identifier '=' value`
fn named_value(input: &mut &str) -> ModalResult<NamedVariant> {
    let name = parse_identifier.parse_next(input)?;
    ws.parse_next(input)?;
    cut_err('='.context(expected_char('='))).parse_next(input)?;
    let value = parse_value.parse_next(input)?;
    Ok(NamedVariant::new(name, value))
}

fn parse_value(input: &mut &str) -> ModalResult<Value> {
    preceded(
        ws,
        alt((
            parse_table.map(Value::Table),
            parse_quoted_string.map(|s| Value::String(s.to_string())),
            parse_zstring,
            parse_number,
            parse_boolean.map(Value::Boolean),
            unsupported_value,
        )),
    )
    .parse_next(input)
}

/// `'{' (member (',' member)*)? ','? '}'`
fn parse_table(input: &mut &str) -> ModalResult<Table> {
    preceded('{', cut_err(table_body)).parse_next(input)
}

fn table_body(input: &mut &str) -> ModalResult<Table> {
    let mut table = Table::new();
    ws.parse_next(input)?;

    while !input.starts_with('}') {
        parse_member(input, &mut table)?;
        ws.parse_next(input)?;
        // No separator: the table must close here.
        if opt(',').parse_next(input)?.is_none() {
            break;
        }
        ws.parse_next(input)?;
    }

    '}'.context(expected_char('}')).parse_next(input)?;
    Ok(table)
}

/// A member is named only when an identifier is followed by `=`.
/// `true` / `false` are values even though they lex as identifiers.
fn parse_member(input: &mut &str, table: &mut Table) -> ModalResult<()> {
    let key = opt(terminated(
        parse_identifier.verify(|ident: &str| ident != "true" && ident != "false"),
        (ws, '='),
    ))
    .parse_next(input)?;
    let value = parse_value.parse_next(input)?;

    match key {
        Some(key) => {
            table.insert(key, value);
        }
        None => table.append(value),
    }
    Ok(())
}
