//! Value model for table-literal documents.
//!
//! A `Table` is the hybrid Lua container: a 1-based contiguous sequence plus
//! a string-keyed map. Nested tables are owned by value, so cloning a table
//! yields a fully independent copy and a deep `set` rebuilds the chain of
//! subtrees from the leaf back up to the root.

use crate::error::AccessFault;
use crate::path::{Segment, join, parse_path};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ─── Value ───────────────────────────────────────────────────────────────

/// A single value in a table-literal document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    String(String),
    /// A `ZSTR "..."` literal: a localization key rather than display text.
    Localized(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Table(Table),
}

impl Value {
    pub fn localized(key: impl Into<String>) -> Self {
        Value::Localized(key.into())
    }

    /// Name of the variant, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "a string",
            Value::Localized(_) => "a localized string",
            Value::Integer(_) => "an integer",
            Value::Float(_) => "a float",
            Value::Boolean(_) => "a boolean",
            Value::Table(_) => "a table",
        }
    }

    /// String contents of a plain or localized string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Localized(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric value, widening integers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Value::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_table_mut(&mut self) -> Option<&mut Table> {
        match self {
            Value::Table(t) => Some(t),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<Table> for Value {
    fn from(t: Table) -> Self {
        Value::Table(t)
    }
}

// ─── Table ───────────────────────────────────────────────────────────────

/// Hybrid sequence + map container.
///
/// Named members live in a `BTreeMap` so iteration (and therefore the
/// generator's output) is always in sorted key order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    sequence: Vec<Value>,
    named: BTreeMap<String, Value>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of positional entries (Lua's `#` operator).
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    /// True when the table has neither positional nor named entries.
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty() && self.named.is_empty()
    }

    /// Number of named entries.
    pub fn key_count(&self) -> usize {
        self.named.len()
    }

    /// Named keys, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.named.keys().map(String::as_str)
    }

    /// Named members, sorted by key.
    pub fn named(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.named.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Positional members in index order.
    pub fn sequence(&self) -> impl Iterator<Item = &Value> {
        self.sequence.iter()
    }

    /// Grow the sequence by one.
    pub fn append(&mut self, value: impl Into<Value>) {
        self.sequence.push(value.into());
    }

    /// Create or replace a named member, returning the previous value.
    ///
    /// Unlike `set`, this may introduce new keys; it is the builder
    /// operation used while constructing a table.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.named.insert(key.into(), value.into())
    }

    /// Positional entry, 1-based.
    pub fn item(&self, index: usize) -> Option<&Value> {
        index.checked_sub(1).and_then(|i| self.sequence.get(i))
    }

    /// Named entry.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.named.get(key)
    }

    // ─── Path access ─────────────────────────────────────────────────────

    /// Look up the value at `path`.
    pub fn get(&self, path: &str) -> Result<&Value, AccessFault> {
        let segments = parse_path(path)?;
        let mut table = self;
        let mut value = None;
        for (depth, seg) in segments.iter().enumerate() {
            if let Some(v) = value {
                table = as_table_at(v, &segments[..depth])?;
            }
            value = Some(table.child(*seg)?);
        }
        value.ok_or(AccessFault::EmptyPath)
    }

    /// Replace the value at `path`.
    ///
    /// Every intermediate segment must already exist. The final segment must
    /// name an existing key, an existing positional entry, or the position
    /// exactly one past the end of the sequence (append by assignment).
    /// On failure the table is left unchanged.
    pub fn set(&mut self, path: &str, value: impl Into<Value>) -> Result<(), AccessFault> {
        let segments = parse_path(path)?;
        self.set_segments(&segments, 0, value.into())
    }

    /// Write a number at `path`, keeping the entry an integer when it was
    /// one and the new value has no fractional part.
    pub fn set_number(&mut self, path: &str, number: f64) -> Result<(), AccessFault> {
        const EXACT_LIMIT: f64 = 9_007_199_254_740_992.0; // 2^53
        let was_integer = matches!(self.get(path), Ok(Value::Integer(_)));
        if was_integer && number.fract() == 0.0 && number.abs() < EXACT_LIMIT {
            self.set(path, Value::Integer(number as i64))
        } else {
            self.set(path, Value::Float(number))
        }
    }

    fn set_segments(
        &mut self,
        segments: &[Segment<'_>],
        depth: usize,
        value: Value,
    ) -> Result<(), AccessFault> {
        let seg = segments[depth];
        if depth + 1 == segments.len() {
            return self.assign(seg, value);
        }

        let slot = self.child_mut(seg)?;
        let Value::Table(child) = slot else {
            return Err(AccessFault::NotATable(join(&segments[..=depth])));
        };

        // Copy the subtree out, mutate it, and write it back.
        let mut subtree = std::mem::take(child);
        let result = subtree.set_segments(segments, depth + 1, value);
        *child = subtree;
        result
    }

    fn assign(&mut self, seg: Segment<'_>, value: Value) -> Result<(), AccessFault> {
        match seg {
            Segment::Index(index) => {
                let len = self.sequence.len();
                if index == len + 1 {
                    self.sequence.push(value);
                    Ok(())
                } else if index > len + 1 {
                    Err(AccessFault::InvalidExtension { index, len })
                } else {
                    self.sequence[index - 1] = value;
                    Ok(())
                }
            }
            Segment::Key(key) => match self.named.get_mut(key) {
                Some(slot) => {
                    *slot = value;
                    Ok(())
                }
                None => Err(AccessFault::MissingKey(key.to_string())),
            },
        }
    }

    fn child(&self, seg: Segment<'_>) -> Result<&Value, AccessFault> {
        match seg {
            Segment::Index(index) => self.item(index).ok_or(AccessFault::IndexOutOfRange {
                index,
                len: self.sequence.len(),
            }),
            Segment::Key(key) => self
                .named
                .get(key)
                .ok_or_else(|| AccessFault::MissingKey(key.to_string())),
        }
    }

    fn child_mut(&mut self, seg: Segment<'_>) -> Result<&mut Value, AccessFault> {
        match seg {
            Segment::Index(index) => {
                let len = self.sequence.len();
                index
                    .checked_sub(1)
                    .and_then(|i| self.sequence.get_mut(i))
                    .ok_or(AccessFault::IndexOutOfRange { index, len })
            }
            Segment::Key(key) => self
                .named
                .get_mut(key)
                .ok_or_else(|| AccessFault::MissingKey(key.to_string())),
        }
    }

    // ─── Typed accessors ─────────────────────────────────────────────────

    /// String (plain or localized) at `path`.
    pub fn get_str(&self, path: &str) -> Result<&str, AccessFault> {
        let value = self.get(path)?;
        value
            .as_str()
            .ok_or_else(|| mismatch(path, "a string", value))
    }

    pub fn get_int(&self, path: &str) -> Result<i64, AccessFault> {
        let value = self.get(path)?;
        value
            .as_int()
            .ok_or_else(|| mismatch(path, "an integer", value))
    }

    /// Number at `path`; integers are widened.
    pub fn get_f64(&self, path: &str) -> Result<f64, AccessFault> {
        let value = self.get(path)?;
        value
            .as_f64()
            .ok_or_else(|| mismatch(path, "a number", value))
    }

    pub fn get_bool(&self, path: &str) -> Result<bool, AccessFault> {
        let value = self.get(path)?;
        value
            .as_bool()
            .ok_or_else(|| mismatch(path, "a boolean", value))
    }

    pub fn get_table(&self, path: &str) -> Result<&Table, AccessFault> {
        let value = self.get(path)?;
        value
            .as_table()
            .ok_or_else(|| mismatch(path, "a table", value))
    }

    /// Positional length of the table at `path`.
    pub fn sequence_len(&self, path: &str) -> Result<usize, AccessFault> {
        self.get_table(path).map(Table::len)
    }
}

fn as_table_at<'t>(value: &'t Value, walked: &[Segment<'_>]) -> Result<&'t Table, AccessFault> {
    value
        .as_table()
        .ok_or_else(|| AccessFault::NotATable(join(walked)))
}

fn mismatch(path: &str, expected: &'static str, found: &Value) -> AccessFault {
    AccessFault::TypeMismatch {
        path: path.to_string(),
        expected,
        found: found.type_name(),
    }
}

// ─── NamedVariant ────────────────────────────────────────────────────────

/// A `name = value` pair: the unit the parser produces and the generator
/// consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedVariant {
    pub name: String,
    pub value: Value,
}

impl NamedVariant {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn table(&self) -> Option<&Table> {
        self.value.as_table()
    }

    pub fn table_mut(&mut self) -> Option<&mut Table> {
        self.value.as_table_mut()
    }
}
