//! Error types for parsing, path access, and template projection.

use std::path::PathBuf;
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// A grammar violation in table-literal text.
///
/// `offset` is a byte offset into the source after whole-line `--` comments
/// have been removed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at byte {offset}")]
pub struct ParseError {
    pub message: String,
    pub offset: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

/// An invalid path expression or path segment for `Table::get` / `Table::set`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessFault {
    #[error("empty path")]
    EmptyPath,
    #[error("malformed path segment `{0}`")]
    BadSegment(String),
    #[error("index {index} out of range 1..={len}")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("no such key `{0}`")]
    MissingKey(String),
    #[error("cannot extend a sequence of length {len} to index {index}")]
    InvalidExtension { index: usize, len: usize },
    #[error("`{0}` is not a table")]
    NotATable(String),
    #[error("`{path}` holds {found}, expected {expected}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// A fault raised while projecting template pages to or from a `Table`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template root: {0}")]
    Root(#[source] AccessFault),
    #[error("page {page}: {fault}")]
    Page {
        page: usize,
        #[source]
        fault: AccessFault,
    },
    #[error("page {page}, child {child}: {fault}")]
    Element {
        page: usize,
        child: usize,
        #[source]
        fault: AccessFault,
    },
    #[error("template sizes entry {entry}: {fault}")]
    Size {
        entry: usize,
        #[source]
        fault: AccessFault,
    },
}

/// Any failure surfaced by `lrt-core` operations that combine several layers.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot read or write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("access fault: {0}")]
    Access(#[from] AccessFault),
    #[error("template error: {0}")]
    Template(#[from] TemplateError),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_display_includes_offset() {
        let err = ParseError::new("expected `}`", 42);
        assert_eq!(err.to_string(), "expected `}` at byte 42");
    }

    #[test]
    fn template_error_wraps_fault() {
        let err = TemplateError::Element {
            page: 2,
            child: 3,
            fault: AccessFault::MissingKey("transform".into()),
        };
        assert_eq!(
            err.to_string(),
            "page 2, child 3: no such key `transform`"
        );
        let top: Error = err.into();
        assert!(matches!(top, Error::Template(_)));
    }
}
