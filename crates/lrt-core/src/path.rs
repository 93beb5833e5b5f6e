//! Path expressions: `'/'`-delimited addresses into nested tables.
//!
//! `pages/3/1/children/2/transform/x` walks named key `pages`, positional
//! entry 3, positional entry 1, and so on. Positional indices are 1-based.

use crate::error::AccessFault;
use smallvec::SmallVec;
use std::fmt;

/// One step of a path expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// 1-based positional index.
    Index(usize),
    /// Named key.
    Key(&'a str),
}

impl fmt::Display for Segment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Index(i) => write!(f, "{i}"),
            Segment::Key(k) => f.write_str(k),
        }
    }
}

/// Parsed path; most template paths are well under eight segments deep.
pub type Segments<'a> = SmallVec<[Segment<'a>; 8]>;

/// Split a path expression into segments.
///
/// A segment that starts with an ASCII digit is positional and must be all
/// digits. Index 0 is rejected here since it can never address an entry.
pub fn parse_path(path: &str) -> Result<Segments<'_>, AccessFault> {
    if path.is_empty() {
        return Err(AccessFault::EmptyPath);
    }

    let mut segments = Segments::new();
    for part in path.split('/') {
        segments.push(parse_segment(part)?);
    }
    Ok(segments)
}

fn parse_segment(part: &str) -> Result<Segment<'_>, AccessFault> {
    let Some(first) = part.chars().next() else {
        return Err(AccessFault::BadSegment(part.to_string()));
    };

    if first.is_ascii_digit() {
        if !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AccessFault::BadSegment(part.to_string()));
        }
        let index: usize = part
            .parse()
            .map_err(|_| AccessFault::BadSegment(part.to_string()))?;
        if index == 0 {
            return Err(AccessFault::IndexOutOfRange { index, len: 0 });
        }
        Ok(Segment::Index(index))
    } else {
        Ok(Segment::Key(part))
    }
}

/// Join segments back into a path expression (used for diagnostics).
pub fn join(segments: &[Segment<'_>]) -> String {
    let mut out = String::new();
    for (i, seg) in segments.iter().enumerate() {
        if i > 0 {
            out.push('/');
        }
        out.push_str(&seg.to_string());
    }
    out
}
