//! Core type definitions
//!
//! Key design principles:
//! 1. Use u32 for node handles (index into the arena, not a pointer)
//! 2. Positions are plain offsets into the shared content buffer
//! 3. Use SmallVec for small lists (most elements declare no namespaces)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::StandoffError;

/// Node identifier (index into arena)
pub type NodeId = u32;

/// Well-known namespace URIs
pub mod ns {
    pub const XML: &str = "http://www.w3.org/XML/1998/namespace";
    pub const XMLNS: &str = "http://www.w3.org/2000/xmlns/";
    pub const XML_PREFIX: &str = "xml";
    pub const XMLNS_PREFIX: &str = "xmlns";
}

/// Half-open interval `[start, end)` into the content buffer
///
/// `start == end` is a zero-width span (an empty element).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Zero-width span at `pos`
    pub const fn point(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub const fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Whether `pos` lies inside the span (start inclusive, end exclusive)
    pub const fn contains(&self, pos: usize) -> bool {
        pos >= self.start && pos < self.end
    }

    /// Whether `other` lies within this span; boundaries included
    pub const fn contains_span(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Shift by `offset`; `None` if either end overflows
    pub const fn checked_offset(&self, offset: usize) -> Option<Self> {
        match (self.start.checked_add(offset), self.end.checked_add(offset)) {
            (Some(start), Some(end)) => Some(Self { start, end }),
            _ => None,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// How a new element's span is reconciled with existing elements it partially overlaps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Balancing {
    /// Widen the new element to swallow partially overlapped neighbors
    Outer,
    /// Narrow the new element to the part no neighbor claims
    Inner,
    /// Collapse to an empty element at the start of the range
    Start,
    /// Collapse to an empty element at the end of the range
    End,
    /// Collapse at the start, inside the element overlapping on the left if any
    BalanceToStart,
    /// Collapse at the end, inside the element overlapping on the right if any
    BalanceToEnd,
}

impl Balancing {
    pub const ALL: [Balancing; 6] = [
        Balancing::Outer,
        Balancing::Inner,
        Balancing::Start,
        Balancing::End,
        Balancing::BalanceToStart,
        Balancing::BalanceToEnd,
    ];

    /// OUTER, START and END keep a new element outside of children it only touches
    pub fn is_outer_family(self) -> bool {
        matches!(self, Balancing::Outer | Balancing::Start | Balancing::End)
    }

    /// Collapse the span for START and END; other policies keep it
    pub fn collapse(self, span: Span) -> Span {
        match self {
            Balancing::Start => Span::point(span.start),
            Balancing::End => Span::point(span.end),
            _ => span,
        }
    }

    /// Default nesting of a new element meeting a child with exactly the same span
    ///
    /// Returns true when the new element goes inside that child. The
    /// same-range override flips this for every policy, BALANCE_TO_START and
    /// BALANCE_TO_END included, which goes beyond swapping OUTER and INNER.
    pub fn nests_inside_same_range(self, empty: bool) -> bool {
        if empty {
            !self.is_outer_family()
        } else {
            self == Balancing::Inner
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Balancing::Outer => "OUTER",
            Balancing::Inner => "INNER",
            Balancing::Start => "START",
            Balancing::End => "END",
            Balancing::BalanceToStart => "BALANCE_TO_START",
            Balancing::BalanceToEnd => "BALANCE_TO_END",
        }
    }
}

impl fmt::Display for Balancing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Balancing {
    type Err = StandoffError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        Balancing::ALL
            .into_iter()
            .find(|b| b.as_str() == normalized)
            .ok_or_else(|| StandoffError::UnknownBalancing(s.to_string()))
    }
}

/// A namespace prefix declared on an element (`xmlns:prefix="uri"`)
///
/// The empty prefix is the default namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NamespaceMapping {
    pub prefix: String,
    pub uri: String,
}

impl NamespaceMapping {
    pub fn new(prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            uri: uri.into(),
        }
    }
}
