//! Error types for stand-off markup operations
//!
//! Flat hierarchy. Every variant is a caller mistake detected before the tree
//! is touched; nothing here is retried.

use thiserror::Error;

use crate::types::{NodeId, Span};

pub type Result<T> = std::result::Result<T, StandoffError>;

#[derive(Debug, Error)]
pub enum StandoffError {
    #[error("Inserted element must not have children (it has {0})")]
    CandidateHasChildren(usize),

    #[error("Documents do not share the same content buffer")]
    ContentMismatch,

    #[error("Attribute needs a local name or a qualified name")]
    InvalidAttributeName,

    #[error("Invalid span: end {end} is before start {start}")]
    InvalidSpan { start: usize, end: usize },

    #[error("Span {span} is outside of {bounds}")]
    SpanOutOfBounds { span: Span, bounds: Span },

    #[error("Position {0} falls inside a multi-byte character")]
    NotCharBoundary(usize),

    #[error("Node {0} already has a parent")]
    AlreadyAttached(NodeId),

    #[error("Attaching node {child} under node {parent} would create a cycle")]
    WouldCreateCycle { parent: NodeId, child: NodeId },

    #[error("Child index {index} out of range for node {parent} with {len} children")]
    InvalidChildIndex {
        parent: NodeId,
        index: usize,
        len: usize,
    },

    #[error("Prefix '{prefix}' is already bound to '{existing}', cannot bind it to '{uri}'")]
    NamespaceConflict {
        prefix: String,
        existing: String,
        uri: String,
    },

    #[error("Malformed tree: {0}")]
    MalformedTree(String),

    #[error("Node {0} is not part of the document")]
    StructuralLookupFailure(NodeId),

    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Tree invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Unknown balancing: {0}")]
    UnknownBalancing(String),
}

impl StandoffError {
    /// Errors raised because the arguments of a call were unacceptable
    pub fn is_precondition_violation(&self) -> bool {
        matches!(
            self,
            StandoffError::CandidateHasChildren(_)
                | StandoffError::ContentMismatch
                | StandoffError::InvalidAttributeName
                | StandoffError::InvalidSpan { .. }
                | StandoffError::SpanOutOfBounds { .. }
                | StandoffError::NotCharBoundary(_)
                | StandoffError::AlreadyAttached(_)
                | StandoffError::WouldCreateCycle { .. }
                | StandoffError::InvalidChildIndex { .. }
                | StandoffError::NamespaceConflict { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_grouping() {
        assert!(StandoffError::CandidateHasChildren(2).is_precondition_violation());
        assert!(StandoffError::ContentMismatch.is_precondition_violation());
        assert!(!StandoffError::StructuralLookupFailure(3).is_precondition_violation());
        assert!(!StandoffError::NodeNotFound(3).is_precondition_violation());
    }

    #[test]
    fn test_messages() {
        let err = StandoffError::SpanOutOfBounds {
            span: Span::new(2, 9),
            bounds: Span::new(0, 4),
        };
        assert_eq!(err.to_string(), "Span 2..9 is outside of 0..4");
    }
}
