//! Pattern matching over annotated documents.
//!
//! Two independent, stateless capabilities:
//! - [`DependencyMatcher`]: named nodes linked by dependency/order relations;
//! - [`TokenMatcher`]: a fixed sequence of per-token constraints.
//!
//! Each matcher holds exactly one pattern and borrows the document read-only,
//! so running one never affects another.

use thiserror::Error;

use fallo_core::Document;

pub mod attrs;
pub mod dependency;
pub mod sequence;

pub use attrs::TokenAttrs;
pub use dependency::{DependencyMatch, DependencyMatcher, DependencyPatternBuilder, RelOp};
pub use sequence::{Span, SpanMatch, TokenMatcher};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("pattern '{0}' has no anchor node")]
    MissingAnchor(String),
    #[error("node '{0}' is declared twice")]
    DuplicateNode(String),
    #[error("node '{0}' is referenced before it is declared")]
    UnknownNode(String),
    #[error("unknown relation operator '{0}'")]
    UnknownOperator(String),
    #[error("token pattern '{0}' has no steps")]
    EmptySequence(String),
}

/// A compiled pattern that can be run against a document.
pub trait PatternMatcher {
    type Match;

    fn find_matches(&self, doc: &Document) -> Vec<Self::Match>;
}
