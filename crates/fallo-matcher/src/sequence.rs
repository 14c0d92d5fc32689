use fallo_core::Document;

use crate::attrs::TokenAttrs;
use crate::{PatternError, PatternMatcher};

/// A half-open token range `start..end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> usize {
        self.end - self.start
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// A contiguous token span matched by a [`TokenMatcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanMatch {
    pub pattern: String,
    pub span: Span,
}

impl SpanMatch {
    /// Matched text, tokens joined by their original whitespace.
    pub fn text(&self, doc: &Document) -> String {
        doc.span_text(self.span.start, self.span.end)
    }
}

/// Matches a fixed sequence of per-token constraints against consecutive
/// tokens, ignoring the dependency tree.
#[derive(Debug, Clone)]
pub struct TokenMatcher {
    name: String,
    steps: Vec<TokenAttrs>,
}

impl TokenMatcher {
    pub fn new(name: &str, steps: Vec<TokenAttrs>) -> Result<Self, PatternError> {
        if steps.is_empty() {
            return Err(PatternError::EmptySequence(name.to_string()));
        }
        Ok(Self {
            name: name.to_string(),
            steps,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn matches_at(&self, doc: &Document, start: usize) -> bool {
        let tokens = doc.tokens();
        start + self.steps.len() <= tokens.len()
            && self
                .steps
                .iter()
                .zip(&tokens[start..])
                .all(|(attrs, token)| attrs.matches(token))
    }
}

impl PatternMatcher for TokenMatcher {
    type Match = SpanMatch;

    /// Non-overlapping matches, leftmost first: after a match ending at `e`
    /// the scan resumes at `e`.
    fn find_matches(&self, doc: &Document) -> Vec<SpanMatch> {
        let mut matches = Vec::new();
        let mut start = 0;
        while start < doc.len() {
            if self.matches_at(doc, start) {
                let end = start + self.steps.len();
                matches.push(SpanMatch {
                    pattern: self.name.clone(),
                    span: Span::new(start, end),
                });
                start = end;
            } else {
                start += 1;
            }
        }
        tracing::debug!(pattern = %self.name, matches = matches.len(), "token pattern matched");
        matches
    }
}
