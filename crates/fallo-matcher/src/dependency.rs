//! Dependency-tree patterns.
//!
//! A pattern is a list of named nodes. The first node (the anchor) is matched
//! against every token; each later node is reached from an already-bound node
//! through a [`RelOp`] and must satisfy its own [`TokenAttrs`]. Extra relations
//! between bound nodes can be added with [`DependencyPatternBuilder::constrain`].

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use fallo_core::Document;

use crate::attrs::TokenAttrs;
use crate::{PatternError, PatternMatcher};

/// Relation between a bound node (left) and a candidate node (right).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelOp {
    /// `>`: left is the immediate head of right.
    Head,
    /// `<`: left is an immediate dependent of right.
    Dependent,
    /// `>>`: left is an ancestor of right.
    Ancestor,
    /// `<<`: left is a descendant of right.
    Descendant,
    /// `.`: left immediately precedes right in token order.
    Precedes,
    /// `;`: left immediately follows right in token order.
    Follows,
}

impl RelOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            RelOp::Head => ">",
            RelOp::Dependent => "<",
            RelOp::Ancestor => ">>",
            RelOp::Descendant => "<<",
            RelOp::Precedes => ".",
            RelOp::Follows => ";",
        }
    }

    /// Does `left OP right` hold in `doc`?
    pub fn holds(&self, doc: &Document, left: usize, right: usize) -> bool {
        let head_of = |i: usize| doc.token(i).and_then(|t| t.head);
        match self {
            RelOp::Head => head_of(right) == Some(left),
            RelOp::Dependent => head_of(left) == Some(right),
            RelOp::Ancestor => is_ancestor(doc, left, right),
            RelOp::Descendant => is_ancestor(doc, right, left),
            RelOp::Precedes => left + 1 == right && right < doc.len(),
            RelOp::Follows => right + 1 == left && left < doc.len(),
        }
    }

    /// Tokens `right` such that `left OP right` holds, in ascending order.
    pub fn candidates(&self, doc: &Document, left: usize) -> Vec<usize> {
        let mut out = match self {
            RelOp::Head => doc.children(left).to_vec(),
            RelOp::Dependent => doc.token(left).and_then(|t| t.head).into_iter().collect(),
            RelOp::Ancestor => {
                let mut found = Vec::new();
                let mut stack = doc.children(left).to_vec();
                while let Some(node) = stack.pop() {
                    if node == left || found.contains(&node) {
                        continue;
                    }
                    found.push(node);
                    stack.extend_from_slice(doc.children(node));
                }
                found
            }
            RelOp::Descendant => {
                let mut found = Vec::new();
                let mut current = doc.token(left).and_then(|t| t.head);
                while let Some(node) = current {
                    if found.contains(&node) {
                        break;
                    }
                    found.push(node);
                    current = doc.token(node).and_then(|t| t.head);
                }
                found
            }
            RelOp::Precedes => (left + 1 < doc.len()).then_some(left + 1).into_iter().collect(),
            RelOp::Follows => left.checked_sub(1).into_iter().collect(),
        };
        out.sort_unstable();
        out.dedup();
        out
    }
}

fn is_ancestor(doc: &Document, ancestor: usize, node: usize) -> bool {
    let mut seen = 0;
    let mut current = doc.token(node).and_then(|t| t.head);
    while let Some(head) = current {
        if head == ancestor {
            return true;
        }
        seen += 1;
        if seen > doc.len() {
            return false;
        }
        current = doc.token(head).and_then(|t| t.head);
    }
    false
}

impl fmt::Display for RelOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for RelOp {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ">" => Ok(RelOp::Head),
            "<" => Ok(RelOp::Dependent),
            ">>" => Ok(RelOp::Ancestor),
            "<<" => Ok(RelOp::Descendant),
            "." => Ok(RelOp::Precedes),
            ";" => Ok(RelOp::Follows),
            other => Err(PatternError::UnknownOperator(other.to_string())),
        }
    }
}

/// `left OP right` between two pattern nodes (by position in the node list).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Relation {
    left: usize,
    op: RelOp,
    right: usize,
}

#[derive(Debug, Clone)]
struct PatternNode {
    name: String,
    attrs: TokenAttrs,
}

/// One way a dependency pattern binds to a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyMatch {
    /// Name of the pattern that produced this match.
    pub pattern: String,
    /// Bound token per pattern node, in node declaration order.
    pub tokens: Vec<usize>,
}

impl DependencyMatch {
    /// Bound tokens in document order.
    pub fn sorted_tokens(&self) -> Vec<usize> {
        let mut tokens = self.tokens.clone();
        tokens.sort_unstable();
        tokens
    }

    /// Surface text of the bound tokens, in document order, joined by spaces.
    pub fn text(&self, doc: &Document) -> String {
        self.sorted_tokens()
            .into_iter()
            .filter_map(|i| doc.token(i))
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A compiled dependency-tree pattern.
#[derive(Debug, Clone)]
pub struct DependencyMatcher {
    name: String,
    nodes: Vec<PatternNode>,
    /// Relation used to generate candidates for node `k` (index `k - 1`).
    links: Vec<Relation>,
    /// Extra relations checked once both ends are bound.
    constraints: Vec<Relation>,
}

impl DependencyMatcher {
    pub fn builder(name: &str) -> DependencyPatternBuilder {
        DependencyPatternBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Names of the pattern nodes in declaration order.
    pub fn node_names(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.name.as_str()).collect()
    }

    fn search(&self, doc: &Document, bound: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        let k = bound.len();
        if k == self.nodes.len() {
            out.push(bound.clone());
            return;
        }

        let link = self.links[k - 1];
        for candidate in link.op.candidates(doc, bound[link.left]) {
            if bound.contains(&candidate) {
                continue;
            }
            let Some(token) = doc.token(candidate) else {
                continue;
            };
            if !self.nodes[k].attrs.matches(token) {
                continue;
            }
            bound.push(candidate);
            if self.constraints_hold(doc, bound, k) {
                self.search(doc, bound, out);
            }
            bound.pop();
        }
    }

    /// Check every constraint whose later endpoint is node `k`.
    fn constraints_hold(&self, doc: &Document, bound: &[usize], k: usize) -> bool {
        self.constraints
            .iter()
            .filter(|c| c.left.max(c.right) == k)
            .all(|c| c.op.holds(doc, bound[c.left], bound[c.right]))
    }
}

impl PatternMatcher for DependencyMatcher {
    type Match = DependencyMatch;

    /// All matches, ordered by their tokens in document order. Bindings that
    /// cover the same set of tokens are reported once.
    fn find_matches(&self, doc: &Document) -> Vec<DependencyMatch> {
        let mut raw = Vec::new();
        for token in doc.tokens() {
            if !self.nodes[0].attrs.matches(token) {
                continue;
            }
            let mut bound = vec![token.index];
            if self.nodes.len() == 1 {
                raw.push(bound);
                continue;
            }
            self.search(doc, &mut bound, &mut raw);
        }

        let mut seen = HashSet::new();
        let mut matches: Vec<DependencyMatch> = raw
            .into_iter()
            .map(|tokens| DependencyMatch {
                pattern: self.name.clone(),
                tokens,
            })
            .filter(|m| seen.insert(m.sorted_tokens()))
            .collect();
        matches.sort_by_key(|m| m.sorted_tokens());

        tracing::debug!(pattern = %self.name, matches = matches.len(), "dependency pattern matched");
        for m in &matches {
            tracing::trace!(pattern = %self.name, tokens = ?m.tokens, text = %m.text(doc), "match");
        }
        matches
    }
}

/// Builder for [`DependencyMatcher`].
///
/// Node names are resolved in [`build()`](Self::build), which fails fast on
/// a missing anchor, duplicate names or references to unknown nodes.
#[derive(Debug, Clone)]
pub struct DependencyPatternBuilder {
    name: String,
    anchor: Option<(String, TokenAttrs)>,
    nodes: Vec<(String, TokenAttrs, String, RelOp)>,
    constraints: Vec<(String, RelOp, String)>,
}

impl DependencyPatternBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            anchor: None,
            nodes: Vec::new(),
            constraints: Vec::new(),
        }
    }

    /// The node every match starts from.
    pub fn anchor(mut self, name: &str, attrs: TokenAttrs) -> Self {
        self.anchor = Some((name.to_string(), attrs));
        self
    }

    /// Add a node reached from `from` such that `from OP name` holds.
    pub fn node(mut self, name: &str, attrs: TokenAttrs, from: &str, op: RelOp) -> Self {
        self.nodes
            .push((name.to_string(), attrs, from.to_string(), op));
        self
    }

    /// Require `left OP right` between two declared nodes.
    pub fn constrain(mut self, left: &str, op: RelOp, right: &str) -> Self {
        self.constraints
            .push((left.to_string(), op, right.to_string()));
        self
    }

    pub fn build(self) -> Result<DependencyMatcher, PatternError> {
        let (anchor_name, anchor_attrs) = self
            .anchor
            .ok_or_else(|| PatternError::MissingAnchor(self.name.clone()))?;

        let mut nodes = vec![PatternNode {
            name: anchor_name,
            attrs: anchor_attrs,
        }];
        let position = |nodes: &[PatternNode], name: &str| {
            nodes
                .iter()
                .position(|n| n.name == name)
                .ok_or_else(|| PatternError::UnknownNode(name.to_string()))
        };

        let mut links = Vec::new();
        for (name, attrs, from, op) in self.nodes {
            if nodes.iter().any(|n| n.name == name) {
                return Err(PatternError::DuplicateNode(name));
            }
            let left = position(&nodes, &from)?;
            links.push(Relation {
                left,
                op,
                right: nodes.len(),
            });
            nodes.push(PatternNode { name, attrs });
        }

        let constraints = self
            .constraints
            .iter()
            .map(|(left, op, right)| {
                Ok(Relation {
                    left: position(&nodes, left)?,
                    op: *op,
                    right: position(&nodes, right)?,
                })
            })
            .collect::<Result<Vec<_>, PatternError>>()?;

        Ok(DependencyMatcher {
            name: self.name,
            nodes,
            links,
            constraints,
        })
    }
}
