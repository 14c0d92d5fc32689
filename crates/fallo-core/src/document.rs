//! Annotated document model produced by a [`LanguagePipeline`](crate::LanguagePipeline).
//!
//! A [`Document`] is a flat sequence of [`Token`]s covering every sentence of
//! the input, plus the named-entity spans recognized over it. Dependency heads
//! are stored as document-level token indices so patterns can walk the tree
//! without knowing about sentence boundaries.

use std::fmt;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    #[error("token at position {position} has index {index}")]
    IndexMismatch { position: usize, index: usize },
    #[error("token {token} has head {head} outside the document ({len} tokens)")]
    HeadOutOfRange { token: usize, head: usize, len: usize },
    #[error("token {0} is its own head")]
    SelfHead(usize),
    #[error("entity span {start}..{end} is empty or outside the document ({len} tokens)")]
    EntityOutOfRange { start: usize, end: usize, len: usize },
    #[error("entity spans {0:?} and {1:?} overlap")]
    OverlappingEntities((usize, usize), (usize, usize)),
}

/// Universal Dependencies part-of-speech tag (UPOS).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PartOfSpeech {
    Adj,
    Adp,
    Adv,
    Aux,
    Cconj,
    Det,
    Intj,
    Noun,
    Num,
    Part,
    Pron,
    Propn,
    Punct,
    Sconj,
    Sym,
    Verb,
    X,
    Other(String),
}

impl PartOfSpeech {
    /// Parse a UPOS tag. Unknown tags are kept verbatim in [`PartOfSpeech::Other`].
    pub fn from_upos(tag: &str) -> Self {
        match tag.to_ascii_uppercase().as_str() {
            "ADJ" => PartOfSpeech::Adj,
            "ADP" => PartOfSpeech::Adp,
            "ADV" => PartOfSpeech::Adv,
            "AUX" => PartOfSpeech::Aux,
            "CCONJ" => PartOfSpeech::Cconj,
            "DET" => PartOfSpeech::Det,
            "INTJ" => PartOfSpeech::Intj,
            "NOUN" => PartOfSpeech::Noun,
            "NUM" => PartOfSpeech::Num,
            "PART" => PartOfSpeech::Part,
            "PRON" => PartOfSpeech::Pron,
            "PROPN" => PartOfSpeech::Propn,
            "PUNCT" => PartOfSpeech::Punct,
            "SCONJ" => PartOfSpeech::Sconj,
            "SYM" => PartOfSpeech::Sym,
            "VERB" => PartOfSpeech::Verb,
            "X" => PartOfSpeech::X,
            _ => PartOfSpeech::Other(tag.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PartOfSpeech::Adj => "ADJ",
            PartOfSpeech::Adp => "ADP",
            PartOfSpeech::Adv => "ADV",
            PartOfSpeech::Aux => "AUX",
            PartOfSpeech::Cconj => "CCONJ",
            PartOfSpeech::Det => "DET",
            PartOfSpeech::Intj => "INTJ",
            PartOfSpeech::Noun => "NOUN",
            PartOfSpeech::Num => "NUM",
            PartOfSpeech::Part => "PART",
            PartOfSpeech::Pron => "PRON",
            PartOfSpeech::Propn => "PROPN",
            PartOfSpeech::Punct => "PUNCT",
            PartOfSpeech::Sconj => "SCONJ",
            PartOfSpeech::Sym => "SYM",
            PartOfSpeech::Verb => "VERB",
            PartOfSpeech::X => "X",
            PartOfSpeech::Other(tag) => tag,
        }
    }
}

impl fmt::Display for PartOfSpeech {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic category of a named-entity span.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityLabel {
    Person,
    Organization,
    Location,
    Misc,
    Other(String),
}

impl EntityLabel {
    /// Parse a label as emitted by common Spanish NER models
    /// (`PER`, `ORG`, `LOC`, `MISC`) or OntoNotes-style ones (`PERSON`, `GPE`).
    pub fn parse(label: &str) -> Self {
        match label.to_ascii_uppercase().as_str() {
            "PER" | "PERSON" => EntityLabel::Person,
            "ORG" | "ORGANIZATION" => EntityLabel::Organization,
            "LOC" | "GPE" | "LOCATION" => EntityLabel::Location,
            "MISC" => EntityLabel::Misc,
            _ => EntityLabel::Other(label.to_string()),
        }
    }
}

/// A single annotated token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Position in the document token sequence.
    pub index: usize,
    /// Surface text.
    pub text: String,
    pub lemma: String,
    pub pos: PartOfSpeech,
    /// Language-specific tag (XPOS), if the pipeline provides one.
    pub tag: Option<String>,
    /// Dependency relation to the head, e.g. `nmod`, `flat`, `aux`.
    pub dep: String,
    /// Document-level index of the syntactic head; `None` for a sentence root.
    pub head: Option<usize>,
    /// 0-based sentence number.
    pub sentence: usize,
    /// Whitespace that followed this token in the original text (`""` when
    /// the next token is glued to it, `"\n"` at a line break).
    pub space_after: String,
}

impl Token {
    /// Lowercase surface form.
    pub fn lower(&self) -> String {
        self.text.to_lowercase()
    }
}

/// A recognized named-entity span over token indices (`end` exclusive).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySpan {
    pub start: usize,
    pub end: usize,
    pub label: EntityLabel,
}

impl EntitySpan {
    pub fn new(start: usize, end: usize, label: EntityLabel) -> Self {
        Self { start, end, label }
    }
}

/// An immutable annotated document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    tokens: Vec<Token>,
    entities: Vec<EntitySpan>,
    children: Vec<Vec<usize>>,
}

impl Document {
    /// Build a document, validating token indices, heads and entity spans.
    ///
    /// Entity spans are sorted by start position; overlapping spans are rejected.
    pub fn new(tokens: Vec<Token>, mut entities: Vec<EntitySpan>) -> Result<Self, DocumentError> {
        let len = tokens.len();
        let mut children = vec![Vec::new(); len];

        for (position, token) in tokens.iter().enumerate() {
            if token.index != position {
                return Err(DocumentError::IndexMismatch {
                    position,
                    index: token.index,
                });
            }
            if let Some(head) = token.head {
                if head >= len {
                    return Err(DocumentError::HeadOutOfRange {
                        token: position,
                        head,
                        len,
                    });
                }
                if head == position {
                    return Err(DocumentError::SelfHead(position));
                }
                children[head].push(position);
            }
        }

        entities.sort_by_key(|e| (e.start, e.end));
        for entity in &entities {
            if entity.start >= entity.end || entity.end > len {
                return Err(DocumentError::EntityOutOfRange {
                    start: entity.start,
                    end: entity.end,
                    len,
                });
            }
        }
        for pair in entities.windows(2) {
            if pair[1].start < pair[0].end {
                return Err(DocumentError::OverlappingEntities(
                    (pair[0].start, pair[0].end),
                    (pair[1].start, pair[1].end),
                ));
            }
        }

        Ok(Self {
            tokens,
            entities,
            children,
        })
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn token(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    /// Direct dependents of a token, in document order.
    pub fn children(&self, index: usize) -> &[usize] {
        self.children.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Entity spans in document order.
    pub fn entities(&self) -> &[EntitySpan] {
        &self.entities
    }

    /// Surface text of tokens `start..end`, joined by their original whitespace.
    ///
    /// Trailing whitespace after the last token is not included.
    pub fn span_text(&self, start: usize, end: usize) -> String {
        let end = end.min(self.tokens.len());
        let mut text = String::new();
        let tokens = &self.tokens[start.min(end)..end];
        for (i, token) in tokens.iter().enumerate() {
            text.push_str(&token.text);
            if i + 1 < tokens.len() {
                text.push_str(&token.space_after);
            }
        }
        text
    }

    pub fn entity_text(&self, entity: &EntitySpan) -> String {
        self.span_text(entity.start, entity.end)
    }
}
