use std::path::Path;

use fallo_core::{
    CaseFacts, Document, EntityLabel, LanguagePipeline, MatchPolicy, PdfBackend,
};
use fallo_matcher::{DependencyMatch, DependencyMatcher, PatternMatcher, TokenMatcher};

use crate::{ExtractError, rules};

/// A case-fact extraction pipeline.
///
/// Holds one independent matcher per rule and exposes each pipeline step as
/// a method. Extraction only reads the document, so running it twice on the
/// same document gives the same [`CaseFacts`].
#[derive(Debug, Clone)]
pub struct FactExtractor {
    subject_matter: DependencyMatcher,
    ruling: DependencyMatcher,
    date: TokenMatcher,
    policy: MatchPolicy,
}

impl FactExtractor {
    /// Create an extractor that keeps the last dependency match.
    pub fn new() -> Result<Self, ExtractError> {
        Self::with_policy(MatchPolicy::default())
    }

    pub fn with_policy(policy: MatchPolicy) -> Result<Self, ExtractError> {
        Ok(Self {
            subject_matter: rules::subject_matter()?,
            ruling: rules::ruling()?,
            date: rules::date()?,
            policy,
        })
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    /// Extract raw text from a PDF file (step 1).
    pub fn extract_text(&self, path: &Path, backend: &dyn PdfBackend) -> Result<String, ExtractError> {
        Ok(backend.extract_text(path)?)
    }

    /// Parse text into an annotated document (step 2).
    pub fn parse(&self, text: &str, pipeline: &dyn LanguagePipeline) -> Result<Document, ExtractError> {
        Ok(pipeline.parse(text)?)
    }

    /// Court and subject matter, or `""` when the pattern does not occur.
    pub fn subject_matter(&self, doc: &Document) -> String {
        self.select(doc, self.subject_matter.find_matches(doc))
    }

    /// Literal date spans in document order.
    pub fn dates(&self, doc: &Document) -> Vec<String> {
        self.date
            .find_matches(doc)
            .iter()
            .map(|m| m.text(doc))
            .collect()
    }

    /// What the court declares, or `""` when the pattern does not occur.
    pub fn ruling(&self, doc: &Document) -> String {
        self.select(doc, self.ruling.find_matches(doc))
    }

    /// Every person entity in document order, duplicates included.
    pub fn persons(&self, doc: &Document) -> Vec<String> {
        doc.entities()
            .iter()
            .filter(|e| e.label == EntityLabel::Person)
            .map(|e| doc.entity_text(e))
            .collect()
    }

    /// Run the four extractions (steps 3 and 4).
    pub fn extract(&self, doc: &Document) -> CaseFacts {
        let subject_matter = self.subject_matter(doc);
        let dates = self.dates(doc);
        let ruling = self.ruling(doc);
        let persons = self.persons(doc);

        tracing::debug!(
            tokens = doc.len(),
            subject_matter = %subject_matter,
            dates = dates.len(),
            ruling = %ruling,
            persons = persons.len(),
            "extracted case facts"
        );

        CaseFacts {
            subject_matter,
            dates,
            ruling,
            persons,
        }
    }

    /// Run the pipeline on already-extracted text.
    pub fn extract_from_text(
        &self,
        text: &str,
        pipeline: &dyn LanguagePipeline,
    ) -> Result<CaseFacts, ExtractError> {
        let doc = self.parse(text, pipeline)?;
        Ok(self.extract(&doc))
    }

    /// Run the full pipeline on a PDF file.
    pub fn extract_case_facts(
        &self,
        path: &Path,
        backend: &dyn PdfBackend,
        pipeline: &dyn LanguagePipeline,
    ) -> Result<CaseFacts, ExtractError> {
        let text = self.extract_text(path, backend)?;
        self.extract_from_text(&text, pipeline)
    }

    fn select(&self, doc: &Document, matches: Vec<DependencyMatch>) -> String {
        match self.policy {
            MatchPolicy::First => matches.first().map(|m| m.text(doc)).unwrap_or_default(),
            MatchPolicy::Last => matches.last().map(|m| m.text(doc)).unwrap_or_default(),
            MatchPolicy::All => matches
                .iter()
                .map(|m| m.text(doc))
                .collect::<Vec<_>>()
                .join("; "),
        }
    }
}
