use std::path::Path;

use thiserror::Error;

pub mod extractor;
pub mod rules;

pub use extractor::FactExtractor;
// Re-export domain types from core (canonical definitions live there)
pub use fallo_core::{BackendError, CaseFacts, LanguagePipeline, MatchPolicy, PdfBackend, PipelineError};

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("could not read document: {0}")]
    Read(#[from] BackendError),
    #[error("could not parse document: {0}")]
    Parse(#[from] PipelineError),
    #[error("invalid extraction pattern: {0}")]
    Pattern(#[from] fallo_matcher::PatternError),
}

/// Extract case facts from a PDF file.
///
/// Pipeline:
/// 1. Extract text from the PDF via `backend`
/// 2. Parse the text once via `pipeline`
/// 3. Match the subject-matter, date and ruling patterns
/// 4. Collect person entities
///
/// Nothing is returned unless every step succeeds.
pub fn extract_case_facts(
    pdf_path: &Path,
    backend: &dyn PdfBackend,
    pipeline: &dyn LanguagePipeline,
) -> Result<CaseFacts, ExtractError> {
    FactExtractor::new()?.extract_case_facts(pdf_path, backend, pipeline)
}
