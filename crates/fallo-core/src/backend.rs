use std::path::Path;

use thiserror::Error;

use crate::document::{Document, DocumentError};

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to open PDF: {0}")]
    OpenError(String),
    #[error("failed to extract text: {0}")]
    ExtractionError(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("failed to start language pipeline '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("language pipeline exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
    #[error("malformed pipeline output: {0}")]
    Output(String),
    #[error("invalid document: {0}")]
    Document(#[from] DocumentError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for PDF text extraction backends.
///
/// Implementors provide the text acquisition step; the extraction rules
/// live in `fallo_extract::FactExtractor`.
pub trait PdfBackend: Send + Sync {
    /// Extract the text of every page, in page order, with no separator
    /// between pages.
    fn extract_text(&self, path: &Path) -> Result<String, BackendError>;
}

/// Trait for pretrained language pipelines.
///
/// A pipeline tokenizes, tags, lemmatizes, dependency-parses and runs
/// named-entity recognition over raw text, producing one [`Document`].
pub trait LanguagePipeline: Send + Sync {
    fn parse(&self, text: &str) -> Result<Document, PipelineError>;
}
