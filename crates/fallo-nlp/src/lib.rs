//! Language pipelines that produce annotated [`Document`]s.
//!
//! Parsers talk CoNLL-U (Universal Dependencies) with named-entity tags in the
//! MISC column (`NER=B-PER`). [`CommandPipeline`] drives an external parser
//! over stdin/stdout; [`ConlluFilePipeline`] loads a document that was parsed
//! ahead of time.

use std::path::Path;

pub mod conllu;
pub mod pipeline;

pub use conllu::{ConlluDocument, ConlluError, parse_conllu, read_document};
pub use pipeline::{CommandPipeline, ConlluFilePipeline};
// Re-export domain types from core (canonical definitions live there)
pub use fallo_core::{Document, LanguagePipeline, PipelineError};

/// Read a pre-parsed CoNLL-U file into a [`Document`].
pub fn read_conllu_file(path: &Path) -> Result<Document, PipelineError> {
    ConlluFilePipeline::new(path).parse("")
}
