use serde::{Deserialize, Serialize};

pub mod backend;
pub mod config_file;
pub mod document;
pub mod text_utils;

// Re-export for convenience
pub use backend::{BackendError, LanguagePipeline, PdfBackend, PipelineError};
pub use document::{Document, DocumentError, EntityLabel, EntitySpan, PartOfSpeech, Token};
pub use text_utils::{expand_ligatures, format_list};

/// The facts extracted from one judicial document.
///
/// Field names double as the keys of the JSON output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseFacts {
    /// Court and subject matter, e.g. "Juzgado Contencioso Administrativo".
    pub subject_matter: String,
    /// Literal date spans in document order, e.g. "17 de junio de 2021".
    pub dates: Vec<String>,
    /// What the court declares, e.g. "se declara admisible".
    pub ruling: String,
    /// Every person mention in document order (not deduplicated).
    pub persons: Vec<String>,
}

impl CaseFacts {
    /// True when none of the four extractions found anything.
    pub fn is_empty(&self) -> bool {
        self.subject_matter.is_empty()
            && self.dates.is_empty()
            && self.ruling.is_empty()
            && self.persons.is_empty()
    }
}

/// Which matches survive when a dependency pattern matches more than once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    /// Keep the first match in document order.
    First,
    /// Keep the last match in document order.
    #[default]
    Last,
    /// Keep every match, joined with `"; "`.
    All,
}

impl std::str::FromStr for MatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first" => Ok(MatchPolicy::First),
            "last" => Ok(MatchPolicy::Last),
            "all" => Ok(MatchPolicy::All),
            other => Err(format!(
                "unknown match policy '{}' (expected first, last or all)",
                other
            )),
        }
    }
}
