//! End-to-end extraction over parsed judicial text.
//!
//! The PDF backend and the language pipeline are replaced by in-memory stubs:
//! the "PDF text" is already CoNLL-U, and the stub pipeline reads it with the
//! real CoNLL-U reader. Fixtures live in `test-data/conllu/`.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use fallo_core::{BackendError, CaseFacts, Document, LanguagePipeline, PdfBackend, PipelineError};
use fallo_extract::{ExtractError, FactExtractor, extract_case_facts};

const ADMISSIBLE: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../test-data/conllu/juzgado_admisible.conllu"
));
const APPEAL: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../test-data/conllu/apelacion_personas.conllu"
));

/// Returns fixed text for any path.
struct TextBackend(&'static str);

impl PdfBackend for TextBackend {
    fn extract_text(&self, _path: &Path) -> Result<String, BackendError> {
        Ok(self.0.to_string())
    }
}

struct BrokenBackend;

impl PdfBackend for BrokenBackend {
    fn extract_text(&self, path: &Path) -> Result<String, BackendError> {
        Err(BackendError::OpenError(format!("{}: corrupt", path.display())))
    }
}

/// Treats its input as CoNLL-U and counts how often it runs.
#[derive(Default)]
struct ConlluTextPipeline {
    calls: AtomicUsize,
}

impl LanguagePipeline for ConlluTextPipeline {
    fn parse(&self, text: &str) -> Result<Document, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        fallo_nlp::read_document(text).map_err(|e| PipelineError::Output(e.to_string()))
    }
}

struct BrokenPipeline;

impl LanguagePipeline for BrokenPipeline {
    fn parse(&self, _text: &str) -> Result<Document, PipelineError> {
        Err(PipelineError::Failed {
            status: "exit status: 1".into(),
            stderr: "model not found".into(),
        })
    }
}

fn parse(conllu: &str) -> Document {
    fallo_nlp::read_document(conllu).unwrap()
}

#[test]
fn admissible_ruling_scenario() {
    let pipeline = ConlluTextPipeline::default();
    let facts = extract_case_facts(
        Path::new("textoJudicial.pdf"),
        &TextBackend(ADMISSIBLE),
        &pipeline,
    )
    .unwrap();

    assert_eq!(
        facts,
        CaseFacts {
            subject_matter: "Juzgado Contencioso Administrativo".into(),
            dates: vec!["17 de junio de 2021".into()],
            ruling: "se declara admisible".into(),
            persons: vec![],
        }
    );
    assert_eq!(pipeline.calls.load(Ordering::SeqCst), 1, "document is parsed once");
}

#[test]
fn two_dates_in_document_order() {
    let facts = FactExtractor::new().unwrap().extract(&parse(APPEAL));
    assert_eq!(facts.dates, vec!["3 de marzo de 2020", "17 de junio de 2021"]);
}

#[test]
fn absent_patterns_are_empty_not_errors() {
    let facts = FactExtractor::new().unwrap().extract(&parse(APPEAL));
    assert_eq!(facts.ruling, "");
    assert_eq!(facts.subject_matter, "");
}

#[test]
fn persons_only_and_not_deduplicated() {
    let doc = parse(APPEAL);
    let extractor = FactExtractor::new().unwrap();
    assert_eq!(extractor.persons(&doc), vec!["Juan Pérez", "Juan Pérez"]);

    // First sentence alone: one person, one organization.
    let first_sentence = APPEAL.split("\n\n").next().unwrap();
    let doc = parse(first_sentence);
    assert_eq!(doc.entities().len(), 2);
    assert_eq!(extractor.persons(&doc), vec!["Juan Pérez"]);
}

#[test]
fn subject_matter_ignores_surrounding_text() {
    let wrapped = format!("{APPEAL}\n{ADMISSIBLE}\n{APPEAL}");
    let facts = FactExtractor::new().unwrap().extract(&parse(&wrapped));
    assert_eq!(facts.subject_matter, "Juzgado Contencioso Administrativo");
    assert_eq!(facts.ruling, "se declara admisible");
    assert_eq!(facts.dates.len(), 5);
    assert_eq!(facts.persons.len(), 4);
}

#[test]
fn extraction_is_deterministic() {
    let doc = parse(ADMISSIBLE);
    let extractor = FactExtractor::new().unwrap();
    assert_eq!(extractor.extract(&doc), extractor.extract(&doc));
}

#[test]
fn zero_pages_yield_empty_results() {
    let facts = extract_case_facts(
        Path::new("vacio.pdf"),
        &TextBackend(""),
        &ConlluTextPipeline::default(),
    )
    .unwrap();
    assert_eq!(facts, CaseFacts::default());
}

#[test]
fn unreadable_pdf_is_a_read_error() {
    let pipeline = ConlluTextPipeline::default();
    let err = extract_case_facts(Path::new("roto.pdf"), &BrokenBackend, &pipeline).unwrap_err();
    assert!(matches!(err, ExtractError::Read(_)), "got: {err:?}");
    assert_eq!(pipeline.calls.load(Ordering::SeqCst), 0, "parsing never starts");
}

#[test]
fn pipeline_failure_is_a_parse_error() {
    let err = extract_case_facts(
        Path::new("textoJudicial.pdf"),
        &TextBackend(ADMISSIBLE),
        &BrokenPipeline,
    )
    .unwrap_err();
    assert!(matches!(err, ExtractError::Parse(_)), "got: {err:?}");
    assert!(err.to_string().contains("model not found"));
}

#[test]
fn facts_serialize_with_stable_field_names() {
    let facts = FactExtractor::new().unwrap().extract(&parse(ADMISSIBLE));
    let json = serde_json::to_value(&facts).unwrap();
    assert_eq!(json["subject_matter"], "Juzgado Contencioso Administrativo");
    assert_eq!(json["dates"][0], "17 de junio de 2021");
    assert_eq!(json["ruling"], "se declara admisible");
    assert_eq!(json["persons"].as_array().unwrap().len(), 0);
}
