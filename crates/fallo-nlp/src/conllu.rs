//! CoNLL-U reader.
//!
//! Columns: `ID FORM LEMMA UPOS XPOS FEATS HEAD DEPREL DEPS MISC`.
//!
//! - Sentences are separated by blank lines; `#` comment lines are skipped.
//! - Heads are 1-based within the sentence; `0` and `_` mean no head.
//! - Multiword-token ranges (`3-4`) are not tokens; their spacing applies to
//!   the last word of the range.
//! - Empty nodes (`5.1`) are skipped.
//! - `SpaceAfter=No` and UDPipe's escaped `SpacesAfter=\n` in MISC give the
//!   whitespace that followed a word.
//! - `NER=<tag>` in MISC carries BIO/BILOU entity tags. MISC keys match
//!   case-insensitively, so Stanza's `ner=B-PER` is read too.

use thiserror::Error;

use fallo_core::{Document, DocumentError, EntityLabel, EntitySpan, PartOfSpeech, Token};

const COLUMNS: usize = 10;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConlluError {
    #[error("line {line}: {message}")]
    Line { line: usize, message: String },
    #[error(transparent)]
    Document(#[from] DocumentError),
}

fn line_error(line: usize, message: impl Into<String>) -> ConlluError {
    ConlluError::Line {
        line,
        message: message.into(),
    }
}

/// A word row waiting for its sentence to finish so its head can be resolved.
struct PendingWord {
    line: usize,
    form: String,
    lemma: String,
    upos: String,
    xpos: Option<String>,
    head: Option<usize>,
    deprel: String,
    space_after: String,
    ner: Option<String>,
}

/// Position inside a multiword token range.
struct MultiwordRange {
    last_id: usize,
    space_after: String,
}

#[derive(Default)]
struct Reader {
    tokens: Vec<Token>,
    entities: Vec<EntitySpan>,
    sentence: usize,
    pending: Vec<PendingWord>,
    range: Option<MultiwordRange>,
    entity_tagged: bool,
}

impl Reader {
    fn push_line(&mut self, line_no: usize, line: &str) -> Result<(), ConlluError> {
        let columns: Vec<&str> = line.split('\t').collect();
        if columns.len() != COLUMNS {
            return Err(line_error(
                line_no,
                format!("expected {} columns, found {}", COLUMNS, columns.len()),
            ));
        }

        let id = columns[0];
        if let Some((first, last)) = id.split_once('-') {
            let first: usize = first
                .parse()
                .map_err(|_| line_error(line_no, format!("invalid range id '{}'", id)))?;
            let last: usize = last
                .parse()
                .map_err(|_| line_error(line_no, format!("invalid range id '{}'", id)))?;
            if last < first {
                return Err(line_error(line_no, format!("empty range '{}'", id)));
            }
            self.range = Some(MultiwordRange {
                last_id: last,
                space_after: space_after(columns[9]),
            });
            return Ok(());
        }
        if id.contains('.') {
            return Ok(());
        }

        let id: usize = id
            .parse()
            .map_err(|_| line_error(line_no, format!("invalid token id '{}'", id)))?;
        if id != self.pending.len() + 1 {
            return Err(line_error(
                line_no,
                format!("token id {} out of sequence (expected {})", id, self.pending.len() + 1),
            ));
        }

        let head = match columns[6] {
            "_" | "0" => None,
            raw => Some(
                raw.parse::<usize>()
                    .map_err(|_| line_error(line_no, format!("invalid head '{}'", raw)))?,
            ),
        };

        let mut space = space_after(columns[9]);
        if let Some(range) = self.range.take() {
            if id < range.last_id {
                space = " ".to_string();
                self.range = Some(range);
            } else {
                space = range.space_after;
            }
        }

        let form = columns[1].to_string();
        let lemma = match columns[2] {
            "_" if form != "_" => form.to_lowercase(),
            lemma => lemma.to_string(),
        };

        self.pending.push(PendingWord {
            line: line_no,
            lemma,
            form,
            upos: columns[3].to_string(),
            xpos: (columns[4] != "_").then(|| columns[4].to_string()),
            head,
            deprel: if columns[7] == "_" {
                String::new()
            } else {
                columns[7].to_string()
            },
            space_after: space,
            ner: misc_value(columns[9], "NER").map(str::to_string),
        });
        self.entity_tagged |= self.pending.last().is_some_and(|w| w.ner.is_some());
        Ok(())
    }

    fn finish_sentence(&mut self) -> Result<(), ConlluError> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let offset = self.tokens.len();
        let len = self.pending.len();
        let mut open: Option<(usize, String)> = None;

        for (i, word) in std::mem::take(&mut self.pending).into_iter().enumerate() {
            let head = match word.head {
                Some(h) if h > len => {
                    return Err(line_error(
                        word.line,
                        format!("head {} outside sentence of {} words", h, len),
                    ));
                }
                Some(h) => Some(offset + h - 1),
                None => None,
            };
            let index = offset + i;

            match word.ner.as_deref().map(split_entity_tag) {
                None | Some(("O", _)) => self.close_entity(&mut open, index),
                Some(("B", label)) => {
                    self.close_entity(&mut open, index);
                    open = Some((index, label.to_string()));
                }
                Some(("U" | "S", label)) => {
                    self.close_entity(&mut open, index);
                    self.entities
                        .push(EntitySpan::new(index, index + 1, EntityLabel::parse(label)));
                }
                Some(("L" | "E", label)) => {
                    if !matches!(&open, Some((_, l)) if l == label) {
                        self.close_entity(&mut open, index);
                        open = Some((index, label.to_string()));
                    }
                    self.close_entity(&mut open, index + 1);
                }
                Some((_, label)) => {
                    if !matches!(&open, Some((_, l)) if l == label) {
                        self.close_entity(&mut open, index);
                        open = Some((index, label.to_string()));
                    }
                }
            }

            self.tokens.push(Token {
                index,
                text: word.form,
                lemma: word.lemma,
                pos: PartOfSpeech::from_upos(&word.upos),
                tag: word.xpos,
                dep: word.deprel,
                head,
                sentence: self.sentence,
                space_after: word.space_after,
            });
        }
        self.close_entity(&mut open, offset + len);

        self.sentence += 1;
        self.range = None;
        Ok(())
    }

    fn close_entity(&mut self, open: &mut Option<(usize, String)>, end: usize) {
        if let Some((start, label)) = open.take() {
            self.entities
                .push(EntitySpan::new(start, end, EntityLabel::parse(&label)));
        }
    }
}

/// `B-PER` -> `("B", "PER")`; a bare `PER` is treated as inside (`I`).
fn split_entity_tag(tag: &str) -> (&str, &str) {
    if tag == "O" || tag == "_" {
        return ("O", "");
    }
    match tag.split_once('-') {
        Some((prefix, label)) if prefix.len() == 1 => (prefix, label),
        _ => ("I", tag),
    }
}

fn misc_value<'a>(misc: &'a str, key: &str) -> Option<&'a str> {
    misc.split('|')
        .filter_map(|item| item.split_once('='))
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v)
}

/// Whitespace after a word: `""` for `SpaceAfter=No`, the decoded
/// `SpacesAfter` value when present, a single space otherwise.
fn space_after(misc: &str) -> String {
    if misc_value(misc, "SpaceAfter") == Some("No") {
        return String::new();
    }
    misc_value(misc, "SpacesAfter")
        .map(unescape_spaces)
        .unwrap_or_else(|| " ".to_string())
}

/// Undo the UD escaping of `SpacesAfter`: `\s`, `\t`, `\n`, `\r`, `\p` (`|`), `\\`.
fn unescape_spaces(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('s') => out.push(' '),
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('p') => out.push('|'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// A CoNLL-U document plus what the producer annotated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConlluDocument {
    pub document: Document,
    /// At least one word carried an `NER` key in MISC.
    pub entity_tagged: bool,
}

impl ConlluDocument {
    /// Words were read but none carried an entity tag: the producer has no
    /// NER step, so an empty person list means nothing.
    pub fn lacks_entity_tags(&self) -> bool {
        !self.document.is_empty() && !self.entity_tagged
    }
}

/// Parse CoNLL-U text into a single [`Document`] spanning all sentences.
pub fn read_document(input: &str) -> Result<Document, ConlluError> {
    parse_conllu(input).map(|parsed| parsed.document)
}

/// Like [`read_document`], also reporting whether entity tags were present.
pub fn parse_conllu(input: &str) -> Result<ConlluDocument, ConlluError> {
    let mut reader = Reader::default();

    for (i, raw) in input.lines().enumerate() {
        let line = raw.trim_end_matches('\r');
        if line.trim().is_empty() {
            reader.finish_sentence()?;
        } else if line.starts_with('#') {
            continue;
        } else {
            reader.push_line(i + 1, line)?;
        }
    }
    reader.finish_sentence()?;

    tracing::debug!(
        tokens = reader.tokens.len(),
        sentences = reader.sentence,
        entities = reader.entities.len(),
        entity_tagged = reader.entity_tagged,
        "read CoNLL-U document"
    );

    Ok(ConlluDocument {
        document: Document::new(reader.tokens, reader.entities)?,
        entity_tagged: reader.entity_tagged,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, form: &str, lemma: &str, upos: &str, head: &str, dep: &str, misc: &str) -> String {
        format!("{id}\t{form}\t{lemma}\t{upos}\t_\t_\t{head}\t{dep}\t_\t{misc}\n")
    }

    #[test]
    fn reads_heads_across_sentences() {
        let input = [
            "# sent_id = 1\n".to_string(),
            row("1", "Juan", "Juan", "PROPN", "2", "nsubj", "_"),
            row("2", "firma", "firmar", "VERB", "0", "root", "_"),
            "\n".to_string(),
            row("1", "Se", "él", "PRON", "2", "aux", "_"),
            row("2", "declara", "declarar", "VERB", "0", "root", "_"),
        ]
        .concat();
        let doc = read_document(&input).unwrap();
        assert_eq!(doc.len(), 4);
        assert_eq!(doc.tokens()[0].head, Some(1));
        assert_eq!(doc.tokens()[1].head, None);
        assert_eq!(doc.tokens()[2].head, Some(3));
        assert_eq!(doc.tokens()[2].sentence, 1);
        assert_eq!(doc.tokens()[3].pos, PartOfSpeech::Verb);
        assert_eq!(doc.children(3), &[2]);
    }

    #[test]
    fn space_after_no_joins_tokens() {
        let input = [
            row("1", "2021", "2021", "NUM", "0", "root", "SpaceAfter=No"),
            row("2", ".", ".", "PUNCT", "1", "punct", "_"),
        ]
        .concat();
        let doc = read_document(&input).unwrap();
        assert_eq!(doc.span_text(0, 2), "2021.");
    }

    #[test]
    fn multiword_token_space_applies_to_last_word() {
        let input = [
            row("1", "Corte", "corte", "NOUN", "0", "root", "_"),
            "2-3\tdel\t_\t_\t_\t_\t_\t_\t_\tSpaceAfter=No\n".to_string(),
            row("2", "de", "de", "ADP", "3", "case", "SpaceAfter=No"),
            row("3", "el", "el", "DET", "1", "nmod", "_"),
            row("4", ",", ",", "PUNCT", "1", "punct", "_"),
        ]
        .concat();
        let doc = read_document(&input).unwrap();
        assert_eq!(doc.len(), 4);
        assert_eq!(doc.tokens()[1].space_after, " ", "inner words stay separated");
        assert_eq!(doc.tokens()[2].space_after, "", "range SpaceAfter=No");
        assert_eq!(doc.span_text(0, 4), "Corte de el,");
    }

    #[test]
    fn spaces_after_keeps_line_breaks_in_dates() {
        let input = [
            row("1", "17", "17", "NUM", "3", "nummod", "_"),
            row("2", "de", "de", "ADP", "3", "case", "_"),
            row("3", "junio", "junio", "NOUN", "0", "root", r"SpacesAfter=\n"),
            row("4", "de", "de", "ADP", "5", "case", r"SpacesAfter=\s\s"),
            row("5", "2021", "2021", "NUM", "3", "nmod", r"SpacesAfter=\r\n"),
        ]
        .concat();
        let doc = read_document(&input).unwrap();
        assert_eq!(doc.tokens()[2].space_after, "\n");
        assert_eq!(doc.tokens()[4].space_after, "\r\n");
        assert_eq!(doc.span_text(0, 5), "17 de junio\nde  2021");
    }

    #[test]
    fn unescape_spaces_handles_every_escape() {
        assert_eq!(unescape_spaces(r"\s\t\n\r\p\\"), " \t\n\r|\\");
        assert_eq!(unescape_spaces(""), "");
        assert_eq!(unescape_spaces("\\"), "\\");
    }

    #[test]
    fn empty_nodes_and_comments_are_skipped() {
        let input = [
            "# text = Fue.\n".to_string(),
            row("1", "Fue", "ser", "AUX", "0", "root", "_"),
            "1.1\tfue\tser\tAUX\t_\t_\t_\t_\t0:root\t_\n".to_string(),
        ]
        .concat();
        let doc = read_document(&input).unwrap();
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn bio_tags_become_entity_spans() {
        let input = [
            row("1", "Juan", "Juan", "PROPN", "3", "nsubj", "NER=B-PER"),
            row("2", "Pérez", "Pérez", "PROPN", "1", "flat", "NER=I-PER"),
            row("3", "demanda", "demandar", "VERB", "0", "root", "NER=O"),
            row("4", "a", "a", "ADP", "6", "case", "NER=O"),
            row("5", "la", "el", "DET", "6", "det", "NER=O"),
            row("6", "Corte", "Corte", "PROPN", "3", "obj", "NER=B-ORG"),
            row("7", "Suprema", "Suprema", "PROPN", "6", "flat", "NER=I-ORG"),
        ]
        .concat();
        let doc = read_document(&input).unwrap();
        let entities = doc.entities();
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0], EntitySpan::new(0, 2, EntityLabel::Person));
        assert_eq!(doc.entity_text(&entities[0]), "Juan Pérez");
        assert_eq!(entities[1].label, EntityLabel::Organization);
        assert_eq!(doc.entity_text(&entities[1]), "Corte Suprema");
    }

    #[test]
    fn lowercase_ner_key_from_stanza_is_read() {
        let input = [
            row("1", "Juan", "Juan", "PROPN", "3", "nsubj", "start_char=0|end_char=4|ner=B-PER"),
            row("2", "Pérez", "Pérez", "PROPN", "1", "flat", "start_char=5|end_char=10|ner=E-PER"),
            row("3", "apeló", "apelar", "VERB", "0", "root", "start_char=11|end_char=16|ner=O"),
        ]
        .concat();
        let parsed = parse_conllu(&input).unwrap();
        assert!(parsed.entity_tagged);
        assert!(!parsed.lacks_entity_tags());
        let doc = parsed.document;
        assert_eq!(doc.entities(), &[EntitySpan::new(0, 2, EntityLabel::Person)]);
        assert_eq!(doc.entity_text(&doc.entities()[0]), "Juan Pérez");
    }

    #[test]
    fn output_without_ner_keys_is_flagged() {
        // UDPipe 1 rows: tokenizer ranges, no entity tags.
        let input = [
            row("1", "Juan", "Juan", "PROPN", "2", "nsubj", "TokenRange=0:4"),
            row("2", "apeló", "apelar", "VERB", "0", "root", "SpaceAfter=No|TokenRange=5:10"),
        ]
        .concat();
        let parsed = parse_conllu(&input).unwrap();
        assert!(!parsed.entity_tagged);
        assert!(parsed.lacks_entity_tags());
        assert!(parsed.document.entities().is_empty());

        assert!(!parse_conllu("").unwrap().lacks_entity_tags(), "empty input is not flagged");
    }

    #[test]
    fn stray_inside_tag_and_bilou_tags() {
        let input = [
            row("1", "María", "María", "PROPN", "0", "root", "NER=I-PER"),
            row("2", "y", "y", "CCONJ", "3", "cc", "_"),
            row("3", "Ana", "Ana", "PROPN", "1", "conj", "NER=U-PER"),
            row("4", "Gómez", "Gómez", "PROPN", "3", "flat", "NER=L-PER"),
        ]
        .concat();
        let doc = read_document(&input).unwrap();
        let texts: Vec<String> = doc.entities().iter().map(|e| doc.entity_text(e)).collect();
        assert_eq!(texts, vec!["María", "Ana", "Gómez"]);
    }

    #[test]
    fn entities_do_not_cross_sentences() {
        let input = [
            row("1", "Juan", "Juan", "PROPN", "0", "root", "NER=B-PER"),
            "\n".to_string(),
            row("1", "Pérez", "Pérez", "PROPN", "0", "root", "NER=I-PER"),
        ]
        .concat();
        let doc = read_document(&input).unwrap();
        assert_eq!(doc.entities().len(), 2);
    }

    #[test]
    fn malformed_lines_report_line_numbers() {
        let err = read_document("1\tJuan\tJuan\n").unwrap_err();
        assert_eq!(
            err,
            ConlluError::Line {
                line: 1,
                message: "expected 10 columns, found 3".to_string()
            }
        );

        let bad_head = [
            "# comment\n".to_string(),
            row("1", "Juan", "Juan", "PROPN", "7", "nsubj", "_"),
        ]
        .concat();
        match read_document(&bad_head).unwrap_err() {
            ConlluError::Line { line, message } => {
                assert_eq!(line, 2);
                assert!(message.contains("head 7"), "got: {message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let out_of_order = row("2", "Juan", "Juan", "PROPN", "0", "root", "_");
        assert!(matches!(
            read_document(&out_of_order),
            Err(ConlluError::Line { line: 1, .. })
        ));
    }

    #[test]
    fn empty_input_is_an_empty_document() {
        let doc = read_document("").unwrap();
        assert!(doc.is_empty());
        assert!(doc.entities().is_empty());
        assert!(read_document("\n\n# only comments\n").unwrap().is_empty());
    }

    #[test]
    fn missing_lemma_falls_back_to_lowercase_form() {
        let doc = read_document(&row("1", "Declara", "_", "VERB", "0", "root", "_")).unwrap();
        assert_eq!(doc.tokens()[0].lemma, "declara");
    }
}
