use std::path::Path;

use mupdf::{Document, TextPageFlags};

use fallo_core::{BackendError, PdfBackend, expand_ligatures};

/// MuPDF-based implementation of [`PdfBackend`].
///
/// This crate is the sole AGPL island: it isolates the mupdf dependency
/// (which is AGPL-3.0) so that the extraction rules and the language
/// pipeline do not transitively depend on it.
///
/// Each page's text is rebuilt from its text blocks, one line per `\n`.
/// Pages are concatenated with no separator, so a page without extractable
/// text contributes nothing.
#[derive(Debug, Clone, Default)]
pub struct MupdfBackend {
    /// Keep typographic ligatures (`ﬁ`, `ﬂ`, ...) instead of expanding them.
    keep_ligatures: bool,
}

impl MupdfBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep ligature code points as MuPDF reports them.
    pub fn with_ligatures_kept(mut self) -> Self {
        self.keep_ligatures = true;
        self
    }
}

impl PdfBackend for MupdfBackend {
    fn extract_text(&self, path: &Path) -> Result<String, BackendError> {
        let path_str = path
            .to_str()
            .ok_or_else(|| BackendError::OpenError("invalid path encoding".into()))?;

        if !path.exists() {
            return Err(BackendError::OpenError(format!(
                "{}: no such file",
                path.display()
            )));
        }

        // The document is dropped on every return path below, closing the file.
        let document =
            Document::open(path_str).map_err(|e| BackendError::OpenError(e.to_string()))?;

        let mut pages_text = Vec::new();

        for page_result in document
            .pages()
            .map_err(|e| BackendError::ExtractionError(e.to_string()))?
        {
            let page = page_result.map_err(|e| BackendError::ExtractionError(e.to_string()))?;
            let text_page = page
                .to_text_page(TextPageFlags::empty())
                .map_err(|e| BackendError::ExtractionError(e.to_string()))?;

            let mut page_text = String::new();
            for block in text_page.blocks() {
                for line in block.lines() {
                    let line_text: String = line
                        .chars()
                        .map(|c| c.char().unwrap_or('\u{FFFD}'))
                        .collect();
                    page_text.push_str(&line_text);
                    page_text.push('\n');
                }
            }
            pages_text.push(page_text);
        }

        let text = pages_text.concat();
        tracing::debug!(
            path = %path.display(),
            pages = pages_text.len(),
            chars = text.chars().count(),
            "extracted PDF text"
        );

        if self.keep_ligatures {
            Ok(text)
        } else {
            Ok(expand_ligatures(&text))
        }
    }
}
