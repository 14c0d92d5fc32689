use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use fallo_core::{Document, LanguagePipeline, PipelineError};

use crate::conllu::{ConlluError, parse_conllu};

/// Runs an external parser that reads raw text on stdin and writes CoNLL-U
/// on stdout, e.g. `udpipe --tokenize --tag --parse spanish.udpipe`.
#[derive(Debug, Clone)]
pub struct CommandPipeline {
    program: String,
    args: Vec<String>,
}

impl CommandPipeline {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Build from a full argv (`[program, args...]`).
    pub fn from_argv(mut argv: Vec<String>) -> Result<Self, PipelineError> {
        if argv.is_empty() {
            return Err(PipelineError::Spawn {
                program: String::new(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "empty pipeline command",
                ),
            });
        }
        let program = argv.remove(0);
        Ok(Self::new(program, argv))
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl LanguagePipeline for CommandPipeline {
    fn parse(&self, text: &str) -> Result<Document, PipelineError> {
        tracing::debug!(program = %self.program, args = ?self.args, chars = text.len(), "running language pipeline");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| PipelineError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // Feed stdin from a separate thread so a parser that streams output
        // while reading cannot deadlock on a full pipe.
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| PipelineError::Output("child stdin unavailable".into()))?;
        let input = text.to_string();
        let writer = std::thread::spawn(move || -> std::io::Result<()> {
            stdin.write_all(input.as_bytes())?;
            stdin.flush()
        });

        let output = child.wait_with_output()?;
        let write_result = writer
            .join()
            .map_err(|_| PipelineError::Output("stdin writer panicked".into()))?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !output.status.success() {
            return Err(PipelineError::Failed {
                status: output.status.to_string(),
                stderr,
            });
        }
        // A parser may exit successfully without consuming all input.
        if let Err(e) = write_result
            && e.kind() != std::io::ErrorKind::BrokenPipe
        {
            return Err(PipelineError::Io(e));
        }
        if !stderr.is_empty() {
            tracing::warn!(program = %self.program, %stderr, "language pipeline wrote to stderr");
        }

        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| PipelineError::Output(format!("output is not UTF-8: {}", e)))?;
        read_tagged(&self.program, &stdout).map_err(|e| PipelineError::Output(e.to_string()))
    }
}

/// Read parser output, warning when it carries no entity tags at all.
fn read_tagged(source: &str, conllu: &str) -> Result<Document, ConlluError> {
    let parsed = parse_conllu(conllu)?;
    if parsed.lacks_entity_tags() {
        tracing::warn!(
            source,
            tokens = parsed.document.len(),
            "no NER tags in CoNLL-U output; persons cannot be found (use an NER-capable pipeline)"
        );
    }
    Ok(parsed.document)
}

/// A pipeline that ignores its input and loads a document parsed ahead of time.
#[derive(Debug, Clone)]
pub struct ConlluFilePipeline {
    path: PathBuf,
}

impl ConlluFilePipeline {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl LanguagePipeline for ConlluFilePipeline {
    fn parse(&self, _text: &str) -> Result<Document, PipelineError> {
        let content = std::fs::read_to_string(&self.path)?;
        read_tagged(&self.path.display().to_string(), &content).map_err(|e| {
            PipelineError::Output(format!("{}: {}", self.path.display(), e))
        })
    }
}
