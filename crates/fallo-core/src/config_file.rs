use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::MatchPolicy;

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub pipeline: Option<PipelineConfig>,
    pub extraction: Option<ExtractionConfig>,
    pub display: Option<DisplayConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Program and leading arguments of the language pipeline.
    pub command: Option<Vec<String>>,
    /// Model file appended as the last argument.
    pub model: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    pub match_policy: Option<MatchPolicy>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub color: Option<bool>,
}

/// Default language pipeline: UDPipe 1 reading stdin and writing CoNLL-U.
///
/// UDPipe has no NER step, so this pipeline finds no persons. The shipped
/// `fallo.example.toml` configures `scripts/stanza-conllu.py`, which does.
pub const DEFAULT_PIPELINE_COMMAND: &[&str] = &["udpipe", "--tokenize", "--tag", "--parse"];

/// Default UDPipe model for Spanish.
pub const DEFAULT_MODEL: &str = "spanish-ancora-ud-2.5-191206.udpipe";

impl ConfigFile {
    /// Full argv of the language pipeline: command followed by the model.
    pub fn pipeline_argv(&self) -> Vec<String> {
        let pipeline = self.pipeline.as_ref();
        let mut argv = pipeline
            .and_then(|p| p.command.clone())
            .unwrap_or_else(|| DEFAULT_PIPELINE_COMMAND.iter().map(|s| s.to_string()).collect());
        let model = pipeline
            .and_then(|p| p.model.clone())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        if !model.is_empty() {
            argv.push(model);
        }
        argv
    }

    pub fn match_policy(&self) -> MatchPolicy {
        self.extraction
            .as_ref()
            .and_then(|e| e.match_policy)
            .unwrap_or_default()
    }

    pub fn color(&self) -> bool {
        self.display.as_ref().and_then(|d| d.color).unwrap_or(true)
    }
}

/// Platform config directory path: `<config_dir>/fallo/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("fallo").join("config.toml"))
}

/// Load config by cascading CWD `.fallo.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".fallo.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparsable config file");
            None
        }
    }
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    ConfigFile {
        pipeline: Some(PipelineConfig {
            command: overlay
                .pipeline
                .as_ref()
                .and_then(|p| p.command.clone())
                .or_else(|| base.pipeline.as_ref().and_then(|p| p.command.clone())),
            model: overlay
                .pipeline
                .as_ref()
                .and_then(|p| p.model.clone())
                .or_else(|| base.pipeline.as_ref().and_then(|p| p.model.clone())),
        }),
        extraction: Some(ExtractionConfig {
            match_policy: overlay
                .extraction
                .as_ref()
                .and_then(|e| e.match_policy)
                .or_else(|| base.extraction.as_ref().and_then(|e| e.match_policy)),
        }),
        display: Some(DisplayConfig {
            color: overlay
                .display
                .as_ref()
                .and_then(|d| d.color)
                .or_else(|| base.display.as_ref().and_then(|d| d.color)),
        }),
    }
}
