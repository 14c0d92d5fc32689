use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use fallo_core::config_file::{self, ConfigFile, ExtractionConfig, PipelineConfig};
use fallo_core::{MatchPolicy, PdfBackend};
use fallo_extract::FactExtractor;
use fallo_nlp::CommandPipeline;
use fallo_pdf_mupdf::MupdfBackend;

mod output;

use output::ColorMode;

/// Case-fact extractor - Find the court, dates, ruling and people in a judicial PDF
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract case facts from a PDF, or from a pre-parsed .conllu file
    Extract {
        /// Path to the PDF or .conllu file
        file_path: PathBuf,

        /// Print the facts as JSON
        #[arg(long)]
        json: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,

        /// Path to output file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Language pipeline command, split on whitespace (e.g. "udpipe --tokenize --tag --parse").
        /// Programs or arguments containing spaces must go in the config file's `command` array.
        #[arg(long)]
        pipeline: Option<String>,

        /// Model file passed as the last pipeline argument
        #[arg(long)]
        model: Option<String>,

        /// Which match to keep when a pattern matches more than once
        #[arg(long)]
        match_policy: Option<MatchPolicy>,

        /// Extra TOML config file, applied over the default config locations
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print the text extracted from a PDF
    Text {
        /// Path to the PDF file
        file_path: PathBuf,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,

        /// Path to output file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Extra TOML config file, applied over the default config locations
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Extract {
            file_path,
            json,
            no_color,
            output,
            pipeline,
            model,
            match_policy,
            config,
        } => {
            let overrides = ConfigFile {
                pipeline: Some(PipelineConfig {
                    command: pipeline.as_deref().map(split_command),
                    model,
                }),
                extraction: Some(ExtractionConfig { match_policy }),
                display: None,
            };
            let config = resolve_config(config.as_deref(), overrides)?;
            let color = color_mode(no_color, output.as_deref(), &config);
            extract(&file_path, &config, json, output.as_deref(), color)
        }
        Command::Text {
            file_path,
            no_color,
            output,
            config,
        } => {
            let config = resolve_config(config.as_deref(), ConfigFile::default())?;
            let color = color_mode(no_color, output.as_deref(), &config);
            text(&file_path, output.as_deref(), color)
        }
    }
}

/// Logs go to stderr so they never mix with the report on stdout.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Whitespace split with no quoting: a path containing spaces cannot be
/// expressed here, only in the TOML `command` array.
fn split_command(command: &str) -> Vec<String> {
    command.split_whitespace().map(str::to_string).collect()
}

/// Overlay built from `FALLO_PIPELINE` (split on whitespace) and `FALLO_MODEL` (kept whole).
fn env_overrides(pipeline: Option<String>, model: Option<String>) -> ConfigFile {
    ConfigFile {
        pipeline: Some(PipelineConfig {
            command: pipeline
                .as_deref()
                .map(split_command)
                .filter(|argv| !argv.is_empty()),
            model,
        }),
        extraction: None,
        display: None,
    }
}

/// Config files: `--config` > `.fallo.toml` > platform config.
fn load_config_files(config_path: Option<&Path>) -> anyhow::Result<ConfigFile> {
    let config = config_file::load_config();
    let Some(path) = config_path else {
        return Ok(config);
    };
    if !path.exists() {
        anyhow::bail!("Config file not found: {}", path.display());
    }
    let explicit = config_file::load_from_path(path)
        .ok_or_else(|| anyhow::anyhow!("Could not parse config file: {}", path.display()))?;
    Ok(config_file::merge(config, explicit))
}

/// CLI flags > env vars > config files.
fn layer_config(files: ConfigFile, env: ConfigFile, cli: ConfigFile) -> ConfigFile {
    config_file::merge(config_file::merge(files, env), cli)
}

fn resolve_config(config_path: Option<&Path>, cli: ConfigFile) -> anyhow::Result<ConfigFile> {
    let files = load_config_files(config_path)?;
    let env = env_overrides(
        std::env::var("FALLO_PIPELINE").ok(),
        std::env::var("FALLO_MODEL").ok(),
    );
    Ok(layer_config(files, env, cli))
}

/// Colour only on stdout, and only when neither `--no-color` nor the config turns it off.
fn color_mode(no_color: bool, output: Option<&Path>, config: &ConfigFile) -> ColorMode {
    ColorMode(!no_color && output.is_none() && config.color())
}

fn open_writer(output: Option<&Path>) -> anyhow::Result<Box<dyn Write>> {
    Ok(match output {
        Some(path) => Box::new(std::fs::File::create(path)?),
        None => Box::new(std::io::stdout()),
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn is_conllu(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case("conllu"))
        .unwrap_or(false)
}

fn extract(
    file_path: &Path,
    config: &ConfigFile,
    json: bool,
    output: Option<&Path>,
    color: ColorMode,
) -> anyhow::Result<()> {
    if !file_path.exists() {
        anyhow::bail!("File not found: {}", file_path.display());
    }

    let extractor = FactExtractor::with_policy(config.match_policy())?;

    // Everything is computed before the writer is opened, so a failure
    // leaves no partial report behind.
    let facts = if is_conllu(file_path) {
        let doc = fallo_nlp::read_conllu_file(file_path)?;
        extractor.extract(&doc)
    } else {
        let pipeline = CommandPipeline::from_argv(config.pipeline_argv())?;
        tracing::info!(program = pipeline.program(), file = %file_path.display(), "extracting case facts");
        extractor.extract_case_facts(file_path, &MupdfBackend::new(), &pipeline)?
    };

    let mut writer = open_writer(output)?;
    if json {
        output::print_json(&mut writer, &facts)?;
    } else {
        output::print_case_facts(&mut writer, &facts, color)?;
    }
    writer.flush()?;
    Ok(())
}

fn text(file_path: &Path, output: Option<&Path>, color: ColorMode) -> anyhow::Result<()> {
    if !file_path.exists() {
        anyhow::bail!("File not found: {}", file_path.display());
    }

    let text = MupdfBackend::new().extract_text(file_path)?;

    let mut writer = open_writer(output)?;
    output::print_text(&mut writer, &file_name(file_path), &text, color)?;
    writer.flush()?;
    Ok(())
}
