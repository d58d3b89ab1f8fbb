//! CLI binary for ocr-brief.
//!
//! A thin shim over the library crate: maps flags and environment variables
//! onto capability adapters and a `PipelineConfig`, then either serves the
//! upload form (`serve`) or runs one local image (`run`).

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use ocr_brief::capability::azure::{
    AzureImageReader, AzureLanguageConfig, AzureSummarizer, AzureTranslator,
    AzureTranslatorConfig, AzureVisionConfig, DEFAULT_TRANSLATOR_ENDPOINT,
};
use ocr_brief::capability::vision_llm::{VisionLlmConfig, VisionLlmReader};
use ocr_brief::{
    ImageTextReader, Pipeline, PipelineConfig, PipelineProgressCallback, PipelineState,
    ProgressCallback, Stage,
};
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner with one log line per finished stage.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.set_message("Reading image…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl PipelineProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage) {
        self.bar.set_prefix("Running");
        self.bar.set_message(stage.to_string());
    }

    fn on_stage_complete(&self, stage: Stage, output_len: usize) {
        self.bar.println(format!(
            "  {} {:<14} {}",
            green("✓"),
            stage.to_string(),
            dim(&format!("{output_len:>5} chars")),
        ));
    }

    fn on_stage_error(&self, stage: Stage, error: &str) {
        self.bar.println(format!(
            "  {} {:<14} {}",
            red("✘"),
            stage.to_string(),
            red(error)
        ));
    }

    fn on_pipeline_complete(&self, last_state: PipelineState, message_len: usize) {
        self.bar.finish_and_clear();
        let mark = match last_state {
            PipelineState::Translated => green("✔"),
            PipelineState::Failed => red("✘"),
            _ => dim("·"),
        };
        eprintln!("{mark} finished after {last_state:?} ({message_len} chars)");
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Serve the upload form on port 5000
  ocr-brief serve --addr 0.0.0.0:5000

  # Process one photo and print the translated summary
  ocr-brief run receipt.jpg

  # Translate into two languages, keep at most 3 sentences
  ocr-brief run --to id,fr --max-sentences 3 receipt.jpg

  # Read the text with a vision LLM instead of Azure Image Analysis
  ocr-brief run --ocr-provider vlm --model gpt-4.1-mini receipt.jpg

  # Full diagnostics as JSON
  ocr-brief run --json receipt.jpg > result.json

ENVIRONMENT VARIABLES:
  AZURE_VISION_ENDPOINT       Image Analysis resource endpoint
  AZURE_VISION_KEY            Image Analysis subscription key
  AZURE_LANGUAGE_ENDPOINT     Language resource endpoint
  AZURE_LANGUAGE_KEY          Language subscription key
  AZURE_TRANSLATOR_ENDPOINT   Translator endpoint (default: global endpoint)
  AZURE_TRANSLATOR_KEY        Translator subscription key
  AZURE_TRANSLATOR_REGION     Translator resource region
  EDGEQUAKE_PROVIDER          Vision LLM provider for --ocr-provider vlm
  EDGEQUAKE_MODEL             Vision LLM model for --ocr-provider vlm
  RUST_LOG                    Overrides the log filter
"#;

/// Extract, summarise and translate the text in photos.
#[derive(Parser, Debug)]
#[command(
    name = "ocr-brief",
    version,
    about = "Extract, summarise and translate the text in photos",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "OCR_BRIEF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "OCR_BRIEF_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the upload form and result page over HTTP.
    Serve {
        /// Address to listen on.
        #[arg(long, env = "OCR_BRIEF_ADDR", default_value = "127.0.0.1:5000")]
        addr: SocketAddr,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Run one local image through the pipeline and print the result.
    Run {
        /// Image file to process.
        input: PathBuf,

        /// Output the full PipelineOutput as JSON instead of the message.
        #[arg(long, env = "OCR_BRIEF_JSON")]
        json: bool,

        /// Disable the progress spinner.
        #[arg(long, env = "OCR_BRIEF_NO_PROGRESS")]
        no_progress: bool,

        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OcrProviderArg {
    /// Azure Image Analysis "read".
    Azure,
    /// A vision LLM via edgequake-llm.
    Vlm,
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Which capability reads the text.
    #[arg(long, env = "OCR_BRIEF_OCR_PROVIDER", value_enum, default_value = "azure")]
    ocr_provider: OcrProviderArg,

    #[arg(long, env = "AZURE_VISION_ENDPOINT")]
    vision_endpoint: Option<String>,

    #[arg(long, env = "AZURE_VISION_KEY", hide_env_values = true)]
    vision_key: Option<String>,

    #[arg(long, env = "AZURE_LANGUAGE_ENDPOINT")]
    language_endpoint: Option<String>,

    #[arg(long, env = "AZURE_LANGUAGE_KEY", hide_env_values = true)]
    language_key: Option<String>,

    #[arg(long, env = "AZURE_TRANSLATOR_ENDPOINT", default_value = DEFAULT_TRANSLATOR_ENDPOINT)]
    translator_endpoint: String,

    #[arg(long, env = "AZURE_TRANSLATOR_KEY", hide_env_values = true)]
    translator_key: Option<String>,

    #[arg(long, env = "AZURE_TRANSLATOR_REGION")]
    translator_region: Option<String>,

    /// Vision LLM provider (openai, anthropic, gemini, ollama, …).
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Vision LLM model ID.
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// Maximum sentences in the summary (1–20).
    #[arg(long, env = "OCR_BRIEF_MAX_SENTENCES", default_value_t = 10,
          value_parser = clap::value_parser!(u32).range(1..=20))]
    max_sentences: u32,

    /// Language of the text in the image.
    #[arg(long = "from", env = "OCR_BRIEF_SOURCE_LANGUAGE", default_value = "en")]
    source_language: String,

    /// Target languages, comma-separated.
    #[arg(long = "to", env = "OCR_BRIEF_TARGET_LANGUAGES", value_delimiter = ',', default_value = "id")]
    target_languages: Vec<String>,

    /// Accepted file extensions, comma-separated.
    #[arg(long, env = "OCR_BRIEF_ALLOWED_EXTENSIONS", value_delimiter = ',')]
    allowed_extensions: Option<Vec<String>>,

    /// Largest accepted upload in bytes.
    #[arg(long, env = "OCR_BRIEF_MAX_UPLOAD_BYTES", default_value_t = 16 * 1024 * 1024)]
    max_upload_bytes: usize,

    /// Directory for temporary upload files.
    #[arg(long, env = "OCR_BRIEF_UPLOAD_DIR")]
    upload_dir: Option<PathBuf>,

    /// HTTP timeout per capability call in seconds.
    #[arg(long, env = "OCR_BRIEF_API_TIMEOUT", default_value_t = 30)]
    api_timeout: u64,

    /// Delay between summarisation job polls in milliseconds.
    #[arg(long, env = "OCR_BRIEF_POLL_INTERVAL_MS", default_value_t = 1000)]
    poll_interval_ms: u64,

    /// Summarisation job polls before giving up.
    #[arg(long, env = "OCR_BRIEF_MAX_POLLS", default_value_t = 60)]
    max_polls: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner replaces INFO logs during `run`; `serve` always logs.
    let show_progress = match &cli.command {
        Command::Run {
            json, no_progress, ..
        } => !cli.quiet && !*no_progress && !*json,
        Command::Serve { .. } => false,
    };
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Serve { addr, common } => {
            let pipeline = build_pipeline(&common, None)?;
            ocr_brief::serve(pipeline, addr)
                .await
                .context("Server failed")?;
        }
        Command::Run {
            input, json, common, ..
        } => {
            let progress: Option<ProgressCallback> = if show_progress {
                Some(CliProgressCallback::new() as Arc<dyn PipelineProgressCallback>)
            } else {
                None
            };
            let pipeline = build_pipeline(&common, progress)?;
            let output = pipeline
                .process_file(&input)
                .await
                .with_context(|| format!("Failed to process {}", input.display()))?;

            if json {
                let json =
                    serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
                println!("{json}");
            } else {
                println!("{}", output.message.trim_start_matches('\n'));
                if !cli.quiet {
                    if let Some(reason) = &output.rejection {
                        eprintln!("{} skipped: {}", dim("·"), reason);
                    }
                    if let Some(failure) = &output.failure {
                        eprintln!("{} {}", red("✘"), failure);
                    }
                }
            }
        }
    }

    Ok(())
}

/// Map CLI args to capability adapters and a `Pipeline`.
fn build_pipeline(args: &CommonArgs, progress: Option<ProgressCallback>) -> Result<Pipeline> {
    let reader: Arc<dyn ImageTextReader> = match args.ocr_provider {
        OcrProviderArg::Azure => {
            let mut config = AzureVisionConfig::new(
                args.vision_endpoint.clone().unwrap_or_default(),
                args.vision_key.clone().unwrap_or_default(),
            );
            config.timeout_secs = args.api_timeout;
            Arc::new(AzureImageReader::new(config)?)
        }
        OcrProviderArg::Vlm => {
            let config = VisionLlmConfig {
                provider_name: args.provider.clone(),
                model: args.model.clone(),
                ..Default::default()
            };
            Arc::new(VisionLlmReader::new(config)?)
        }
    };

    let mut language = AzureLanguageConfig::new(
        args.language_endpoint.clone().unwrap_or_default(),
        args.language_key.clone().unwrap_or_default(),
    );
    language.document_language = Some(args.source_language.clone());
    language.timeout_secs = args.api_timeout;
    language.poll_interval_ms = args.poll_interval_ms;
    language.max_polls = args.max_polls;
    let summarizer = AzureSummarizer::new(language)?;

    let mut translator = AzureTranslatorConfig::new(args.translator_key.clone().unwrap_or_default());
    translator.endpoint = args.translator_endpoint.clone();
    translator.region = args.translator_region.clone();
    translator.timeout_secs = args.api_timeout;
    let translator = AzureTranslator::new(translator)?;

    let mut builder = PipelineConfig::builder()
        .max_upload_bytes(args.max_upload_bytes)
        .max_sentences(args.max_sentences)
        .source_language(args.source_language.clone())
        .target_languages(args.target_languages.iter().map(|t| t.trim().to_string()));
    if let Some(ref exts) = args.allowed_extensions {
        builder = builder.allowed_extensions(exts);
    }
    if let Some(ref dir) = args.upload_dir {
        builder = builder.upload_dir(dir.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }
    let config = builder.build().context("Invalid configuration")?;

    Ok(Pipeline::new(
        reader,
        Arc::new(summarizer),
        Arc::new(translator),
        config,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_parses_language_list() {
        let cli = Cli::try_parse_from([
            "ocr-brief",
            "run",
            "--to",
            "id,fr",
            "--max-sentences",
            "3",
            "receipt.png",
        ])
        .unwrap();
        match cli.command {
            Command::Run { input, common, .. } => {
                assert_eq!(input, PathBuf::from("receipt.png"));
                assert_eq!(common.target_languages, vec!["id", "fr"]);
                assert_eq!(common.max_sentences, 3);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn sentence_limit_is_enforced() {
        assert!(Cli::try_parse_from(["ocr-brief", "run", "--max-sentences", "21", "a.png"]).is_err());
    }
}
