//! # ocr-brief
//!
//! Turn a photo of printed text into a short translated summary.
//!
//! ## Why this crate?
//!
//! Receipts, notices and labels are often photographed rather than typed.
//! This crate reads the text off the photo, keeps only the sentences that
//! matter, and translates them, all behind a small upload form. Each step is
//! an external capability behind a trait, so Azure AI services, a vision LLM
//! or a test fake can be plugged in without touching the pipeline.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload
//!  │
//!  ├─ 1. Validate   extension allow-list, file-name sanitising
//!  ├─ 2. Asset      per-request temporary file, always released
//!  ├─ 3. OCR        ImageTextReader → first block's lines
//!  ├─ 4. Summarise  ExtractiveSummarizer → "Summary extracted: …"
//!  ├─ 5. Translate  Translator → one line per target language
//!  └─ 6. Output     message + state trail, failure and timings
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ocr_brief::capability::azure::{
//!     AzureImageReader, AzureLanguageConfig, AzureSummarizer, AzureTranslator,
//!     AzureTranslatorConfig, AzureVisionConfig,
//! };
//! use ocr_brief::{Pipeline, PipelineConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let reader = AzureImageReader::new(AzureVisionConfig::new(
//!         "https://my-vision.cognitiveservices.azure.com",
//!         std::env::var("AZURE_VISION_KEY")?,
//!     ))?;
//!     let summarizer = AzureSummarizer::new(AzureLanguageConfig::new(
//!         "https://my-language.cognitiveservices.azure.com",
//!         std::env::var("AZURE_LANGUAGE_KEY")?,
//!     ))?;
//!     let translator =
//!         AzureTranslator::new(AzureTranslatorConfig::new(std::env::var("AZURE_TRANSLATOR_KEY")?))?;
//!
//!     let pipeline = Pipeline::new(
//!         Arc::new(reader),
//!         Arc::new(summarizer),
//!         Arc::new(translator),
//!         PipelineConfig::default(),
//!     );
//!     let output = pipeline.process_file("receipt.png").await?;
//!     println!("{}", output.message);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `ocr-brief` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! ocr-brief = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod capability;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use capability::{
    DocumentSummaryOutcome, ExtractiveSummarizer, ImageTextReader, ReadResult, SummarySentence,
    TextBlock, TextLine, TranslatedText, TranslationOutcome, Translator,
};
pub use config::{PipelineConfig, PipelineConfigBuilder};
pub use error::{CapabilityError, OcrBriefError, RejectReason, StageError};
pub use orchestrator::Pipeline;
pub use output::{PipelineFailure, PipelineOutput, PipelineState, Stage, StageTimings};
pub use pipeline::validate::UploadedImage;
pub use progress::{NoopProgressCallback, PipelineProgressCallback, ProgressCallback};
pub use server::{router, serve};
