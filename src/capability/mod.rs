//! External capabilities the pipeline orchestrates.
//!
//! Each stage talks to exactly one single-method trait, so providers can be
//! swapped (Azure, a vision LLM, an in-process fake in tests) without
//! touching the orchestrator.
//!
//! | Trait | Used by | Adapters |
//! |-------|---------|----------|
//! | [`ImageTextReader`] | OCR stage | [`azure::AzureImageReader`], [`vision_llm::VisionLlmReader`] |
//! | [`ExtractiveSummarizer`] | summarisation stage | [`azure::AzureSummarizer`] |
//! | [`Translator`] | translation stage | [`azure::AzureTranslator`] |

pub mod azure;
pub mod postprocess;
pub mod vision_llm;

use crate::error::CapabilityError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// ── Image text reading ──────────────────────────────────────────────────────

/// One line of recognised text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextLine {
    pub text: String,
}

/// A block of lines the reader grouped together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBlock {
    pub lines: Vec<TextLine>,
}

/// Result of a "read" analysis. `blocks` is `None` when the reader found
/// nothing readable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadResult {
    pub blocks: Option<Vec<TextBlock>>,
}

impl ReadResult {
    /// Build a single-block result from plain lines.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let lines = lines
            .into_iter()
            .map(|text| TextLine { text: text.into() })
            .collect();
        Self {
            blocks: Some(vec![TextBlock { lines }]),
        }
    }
}

/// Extracts printed text from raw image bytes.
#[async_trait]
pub trait ImageTextReader: Send + Sync {
    /// Short provider name used in logs.
    fn name(&self) -> &'static str;

    /// Run text reading (and only text reading) on the image.
    async fn analyze(&self, image: &[u8]) -> Result<ReadResult, CapabilityError>;
}

// ── Extractive summarisation ────────────────────────────────────────────────

/// A sentence chosen by the summariser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummarySentence {
    pub text: String,
    #[serde(default)]
    pub rank_score: Option<f64>,
}

impl SummarySentence {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            rank_score: None,
        }
    }
}

/// Per-document outcome of a summarisation job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DocumentSummaryOutcome {
    /// The service reported an error for this document without failing the job.
    Error { code: String, message: String },
    /// Sentences in the order the service returned them.
    Sentences(Vec<SummarySentence>),
}

/// Picks the key sentences of each document.
///
/// Implementations may run a long-running job and poll it; the call returns
/// only once the job has finished.
#[async_trait]
pub trait ExtractiveSummarizer: Send + Sync {
    fn name(&self) -> &'static str;

    /// One outcome per input document, in input order.
    async fn summarize(
        &self,
        documents: &[String],
        max_sentences: u32,
    ) -> Result<Vec<DocumentSummaryOutcome>, CapabilityError>;
}

// ── Translation ─────────────────────────────────────────────────────────────

/// Text rendered into one target language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslatedText {
    pub to: String,
    pub text: String,
}

/// All translations of one input item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationOutcome {
    pub translations: Vec<TranslatedText>,
}

/// Translates text items from one language into several.
#[async_trait]
pub trait Translator: Send + Sync {
    fn name(&self) -> &'static str;

    /// One outcome per input item, each holding one translation per target.
    async fn translate(
        &self,
        items: &[String],
        source_language: &str,
        target_languages: &[String],
    ) -> Result<Vec<TranslationOutcome>, CapabilityError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_lines_builds_single_block() {
        let r = ReadResult::from_lines(["TOTAL 12.50", "THANK YOU"]);
        let blocks = r.blocks.unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].lines[1].text, "THANK YOU");
    }

    #[test]
    fn default_read_result_has_no_blocks() {
        assert!(ReadResult::default().blocks.is_none());
    }
}
