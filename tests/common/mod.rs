//! In-process fake capabilities shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use ocr_brief::{
    CapabilityError, DocumentSummaryOutcome, ExtractiveSummarizer, ImageTextReader, Pipeline,
    PipelineConfig, ReadResult, SummarySentence, TranslatedText, TranslationOutcome, Translator,
};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Call counters for all three capabilities.
#[derive(Default)]
pub struct Calls {
    pub ocr: AtomicUsize,
    pub summarize: AtomicUsize,
    pub translate: AtomicUsize,
}

impl Calls {
    pub fn total(&self) -> usize {
        self.ocr.load(Ordering::SeqCst)
            + self.summarize.load(Ordering::SeqCst)
            + self.translate.load(Ordering::SeqCst)
    }
}

// ── OCR ──────────────────────────────────────────────────────────────────────

pub enum ReaderMode {
    /// Return these lines as one block.
    Lines(Vec<String>),
    /// Echo the image bytes (as UTF-8) as the only line.
    Echo,
    /// Fail like an unreachable service.
    Fail,
}

pub struct FakeReader {
    pub mode: ReaderMode,
    pub calls: Arc<Calls>,
    pub delay: Duration,
}

#[async_trait]
impl ImageTextReader for FakeReader {
    fn name(&self) -> &'static str {
        "fake-reader"
    }

    async fn analyze(&self, image: &[u8]) -> Result<ReadResult, CapabilityError> {
        self.calls.ocr.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.mode {
            ReaderMode::Lines(lines) => Ok(ReadResult::from_lines(lines.clone())),
            ReaderMode::Echo => Ok(ReadResult::from_lines([
                String::from_utf8_lossy(image).into_owned()
            ])),
            ReaderMode::Fail => Err(CapabilityError::Provider {
                capability: "fake-reader",
                detail: "connection reset by peer".into(),
            }),
        }
    }
}

// ── Summariser ───────────────────────────────────────────────────────────────

pub enum SummarizerMode {
    /// Each document becomes its own single sentence.
    Echo,
    /// Report a per-document error outcome.
    ErrorOutcome,
    /// Fail the whole call, e.g. the job never finished.
    Fail,
}

pub struct FakeSummarizer {
    pub mode: SummarizerMode,
    pub calls: Arc<Calls>,
}

#[async_trait]
impl ExtractiveSummarizer for FakeSummarizer {
    fn name(&self) -> &'static str {
        "fake-summarizer"
    }

    async fn summarize(
        &self,
        documents: &[String],
        _max_sentences: u32,
    ) -> Result<Vec<DocumentSummaryOutcome>, CapabilityError> {
        self.calls.summarize.fetch_add(1, Ordering::SeqCst);
        if let SummarizerMode::Fail = self.mode {
            return Err(CapabilityError::PollExhausted {
                capability: "fake-summarizer",
                polls: 60,
                status: "running".into(),
            });
        }
        Ok(documents
            .iter()
            .map(|d| match self.mode {
                SummarizerMode::Echo => {
                    DocumentSummaryOutcome::Sentences(vec![SummarySentence::new(d.clone())])
                }
                SummarizerMode::ErrorOutcome | SummarizerMode::Fail => {
                    DocumentSummaryOutcome::Error {
                        code: "InvalidDocument".into(),
                        message: "Document text is empty.".into(),
                    }
                }
            })
            .collect())
    }
}

// ── Translator ───────────────────────────────────────────────────────────────

pub enum TranslatorMode {
    /// Prefix the text with `[<lang>] ` per target language.
    Tag,
    /// Return zero outcomes.
    Nothing,
    /// Fail like a rejected subscription key.
    Fail,
}

pub struct FakeTranslator {
    pub mode: TranslatorMode,
    pub calls: Arc<Calls>,
}

#[async_trait]
impl Translator for FakeTranslator {
    fn name(&self) -> &'static str {
        "fake-translator"
    }

    async fn translate(
        &self,
        items: &[String],
        _source_language: &str,
        target_languages: &[String],
    ) -> Result<Vec<TranslationOutcome>, CapabilityError> {
        self.calls.translate.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            TranslatorMode::Nothing => Ok(vec![]),
            TranslatorMode::Fail => Err(CapabilityError::Status {
                capability: "fake-translator",
                status: 401,
                body: "invalid subscription key".into(),
            }),
            TranslatorMode::Tag => Ok(items
                .iter()
                .map(|item| TranslationOutcome {
                    translations: target_languages
                        .iter()
                        .map(|to| TranslatedText {
                            to: to.clone(),
                            text: format!("[{to}] {item}"),
                        })
                        .collect(),
                })
                .collect()),
        }
    }
}

// ── Builders ─────────────────────────────────────────────────────────────────

pub struct Harness {
    pub pipeline: Pipeline,
    pub calls: Arc<Calls>,
}

pub fn harness(
    reader: ReaderMode,
    summarizer: SummarizerMode,
    translator: TranslatorMode,
    config: PipelineConfig,
) -> Harness {
    let calls = Arc::new(Calls::default());
    let pipeline = Pipeline::new(
        Arc::new(FakeReader {
            mode: reader,
            calls: calls.clone(),
            delay: Duration::ZERO,
        }),
        Arc::new(FakeSummarizer {
            mode: summarizer,
            calls: calls.clone(),
        }),
        Arc::new(FakeTranslator {
            mode: translator,
            calls: calls.clone(),
        }),
        config,
    );
    Harness { pipeline, calls }
}

pub fn config_in(dir: &Path) -> PipelineConfig {
    PipelineConfig::builder()
        .upload_dir(dir)
        .build()
        .expect("valid config")
}

/// Number of entries left in `dir`.
pub fn files_in(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}
