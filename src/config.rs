//! Configuration types for the OCR → summary → translation pipeline.
//!
//! All pipeline behaviour is controlled through [`PipelineConfig`], built via
//! its [`PipelineConfigBuilder`]. One struct makes it easy to share the config
//! across the HTTP server's request handlers and to log exactly which
//! settings a run used.
//!
//! Capability endpoints and credentials live with their adapters (see
//! [`crate::capability`]); this struct only holds what the orchestrator needs.

use crate::error::OcrBriefError;
use crate::progress::ProgressCallback;
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

/// Extensions accepted when no allow-set is configured.
pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] =
    &["png", "jpg", "jpeg", "gif", "bmp", "tiff", "webp"];

/// Largest sentence count the extractive summariser accepts.
pub const MAX_SENTENCE_LIMIT: u32 = 20;

/// Configuration for a pipeline run.
///
/// Built via [`PipelineConfig::builder()`] or using
/// [`PipelineConfig::default()`].
///
/// # Example
/// ```rust
/// use ocr_brief::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .max_sentences(5)
///     .target_languages(["id", "fr"])
///     .build()
///     .unwrap();
/// assert_eq!(config.target_languages, vec!["id", "fr"]);
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// Lowercase file extensions (without the dot) an upload may carry.
    pub allowed_extensions: BTreeSet<String>,

    /// Maximum accepted request body in bytes. Default: 16 MiB.
    ///
    /// Enforced by the HTTP layer before the pipeline sees the bytes; the
    /// image-analysis service rejects anything above 20 MB anyway.
    pub max_upload_bytes: usize,

    /// Directory the temporary copy of each upload is written to.
    /// Default: the system temp directory.
    pub upload_dir: PathBuf,

    /// Maximum number of sentences the summariser may return. Range 1–20. Default: 10.
    pub max_sentences: u32,

    /// Language tag of the extracted text. Default: "en".
    pub source_language: String,

    /// Language tags the summary is translated into. Default: `["id"]`.
    pub target_languages: Vec<String>,

    /// Optional per-stage progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
            max_upload_bytes: 16 * 1024 * 1024,
            upload_dir: std::env::temp_dir(),
            max_sentences: 10,
            source_language: "en".to_string(),
            target_languages: vec!["id".to_string()],
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("allowed_extensions", &self.allowed_extensions)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("upload_dir", &self.upload_dir)
            .field("max_sentences", &self.max_sentences)
            .field("source_language", &self.source_language)
            .field("target_languages", &self.target_languages)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn PipelineProgressCallback>"),
            )
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// Replace the allow-set. Entries are lowercased and stripped of a leading dot.
    pub fn allowed_extensions<I, S>(mut self, exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.config.allowed_extensions = exts
            .into_iter()
            .map(|e| e.as_ref().trim().trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        self
    }

    pub fn max_upload_bytes(mut self, n: usize) -> Self {
        self.config.max_upload_bytes = n;
        self
    }

    pub fn upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.upload_dir = dir.into();
        self
    }

    pub fn max_sentences(mut self, n: u32) -> Self {
        self.config.max_sentences = n;
        self
    }

    pub fn source_language(mut self, tag: impl Into<String>) -> Self {
        self.config.source_language = tag.into();
        self
    }

    pub fn target_languages<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.target_languages = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, OcrBriefError> {
        let c = &self.config;
        if c.allowed_extensions.is_empty() {
            return Err(OcrBriefError::InvalidConfig(
                "At least one allowed extension is required".into(),
            ));
        }
        if c.max_upload_bytes == 0 {
            return Err(OcrBriefError::InvalidConfig(
                "max_upload_bytes must be ≥ 1".into(),
            ));
        }
        if c.max_sentences == 0 || c.max_sentences > MAX_SENTENCE_LIMIT {
            return Err(OcrBriefError::InvalidConfig(format!(
                "max_sentences must be 1–{}, got {}",
                MAX_SENTENCE_LIMIT, c.max_sentences
            )));
        }
        if c.source_language.trim().is_empty() {
            return Err(OcrBriefError::InvalidConfig(
                "source_language must not be empty".into(),
            ));
        }
        if c.target_languages.is_empty() || c.target_languages.iter().any(|t| t.trim().is_empty())
        {
            return Err(OcrBriefError::InvalidConfig(
                "target_languages must contain at least one non-empty tag".into(),
            ));
        }
        Ok(self.config)
    }
}
