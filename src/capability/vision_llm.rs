//! Text reading through a vision LLM.
//!
//! An alternative [`ImageTextReader`] for deployments without an Azure Vision
//! resource: the image is base64-encoded, sent to any vision-capable model
//! that edgequake-llm supports, and the transcription is cleaned up by
//! [`super::postprocess`] into a single block of lines.
//!
//! ## Retry Strategy
//!
//! HTTP 429 / 503 errors from LLM APIs are transient. Exponential backoff
//! (`retry_backoff_ms * 2^(retry - 1)`) with 500 ms base and 3 retries waits
//! 500 ms → 1 s → 2 s before the stage is reported as failed. The delay
//! saturates instead of overflowing when `max_retries` is large.

use super::postprocess::clean_transcription;
use super::{ImageTextReader, ReadResult};
use crate::error::{CapabilityError, OcrBriefError};
use crate::prompts::ocr_prompt;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider, ProviderFactory};
use std::fmt;
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

const CAPABILITY: &str = "vision-llm";

/// Model used when a provider is named without a model.
pub const DEFAULT_VISION_MODEL: &str = "gpt-4.1-nano";

/// Settings for [`VisionLlmReader`].
#[derive(Clone)]
pub struct VisionLlmConfig {
    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `provider`, uses `ProviderFactory::from_env()`.
    pub provider_name: Option<String>,

    /// Model identifier. If None, uses [`DEFAULT_VISION_MODEL`].
    pub model: Option<String>,

    /// Pre-constructed provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Default: 0.0 (transcription, not creativity).
    pub temperature: f32,

    /// Maximum tokens of transcription. Default: 2048.
    pub max_tokens: usize,

    /// Retry attempts on a failed call. Default: 3.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled per attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// Custom system prompt. If None, uses [`crate::prompts::DEFAULT_OCR_PROMPT`].
    pub system_prompt: Option<String>,
}

impl Default for VisionLlmConfig {
    fn default() -> Self {
        Self {
            provider_name: None,
            model: None,
            provider: None,
            temperature: 0.0,
            max_tokens: 2048,
            max_retries: 3,
            retry_backoff_ms: 500,
            system_prompt: None,
        }
    }
}

impl fmt::Debug for VisionLlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisionLlmConfig")
            .field("provider_name", &self.provider_name)
            .field("model", &self.model)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

/// [`ImageTextReader`] backed by a vision LLM.
pub struct VisionLlmReader {
    provider: Arc<dyn LLMProvider>,
    config: VisionLlmConfig,
}

impl VisionLlmReader {
    /// Resolve the provider from the config and environment.
    pub fn new(config: VisionLlmConfig) -> Result<Self, OcrBriefError> {
        let provider = resolve_provider(&config)?;
        Ok(Self { provider, config })
    }
}

#[async_trait]
impl ImageTextReader for VisionLlmReader {
    fn name(&self) -> &'static str {
        CAPABILITY
    }

    async fn analyze(&self, image: &[u8]) -> Result<ReadResult, CapabilityError> {
        let image_data = encode_image(image)?;
        let messages = vec![
            ChatMessage::system(ocr_prompt(self.config.system_prompt.as_deref())),
            ChatMessage::user_with_images("", vec![image_data]),
        ];
        let options = build_options(&self.config);

        let mut last_err: Option<String> = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let backoff = backoff_ms(self.config.retry_backoff_ms, attempt);
                warn!(
                    "{}: retry {}/{} after {}ms",
                    CAPABILITY, attempt, self.config.max_retries, backoff
                );
                sleep(Duration::from_millis(backoff)).await;
            }

            match self.provider.chat(&messages, Some(&options)).await {
                Ok(response) => {
                    debug!(
                        "{}: {} input tokens, {} output tokens",
                        CAPABILITY, response.prompt_tokens, response.completion_tokens
                    );
                    let lines = clean_transcription(&response.content);
                    if lines.is_empty() {
                        return Ok(ReadResult::default());
                    }
                    return Ok(ReadResult::from_lines(lines));
                }
                Err(e) => {
                    let err_msg = format!("{}", e);
                    warn!("{}: attempt {} failed: {}", CAPABILITY, attempt + 1, err_msg);
                    last_err = Some(err_msg);
                }
            }
        }

        Err(CapabilityError::Provider {
            capability: CAPABILITY,
            detail: format!(
                "failed after {} retries: {}",
                self.config.max_retries,
                last_err.unwrap_or_else(|| "Unknown error".to_string())
            ),
        })
    }
}

/// Wrap raw image bytes as a base64 attachment.
///
/// The MIME type is sniffed from the magic bytes rather than trusted from the
/// upload's file name. `detail: "high"` keeps small print legible for
/// GPT-4-class models.
fn encode_image(bytes: &[u8]) -> Result<ImageData, CapabilityError> {
    let format = image::guess_format(bytes).map_err(|e| CapabilityError::Provider {
        capability: CAPABILITY,
        detail: format!("unrecognised image format: {e}"),
    })?;
    let b64 = STANDARD.encode(bytes);
    debug!("Encoded image → {} bytes base64", b64.len());
    Ok(ImageData::new(b64, format.to_mime_type()).with_detail("high"))
}

/// Delay before retry number `retry` (1-based), saturating at `u64::MAX`.
fn backoff_ms(base_ms: u64, retry: u32) -> u64 {
    let factor = 2u64.checked_pow(retry.saturating_sub(1)).unwrap_or(u64::MAX);
    base_ms.saturating_mul(factor)
}

fn build_options(config: &VisionLlmConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

fn create_vision_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, OcrBriefError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        OcrBriefError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific:
///
/// 1. a pre-built provider in the config;
/// 2. a named provider (+ optional model);
/// 3. `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL` when both are set;
/// 4. full auto-detection via [`ProviderFactory::from_env`].
fn resolve_provider(config: &VisionLlmConfig) -> Result<Arc<dyn LLMProvider>, OcrBriefError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_VISION_MODEL);
        return create_vision_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_vision_provider(&prov, &model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| OcrBriefError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No vision LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}
