//! Azure AI Vision Image Analysis 4.0, `read` feature only.

use super::{check_status, decode_json, endpoint_url, http_client, require, send};
use super::SUBSCRIPTION_KEY_HEADER;
use crate::capability::{ImageTextReader, ReadResult, TextBlock, TextLine};
use crate::error::{CapabilityError, OcrBriefError};
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use tracing::debug;

const CAPABILITY: &str = "azure-vision";

/// Connection settings for the Image Analysis service.
#[derive(Clone)]
pub struct AzureVisionConfig {
    /// Resource endpoint, e.g. `https://<name>.cognitiveservices.azure.com`.
    pub endpoint: String,
    pub key: String,
    /// Default: `2023-10-01`.
    pub api_version: String,
    /// Request timeout in seconds. Default: 30.
    pub timeout_secs: u64,
}

impl AzureVisionConfig {
    pub fn new(endpoint: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            key: key.into(),
            api_version: "2023-10-01".to_string(),
            timeout_secs: 30,
        }
    }
}

impl fmt::Debug for AzureVisionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureVisionConfig")
            .field("endpoint", &self.endpoint)
            .field("key", &"<redacted>")
            .field("api_version", &self.api_version)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// [`ImageTextReader`] backed by Azure Image Analysis.
pub struct AzureImageReader {
    client: reqwest::Client,
    config: AzureVisionConfig,
}

impl AzureImageReader {
    pub fn new(config: AzureVisionConfig) -> Result<Self, OcrBriefError> {
        require(CAPABILITY, &config.endpoint, "AZURE_VISION_ENDPOINT")?;
        require(CAPABILITY, &config.key, "AZURE_VISION_KEY")?;
        let client = http_client(CAPABILITY, config.timeout_secs)?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl ImageTextReader for AzureImageReader {
    fn name(&self) -> &'static str {
        CAPABILITY
    }

    async fn analyze(&self, image: &[u8]) -> Result<ReadResult, CapabilityError> {
        let url = endpoint_url(
            &self.config.endpoint,
            "computervision/imageanalysis:analyze",
        );
        debug!("{}: analysing {} bytes", CAPABILITY, image.len());

        let request = self
            .client
            .post(url)
            .query(&[
                ("api-version", self.config.api_version.as_str()),
                ("features", "read"),
            ])
            .header(SUBSCRIPTION_KEY_HEADER, &self.config.key)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(image.to_vec());

        let response = check_status(CAPABILITY, send(CAPABILITY, request).await?).await?;
        let body: AnalyzeResponse = decode_json(CAPABILITY, response).await?;
        Ok(body.into())
    }
}

// ── Wire format ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeResponse {
    read_result: Option<WireReadResult>,
}

#[derive(Debug, Deserialize)]
struct WireReadResult {
    #[serde(default)]
    blocks: Vec<WireBlock>,
}

#[derive(Debug, Deserialize)]
struct WireBlock {
    #[serde(default)]
    lines: Vec<WireLine>,
}

#[derive(Debug, Deserialize)]
struct WireLine {
    text: String,
}

impl From<AnalyzeResponse> for ReadResult {
    fn from(r: AnalyzeResponse) -> Self {
        let blocks = r.read_result.map(|read| {
            read.blocks
                .into_iter()
                .map(|b| TextBlock {
                    lines: b
                        .lines
                        .into_iter()
                        .map(|l| TextLine { text: l.text })
                        .collect(),
                })
                .collect()
        });
        ReadResult { blocks }
    }
}
