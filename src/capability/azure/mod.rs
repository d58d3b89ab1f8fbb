//! Azure AI services adapters.
//!
//! All three services share the same conventions: a resource endpoint, a
//! subscription key sent in `Ocp-Apim-Subscription-Key`, JSON bodies, and
//! non-2xx responses carrying a JSON error document. The helpers here keep
//! those conventions in one place; each submodule only knows its own paths
//! and payloads.

mod language;
mod translator;
mod vision;

pub use language::{AzureLanguageConfig, AzureSummarizer};
pub use translator::{AzureTranslator, AzureTranslatorConfig, DEFAULT_TRANSLATOR_ENDPOINT};
pub use vision::{AzureImageReader, AzureVisionConfig};

use crate::error::{CapabilityError, OcrBriefError};
use std::time::Duration;

pub(crate) const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
pub(crate) const SUBSCRIPTION_REGION_HEADER: &str = "Ocp-Apim-Subscription-Region";

/// Longest error body kept in a [`CapabilityError::Status`].
const MAX_ERROR_BODY: usize = 512;

/// Build the HTTP client one adapter uses for its whole lifetime.
fn http_client(capability: &str, timeout_secs: u64) -> Result<reqwest::Client, OcrBriefError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("ocr-brief/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| OcrBriefError::Internal(format!("{capability}: HTTP client: {e}")))
}

/// Fail early with a helpful hint when an endpoint or key is missing.
fn require(capability: &str, value: &str, env_hint: &str) -> Result<(), OcrBriefError> {
    if value.trim().is_empty() {
        return Err(OcrBriefError::ProviderNotConfigured {
            provider: capability.to_string(),
            hint: format!("Set {env_hint} or pass the matching command-line flag."),
        });
    }
    Ok(())
}

/// Join a resource endpoint and an API path without doubling slashes.
fn endpoint_url(endpoint: &str, path: &str) -> String {
    format!(
        "{}/{}",
        endpoint.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Send a prepared request, mapping transport failures.
async fn send(
    capability: &'static str,
    request: reqwest::RequestBuilder,
) -> Result<reqwest::Response, CapabilityError> {
    request
        .send()
        .await
        .map_err(|source| CapabilityError::Request { capability, source })
}

/// Turn a non-success response into [`CapabilityError::Status`].
async fn check_status(
    capability: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, CapabilityError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let mut body = response.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
        body.push('…');
    }
    Err(CapabilityError::Status {
        capability,
        status: status.as_u16(),
        body,
    })
}

/// Read the body and decode it as JSON.
async fn decode_json<T: serde::de::DeserializeOwned>(
    capability: &'static str,
    response: reqwest::Response,
) -> Result<T, CapabilityError> {
    let body = response
        .text()
        .await
        .map_err(|source| CapabilityError::Request { capability, source })?;
    parse_json(capability, &body)
}

fn parse_json<T: serde::de::DeserializeOwned>(
    capability: &'static str,
    body: &str,
) -> Result<T, CapabilityError> {
    serde_json::from_str(body).map_err(|e| CapabilityError::Decode {
        capability,
        detail: e.to_string(),
    })
}
