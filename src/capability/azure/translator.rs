//! Azure AI Translator, text translation v3.

use super::{check_status, decode_json, endpoint_url, http_client, require, send};
use super::{SUBSCRIPTION_KEY_HEADER, SUBSCRIPTION_REGION_HEADER};
use crate::capability::{TranslatedText, TranslationOutcome, Translator};
use crate::error::{CapabilityError, OcrBriefError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

const CAPABILITY: &str = "azure-translator";

/// Global Translator endpoint.
pub const DEFAULT_TRANSLATOR_ENDPOINT: &str = "https://api.cognitive.microsofttranslator.com";

#[derive(Clone)]
pub struct AzureTranslatorConfig {
    pub endpoint: String,
    pub key: String,
    /// Required for regional and multi-service resources.
    pub region: Option<String>,
    /// Request timeout in seconds. Default: 30.
    pub timeout_secs: u64,
}

impl AzureTranslatorConfig {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_TRANSLATOR_ENDPOINT.to_string(),
            key: key.into(),
            region: None,
            timeout_secs: 30,
        }
    }
}

impl fmt::Debug for AzureTranslatorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureTranslatorConfig")
            .field("endpoint", &self.endpoint)
            .field("key", &"<redacted>")
            .field("region", &self.region)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// [`Translator`] backed by Azure Translator.
pub struct AzureTranslator {
    client: reqwest::Client,
    config: AzureTranslatorConfig,
}

impl AzureTranslator {
    pub fn new(config: AzureTranslatorConfig) -> Result<Self, OcrBriefError> {
        require(CAPABILITY, &config.endpoint, "AZURE_TRANSLATOR_ENDPOINT")?;
        require(CAPABILITY, &config.key, "AZURE_TRANSLATOR_KEY")?;
        let client = http_client(CAPABILITY, config.timeout_secs)?;
        Ok(Self { client, config })
    }
}

/// Query pairs: `api-version`, `from`, then one `to` per target.
fn query_pairs<'a>(source: &'a str, targets: &'a [String]) -> Vec<(&'static str, &'a str)> {
    let mut pairs = vec![("api-version", "3.0"), ("from", source)];
    pairs.extend(targets.iter().map(|t| ("to", t.as_str())));
    pairs
}

#[async_trait]
impl Translator for AzureTranslator {
    fn name(&self) -> &'static str {
        CAPABILITY
    }

    async fn translate(
        &self,
        items: &[String],
        source_language: &str,
        target_languages: &[String],
    ) -> Result<Vec<TranslationOutcome>, CapabilityError> {
        let body: Vec<InputTextItem<'_>> =
            items.iter().map(|t| InputTextItem { text: t }).collect();
        debug!(
            "{}: translating {} item(s) {} → {:?}",
            CAPABILITY,
            items.len(),
            source_language,
            target_languages
        );

        let mut request = self
            .client
            .post(endpoint_url(&self.config.endpoint, "translate"))
            .query(&query_pairs(source_language, target_languages))
            .header(SUBSCRIPTION_KEY_HEADER, &self.config.key)
            .json(&body);
        if let Some(ref region) = self.config.region {
            request = request.header(SUBSCRIPTION_REGION_HEADER, region);
        }

        let response = check_status(CAPABILITY, send(CAPABILITY, request).await?).await?;
        let wire: Vec<WireOutcome> = decode_json(CAPABILITY, response).await?;
        Ok(wire.into_iter().map(Into::into).collect())
    }
}

// ── Wire format ─────────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct InputTextItem<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct WireOutcome {
    #[serde(default)]
    translations: Vec<WireTranslation>,
}

#[derive(Debug, Deserialize)]
struct WireTranslation {
    text: String,
    to: String,
}

impl From<WireOutcome> for TranslationOutcome {
    fn from(w: WireOutcome) -> Self {
        TranslationOutcome {
            translations: w
                .translations
                .into_iter()
                .map(|t| TranslatedText {
                    to: t.to,
                    text: t.text,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::parse_json;
    use super::*;

    #[test]
    fn repeats_to_for_each_target() {
        let targets = vec!["id".to_string(), "fr".to_string()];
        let pairs = query_pairs("en", &targets);
        assert_eq!(
            pairs,
            vec![
                ("api-version", "3.0"),
                ("from", "en"),
                ("to", "id"),
                ("to", "fr")
            ]
        );
    }

    #[test]
    fn input_items_use_pascal_case() {
        let json = serde_json::to_string(&[InputTextItem { text: "hello" }]).unwrap();
        assert_eq!(json, r#"[{"Text":"hello"}]"#);
    }

    #[test]
    fn decodes_translations() {
        let body = r#"[{"translations": [
            {"text": "TOTAL 12,50", "to": "id"},
            {"text": "TOTAL 12,50 €", "to": "fr"}
        ]}]"#;
        let wire: Vec<WireOutcome> = parse_json(CAPABILITY, body).unwrap();
        let outcomes: Vec<TranslationOutcome> = wire.into_iter().map(Into::into).collect();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].translations[1].to, "fr");
    }

    #[test]
    fn default_endpoint_is_global() {
        let c = AzureTranslatorConfig::new("k");
        assert_eq!(c.endpoint, DEFAULT_TRANSLATOR_ENDPOINT);
        assert!(AzureTranslator::new(c).is_ok());
    }
}
