//! Translation stage: summary → translated text in every target language.

use crate::capability::{TranslationOutcome, Translator};
use crate::error::StageError;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Translated text and the languages it was produced for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    /// Each delivered translation prefixed with `\n`, concatenated.
    pub text: String,
    pub target_languages: Vec<String>,
}

/// Translate `text` from `source_language` into `target_languages`.
///
/// The text is sent as a single input item in one call. Zero outcomes yield
/// an empty translation.
pub async fn translate_text(
    translator: &dyn Translator,
    text: &str,
    source_language: &str,
    target_languages: &[String],
) -> Result<Translation, StageError> {
    debug!(
        "Translating {} bytes via {} ({} → {:?})",
        text.len(),
        translator.name(),
        source_language,
        target_languages
    );
    let items = vec![text.to_string()];
    let outcomes = translator
        .translate(&items, source_language, target_languages)
        .await
        .map_err(|e| StageError::Translation {
            detail: e.to_string(),
        })?;

    Ok(Translation {
        text: text_from_outcomes(&outcomes),
        target_languages: target_languages.to_vec(),
    })
}

/// Concatenate `"\n" + text` for every translation of the first outcome.
pub fn text_from_outcomes(outcomes: &[TranslationOutcome]) -> String {
    let mut translated = String::new();
    if let Some(outcome) = outcomes.first() {
        for t in &outcome.translations {
            translated.push('\n');
            translated.push_str(&t.text);
            info!(
                "Text was translated to '{}' and the result is: '{}'",
                t.to, t.text
            );
        }
    }
    translated
}
