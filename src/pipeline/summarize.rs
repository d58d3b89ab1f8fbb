//! Summarisation stage: extracted text → "Summary extracted:" + key sentences.

use crate::capability::{DocumentSummaryOutcome, ExtractiveSummarizer};
use crate::error::StageError;
use tracing::{debug, info, warn};

/// Prefix of every non-empty summary.
pub const SUMMARY_PREFIX: &str = "Summary extracted: \n";

/// Summarise `text` into at most `max_sentences` sentences.
///
/// The text is submitted as a one-document batch and only the first outcome
/// is read. A per-document error is logged and yields an empty summary; only
/// a failure of the capability call itself is an `Err`.
pub async fn summarize_text(
    summarizer: &dyn ExtractiveSummarizer,
    text: &str,
    max_sentences: u32,
) -> Result<String, StageError> {
    debug!(
        "Summarising {} bytes via {} (max {} sentences)",
        text.len(),
        summarizer.name(),
        max_sentences
    );
    let documents = vec![text.to_string()];
    let outcomes = summarizer
        .summarize(&documents, max_sentences)
        .await
        .map_err(|e| StageError::Summarization {
            detail: e.to_string(),
        })?;

    Ok(summary_from_outcomes(&outcomes))
}

/// Render the first outcome as summary text.
pub fn summary_from_outcomes(outcomes: &[DocumentSummaryOutcome]) -> String {
    match outcomes.first() {
        Some(DocumentSummaryOutcome::Error { code, message }) => {
            warn!(
                "Summarizer reported an error with code '{}' and message '{}'",
                code, message
            );
            String::new()
        }
        Some(DocumentSummaryOutcome::Sentences(sentences)) => {
            let joined = sentences
                .iter()
                .map(|s| s.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            let summary = format!("{SUMMARY_PREFIX}{joined}");
            info!("Returning summarized text:\n{}", summary);
            summary
        }
        None => {
            warn!("Summarizer returned no outcome");
            String::new()
        }
    }
}
