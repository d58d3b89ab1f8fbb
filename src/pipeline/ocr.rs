//! OCR stage: image bytes → newline-joined text.

use crate::capability::{ImageTextReader, ReadResult};
use crate::error::StageError;
use tracing::{debug, info};

/// Read the printed text of an image.
///
/// Only the first block's lines are used. An image with no readable text
/// yields an empty string, not an error.
pub async fn extract_text(
    reader: &dyn ImageTextReader,
    image: &[u8],
) -> Result<String, StageError> {
    debug!("OCR via {} on {} bytes", reader.name(), image.len());
    let result = reader
        .analyze(image)
        .await
        .map_err(|e| StageError::Ocr {
            detail: e.to_string(),
        })?;

    let text = text_from_read_result(&result);
    info!("Returning OCR extraction text ({} bytes):\n{}", text.len(), text);
    Ok(text)
}

/// Join the lines of the first block with `\n`.
pub fn text_from_read_result(result: &ReadResult) -> String {
    match result.blocks.as_deref().and_then(|blocks| blocks.first()) {
        Some(block) => block
            .lines
            .iter()
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join("\n"),
        None => String::new(),
    }
}
