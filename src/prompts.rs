//! Prompts for vision-LLM text reading.
//!
//! Keeping the prompt here, rather than inline in the adapter, lets tests
//! inspect it directly and lets callers see exactly what the model is asked.
//! Callers can override it via [`crate::capability::vision_llm::VisionLlmConfig::system_prompt`].

/// Default system prompt for transcribing the printed text of an image.
pub const DEFAULT_OCR_PROMPT: &str = r#"You are an OCR engine. Transcribe the printed text visible in the image.

Follow these rules precisely:

1. TEXT PRESERVATION
   - Transcribe ALL readable text exactly as printed, including numbers and punctuation
   - Do NOT translate, summarise, correct or complete the text

2. LINES
   - Output one line of text per printed line
   - Keep the natural reading order: top to bottom, left to right

3. WHAT TO IGNORE
   - Logos, pictures and decorative elements that carry no text

4. OUTPUT FORMAT
   - Output ONLY the transcribed text
   - Do NOT wrap the output in code fences
   - Do NOT add commentary or explanations
   - If the image contains no readable text, output exactly [NO_TEXT]"#;

/// The prompt as the adapter sends it.
pub fn ocr_prompt(custom: Option<&str>) -> &str {
    custom.unwrap_or(DEFAULT_OCR_PROMPT)
}
