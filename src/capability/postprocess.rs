//! Post-processing: turn a vision model's transcription into OCR lines.
//!
//! Even a well-prompted model sometimes wraps its answer in code fences,
//! uses `\r\n`, pads lines with spaces, or sprinkles zero-width characters
//! into the text. A dedicated OCR service never does any of that, so the
//! reply is normalised before it is handed to the pipeline as lines.
//!
//! ## Rule Order
//!
//! Line endings are normalised first, so the fence pattern only has to
//! match `\n` and a lone `\r` never survives inside a line. Fences are
//! stripped next so the fence lines never become OCR lines.

use once_cell::sync::Lazy;
use regex::Regex;

/// Marker the prompt asks the model to emit when the image has no text.
pub const NO_TEXT_MARKER: &str = "[NO_TEXT]";

/// Apply all cleanup rules and split the reply into non-empty lines.
///
/// Rules (applied in order):
/// 1. Normalise line endings (CRLF / CR → LF)
/// 2. Strip outer code fences
/// 3. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
/// 4. Trim each line and drop blank ones
/// 5. Map the no-text marker to zero lines
pub fn clean_transcription(input: &str) -> Vec<String> {
    let s = normalise_line_endings(input);
    let s = strip_code_fences(&s);
    let s = remove_invisible_chars(&s);
    let lines: Vec<String> = s
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();

    if lines.len() == 1 && lines[0] == NO_TEXT_MARKER {
        return Vec::new();
    }
    lines
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Strip outer code fences ──────────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[a-zA-Z]*\n(.*)\n```\s*$").unwrap());

fn strip_code_fences(input: &str) -> String {
    if let Some(caps) = RE_OUTER_FENCES.captures(input.trim()) {
        caps[1].to_string()
    } else {
        input.to_string()
    }
}

// ── Rule 3: Remove invisible Unicode characters ──────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}
