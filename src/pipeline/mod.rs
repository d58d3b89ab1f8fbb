//! Pipeline stages for image → text → summary → translation.
//!
//! Each submodule implements exactly one step. The three capability-backed
//! stages are plain async functions over a capability trait object, so each
//! is testable with an in-process fake and none knows about the others.
//!
//! ## Data Flow
//!
//! ```text
//! validate ──▶ asset ──▶ ocr ──▶ summarize ──▶ translate
//! (extension)  (temp file) (read)  (extractive)  (target langs)
//! ```
//!
//! 1. [`validate`] : allow-list the extension and sanitise the file name
//! 2. [`asset`]    : write the upload to a per-request temporary file that is
//!    removed on every exit path
//! 3. [`ocr`]      : first text block's lines, newline-joined
//! 4. [`summarize`]: first document's extractive summary
//! 5. [`translate`]: every delivered translation, each on its own line

pub mod asset;
pub mod ocr;
pub mod summarize;
pub mod translate;
pub mod validate;
