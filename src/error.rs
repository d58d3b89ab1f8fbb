//! Error types for the ocr-brief library.
//!
//! Four error types reflect four distinct failure modes:
//!
//! * [`OcrBriefError`]: **fatal**. The service or a library call cannot
//!   proceed at all (invalid configuration, provider not configured, the
//!   temporary asset could not be written). Returned as `Err(OcrBriefError)`.
//!
//! * [`CapabilityError`]: raised by an external capability adapter (HTTP
//!   failure, non-2xx status, undecodable body, polling exhausted).
//!
//! * [`StageError`]: **non-fatal**. One pipeline stage failed. The
//!   orchestrator records it in [`crate::output::PipelineOutput::failure`]
//!   and renders an empty message instead of an error page.
//!
//! * [`RejectReason`]: the upload never entered the pipeline (no file, or a
//!   file whose extension is not allowed). Not an error from the user's point
//!   of view; the result is simply empty.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the ocr-brief library.
#[derive(Debug, Error)]
pub enum OcrBriefError {
    // ── Asset errors ──────────────────────────────────────────────────────
    /// The temporary copy of an upload could not be created or written.
    #[error("Failed to write temporary asset in '{dir}': {source}")]
    AssetWriteFailed {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The temporary asset could not be read back.
    #[error("Failed to read temporary asset '{path}': {source}")]
    AssetReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The temporary asset was already consumed.
    #[error("Temporary asset '{path}' has already been read")]
    AssetAlreadyRead { path: PathBuf },

    /// Deleting the temporary asset failed.
    #[error("Failed to delete temporary asset '{path}': {source}")]
    AssetReleaseFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A local input image could not be read (CLI `run`).
    #[error("Failed to read input '{path}': {source}")]
    InputReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Provider errors ───────────────────────────────────────────────────
    /// The configured capability provider is not initialised (missing key etc.).
    #[error("Capability provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Server errors ─────────────────────────────────────────────────────
    /// The HTTP listener could not be bound or the server stopped with an error.
    #[error("HTTP server error on '{addr}': {source}")]
    Server {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// An error raised by an external capability adapter.
#[derive(Debug, Error)]
pub enum CapabilityError {
    /// The request never produced a response (DNS, TLS, connect, timeout).
    #[error("{capability}: request failed: {source}")]
    Request {
        capability: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status.
    #[error("{capability}: HTTP {status}: {body}")]
    Status {
        capability: &'static str,
        status: u16,
        body: String,
    },

    /// The response body did not match the expected shape.
    #[error("{capability}: could not decode response: {detail}")]
    Decode {
        capability: &'static str,
        detail: String,
    },

    /// A long-running job did not finish within the polling budget.
    #[error("{capability}: job still '{status}' after {polls} polls")]
    PollExhausted {
        capability: &'static str,
        polls: u32,
        status: String,
    },

    /// A long-running job finished in a failed state.
    #[error("{capability}: job ended with status '{status}'")]
    JobFailed {
        capability: &'static str,
        status: String,
    },

    /// Any other provider-specific failure.
    #[error("{capability}: {detail}")]
    Provider {
        capability: &'static str,
        detail: String,
    },
}

/// A non-fatal error for a single pipeline stage.
///
/// Stored in [`crate::output::PipelineOutput`] when a stage fails. The
/// request still completes and the user sees an empty message.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum StageError {
    /// Text extraction failed.
    #[error("OCR stage failed: {detail}")]
    Ocr { detail: String },

    /// Extractive summarisation failed.
    #[error("Summarization stage failed: {detail}")]
    Summarization { detail: String },

    /// Translation failed.
    #[error("Translation stage failed: {detail}")]
    Translation { detail: String },
}

impl StageError {
    /// The stage this error belongs to.
    pub fn stage(&self) -> crate::output::Stage {
        use crate::output::Stage;
        match self {
            StageError::Ocr { .. } => Stage::Ocr,
            StageError::Summarization { .. } => Stage::Summarization,
            StageError::Translation { .. } => Stage::Translation,
        }
    }
}

/// Why an upload was skipped before the pipeline started.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum RejectReason {
    /// The request carried no `file` field.
    #[error("no file field in request")]
    MissingFile,

    /// The file name was empty or sanitised down to nothing.
    #[error("file name is empty")]
    EmptyFilename,

    /// The extension is not in the allow-set.
    #[error("extension of '{filename}' is not allowed")]
    DisallowedExtension { filename: String },
}
