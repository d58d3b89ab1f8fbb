//! Progress-callback trait for per-stage pipeline events.
//!
//! Inject an [`Arc<dyn PipelineProgressCallback>`] via
//! [`crate::config::PipelineConfigBuilder::progress_callback`] to receive
//! events as the pipeline moves through OCR, summarisation and translation.
//!
//! The callback can forward events to a terminal spinner, a log line or a
//! test counter without the library knowing how the host reports progress.
//! The trait is `Send + Sync` because the HTTP server runs many pipelines
//! concurrently with one shared config.
//!
//! # Example
//!
//! ```rust
//! use ocr_brief::{PipelineConfig, PipelineProgressCallback, Stage};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl PipelineProgressCallback for CountingCallback {
//!     fn on_stage_complete(&self, stage: Stage, output_len: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{stage} done ({output_len} bytes)");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { completed: AtomicUsize::new(0) });
//!
//! let config = PipelineConfig::builder()
//!     .progress_callback(counter as Arc<dyn PipelineProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::output::{PipelineState, Stage};
use std::sync::Arc;

/// Called by the orchestrator as it runs each stage.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Events for different requests may interleave.
pub trait PipelineProgressCallback: Send + Sync {
    /// Called just before a stage calls its capability.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when a stage returns successfully.
    ///
    /// `output_len` is the byte length of the text the stage produced.
    fn on_stage_complete(&self, stage: Stage, output_len: usize) {
        let _ = (stage, output_len);
    }

    /// Called when a stage fails. The pipeline stops after this event.
    fn on_stage_error(&self, stage: Stage, error: &str) {
        let _ = (stage, error);
    }

    /// Called once per run, with the last state reached before `Done`.
    fn on_pipeline_complete(&self, last_state: PipelineState, message_len: usize) {
        let _ = (last_state, message_len);
    }
}

/// A no-op implementation; the default when no callback is configured.
pub struct NoopProgressCallback;

impl PipelineProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::PipelineConfig`].
pub type ProgressCallback = Arc<dyn PipelineProgressCallback>;
