//! The request-scoped pipeline: validate → persist → OCR → summarise → translate.
//!
//! ## Failure handling
//!
//! Every stage returns `Result<_, StageError>`. A failed stage ends the run
//! in [`PipelineState::Failed`], is logged at warn level with its stage and
//! cause, and is kept in [`PipelineOutput::failure`]. The caller still gets a
//! `PipelineOutput` (with an empty message), never an `Err`, so the HTTP
//! layer can always render its result page.
//!
//! The temporary asset is released on every path past `Validated`.

use crate::capability::{ExtractiveSummarizer, ImageTextReader, Translator};
use crate::config::PipelineConfig;
use crate::error::{OcrBriefError, StageError};
use crate::output::{PipelineFailure, PipelineOutput, PipelineState, Stage, StageTimings};
use crate::pipeline::asset::TemporaryAsset;
use crate::pipeline::translate::Translation;
use crate::pipeline::validate::{self, UploadedImage};
use crate::pipeline::{ocr, summarize, translate};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Capabilities plus configuration, shared by every request.
///
/// Cheap to clone; all parts sit behind `Arc`.
#[derive(Clone)]
pub struct Pipeline {
    reader: Arc<dyn ImageTextReader>,
    summarizer: Arc<dyn ExtractiveSummarizer>,
    translator: Arc<dyn Translator>,
    config: Arc<PipelineConfig>,
}

impl Pipeline {
    pub fn new(
        reader: Arc<dyn ImageTextReader>,
        summarizer: Arc<dyn ExtractiveSummarizer>,
        translator: Arc<dyn Translator>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            reader,
            summarizer,
            translator,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run one upload through the pipeline.
    ///
    /// `None` means the request carried no file. Always returns an output
    /// whose state trail ends in [`PipelineState::Done`].
    pub async fn process(&self, upload: Option<UploadedImage>) -> PipelineOutput {
        let request_id = Uuid::new_v4();
        let span = info_span!("pipeline", %request_id);
        self.execute(request_id, upload).instrument(span).await
    }

    /// Run a local image file through the pipeline.
    ///
    /// The file name (not the full path) is validated like an upload name.
    ///
    /// # Errors
    /// Returns [`OcrBriefError::InputReadFailed`] if the file cannot be read.
    pub async fn process_file(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<PipelineOutput, OcrBriefError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| OcrBriefError::InputReadFailed {
                path: path.to_path_buf(),
                source,
            })?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(self.process(Some(UploadedImage::new(filename, bytes))).await)
    }

    async fn execute(&self, request_id: Uuid, upload: Option<UploadedImage>) -> PipelineOutput {
        let mut run = Run::new(request_id);

        // ── Idle → Validated ─────────────────────────────────────────────────
        let validated = match validate::validate_upload(upload, &self.config.allowed_extensions) {
            Ok(v) => v,
            Err(reason) => {
                debug!("Upload skipped: {}", reason);
                run.out.rejection = Some(reason);
                return self.finish(run);
            }
        };
        run.enter(PipelineState::Validated);
        info!(
            "Processing '{}' ({} bytes)",
            validated.sanitized_name,
            validated.bytes.len()
        );

        // ── Validated → AssetOpen ────────────────────────────────────────────
        let mut asset = match TemporaryAsset::persist(
            &self.config.upload_dir,
            request_id,
            &validated.extension,
            &validated.bytes,
        ) {
            Ok(asset) => asset,
            Err(e) => {
                run.fail(PipelineFailure::Asset {
                    detail: e.to_string(),
                });
                return self.finish(run);
            }
        };
        run.enter(PipelineState::AssetOpen);

        // ── AssetOpen → Extracted → Summarized → Translated ──────────────────
        if let Err(failure) = self.run_stages(&mut asset, &mut run).await {
            run.fail(failure);
        }

        if let Err(e) = asset.release() {
            warn!("{}", e);
        }
        self.finish(run)
    }

    async fn run_stages(
        &self,
        asset: &mut TemporaryAsset,
        run: &mut Run,
    ) -> Result<(), PipelineFailure> {
        let image = asset
            .read_bytes()
            .await
            .map_err(|e| PipelineFailure::Asset {
                detail: e.to_string(),
            })?;

        let (text, ms) = self
            .timed(
                Stage::Ocr,
                ocr::extract_text(self.reader.as_ref(), &image),
                String::len,
            )
            .await;
        run.out.timings.ocr_ms = Some(ms);
        let text = text.map_err(PipelineFailure::Stage)?;
        run.out.extracted_text = Some(text.clone());
        run.enter(PipelineState::Extracted);

        if text.trim().is_empty() {
            info!("No text found in image; skipping summarization and translation");
            return Ok(());
        }

        let (summary, ms) = self
            .timed(
                Stage::Summarization,
                summarize::summarize_text(
                    self.summarizer.as_ref(),
                    &text,
                    self.config.max_sentences,
                ),
                String::len,
            )
            .await;
        run.out.timings.summarization_ms = Some(ms);
        let summary = summary.map_err(PipelineFailure::Stage)?;
        run.out.summary = Some(summary.clone());
        run.enter(PipelineState::Summarized);

        let (translation, ms) = self
            .timed(
                Stage::Translation,
                translate::translate_text(
                    self.translator.as_ref(),
                    &summary,
                    &self.config.source_language,
                    &self.config.target_languages,
                ),
                |t: &Translation| t.text.len(),
            )
            .await;
        run.out.timings.translation_ms = Some(ms);
        let translation = translation.map_err(PipelineFailure::Stage)?;
        run.out.message = translation.text;
        run.out.target_languages = translation.target_languages;
        run.enter(PipelineState::Translated);

        Ok(())
    }

    /// Await one stage, reporting progress and wall-clock time.
    async fn timed<T, F, L>(&self, stage: Stage, fut: F, len: L) -> (Result<T, StageError>, u64)
    where
        F: Future<Output = Result<T, StageError>>,
        L: Fn(&T) -> usize,
    {
        let cb = self.config.progress_callback.as_ref();
        if let Some(cb) = cb {
            cb.on_stage_start(stage);
        }
        let start = Instant::now();
        let result = fut.await;
        let ms = start.elapsed().as_millis() as u64;
        debug!("Stage {} finished in {}ms", stage, ms);

        if let Some(cb) = cb {
            match &result {
                Ok(value) => cb.on_stage_complete(stage, len(value)),
                Err(e) => cb.on_stage_error(stage, &e.to_string()),
            }
        }
        (result, ms)
    }

    fn finish(&self, mut run: Run) -> PipelineOutput {
        let last_state = run.out.last_state();
        run.enter(PipelineState::Done);
        run.out.timings.total_ms = run.started.elapsed().as_millis() as u64;
        info!(
            "Pipeline done after {:?} in {}ms ({} bytes of output)",
            last_state,
            run.out.timings.total_ms,
            run.out.message.len()
        );

        if let Some(ref cb) = self.config.progress_callback {
            cb.on_pipeline_complete(last_state, run.out.message.len());
        }
        run.out
    }
}

/// Mutable state of one in-flight run.
struct Run {
    out: PipelineOutput,
    started: Instant,
}

impl Run {
    fn new(request_id: Uuid) -> Self {
        Self {
            out: PipelineOutput {
                request_id,
                message: String::new(),
                states: vec![PipelineState::Idle],
                rejection: None,
                failure: None,
                extracted_text: None,
                summary: None,
                target_languages: Vec::new(),
                timings: StageTimings::default(),
            },
            started: Instant::now(),
        }
    }

    fn enter(&mut self, state: PipelineState) {
        debug!("→ {:?}", state);
        self.out.states.push(state);
    }

    fn fail(&mut self, failure: PipelineFailure) {
        match &failure {
            PipelineFailure::Stage(e) => {
                warn!(stage = %e.stage(), "Pipeline stage failed: {}", e)
            }
            PipelineFailure::Asset { detail } => {
                warn!("Temporary asset failure: {}", detail)
            }
        }
        self.out.message.clear();
        self.out.failure = Some(failure);
        self.enter(PipelineState::Failed);
    }
}
