//! Result types produced by a pipeline run.

use crate::error::{RejectReason, StageError};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// One of the three capability-backed stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Ocr,
    Summarization,
    Translation,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Ocr => "ocr",
            Stage::Summarization => "summarization",
            Stage::Translation => "translation",
        };
        f.write_str(s)
    }
}

/// States of the orchestrator.
///
/// ```text
/// Idle ─▶ Validated ─▶ AssetOpen ─▶ Extracted ─▶ Summarized ─▶ Translated ─▶ Done
///   │         │            │            │             │                       ▲
///   │         └────────────┴────────────┴─────────────┴──▶ Failed ────────────┤
///   └──── rejected ───────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    Validated,
    AssetOpen,
    Extracted,
    Summarized,
    Translated,
    Failed,
    Done,
}

/// Why a run ended in [`PipelineState::Failed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineFailure {
    /// The temporary asset could not be written or read.
    Asset { detail: String },
    /// A capability-backed stage failed.
    Stage(StageError),
}

impl fmt::Display for PipelineFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineFailure::Asset { detail } => write!(f, "temporary asset: {detail}"),
            PipelineFailure::Stage(e) => write!(f, "{e}"),
        }
    }
}

/// Wall-clock time spent in each stage, in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTimings {
    pub ocr_ms: Option<u64>,
    pub summarization_ms: Option<u64>,
    pub translation_ms: Option<u64>,
    pub total_ms: u64,
}

/// Everything a single run produced.
///
/// `message` is what the user sees. The remaining fields exist so logs, the
/// CLI's `--json` mode and tests can tell *why* the message is what it is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub request_id: Uuid,
    /// Final user-facing text; empty means "no content produced".
    pub message: String,
    /// Every state the run entered, in order, ending with `Done`.
    pub states: Vec<PipelineState>,
    pub rejection: Option<RejectReason>,
    pub failure: Option<PipelineFailure>,
    pub extracted_text: Option<String>,
    pub summary: Option<String>,
    /// Target languages the message was translated into.
    pub target_languages: Vec<String>,
    pub timings: StageTimings,
}

impl PipelineOutput {
    /// The state entered just before `Done`.
    pub fn last_state(&self) -> PipelineState {
        self.states
            .iter()
            .rev()
            .copied()
            .find(|s| *s != PipelineState::Done)
            .unwrap_or(PipelineState::Idle)
    }

    /// True when every stage ran and the translation was produced.
    pub fn is_complete(&self) -> bool {
        self.states.contains(&PipelineState::Translated)
    }

    pub fn failed(&self) -> bool {
        self.failure.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(states: Vec<PipelineState>) -> PipelineOutput {
        PipelineOutput {
            request_id: Uuid::nil(),
            message: String::new(),
            states,
            rejection: None,
            failure: None,
            extracted_text: None,
            summary: None,
            target_languages: vec![],
            timings: StageTimings::default(),
        }
    }

    #[test]
    fn last_state_skips_done() {
        let out = output(vec![
            PipelineState::Idle,
            PipelineState::Validated,
            PipelineState::AssetOpen,
            PipelineState::Failed,
            PipelineState::Done,
        ]);
        assert_eq!(out.last_state(), PipelineState::Failed);
        assert!(!out.is_complete());
    }

    #[test]
    fn stage_display_is_snake_case() {
        assert_eq!(Stage::Summarization.to_string(), "summarization");
        let json = serde_json::to_string(&PipelineState::AssetOpen).unwrap();
        assert_eq!(json, "\"asset_open\"");
    }
}
