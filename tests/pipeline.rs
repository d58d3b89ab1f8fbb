//! Pipeline behaviour against in-process fake capabilities.

mod common;

use common::*;
use ocr_brief::{
    Pipeline, PipelineConfig, PipelineFailure, PipelineState, RejectReason, Stage, StageError,
    UploadedImage,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

fn receipt_reader() -> ReaderMode {
    ReaderMode::Lines(vec!["TOTAL 12.50".to_string()])
}

// ── Scenario A: happy path ───────────────────────────────────────────────────

#[tokio::test]
async fn receipt_is_extracted_summarized_and_translated() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(
        receipt_reader(),
        SummarizerMode::Echo,
        TranslatorMode::Tag,
        config_in(dir.path()),
    );

    let out = h
        .pipeline
        .process(Some(UploadedImage::new("receipt.png", b"\x89PNG".to_vec())))
        .await;

    assert_eq!(out.extracted_text.as_deref(), Some("TOTAL 12.50"));
    assert_eq!(
        out.summary.as_deref(),
        Some("Summary extracted: \nTOTAL 12.50")
    );
    assert_eq!(out.message, "\n[id] Summary extracted: \nTOTAL 12.50");
    assert_eq!(out.last_state(), PipelineState::Translated);
    assert_eq!(out.states.last(), Some(&PipelineState::Done));
    assert!(out.failure.is_none());
    assert_eq!(h.calls.ocr.load(Ordering::SeqCst), 1);
    assert_eq!(h.calls.summarize.load(Ordering::SeqCst), 1);
    assert_eq!(h.calls.translate.load(Ordering::SeqCst), 1);
    assert_eq!(files_in(dir.path()), 0, "temporary asset left behind");
}

#[tokio::test]
async fn one_line_per_target_language() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig::builder()
        .upload_dir(dir.path())
        .target_languages(["id", "fr"])
        .build()
        .unwrap();
    let h = harness(
        ReaderMode::Lines(vec!["Hello".into()]),
        SummarizerMode::Echo,
        TranslatorMode::Tag,
        config,
    );

    let out = h
        .pipeline
        .process(Some(UploadedImage::new("sign.jpg", b"img".to_vec())))
        .await;

    assert_eq!(
        out.message,
        "\n[id] Summary extracted: \nHello\n[fr] Summary extracted: \nHello"
    );
    assert_eq!(out.target_languages, vec!["id", "fr"]);
}

// ── Scenario B: disallowed extension ─────────────────────────────────────────

#[tokio::test]
async fn disallowed_extension_makes_no_capability_calls() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(
        receipt_reader(),
        SummarizerMode::Echo,
        TranslatorMode::Tag,
        config_in(dir.path()),
    );

    for name in ["notes.txt", "archive.png.exe", "README", ""] {
        let out = h
            .pipeline
            .process(Some(UploadedImage::new(name, b"data".to_vec())))
            .await;
        assert!(out.message.is_empty(), "{name}: {:?}", out.message);
        assert_eq!(
            out.states,
            vec![PipelineState::Idle, PipelineState::Done],
            "{name}"
        );
        assert!(out.rejection.is_some(), "{name}");
    }

    assert_eq!(h.calls.total(), 0);
    assert_eq!(files_in(dir.path()), 0);
}

#[tokio::test]
async fn missing_file_field_is_empty_result() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(
        receipt_reader(),
        SummarizerMode::Echo,
        TranslatorMode::Tag,
        config_in(dir.path()),
    );

    let out = h.pipeline.process(None).await;

    assert_eq!(out.rejection, Some(RejectReason::MissingFile));
    assert!(out.message.is_empty());
    assert_eq!(h.calls.total(), 0);
}

// ── Scenario C: OCR failure ──────────────────────────────────────────────────

#[tokio::test]
async fn ocr_failure_is_recorded_and_asset_removed() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(
        ReaderMode::Fail,
        SummarizerMode::Echo,
        TranslatorMode::Tag,
        config_in(dir.path()),
    );

    let out = h
        .pipeline
        .process(Some(UploadedImage::new("receipt.png", b"img".to_vec())))
        .await;

    assert!(out.message.is_empty());
    assert_eq!(out.last_state(), PipelineState::Failed);
    match &out.failure {
        Some(PipelineFailure::Stage(e @ StageError::Ocr { detail })) => {
            assert_eq!(e.stage(), Stage::Ocr);
            assert!(detail.contains("connection reset"), "got: {detail}");
        }
        other => panic!("expected OCR stage failure, got {other:?}"),
    }
    assert_eq!(h.calls.summarize.load(Ordering::SeqCst), 0);
    assert_eq!(h.calls.translate.load(Ordering::SeqCst), 0);
    assert_eq!(files_in(dir.path()), 0, "temporary asset left behind");
}

#[tokio::test]
async fn summarization_failure_is_recorded_and_asset_removed() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(
        receipt_reader(),
        SummarizerMode::Fail,
        TranslatorMode::Tag,
        config_in(dir.path()),
    );

    let out = h
        .pipeline
        .process(Some(UploadedImage::new("receipt.png", b"img".to_vec())))
        .await;

    assert!(out.message.is_empty());
    assert_eq!(out.last_state(), PipelineState::Failed);
    assert_eq!(out.extracted_text.as_deref(), Some("TOTAL 12.50"));
    match &out.failure {
        Some(PipelineFailure::Stage(StageError::Summarization { detail })) => {
            assert!(detail.contains("60 polls"), "got: {detail}");
        }
        other => panic!("expected summarization failure, got {other:?}"),
    }
    assert_eq!(h.calls.translate.load(Ordering::SeqCst), 0);
    assert_eq!(files_in(dir.path()), 0, "temporary asset left behind");
}

#[tokio::test]
async fn translation_failure_is_recorded_and_asset_removed() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(
        receipt_reader(),
        SummarizerMode::Echo,
        TranslatorMode::Fail,
        config_in(dir.path()),
    );

    let out = h
        .pipeline
        .process(Some(UploadedImage::new("receipt.png", b"img".to_vec())))
        .await;

    assert!(out.message.is_empty());
    assert_eq!(out.last_state(), PipelineState::Failed);
    assert_eq!(
        out.summary.as_deref(),
        Some("Summary extracted: \nTOTAL 12.50")
    );
    match &out.failure {
        Some(PipelineFailure::Stage(e @ StageError::Translation { detail })) => {
            assert_eq!(e.stage(), Stage::Translation);
            assert!(detail.contains("401"), "got: {detail}");
        }
        other => panic!("expected translation failure, got {other:?}"),
    }
    assert_eq!(h.calls.translate.load(Ordering::SeqCst), 1);
    assert_eq!(files_in(dir.path()), 0, "temporary asset left behind");
}

// ── Partial results ──────────────────────────────────────────────────────────

#[tokio::test]
async fn summarizer_error_outcome_does_not_abort() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(
        receipt_reader(),
        SummarizerMode::ErrorOutcome,
        TranslatorMode::Tag,
        config_in(dir.path()),
    );

    let out = h
        .pipeline
        .process(Some(UploadedImage::new("receipt.png", b"img".to_vec())))
        .await;

    assert_eq!(out.summary.as_deref(), Some(""));
    assert!(out.failure.is_none());
    assert_eq!(out.last_state(), PipelineState::Translated);
    assert_eq!(out.message, "\n[id] ");
}

#[tokio::test]
async fn zero_translation_outcomes_is_empty_message() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(
        receipt_reader(),
        SummarizerMode::Echo,
        TranslatorMode::Nothing,
        config_in(dir.path()),
    );

    let out = h
        .pipeline
        .process(Some(UploadedImage::new("receipt.png", b"img".to_vec())))
        .await;

    assert!(out.message.is_empty());
    assert!(out.is_complete());
    assert!(!out.failed());
}

#[tokio::test]
async fn image_without_text_skips_summary_and_translation() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(
        ReaderMode::Lines(vec![]),
        SummarizerMode::Echo,
        TranslatorMode::Tag,
        config_in(dir.path()),
    );

    let out = h
        .pipeline
        .process(Some(UploadedImage::new("blank.png", b"img".to_vec())))
        .await;

    assert!(out.message.is_empty());
    assert_eq!(out.last_state(), PipelineState::Extracted);
    assert_eq!(h.calls.ocr.load(Ordering::SeqCst), 1);
    assert_eq!(h.calls.summarize.load(Ordering::SeqCst), 0);
    assert_eq!(h.calls.translate.load(Ordering::SeqCst), 0);
}

// ── Concurrency ──────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_uploads_with_same_name_keep_their_own_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let calls = Arc::new(Calls::default());
    let pipeline = Pipeline::new(
        Arc::new(FakeReader {
            mode: ReaderMode::Echo,
            calls: calls.clone(),
            delay: Duration::from_millis(20),
        }),
        Arc::new(FakeSummarizer {
            mode: SummarizerMode::Echo,
            calls: calls.clone(),
        }),
        Arc::new(FakeTranslator {
            mode: TranslatorMode::Tag,
            calls: calls.clone(),
        }),
        config_in(dir.path()),
    );

    let uploads = (0..8).map(|i| {
        let pipeline = pipeline.clone();
        tokio::spawn(async move {
            let content = format!("content-{i}");
            let out = pipeline
                .process(Some(UploadedImage::new("receipt.png", content.clone().into_bytes())))
                .await;
            (content, out)
        })
    });

    for handle in futures::future::join_all(uploads).await {
        let (content, out) = handle.unwrap();
        assert_eq!(out.extracted_text.as_deref(), Some(content.as_str()));
        assert!(out.message.ends_with(&content), "{}", out.message);
    }
    assert_eq!(calls.ocr.load(Ordering::SeqCst), 8);
    assert_eq!(files_in(dir.path()), 0);
}

// ── Output shape ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn output_serialises_with_snake_case_states() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(
        receipt_reader(),
        SummarizerMode::Echo,
        TranslatorMode::Tag,
        config_in(dir.path()),
    );

    let out = h
        .pipeline
        .process(Some(UploadedImage::new("receipt.png", b"img".to_vec())))
        .await;
    let json = serde_json::to_value(&out).unwrap();

    assert_eq!(json["states"][2], "asset_open");
    assert_eq!(json["message"], out.message.as_str());
    assert!(json["timings"]["total_ms"].is_u64());
}
