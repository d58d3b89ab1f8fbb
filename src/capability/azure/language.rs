//! Azure AI Language extractive summarisation.
//!
//! Summarisation is a long-running operation: the job is submitted with
//! `POST /language/analyze-text/jobs`, the service answers `202 Accepted`
//! with an `operation-location` header, and the job document at that URL is
//! polled until its `status` is terminal.

use super::{check_status, decode_json, endpoint_url, http_client, require, send};
use super::SUBSCRIPTION_KEY_HEADER;
use crate::capability::{DocumentSummaryOutcome, ExtractiveSummarizer, SummarySentence};
use crate::error::{CapabilityError, OcrBriefError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::time::{sleep, Duration};
use tracing::{debug, info};

const CAPABILITY: &str = "azure-language";

/// Connection and polling settings for the Language service.
#[derive(Clone)]
pub struct AzureLanguageConfig {
    pub endpoint: String,
    pub key: String,
    /// Default: `2023-04-01`.
    pub api_version: String,
    /// Language of submitted documents. `None` lets the service assume English.
    pub document_language: Option<String>,
    /// Request timeout for each HTTP call in seconds. Default: 30.
    pub timeout_secs: u64,
    /// Delay between job polls in milliseconds. Default: 1000.
    pub poll_interval_ms: u64,
    /// Polls before giving up. Default: 60.
    pub max_polls: u32,
}

impl AzureLanguageConfig {
    pub fn new(endpoint: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            key: key.into(),
            api_version: "2023-04-01".to_string(),
            document_language: None,
            timeout_secs: 30,
            poll_interval_ms: 1000,
            max_polls: 60,
        }
    }
}

impl fmt::Debug for AzureLanguageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureLanguageConfig")
            .field("endpoint", &self.endpoint)
            .field("key", &"<redacted>")
            .field("api_version", &self.api_version)
            .field("document_language", &self.document_language)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("max_polls", &self.max_polls)
            .finish()
    }
}

/// [`ExtractiveSummarizer`] backed by the Azure Language analyze-text jobs API.
pub struct AzureSummarizer {
    client: reqwest::Client,
    config: AzureLanguageConfig,
}

impl AzureSummarizer {
    pub fn new(config: AzureLanguageConfig) -> Result<Self, OcrBriefError> {
        require(CAPABILITY, &config.endpoint, "AZURE_LANGUAGE_ENDPOINT")?;
        require(CAPABILITY, &config.key, "AZURE_LANGUAGE_KEY")?;
        let client = http_client(CAPABILITY, config.timeout_secs)?;
        Ok(Self { client, config })
    }

    /// Submit the job and return its `operation-location`.
    async fn submit(
        &self,
        documents: &[String],
        max_sentences: u32,
    ) -> Result<String, CapabilityError> {
        let body = JobRequest {
            display_name: "ocr-brief extractive summary",
            analysis_input: AnalysisInput {
                documents: documents
                    .iter()
                    .enumerate()
                    .map(|(i, text)| InputDocument {
                        id: i.to_string(),
                        language: self.config.document_language.as_deref(),
                        text,
                    })
                    .collect(),
            },
            tasks: vec![Task {
                kind: "ExtractiveSummarization",
                task_name: "extractive-summary",
                parameters: TaskParameters {
                    sentence_count: max_sentences,
                },
            }],
        };

        let request = self
            .client
            .post(endpoint_url(&self.config.endpoint, "language/analyze-text/jobs"))
            .query(&[("api-version", self.config.api_version.as_str())])
            .header(SUBSCRIPTION_KEY_HEADER, &self.config.key)
            .json(&body);

        let response = check_status(CAPABILITY, send(CAPABILITY, request).await?).await?;
        response
            .headers()
            .get("operation-location")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| CapabilityError::Decode {
                capability: CAPABILITY,
                detail: "response is missing the operation-location header".into(),
            })
    }

    /// Poll the job until it reaches a terminal status.
    async fn wait(&self, operation_location: &str) -> Result<JobState, CapabilityError> {
        let mut last_status = String::from("notStarted");
        for poll in 1..=self.config.max_polls {
            let request = self
                .client
                .get(operation_location)
                .header(SUBSCRIPTION_KEY_HEADER, &self.config.key);
            let response = check_status(CAPABILITY, send(CAPABILITY, request).await?).await?;
            let state: JobState = decode_json(CAPABILITY, response).await?;

            match job_progress(&state.status) {
                JobProgress::Finished => {
                    debug!("{}: job {} after {} polls", CAPABILITY, state.status, poll);
                    return Ok(state);
                }
                JobProgress::Failed => {
                    return Err(CapabilityError::JobFailed {
                        capability: CAPABILITY,
                        status: state.status,
                    });
                }
                JobProgress::Running => {
                    last_status = state.status;
                    sleep(Duration::from_millis(self.config.poll_interval_ms)).await;
                }
            }
        }
        Err(CapabilityError::PollExhausted {
            capability: CAPABILITY,
            polls: self.config.max_polls,
            status: last_status,
        })
    }
}

/// Where an analyze-text job stands after one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobProgress {
    Finished,
    Failed,
    Running,
}

/// Classify a job `status`. `cancelling` is not terminal yet.
fn job_progress(status: &str) -> JobProgress {
    match status {
        "succeeded" | "partiallyCompleted" => JobProgress::Finished,
        "failed" | "cancelled" => JobProgress::Failed,
        _ => JobProgress::Running,
    }
}

#[async_trait]
impl ExtractiveSummarizer for AzureSummarizer {
    fn name(&self) -> &'static str {
        CAPABILITY
    }

    async fn summarize(
        &self,
        documents: &[String],
        max_sentences: u32,
    ) -> Result<Vec<DocumentSummaryOutcome>, CapabilityError> {
        let operation_location = self.submit(documents, max_sentences).await?;
        info!("{}: job accepted, polling {}", CAPABILITY, operation_location);
        let state = self.wait(&operation_location).await?;
        outcomes_from_job(state, documents.len())
    }
}

/// Map the first task's results back onto input order.
fn outcomes_from_job(
    state: JobState,
    document_count: usize,
) -> Result<Vec<DocumentSummaryOutcome>, CapabilityError> {
    let results = state
        .tasks
        .items
        .into_iter()
        .next()
        .and_then(|item| item.results)
        .ok_or_else(|| CapabilityError::Decode {
            capability: CAPABILITY,
            detail: "job finished without task results".into(),
        })?;

    let mut documents = results.documents;
    let mut errors = results.errors;

    Ok((0..document_count)
        .map(|i| {
            let id = i.to_string();
            if let Some(pos) = documents.iter().position(|d| d.id == id) {
                let doc = documents.swap_remove(pos);
                DocumentSummaryOutcome::Sentences(
                    doc.sentences
                        .into_iter()
                        .map(|s| SummarySentence {
                            text: s.text,
                            rank_score: s.rank_score,
                        })
                        .collect(),
                )
            } else if let Some(pos) = errors.iter().position(|e| e.id == id) {
                let err = errors.swap_remove(pos).error;
                DocumentSummaryOutcome::Error {
                    code: err.code,
                    message: err.message,
                }
            } else {
                DocumentSummaryOutcome::Error {
                    code: "MissingResult".into(),
                    message: format!("no result returned for document {id}"),
                }
            }
        })
        .collect())
}

// ── Wire format ─────────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JobRequest<'a> {
    display_name: &'a str,
    analysis_input: AnalysisInput<'a>,
    tasks: Vec<Task<'a>>,
}

#[derive(Serialize)]
struct AnalysisInput<'a> {
    documents: Vec<InputDocument<'a>>,
}

#[derive(Serialize)]
struct InputDocument<'a> {
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<&'a str>,
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Task<'a> {
    kind: &'a str,
    task_name: &'a str,
    parameters: TaskParameters,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TaskParameters {
    sentence_count: u32,
}

#[derive(Debug, Deserialize)]
struct JobState {
    status: String,
    #[serde(default)]
    tasks: JobTasks,
}

#[derive(Debug, Default, Deserialize)]
struct JobTasks {
    #[serde(default)]
    items: Vec<TaskItem>,
}

#[derive(Debug, Deserialize)]
struct TaskItem {
    results: Option<TaskResults>,
}

#[derive(Debug, Deserialize)]
struct TaskResults {
    #[serde(default)]
    documents: Vec<WireDocument>,
    #[serde(default)]
    errors: Vec<WireDocumentError>,
}

#[derive(Debug, Deserialize)]
struct WireDocument {
    id: String,
    #[serde(default)]
    sentences: Vec<WireSentence>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireSentence {
    text: String,
    rank_score: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct WireDocumentError {
    id: String,
    error: WireError,
}

#[derive(Debug, Deserialize)]
struct WireError {
    code: String,
    message: String,
}
