//! Azure AI Language extractive summarization client.
//!
//! Submits a single-document analyze-text job, polls its operation
//! location until the job settles, and joins the ranked sentences.

use crate::config::{TextAnalyticsConfig, TextAnalyticsCredentials};
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
const OPERATION_LOCATION_HEADER: &str = "operation-location";
const DOCUMENT_ID: &str = "1";

#[derive(Error, Debug)]
pub enum SummarizationError {
    #[error("cannot summarize an empty document")]
    EmptyDocument,
    #[error("sentence count must be at least 1")]
    InvalidSentenceCount,
    #[error("summarization request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("summarization service returned {status}: {message}")]
    Api { status: StatusCode, message: String },
    #[error("summarization job response had no operation-location header")]
    MissingOperationLocation,
    #[error("summarization job {status}: {message}")]
    JobFailed { status: String, message: String },
    #[error("document error ({code}): {message}")]
    Document { code: String, message: String },
    #[error("summarization job returned no document result")]
    EmptyResult,
}

// Request bodies

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeJobRequest<'a> {
    display_name: &'a str,
    analysis_input: AnalysisInput<'a>,
    tasks: Vec<SummarizationTask>,
}

#[derive(Debug, Serialize)]
struct AnalysisInput<'a> {
    documents: Vec<InputDocument<'a>>,
}

#[derive(Debug, Serialize)]
struct InputDocument<'a> {
    id: &'a str,
    language: &'a str,
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SummarizationTask {
    kind: &'static str,
    task_name: &'static str,
    parameters: SummarizationParameters,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SummarizationParameters {
    sentence_count: u32,
}

// Response bodies, limited to the fields we read

#[derive(Debug, Deserialize)]
pub struct JobState {
    pub status: JobStatus,
    #[serde(default)]
    pub errors: Vec<ServiceError>,
    #[serde(default)]
    pub tasks: Option<TaskCollection>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JobStatus {
    NotStarted,
    Running,
    Cancelling,
    Succeeded,
    PartiallyCompleted,
    Failed,
    Cancelled,
}

#[derive(Debug, Default, Deserialize)]
pub struct TaskCollection {
    #[serde(default)]
    pub items: Vec<SummarizationTaskResult>,
}

#[derive(Debug, Deserialize)]
pub struct SummarizationTaskResult {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub results: Option<SummarizationResults>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SummarizationResults {
    #[serde(default)]
    pub documents: Vec<SummarizedDocument>,
    #[serde(default)]
    pub errors: Vec<DocumentError>,
}

#[derive(Debug, Deserialize)]
pub struct SummarizedDocument {
    pub id: String,
    pub sentences: Vec<ExtractedSentence>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedSentence {
    pub text: String,
    #[serde(default)]
    pub rank_score: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct DocumentError {
    pub id: String,
    pub error: ServiceError,
}

#[derive(Debug, Deserialize)]
pub struct ServiceError {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ServiceError,
}

impl JobStatus {
    fn is_pending(self) -> bool {
        matches!(
            self,
            JobStatus::NotStarted | JobStatus::Running | JobStatus::Cancelling
        )
    }

    fn as_str(self) -> &'static str {
        match self {
            JobStatus::NotStarted => "notStarted",
            JobStatus::Running => "running",
            JobStatus::Cancelling => "cancelling",
            JobStatus::Succeeded => "succeeded",
            JobStatus::PartiallyCompleted => "partiallyCompleted",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }
}

/// Client for the extractive summarization endpoint
#[derive(Debug, Clone)]
pub struct TextAnalyticsClient {
    client: Client,
    credentials: TextAnalyticsCredentials,
    api_version: String,
    language: String,
    poll_interval: Duration,
}

impl TextAnalyticsClient {
    pub fn new(
        client: Client,
        credentials: TextAnalyticsCredentials,
        config: &TextAnalyticsConfig,
    ) -> Self {
        Self {
            client,
            credentials,
            api_version: config.api_version.clone(),
            language: config.language.clone(),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        }
    }

    /// Summarize `text` into at most `max_sentences` extracted sentences,
    /// joined by a single space in the order the service ranks them.
    pub async fn summarize(
        &self,
        text: &str,
        max_sentences: u32,
    ) -> Result<String, SummarizationError> {
        if text.trim().is_empty() {
            return Err(SummarizationError::EmptyDocument);
        }
        if max_sentences == 0 {
            return Err(SummarizationError::InvalidSentenceCount);
        }

        let operation = self.submit(text, max_sentences).await?;
        let state = self.wait_for_completion(&operation).await?;
        let sentences = extract_sentences(state)?;

        info!(sentences = sentences.len(), "summarization complete");
        Ok(sentences
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" "))
    }

    fn jobs_url(&self) -> String {
        format!(
            "{}/language/analyze-text/jobs?api-version={}",
            self.credentials.endpoint.trim_end_matches('/'),
            self.api_version
        )
    }

    /// Start the analyze job and return its operation location
    async fn submit(&self, text: &str, max_sentences: u32) -> Result<String, SummarizationError> {
        let body = AnalyzeJobRequest {
            display_name: "Extractive summarization",
            analysis_input: AnalysisInput {
                documents: vec![InputDocument {
                    id: DOCUMENT_ID,
                    language: &self.language,
                    text,
                }],
            },
            tasks: vec![SummarizationTask {
                kind: "ExtractiveSummarization",
                task_name: "summarize",
                parameters: SummarizationParameters {
                    sentence_count: max_sentences,
                },
            }],
        };

        debug!(chars = text.len(), max_sentences, "submitting summarization job");
        let response = self
            .client
            .post(self.jobs_url())
            .header(SUBSCRIPTION_KEY_HEADER, &self.credentials.key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(api_error(status, response.text().await?));
        }

        operation_location(response.headers()).ok_or(SummarizationError::MissingOperationLocation)
    }

    /// Poll the job until it leaves the pending states
    async fn wait_for_completion(&self, operation: &str) -> Result<JobState, SummarizationError> {
        loop {
            let response = self
                .client
                .get(operation)
                .header(SUBSCRIPTION_KEY_HEADER, &self.credentials.key)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                return Err(api_error(status, response.text().await?));
            }

            let state: JobState = response.json().await?;
            debug!(status = state.status.as_str(), "summarization job state");
            if !state.status.is_pending() {
                return Ok(state);
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

fn operation_location(headers: &HeaderMap) -> Option<String> {
    headers
        .get(OPERATION_LOCATION_HEADER)?
        .to_str()
        .ok()
        .map(str::to_string)
}

fn api_error(status: StatusCode, body: String) -> SummarizationError {
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|envelope| format!("({}) {}", envelope.error.code, envelope.error.message))
        .unwrap_or(body);
    SummarizationError::Api { status, message }
}

/// Pull the sentences of our single document out of a settled job
fn extract_sentences(state: JobState) -> Result<Vec<ExtractedSentence>, SummarizationError> {
    let job_failed = |message: String| SummarizationError::JobFailed {
        status: state.status.as_str().to_string(),
        message,
    };
    let job_errors = state
        .errors
        .iter()
        .map(|e| format!("({}) {}", e.code, e.message))
        .collect::<Vec<_>>()
        .join("; ");

    if matches!(state.status, JobStatus::Failed | JobStatus::Cancelled) {
        return Err(job_failed(job_errors));
    }

    let items = state.tasks.unwrap_or_default().items;
    let task_status = items.iter().find_map(|item| item.status.clone());
    let Some(results) = items.into_iter().find_map(|item| item.results) else {
        // A settled job without results still carries the reason in its task status
        return match task_status {
            Some(task_status) if job_errors.is_empty() => {
                Err(job_failed(format!("task {task_status}")))
            }
            Some(task_status) => Err(job_failed(format!("task {task_status}: {job_errors}"))),
            None if !job_errors.is_empty() => Err(job_failed(job_errors)),
            None => Err(SummarizationError::EmptyResult),
        };
    };

    if let Some(doc_error) = results.errors.into_iter().find(|e| e.id == DOCUMENT_ID) {
        return Err(SummarizationError::Document {
            code: doc_error.error.code,
            message: doc_error.error.message,
        });
    }

    results
        .documents
        .into_iter()
        .find(|d| d.id == DOCUMENT_ID)
        .map(|d| d.sentences)
        .ok_or(SummarizationError::EmptyResult)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> TextAnalyticsClient {
        let config = TextAnalyticsConfig {
            poll_interval_ms: 1,
            ..TextAnalyticsConfig::default()
        };
        TextAnalyticsClient::new(
            Client::new(),
            TextAnalyticsCredentials {
                key: "test-key".to_string(),
                endpoint: format!("{}/", server.uri()),
            },
            &config,
        )
    }

    async fn mount_submit(server: &MockServer, sentence_count: u32) {
        Mock::given(method("POST"))
            .and(path("/language/analyze-text/jobs"))
            .and(query_param("api-version", "2023-04-01"))
            .and(header(SUBSCRIPTION_KEY_HEADER, "test-key"))
            .and(body_partial_json(json!({
                "analysisInput": {"documents": [{"id": "1", "language": "en"}]},
                "tasks": [{
                    "kind": "ExtractiveSummarization",
                    "parameters": {"sentenceCount": sentence_count}
                }]
            })))
            .respond_with(ResponseTemplate::new(202).insert_header(
                OPERATION_LOCATION_HEADER,
                format!("{}/jobs/42?api-version=2023-04-01", server.uri()).as_str(),
            ))
            .expect(1)
            .mount(server)
            .await;
    }

    fn succeeded(sentences: &[&str]) -> serde_json::Value {
        let sentences: Vec<_> = sentences
            .iter()
            .enumerate()
            .map(|(i, s)| json!({"text": s, "rankScore": 1.0 - i as f64 / 10.0, "offset": 0, "length": s.len()}))
            .collect();
        json!({
            "status": "succeeded",
            "errors": [],
            "tasks": {"items": [{
                "kind": "ExtractiveSummarizationLROResults",
                "status": "succeeded",
                "results": {"documents": [{"id": "1", "sentences": sentences, "warnings": []}], "errors": []}
            }]}
        })
    }

    #[tokio::test]
    async fn joins_sentences_in_service_order() {
        let server = MockServer::start().await;
        mount_submit(&server, 3).await;
        Mock::given(method("GET"))
            .and(path("/jobs/42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(succeeded(&[
                "Rust is fast.",
                "It is memory safe.",
                "Cargo builds it.",
            ])))
            .mount(&server)
            .await;

        let summary = client_for(&server)
            .summarize("Some long article text.", 3)
            .await
            .unwrap();
        assert_eq!(summary, "Rust is fast. It is memory safe. Cargo builds it.");
    }

    #[tokio::test]
    async fn polls_until_job_settles() {
        let server = MockServer::start().await;
        mount_submit(&server, 6).await;
        Mock::given(method("GET"))
            .and(path("/jobs/42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "running"})))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/jobs/42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(succeeded(&["Only one."])))
            .mount(&server)
            .await;

        let summary = client_for(&server).summarize("Text.", 6).await.unwrap();
        assert_eq!(summary, "Only one.");
    }

    #[tokio::test]
    async fn unauthorized_is_an_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": {"code": "401", "message": "Access denied due to invalid subscription key."}
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).summarize("Text.", 3).await.unwrap_err();
        match err {
            SummarizationError::Api { status, message } => {
                assert_eq!(status, StatusCode::UNAUTHORIZED);
                assert!(message.contains("invalid subscription key"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_job_is_reported() {
        let server = MockServer::start().await;
        mount_submit(&server, 3).await;
        Mock::given(method("GET"))
            .and(path("/jobs/42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "failed",
                "errors": [{"code": "InternalServerError", "message": "boom"}]
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).summarize("Text.", 3).await.unwrap_err();
        assert!(matches!(err, SummarizationError::JobFailed { .. }));
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn document_error_is_reported() {
        let server = MockServer::start().await;
        mount_submit(&server, 3).await;
        Mock::given(method("GET"))
            .and(path("/jobs/42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "succeeded",
                "tasks": {"items": [{"results": {
                    "documents": [],
                    "errors": [{"id": "1", "error": {"code": "InvalidDocument", "message": "Document text is empty."}}]
                }}]}
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).summarize("Text.", 3).await.unwrap_err();
        assert!(matches!(
            err,
            SummarizationError::Document { ref code, .. } if code == "InvalidDocument"
        ));
    }

    #[tokio::test]
    async fn partially_completed_without_results_reports_task_status() {
        let server = MockServer::start().await;
        mount_submit(&server, 3).await;
        Mock::given(method("GET"))
            .and(path("/jobs/42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "partiallyCompleted",
                "errors": [{"code": "InvalidRequest", "message": "Task failed"}],
                "tasks": {"items": [{"kind": "ExtractiveSummarizationLROResults", "status": "failed"}]}
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).summarize("Text.", 3).await.unwrap_err();
        match err {
            SummarizationError::JobFailed { status, message } => {
                assert_eq!(status, "partiallyCompleted");
                assert!(message.contains("task failed"));
                assert!(message.contains("Task failed"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_operation_location() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(202))
            .mount(&server)
            .await;

        let err = client_for(&server).summarize("Text.", 3).await.unwrap_err();
        assert!(matches!(err, SummarizationError::MissingOperationLocation));
    }

    #[tokio::test]
    async fn rejects_bad_input_without_calling_service() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert!(matches!(
            client.summarize("   ", 3).await,
            Err(SummarizationError::EmptyDocument)
        ));
        assert!(matches!(
            client.summarize("Text.", 0).await,
            Err(SummarizationError::InvalidSentenceCount)
        ));
    }
}
