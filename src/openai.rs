//! Azure OpenAI question answering.
//!
//! Answers are always delivered as text: missing credentials and failed
//! requests come back as readable messages instead of errors. [`AnswerOutcome`]
//! keeps the distinction for callers that want it.

use crate::config::{OpenAiConfig, OpenAiCredentials};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Returned in place of an answer when the client is not configured
pub const CREDENTIALS_NOT_SET: &str = "Azure OpenAI credentials not set.";

/// Prefix of the text returned in place of an answer when the request fails
pub const ERROR_PREFIX: &str = "Error from Azure OpenAI: ";

const SYSTEM_PROMPT: &str = "You are a helpful assistant.";
const MAX_TOKENS: u32 = 256;
const TEMPERATURE: f64 = 0.2;

#[derive(Error, Debug)]
pub enum AnswerError {
    #[error("{0}")]
    Request(#[from] reqwest::Error),
    #[error("Error code: {} - {body}", .status.as_u16())]
    Api { status: StatusCode, body: String },
    #[error("failed to decode completion: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("completion returned no choices")]
    EmptyChoices,
    #[error("completion message has no content (finish reason: {0})")]
    EmptyContent(String),
}

/// Result of asking a question, before it is flattened to text
#[derive(Debug)]
pub enum AnswerOutcome {
    Answered(String),
    CredentialsMissing,
    Failed(AnswerError),
}

impl AnswerOutcome {
    /// Render the outcome as the text shown to the user
    pub fn into_text(self) -> String {
        match self {
            AnswerOutcome::Answered(answer) => answer,
            AnswerOutcome::CredentialsMissing => CREDENTIALS_NOT_SET.to_string(),
            AnswerOutcome::Failed(err) => format!("{ERROR_PREFIX}{err}"),
        }
    }

    pub fn is_answered(&self) -> bool {
        matches!(self, AnswerOutcome::Answered(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// The system and user messages for a context-grounded question
pub fn build_messages(context: &str, question: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage {
            role: Role::System,
            content: SYSTEM_PROMPT.to_string(),
        },
        ChatMessage {
            role: Role::User,
            content: format!("Context:\n{context}\n\nQuestion: {question}\nAnswer:"),
        },
    ]
}

/// Chat-completion client bound to one Azure OpenAI deployment
#[derive(Debug, Clone)]
pub struct AnswerClient {
    client: Client,
    credentials: Option<OpenAiCredentials>,
    api_version: String,
}

impl AnswerClient {
    pub fn new(client: Client, config: &OpenAiConfig) -> Self {
        Self {
            client,
            credentials: config.credentials(),
            api_version: config.api_version.clone(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    /// Answer `question` from `context`, always as text.
    pub async fn answer(&self, context: &str, question: &str) -> String {
        self.ask(context, question).await.into_text()
    }

    /// Answer `question` from `context`, keeping failures distinguishable
    pub async fn ask(&self, context: &str, question: &str) -> AnswerOutcome {
        let Some(credentials) = &self.credentials else {
            warn!("Azure OpenAI credentials not set; skipping request");
            return AnswerOutcome::CredentialsMissing;
        };

        match self.complete(credentials, context, question).await {
            Ok(answer) => {
                info!(chars = answer.len(), "answer received");
                AnswerOutcome::Answered(answer)
            }
            Err(err) => {
                warn!("Azure OpenAI request failed: {err}");
                AnswerOutcome::Failed(err)
            }
        }
    }

    async fn complete(
        &self,
        credentials: &OpenAiCredentials,
        context: &str,
        question: &str,
    ) -> Result<String, AnswerError> {
        let url = format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            credentials.endpoint.trim_end_matches('/'),
            credentials.deployment,
            self.api_version
        );
        let messages = build_messages(context, question);
        let body = ChatCompletionRequest {
            messages: &messages,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        debug!(deployment = %credentials.deployment, "requesting chat completion");
        let response = self
            .client
            .post(url)
            .header("api-key", &credentials.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(AnswerError::Api { status, body: text });
        }

        let completion: ChatCompletionResponse = serde_json::from_str(&text)?;
        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or(AnswerError::EmptyChoices)?;
        let content = choice.message.content.ok_or_else(|| {
            AnswerError::EmptyContent(choice.finish_reason.unwrap_or_else(|| "unknown".to_string()))
        })?;
        Ok(content.trim().to_string())
    }
}
