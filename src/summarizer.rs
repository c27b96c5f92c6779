//! Entry points used by the CLI: summarize text or a page, answer questions.
//!
//! URLs are resolved to text with the [`ContentLoader`] before being handed to
//! the summarization or answer client.

use crate::config::{Config, ConfigError};
use crate::model::{InputPayload, SummaryLength, SummaryResult, TEXT_SOURCE};
use crate::openai::{AnswerClient, AnswerOutcome};
use crate::scraper::{ContentFetchError, ContentLoader};
use crate::text_analytics::{SummarizationError, TextAnalyticsClient};
use reqwest::Client;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SummarizerError {
    #[error(transparent)]
    Content(#[from] ContentFetchError),
    #[error(transparent)]
    Summarization(#[from] SummarizationError),
    #[error("input has neither text nor a URL")]
    EmptyInput,
}

pub struct Summarizer {
    loader: ContentLoader,
    summaries: TextAnalyticsClient,
    answers: AnswerClient,
}

impl Summarizer {
    /// Build all clients from `config`.
    ///
    /// Fails when the Text Analytics key or endpoint is missing. Missing
    /// Azure OpenAI settings only affect the answers.
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let credentials = config.text_analytics_credentials()?;
        let timeout = config.http.timeout();
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            loader: ContentLoader::new(timeout)?,
            summaries: TextAnalyticsClient::new(
                client.clone(),
                credentials,
                &config.text_analytics,
            ),
            answers: AnswerClient::new(client, &config.openai),
        })
    }

    pub fn loader(&self) -> &ContentLoader {
        &self.loader
    }

    pub async fn summarize_text(
        &self,
        text: &str,
        max_sentences: u32,
    ) -> Result<String, SummarizerError> {
        Ok(self.summaries.summarize(text, max_sentences).await?)
    }

    pub async fn summarize_url(
        &self,
        url: &str,
        max_sentences: u32,
    ) -> Result<String, SummarizerError> {
        let content = self.loader.load(url).await?;
        self.summarize_text(&content, max_sentences).await
    }

    /// Summarize whichever input the payload carries. A non-blank URL takes precedence.
    pub async fn summarize(
        &self,
        input: &InputPayload,
        length: SummaryLength,
    ) -> Result<SummaryResult, SummarizerError> {
        let max_sentences = length.max_sentences();
        let url = input
            .url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty());
        match (url, &input.content) {
            (Some(url), _) => Ok(SummaryResult {
                summary: self.summarize_url(url, max_sentences).await?,
                source: Some(url.to_string()),
            }),
            (None, Some(text)) => Ok(SummaryResult {
                summary: self.summarize_text(text, max_sentences).await?,
                source: Some(TEXT_SOURCE.to_string()),
            }),
            (None, None) => Err(SummarizerError::EmptyInput),
        }
    }

    /// Answer a question about `context`. Never fails; see [`AnswerClient::answer`].
    pub async fn answer_question(&self, context: &str, question: &str) -> String {
        self.answers.answer(context, question).await
    }

    pub async fn ask(&self, context: &str, question: &str) -> AnswerOutcome {
        self.answers.ask(context, question).await
    }

    /// Load `url` and answer a question about its text. Loading failures are errors.
    pub async fn answer_question_url(
        &self,
        url: &str,
        question: &str,
    ) -> Result<AnswerOutcome, SummarizerError> {
        let content = self.loader.load(url).await?;
        Ok(self.ask(&content, question).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_requires_text_analytics_key() {
        let mut config = Config::default();
        config.text_analytics.key = Some(String::new());
        config.text_analytics.endpoint = Some("https://ta.example.com".to_string());

        assert!(matches!(
            Summarizer::new(&config),
            Err(ConfigError::MissingTextAnalytics)
        ));
    }

    #[test]
    fn construction_rejects_zero_timeout() {
        let mut config = Config::default();
        config.text_analytics.key = Some("key".to_string());
        config.text_analytics.endpoint = Some("https://ta.example.com".to_string());
        config.http.timeout_secs = 0;

        assert!(matches!(
            Summarizer::new(&config),
            Err(ConfigError::ZeroValue("http.timeout_secs"))
        ));
    }

    #[test]
    fn construction_tolerates_missing_openai() {
        let mut config = Config::default();
        config.text_analytics.key = Some("key".to_string());
        config.text_analytics.endpoint = Some("https://ta.example.com".to_string());

        assert!(Summarizer::new(&config).is_ok());
    }

    #[tokio::test]
    async fn empty_payload_is_rejected() {
        let mut config = Config::default();
        config.text_analytics.key = Some("key".to_string());
        config.text_analytics.endpoint = Some("https://ta.example.com".to_string());

        let summarizer = Summarizer::new(&config).unwrap();
        let result = summarizer
            .summarize(&InputPayload::default(), SummaryLength::Short)
            .await;
        assert!(matches!(result, Err(SummarizerError::EmptyInput)));

        let blank_url = InputPayload::url("  ");
        let result = summarizer.summarize(&blank_url, SummaryLength::Short).await;
        assert!(matches!(result, Err(SummarizerError::EmptyInput)));
    }
}
