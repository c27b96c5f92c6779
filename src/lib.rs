//! # azsum
//!
//! Summarise or ask questions about text and web pages using Azure AI.
//!
//! ## Features
//!
//! - **Extractive summaries**: Azure AI Language picks the 3 or 6 most relevant sentences
//! - **Question answering**: Azure OpenAI answers a question grounded in the given text
//! - **Web pages**: URLs are fetched and flattened to their visible text first

pub mod config;
pub mod display;
pub mod model;
pub mod openai;
pub mod scraper;
pub mod summarizer;
pub mod text_analytics;

pub use config::{Config, ConfigError};
pub use model::{InputPayload, SummaryLength, SummaryResult};
pub use openai::{AnswerClient, AnswerOutcome};
pub use scraper::{ContentFetchError, ContentLoader};
pub use summarizer::{Summarizer, SummarizerError};
pub use text_analytics::{SummarizationError, TextAnalyticsClient};
