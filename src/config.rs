//! Configuration loading and management for azsum.
//!
//! Loads settings from `azsum.toml` with environment variable overrides for
//! credentials. A `.env` file in the working directory is honoured.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

const CONFIG_FILE_NAME: &str = "azsum.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Azure Text Analytics key and endpoint must be provided.")]
    MissingTextAnalytics,
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),
}

/// Azure AI Language (Text Analytics) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TextAnalyticsConfig {
    pub key: Option<String>,
    /// Resource endpoint, e.g. `https://my-resource.cognitiveservices.azure.com`
    pub endpoint: Option<String>,
    pub api_version: String,
    /// Language hint sent with each document
    pub language: String,
    /// Delay between job status polls
    pub poll_interval_ms: u64,
}

/// Azure OpenAI settings. Every field is optional; the answer client
/// degrades to a fixed message when any of them is missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub endpoint: Option<String>,
    /// Deployment name of the chat model
    pub deployment: Option<String>,
    pub api_version: String,
}

/// Outbound HTTP settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub text_analytics: TextAnalyticsConfig,
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

/// Validated Text Analytics credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextAnalyticsCredentials {
    pub key: String,
    pub endpoint: String,
}

/// Validated Azure OpenAI credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAiCredentials {
    pub api_key: String,
    pub endpoint: String,
    pub deployment: String,
}

impl Config {
    /// Load configuration from the default location (azsum.toml in cwd or home).
    ///
    /// A missing config file is not an error: defaults plus environment are used.
    pub fn load() -> Result<Self, ConfigError> {
        load_dotenv();
        let mut config = match Self::find_config_file() {
            Some(path) => Self::read_file(&path)?,
            None => Config::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        load_dotenv();
        let mut config = Self::read_file(path)?;
        config.apply_env();
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    /// Reject settings that would make every request fail or spin the poll loop
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http.timeout_secs == 0 {
            return Err(ConfigError::ZeroValue("http.timeout_secs"));
        }
        if self.text_analytics.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroValue("text_analytics.poll_interval_ms"));
        }
        Ok(())
    }

    /// Override credentials from process environment variables
    pub fn apply_env(&mut self) {
        self.apply_env_with(|name| std::env::var(name).ok());
    }

    /// Override credentials using `lookup` to resolve variable names.
    ///
    /// Each setting checks its primary name first, then the `AZURE_`-prefixed alias.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let set = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let var = |name: &str| set(name).or_else(|| set(&format!("AZURE_{name}")));

        if let Some(key) = var("TEXT_ANALYTICS_KEY") {
            self.text_analytics.key = Some(key);
        }
        if let Some(endpoint) = var("TEXT_ANALYTICS_ENDPOINT") {
            self.text_analytics.endpoint = Some(endpoint);
        }
        if let Some(key) = var("OPENAI_API_KEY") {
            self.openai.api_key = Some(key);
        }
        if let Some(endpoint) = var("OPENAI_ENDPOINT") {
            self.openai.endpoint = Some(endpoint);
        }
        if let Some(deployment) = var("OPENAI_DEPLOYMENT") {
            self.openai.deployment = Some(deployment);
        }
    }

    /// Find the config file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        // Check current directory first
        let local_config = PathBuf::from(CONFIG_FILE_NAME);
        if local_config.exists() {
            return Some(local_config);
        }

        // Check home directory
        let home_config = dirs::home_dir()?
            .join(".config")
            .join("azsum")
            .join(CONFIG_FILE_NAME);
        home_config.exists().then_some(home_config)
    }

    /// Get the Text Analytics key and endpoint, both required and non-empty
    pub fn text_analytics_credentials(&self) -> Result<TextAnalyticsCredentials, ConfigError> {
        match (
            non_empty(&self.text_analytics.key),
            non_empty(&self.text_analytics.endpoint),
        ) {
            (Some(key), Some(endpoint)) => Ok(TextAnalyticsCredentials {
                key: key.to_string(),
                endpoint: endpoint.to_string(),
            }),
            _ => Err(ConfigError::MissingTextAnalytics),
        }
    }
}

impl OpenAiConfig {
    /// All three credentials, or `None` if any is missing or empty
    pub fn credentials(&self) -> Option<OpenAiCredentials> {
        Some(OpenAiCredentials {
            api_key: non_empty(&self.api_key)?.to_string(),
            endpoint: non_empty(&self.endpoint)?.to_string(),
            deployment: non_empty(&self.deployment)?.to_string(),
        })
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

impl Default for TextAnalyticsConfig {
    fn default() -> Self {
        Self {
            key: None,
            endpoint: None,
            api_version: "2023-04-01".to_string(),
            language: "en".to_string(),
            poll_interval_ms: 1000,
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: None,
            deployment: None,
            api_version: "2023-05-15".to_string(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(dotenvy::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("failed to load .env: {e}"),
    }
}
