//! Value types passed between the CLI and the summarizer.

use serde::{Deserialize, Serialize};

/// Source label recorded for summaries of free text
pub const TEXT_SOURCE: &str = "text";

/// What the user submitted: free text or a URL.
///
/// Callers populate exactly one of the two fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputPayload {
    pub content: Option<String>,
    pub url: Option<String>,
}

impl InputPayload {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            url: None,
        }
    }

    pub fn url(url: impl Into<String>) -> Self {
        Self {
            content: None,
            url: Some(url.into()),
        }
    }
}

/// A finished summary and where it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub summary: String,
    /// The originating URL, or `"text"`
    pub source: Option<String>,
}

/// Summary length tiers offered to the user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum SummaryLength {
    /// About 50 words
    #[default]
    Short,
    /// About 100 words
    Long,
}

impl SummaryLength {
    /// Maximum number of extracted sentences for this tier
    pub fn max_sentences(self) -> u32 {
        match self {
            SummaryLength::Short => 3,
            SummaryLength::Long => 6,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_tiers() {
        assert_eq!(SummaryLength::Short.max_sentences(), 3);
        assert_eq!(SummaryLength::Long.max_sentences(), 6);
        assert_eq!(SummaryLength::default(), SummaryLength::Short);
    }

    #[test]
    fn summary_result_serializes_source() {
        let result = SummaryResult {
            summary: "One. Two.".to_string(),
            source: Some(TEXT_SOURCE.to_string()),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["source"], "text");
        assert_eq!(json["summary"], "One. Two.");
    }
}
