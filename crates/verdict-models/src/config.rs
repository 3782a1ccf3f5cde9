use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Top-level configuration for verdict.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct VerdictConfig {
    #[serde(default)]
    pub models: ModelsConfig,
    #[serde(default)]
    pub sentiment: SentimentConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
}

/// Which model serves each language-model role.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelsConfig {
    /// Model producing the final rating verdict.
    pub rating_model: String,
    /// Model summarizing individual articles.
    pub summary_model: String,
    /// Model scoring company and sector sentiment.
    pub sentiment_model: String,
    /// Model planning news search queries.
    pub query_model: String,
    /// Per-call timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            rating_model: "claude-sonnet-4-5-20250929".to_string(),
            summary_model: "claude-3-5-haiku-latest".to_string(),
            sentiment_model: "claude-sonnet-4-5-20250929".to_string(),
            query_model: "claude-3-5-haiku-latest".to_string(),
            timeout_seconds: 90,
        }
    }
}

/// Configuration for the news/sentiment pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SentimentConfig {
    /// How far back news searches look, in days.
    pub lookback_days: u32,
    /// Category the news search is restricted to.
    pub news_category: String,
    /// Upper bound on planned search queries.
    pub max_queries: usize,
    /// Hits requested per query.
    pub results_per_query: usize,
    /// Articles fetched and summarized concurrently.
    pub article_concurrency: usize,
    /// Drop articles already seen under an earlier query (matched by URL).
    pub dedupe_articles: bool,
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            lookback_days: 30,
            news_category: "news".to_string(),
            max_queries: 3,
            results_per_query: 10,
            article_concurrency: 4,
            dedupe_articles: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BatchConfig {
    /// Maximum analyses in flight at once.
    pub max_in_flight: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { max_in_flight: 4 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExportConfig {
    pub output_dir: String,
    pub format: ExportFormat,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: "exports".to_string(),
            format: ExportFormat::Text,
        }
    }
}

/// Settings shared by the HTTP data sources. API keys come from the environment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SourcesConfig {
    pub http_timeout_seconds: u64,
    /// Snippets requested from the context search.
    pub context_results: usize,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            http_timeout_seconds: 30,
            context_results: 5,
        }
    }
}

/// Output format for exported analyses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Human-readable report.
    #[default]
    Text,
    /// JSON with every record field.
    Structured,
    /// CSV, one row per record.
    Tabular,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Text => "txt",
            ExportFormat::Structured => "json",
            ExportFormat::Tabular => "csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Text => f.write_str("text"),
            ExportFormat::Structured => f.write_str("structured"),
            ExportFormat::Tabular => f.write_str("tabular"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(ExportFormat::Text),
            "structured" | "json" => Ok(ExportFormat::Structured),
            "tabular" | "csv" => Ok(ExportFormat::Tabular),
            other => Err(format!(
                "unknown export format '{other}' (expected text, structured or tabular)"
            )),
        }
    }
}
