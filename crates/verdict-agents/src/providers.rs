//! Collaborator seams. Every external data source and model role sits behind
//! one of these traits so the pipeline can be driven by mocks in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use verdict_models::{NewsHit, SentimentMode};

use crate::error::AgentError;

/// Renders a fundamentals snapshot for a subject.
#[async_trait]
pub trait FundamentalsProvider: Send + Sync {
    async fn render(&self, subject: &str) -> Result<String, AgentError>;
}

/// General web search returning concatenated snippets.
#[async_trait]
pub trait ContextSearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<String, AgentError>;
}

/// Time-windowed news search plus full-body retrieval for its hits.
#[async_trait]
pub trait NewsSearchProvider: Send + Sync {
    async fn search(
        &self,
        query: &str,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        category: &str,
    ) -> Result<Vec<NewsHit>, AgentError>;

    async fn fetch_body(&self, url: &str) -> Result<String, AgentError>;
}

/// Turns a subject and some background context into news search queries.
#[async_trait]
pub trait QueryPlanner: Send + Sync {
    async fn plan(&self, subject: &str, context: &str) -> Result<Vec<String>, AgentError>;
}

#[async_trait]
pub trait SummarizationModel: Send + Sync {
    async fn summarize(&self, title: &str, body: &str) -> Result<String, AgentError>;
}

#[async_trait]
pub trait SentimentModel: Send + Sync {
    async fn score(
        &self,
        corpus: &str,
        mode: SentimentMode,
        target_name: &str,
    ) -> Result<String, AgentError>;
}

/// Produces the free-text reply the rating verdict is extracted from.
#[async_trait]
pub trait RatingModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, AgentError>;
}
