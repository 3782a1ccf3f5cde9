use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use verdict_agents::{AgentError, ContextSearchProvider};

use crate::error::SourceError;
use crate::read_json;

const BASE_URL: &str = "https://api.tavily.com";
const PROVIDER: &str = "tavily";

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    max_results: usize,
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub content: String,
}

/// General web search used to give the query planner background on a subject.
pub struct TavilySearch {
    client: Client,
    api_key: String,
    base_url: String,
    max_results: usize,
}

impl TavilySearch {
    pub fn new(client: Client, api_key: impl Into<String>, max_results: usize) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
            max_results,
        }
    }

    /// Create from the `TAVILY_API_KEY` environment variable.
    pub fn from_env(client: Client, max_results: usize) -> Result<Self, SourceError> {
        Ok(Self::new(client, crate::api_key("TAVILY_API_KEY")?, max_results))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub async fn search_snippets(&self, query: &str) -> Result<String, SourceError> {
        debug!(query, "Tavily search");
        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&SearchRequest {
                query,
                max_results: self.max_results,
            })
            .send()
            .await?;
        let body: SearchResponse = read_json(PROVIDER, response).await?;
        Ok(join_snippets(&body))
    }
}

#[async_trait]
impl ContextSearchProvider for TavilySearch {
    async fn search(&self, query: &str) -> Result<String, AgentError> {
        Ok(self.search_snippets(query).await?)
    }
}

/// Non-empty result contents, one per line.
pub fn join_snippets(response: &SearchResponse) -> String {
    response
        .results
        .iter()
        .map(|r| r.content.trim())
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
