use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;
use verdict_agents::{AgentError, NewsSearchProvider};
use verdict_models::NewsHit;

use crate::error::SourceError;
use crate::read_json;

const BASE_URL: &str = "https://api.exa.ai";
const PROVIDER: &str = "exa";

#[derive(Debug, Deserialize)]
pub struct ExaResponse {
    #[serde(default)]
    pub results: Vec<ExaResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExaResult {
    pub url: String,
    pub title: Option<String>,
    pub published_date: Option<String>,
    pub text: Option<String>,
}

impl From<ExaResult> for NewsHit {
    fn from(result: ExaResult) -> Self {
        NewsHit {
            title: result.title.unwrap_or_default(),
            url: result.url,
            published_date: result.published_date,
            body: result.text.unwrap_or_default(),
        }
    }
}

/// Time-windowed news search and page-text retrieval.
pub struct ExaNewsSearch {
    client: Client,
    api_key: String,
    base_url: String,
    results_per_query: usize,
}

impl ExaNewsSearch {
    pub fn new(client: Client, api_key: impl Into<String>, results_per_query: usize) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
            results_per_query,
        }
    }

    /// Create from the `EXA_API_KEY` environment variable.
    pub fn from_env(client: Client, results_per_query: usize) -> Result<Self, SourceError> {
        Ok(Self::new(client, crate::api_key("EXA_API_KEY")?, results_per_query))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn post(&self, path: &str, body: &Value) -> Result<ExaResponse, SourceError> {
        let response = self
            .client
            .post(format!("{}/{path}", self.base_url))
            .header("x-api-key", &self.api_key)
            .json(body)
            .send()
            .await?;
        read_json(PROVIDER, response).await
    }

    pub async fn search_hits(
        &self,
        query: &str,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        category: &str,
    ) -> Result<Vec<NewsHit>, SourceError> {
        debug!(query, category, "Exa search");
        let body = search_body(
            query,
            window_start,
            window_end,
            category,
            self.results_per_query,
        );
        let response = self.post("search", &body).await?;
        Ok(response.results.into_iter().map(NewsHit::from).collect())
    }

    pub async fn contents(&self, url: &str) -> Result<String, SourceError> {
        debug!(url, "Exa contents");
        let response = self
            .post("contents", &json!({ "urls": [url], "text": true }))
            .await?;
        first_text(response, url)
    }
}

#[async_trait]
impl NewsSearchProvider for ExaNewsSearch {
    async fn search(
        &self,
        query: &str,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        category: &str,
    ) -> Result<Vec<NewsHit>, AgentError> {
        Ok(self
            .search_hits(query, window_start, window_end, category)
            .await?)
    }

    async fn fetch_body(&self, url: &str) -> Result<String, AgentError> {
        Ok(self.contents(url).await?)
    }
}

pub fn search_body(
    query: &str,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    category: &str,
    num_results: usize,
) -> Value {
    json!({
        "query": query,
        "category": category,
        "startPublishedDate": window_start.to_rfc3339_opts(SecondsFormat::Millis, true),
        "endPublishedDate": window_end.to_rfc3339_opts(SecondsFormat::Millis, true),
        "numResults": num_results,
        "contents": { "text": true }
    })
}

fn first_text(response: ExaResponse, url: &str) -> Result<String, SourceError> {
    response
        .results
        .into_iter()
        .next()
        .and_then(|r| r.text)
        .ok_or_else(|| SourceError::MissingData(format!("no content returned for {url}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn search_body_carries_window_and_category() {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 1, 31, 12, 0, 0).unwrap();
        let body = search_body("AAPL stock news", start, end, "news", 10);

        assert_eq!(body["query"], "AAPL stock news");
        assert_eq!(body["category"], "news");
        assert_eq!(body["startPublishedDate"], "2025-01-01T00:00:00.000Z");
        assert_eq!(body["endPublishedDate"], "2025-01-31T12:00:00.000Z");
        assert_eq!(body["numResults"], 10);
        assert_eq!(body["contents"]["text"], true);
    }

    #[test]
    fn results_become_hits() {
        let response: ExaResponse = serde_json::from_str(
            r#"{"results": [
                {"url": "https://n.example/1", "title": "Apple beats", "publishedDate": "2025-01-30T10:00:00.000Z", "text": "Apple reported..."},
                {"url": "https://n.example/2", "title": null}
            ]}"#,
        )
        .unwrap();

        let hits: Vec<NewsHit> = response.results.into_iter().map(NewsHit::from).collect();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "Apple beats");
        assert_eq!(hits[0].published_date.as_deref(), Some("2025-01-30T10:00:00.000Z"));
        assert_eq!(hits[1].title, "");
        assert_eq!(hits[1].body, "");
    }

    #[test]
    fn contents_without_results_is_missing_data() {
        let empty: ExaResponse = serde_json::from_str(r#"{"results": []}"#).unwrap();
        let err = first_text(empty, "https://n.example/1").unwrap_err();
        assert!(matches!(err, SourceError::MissingData(_)));

        let full: ExaResponse =
            serde_json::from_str(r#"{"results": [{"url": "u", "text": "body"}]}"#).unwrap();
        assert_eq!(first_text(full, "u").unwrap(), "body");
    }
}
