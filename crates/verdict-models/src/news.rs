use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A raw hit returned by a news search, before body retrieval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewsHit {
    pub title: String,
    pub url: String,
    pub published_date: Option<String>,
    /// Snippet or text returned inline by the search, possibly empty.
    pub body: String,
}

/// An article collected for sentiment scoring.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewsArticle {
    pub title: String,
    pub url: String,
    pub published_date: Option<String>,
    /// Full body text. Empty when retrieval failed.
    pub body: String,
    pub summary: Option<String>,
    /// The search query that surfaced this article.
    pub query: String,
    pub collected_at: DateTime<Utc>,
}

impl NewsArticle {
    pub fn from_hit(hit: NewsHit, body: String, query: &str) -> Self {
        Self {
            title: hit.title,
            url: hit.url,
            published_date: hit.published_date,
            body,
            summary: None,
            query: query.to_string(),
            collected_at: Utc::now(),
        }
    }

    /// Attach the summary. Consumes the article so it can only happen once.
    pub fn with_summary(self, summary: String) -> Self {
        Self {
            summary: Some(summary),
            ..self
        }
    }
}

/// Whether sentiment is scored for the company itself or for its sector.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SentimentMode {
    Company,
    Sector,
}

impl fmt::Display for SentimentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SentimentMode::Company => f.write_str("company"),
            SentimentMode::Sector => f.write_str("sector"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit() -> NewsHit {
        NewsHit {
            title: "AAPL beats estimates".to_string(),
            url: "https://example.com/aapl".to_string(),
            published_date: Some("2026-10-01".to_string()),
            body: "snippet".to_string(),
        }
    }

    #[test]
    fn from_hit_keeps_query_and_body() {
        let article = NewsArticle::from_hit(hit(), String::new(), "AAPL stock news");
        assert_eq!(article.query, "AAPL stock news");
        assert!(article.body.is_empty());
        assert!(article.summary.is_none());
        assert_eq!(article.url, "https://example.com/aapl");
    }

    #[test]
    fn with_summary_attaches_once() {
        let article = NewsArticle::from_hit(hit(), "full text".to_string(), "q")
            .with_summary("short".to_string());
        assert_eq!(article.summary.as_deref(), Some("short"));
        assert_eq!(article.body, "full text");
    }

    #[test]
    fn sentiment_mode_display() {
        assert_eq!(SentimentMode::Company.to_string(), "company");
        assert_eq!(
            serde_json::to_string(&SentimentMode::Sector).unwrap(),
            "\"sector\""
        );
    }
}
