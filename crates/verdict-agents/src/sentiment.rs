use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, Utc};
use futures::stream::{self, StreamExt};
use tracing::{info, warn};
use verdict_models::config::SentimentConfig;
use verdict_models::{NewsArticle, NewsHit, SentimentMode};

use crate::error::AgentError;
use crate::providers::{
    ContextSearchProvider, NewsSearchProvider, QueryPlanner, SentimentModel, SummarizationModel,
};

/// Summary recorded for an article whose body could not be retrieved.
pub const NO_CONTENT_SUMMARY: &str = "no content available for summarization";

/// The external collaborators the sentiment pipeline drives.
#[derive(Clone)]
pub struct SentimentSources {
    pub context: Arc<dyn ContextSearchProvider>,
    pub news: Arc<dyn NewsSearchProvider>,
    pub planner: Arc<dyn QueryPlanner>,
    pub summarizer: Arc<dyn SummarizationModel>,
    pub scorer: Arc<dyn SentimentModel>,
}

/// Everything the pipeline produced for one subject.
#[derive(Debug, Clone)]
pub struct SentimentSnapshot {
    pub articles: Vec<NewsArticle>,
    pub corpus: String,
    pub company: String,
    pub sector: String,
}

/// Collects news about a subject and scores company and sector sentiment.
pub struct SentimentProvider {
    sources: SentimentSources,
    config: SentimentConfig,
}

impl SentimentProvider {
    pub fn new(sources: SentimentSources, config: SentimentConfig) -> Self {
        Self { sources, config }
    }

    /// Company and sector sentiment text for a subject.
    pub async fn collect(&self, subject: &str) -> Result<(String, String), AgentError> {
        let snapshot = self.gather(subject).await?;
        Ok((snapshot.company, snapshot.sector))
    }

    /// Run the whole pipeline and keep the intermediate products.
    pub async fn gather(&self, subject: &str) -> Result<SentimentSnapshot, AgentError> {
        let articles = self.collect_articles(subject).await?;
        let corpus = build_corpus(&articles);

        let (company, sector) = tokio::join!(
            self.score(&corpus, SentimentMode::Company, subject),
            self.score(&corpus, SentimentMode::Sector, subject),
        );

        info!(
            subject,
            articles = articles.len(),
            corpus_chars = corpus.len(),
            "Sentiment scored"
        );

        Ok(SentimentSnapshot {
            articles,
            corpus,
            company,
            sector,
        })
    }

    /// Plan queries, search, then fetch and summarize every hit.
    ///
    /// Fails only when every query's search fails.
    pub async fn collect_articles(&self, subject: &str) -> Result<Vec<NewsArticle>, AgentError> {
        let queries = self.plan_queries(subject).await;
        let mut hits = self.search(&queries).await?;

        if self.config.dedupe_articles {
            let mut seen = HashSet::new();
            hits.retain(|(_, hit)| seen.insert(hit.url.clone()));
        }

        let concurrency = self.config.article_concurrency.max(1);
        let articles: Vec<NewsArticle> = stream::iter(hits)
            .map(|(query, hit)| async move { self.process_hit(hit, &query).await })
            .buffered(concurrency)
            .collect()
            .await;

        Ok(articles)
    }

    /// Search queries seeded by a context search. Never fails: a failed
    /// context search or planner falls back to a fixed plan.
    pub async fn plan_queries(&self, subject: &str) -> Vec<String> {
        let context = match self
            .sources
            .context
            .search(&format!("{subject} company"))
            .await
        {
            Ok(context) => context,
            Err(e) => {
                warn!(subject, error = %e, "Context search failed, planning without context");
                String::new()
            }
        };

        let planned = match self.sources.planner.plan(subject, &context).await {
            Ok(queries) => queries
                .into_iter()
                .map(|q| q.trim().to_string())
                .filter(|q| !q.is_empty())
                .collect(),
            Err(e) => {
                warn!(subject, error = %e, "Query planning failed, using default queries");
                Vec::new()
            }
        };

        let mut queries = if planned.is_empty() {
            default_queries(subject)
        } else {
            planned
        };
        queries.truncate(self.config.max_queries.max(1));
        info!(subject, ?queries, "Planned news queries");
        queries
    }

    async fn search(&self, queries: &[String]) -> Result<Vec<(String, NewsHit)>, AgentError> {
        let window_end = Utc::now();
        let window_start = window_end - Duration::days(i64::from(self.config.lookback_days));

        let mut hits = Vec::new();
        let mut last_error = None;
        let mut succeeded = 0usize;

        for query in queries {
            match self
                .sources
                .news
                .search(query, window_start, window_end, &self.config.news_category)
                .await
            {
                Ok(found) => {
                    succeeded += 1;
                    info!(query = %query, hits = found.len(), "News search complete");
                    hits.extend(found.into_iter().map(|hit| (query.clone(), hit)));
                }
                Err(e) => {
                    warn!(query = %query, error = %e, "News search failed");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if succeeded == 0 => Err(e),
            _ => Ok(hits),
        }
    }

    /// Fetch the full body and summarize one hit. Failures stay inside the article.
    async fn process_hit(&self, hit: NewsHit, query: &str) -> NewsArticle {
        let body = match self.sources.news.fetch_body(&hit.url).await {
            Ok(body) => body,
            Err(e) => {
                warn!(url = %hit.url, error = %e, "Failed to fetch article body");
                String::new()
            }
        };

        let article = NewsArticle::from_hit(hit, body, query);
        let summary = if article.body.trim().is_empty() {
            NO_CONTENT_SUMMARY.to_string()
        } else {
            match self
                .sources
                .summarizer
                .summarize(&article.title, &article.body)
                .await
            {
                Ok(summary) => summary,
                Err(e) => {
                    warn!(url = %article.url, error = %e, "Failed to summarize article");
                    format!("error generating summary: {e}")
                }
            }
        };

        article.with_summary(summary)
    }

    async fn score(&self, corpus: &str, mode: SentimentMode, subject: &str) -> String {
        match self.sources.scorer.score(corpus, mode, subject).await {
            Ok(text) => text,
            Err(e) => {
                warn!(subject, %mode, error = %e, "Sentiment scoring failed");
                format!("sentiment analysis failed: {e}")
            }
        }
    }
}

/// Queries used when no plan can be obtained from the planner.
pub fn default_queries(subject: &str) -> Vec<String> {
    vec![
        format!("{subject} stock news"),
        format!("{subject} earnings news"),
        format!("{subject} sector news"),
    ]
}

/// Join article summaries, in article order, into the scoring corpus.
pub fn build_corpus(articles: &[NewsArticle]) -> String {
    articles
        .iter()
        .filter_map(|a| a.summary.as_deref())
        .collect::<Vec<_>>()
        .join("\n\n")
}
