//! Hand-written collaborator mocks for driving the pipeline without network
//! access or the Claude CLI.
//!
//! Every mock is deterministic: replies are derived from their inputs so tests
//! can assert on exactly what flowed through each stage.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use verdict_models::config::SentimentConfig;
use verdict_models::{NewsHit, SentimentMode};

use crate::error::AgentError;
use crate::orchestrator::AnalysisOrchestrator;
use crate::providers::{
    ContextSearchProvider, FundamentalsProvider, NewsSearchProvider, QueryPlanner, RatingModel,
    SentimentModel, SummarizationModel,
};
use crate::rating::RatingEngine;
use crate::sentiment::{SentimentProvider, SentimentSources};

/// Counts calls running at the same moment. Mocks that share one gauge
/// reveal whether their calls overlapped.
#[derive(Default)]
pub struct ConcurrencyGauge {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl ConcurrencyGauge {
    /// Hold one slot for `delay` (if any).
    pub async fn hold(&self, delay: Option<Duration>) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// Fundamentals keyed by subject, with per-subject failures and panics.
#[derive(Default)]
pub struct MockFundamentals {
    failing: HashSet<String>,
    panicking: HashSet<String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    gauge: Arc<ConcurrencyGauge>,
}

impl MockFundamentals {
    pub fn failing_for(mut self, subject: &str) -> Self {
        self.failing.insert(subject.to_string());
        self
    }

    pub fn panicking_for(mut self, subject: &str) -> Self {
        self.panicking.insert(subject.to_string());
        self
    }

    /// Hold every call open for `delay`, so overlapping calls can be observed.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_gauge(mut self, gauge: Arc<ConcurrencyGauge>) -> Self {
        self.gauge = gauge;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of calls that were running at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.gauge.peak()
    }
}

#[async_trait]
impl FundamentalsProvider for MockFundamentals {
    async fn render(&self, subject: &str) -> Result<String, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.gauge.hold(self.delay).await;

        if self.panicking.contains(subject) {
            panic!("fundamentals source crashed for {subject}");
        }
        if self.failing.contains(subject) {
            return Err(AgentError::provider(
                "mock_fundamentals",
                format!("no data for {subject}"),
            ));
        }
        Ok(format!("fundamentals for {subject}: revenue up 12%"))
    }
}

pub struct MockContextSearch {
    reply: Option<String>,
}

impl MockContextSearch {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
        }
    }

    pub fn failing() -> Self {
        Self { reply: None }
    }
}

#[async_trait]
impl ContextSearchProvider for MockContextSearch {
    async fn search(&self, query: &str) -> Result<String, AgentError> {
        self.reply
            .clone()
            .ok_or_else(|| AgentError::provider("mock_context", format!("search failed: {query}")))
    }
}

/// A canned news hit whose url is `https://news.example/{id}`.
pub fn news_hit(id: &str, title: &str) -> NewsHit {
    NewsHit {
        title: title.to_string(),
        url: format!("https://news.example/{id}"),
        published_date: Some("2025-01-15".to_string()),
        body: format!("{title}. Full article text."),
    }
}

/// News search with hits per query. Queries without configured hits return
/// `fallback_hits`. Bodies are served from the hits' own text.
#[derive(Clone, Default)]
pub struct MockNewsSearch {
    hits: HashMap<String, Vec<NewsHit>>,
    fallback_hits: Vec<NewsHit>,
    failing_queries: HashSet<String>,
    failing_bodies: HashSet<String>,
    searches: Arc<AtomicUsize>,
}

impl MockNewsSearch {
    pub fn with_hits(mut self, query: &str, hits: Vec<NewsHit>) -> Self {
        self.hits.insert(query.to_string(), hits);
        self
    }

    pub fn with_fallback_hits(mut self, hits: Vec<NewsHit>) -> Self {
        self.fallback_hits = hits;
        self
    }

    pub fn failing_query(mut self, query: &str) -> Self {
        self.failing_queries.insert(query.to_string());
        self
    }

    pub fn failing_body(mut self, url: &str) -> Self {
        self.failing_bodies.insert(url.to_string());
        self
    }

    pub fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    fn all_hits(&self) -> impl Iterator<Item = &NewsHit> {
        self.hits.values().flatten().chain(self.fallback_hits.iter())
    }
}

#[async_trait]
impl NewsSearchProvider for MockNewsSearch {
    async fn search(
        &self,
        query: &str,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        _category: &str,
    ) -> Result<Vec<NewsHit>, AgentError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        assert!(window_start < window_end, "search window must be ordered");

        if self.failing_queries.contains(query) {
            return Err(AgentError::provider(
                "mock_news",
                format!("search failed for {query}"),
            ));
        }
        Ok(self
            .hits
            .get(query)
            .cloned()
            .unwrap_or_else(|| self.fallback_hits.clone()))
    }

    async fn fetch_body(&self, url: &str) -> Result<String, AgentError> {
        if self.failing_bodies.contains(url) {
            return Err(AgentError::provider(
                "mock_news",
                format!("fetch failed for {url}"),
            ));
        }
        self.all_hits()
            .find(|hit| hit.url == url)
            .map(|hit| hit.body.clone())
            .ok_or_else(|| AgentError::provider("mock_news", format!("unknown url {url}")))
    }
}

/// Planner returning a fixed plan, or `["{subject} news"]` by default.
#[derive(Default)]
pub struct MockQueryPlanner {
    plan: Option<Vec<String>>,
    fails: bool,
}

impl MockQueryPlanner {
    pub fn planning(queries: &[&str]) -> Self {
        Self {
            plan: Some(queries.iter().map(|q| q.to_string()).collect()),
            fails: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            plan: None,
            fails: true,
        }
    }
}

#[async_trait]
impl QueryPlanner for MockQueryPlanner {
    async fn plan(&self, subject: &str, _context: &str) -> Result<Vec<String>, AgentError> {
        if self.fails {
            return Err(AgentError::Parse("planner reply had no JSON array".to_string()));
        }
        Ok(self
            .plan
            .clone()
            .unwrap_or_else(|| vec![format!("{subject} news")]))
    }
}

/// Summarizes as `summary of {title}`; fails for configured titles.
#[derive(Default)]
pub struct MockSummarizer {
    failing_titles: HashSet<String>,
    delay: Option<Duration>,
    gauge: Arc<ConcurrencyGauge>,
}

impl MockSummarizer {
    pub fn failing_for(title: &str) -> Self {
        Self {
            failing_titles: HashSet::from([title.to_string()]),
            ..Self::default()
        }
    }

    /// Hold every call open for `delay`, tracked on `gauge`.
    pub fn slow(delay: Duration, gauge: Arc<ConcurrencyGauge>) -> Self {
        Self {
            delay: Some(delay),
            gauge,
            ..Self::default()
        }
    }
}

#[async_trait]
impl SummarizationModel for MockSummarizer {
    async fn summarize(&self, title: &str, _body: &str) -> Result<String, AgentError> {
        self.gauge.hold(self.delay).await;
        if self.failing_titles.contains(title) {
            return Err(AgentError::Cli("summary model unavailable".to_string()));
        }
        Ok(format!("summary of {title}"))
    }
}

/// Scores as `{mode} sentiment for {target}: ...` with the corpus size.
#[derive(Default)]
pub struct MockSentimentModel {
    fails: bool,
}

impl MockSentimentModel {
    pub fn failing() -> Self {
        Self { fails: true }
    }
}

#[async_trait]
impl SentimentModel for MockSentimentModel {
    async fn score(
        &self,
        corpus: &str,
        mode: SentimentMode,
        target_name: &str,
    ) -> Result<String, AgentError> {
        if self.fails {
            return Err(AgentError::Timeout(90));
        }
        Ok(format!(
            "{mode} sentiment for {target_name}: positive ({} chars read)",
            corpus.len()
        ))
    }
}

/// Rating model with a canned reply (or failure) and a record of the last prompt.
pub struct MockRatingModel {
    reply: Result<String, String>,
    last_prompt: Mutex<Option<String>>,
}

impl MockRatingModel {
    pub fn replying(reply: String) -> Self {
        Self {
            reply: Ok(reply),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            last_prompt: Mutex::new(None),
        }
    }

    pub async fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().await.clone()
    }
}

#[async_trait]
impl RatingModel for MockRatingModel {
    async fn complete(&self, prompt: &str) -> Result<String, AgentError> {
        *self.last_prompt.lock().await = Some(prompt.to_string());
        self.reply.clone().map_err(AgentError::Cli)
    }
}

/// A complete, valid verdict reply as the rating model would send it.
pub fn verdict_reply(rating: &str, confidence: &str) -> String {
    serde_json::json!({
        "rating": rating,
        "confidence": confidence.parse::<f64>().unwrap_or(0.5),
        "reasoning": "Revenue growth outpaces peers while sentiment stays constructive.",
        "key_factors": ["Double-digit revenue growth", "Expanding margins"],
        "risk_factors": ["Premium valuation"],
        "recommendation_summary": "Accumulate on weakness."
    })
    .to_string()
}

/// Sentiment sources where every query returns the same two articles.
pub fn mock_sentiment_sources() -> SentimentSources {
    SentimentSources {
        context: Arc::new(MockContextSearch::replying("A large listed company.")),
        news: Arc::new(MockNewsSearch::default().with_fallback_hits(vec![
            news_hit("1", "Quarterly results beat estimates"),
            news_hit("2", "Sector demand steady"),
        ])),
        planner: Arc::new(MockQueryPlanner::default()),
        summarizer: Arc::new(MockSummarizer::default()),
        scorer: Arc::new(MockSentimentModel::default()),
    }
}

/// An orchestrator wired to the given fundamentals and rating mocks, with
/// mock sentiment sources.
pub fn mock_orchestrator(
    fundamentals: Arc<MockFundamentals>,
    rating: Arc<MockRatingModel>,
) -> AnalysisOrchestrator {
    mock_orchestrator_with_sources(fundamentals, mock_sentiment_sources(), rating)
}

pub fn mock_orchestrator_with_sources(
    fundamentals: Arc<MockFundamentals>,
    sources: SentimentSources,
    rating: Arc<MockRatingModel>,
) -> AnalysisOrchestrator {
    AnalysisOrchestrator::new(
        fundamentals,
        SentimentProvider::new(sources, SentimentConfig::default()),
        RatingEngine::new(rating),
    )
}
