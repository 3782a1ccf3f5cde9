//! Verdict - stock analysis orchestrator
//!
//! Gathers fundamentals and news sentiment for a ticker, asks a language
//! model for a rating, and exports the resulting analysis records.
//!
//! # Library Usage
//!
//! ```rust,no_run
//! use verdict::agents::{AnalysisOrchestrator, BatchExecutor};
//! use verdict::export::{build_report, ResultExporter};
//! use verdict::models::config::VerdictConfig;
//! use verdict::models::AnalysisRecord;
//! ```

pub use verdict_agents as agents;
pub use verdict_export as export;
pub use verdict_models as models;
pub use verdict_sources as sources;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::warn;
use verdict_agents::{
    AnalysisOrchestrator, BatchExecutor, ClaudeModel, RatingEngine, SentimentProvider,
    SentimentSources,
};
use verdict_models::config::VerdictConfig;
use verdict_models::AnalysisRecord;
use verdict_sources::{http_client, AlphaVantageFundamentals, ExaNewsSearch, TavilySearch};

/// Load configuration from TOML. A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<VerdictConfig, anyhow::Error> {
    if !path.exists() {
        warn!(path = %path.display(), "Config file not found, using defaults");
        return Ok(VerdictConfig::default());
    }
    let config_str = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    toml::from_str(&config_str)
        .with_context(|| format!("Failed to parse config: {}", path.display()))
}

/// Build an AnalysisOrchestrator wired to the HTTP sources and Claude CLI models.
pub fn build_orchestrator(config: &VerdictConfig) -> Result<AnalysisOrchestrator, anyhow::Error> {
    let client = http_client(Duration::from_secs(config.sources.http_timeout_seconds))
        .context("Failed to build HTTP client")?;
    let timeout = Duration::from_secs(config.models.timeout_seconds);

    let fundamentals = AlphaVantageFundamentals::from_env(client.clone())
        .context("Failed to configure fundamentals source")?;
    let context = TavilySearch::from_env(client.clone(), config.sources.context_results)
        .context("Failed to configure context search")?;
    let news = ExaNewsSearch::from_env(client, config.sentiment.results_per_query)
        .context("Failed to configure news search")?;

    let sources = SentimentSources {
        context: Arc::new(context),
        news: Arc::new(news),
        planner: Arc::new(
            ClaudeModel::new(config.models.query_model.clone(), timeout)
                .with_max_queries(config.sentiment.max_queries),
        ),
        summarizer: Arc::new(ClaudeModel::new(config.models.summary_model.clone(), timeout)),
        scorer: Arc::new(ClaudeModel::new(config.models.sentiment_model.clone(), timeout)),
    };

    Ok(AnalysisOrchestrator::new(
        Arc::new(fundamentals),
        SentimentProvider::new(sources, config.sentiment.clone()),
        RatingEngine::new(Arc::new(ClaudeModel::new(
            config.models.rating_model.clone(),
            timeout,
        ))),
    ))
}

/// Build a BatchExecutor around a fresh orchestrator.
pub fn build_batch_executor(config: &VerdictConfig) -> Result<BatchExecutor, anyhow::Error> {
    let orchestrator = build_orchestrator(config)?;
    Ok(BatchExecutor::new(
        Arc::new(orchestrator),
        config.batch.max_in_flight,
    ))
}

/// Analyse one subject using the given orchestrator.
pub async fn analyze(orchestrator: &AnalysisOrchestrator, subject: &str) -> AnalysisRecord {
    orchestrator.run(subject).await
}
