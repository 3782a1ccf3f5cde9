use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{error, info, info_span, warn, Instrument};
use verdict_models::{AnalysisRecord, ExtractionTier};

use crate::error::{AgentError, Stage};
use crate::providers::FundamentalsProvider;
use crate::rating::RatingEngine;
use crate::sentiment::SentimentProvider;

/// Runs the fundamentals, sentiment and rating stages for one subject.
pub struct AnalysisOrchestrator {
    fundamentals: Arc<dyn FundamentalsProvider>,
    sentiment: SentimentProvider,
    rating: RatingEngine,
}

impl AnalysisOrchestrator {
    pub fn new(
        fundamentals: Arc<dyn FundamentalsProvider>,
        sentiment: SentimentProvider,
        rating: RatingEngine,
    ) -> Self {
        Self {
            fundamentals,
            sentiment,
            rating,
        }
    }

    /// Analyse one subject. Never fails: stage errors become a failed record.
    pub async fn run(&self, subject: &str) -> AnalysisRecord {
        let subject = subject.trim().to_uppercase();
        let span = info_span!("analysis", subject = %subject);
        self.run_inner(subject).instrument(span).await
    }

    async fn run_inner(&self, subject: String) -> AnalysisRecord {
        let start = Instant::now();
        let analyzed_at = Utc::now();
        info!("Starting analysis");

        // 1. Fundamentals and sentiment share no inputs; the first error wins
        let gathered = tokio::try_join!(
            self.gather_fundamentals(&subject),
            self.gather_sentiment(&subject),
        );
        let (fundamentals, (company_sentiment, sector_sentiment)) = match gathered {
            Ok(outputs) => outputs,
            Err(e) => {
                let elapsed_ms = start.elapsed().as_millis() as u64;
                error!(error = %e, elapsed_ms, "Analysis failed");
                return AnalysisRecord::failed(&subject, analyzed_at, elapsed_ms, e.to_string());
            }
        };

        // 2. Rating depends on both
        let rated = self
            .rating
            .rate_detailed(&subject, &fundamentals, &company_sentiment, &sector_sentiment)
            .await;

        let elapsed_ms = start.elapsed().as_millis() as u64;
        match (&rated.model_error, rated.tier) {
            // The engine resolved the call failure to its error verdict
            (Some(e), _) => warn!(error = %e, elapsed_ms, "Analysis complete with error verdict"),
            (None, ExtractionTier::Fallback) => {
                warn!(elapsed_ms, "Analysis complete with fallback verdict")
            }
            _ => {}
        }
        info!(
            rating = %rated.verdict.rating,
            confidence = %rated.verdict.confidence,
            tier = ?rated.tier,
            elapsed_ms,
            "Analysis complete"
        );

        AnalysisRecord {
            subject,
            analyzed_at,
            fundamentals,
            company_sentiment,
            sector_sentiment,
            verdict: rated.verdict,
            extraction: rated.tier,
            elapsed_ms,
            success: true,
            error_message: None,
        }
    }

    async fn gather_fundamentals(&self, subject: &str) -> Result<String, AgentError> {
        let start = Instant::now();
        let text = self
            .fundamentals
            .render(subject)
            .await
            .map_err(|e| AgentError::stage(Stage::Fundamentals, e))?;
        info!(
            chars = text.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Fundamentals gathered"
        );
        Ok(text)
    }

    async fn gather_sentiment(&self, subject: &str) -> Result<(String, String), AgentError> {
        let start = Instant::now();
        let pair = self
            .sentiment
            .collect(subject)
            .await
            .map_err(|e| AgentError::stage(Stage::Sentiment, e))?;
        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Sentiment gathered"
        );
        Ok(pair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        mock_orchestrator, mock_orchestrator_with_sources, mock_sentiment_sources, verdict_reply,
        ConcurrencyGauge, MockFundamentals, MockNewsSearch, MockRatingModel, MockSummarizer,
    };
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::time::Duration;
    use verdict_models::config::SentimentConfig;
    use verdict_models::Rating;

    #[tokio::test]
    async fn successful_run_fills_every_field() {
        let orchestrator = mock_orchestrator(
            Arc::new(MockFundamentals::default()),
            Arc::new(MockRatingModel::replying(verdict_reply("BUY", "0.8"))),
        );

        let record = orchestrator.run("aapl").await;
        assert!(record.success);
        assert_eq!(record.subject, "AAPL");
        assert!(record.fundamentals.contains("fundamentals for AAPL"));
        assert!(record.company_sentiment.starts_with("company sentiment for AAPL"));
        assert!(record.sector_sentiment.starts_with("sector sentiment for AAPL"));
        assert_eq!(record.verdict.rating, Rating::Buy);
        assert_eq!(record.verdict.confidence, dec!(0.8));
        assert_eq!(record.extraction, ExtractionTier::WholeReply);
        assert!(record.error_message.is_none());
    }

    #[tokio::test]
    async fn fundamentals_failure_yields_neutral_failed_record() {
        let rating = Arc::new(MockRatingModel::replying(verdict_reply("BUY", "0.8")));
        let orchestrator = mock_orchestrator(
            Arc::new(MockFundamentals::default().failing_for("BBB")),
            rating.clone(),
        );

        let record = orchestrator.run("BBB").await;
        assert!(!record.success);
        assert_eq!(record.verdict.rating, Rating::Hold);
        assert_eq!(record.verdict.confidence, Decimal::ZERO);
        assert_eq!(record.extraction, ExtractionTier::NotRated);
        let message = record.error_message.unwrap();
        assert!(message.starts_with("fundamentals stage failed"), "{message}");
        assert!(rating.last_prompt().await.is_none(), "rating must not run");
    }

    #[tokio::test]
    async fn sentiment_failure_is_a_stage_failure() {
        let mut sources = mock_sentiment_sources();
        sources.news = Arc::new(MockNewsSearch::default().failing_query("MSFT news"));
        let orchestrator = mock_orchestrator_with_sources(
            Arc::new(MockFundamentals::default()),
            sources,
            Arc::new(MockRatingModel::replying(verdict_reply("BUY", "0.8"))),
        );

        let record = orchestrator.run("MSFT").await;
        assert!(!record.success);
        assert!(record
            .error_message
            .unwrap()
            .starts_with("sentiment stage failed"));
    }

    #[tokio::test]
    async fn rating_model_failure_is_an_error_verdict_not_a_failed_run() {
        let orchestrator = mock_orchestrator(
            Arc::new(MockFundamentals::default()),
            Arc::new(MockRatingModel::failing("connection reset")),
        );

        let record = orchestrator.run("AAPL").await;
        assert!(record.success);
        assert!(record.error_message.is_none());
        assert_eq!(record.extraction, ExtractionTier::ModelError);
        assert_eq!(record.verdict.rating, Rating::Hold);
        assert_eq!(record.verdict.confidence, Decimal::ZERO);
        assert!(record.verdict.reasoning.contains("connection reset"));
        assert!(!record.fundamentals.is_empty());
        assert!(!record.company_sentiment.is_empty());
        assert!(!record.sector_sentiment.is_empty());
    }

    #[tokio::test]
    async fn unparseable_reply_is_still_a_success() {
        let orchestrator = mock_orchestrator(
            Arc::new(MockFundamentals::default()),
            Arc::new(MockRatingModel::replying("I would hold for now.".to_string())),
        );

        let record = orchestrator.run("AAPL").await;
        assert!(record.success);
        assert_eq!(record.extraction, ExtractionTier::Fallback);
        assert_eq!(record.verdict.rating, Rating::Hold);
        assert_eq!(record.verdict.confidence, dec!(0.5));
    }

    #[tokio::test]
    async fn fundamentals_and_sentiment_run_concurrently() {
        let gauge = Arc::new(ConcurrencyGauge::default());
        let fundamentals = Arc::new(
            MockFundamentals::default()
                .with_delay(Duration::from_millis(100))
                .with_gauge(gauge.clone()),
        );
        let mut sources = mock_sentiment_sources();
        sources.summarizer = Arc::new(MockSummarizer::slow(
            Duration::from_millis(100),
            gauge.clone(),
        ));
        // One article at a time, so any overlap on the gauge is across stages
        let config = SentimentConfig {
            article_concurrency: 1,
            ..SentimentConfig::default()
        };
        let orchestrator = AnalysisOrchestrator::new(
            fundamentals,
            SentimentProvider::new(sources, config),
            RatingEngine::new(Arc::new(MockRatingModel::replying(verdict_reply(
                "BUY", "0.8",
            )))),
        );

        let record = orchestrator.run("AAPL").await;
        assert!(record.success);
        assert_eq!(gauge.peak(), 2);
    }
}
