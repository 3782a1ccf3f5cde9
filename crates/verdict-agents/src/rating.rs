use std::sync::Arc;

use tracing::{info, warn};
use verdict_models::{ExtractionTier, RatingVerdict};

use crate::parser::extract_verdict;
use crate::prompts::rating_prompt;
use crate::providers::RatingModel;

/// A verdict together with how it was obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct RatedVerdict {
    pub verdict: RatingVerdict,
    pub tier: ExtractionTier,
    /// The model call error, when `tier` is `ModelError`.
    pub model_error: Option<String>,
}

/// Synthesizes a rating verdict from fundamentals and sentiment.
///
/// Never fails: parse problems degrade to the fallback verdict and model
/// call failures to the error verdict.
pub struct RatingEngine {
    model: Arc<dyn RatingModel>,
}

impl RatingEngine {
    pub fn new(model: Arc<dyn RatingModel>) -> Self {
        Self { model }
    }

    pub async fn rate(
        &self,
        subject: &str,
        fundamentals: &str,
        company_sentiment: &str,
        sector_sentiment: &str,
    ) -> RatingVerdict {
        self.rate_detailed(subject, fundamentals, company_sentiment, sector_sentiment)
            .await
            .verdict
    }

    pub async fn rate_detailed(
        &self,
        subject: &str,
        fundamentals: &str,
        company_sentiment: &str,
        sector_sentiment: &str,
    ) -> RatedVerdict {
        let prompt = rating_prompt(subject, fundamentals, company_sentiment, sector_sentiment);

        let reply = match self.model.complete(&prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(subject, error = %e, "Rating model call failed");
                let message = e.to_string();
                return RatedVerdict {
                    verdict: RatingVerdict::model_error(&message),
                    tier: ExtractionTier::ModelError,
                    model_error: Some(message),
                };
            }
        };

        let (verdict, tier) = extract_verdict(&reply);
        if tier == ExtractionTier::Fallback {
            warn!(subject, reply_chars = reply.len(), "No usable verdict in rating reply");
        } else {
            info!(subject, rating = %verdict.rating, tier = ?tier, "Verdict extracted");
        }

        RatedVerdict {
            verdict,
            tier,
            model_error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{verdict_reply, MockRatingModel};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use verdict_models::Rating;

    #[tokio::test]
    async fn rates_from_clean_reply() {
        let model = Arc::new(MockRatingModel::replying(verdict_reply("SELL", "0.65")));
        let engine = RatingEngine::new(model.clone());

        let rated = engine.rate_detailed("AAPL", "fund", "co", "sec").await;
        assert_eq!(rated.tier, ExtractionTier::WholeReply);
        assert_eq!(rated.verdict.rating, Rating::Sell);
        assert_eq!(rated.verdict.confidence, dec!(0.65));
        assert!(rated.model_error.is_none());

        let prompt = model.last_prompt().await.unwrap();
        assert!(prompt.contains("fund"));
        assert!(prompt.contains("co"));
        assert!(prompt.contains("sec"));
    }

    #[tokio::test]
    async fn prose_reply_degrades_to_fallback() {
        let engine = RatingEngine::new(Arc::new(MockRatingModel::replying(
            "The outlook is balanced.".to_string(),
        )));
        let verdict = engine.rate("AAPL", "", "", "").await;
        assert_eq!(verdict.rating, Rating::Hold);
        assert_eq!(verdict.confidence, dec!(0.5));
        assert!(verdict.reasoning.contains("The outlook is balanced."));
    }

    #[tokio::test]
    async fn model_failure_yields_error_verdict() {
        let engine = RatingEngine::new(Arc::new(MockRatingModel::failing("rate limited")));
        let rated = engine.rate_detailed("AAPL", "", "", "").await;
        assert_eq!(rated.tier, ExtractionTier::ModelError);
        assert_eq!(rated.verdict.rating, Rating::Hold);
        assert_eq!(rated.verdict.confidence, Decimal::ZERO);
        assert!(rated.verdict.reasoning.contains("rate limited"));
        assert!(rated.model_error.unwrap().contains("rate limited"));
    }
}
