use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The five-step rating scale. Anything a model says outside this scale is
/// not representable and degrades to `Hold` upstream.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rating {
    #[serde(rename = "STRONG_BUY", alias = "Strong Buy")]
    StrongBuy,
    #[serde(rename = "BUY", alias = "Buy")]
    Buy,
    #[serde(rename = "HOLD", alias = "Hold")]
    Hold,
    #[serde(rename = "SELL", alias = "Sell")]
    Sell,
    #[serde(rename = "STRONG_SELL", alias = "Strong Sell")]
    StrongSell,
}

impl Rating {
    /// All ratings, most bullish first. Reports iterate this for histograms.
    pub const ALL: [Rating; 5] = [
        Rating::StrongBuy,
        Rating::Buy,
        Rating::Hold,
        Rating::Sell,
        Rating::StrongSell,
    ];

    /// Wire name, as it appears in structured output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::StrongBuy => "STRONG_BUY",
            Rating::Buy => "BUY",
            Rating::Hold => "HOLD",
            Rating::Sell => "SELL",
            Rating::StrongSell => "STRONG_SELL",
        }
    }

    /// Human-readable label for text and tabular output.
    pub fn label(&self) -> &'static str {
        match self {
            Rating::StrongBuy => "Strong Buy",
            Rating::Buy => "Buy",
            Rating::Hold => "Hold",
            Rating::Sell => "Sell",
            Rating::StrongSell => "Strong Sell",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which step of the reply-extraction chain produced a verdict.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionTier {
    /// The whole reply was a valid verdict object.
    WholeReply,
    /// A ```json fenced block held the verdict.
    FencedBlock,
    /// The first balanced `{ ... }` in the reply held the verdict.
    BalancedObject,
    /// Nothing usable was found; the parse fallback verdict was substituted.
    Fallback,
    /// The rating model call itself failed.
    ModelError,
    /// The rating stage never ran because an earlier stage failed.
    NotRated,
}

impl ExtractionTier {
    /// True when the verdict came from the model's own output.
    pub fn is_extracted(&self) -> bool {
        matches!(
            self,
            ExtractionTier::WholeReply | ExtractionTier::FencedBlock | ExtractionTier::BalancedObject
        )
    }
}

/// The structured rating decision. Always fully populated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RatingVerdict {
    pub rating: Rating,
    /// 0.0 to 1.0.
    pub confidence: Decimal,
    pub reasoning: String,
    pub key_factors: Vec<String>,
    pub risk_factors: Vec<String>,
    pub recommendation_summary: String,
}

/// Number of raw reply characters quoted in a parse fallback.
pub const FALLBACK_EXCERPT_CHARS: usize = 200;

impl RatingVerdict {
    /// Verdict used when the model replied but no tier produced a valid object.
    pub fn parse_fallback(raw_reply: &str) -> Self {
        let excerpt: String = raw_reply.chars().take(FALLBACK_EXCERPT_CHARS).collect();
        Self {
            rating: Rating::Hold,
            confidence: Decimal::new(5, 1),
            reasoning: format!("unable to parse model response: {excerpt}"),
            key_factors: vec!["analysis incomplete due to parsing error".to_string()],
            risk_factors: vec!["unable to complete full analysis".to_string()],
            recommendation_summary: "hold recommendation due to analysis limitations".to_string(),
        }
    }

    /// Verdict used when the rating model call itself failed.
    pub fn model_error(error: &str) -> Self {
        Self {
            rating: Rating::Hold,
            confidence: Decimal::ZERO,
            reasoning: format!("analysis failed with error: {error}"),
            key_factors: vec!["analysis could not be completed".to_string()],
            risk_factors: vec!["unable to assess risks due to analysis failure".to_string()],
            recommendation_summary: "unable to provide recommendation due to analysis error"
                .to_string(),
        }
    }

    /// Neutral verdict attached to a record whose analysis did not complete.
    pub fn not_rated() -> Self {
        Self {
            rating: Rating::Hold,
            confidence: Decimal::ZERO,
            reasoning: "analysis failed - unable to complete rating".to_string(),
            key_factors: vec!["analysis could not be completed".to_string()],
            risk_factors: vec!["unable to assess risks due to analysis failure".to_string()],
            recommendation_summary: "unable to provide recommendation due to analysis error"
                .to_string(),
        }
    }
}
