use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::rating::{ExtractionTier, RatingVerdict};

/// The complete outcome of analysing one subject.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisRecord {
    pub subject: String,
    pub analyzed_at: DateTime<Utc>,
    /// Rendered fundamentals snapshot. Empty when that stage did not complete.
    pub fundamentals: String,
    pub company_sentiment: String,
    pub sector_sentiment: String,
    pub verdict: RatingVerdict,
    pub extraction: ExtractionTier,
    pub elapsed_ms: u64,
    pub success: bool,
    pub error_message: Option<String>,
}

impl AnalysisRecord {
    /// A record for an analysis that stopped before a verdict could be produced.
    pub fn failed(
        subject: &str,
        analyzed_at: DateTime<Utc>,
        elapsed_ms: u64,
        error: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.to_string(),
            analyzed_at,
            fundamentals: String::new(),
            company_sentiment: String::new(),
            sector_sentiment: String::new(),
            verdict: RatingVerdict::not_rated(),
            extraction: ExtractionTier::NotRated,
            elapsed_ms,
            success: false,
            error_message: Some(error.into()),
        }
    }

    pub fn key_factor_count(&self) -> usize {
        self.verdict.key_factors.len()
    }

    pub fn risk_factor_count(&self) -> usize {
        self.verdict.risk_factors.len()
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed_ms as f64 / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rating::Rating;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn sample_record() -> AnalysisRecord {
        AnalysisRecord {
            subject: "MSFT".to_string(),
            analyzed_at: Utc::now(),
            fundamentals: "Revenue | 65.6B".to_string(),
            company_sentiment: "Positive".to_string(),
            sector_sentiment: "Neutral".to_string(),
            verdict: RatingVerdict {
                rating: Rating::Buy,
                confidence: dec!(0.72),
                reasoning: "Cloud growth".to_string(),
                key_factors: vec!["Azure".to_string(), "Margins".to_string()],
                risk_factors: vec!["Valuation".to_string()],
                recommendation_summary: "Accumulate".to_string(),
            },
            extraction: ExtractionTier::WholeReply,
            elapsed_ms: 4250,
            success: true,
            error_message: None,
        }
    }

    #[test]
    fn roundtrip_analysis_record() {
        let record = sample_record();
        let json = serde_json::to_string(&record).unwrap();
        let deserialized: AnalysisRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, deserialized);
    }

    #[test]
    fn failed_record_carries_full_fallback_verdict() {
        let record = AnalysisRecord::failed("BBB", Utc::now(), 12, "fundamentals stage failed");
        assert!(!record.success);
        assert_eq!(record.verdict.rating, Rating::Hold);
        assert_eq!(record.verdict.confidence, Decimal::ZERO);
        assert!(!record.verdict.reasoning.is_empty());
        assert!(!record.verdict.key_factors.is_empty());
        assert!(!record.verdict.risk_factors.is_empty());
        assert_eq!(record.extraction, ExtractionTier::NotRated);
        assert_eq!(
            record.error_message.as_deref(),
            Some("fundamentals stage failed")
        );
    }

    #[test]
    fn factor_counts_and_seconds() {
        let record = sample_record();
        assert_eq!(record.key_factor_count(), 2);
        assert_eq!(record.risk_factor_count(), 1);
        assert!((record.elapsed_seconds() - 4.25).abs() < f64::EPSILON);
    }
}
