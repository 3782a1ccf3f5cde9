use std::fmt::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;
use verdict_models::{AnalysisRecord, Rating};

use crate::error::ExportError;
use crate::text::confidence_percent;

/// Count of successful records carrying one rating.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingShare {
    pub rating: Rating,
    pub count: usize,
    /// Denominator of the share: the number of successful records.
    pub out_of: usize,
}

impl RatingShare {
    /// Percentage of successful records, rounded to one decimal. Zero when
    /// nothing succeeded.
    pub fn percent(&self) -> Decimal {
        if self.out_of == 0 {
            return Decimal::ZERO;
        }
        (Decimal::from(self.count) * Decimal::ONE_HUNDRED / Decimal::from(self.out_of)).round_dp(1)
    }
}

/// One subject's line in the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    pub subject: String,
    pub success: bool,
    pub rating: Rating,
    pub confidence: Decimal,
    /// Recommendation summary, or the error message of a failed record.
    pub detail: String,
}

/// Aggregate view of a batch run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub generated_at: DateTime<Utc>,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub total_elapsed_ms: u64,
    /// Mean confidence over successful records only.
    pub mean_confidence: Option<Decimal>,
    pub distribution: Vec<RatingShare>,
    pub entries: Vec<ReportEntry>,
}

pub fn build_report(records: &[AnalysisRecord]) -> BatchReport {
    let successful: Vec<&AnalysisRecord> = records.iter().filter(|r| r.success).collect();
    let succeeded = successful.len();

    let mean_confidence = if successful.is_empty() {
        None
    } else {
        let sum: Decimal = successful.iter().map(|r| r.verdict.confidence).sum();
        Some(sum / Decimal::from(succeeded))
    };

    let distribution = Rating::ALL
        .iter()
        .map(|&rating| RatingShare {
            rating,
            count: successful
                .iter()
                .filter(|r| r.verdict.rating == rating)
                .count(),
            out_of: succeeded,
        })
        .collect();

    let entries = records
        .iter()
        .map(|r| ReportEntry {
            subject: r.subject.clone(),
            success: r.success,
            rating: r.verdict.rating,
            confidence: r.verdict.confidence,
            detail: if r.success {
                r.verdict.recommendation_summary.clone()
            } else {
                r.error_message
                    .clone()
                    .unwrap_or_else(|| "unknown error".to_string())
            },
        })
        .collect();

    BatchReport {
        generated_at: Utc::now(),
        total: records.len(),
        succeeded,
        failed: records.len() - succeeded,
        total_elapsed_ms: records.iter().map(|r| r.elapsed_ms).sum(),
        mean_confidence,
        distribution,
        entries,
    }
}

/// Build the report, write its text to `path`, and return it.
pub fn write_report(
    records: &[AnalysisRecord],
    path: impl AsRef<Path>,
) -> Result<BatchReport, ExportError> {
    let path = path.as_ref();
    let report = build_report(records);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, report.render())?;
    info!(path = %path.display(), subjects = report.total, "Batch report written");
    Ok(report)
}

impl BatchReport {
    pub fn render(&self) -> String {
        let mut out = String::new();
        let rule = "=".repeat(60);

        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "BATCH ANALYSIS REPORT");
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(
            out,
            "Generated: {}",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        let _ = writeln!(out, "Subjects analysed: {}", self.total);
        let _ = writeln!(out, "Succeeded: {}", self.succeeded);
        let _ = writeln!(out, "Failed: {}", self.failed);
        let _ = writeln!(
            out,
            "Total elapsed: {:.2}s",
            self.total_elapsed_ms as f64 / 1000.0
        );
        let mean = self
            .mean_confidence
            .map(|m| format!("{:.2}", m.round_dp(2)))
            .unwrap_or_else(|| "n/a".to_string());
        let _ = writeln!(out, "Mean confidence (successful only): {mean}");
        let _ = writeln!(out);

        let _ = writeln!(out, "RATING DISTRIBUTION");
        for share in &self.distribution {
            let _ = writeln!(
                out,
                "  {:<12} {} ({:.1}%)",
                share.rating.label(),
                share.count,
                share.percent()
            );
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "SUCCESSFUL ANALYSES");
        for entry in self.entries.iter().filter(|e| e.success) {
            let _ = writeln!(
                out,
                "[OK] {}: {} ({}) - {}",
                entry.subject,
                entry.rating,
                confidence_percent(entry.confidence),
                entry.detail
            );
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "FAILED ANALYSES");
        for entry in self.entries.iter().filter(|e| !e.success) {
            let _ = writeln!(out, "[FAILED] {}: {}", entry.subject, entry.detail);
        }

        out
    }
}
