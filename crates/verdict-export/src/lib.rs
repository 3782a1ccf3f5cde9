//! Writes analysis records to disk as text, structured JSON or CSV, and
//! aggregates batch runs into a report.

pub mod error;
pub mod report;
pub mod structured;
pub mod tabular;
pub mod text;

use std::collections::HashSet;
use std::path::PathBuf;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;
use verdict_models::{AnalysisRecord, ExportFormat};

pub use error::ExportError;
pub use report::{build_report, write_report, BatchReport, RatingShare, ReportEntry};
pub use structured::{render_structured, StructuredExport};
pub use tabular::{render_tabular, tabular_row, TabularSink, TABULAR_HEADER};
pub use text::render_text;

const FILE_TIMESTAMP: &str = "%Y%m%d_%H%M%S_%3f";

/// Writes records into one output directory.
pub struct ResultExporter {
    output_dir: PathBuf,
}

impl ResultExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Path a record is exported to: `{subject}_{analyzed_at}.{ext}`, with
    /// millisecond precision in the timestamp.
    pub fn record_path(&self, record: &AnalysisRecord, format: ExportFormat) -> PathBuf {
        self.output_dir.join(format!(
            "{}_{}.{}",
            file_safe(&record.subject),
            record.analyzed_at.format(FILE_TIMESTAMP),
            format.extension()
        ))
    }

    /// Export one record to its own file.
    pub fn export(
        &self,
        record: &AnalysisRecord,
        format: ExportFormat,
    ) -> Result<PathBuf, ExportError> {
        self.write_record(record, format, self.record_path(record, format))
    }

    /// Export a batch. Tabular output goes to one shared file with a single
    /// header; the other formats write one file per record.
    pub fn export_batch(
        &self,
        records: &[AnalysisRecord],
        format: ExportFormat,
    ) -> Result<Vec<PathBuf>, ExportError> {
        match format {
            ExportFormat::Tabular => {
                let sink = TabularSink::for_batch(&self.output_dir, Utc::now(), Uuid::new_v4())?;
                for record in records {
                    sink.append(record)?;
                }
                info!(path = %sink.path().display(), rows = records.len(), "Batch exported");
                Ok(vec![sink.path().to_path_buf()])
            }
            _ => {
                // Repeated subjects finishing in the same millisecond get a numeric suffix
                let mut used = HashSet::new();
                let mut paths = Vec::with_capacity(records.len());
                for record in records {
                    let mut path = self.record_path(record, format);
                    let mut n = 2;
                    while used.contains(&path) {
                        path = self.output_dir.join(format!(
                            "{}_{}_{n}.{}",
                            file_safe(&record.subject),
                            record.analyzed_at.format(FILE_TIMESTAMP),
                            format.extension()
                        ));
                        n += 1;
                    }
                    used.insert(path.clone());
                    paths.push(self.write_record(record, format, path)?);
                }
                Ok(paths)
            }
        }
    }

    fn write_record(
        &self,
        record: &AnalysisRecord,
        format: ExportFormat,
        path: PathBuf,
    ) -> Result<PathBuf, ExportError> {
        let contents = match format {
            ExportFormat::Text => render_text(record),
            ExportFormat::Structured => render_structured(record, Utc::now())?,
            ExportFormat::Tabular => render_tabular(std::slice::from_ref(record)),
        };

        std::fs::create_dir_all(&self.output_dir)?;
        std::fs::write(&path, contents)?;
        info!(subject = %record.subject, path = %path.display(), %format, "Record exported");
        Ok(path)
    }
}

/// Subject as a file name component.
fn file_safe(subject: &str) -> String {
    subject
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod test_records {
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use verdict_models::{AnalysisRecord, ExtractionTier, Rating, RatingVerdict};

    pub fn record(subject: &str, rating: Rating, confidence: Decimal) -> AnalysisRecord {
        AnalysisRecord {
            subject: subject.to_string(),
            analyzed_at: Utc.with_ymd_and_hms(2025, 3, 4, 14, 30, 0).unwrap(),
            fundamentals: "Revenue | 94.9B | 85.8B".to_string(),
            company_sentiment: "Positive, driven by services growth".to_string(),
            sector_sentiment: "Neutral".to_string(),
            verdict: RatingVerdict {
                rating,
                confidence,
                reasoning: "Services growth offsets hardware softness.".to_string(),
                key_factors: vec!["Services growth".to_string(), "Buybacks".to_string()],
                risk_factors: vec!["Regulatory pressure".to_string()],
                recommendation_summary: "Accumulate on dips.".to_string(),
            },
            extraction: ExtractionTier::WholeReply,
            elapsed_ms: 4250,
            success: true,
            error_message: None,
        }
    }

    pub fn failed_record(subject: &str) -> AnalysisRecord {
        AnalysisRecord::failed(
            subject,
            Utc.with_ymd_and_hms(2025, 3, 4, 14, 31, 0).unwrap(),
            4250,
            "fundamentals stage failed: no data",
        )
    }
}
