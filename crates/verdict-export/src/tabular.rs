use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;
use verdict_models::AnalysisRecord;

use crate::error::ExportError;

pub const TABULAR_HEADER: &str = "subject,analysis_date,rating,confidence,elapsed_seconds,success,key_factor_count,risk_factor_count";

/// Quote a CSV field when it contains a delimiter, a quote or a line break.
pub fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// One CSV row of scalar summary fields, without a trailing newline.
pub fn tabular_row(record: &AnalysisRecord) -> String {
    [
        csv_field(&record.subject),
        record.analyzed_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        csv_field(record.verdict.rating.label()),
        record.verdict.confidence.to_string(),
        format!("{:.2}", record.elapsed_seconds()),
        record.success.to_string(),
        record.key_factor_count().to_string(),
        record.risk_factor_count().to_string(),
    ]
    .join(",")
}

/// Header plus one row per record.
pub fn render_tabular(records: &[AnalysisRecord]) -> String {
    let mut out = String::from(TABULAR_HEADER);
    out.push('\n');
    for record in records {
        out.push_str(&tabular_row(record));
        out.push('\n');
    }
    out
}

/// File name of the shared tabular file for one batch run.
pub fn batch_file_name(started: DateTime<Utc>, run_id: Uuid) -> String {
    let run = run_id.simple().to_string();
    format!("batch_{}_{}.csv", started.format("%Y%m%d_%H%M%S"), &run[..8])
}

/// A CSV file shared by every task of a batch run.
///
/// The header is written once when the sink is created; each `append`
/// writes one complete row under the lock.
pub struct TabularSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl TabularSink {
    /// Create (or truncate) `path` and write the header.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, ExportError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;
        writeln!(file, "{TABULAR_HEADER}")?;
        file.flush()?;
        debug!(path = %path.display(), "Tabular sink created");

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Create the sink for a batch run inside `dir`.
    pub fn for_batch(
        dir: impl AsRef<Path>,
        started: DateTime<Utc>,
        run_id: Uuid,
    ) -> Result<Self, ExportError> {
        Self::create(dir.as_ref().join(batch_file_name(started, run_id)))
    }

    pub fn append(&self, record: &AnalysisRecord) -> Result<(), ExportError> {
        let line = format!("{}\n", tabular_row(record));
        let mut file = self.file.lock().map_err(|_| ExportError::SinkPoisoned)?;
        file.write_all(line.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_records::{failed_record, record};
    use rust_decimal_macros::dec;
    use verdict_models::Rating;

    #[test]
    fn plain_fields_are_not_quoted() {
        assert_eq!(csv_field("AAPL"), "AAPL");
        assert_eq!(csv_field("Strong Buy"), "Strong Buy");
    }

    #[test]
    fn special_fields_are_quoted() {
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn row_has_one_field_per_column() {
        let row = tabular_row(&record("AAPL", Rating::StrongBuy, dec!(0.85)));
        let fields: Vec<&str> = row.split(',').collect();
        assert_eq!(fields.len(), TABULAR_HEADER.split(',').count());
        assert_eq!(fields[0], "AAPL");
        assert_eq!(fields[2], "Strong Buy");
        assert_eq!(fields[3], "0.85");
        assert_eq!(fields[4], "4.25");
        assert_eq!(fields[5], "true");
        assert_eq!(fields[6], "2");
        assert_eq!(fields[7], "1");
    }

    #[test]
    fn failed_record_row_reports_failure() {
        let row = tabular_row(&failed_record("BBB"));
        assert!(row.starts_with("BBB,"));
        assert!(row.contains(",false,"));
    }

    #[test]
    fn batch_file_name_uses_short_run_id() {
        let started = DateTime::parse_from_rfc3339("2025-03-04T05:06:07Z")
            .unwrap()
            .with_timezone(&Utc);
        let run_id = Uuid::parse_str("a1b2c3d4-0000-4000-8000-000000000000").unwrap();
        assert_eq!(
            batch_file_name(started, run_id),
            "batch_20250304_050607_a1b2c3d4.csv"
        );
    }

    #[test]
    fn sink_writes_header_then_rows() {
        let dir = tempfile::tempdir().unwrap();
        let sink = TabularSink::create(dir.path().join("out.csv")).unwrap();
        sink.append(&record("AAPL", Rating::Buy, dec!(0.7))).unwrap();
        sink.append(&failed_record("BBB")).unwrap();

        let contents = std::fs::read_to_string(sink.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], TABULAR_HEADER);
        assert!(lines[1].starts_with("AAPL,"));
        assert!(lines[2].starts_with("BBB,"));
    }
}
