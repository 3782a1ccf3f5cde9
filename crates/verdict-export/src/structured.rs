use chrono::{DateTime, Utc};
use serde::Serialize;
use verdict_models::AnalysisRecord;

use crate::error::ExportError;

/// Every record field, verbatim, plus when the export happened.
#[derive(Debug, Serialize)]
pub struct StructuredExport<'a> {
    pub exported_at: DateTime<Utc>,
    #[serde(flatten)]
    pub record: &'a AnalysisRecord,
}

pub fn render_structured(
    record: &AnalysisRecord,
    exported_at: DateTime<Utc>,
) -> Result<String, ExportError> {
    let export = StructuredExport {
        exported_at,
        record,
    };
    Ok(serde_json::to_string_pretty(&export)?)
}
