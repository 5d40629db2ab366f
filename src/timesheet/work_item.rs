//! The parsed-timesheet data model (spec §3).

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkItem {
    pub date: chrono::NaiveDate,
    pub hours: f64,
    pub rate: f64,
    pub description: String,
    pub total: f64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DetectedFormat {
    Csv,
    Json,
}

#[derive(Debug, Clone, Serialize)]
pub struct RowError {
    pub line_or_row_index: usize,
    pub column_or_field_name: String,
    pub raw_value: String,
    pub message: String,
}

/// Logging-only context captured from a structured-JSON input's sibling
/// `metadata` object; never influences parse semantics (spec §3).
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParseMetadata {
    pub client: Option<String>,
    pub period: Option<String>,
    pub description: Option<String>,
    pub currency: Option<String>,
    pub total_hours: Option<f64>,
    pub total_amount: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParseResult {
    pub work_items: Vec<WorkItem>,
    pub total_rows: usize,
    pub success_rows: usize,
    pub error_rows: usize,
    pub errors: Vec<RowError>,
    pub format: DetectedFormat,
    pub metadata: Option<ParseMetadata>,
}
