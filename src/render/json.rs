//! JSON renderer implementation.

use crate::batch::BatchReport;
use crate::error::Result;
use crate::model::ParsedFile;
use serde::Serialize;
use std::path::Path;

/// JSON output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JsonFormat {
    /// Compact single-line JSON
    Compact,
    /// Pretty-printed with 2-space indentation
    #[default]
    Pretty,
}

/// Serialize any serializable value.
pub fn to_json<T: Serialize + ?Sized>(value: &T, format: JsonFormat) -> Result<String> {
    Ok(match format {
        JsonFormat::Compact => serde_json::to_string(value)?,
        JsonFormat::Pretty => serde_json::to_string_pretty(value)?,
    })
}

#[derive(Serialize)]
struct FailureView<'a> {
    path: &'a Path,
    error: String,
}

#[derive(Serialize)]
struct ReportView<'a> {
    succeeded: &'a [ParsedFile],
    failed: Vec<FailureView<'a>>,
}

/// Serialize a batch report; failures carry their error message.
pub fn report_to_json(report: &BatchReport, format: JsonFormat) -> Result<String> {
    let view = ReportView {
        succeeded: &report.succeeded,
        failed: report
            .failed
            .iter()
            .map(|f| FailureView {
                path: &f.path,
                error: f.error.to_string(),
            })
            .collect(),
    };
    to_json(&view, format)
}
