pub mod category;
pub mod constants;
pub mod engine;
pub mod export;
pub mod header;
pub mod history;
pub mod reader;
pub mod report;


pub use category::{Category, ColumnMap, FieldSpec};
pub use engine::ReconciliationEngine;
pub use export::{export_csv, export_file_name, template_csv, TemplateRole};
pub use header::{normalize_key, resolve_header, RawRow};
pub use history::{HistoryEntry, HistoryLog, HistoryStore};
pub use reader::{ChunkedCsvReader, CsvStreamParser, RowIter};
pub use report::{MismatchRecord, ReportFilter, ReportRow, ValidationResult};

use crate::error::ValidationError;
use std::path::Path;

/// One-shot validation with the default window size and no progress
/// reporting.
pub async fn validate(
    master: &Path,
    source: &Path,
    category: Category,
) -> Result<ValidationResult, ValidationError> {
    ReconciliationEngine::default()
        .validate(master, source, category, |_| {})
        .await
}
