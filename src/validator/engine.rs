use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

use crate::error::ValidationError;
use crate::validator::category::{parse_amount, Category, ColumnMap};
use crate::validator::constants::{MASTER_PROGRESS_SPAN, SOURCE_PROGRESS_SPAN};
use crate::validator::header::{normalize_key, resolve_header, RawRow};
use crate::validator::reader::ChunkedCsvReader;
use crate::validator::report::{
    remark_match, remark_mismatch, remark_no_master, FieldPair, MismatchRecord, ReportRow,
    ValidationResult,
};

/// Two-pass streaming reconciliation: the master file becomes a keyed
/// in-memory index, then the source file is compared against it row by row.
///
/// All run state lives inside one `validate` call; nothing is shared
/// between runs and callers are expected to serialize them.
pub struct ReconciliationEngine {
    reader: ChunkedCsvReader,
}

impl ReconciliationEngine {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            reader: ChunkedCsvReader::new(chunk_size),
        }
    }

    /// Validate `source` against `master`, reporting blended progress
    /// (master read 0-30, source read-and-compare 30-100).
    ///
    /// A failed read aborts the whole run with no partial result; a run
    /// that completes always produces exactly one result, zero matches
    /// included.
    pub async fn validate<P>(
        &self,
        master: &Path,
        source: &Path,
        category: Category,
        mut on_progress: P,
    ) -> Result<ValidationResult, ValidationError>
    where
        P: FnMut(f64),
    {
        for path in [master, source] {
            if !path.exists() {
                return Err(ValidationError::InputMissing {
                    path: path.to_path_buf(),
                });
            }
        }

        info!(
            "Validating {} against {} ({})",
            source.display(),
            master.display(),
            category
        );

        let index = self.build_master_index(master, category, &mut on_progress).await?;
        debug!("Master index holds {} keys", index.len());

        let mut report: Vec<ReportRow> = Vec::new();
        let mut mismatches: Vec<MismatchRecord> = Vec::new();
        let mut matches = 0usize;
        let mut blanks = 0usize;
        let mut source_columns: Option<ColumnMap> = None;
        let mut master_columns: Option<ColumnMap> = None;

        let summary = self.reader
            .read_chunked(
                source,
                |rows| {
                    for row in rows {
                        let columns = source_columns
                            .get_or_insert_with(|| ColumnMap::resolve(category, row.headers()));
                        let key = normalize_key(columns.cell(&row, columns.key));
                        let master_row = index.get(&key);
                        let master_cols = match master_row {
                            Some(m) => Some(&*master_columns.get_or_insert_with(|| {
                                ColumnMap::resolve(category, m.headers())
                            })),
                            None => None,
                        };

                        let row_id = report.len() + 1;
                        let (report_row, issues) =
                            compare_row(category, columns, &row, key, master_cols, master_row);

                        if master_row.is_none() {
                            blanks += 1;
                        } else if issues.is_empty() {
                            matches += 1;
                        } else {
                            mismatches.push(MismatchRecord {
                                row_id,
                                reasons: issues,
                            });
                        }
                        report.push(report_row);
                    }
                },
                |percent| {
                    on_progress(
                        MASTER_PROGRESS_SPAN + percent * SOURCE_PROGRESS_SPAN / 100.0,
                    )
                },
            )
            .await?;
        debug!(
            "Source file: {} data rows in {} bytes",
            summary.data_rows, summary.bytes_read
        );

        info!(
            "Run complete: {} rows, {} match, {} mismatch, {} without master data",
            report.len(),
            matches,
            mismatches.len(),
            blanks
        );

        Ok(ValidationResult::build(report, mismatches, matches, blanks))
    }

    /// Pass 1: key every master row by its normalized join key. Duplicate
    /// keys overwrite (last write wins); empty keys never enter the index.
    async fn build_master_index<P>(
        &self,
        master: &Path,
        category: Category,
        on_progress: &mut P,
    ) -> Result<HashMap<String, RawRow>, ValidationError>
    where
        P: FnMut(f64),
    {
        let mut index: HashMap<String, RawRow> = HashMap::new();
        let mut key_column: Option<Option<usize>> = None;

        let summary = self.reader
            .read_chunked(
                master,
                |rows| {
                    for row in rows {
                        let column = *key_column.get_or_insert_with(|| {
                            resolve_header(row.headers(), category.key_pattern())
                        });
                        let Some(column) = column else {
                            // Unresolvable key header: the index stays empty
                            // and every source row classifies as blank.
                            continue;
                        };
                        let key = normalize_key(row.cell(column));
                        if !key.is_empty() {
                            index.insert(key, row);
                        }
                    }
                },
                |percent| on_progress(percent * MASTER_PROGRESS_SPAN / 100.0),
            )
            .await?;
        debug!(
            "Master file: {} data rows in {} bytes",
            summary.data_rows, summary.bytes_read
        );

        Ok(index)
    }
}

impl Default for ReconciliationEngine {
    fn default() -> Self {
        Self {
            reader: ChunkedCsvReader::default(),
        }
    }
}

/// Build the comparison row for one source row and collect the display
/// names of the compared fields whose values differ.
fn compare_row(
    category: Category,
    columns: &ColumnMap,
    row: &RawRow,
    key: String,
    master_columns: Option<&ColumnMap>,
    master_row: Option<&RawRow>,
) -> (ReportRow, Vec<String>) {
    let mut issues = Vec::new();
    let mut values = Vec::with_capacity(category.fields().len());

    for (position, spec) in category.fields().iter().enumerate() {
        let it = parse_amount(columns.cell(row, columns.values[position]));
        let master = match (master_columns, master_row) {
            (Some(cols), Some(m)) => parse_amount(cols.cell(m, cols.values[position])),
            _ => 0,
        };
        if spec.compared && master_row.is_some() && it != master {
            issues.push(spec.display.to_string());
        }
        values.push(FieldPair {
            name: spec.display.to_string(),
            it,
            master,
        });
    }

    let keterangan = if master_row.is_none() {
        remark_no_master()
    } else if issues.is_empty() {
        remark_match()
    } else {
        remark_mismatch(&issues)
    };

    let service_master = match (master_columns, master_row) {
        (Some(cols), Some(m)) => cols.cell(m, cols.label).trim().to_string(),
        _ => String::new(),
    };

    let report_row = ReportRow {
        origin: columns.cell(row, columns.origin).trim().to_string(),
        destination: columns.cell(row, columns.destination).trim().to_string(),
        code: key,
        service_it: columns.cell(row, columns.label).trim().to_string(),
        service_master,
        values,
        keterangan,
    };

    (report_row, issues)
}
