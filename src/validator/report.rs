use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::validator::constants::{
    PAGE_SIZE, REMARK_MATCH, REMARK_MISMATCH_NEEDLE, REMARK_MISMATCH_PREFIX, REMARK_NO_MASTER,
    REMARK_NO_MASTER_NEEDLE,
};

pub fn remark_match() -> String {
    REMARK_MATCH.to_string()
}

pub fn remark_mismatch(issues: &[String]) -> String {
    format!("{}{}", REMARK_MISMATCH_PREFIX, issues.join(", "))
}

pub fn remark_no_master() -> String {
    REMARK_NO_MASTER.to_string()
}

/// Both-side values of one checked column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldPair {
    pub name: String,
    pub it: u64,
    pub master: u64,
}

/// One comparison row, emitted for every source data row regardless of
/// outcome. Row order is the source file order and is canonical for all
/// filtering, pagination and export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub origin: String,
    pub destination: String,
    pub code: String,
    pub service_it: String,
    pub service_master: String,
    pub values: Vec<FieldPair>,
    pub keterangan: String,
}

/// Sequence number and differing fields of one mismatched row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MismatchRecord {
    /// 1-based position in the source file's data rows.
    pub row_id: usize,
    pub reasons: Vec<String>,
}

/// Aggregate of one validation run. Built exactly once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub total_rows: usize,
    pub matches: usize,
    pub blanks: usize,
    pub mismatches: Vec<MismatchRecord>,
    pub full_report: Vec<ReportRow>,
}

impl ValidationResult {
    pub fn build(
        full_report: Vec<ReportRow>,
        mismatches: Vec<MismatchRecord>,
        matches: usize,
        blanks: usize,
    ) -> Self {
        Self {
            total_rows: full_report.len(),
            matches,
            blanks,
            mismatches,
            full_report,
        }
    }

    /// Non-destructive remark-bucket filter preserving source order.
    pub fn filtered(&self, filter: ReportFilter) -> Vec<&ReportRow> {
        self.full_report
            .iter()
            .filter(|row| filter.matches(&row.keterangan))
            .collect()
    }

    /// Rows of 1-based `page_number` of the filtered sequence.
    pub fn page(&self, filter: ReportFilter, page_number: usize) -> Vec<&ReportRow> {
        paginate(&self.filtered(filter), page_number).to_vec()
    }
}

/// The only valid report views. Every remark falls into exactly one of the
/// three non-`All` buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum ReportFilter {
    All,
    Match,
    Mismatch,
    Blank,
}

impl ReportFilter {
    pub fn matches(&self, keterangan: &str) -> bool {
        match self {
            ReportFilter::All => true,
            ReportFilter::Match => keterangan == REMARK_MATCH,
            ReportFilter::Mismatch => keterangan.starts_with(REMARK_MISMATCH_NEEDLE),
            ReportFilter::Blank => keterangan.contains(REMARK_NO_MASTER_NEEDLE),
        }
    }
}

/// Fixed-size pagination over an already-filtered row sequence; pages are
/// 1-based and an out-of-range page is empty.
pub fn paginate<'a, T>(rows: &'a [T], page_number: usize) -> &'a [T] {
    if page_number == 0 {
        return &[];
    }
    let start = (page_number - 1) * PAGE_SIZE;
    if start >= rows.len() {
        return &[];
    }
    let end = (start + PAGE_SIZE).min(rows.len());
    &rows[start..end]
}
