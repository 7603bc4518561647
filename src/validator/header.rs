use std::sync::Arc;

/// One parsed data row, tied to the header row of the file it came from.
///
/// Headers are shared across every row of a file; cell lookup is by header
/// name, never by a position agreed between files.
#[derive(Debug, Clone)]
pub struct RawRow {
    headers: Arc<[String]>,
    cells: Vec<String>,
}

impl RawRow {
    pub fn new(headers: Arc<[String]>, cells: Vec<String>) -> Self {
        Self { headers, cells }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Cell at `index`; rows shorter than the header read as empty cells.
    pub fn cell(&self, index: usize) -> &str {
        self.cells.get(index).map(String::as_str).unwrap_or("")
    }

    /// Resolve `pattern` against this row's headers and return the cell.
    pub fn field(&self, pattern: &str) -> &str {
        match resolve_header(&self.headers, pattern) {
            Some(index) => self.cell(index),
            None => "",
        }
    }

    pub fn cells(&self) -> &[String] {
        &self.cells
    }
}

/// Index of the first header whose upper-cased name contains `pattern`.
///
/// Priority when several headers match is file order: the first occurrence
/// wins, nothing else is guessed.
pub fn resolve_header(headers: &[String], pattern: &str) -> Option<usize> {
    let needle = pattern.to_uppercase();
    headers
        .iter()
        .position(|header| header.to_uppercase().contains(&needle))
}

/// Join keys are trimmed and upper-cased before any index insert or lookup.
pub fn normalize_key(raw: &str) -> String {
    raw.trim().to_uppercase()
}
