use crate::constants::BYTES_PER_MB;

pub const DEFAULT_CHUNK_SIZE_BYTES: usize = 2 * BYTES_PER_MB;

pub const CSV_QUOTE_CHAR: char = '"';
pub const COMMA_DELIMITER: char = ',';
pub const SEMICOLON_DELIMITER: char = ';';
pub const UTF8_BOM: char = '\u{feff}';

pub const REMARK_MATCH: &str = "Sesuai";
pub const REMARK_MISMATCH_PREFIX: &str = "Tidak sesuai: ";
pub const REMARK_MISMATCH_NEEDLE: &str = "Tidak sesuai";
pub const REMARK_NO_MASTER: &str = "Master Data Tidak Ada";
pub const REMARK_NO_MASTER_NEEDLE: &str = "Tidak Ada";

pub const PAGE_SIZE: usize = 50;

// Master read maps to the first 30% of overall progress, the source
// read-and-compare pass to the remaining 70%.
pub const MASTER_PROGRESS_SPAN: f64 = 30.0;
pub const SOURCE_PROGRESS_SPAN: f64 = 70.0;

pub const EXPORT_FILE_PREFIX: &str = "Laporan_Validasi_";
pub const EXPORT_FILE_EXTENSION: &str = ".csv";
pub const TEMPLATE_FILE_PREFIX: &str = "Template_";
