use std::path::Path;
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

use crate::constants::PERCENT_100;
use crate::error::ValidationError;
use crate::validator::constants::{
    COMMA_DELIMITER, CSV_QUOTE_CHAR, DEFAULT_CHUNK_SIZE_BYTES, SEMICOLON_DELIMITER, UTF8_BOM,
};
use crate::validator::header::RawRow;

/// Push-based CSV parser fed decoded text windows in file order.
///
/// The first complete line fixes the delimiter and the header; every later
/// line is a data row against that header. A partial trailing line is
/// carried between windows so no line is ever parsed truncated; `finish`
/// flushes whatever remains as the final line.
pub struct CsvStreamParser {
    state: ParserState,
    leftover: String,
    first_line: bool,
    data_rows: usize,
}

enum ParserState {
    AwaitingHeader,
    ReadingRows {
        headers: Arc<[String]>,
        delimiter: char,
    },
}

impl CsvStreamParser {
    pub fn new() -> Self {
        Self {
            state: ParserState::AwaitingHeader,
            leftover: String::new(),
            first_line: true,
            data_rows: 0,
        }
    }

    pub fn headers(&self) -> Option<&Arc<[String]>> {
        match &self.state {
            ParserState::AwaitingHeader => None,
            ParserState::ReadingRows { headers, .. } => Some(headers),
        }
    }

    pub fn delimiter(&self) -> Option<char> {
        match &self.state {
            ParserState::AwaitingHeader => None,
            ParserState::ReadingRows { delimiter, .. } => Some(*delimiter),
        }
    }

    /// Data rows emitted so far.
    pub fn data_rows(&self) -> usize {
        self.data_rows
    }

    /// Consume one window of text, returning the rows completed by it.
    pub fn push_chunk(&mut self, text: &str) -> Vec<RawRow> {
        let mut buffer = std::mem::take(&mut self.leftover);
        buffer.push_str(text);

        let mut rows = Vec::new();
        let mut start = 0;
        while let Some(offset) = buffer[start..].find('\n') {
            let line = &buffer[start..start + offset];
            self.consume_line(line, &mut rows);
            start += offset + 1;
        }
        self.leftover = buffer[start..].to_string();
        rows
    }

    /// Flush the carried remainder as the final complete line.
    pub fn finish(&mut self) -> Vec<RawRow> {
        let remainder = std::mem::take(&mut self.leftover);
        let mut rows = Vec::new();
        self.consume_line(&remainder, &mut rows);
        rows
    }

    fn consume_line(&mut self, line: &str, rows: &mut Vec<RawRow>) {
        let mut line = line.strip_suffix('\r').unwrap_or(line);
        if self.first_line {
            line = line.strip_prefix(UTF8_BOM).unwrap_or(line);
            self.first_line = false;
        }
        if line.trim().is_empty() {
            return;
        }

        match &self.state {
            ParserState::AwaitingHeader => {
                let delimiter = detect_delimiter(line);
                let headers: Arc<[String]> = split_fields(line, delimiter).into();
                self.state = ParserState::ReadingRows { headers, delimiter };
            }
            ParserState::ReadingRows { headers, delimiter } => {
                let cells = split_fields(line, *delimiter);
                rows.push(RawRow::new(Arc::clone(headers), cells));
                self.data_rows += 1;
            }
        }
    }
}

impl Default for CsvStreamParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Semicolon wins only when the first line holds strictly more semicolons
/// than commas.
pub fn detect_delimiter(line: &str) -> char {
    let semicolons = line.matches(SEMICOLON_DELIMITER).count();
    let commas = line.matches(COMMA_DELIMITER).count();
    if semicolons > commas {
        SEMICOLON_DELIMITER
    } else {
        COMMA_DELIMITER
    }
}

/// Split one line into field values: double quotes toggle a span in which
/// the delimiter does not split, a doubled quote is a literal quote, and
/// each final value is trimmed with its wrapping quotes gone.
pub fn split_fields(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            CSV_QUOTE_CHAR if !in_quotes => {
                in_quotes = true;
            }
            CSV_QUOTE_CHAR if in_quotes => {
                if chars.peek() == Some(&CSV_QUOTE_CHAR) {
                    chars.next();
                    current.push(CSV_QUOTE_CHAR);
                } else {
                    in_quotes = false;
                }
            }
            d if d == delimiter && !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => {
                current.push(ch);
            }
        }
    }

    fields.push(current.trim().to_string());
    fields
}

/// Lazy, finite, non-restartable row sequence over in-memory text. Pulls
/// one line at a time through the same state machine the file reader uses,
/// so parser behavior can be tested without any file APIs.
pub struct RowIter<'a> {
    parser: CsvStreamParser,
    remaining: &'a str,
    queued: std::collections::VecDeque<RawRow>,
    finished: bool,
}

impl<'a> RowIter<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            parser: CsvStreamParser::new(),
            remaining: text,
            queued: std::collections::VecDeque::new(),
            finished: false,
        }
    }
}

impl Iterator for RowIter<'_> {
    type Item = RawRow;

    fn next(&mut self) -> Option<RawRow> {
        loop {
            if let Some(row) = self.queued.pop_front() {
                return Some(row);
            }
            if self.finished {
                return None;
            }
            match self.remaining.find('\n') {
                Some(pos) => {
                    let (line, rest) = self.remaining.split_at(pos + 1);
                    self.remaining = rest;
                    self.queued.extend(self.parser.push_chunk(line));
                }
                None => {
                    self.queued.extend(self.parser.push_chunk(self.remaining));
                    self.remaining = "";
                    self.queued.extend(self.parser.finish());
                    self.finished = true;
                }
            }
        }
    }
}

pub struct ReadSummary {
    pub data_rows: usize,
    pub bytes_read: u64,
}

/// Reads a file in fixed-size byte windows, feeding a [`CsvStreamParser`]
/// and yielding to the runtime once per window so a single-threaded host
/// stays responsive. Peak memory is bounded by the window size, not the
/// file size.
pub struct ChunkedCsvReader {
    chunk_size: usize,
}

impl ChunkedCsvReader {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    pub async fn read_chunked<R, P>(
        &self,
        path: &Path,
        mut on_rows: R,
        mut on_progress: P,
    ) -> Result<ReadSummary, ValidationError>
    where
        R: FnMut(Vec<RawRow>),
        P: FnMut(f64),
    {
        let mut file = File::open(path).await.map_err(|source| ValidationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let total_bytes = file
            .metadata()
            .await
            .map_err(|source| ValidationError::Io {
                path: path.to_path_buf(),
                source,
            })?
            .len();

        let mut parser = CsvStreamParser::new();
        let mut window = vec![0u8; self.chunk_size];
        // Bytes read but not yet decoded: a window may end inside a
        // multi-byte UTF-8 sequence.
        let mut pending: Vec<u8> = Vec::new();
        let mut bytes_read: u64 = 0;

        loop {
            let n = file
                .read(&mut window)
                .await
                .map_err(|source| ValidationError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
            if n == 0 {
                break;
            }
            bytes_read += n as u64;
            pending.extend_from_slice(&window[..n]);

            let text = decode_window(&mut pending, path, bytes_read)?;
            let rows = parser.push_chunk(&text);
            if !rows.is_empty() {
                on_rows(rows);
            }

            let percent = if total_bytes == 0 {
                PERCENT_100
            } else {
                (bytes_read as f64 / total_bytes as f64 * PERCENT_100).min(PERCENT_100)
            };
            on_progress(percent);
            tokio::task::yield_now().await;
        }

        if !pending.is_empty() {
            // A sequence still incomplete at EOF is real invalid input, not
            // a window-boundary artifact.
            return Err(ValidationError::Decode {
                path: path.to_path_buf(),
                offset: bytes_read - pending.len() as u64,
            });
        }

        let tail = parser.finish();
        if !tail.is_empty() {
            on_rows(tail);
        }
        on_progress(PERCENT_100);

        Ok(ReadSummary {
            data_rows: parser.data_rows(),
            bytes_read,
        })
    }
}

impl Default for ChunkedCsvReader {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE_BYTES)
    }
}

/// Decode the longest valid UTF-8 prefix of `pending`, leaving an
/// incomplete trailing sequence for the next window. A malformed sequence
/// anywhere else fails the read.
fn decode_window(
    pending: &mut Vec<u8>,
    path: &Path,
    end_offset: u64,
) -> Result<String, ValidationError> {
    match std::str::from_utf8(pending) {
        Ok(text) => {
            let out = text.to_string();
            pending.clear();
            Ok(out)
        }
        Err(err) => {
            let valid = err.valid_up_to();
            if err.error_len().is_some() {
                return Err(ValidationError::Decode {
                    path: path.to_path_buf(),
                    offset: end_offset - (pending.len() - valid) as u64,
                });
            }
            let out = String::from_utf8_lossy(&pending[..valid]).into_owned();
            pending.drain(..valid);
            Ok(out)
        }
    }
}
