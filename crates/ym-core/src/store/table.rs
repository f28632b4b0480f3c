//! CSV exchange format for pronunciation tables.
//!
//! Three columns under the header `拼音,声调,平假名` (syllable, tone context,
//! kana). Files are UTF-8; a leading BOM is written on export and accepted
//! on import.

use std::fmt;

use super::{PronunciationRecord, PronunciationStore, StoreError};
use crate::tone::FormatError;

pub const HEADER: [&str; 3] = ["拼音", "声调", "平假名"];
const BOM: char = '\u{feff}';

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("header mismatch: expected {expected:?}, got {found:?}")]
    Header { expected: String, found: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Why a data row was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowProblem {
    ColumnCount(usize),
    MissingField,
    Context(FormatError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    /// 1-based line number in the input.
    pub line: usize,
    pub problem: RowProblem,
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.problem {
            RowProblem::ColumnCount(n) => {
                write!(f, "line {}: expected 3 columns, found {n}", self.line)
            }
            RowProblem::MissingField => write!(f, "line {}: missing required field", self.line),
            RowProblem::Context(e) => write!(f, "line {}: {e}", self.line),
        }
    }
}

/// Parsed table: valid records plus the rows that were rejected.
#[derive(Debug, Default)]
pub struct TableImport {
    pub records: Vec<PronunciationRecord>,
    pub errors: Vec<RowError>,
}

/// Parse a CSV table. Blank lines are ignored; malformed rows are reported
/// in `errors` and skipped.
pub fn parse_table(text: &str) -> Result<TableImport, TableError> {
    let text = text.strip_prefix(BOM).unwrap_or(text);
    let mut lines = text.lines().enumerate().filter(|(_, l)| !l.trim().is_empty());

    let header = lines.next().map(|(_, l)| split_row(l)).unwrap_or_default();
    if header != HEADER {
        return Err(TableError::Header {
            expected: HEADER.join(","),
            found: header.join(","),
        });
    }

    let mut out = TableImport::default();
    for (idx, line) in lines {
        let line_no = idx + 1;
        let fields = split_row(line);
        let problem = match fields.as_slice() {
            [syllable, context, kana] => {
                if syllable.is_empty() || context.is_empty() || kana.is_empty() {
                    Some(RowProblem::MissingField)
                } else {
                    match PronunciationRecord::parse(syllable, context, kana) {
                        Ok(rec) => {
                            out.records.push(rec);
                            None
                        }
                        Err(e) => Some(RowProblem::Context(e)),
                    }
                }
            }
            other => Some(RowProblem::ColumnCount(other.len())),
        };
        if let Some(problem) = problem {
            out.errors.push(RowError {
                line: line_no,
                problem,
            });
        }
    }
    Ok(out)
}

/// Render records as CSV, BOM-prefixed, header first.
pub fn format_table(records: &[PronunciationRecord]) -> String {
    let mut out = String::new();
    out.push(BOM);
    out.push_str(&HEADER.join(","));
    out.push_str("\r\n");
    for rec in records {
        let context = rec.context.to_string();
        let fields = [rec.syllable.as_str(), context.as_str(), rec.kana.as_str()];
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            push_field(&mut out, field);
        }
        out.push_str("\r\n");
    }
    out
}

impl PronunciationStore {
    /// Parse `text` and insert every valid row as one batch.
    pub fn import_table(&self, text: &str) -> Result<TableImport, TableError> {
        let import = parse_table(text)?;
        self.insert_records(import.records.clone())?;
        Ok(import)
    }

    pub fn export_table(&self) -> Result<String, StoreError> {
        Ok(format_table(&self.records()?))
    }
}

fn push_field(out: &mut String, field: &str) {
    if field.contains([',', '"']) {
        out.push('"');
        out.push_str(&field.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(field);
    }
}

/// Split one CSV line, honouring double-quoted fields.
fn split_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, quoted) {
            ('"', true) if chars.peek() == Some(&'"') => {
                chars.next();
                field.push('"');
            }
            ('"', true) => quoted = false,
            ('"', false) if field.is_empty() => quoted = true,
            (',', false) => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}
