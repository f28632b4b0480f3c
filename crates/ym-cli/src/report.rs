//! Plain-text reports for store commands.

use time::OffsetDateTime;
use unicode_width::UnicodeWidthStr;
use yukkuri_engine::store::table::HEADER;
use yukkuri_engine::PronunciationRecord;

/// Local time when the offset is known, UTC otherwise.
pub fn now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

/// `YYYY-MM-DD HH:MM:SS`
pub fn timestamp(at: &OffsetDateTime) -> String {
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        at.year(),
        at.month() as u8,
        at.day(),
        at.hour(),
        at.minute(),
        at.second()
    )
}

/// Pad `s` with spaces to `width` terminal columns.
fn pad(s: &str, width: usize) -> String {
    let w = UnicodeWidthStr::width(s);
    if w < width {
        format!("{s}{}", " ".repeat(width - w))
    } else {
        s.to_string()
    }
}

/// Operation banner, then a column-aligned table of `records`.
pub fn format_report(operation: &str, at: &OffsetDateTime, records: &[PronunciationRecord]) -> String {
    let mut out = format!("== {operation} @ {} ==\n", timestamp(at));
    if records.is_empty() {
        out.push_str("(no records)\n");
        return out;
    }

    let rows: Vec<[String; 3]> = records
        .iter()
        .map(|r| [r.syllable.clone(), r.context.to_string(), r.kana.clone()])
        .collect();
    let mut widths = HEADER.map(UnicodeWidthStr::width);
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(UnicodeWidthStr::width(cell.as_str()));
        }
    }

    let header = HEADER.map(str::to_string);
    for row in std::iter::once(&header).chain(&rows) {
        let line = format!(
            "{}  {}  {}",
            pad(&row[0], widths[0]),
            pad(&row[1], widths[1]),
            row[2]
        );
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out.push_str("---\n");
    out.push_str(&format!("{} records\n", records.len()));
    out
}
