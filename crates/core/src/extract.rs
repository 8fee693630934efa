//! Line Extractor (C3) — splits file bytes into non-empty [`LineRecord`]s.

use crate::model::LineRecord;

/// Splits `bytes` at line feeds (trailing `\r` stripped), numbering lines
/// from 1. Lines that are empty or whitespace-only are omitted from the
/// returned `Vec` but still counted toward the returned total. Invalid
/// UTF-8 is repaired via replacement-character substitution — the file is
/// never rejected outright.
pub fn extract(bytes: &[u8]) -> (usize, Vec<LineRecord>) {
    let text = String::from_utf8_lossy(bytes);

    let mut total_lines = 0usize;
    let mut records = Vec::new();

    // `str::lines()` already treats a trailing `\r\n` as one line break and
    // strips the `\r`, matching "carriage returns are stripped".
    for (idx, raw_line) in text.lines().enumerate() {
        let line_number = idx + 1;
        total_lines = line_number;

        if raw_line.trim().is_empty() {
            continue;
        }

        records.push(LineRecord::new(line_number, raw_line.to_string()));
    }

    // `str::lines()` drops a final empty line after a trailing `\n`, which is
    // correct: that line carries no content and spec.md counts non-empty and
    // whitespace-only lines toward `total_lines`, but a file ending exactly
    // at a newline has no partial trailing line to count.

    (total_lines, records)
}
