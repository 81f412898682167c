//! Minimal CSV/TSV reader producing sparse cells for the data table.

use crate::parser::RawCell;
use crate::types::CellValue;

/// Delimiter for parsing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Delimiter {
    Comma,
    Tab,
}

impl Delimiter {
    fn as_char(self) -> char {
        match self {
            Self::Comma => ',',
            Self::Tab => '\t',
        }
    }
}

/// Tab-delimited when the first line has a tab and no comma.
pub(crate) fn detect_delimiter(data: &[u8]) -> Delimiter {
    let first_line = data.split(|&b| b == b'\n').next().unwrap_or_default();
    if first_line.contains(&b'\t') && !first_line.contains(&b',') {
        Delimiter::Tab
    } else {
        Delimiter::Comma
    }
}

/// Parse CSV/TSV bytes into populated cells.
///
/// Quoted fields may contain the delimiter, doubled quotes and line breaks.
/// Unquoted fields are trimmed and typed: numbers, `TRUE`/`FALSE`, or text.
pub(crate) fn parse_delimited(data: &[u8], delim: Delimiter) -> Vec<RawCell> {
    let text = String::from_utf8_lossy(data);
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

    let mut cells = Vec::new();
    for (row_idx, record) in split_records(text, delim.as_char()).into_iter().enumerate() {
        #[allow(clippy::cast_possible_truncation)]
        let row = row_idx as u32;
        for (col_idx, field) in record.into_iter().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            let col = col_idx as u32;
            if let Some(value) = field.into_value() {
                cells.push(RawCell { row, col, value });
            }
        }
    }
    cells
}

struct Field {
    text: String,
    quoted: bool,
}

impl Field {
    fn into_value(self) -> Option<CellValue> {
        if self.quoted {
            return (!self.text.is_empty()).then_some(CellValue::Text(self.text));
        }
        let value = self.text.trim();
        if value.is_empty() {
            return None;
        }
        if looks_numeric(value) {
            if let Ok(n) = value.parse::<f64>() {
                return Some(CellValue::Number(n));
            }
        }
        if value.eq_ignore_ascii_case("true") {
            return Some(CellValue::Bool(true));
        }
        if value.eq_ignore_ascii_case("false") {
            return Some(CellValue::Bool(false));
        }
        Some(CellValue::Text(value.to_string()))
    }
}

/// Plain decimal notation only, so words like `inf` or `NaN` stay text.
fn looks_numeric(s: &str) -> bool {
    s.bytes().any(|b| b.is_ascii_digit())
        && s
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'))
}

fn end_field(record: &mut Vec<Field>, current: &mut String, quoted: &mut bool) {
    record.push(Field {
        text: std::mem::take(current),
        quoted: *quoted,
    });
    *quoted = false;
}

/// Split text into records of fields, respecting quotes.
fn split_records(text: &str, sep: char) -> Vec<Vec<Field>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    // Escaped quote
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(ch);
            }
        } else if ch == '"' {
            in_quotes = true;
            quoted = true;
        } else if ch == sep {
            end_field(&mut record, &mut current, &mut quoted);
        } else if ch == '\n' || ch == '\r' {
            if ch == '\r' && chars.peek() == Some(&'\n') {
                chars.next();
            }
            end_field(&mut record, &mut current, &mut quoted);
            records.push(std::mem::take(&mut record));
        } else {
            current.push(ch);
        }
    }
    if !current.is_empty() || quoted || !record.is_empty() {
        end_field(&mut record, &mut current, &mut quoted);
        records.push(record);
    }
    records
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp
)]
mod tests {
    use super::*;

    fn at(cells: &[RawCell], row: u32, col: u32) -> Option<&CellValue> {
        cells
            .iter()
            .find(|c| c.row == row && c.col == col)
            .map(|c| &c.value)
    }

    #[test]
    fn test_parse_csv_basic() {
        let cells = parse_delimited(b"Name,Age,City\nAlice,30,NYC\nBob,25,LA", Delimiter::Comma);
        assert_eq!(cells.len(), 9);
        assert_eq!(at(&cells, 1, 0), Some(&CellValue::Text("Alice".into())));
        assert_eq!(at(&cells, 1, 1), Some(&CellValue::Number(30.0)));
    }

    #[test]
    fn test_parse_tsv() {
        let data = b"A\tB\n1\t2";
        assert_eq!(detect_delimiter(data), Delimiter::Tab);
        assert_eq!(parse_delimited(data, Delimiter::Tab).len(), 4);
    }

    #[test]
    fn test_quoted_csv() {
        let data = b"\"Hello, World\",42\r\n\"She said \"\"hi\"\"\",\"line\nbreak\"";
        let cells = parse_delimited(data, Delimiter::Comma);
        assert_eq!(at(&cells, 0, 0), Some(&CellValue::Text("Hello, World".into())));
        assert_eq!(at(&cells, 1, 0), Some(&CellValue::Text("She said \"hi\"".into())));
        assert_eq!(at(&cells, 1, 1), Some(&CellValue::Text("line\nbreak".into())));
    }

    #[test]
    fn test_quoted_numbers_stay_text() {
        let cells = parse_delimited(b"\"007\",007,TRUE,inf", Delimiter::Comma);
        assert_eq!(at(&cells, 0, 0), Some(&CellValue::Text("007".into())));
        assert_eq!(at(&cells, 0, 1), Some(&CellValue::Number(7.0)));
        assert_eq!(at(&cells, 0, 2), Some(&CellValue::Bool(true)));
        assert_eq!(at(&cells, 0, 3), Some(&CellValue::Text("inf".into())));
    }

    #[test]
    fn test_empty_csv() {
        assert!(parse_delimited(b"", Delimiter::Comma).is_empty());
        assert!(parse_delimited(b"\xef\xbb\xbf\n\n", Delimiter::Comma).is_empty());
    }
}
