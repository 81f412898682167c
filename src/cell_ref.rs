//! Utilities for parsing Excel-style cell references.

/// Parse a cell reference from raw bytes (ASCII) into (col, row) where col and row are 0-indexed.
///
/// Works directly on XML attribute values (`attr.value` from quick-xml).
/// Absolute markers (`$`) are ignored.
pub fn parse_cell_ref_bytes(ref_bytes: &[u8]) -> Option<(u32, u32)> {
    let mut col: u32 = 0;
    let mut row: u32 = 0;
    let mut saw_col = false;
    let mut saw_row = false;

    for &b in ref_bytes {
        if b == b'$' {
            continue;
        }
        if b.is_ascii_alphabetic() {
            if saw_row {
                return None;
            }
            let upper = b.to_ascii_uppercase();
            col = col
                .saturating_mul(26)
                .saturating_add(u32::from(upper - b'A') + 1);
            saw_col = true;
        } else if b.is_ascii_digit() {
            row = row.saturating_mul(10).saturating_add(u32::from(b - b'0'));
            saw_row = true;
        } else {
            return None;
        }
    }

    if !saw_col || !saw_row {
        return None;
    }

    Some((col.saturating_sub(1), row.saturating_sub(1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("A1", Some((0, 0)))]
    #[test_case("B3", Some((1, 2)))]
    #[test_case("AA10", Some((26, 9)))]
    #[test_case("$C$7", Some((2, 6)))]
    #[test_case("a2", Some((0, 1)))]
    #[test_case("12", None)]
    #[test_case("A1B", None)]
    fn test_parse_cell_ref_bytes(input: &str, expected: Option<(u32, u32)>) {
        assert_eq!(parse_cell_ref_bytes(input.as_bytes()), expected);
    }
}
