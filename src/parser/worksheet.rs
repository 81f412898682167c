//! Worksheet parsing: `<sheetData>` cells into typed values.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{BufReader, Read, Seek};
use zip::ZipArchive;

use crate::cell_ref::parse_cell_ref_bytes;
use crate::error::Result;
use crate::types::CellValue;

use super::RawCell;

/// Cell type tag from the `t` attribute of a `<c>` element.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(super) enum CellTypeTag {
    Shared,
    Inline,
    Str,
    Bool,
    Error,
    Default,
}

pub(super) fn parse_cell_type_tag(value: &[u8]) -> CellTypeTag {
    match value {
        b"s" => CellTypeTag::Shared,
        b"b" => CellTypeTag::Bool,
        b"e" => CellTypeTag::Error,
        b"str" => CellTypeTag::Str,
        b"inlineStr" => CellTypeTag::Inline,
        _ => CellTypeTag::Default,
    }
}

pub(super) fn parse_u32_bytes(value: &[u8]) -> Option<u32> {
    let mut num: u32 = 0;
    let mut seen = false;
    for &b in value {
        if !b.is_ascii_digit() {
            return None;
        }
        seen = true;
        num = num.saturating_mul(10).saturating_add(u32::from(b - b'0'));
    }
    if seen {
        Some(num)
    } else {
        None
    }
}

/// Typed value of one cell, or `None` for cells that hold nothing usable.
///
/// Error cells (`#N/A`, `#DIV/0!`, ...) count as empty.
pub(super) fn resolve_cell_value(
    raw: Option<&str>,
    tag: CellTypeTag,
    shared_strings: &[String],
) -> Option<CellValue> {
    match tag {
        CellTypeTag::Shared => {
            let idx = raw.and_then(|v| parse_u32_bytes(v.trim().as_bytes()))?;
            shared_strings
                .get(idx as usize)
                .map(|s| CellValue::Text(s.clone()))
        }
        CellTypeTag::Inline | CellTypeTag::Str => raw.map(|s| CellValue::Text(s.to_string())),
        CellTypeTag::Bool => raw.map(|v| CellValue::Bool(matches!(v.trim(), "1" | "true"))),
        CellTypeTag::Error => None,
        CellTypeTag::Default => {
            let raw = raw?;
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return None;
            }
            Some(match trimmed.parse::<f64>() {
                Ok(n) => CellValue::Number(n),
                Err(_) => CellValue::Text(raw.to_string()),
            })
        }
    }
}

/// Read every non-empty cell of the sheet at `path`.
///
/// Rows and cells without an `r` attribute continue from the previous one.
pub(super) fn parse_sheet_cells<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: &str,
    shared_strings: &[String],
) -> Result<Vec<RawCell>> {
    let file = archive.by_name(path)?;
    let mut xml = Reader::from_reader(BufReader::new(file));
    xml.trim_text(false);

    let mut cells = Vec::new();
    let mut buf = Vec::new();

    // 0-indexed; `next_row` is where a row without `r` lands
    let mut next_row: u32 = 0;
    let mut current_row: u32 = 0;
    let mut next_col: u32 = 0;

    // State for the `<c>` being read
    let mut in_cell = false;
    let mut cell_pos = (0u32, 0u32);
    let mut cell_tag = CellTypeTag::Default;
    let mut in_value = false;
    let mut in_inline = false;
    let mut value = String::new();
    let mut has_value = false;

    loop {
        match xml.read_event_into(&mut buf)? {
            ref event @ (Event::Start(_) | Event::Empty(_)) => {
                let (Event::Start(ref e) | Event::Empty(ref e)) = *event else {
                    continue;
                };
                let is_start = matches!(event, Event::Start(_));
                match e.local_name().as_ref() {
                    b"row" => {
                        current_row = next_row;
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"r" {
                                if let Some(r) = parse_u32_bytes(&attr.value) {
                                    current_row = r.saturating_sub(1);
                                }
                            }
                        }
                        next_row = current_row.saturating_add(1);
                        next_col = 0;
                    }
                    b"c" => {
                        let mut pos = (current_row, next_col);
                        cell_tag = CellTypeTag::Default;
                        for attr in e.attributes().flatten() {
                            match attr.key.as_ref() {
                                b"r" => {
                                    if let Some((col, row)) = parse_cell_ref_bytes(&attr.value) {
                                        pos = (row, col);
                                    }
                                }
                                b"t" => cell_tag = parse_cell_type_tag(&attr.value),
                                _ => {}
                            }
                        }
                        next_col = pos.1.saturating_add(1);
                        cell_pos = pos;
                        value.clear();
                        has_value = false;
                        in_cell = is_start;
                    }
                    b"v" if in_cell && is_start => {
                        in_value = true;
                        has_value = true;
                    }
                    b"is" if in_cell && is_start => {
                        in_inline = true;
                        has_value = true;
                    }
                    b"t" if in_inline && is_start => in_value = true,
                    _ => {}
                }
            }
            Event::Text(ref e) if in_value => {
                value.push_str(&e.unescape()?);
            }
            Event::CData(ref e) if in_value => {
                value.push_str(&String::from_utf8_lossy(e));
            }
            Event::End(ref e) => match e.local_name().as_ref() {
                b"v" | b"t" => in_value = false,
                b"is" => in_inline = false,
                b"c" if in_cell => {
                    in_cell = false;
                    let raw = has_value.then_some(value.as_str());
                    if let Some(v) = resolve_cell_value(raw, cell_tag, shared_strings) {
                        cells.push(RawCell {
                            row: cell_pos.0,
                            col: cell_pos.1,
                            value: v,
                        });
                    }
                }
                b"sheetData" => break,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(cells)
}
