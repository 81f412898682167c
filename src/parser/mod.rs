//! Data table reader.
//!
//! Reads the first sheet of an XLSX workbook, or a CSV/TSV file, into a
//! [`DataTable`]: the first populated row supplies the column names and every
//! later non-blank row becomes a record.

mod relationships;
mod worksheet;

use std::collections::{BTreeMap, HashSet};
use std::io::Cursor;
use zip::ZipArchive;

use crate::csv::{detect_delimiter, parse_delimited};
use crate::error::Result;
use crate::types::{CellValue, DataTable, Record};

use relationships::{first_sheet_path, parse_shared_strings, parse_workbook_relationships};
use worksheet::parse_sheet_cells;

/// Local file header signature that starts every ZIP (and so XLSX) file.
const ZIP_SIGNATURE: &[u8] = b"PK\x03\x04";

/// Name given to header cells that hold nothing.
const EMPTY_HEADER: &str = "__EMPTY";

/// A populated cell at a 0-indexed position.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawCell {
    pub row: u32,
    pub col: u32,
    pub value: CellValue,
}

/// Source format of a data file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Xlsx,
    Delimited,
}

/// Sniff the format from the leading bytes.
pub fn detect_format(data: &[u8]) -> DataFormat {
    if data.starts_with(ZIP_SIGNATURE) {
        DataFormat::Xlsx
    } else {
        DataFormat::Delimited
    }
}

/// Parse a data file of either supported format.
pub fn parse_data_table(data: &[u8]) -> Result<DataTable> {
    let table = match detect_format(data) {
        DataFormat::Xlsx => parse_xlsx_table(data)?,
        DataFormat::Delimited => {
            let cells = parse_delimited(data, detect_delimiter(data));
            build_table(cells)
        }
    };
    tracing::debug!(
        headers = table.headers().len(),
        rows = table.len(),
        "data table parsed"
    );
    Ok(table)
}

/// Parse the first worksheet of an XLSX workbook.
pub fn parse_xlsx_table(data: &[u8]) -> Result<DataTable> {
    let mut archive = ZipArchive::new(Cursor::new(data))?;
    let relationships = parse_workbook_relationships(&mut archive);
    let shared_strings =
        parse_shared_strings(&mut archive, relationships.shared_strings.as_deref());
    let (sheet_name, path) = first_sheet_path(&mut archive, &relationships)?;
    tracing::trace!(sheet = %sheet_name, %path, "reading first sheet");
    let cells = parse_sheet_cells(&mut archive, &path, &shared_strings)?;
    Ok(build_table(cells))
}

/// Assemble a table from sparse cells.
///
/// The header row is the first row holding any cell; columns span the
/// leftmost to the rightmost populated column of the whole sheet. Header
/// names are made unique, and cells below the header map to records keyed
/// by those names.
pub(crate) fn build_table(cells: Vec<RawCell>) -> DataTable {
    let (Some(min_col), Some(max_col)) = (
        cells.iter().map(|c| c.col).min(),
        cells.iter().map(|c| c.col).max(),
    ) else {
        return DataTable::new(Vec::new(), Vec::new());
    };

    let mut by_row: BTreeMap<u32, Vec<RawCell>> = BTreeMap::new();
    for cell in cells {
        by_row.entry(cell.row).or_default().push(cell);
    }
    let mut rows = by_row.into_values();
    let header_cells = rows.next().unwrap_or_default();

    let width = (max_col - min_col) as usize + 1;
    let mut raw_headers: Vec<Option<String>> = vec![None; width];
    for cell in header_cells {
        if let Some(slot) = raw_headers.get_mut((cell.col - min_col) as usize) {
            *slot = Some(cell.value.display());
        }
    }
    let headers = unique_headers(&raw_headers);

    let records = rows
        .map(|row_cells| {
            row_cells
                .into_iter()
                .filter_map(|cell| {
                    let name = headers.get((cell.col - min_col) as usize)?;
                    Some((name.clone(), cell.value))
                })
                .collect::<Record>()
        })
        .filter(|record| !record.is_empty())
        .collect();

    DataTable::new(headers, records)
}

/// Disambiguate header names: repeats become `Name_1`, `Name_2`, ... and
/// missing names become `__EMPTY`, `__EMPTY_1`, ...
fn unique_headers(raw: &[Option<String>]) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::with_capacity(raw.len());
    let mut headers = Vec::with_capacity(raw.len());

    for name in raw {
        let base = match name {
            Some(n) if !n.is_empty() => n.clone(),
            _ => EMPTY_HEADER.to_string(),
        };
        let mut candidate = base.clone();
        let mut n = 1;
        while used.contains(&candidate) {
            candidate = format!("{base}_{n}");
            n += 1;
        }
        used.insert(candidate.clone());
        headers.push(candidate);
    }
    headers
}
