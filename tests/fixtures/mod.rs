//! Test fixtures for generating valid XLSX files in memory.
//!
//! # Example
//!
//! ```rust,ignore
//! use fixtures::{Cell, XlsxBuilder};
//!
//! let xlsx = XlsxBuilder::new()
//!     .add_sheet("Sheet1")
//!     .add_cell("A1", "Name")
//!     .add_cell("A2", Cell::Inline("Ada".into()))
//!     .add_cell("B2", 42)
//!     .build();
//!
//! let table = certgen::parser::parse_data_table(&xlsx).unwrap();
//! ```
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic,
    clippy::cast_possible_truncation,
    clippy::cast_lossless
)]

use std::collections::BTreeMap;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::ZipWriter;

/// A cell value written into a fixture sheet.
#[derive(Debug, Clone)]
pub enum Cell {
    /// Shared string (`t="s"`).
    Shared(String),
    /// Inline string (`t="inlineStr"`).
    Inline(String),
    Number(f64),
    Bool(bool),
    /// Error value such as `#DIV/0!` (`t="e"`).
    Error(String),
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Shared(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Shared(s)
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

impl From<i32> for Cell {
    fn from(n: i32) -> Self {
        Cell::Number(f64::from(n))
    }
}

impl From<bool> for Cell {
    fn from(b: bool) -> Self {
        Cell::Bool(b)
    }
}

#[derive(Debug, Clone, Default)]
struct SheetBuilder {
    name: String,
    cells: Vec<(String, Cell)>,
}

/// Builder for complete XLSX packages.
#[derive(Debug, Clone, Default)]
pub struct XlsxBuilder {
    sheets: Vec<SheetBuilder>,
}

impl XlsxBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn add_sheet(mut self, name: &str) -> XlsxSheetAdder {
        self.sheets.push(SheetBuilder {
            name: name.to_string(),
            cells: Vec::new(),
        });
        XlsxSheetAdder { builder: self }
    }

    #[must_use]
    pub fn build(self) -> Vec<u8> {
        let cursor = Cursor::new(Vec::new());
        let mut zip = ZipWriter::new(cursor);
        let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        let mut shared_strings: Vec<String> = Vec::new();
        for sheet in &self.sheets {
            for (_, cell) in &sheet.cells {
                if let Cell::Shared(s) = cell {
                    if !shared_strings.contains(s) {
                        shared_strings.push(s.clone());
                    }
                }
            }
        }

        zip.start_file("[Content_Types].xml", options).unwrap();
        zip.write_all(generate_content_types(self.sheets.len()).as_bytes())
            .unwrap();

        zip.start_file("_rels/.rels", options).unwrap();
        zip.write_all(generate_rels().as_bytes()).unwrap();

        zip.start_file("xl/_rels/workbook.xml.rels", options).unwrap();
        zip.write_all(generate_workbook_rels(self.sheets.len()).as_bytes())
            .unwrap();

        zip.start_file("xl/workbook.xml", options).unwrap();
        zip.write_all(generate_workbook(&self.sheets).as_bytes())
            .unwrap();

        if !shared_strings.is_empty() {
            zip.start_file("xl/sharedStrings.xml", options).unwrap();
            zip.write_all(generate_shared_strings(&shared_strings).as_bytes())
                .unwrap();
        }

        for (i, sheet) in self.sheets.iter().enumerate() {
            zip.start_file(format!("xl/worksheets/sheet{}.xml", i + 1), options)
                .unwrap();
            zip.write_all(generate_sheet_xml(sheet, &shared_strings).as_bytes())
                .unwrap();
        }

        zip.finish().expect("Failed to finish ZIP").into_inner()
    }
}

/// Adds cells to the most recently added sheet.
#[derive(Debug, Clone)]
pub struct XlsxSheetAdder {
    builder: XlsxBuilder,
}

impl XlsxSheetAdder {
    #[must_use]
    pub fn add_cell<V: Into<Cell>>(mut self, cell_ref: &str, value: V) -> Self {
        if let Some(sheet) = self.builder.sheets.last_mut() {
            sheet.cells.push((cell_ref.to_string(), value.into()));
        }
        self
    }

    /// Add a row of values starting at column A.
    #[must_use]
    pub fn add_row<V: Into<Cell> + Clone>(mut self, row: u32, values: &[V]) -> Self {
        for (i, value) in values.iter().enumerate() {
            let cell_ref = format!("{}{}", col_num_to_letter(i as u32 + 1), row);
            self = self.add_cell(&cell_ref, value.clone());
        }
        self
    }

    #[must_use]
    pub fn add_sheet(self, name: &str) -> XlsxSheetAdder {
        self.builder.add_sheet(name)
    }

    #[must_use]
    pub fn build(self) -> Vec<u8> {
        self.builder.build()
    }
}

/// 1-based column number to letters (1 -> A, 27 -> AA).
pub fn col_num_to_letter(mut col: u32) -> String {
    let mut letters = String::new();
    while col > 0 {
        col -= 1;
        letters.insert(0, char::from(b'A' + (col % 26) as u8));
        col /= 26;
    }
    letters
}

fn row_of(cell_ref: &str) -> u32 {
    cell_ref
        .trim_start_matches(|c: char| c.is_ascii_alphabetic())
        .parse()
        .unwrap_or(1)
}

pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn generate_content_types(sheet_count: usize) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
    xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>"#);
    for i in 1..=sheet_count {
        xml.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{i}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
        ));
    }
    xml.push_str("</Types>");
    xml
}

fn generate_rels() -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    xml.push_str(r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>"#);
    xml.push_str("</Relationships>");
    xml
}

fn generate_workbook_rels(sheet_count: usize) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for i in 1..=sheet_count {
        xml.push_str(&format!(
            r#"<Relationship Id="rId{i}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{i}.xml"/>"#
        ));
    }
    xml.push_str(&format!(
        r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>"#,
        sheet_count + 1
    ));
    xml.push_str("</Relationships>");
    xml
}

fn generate_workbook(sheets: &[SheetBuilder]) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#);
    xml.push_str("<sheets>");
    for (i, sheet) in sheets.iter().enumerate() {
        xml.push_str(&format!(
            r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
            escape_xml(&sheet.name),
            i + 1,
            i + 1
        ));
    }
    xml.push_str("</sheets></workbook>");
    xml
}

fn generate_shared_strings(strings: &[String]) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(&format!(
        r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">"#,
        strings.len()
    ));
    for s in strings {
        xml.push_str(&format!(
            r#"<si><t xml:space="preserve">{}</t></si>"#,
            escape_xml(s)
        ));
    }
    xml.push_str("</sst>");
    xml
}

fn generate_sheet_xml(sheet: &SheetBuilder, shared_strings: &[String]) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(
        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
    );
    xml.push_str("<sheetData>");

    let mut rows: BTreeMap<u32, Vec<&(String, Cell)>> = BTreeMap::new();
    for entry in &sheet.cells {
        rows.entry(row_of(&entry.0)).or_default().push(entry);
    }

    for (row_num, cells) in rows {
        xml.push_str(&format!(r#"<row r="{row_num}">"#));
        for (cell_ref, cell) in cells {
            match cell {
                Cell::Shared(s) => {
                    let idx = shared_strings.iter().position(|x| x == s).unwrap();
                    xml.push_str(&format!(r#"<c r="{cell_ref}" t="s"><v>{idx}</v></c>"#));
                }
                Cell::Inline(s) => {
                    xml.push_str(&format!(
                        r#"<c r="{cell_ref}" t="inlineStr"><is><t>{}</t></is></c>"#,
                        escape_xml(s)
                    ));
                }
                Cell::Number(n) => {
                    xml.push_str(&format!(r#"<c r="{cell_ref}"><v>{n}</v></c>"#));
                }
                Cell::Bool(b) => {
                    xml.push_str(&format!(
                        r#"<c r="{cell_ref}" t="b"><v>{}</v></c>"#,
                        u8::from(*b)
                    ));
                }
                Cell::Error(e) => {
                    xml.push_str(&format!(
                        r#"<c r="{cell_ref}" t="e"><v>{}</v></c>"#,
                        escape_xml(e)
                    ));
                }
            }
        }
        xml.push_str("</row>");
    }

    xml.push_str("</sheetData></worksheet>");
    xml
}
