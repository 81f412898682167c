//! Tests for reading data tables from XLSX and CSV/TSV files.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod common;
mod fixtures;

use certgen::error::CertgenError;
use certgen::parser::{detect_format, parse_data_table, DataFormat};
use certgen::types::CellValue;
use common::csv_table;
use fixtures::{Cell, XlsxBuilder};
use test_case::test_case;

#[test]
fn test_xlsx_and_csv_yield_identical_tables() {
    let xlsx = XlsxBuilder::new()
        .add_sheet("Sheet1")
        .add_row(1, &["Name", "Score", "Passed"])
        .add_cell("A2", "Ada")
        .add_cell("B2", 95)
        .add_cell("C2", true)
        .add_cell("A3", "Grace")
        .add_cell("B3", 88.5)
        .add_cell("C3", false)
        .build();

    let from_xlsx = parse_data_table(&xlsx).unwrap();
    let from_csv = csv_table("Name,Score,Passed\nAda,95,TRUE\nGrace,88.5,FALSE\n");

    assert_eq!(from_xlsx, from_csv);
    assert_eq!(from_xlsx.headers(), ["Name", "Score", "Passed"]);
    assert_eq!(from_xlsx.rows()[0].display("Score"), "95");
    assert_eq!(from_xlsx.rows()[1].display("Passed"), "false");
}

#[test]
fn test_inline_and_shared_strings_decode() {
    let xlsx = XlsxBuilder::new()
        .add_sheet("Sheet1")
        .add_cell("A1", "Name")
        .add_cell("B1", Cell::Inline("Course".into()))
        .add_cell("A2", Cell::Inline("Ada & Co".into()))
        .add_cell("B2", "Math <advanced>")
        .build();

    let table = parse_data_table(&xlsx).unwrap();
    assert_eq!(table.headers(), ["Name", "Course"]);
    assert_eq!(table.rows()[0].display("Name"), "Ada & Co");
    assert_eq!(table.rows()[0].display("Course"), "Math <advanced>");
}

#[test]
fn test_blank_rows_are_skipped() {
    let xlsx = XlsxBuilder::new()
        .add_sheet("Sheet1")
        .add_cell("A1", "Name")
        .add_cell("A2", "Ada")
        .add_cell("A5", "Grace")
        .build();
    let table = parse_data_table(&xlsx).unwrap();
    assert_eq!(table.len(), 2);

    let csv = csv_table("Name\nAda\n\n,\nGrace\n");
    assert_eq!(csv.len(), 2);
    assert_eq!(csv.rows()[1].display("Name"), "Grace");
}

#[test]
fn test_duplicate_and_missing_headers_are_disambiguated() {
    let xlsx = XlsxBuilder::new()
        .add_sheet("Sheet1")
        .add_cell("A1", "Name")
        .add_cell("C1", "Name")
        .add_cell("A2", "Ada")
        .add_cell("B2", "x")
        .add_cell("C2", "Lovelace")
        .build();

    let table = parse_data_table(&xlsx).unwrap();
    assert_eq!(table.headers(), ["Name", "__EMPTY", "Name_1"]);
    assert_eq!(table.rows()[0].display("Name_1"), "Lovelace");
    assert_eq!(table.rows()[0].display("__EMPTY"), "x");
}

#[test]
fn test_error_cells_read_as_empty() {
    let xlsx = XlsxBuilder::new()
        .add_sheet("Sheet1")
        .add_row(1, &["Name", "Ratio"])
        .add_cell("A2", "Ada")
        .add_cell("B2", Cell::Error("#DIV/0!".into()))
        .build();

    let table = parse_data_table(&xlsx).unwrap();
    let row = &table.rows()[0];
    assert!(!row.contains("Ratio"));
    assert_eq!(row.display("Ratio"), "");
}

#[test]
fn test_only_first_sheet_is_read() {
    let xlsx = XlsxBuilder::new()
        .add_sheet("People")
        .add_row(1, &["Name"])
        .add_row(2, &["Ada"])
        .add_sheet("Other")
        .add_row(1, &["Ignored"])
        .add_row(2, &["x"])
        .build();

    let table = parse_data_table(&xlsx).unwrap();
    assert_eq!(table.headers(), ["Name"]);
    assert_eq!(table.len(), 1);
}

#[test]
fn test_columns_follow_first_record() {
    // `City` is missing from the first record, so it is not offered as a field.
    let table = csv_table("Name,City\nAda,\nGrace,Paris\n");
    assert_eq!(table.headers(), ["Name", "City"]);
    assert_eq!(table.columns(), ["Name"]);
}

#[test]
fn test_quoted_csv_fields() {
    let table = csv_table("Name,Note\n\"Lovelace, Ada\",\"said \"\"hi\"\"\nthen left\"\n");
    let row = &table.rows()[0];
    assert_eq!(row.display("Name"), "Lovelace, Ada");
    assert_eq!(row.display("Note"), "said \"hi\"\nthen left");
}

#[test_case("Name\tScore\nAda\t7\n" ; "tab separated")]
#[test_case("\u{feff}Name,Score\r\nAda,7\r\n" ; "bom and crlf")]
fn test_delimited_variants(text: &str) {
    let table = csv_table(text);
    assert_eq!(table.headers(), ["Name", "Score"]);
    assert_eq!(table.rows()[0].get("Score"), Some(&CellValue::Number(7.0)));
}

#[test]
fn test_format_detection() {
    let xlsx = XlsxBuilder::new()
        .add_sheet("Sheet1")
        .add_cell("A1", "x")
        .build();
    assert_eq!(detect_format(&xlsx), DataFormat::Xlsx);
    assert_eq!(detect_format(b"a,b\n"), DataFormat::Delimited);
}

#[test]
fn test_corrupt_xlsx_is_an_error() {
    let err = parse_data_table(b"PK\x03\x04definitely not a zip").unwrap_err();
    assert!(matches!(err, CertgenError::Zip(_)));
}

#[test]
fn test_table_serializes_rows_in_header_order() {
    let table = csv_table("B,A\n2,1\n");
    let json = serde_json::to_string(&table).unwrap();
    assert_eq!(
        json,
        r#"{"headers":["B","A"],"columns":["B","A"],"rows":[{"B":2.0,"A":1.0}]}"#
    );
}
