//! Data table model: header row plus one record per output artifact.

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;

/// A non-empty cell value. Empty cells are represented by an absent key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    /// String form used for placeholder text and file names.
    ///
    /// Numbers print the way a browser's `String(n)` does: integral values
    /// carry no fractional part, `-0` prints as `0`, and magnitudes of at
    /// least `1e21` or below `1e-6` use exponent form (`1e+21`, `1.5e-7`).
    pub fn display(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => format_number(*n),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    let magnitude = n.abs();
    if magnitude >= 1e21 || magnitude < 1e-6 {
        // `{:e}` already yields the shortest digits; only the sign differs.
        let exp = format!("{n:e}");
        return match exp.split_once('e') {
            Some((mantissa, power)) if !power.starts_with('-') => format!("{mantissa}e+{power}"),
            _ => exp,
        };
    }
    n.to_string()
}

/// One data row keyed by column name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    cells: HashMap<String, CellValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, value: CellValue) {
        self.cells.insert(column.into(), value);
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells.get(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.cells.contains_key(column)
    }

    /// Display string for `column`, empty if the row has no value for it.
    pub fn display(&self, column: &str) -> String {
        self.get(column).map(CellValue::display).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }
}

impl<K: Into<String>> FromIterator<(K, CellValue)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, CellValue)>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Parsed spreadsheet: header names plus ordered records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataTable {
    headers: Vec<String>,
    rows: Vec<Record>,
}

impl DataTable {
    pub fn new(headers: Vec<String>, rows: Vec<Record>) -> Self {
        Self { headers, rows }
    }

    /// Every header cell of the first sheet row, disambiguated.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Columns offered for placement: the keys of the first record, in
    /// header order. Empty when the table has no records.
    pub fn columns(&self) -> Vec<String> {
        let Some(first) = self.rows.first() else {
            return Vec::new();
        };
        self.headers
            .iter()
            .filter(|h| first.contains(h))
            .cloned()
            .collect()
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn first_row(&self) -> Option<&Record> {
        self.rows.first()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Serializes a record as a map in header order, omitting absent cells.
struct OrderedRecord<'a> {
    headers: &'a [String],
    record: &'a Record,
}

impl Serialize for OrderedRecord<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.record.len()))?;
        for header in self.headers {
            if let Some(value) = self.record.get(header) {
                map.serialize_entry(header, value)?;
            }
        }
        map.end()
    }
}

struct OrderedRows<'a>(&'a DataTable);

impl Serialize for OrderedRows<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.rows.len()))?;
        for record in &self.0.rows {
            seq.serialize_element(&OrderedRecord {
                headers: &self.0.headers,
                record,
            })?;
        }
        seq.end()
    }
}

impl Serialize for DataTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("headers", &self.headers)?;
        map.serialize_entry("columns", &self.columns())?;
        map.serialize_entry("rows", &OrderedRows(self))?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> DataTable {
        let headers = vec!["Name".to_string(), "Score".to_string(), "Note".to_string()];
        let r1: Record = [
            ("Name", CellValue::Text("Alice".into())),
            ("Score", CellValue::Number(42.0)),
        ]
        .into_iter()
        .collect();
        let r2: Record = [
            ("Name", CellValue::Text("Bob".into())),
            ("Note", CellValue::Text("late".into())),
        ]
        .into_iter()
        .collect();
        DataTable::new(headers, vec![r1, r2])
    }

    #[test]
    fn test_columns_follow_first_record() {
        assert_eq!(table().columns(), vec!["Name", "Score"]);
        assert!(DataTable::default().columns().is_empty());
    }

    #[test]
    fn test_number_display() {
        assert_eq!(CellValue::Number(42.0).display(), "42");
        assert_eq!(CellValue::Number(3.5).display(), "3.5");
        assert_eq!(CellValue::Number(-0.0).display(), "0");
        assert_eq!(CellValue::Number(f64::INFINITY).display(), "Infinity");
        assert_eq!(CellValue::Bool(true).display(), "true");
    }

    #[test]
    fn test_number_display_switches_to_exponent_form() {
        assert_eq!(CellValue::Number(1e21).display(), "1e+21");
        assert_eq!(CellValue::Number(-2.5e22).display(), "-2.5e+22");
        assert_eq!(CellValue::Number(1e-7).display(), "1e-7");
        assert_eq!(CellValue::Number(1.5e-7).display(), "1.5e-7");
        // boundaries stay positional
        assert_eq!(CellValue::Number(0.000001).display(), "0.000001");
        assert_eq!(CellValue::Number(1e20).display(), "100000000000000000000");
    }

    #[test]
    fn test_missing_cell_displays_empty() {
        let t = table();
        let second = t.rows().get(1).map(|r| r.display("Score"));
        assert_eq!(second.as_deref(), Some(""));
    }

    #[test]
    fn test_serialize_in_header_order() {
        let json = serde_json::to_string(&table()).unwrap_or_default();
        assert_eq!(
            json,
            r#"{"headers":["Name","Score","Note"],"columns":["Name","Score"],"rows":[{"Name":"Alice","Score":42.0},{"Name":"Bob","Note":"late"}]}"#
        );
    }
}
