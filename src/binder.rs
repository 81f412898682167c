//! Binding spreadsheet rows to placeholder text.

use crate::types::{Placeholder, Record};

pub use crate::types::unbound_label;

/// Set every placeholder's text from `row`, keyed by its column name.
///
/// A column missing from the row binds to the empty string.
pub fn bind_row<'a, I>(placeholders: I, row: &Record)
where
    I: IntoIterator<Item = &'a mut Placeholder>,
{
    for placeholder in placeholders {
        let text = row.display(&placeholder.column);
        placeholder.set_text(text);
    }
}

/// Put every placeholder back to its `{column}` label.
pub fn reset_labels<'a, I>(placeholders: I)
where
    I: IntoIterator<Item = &'a mut Placeholder>,
{
    for placeholder in placeholders {
        let label = unbound_label(&placeholder.column);
        placeholder.set_text(label);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CellValue, PlaceholderId, PlaceholderStyle, Point};

    fn field(id: u32, column: &str) -> Placeholder {
        Placeholder::new(
            PlaceholderId(id),
            column,
            Point::new(0.0, 0.0),
            PlaceholderStyle::default(),
        )
    }

    #[test]
    fn test_bind_and_reset() {
        let mut fields = vec![field(1, "Name"), field(2, "Score"), field(3, "Missing")];
        let row: Record = [
            ("Name", CellValue::Text("Ada".into())),
            ("Score", CellValue::Number(97.0)),
        ]
        .into_iter()
        .collect();

        bind_row(fields.iter_mut(), &row);
        let texts: Vec<&str> = fields.iter().map(Placeholder::text).collect();
        assert_eq!(texts, ["Ada", "97", ""]);

        reset_labels(fields.iter_mut());
        let texts: Vec<&str> = fields.iter().map(Placeholder::text).collect();
        assert_eq!(texts, ["{Name}", "{Score}", "{Missing}"]);
    }

    #[test]
    fn test_duplicate_columns_bind_identically() {
        let mut fields = vec![field(1, "Name"), field(2, "Name")];
        let row: Record = [("Name", CellValue::Bool(true))].into_iter().collect();
        bind_row(fields.iter_mut(), &row);
        assert!(fields.iter().all(|f| f.text() == "true"));
    }
}
