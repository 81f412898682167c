//! Editor controller.
//!
//! `Editor` turns user commands (upload template, upload data, add field,
//! toggle grid, delete, restyle, preview, export, pointer gestures) into
//! typed [`SceneSession`] operations. It holds no UI handles, so the browser
//! viewer and the tests drive it the same way.

mod gesture;

pub use gesture::{Gesture, GestureTracker, PointerOutcome};

use crate::config::EditorConfig;
use crate::error::{CertgenError, Result};
use crate::export::{self, ExportOptions, ExportProgress, Rasterizer};
use crate::parser::parse_data_table;
use crate::session::{LayerEntry, SceneSession, StyleUpdate};
use crate::types::{DataTable, PlaceholderId, PlaceholderStyle, Point, Size};

/// Scene session plus the loaded data table.
#[derive(Debug, Clone)]
pub struct Editor {
    session: SceneSession,
    table: Option<DataTable>,
    gestures: GestureTracker,
}

impl Editor {
    pub fn new(config: EditorConfig, viewport_width: f32, viewport_height: f32) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            session: SceneSession::new(config, viewport_width, viewport_height),
            table: None,
            gestures: GestureTracker::new(),
        })
    }

    pub fn session(&self) -> &SceneSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SceneSession {
        &mut self.session
    }

    pub fn table(&self) -> Option<&DataTable> {
        self.table.as_ref()
    }

    pub fn set_config(&mut self, config: EditorConfig) -> Result<()> {
        self.session.set_config(config)
    }

    // ------------------------------------------------------------------
    // Uploads
    // ------------------------------------------------------------------

    pub fn upload_template(&mut self, width: f32, height: f32) -> Result<()> {
        self.gestures = GestureTracker::new();
        self.session.load_template(width, height)
    }

    /// Parse and keep a data file. A file that fails to parse leaves the
    /// previous table in place.
    pub fn upload_data(&mut self, bytes: &[u8]) -> Result<&DataTable> {
        let table = parse_data_table(bytes)?;
        tracing::info!(
            columns = table.headers().len(),
            rows = table.len(),
            "data loaded"
        );
        Ok(self.table.insert(table))
    }

    /// Replace the data table with one built elsewhere.
    pub fn set_table(&mut self, table: DataTable) {
        self.table = Some(table);
    }

    /// Column names offered as "add field" buttons.
    pub fn columns(&self) -> Vec<String> {
        self.table.as_ref().map(DataTable::columns).unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Scene commands
    // ------------------------------------------------------------------

    pub fn add_field(&mut self, column: &str) -> Result<PlaceholderId> {
        self.session.add_placeholder(column)
    }

    pub fn toggle_grid(&mut self, enabled: bool) -> Result<()> {
        self.session.toggle_grid(enabled)
    }

    pub fn delete_selected(&mut self) -> Result<Option<PlaceholderId>> {
        self.session.remove_selected()
    }

    /// Restyle the selected placeholder. Returns `false` without a selection.
    pub fn edit_selected(&mut self, update: StyleUpdate) -> Result<bool> {
        match self.session.selection() {
            Some(id) => {
                self.session.set_placeholder_style(id, update)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Style shown in the properties panel.
    pub fn selected_style(&self) -> Option<&PlaceholderStyle> {
        self.session.selected().map(|p| &p.style)
    }

    pub fn select_layer(&mut self, id: Option<PlaceholderId>) -> Result<()> {
        self.session.set_selection(id)
    }

    pub fn layers(&self) -> Vec<LayerEntry> {
        self.session.layers()
    }

    /// Show the first record's values in every placeholder.
    pub fn preview_first_row(&mut self) -> Result<()> {
        let table = self.table.as_ref().ok_or(CertgenError::NoData)?;
        let row = table.first_row().ok_or(CertgenError::EmptyDataTable)?;
        self.session.bind_row(row);
        Ok(())
    }

    /// Measure every placeholder's text with `measure` and store the extents
    /// used for hit testing and center snapping.
    pub fn refresh_extents<M>(&mut self, mut measure: M)
    where
        M: FnMut(&str, &PlaceholderStyle) -> Size,
    {
        for placeholder in self.session.placeholders_mut() {
            let extent = measure(placeholder.text(), &placeholder.style);
            placeholder.set_extent(extent);
        }
    }

    // ------------------------------------------------------------------
    // Export
    // ------------------------------------------------------------------

    /// Archive entry names for the loaded table.
    pub fn filenames(&self, pattern: &str) -> Result<Vec<String>> {
        let table = self.table.as_ref().ok_or(CertgenError::NoData)?;
        Ok(export::preview_filenames(table, pattern))
    }

    /// Render every record and pack the images into a zip archive.
    pub async fn export<R, F>(
        &mut self,
        pattern: &str,
        rasterizer: &mut R,
        options: &ExportOptions,
        on_progress: F,
    ) -> Result<Vec<u8>>
    where
        R: Rasterizer,
        F: FnMut(ExportProgress<'_>),
    {
        let table = self.table.as_ref().ok_or(CertgenError::NoData)?;
        self.gestures = GestureTracker::new();
        export::export_archive(&mut self.session, table, pattern, rasterizer, options, on_progress)
            .await
    }

    // ------------------------------------------------------------------
    // View
    // ------------------------------------------------------------------

    pub fn zoom_by(&mut self, factor: f32) {
        self.session.zoom_by(factor);
    }

    pub fn reset_zoom(&mut self) {
        self.session.reset_zoom();
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.session.resize_viewport(width, height);
    }

    // ------------------------------------------------------------------
    // Pointer input (screen pixels)
    // ------------------------------------------------------------------

    pub fn gesture(&self) -> Gesture {
        self.gestures.state()
    }

    pub fn pointer_down(&mut self, at: Point) -> Result<PointerOutcome> {
        self.gestures.pointer_down(&mut self.session, at)
    }

    pub fn pointer_move(&mut self, at: Point) -> Result<PointerOutcome> {
        self.gestures.pointer_move(&mut self.session, at)
    }

    pub fn pointer_up(&mut self) -> PointerOutcome {
        self.gestures.pointer_up(&mut self.session)
    }

    pub fn wheel(&mut self, delta_y: f32, at: Point) -> PointerOutcome {
        self.gestures.wheel(&mut self.session, delta_y, at)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::float_cmp)]
    use super::*;

    const CSV: &[u8] = b"Name,Course\nAda,Math\nGrace,Navy\n";

    fn editor() -> Editor {
        let mut e = Editor::new(EditorConfig::default(), 820.0, 620.0).unwrap();
        e.upload_template(800.0, 600.0).unwrap();
        e
    }

    #[test]
    fn test_preview_requires_data() {
        let mut e = editor();
        assert!(matches!(e.preview_first_row(), Err(CertgenError::NoData)));
        e.upload_data(b"Name,Course\n").unwrap();
        assert!(matches!(
            e.preview_first_row(),
            Err(CertgenError::EmptyDataTable)
        ));
    }

    #[test]
    fn test_preview_binds_first_row() {
        let mut e = editor();
        e.upload_data(CSV).unwrap();
        let id = e.add_field("Name").unwrap();
        e.add_field("Missing").unwrap();
        e.preview_first_row().unwrap();
        assert_eq!(e.session().placeholder(id).unwrap().text(), "Ada");
        let texts: Vec<String> = e.layers().into_iter().map(|l| l.text).collect();
        assert_eq!(texts, vec!["Ada".to_string(), String::new()]);
    }

    #[test]
    fn test_bad_upload_keeps_previous_table() {
        let mut e = editor();
        e.upload_data(CSV).unwrap();
        assert!(e.upload_data(b"PK\x03\x04not a zip").is_err());
        assert_eq!(e.columns(), vec!["Name".to_string(), "Course".to_string()]);
    }

    #[test]
    fn test_edit_without_selection_is_noop() {
        let mut e = editor();
        let update = StyleUpdate {
            font_size: Some(12.0),
            ..StyleUpdate::default()
        };
        assert!(!e.edit_selected(update.clone()).unwrap());
        let id = e.add_field("Name").unwrap();
        e.select_layer(Some(id)).unwrap();
        assert!(e.edit_selected(update).unwrap());
        assert_eq!(e.selected_style().unwrap().font_size, 12.0);
    }

    #[test]
    fn test_delete_selected_clears_selection() {
        let mut e = editor();
        let id = e.add_field("Name").unwrap();
        e.select_layer(Some(id)).unwrap();
        assert_eq!(e.delete_selected().unwrap(), Some(id));
        assert_eq!(e.session().selection(), None);
        assert_eq!(e.delete_selected().unwrap(), None);
    }

    #[test]
    fn test_refresh_extents_feeds_hit_testing() {
        let mut e = editor();
        let id = e.add_field("Name").unwrap();
        e.refresh_extents(|_, _| Size::new(200.0, 50.0));
        // centered at (400, 300) logical, pan (10, 10) at zoom 1
        assert_eq!(e.session().hit_test(Point::new(505.0, 310.0)), Some(id));
        assert_eq!(e.session().hit_test(Point::new(520.0, 310.0)), None);
    }

    #[test]
    fn test_filenames_need_data() {
        let mut e = editor();
        assert!(matches!(e.filenames(""), Err(CertgenError::NoData)));
        e.upload_data(CSV).unwrap();
        assert_eq!(
            e.filenames("").unwrap(),
            vec!["Ada_Certificate.png", "Grace_Certificate.png"]
        );
    }
}
