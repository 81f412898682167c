//! End-to-end editor workflows: upload, place, preview, gesture, export.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod common;
mod fixtures;

use std::io::Cursor;

use certgen::config::EditorConfig;
use certgen::editor::{Editor, Gesture};
use certgen::error::CertgenError;
use certgen::export::ExportOptions;
use certgen::session::StyleUpdate;
use certgen::types::{Point, Size};
use common::TextRasterizer;
use fixtures::XlsxBuilder;
use zip::ZipArchive;

fn roster_xlsx() -> Vec<u8> {
    XlsxBuilder::new()
        .add_sheet("Roster")
        .add_row(1, &["Name", "Course"])
        .add_row(2, &["Alice", "Math"])
        .add_row(3, &["Bob", "Art"])
        .add_row(4, &["Cara", "Music"])
        .build()
}

/// Editor with an 800x600 template shown at zoom 1, pan (10, 10).
fn editor() -> Editor {
    let mut editor = Editor::new(EditorConfig::default(), 820.0, 620.0).unwrap();
    editor.upload_template(800.0, 600.0).unwrap();
    editor
}

#[test]
fn test_full_workflow_produces_archive() {
    let mut editor = editor();
    editor.upload_data(&roster_xlsx()).unwrap();
    assert_eq!(editor.columns(), ["Name", "Course"]);

    let name = editor.add_field("Name").unwrap();
    editor.add_field("Course").unwrap();
    editor.select_layer(Some(name)).unwrap();
    assert!(editor
        .edit_selected(StyleUpdate {
            font_size: Some(56.0),
            ..StyleUpdate::default()
        })
        .unwrap());
    assert_eq!(editor.selected_style().unwrap().font_size, 56.0);

    editor.preview_first_row().unwrap();
    let texts: Vec<String> = editor.layers().into_iter().map(|l| l.text).collect();
    assert_eq!(texts, ["Alice", "Math"]);

    let mut rasterizer = TextRasterizer::default();
    let mut done = Vec::new();
    let bytes = pollster::block_on(editor.export(
        "",
        &mut rasterizer,
        &ExportOptions::default(),
        |p| done.push(p.done),
    ))
    .unwrap();

    assert_eq!(done, [1, 2, 3]);
    let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let names: Vec<&str> = archive.file_names().collect();
    assert_eq!(names.len(), 3);
    assert!(names.contains(&"Bob_Certificate.png"));
    assert!(!editor.session().is_exporting());
}

#[test]
fn test_export_without_data_is_rejected() {
    let mut editor = editor();
    let err = pollster::block_on(editor.export(
        "",
        &mut TextRasterizer::default(),
        &ExportOptions::default(),
        |_| {},
    ))
    .unwrap_err();
    assert!(matches!(err, CertgenError::NoData));
    assert!(matches!(editor.filenames(""), Err(CertgenError::NoData)));
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = EditorConfig {
        grid_size: 0.0,
        ..EditorConfig::default()
    };
    assert!(matches!(
        Editor::new(config, 800.0, 600.0),
        Err(CertgenError::Config(_))
    ));
}

#[test]
fn test_pan_starts_at_threshold() {
    let mut editor = editor();
    let start = editor.session().viewport();

    editor.pointer_down(Point::new(100.0, 100.0)).unwrap();
    let outcome = editor.pointer_move(Point::new(106.0, 107.0)).unwrap();
    assert!(!outcome.redraw);
    assert_eq!(editor.session().viewport(), start);

    // distance exactly 10
    editor.pointer_move(Point::new(106.0, 108.0)).unwrap();
    assert!(matches!(editor.gesture(), Gesture::Panning { .. }));
    let view = editor.session().viewport();
    assert_eq!(view.pan_x, start.pan_x + 6.0);
    assert_eq!(view.pan_y, start.pan_y + 8.0);

    editor.pointer_move(Point::new(90.0, 108.0)).unwrap();
    assert_eq!(editor.session().viewport().pan_x, start.pan_x - 10.0);

    editor.pointer_up();
    assert_eq!(editor.gesture(), Gesture::Idle);
}

#[test]
fn test_drag_moves_hit_placeholder() {
    let mut editor = editor();
    let id = editor.add_field("Name").unwrap();
    editor.refresh_extents(|_, _| Size::new(200.0, 50.0));

    // placeholder centered at logical (400, 300) -> screen (410, 310)
    let outcome = editor.pointer_down(Point::new(480.0, 320.0)).unwrap();
    assert!(outcome.selection_changed);
    assert_eq!(editor.session().selection(), Some(id));

    editor.pointer_move(Point::new(480.0, 400.0)).unwrap();
    let p = editor.session().placeholder(id).unwrap().position;
    assert_eq!(p, Point::new(400.0, 400.0));

    let up = editor.pointer_up();
    assert!(up.selection_changed);
}

#[test]
fn test_click_outside_clears_selection() {
    let mut editor = editor();
    let id = editor.add_field("Name").unwrap();
    editor.select_layer(Some(id)).unwrap();

    let outcome = editor.pointer_down(Point::new(20.0, 20.0)).unwrap();
    assert!(outcome.selection_changed);
    assert_eq!(editor.session().selection(), None);
    assert!(!editor
        .edit_selected(StyleUpdate {
            fill: Some("#123456".into()),
            ..StyleUpdate::default()
        })
        .unwrap());
}

#[test]
fn test_wheel_zoom_is_clamped() {
    let mut editor = editor();
    let at = Point::new(300.0, 200.0);
    for _ in 0..50 {
        editor.wheel(-500.0, at);
    }
    assert_eq!(editor.session().zoom(), 5.0);
    for _ in 0..50 {
        editor.wheel(500.0, at);
    }
    assert_eq!(editor.session().zoom(), 0.1);

    editor.reset_zoom();
    assert_eq!(editor.session().zoom(), 1.0);
}

#[test]
fn test_new_template_resets_fields_but_keeps_data() {
    let mut editor = editor();
    editor.upload_data(&roster_xlsx()).unwrap();
    editor.add_field("Name").unwrap();

    editor.upload_template(1600.0, 1200.0).unwrap();

    assert!(editor.layers().is_empty());
    assert_eq!(editor.table().unwrap().len(), 3);
    assert_eq!(editor.session().zoom(), 0.5);
}
