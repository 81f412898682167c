//! Common test utilities: table and session builders plus scripted
//! rasterizers for driving exports.
#![allow(
    dead_code,
    unused_imports,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

use certgen::config::EditorConfig;
use certgen::error::{CertgenError, Result};
use certgen::export::{ExportFrame, Rasterizer};
use certgen::parser::parse_data_table;
use certgen::session::SceneSession;
use certgen::types::DataTable;

// Re-export fixtures for convenience
pub use super::fixtures::*;

/// Parse CSV text into a table, panicking on failure.
#[must_use]
pub fn csv_table(text: &str) -> DataTable {
    parse_data_table(text.as_bytes()).expect("CSV should parse")
}

/// Session with a `width` x `height` template in a viewport of the same
/// size plus the default fit padding (zoom 1, pan 10,10).
#[must_use]
pub fn loaded_session(width: f32, height: f32) -> SceneSession {
    let config = EditorConfig::default();
    let pad = config.fit_padding;
    let mut session = SceneSession::new(config, width + pad, height + pad);
    session.load_template(width, height).unwrap();
    session
}

/// Encodes each frame as the placeholder texts joined with `|`.
#[derive(Debug, Default)]
pub struct TextRasterizer {
    pub frames: Vec<usize>,
}

impl Rasterizer for TextRasterizer {
    async fn rasterize(&mut self, frame: &ExportFrame<'_>) -> Result<Vec<u8>> {
        self.frames.push(frame.row_index);
        let texts: Vec<&str> = frame.placeholders.iter().map(|p| p.text()).collect();
        Ok(texts.join("|").into_bytes())
    }
}

/// Fails on the given row and succeeds on every other.
#[derive(Debug)]
pub struct FailingRasterizer {
    pub fail_at: usize,
}

impl Rasterizer for FailingRasterizer {
    async fn rasterize(&mut self, frame: &ExportFrame<'_>) -> Result<Vec<u8>> {
        if frame.row_index == self.fail_at {
            Err(CertgenError::Render(format!("row {} failed", frame.row_index)))
        } else {
            Ok(vec![0u8; 4])
        }
    }
}
