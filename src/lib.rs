//! certgen - certificate template editor for the web
//!
//! Place spreadsheet fields on an image template and batch-render one PNG per
//! data row, in the browser via WebAssembly and Canvas 2D or natively with a
//! CPU rasterizer:
//! - XLSX (first sheet) and CSV/TSV data tables
//! - Grid and center snapping, pan and zoom-to-pointer
//! - Filename patterns with `{Column}` tokens
//! - Zip archive of the rendered certificates
//!
//! # Usage (JavaScript)
//!
//! ```javascript
//! import init, { CertView } from 'certgen';
//! await init();
//! const view = new CertView(canvas, devicePixelRatio);
//! view.loadTemplate(img);
//! view.loadData(new Uint8Array(await file.arrayBuffer()));
//! view.addField("Name");
//! const zip = await view.exportAll("{Name}_Certificate");
//! ```

// Data
pub mod cell_ref;
pub mod config;
pub mod csv;
pub mod error;
pub mod parser;
pub mod types;

// Editing
pub mod binder;
pub mod editor;
pub mod layout;
pub mod session;

// Output
pub mod export;
pub mod render;

#[cfg(target_arch = "wasm32")]
pub mod viewer;

use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
pub use viewer::CertView;

pub use config::EditorConfig;
pub use editor::Editor;
pub use error::{CertgenError, Result};
pub use session::SceneSession;
pub use types::*;

/// Parse an XLSX or CSV file and return the table as a `JsValue`
/// (`{ headers, rows }`).
///
/// # Errors
/// Returns an error if the file cannot be parsed.
#[wasm_bindgen(js_name = "parseDataTable")]
pub fn parse_data_table_js(data: &[u8]) -> std::result::Result<JsValue, JsValue> {
    let table = parser::parse_data_table(data).map_err(|e| JsValue::from_str(&e.to_string()))?;

    serde_wasm_bindgen::to_value(&table)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {e}")))
}

/// Archive entry names for `pattern` applied to a data file.
///
/// # Errors
/// Returns an error if the file cannot be parsed.
#[wasm_bindgen(js_name = "previewFilenames")]
pub fn preview_filenames_js(data: &[u8], pattern: &str) -> std::result::Result<JsValue, JsValue> {
    let table = parser::parse_data_table(data).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let names = export::preview_filenames(&table, pattern);

    serde_wasm_bindgen::to_value(&names)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {e}")))
}

/// Get the library version
#[must_use]
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
