//! Structured error types for certgen.
//!
//! User-input errors (no template, no data, empty table) abort the requested
//! operation and leave the session untouched; the UI layer shows the message.

use crate::types::PlaceholderId;

/// All errors that can occur while editing, parsing data, or exporting.
#[derive(Debug, thiserror::Error)]
pub enum CertgenError {
    /// XML parsing error from quick-xml.
    #[error("XML parsing: {0}")]
    Xml(#[from] quick_xml::Error),

    /// ZIP archive error.
    #[error("ZIP archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error for layouts and configuration.
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed data file.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A template image without pixels.
    #[error("Template image has no pixels ({width}x{height})")]
    InvalidTemplate { width: f32, height: f32 },

    /// An operation needed a template image and none is loaded.
    #[error("Upload template first")]
    NoTemplate,

    /// An operation needed a data table and none is loaded.
    #[error("Upload data first")]
    NoData,

    /// The data table has a header but no records.
    #[error("Data table has no rows")]
    EmptyDataTable,

    /// A placeholder id that is not (or no longer) part of the scene.
    #[error("Unknown placeholder: {0}")]
    UnknownPlaceholder(PlaceholderId),

    /// A placeholder for this column already exists and duplicates are disabled.
    #[error("Field already placed: {0}")]
    DuplicateField(String),

    /// Rejected style edit (bad color, non-positive size, empty font family).
    #[error("Invalid style: {0}")]
    InvalidStyle(String),

    /// Interactive edits and a second export are refused while exporting.
    #[error("Export already in progress")]
    ExportInProgress,

    /// The export was cancelled between rows.
    #[error("Export cancelled")]
    Cancelled,

    /// Two rows produced the same archive entry name (opt-in check).
    #[error("Duplicate file name in archive: {0}")]
    DuplicateFilename(String),

    /// Rasterization error.
    #[error("Render error: {0}")]
    Render(String),

    /// Invalid editor configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CertgenError>;

impl CertgenError {
    /// True for errors caused by missing or bad user input rather than a
    /// failure inside the pipeline.
    pub fn is_user_input(&self) -> bool {
        matches!(
            self,
            Self::NoTemplate
                | Self::InvalidTemplate { .. }
                | Self::NoData
                | Self::EmptyDataTable
                | Self::DuplicateField(_)
                | Self::InvalidStyle(_)
                | Self::ExportInProgress
        )
    }
}

#[cfg(target_arch = "wasm32")]
impl From<CertgenError> for wasm_bindgen::JsValue {
    fn from(e: CertgenError) -> Self {
        wasm_bindgen::JsValue::from_str(&e.to_string())
    }
}
