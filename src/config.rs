//! Editor configuration.
//!
//! Every field has a default, so partial JSON objects are accepted:
//!
//! ```json
//! { "gridSize": 20, "snapThreshold": 10, "defaultFontFamily": "Georgia" }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CertgenError, Result};
use crate::render::colors::parse_color;
use crate::types::PlaceholderStyle;

/// Tunables for snapping, viewport fitting, zoom limits and new placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Grid cell size in logical units.
    pub grid_size: f32,
    /// Whether the grid (and grid snapping) starts enabled.
    pub grid_enabled: bool,
    /// Distance from the template midline within which center snap fires.
    pub snap_threshold: f32,
    /// Enable horizontal center snapping.
    pub center_snap: bool,
    /// Total padding (screen pixels) left around the template when fitting.
    pub fit_padding: f32,
    /// Never scale the template above its native resolution when fitting.
    pub never_upscale: bool,
    pub min_zoom: f32,
    pub max_zoom: f32,
    /// Pointer travel (screen pixels) before an empty-canvas press becomes a pan.
    pub pan_threshold: f32,
    pub default_font_family: String,
    /// On-screen font size of a new placeholder; divided by the zoom.
    pub default_font_size: f32,
    pub default_fill: String,
    /// Allow more than one placeholder per column.
    pub allow_duplicate_fields: bool,
    /// Name of the downloaded archive.
    pub archive_name: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            grid_size: 40.0,
            grid_enabled: true,
            snap_threshold: 15.0,
            center_snap: true,
            fit_padding: 20.0,
            never_upscale: true,
            min_zoom: 0.1,
            max_zoom: 5.0,
            pan_threshold: 10.0,
            default_font_family: "Arial".to_string(),
            default_font_size: 40.0,
            default_fill: "#000000".to_string(),
            allow_duplicate_fields: true,
            archive_name: "certificates.zip".to_string(),
        }
    }
}

impl EditorConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would break snapping or the viewport math.
    pub fn validate(&self) -> Result<()> {
        if !(self.grid_size.is_finite() && self.grid_size > 0.0) {
            return Err(CertgenError::Config(format!(
                "gridSize must be positive, got {}",
                self.grid_size
            )));
        }
        if !(self.snap_threshold.is_finite() && self.snap_threshold >= 0.0) {
            return Err(CertgenError::Config(
                "snapThreshold must be zero or positive".into(),
            ));
        }
        if !(self.min_zoom > 0.0 && self.min_zoom <= self.max_zoom && self.max_zoom.is_finite()) {
            return Err(CertgenError::Config(format!(
                "zoom range [{}, {}] is invalid",
                self.min_zoom, self.max_zoom
            )));
        }
        if !(self.fit_padding.is_finite() && self.fit_padding >= 0.0) {
            return Err(CertgenError::Config("fitPadding must not be negative".into()));
        }
        if !(self.default_font_size.is_finite() && self.default_font_size > 0.0) {
            return Err(CertgenError::Config(
                "defaultFontSize must be positive".into(),
            ));
        }
        if parse_color(&self.default_fill).is_none() {
            return Err(CertgenError::Config(format!(
                "defaultFill is not a color: {}",
                self.default_fill
            )));
        }
        if self.archive_name.trim().is_empty() {
            return Err(CertgenError::Config("archiveName must not be empty".into()));
        }
        Ok(())
    }

    /// Style for a placeholder created at `zoom`, keeping the on-screen size
    /// constant regardless of the current zoom level.
    pub fn placeholder_style(&self, zoom: f32) -> PlaceholderStyle {
        let zoom = if zoom > 0.0 { zoom } else { 1.0 };
        PlaceholderStyle {
            font_family: self.default_font_family.clone(),
            font_size: self.default_font_size / zoom,
            fill: parse_color(&self.default_fill).unwrap_or_else(|| "#000000".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp, clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_defaults_match_editor_constants() {
        let c = EditorConfig::default();
        assert_eq!(c.grid_size, 40.0);
        assert_eq!(c.snap_threshold, 15.0);
        assert_eq!((c.min_zoom, c.max_zoom), (0.1, 5.0));
        assert_eq!(c.archive_name, "certificates.zip");
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let c = EditorConfig::from_json(r#"{"gridSize": 20, "centerSnap": false}"#).unwrap();
        assert_eq!(c.grid_size, 20.0);
        assert!(!c.center_snap);
        assert_eq!(c.fit_padding, 20.0);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(EditorConfig::from_json(r#"{"gridSize": 0}"#).is_err());
        assert!(EditorConfig::from_json(r#"{"minZoom": 2, "maxZoom": 1}"#).is_err());
        assert!(EditorConfig::from_json(r#"{"defaultFill": "chartreuse-ish"}"#).is_err());
    }

    #[test]
    fn test_placeholder_style_scales_with_zoom() {
        let c = EditorConfig::default();
        assert_eq!(c.placeholder_style(2.0).font_size, 20.0);
        assert_eq!(c.placeholder_style(0.5).font_size, 80.0);
        assert_eq!(c.placeholder_style(1.0).fill, "#000000");
    }
}
