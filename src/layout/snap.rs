//! Drag snapping: template midline first, then the grid.

use crate::config::EditorConfig;
use crate::types::{Point, Size, TextAnchor};

/// Snapping parameters, all in logical units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapRules {
    /// Master switch; follows the grid toggle.
    pub enabled: bool,
    pub grid_size: f32,
    pub snap_threshold: f32,
    pub center_snap: bool,
}

impl SnapRules {
    pub fn from_config(config: &EditorConfig, enabled: bool) -> Self {
        Self {
            enabled,
            grid_size: config.grid_size,
            snap_threshold: config.snap_threshold,
            center_snap: config.center_snap,
        }
    }
}

/// Nearest multiple of `grid`, ties rounding toward +infinity.
pub fn snap_to_grid(value: f32, grid: f32) -> f32 {
    if grid <= 0.0 {
        return value;
    }
    (value / grid + 0.5).floor() * grid
}

/// Correct a proposed element position.
///
/// `proposed` is the element position interpreted through `anchor`; `size`
/// is its extent. With snapping disabled the proposal is returned as-is.
pub fn snap(
    proposed: Point,
    size: Size,
    anchor: TextAnchor,
    canvas_width: f32,
    rules: &SnapRules,
) -> Point {
    if !rules.enabled {
        return proposed;
    }

    let y = snap_to_grid(proposed.y, rules.grid_size);

    if rules.center_snap {
        let midline = canvas_width / 2.0;
        let center_x = anchor.center_x(proposed.x, size.width);
        if (center_x - midline).abs() < rules.snap_threshold {
            return Point::new(anchor.x_for_center(midline, size.width), y);
        }
    }

    Point::new(snap_to_grid(proposed.x, rules.grid_size), y)
}
