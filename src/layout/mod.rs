//! Geometry for the editor canvas.
//!
//! This module handles:
//! - Mapping between screen pixels and logical scene units (pan/zoom)
//! - Snapping dragged placeholders to the grid and the template midline
//! - Generating grid and center guide lines

mod grid;
mod snap;
mod viewport;

pub use grid::build_guides;
pub use snap::{snap, snap_to_grid, SnapRules};
pub use viewport::{wheel_zoom_factor, ViewportTransform};
