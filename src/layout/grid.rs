//! Guide line generation over the template extent.

use crate::types::{GuideKind, GuideLine, Point};

/// Build all guides for a `width` x `height` template.
///
/// Grid lines are emitted only when `grid_enabled`: verticals at `i * cell`
/// for `i` in `0..ceil(width / cell)`, horizontals likewise. The center guide
/// is always emitted.
pub fn build_guides(width: f32, height: f32, cell: f32, grid_enabled: bool) -> Vec<GuideLine> {
    let mut guides = Vec::new();
    if width <= 0.0 || height <= 0.0 {
        return guides;
    }

    if grid_enabled && cell > 0.0 {
        for x in grid_positions(width, cell) {
            guides.push(GuideLine {
                kind: GuideKind::Vertical,
                from: Point::new(x, 0.0),
                to: Point::new(x, height),
            });
        }
        for y in grid_positions(height, cell) {
            guides.push(GuideLine {
                kind: GuideKind::Horizontal,
                from: Point::new(0.0, y),
                to: Point::new(width, y),
            });
        }
    }

    let mid = width / 2.0;
    guides.push(GuideLine {
        kind: GuideKind::Center,
        from: Point::new(mid, 0.0),
        to: Point::new(mid, height),
    });
    guides
}

/// Multiples of `cell` strictly below `extent`.
#[allow(clippy::cast_precision_loss)]
fn grid_positions(extent: f32, cell: f32) -> impl Iterator<Item = f32> {
    (0u32..)
        .map(move |i| i as f32 * cell)
        .take_while(move |&v| v < extent)
}
