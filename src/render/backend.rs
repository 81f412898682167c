//! Backend-agnostic draw list.
//!
//! The editor view and each export frame are flattened into [`DrawOp`]s in
//! paint order. Backends (Canvas 2D in the browser, a CPU raster natively)
//! only replay the list; they never look at the session directly.

use crate::error::Result;
use crate::export::ExportFrame;
use crate::layout::ViewportTransform;
use crate::session::SceneSession;
use crate::types::{GuideKind, Placeholder, PlaceholderStyle, Point, Rect, Size, TextAnchor};

use super::colors::palette;

/// Stroke width of guide lines, in screen pixels.
const GUIDE_WIDTH: f32 = 1.0;
/// Stroke width of the selection outline, in screen pixels.
const SELECTION_WIDTH: f32 = 2.0;

/// One paint operation. Coordinates are logical unless noted.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp<'a> {
    /// Fill the whole output (screen space).
    Clear { color: &'static str },
    /// The template image at the logical origin.
    Template { size: Size },
    Line {
        from: Point,
        to: Point,
        color: &'static str,
        alpha: f32,
        /// Screen pixels; backends divide by the zoom.
        width: f32,
    },
    Text {
        text: &'a str,
        position: Point,
        anchor: TextAnchor,
        style: &'a PlaceholderStyle,
    },
    /// Outline around the selected placeholder.
    Outline {
        rect: Rect,
        color: &'static str,
        width: f32,
    },
}

/// A draw list plus the transform it is drawn under.
#[derive(Debug, Clone)]
pub struct RenderParams<'a> {
    pub viewport: ViewportTransform,
    /// Output surface size in CSS pixels.
    pub output: Size,
    pub ops: Vec<DrawOp<'a>>,
}

/// Something that can replay a draw list.
pub trait RenderBackend {
    fn render(&mut self, params: &RenderParams<'_>) -> Result<()>;
}

/// Draw list for the interactive editor view.
pub fn editor_params(session: &SceneSession) -> RenderParams<'_> {
    let mut ops = vec![DrawOp::Clear {
        color: palette::BACKDROP,
    }];

    if let Some(size) = session.template() {
        ops.push(DrawOp::Template { size });

        if session.guides_visible() {
            for guide in session.guides() {
                let (color, alpha) = match guide.kind {
                    GuideKind::Center => (palette::CENTER_GUIDE, palette::CENTER_GUIDE_ALPHA),
                    GuideKind::Vertical | GuideKind::Horizontal => {
                        (palette::GUIDE, palette::GUIDE_ALPHA)
                    }
                };
                ops.push(DrawOp::Line {
                    from: guide.from,
                    to: guide.to,
                    color,
                    alpha,
                    width: GUIDE_WIDTH,
                });
            }
        }

        ops.extend(session.placeholders().map(text_op));

        if let Some(selected) = session.selected() {
            ops.push(DrawOp::Outline {
                rect: selected.bounds(),
                color: palette::SELECTION,
                width: SELECTION_WIDTH,
            });
        }
    }

    RenderParams {
        viewport: session.viewport(),
        output: session.viewport_size(),
        ops,
    }
}

/// Draw list for one export frame: template and text only.
pub fn frame_params<'a>(frame: &ExportFrame<'a>) -> RenderParams<'a> {
    let mut ops = Vec::with_capacity(frame.placeholders.len() + 1);
    ops.push(DrawOp::Template { size: frame.size });
    ops.extend(frame.placeholders.iter().copied().map(text_op));
    RenderParams {
        viewport: frame.viewport,
        output: frame.size,
        ops,
    }
}

fn text_op(p: &Placeholder) -> DrawOp<'_> {
    DrawOp::Text {
        text: p.text(),
        position: p.position,
        anchor: p.anchor,
        style: &p.style,
    }
}
