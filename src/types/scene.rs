//! Scene elements: placeholders bound to data columns and grid guides.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Point, Rect, Size};

/// fabric-style line height multiplier used to estimate text extents.
const LINE_HEIGHT: f32 = 1.16;
/// Average glyph advance as a fraction of the font size.
const AVG_ADVANCE: f32 = 0.6;

/// Identity of a placeholder within one session. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaceholderId(pub u32);

impl fmt::Display for PlaceholderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which point of the text box the placeholder position refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextAnchor {
    /// Position is the center of the text box (text centered on it).
    #[default]
    Center,
    /// Position is the top-left corner (text left-aligned).
    TopLeft,
}

impl TextAnchor {
    /// Top-left corner of a box of `size` placed at `position`.
    pub fn top_left(self, position: Point, size: Size) -> Point {
        match self {
            Self::Center => Point::new(
                position.x - size.width / 2.0,
                position.y - size.height / 2.0,
            ),
            Self::TopLeft => position,
        }
    }

    /// Horizontal center of a box of `width` whose position is `x`.
    pub fn center_x(self, x: f32, width: f32) -> f32 {
        match self {
            Self::Center => x,
            Self::TopLeft => x + width / 2.0,
        }
    }

    /// Position `x` that puts the box center at `center_x`.
    pub fn x_for_center(self, center_x: f32, width: f32) -> f32 {
        match self {
            Self::Center => center_x,
            Self::TopLeft => center_x - width / 2.0,
        }
    }
}

/// Font and color of a placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceholderStyle {
    pub font_family: String,
    pub font_size: f32,
    /// CSS hex color, normalized to `#RRGGBB`.
    pub fill: String,
}

impl PlaceholderStyle {
    /// Canvas 2D font shorthand, e.g. `40px Arial`.
    pub fn css_font(&self) -> String {
        format!("{}px {}", self.font_size, self.font_family)
    }
}

impl Default for PlaceholderStyle {
    fn default() -> Self {
        Self {
            font_family: "Arial".to_string(),
            font_size: 40.0,
            fill: "#000000".to_string(),
        }
    }
}

/// A text element bound to a data column.
#[derive(Debug, Clone, PartialEq)]
pub struct Placeholder {
    pub id: PlaceholderId,
    /// Column name used as the binding key.
    pub column: String,
    /// Logical position of the anchor point.
    pub position: Point,
    pub anchor: TextAnchor,
    pub style: PlaceholderStyle,
    text: String,
    extent: Size,
}

impl Placeholder {
    pub fn new(
        id: PlaceholderId,
        column: impl Into<String>,
        position: Point,
        style: PlaceholderStyle,
    ) -> Self {
        let column = column.into();
        let text = unbound_label(&column);
        let extent = estimate_extent(&text, style.font_size);
        Self {
            id,
            column,
            position,
            anchor: TextAnchor::Center,
            style,
            text,
            extent,
        }
    }

    /// Currently displayed text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the displayed text. The extent falls back to an estimate until
    /// the UI layer reports a measurement.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.extent = estimate_extent(&self.text, self.style.font_size);
    }

    /// Size of the text box in logical units.
    pub fn extent(&self) -> Size {
        self.extent
    }

    pub fn set_extent(&mut self, extent: Size) {
        self.extent = extent;
    }

    /// Re-estimate the extent after a style change.
    pub(crate) fn refresh_extent(&mut self) {
        self.extent = estimate_extent(&self.text, self.style.font_size);
    }

    /// Logical bounding box.
    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.anchor.top_left(self.position, self.extent), self.extent)
    }
}

/// Label shown for a placeholder before any data is bound: `{Column}`.
pub fn unbound_label(column: &str) -> String {
    format!("{{{column}}}")
}

/// Rough text box size for hit testing before a real measurement exists.
#[allow(clippy::cast_precision_loss)]
pub fn estimate_extent(text: &str, font_size: f32) -> Size {
    let chars = text.chars().count().max(1) as f32;
    Size::new(chars * font_size * AVG_ADVANCE, font_size * LINE_HEIGHT)
}

/// Orientation of a guide line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuideKind {
    /// Grid column line.
    Vertical,
    /// Grid row line.
    Horizontal,
    /// Midline of the template, present whenever a template is loaded.
    Center,
}

/// A non-interactive guide line in logical space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuideLine {
    pub kind: GuideKind,
    pub from: Point,
    pub to: Point,
}

/// Everything that lives on the scene above the template image.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Guide(GuideLine),
    Placeholder(Placeholder),
}

impl Element {
    pub fn as_placeholder(&self) -> Option<&Placeholder> {
        match self {
            Self::Placeholder(p) => Some(p),
            Self::Guide(_) => None,
        }
    }

    pub fn as_placeholder_mut(&mut self) -> Option<&mut Placeholder> {
        match self {
            Self::Placeholder(p) => Some(p),
            Self::Guide(_) => None,
        }
    }

    pub fn as_guide(&self) -> Option<&GuideLine> {
        match self {
            Self::Guide(g) => Some(g),
            Self::Placeholder(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_new_placeholder_shows_braced_label() {
        let p = Placeholder::new(
            PlaceholderId(1),
            "Name",
            Point::new(10.0, 20.0),
            PlaceholderStyle::default(),
        );
        assert_eq!(p.text(), "{Name}");
        assert_eq!(p.anchor, TextAnchor::Center);
    }

    #[test]
    fn test_center_anchor_bounds_surround_position() {
        let mut p = Placeholder::new(
            PlaceholderId(1),
            "Name",
            Point::new(100.0, 50.0),
            PlaceholderStyle::default(),
        );
        p.set_extent(Size::new(80.0, 20.0));
        let b = p.bounds();
        assert_eq!(b.x, 60.0);
        assert_eq!(b.y, 40.0);
        assert!(b.contains(Point::new(100.0, 50.0)));
        assert!(!b.contains(Point::new(141.0, 50.0)));
    }

    #[test]
    fn test_anchor_center_conversions() {
        assert_eq!(TextAnchor::Center.center_x(30.0, 10.0), 30.0);
        assert_eq!(TextAnchor::TopLeft.center_x(30.0, 10.0), 35.0);
        assert_eq!(TextAnchor::TopLeft.x_for_center(35.0, 10.0), 30.0);
    }

    #[test]
    fn test_css_font() {
        let style = PlaceholderStyle {
            font_family: "Georgia".into(),
            font_size: 32.0,
            fill: "#112233".into(),
        };
        assert_eq!(style.css_font(), "32px Georgia");
    }
}
