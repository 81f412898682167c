//! Viewport transform: pan + uniform zoom between logical scene space and
//! screen pixels.
//!
//! `screen = logical * scale + pan`

use crate::types::Point;

/// Uniform scale plus pan offset mapping logical coordinates to screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportTransform {
    /// Zoom scale factor (1.0 = 100%)
    pub scale: f32,
    /// Horizontal pan offset in screen pixels
    pub pan_x: f32,
    /// Vertical pan offset in screen pixels
    pub pan_y: f32,
}

impl Default for ViewportTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl ViewportTransform {
    pub const fn identity() -> Self {
        Self {
            scale: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
        }
    }

    /// Convert screen coordinates to logical scene coordinates
    pub fn to_logical(&self, screen: Point) -> Point {
        Point::new(
            (screen.x - self.pan_x) / self.scale,
            (screen.y - self.pan_y) / self.scale,
        )
    }

    /// Convert logical scene coordinates to screen coordinates
    pub fn to_screen(&self, logical: Point) -> Point {
        Point::new(
            logical.x * self.scale + self.pan_x,
            logical.y * self.scale + self.pan_y,
        )
    }

    /// Convert a screen-space distance into logical units.
    pub fn screen_delta_to_logical(&self, dx: f32, dy: f32) -> (f32, f32) {
        (dx / self.scale, dy / self.scale)
    }

    /// Logical point shown at the middle of a viewport of the given size.
    pub fn logical_center(&self, viewport_width: f32, viewport_height: f32) -> Point {
        self.to_logical(Point::new(viewport_width / 2.0, viewport_height / 2.0))
    }

    /// Transform that fits `content` into `viewport` with `padding` pixels of
    /// total margin, centered.
    ///
    /// With `never_upscale`, content smaller than the viewport stays at its
    /// native resolution. Degenerate content yields the identity transform.
    pub fn fit_to_screen(
        content_width: f32,
        content_height: f32,
        viewport_width: f32,
        viewport_height: f32,
        padding: f32,
        never_upscale: bool,
    ) -> Self {
        if content_width <= 0.0 || content_height <= 0.0 {
            return Self::identity();
        }
        let available_w = (viewport_width - padding).max(1.0);
        let available_h = (viewport_height - padding).max(1.0);
        let mut scale = (available_w / content_width).min(available_h / content_height);
        if never_upscale {
            scale = scale.min(1.0);
        }
        Self {
            scale,
            pan_x: (viewport_width - content_width * scale) / 2.0,
            pan_y: (viewport_height - content_height * scale) / 2.0,
        }
    }

    /// Multiply the scale by `factor`, clamped to `[min_zoom, max_zoom]`,
    /// keeping the logical point under `anchor` (screen) fixed.
    pub fn zoom_to_point(&mut self, factor: f32, anchor: Point, min_zoom: f32, max_zoom: f32) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let target = (self.scale * factor).clamp(min_zoom, max_zoom);
        self.set_zoom_at(target, anchor);
    }

    /// Set an absolute scale, keeping the logical point under `anchor` fixed.
    pub fn set_zoom_at(&mut self, scale: f32, anchor: Point) {
        let logical = self.to_logical(anchor);
        self.scale = scale;
        self.pan_x = anchor.x - logical.x * scale;
        self.pan_y = anchor.y - logical.y * scale;
    }

    /// Pan by a screen-space delta.
    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.pan_x += dx;
        self.pan_y += dy;
    }
}

/// Zoom factor for a wheel event: each unit of `delta_y` scales by 0.999.
pub fn wheel_zoom_factor(delta_y: f32) -> f32 {
    0.999_f32.powf(delta_y)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_round_trip() {
        let t = ViewportTransform {
            scale: 0.5,
            pan_x: 30.0,
            pan_y: -12.0,
        };
        let p = Point::new(123.0, 456.0);
        let back = t.to_logical(t.to_screen(p));
        assert!(approx(back.x, p.x) && approx(back.y, p.y));
    }

    #[test]
    fn test_fit_downscales_and_centers() {
        let t = ViewportTransform::fit_to_screen(2000.0, 1000.0, 1020.0, 800.0, 20.0, true);
        assert!(approx(t.scale, 0.5));
        assert!(approx(t.pan_x, 10.0));
        assert!(approx(t.pan_y, 150.0));
    }

    #[test]
    fn test_fit_never_upscales() {
        let t = ViewportTransform::fit_to_screen(200.0, 100.0, 1000.0, 800.0, 20.0, true);
        assert_eq!(t.scale, 1.0);
        assert!(approx(t.pan_x, 400.0));
        let free = ViewportTransform::fit_to_screen(200.0, 100.0, 1000.0, 800.0, 20.0, false);
        assert!(free.scale > 1.0);
    }

    #[test]
    fn test_fit_degenerate_content() {
        let t = ViewportTransform::fit_to_screen(0.0, 100.0, 1000.0, 800.0, 20.0, true);
        assert_eq!(t, ViewportTransform::identity());
    }

    #[test]
    fn test_zoom_keeps_anchor_fixed() {
        let mut t = ViewportTransform {
            scale: 1.0,
            pan_x: 50.0,
            pan_y: 20.0,
        };
        let anchor = Point::new(300.0, 200.0);
        let before = t.to_logical(anchor);
        t.zoom_to_point(2.0, anchor, 0.1, 5.0);
        let after = t.to_logical(anchor);
        assert!(approx(t.scale, 2.0));
        assert!(approx(before.x, after.x) && approx(before.y, after.y));
    }

    #[test]
    fn test_wheel_factor() {
        assert!(approx(wheel_zoom_factor(0.0), 1.0));
        assert!(wheel_zoom_factor(100.0) < 1.0);
        assert!(wheel_zoom_factor(-100.0) > 1.0);
    }
}
