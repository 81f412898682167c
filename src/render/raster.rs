//! CPU rasterizer for native targets.
//!
//! Replays a draw list onto an RGBA buffer: the template image is composited
//! with `image`, text is laid out and rasterized with `ab_glyph`, and frames
//! are encoded as PNG.

use ab_glyph::{point, Font, FontArc, PxScale, PxScaleFont, ScaleFont};
use image::imageops::{self, FilterType};
use image::{ImageFormat, Rgba, RgbaImage};
use std::collections::HashMap;
use std::io::Cursor;

use crate::error::{CertgenError, Result};
use crate::export::{ExportFrame, Rasterizer};
use crate::layout::ViewportTransform;
use crate::types::{PlaceholderStyle, Point, Rect, Size, TextAnchor};

use super::backend::{frame_params, DrawOp, RenderBackend, RenderParams};
use super::colors::Rgb;

/// Fonts by CSS family name, with a fallback for unknown families.
#[derive(Clone)]
pub struct FontBook {
    fallback: FontArc,
    families: HashMap<String, FontArc>,
}

impl FontBook {
    pub fn new(fallback: FontArc) -> Self {
        Self {
            fallback,
            families: HashMap::new(),
        }
    }

    /// Build from TTF/OTF bytes used for every family.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Ok(Self::new(load_font(bytes)?))
    }

    /// Register a font for `family` (matched case-insensitively).
    pub fn insert_bytes(&mut self, family: &str, bytes: Vec<u8>) -> Result<()> {
        let font = load_font(bytes)?;
        self.families.insert(family.trim().to_ascii_lowercase(), font);
        Ok(())
    }

    pub fn get(&self, family: &str) -> &FontArc {
        self.families
            .get(&family.trim().to_ascii_lowercase())
            .unwrap_or(&self.fallback)
    }
}

fn load_font(bytes: Vec<u8>) -> Result<FontArc> {
    FontArc::try_from_vec(bytes).map_err(|e| CertgenError::Render(format!("invalid font: {e}")))
}

/// CSS pixel font size to an ab_glyph scale (em size, not line height).
fn px_scale(font: &FontArc, font_size: f32) -> PxScale {
    let units_per_em = font.units_per_em().unwrap_or(1000.0);
    PxScale::from(font_size * font.height_unscaled() / units_per_em)
}

/// Rasterizes export frames onto a copy of the template image.
pub struct ImageRasterizer {
    template: RgbaImage,
    fonts: FontBook,
    surface: RgbaImage,
}

impl ImageRasterizer {
    pub fn new(template: RgbaImage, fonts: FontBook) -> Self {
        Self {
            template,
            fonts,
            surface: RgbaImage::new(0, 0),
        }
    }

    /// Decode a PNG or JPEG template.
    pub fn from_template_bytes(bytes: &[u8], fonts: FontBook) -> Result<Self> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| CertgenError::Render(format!("cannot decode template: {e}")))?;
        Ok(Self::new(image.to_rgba8(), fonts))
    }

    /// Native template size in pixels.
    #[allow(clippy::cast_precision_loss)]
    pub fn template_size(&self) -> Size {
        Size::new(self.template.width() as f32, self.template.height() as f32)
    }

    /// Laid-out size of `text` in logical units.
    pub fn measure(&self, text: &str, style: &PlaceholderStyle) -> Size {
        let font = self.fonts.get(&style.font_family);
        let scaled = font.as_scaled(px_scale(font, style.font_size));
        Size::new(line_width(&scaled, text), scaled.height())
    }

    /// The most recently rendered surface.
    pub fn surface(&self) -> &RgbaImage {
        &self.surface
    }

    /// Encode the current surface as PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.surface
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| CertgenError::Render(format!("PNG encoding failed: {e}")))?;
        Ok(bytes)
    }

    fn draw_template(&mut self, viewport: &ViewportTransform) {
        let origin = viewport.to_screen(Point::new(0.0, 0.0));
        let (x, y) = (to_i64(origin.x), to_i64(origin.y));
        if is_unscaled(viewport) {
            imageops::overlay(&mut self.surface, &self.template, x, y);
        } else {
            let size = self.template_size();
            let scaled = imageops::resize(
                &self.template,
                to_px(size.width * viewport.scale).max(1),
                to_px(size.height * viewport.scale).max(1),
                FilterType::Triangle,
            );
            imageops::overlay(&mut self.surface, &scaled, x, y);
        }
    }

    fn draw_text(
        &mut self,
        text: &str,
        position: Point,
        anchor: TextAnchor,
        style: &PlaceholderStyle,
        viewport: &ViewportTransform,
    ) {
        if text.is_empty() {
            return;
        }
        let color = Rgb::from_hex(&style.fill).unwrap_or_default();
        let font = self.fonts.get(&style.font_family).clone();
        let scale = px_scale(&font, style.font_size * viewport.scale);
        let scaled = font.as_scaled(scale);
        let width = line_width(&scaled, text);

        // Canvas alignment: center/middle or left/top.
        let screen = viewport.to_screen(position);
        let (start_x, baseline_y) = match anchor {
            TextAnchor::Center => (
                screen.x - width / 2.0,
                screen.y + (scaled.ascent() + scaled.descent()) / 2.0,
            ),
            TextAnchor::TopLeft => (screen.x, screen.y + scaled.ascent()),
        };

        let mut caret = start_x;
        let mut previous = None;
        for ch in text.chars() {
            let glyph_id = font.glyph_id(ch);
            if let Some(prev) = previous {
                caret += scaled.kern(prev, glyph_id);
            }
            let glyph = glyph_id.with_scale_and_position(scale, point(caret, baseline_y));
            caret += scaled.h_advance(glyph_id);
            previous = Some(glyph_id);

            let Some(outlined) = font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            let surface = &mut self.surface;
            outlined.draw(|gx, gy, coverage| {
                let x = i64::from(gx) + to_i64(bounds.min.x);
                let y = i64::from(gy) + to_i64(bounds.min.y);
                blend_at(surface, x, y, color, coverage);
            });
        }
    }

    fn draw_line(
        &mut self,
        from: Point,
        to: Point,
        color: Rgb,
        alpha: f32,
        width: f32,
        viewport: &ViewportTransform,
    ) {
        let a = viewport.to_screen(from);
        let b = viewport.to_screen(to);
        let half = width / 2.0;
        let rect = Rect {
            x: a.x.min(b.x) - half,
            y: a.y.min(b.y) - half,
            width: (a.x - b.x).abs() + width,
            height: (a.y - b.y).abs() + width,
        };
        fill_rect(&mut self.surface, rect, color, alpha);
    }

    fn draw_outline(&mut self, rect: Rect, color: Rgb, width: f32, viewport: &ViewportTransform) {
        let tl = viewport.to_screen(Point::new(rect.x, rect.y));
        let br = viewport.to_screen(Point::new(rect.x + rect.width, rect.y + rect.height));
        let (w, h) = (br.x - tl.x, br.y - tl.y);
        let edges = [
            (tl, Size::new(w, width)),
            (Point::new(tl.x, br.y - width), Size::new(w, width)),
            (tl, Size::new(width, h)),
            (Point::new(br.x - width, tl.y), Size::new(width, h)),
        ];
        for (origin, size) in edges {
            fill_rect(&mut self.surface, Rect::from_origin_size(origin, size), color, 1.0);
        }
    }
}

impl RenderBackend for ImageRasterizer {
    fn render(&mut self, params: &RenderParams<'_>) -> Result<()> {
        let (width, height) = (to_px(params.output.width), to_px(params.output.height));
        if width == 0 || height == 0 {
            return Err(CertgenError::Render(format!(
                "cannot render a {width}x{height} surface"
            )));
        }
        self.surface = RgbaImage::new(width, height);
        let viewport = params.viewport;

        for op in &params.ops {
            match op {
                DrawOp::Clear { color } => {
                    let c = Rgb::from_hex(color).unwrap_or_default();
                    for px in self.surface.pixels_mut() {
                        *px = Rgba([c.r, c.g, c.b, 255]);
                    }
                }
                DrawOp::Template { .. } => self.draw_template(&viewport),
                DrawOp::Line { from, to, color, alpha, width } => {
                    let c = Rgb::from_hex(color).unwrap_or_default();
                    self.draw_line(*from, *to, c, *alpha, *width, &viewport);
                }
                DrawOp::Text { text, position, anchor, style } => {
                    self.draw_text(text, *position, *anchor, style, &viewport);
                }
                DrawOp::Outline { rect, color, width } => {
                    let c = Rgb::from_hex(color).unwrap_or_default();
                    self.draw_outline(*rect, c, *width, &viewport);
                }
            }
        }
        Ok(())
    }
}

impl Rasterizer for ImageRasterizer {
    async fn rasterize(&mut self, frame: &ExportFrame<'_>) -> Result<Vec<u8>> {
        self.render(&frame_params(frame))?;
        self.encode_png()
    }
}

fn line_width(scaled: &PxScaleFont<&FontArc>, text: &str) -> f32 {
    let mut width = 0.0;
    let mut previous = None;
    for ch in text.chars() {
        let id = scaled.glyph_id(ch);
        if let Some(prev) = previous {
            width += scaled.kern(prev, id);
        }
        width += scaled.h_advance(id);
        previous = Some(id);
    }
    width
}

fn is_unscaled(viewport: &ViewportTransform) -> bool {
    (viewport.scale - 1.0).abs() < f32::EPSILON
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn to_px(v: f32) -> u32 {
    if v.is_finite() {
        v.round().clamp(0.0, u32::MAX as f32) as u32
    } else {
        0
    }
}

#[allow(clippy::cast_possible_truncation)]
fn to_i64(v: f32) -> i64 {
    if v.is_finite() {
        v.round() as i64
    } else {
        0
    }
}

fn fill_rect(surface: &mut RgbaImage, rect: Rect, color: Rgb, alpha: f32) {
    let x0 = to_i64(rect.x);
    let y0 = to_i64(rect.y);
    let x1 = to_i64(rect.x + rect.width).max(x0 + 1);
    let y1 = to_i64(rect.y + rect.height).max(y0 + 1);
    for y in y0..y1 {
        for x in x0..x1 {
            blend_at(surface, x, y, color, alpha);
        }
    }
}

/// Source-over blend of `color` at `alpha` into one pixel; out of bounds is
/// ignored.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn blend_at(surface: &mut RgbaImage, x: i64, y: i64, color: Rgb, alpha: f32) {
    let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) else {
        return;
    };
    let Some(px) = surface.get_pixel_mut_checked(x, y) else {
        return;
    };
    let a = alpha.clamp(0.0, 1.0);
    if a <= 0.0 {
        return;
    }
    let mix = |dst: u8, src: u8| -> u8 {
        (f32::from(src) * a + f32::from(dst) * (1.0 - a)).round() as u8
    };
    let Rgba([r, g, b, da]) = *px;
    let out_alpha = a + f32::from(da) / 255.0 * (1.0 - a);
    *px = Rgba([
        mix(r, color.r),
        mix(g, color.g),
        mix(b, color.b),
        (out_alpha * 255.0).round() as u8,
    ]);
}
