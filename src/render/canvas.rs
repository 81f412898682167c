//! Canvas 2D backend (wasm32).
//!
//! `CanvasRenderer` replays draw lists onto an HTML canvas. `CanvasRasterizer`
//! owns a detached canvas at the template's native size and turns each
//! export frame into PNG bytes through `canvas.toBlob`.

use js_sys::{Function, Promise, Uint8Array};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Blob, CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use crate::error::{CertgenError, Result};
use crate::export::{ExportFrame, Rasterizer};
use crate::types::{PlaceholderStyle, Size, TextAnchor};

use super::backend::{frame_params, DrawOp, RenderBackend, RenderParams};

/// Line height multiplier used for measured text boxes.
const LINE_HEIGHT: f64 = 1.16;

fn js_err(e: JsValue) -> CertgenError {
    CertgenError::Render(e.as_string().unwrap_or_else(|| format!("{e:?}")))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn device_px(css: f32, dpr: f32) -> u32 {
    (css * dpr).round().max(1.0) as u32
}

/// Draws the editor scene onto a canvas element.
pub struct CanvasRenderer {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    template: Option<HtmlImageElement>,
    dpr: f32,
}

impl CanvasRenderer {
    pub fn new(canvas: HtmlCanvasElement, dpr: f32) -> Result<Self> {
        let ctx = canvas
            .get_context("2d")
            .map_err(js_err)?
            .ok_or_else(|| CertgenError::Render("2d context unavailable".into()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| CertgenError::Render("not a 2d context".into()))?;
        Ok(Self {
            canvas,
            ctx,
            template: None,
            dpr: if dpr > 0.0 { dpr } else { 1.0 },
        })
    }

    /// A canvas that is never attached to the document.
    pub fn detached() -> Result<Self> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| CertgenError::Render("no document".into()))?;
        let canvas = document
            .create_element("canvas")
            .map_err(js_err)?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| CertgenError::Render("not a canvas".into()))?;
        Self::new(canvas, 1.0)
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    pub fn set_template(&mut self, template: Option<HtmlImageElement>) {
        self.template = template;
    }

    /// Resize the backing store for a `css_width` x `css_height` surface.
    pub fn resize(&mut self, css_width: f32, css_height: f32, dpr: f32) {
        if dpr > 0.0 {
            self.dpr = dpr;
        }
        let width = device_px(css_width, self.dpr);
        let height = device_px(css_height, self.dpr);
        if self.canvas.width() != width {
            self.canvas.set_width(width);
        }
        if self.canvas.height() != height {
            self.canvas.set_height(height);
        }
    }

    /// Laid-out size of `text` in logical units.
    #[allow(clippy::cast_possible_truncation)]
    pub fn measure(&self, text: &str, style: &PlaceholderStyle) -> Size {
        self.ctx.set_font(&style.css_font());
        let width = self
            .ctx
            .measure_text(text)
            .map(|m| m.width())
            .unwrap_or_default();
        Size::new(width as f32, (f64::from(style.font_size) * LINE_HEIGHT) as f32)
    }

    fn draw_op(&self, op: &DrawOp<'_>, scale: f64) -> Result<()> {
        let ctx = &self.ctx;
        match op {
            DrawOp::Clear { .. } => {}
            DrawOp::Template { size } => {
                if let Some(img) = &self.template {
                    ctx.draw_image_with_html_image_element_and_dw_and_dh(
                        img,
                        0.0,
                        0.0,
                        f64::from(size.width),
                        f64::from(size.height),
                    )
                    .map_err(js_err)?;
                }
            }
            DrawOp::Line {
                from,
                to,
                color,
                alpha,
                width,
            } => {
                ctx.set_global_alpha(f64::from(*alpha));
                ctx.set_stroke_style_str(color);
                ctx.set_line_width(f64::from(*width) / scale);
                ctx.begin_path();
                ctx.move_to(f64::from(from.x), f64::from(from.y));
                ctx.line_to(f64::from(to.x), f64::from(to.y));
                ctx.stroke();
                ctx.set_global_alpha(1.0);
            }
            DrawOp::Text {
                text,
                position,
                anchor,
                style,
            } => {
                ctx.set_font(&style.css_font());
                ctx.set_fill_style_str(&style.fill);
                let (align, baseline) = match anchor {
                    TextAnchor::Center => ("center", "middle"),
                    TextAnchor::TopLeft => ("left", "top"),
                };
                ctx.set_text_align(align);
                ctx.set_text_baseline(baseline);
                ctx.fill_text(text, f64::from(position.x), f64::from(position.y))
                    .map_err(js_err)?;
            }
            DrawOp::Outline { rect, color, width } => {
                ctx.set_stroke_style_str(color);
                ctx.set_line_width(f64::from(*width) / scale);
                ctx.stroke_rect(
                    f64::from(rect.x),
                    f64::from(rect.y),
                    f64::from(rect.width),
                    f64::from(rect.height),
                );
            }
        }
        Ok(())
    }
}

impl RenderBackend for CanvasRenderer {
    fn render(&mut self, params: &RenderParams<'_>) -> Result<()> {
        let ctx = &self.ctx;
        let dpr = f64::from(self.dpr);
        ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0)
            .map_err(js_err)?;

        let (w, h) = (f64::from(params.output.width), f64::from(params.output.height));
        ctx.clear_rect(0.0, 0.0, w, h);
        for op in &params.ops {
            if let DrawOp::Clear { color } = op {
                ctx.set_fill_style_str(color);
                ctx.fill_rect(0.0, 0.0, w, h);
            }
        }

        let vp = params.viewport;
        let scale = f64::from(vp.scale);
        ctx.save();
        ctx.translate(f64::from(vp.pan_x), f64::from(vp.pan_y))
            .map_err(js_err)?;
        ctx.scale(scale, scale).map_err(js_err)?;
        let result = params
            .ops
            .iter()
            .try_for_each(|op| self.draw_op(op, scale));
        self.ctx.restore();
        result
    }
}

/// Export rasterizer backed by an offscreen canvas and `toBlob`.
pub struct CanvasRasterizer {
    renderer: CanvasRenderer,
}

impl CanvasRasterizer {
    pub fn new(template: HtmlImageElement) -> Result<Self> {
        let mut renderer = CanvasRenderer::detached()?;
        renderer.set_template(Some(template));
        Ok(Self { renderer })
    }

    /// Measure with the export canvas, which carries no device scaling.
    pub fn measure(&self, text: &str, style: &PlaceholderStyle) -> Size {
        self.renderer.measure(text, style)
    }
}

impl Rasterizer for CanvasRasterizer {
    async fn rasterize(&mut self, frame: &ExportFrame<'_>) -> Result<Vec<u8>> {
        self.renderer.resize(frame.size.width, frame.size.height, 1.0);
        self.renderer.render(&frame_params(frame))?;
        let blob = canvas_to_png(self.renderer.canvas()).await?;
        let buffer = JsFuture::from(blob.array_buffer())
            .await
            .map_err(js_err)?;
        Ok(Uint8Array::new(&buffer).to_vec())
    }
}

/// Await `canvas.toBlob(cb, "image/png")`.
async fn canvas_to_png(canvas: &HtmlCanvasElement) -> Result<Blob> {
    let mut setup_error = None;
    let promise = Promise::new(&mut |resolve: Function, reject: Function| {
        let reject_null = reject.clone();
        let callback = Closure::once_into_js(move |blob: JsValue| {
            let outcome = if blob.is_null() {
                reject_null.call1(&JsValue::NULL, &JsValue::from_str("toBlob produced no image"))
            } else {
                resolve.call1(&JsValue::NULL, &blob)
            };
            if let Err(e) = outcome {
                web_sys::console::error_1(&e);
            }
        });
        if let Err(e) = canvas.to_blob_with_type(callback.unchecked_ref(), "image/png") {
            // A tainted canvas throws synchronously.
            let _ = reject.call1(&JsValue::NULL, &e);
            setup_error = Some(e);
        }
    });
    if let Some(e) = setup_error {
        return Err(js_err(e));
    }
    let value = JsFuture::from(promise).await.map_err(js_err)?;
    value
        .dyn_into::<Blob>()
        .map_err(|_| CertgenError::Render("toBlob did not return a Blob".into()))
}
