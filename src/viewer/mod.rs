//! `CertView`, the entry point exported to JavaScript.
//!
//! The view owns an [`Editor`] and a Canvas 2D renderer behind
//! `Rc<RefCell<..>>` so the automatically registered pointer, wheel and
//! keyboard handlers can reach them. A running export holds the borrow for
//! its whole duration; handlers and API calls that find the state borrowed
//! skip their work (handlers) or fail with `ExportInProgress` (API calls).

mod events;

use std::cell::RefCell;
use std::rc::Rc;

use base64::Engine as _;
use js_sys::{Function, Promise, Uint8Array};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{future_to_promise, JsFuture};
use web_sys::{HtmlCanvasElement, HtmlImageElement, KeyboardEvent, MouseEvent, WheelEvent};

use crate::config::EditorConfig;
use crate::editor::{Editor, PointerOutcome};
use crate::error::{CertgenError, Result};
use crate::export::{CancelSlot, CancelToken, ExportOptions};
use crate::render::{editor_params, CanvasRasterizer, CanvasRenderer, RenderBackend};
use crate::session::{Layout, StyleUpdate};
use crate::types::PlaceholderId;

/// State shared between the exported object and the DOM event handlers.
pub(crate) struct SharedState {
    editor: Editor,
    renderer: CanvasRenderer,
    template: Option<HtmlImageElement>,
    change_callback: Option<Function>,
}

impl SharedState {
    /// Re-measure placeholder text and repaint the editor canvas.
    fn redraw(&mut self) -> Result<()> {
        let Self {
            editor, renderer, ..
        } = self;
        editor.refresh_extents(|text, style| renderer.measure(text, style));
        renderer.render(&editor_params(editor.session()))
    }

    /// Redraw as `outcome` asks and return the change callback when the
    /// layer panel needs a refresh.
    fn apply(&mut self, outcome: PointerOutcome) -> Option<Function> {
        if outcome.redraw {
            if let Err(e) = self.redraw() {
                tracing::warn!(error = %e, "redraw failed");
            }
        }
        if outcome.selection_changed {
            self.change_callback.clone()
        } else {
            None
        }
    }
}

/// Call the change callback outside of any state borrow.
fn notify(callback: Option<Function>) {
    if let Some(callback) = callback {
        if let Err(e) = callback.call0(&JsValue::NULL) {
            web_sys::console::error_1(&e);
        }
    }
}

fn to_js<T: serde::Serialize + ?Sized>(value: &T) -> std::result::Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Certificate template editor bound to a canvas element.
#[wasm_bindgen]
pub struct CertView {
    state: Rc<RefCell<SharedState>>,
    cancel: CancelSlot,
    // Closures live as long as the view so the listeners stay valid.
    #[allow(dead_code)]
    closures: Vec<Closure<dyn FnMut(MouseEvent)>>,
    #[allow(dead_code)]
    wheel_closure: Option<Closure<dyn FnMut(WheelEvent)>>,
    #[allow(dead_code)]
    key_closure: Option<Closure<dyn FnMut(KeyboardEvent)>>,
}

impl CertView {
    /// Run a command against the shared state, redraw, then notify.
    fn command<T>(
        &self,
        f: impl FnOnce(&mut Editor) -> Result<T>,
    ) -> std::result::Result<T, JsValue> {
        let (value, callback) = {
            let mut s = self
                .state
                .try_borrow_mut()
                .map_err(|_| CertgenError::ExportInProgress)?;
            let value = f(&mut s.editor)?;
            s.redraw()?;
            (value, s.change_callback.clone())
        };
        notify(callback);
        Ok(value)
    }

    /// Read-only access; fails while an export holds the state.
    fn read<T>(&self, f: impl FnOnce(&SharedState) -> T) -> std::result::Result<T, JsValue> {
        let s = self
            .state
            .try_borrow()
            .map_err(|_| CertgenError::ExportInProgress)?;
        Ok(f(&s))
    }
}

#[wasm_bindgen]
impl CertView {
    /// Create a view on `canvas`. Pointer, wheel and Delete/Backspace
    /// handlers are registered automatically.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas: HtmlCanvasElement, dpr: f32) -> std::result::Result<CertView, JsValue> {
        console_error_panic_hook::set_once();

        let dpr = if dpr > 0.0 { dpr } else { 1.0 };
        let css_width = canvas.width().max(1) as f32 / dpr;
        let css_height = canvas.height().max(1) as f32 / dpr;

        let mut renderer = CanvasRenderer::new(canvas.clone(), dpr)?;
        renderer.resize(css_width, css_height, dpr);
        let editor = Editor::new(EditorConfig::default(), css_width, css_height)?;

        let state = Rc::new(RefCell::new(SharedState {
            editor,
            renderer,
            template: None,
            change_callback: None,
        }));

        let closures = events::register_pointer_handlers(&canvas, &state);
        let wheel_closure = events::register_wheel_handler(&canvas, &state);
        let key_closure = events::register_key_handler(&state);

        Ok(CertView {
            state,
            cancel: CancelSlot::new(),
            closures,
            wheel_closure,
            key_closure,
        })
    }

    /// Use a decoded image element as the template. Clears all fields.
    #[wasm_bindgen(js_name = "loadTemplate")]
    pub fn load_template(&self, img: HtmlImageElement) -> std::result::Result<(), JsValue> {
        Ok(install_template(&self.state, img)?)
    }

    /// Decode encoded image bytes (PNG, JPEG, ...) and use them as the template.
    #[wasm_bindgen(js_name = "loadTemplateBytes")]
    pub fn load_template_bytes(&self, bytes: &[u8], mime: &str) -> Promise {
        let url = format!(
            "data:{mime};base64,{}",
            base64::engine::general_purpose::STANDARD.encode(bytes)
        );
        let state = Rc::clone(&self.state);
        future_to_promise(async move {
            let img = web_sys::window()
                .and_then(|w| w.document())
                .ok_or_else(|| CertgenError::Render("no document".into()))?
                .create_element("img")?
                .dyn_into::<HtmlImageElement>()?;
            img.set_src(&url);
            JsFuture::from(img.decode()).await?;
            install_template(&state, img)?;
            Ok(JsValue::UNDEFINED)
        })
    }

    /// Parse an XLSX or CSV file. Returns the column names.
    #[wasm_bindgen(js_name = "loadData")]
    pub fn load_data(&self, bytes: &[u8]) -> std::result::Result<JsValue, JsValue> {
        let columns = self.command(|editor| {
            editor.upload_data(bytes)?;
            Ok(editor.columns())
        })?;
        to_js(&columns)
    }

    /// Column names of the loaded data table.
    #[wasm_bindgen]
    pub fn columns(&self) -> std::result::Result<JsValue, JsValue> {
        to_js(&self.read(|s| s.editor.columns())?)
    }

    /// Place a field for `column` in the middle of the view. Returns its id.
    #[wasm_bindgen(js_name = "addField")]
    pub fn add_field(&self, column: &str) -> std::result::Result<u32, JsValue> {
        self.command(|editor| editor.add_field(column).map(|id| id.0))
    }

    #[wasm_bindgen(js_name = "setGridEnabled")]
    pub fn set_grid_enabled(&self, enabled: bool) -> std::result::Result<(), JsValue> {
        self.command(|editor| editor.toggle_grid(enabled))
    }

    /// Remove the selected field. Returns whether one was removed.
    #[wasm_bindgen(js_name = "deleteSelected")]
    pub fn delete_selected(&self) -> std::result::Result<bool, JsValue> {
        self.command(|editor| editor.delete_selected().map(|id| id.is_some()))
    }

    /// Restyle the selected field; omitted arguments keep their value.
    #[wasm_bindgen(js_name = "setSelectedStyle")]
    pub fn set_selected_style(
        &self,
        font_family: Option<String>,
        font_size: Option<f32>,
        fill: Option<String>,
    ) -> std::result::Result<bool, JsValue> {
        self.command(|editor| {
            editor.edit_selected(StyleUpdate {
                font_family,
                font_size,
                fill,
            })
        })
    }

    /// Style of the selected field, or `null`.
    #[wasm_bindgen(js_name = "selectedStyle")]
    pub fn selected_style(&self) -> std::result::Result<JsValue, JsValue> {
        let style = self.read(|s| s.editor.selected_style().cloned())?;
        match style {
            Some(style) => to_js(&style),
            None => Ok(JsValue::NULL),
        }
    }

    /// Layer panel entries, bottom first.
    #[wasm_bindgen]
    pub fn layers(&self) -> std::result::Result<JsValue, JsValue> {
        to_js(&self.read(|s| s.editor.layers())?)
    }

    #[wasm_bindgen(js_name = "selectLayer")]
    pub fn select_layer(&self, id: Option<u32>) -> std::result::Result<(), JsValue> {
        self.command(|editor| editor.select_layer(id.map(PlaceholderId)))
    }

    #[wasm_bindgen(js_name = "previewFirstRow")]
    pub fn preview_first_row(&self) -> std::result::Result<(), JsValue> {
        self.command(Editor::preview_first_row)
    }

    /// Archive entry names the export would produce.
    #[wasm_bindgen]
    pub fn filenames(&self, pattern: &str) -> std::result::Result<JsValue, JsValue> {
        let names = self.read(|s| s.editor.filenames(pattern))??;
        to_js(&names)
    }

    /// Render one PNG per data row and resolve with the zip archive bytes.
    ///
    /// `on_progress(done, total, filename)` is called after each row.
    #[wasm_bindgen(js_name = "exportAll")]
    pub fn export_all(&self, pattern: String, on_progress: Option<Function>) -> Promise {
        let state = Rc::clone(&self.state);
        let cancel = self.cancel.clone();
        future_to_promise(async move {
            let bytes = run_export(&state, &cancel, &pattern, on_progress.as_ref()).await?;
            Ok(Uint8Array::from(bytes.as_slice()).into())
        })
    }

    /// Stop a running export before its next row.
    #[wasm_bindgen(js_name = "cancelExport")]
    pub fn cancel_export(&self) {
        self.cancel.cancel();
    }

    #[wasm_bindgen(js_name = "isExporting")]
    pub fn is_exporting(&self) -> bool {
        self.state.try_borrow().is_err()
    }

    /// Suggested download name for the archive.
    #[wasm_bindgen(js_name = "archiveName")]
    pub fn archive_name(&self) -> std::result::Result<String, JsValue> {
        self.read(|s| s.editor.session().config().archive_name.clone())
    }

    #[wasm_bindgen(js_name = "zoomBy")]
    pub fn zoom_by(&self, factor: f32) -> std::result::Result<(), JsValue> {
        self.command(|editor| {
            editor.zoom_by(factor);
            Ok(())
        })
    }

    #[wasm_bindgen(js_name = "resetZoom")]
    pub fn reset_zoom(&self) -> std::result::Result<(), JsValue> {
        self.command(|editor| {
            editor.reset_zoom();
            Ok(())
        })
    }

    #[wasm_bindgen]
    pub fn zoom(&self) -> std::result::Result<f32, JsValue> {
        self.read(|s| s.editor.session().zoom())
    }

    /// The canvas element changed size (CSS pixels).
    #[wasm_bindgen]
    pub fn resize(&self, width: f32, height: f32, dpr: f32) -> std::result::Result<(), JsValue> {
        let mut s = self
            .state
            .try_borrow_mut()
            .map_err(|_| CertgenError::ExportInProgress)?;
        s.renderer.resize(width, height, dpr);
        s.editor.resize(width, height);
        Ok(s.redraw()?)
    }

    #[wasm_bindgen]
    pub fn render(&self) -> std::result::Result<(), JsValue> {
        let mut s = self
            .state
            .try_borrow_mut()
            .map_err(|_| CertgenError::ExportInProgress)?;
        Ok(s.redraw()?)
    }

    /// Replace the editor configuration from a plain object; missing keys
    /// take their defaults.
    #[wasm_bindgen(js_name = "setConfig")]
    pub fn set_config(&self, config: JsValue) -> std::result::Result<(), JsValue> {
        let config: EditorConfig = serde_wasm_bindgen::from_value(config)
            .map_err(|e| CertgenError::Config(e.to_string()))?;
        self.command(|editor| editor.set_config(config))
    }

    #[wasm_bindgen]
    pub fn config(&self) -> std::result::Result<JsValue, JsValue> {
        let config = self.read(|s| s.editor.session().config().clone())?;
        to_js(&config)
    }

    /// Current placeholders as layout JSON.
    #[wasm_bindgen(js_name = "layoutJson")]
    pub fn layout_json(&self) -> std::result::Result<String, JsValue> {
        Ok(self.read(|s| s.editor.session().layout().to_json())??)
    }

    /// Replace all placeholders from layout JSON. Returns the field count.
    #[wasm_bindgen(js_name = "applyLayoutJson")]
    pub fn apply_layout_json(&self, json: &str) -> std::result::Result<usize, JsValue> {
        let layout = Layout::from_json(json)?;
        self.command(|editor| editor.session_mut().apply_layout(&layout).map(|ids| ids.len()))
    }

    /// Called with no arguments whenever fields, selection or texts change.
    #[wasm_bindgen(js_name = "setChangeCallback")]
    pub fn set_change_callback(&self, callback: Option<Function>) -> std::result::Result<(), JsValue> {
        let mut s = self
            .state
            .try_borrow_mut()
            .map_err(|_| CertgenError::ExportInProgress)?;
        s.change_callback = callback;
        Ok(())
    }
}

fn install_template(state: &Rc<RefCell<SharedState>>, img: HtmlImageElement) -> Result<()> {
    let (result, callback) = {
        let mut s = state
            .try_borrow_mut()
            .map_err(|_| CertgenError::ExportInProgress)?;
        s.editor
            .upload_template(img.natural_width() as f32, img.natural_height() as f32)?;
        s.renderer.set_template(Some(img.clone()));
        s.template = Some(img);
        (s.redraw(), s.change_callback.clone())
    };
    notify(callback);
    result
}

// Holds the state borrow across awaits; every other entry point uses
// `try_borrow*` and backs off while it is taken. The cancel token is armed
// only after the borrow succeeds and is cleared when the export ends.
#[allow(clippy::await_holding_refcell_ref)]
async fn run_export(
    state: &Rc<RefCell<SharedState>>,
    cancel: &CancelSlot,
    pattern: &str,
    on_progress: Option<&Function>,
) -> Result<Vec<u8>> {
    let (result, callback) = {
        let (mut guard, token) = cancel.acquire(state)?;
        let s = &mut *guard;
        let result = export_locked(s, pattern, token, on_progress).await;
        cancel.clear();

        if let Err(e) = s.redraw() {
            tracing::warn!(error = %e, "redraw after export failed");
        }
        (result, s.change_callback.clone())
    };
    notify(callback);
    result
}

async fn export_locked(
    s: &mut SharedState,
    pattern: &str,
    token: CancelToken,
    on_progress: Option<&Function>,
) -> Result<Vec<u8>> {
    let table = s.editor.table().ok_or(CertgenError::NoData)?;
    if table.is_empty() {
        return Err(CertgenError::EmptyDataTable);
    }
    let template = s.template.clone().ok_or(CertgenError::NoTemplate)?;
    let mut rasterizer = CanvasRasterizer::new(template)?;
    let options = ExportOptions {
        reject_duplicate_names: false,
        cancel: Some(token),
    };

    s.editor
        .export(pattern, &mut rasterizer, &options, |progress| {
            if let Some(f) = on_progress {
                let outcome = f.call3(
                    &JsValue::NULL,
                    &JsValue::from(progress.done),
                    &JsValue::from(progress.total),
                    &JsValue::from_str(progress.filename),
                );
                if let Err(e) = outcome {
                    web_sys::console::error_1(&e);
                }
            }
        })
        .await
}
