//! The scene session: template, placeholders, guides, selection and viewport.
//!
//! `SceneSession` owns everything drawn on the editor canvas. Placeholder
//! positions live in logical (template pixel) space; the viewport only changes
//! how that space is shown. Every mutation leaves the scene consistent: the
//! selection always names an existing placeholder, and guides always match
//! the template size and grid state.

use serde::{Deserialize, Serialize};

use crate::binder;
use crate::config::EditorConfig;
use crate::error::{CertgenError, Result};
use crate::layout::{build_guides, snap, SnapRules, ViewportTransform};
use crate::render::colors::parse_color;
use crate::types::{
    Element, GuideLine, Placeholder, PlaceholderId, PlaceholderStyle, Point, Record, Size,
    TextAnchor,
};

/// Partial style edit; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StyleUpdate {
    pub font_family: Option<String>,
    pub font_size: Option<f32>,
    pub fill: Option<String>,
}

/// One row of the layer panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerEntry {
    pub id: PlaceholderId,
    pub column: String,
    pub text: String,
    pub selected: bool,
}

/// A placeholder as stored in a saved layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceholderSpec {
    pub column: String,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub anchor: TextAnchor,
    #[serde(default)]
    pub style: PlaceholderStyle,
}

/// Serializable placeholder set, independent of any viewport.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    /// Template size the layout was designed on, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<Size>,
    pub placeholders: Vec<PlaceholderSpec>,
}

impl Layout {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Editor scene state.
#[derive(Debug, Clone)]
pub struct SceneSession {
    config: EditorConfig,
    template: Option<Size>,
    /// Guides first (bottom), then placeholders in z-order.
    elements: Vec<Element>,
    selection: Option<PlaceholderId>,
    viewport: ViewportTransform,
    viewport_size: Size,
    grid_enabled: bool,
    guides_visible: bool,
    next_id: u32,
    exporting: bool,
    /// Unsnapped position of the placeholder being dragged.
    drag_free: Option<(PlaceholderId, Point)>,
}

impl SceneSession {
    pub fn new(config: EditorConfig, viewport_width: f32, viewport_height: f32) -> Self {
        let grid_enabled = config.grid_enabled;
        Self {
            config,
            template: None,
            elements: Vec::new(),
            selection: None,
            viewport: ViewportTransform::identity(),
            viewport_size: Size::new(viewport_width, viewport_height),
            grid_enabled,
            guides_visible: true,
            next_id: 1,
            exporting: false,
            drag_free: None,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Replace the configuration. Guides are rebuilt for the new grid size;
    /// the current grid toggle is kept.
    pub fn set_config(&mut self, config: EditorConfig) -> Result<()> {
        self.ensure_idle()?;
        config.validate()?;
        self.config = config;
        self.rebuild_guides();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Template
    // ------------------------------------------------------------------

    /// Load a template of `width` x `height` pixels.
    ///
    /// Clears every placeholder and the selection, fits the viewport and
    /// regenerates the guides.
    pub fn load_template(&mut self, width: f32, height: f32) -> Result<()> {
        self.ensure_idle()?;
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(CertgenError::InvalidTemplate { width, height });
        }
        self.template = Some(Size::new(width, height));
        self.elements.clear();
        self.selection = None;
        self.drag_free = None;
        self.fit_to_screen();
        self.rebuild_guides();
        tracing::debug!(width, height, scale = self.viewport.scale, "template loaded");
        Ok(())
    }

    pub fn template(&self) -> Option<Size> {
        self.template
    }

    fn require_template(&self) -> Result<Size> {
        self.template.ok_or(CertgenError::NoTemplate)
    }

    // ------------------------------------------------------------------
    // Elements
    // ------------------------------------------------------------------

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn guides(&self) -> impl Iterator<Item = &GuideLine> {
        self.elements.iter().filter_map(Element::as_guide)
    }

    /// Placeholders in z-order (bottom first).
    pub fn placeholders(&self) -> impl Iterator<Item = &Placeholder> {
        self.elements.iter().filter_map(Element::as_placeholder)
    }

    pub(crate) fn placeholders_mut(&mut self) -> impl Iterator<Item = &mut Placeholder> {
        self.elements.iter_mut().filter_map(Element::as_placeholder_mut)
    }

    pub fn placeholder(&self, id: PlaceholderId) -> Option<&Placeholder> {
        self.placeholders().find(|p| p.id == id)
    }

    fn placeholder_mut(&mut self, id: PlaceholderId) -> Result<&mut Placeholder> {
        self.placeholders_mut()
            .find(|p| p.id == id)
            .ok_or(CertgenError::UnknownPlaceholder(id))
    }

    pub fn placeholder_count(&self) -> usize {
        self.placeholders().count()
    }

    /// Add a placeholder for `column` at the middle of the visible area.
    ///
    /// The font size is divided by the zoom so new fields look the same size
    /// on screen at any zoom level.
    pub fn add_placeholder(&mut self, column: &str) -> Result<PlaceholderId> {
        self.ensure_idle()?;
        self.require_template()?;
        let position = self
            .viewport
            .logical_center(self.viewport_size.width, self.viewport_size.height);
        let style = self.config.placeholder_style(self.viewport.scale);
        self.insert_placeholder(column, position, TextAnchor::Center, style)
    }

    /// Add a placeholder with an explicit position, anchor and style.
    pub fn insert_placeholder(
        &mut self,
        column: &str,
        position: Point,
        anchor: TextAnchor,
        style: PlaceholderStyle,
    ) -> Result<PlaceholderId> {
        self.ensure_idle()?;
        self.require_template()?;
        if !self.config.allow_duplicate_fields && self.placeholders().any(|p| p.column == column) {
            return Err(CertgenError::DuplicateField(column.to_string()));
        }
        let style = validated_style(style)?;

        let id = PlaceholderId(self.next_id);
        self.next_id += 1;
        let mut placeholder = Placeholder::new(id, column, position, style);
        placeholder.anchor = anchor;
        self.elements.push(Element::Placeholder(placeholder));
        tracing::debug!(%id, column, "placeholder added");
        Ok(id)
    }

    pub fn remove_placeholder(&mut self, id: PlaceholderId) -> Result<()> {
        self.ensure_idle()?;
        let index = self
            .elements
            .iter()
            .position(|e| e.as_placeholder().is_some_and(|p| p.id == id))
            .ok_or(CertgenError::UnknownPlaceholder(id))?;
        self.elements.remove(index);
        if self.selection == Some(id) {
            self.selection = None;
        }
        if self.drag_free.is_some_and(|(d, _)| d == id) {
            self.drag_free = None;
        }
        Ok(())
    }

    /// Remove the selected placeholder, returning its id. No-op without a
    /// selection.
    pub fn remove_selected(&mut self) -> Result<Option<PlaceholderId>> {
        self.ensure_idle()?;
        match self.selection {
            Some(id) => {
                self.remove_placeholder(id)?;
                Ok(Some(id))
            }
            None => Ok(None),
        }
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    pub fn set_selection(&mut self, id: Option<PlaceholderId>) -> Result<()> {
        self.ensure_idle()?;
        if let Some(id) = id {
            if self.placeholder(id).is_none() {
                return Err(CertgenError::UnknownPlaceholder(id));
            }
        }
        self.selection = id;
        self.drag_free = None;
        Ok(())
    }

    pub fn selection(&self) -> Option<PlaceholderId> {
        self.selection
    }

    pub fn selected(&self) -> Option<&Placeholder> {
        self.selection.and_then(|id| self.placeholder(id))
    }

    // ------------------------------------------------------------------
    // Grid and guides
    // ------------------------------------------------------------------

    pub fn toggle_grid(&mut self, enabled: bool) -> Result<()> {
        self.ensure_idle()?;
        self.grid_enabled = enabled;
        self.rebuild_guides();
        Ok(())
    }

    pub fn grid_enabled(&self) -> bool {
        self.grid_enabled
    }

    pub fn guides_visible(&self) -> bool {
        self.guides_visible
    }

    pub(crate) fn set_guides_visible(&mut self, visible: bool) {
        self.guides_visible = visible;
    }

    fn rebuild_guides(&mut self) {
        self.elements.retain(|e| matches!(e, Element::Placeholder(_)));
        let Some(template) = self.template else {
            return;
        };
        let guides = build_guides(
            template.width,
            template.height,
            self.config.grid_size,
            self.grid_enabled,
        );
        let mut rebuilt: Vec<Element> = guides.into_iter().map(Element::Guide).collect();
        rebuilt.append(&mut self.elements);
        self.elements = rebuilt;
    }

    fn snap_rules(&self) -> SnapRules {
        SnapRules::from_config(&self.config, self.grid_enabled)
    }

    // ------------------------------------------------------------------
    // Placeholder editing
    // ------------------------------------------------------------------

    /// Apply a style edit. All fields are validated before any is applied.
    pub fn set_placeholder_style(&mut self, id: PlaceholderId, update: StyleUpdate) -> Result<()> {
        self.ensure_idle()?;
        let current = self
            .placeholder(id)
            .ok_or(CertgenError::UnknownPlaceholder(id))?
            .style
            .clone();
        let next = validated_style(PlaceholderStyle {
            font_family: update.font_family.unwrap_or(current.font_family),
            font_size: update.font_size.unwrap_or(current.font_size),
            fill: update.fill.unwrap_or(current.fill),
        })?;
        let placeholder = self.placeholder_mut(id)?;
        placeholder.style = next;
        placeholder.refresh_extent();
        Ok(())
    }

    /// Move a placeholder to `proposed` (logical), applying snapping.
    /// Returns the position actually used.
    pub fn move_placeholder(&mut self, id: PlaceholderId, proposed: Point) -> Result<Point> {
        self.ensure_idle()?;
        let rules = self.snap_rules();
        let canvas_width = self.template.map_or(0.0, |t| t.width);
        let placeholder = self.placeholder_mut(id)?;
        let corrected = snap(
            proposed,
            placeholder.extent(),
            placeholder.anchor,
            canvas_width,
            &rules,
        );
        placeholder.position = corrected;
        Ok(corrected)
    }

    /// Drag the selected placeholder by a screen-space delta.
    ///
    /// Deltas accumulate on an unsnapped position so small pointer moves are
    /// not swallowed by grid rounding. Returns `None` without a selection.
    pub fn drag_selected_by(&mut self, screen_dx: f32, screen_dy: f32) -> Result<Option<Point>> {
        self.ensure_idle()?;
        let Some(id) = self.selection else {
            return Ok(None);
        };
        let start = match self.drag_free {
            Some((dragged, free)) if dragged == id => free,
            _ => self
                .placeholder(id)
                .ok_or(CertgenError::UnknownPlaceholder(id))?
                .position,
        };
        let (dx, dy) = self.viewport.screen_delta_to_logical(screen_dx, screen_dy);
        let free = Point::new(start.x + dx, start.y + dy);
        self.drag_free = Some((id, free));
        self.move_placeholder(id, free).map(Some)
    }

    /// Forget the unsnapped drag position (pointer released).
    pub fn end_drag(&mut self) {
        self.drag_free = None;
    }

    /// Record the text extent measured by the UI layer.
    pub fn set_placeholder_extent(&mut self, id: PlaceholderId, width: f32, height: f32) -> Result<()> {
        self.placeholder_mut(id)?
            .set_extent(Size::new(width.max(0.0), height.max(0.0)));
        Ok(())
    }

    /// Top-most placeholder under a screen point.
    pub fn hit_test(&self, screen: Point) -> Option<PlaceholderId> {
        let logical = self.viewport.to_logical(screen);
        self.elements
            .iter()
            .rev()
            .filter_map(Element::as_placeholder)
            .find(|p| p.bounds().contains(logical))
            .map(|p| p.id)
    }

    // ------------------------------------------------------------------
    // Binding
    // ------------------------------------------------------------------

    /// Show `row`'s values in every placeholder.
    pub fn bind_row(&mut self, row: &Record) {
        binder::bind_row(self.placeholders_mut(), row);
    }

    /// Show `{column}` labels again.
    pub fn reset_labels(&mut self) {
        binder::reset_labels(self.placeholders_mut());
    }

    // ------------------------------------------------------------------
    // Viewport
    //
    // View-only operations stay available during an export: the export
    // renders through its own identity transform.
    // ------------------------------------------------------------------

    pub fn viewport(&self) -> ViewportTransform {
        self.viewport
    }

    pub fn viewport_size(&self) -> Size {
        self.viewport_size
    }

    pub fn zoom(&self) -> f32 {
        self.viewport.scale
    }

    /// Fit the template into the viewport, or reset to identity without one.
    pub fn fit_to_screen(&mut self) {
        self.viewport = match self.template {
            Some(t) => ViewportTransform::fit_to_screen(
                t.width,
                t.height,
                self.viewport_size.width,
                self.viewport_size.height,
                self.config.fit_padding,
                self.config.never_upscale,
            ),
            None => ViewportTransform::identity(),
        };
    }

    pub fn reset_zoom(&mut self) {
        self.fit_to_screen();
    }

    /// Zoom anchored on the viewport center.
    pub fn zoom_by(&mut self, factor: f32) {
        let center = Point::new(self.viewport_size.width / 2.0, self.viewport_size.height / 2.0);
        self.zoom_at(factor, center);
    }

    /// Zoom keeping the logical point under `anchor` (screen) in place.
    pub fn zoom_at(&mut self, factor: f32, anchor: Point) {
        self.viewport
            .zoom_to_point(factor, anchor, self.config.min_zoom, self.config.max_zoom);
    }

    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.viewport.pan_by(dx, dy);
    }

    /// The canvas element was resized. Pan and zoom are kept.
    pub fn resize_viewport(&mut self, width: f32, height: f32) {
        self.viewport_size = Size::new(width.max(0.0), height.max(0.0));
    }

    // ------------------------------------------------------------------
    // Layer panel and layouts
    // ------------------------------------------------------------------

    pub fn layers(&self) -> Vec<LayerEntry> {
        self.placeholders()
            .map(|p| LayerEntry {
                id: p.id,
                column: p.column.clone(),
                text: p.text().to_string(),
                selected: self.selection == Some(p.id),
            })
            .collect()
    }

    pub fn layout(&self) -> Layout {
        Layout {
            template: self.template,
            placeholders: self
                .placeholders()
                .map(|p| PlaceholderSpec {
                    column: p.column.clone(),
                    x: p.position.x,
                    y: p.position.y,
                    anchor: p.anchor,
                    style: p.style.clone(),
                })
                .collect(),
        }
    }

    /// Replace all placeholders with those of `layout`.
    ///
    /// On error the previous placeholders are kept.
    pub fn apply_layout(&mut self, layout: &Layout) -> Result<Vec<PlaceholderId>> {
        self.ensure_idle()?;
        let template = self.require_template()?;
        if let Some(designed) = layout.template {
            if designed != template {
                tracing::warn!(
                    designed_width = designed.width,
                    designed_height = designed.height,
                    width = template.width,
                    height = template.height,
                    "layout was designed for a different template size"
                );
            }
        }

        let saved_elements = self.elements.clone();
        let saved_next = self.next_id;
        self.elements.retain(|e| matches!(e, Element::Guide(_)));
        self.selection = None;
        self.drag_free = None;

        let mut ids = Vec::with_capacity(layout.placeholders.len());
        for spec in &layout.placeholders {
            match self.insert_placeholder(
                &spec.column,
                Point::new(spec.x, spec.y),
                spec.anchor,
                spec.style.clone(),
            ) {
                Ok(id) => ids.push(id),
                Err(e) => {
                    self.elements = saved_elements;
                    self.next_id = saved_next;
                    return Err(e);
                }
            }
        }
        Ok(ids)
    }

    // ------------------------------------------------------------------
    // Export guard
    // ------------------------------------------------------------------

    pub fn is_exporting(&self) -> bool {
        self.exporting
    }

    pub(crate) fn begin_export(&mut self) -> Result<()> {
        self.ensure_idle()?;
        self.exporting = true;
        self.selection = None;
        self.drag_free = None;
        Ok(())
    }

    pub(crate) fn end_export(&mut self) {
        self.exporting = false;
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.exporting {
            Err(CertgenError::ExportInProgress)
        } else {
            Ok(())
        }
    }
}

fn validated_style(style: PlaceholderStyle) -> Result<PlaceholderStyle> {
    let font_family = style.font_family.trim();
    if font_family.is_empty() {
        return Err(CertgenError::InvalidStyle("font family is empty".into()));
    }
    if !(style.font_size.is_finite() && style.font_size > 0.0) {
        return Err(CertgenError::InvalidStyle(format!(
            "font size must be positive, got {}",
            style.font_size
        )));
    }
    let fill = parse_color(&style.fill)
        .ok_or_else(|| CertgenError::InvalidStyle(format!("not a color: {}", style.fill)))?;
    Ok(PlaceholderStyle {
        font_family: font_family.to_string(),
        font_size: style.font_size,
        fill,
    })
}
