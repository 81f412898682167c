//! Pointer gesture state machine.
//!
//! A press on a placeholder selects it and drags it; a press on empty canvas
//! clears the selection and turns into a pan once the pointer has travelled
//! at least the pan threshold. All points are screen pixels.

use crate::error::Result;
use crate::layout::wheel_zoom_factor;
use crate::session::SceneSession;
use crate::types::{PlaceholderId, Point};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    Idle,
    /// Moving a placeholder; `last` is the previous pointer position.
    Dragging { id: PlaceholderId, last: Point },
    /// Pressed on empty canvas, not yet past the pan threshold.
    PendingPan { origin: Point, last: Point },
    Panning { last: Point },
}

/// What a pointer event changed, so the caller knows whether to redraw or
/// refresh the layer panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PointerOutcome {
    pub redraw: bool,
    pub selection_changed: bool,
}

impl PointerOutcome {
    const NONE: Self = Self {
        redraw: false,
        selection_changed: false,
    };
    const REDRAW: Self = Self {
        redraw: true,
        selection_changed: false,
    };
}

#[derive(Debug, Clone)]
pub struct GestureTracker {
    state: Gesture,
}

impl Default for GestureTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl GestureTracker {
    pub fn new() -> Self {
        Self {
            state: Gesture::Idle,
        }
    }

    pub fn state(&self) -> Gesture {
        self.state
    }

    pub fn pointer_down(&mut self, session: &mut SceneSession, at: Point) -> Result<PointerOutcome> {
        let before = session.selection();
        match session.hit_test(at) {
            Some(id) => {
                session.set_selection(Some(id))?;
                self.state = Gesture::Dragging { id, last: at };
            }
            None => {
                session.set_selection(None)?;
                self.state = Gesture::PendingPan {
                    origin: at,
                    last: at,
                };
            }
        }
        let selection_changed = before != session.selection();
        Ok(PointerOutcome {
            redraw: selection_changed,
            selection_changed,
        })
    }

    pub fn pointer_move(&mut self, session: &mut SceneSession, at: Point) -> Result<PointerOutcome> {
        match self.state {
            Gesture::Idle => Ok(PointerOutcome::NONE),
            Gesture::Dragging { id, last } => {
                if session.selection() != Some(id) {
                    self.state = Gesture::Idle;
                    return Ok(PointerOutcome::NONE);
                }
                session.drag_selected_by(at.x - last.x, at.y - last.y)?;
                self.state = Gesture::Dragging { id, last: at };
                Ok(PointerOutcome::REDRAW)
            }
            Gesture::PendingPan { origin, last } => {
                if origin.distance(at) < session.config().pan_threshold {
                    return Ok(PointerOutcome::NONE);
                }
                session.pan_by(at.x - last.x, at.y - last.y);
                self.state = Gesture::Panning { last: at };
                Ok(PointerOutcome::REDRAW)
            }
            Gesture::Panning { last } => {
                session.pan_by(at.x - last.x, at.y - last.y);
                self.state = Gesture::Panning { last: at };
                Ok(PointerOutcome::REDRAW)
            }
        }
    }

    pub fn pointer_up(&mut self, session: &mut SceneSession) -> PointerOutcome {
        let was_dragging = matches!(self.state, Gesture::Dragging { .. });
        self.state = Gesture::Idle;
        session.end_drag();
        PointerOutcome {
            redraw: false,
            // the layer panel shows positions only indirectly; refresh after drags
            selection_changed: was_dragging,
        }
    }

    /// Wheel zoom around the pointer.
    pub fn wheel(&mut self, session: &mut SceneSession, delta_y: f32, at: Point) -> PointerOutcome {
        session.zoom_at(wheel_zoom_factor(delta_y), at);
        PointerOutcome::REDRAW
    }
}
