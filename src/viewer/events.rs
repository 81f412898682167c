//! DOM event wiring for `CertView`.
//!
//! Handlers translate browser events into editor gestures. They never block:
//! when the shared state is borrowed (an export is running) the event is
//! dropped.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    AddEventListenerOptions, Element, HtmlCanvasElement, KeyboardEvent, MouseEvent, WheelEvent,
};

use crate::editor::PointerOutcome;
use crate::error::Result;
use crate::types::Point;

use super::{notify, SharedState};

/// Pointer position relative to the canvas' top-left corner (CSS pixels).
#[allow(clippy::cast_possible_truncation)]
fn local_point(canvas: &HtmlCanvasElement, event: &MouseEvent) -> Point {
    let rect = canvas.get_bounding_client_rect();
    Point::new(
        event.client_x() as f32 - rect.left() as f32,
        event.client_y() as f32 - rect.top() as f32,
    )
}

/// Run `f` against the editor unless an export holds the state, then redraw
/// and notify as the outcome asks.
fn dispatch<F>(state: &Rc<RefCell<SharedState>>, f: F)
where
    F: FnOnce(&mut SharedState) -> Result<PointerOutcome>,
{
    let callback = (|| {
        let mut s = state.try_borrow_mut().ok()?;
        match f(&mut s) {
            Ok(outcome) => s.apply(outcome),
            Err(e) => {
                tracing::debug!(error = %e, "pointer event ignored");
                None
            }
        }
    })();
    notify(callback);
}

fn listen(
    canvas: &HtmlCanvasElement,
    event: &str,
    closure: &Closure<dyn FnMut(MouseEvent)>,
) {
    if let Err(e) = canvas.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
    {
        web_sys::console::error_1(&e);
    }
}

pub(crate) fn register_pointer_handlers(
    canvas: &HtmlCanvasElement,
    state: &Rc<RefCell<SharedState>>,
) -> Vec<Closure<dyn FnMut(MouseEvent)>> {
    let mut closures = Vec::new();

    // Mouse down: select + drag, or start a pending pan
    {
        let state = Rc::clone(state);
        let target = canvas.clone();
        let closure = Closure::wrap(Box::new(move |event: MouseEvent| {
            let at = local_point(&target, &event);
            dispatch(&state, |s| s.editor.pointer_down(at));
        }) as Box<dyn FnMut(MouseEvent)>);
        listen(canvas, "mousedown", &closure);
        closures.push(closure);
    }

    // Mouse move
    {
        let state = Rc::clone(state);
        let target = canvas.clone();
        let closure = Closure::wrap(Box::new(move |event: MouseEvent| {
            let at = local_point(&target, &event);
            dispatch(&state, |s| s.editor.pointer_move(at));
        }) as Box<dyn FnMut(MouseEvent)>);
        listen(canvas, "mousemove", &closure);
        closures.push(closure);
    }

    // Mouse up and leave both end the gesture
    for name in ["mouseup", "mouseleave"] {
        let state = Rc::clone(state);
        let closure = Closure::wrap(Box::new(move |_event: MouseEvent| {
            dispatch(&state, |s| Ok(s.editor.pointer_up()));
        }) as Box<dyn FnMut(MouseEvent)>);
        listen(canvas, name, &closure);
        closures.push(closure);
    }

    closures
}

/// Wheel zooms around the pointer. Registered non-passive so the page does
/// not scroll.
pub(crate) fn register_wheel_handler(
    canvas: &HtmlCanvasElement,
    state: &Rc<RefCell<SharedState>>,
) -> Option<Closure<dyn FnMut(WheelEvent)>> {
    let state = Rc::clone(state);
    let target = canvas.clone();
    let closure = Closure::wrap(Box::new(move |event: WheelEvent| {
        event.prevent_default();
        event.stop_propagation();
        let at = local_point(&target, &event);
        #[allow(clippy::cast_possible_truncation)]
        let delta_y = event.delta_y() as f32;
        dispatch(&state, |s| Ok(s.editor.wheel(delta_y, at)));
    }) as Box<dyn FnMut(WheelEvent)>);

    let options = AddEventListenerOptions::new();
    options.set_passive(false);
    canvas
        .add_event_listener_with_callback_and_add_event_listener_options(
            "wheel",
            closure.as_ref().unchecked_ref(),
            &options,
        )
        .ok()?;
    Some(closure)
}

/// True when the key event was typed into a form control.
fn from_form_control(event: &KeyboardEvent) -> bool {
    event
        .target()
        .and_then(|t| t.dyn_into::<Element>().ok())
        .is_some_and(|el| matches!(el.tag_name().as_str(), "INPUT" | "TEXTAREA" | "SELECT"))
}

/// Delete/Backspace remove the selected field.
pub(crate) fn register_key_handler(
    state: &Rc<RefCell<SharedState>>,
) -> Option<Closure<dyn FnMut(KeyboardEvent)>> {
    let state = Rc::clone(state);
    let closure = Closure::wrap(Box::new(move |event: KeyboardEvent| {
        let key = event.key();
        if !matches!(key.as_str(), "Delete" | "Backspace") || from_form_control(&event) {
            return;
        }
        let callback = (|| {
            let mut s = state.try_borrow_mut().ok()?;
            s.editor.delete_selected().ok()??;
            event.prevent_default();
            if let Err(e) = s.redraw() {
                tracing::warn!(error = %e, "redraw failed");
            }
            s.change_callback.clone()
        })();
        notify(callback);
    }) as Box<dyn FnMut(KeyboardEvent)>);

    let document = web_sys::window()?.document()?;
    document
        .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())
        .ok()?;
    Some(closure)
}
