//! DOM views.
//!
//! Each page module turns `&AppState` into markup; this module owns the
//! page skeleton, the region repaint entry point and the delegated event
//! listeners that turn clicks, submits and pointer moves into messages.

pub mod actions;
pub mod agents;
pub mod chat;
pub mod dashboard;
pub mod models;
pub mod monitor;
pub mod settings;
pub mod shell;
pub mod workflows;

use wasm_bindgen::JsCast;
use web_sys::{Element, Event, KeyboardEvent, MouseEvent};

use crate::app::AppHandle;
use crate::canvas::view as canvas_view;
use crate::dom_utils;
use crate::error::{ClientError, Result};
use crate::messages::{Message, Region};
use crate::notifications::Severity;
use crate::settings::Theme;
use crate::state::{AppState, View};

/// Markup of the current page.
pub fn content_html(state: &AppState) -> String {
    match state.current_view {
        View::Dashboard => dashboard::html(state),
        View::Agents => agents::html(state),
        View::Chat => chat::html(state),
        View::Workflows => workflows::html(state),
        View::Models => models::html(state),
        View::Settings => settings::html(state),
    }
}

pub fn render(app: &AppHandle, region: &Region) {
    match region {
        Region::Shell => app.with_state(shell::render),
        Region::Content => {
            let (view, html) = app.with_state(|s| (s.current_view, content_html(s)));
            dom_utils::set_html(shell::CONTENT_ID, &html);
            match view {
                View::Chat => chat::scroll_to_bottom(),
                View::Workflows => canvas_view::measure_nodes(app),
                _ => {}
            }
        }
        Region::Notifications => crate::toast::render(app),
        Region::CanvasDrag {
            node_id,
            connections,
        } => canvas_view::reposition(app, node_id, connections),
    }
}

pub fn apply_theme(theme: Theme) {
    if let Some(root) = dom_utils::document().ok().and_then(|d| d.document_element()) {
        if let Err(e) = root.set_attribute("data-theme", theme.as_str()) {
            log::warn!("could not apply theme: {:?}", e);
        }
    }
}

/// Insert the page skeleton into `#app` (or the body) and attach the
/// delegated listeners. Called once at startup.
pub fn mount(app: &AppHandle) -> Result<()> {
    let document = dom_utils::document()?;
    let host: Element = match document.get_element_by_id("app") {
        Some(el) => el,
        None => document
            .body()
            .ok_or_else(|| ClientError::Js("no body".into()))?
            .unchecked_into(),
    };
    host.set_inner_html(&shell::layout_html());
    let root = dom_utils::by_id(shell::ROOT_ID).ok_or_else(|| ClientError::Js("layout missing".into()))?;

    listen_clicks(app, &root)?;
    listen_forms(app, &root)?;
    listen_canvas(app, &root)?;
    log::info!("views mounted");
    Ok(())
}

fn target_element(event: &Event) -> Option<Element> {
    event.target()?.dyn_into::<Element>().ok()
}

fn listen_clicks(app: &AppHandle, root: &Element) -> Result<()> {
    let app = app.clone();
    dom_utils::listen(root, "click", move |e: MouseEvent| {
        let Some(target) = e.target() else { return };
        let Some(el) = dom_utils::closest_with(&target, "data-action") else {
            return;
        };
        let Some(action) = dom_utils::data(&el, "action") else {
            return;
        };
        // A click on a connection handle does not select the node.
        if action == "select-node" && dom_utils::closest_with(&target, "data-handle").is_some() {
            return;
        }
        e.prevent_default();
        if let Some(question) = actions::confirmation(&action) {
            if !dom_utils::confirm(question) {
                return;
            }
        }
        let id = dom_utils::data(&el, "id");
        let value = dom_utils::data(&el, "value");
        match actions::click_message(&action, id.as_deref(), value.as_deref()) {
            Some(msg) => app.dispatch(msg),
            None => log::debug!("click on {} ignored", action),
        }
    })
}

fn listen_forms(app: &AppHandle, root: &Element) -> Result<()> {
    let submit_app = app.clone();
    dom_utils::listen(root, "submit", move |e: Event| {
        let Some(form) = target_element(&e) else { return };
        let Some(kind) = dom_utils::data(&form, "form") else {
            return;
        };
        e.prevent_default();
        let values = dom_utils::form_values(&form);
        let id = dom_utils::data(&form, "id");
        match actions::submit_message(&kind, id.as_deref(), &values) {
            Ok(Some(msg)) => {
                if actions::resets_after_submit(&kind) {
                    dom_utils::reset_form(&form);
                }
                submit_app.dispatch(msg);
            }
            Ok(None) => {}
            Err(message) => submit_app.dispatch(Message::Notify {
                message,
                severity: Severity::Error,
            }),
        }
    })?;

    let input_app = app.clone();
    dom_utils::listen(root, "input", move |e: Event| {
        let Some(el) = target_element(&e) else { return };
        let Some(kind) = dom_utils::data(&el, "input") else {
            return;
        };
        let value = dom_utils::control_value(&el).unwrap_or_default();
        if let Some(msg) = actions::input_message(&kind, &value) {
            input_app.dispatch(msg);
        }
    })?;

    let change_app = app.clone();
    dom_utils::listen(root, "change", move |e: Event| {
        let Some(el) = target_element(&e) else { return };
        let value = dom_utils::control_value(&el).unwrap_or_default();
        let msg = if let Some(key) = dom_utils::data(&el, "setting") {
            actions::setting_patch(&key, &value).map(Message::UpdateSettings)
        } else if let Some(kind) = dom_utils::data(&el, "filter") {
            actions::filter_message(&kind, &value)
        } else {
            None
        };
        if let Some(msg) = msg {
            change_app.dispatch(msg);
        }
    })?;

    // Enter sends, Shift+Enter inserts a newline.
    dom_utils::listen(root, "keydown", move |e: KeyboardEvent| {
        if e.key() != "Enter" || e.shift_key() {
            return;
        }
        let Some(el) = e.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
            return;
        };
        if !el.has_attribute("data-submit-on-enter") {
            return;
        }
        e.prevent_default();
        let form = el
            .closest("form")
            .ok()
            .flatten()
            .and_then(|f| f.dyn_into::<web_sys::HtmlFormElement>().ok());
        if let Some(form) = form {
            if let Err(err) = form.request_submit() {
                log::warn!("submit failed: {:?}", err);
            }
        }
    })
}

fn listen_canvas(app: &AppHandle, root: &Element) -> Result<()> {
    let down_app = app.clone();
    dom_utils::listen(root, "mousedown", move |e: MouseEvent| {
        let Some(target) = e.target() else { return };
        if let Some(handle) = dom_utils::closest_with(&target, "data-handle") {
            if dom_utils::data(&handle, "handle").as_deref() == Some("output") {
                if let Some(node_id) = dom_utils::data(&handle, "node-id") {
                    e.prevent_default();
                    down_app.dispatch(Message::OutputHandleDown(node_id));
                }
            }
            return;
        }
        let Some(node) = dom_utils::closest_with(&target, "data-node-id") else {
            return;
        };
        // Form controls inside the canvas keep their default behaviour.
        if dom_utils::is_form_field(Some(target)) {
            return;
        }
        let (Some(node_id), Some(point)) = (dom_utils::data(&node, "node-id"), canvas_view::canvas_point(&e)) else {
            return;
        };
        e.prevent_default();
        down_app.dispatch(Message::NodePointerDown {
            node_id,
            x: point.x,
            y: point.y,
        });
    })?;

    let move_app = app.clone();
    dom_utils::listen(root, "mousemove", move |e: MouseEvent| {
        let dragging = move_app.with_state(|s| {
            s.workflows
                .builder
                .as_ref()
                .map_or(false, |b| b.graph.dragging_id().is_some())
        });
        if !dragging {
            return;
        }
        if let Some(point) = canvas_view::canvas_point(&e) {
            move_app.dispatch(Message::CanvasPointerMove {
                x: point.x,
                y: point.y,
            });
        }
    })?;

    let up_app = app.clone();
    dom_utils::listen(root, "mouseup", move |e: MouseEvent| {
        if let Some(target) = e.target() {
            if let Some(handle) = dom_utils::closest_with(&target, "data-handle") {
                if dom_utils::data(&handle, "handle").as_deref() == Some("input") {
                    if let Some(node_id) = dom_utils::data(&handle, "node-id") {
                        up_app.dispatch(Message::InputHandleUp(node_id));
                    }
                }
            }
        }
        up_app.dispatch(Message::CanvasPointerUp);
    })?;

    // `mouseleave` does not bubble; a `mouseout` from inside the canvas to
    // somewhere outside it is the same thing.
    let leave_app = app.clone();
    dom_utils::listen(root, "mouseout", move |e: MouseEvent| {
        if in_canvas(e.target()) && !in_canvas(e.related_target()) {
            leave_app.dispatch(Message::CanvasPointerLeave);
        }
    })
}

fn in_canvas(target: Option<web_sys::EventTarget>) -> bool {
    target
        .and_then(|t| t.dyn_into::<Element>().ok())
        .and_then(|el| el.closest(&format!("#{}", canvas_view::CANVAS_ID)).ok().flatten())
        .is_some()
}
