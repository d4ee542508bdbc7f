//! Toast rendering for the notification service.
//! Creates a `#toast-root` container once per page and repaints it from the
//! active notifications whenever the notification region changes.

use gloo_timers::callback::Timeout;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element};

use crate::app::AppHandle;
use crate::constants::NOTIFICATION_EXIT_ANIMATION_MS;
use crate::dom_utils;
use crate::messages::Message;
use crate::notifications::Notification;
use crate::utils::escape_html;

const ROOT_ID: &str = "toast-root";

/// Markup for one toast.
pub fn toast_html(n: &Notification) -> String {
    let progress = n
        .progress
        .map(|p| {
            format!(
                r#"<div class="toast-progress"><div class="toast-progress-bar" style="width:{:.0}%"></div></div>"#,
                p.clamp(0.0, 100.0)
            )
        })
        .unwrap_or_default();
    format!(
        r#"<div class="toast toast-{sev}" data-toast-id="{id}" role="alert">
<div class="toast-body"><strong class="toast-title">{title}</strong><p class="toast-message">{msg}</p>{progress}</div>
<button type="button" class="toast-close" data-action="dismiss-notification" data-id="{id}" aria-label="Close">&times;</button>
</div>"#,
        sev = n.severity.as_str(),
        id = n.id,
        title = n.title(),
        msg = escape_html(&n.message),
        progress = progress,
    )
}

/// Repaint every active notification. Newest first.
pub fn render(app: &AppHandle) {
    let Ok(document) = dom_utils::document() else {
        return;
    };
    let Some(root) = ensure_root(&document, app) else {
        return;
    };
    ensure_styles(&document);

    let html = app.with_state(|s| {
        s.notifications
            .active()
            .iter()
            .rev()
            .map(toast_html)
            .collect::<String>()
    });
    root.set_inner_html(&html);
}

fn ensure_root(document: &Document, app: &AppHandle) -> Option<Element> {
    if let Some(el) = document.get_element_by_id(ROOT_ID) {
        return Some(el);
    }
    let root = document.create_element("div").ok()?;
    root.set_id(ROOT_ID);
    root.set_class_name("toast-root");
    document.body()?.append_child(&root).ok()?;

    // One click listener for the container's lifetime.
    let app = app.clone();
    let listened = dom_utils::listen(&root, "click", move |e: web_sys::MouseEvent| {
        let Some(target) = e.target() else { return };
        let Some(button) = dom_utils::closest_with(&target, "data-action") else {
            return;
        };
        if dom_utils::data(&button, "action").as_deref() != Some("dismiss-notification") {
            return;
        }
        let Some(id) = dom_utils::data(&button, "id").and_then(|v| v.parse().ok()) else {
            return;
        };
        dismiss_animated(&app, &button, id);
    });
    if let Err(e) = listened {
        log::warn!("toast listener not attached: {}", e);
    }
    Some(root)
}

/// Slide the toast out, then drop it from state.
fn dismiss_animated(app: &AppHandle, button: &Element, id: u64) {
    if let Some(toast) = button.closest(".toast").ok().flatten() {
        dom_utils::set_class(&toast, "toast-exit", true);
    }
    let app = app.clone();
    Timeout::new(NOTIFICATION_EXIT_ANIMATION_MS, move || {
        app.dispatch(Message::DismissNotification(id));
    })
    .forget();
}

fn ensure_styles(document: &Document) {
    if document.get_element_by_id("toast-styles").is_some() {
        return;
    }

    let css = "
.toast-root{position:fixed;top:16px;right:16px;display:flex;flex-direction:column;gap:8px;z-index:9999;font-family:Arial,Helvetica,sans-serif}
.toast{display:flex;align-items:flex-start;gap:12px;min-width:260px;max-width:380px;padding:10px 16px;border-radius:4px;color:#fff;box-shadow:0 2px 4px rgba(0,0,0,.1);opacity:0;animation:toast-in .2s forwards;transition:transform .3s,opacity .3s}
.toast-exit{transform:translateX(120%);opacity:0}
.toast-title{display:block;margin-bottom:2px}
.toast-message{margin:0}
.toast-close{background:none;border:0;color:inherit;font-size:18px;cursor:pointer}
.toast-progress{height:4px;margin-top:6px;background:rgba(255,255,255,.3);border-radius:2px}
.toast-progress-bar{height:100%;background:#fff;border-radius:2px;transition:width .2s}
.toast-success{background:#16a34a}
.toast-error{background:#dc2626}
.toast-warning{background:#d97706}
.toast-info{background:#2563eb}
@keyframes toast-in{to{opacity:1}}
";

    let Ok(style) = document.create_element("style") else {
        return;
    };
    style.set_id("toast-styles");
    style.set_text_content(Some(css));
    let parent: Option<Element> = document
        .head()
        .map(|h| h.unchecked_into())
        .or_else(|| document.body().map(|b| b.unchecked_into()));
    if let Some(parent) = parent {
        let _ = parent.append_child(&style);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::Severity;

    fn note(progress: Option<f64>) -> Notification {
        Notification {
            id: 7,
            message: "<b>saved</b>".into(),
            severity: Severity::Success,
            progress,
            expires_at: None,
        }
    }

    #[test]
    fn toast_escapes_message_and_carries_id() {
        let html = toast_html(&note(None));
        assert!(html.contains("&lt;b&gt;saved&lt;/b&gt;"));
        assert!(html.contains(r#"data-id="7""#));
        assert!(html.contains("toast-success"));
        assert!(!html.contains("toast-progress"));
    }

    #[test]
    fn progress_toast_shows_bar() {
        let html = toast_html(&note(Some(150.0)));
        assert!(html.contains("width:100%"));
        assert!(html.contains("Processing..."));
    }
}
