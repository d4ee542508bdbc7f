//! dom_utils.rs – thin helper layer for repetitive DOM operations.
//!
//! Views render markup strings; everything that has to touch live elements
//! (lookups, visibility, focus, form values, event delegation) goes through
//! these wrappers so the `JsValue` plumbing stays in one place.

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement};

use crate::error::{ClientError, Result};
use crate::validation::FormData;

pub fn document() -> Result<Document> {
    web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| ClientError::Js("no document".into()))
}

pub fn by_id(id: &str) -> Option<Element> {
    document().ok()?.get_element_by_id(id)
}

/// Replace the children of `#id` with `html`. Missing containers are
/// ignored: the view is simply not mounted.
pub fn set_html(id: &str, html: &str) {
    if let Some(el) = by_id(id) {
        el.set_inner_html(html);
    }
}

pub fn set_class(el: &Element, class: &str, on: bool) {
    let _ = el.class_list().toggle_with_force(class, on);
}

pub fn focus(id: &str) {
    if let Some(el) = by_id(id).and_then(|e| e.dyn_into::<HtmlElement>().ok()) {
        let _ = el.focus();
    }
}

pub fn set_style(el: &Element, css: &str) {
    if let Err(e) = el.set_attribute("style", css) {
        log::debug!("set style failed: {:?}", e);
    }
}

/// Nearest ancestor (or the element itself) carrying `attr`.
pub fn closest_with(target: &web_sys::EventTarget, attr: &str) -> Option<Element> {
    let el = target.dyn_ref::<Element>()?;
    el.closest(&format!("[{}]", attr)).ok().flatten()
}

pub fn data(el: &Element, key: &str) -> Option<String> {
    el.get_attribute(&format!("data-{}", key))
}

/// Whether keyboard input on `target` is typing into a form control.
pub fn is_form_field(target: Option<web_sys::EventTarget>) -> bool {
    target
        .and_then(|t| t.dyn_into::<Element>().ok())
        .map_or(false, |el| {
            matches!(el.tag_name().to_ascii_lowercase().as_str(), "input" | "select" | "textarea")
        })
}

/// Current value of an input, select or textarea; checkboxes report
/// `"true"` / `"false"`.
pub fn control_value(el: &Element) -> Option<String> {
    if let Some(input) = el.dyn_ref::<HtmlInputElement>() {
        if input.type_() == "checkbox" {
            return Some(input.checked().to_string());
        }
        return Some(input.value());
    }
    if let Some(select) = el.dyn_ref::<HtmlSelectElement>() {
        return Some(select.value());
    }
    el.dyn_ref::<HtmlTextAreaElement>().map(|t| t.value())
}

/// Named controls of a form. Checkbox groups sharing a name collect the
/// checked values, comma separated.
pub fn form_values(form: &Element) -> FormData {
    let mut values = FormData::new();
    let Ok(controls) = form.query_selector_all("input[name], select[name], textarea[name]") else {
        return values;
    };
    for i in 0..controls.length() {
        let Some(el) = controls.item(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
            continue;
        };
        let Some(name) = el.get_attribute("name") else {
            continue;
        };
        if let Some(input) = el.dyn_ref::<HtmlInputElement>() {
            if input.type_() == "checkbox" {
                let entry = values.entry(name).or_default();
                if input.checked() {
                    if !entry.is_empty() {
                        entry.push(',');
                    }
                    entry.push_str(&input.value());
                }
                continue;
            }
        }
        if let Some(value) = control_value(&el) {
            values.insert(name, value);
        }
    }
    values
}

pub fn reset_form(form: &Element) {
    if let Some(form) = form.dyn_ref::<web_sys::HtmlFormElement>() {
        form.reset();
    }
}

pub fn confirm(message: &str) -> bool {
    web_sys::window()
        .and_then(|w| w.confirm_with_message(message).ok())
        .unwrap_or(false)
}

/// Offer `contents` as a JSON file download.
pub fn download_json(filename: &str, contents: &str) -> Result<()> {
    let document = document()?;
    let link = document.create_element("a")?;
    let href = format!(
        "data:application/json;charset=utf-8,{}",
        String::from(js_sys::encode_uri_component(contents))
    );
    link.set_attribute("href", &href)?;
    link.set_attribute("download", filename)?;
    let body = document.body().ok_or_else(|| ClientError::Js("no body".into()))?;
    body.append_child(&link)?;
    if let Some(link) = link.dyn_ref::<HtmlElement>() {
        link.click();
    }
    link.remove();
    Ok(())
}

pub fn open_in_new_tab(url: &str) -> Result<()> {
    let window = web_sys::window().ok_or_else(|| ClientError::Js("no global window".into()))?;
    window.open_with_url_and_target(url, "_blank")?;
    Ok(())
}

/// Register `handler` for `event` on `target` for the lifetime of the page.
pub fn listen<E, F>(target: &web_sys::EventTarget, event: &str, handler: F) -> Result<()>
where
    E: JsCast + 'static,
    F: FnMut(E) + 'static,
{
    let mut handler = handler;
    let closure = Closure::wrap(Box::new(move |raw: web_sys::Event| {
        match raw.dyn_into::<E>() {
            Ok(e) => handler(e),
            Err(_) => log::debug!("unexpected event type"),
        }
    }) as Box<dyn FnMut(web_sys::Event)>);
    target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
    // Page-lifetime listener; never removed.
    closure.forget();
    Ok(())
}
