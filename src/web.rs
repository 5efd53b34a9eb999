//! Browser bridge.
//!
//! Binds a [`Page`] to the live document through `web-sys`. Trigger anchors
//! are mirrored into the page model, native events become `Page` calls,
//! preload requests become off-screen `Image` loads, and after every event
//! the nodes the engine owns (the overlay) are rendered onto the real DOM.
//!
//! ```js
//! import init, { start } from "./andw_lightbox.js";
//! await init();
//! start(JSON.stringify(window.andwLightboxSettings ?? {}));
//! ```
//!
//! Host time is `Date.now()` relative to construction. One `setTimeout` is
//! kept armed for the earliest queued task; every event first advances the
//! page to the current time so due tasks run before the event does.

use crate::classes;
use crate::config::LightboxSettings;
use crate::dom::{Document as Model, FocusOptions, NodeId};
use crate::events::{Key, KeyEvent};
use crate::page::Page;
use crate::preload::{LoadOutcome, LoadRequest};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    Document, Element, Event, HtmlElement, HtmlImageElement, KeyboardEvent, MouseEvent, Window,
};

type Shared = Rc<RefCell<Bridge>>;

/// A host anchor and the thumbnails inside it, with their model nodes.
struct Mirrored {
    node: NodeId,
    element: Element,
    images: Vec<(NodeId, Element)>,
}

struct Bridge {
    page: Page,
    window: Window,
    document: Document,
    body: HtmlElement,
    anchors: Vec<Mirrored>,
    /// Live elements for nodes the engine created.
    rendered: HashMap<NodeId, Element>,
    focused: Option<NodeId>,
    epoch: f64,
    tick: Option<js_sys::Function>,
    timeout: Option<i32>,
}

fn same(a: &impl AsRef<JsValue>, b: &impl AsRef<JsValue>) -> bool {
    a.as_ref() == b.as_ref()
}

fn missing(what: &str) -> JsValue {
    JsValue::from_str(&format!("andw-lightbox: no {what} available"))
}

impl Bridge {
    fn new(settings: LightboxSettings) -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| missing("window"))?;
        let document = window.document().ok_or_else(|| missing("document"))?;
        let body = document.body().ok_or_else(|| missing("body"))?;
        Ok(Self {
            page: Page::with_settings(settings),
            window,
            document,
            body,
            anchors: Vec::new(),
            rendered: HashMap::new(),
            focused: None,
            epoch: js_sys::Date::now(),
            tick: None,
            timeout: None,
        })
    }

    fn host_now(&self) -> u64 {
        (js_sys::Date::now() - self.epoch).max(0.0) as u64
    }

    /// Run every task that fell due since the last event.
    fn catch_up(&mut self) {
        let elapsed = self.host_now().saturating_sub(self.page.now());
        self.page.advance(elapsed);
    }

    /// Model node for `element` or its nearest mapped ancestor.
    fn node_for(&self, element: &Element) -> Option<NodeId> {
        let mut cursor = Some(element.clone());
        while let Some(current) = cursor {
            if let Some(node) = self.lookup(&current) {
                return Some(node);
            }
            cursor = current.parent_element();
        }
        None
    }

    fn lookup(&self, element: &Element) -> Option<NodeId> {
        let mirrored = self.anchors.iter().find_map(|m| {
            if same(&m.element, element) {
                return Some(m.node);
            }
            m.images
                .iter()
                .find(|(_, img)| same(img, element))
                .map(|&(node, _)| node)
        });
        mirrored.or_else(|| {
            self.rendered
                .iter()
                .find(|(_, live)| same(*live, element))
                .map(|(&node, _)| node)
        })
    }

    /// Mirror the live trigger anchors into the model in document order.
    /// Returns `false` when the set of anchors is unchanged.
    fn sync_triggers(&mut self) -> Result<bool, JsValue> {
        let list = self
            .document
            .query_selector_all(&format!(".{}", classes::TRIGGER))?;
        let live: Vec<Element> = (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect();

        let unchanged = live.len() == self.anchors.len()
            && live
                .iter()
                .zip(&self.anchors)
                .all(|(element, m)| same(element, &m.element));
        if unchanged {
            return Ok(false);
        }

        let mut previous = std::mem::take(&mut self.anchors);
        let mut next = Vec::with_capacity(live.len());
        self.page.mutate(|model| {
            let body = model.body();
            for element in live {
                let mirrored = match previous.iter().position(|m| same(&m.element, &element)) {
                    Some(i) => previous.swap_remove(i),
                    None => mirror_anchor(model, element),
                };
                model.append_child(body, mirrored.node);
                next.push(mirrored);
            }
            for stale in &previous {
                model.remove(stale.node);
            }
        });
        debug!(anchors = next.len(), "trigger anchors mirrored");
        self.anchors = next;
        Ok(true)
    }

    /// Re-read anchor attributes so a render sees the page as it is now.
    fn refresh_attributes(&mut self) {
        let anchors = &self.anchors;
        self.page.mutate(|model| {
            for mirrored in anchors {
                copy_attributes(model, mirrored.node, &mirrored.element);
                for (node, element) in &mirrored.images {
                    copy_attributes(model, *node, element);
                }
            }
        });
    }

    /// Carry a focus change the user made with the mouse into the model.
    fn adopt_live_focus(&mut self) {
        let Some(active) = self.document.active_element() else {
            return;
        };
        let Some(node) = self
            .rendered
            .iter()
            .find(|(_, live)| same(*live, &active))
            .map(|(&node, _)| node)
        else {
            return;
        };
        if self.page.document().active_element() != Some(node) {
            self.page
                .mutate(|model| model.focus(node, FocusOptions::default()));
            self.focused = Some(node);
        }
    }

    /// Bring the live page in line with the model.
    fn render(&mut self) -> Result<(), JsValue> {
        let model = self.page.document();
        self.body.class_list().toggle_with_force(
            classes::BODY_OPEN,
            model.has_class(model.body(), classes::BODY_OPEN),
        )?;

        let owned: Vec<NodeId> = model
            .children(model.body())
            .iter()
            .copied()
            .filter(|&node| !self.anchors.iter().any(|m| m.node == node))
            .collect();
        for node in owned {
            let element = render_node(model, &self.document, &mut self.rendered, node)?;
            if !element
                .parent_element()
                .is_some_and(|parent| same(&parent, &self.body))
            {
                self.body.append_child(&element)?;
            }
        }
        self.rendered.retain(|&node, element| {
            let keep = model.is_connected(node);
            if !keep {
                element.remove();
            }
            keep
        });

        let active = model.active_element();
        if active != self.focused {
            self.focused = active;
            if let Some(node) = active
                && let Some(html) = self
                    .rendered
                    .get(&node)
                    .and_then(|element| element.dyn_ref::<HtmlElement>())
            {
                let options = web_sys::FocusOptions::new();
                options.set_prevent_scroll(
                    model
                        .last_focus_options()
                        .is_some_and(|o| o.prevent_scroll),
                );
                html.focus_with_options(&options)?;
            }
        }
        Ok(())
    }

    /// Keep exactly one `setTimeout` armed for the earliest queued task.
    fn schedule_tick(&mut self) -> Result<(), JsValue> {
        if let Some(handle) = self.timeout.take() {
            self.window.clear_timeout_with_handle(handle);
        }
        let (Some(deadline), Some(tick)) = (self.page.next_deadline(), &self.tick) else {
            return Ok(());
        };
        let delay = deadline
            .saturating_sub(self.host_now())
            .min(i32::MAX as u64) as i32;
        let handle = self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(tick, delay)?;
        self.timeout = Some(handle);
        Ok(())
    }
}

fn mirror_anchor(model: &mut Model, element: Element) -> Mirrored {
    let node = model.create_element(&element.tag_name());
    copy_attributes(model, node, &element);
    let mut images = Vec::new();
    if let Ok(list) = element.query_selector_all("img") {
        for img in (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|n| n.dyn_into::<Element>().ok())
        {
            let img_node = model.create_element("img");
            copy_attributes(model, img_node, &img);
            model.append_child(node, img_node);
            images.push((img_node, img));
        }
    }
    Mirrored {
        node,
        element,
        images,
    }
}

fn copy_attributes(model: &mut Model, node: NodeId, element: &Element) {
    let live: Vec<(String, String)> = element
        .get_attribute_names()
        .iter()
        .filter_map(|name| name.as_string())
        .filter_map(|name| element.get_attribute(&name).map(|value| (name, value)))
        .collect();
    let gone: Vec<String> = model
        .attributes(node)
        .filter(|(name, _)| !live.iter().any(|(n, _)| n == name))
        .map(|(name, _)| name.to_string())
        .collect();
    for name in gone {
        model.remove_attribute(node, &name);
    }
    for (name, value) in &live {
        model.set_attribute(node, name, value);
    }
}

/// Create or update the live element for `node` and its subtree.
fn render_node(
    model: &Model,
    document: &Document,
    rendered: &mut HashMap<NodeId, Element>,
    node: NodeId,
) -> Result<Element, JsValue> {
    let element = match rendered.get(&node) {
        Some(element) => element.clone(),
        None => {
            let element = document.create_element(model.tag(node))?;
            rendered.insert(node, element.clone());
            element
        }
    };

    // style and disabled are driven by the hidden / disabled flags below
    let names: Vec<String> = element
        .get_attribute_names()
        .iter()
        .filter_map(|name| name.as_string())
        .collect();
    for name in names {
        if name != "style" && name != "disabled" && !model.has_attribute(node, &name) {
            element.remove_attribute(&name)?;
        }
    }
    for (name, value) in model.attributes(node) {
        if element.get_attribute(name).as_deref() != Some(value) {
            element.set_attribute(name, value)?;
        }
    }
    if model.is_disabled(node) {
        element.set_attribute("disabled", "")?;
    } else {
        element.remove_attribute("disabled")?;
    }
    if let Some(html) = element.dyn_ref::<HtmlElement>() {
        let style = html.style();
        if model.is_hidden(node) {
            style.set_property("display", "none")?;
        } else {
            style.remove_property("display")?;
        }
    }

    let children = model.children(node);
    if children.is_empty() {
        if element.text_content().unwrap_or_default() != model.text(node) {
            element.set_text_content(Some(model.text(node)));
        }
        return Ok(element);
    }
    for (index, &child) in children.iter().enumerate() {
        let child_element = render_node(model, document, rendered, child)?;
        let current = element.children().item(index as u32);
        if !current.as_ref().is_some_and(|c| same(c, &child_element)) {
            element.insert_before(&child_element, current.as_deref())?;
        }
    }
    let live = element.children();
    while live.length() > children.len() as u32 {
        let Some(extra) = live.item(children.len() as u32) else {
            break;
        };
        extra.remove();
    }
    Ok(element)
}

// =========================================================================
// Event flow
// =========================================================================

/// Finish an event: render, re-arm the timer, start queued preloads.
fn settle(shared: &Shared) {
    let requests = {
        let mut bridge = shared.borrow_mut();
        if let Err(err) = bridge.render() {
            warn!(?err, "rendering the overlay failed");
        }
        if let Err(err) = bridge.schedule_tick() {
            warn!(?err, "arming the timer failed");
        }
        bridge.page.loader_mut().take_requests()
    };
    for request in requests {
        if let Err(err) = start_preload(shared, request) {
            warn!(?err, "preload could not start");
        }
    }
}

fn start_preload(shared: &Shared, request: LoadRequest) -> Result<(), JsValue> {
    let image = HtmlImageElement::new()?;
    let bridge = Rc::clone(shared);
    let ticket = request.ticket;
    // only one of load / error fires, so a one-shot closure serves both
    let done = Closure::once_into_js(move |event: Event| {
        let outcome = if event.type_() == "load" {
            LoadOutcome::Loaded
        } else {
            LoadOutcome::Failed
        };
        {
            let mut b = bridge.borrow_mut();
            b.catch_up();
            let applied = b.page.finish_load(ticket, outcome);
            debug!(ticket = ticket.value(), ?outcome, applied, "preload finished");
        }
        settle(&bridge);
    });
    let handler = done.unchecked_ref::<js_sys::Function>();
    image.set_onload(Some(handler));
    image.set_onerror(Some(handler));
    image.set_src(&request.src);
    Ok(())
}

fn handle_click(shared: &Shared, event: &MouseEvent) {
    let Some(target) = event.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
        return;
    };
    let consumed = {
        let mut bridge = shared.borrow_mut();
        let Some(node) = bridge.node_for(&target) else {
            return;
        };
        bridge.catch_up();
        bridge.refresh_attributes();
        bridge.page.click(node)
    };
    if consumed {
        event.prevent_default();
    }
    settle(shared);
}

fn handle_keydown(shared: &Shared, event: &KeyboardEvent) {
    let key = KeyEvent {
        key: Key::from_dom(&event.key()),
        shift: event.shift_key(),
    };
    let consumed = {
        let mut bridge = shared.borrow_mut();
        bridge.catch_up();
        bridge.refresh_attributes();
        bridge.adopt_live_focus();
        bridge.page.keydown(&key)
    };
    if consumed {
        event.prevent_default();
    }
    settle(shared);
}

fn handle_tick(shared: &Shared) {
    {
        let mut bridge = shared.borrow_mut();
        bridge.timeout = None;
        bridge.catch_up();
    }
    settle(shared);
}

fn handle_mutation(shared: &Shared) {
    {
        let mut bridge = shared.borrow_mut();
        bridge.catch_up();
        if let Err(err) = bridge.sync_triggers() {
            warn!(?err, "re-reading trigger anchors failed");
        }
    }
    settle(shared);
}

fn bind(shared: &Shared, observe: bool) -> Result<(), JsValue> {
    let (document, body) = {
        let bridge = shared.borrow();
        (bridge.document.clone(), bridge.body.clone())
    };

    let bridge = Rc::clone(shared);
    let on_click =
        Closure::<dyn FnMut(MouseEvent)>::new(move |event: MouseEvent| handle_click(&bridge, &event));
    document.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
    on_click.forget();

    let bridge = Rc::clone(shared);
    let on_keydown = Closure::<dyn FnMut(KeyboardEvent)>::new(move |event: KeyboardEvent| {
        handle_keydown(&bridge, &event)
    });
    document.add_event_listener_with_callback("keydown", on_keydown.as_ref().unchecked_ref())?;
    on_keydown.forget();

    let bridge = Rc::clone(shared);
    let on_tick = Closure::<dyn FnMut()>::new(move || handle_tick(&bridge));
    shared.borrow_mut().tick = Some(on_tick.as_ref().unchecked_ref::<js_sys::Function>().clone());
    on_tick.forget();

    if observe {
        let bridge = Rc::clone(shared);
        let on_mutation = Closure::<dyn FnMut()>::new(move || handle_mutation(&bridge));
        let observer = web_sys::MutationObserver::new(on_mutation.as_ref().unchecked_ref())?;
        let init = web_sys::MutationObserverInit::new();
        init.set_child_list(true);
        init.set_subtree(true);
        observer.observe_with_options(&body, &init)?;
        on_mutation.forget();
    }
    Ok(())
}

// =========================================================================
// Exports
// =========================================================================

/// A lightbox bound to the current browser document.
#[wasm_bindgen]
pub struct WebLightbox {
    shared: Shared,
}

#[wasm_bindgen]
impl WebLightbox {
    /// Mirror the page's triggers and bind the document listeners.
    /// `settings_json` is the settings snapshot.
    #[wasm_bindgen(constructor)]
    pub fn new(settings_json: &str) -> Result<WebLightbox, JsValue> {
        let settings = LightboxSettings::from_json(settings_json)
            .map_err(|err| JsValue::from_str(&err.to_string()))?;
        let observe = settings.observer;
        let shared = Rc::new(RefCell::new(Bridge::new(settings)?));
        shared.borrow_mut().sync_triggers()?;
        bind(&shared, observe)?;
        Ok(Self { shared })
    }

    /// The document finished loading.
    pub fn ready(&self) -> Result<(), JsValue> {
        {
            let mut bridge = self.shared.borrow_mut();
            bridge.sync_triggers()?;
            bridge.catch_up();
            bridge.page.ready();
        }
        settle(&self.shared);
        Ok(())
    }

    /// Install the built-in overlay viewer.
    #[wasm_bindgen(js_name = installFallback)]
    pub fn install_fallback(&self) -> Result<(), JsValue> {
        {
            let mut bridge = self.shared.borrow_mut();
            bridge.sync_triggers()?;
            bridge.catch_up();
            bridge.page.install_fallback();
        }
        settle(&self.shared);
        Ok(())
    }

    #[wasm_bindgen(js_name = isOpen)]
    pub fn is_open(&self) -> bool {
        self.shared.borrow().page.adapter().is_open()
    }
}

/// Bind, mark ready, and install the fallback viewer in one call.
#[wasm_bindgen]
pub fn start(settings_json: &str) -> Result<WebLightbox, JsValue> {
    let lightbox = WebLightbox::new(settings_json)?;
    lightbox.ready()?;
    lightbox.install_fallback()?;
    Ok(lightbox)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn live_trigger(document: &Document, href: &str, gallery: &str) -> HtmlElement {
        let a = document.create_element("a").unwrap();
        a.set_attribute("class", classes::TRIGGER).unwrap();
        a.set_attribute("href", href).unwrap();
        a.set_attribute("data-gallery", gallery).unwrap();
        document.body().unwrap().append_child(&a).unwrap();
        a.dyn_into::<HtmlElement>().unwrap()
    }

    fn press(document: &Document, key: &str) {
        let init = web_sys::KeyboardEventInit::new();
        init.set_key(key);
        init.set_bubbles(true);
        init.set_cancelable(true);
        let event = KeyboardEvent::new_with_keyboard_event_init_dict("keydown", &init).unwrap();
        document.dispatch_event(&event).unwrap();
    }

    #[wasm_bindgen_test]
    fn click_opens_live_overlay_and_escape_closes_it() {
        let document = web_sys::window().unwrap().document().unwrap();
        let body = document.body().unwrap();
        let first = live_trigger(&document, "/a.jpg", "web");
        live_trigger(&document, "/b.jpg", "web");
        let lightbox = start("{}").unwrap();

        first.click();
        assert!(lightbox.is_open());
        assert!(body.class_list().contains(classes::BODY_OPEN));
        let backdrop = document
            .query_selector(&format!(".{}", classes::BACKDROP))
            .unwrap();
        assert!(backdrop.is_some());
        let close = document
            .query_selector(&format!(".{}", classes::CLOSE))
            .unwrap()
            .unwrap();
        assert_eq!(close.get_attribute("aria-label").as_deref(), Some("Close"));
        assert!(document
            .active_element()
            .is_some_and(|active| same(&active, &close)));
        let next = document
            .query_selector(&format!(".{}", classes::NEXT))
            .unwrap()
            .unwrap();
        assert!(!next.has_attribute("disabled"));

        press(&document, "Escape");
        assert!(!lightbox.is_open());
        assert!(!body.class_list().contains(classes::BODY_OPEN));
    }
}
