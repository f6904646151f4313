//! DOM overlays and listener guards

use std::collections::HashMap;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, Event, EventTarget, HtmlElement};

use crate::scene::{ClickHandler, Overlay, Rect, SceneKind, Slot};

/// Event listener that unregisters itself when dropped
pub struct EventListener {
    target: EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

impl EventListener {
    pub fn new(
        target: &EventTarget,
        event: &'static str,
        callback: impl FnMut(Event) + 'static,
    ) -> Result<Self, JsValue> {
        let callback = Closure::<dyn FnMut(Event)>::new(callback);
        target.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())?;
        Ok(Self {
            target: target.clone(),
            event,
            callback,
        })
    }
}

impl Drop for EventListener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref());
    }
}

/// Set several inline style properties at once
pub fn apply_style(el: &HtmlElement, props: &[(&str, &str)]) {
    let style = el.style();
    for (name, value) in props {
        let _ = style.set_property(name, value);
    }
}

pub fn create_html(document: &Document, tag: &str) -> Result<HtmlElement, JsValue> {
    document.create_element(tag)?.dyn_into::<HtmlElement>().map_err(JsValue::from)
}

/// A scene's widgets as absolutely positioned elements over the canvas
pub struct DomOverlay {
    document: Document,
    root: Option<HtmlElement>,
    widgets: HashMap<Slot, HtmlElement>,
    clicks: Vec<EventListener>,
}

impl DomOverlay {
    pub fn new(document: &Document, parent: &Element, kind: SceneKind) -> Result<Self, JsValue> {
        let root = create_html(document, "div")?;
        root.set_class_name(&format!("coin-rush-{}", kind.as_str()));
        apply_style(
            &root,
            &[
                ("position", "absolute"),
                ("left", "0"),
                ("top", "0"),
                ("width", "100%"),
                ("height", "100%"),
                ("pointer-events", "none"),
                ("display", "none"),
                ("font-family", "system-ui, sans-serif"),
                ("color", "#ffffff"),
                ("user-select", "none"),
            ],
        );
        parent.append_child(&root)?;
        Ok(Self {
            document: document.clone(),
            root: Some(root),
            widgets: HashMap::new(),
            clicks: Vec::new(),
        })
    }

    /// Existing widget for `slot`, created on first use
    fn widget(&mut self, slot: Slot) -> Option<HtmlElement> {
        if let Some(el) = self.widgets.get(&slot) {
            return Some(el.clone());
        }
        let root = self.root.as_ref()?;
        let tag = if slot.is_button() { "button" } else { "div" };
        let el = match create_html(&self.document, tag) {
            Ok(el) => el,
            Err(e) => {
                log::warn!("Failed to create {} widget: {:?}", slot.as_str(), e);
                return None;
            }
        };
        el.set_class_name(slot.as_str());
        apply_style(
            &el,
            &[
                ("position", "absolute"),
                ("box-sizing", "border-box"),
                ("display", "flex"),
                ("align-items", "center"),
                ("white-space", "nowrap"),
                ("text-shadow", "0 2px 4px rgba(0, 0, 0, 0.5)"),
            ],
        );
        match slot {
            Slot::PrimaryButton | Slot::SecondaryButton => {
                let bg = if slot == Slot::PrimaryButton {
                    "#f5b301"
                } else {
                    "#3a4a7a"
                };
                apply_style(
                    &el,
                    &[
                        ("justify-content", "center"),
                        ("pointer-events", "auto"),
                        ("cursor", "pointer"),
                        ("border", "none"),
                        ("border-radius", "14px"),
                        ("background", bg),
                        ("color", "#ffffff"),
                        ("font-weight", "700"),
                        ("text-shadow", "none"),
                    ],
                );
            }
            Slot::Title => apply_style(&el, &[("justify-content", "center"), ("font-weight", "800")]),
            Slot::Subtitle | Slot::Detail => apply_style(&el, &[("justify-content", "center")]),
            Slot::Score => apply_style(&el, &[("justify-content", "flex-start")]),
            Slot::Clock => apply_style(&el, &[("justify-content", "center")]),
            Slot::Lives => apply_style(&el, &[("justify-content", "flex-end"), ("color", "#ff5a6e")]),
        }
        if root.append_child(&el).is_err() {
            return None;
        }
        self.widgets.insert(slot, el.clone());
        Some(el)
    }
}

impl Overlay for DomOverlay {
    fn set_visible(&mut self, visible: bool) {
        if let Some(root) = &self.root {
            let _ = root
                .style()
                .set_property("display", if visible { "block" } else { "none" });
        }
    }

    fn set_text(&mut self, slot: Slot, text: &str) {
        if let Some(el) = self.widget(slot) {
            el.set_text_content(Some(text));
        }
    }

    fn place(&mut self, slot: Slot, rect: Rect, font_px: f32) {
        if let Some(el) = self.widget(slot) {
            apply_style(
                &el,
                &[
                    ("left", format!("{:.1}px", rect.x).as_str()),
                    ("top", format!("{:.1}px", rect.y).as_str()),
                    ("width", format!("{:.1}px", rect.w).as_str()),
                    ("height", format!("{:.1}px", rect.h).as_str()),
                    ("font-size", format!("{:.1}px", font_px).as_str()),
                ],
            );
        }
    }

    fn on_click(&mut self, slot: Slot, mut handler: ClickHandler) {
        let Some(el) = self.widget(slot) else { return };
        match EventListener::new(&el, "click", move |event: Event| {
            event.stop_propagation();
            handler();
        }) {
            Ok(listener) => self.clicks.push(listener),
            Err(e) => log::warn!("Failed to bind {} click: {:?}", slot.as_str(), e),
        }
    }

    fn release(&mut self) {
        self.clicks.clear();
        self.widgets.clear();
        if let Some(root) = self.root.take() {
            root.remove();
        }
    }
}
