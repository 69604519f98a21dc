//! Filter panel wiring: drag sources, drop targets, and the per-slot
//! preview images backed by session storage.

use std::cell::RefCell;
use std::rc::Rc;

use cliplens_core::{
    DragPayload, FilterKind, FilterStateStore, PreviewCache, SlotPreview,
};
use gloo::events::EventListener;
use wasm_bindgen::JsCast;
use web_sys::{Document, DragEvent, Element, HtmlImageElement, Storage};

use crate::dom;

/// [`PreviewCache`] over browser session storage. Previews deliberately do
/// not survive the tab; the filter keys in the query string are the durable
/// state. Degrades to a no-op when storage is unavailable.
pub struct SessionPreviewCache {
    storage: Option<Storage>,
}

impl SessionPreviewCache {
    pub fn new() -> Self {
        let storage = web_sys::window().and_then(|window| window.session_storage().ok().flatten());
        if storage.is_none() {
            log::warn!("session storage unavailable, slot previews will not persist");
        }
        Self { storage }
    }
}

impl Default for SessionPreviewCache {
    fn default() -> Self {
        Self::new()
    }
}

impl PreviewCache for SessionPreviewCache {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.as_ref()?.get_item(key).ok().flatten()
    }

    fn set(&mut self, key: &str, value: &str) {
        if let Some(storage) = &self.storage {
            let _ = storage.set_item(key, value);
        }
    }

    fn remove(&mut self, key: &str) {
        if let Some(storage) = &self.storage {
            let _ = storage.remove_item(key);
        }
    }
}

/// Element id of a filter slot. Multi-slot kinds are numbered from 1; the
/// single objects slot carries no index.
fn slot_element_id(kind: FilterKind, slot_index: u32) -> String {
    match kind {
        FilterKind::Colors => format!("color-filter-{slot_index}"),
        FilterKind::Embeddings => format!("embedding-filter-{slot_index}"),
        FilterKind::Objects => "object-filter".to_owned(),
    }
}

fn preview_image(slot: &Element) -> Option<HtmlImageElement> {
    slot.query_selector("img.preview-image")
        .ok()
        .flatten()?
        .dyn_into()
        .ok()
}

fn show_preview(slot: &Element, src: &str) {
    if let Some(image) = preview_image(slot) {
        image.set_src(src);
        let _ = image.style().set_property("display", "block");
    }
}

fn hide_preview(slot: &Element) {
    if let Some(image) = preview_image(slot) {
        image.set_src("");
        let _ = image.style().set_property("display", "none");
    }
}

fn apply_slot_state(slot: &Element, state: &SlotPreview) {
    match &state.image_src {
        Some(src) => show_preview(slot, src),
        None => hide_preview(slot),
    }
}

/// Wire the filter panel, if the page has one. Runs the load-time
/// reconciliation pass, then installs the drag source on the result list
/// and the drop/clear handlers on every slot.
pub fn init(document: &Document, listeners: &mut Vec<EventListener>) {
    let store = Rc::new(RefCell::new(FilterStateStore::new(Box::new(
        SessionPreviewCache::new(),
    ))));

    let query = dom::current_query();
    for state in store.borrow_mut().reconcile(&query) {
        if let Some(slot) = document.get_element_by_id(&slot_element_id(state.kind, state.slot_index))
        {
            apply_slot_state(&slot, &state);
        }
    }

    if let Some(results) = document.get_element_by_id("progressive-results") {
        listeners.push(EventListener::new(&results, "dragstart", on_dragstart));
    }

    for kind in FilterKind::ALL {
        for slot_index in 1..=kind.slot_count() {
            let Some(slot) = document.get_element_by_id(&slot_element_id(kind, slot_index)) else {
                continue;
            };

            listeners.push(EventListener::new(&slot, "dragover", |event| {
                event.prevent_default();
            }));

            let handle = Rc::clone(&store);
            let target = slot.clone();
            listeners.push(EventListener::new(&slot, "drop", move |event| {
                on_drop(event, &handle, &target, kind, slot_index);
            }));

            let handle = Rc::clone(&store);
            let target = slot.clone();
            listeners.push(EventListener::new(&slot, "click", move |_| {
                hide_preview(&target);
                let next = handle
                    .borrow_mut()
                    .clear_slot(&dom::current_query(), kind, slot_index);
                // A click on an already-empty slot must not reload.
                if let Some(next) = next {
                    dom::navigate(&next);
                }
            }));
        }
    }
}

/// Delegated drag source for the whole result list, so cards streamed in
/// later are covered without per-card listeners.
fn on_dragstart(event: &web_sys::Event) {
    let Some(event) = event.dyn_ref::<DragEvent>() else {
        return;
    };
    let Some(image) = event
        .target()
        .and_then(|target| target.dyn_into::<HtmlImageElement>().ok())
    else {
        return;
    };
    if !image.class_list().contains("draggable-image") {
        return;
    }

    let keyframe_id = image
        .get_attribute("data-keyframe-id")
        .and_then(|raw| raw.parse().ok());
    let payload = DragPayload::new(image.src(), keyframe_id);
    if let Some(transfer) = event.data_transfer() {
        let _ = transfer.set_data("text/plain", &payload.to_json());
    }
}

fn on_drop(
    event: &web_sys::Event,
    store: &Rc<RefCell<FilterStateStore>>,
    slot: &Element,
    kind: FilterKind,
    slot_index: u32,
) {
    let Some(event) = event.dyn_ref::<DragEvent>() else {
        return;
    };
    event.prevent_default();

    let raw = event
        .data_transfer()
        .and_then(|transfer| transfer.get_data("text/plain").ok())
        .unwrap_or_default();
    let payload = match DragPayload::from_json(&raw) {
        Ok(payload) => payload,
        Err(err) => {
            log::debug!("ignoring drop: {err}");
            return;
        }
    };

    let next = store
        .borrow_mut()
        .apply_drop(&dom::current_query(), kind, slot_index, &payload);
    // Paint the slot only when the payload actually composed a filter;
    // otherwise nothing was cached and a reload would clear it anyway.
    let Some(next) = next else {
        return;
    };
    show_preview(slot, &payload.src);
    dom::navigate(&next);
}
