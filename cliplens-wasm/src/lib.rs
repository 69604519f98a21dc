//! Cliplens Wasm - browser driver for the cliplens media-search client
//!
//! Thin bindings that wire the browser-free state machines from
//! `cliplens-core` to the DOM: the search form, the streaming result list,
//! the filter panel, and the shared video preview pool.

use std::cell::RefCell;
use std::rc::Rc;

use gloo::events::EventListener;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlInputElement};

pub mod dom;
pub mod pool;
pub mod render;
pub mod slots;
pub mod transport;

use pool::VideoPool;
use render::StreamDriver;

/// Everything the page keeps alive for its lifetime. Dropping this would
/// remove every listener, so it is parked in [`APP`].
struct App {
    _pool: Rc<VideoPool>,
    _driver: Option<Rc<StreamDriver>>,
    _listeners: Vec<EventListener>,
}

thread_local! {
    static APP: RefCell<Option<App>> = const { RefCell::new(None) };
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Debug);

    let Some(document) = web_sys::window().and_then(|window| window.document()) else {
        log::error!("no document, cannot initialize");
        return;
    };

    let app = boot(&document);
    APP.with(|slot| *slot.borrow_mut() = app);
}

fn boot(document: &Document) -> Option<App> {
    let mut listeners = Vec::new();

    wire_search_form(document, &mut listeners);
    slots::init(document, &mut listeners);

    let pool = match VideoPool::new(document) {
        Ok(pool) => pool,
        Err(err) => {
            log::error!("failed to initialize preview pool: {err:?}");
            return None;
        }
    };
    let driver = StreamDriver::start(document, &dom::current_query(), Rc::clone(&pool));

    Some(App {
        _pool: pool,
        _driver: driver,
        _listeners: listeners,
    })
}

/// Submit replaces `q` in the current query string and navigates, keeping
/// active filters. An empty input is a no-op.
fn wire_search_form(document: &Document, listeners: &mut Vec<EventListener>) {
    let Some(form) = document.get_element_by_id("search-form") else {
        return;
    };
    let Some(input) = form
        .query_selector("input[name=\"q\"]")
        .ok()
        .flatten()
        .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
    else {
        return;
    };

    listeners.push(EventListener::new(&form, "submit", move |event| {
        event.prevent_default();
        let text = input.value();
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        let mut query = dom::current_query();
        query.set_query_text(text);
        dom::navigate(&query);
    }));
}
