//! Result-list rendering and the stream drive loop.

use std::cell::RefCell;
use std::rc::Rc;

use cliplens_core::{QueryState, ResultItem, StreamEvent, StreamMode, StreamSession};
use gloo::events::EventListener;
use gloo::timers::callback::Timeout;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, HtmlElement, HtmlImageElement};

use crate::pool::VideoPool;
use crate::transport;

/// Yield one event-loop turn between continuous-mode pulls so rendering
/// keeps up with the stream.
const REFETCH_DELAY_MS: u32 = 1;

/// Drives a [`StreamSession`] against the result surface: issues fetches,
/// renders accepted cards, and reflects terminal states on the load-more
/// control.
pub struct StreamDriver {
    document: Document,
    results: Element,
    load_more: Option<HtmlElement>,
    query: QueryState,
    session: RefCell<StreamSession>,
    pool: Rc<VideoPool>,
    _load_more_listener: RefCell<Option<EventListener>>,
}

impl StreamDriver {
    /// Wire the stream surface, if the page has one and a query is active.
    pub fn start(
        document: &Document,
        query: &QueryState,
        pool: Rc<VideoPool>,
    ) -> Option<Rc<Self>> {
        let results = document.get_element_by_id("progressive-results")?;
        let load_more = document
            .get_element_by_id("load-more")
            .and_then(|el| el.dyn_into::<HtmlElement>().ok());
        let text = query.query_text()?.to_owned();

        let mode = results
            .get_attribute("data-stream-mode")
            .map(|raw| StreamMode::parse(&raw))
            .unwrap_or_default();
        let session = StreamSession::new(text, query.active_filters(), mode);

        let driver = Rc::new(Self {
            document: document.clone(),
            results,
            load_more,
            query: query.clone(),
            session: RefCell::new(session),
            pool,
            _load_more_listener: RefCell::new(None),
        });

        match mode {
            StreamMode::Continuous => {
                if let Some(button) = &driver.load_more {
                    let _ = button.style().set_property("display", "none");
                }
            }
            StreamMode::Paged => {
                if let Some(button) = &driver.load_more {
                    let handle = Rc::clone(&driver);
                    let listener = EventListener::new(button, "click", move |_| handle.kick());
                    *driver._load_more_listener.borrow_mut() = Some(listener);
                }
            }
        }

        driver.kick();
        Some(driver)
    }

    /// Issue the next fetch, if the session allows one. At most one
    /// request is ever outstanding; redundant kicks fall through here.
    pub fn kick(self: &Rc<Self>) {
        let request = match self.session.borrow_mut().begin_fetch() {
            Some(request) => request,
            None => return,
        };

        let driver = Rc::clone(self);
        spawn_local(async move {
            let outcome = transport::fetch_search(&request).await;
            let event = driver.session.borrow_mut().complete_fetch(outcome);
            driver.handle(event);
        });
    }

    fn handle(self: &Rc<Self>, event: StreamEvent) {
        match event {
            StreamEvent::Accepted(items) => {
                for item in &items {
                    if let Err(err) = self.render_card(item) {
                        log::debug!("failed to render result card: {err:?}");
                    }
                }
                if self.session.borrow().wants_refetch() {
                    let driver = Rc::clone(self);
                    Timeout::new(REFETCH_DELAY_MS, move || driver.kick()).forget();
                }
            }
            StreamEvent::ExhaustedEmpty => {
                self.render_no_results();
                self.disable_load_more();
            }
            StreamEvent::ExhaustedAfterResults | StreamEvent::Failed => {
                self.disable_load_more();
            }
        }
    }

    fn render_card(self: &Rc<Self>, item: &ResultItem) -> Result<(), JsValue> {
        let card = self.document.create_element("div")?;
        card.set_class_name("clip-card preview-container-home");

        let anchor = self.document.create_element("a")?;
        anchor.set_attribute("href", &self.query.detail_url(item.keyframe_id))?;
        anchor.set_attribute("draggable", "false")?;

        let thumbnail: HtmlImageElement = self.document.create_element("img")?.dyn_into()?;
        thumbnail.set_src(&item.thumbnail);
        thumbnail.set_alt("Keyframe");
        thumbnail.set_class_name("thumbnail draggable-image");
        thumbnail.set_attribute("draggable", "true")?;
        thumbnail.set_attribute("data-keyframe-id", &item.keyframe_id.to_string())?;
        anchor.append_child(&thumbnail)?;
        card.append_child(&anchor)?;

        // Scrub affordance layered over the thumbnail.
        let progress = self.document.create_element("div")?;
        progress.set_class_name("preview-progress");
        progress.set_inner_html(concat!(
            "<div class=\"hit-area\">",
            "<div class=\"progress-track\">",
            "<div class=\"progress-fill\"></div>",
            "<div class=\"progress-knob\"></div>",
            "</div>",
            "</div>",
            "<span class=\"time-left\">0:00</span>",
        ));
        card.append_child(&progress)?;

        self.results.append_child(&card)?;
        self.pool.bind_card(&card, item);
        Ok(())
    }

    fn render_no_results(&self) {
        self.results.set_inner_html("");
        if let Ok(message) = self.document.create_element("p") {
            let text = self.query.query_text().unwrap_or_default();
            message.set_text_content(Some(&format!("No clips found matching \"{text}\".")));
            let _ = self.results.append_child(&message);
        }
    }

    fn disable_load_more(&self) {
        if let Some(button) = &self.load_more {
            let _ = button.set_attribute("disabled", "");
            button.set_text_content(Some("No more results"));
        }
    }
}
