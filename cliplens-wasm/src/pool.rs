//! DOM driver for the shared video preview pool.
//!
//! Owns the bounded map of `<video>` decoder elements keyed by media URL
//! and executes the [`PoolCommand`] lists produced by the browser-free
//! [`PreviewPool`] model. `Pause`/`Play`/`Seek` always target the active
//! binding's element; `Release` carries its own media URL so a hand-off
//! can park the previous owner.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use cliplens_core::{ContainerId, PoolCommand, PreviewPool, ResultItem};
use gloo::events::EventListener;
use gloo::timers::callback::Timeout;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement, HtmlImageElement, HtmlVideoElement, MouseEvent};

/// How many media sources may hold a decoder element at once.
const POOL_CAPACITY: usize = 4;
/// Settle delay before a looped preview may resume.
const LOOP_RESUME_DELAY_MS: u32 = 200;

struct ContainerNodes {
    root: Element,
    thumbnail: HtmlImageElement,
    hit_area: HtmlElement,
    progress_fill: HtmlElement,
    progress_knob: HtmlElement,
    time_left: HtmlElement,
}

struct PooledVideo {
    element: HtmlVideoElement,
    _listeners: Vec<EventListener>,
}

pub struct VideoPool {
    document: Document,
    model: RefCell<PreviewPool>,
    containers: RefCell<HashMap<ContainerId, ContainerNodes>>,
    videos: RefCell<HashMap<String, PooledVideo>>,
    /// Media URLs, least recently used first.
    lru: RefCell<Vec<String>>,
    /// Hidden parking node for detached decoder elements.
    parking: Element,
    /// Generation and target time of the last issued seek, per media URL.
    issued_seeks: RefCell<HashMap<String, (u64, f64)>>,
    hovered: Cell<Option<ContainerId>>,
    next_id: Cell<ContainerId>,
    listeners: RefCell<Vec<EventListener>>,
    settle: RefCell<Option<Timeout>>,
}

impl VideoPool {
    pub fn new(document: &Document) -> Result<Rc<Self>, JsValue> {
        let parking = document.create_element("div")?;
        parking.set_id("preview-pool");
        parking.set_attribute("style", "display: none;")?;
        if let Some(body) = document.body() {
            body.append_child(&parking)?;
        }

        let pool = Rc::new(Self {
            document: document.clone(),
            model: RefCell::new(PreviewPool::new()),
            containers: RefCell::new(HashMap::new()),
            videos: RefCell::new(HashMap::new()),
            lru: RefCell::new(Vec::new()),
            parking,
            issued_seeks: RefCell::new(HashMap::new()),
            hovered: Cell::new(None),
            next_id: Cell::new(0),
            listeners: RefCell::new(Vec::new()),
            settle: RefCell::new(None),
        });

        // A scrub drag keeps tracking the pointer outside the hit area,
        // so move/up listeners live on the document.
        let handle = Rc::clone(&pool);
        pool.listeners.borrow_mut().push(EventListener::new(
            document,
            "mousemove",
            move |event| handle.on_scrub_pointer(event, false),
        ));
        let handle = Rc::clone(&pool);
        pool.listeners.borrow_mut().push(EventListener::new(
            document,
            "mouseup",
            move |event| handle.on_scrub_pointer(event, true),
        ));

        Ok(pool)
    }

    /// Initialize one rendered card. Cards without media metadata or the
    /// preview child nodes get no hover preview.
    pub fn bind_card(self: &Rc<Self>, card: &Element, item: &ResultItem) {
        let id = self.next_id.get();
        if !self.model.borrow_mut().bind(id, item) {
            return;
        }
        self.next_id.set(id + 1);

        let Some(nodes) = Self::collect_nodes(card) else {
            log::debug!("result card is missing preview hooks, skipping");
            return;
        };

        let mut listeners = self.listeners.borrow_mut();

        let handle = Rc::clone(self);
        listeners.push(EventListener::new(card, "mouseenter", move |_| {
            handle.hovered.set(Some(id));
            let commands = handle.model.borrow_mut().hover_enter(id);
            handle.run(&commands);
        }));

        let handle = Rc::clone(self);
        listeners.push(EventListener::new(card, "mouseleave", move |_| {
            if handle.hovered.get() == Some(id) {
                handle.hovered.set(None);
            }
            let commands = handle.model.borrow_mut().hover_leave(id);
            handle.run(&commands);
        }));

        let handle = Rc::clone(self);
        let hit_area = nodes.hit_area.clone();
        let target = nodes.hit_area.clone();
        listeners.push(EventListener::new(&target, "mousedown", move |event| {
            let Some(event) = event.dyn_ref::<MouseEvent>() else {
                return;
            };
            event.prevent_default();
            let rect = hit_area.get_bounding_client_rect();
            let commands = handle.model.borrow_mut().scrub_begin(
                id,
                event.client_x() as f64,
                rect.left(),
                rect.width(),
            );
            handle.run(&commands);
        }));

        drop(listeners);
        self.containers.borrow_mut().insert(id, nodes);
    }

    fn collect_nodes(card: &Element) -> Option<ContainerNodes> {
        fn child<T: JsCast>(card: &Element, selector: &str) -> Option<T> {
            card.query_selector(selector)
                .ok()
                .flatten()?
                .dyn_into()
                .ok()
        }

        Some(ContainerNodes {
            root: card.clone(),
            thumbnail: child(card, "img.thumbnail")?,
            hit_area: child(card, ".hit-area")?,
            progress_fill: child(card, ".progress-fill")?,
            progress_knob: child(card, ".progress-knob")?,
            time_left: child(card, ".time-left")?,
        })
    }

    fn on_scrub_pointer(self: &Rc<Self>, event: &web_sys::Event, finish: bool) {
        let Some(event) = event.dyn_ref::<MouseEvent>() else {
            return;
        };
        let (container, rect) = {
            let model = self.model.borrow();
            if !model.is_scrubbing() {
                return;
            }
            let Some(binding) = model.active() else {
                return;
            };
            let containers = self.containers.borrow();
            let Some(nodes) = containers.get(&binding.container) else {
                return;
            };
            (binding.container, nodes.hit_area.get_bounding_client_rect())
        };

        let x = event.client_x() as f64;
        let commands = if finish {
            self.model
                .borrow_mut()
                .scrub_end(container, x, rect.left(), rect.width())
        } else {
            self.model
                .borrow_mut()
                .scrub_move(container, x, rect.left(), rect.width())
        };
        self.run(&commands);
    }

    fn on_seeked(self: &Rc<Self>, media_url: &str) {
        let generation = match self.issued_seeks.borrow().get(media_url) {
            Some((generation, _)) => *generation,
            None => return,
        };
        let commands = self.model.borrow_mut().seek_completed(generation);
        self.run(&commands);
    }

    /// A seek issued before the element has metadata only sets the default
    /// playback start position and fires no `seeked` event. Re-issue the
    /// pending seek once metadata arrives so completion is reported.
    fn on_loaded_metadata(self: &Rc<Self>, media_url: &str) {
        let time = match self.issued_seeks.borrow().get(media_url) {
            Some((_, time)) => *time,
            None => return,
        };
        let element = self
            .videos
            .borrow()
            .get(media_url)
            .map(|pooled| pooled.element.clone());
        if let Some(element) = element {
            element.set_current_time(time);
        }
    }

    fn on_timeupdate(self: &Rc<Self>, media_url: &str, current: f64) {
        let container = {
            let model = self.model.borrow();
            match model.active() {
                Some(binding) if binding.media_url == media_url => binding.container,
                _ => return,
            }
        };
        let commands = self.model.borrow_mut().time_update(container, current);
        self.run(&commands);
    }

    /// Fetch or create the decoder element for a media source.
    fn video_for(self: &Rc<Self>, media_url: &str) -> Option<HtmlVideoElement> {
        if let Some(element) = self
            .videos
            .borrow()
            .get(media_url)
            .map(|pooled| pooled.element.clone())
        {
            self.touch(media_url);
            return Some(element);
        }
        self.evict_idle();

        let element: HtmlVideoElement = self
            .document
            .create_element("video")
            .ok()?
            .dyn_into()
            .ok()?;
        element.set_class_name("preview-video");
        element.set_preload("auto");
        element.set_muted(true);
        let _ = element.set_attribute("playsinline", "");
        element.set_src(media_url);

        let mut listeners = Vec::new();
        let handle = Rc::clone(self);
        let media = media_url.to_owned();
        listeners.push(EventListener::new(&element, "loadedmetadata", move |_| {
            handle.on_loaded_metadata(&media)
        }));
        let handle = Rc::clone(self);
        let media = media_url.to_owned();
        listeners.push(EventListener::new(&element, "seeked", move |_| {
            handle.on_seeked(&media)
        }));
        let handle = Rc::clone(self);
        let media = media_url.to_owned();
        let video = element.clone();
        listeners.push(EventListener::new(&element, "timeupdate", move |_| {
            handle.on_timeupdate(&media, video.current_time())
        }));

        let _ = self.parking.append_child(&element);
        self.videos.borrow_mut().insert(
            media_url.to_owned(),
            PooledVideo {
                element: element.clone(),
                _listeners: listeners,
            },
        );
        self.touch(media_url);
        Some(element)
    }

    fn touch(&self, media_url: &str) {
        let mut lru = self.lru.borrow_mut();
        lru.retain(|media| media != media_url);
        lru.push(media_url.to_owned());
    }

    /// Drop the least recently used idle decoder once the pool is full.
    /// The active binding's element is never evicted.
    fn evict_idle(&self) {
        if self.videos.borrow().len() < POOL_CAPACITY {
            return;
        }
        let active = self
            .model
            .borrow()
            .active()
            .map(|binding| binding.media_url.clone());
        let victim = self
            .lru
            .borrow()
            .iter()
            .find(|media| Some(media.as_str()) != active.as_deref())
            .cloned();
        let Some(victim) = victim else {
            return;
        };

        if let Some(pooled) = self.videos.borrow_mut().remove(&victim) {
            pooled.element.remove();
        }
        self.lru.borrow_mut().retain(|media| media != &victim);
        self.issued_seeks.borrow_mut().remove(&victim);
        log::debug!("evicted pooled decoder for {victim}");
    }

    fn run(self: &Rc<Self>, commands: &[PoolCommand]) {
        for command in commands {
            match command {
                PoolCommand::Release {
                    media_url,
                    rewind_to,
                    ..
                } => {
                    let element = self
                        .videos
                        .borrow()
                        .get(media_url)
                        .map(|pooled| pooled.element.clone());
                    if let Some(element) = element {
                        let _ = element.pause();
                        element.set_current_time(*rewind_to);
                        let _ = self.parking.append_child(&element);
                    }
                }
                PoolCommand::Attach {
                    container,
                    media_url,
                } => {
                    let Some(video) = self.video_for(media_url) else {
                        continue;
                    };
                    if let Some(nodes) = self.containers.borrow().get(container) {
                        let _ = nodes.root.append_child(&video);
                    }
                }
                PoolCommand::HideThumbnail { container } => {
                    self.set_thumbnail_opacity(*container, "0");
                }
                PoolCommand::ShowThumbnail { container } => {
                    self.set_thumbnail_opacity(*container, "1");
                }
                PoolCommand::Pause => {
                    if let Some(video) = self.active_video() {
                        let _ = video.pause();
                    }
                }
                PoolCommand::Play => {
                    if let Some(video) = self.active_video() {
                        let _ = video.play();
                    }
                }
                PoolCommand::Seek { time, generation } => {
                    let Some(media) = self.active_media() else {
                        continue;
                    };
                    self.issued_seeks
                        .borrow_mut()
                        .insert(media.clone(), (*generation, *time));
                    let element = self
                        .videos
                        .borrow()
                        .get(&media)
                        .map(|pooled| pooled.element.clone());
                    if let Some(element) = element {
                        element.set_current_time(*time);
                    }
                }
                PoolCommand::RenderProgress {
                    container,
                    percent,
                    remaining,
                } => {
                    if let Some(nodes) = self.containers.borrow().get(container) {
                        let width = format!("{percent}%");
                        let _ = nodes.progress_fill.style().set_property("width", &width);
                        let _ = nodes.progress_knob.style().set_property("left", &width);
                        nodes.time_left.set_text_content(Some(remaining));
                    }
                }
                PoolCommand::ScheduleLoopResume { container } => {
                    let container = *container;
                    let handle = Rc::clone(self);
                    let timeout = Timeout::new(LOOP_RESUME_DELAY_MS, move || {
                        let pointer_over = handle.hovered.get() == Some(container);
                        let commands = handle
                            .model
                            .borrow_mut()
                            .loop_resume_elapsed(container, pointer_over);
                        handle.run(&commands);
                    });
                    // Replacing the handle cancels any previous timer.
                    *self.settle.borrow_mut() = Some(timeout);
                }
            }
        }
    }

    fn active_media(&self) -> Option<String> {
        self.model
            .borrow()
            .active()
            .map(|binding| binding.media_url.clone())
    }

    fn active_video(&self) -> Option<HtmlVideoElement> {
        let media = self.active_media()?;
        self.videos
            .borrow()
            .get(&media)
            .map(|pooled| pooled.element.clone())
    }

    fn set_thumbnail_opacity(&self, container: ContainerId, value: &str) {
        if let Some(nodes) = self.containers.borrow().get(&container) {
            let _ = nodes.thumbnail.style().set_property("opacity", value);
        }
    }
}
