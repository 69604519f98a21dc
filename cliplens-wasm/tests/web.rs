#![cfg(target_arch = "wasm32")]

use cliplens_core::PreviewCache;
use cliplens_wasm::pool::VideoPool;
use cliplens_wasm::render::StreamDriver;
use cliplens_wasm::slots::SessionPreviewCache;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn document() -> web_sys::Document {
    web_sys::window().unwrap().document().unwrap()
}

#[wasm_bindgen_test]
fn session_cache_round_trips() {
    let mut cache = SessionPreviewCache::new();
    cache.set("filterPreview_colors_1", "/thumbs/7.jpg");
    assert_eq!(
        cache.get("filterPreview_colors_1").as_deref(),
        Some("/thumbs/7.jpg")
    );

    cache.remove("filterPreview_colors_1");
    assert_eq!(cache.get("filterPreview_colors_1"), None);
}

#[wasm_bindgen_test]
fn video_pool_creates_hidden_parking_node() {
    let document = document();
    let _pool = VideoPool::new(&document).unwrap();

    let parking = document.get_element_by_id("preview-pool").unwrap();
    assert_eq!(parking.get_attribute("style").as_deref(), Some("display: none;"));
    parking.remove();
}

#[wasm_bindgen_test]
fn first_hover_plays_once_metadata_and_seek_arrive() {
    let document = document();
    let body = document.body().unwrap();
    let pool = VideoPool::new(&document).unwrap();

    let card = document.create_element("div").unwrap();
    card.set_inner_html(concat!(
        "<img class=\"thumbnail\">",
        "<div class=\"hit-area\">",
        "<div class=\"progress-fill\"></div>",
        "<div class=\"progress-knob\"></div>",
        "</div>",
        "<span class=\"time-left\">0:00</span>",
    ));
    body.append_child(&card).unwrap();

    let item = cliplens_core::ResultItem {
        keyframe_id: 1,
        thumbnail: "/t/1.jpg".into(),
        media_url: Some("/m/a.mp4".into()),
        frame: Some(0),
        clip_start_frame: Some(30),
        clip_end_frame: Some(90),
        fps: Some(30.0),
    };
    pool.bind_card(&card, &item);

    card.dispatch_event(&web_sys::Event::new("mouseenter").unwrap())
        .unwrap();

    // The hover attached a freshly created element; nothing may play yet.
    let video: web_sys::HtmlVideoElement = card
        .query_selector("video.preview-video")
        .unwrap()
        .unwrap()
        .dyn_into()
        .unwrap();
    assert!(video.paused());

    // The harness serves no media, so metadata arrival and seek
    // completion are reported by hand, in the order a loading element
    // fires them. Playback must start without a second hover.
    video
        .dispatch_event(&web_sys::Event::new("loadedmetadata").unwrap())
        .unwrap();
    video
        .dispatch_event(&web_sys::Event::new("seeked").unwrap())
        .unwrap();
    assert!(!video.paused());

    card.remove();
    if let Some(parking) = document.get_element_by_id("preview-pool") {
        parking.remove();
    }
}

#[wasm_bindgen_test]
fn drop_without_keyframe_id_leaves_slot_preview_hidden() {
    let document = document();
    let body = document.body().unwrap();

    let slot = document.create_element("div").unwrap();
    slot.set_id("color-filter-1");
    slot.set_inner_html("<img class=\"preview-image\">");
    body.append_child(&slot).unwrap();

    let mut listeners = Vec::new();
    cliplens_wasm::slots::init(&document, &mut listeners);

    let transfer = web_sys::DataTransfer::new().unwrap();
    transfer
        .set_data("text/plain", r#"{"src":"/t/7.jpg"}"#)
        .unwrap();
    let init = web_sys::DragEventInit::new();
    init.set_data_transfer(Some(&transfer));
    let event = web_sys::DragEvent::new_with_event_init_dict("drop", &init).unwrap();
    slot.dispatch_event(&event).unwrap();

    // No filter was composed, so the slot must stay empty.
    let image: web_sys::HtmlImageElement = slot
        .query_selector("img.preview-image")
        .unwrap()
        .unwrap()
        .dyn_into()
        .unwrap();
    assert_eq!(
        image.style().get_property_value("display").unwrap(),
        "none"
    );

    slot.remove();
}

#[wasm_bindgen_test]
fn stream_driver_needs_result_surface_and_query() {
    let document = document();
    let pool = VideoPool::new(&document).unwrap();

    // No #progressive-results on the harness page, no active query either
    // way: the driver declines to start.
    let query = cliplens_core::QueryState::parse("q=dog");
    assert!(StreamDriver::start(&document, &query, Rc::clone(&pool)).is_none());

    if let Some(parking) = document.get_element_by_id("preview-pool") {
        parking.remove();
    }
}
