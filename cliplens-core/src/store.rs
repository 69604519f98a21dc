//! Filter slot state: the per-slot preview image cache and its consistency
//! with the query string.

use std::collections::HashMap;

use crate::drag::DragPayload;
use crate::filter::{preview_cache_key, FilterKind};
use crate::query::QueryState;

/// Session-scoped storage for dropped preview images. Backed by browser
/// session storage in the wasm driver, by a map in tests.
pub trait PreviewCache {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);
}

#[derive(Debug, Default)]
pub struct MemoryPreviewCache {
    entries: HashMap<String, String>,
}

impl PreviewCache for MemoryPreviewCache {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_owned(), value.to_owned());
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// What a slot should display after load-time reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotPreview {
    pub kind: FilterKind,
    pub slot_index: u32,
    pub image_src: Option<String>,
}

/// Derives and mutates the active filter set and the per-slot preview
/// cache. Query-string mutations are returned to the caller, which commits
/// them with a single navigation.
pub struct FilterStateStore {
    cache: Box<dyn PreviewCache>,
}

impl FilterStateStore {
    pub fn new(cache: Box<dyn PreviewCache>) -> Self {
        Self { cache }
    }

    /// Load-time consistency pass over every slot: a cached preview
    /// survives only while a filter key of its kind is present in the
    /// query string; stale entries are evicted. A preview must not outlive
    /// a filter removed through another path, e.g. browser back
    /// navigation.
    pub fn reconcile(&mut self, query: &QueryState) -> Vec<SlotPreview> {
        let mut slots = Vec::new();
        for kind in FilterKind::ALL {
            for slot_index in 1..=kind.slot_count() {
                let key = preview_cache_key(kind, slot_index);
                let image_src = match self.cache.get(&key) {
                    Some(src) if query.has_filter_of_kind(kind) => Some(src),
                    Some(_) => {
                        tracing::debug!(%key, "evicting stale slot preview");
                        self.cache.remove(&key);
                        None
                    }
                    None => None,
                };
                slots.push(SlotPreview {
                    kind,
                    slot_index,
                    image_src,
                });
            }
        }
        slots
    }

    /// Apply a parsed drop: persist the preview image and return the query
    /// state to navigate to. A payload without a keyframe id cannot
    /// compose a filter and is ignored.
    pub fn apply_drop(
        &mut self,
        query: &QueryState,
        kind: FilterKind,
        slot_index: u32,
        payload: &DragPayload,
    ) -> Option<QueryState> {
        let keyframe_id = match payload.keyframe_id {
            Some(id) => id,
            None => {
                tracing::warn!(%kind, slot_index, "drop payload has no keyframe id, ignoring");
                return None;
            }
        };

        self.cache
            .set(&preview_cache_key(kind, slot_index), &payload.src);

        let mut next = query.clone();
        next.set_filter(kind, keyframe_id);
        Some(next)
    }

    /// Clear a slot: evict its preview. Navigation happens only when the
    /// filter set actually changed; a no-op click must not reload.
    pub fn clear_slot(
        &mut self,
        query: &QueryState,
        kind: FilterKind,
        slot_index: u32,
    ) -> Option<QueryState> {
        self.cache.remove(&preview_cache_key(kind, slot_index));

        let mut next = query.clone();
        next.clear_filters(kind).then_some(next)
    }
}
