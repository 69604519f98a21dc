//! Filter kinds, filter keys, and the fixed slot layout of the filter panel.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Keyframe identifier as produced by the backend.
pub type KeyframeId = u64;

/// The modality of a composed filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    Colors,
    Embeddings,
    Objects,
}

impl FilterKind {
    pub const ALL: [FilterKind; 3] = [
        FilterKind::Colors,
        FilterKind::Embeddings,
        FilterKind::Objects,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterKind::Colors => "colors",
            FilterKind::Embeddings => "embeddings",
            FilterKind::Objects => "objects",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "colors" => Some(FilterKind::Colors),
            "embeddings" => Some(FilterKind::Embeddings),
            "objects" => Some(FilterKind::Objects),
            _ => None,
        }
    }

    /// Number of slots of this kind in the filter panel. The objects kind
    /// is single-slot.
    pub fn slot_count(&self) -> u32 {
        match self {
            FilterKind::Colors | FilterKind::Embeddings => 3,
            FilterKind::Objects => 1,
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One active filter, carried in the query string as the empty-valued key
/// `filters[<keyframe_id>:<kind>]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterKey {
    pub keyframe_id: KeyframeId,
    pub kind: FilterKind,
}

impl FilterKey {
    pub fn new(keyframe_id: KeyframeId, kind: FilterKind) -> Self {
        Self { keyframe_id, kind }
    }

    /// The `<id>:<kind>` form sent in `filters[]` request parameters.
    pub fn encode(&self) -> String {
        format!("{}:{}", self.keyframe_id, self.kind)
    }

    /// The full query-string key, e.g. `filters[7:colors]`.
    pub fn query_key(&self) -> String {
        format!("filters[{}]", self.encode())
    }

    /// Parse the `<id>:<kind>` form. Anything unparseable yields `None`.
    pub fn parse(s: &str) -> Option<Self> {
        let (id, kind) = s.split_once(':')?;
        Some(Self {
            keyframe_id: id.parse().ok()?,
            kind: FilterKind::parse(kind)?,
        })
    }

    /// Parse a full query-string key of the shape `filters[<id>:<kind>]`.
    pub fn parse_query_key(key: &str) -> Option<Self> {
        let inner = key.strip_prefix("filters[")?.strip_suffix(']')?;
        Self::parse(inner)
    }
}

/// Session-storage key under which a slot's dropped preview image lives.
pub fn preview_cache_key(kind: FilterKind, slot_index: u32) -> String {
    format!("filterPreview_{}_{}", kind.as_str(), slot_index)
}
