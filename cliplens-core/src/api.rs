//! Wire types for the search endpoints.

use serde::Deserialize;
use url::form_urlencoded;

use crate::filter::{FilterKey, KeyframeId};

pub const SEARCH_ENDPOINT: &str = "/api/search/";
/// Alternate endpoint serving color-similarity ranking. Same wire shape.
pub const COLOR_ENDPOINT: &str = "/api/color/";

/// One search hit. Immutable once received; the render list owns it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResultItem {
    pub keyframe_id: KeyframeId,
    pub thumbnail: String,
    #[serde(default)]
    pub media_url: Option<String>,
    /// Keyframe offset relative to the clip start, in frames.
    #[serde(default)]
    pub frame: Option<u32>,
    #[serde(default)]
    pub clip_start_frame: Option<u32>,
    #[serde(default)]
    pub clip_end_frame: Option<u32>,
    #[serde(default)]
    pub fps: Option<f64>,
}

/// Raw response body. The backend answers either with a batch
/// (`{"results": [...], "done": ...}`) or, in single-item streaming, with
/// the item fields inlined at the top level; exhaustion may arrive as a
/// bare `{"done": true}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSearchResponse {
    #[serde(default)]
    pub results: Option<Vec<ResultItem>>,
    #[serde(default)]
    pub keyframe_id: Option<KeyframeId>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub frame: Option<u32>,
    #[serde(default)]
    pub clip_start_frame: Option<u32>,
    #[serde(default)]
    pub clip_end_frame: Option<u32>,
    #[serde(default)]
    pub fps: Option<f64>,
    #[serde(default)]
    pub done: bool,
}

impl RawSearchResponse {
    /// Normalize both response shapes into an ordered batch plus the done
    /// flag. A body with neither a result list nor inlined item fields is
    /// an empty batch.
    pub fn into_batch(self) -> (Vec<ResultItem>, bool) {
        let done = self.done;
        if let Some(results) = self.results {
            return (results, done);
        }
        match (self.keyframe_id, self.thumbnail) {
            (Some(keyframe_id), Some(thumbnail)) => (
                vec![ResultItem {
                    keyframe_id,
                    thumbnail,
                    media_url: self.media_url,
                    frame: self.frame,
                    clip_start_frame: self.clip_start_frame,
                    clip_end_frame: self.clip_end_frame,
                    fps: self.fps,
                }],
                done,
            ),
            _ => (Vec::new(), done),
        }
    }
}

/// One outgoing search request: the query text, every already-returned
/// identifier for server-side exclusion, and the active filter set.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: String,
    pub returned: Vec<KeyframeId>,
    pub filters: Vec<FilterKey>,
}

impl SearchRequest {
    /// Build the request URL against `endpoint`.
    pub fn url(&self, endpoint: &str) -> String {
        let mut ser = form_urlencoded::Serializer::new(String::new());
        ser.append_pair("q", &self.query);
        for id in &self.returned {
            ser.append_pair("returned[]", &id.to_string());
        }
        for filter in &self.filters {
            ser.append_pair("filters[]", &filter.encode());
        }
        format!("{endpoint}?{}", ser.finish())
    }
}
