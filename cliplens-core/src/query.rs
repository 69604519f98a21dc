//! The location query string as typed client state.
//!
//! Every read or write of `q` and the `filters[<id>:<kind>]` presence keys
//! goes through [`QueryState`]. Filter mutations are pure: they produce a
//! rebuilt query string and the caller decides when to commit it (in the
//! browser, a full navigation).

use url::form_urlencoded;

use crate::filter::{FilterKey, FilterKind, KeyframeId};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryState {
    pairs: Vec<(String, String)>,
}

impl QueryState {
    /// Parse a raw query string, with or without the leading `?`.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.strip_prefix('?').unwrap_or(raw);
        let pairs = form_urlencoded::parse(raw.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Self { pairs }
    }

    /// The free-text query, if present and non-empty.
    pub fn query_text(&self) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == "q")
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.is_empty())
    }

    pub fn set_query_text(&mut self, q: &str) {
        self.pairs.retain(|(k, _)| k != "q");
        self.pairs.push(("q".to_owned(), q.to_owned()));
    }

    /// Active filters in query-string order. Unparseable `filters[...]`
    /// keys are skipped, not errors.
    pub fn active_filters(&self) -> Vec<FilterKey> {
        self.pairs
            .iter()
            .filter(|(k, _)| k.starts_with("filters["))
            .filter_map(|(k, _)| {
                let parsed = FilterKey::parse_query_key(k);
                if parsed.is_none() {
                    tracing::debug!(key = %k, "skipping unparseable filter key");
                }
                parsed
            })
            .collect()
    }

    pub fn has_filter_of_kind(&self, kind: FilterKind) -> bool {
        self.active_filters().iter().any(|f| f.kind == kind)
    }

    /// Replace every filter of `kind` with a single key for `keyframe_id`.
    /// A kind holds one active filter at a time, regardless of which slot
    /// the drop landed on.
    pub fn set_filter(&mut self, kind: FilterKind, keyframe_id: KeyframeId) {
        self.clear_filters(kind);
        let key = FilterKey::new(keyframe_id, kind);
        self.pairs.push((key.query_key(), String::new()));
    }

    /// Remove every filter of `kind`. Returns whether anything was removed,
    /// so a no-op clear can skip navigation.
    pub fn clear_filters(&mut self, kind: FilterKind) -> bool {
        let before = self.pairs.len();
        self.pairs.retain(|(k, _)| {
            FilterKey::parse_query_key(k).map_or(true, |f| f.kind != kind)
        });
        self.pairs.len() != before
    }

    /// Rebuild the query string, without a leading `?`. Relative order of
    /// unrelated keys is preserved as parsed, but callers must not rely on
    /// it.
    pub fn encode(&self) -> String {
        let mut ser = form_urlencoded::Serializer::new(String::new());
        for (k, v) in &self.pairs {
            ser.append_pair(k, v);
        }
        ser.finish()
    }

    /// Navigation target for committing this state against `base`
    /// (origin + path). An empty query string yields the bare base URL.
    pub fn href(&self, base: &str) -> String {
        let qs = self.encode();
        if qs.is_empty() {
            base.to_owned()
        } else {
            format!("{base}?{qs}")
        }
    }

    /// Detail-view link for a result, carrying the full current query
    /// string forward.
    pub fn detail_url(&self, keyframe_id: KeyframeId) -> String {
        let qs = self.encode();
        if qs.is_empty() {
            format!("/detailed_view/{keyframe_id}")
        } else {
            format!("/detailed_view/{keyframe_id}?{qs}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_query_text_and_filters() {
        let state = QueryState::parse("?q=red+car&filters%5B7%3Acolors%5D=");
        assert_eq!(state.query_text(), Some("red car"));
        assert_eq!(
            state.active_filters(),
            vec![FilterKey::new(7, FilterKind::Colors)]
        );
    }

    #[test]
    fn empty_q_is_absent() {
        let state = QueryState::parse("q=");
        assert_eq!(state.query_text(), None);
    }

    #[test]
    fn unparseable_filter_keys_are_ignored() {
        let state = QueryState::parse("filters%5Bbogus%5D=&filters%5B3%3Aobjects%5D=");
        assert_eq!(
            state.active_filters(),
            vec![FilterKey::new(3, FilterKind::Objects)]
        );
    }

    #[test]
    fn set_filter_replaces_all_of_kind() {
        let mut state = QueryState::parse("q=dog&filters%5B2%3Acolors%5D=&filters%5B5%3Acolors%5D=");
        state.set_filter(FilterKind::Colors, 9);

        let colors: Vec<_> = state
            .active_filters()
            .into_iter()
            .filter(|f| f.kind == FilterKind::Colors)
            .collect();
        assert_eq!(colors, vec![FilterKey::new(9, FilterKind::Colors)]);
        assert_eq!(state.query_text(), Some("dog"));
    }

    #[test]
    fn set_filter_leaves_other_kinds_alone() {
        let mut state = QueryState::parse("filters%5B1%3Aembeddings%5D=");
        state.set_filter(FilterKind::Colors, 4);
        assert!(state.has_filter_of_kind(FilterKind::Embeddings));
        assert!(state.has_filter_of_kind(FilterKind::Colors));
    }

    #[test]
    fn clear_filters_reports_change() {
        let mut state = QueryState::parse("q=cat&filters%5B8%3Aobjects%5D=");
        assert!(state.clear_filters(FilterKind::Objects));
        assert!(!state.clear_filters(FilterKind::Objects));
        assert_eq!(state.query_text(), Some("cat"));
    }

    #[test]
    fn encode_roundtrips() {
        let mut state = QueryState::parse("q=blue+sky");
        state.set_filter(FilterKind::Colors, 7);
        let reparsed = QueryState::parse(&state.encode());
        assert_eq!(reparsed, state);
    }

    #[test]
    fn href_omits_question_mark_when_empty() {
        let state = QueryState::default();
        assert_eq!(state.href("http://host/"), "http://host/");

        let state = QueryState::parse("q=x");
        assert_eq!(state.href("http://host/"), "http://host/?q=x");
    }

    #[test]
    fn detail_url_carries_query_string() {
        let state = QueryState::parse("q=boat");
        assert_eq!(state.detail_url(42), "/detailed_view/42?q=boat");
        assert_eq!(QueryState::default().detail_url(42), "/detailed_view/42");
    }
}
